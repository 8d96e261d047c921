//! Coverage engine for braw
//!
//! Follows the classic two-phase scheme: a static pass walks the AST and
//! assigns every line and branch a probe slot, then execution increments a
//! flat hits array. Afterwards the hits get folded back intae the structured
//! coverage model fer reporting and verification.

pub mod data;
pub mod enumerator;
pub mod filters;
pub mod tracker;

// Re-export main types
pub use data::{BranchCounts, ClassData, JumpData, LineCoverage, LineData, ProjectData, SwitchData};
pub use enumerator::{enumerate, BranchProbes, Coverage};
pub use filters::{default_filters, BlockLineFilter, DeclarationLineFilter, LineFilter};
pub use tracker::{apply_hits, CoverageSession, CoverageTracker};
