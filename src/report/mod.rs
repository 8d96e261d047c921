//! Session persistence and report rendering: the binary `.ic` session
//! format, the JSON reporter args file, and the XML/text reports.

pub mod args;
pub mod binary;
pub mod reporter;

pub use args::{ClassFilter, ReporterArgs};
pub use binary::{load, save};
pub use reporter::Reporter;
