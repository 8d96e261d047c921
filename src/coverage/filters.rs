use crate::ast::Stmt;

/// Decides which statements dinnae get a line o their ain in the coverage
/// model. Filters only suppress the statement's own line; the enumerator
/// still walks whatever is inside.
pub trait LineFilter {
    fn name(&self) -> &'static str;
    fn should_ignore(&self, stmt: &Stmt) -> bool;
}

/// Skips `dae` and `ilk` declaration lines. Defining a function or an ilk
/// is bookkeeping; the coverage story is in the bodies.
pub struct DeclarationLineFilter;

impl LineFilter for DeclarationLineFilter {
    fn name(&self) -> &'static str {
        "declarations"
    }

    fn should_ignore(&self, stmt: &Stmt) -> bool {
        matches!(stmt, Stmt::Function { .. } | Stmt::Enum { .. })
    }
}

/// Skips bare `{ ... }` block statements - the brace line carries naething,
/// the statements inside carry the coverage.
pub struct BlockLineFilter;

impl LineFilter for BlockLineFilter {
    fn name(&self) -> &'static str {
        "blocks"
    }

    fn should_ignore(&self, stmt: &Stmt) -> bool {
        matches!(stmt, Stmt::Block { .. })
    }
}

/// The standard filter set used by the enumerator
pub fn default_filters() -> Vec<Box<dyn LineFilter>> {
    vec![Box::new(DeclarationLineFilter), Box::new(BlockLineFilter)]
}
