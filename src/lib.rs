//! siccar - branch coverage fer the braw language
//!
//! Mak siccar yer branches actually ran! This crate parses and interprets
//! braw programs, enumerates coverage probes ower them (lines, jumps and
//! keek switches), records hits during execution, and folds the result
//! intae a per-class coverage model. Sessions persist as compact binary
//! files and render as XML or text reports, and a verification harness
//! checks collected coverage against marker comments in fixture files.

pub mod ast;
pub mod coverage;
pub mod error;
pub mod harness;
pub mod interpreter;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod report;
pub mod token;
pub mod value;

// Re-export commonly used types
pub use coverage::{Coverage, CoverageSession, LineCoverage, ProjectData};
pub use error::{SiccarError, SiccarResult};
pub use interpreter::Interpreter;
pub use parser::parse;
pub use value::Value;

/// Run braw source and return the result. Convenience wrapper ower the
/// full lex/parse/interpret pipeline, nae instrumentation.
pub fn run(source: &str) -> SiccarResult<Value> {
    let program = parse(source)?;
    let mut interpreter = Interpreter::new();
    interpreter.interpret(&program)
}

/// Run braw source and capture whit it blethered
pub fn run_with_output(source: &str) -> SiccarResult<(Value, Vec<String>)> {
    let program = parse(source)?;
    let mut interpreter = Interpreter::new();
    let result = interpreter.interpret(&program)?;
    let output = interpreter.output_lines().to_vec();
    Ok((result, output))
}

/// Run braw source under instrumentation and return the folded coverage
/// data
pub fn run_covered(source: &str, unit_name: &str, kind: Coverage) -> SiccarResult<ProjectData> {
    let program = parse(source)?;
    let filters = coverage::default_filters();
    let (mut project, probes) = coverage::enumerate(&program, unit_name, kind, &filters);
    let session = CoverageSession::new(probes);
    let mut interpreter = Interpreter::new().with_coverage(session);
    interpreter.interpret(&program)?;
    if let Some(session) = interpreter.take_session() {
        session.apply_to(&mut project);
    }
    Ok(project)
}
