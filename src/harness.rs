//! The verification harness. Fixture programs carry expected-coverage
//! markers in trailing comments; the harness runs a fixture under
//! instrumentation, extracts the markers, and asserts the collected
//! data matches. Suites implement [`CoverageCase`] and get a one-line
//! `test(name)` driver fer free.
//!
//! Marker grammar, at the end o a source line:
//!
//! ```text
//! # cov: full
//! # cov: partial branches: 2/4
//! # cov: none hits: 0
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::coverage::{
    default_filters, enumerate, BranchCounts, Coverage, CoverageSession, LineCoverage, LineData,
    ProjectData,
};
use crate::error::{SiccarError, SiccarResult};
use crate::interpreter::Interpreter;
use crate::logging;
use crate::parser::parse;

const MARKER: &str = "# cov:";

/// A test scenario: the fixture file and, once extracted, the expected
/// coverage. A value - verification attaches expectations tae a copy.
#[derive(Debug, Clone)]
pub struct TestConfiguration {
    pub file_with_markers: PathBuf,
    pub coverage_data: Option<ExpectedCoverage>,
    pub main: Option<String>,
}

impl TestConfiguration {
    pub fn new(file_with_markers: PathBuf) -> Self {
        TestConfiguration {
            file_with_markers,
            coverage_data: None,
            main: None,
        }
    }

    /// A copy carrying the extracted expectations; the original stays as
    /// it wis.
    pub fn with_coverage_data(&self, expected: ExpectedCoverage) -> Self {
        TestConfiguration {
            file_with_markers: self.file_with_markers.clone(),
            coverage_data: Some(expected),
            main: self.main.clone(),
        }
    }
}

/// Whit the markers in a fixture file promise, line by line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectedCoverage {
    pub lines: BTreeMap<usize, ExpectedLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedLine {
    pub status: LineCoverage,
    pub branches: Option<BranchCounts>,
    pub hits: Option<u64>,
}

/// The shared harness contract: a coverage kind, a verification hook,
/// and a provided driver that runs a named fixture through the whole
/// pipeline. Ony failure alang the way panics - naething gets swallowed.
pub trait CoverageCase {
    fn coverage(&self) -> Coverage {
        Coverage::Line
    }

    fn fixtures_root(&self) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
    }

    fn verify_results(&self, project: &ProjectData, config: &TestConfiguration) {
        let expected = extract_lines_info_from_file(&config.file_with_markers)
            .unwrap_or_else(|e| panic!("couldnae extract markers: {}", e));
        assert_equals_lines_info(project, &config.with_coverage_data(expected));
    }

    /// Run the fixture named by a dotted identifier, then hand the
    /// collected data tae `verify_results`
    fn test(&self, name: &str) {
        logging::init_from_env();
        let path = self.fixtures_root().join(fixture_relative_path(name));
        let config = TestConfiguration::new(path);
        let (project, _output) = run_fixture(&config.file_with_markers, self.coverage())
            .unwrap_or_else(|e| panic!("fixture '{}' failed: {}", name, e));
        self.verify_results(&project, &config);
    }
}

/// `"cases.whenEnum"` becomes `cases/when_enum.braw`
pub fn fixture_relative_path(name: &str) -> PathBuf {
    let mut path = PathBuf::new();
    let segments: Vec<&str> = name.split('.').collect();
    for (i, segment) in segments.iter().enumerate() {
        if i + 1 == segments.len() {
            path.push(format!("{}.braw", camel_to_snake(segment)));
        } else {
            path.push(segment);
        }
    }
    path
}

fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Run a fixture under the given coverage kind. Returns the folded
/// coverage data and whatever the program blethered.
pub fn run_fixture(path: &Path, kind: Coverage) -> SiccarResult<(ProjectData, String)> {
    let source = fs::read_to_string(path).map_err(|e| SiccarError::FileError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let unit_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let program = parse(&source)?;
    let filters = default_filters();
    let (mut project, probes) = enumerate(&program, &unit_name, kind, &filters);

    let session = CoverageSession::new(probes);
    let mut interpreter = Interpreter::new().with_coverage(session);
    interpreter.interpret(&program)?;
    let output = interpreter.take_output();

    if let Some(session) = interpreter.take_session() {
        session.apply_to(&mut project);
    }
    Ok((project, output))
}

/// Pull the expected branch coverage oot o a fixture's marker comments.
/// A malformed marker is an error, never silently skipped.
pub fn extract_branches_info_from_file(path: &Path) -> SiccarResult<ExpectedCoverage> {
    extract_markers(path)
}

/// Line-mode alias: same markers, the assertion just ignores branches
pub fn extract_lines_info_from_file(path: &Path) -> SiccarResult<ExpectedCoverage> {
    extract_markers(path)
}

fn extract_markers(path: &Path) -> SiccarResult<ExpectedCoverage> {
    let source = fs::read_to_string(path).map_err(|e| SiccarError::FileError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut expected = ExpectedCoverage::default();
    for (idx, text) in source.lines().enumerate() {
        let line = idx + 1;
        let Some(pos) = text.find(MARKER) else {
            continue;
        };
        let marker = parse_marker(&text[pos + MARKER.len()..]).map_err(|message| {
            SiccarError::MarkerError {
                path: path.display().to_string(),
                line,
                message,
            }
        })?;
        expected.lines.insert(line, marker);
    }
    Ok(expected)
}

fn parse_marker(text: &str) -> Result<ExpectedLine, String> {
    let mut parts = text.split_whitespace();
    let status = match parts.next() {
        Some("full") => LineCoverage::Full,
        Some("partial") => LineCoverage::Partial,
        Some("none") => LineCoverage::None,
        Some(other) => return Err(format!("unkent status '{}'", other)),
        None => return Err("marker wi nae status".to_string()),
    };

    let mut branches = None;
    let mut hits = None;
    while let Some(field) = parts.next() {
        match field {
            "branches:" => {
                let value = parts.next().ok_or("'branches:' wi nae value")?;
                let (covered, total) = value
                    .split_once('/')
                    .ok_or_else(|| format!("branches value '{}' isnae C/T", value))?;
                branches = Some(BranchCounts {
                    covered: covered
                        .parse()
                        .map_err(|_| format!("bad covered count '{}'", covered))?,
                    total: total
                        .parse()
                        .map_err(|_| format!("bad total count '{}'", total))?,
                });
            }
            "hits:" => {
                let value = parts.next().ok_or("'hits:' wi nae value")?;
                hits = Some(
                    value
                        .parse()
                        .map_err(|_| format!("bad hits count '{}'", value))?,
                );
            }
            other => return Err(format!("unkent field '{}'", other)),
        }
    }

    Ok(ExpectedLine {
        status,
        branches,
        hits,
    })
}

/// Every source line belongs tae exactly ane class (the file unit or a
/// function unit), so the per-file view is a simple union.
fn line_view(project: &ProjectData) -> BTreeMap<usize, &LineData> {
    let mut view = BTreeMap::new();
    for class in project.classes() {
        for line in class.lines() {
            view.insert(line.line, line);
        }
    }
    view
}

/// Assert collected branch coverage matches the expectations in the
/// configuration. Panics wi a line-by-line diff on ony mismatch.
pub fn assert_equals_branches_info(project: &ProjectData, config: &TestConfiguration) {
    compare(project, config, true);
}

/// The line-mode analogue: status and hits only
pub fn assert_equals_lines_info(project: &ProjectData, config: &TestConfiguration) {
    compare(project, config, false);
}

fn compare(project: &ProjectData, config: &TestConfiguration, check_branches: bool) {
    let expected = config
        .coverage_data
        .as_ref()
        .expect("configuration carries nae expected coverage");
    let mismatches = mismatches(project, expected, check_branches);
    if !mismatches.is_empty() {
        panic!(
            "coverage mismatch in {}:\n  {}",
            config.file_with_markers.display(),
            mismatches.join("\n  ")
        );
    }
}

/// Run a fixture and compare against its ain markers, withoot panicking.
/// Returns the mismatch descriptions - empty means the fixture holds.
pub fn verify_fixture(path: &Path, kind: Coverage) -> SiccarResult<Vec<String>> {
    let (project, _output) = run_fixture(path, kind)?;
    let expected = extract_markers(path)?;
    Ok(mismatches(&project, &expected, kind == Coverage::Branch))
}

fn mismatches(
    project: &ProjectData,
    expected: &ExpectedCoverage,
    check_branches: bool,
) -> Vec<String> {
    let actual = line_view(project);

    let mut mismatches = Vec::new();
    for (line, want) in &expected.lines {
        let Some(got) = actual.get(line) else {
            mismatches.push(format!(
                "line {}: expected {} but nae coverage data wis collected",
                line, want.status
            ));
            continue;
        };

        if got.status() != want.status {
            mismatches.push(format!(
                "line {}: expected status {}, got {} (hits {})",
                line,
                want.status,
                got.status(),
                got.hits
            ));
        }
        if check_branches {
            if let Some(want_counts) = want.branches {
                let got_counts = got.branch_counts();
                if got_counts != want_counts {
                    mismatches.push(format!(
                        "line {}: expected branches {}/{}, got {}/{}",
                        line,
                        want_counts.covered,
                        want_counts.total,
                        got_counts.covered,
                        got_counts.total
                    ));
                }
            }
        }
        if let Some(want_hits) = want.hits {
            if got.hits != want_hits {
                mismatches.push(format!(
                    "line {}: expected {} hits, got {}",
                    line, want_hits, got.hits
                ));
            }
        }
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixture_file(source: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".braw")
            .tempfile()
            .unwrap();
        file.write_all(source.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_fixture_name_resolution() {
        assert_eq!(
            fixture_relative_path("cases.whenEnum"),
            PathBuf::from("cases/when_enum.braw")
        );
        assert_eq!(
            fixture_relative_path("branches.ifElse"),
            PathBuf::from("branches/if_else.braw")
        );
        assert_eq!(
            fixture_relative_path("basic"),
            PathBuf::from("basic.braw")
        );
    }

    #[test]
    fn test_parse_marker_variants() {
        let m = parse_marker(" full").unwrap();
        assert_eq!(m.status, LineCoverage::Full);
        assert_eq!(m.branches, None);
        assert_eq!(m.hits, None);

        let m = parse_marker(" partial branches: 2/4").unwrap();
        assert_eq!(m.status, LineCoverage::Partial);
        assert_eq!(m.branches, Some(BranchCounts { covered: 2, total: 4 }));

        let m = parse_marker(" full branches: 2/2 hits: 4").unwrap();
        assert_eq!(m.hits, Some(4));
    }

    #[test]
    fn test_parse_marker_rejects_nonsense() {
        assert!(parse_marker(" fully").is_err());
        assert!(parse_marker("").is_err());
        assert!(parse_marker(" full branches: 2-4").is_err());
        assert!(parse_marker(" full branches:").is_err());
        assert!(parse_marker(" full sheep: 3").is_err());
    }

    #[test]
    fn test_extract_markers() {
        let file = fixture_file(
            "ken x = 1   # cov: full hits: 1\nken y = 2\nblether x   # cov: full\n",
        );
        let expected = extract_branches_info_from_file(file.path()).unwrap();
        assert_eq!(expected.lines.len(), 2);
        assert_eq!(expected.lines[&1].hits, Some(1));
        assert!(expected.lines.get(&2).is_none());
        assert_eq!(expected.lines[&3].status, LineCoverage::Full);
    }

    #[test]
    fn test_malformed_marker_fails_loudly() {
        let file = fixture_file("ken x = 1  # cov: hale\n");
        let err = extract_branches_info_from_file(file.path()).unwrap_err();
        match err {
            SiccarError::MarkerError { line, message, .. } => {
                assert_eq!(line, 1);
                assert!(message.contains("hale"));
            }
            other => panic!("expected MarkerError, got {:?}", other),
        }
    }

    #[test]
    fn test_run_fixture_collects_and_captures() {
        let file = fixture_file("ken x = 2\nblether x * 21\n");
        let (project, output) = run_fixture(file.path(), Coverage::Branch).unwrap();
        assert_eq!(output, "42\n");

        let view = line_view(&project);
        assert_eq!(view[&1].hits, 1);
        assert_eq!(view[&2].hits, 1);
    }

    #[test]
    fn test_run_fixture_missing_file() {
        let err = run_fixture(Path::new("naewhere.braw"), Coverage::Line).unwrap_err();
        assert!(matches!(err, SiccarError::FileError { .. }));
    }

    #[test]
    fn test_assertion_passes_on_matching_data() {
        let source = "\
ken x = 1          # cov: full hits: 1
gin x == 1 {       # cov: partial branches: 1/2
  blether \"aye\"  # cov: full
}";
        let file = fixture_file(source);
        let (project, _) = run_fixture(file.path(), Coverage::Branch).unwrap();
        let config = TestConfiguration::new(file.path().to_path_buf());
        let expected = extract_branches_info_from_file(file.path()).unwrap();
        assert_equals_branches_info(&project, &config.with_coverage_data(expected));
        // The original configuration is untouched
        assert!(config.coverage_data.is_none());
    }

    #[test]
    #[should_panic(expected = "expected status full, got partial")]
    fn test_assertion_panics_on_status_mismatch() {
        let source = "\
ken x = 1
gin x == 1 {       # cov: full
  blether \"aye\"
}";
        let file = fixture_file(source);
        let (project, _) = run_fixture(file.path(), Coverage::Branch).unwrap();
        let config = TestConfiguration::new(file.path().to_path_buf());
        let expected = extract_branches_info_from_file(file.path()).unwrap();
        assert_equals_branches_info(&project, &config.with_coverage_data(expected));
    }

    #[test]
    #[should_panic(expected = "nae coverage data wis collected")]
    fn test_assertion_panics_on_unregistered_line() {
        let file = fixture_file("ken x = 1\n# cov: full\n");
        let (project, _) = run_fixture(file.path(), Coverage::Branch).unwrap();
        let config = TestConfiguration::new(file.path().to_path_buf());
        let expected = extract_branches_info_from_file(file.path()).unwrap();
        assert_equals_branches_info(&project, &config.with_coverage_data(expected));
    }

    #[test]
    fn test_verify_fixture_clean_and_mismatched() {
        let file = fixture_file("ken x = 1   # cov: full hits: 1\n");
        assert!(verify_fixture(file.path(), Coverage::Branch)
            .unwrap()
            .is_empty());

        let file = fixture_file("ken x = 1   # cov: none\n");
        let problems = verify_fixture(file.path(), Coverage::Branch).unwrap();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("expected status none"));
    }

    #[test]
    fn test_line_mode_ignores_branch_markers() {
        // In line mode the gin line haes nae jumps, so it reads full;
        // the branches field is only checked by the branch assertion
        let source = "\
ken x = 1
gin x == 1 {       # cov: full branches: 1/2
  blether \"aye\"
}";
        let file = fixture_file(source);
        let (project, _) = run_fixture(file.path(), Coverage::Line).unwrap();
        let config = TestConfiguration::new(file.path().to_path_buf());
        let expected = extract_lines_info_from_file(file.path()).unwrap();
        assert_equals_lines_info(&project, &config.with_coverage_data(expected));
    }
}
