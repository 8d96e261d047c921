//! Reporter arguments: a wee JSON file describing which sessions tae
//! merge, where the XML goes, and which classes tae include or exclude.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

use crate::error::{SiccarError, SiccarResult};

/// Parsed contents o a reporter args file
#[derive(Debug, Clone, Deserialize)]
pub struct ReporterArgs {
    /// Session files tae merge, ane entry per run
    pub reports: Vec<ReportEntry>,
    /// Where the XML report goes (optional - stdout itherwise)
    #[serde(default)]
    pub xml: Option<PathBuf>,
    /// Source roots, kept fer report metadata
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    #[serde(default)]
    pub include: Option<ClassPatterns>,
    #[serde(default)]
    pub exclude: Option<ClassPatterns>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportEntry {
    /// The binary session file
    pub ic: PathBuf,
    /// Source map, accepted but no used (braw has nae source maps)
    #[serde(default)]
    pub smap: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassPatterns {
    #[serde(default)]
    pub classes: Vec<String>,
}

impl ReporterArgs {
    pub fn from_file(path: &Path) -> SiccarResult<ReporterArgs> {
        let text = fs::read_to_string(path).map_err(|e| SiccarError::ArgsFile {
            message: format!("couldnae read '{}': {}", path.display(), e),
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> SiccarResult<ReporterArgs> {
        serde_json::from_str(text).map_err(|e| SiccarError::ArgsFile {
            message: format!("{}\n{}", e, Self::help()),
        })
    }

    pub fn help() -> &'static str {
        r#"Expected args file shape:
{
  "reports": [{"ic": "run1.ic"}, {"ic": "run2.ic", "smap": "run2.smap"}],
  "xml": "coverage.xml",
  "sources": ["tests/fixtures"],
  "include": {"classes": ["when_.*"]},
  "exclude": {"classes": [".*::helper"]}
}
"reports" is required; the rest is optional."#
    }
}

/// Compiled include/exclude class patterns. An empty include set means
/// include everything; exclude aye wins.
#[derive(Debug)]
pub struct ClassFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl ClassFilter {
    pub fn from_args(args: &ReporterArgs) -> SiccarResult<ClassFilter> {
        let include = compile_patterns(args.include.as_ref())?;
        let exclude = compile_patterns(args.exclude.as_ref())?;
        Ok(ClassFilter { include, exclude })
    }

    pub fn matches(&self, class_name: &str) -> bool {
        if self.exclude.iter().any(|re| re.is_match(class_name)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|re| re.is_match(class_name))
    }
}

fn compile_patterns(patterns: Option<&ClassPatterns>) -> SiccarResult<Vec<Regex>> {
    let mut compiled = Vec::new();
    if let Some(patterns) = patterns {
        for pattern in &patterns.classes {
            let re = Regex::new(pattern).map_err(|e| SiccarError::BadClassPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            compiled.push(re);
        }
    }
    Ok(compiled)
}
