//! The reporter: loads every session named by the args, merges them,
//! applies the class filter, and renders XML or a text summary.

use crate::coverage::{BranchCounts, ClassData, LineCoverage, ProjectData};
use crate::error::SiccarResult;
use crate::logging;
use crate::report::args::{ClassFilter, ReporterArgs};
use crate::report::binary;

pub struct Reporter {
    args: ReporterArgs,
}

impl Reporter {
    pub fn new(args: ReporterArgs) -> Self {
        Reporter { args }
    }

    pub fn args(&self) -> &ReporterArgs {
        &self.args
    }

    /// Load aw sessions, merge them and apply the class filter
    pub fn collect(&self) -> SiccarResult<ProjectData> {
        let filter = ClassFilter::from_args(&self.args)?;

        let mut merged = ProjectData::new();
        for entry in &self.args.reports {
            let session = binary::load(&entry.ic)?;
            logging::debug(
                "siccar::report",
                format!(
                    "merging {} ({} classes)",
                    entry.ic.display(),
                    session.class_count()
                ),
            );
            merged.merge(&session);
        }

        merged.retain_classes(|name| filter.matches(name));
        Ok(merged)
    }

    pub fn xml_report(&self) -> SiccarResult<String> {
        Ok(Self::render_xml(&self.collect()?))
    }

    pub fn text_summary(&self) -> SiccarResult<String> {
        Ok(Self::render_text(&self.collect()?))
    }

    /// Render the XML report. Classes and lines come oot in BTreeMap
    /// order, so the output is deterministic.
    pub fn render_xml(project: &ProjectData) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<report name=\"siccar\">\n");

        let mut total_lines = Counter::default();
        let mut total_branches = Counter::default();

        for class in project.classes() {
            let (lines, branches) = class_counters(class);
            total_lines.add(&lines);
            total_branches.add(&branches);

            out.push_str(&format!("  <class name=\"{}\">\n", escape(&class.name)));
            for line in class.lines() {
                let counts = line.branch_counts();
                out.push_str(&format!(
                    "    <line num=\"{}\" hits=\"{}\" status=\"{}\" covered_branches=\"{}\" total_branches=\"{}\"",
                    line.line,
                    line.hits,
                    line.status(),
                    counts.covered,
                    counts.total,
                ));
                if line.jumps.is_empty() && line.switches.is_empty() {
                    out.push_str("/>\n");
                } else {
                    out.push_str(">\n");
                    for (i, jump) in line.jumps.iter().enumerate() {
                        out.push_str(&format!(
                            "      <jump index=\"{}\" true=\"{}\" false=\"{}\"/>\n",
                            i, jump.true_hits, jump.false_hits
                        ));
                    }
                    for (i, switch) in line.switches.iter().enumerate() {
                        out.push_str(&format!(
                            "      <switch index=\"{}\" default=\"{}\" keys=\"{}\" hits=\"{}\"/>\n",
                            i,
                            switch.default_hits,
                            join_nums(&switch.keys),
                            join_nums(&switch.hits),
                        ));
                    }
                    out.push_str("    </line>\n");
                }
            }
            out.push_str(&counter_xml("    ", "LINE", &lines));
            out.push_str(&counter_xml("    ", "BRANCH", &branches));
            out.push_str("  </class>\n");
        }

        out.push_str(&counter_xml("  ", "LINE", &total_lines));
        out.push_str(&counter_xml("  ", "BRANCH", &total_branches));
        out.push_str("</report>\n");
        out
    }

    /// Per-class line and branch percentages fer the terminal
    pub fn render_text(project: &ProjectData) -> String {
        let mut out = String::new();
        let mut total_lines = Counter::default();
        let mut total_branches = Counter::default();

        for class in project.classes() {
            let (lines, branches) = class_counters(class);
            out.push_str(&format!(
                "{}: lines {} branches {}\n",
                class.name,
                lines.summary(),
                branches.summary()
            ));
            total_lines.add(&lines);
            total_branches.add(&branches);
        }

        out.push_str(&format!(
            "total: lines {} branches {}\n",
            total_lines.summary(),
            total_branches.summary()
        ));
        out
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counter {
    covered: usize,
    missed: usize,
}

impl Counter {
    fn add(&mut self, other: &Counter) {
        self.covered += other.covered;
        self.missed += other.missed;
    }

    fn summary(&self) -> String {
        let total = self.covered + self.missed;
        if total == 0 {
            return "0/0".to_string();
        }
        format!(
            "{}/{} ({:.1}%)",
            self.covered,
            total,
            100.0 * self.covered as f64 / total as f64
        )
    }
}

fn class_counters(class: &ClassData) -> (Counter, Counter) {
    let mut lines = Counter::default();
    let mut branches = BranchCounts::default();
    for line in class.lines() {
        if line.status() == LineCoverage::None {
            lines.missed += 1;
        } else {
            lines.covered += 1;
        }
        branches.add(line.branch_counts());
    }
    (
        lines,
        Counter {
            covered: branches.covered,
            missed: branches.total - branches.covered,
        },
    )
}

fn counter_xml(indent: &str, kind: &str, counter: &Counter) -> String {
    format!(
        "{}<counter type=\"{}\" covered=\"{}\" missed=\"{}\"/>\n",
        indent, kind, counter.covered, counter.missed
    )
}

fn join_nums<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
