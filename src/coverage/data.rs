use std::collections::BTreeMap;
use std::fmt;

/// Coverage data fer a whole run - every class the enumerator kent aboot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectData {
    classes: BTreeMap<String, ClassData>,
}

impl ProjectData {
    pub fn new() -> Self {
        ProjectData {
            classes: BTreeMap::new(),
        }
    }

    pub fn get_or_create_class(&mut self, name: &str) -> &mut ClassData {
        self.classes
            .entry(name.to_string())
            .or_insert_with(|| ClassData::new(name.to_string()))
    }

    pub fn get_class(&self, name: &str) -> Option<&ClassData> {
        self.classes.get(name)
    }

    /// Iterate classes in name order
    pub fn classes(&self) -> impl Iterator<Item = &ClassData> {
        self.classes.values()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Drop classes the predicate doesnae want (reporter include/exclude)
    pub fn retain_classes<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.classes.retain(|name, _| keep(name));
    }

    /// Fold anither run's hits intae this ane. Jumps and switches match up
    /// positionally, so both sides must come frae the same source.
    pub fn merge(&mut self, other: &ProjectData) {
        for other_class in other.classes() {
            let class = self.get_or_create_class(&other_class.name);
            class.merge(other_class);
        }
    }
}

/// Coverage data fer a single unit - a fixture file or a function within it
#[derive(Debug, Clone, PartialEq)]
pub struct ClassData {
    pub name: String,
    lines: Vec<Option<LineData>>,
}

impl ClassData {
    pub fn new(name: String) -> Self {
        ClassData {
            name,
            lines: Vec::new(),
        }
    }

    pub fn get_or_create_line(&mut self, line: usize, method_signature: &str) -> &mut LineData {
        if line >= self.lines.len() {
            self.lines.resize(line + 1, None);
        }
        self.lines[line].get_or_insert_with(|| LineData::new(line, method_signature.to_string()))
    }

    pub fn line(&self, line: usize) -> Option<&LineData> {
        self.lines.get(line).and_then(|l| l.as_ref())
    }

    pub fn line_mut(&mut self, line: usize) -> Option<&mut LineData> {
        self.lines.get_mut(line).and_then(|l| l.as_mut())
    }

    /// Iterate registered lines in line order, skipping the gaps
    pub fn lines(&self) -> impl Iterator<Item = &LineData> {
        self.lines.iter().flatten()
    }

    pub fn line_count(&self) -> usize {
        self.lines.iter().flatten().count()
    }

    fn merge(&mut self, other: &ClassData) {
        for other_line in other.lines() {
            let line = self.get_or_create_line(other_line.line, &other_line.method_signature);
            line.merge(other_line);
        }
    }
}

/// Hits fer ane source line, plus ony branches that sit on it
#[derive(Debug, Clone, PartialEq)]
pub struct LineData {
    pub line: usize,
    pub method_signature: String,
    pub hits: u64,
    pub jumps: Vec<JumpData>,
    pub switches: Vec<SwitchData>,
}

impl LineData {
    pub fn new(line: usize, method_signature: String) -> Self {
        LineData {
            line,
            method_signature,
            hits: 0,
            jumps: Vec::new(),
            switches: Vec::new(),
        }
    }

    /// Register a twa-way branch on this line. Returns its index.
    pub fn register_jump(&mut self) -> usize {
        self.jumps.push(JumpData::default());
        self.jumps.len() - 1
    }

    /// Register a multi-way branch on this line. Returns its index.
    pub fn register_switch(&mut self, keys: Vec<i64>) -> usize {
        self.switches.push(SwitchData::new(keys));
        self.switches.len() - 1
    }

    pub fn touch(&mut self, count: u64) {
        self.hits += count;
    }

    /// Derive the line's coverage status frae its hits and branches
    pub fn status(&self) -> LineCoverage {
        if self.hits == 0 {
            return LineCoverage::None;
        }
        let jumps_full = self
            .jumps
            .iter()
            .all(|j| j.true_hits > 0 && j.false_hits > 0);
        let switches_full = self
            .switches
            .iter()
            .all(|s| s.default_hits > 0 && s.hits.iter().all(|&h| h > 0));
        if jumps_full && switches_full {
            LineCoverage::Full
        } else {
            LineCoverage::Partial
        }
    }

    /// Count covered and total branches on this line. A jump is twa branches,
    /// a switch is ane per key plus the default path.
    pub fn branch_counts(&self) -> BranchCounts {
        let mut counts = BranchCounts::default();
        for jump in &self.jumps {
            counts.total += 2;
            if jump.true_hits > 0 {
                counts.covered += 1;
            }
            if jump.false_hits > 0 {
                counts.covered += 1;
            }
        }
        for switch in &self.switches {
            counts.total += switch.keys.len() + 1;
            counts.covered += switch.hits.iter().filter(|&&h| h > 0).count();
            if switch.default_hits > 0 {
                counts.covered += 1;
            }
        }
        counts
    }

    fn merge(&mut self, other: &LineData) {
        self.hits += other.hits;
        for (i, other_jump) in other.jumps.iter().enumerate() {
            if i >= self.jumps.len() {
                self.jumps.push(JumpData::default());
            }
            self.jumps[i].true_hits += other_jump.true_hits;
            self.jumps[i].false_hits += other_jump.false_hits;
        }
        for (i, other_switch) in other.switches.iter().enumerate() {
            if i >= self.switches.len() {
                self.switches.push(SwitchData::new(other_switch.keys.clone()));
            }
            let switch = &mut self.switches[i];
            switch.default_hits += other_switch.default_hits;
            for (k, &h) in other_switch.hits.iter().enumerate() {
                if k < switch.hits.len() {
                    switch.hits[k] += h;
                }
            }
        }
    }
}

/// A twa-way branch: how often each airm ran
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JumpData {
    pub true_hits: u64,
    pub false_hits: u64,
}

/// A multi-way branch: ane counter per key plus the default path
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchData {
    pub keys: Vec<i64>,
    pub hits: Vec<u64>,
    pub default_hits: u64,
}

impl SwitchData {
    pub fn new(keys: Vec<i64>) -> Self {
        let hits = vec![0; keys.len()];
        SwitchData {
            keys,
            hits,
            default_hits: 0,
        }
    }

    /// Bump the counter fer a key, or the default if the key isnae kent
    pub fn hit_key(&mut self, key: i64, count: u64) {
        match self.keys.iter().position(|&k| k == key) {
            Some(idx) => self.hits[idx] += count,
            None => self.default_hits += count,
        }
    }
}

/// How well a line got covered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCoverage {
    /// Never ran
    None,
    /// Ran, but some branch airms didnae
    Partial,
    /// Ran wi every branch airm taken
    Full,
}

impl fmt::Display for LineCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineCoverage::None => write!(f, "none"),
            LineCoverage::Partial => write!(f, "partial"),
            LineCoverage::Full => write!(f, "full"),
        }
    }
}

/// Covered/total branch tally fer a line or a whole class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchCounts {
    pub covered: usize,
    pub total: usize,
}

impl BranchCounts {
    pub fn add(&mut self, other: BranchCounts) {
        self.covered += other.covered;
        self.total += other.total;
    }
}
