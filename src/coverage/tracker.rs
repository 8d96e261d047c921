use crate::ast::NodeId;
use crate::coverage::data::ProjectData;
use crate::coverage::enumerator::BranchProbes;

/// The runtime side o instrumentation: a flat hits array indexed by probe
/// slot. Execution only ever increments; the structure lives in the probes.
#[derive(Debug)]
pub struct CoverageTracker {
    hits: Vec<u64>,
}

impl CoverageTracker {
    pub fn new(size: usize) -> Self {
        CoverageTracker {
            hits: vec![0; size],
        }
    }

    pub fn hit(&mut self, slot: usize) {
        if let Some(count) = self.hits.get_mut(slot) {
            *count += 1;
        }
    }

    pub fn hits(&self, slot: usize) -> u64 {
        self.hits.get(slot).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Fold a finished run's hits array intae the coverage model. The skeleton
/// already holds every line and branch; this only moves counters across.
pub fn apply_hits(tracker: &CoverageTracker, probes: &BranchProbes, project: &mut ProjectData) {
    for (line, probe) in probes.lines() {
        let count = tracker.hits(probe.slot);
        if count > 0 {
            if let Some(data) = project.get_or_create_class(&probe.class).line_mut(line) {
                data.touch(count);
            }
        }
    }

    for probe in probes.jumps() {
        if let Some(data) = project.get_or_create_class(&probe.class).line_mut(probe.line) {
            if let Some(jump) = data.jumps.get_mut(probe.jump_index) {
                jump.true_hits += tracker.hits(probe.true_slot);
                jump.false_hits += tracker.hits(probe.false_slot);
            }
        }
    }

    for probe in probes.switches() {
        if let Some(data) = project.get_or_create_class(&probe.class).line_mut(probe.line) {
            if let Some(switch) = data.switches.get_mut(probe.switch_index) {
                for (key, &slot) in probe.key_slots.iter().enumerate() {
                    if key < switch.hits.len() {
                        switch.hits[key] += tracker.hits(slot);
                    }
                }
                switch.default_hits += tracker.hits(probe.default_slot);
            }
        }
    }
}

/// Everything a single instrumented run needs: the probe table and the hits
/// array it drives. The interpreter pokes this through three wee hooks.
#[derive(Debug)]
pub struct CoverageSession {
    probes: BranchProbes,
    tracker: CoverageTracker,
}

impl CoverageSession {
    pub fn new(probes: BranchProbes) -> Self {
        let tracker = CoverageTracker::new(probes.size());
        CoverageSession { probes, tracker }
    }

    /// A statement on this line ran (or a loop header evaluated its condition)
    pub fn line_hit(&mut self, line: usize) {
        if let Some(probe) = self.probes.line(line) {
            self.tracker.hit(probe.slot);
        }
    }

    /// A twa-way branch took an outcome
    pub fn jump_hit(&mut self, id: NodeId, outcome: bool) {
        if let Some(probe) = self.probes.jump(id) {
            let slot = if outcome {
                probe.true_slot
            } else {
                probe.false_slot
            };
            self.tracker.hit(slot);
        }
    }

    /// A keek dispatched: `Some(key)` fer a keyed arm, `None` fer the
    /// default path (catch-aw arm or nae match at aw)
    pub fn switch_hit(&mut self, id: NodeId, key: Option<usize>) {
        if let Some(probe) = self.probes.switch(id) {
            let slot = match key {
                Some(k) => match probe.key_slots.get(k) {
                    Some(&slot) => slot,
                    None => probe.default_slot,
                },
                None => probe.default_slot,
            };
            self.tracker.hit(slot);
        }
    }

    /// Fold the gathered hits intae the model
    pub fn apply_to(&self, project: &mut ProjectData) {
        apply_hits(&self.tracker, &self.probes, project);
    }

    pub fn probes(&self) -> &BranchProbes {
        &self.probes
    }

    pub fn tracker(&self) -> &CoverageTracker {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::data::LineCoverage;
    use crate::coverage::enumerator::{enumerate, Coverage};
    use crate::coverage::filters::default_filters;
    use crate::parser::parse;

    fn session_for(source: &str) -> (ProjectData, CoverageSession) {
        let program = parse(source).unwrap();
        let filters = default_filters();
        let (project, probes) = enumerate(&program, "test.braw", Coverage::Branch, &filters);
        (project, CoverageSession::new(probes))
    }

    #[test]
    fn test_tracker_bounds() {
        let mut tracker = CoverageTracker::new(2);
        tracker.hit(0);
        tracker.hit(0);
        tracker.hit(99); // oot o range, ignored
        assert_eq!(tracker.hits(0), 2);
        assert_eq!(tracker.hits(1), 0);
        assert_eq!(tracker.hits(99), 0);
        assert_eq!(tracker.len(), 2);
        assert!(!tracker.is_empty());
    }

    #[test]
    fn test_line_hits_fold_into_model() {
        let (mut project, mut session) = session_for("ken x = 1\nblether x");
        session.line_hit(1);
        session.line_hit(2);
        session.line_hit(2);
        session.line_hit(42); // nae such line, ignored

        session.apply_to(&mut project);

        let class = project.get_class("test.braw").unwrap();
        assert_eq!(class.line(1).unwrap().hits, 1);
        assert_eq!(class.line(2).unwrap().hits, 2);
        assert_eq!(class.line(1).unwrap().status(), LineCoverage::Full);
    }

    #[test]
    fn test_jump_hits_fold_into_model() {
        let (mut project, mut session) = session_for("gin 1 < 2 {\n  blether \"aye\"\n}");
        session.line_hit(1);
        session.jump_hit(0, true);

        session.apply_to(&mut project);

        let class = project.get_class("test.braw").unwrap();
        let line = class.line(1).unwrap();
        assert_eq!(line.jumps[0].true_hits, 1);
        assert_eq!(line.jumps[0].false_hits, 0);
        assert_eq!(line.status(), LineCoverage::Partial);
    }

    #[test]
    fn test_switch_hits_fold_into_model() {
        let source = "\
keek 2 {
  whan 1 -> blether \"ane\"
  whan 2 -> blether \"twa\"
  whan _ -> blether \"hantle\"
}";
        let (mut project, mut session) = session_for(source);
        // The keek is the only id-bearing node in this source, so id 0
        session.line_hit(1);
        session.switch_hit(0, Some(1));
        session.switch_hit(0, None);

        session.apply_to(&mut project);

        let class = project.get_class("test.braw").unwrap();
        let switch = &class.line(1).unwrap().switches[0];
        assert_eq!(switch.hits, vec![0, 1]);
        assert_eq!(switch.default_hits, 1);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let (mut project, mut session) = session_for("ken x = 1");
        session.jump_hit(7, true);
        session.switch_hit(9, Some(0));
        session.apply_to(&mut project);

        let class = project.get_class("test.braw").unwrap();
        assert_eq!(class.line(1).unwrap().hits, 0);
    }

    #[test]
    fn test_repeated_apply_accumulates() {
        let (mut project, mut session) = session_for("ken x = 1");
        session.line_hit(1);
        session.apply_to(&mut project);
        session.apply_to(&mut project);

        // apply_to adds on tap o whatever's already there
        let class = project.get_class("test.braw").unwrap();
        assert_eq!(class.line(1).unwrap().hits, 2);
    }
}
