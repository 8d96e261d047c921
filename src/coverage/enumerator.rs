use std::collections::HashMap;

use crate::ast::{Expr, NodeId, Program, Stmt};
use crate::coverage::data::ProjectData;
use crate::coverage::filters::LineFilter;
use crate::logging;

/// Which flavour o coverage a run gathers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coverage {
    /// Line hits only
    #[default]
    Line,
    /// Line hits plus jump and switch outcomes
    Branch,
}

/// Probe slot fer a single source line
#[derive(Debug, Clone)]
pub struct LineProbe {
    pub class: String,
    pub slot: usize,
}

/// Probe slots fer a twa-way branch
#[derive(Debug, Clone)]
pub struct JumpProbe {
    pub class: String,
    pub line: usize,
    pub jump_index: usize,
    pub true_slot: usize,
    pub false_slot: usize,
}

/// Probe slots fer a keek dispatch: ane per key plus the default path
#[derive(Debug, Clone)]
pub struct SwitchProbe {
    pub class: String,
    pub line: usize,
    pub switch_index: usize,
    pub key_slots: Vec<usize>,
    pub default_slot: usize,
}

/// The static probe table. Who owns which slot is fixed before the program
/// runs; execution only ever increments.
#[derive(Debug, Default)]
pub struct BranchProbes {
    lines: HashMap<usize, LineProbe>,
    jumps: HashMap<NodeId, JumpProbe>,
    switches: HashMap<NodeId, SwitchProbe>,
    size: usize,
}

impl BranchProbes {
    pub fn line(&self, line: usize) -> Option<&LineProbe> {
        self.lines.get(&line)
    }

    pub fn jump(&self, id: NodeId) -> Option<&JumpProbe> {
        self.jumps.get(&id)
    }

    pub fn switch(&self, id: NodeId) -> Option<&SwitchProbe> {
        self.switches.get(&id)
    }

    /// Total slot count - the length o the hits array
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn lines(&self) -> impl Iterator<Item = (usize, &LineProbe)> {
        self.lines.iter().map(|(line, probe)| (*line, probe))
    }

    pub fn jumps(&self) -> impl Iterator<Item = &JumpProbe> {
        self.jumps.values()
    }

    pub fn switches(&self) -> impl Iterator<Item = &SwitchProbe> {
        self.switches.values()
    }
}

/// Walks a program and hands oot probe slots, building the skeleton
/// `ProjectData` alang the way (every line and branch registered, zero hits)
pub struct BranchEnumerator<'a> {
    kind: Coverage,
    filters: &'a [Box<dyn LineFilter>],
    class: String,
    signature: String,
    project: ProjectData,
    probes: BranchProbes,
}

impl<'a> BranchEnumerator<'a> {
    fn new(unit_name: &str, kind: Coverage, filters: &'a [Box<dyn LineFilter>]) -> Self {
        BranchEnumerator {
            kind,
            filters,
            class: unit_name.to_string(),
            signature: "<main>".to_string(),
            project: ProjectData::new(),
            probes: BranchProbes::default(),
        }
    }

    fn alloc_slot(&mut self) -> usize {
        let slot = self.probes.size;
        self.probes.size += 1;
        slot
    }

    fn ignored(&self, stmt: &Stmt) -> bool {
        self.filters.iter().any(|f| f.should_ignore(stmt))
    }

    fn register_line(&mut self, line: usize) {
        if self.probes.lines.contains_key(&line) {
            return;
        }
        self.project
            .get_or_create_class(&self.class)
            .get_or_create_line(line, &self.signature);
        let slot = self.alloc_slot();
        self.probes.lines.insert(
            line,
            LineProbe {
                class: self.class.clone(),
                slot,
            },
        );
    }

    fn register_jump(&mut self, id: NodeId, line: usize) {
        if self.kind != Coverage::Branch {
            return;
        }
        let jump_index = self
            .project
            .get_or_create_class(&self.class)
            .get_or_create_line(line, &self.signature)
            .register_jump();
        let true_slot = self.alloc_slot();
        let false_slot = self.alloc_slot();
        self.probes.jumps.insert(
            id,
            JumpProbe {
                class: self.class.clone(),
                line,
                jump_index,
                true_slot,
                false_slot,
            },
        );
    }

    fn register_switch(&mut self, id: NodeId, line: usize, key_count: usize) {
        if self.kind != Coverage::Branch {
            return;
        }
        let keys: Vec<i64> = (0..key_count as i64).collect();
        let switch_index = self
            .project
            .get_or_create_class(&self.class)
            .get_or_create_line(line, &self.signature)
            .register_switch(keys);
        let key_slots: Vec<usize> = (0..key_count).map(|_| self.alloc_slot()).collect();
        let default_slot = self.alloc_slot();
        self.probes.switches.insert(
            id,
            SwitchProbe {
                class: self.class.clone(),
                line,
                switch_index,
                key_slots,
                default_slot,
            },
        );
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        if !self.ignored(stmt) {
            self.register_line(stmt.span().line);
        }

        match stmt {
            Stmt::VarDecl { initializer, .. } => {
                if let Some(expr) = initializer {
                    self.visit_expr(expr);
                }
            }
            Stmt::Expression { expr, .. } => self.visit_expr(expr),
            Stmt::Print { value, .. } => self.visit_expr(value),
            Stmt::Return { value, .. } => {
                if let Some(expr) = value {
                    self.visit_expr(expr);
                }
            }
            Stmt::Block { statements, .. } => {
                for statement in statements {
                    self.visit_stmt(statement);
                }
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                id,
                span,
            } => {
                self.register_jump(*id, span.line);
                self.visit_expr(condition);
                self.visit_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.visit_stmt(else_branch);
                }
            }
            Stmt::While {
                condition,
                body,
                id,
                span,
            } => {
                self.register_jump(*id, span.line);
                self.visit_expr(condition);
                self.visit_stmt(body);
            }
            Stmt::For {
                iterable,
                body,
                id,
                span,
                ..
            } => {
                self.register_jump(*id, span.line);
                self.visit_expr(iterable);
                self.visit_stmt(body);
            }
            Stmt::Match {
                value,
                arms,
                id,
                span,
            } => {
                let key_count = arms.iter().filter(|a| !a.pattern.is_default()).count();
                self.register_switch(*id, span.line, key_count);
                self.visit_expr(value);
                for arm in arms {
                    self.visit_stmt(&arm.body);
                }
            }
            Stmt::Function {
                name, params, body, ..
            } => {
                // Function bodies get a unit o their ain
                let fn_class = format!("{}::{}", self.class, name);
                let fn_signature = format!("{}({})", name, params.join(", "));
                let saved_class = std::mem::replace(&mut self.class, fn_class);
                let saved_signature = std::mem::replace(&mut self.signature, fn_signature);
                self.project.get_or_create_class(&self.class);

                for statement in body {
                    self.visit_stmt(statement);
                }

                self.class = saved_class;
                self.signature = saved_signature;
            }
            Stmt::Enum { .. } | Stmt::Break { .. } | Stmt::Continue { .. } => {}
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Logical {
                left,
                right,
                id,
                span,
                ..
            } => {
                self.register_jump(*id, span.line);
                self.visit_expr(left);
                self.visit_expr(right);
            }
            Expr::Binary { left, right, .. } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            Expr::Unary { operand, .. } => self.visit_expr(operand),
            Expr::Assign { value, .. } => self.visit_expr(value),
            Expr::Call {
                callee, arguments, ..
            } => {
                self.visit_expr(callee);
                for argument in arguments {
                    self.visit_expr(argument);
                }
            }
            Expr::Get { object, .. } => self.visit_expr(object),
            Expr::Range { start, end, .. } => {
                self.visit_expr(start);
                self.visit_expr(end);
            }
            Expr::Grouping { expr, .. } => self.visit_expr(expr),
            Expr::Literal { .. } | Expr::Variable { .. } => {}
        }
    }
}

/// Enumerate a program's probes. Returns the skeleton coverage data (every
/// class, line and branch registered wi zero hits) and the probe table.
pub fn enumerate(
    program: &Program,
    unit_name: &str,
    kind: Coverage,
    filters: &[Box<dyn LineFilter>],
) -> (ProjectData, BranchProbes) {
    let mut enumerator = BranchEnumerator::new(unit_name, kind, filters);
    enumerator.project.get_or_create_class(unit_name);

    for stmt in &program.statements {
        enumerator.visit_stmt(stmt);
    }

    logging::debug(
        "siccar::coverage",
        format!(
            "enumerated {}: {} slots ({} lines, {} jumps, {} switches)",
            unit_name,
            enumerator.probes.size,
            enumerator.probes.lines.len(),
            enumerator.probes.jumps.len(),
            enumerator.probes.switches.len()
        ),
    );

    (enumerator.project, enumerator.probes)
}
