//! Tree-walking interpreter fer braw. When a coverage session is attached
//! it reports line, jump and switch hits as it goes; the session's probe
//! table decides which o them actually land anywhere.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{
    BinaryOp, Expr, Literal, LogicalOp, MatchArm, NodeId, Pattern, Program, Stmt, UnaryOp,
};
use crate::coverage::CoverageSession;
use crate::error::{SiccarError, SiccarResult};
use crate::value::{Environment, FunctionDef, IlkDef, RangeValue, Value, VariantValue};

// Each braw call costs a guid wheen o native frames, so the guard has
// tae trip well inside a 2 MiB thread stack
const MAX_CALL_DEPTH: usize = 64;

/// Control flow signals
#[derive(Debug)]
enum ControlFlow {
    Return(Value),
    Break,
    Continue,
}

/// The interpreter - runs braw programs
pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    output: Vec<String>,
    session: Option<CoverageSession>,
    call_depth: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));
        Interpreter {
            globals: globals.clone(),
            environment: globals,
            output: Vec::new(),
            session: None,
            call_depth: 0,
        }
    }

    /// Attach a coverage session; the run then feeds it hits
    pub fn with_coverage(mut self, session: CoverageSession) -> Self {
        self.session = Some(session);
        self
    }

    /// Hand back the session (and its gathered hits) efter a run
    pub fn take_session(&mut self) -> Option<CoverageSession> {
        self.session.take()
    }

    /// Captured `blether` output, ane line per call
    pub fn output_lines(&self) -> &[String] {
        &self.output
    }

    /// Drain the captured output as a single string
    pub fn take_output(&mut self) -> String {
        let mut text = self.output.join("\n");
        if !self.output.is_empty() {
            text.push('\n');
        }
        self.output.clear();
        text
    }

    pub fn interpret(&mut self, program: &Program) -> SiccarResult<Value> {
        let mut result = Value::Nil;
        for stmt in &program.statements {
            result = self.execute_stmt(stmt)?;
        }
        Ok(result)
    }

    // --- coverage hooks; aw three are no-ops wioot a session ---

    fn line_hit(&mut self, line: usize) {
        if let Some(session) = &mut self.session {
            session.line_hit(line);
        }
    }

    fn jump_hit(&mut self, id: NodeId, outcome: bool) {
        if let Some(session) = &mut self.session {
            session.jump_hit(id, outcome);
        }
    }

    fn switch_hit(&mut self, id: NodeId, key: Option<usize>) {
        if let Some(session) = &mut self.session {
            session.switch_hit(id, key);
        }
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> SiccarResult<Value> {
        match self.execute_stmt_with_control(stmt)? {
            Ok(value) => Ok(value),
            Err(ControlFlow::Return(value)) => Ok(value),
            Err(ControlFlow::Break) => Err(SiccarError::BreakOutsideLoop {
                line: stmt.span().line,
            }),
            Err(ControlFlow::Continue) => Err(SiccarError::ContinueOutsideLoop {
                line: stmt.span().line,
            }),
        }
    }

    fn execute_stmt_with_control(
        &mut self,
        stmt: &Stmt,
    ) -> SiccarResult<Result<Value, ControlFlow>> {
        // Loop headers get their line hit per condition check instead,
        // so the count reads as "how often the loop asked tae go roond".
        // Blocks are skipped the same way the enumerator's filter skips
        // them: a `{` sharing the header line mustnae coont twice.
        match stmt {
            Stmt::While { .. } | Stmt::For { .. } | Stmt::Block { .. } => {}
            _ => self.line_hit(stmt.span().line),
        }

        match stmt {
            Stmt::VarDecl {
                name, initializer, ..
            } => {
                let value = if let Some(init) = initializer {
                    self.evaluate(init)?
                } else {
                    Value::Nil
                };
                self.environment.borrow_mut().define(name.clone(), value);
                Ok(Ok(Value::Nil))
            }

            Stmt::Expression { expr, .. } => {
                let value = self.evaluate(expr)?;
                Ok(Ok(value))
            }

            Stmt::Block { statements, .. } => self.execute_block(statements, None),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
                id,
                ..
            } => {
                let truthy = self.evaluate(condition)?.is_truthy();
                self.jump_hit(*id, truthy);
                if truthy {
                    self.execute_stmt_with_control(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_stmt_with_control(else_branch)
                } else {
                    Ok(Ok(Value::Nil))
                }
            }

            Stmt::While {
                condition,
                body,
                id,
                span,
            } => {
                loop {
                    self.line_hit(span.line);
                    let truthy = self.evaluate(condition)?.is_truthy();
                    self.jump_hit(*id, truthy);
                    if !truthy {
                        break;
                    }
                    match self.execute_stmt_with_control(body)? {
                        Ok(_) => {}
                        Err(ControlFlow::Break) => break,
                        Err(ControlFlow::Continue) => continue,
                        Err(ControlFlow::Return(v)) => return Ok(Err(ControlFlow::Return(v))),
                    }
                }
                Ok(Ok(Value::Nil))
            }

            Stmt::For {
                variable,
                iterable,
                body,
                id,
                span,
            } => {
                let iter_value = self.evaluate(iterable)?;
                let range = match iter_value {
                    Value::Range(range) => range,
                    other => {
                        return Err(SiccarError::NotIterable {
                            type_name: other.type_name().to_string(),
                            line: span.line,
                        });
                    }
                };

                let mut broke = false;
                for item in range.iter() {
                    self.line_hit(span.line);
                    self.jump_hit(*id, true);
                    self.environment
                        .borrow_mut()
                        .define(variable.clone(), Value::Integer(item));
                    match self.execute_stmt_with_control(body)? {
                        Ok(_) => {}
                        Err(ControlFlow::Break) => {
                            broke = true;
                            break;
                        }
                        Err(ControlFlow::Continue) => continue,
                        Err(ControlFlow::Return(v)) => return Ok(Err(ControlFlow::Return(v))),
                    }
                }
                // A brak means the exhaustion check never ran
                if !broke {
                    self.line_hit(span.line);
                    self.jump_hit(*id, false);
                }
                Ok(Ok(Value::Nil))
            }

            Stmt::Function {
                name, params, body, ..
            } => {
                let func = FunctionDef::new(
                    name.clone(),
                    params.clone(),
                    body.clone(),
                    Some(self.environment.clone()),
                );
                self.environment
                    .borrow_mut()
                    .define(name.clone(), Value::Function(Rc::new(func)));
                Ok(Ok(Value::Nil))
            }

            Stmt::Enum { name, variants, .. } => {
                let ilk = IlkDef::new(name.clone(), variants.clone());
                self.environment
                    .borrow_mut()
                    .define(name.clone(), Value::Ilk(Rc::new(ilk)));
                Ok(Ok(Value::Nil))
            }

            Stmt::Return { value, .. } => {
                let ret_val = if let Some(expr) = value {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };
                Ok(Err(ControlFlow::Return(ret_val)))
            }

            Stmt::Print { value, .. } => {
                let val = self.evaluate(value)?;
                let output = format!("{}", val);
                println!("{}", output);
                self.output.push(output);
                Ok(Ok(Value::Nil))
            }

            Stmt::Break { .. } => Ok(Err(ControlFlow::Break)),

            Stmt::Continue { .. } => Ok(Err(ControlFlow::Continue)),

            Stmt::Match {
                value,
                arms,
                id,
                span,
            } => {
                let subject = self.evaluate(value)?;
                self.execute_match(&subject, arms, *id, span.line)
            }
        }
    }

    fn execute_match(
        &mut self,
        subject: &Value,
        arms: &[MatchArm],
        id: NodeId,
        line: usize,
    ) -> SiccarResult<Result<Value, ControlFlow>> {
        // Keys are the ordinals o the non-default arms, in source order
        let mut key = 0usize;
        for arm in arms {
            match &arm.pattern {
                Pattern::Wildcard => {
                    self.switch_hit(id, None);
                    return self.execute_stmt_with_control(&arm.body);
                }
                Pattern::Identifier(name) => {
                    self.switch_hit(id, None);
                    let env = Rc::new(RefCell::new(Environment::with_enclosing(
                        self.environment.clone(),
                    )));
                    env.borrow_mut().define(name.clone(), subject.clone());
                    return self.execute_in_env(&arm.body, env);
                }
                pattern => {
                    if self.pattern_matches(pattern, subject, arm.span.line)? {
                        self.switch_hit(id, Some(key));
                        return self.execute_stmt_with_control(&arm.body);
                    }
                    key += 1;
                }
            }
        }
        // Naething caught it: the no-match path is the default leg
        self.switch_hit(id, None);
        Err(SiccarError::NonExhaustiveMatch { line })
    }

    fn pattern_matches(
        &mut self,
        pattern: &Pattern,
        value: &Value,
        line: usize,
    ) -> SiccarResult<bool> {
        match pattern {
            Pattern::Literal(lit) => Ok(literal_value(lit) == *value),
            Pattern::Variant { ilk, name } => match value {
                Value::Variant(variant) if variant.ilk.name == *ilk => {
                    match variant.ilk.ordinal_of(name) {
                        Some(ordinal) => Ok(variant.ordinal == ordinal),
                        None => Err(SiccarError::UnkentVariant {
                            ilk: ilk.clone(),
                            variant: name.clone(),
                            line,
                        }),
                    }
                }
                _ => Ok(false),
            },
            Pattern::Identifier(_) | Pattern::Wildcard => Ok(true),
        }
    }

    fn execute_block(
        &mut self,
        statements: &[Stmt],
        env: Option<Rc<RefCell<Environment>>>,
    ) -> SiccarResult<Result<Value, ControlFlow>> {
        let previous = self.environment.clone();
        let new_env = env.unwrap_or_else(|| {
            Rc::new(RefCell::new(Environment::with_enclosing(previous.clone())))
        });
        self.environment = new_env;

        let mut result = Ok(Value::Nil);
        for stmt in statements {
            match self.execute_stmt_with_control(stmt) {
                Ok(Ok(v)) => result = Ok(v),
                Ok(Err(cf)) => {
                    self.environment = previous;
                    return Ok(Err(cf));
                }
                Err(e) => {
                    self.environment = previous;
                    return Err(e);
                }
            }
        }

        self.environment = previous;
        Ok(result)
    }

    fn execute_in_env(
        &mut self,
        stmt: &Stmt,
        env: Rc<RefCell<Environment>>,
    ) -> SiccarResult<Result<Value, ControlFlow>> {
        let previous = std::mem::replace(&mut self.environment, env);
        let result = self.execute_stmt_with_control(stmt);
        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> SiccarResult<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(literal_value(value)),

            Expr::Variable { name, span } => self
                .environment
                .borrow()
                .get(name)
                .ok_or_else(|| SiccarError::UndefinedVariable {
                    name: name.clone(),
                    line: span.line,
                }),

            Expr::Assign { name, value, span } => {
                let val = self.evaluate(value)?;
                if !self.environment.borrow_mut().assign(name, val.clone()) {
                    return Err(SiccarError::UndefinedVariable {
                        name: name.clone(),
                        line: span.line,
                    });
                }
                Ok(val)
            }

            Expr::Binary {
                left,
                operator,
                right,
                span,
            } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                binary_op(&left_val, *operator, &right_val, span.line)
            }

            Expr::Unary {
                operator,
                operand,
                span,
            } => {
                let val = self.evaluate(operand)?;
                match operator {
                    UnaryOp::Negate => match val {
                        Value::Integer(n) => n
                            .checked_neg()
                            .map(Value::Integer)
                            .ok_or(SiccarError::IntegerOverflow { line: span.line }),
                        Value::Float(f) => Ok(Value::Float(-f)),
                        other => Err(SiccarError::TypeError {
                            message: format!("Cannae negate a {}", other.type_name()),
                            line: span.line,
                        }),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!val.is_truthy())),
                }
            }

            Expr::Logical {
                left,
                operator,
                right,
                id,
                ..
            } => {
                // The left operand decides the jump: truthy is the true
                // leg, falsy the false leg, whichever operator it is
                let left_val = self.evaluate(left)?;
                let decides = left_val.is_truthy();
                self.jump_hit(*id, decides);
                match operator {
                    LogicalOp::And => {
                        if decides {
                            self.evaluate(right)
                        } else {
                            Ok(left_val)
                        }
                    }
                    LogicalOp::Or => {
                        if decides {
                            Ok(left_val)
                        } else {
                            self.evaluate(right)
                        }
                    }
                }
            }

            Expr::Call {
                callee,
                arguments,
                span,
            } => {
                let callee_val = self.evaluate(callee)?;
                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }
                match callee_val {
                    Value::Function(func) => self.call_function(&func, args, span.line),
                    other => {
                        let name = match callee.as_ref() {
                            Expr::Variable { name, .. } => name.clone(),
                            _ => other.type_name().to_string(),
                        };
                        Err(SiccarError::NotCallable {
                            name,
                            line: span.line,
                        })
                    }
                }
            }

            Expr::Get {
                object,
                property,
                span,
            } => {
                let obj = self.evaluate(object)?;
                match obj {
                    Value::Ilk(ilk) => match ilk.ordinal_of(property) {
                        Some(ordinal) => Ok(Value::Variant(VariantValue {
                            ilk: ilk.clone(),
                            ordinal,
                        })),
                        None => Err(SiccarError::UnkentVariant {
                            ilk: ilk.name.clone(),
                            variant: property.clone(),
                            line: span.line,
                        }),
                    },
                    other => Err(SiccarError::NotAnIlk {
                        type_name: other.type_name().to_string(),
                        line: span.line,
                    }),
                }
            }

            Expr::Range { start, end, span } => {
                let start_val = self.evaluate(start)?;
                let end_val = self.evaluate(end)?;
                match (start_val, end_val) {
                    (Value::Integer(s), Value::Integer(e)) => {
                        Ok(Value::Range(RangeValue::new(s, e)))
                    }
                    (s, e) => Err(SiccarError::TypeError {
                        message: format!(
                            "Range ends must be integers, no {} and {}",
                            s.type_name(),
                            e.type_name()
                        ),
                        line: span.line,
                    }),
                }
            }

            Expr::Grouping { expr, .. } => self.evaluate(expr),
        }
    }

    fn call_function(
        &mut self,
        func: &FunctionDef,
        args: Vec<Value>,
        line: usize,
    ) -> SiccarResult<Value> {
        if args.len() != func.arity() {
            return Err(SiccarError::WrongArity {
                name: func.name.clone(),
                expected: func.arity(),
                got: args.len(),
                line,
            });
        }
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(SiccarError::StackOverflow { line });
        }

        let env = Rc::new(RefCell::new(Environment::with_enclosing(
            func.closure.clone().unwrap_or_else(|| self.globals.clone()),
        )));
        for (param, arg) in func.params.iter().zip(args) {
            env.borrow_mut().define(param.clone(), arg);
        }

        self.call_depth += 1;
        let result = self.execute_block(&func.body, Some(env));
        self.call_depth -= 1;

        match result? {
            Ok(v) => Ok(v),
            Err(ControlFlow::Return(v)) => Ok(v),
            Err(ControlFlow::Break) => Ok(Value::Nil),
            Err(ControlFlow::Continue) => Ok(Value::Nil),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Integer(n) => Value::Integer(*n),
        Literal::Float(f) => Value::Float(*f),
        Literal::String(s) => Value::String(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Nil => Value::Nil,
    }
}

fn binary_op(left: &Value, op: BinaryOp, right: &Value, line: usize) -> SiccarResult<Value> {
    use BinaryOp::*;

    match op {
        Equal => return Ok(Value::Bool(left == right)),
        NotEqual => return Ok(Value::Bool(left != right)),
        _ => {}
    }

    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => match op {
            Add => a
                .checked_add(*b)
                .map(Value::Integer)
                .ok_or(SiccarError::IntegerOverflow { line }),
            Subtract => a
                .checked_sub(*b)
                .map(Value::Integer)
                .ok_or(SiccarError::IntegerOverflow { line }),
            Multiply => a
                .checked_mul(*b)
                .map(Value::Integer)
                .ok_or(SiccarError::IntegerOverflow { line }),
            Divide => {
                if *b == 0 {
                    Err(SiccarError::DivisionByZero { line })
                } else {
                    Ok(Value::Integer(a / b))
                }
            }
            Modulo => {
                if *b == 0 {
                    Err(SiccarError::DivisionByZero { line })
                } else {
                    Ok(Value::Integer(a % b))
                }
            }
            Less => Ok(Value::Bool(a < b)),
            LessEqual => Ok(Value::Bool(a <= b)),
            Greater => Ok(Value::Bool(a > b)),
            GreaterEqual => Ok(Value::Bool(a >= b)),
            Equal | NotEqual => unreachable!(),
        },

        (Value::Float(_), Value::Float(_))
        | (Value::Integer(_), Value::Float(_))
        | (Value::Float(_), Value::Integer(_)) => {
            let a = as_float(left);
            let b = as_float(right);
            match op {
                Add => Ok(Value::Float(a + b)),
                Subtract => Ok(Value::Float(a - b)),
                Multiply => Ok(Value::Float(a * b)),
                Divide => Ok(Value::Float(a / b)),
                Modulo => Ok(Value::Float(a % b)),
                Less => Ok(Value::Bool(a < b)),
                LessEqual => Ok(Value::Bool(a <= b)),
                Greater => Ok(Value::Bool(a > b)),
                GreaterEqual => Ok(Value::Bool(a >= b)),
                Equal | NotEqual => unreachable!(),
            }
        }

        (Value::String(a), Value::String(b)) => match op {
            Add => Ok(Value::String(format!("{}{}", a, b))),
            Less => Ok(Value::Bool(a < b)),
            LessEqual => Ok(Value::Bool(a <= b)),
            Greater => Ok(Value::Bool(a > b)),
            GreaterEqual => Ok(Value::Bool(a >= b)),
            _ => Err(SiccarError::TypeError {
                message: format!("Cannae apply '{}' tae strings", op),
                line,
            }),
        },

        _ => Err(SiccarError::TypeError {
            message: format!(
                "Cannae apply '{}' tae a {} and a {}",
                op,
                left.type_name(),
                right.type_name()
            ),
            line,
        }),
    }
}

fn as_float(value: &Value) -> f64 {
    match value {
        Value::Integer(n) => *n as f64,
        Value::Float(f) => *f,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{default_filters, enumerate, Coverage, ProjectData};
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> SiccarResult<Value> {
        let program = parse(source).unwrap();
        Interpreter::new().interpret(&program)
    }

    fn run_output(source: &str) -> Vec<String> {
        let program = parse(source).unwrap();
        let mut interpreter = Interpreter::new();
        interpreter.interpret(&program).unwrap();
        interpreter.output_lines().to_vec()
    }

    fn run_covered(source: &str) -> ProjectData {
        let program = parse(source).unwrap();
        let filters = default_filters();
        let (mut project, probes) = enumerate(&program, "test.braw", Coverage::Branch, &filters);
        let session = CoverageSession::new(probes);
        let mut interpreter = Interpreter::new().with_coverage(session);
        interpreter.interpret(&program).unwrap();
        let session = interpreter.take_session().unwrap();
        session.apply_to(&mut project);
        project
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("2 + 3 * 4").unwrap(), Value::Integer(14));
        assert_eq!(run("(2 + 3) * 4").unwrap(), Value::Integer(20));
        assert_eq!(run("7 / 2").unwrap(), Value::Integer(3));
        assert_eq!(run("7 % 2").unwrap(), Value::Integer(1));
        assert_eq!(run("7.0 / 2").unwrap(), Value::Float(3.5));
        assert_eq!(run("-5 + 2").unwrap(), Value::Integer(-3));
    }

    #[test]
    fn test_string_concat() {
        assert_eq!(
            run("\"hiya \" + \"pal\"").unwrap(),
            Value::String("hiya pal".to_string())
        );
        assert!(matches!(
            run("\"hiya\" - \"pal\""),
            Err(SiccarError::TypeError { .. })
        ));
    }

    #[test]
    fn test_division_by_zero() {
        let err = run("ken x = 0\n10 / x").unwrap_err();
        assert!(matches!(err, SiccarError::DivisionByZero { line: 2 }));
        assert!(matches!(
            run("5 % 0"),
            Err(SiccarError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_integer_overflow() {
        let err = run(&format!("{} + 1", i64::MAX)).unwrap_err();
        assert!(matches!(err, SiccarError::IntegerOverflow { .. }));
    }

    #[test]
    fn test_variables_and_assignment() {
        assert_eq!(run("ken x = 1\nx = x + 2\nx").unwrap(), Value::Integer(3));
        assert!(matches!(
            run("y = 1"),
            Err(SiccarError::UndefinedVariable { .. })
        ));
        assert!(matches!(
            run("blether y"),
            Err(SiccarError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn test_gin_ither() {
        let source = "\
ken x = 5
gin x > 3 {
  blether \"muckle\"
} ither {
  blether \"wee\"
}";
        assert_eq!(run_output(source), vec!["muckle"]);
    }

    #[test]
    fn test_whiles_with_brak_and_haud() {
        let source = "\
ken total = 0
ken i = 0
whiles i < 10 {
  i = i + 1
  gin i % 2 == 0 {
    haud
  }
  gin i > 7 {
    brak
  }
  total = total + i
}
total";
        // Odd numbers 1,3,5,7 then brak at 9
        assert_eq!(run(source).unwrap(), Value::Integer(16));
    }

    #[test]
    fn test_fer_over_range() {
        let source = "\
ken total = 0
fer i in 1..5 {
  total = total + i
}
total";
        assert_eq!(run(source).unwrap(), Value::Integer(10));
    }

    #[test]
    fn test_fer_requires_range() {
        let err = run("fer i in 5 {\n  blether i\n}").unwrap_err();
        assert!(matches!(err, SiccarError::NotIterable { line: 1, .. }));
    }

    #[test]
    fn test_brak_outside_loop() {
        assert!(matches!(
            run("brak"),
            Err(SiccarError::BreakOutsideLoop { .. })
        ));
        assert!(matches!(
            run("haud"),
            Err(SiccarError::ContinueOutsideLoop { .. })
        ));
    }

    #[test]
    fn test_functions_and_recursion() {
        let source = "\
dae factorial(n) {
  gin n <= 1 {
    gie 1
  }
  gie n * factorial(n - 1)
}
factorial(5)";
        assert_eq!(run(source).unwrap(), Value::Integer(120));
    }

    #[test]
    fn test_wrong_arity() {
        let err = run("dae f(a, b) {\n  gie a + b\n}\nf(1)").unwrap_err();
        match err {
            SiccarError::WrongArity {
                name,
                expected,
                got,
                line,
            } => {
                assert_eq!(name, "f");
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
                assert_eq!(line, 4);
            }
            other => panic!("expected WrongArity, got {:?}", other),
        }
    }

    #[test]
    fn test_not_callable() {
        let err = run("ken x = 1\nx()").unwrap_err();
        assert!(matches!(err, SiccarError::NotCallable { .. }));
    }

    #[test]
    fn test_stack_overflow() {
        let err = run("dae f() {\n  gie f()\n}\nf()").unwrap_err();
        assert!(matches!(err, SiccarError::StackOverflow { .. }));
    }

    #[test]
    fn test_recursion_under_the_limit_is_fine() {
        // The guard must leave room fer honest recursion
        let source = "\
dae coont(n) {
  gin n == 0 {
    gie 0
  }
  gie 1 + coont(n - 1)
}
coont(50)";
        assert_eq!(run(source).unwrap(), Value::Integer(50));
    }

    #[test]
    fn test_closures() {
        let source = "\
dae make_counter() {
  ken count = 0
  dae bump() {
    count = count + 1
    gie count
  }
  gie bump
}
ken c = make_counter()
c()
c()
c()";
        assert_eq!(run(source).unwrap(), Value::Integer(3));
    }

    #[test]
    fn test_logical_short_circuit() {
        // The right side o an `an` wi a falsy left never runs
        let source = "\
ken touched = nae
dae touch() {
  touched = aye
  gie aye
}
nae an touch()
touched";
        assert_eq!(run(source).unwrap(), Value::Bool(false));

        let source = "\
ken touched = nae
dae touch() {
  touched = aye
  gie aye
}
aye or touch()
touched";
        assert_eq!(run(source).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_ilk_and_variant_access() {
        let source = "\
ilk Season {
  Spring,
  Simmer,
  Hairst,
  Winter
}
ken s = Season.Winter
blether s";
        assert_eq!(run_output(source), vec!["Season.Winter"]);
    }

    #[test]
    fn test_unkent_variant() {
        let source = "\
ilk Season {
  Spring
}
Season.Dreich";
        let err = run(source).unwrap_err();
        assert!(matches!(err, SiccarError::UnkentVariant { line: 4, .. }));
    }

    #[test]
    fn test_get_on_non_ilk() {
        let err = run("ken x = 1\nx.y").unwrap_err();
        assert!(matches!(err, SiccarError::NotAnIlk { .. }));
    }

    #[test]
    fn test_keek_literals() {
        let source = "\
ken x = 2
keek x {
  whan 1 -> blether \"ane\"
  whan 2 -> blether \"twa\"
  whan _ -> blether \"hantle\"
}";
        assert_eq!(run_output(source), vec!["twa"]);
    }

    #[test]
    fn test_keek_variant_dispatch() {
        let source = "\
ilk Season {
  Spring,
  Winter
}
ken s = Season.Spring
keek s {
  whan Season.Spring -> blether \"snawdraps\"
  whan Season.Winter -> blether \"dreich\"
}";
        assert_eq!(run_output(source), vec!["snawdraps"]);
    }

    #[test]
    fn test_keek_binding_arm() {
        let source = "\
keek 42 {
  whan 1 -> blether \"ane\"
  whan n -> blether n + 1
}";
        assert_eq!(run_output(source), vec!["43"]);
    }

    #[test]
    fn test_keek_nae_match() {
        let source = "\
keek 9 {
  whan 1 -> blether \"ane\"
}";
        let err = run(source).unwrap_err();
        assert!(matches!(err, SiccarError::NonExhaustiveMatch { line: 1 }));
    }

    #[test]
    fn test_take_output() {
        let program = parse("blether \"ane\"\nblether \"twa\"").unwrap();
        let mut interpreter = Interpreter::new();
        interpreter.interpret(&program).unwrap();
        assert_eq!(interpreter.take_output(), "ane\ntwa\n");
        assert_eq!(interpreter.take_output(), "");
    }

    // --- instrumented runs ---

    #[test]
    fn test_covered_if_both_legs() {
        let source = "\
fer i in 0..2 {
  gin i == 0 {
    blether \"first\"
  } ither {
    blether \"rest\"
  }
}";
        let project = run_covered(source);
        let class = project.get_class("test.braw").unwrap();

        let gin_line = class.line(2).unwrap();
        assert_eq!(gin_line.hits, 2);
        assert_eq!(gin_line.jumps[0].true_hits, 1);
        assert_eq!(gin_line.jumps[0].false_hits, 1);

        // Loop header: 2 iterations plus the exhaustion check
        let fer_line = class.line(1).unwrap();
        assert_eq!(fer_line.hits, 3);
        assert_eq!(fer_line.jumps[0].true_hits, 2);
        assert_eq!(fer_line.jumps[0].false_hits, 1);
    }

    #[test]
    fn test_covered_if_one_leg() {
        let source = "\
ken x = 1
gin x == 1 {
  blether \"aye\"
}";
        let project = run_covered(source);
        let class = project.get_class("test.braw").unwrap();
        let line = class.line(2).unwrap();
        assert_eq!(line.jumps[0].true_hits, 1);
        assert_eq!(line.jumps[0].false_hits, 0);
        assert_eq!(
            line.status(),
            crate::coverage::LineCoverage::Partial
        );
    }

    #[test]
    fn test_covered_whiles_header_counts_condition_checks() {
        let source = "\
ken i = 0
whiles i < 3 {
  i = i + 1
}";
        let project = run_covered(source);
        let class = project.get_class("test.braw").unwrap();
        let header = class.line(2).unwrap();
        assert_eq!(header.hits, 4);
        assert_eq!(header.jumps[0].true_hits, 3);
        assert_eq!(header.jumps[0].false_hits, 1);
    }

    #[test]
    fn test_block_brace_on_header_line_doesnae_double_hit() {
        // The `{` o a then-branch or loop body sits on the header line;
        // entering the block mustnae add a hit on top o the header's ain
        let source = "\
dae check(n) {
  gin n > 3 {
    gie aye
  }
  gie nae
}
check(5)
check(7)";
        let project = run_covered(source);
        let class = project.get_class("test.braw::check").unwrap();
        assert_eq!(class.line(2).unwrap().hits, 2);

        let loop_source = "\
ken i = 0
whiles i < 3 {
  i = i + 1
}";
        let project = run_covered(loop_source);
        let header = project.get_class("test.braw").unwrap().line(2).unwrap();
        assert_eq!(header.hits, 4);
    }

    #[test]
    fn test_covered_fer_brak_leaves_exit_unhit() {
        let source = "\
fer i in 0..10 {
  gin i == 2 {
    brak
  }
}";
        let project = run_covered(source);
        let class = project.get_class("test.braw").unwrap();
        let header = class.line(1).unwrap();
        // Three iterations entered, nae exhaustion check
        assert_eq!(header.hits, 3);
        assert_eq!(header.jumps[0].true_hits, 3);
        assert_eq!(header.jumps[0].false_hits, 0);
    }

    #[test]
    fn test_covered_logical_jump() {
        let source = "\
ken a = aye
ken b = nae
gin a an b {
  blether \"baith\"
}";
        let project = run_covered(source);
        let class = project.get_class("test.braw").unwrap();
        let line = class.line(3).unwrap();
        // Jump 0 is the gin, jump 1 the an (registration order)
        assert_eq!(line.jumps.len(), 2);
        assert_eq!(line.jumps[0].true_hits, 0);
        assert_eq!(line.jumps[0].false_hits, 1);
        assert_eq!(line.jumps[1].true_hits, 1);
        assert_eq!(line.jumps[1].false_hits, 0);
    }

    #[test]
    fn test_covered_keek_keys_and_default() {
        let source = "\
fer i in 0..3 {
  keek i {
    whan 0 -> blether \"nocht\"
    whan 1 -> blether \"ane\"
    whan _ -> blether \"mair\"
  }
}";
        let project = run_covered(source);
        let class = project.get_class("test.braw").unwrap();
        let switch = &class.line(2).unwrap().switches[0];
        assert_eq!(switch.hits, vec![1, 1]);
        assert_eq!(switch.default_hits, 1);
    }

    #[test]
    fn test_covered_function_body_lands_in_own_class() {
        let source = "\
dae double(n) {
  gie n * 2
}
blether double(21)";
        let project = run_covered(source);

        let fn_class = project.get_class("test.braw::double").unwrap();
        assert_eq!(fn_class.line(2).unwrap().hits, 1);

        let file_class = project.get_class("test.braw").unwrap();
        assert_eq!(file_class.line(4).unwrap().hits, 1);
    }

    #[test]
    fn test_uninstrumented_run_records_naething() {
        let program = parse("ken x = 1").unwrap();
        let mut interpreter = Interpreter::new();
        interpreter.interpret(&program).unwrap();
        assert!(interpreter.take_session().is_none());
    }
}
