use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::Stmt;

/// Runtime values in braw
#[derive(Debug, Clone)]
pub enum Value {
    /// Integer number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// String
    String(String),
    /// Boolean (aye/nae)
    Bool(bool),
    /// Null value (naething)
    Nil,
    /// Range iterator
    Range(RangeValue),
    /// Function
    Function(Rc<FunctionDef>),
    /// An ilk (enum) definition
    Ilk(Rc<IlkDef>),
    /// A single variant of an ilk
    Variant(VariantValue),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Nil => "naething",
            Value::Range(_) => "range",
            Value::Function(_) => "function",
            Value::Ilk(_) => "ilk",
            Value::Variant(_) => "variant",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Nil => false,
            _ => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(true) => write!(f, "aye"),
            Value::Bool(false) => write!(f, "nae"),
            Value::Nil => write!(f, "naething"),
            Value::Range(r) => write!(f, "{}..{}", r.start, r.end),
            Value::Function(func) => write!(f, "<dae {}>", func.name),
            Value::Ilk(ilk) => write!(f, "<ilk {}>", ilk.name),
            Value::Variant(v) => write!(f, "{}.{}", v.ilk.name, v.name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) => (*a as f64) == *b,
            (Value::Float(a), Value::Integer(b)) => *a == (*b as f64),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Range(a), Value::Range(b)) => a.start == b.start && a.end == b.end,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Ilk(a), Value::Ilk(b)) => Rc::ptr_eq(a, b),
            (Value::Variant(a), Value::Variant(b)) => {
                a.ilk.name == b.ilk.name && a.ordinal == b.ordinal
            }
            _ => false,
        }
    }
}

/// A user-defined function
#[derive(Debug)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub closure: Option<Rc<RefCell<Environment>>>,
}

impl FunctionDef {
    pub fn new(
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
        closure: Option<Rc<RefCell<Environment>>>,
    ) -> Self {
        FunctionDef {
            name,
            params,
            body,
            closure,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// An ilk definition - a named set of variants
#[derive(Debug)]
pub struct IlkDef {
    pub name: String,
    pub variants: Vec<String>,
}

impl IlkDef {
    pub fn new(name: String, variants: Vec<String>) -> Self {
        IlkDef { name, variants }
    }

    /// Look up a variant's ordinal by name
    pub fn ordinal_of(&self, variant: &str) -> Option<usize> {
        self.variants.iter().position(|v| v == variant)
    }
}

/// A variant value. The ordinal is the declaration index within its ilk.
#[derive(Debug, Clone)]
pub struct VariantValue {
    pub ilk: Rc<IlkDef>,
    pub ordinal: usize,
}

impl VariantValue {
    pub fn name(&self) -> &str {
        &self.ilk.variants[self.ordinal]
    }
}

/// A range value (end exclusive)
#[derive(Debug, Clone)]
pub struct RangeValue {
    pub start: i64,
    pub end: i64,
}

impl RangeValue {
    pub fn new(start: i64, end: i64) -> Self {
        RangeValue { start, end }
    }

    pub fn iter(&self) -> RangeIterator {
        RangeIterator {
            current: self.start,
            end: self.end,
        }
    }
}

pub struct RangeIterator {
    current: i64,
    end: i64,
}

impl Iterator for RangeIterator {
    type Item = i64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current < self.end {
            let val = self.current;
            self.current += 1;
            Some(val)
        } else {
            None
        }
    }
}

/// Environment for variable bindings
#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn define(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }
        None
    }

    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            return true;
        }
        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }
        false
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
