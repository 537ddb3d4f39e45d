use std::cell::RefCell;
use std::rc::Rc;

use crate::parser::{Number, ParseTree};

use super::environment::{Environment, RefKind};

/// A runtime value. The scalar variants are plain data; arrays own their
/// cells, record instances are shared through reference counts until a
/// deep copy splits them. Record types are immutable templates distinct
/// from the instances stamped out of them.
#[derive(Clone, Debug)]
pub enum Value {
    Int(i64),
    Real(f64),
    Array(CalcArray),
    Record(Rc<RefCell<Environment>>),
    RecordType(Rc<RecordType>),
    Function(Rc<CalcFunction>),
}

impl Value {
    /// The numeric payload, if this is a scalar.
    pub fn number(&self) -> Option<Number> {
        match self {
            Value::Int(n) => Some(Number::Int(*n)),
            Value::Real(x) => Some(Number::Real(*x)),
            _ => None,
        }
    }

    /// A structurally independent copy. Record instances get a fresh
    /// environment, arrays fresh cells; scalars, functions, and the
    /// immutable record types just clone.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Record(env) => Value::Record(Rc::new(RefCell::new(env.borrow().deep_copy()))),
            Value::Array(array) => Value::Array(array.deep_copy()),
            other => other.clone(),
        }
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(n) => Value::Int(n),
            Number::Real(x) => Value::Real(x),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Real(x) if x.fract() == 0.0 && x.is_finite() => write!(f, "{x:.1}"),
            Value::Real(x) => write!(f, "{x}"),
            Value::Array(_) => f.write_str("<array>"),
            Value::Record(_) => f.write_str("<record>"),
            Value::RecordType(_) => f.write_str("<record type>"),
            Value::Function(_) => f.write_str("<function>"),
        }
    }
}

impl Number {
    pub(crate) fn widen(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Real(x) => x,
        }
    }

    /// True in a condition. Zero of either kind is false.
    pub(crate) fn is_truthy(self) -> bool {
        match self {
            Number::Int(n) => n != 0,
            Number::Real(x) => x != 0.0,
        }
    }

    pub(crate) fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a.wrapping_add(b)),
            _ => Number::Real(self.widen() + other.widen()),
        }
    }

    pub(crate) fn sub(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a.wrapping_sub(b)),
            _ => Number::Real(self.widen() - other.widen()),
        }
    }

    pub(crate) fn mul(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Number::Int(a.wrapping_mul(b)),
            _ => Number::Real(self.widen() * other.widen()),
        }
    }

    /// Division is always real, so a zero divisor yields an IEEE infinity
    /// or NaN instead of trapping.
    pub(crate) fn div(self, other: Number) -> Number {
        Number::Real(self.widen() / other.widen())
    }

    /// An integer base raised to a non-negative integer power stays an
    /// integer; every other combination goes through `powf`.
    pub(crate) fn pow(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => match u32::try_from(b) {
                Ok(exp) => Number::Int(a.wrapping_pow(exp)),
                Err(_) => Number::Real((a as f64).powf(b as f64)),
            },
            _ => Number::Real(self.widen().powf(other.widen())),
        }
    }

    pub(crate) fn neg(self) -> Number {
        match self {
            Number::Int(n) => Number::Int(n.wrapping_neg()),
            Number::Real(x) => Number::Real(-x),
        }
    }
}

/// A rectangular array with per-dimension inclusive bounds. Cells are laid
/// out in row-major order behind an index computation from the bounds.
#[derive(Clone, Debug)]
pub struct CalcArray {
    bounds: Vec<(i64, i64)>,
    cells: Vec<Value>,
}

impl CalcArray {
    /// Allocate an array over `bounds`, every cell an independent deep
    /// copy of `template`. Bounds are (low, high) inclusive with low <= high.
    pub fn new(bounds: Vec<(i64, i64)>, template: &Value) -> CalcArray {
        let size: usize = bounds
            .iter()
            .map(|&(lo, hi)| (hi - lo + 1) as usize)
            .product();
        let cells = (0..size).map(|_| template.deep_copy()).collect();
        CalcArray { bounds, cells }
    }

    /// Row-major cell offset for a full index tuple, or `None` when any
    /// coordinate falls outside its dimension's bounds.
    fn offset(&self, index: &[i64]) -> Option<usize> {
        if index.len() != self.bounds.len() {
            return None;
        }
        let mut offset = 0;
        for (&i, &(lo, hi)) in index.iter().zip(&self.bounds) {
            if i < lo || i > hi {
                return None;
            }
            offset = offset * (hi - lo + 1) as usize + (i - lo) as usize;
        }
        Some(offset)
    }

    pub fn get(&self, index: &[i64]) -> Option<&Value> {
        self.offset(index).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, index: &[i64]) -> Option<&mut Value> {
        self.offset(index).map(move |i| &mut self.cells[i])
    }

    pub fn deep_copy(&self) -> CalcArray {
        CalcArray {
            bounds: self.bounds.clone(),
            cells: self.cells.iter().map(Value::deep_copy).collect(),
        }
    }
}

/// A record type: the parentless template scope its instances are stamped
/// out of. The template never changes after definition.
#[derive(Debug)]
pub struct RecordType {
    template: Environment,
}

impl RecordType {
    pub fn new(template: Environment) -> Self {
        Self { template }
    }

    /// A fresh instance with independent storage for every field.
    pub fn instantiate(&self) -> Value {
        Value::Record(Rc::new(RefCell::new(self.template.deep_copy())))
    }
}

/// A user-defined function: its parameter declarations, declared return
/// kind, and body, as parsed.
#[derive(Debug)]
pub struct CalcFunction {
    pub parameters: Vec<ParseTree>,
    pub return_kind: RefKind,
    pub body: ParseTree,
}
