//! Tree-walking evaluation over the parse tree. Scopes form a chain of
//! reference-counted environments; every named binding is a shared slot,
//! so a by-reference parameter is nothing more than the caller's slot
//! declared under a second name.

mod environment;
mod error;
mod value;

pub use environment::{Environment, RefEntry, RefKind, Slot};
pub use error::RuntimeError;
pub use value::{CalcArray, CalcFunction, RecordType, Value};

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;

use crate::parser::{Location, Number, Operator, ParseTree, TokenType};

type Env = Rc<RefCell<Environment>>;
type EvalResult = Result<Option<Value>, RuntimeError>;

/// Evaluates programs against a pair of I/O streams. `input` feeds the
/// `input` statement, `output` receives printed results and prompts.
pub struct Interpreter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Interpreter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Evaluate a program in a fresh root environment.
    pub fn run(&mut self, tree: &ParseTree) -> Result<(), RuntimeError> {
        let root = Rc::new(RefCell::new(Environment::new()));
        self.evaluate(tree, &root)?;
        Ok(())
    }

    fn evaluate(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        match tree.op {
            Operator::Program => self.eval_program(tree, env),
            Operator::Block => self.eval_block(tree, env),
            Operator::Add => self.eval_binary(tree, env, Number::add),
            Operator::Sub => self.eval_binary(tree, env, Number::sub),
            Operator::Mul => self.eval_binary(tree, env, Number::mul),
            Operator::Div => self.eval_binary(tree, env, Number::div),
            Operator::Pow => self.eval_binary(tree, env, Number::pow),
            Operator::Neg => {
                let operand = self.eval_number(&tree.children[0], env)?;
                Ok(Some(operand.neg().into()))
            }
            Operator::Lit => Ok(Some(literal(tree).into())),
            Operator::Var => self.eval_var(tree, env),
            Operator::ArrayVar => self.eval_array_var(tree, env),
            Operator::Assign => self.eval_assign(tree, env),
            Operator::Input => self.eval_input(tree, env),
            Operator::Decl => {
                self.declare_scalar(tree, env)?;
                Ok(None)
            }
            Operator::ArrayDecl => self.eval_array_decl(tree, env),
            Operator::RecDef => self.eval_rec_def(tree, env),
            Operator::RecDecl => self.eval_rec_decl(tree, env),
            Operator::RecAccess => self.eval_rec_access(tree, env),
            Operator::If => self.eval_if(tree, env),
            Operator::While => self.eval_while(tree, env),
            Operator::FunDef => self.eval_fun_def(tree, env),
            Operator::FunCall => self.eval_fun_call(tree, env),
            Operator::Bounds
            | Operator::Bound
            | Operator::FieldList
            | Operator::ParamList
            | Operator::RefParam
            | Operator::Type
            | Operator::ArgList => unreachable!("structural node evaluated"),
        }
    }

    /// Top level: the value of every expression statement is printed.
    fn eval_program(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        let mut last = None;
        for statement in &tree.children {
            if let Some(value) = self.evaluate(statement, env)? {
                writeln!(self.output, "{value}")?;
                last = Some(value);
            }
        }
        Ok(last)
    }

    /// A nested statement list yields its last expression value without
    /// printing; only the top level prints.
    fn eval_block(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        let mut last = None;
        for statement in &tree.children {
            if let Some(value) = self.evaluate(statement, env)? {
                last = Some(value);
            }
        }
        Ok(last)
    }

    fn eval_binary(
        &mut self,
        tree: &ParseTree,
        env: &Env,
        op: fn(Number, Number) -> Number,
    ) -> EvalResult {
        let lhs = self.eval_number(&tree.children[0], env)?;
        let rhs = self.eval_number(&tree.children[1], env)?;
        Ok(Some(op(lhs, rhs).into()))
    }

    fn eval_var(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        let slot = self.lookup(tree, env)?;
        let value = slot.borrow().value.clone();
        Ok(Some(value))
    }

    fn eval_array_var(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        let index = self.array_index(tree, env)?;
        let slot = self.lookup(tree, env)?;
        let entry = slot.borrow();
        let Value::Array(ref array) = entry.value else {
            return Err(RuntimeError::TypeMismatch {
                details: format!("'{}' is not an array", tree.name()),
                loc: tree.loc(),
            });
        };
        match array.get(&index) {
            Some(value) => Ok(Some(value.clone())),
            None => Err(RuntimeError::IndexOutOfBounds {
                name: tree.name().to_string(),
                loc: tree.loc(),
            }),
        }
    }

    fn eval_assign(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        let value = self.require_value(&tree.children[1], env)?;
        self.assign(&tree.children[0], value, env)?;
        Ok(None)
    }

    /// Store a value through an assignable reference. The value is coerced
    /// to the declared kind of whatever slot or cell it lands in.
    fn assign(&mut self, target: &ParseTree, value: Value, env: &Env) -> Result<(), RuntimeError> {
        match target.op {
            Operator::Var => {
                let slot = env.borrow().get(target.name()).ok_or_else(|| {
                    RuntimeError::AssignmentToUndeclared {
                        name: target.name().to_string(),
                        loc: target.loc(),
                    }
                })?;
                let kind = slot.borrow().kind;
                slot.borrow_mut().value = coerce(value, kind, target.loc())?;
                Ok(())
            }
            Operator::ArrayVar => {
                let index = self.array_index(target, env)?;
                let slot = env.borrow().get(target.name()).ok_or_else(|| {
                    RuntimeError::AssignmentToUndeclared {
                        name: target.name().to_string(),
                        loc: target.loc(),
                    }
                })?;
                let mut entry = slot.borrow_mut();
                let Value::Array(ref mut array) = entry.value else {
                    return Err(RuntimeError::TypeMismatch {
                        details: format!("'{}' is not an array", target.name()),
                        loc: target.loc(),
                    });
                };
                let Some(cell) = array.get_mut(&index) else {
                    return Err(RuntimeError::IndexOutOfBounds {
                        name: target.name().to_string(),
                        loc: target.loc(),
                    });
                };
                *cell = coerce(value, kind_of(cell), target.loc())?;
                Ok(())
            }
            Operator::RecAccess => {
                let (field, rec_env) = self.record_env(target, env)?;
                self.assign(field, value, &rec_env)
            }
            _ => Err(RuntimeError::TypeMismatch {
                details: "invalid assignment target".to_string(),
                loc: target.loc(),
            }),
        }
    }

    /// Read a line, parse it as a number, and store it through the target
    /// reference with the usual assignment coercion.
    fn eval_input(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        let target = &tree.children[0];
        write!(self.output, "{}=", target.name())?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let text = line.trim();
        let value = if let Ok(n) = text.parse::<i64>() {
            Value::Int(n)
        } else if let Ok(x) = text.parse::<f64>() {
            Value::Real(x)
        } else {
            return Err(RuntimeError::InvalidInput {
                name: target.name().to_string(),
                loc: tree.loc(),
            });
        };
        self.assign(target, value, env)?;
        Ok(None)
    }

    fn eval_array_decl(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        let mut bounds = Vec::new();
        for bound in &tree.children[0].children {
            let (lo, hi) = match bound.children.as_slice() {
                [n] => (1, literal_int(n)),
                [lo, hi] => (literal_int(lo), literal_int(hi)),
                _ => unreachable!("malformed bound"),
            };
            if hi < lo {
                return Err(RuntimeError::InvalidBounds {
                    loc: bound.children[0].loc(),
                });
            }
            bounds.push((lo, hi));
        }
        let template = match tree.token.as_ref().map(|t| t.typ) {
            Some(TokenType::Integer) => Value::Int(0),
            Some(TokenType::Real) => Value::Real(0.0),
            _ => self.record_type(tree.name(), tree.loc(), env)?.instantiate(),
        };
        let array = CalcArray::new(bounds, &template);
        let name_node = &tree.children[1];
        let slot = Rc::new(RefCell::new(RefEntry {
            value: Value::Array(array),
            kind: RefKind::Array,
        }));
        self.bind(name_node.name(), &slot, name_node.loc(), env)?;
        Ok(None)
    }

    /// Define a record type. Field declarations run in a scratch scope
    /// nested inside the defining one, so field types resolve outward
    /// while the fields themselves stay local. The finished template is
    /// detached from the scope chain and stored under a key no identifier
    /// can collide with.
    fn eval_rec_def(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        let tag = tree.children[0].name();
        let scratch = Rc::new(RefCell::new(Environment::nested(Rc::clone(env))));
        for field in &tree.children[1].children {
            self.evaluate(field, &scratch)?;
        }
        let template = scratch.borrow().deep_copy();
        let key = format!("record {tag}");
        let slot = Rc::new(RefCell::new(RefEntry {
            value: Value::RecordType(Rc::new(RecordType::new(template))),
            kind: RefKind::RecordType,
        }));
        self.bind(&key, &slot, tree.children[0].loc(), env)?;
        Ok(None)
    }

    /// Instantiate a record: a fresh copy of the type's template scope.
    fn eval_rec_decl(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        let tag_node = &tree.children[0];
        let instance = self
            .record_type(tag_node.name(), tag_node.loc(), env)?
            .instantiate();
        let name_node = &tree.children[1];
        let slot = Rc::new(RefCell::new(RefEntry {
            value: instance,
            kind: RefKind::Record,
        }));
        self.bind(name_node.name(), &slot, name_node.loc(), env)?;
        Ok(None)
    }

    /// Resolve a record tag to its type. Type bindings are keyed with a
    /// prefix that contains a space, out of reach of any identifier.
    fn record_type(
        &mut self,
        tag: &str,
        loc: Location,
        env: &Env,
    ) -> Result<Rc<RecordType>, RuntimeError> {
        let key = format!("record {tag}");
        let slot = env
            .borrow()
            .get(&key)
            .ok_or_else(|| RuntimeError::UndefinedRecord {
                name: tag.to_string(),
                loc,
            })?;
        let entry = slot.borrow();
        match &entry.value {
            Value::RecordType(record_type) => Ok(Rc::clone(record_type)),
            _ => unreachable!("type key bound to a non-type"),
        }
    }

    fn eval_rec_access(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        let (field, rec_env) = self.record_env(tree, env)?;
        self.evaluate(field, &rec_env)
    }

    /// Resolve a dotted access chain down to its final field reference and
    /// the record scope it lives in.
    fn record_env<'t>(
        &mut self,
        tree: &'t ParseTree,
        env: &Env,
    ) -> Result<(&'t ParseTree, Env), RuntimeError> {
        let left = &tree.children[0];
        let Value::Record(rec_env) = self.require_value(left, env)? else {
            return Err(RuntimeError::NotARecord {
                name: left.name().to_string(),
                loc: left.loc(),
            });
        };
        let inner = &tree.children[1];
        if inner.op == Operator::RecAccess {
            return self.record_env(inner, &rec_env);
        }
        Ok((inner, rec_env))
    }

    fn eval_if(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        if self.eval_number(&tree.children[0], env)?.is_truthy() {
            self.evaluate(&tree.children[1], env)?;
        }
        Ok(None)
    }

    fn eval_while(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        while self.eval_number(&tree.children[0], env)?.is_truthy() {
            self.evaluate(&tree.children[1], env)?;
        }
        Ok(None)
    }

    fn eval_fun_def(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        let name_node = &tree.children[0];
        let return_kind = match tree.children[2].token.as_ref().map(|t| t.typ) {
            Some(TokenType::Integer) => RefKind::Int,
            _ => RefKind::Real,
        };
        let function = CalcFunction {
            parameters: tree.children[1].children.clone(),
            return_kind,
            body: tree.children[3].clone(),
        };
        let slot = Rc::new(RefCell::new(RefEntry {
            value: Value::Function(Rc::new(function)),
            kind: RefKind::Function,
        }));
        self.bind(name_node.name(), &slot, name_node.loc(), env)?;
        Ok(None)
    }

    /// Call a function. The local scope nests inside the caller's, value
    /// parameters are declared and coerced like fresh variables, and ref
    /// parameters alias the caller's slot under the parameter's name. The
    /// body's last expression value, coerced to the declared return kind,
    /// is the result.
    fn eval_fun_call(&mut self, tree: &ParseTree, env: &Env) -> EvalResult {
        let name = tree.name();
        let slot = env.borrow().get(name).ok_or_else(|| RuntimeError::NotAFunction {
            name: name.to_string(),
            loc: tree.loc(),
        })?;
        let function = match &slot.borrow().value {
            Value::Function(function) => Rc::clone(function),
            _ => {
                return Err(RuntimeError::NotAFunction {
                    name: name.to_string(),
                    loc: tree.loc(),
                })
            }
        };
        let args = &tree.children[1].children;
        if args.len() != function.parameters.len() {
            return Err(RuntimeError::ArgumentCount {
                name: name.to_string(),
                expected: function.parameters.len(),
                found: args.len(),
                loc: tree.loc(),
            });
        }
        tracing::trace!(function = name, args = args.len(), "calling function");
        let local = Rc::new(RefCell::new(Environment::nested(Rc::clone(env))));
        for (param, arg) in function.parameters.iter().zip(args) {
            match param.op {
                Operator::Decl => {
                    let value = self.require_value(arg, env)?;
                    let param_slot = self.declare_scalar(param, &local)?;
                    let kind = param_slot.borrow().kind;
                    param_slot.borrow_mut().value = coerce(value, kind, arg.loc())?;
                }
                Operator::RefParam => {
                    let param_name = param.children[0].name();
                    if arg.op != Operator::Var {
                        return Err(RuntimeError::BadRefArgument {
                            name: param_name.to_string(),
                            loc: arg.loc(),
                        });
                    }
                    let caller_slot = self.lookup(arg, env)?;
                    self.bind(param_name, &caller_slot, param.children[0].loc(), &local)?;
                }
                _ => unreachable!("malformed parameter"),
            }
        }
        let result = self.evaluate(&function.body, &local)?;
        let value = result.ok_or_else(|| RuntimeError::TypeMismatch {
            details: format!("'{name}' produced no value"),
            loc: tree.loc(),
        })?;
        Ok(Some(coerce(value, function.return_kind, tree.loc())?))
    }

    /// Declare a scalar with its kind's zero value.
    fn declare_scalar(&mut self, tree: &ParseTree, env: &Env) -> Result<Slot, RuntimeError> {
        let (kind, value) = match tree.token.as_ref().map(|t| t.typ) {
            Some(TokenType::Integer) => (RefKind::Int, Value::Int(0)),
            _ => (RefKind::Real, Value::Real(0.0)),
        };
        let name_node = &tree.children[0];
        let slot = Rc::new(RefCell::new(RefEntry { value, kind }));
        self.bind(name_node.name(), &slot, name_node.loc(), env)?;
        Ok(slot)
    }

    fn bind(
        &mut self,
        name: &str,
        slot: &Slot,
        loc: Location,
        env: &Env,
    ) -> Result<(), RuntimeError> {
        if !env.borrow_mut().declare(name, Rc::clone(slot)) {
            return Err(RuntimeError::Redeclaration {
                name: name.to_string(),
                loc,
            });
        }
        Ok(())
    }

    fn lookup(&mut self, tree: &ParseTree, env: &Env) -> Result<Slot, RuntimeError> {
        env.borrow()
            .get(tree.name())
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                name: tree.name().to_string(),
                loc: tree.loc(),
            })
    }

    fn require_value(&mut self, tree: &ParseTree, env: &Env) -> Result<Value, RuntimeError> {
        self.evaluate(tree, env)?
            .ok_or_else(|| RuntimeError::TypeMismatch {
                details: "expression produced no value".to_string(),
                loc: tree.loc(),
            })
    }

    fn eval_number(&mut self, tree: &ParseTree, env: &Env) -> Result<Number, RuntimeError> {
        self.require_value(tree, env)?
            .number()
            .ok_or_else(|| RuntimeError::TypeMismatch {
                details: "operand is not a number".to_string(),
                loc: tree.loc(),
            })
    }

    /// Evaluate index expressions, truncating real coordinates.
    fn array_index(&mut self, tree: &ParseTree, env: &Env) -> Result<Vec<i64>, RuntimeError> {
        tree.children
            .iter()
            .map(|child| {
                Ok(match self.eval_number(child, env)? {
                    Number::Int(n) => n,
                    Number::Real(x) => x as i64,
                })
            })
            .collect()
    }
}

fn kind_of(value: &Value) -> RefKind {
    match value {
        Value::Int(_) => RefKind::Int,
        Value::Real(_) => RefKind::Real,
        Value::Array(_) => RefKind::Array,
        Value::Record(_) => RefKind::Record,
        Value::RecordType(_) => RefKind::RecordType,
        Value::Function(_) => RefKind::Function,
    }
}

/// Coerce a value to a slot's declared kind. Scalars convert freely, with
/// truncation toward zero into integer slots; compound kinds only accept
/// their own.
fn coerce(value: Value, kind: RefKind, loc: Location) -> Result<Value, RuntimeError> {
    match (kind, value.number()) {
        (RefKind::Int, Some(Number::Int(n))) => Ok(Value::Int(n)),
        (RefKind::Int, Some(Number::Real(x))) => Ok(Value::Int(x as i64)),
        (RefKind::Real, Some(number)) => Ok(Value::Real(number.widen())),
        _ if kind_of(&value) == kind => Ok(value),
        _ => Err(RuntimeError::TypeMismatch {
            details: format!("value does not fit a {kind:?} slot"),
            loc,
        }),
    }
}

fn literal(tree: &ParseTree) -> Number {
    match tree.token.as_ref().and_then(|t| t.value) {
        Some(number) => number,
        None => unreachable!("literal without a value"),
    }
}

fn literal_int(tree: &ParseTree) -> i64 {
    match literal(tree) {
        Number::Int(n) => n,
        Number::Real(_) => unreachable!("bound is not an integer"),
    }
}

#[cfg(test)]
mod test;
