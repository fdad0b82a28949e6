//! Tree-walking interpreter.
//!
//! Scopes are `Rc<RefCell<Scope>>` chains. A closure keeps its defining scope
//! alive, and a scope that holds the closure forms a cycle, so every scope a
//! closure captures is also recorded in the interpreter and emptied when the
//! interpreter is dropped.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::ast::{
    AssignOp, BinaryOp, DeclKind, Expr, FunctionBody, FunctionDef, LogicalOp, Program, Stmt,
    UnaryOp,
};
use crate::builtins::math_member;
use crate::error::RuntimeError;
use crate::value::{Array, Value, MAX_ARRAY_DEPTH};

/// Maximum depth of nested script calls before a `RangeError` is raised.
pub const MAX_CALL_DEPTH: usize = 128;

/// Maximum number of statement and expression evaluations active at once,
/// across all calls. Deep expressions inside deep recursion hit this before
/// the native stack runs out.
pub const MAX_EVAL_NESTING: usize = 512;

type Env = Rc<RefCell<Scope>>;

struct Binding {
    value: Value,
    mutable: bool,
}

#[derive(Default)]
struct Scope {
    vars: HashMap<String, Binding>,
    parent: Option<Env>,
    /// Function bodies and the global scope; `var` declarations land here.
    function_level: bool,
}

impl Scope {
    fn child(parent: &Env, function_level: bool) -> Env {
        Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            parent: Some(Rc::clone(parent)),
            function_level,
        }))
    }
}

/// A script function value: its definition plus the scope it closes over.
pub struct Closure {
    def: Rc<FunctionDef>,
    env: Env,
}

// Scopes can reach the closure again, so never print them.
impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name())
            .field("params", &self.def.params)
            .finish_non_exhaustive()
    }
}

impl Closure {
    pub fn name(&self) -> Option<&str> {
        self.def.name.as_deref()
    }

    pub fn arity(&self) -> usize {
        self.def.params.len()
    }
}

enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

fn lookup(env: &Env, name: &str) -> Option<Value> {
    let mut scope = Rc::clone(env);
    loop {
        let parent = {
            let s = scope.borrow();
            if let Some(b) = s.vars.get(name) {
                return Some(b.value.clone());
            }
            s.parent.clone()
        };
        scope = parent?;
    }
}

fn assign(env: &Env, name: &str, value: Value) -> Result<(), RuntimeError> {
    let mut scope = Rc::clone(env);
    loop {
        let parent = {
            let mut s = scope.borrow_mut();
            if let Some(b) = s.vars.get_mut(name) {
                if !b.mutable {
                    return Err(RuntimeError::type_error(format!("assignment to constant variable `{name}`")));
                }
                b.value = value;
                return Ok(());
            }
            s.parent.clone()
        };
        scope = parent.ok_or_else(|| RuntimeError::reference(format!("{name} is not defined")))?;
    }
}

fn declare(env: &Env, name: &str, value: Value, mutable: bool) {
    env.borrow_mut().vars.insert(name.to_string(), Binding { value, mutable });
}

fn function_scope(env: &Env) -> Env {
    let mut scope = Rc::clone(env);
    loop {
        let parent = {
            let s = scope.borrow();
            if s.function_level {
                None
            } else {
                s.parent.clone()
            }
        };
        match parent {
            Some(p) => scope = p,
            None => return scope,
        }
    }
}

// ── Interpreter ───────────────────────────────────────────────────────────

pub struct Interpreter {
    globals: Env,
    captured: Vec<Weak<RefCell<Scope>>>,
    depth: usize,
    nesting: usize,
}

impl Interpreter {
    /// A fresh interpreter whose global scope holds only `Math`.
    pub fn new() -> Self {
        let globals = Rc::new(RefCell::new(Scope { function_level: true, ..Scope::default() }));
        declare(&globals, "Math", Value::Math, false);
        Self { globals, captured: Vec::new(), depth: 0, nesting: 0 }
    }

    /// Runs top-level code in the global scope.
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        let globals = Rc::clone(&self.globals);
        match self.exec_block(&program.body, &globals)? {
            Flow::Normal | Flow::Return(_) => Ok(()),
            Flow::Break | Flow::Continue => Err(RuntimeError::type_error("illegal break or continue outside a loop")),
        }
    }

    /// Reads a global binding.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.borrow().vars.get(name).map(|b| b.value.clone())
    }

    /// Invokes a callable value with positional arguments.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match callee {
            Value::Builtin(b) => Ok(b.call(&args)),
            Value::Function(closure) => {
                if self.depth >= MAX_CALL_DEPTH {
                    return Err(RuntimeError::range("maximum call stack size exceeded"));
                }
                self.depth += 1;
                let out = self.call_closure(closure, args);
                self.depth -= 1;
                out
            }
            other => Err(RuntimeError::type_error(format!("{} is not a function", other.type_name()))),
        }
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let scope = Scope::child(&closure.env, true);
        let mut args = args.into_iter();
        for param in &closure.def.params {
            declare(&scope, param, args.next().unwrap_or_default(), true);
        }
        match &closure.def.body {
            FunctionBody::Expr(expr) => self.eval(expr, &scope),
            FunctionBody::Block(body) => match self.exec_block(body, &scope)? {
                Flow::Return(v) => Ok(v),
                Flow::Normal => Ok(Value::Undefined),
                Flow::Break | Flow::Continue => Err(RuntimeError::type_error("illegal break or continue outside a loop")),
            },
        }
    }

    fn make_closure(&mut self, def: &Rc<FunctionDef>, env: &Env) -> Value {
        // Prune dead entries before the list reallocates.
        if self.captured.len() == self.captured.capacity() {
            self.captured.retain(|w| w.strong_count() > 0);
        }
        self.captured.push(Rc::downgrade(env));
        Value::Function(Rc::new(Closure { def: Rc::clone(def), env: Rc::clone(env) }))
    }

    // ── Statements ────────────────────────────────────────────────────────

    fn exec_block(&mut self, stmts: &[Stmt], env: &Env) -> Result<Flow, RuntimeError> {
        // Function declarations are visible throughout their block.
        for stmt in stmts {
            if let Stmt::Function(def) = stmt {
                let f = self.make_closure(def, env);
                let name = def.name.as_deref().unwrap_or_default();
                declare(env, name, f, true);
            }
        }
        for stmt in stmts {
            match self.exec(stmt, env)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt, env: &Env) -> Result<Flow, RuntimeError> {
        self.enter()?;
        let out = self.exec_inner(stmt, env);
        self.nesting -= 1;
        out
    }

    fn exec_inner(&mut self, stmt: &Stmt, env: &Env) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Function(_) | Stmt::Empty => Ok(Flow::Normal),
            Stmt::Decl { kind, decls } => {
                for d in decls {
                    let value = match &d.init {
                        Some(init) => self.eval(init, env)?,
                        None => Value::Undefined,
                    };
                    match kind {
                        DeclKind::Var => declare(&function_scope(env), &d.name, value, true),
                        DeclKind::Let => declare(env, &d.name, value, true),
                        DeclKind::Const => declare(env, &d.name, value, false),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval(expr, env)?;
                Ok(Flow::Normal)
            }
            Stmt::If { cond, then, otherwise } => {
                if self.eval(cond, env)?.truthy() {
                    self.exec(then, env)
                } else if let Some(otherwise) = otherwise {
                    self.exec(otherwise, env)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::Return(value) => {
                let v = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(v))
            }
            Stmt::For { init, cond, update, body } => {
                let scope = Scope::child(env, false);
                if let Some(init) = init {
                    self.exec(init, &scope)?;
                }
                loop {
                    if let Some(cond) = cond {
                        if !self.eval(cond, &scope)?.truthy() {
                            break;
                        }
                    }
                    match self.exec(body, &scope)? {
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                        Flow::Normal | Flow::Continue => {}
                    }
                    if let Some(update) = update {
                        self.eval(update, &scope)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::While { cond, body } => {
                while self.eval(cond, env)?.truthy() {
                    match self.exec(body, env)? {
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Block(body) => {
                let scope = Scope::child(env, false);
                self.exec_block(body, &scope)
            }
        }
    }

    // ── Expressions ───────────────────────────────────────────────────────

    fn eval(&mut self, expr: &Expr, env: &Env) -> Result<Value, RuntimeError> {
        self.enter()?;
        let out = self.eval_inner(expr, env);
        self.nesting -= 1;
        out
    }

    fn enter(&mut self) -> Result<(), RuntimeError> {
        if self.nesting >= MAX_EVAL_NESTING {
            return Err(RuntimeError::range("maximum call stack size exceeded"));
        }
        self.nesting += 1;
        Ok(())
    }

    fn eval_inner(&mut self, expr: &Expr, env: &Env) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(Rc::clone(s))),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Ident(name) => lookup(env, name)
                .ok_or_else(|| RuntimeError::reference(format!("{name} is not defined"))),
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item, env)?);
                }
                let array = Array::new(values).ok_or_else(|| {
                    RuntimeError::range(format!("arrays nest at most {MAX_ARRAY_DEPTH} deep"))
                })?;
                Ok(Value::Array(Rc::new(array)))
            }
            Expr::Function(def) => Ok(self.make_closure(def, env)),
            Expr::Unary { op, expr } => {
                let v = self.eval(expr, env)?;
                Ok(match op {
                    UnaryOp::Neg => Value::Number(-v.to_number()),
                    UnaryOp::Plus => Value::Number(v.to_number()),
                    UnaryOp::Not => Value::Bool(!v.truthy()),
                    UnaryOp::BitNot => Value::Number(f64::from(!v.to_int32())),
                })
            }
            Expr::Binary { op, lhs, rhs } => {
                let l = self.eval(lhs, env)?;
                let r = self.eval(rhs, env)?;
                Ok(binary(*op, &l, &r))
            }
            Expr::Logical { op, lhs, rhs } => {
                let l = self.eval(lhs, env)?;
                match (op, l.truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(l),
                    _ => self.eval(rhs, env),
                }
            }
            Expr::Conditional { cond, then, otherwise } => {
                if self.eval(cond, env)?.truthy() {
                    self.eval(then, env)
                } else {
                    self.eval(otherwise, env)
                }
            }
            Expr::Assign { op, target, value } => {
                let v = match op {
                    AssignOp::Set => self.eval(value, env)?,
                    AssignOp::Compound(bop) => {
                        let current = lookup(env, target)
                            .ok_or_else(|| RuntimeError::reference(format!("{target} is not defined")))?;
                        let rhs = self.eval(value, env)?;
                        binary(*bop, &current, &rhs)
                    }
                };
                assign(env, target, v.clone())?;
                Ok(v)
            }
            Expr::Update { increment, prefix, target } => {
                let old = lookup(env, target)
                    .ok_or_else(|| RuntimeError::reference(format!("{target} is not defined")))?
                    .to_number();
                let new = if *increment { old + 1.0 } else { old - 1.0 };
                assign(env, target, Value::Number(new))?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expr::Call { callee, args } => {
                let f = self.eval(callee, env)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, env)?);
                }
                if !f.is_callable() {
                    return Err(RuntimeError::type_error(format!("{} is not a function", describe_callee(callee))));
                }
                self.call(&f, values)
            }
            Expr::Member { object, property } => {
                let obj = self.eval(object, env)?;
                member(&obj, property)
            }
            Expr::Index { object, index } => {
                let obj = self.eval(object, env)?;
                let idx = self.eval(index, env)?;
                index_value(&obj, &idx)
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        // Break closure <-> scope cycles.
        for weak in self.captured.drain(..) {
            if let Some(scope) = weak.upgrade() {
                let vars = std::mem::take(&mut scope.borrow_mut().vars);
                drop(vars);
            }
        }
        let vars = std::mem::take(&mut self.globals.borrow_mut().vars);
        drop(vars);
    }
}

fn describe_callee(callee: &Expr) -> String {
    match callee {
        Expr::Ident(name) => name.clone(),
        Expr::Member { property, .. } => property.clone(),
        _ => "expression".to_string(),
    }
}

fn member(obj: &Value, property: &str) -> Result<Value, RuntimeError> {
    match obj {
        Value::Undefined | Value::Null => Err(RuntimeError::type_error(format!(
            "cannot read properties of {} (reading '{property}')",
            obj.type_name()
        ))),
        Value::Math => Ok(math_member(property)),
        Value::Array(items) if property == "length" => Ok(Value::Number(items.len() as f64)),
        Value::Str(s) if property == "length" => Ok(Value::Number(s.chars().count() as f64)),
        Value::Function(c) if property == "length" => Ok(Value::Number(c.arity() as f64)),
        _ => Ok(Value::Undefined),
    }
}

fn index_value(obj: &Value, idx: &Value) -> Result<Value, RuntimeError> {
    if let Value::Str(key) = idx {
        if !key.chars().all(|c| c.is_ascii_digit()) || key.is_empty() {
            return member(obj, key);
        }
    }
    let slot = array_slot(idx);
    match obj {
        Value::Undefined | Value::Null => Err(RuntimeError::type_error(format!(
            "cannot read properties of {} (reading '{idx}')",
            obj.type_name()
        ))),
        Value::Array(items) => Ok(slot.and_then(|i| items.get(i)).cloned().unwrap_or_default()),
        Value::Str(s) => Ok(slot
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::Str(c.to_string().into()))
            .unwrap_or_default()),
        _ => Ok(Value::Undefined),
    }
}

/// Maps an index value to an element slot the way property keys do:
/// only non-negative integral numbers (or their canonical string form) hit.
pub fn array_slot(idx: &Value) -> Option<usize> {
    let n = match idx {
        Value::Number(n) => *n,
        Value::Str(s) => {
            let n: f64 = s.parse().ok()?;
            // "01" or "1.0" name different properties than 1.
            if crate::value::format_number(n) != **s {
                return None;
            }
            n
        }
        _ => return None,
    };
    if n.is_finite() && n >= 0.0 && n == n.trunc() && n <= usize::MAX as f64 {
        Some(n as usize)
    } else {
        None
    }
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Value {
    use BinaryOp::*;
    match op {
        Add => {
            if matches!(l, Value::Str(_) | Value::Array(_)) || matches!(r, Value::Str(_) | Value::Array(_)) {
                Value::Str(format!("{l}{r}").into())
            } else {
                Value::Number(l.to_number() + r.to_number())
            }
        }
        Sub => Value::Number(l.to_number() - r.to_number()),
        Mul => Value::Number(l.to_number() * r.to_number()),
        Div => Value::Number(l.to_number() / r.to_number()),
        // Rust's `%` on f64 truncates like the script operator (sign of dividend).
        Rem => Value::Number(l.to_number() % r.to_number()),
        Pow => Value::Number(l.to_number().powf(r.to_number())),
        Eq => Value::Bool(l.loose_eq(r)),
        NotEq => Value::Bool(!l.loose_eq(r)),
        StrictEq => Value::Bool(l.strict_eq(r)),
        StrictNotEq => Value::Bool(!l.strict_eq(r)),
        Lt | Le | Gt | Ge => Value::Bool(compare(op, l, r)),
        BitAnd => Value::Number(f64::from(l.to_int32() & r.to_int32())),
        BitOr => Value::Number(f64::from(l.to_int32() | r.to_int32())),
        BitXor => Value::Number(f64::from(l.to_int32() ^ r.to_int32())),
        Shl => Value::Number(f64::from(l.to_int32().wrapping_shl(r.to_uint32() & 31))),
        Shr => Value::Number(f64::from(l.to_int32().wrapping_shr(r.to_uint32() & 31))),
        UShr => Value::Number(f64::from(l.to_uint32().wrapping_shr(r.to_uint32() & 31))),
    }
}

fn compare(op: BinaryOp, l: &Value, r: &Value) -> bool {
    if let (Value::Str(a), Value::Str(b)) = (l, r) {
        return match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            _ => a >= b,
        };
    }
    let (a, b) = (l.to_number(), r.to_number());
    match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        _ => a >= b,
    }
}
