use std::fmt;
use std::rc::Rc;

use crate::builtins::Builtin;
use crate::interp::Closure;

/// A runtime value.
///
/// Cloning is cheap: strings, arrays and closures are reference-counted.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Array(Rc<Array>),
    Function(Rc<Closure>),
    Builtin(Builtin),
    /// The `Math` namespace object.
    Math,
}

/// Deepest array nesting a program can build.
pub const MAX_ARRAY_DEPTH: usize = 64;

/// Immutable array contents together with their nesting depth.
///
/// Conversions and printing recurse into elements, so the depth is checked
/// once when an array is built.
#[derive(Debug, Clone, Default)]
pub struct Array {
    items: Vec<Value>,
    depth: usize,
}

impl Array {
    /// Returns `None` if the result would nest deeper than
    /// [`MAX_ARRAY_DEPTH`].
    pub fn new(items: Vec<Value>) -> Option<Self> {
        let inner = items
            .iter()
            .filter_map(|v| match v {
                Value::Array(a) => Some(a.depth),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        let depth = inner + 1;
        (depth <= MAX_ARRAY_DEPTH).then_some(Self { items, depth })
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }
}

impl std::ops::Deref for Array {
    type Target = [Value];

    fn deref(&self) -> &[Value] {
        &self.items
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) | Value::Math => "object",
            Value::Function(_) | Value::Builtin(_) => "function",
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Builtin(_))
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Function(_) | Value::Builtin(_) | Value::Math => true,
        }
    }

    /// Numeric conversion with script semantics (`undefined` is NaN,
    /// `null` is 0, strings are parsed after trimming).
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => if *b { 1.0 } else { 0.0 },
            Value::Number(n) => *n,
            Value::Str(s) => parse_numeric_str(s),
            Value::Array(items) => match items.as_slice() {
                [] => 0.0,
                [single] => single.to_number(),
                _ => f64::NAN,
            },
            Value::Function(_) | Value::Builtin(_) | Value::Math => f64::NAN,
        }
    }

    /// 32-bit signed conversion used by the bitwise operators.
    pub fn to_int32(&self) -> i32 {
        to_uint32(self.to_number()) as i32
    }

    pub fn to_uint32(&self) -> u32 {
        to_uint32(self.to_number())
    }

    /// Identity comparison (`===`).
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Math, Value::Math) => true,
            _ => false,
        }
    }

    /// Coercing comparison (`==`).
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
            (Value::Number(_), Value::Str(_))
            | (Value::Str(_), Value::Number(_))
            | (Value::Bool(_), _)
            | (_, Value::Bool(_)) => self.to_number() == other.to_number(),
            _ => self.strict_eq(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => f.write_str(s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    // Holes and nullish elements print as empty.
                    if !matches!(item, Value::Undefined | Value::Null) {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Value::Function(c) => match c.name() {
                Some(name) => write!(f, "function {name}() {{ ... }}"),
                None => f.write_str("function () { ... }"),
            },
            Value::Builtin(b) => write!(f, "function {}() {{ [native code] }}", b.name()),
            Value::Math => f.write_str("[object Math]"),
        }
    }
}

/// Formats a number the way scripts print it: integral values have no
/// fractional part, non-finite values are spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e21 {
        // Also maps -0 to "0".
        format!("{}", n as i128)
    } else {
        format!("{n}")
    }
}

fn parse_numeric_str(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map(|n| n as f64).unwrap_or(f64::NAN);
    }
    match t {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts "inf"/"nan" spellings that scripts do not.
        _ if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        _ => t.parse::<f64>().unwrap_or(f64::NAN),
    }
}

fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    let m = n.trunc().rem_euclid(4_294_967_296.0);
    m as u32
}
