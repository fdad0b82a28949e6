//! The `Math` namespace.
//!
//! Only pure functions are exposed; there is no `Math.random`, so a program
//! always produces the same grid for the same inputs.

use crate::value::Value;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Builtin {
    Abs,
    Floor,
    Ceil,
    Round,
    Trunc,
    Sign,
    Sqrt,
    Cbrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Exp,
    Log,
    Log2,
    Hypot,
    Pow,
    Min,
    Max,
}

const MATH_FUNCTIONS: &[(&str, Builtin)] = &[
    ("abs", Builtin::Abs),
    ("floor", Builtin::Floor),
    ("ceil", Builtin::Ceil),
    ("round", Builtin::Round),
    ("trunc", Builtin::Trunc),
    ("sign", Builtin::Sign),
    ("sqrt", Builtin::Sqrt),
    ("cbrt", Builtin::Cbrt),
    ("sin", Builtin::Sin),
    ("cos", Builtin::Cos),
    ("tan", Builtin::Tan),
    ("asin", Builtin::Asin),
    ("acos", Builtin::Acos),
    ("atan", Builtin::Atan),
    ("atan2", Builtin::Atan2),
    ("exp", Builtin::Exp),
    ("log", Builtin::Log),
    ("log2", Builtin::Log2),
    ("hypot", Builtin::Hypot),
    ("pow", Builtin::Pow),
    ("min", Builtin::Min),
    ("max", Builtin::Max),
];

/// Resolves `Math.<name>`; unknown members read as `undefined`.
pub fn math_member(name: &str) -> Value {
    match name {
        "PI" => Value::Number(std::f64::consts::PI),
        "E" => Value::Number(std::f64::consts::E),
        "SQRT2" => Value::Number(std::f64::consts::SQRT_2),
        _ => MATH_FUNCTIONS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, b)| Value::Builtin(*b))
            .unwrap_or(Value::Undefined),
    }
}

impl Builtin {
    pub fn name(self) -> &'static str {
        MATH_FUNCTIONS
            .iter()
            .find(|(_, b)| *b == self)
            .map(|(n, _)| *n)
            .unwrap_or("anonymous")
    }

    pub fn call(self, args: &[Value]) -> Value {
        let arg = |i: usize| args.get(i).map(Value::to_number).unwrap_or(f64::NAN);
        let x = arg(0);
        let n = match self {
            Builtin::Abs => x.abs(),
            Builtin::Floor => x.floor(),
            Builtin::Ceil => x.ceil(),
            // Halves round towards +Infinity: round(-2.5) == -2.
            Builtin::Round => (x + 0.5).floor(),
            Builtin::Trunc => x.trunc(),
            Builtin::Sign => if x == 0.0 || x.is_nan() { x } else { x.signum() },
            Builtin::Sqrt => x.sqrt(),
            Builtin::Cbrt => x.cbrt(),
            Builtin::Sin => x.sin(),
            Builtin::Cos => x.cos(),
            Builtin::Tan => x.tan(),
            Builtin::Asin => x.asin(),
            Builtin::Acos => x.acos(),
            Builtin::Atan => x.atan(),
            Builtin::Atan2 => x.atan2(arg(1)),
            Builtin::Exp => x.exp(),
            Builtin::Log => x.ln(),
            Builtin::Log2 => x.log2(),
            Builtin::Hypot => args.iter().map(Value::to_number).map(|v| v * v).sum::<f64>().sqrt(),
            Builtin::Pow => x.powf(arg(1)),
            Builtin::Min => fold_nan(args, f64::INFINITY, f64::min),
            Builtin::Max => fold_nan(args, f64::NEG_INFINITY, f64::max),
        };
        Value::Number(n)
    }
}

/// `f64::min`/`max` ignore NaN; script semantics propagate it.
fn fold_nan(args: &[Value], init: f64, f: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for v in args {
        let n = v.to_number();
        if n.is_nan() {
            return f64::NAN;
        }
        acc = f(acc, n);
    }
    acc
}
