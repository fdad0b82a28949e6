use crate::error::{CallError, CompileError};
use crate::interp::Interpreter;
use crate::parser::parse_str;
use crate::value::Value;

/// Name of the binding a program must define.
pub const COLOR_BINDING: &str = "color";

/// Arguments for one cell invocation.
///
/// `time` is `Some` only in the animated variant; it is then passed as the
/// third argument.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CellArgs {
    pub x: i64,
    pub y: i64,
    pub time: Option<u64>,
}

impl CellArgs {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y, time: None }
    }

    pub fn with_time(x: i64, y: i64, time: u64) -> Self {
        Self { x, y, time: Some(time) }
    }

    fn to_values(self) -> Vec<Value> {
        let mut args = vec![Value::Number(self.x as f64), Value::Number(self.y as f64)];
        if let Some(t) = self.time {
            args.push(Value::Number(t as f64));
        }
        args
    }
}

/// Compiles source text into a [`ColorFunction`].
///
/// There are two fault boundaries: [`Evaluator::compile`] reports everything
/// that prevents a function from existing, and [`ColorFunction::call`]
/// reports everything that goes wrong inside a single invocation. Neither
/// panics on malformed input.
#[derive(Debug, Clone)]
pub struct Evaluator {
    binding: String,
}

impl Evaluator {
    pub fn new() -> Self {
        Self { binding: COLOR_BINDING.to_string() }
    }

    /// Looks up `name` instead of `color` after running the program.
    pub fn with_binding(name: impl Into<String>) -> Self {
        Self { binding: name.into() }
    }

    /// Parses `src`, runs its top level in a fresh global scope and extracts
    /// the color binding.
    ///
    /// Every call builds a new interpreter; nothing is cached between calls.
    /// The binding is not checked for callability or arity here.
    pub fn compile(&self, src: &str) -> Result<ColorFunction, CompileError> {
        let program = parse_str(src)?;
        let mut interp = Interpreter::new();
        interp.run(&program).map_err(CompileError::Init)?;
        let func = interp
            .global(&self.binding)
            .ok_or_else(|| CompileError::MissingBinding(self.binding.clone()))?;
        Ok(ColorFunction { interp, func })
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// A materialized color function together with the program state it closes
/// over.
pub struct ColorFunction {
    interp: Interpreter,
    func: Value,
}

impl ColorFunction {
    /// Invokes the function for one cell.
    pub fn call(&mut self, args: CellArgs) -> Result<Value, CallError> {
        self.interp.call(&self.func, args.to_values())
    }

    pub fn is_callable(&self) -> bool {
        self.func.is_callable()
    }
}

impl std::fmt::Debug for ColorFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorFunction").field("func", &self.func).finish_non_exhaustive()
    }
}
