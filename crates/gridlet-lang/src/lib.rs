//! Lexer, parser, and sandboxed interpreter for **gridlet** color functions.
//!
//! A color function is a small program written in a JavaScript subset that
//! defines `color(x, y)` (or `color(x, y, time)`) and returns a palette
//! index. This crate is intentionally dependency-free so it can be consumed
//! by editor tooling and linters without pulling in any engine code.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`ast`] | `Program`, `Stmt`, `Expr`, `FunctionDef` |
//! | [`error`] | `ParseError`, `RuntimeError`, `CompileError` |
//! | [`lexer`] | `Lexer`, `Token` |
//! | [`parser`] | `parse_str` entry point |
//! | [`interp`] | tree-walking `Interpreter` |
//! | [`evaluator`] | `Evaluator::compile` → `ColorFunction` |
//!
//! # Quick start
//!
//! ```rust
//! use gridlet_lang::{CellArgs, Evaluator, Value};
//!
//! let mut color = Evaluator::new()
//!     .compile("function color(x, y) { return (x + y) % 10; }")
//!     .unwrap();
//!
//! let v = color.call(CellArgs::new(19, 19)).unwrap();
//! assert!(matches!(v, Value::Number(n) if n == 8.0));
//! ```

pub mod ast;
pub mod builtins;
pub mod error;
pub mod evaluator;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod value;

pub use error::{CallError, CompileError, ErrorKind, ParseError, RuntimeError};
pub use evaluator::{COLOR_BINDING, CellArgs, ColorFunction, Evaluator};
pub use interp::array_slot;
pub use parser::parse_str;
pub use value::{Array, Value};

#[cfg(test)]
mod compile_tests {
    use super::*;

    fn ok(src: &str) { Evaluator::new().compile(src).unwrap(); }
    fn err(src: &str) { Evaluator::new().compile(src).unwrap_err(); }

    #[test] fn diagonal() { ok("function color(x, y) { return (x + y) % 10; }"); }
    #[test] fn arrow() { ok("const color = (x, y) => x ^ y"); }
    #[test] fn function_expression() { ok("var color = function (x, y) { return 0 }"); }
    #[test] fn block_comment_header() {
        ok("/*\n   Edit this function.\n*/\nfunction color(x, y) {\n  return (x + y) % 10;\n}");
    }
    #[test] fn ternary_chain() {
        ok("function color(x, y) { return x < 5 ? 1 : y < 5 ? 2 : 3 }");
    }
    #[test] fn loops_inside() {
        ok("function color(x, y) { let s = 0; for (let i = 0; i < x; i++) s += i; return s % 10 }");
    }
    #[test] fn strings_and_arrays() {
        ok("const pal = [1, 3, 5]; function color(x, y) { return pal[(x + y) % pal.length] }");
    }
    #[test] fn err_syntax() { err("syntax error {{{"); }
    #[test] fn err_empty() { err(""); }
    #[test] fn err_unterminated_string() { err("function color() { return 'oops }"); }
    #[test] fn err_python() { err("def color(x, y):\n    return x"); }
    #[test] fn err_top_level_throw() { err("undefinedThing(); function color() { return 1 }"); }
}
