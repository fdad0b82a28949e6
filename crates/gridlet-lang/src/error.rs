use std::fmt;

// ── ParseError ────────────────────────────────────────────────────────────

/// A lex or parse error in color-function source text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    /// 1-based source line number where the error occurred.
    pub line: usize,
    /// 1-based source column number where the error occurred.
    pub col: usize,
}

impl ParseError {
    pub(crate) fn new(msg: impl Into<String>, line: usize, col: usize) -> Self {
        Self { message: msg.into(), line, col }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syntax error at {}:{}: {}", self.line, self.col, self.message)
    }
}

impl std::error::Error for ParseError {}

// ── RuntimeError ──────────────────────────────────────────────────────────

/// Classification of a runtime failure, named after the script-level error
/// a user would recognise.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    /// Read or write of a name that has no binding.
    Reference,
    /// Operation applied to a value of the wrong kind (calling a number,
    /// assigning to a `const`, ...).
    Type,
    /// A bound was exceeded (call depth).
    Range,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Type      => "TypeError",
            ErrorKind::Range     => "RangeError",
        }
    }
}

/// A failure raised while executing already-parsed code.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub(crate) fn reference(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Reference, message: msg.into() }
    }

    pub(crate) fn type_error(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Type, message: msg.into() }
    }

    pub(crate) fn range(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Range, message: msg.into() }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Failure of a single `color(...)` invocation.
pub type CallError = RuntimeError;

// ── CompileError ──────────────────────────────────────────────────────────

/// Failure to materialize a color function from source text.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The text does not lex or parse.
    Parse(ParseError),
    /// The top-level program threw while running.
    Init(RuntimeError),
    /// The program ran but never bound the requested name.
    MissingBinding(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse(e) => write!(f, "{e}"),
            CompileError::Init(e) => write!(f, "top-level code failed: {e}"),
            CompileError::MissingBinding(name) => write!(f, "`{name}` is not defined"),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Parse(e) => Some(e),
            CompileError::Init(e) => Some(e),
            CompileError::MissingBinding(_) => None,
        }
    }
}

impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}
