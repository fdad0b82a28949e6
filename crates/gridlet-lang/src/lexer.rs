use crate::error::ParseError;

// ── Token ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Ident(String),
    Str(String),
    Number(f64),
    // Keywords
    Function,
    Let,
    Const,
    Var,
    If,
    Else,
    Return,
    For,
    While,
    Break,
    Continue,
    True,
    False,
    Null,
    Undefined,
    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Dot,
    Question,
    Colon,
    Arrow,
    // Assignment
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,
    PlusPlus,
    MinusMinus,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,
    UShr,
    // Sentinel
    Eof,
}

/// A token tagged with its 1-based source position.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenWithPos {
    pub token: Token,
    pub line: usize,
    pub col: usize,
    /// A line break separates this token from the previous one.
    /// The parser uses it for optional semicolons.
    pub newline_before: bool,
}

/// Longest spellings first so that `>>>` wins over `>>` and `>`.
const PUNCTUATION: &[(&str, Token)] = &[
    (">>>", Token::UShr),
    ("===", Token::EqEqEq),
    ("!==", Token::NotEqEq),
    ("**", Token::StarStar),
    ("++", Token::PlusPlus),
    ("--", Token::MinusMinus),
    ("==", Token::EqEq),
    ("!=", Token::NotEq),
    ("<=", Token::Le),
    (">=", Token::Ge),
    ("&&", Token::AndAnd),
    ("||", Token::OrOr),
    ("<<", Token::Shl),
    (">>", Token::Shr),
    ("=>", Token::Arrow),
    ("+=", Token::PlusAssign),
    ("-=", Token::MinusAssign),
    ("*=", Token::StarAssign),
    ("/=", Token::SlashAssign),
    ("%=", Token::PercentAssign),
    ("(", Token::LParen),
    (")", Token::RParen),
    ("{", Token::LBrace),
    ("}", Token::RBrace),
    ("[", Token::LBracket),
    ("]", Token::RBracket),
    (",", Token::Comma),
    (";", Token::Semicolon),
    (".", Token::Dot),
    ("?", Token::Question),
    (":", Token::Colon),
    ("=", Token::Assign),
    ("+", Token::Plus),
    ("-", Token::Minus),
    ("*", Token::Star),
    ("/", Token::Slash),
    ("%", Token::Percent),
    ("<", Token::Lt),
    (">", Token::Gt),
    ("!", Token::Bang),
    ("&", Token::Amp),
    ("|", Token::Pipe),
    ("^", Token::Caret),
    ("~", Token::Tilde),
];

// ── Lexer ─────────────────────────────────────────────────────────────────

pub struct Lexer<'s> {
    src: &'s str,
    pos: usize,
    line: usize,
    col: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self { src, pos: 0, line: 1, col: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<TokenWithPos>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let newline_before = self.skip_whitespace_and_comments()?;
            let (line, col) = (self.line, self.col);
            let token = self.next_token()?;
            let eof = token == Token::Eof;
            tokens.push(TokenWithPos { token, line, col, newline_before });
            if eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        ParseError::new(msg, self.line, self.col)
    }

    /// Skips blanks and comments; returns whether a line break was crossed.
    fn skip_whitespace_and_comments(&mut self) -> Result<bool, ParseError> {
        let mut newline = false;
        loop {
            while let Some(c) = self.peek() {
                if !c.is_whitespace() {
                    break;
                }
                newline |= c == '\n';
                self.advance();
            }
            if self.rest().starts_with("//") {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.advance();
                }
            } else if self.rest().starts_with("/*") {
                let (line, col) = (self.line, self.col);
                self.advance(); self.advance();
                loop {
                    if self.rest().starts_with("*/") {
                        self.advance(); self.advance();
                        break;
                    }
                    match self.advance() {
                        Some('\n') => newline = true,
                        Some(_) => {}
                        None => return Err(ParseError::new("unterminated block comment", line, col)),
                    }
                }
            } else {
                break;
            }
        }
        Ok(newline)
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        let ch = match self.peek() {
            None => return Ok(Token::Eof),
            Some(c) => c,
        };

        match ch {
            '"' | '\'' => self.lex_string(ch),
            c if c.is_ascii_digit() => self.lex_number(),
            '.' if matches!(self.peek_second(), Some(d) if d.is_ascii_digit()) => self.lex_number(),
            c if c.is_alphabetic() || c == '_' || c == '$' => Ok(self.lex_ident_or_keyword()),
            _ => self.lex_punctuation(),
        }
    }

    fn lex_punctuation(&mut self) -> Result<Token, ParseError> {
        let rest = self.rest();
        for (spelling, token) in PUNCTUATION {
            if rest.starts_with(spelling) {
                for _ in 0..spelling.len() {
                    self.advance();
                }
                return Ok(token.clone());
            }
        }
        // `rest` is non-empty here; `next_token` returned Eof otherwise.
        let other = rest.chars().next().unwrap_or('\0');
        Err(self.err(format!("unexpected character {:?}", other)))
    }

    fn lex_string(&mut self, quote: char) -> Result<Token, ParseError> {
        let (line, col) = (self.line, self.col);
        self.advance(); // consume opening quote
        let mut s = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => return Err(ParseError::new("unterminated string literal", line, col)),
                Some(c) if c == quote => break,
                Some('\\') => {
                    match self.advance() {
                        Some('n')  => s.push('\n'),
                        Some('t')  => s.push('\t'),
                        Some('0')  => s.push('\0'),
                        Some(c)    => s.push(c),
                        None => return Err(ParseError::new("unterminated escape sequence", line, col)),
                    }
                }
                Some(c) => s.push(c),
            }
        }
        Ok(Token::Str(s))
    }

    fn lex_number(&mut self) -> Result<Token, ParseError> {
        let (line, col) = (self.line, self.col);
        let start = self.pos;

        if self.rest().starts_with("0x") || self.rest().starts_with("0X") {
            self.advance(); self.advance();
            let digits = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.advance();
            }
            let hex = &self.src[digits..self.pos];
            return u64::from_str_radix(hex, 16)
                .map(|n| Token::Number(n as f64))
                .map_err(|_| ParseError::new(format!("invalid hex literal {:?}", &self.src[start..self.pos]), line, col));
        }

        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some(c) if c.is_alphabetic() || c == '_') {
            return Err(self.err("identifier starts immediately after numeric literal"));
        }

        let s = &self.src[start..self.pos];
        s.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| ParseError::new(format!("invalid number {:?}", s), line, col))
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '$') {
            self.advance();
        }
        let word = &self.src[start..self.pos];
        match word {
            "function"  => Token::Function,
            "let"       => Token::Let,
            "const"     => Token::Const,
            "var"       => Token::Var,
            "if"        => Token::If,
            "else"      => Token::Else,
            "return"    => Token::Return,
            "for"       => Token::For,
            "while"     => Token::While,
            "break"     => Token::Break,
            "continue"  => Token::Continue,
            "true"      => Token::True,
            "false"     => Token::False,
            "null"      => Token::Null,
            "undefined" => Token::Undefined,
            _           => Token::Ident(word.to_string()),
        }
    }
}
