use std::rc::Rc;

use crate::ast::{
    AssignOp, BinaryOp, DeclKind, Declarator, Expr, FunctionBody, FunctionDef, LogicalOp, Program,
    Stmt, UnaryOp,
};
use crate::error::ParseError;
use crate::lexer::{Lexer, Token, TokenWithPos};

/// Maximum syntactic nesting accepted: parentheses, blocks, unary chains,
/// and operator or member/call/index chains, which nest as deeply as they
/// are long.
pub const MAX_NESTING: usize = 64;

enum Infix {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

fn infix_info(tok: &Token) -> Option<(u8, Infix)> {
    use BinaryOp::*;
    Some(match tok {
        Token::OrOr     => (1, Infix::Logical(LogicalOp::Or)),
        Token::AndAnd   => (2, Infix::Logical(LogicalOp::And)),
        Token::Pipe     => (3, Infix::Binary(BitOr)),
        Token::Caret    => (4, Infix::Binary(BitXor)),
        Token::Amp      => (5, Infix::Binary(BitAnd)),
        Token::EqEq     => (6, Infix::Binary(Eq)),
        Token::NotEq    => (6, Infix::Binary(NotEq)),
        Token::EqEqEq   => (6, Infix::Binary(StrictEq)),
        Token::NotEqEq  => (6, Infix::Binary(StrictNotEq)),
        Token::Lt       => (7, Infix::Binary(Lt)),
        Token::Le       => (7, Infix::Binary(Le)),
        Token::Gt       => (7, Infix::Binary(Gt)),
        Token::Ge       => (7, Infix::Binary(Ge)),
        Token::Shl      => (8, Infix::Binary(Shl)),
        Token::Shr      => (8, Infix::Binary(Shr)),
        Token::UShr     => (8, Infix::Binary(UShr)),
        Token::Plus     => (9, Infix::Binary(Add)),
        Token::Minus    => (9, Infix::Binary(Sub)),
        Token::Star     => (10, Infix::Binary(Mul)),
        Token::Slash    => (10, Infix::Binary(Div)),
        Token::Percent  => (10, Infix::Binary(Rem)),
        _ => return None,
    })
}

fn assign_op(tok: &Token) -> Option<AssignOp> {
    Some(match tok {
        Token::Assign        => AssignOp::Set,
        Token::PlusAssign    => AssignOp::Compound(BinaryOp::Add),
        Token::MinusAssign   => AssignOp::Compound(BinaryOp::Sub),
        Token::StarAssign    => AssignOp::Compound(BinaryOp::Mul),
        Token::SlashAssign   => AssignOp::Compound(BinaryOp::Div),
        Token::PercentAssign => AssignOp::Compound(BinaryOp::Rem),
        _ => return None,
    })
}

// ── Parser ────────────────────────────────────────────────────────────────

pub struct Parser {
    tokens: Vec<TokenWithPos>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<TokenWithPos>) -> Self {
        Self { tokens, pos: 0, depth: 0 }
    }

    fn current_pos(&self) -> (usize, usize) {
        self.tokens
            .get(self.pos)
            .map(|t| (t.line, t.col))
            .or_else(|| self.tokens.last().map(|t| (t.line, t.col)))
            .unwrap_or((1, 1))
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    /// Look at the token `offset` positions ahead of current without consuming.
    fn peek_ahead(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    fn newline_before(&self) -> bool {
        self.tokens.get(self.pos).is_some_and(|t| t.newline_before)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos)
            .map(|t| t.token.clone())
            .unwrap_or(Token::Eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        let (line, col) = self.current_pos();
        ParseError::new(msg, line, col)
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::Ident(s) => { self.advance(); Ok(s) }
            tok => Err(self.err(format!("expected identifier, got {:?}", tok))),
        }
    }

    fn expect_token(&mut self, expected: &Token) -> Result<(), ParseError> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {:?}, got {:?}", expected, self.peek())))
        }
    }

    /// Accepts an explicit `;` or an implied one before `}`, end of input,
    /// or a line break.
    fn consume_semicolon(&mut self) -> Result<(), ParseError> {
        if self.eat(&Token::Semicolon) {
            return Ok(());
        }
        if matches!(self.peek(), Token::RBrace | Token::Eof) || self.newline_before() {
            return Ok(());
        }
        Err(self.err(format!("expected ';', got {:?}", self.peek())))
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.err("nesting too deep"));
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    /// Charges one nesting level for a node built inside a loop. The caller
    /// gives the accumulated `levels` back once the loop is done.
    fn deepen(&mut self, levels: &mut usize) -> Result<(), ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.err("nesting too deep"));
        }
        self.depth += 1;
        *levels += 1;
        Ok(())
    }

    // ── Program ───────────────────────────────────────────────────────────

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        while self.peek() != &Token::Eof {
            body.push(self.parse_statement()?);
        }
        Ok(Program { body })
    }

    // ── Statements ────────────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        self.nested(|p| p.parse_statement_inner())
    }

    fn parse_statement_inner(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            Token::Semicolon => { self.advance(); Ok(Stmt::Empty) }
            Token::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            Token::Function if matches!(self.peek_ahead(1), Token::Ident(_)) => {
                self.advance(); // consume `function`
                let def = self.parse_function_rest(true)?;
                Ok(Stmt::Function(Rc::new(def)))
            }
            Token::Let | Token::Const | Token::Var => {
                let decl = self.parse_declaration()?;
                self.consume_semicolon()?;
                Ok(decl)
            }
            Token::If => self.parse_if(),
            Token::For => self.parse_for(),
            Token::While => {
                self.advance();
                self.expect_token(&Token::LParen)?;
                let cond = self.parse_expr()?;
                self.expect_token(&Token::RParen)?;
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt::While { cond, body })
            }
            Token::Return => {
                self.advance();
                let value = if matches!(self.peek(), Token::Semicolon | Token::RBrace | Token::Eof)
                    || self.newline_before()
                {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.consume_semicolon()?;
                Ok(Stmt::Return(value))
            }
            Token::Break => { self.advance(); self.consume_semicolon()?; Ok(Stmt::Break) }
            Token::Continue => { self.advance(); self.consume_semicolon()?; Ok(Stmt::Continue) }
            _ => {
                let expr = self.parse_expr()?;
                self.consume_semicolon()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect_token(&Token::LBrace)?;
        let mut body = Vec::new();
        loop {
            match self.peek() {
                Token::RBrace => { self.advance(); break; }
                Token::Eof    => return Err(self.err("unclosed '{' block")),
                _ => body.push(self.parse_statement()?),
            }
        }
        Ok(body)
    }

    /// `let a = 1, b` without the trailing semicolon (shared with `for`).
    fn parse_declaration(&mut self) -> Result<Stmt, ParseError> {
        let kind = match self.advance() {
            Token::Let => DeclKind::Let,
            Token::Const => DeclKind::Const,
            _ => DeclKind::Var,
        };
        let mut decls = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let init = if self.eat(&Token::Assign) {
                Some(self.parse_assignment()?)
            } else if kind == DeclKind::Const {
                return Err(self.err(format!("missing initializer in const declaration of `{name}`")));
            } else {
                None
            };
            decls.push(Declarator { name, init });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(Stmt::Decl { kind, decls })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume `if`
        self.expect_token(&Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect_token(&Token::RParen)?;
        let then = Box::new(self.parse_statement()?);
        let otherwise = if self.eat(&Token::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If { cond, then, otherwise })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.advance(); // consume `for`
        self.expect_token(&Token::LParen)?;

        let init = match self.peek() {
            Token::Semicolon => None,
            Token::Let | Token::Const | Token::Var => Some(Box::new(self.parse_declaration()?)),
            _ => Some(Box::new(Stmt::Expr(self.parse_expr()?))),
        };
        self.expect_token(&Token::Semicolon)?;

        let cond = if self.peek() == &Token::Semicolon { None } else { Some(self.parse_expr()?) };
        self.expect_token(&Token::Semicolon)?;

        let update = if self.peek() == &Token::RParen { None } else { Some(self.parse_expr()?) };
        self.expect_token(&Token::RParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For { init, cond, update, body })
    }

    /// Parses `name? (params) { body }` after the `function` keyword.
    fn parse_function_rest(&mut self, require_name: bool) -> Result<FunctionDef, ParseError> {
        let name = match self.peek() {
            Token::Ident(_) => Some(self.expect_ident()?),
            _ if require_name => return Err(self.err("function declaration requires a name")),
            _ => None,
        };
        self.expect_token(&Token::LParen)?;
        let params = self.parse_params()?;
        let body = self.nested(|p| p.parse_block())?;
        Ok(FunctionDef { name, params, body: FunctionBody::Block(body) })
    }

    /// Parameter names up to and including the closing `)`.
    fn parse_params(&mut self) -> Result<Vec<String>, ParseError> {
        let mut params = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(params);
        }
        loop {
            params.push(self.expect_ident()?);
            if self.eat(&Token::RParen) {
                break;
            }
            self.expect_token(&Token::Comma)?;
        }
        Ok(params)
    }

    // ── Expressions ───────────────────────────────────────────────────────

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.nested(|p| p.parse_assignment())
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        if self.at_arrow_function() {
            return self.parse_arrow_function();
        }

        let lhs = self.parse_conditional()?;
        let Some(op) = assign_op(self.peek()) else {
            return Ok(lhs);
        };
        let target = match lhs {
            Expr::Ident(name) => name,
            _ => return Err(self.err("invalid assignment target")),
        };
        self.advance(); // consume the operator
        let value = Box::new(self.nested(|p| p.parse_assignment())?);
        Ok(Expr::Assign { op, target, value })
    }

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let cond = self.parse_binary(1)?;
        if !self.eat(&Token::Question) {
            return Ok(cond);
        }
        let then = Box::new(self.parse_expr()?);
        self.expect_token(&Token::Colon)?;
        let otherwise = Box::new(self.nested(|p| p.parse_assignment())?);
        Ok(Expr::Conditional { cond: Box::new(cond), then, otherwise })
    }

    /// Precedence climbing over the left-associative infix operators.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut levels = 0;
        let out = self.parse_binary_chain(min_prec, &mut levels);
        self.depth -= levels;
        out
    }

    fn parse_binary_chain(&mut self, min_prec: u8, levels: &mut usize) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        while let Some((prec, infix)) = infix_info(self.peek()) {
            if prec < min_prec {
                break;
            }
            self.deepen(levels)?;
            self.advance();
            let rhs = Box::new(self.parse_binary(prec + 1)?);
            let l = Box::new(lhs);
            lhs = match infix {
                Infix::Binary(op) => Expr::Binary { op, lhs: l, rhs },
                Infix::Logical(op) => Expr::Logical { op, lhs: l, rhs },
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Plus,
            Token::Bang => UnaryOp::Not,
            Token::Tilde => UnaryOp::BitNot,
            Token::PlusPlus | Token::MinusMinus => {
                let increment = self.advance() == Token::PlusPlus;
                let target = self.expect_ident()
                    .map_err(|_| self.err("invalid increment/decrement target"))?;
                return Ok(Expr::Update { increment, prefix: true, target });
            }
            _ => return self.parse_exponent(),
        };
        self.advance();
        let expr = Box::new(self.nested(|p| p.parse_unary())?);
        Ok(Expr::Unary { op, expr })
    }

    fn parse_exponent(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_postfix()?;
        if !self.eat(&Token::StarStar) {
            return Ok(base);
        }
        // Right-associative: 2 ** 3 ** 2 == 2 ** 9
        let exponent = self.nested(|p| p.parse_unary())?;
        Ok(Expr::Binary { op: BinaryOp::Pow, lhs: Box::new(base), rhs: Box::new(exponent) })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut levels = 0;
        let out = self.parse_postfix_chain(&mut levels);
        self.depth -= levels;
        out
    }

    fn parse_postfix_chain(&mut self, levels: &mut usize) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if matches!(self.peek(), Token::LParen | Token::Dot | Token::LBracket) {
                self.deepen(levels)?;
            }
            match self.peek() {
                Token::LParen => {
                    self.advance();
                    let args = self.parse_args()?;
                    expr = Expr::Call { callee: Box::new(expr), args };
                }
                Token::Dot => {
                    self.advance();
                    let property = self.expect_ident()?;
                    expr = Expr::Member { object: Box::new(expr), property };
                }
                Token::LBracket => {
                    self.advance();
                    let index = Box::new(self.parse_expr()?);
                    self.expect_token(&Token::RBracket)?;
                    expr = Expr::Index { object: Box::new(expr), index };
                }
                Token::PlusPlus | Token::MinusMinus if !self.newline_before() => {
                    let Expr::Ident(target) = expr else {
                        return Err(self.err("invalid increment/decrement target"));
                    };
                    let increment = self.advance() == Token::PlusPlus;
                    return Ok(Expr::Update { increment, prefix: false, target });
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.eat(&Token::RParen) {
                break;
            }
            self.expect_token(&Token::Comma)?;
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.advance() {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s)    => Ok(Expr::Str(s.into())),
            Token::True      => Ok(Expr::Bool(true)),
            Token::False     => Ok(Expr::Bool(false)),
            Token::Null      => Ok(Expr::Null),
            Token::Undefined => Ok(Expr::Undefined),
            Token::Ident(s)  => Ok(Expr::Ident(s)),
            Token::LParen => {
                let expr = self.parse_expr()?;
                self.expect_token(&Token::RParen)?;
                Ok(expr)
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if !self.eat(&Token::RBracket) {
                    loop {
                        items.push(self.parse_expr()?);
                        if self.eat(&Token::RBracket) {
                            break;
                        }
                        self.expect_token(&Token::Comma)?;
                        // trailing comma
                        if self.eat(&Token::RBracket) {
                            break;
                        }
                    }
                }
                Ok(Expr::Array(items))
            }
            Token::Function => {
                let def = self.parse_function_rest(false)?;
                Ok(Expr::Function(Rc::new(def)))
            }
            tok => {
                // Report at the offending token, not after it.
                self.pos = self.pos.saturating_sub(1);
                Err(self.err(format!("expected an expression, got {:?}", tok)))
            }
        }
    }

    // ── Arrow functions ───────────────────────────────────────────────────

    /// `x =>` or `( [ident {, ident}] ) =>` starting at the current token.
    fn at_arrow_function(&self) -> bool {
        match self.peek() {
            Token::Ident(_) => self.peek_ahead(1) == &Token::Arrow,
            Token::LParen => {
                let mut i = 1;
                if self.peek_ahead(i) == &Token::RParen {
                    return self.peek_ahead(i + 1) == &Token::Arrow;
                }
                loop {
                    if !matches!(self.peek_ahead(i), Token::Ident(_)) {
                        return false;
                    }
                    match self.peek_ahead(i + 1) {
                        Token::Comma => i += 2,
                        Token::RParen => return self.peek_ahead(i + 2) == &Token::Arrow,
                        _ => return false,
                    }
                }
            }
            _ => false,
        }
    }

    fn parse_arrow_function(&mut self) -> Result<Expr, ParseError> {
        let params = if self.eat(&Token::LParen) {
            self.parse_params()?
        } else {
            vec![self.expect_ident()?]
        };
        self.expect_token(&Token::Arrow)?;
        let body = if self.peek() == &Token::LBrace {
            FunctionBody::Block(self.nested(|p| p.parse_block())?)
        } else {
            FunctionBody::Expr(self.nested(|p| p.parse_assignment())?)
        };
        Ok(Expr::Function(Rc::new(FunctionDef { name: None, params, body })))
    }
}

// ── Public parse entry point ──────────────────────────────────────────────

/// Parse color-function source text into a [`Program`].
pub fn parse_str(src: &str) -> Result<Program, ParseError> {
    let tokens = Lexer::new(src).tokenize()?;
    Parser::new(tokens).parse_program()
}
