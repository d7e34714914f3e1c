//! sablec-par - Syntax Analysis
//!
//! Recursive descent parser over the token stream from `sablec-lex`,
//! producing arena-backed AST nodes (`ast` module). Parse errors are
//! reported through the shared diagnostic `Handler`; the parser recovers at
//! statement boundaries so a single bad line does not hide later errors.

pub mod ast;
mod expr;
mod stmt;

pub use ast::{
    Ast, BinOpKind, CmpOpKind, Constant, Expr, ExprContext, ExprId, FunctionDef, Module, Param,
    Stmt, StmtId,
};

use sablec_lex::{tokenize, Token};
use sablec_util::{Handler, Span, Symbol};

/// Parser state over a token stream.
pub struct Parser<'a> {
    pub(crate) ast: Ast,
    tokens: Vec<(Token, Span)>,
    pos: usize,
    handler: &'a Handler,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<(Token, Span)>, handler: &'a Handler) -> Self {
        debug_assert!(matches!(tokens.last(), Some((Token::Eof, _))));
        Self {
            ast: Ast::new(),
            tokens,
            pos: 0,
            handler,
        }
    }

    /// Parse a whole module, consuming the parser.
    pub fn parse_module(mut self) -> (Ast, Module) {
        let start = self.peek_span();
        let mut body = Vec::new();

        loop {
            // Stray indentation tokens can be left behind by error recovery.
            while matches!(
                self.peek(),
                Token::Newline | Token::Indent | Token::Dedent
            ) {
                self.bump();
            }
            if self.check(&Token::Eof) {
                break;
            }

            match self.parse_stmt() {
                Some(stmt) => body.push(stmt),
                None => self.synchronize(),
            }
        }

        let span = start.to(self.peek_span());
        (self.ast, Module { body, span })
    }

    // Token helpers

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    pub(crate) fn peek_span(&self) -> Span {
        self.tokens[self.pos].1
    }

    pub(crate) fn bump(&mut self) -> (Token, Span) {
        let (token, span) = self.tokens[self.pos].clone();
        if !matches!(token, Token::Eof) {
            self.pos += 1;
        }
        (token, span)
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    pub(crate) fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, token: &Token) -> Option<Span> {
        if self.check(token) {
            Some(self.bump().1)
        } else {
            self.error_here(format!(
                "expected {}, found {}",
                token.describe(),
                self.peek().describe()
            ));
            None
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Option<(Symbol, Span)> {
        match self.peek() {
            Token::Ident(sym) => {
                let sym = *sym;
                let span = self.bump().1;
                Some((sym, span))
            }
            other => {
                self.error_here(format!("expected identifier, found {}", other.describe()));
                None
            }
        }
    }

    pub(crate) fn error_here(&self, message: impl Into<String>) {
        self.handler.error(message, self.peek_span());
    }

    pub(crate) fn error_at(&self, span: Span, message: impl Into<String>) {
        self.handler.error(message, span);
    }

    /// Skip forward to the next statement boundary after a parse error.
    pub(crate) fn synchronize(&mut self) {
        loop {
            match self.peek() {
                Token::Eof => break,
                Token::Newline | Token::Dedent => {
                    self.bump();
                    break;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }
}

/// Lex and parse a source text into an AST and module.
pub fn parse_source(source: &str, handler: &Handler) -> (Ast, Module) {
    let tokens = tokenize(source, handler);
    Parser::new(tokens, handler).parse_module()
}

/// Parse a standalone expression, as needed by lazy (string) annotations.
///
/// Returns `None` when the text does not lex and parse cleanly as a single
/// expression.
pub fn parse_type_expr(source: &str) -> Option<(Ast, ExprId)> {
    let handler = Handler::new();
    let tokens = tokenize(source, &handler);
    let mut parser = Parser::new(tokens, &handler);

    let expr = parser.parse_expr()?;
    if !matches!(parser.peek(), Token::Newline | Token::Eof) {
        return None;
    }
    if handler.has_errors() {
        return None;
    }

    Some((parser.ast, expr))
}
