//! Core lexer implementation.
//!
//! Besides ordinary token scanning, the lexer implements the off-side rule:
//! at the start of each logical line it measures leading whitespace against
//! an indentation stack and synthesizes `Indent`/`Dedent` tokens. Line
//! structure (newlines and indentation) is suppressed inside parentheses.

use std::collections::VecDeque;

use sablec_util::{Handler, Span, Symbol};

use crate::cursor::Cursor;
use crate::token::Token;

/// Lexer for the sable surface language.
pub struct Lexer<'a> {
    source: &'a str,
    cursor: Cursor<'a>,

    /// Sink for lexical error diagnostics.
    handler: &'a Handler,

    /// Indentation stack; invariant: starts with 0 and is strictly
    /// increasing.
    indents: Vec<u32>,

    /// Open parenthesis depth; newlines and indentation are insignificant
    /// while nonzero.
    paren_depth: u32,

    /// Whether the cursor sits at the start of a logical line.
    at_line_start: bool,

    /// Whether the previously returned token was a `Newline` (or nothing
    /// has been returned yet); controls the synthetic final newline.
    last_was_newline: bool,

    /// Tokens synthesized ahead of the cursor (indents, dedents, eof).
    pending: VecDeque<(Token, Span)>,

    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            source,
            cursor: Cursor::new(source),
            handler,
            indents: vec![0],
            paren_depth: 0,
            at_line_start: true,
            last_was_newline: true,
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Returns the next token and its span.
    pub fn next_token(&mut self) -> (Token, Span) {
        if let Some(pending) = self.pending.pop_front() {
            self.last_was_newline = matches!(pending.0, Token::Newline);
            return pending;
        }

        if self.done {
            let span = self.span_here();
            return (Token::Eof, span);
        }

        if self.at_line_start && self.paren_depth == 0 {
            self.handle_indentation();
            if let Some(pending) = self.pending.pop_front() {
                return pending;
            }
        }

        loop {
            self.skip_spaces_and_comments();

            if self.cursor.is_at_end() {
                return self.finish();
            }

            let start = self.cursor.position();
            let c = self.cursor.current_char();

            if c == '\n' {
                self.cursor.advance();
                if self.paren_depth > 0 {
                    continue;
                }
                self.at_line_start = true;
                self.last_was_newline = true;
                return (Token::Newline, self.span_from(start));
            }

            self.last_was_newline = false;
            return self.lex_content(start, c);
        }
    }

    fn lex_content(&mut self, start: usize, c: char) -> (Token, Span) {
        let token = match c {
            '(' => {
                self.cursor.advance();
                self.paren_depth += 1;
                Token::LParen
            }
            ')' => {
                self.cursor.advance();
                self.paren_depth = self.paren_depth.saturating_sub(1);
                Token::RParen
            }
            ':' => {
                self.cursor.advance();
                Token::Colon
            }
            ',' => {
                self.cursor.advance();
                Token::Comma
            }
            '+' => {
                self.cursor.advance();
                if self.cursor.current_char() == '=' {
                    self.cursor.advance();
                    Token::PlusEq
                } else {
                    Token::Plus
                }
            }
            '-' => {
                self.cursor.advance();
                match self.cursor.current_char() {
                    '>' => {
                        self.cursor.advance();
                        Token::Arrow
                    }
                    '=' => {
                        self.cursor.advance();
                        Token::MinusEq
                    }
                    _ => Token::Minus,
                }
            }
            '=' => {
                self.cursor.advance();
                if self.cursor.current_char() == '=' {
                    self.cursor.advance();
                    Token::EqEq
                } else {
                    Token::Eq
                }
            }
            '!' => {
                self.cursor.advance();
                if self.cursor.current_char() == '=' {
                    self.cursor.advance();
                    Token::NotEq
                } else {
                    self.handler
                        .error("unexpected character `!`", self.span_from(start));
                    Token::Invalid('!')
                }
            }
            '<' => {
                self.cursor.advance();
                Token::Lt
            }
            '>' => {
                self.cursor.advance();
                Token::Gt
            }
            '"' | '\'' => return self.lex_string(start, c),
            c if c.is_ascii_digit() => return self.lex_number(start),
            c if c == '_' || c.is_ascii_alphabetic() => return self.lex_identifier(start),
            c => {
                self.cursor.advance();
                self.handler.error(
                    format!("unexpected character `{}`", c),
                    self.span_from(start),
                );
                Token::Invalid(c)
            }
        };

        (token, self.span_from(start))
    }

    fn lex_identifier(&mut self, start: usize) -> (Token, Span) {
        let text = self
            .cursor
            .eat_while(|c| c == '_' || c.is_ascii_alphanumeric());

        let token = Token::keyword(text).unwrap_or_else(|| Token::Ident(Symbol::intern(text)));
        (token, self.span_from(start))
    }

    fn lex_number(&mut self, start: usize) -> (Token, Span) {
        self.cursor.eat_while(|c| c.is_ascii_digit());

        let is_float =
            self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit();
        if is_float {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }

        let span = self.span_from(start);
        let text = self.text_from(start);

        let token = if is_float {
            match text.parse::<f64>() {
                Ok(value) => Token::Float(value),
                Err(_) => {
                    self.handler
                        .error(format!("invalid float literal `{}`", text), span);
                    Token::Float(0.0)
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => Token::Int(value),
                Err(_) => {
                    self.handler
                        .error(format!("integer literal `{}` out of range", text), span);
                    Token::Int(0)
                }
            }
        };

        (token, span)
    }

    fn lex_string(&mut self, start: usize, quote: char) -> (Token, Span) {
        self.cursor.advance();

        let mut value = String::new();
        loop {
            let c = self.cursor.current_char();

            if self.cursor.is_at_end() || c == '\n' {
                self.handler
                    .error("unterminated string literal", self.span_from(start));
                break;
            }

            if c == quote {
                self.cursor.advance();
                break;
            }

            if c == '\\' {
                self.cursor.advance();
                let escaped = self.cursor.current_char();
                self.cursor.advance();
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    '\\' => value.push('\\'),
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    other => {
                        self.handler.error(
                            format!("unknown escape sequence `\\{}`", other),
                            self.span_from(start),
                        );
                    }
                }
                continue;
            }

            value.push(c);
            self.cursor.advance();
        }

        (Token::Str(value), self.span_from(start))
    }

    /// Measure the indentation of the next non-blank line and queue any
    /// `Indent`/`Dedent` tokens it implies.
    fn handle_indentation(&mut self) {
        self.at_line_start = false;

        let width = loop {
            let mut width = 0u32;
            loop {
                match self.cursor.current_char() {
                    ' ' => {
                        width += 1;
                        self.cursor.advance();
                    }
                    '\t' => {
                        self.handler.error(
                            "tab characters are not allowed in indentation",
                            self.span_here(),
                        );
                        width += 1;
                        self.cursor.advance();
                    }
                    _ => break,
                }
            }

            match self.cursor.current_char() {
                // Blank and comment-only lines do not affect indentation.
                '\n' => {
                    self.cursor.advance();
                    continue;
                }
                '#' => {
                    self.cursor.eat_while(|c| c != '\n');
                    continue;
                }
                _ if self.cursor.is_at_end() => return,
                _ => break width,
            }
        };

        let span = self.span_here();
        let current = *self.indents.last().unwrap_or(&0);

        if width > current {
            self.indents.push(width);
            self.pending.push_back((Token::Indent, span));
        } else if width < current {
            while *self.indents.last().unwrap_or(&0) > width {
                self.indents.pop();
                self.pending.push_back((Token::Dedent, span));
            }
            if *self.indents.last().unwrap_or(&0) != width {
                self.handler
                    .error("dedent does not match any outer indentation level", span);
                self.indents.push(width);
            }
        }
    }

    /// Queue the synthetic end-of-input sequence: a final newline if the
    /// last line had content, one dedent per open indentation level, `Eof`.
    fn finish(&mut self) -> (Token, Span) {
        self.done = true;
        let span = self.span_here();

        if !self.last_was_newline {
            self.pending.push_back((Token::Newline, span));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.pending.push_back((Token::Dedent, span));
        }
        self.pending.push_back((Token::Eof, span));

        let front = self.pending.pop_front().unwrap();
        self.last_was_newline = matches!(front.0, Token::Newline);
        front
    }

    fn skip_spaces_and_comments(&mut self) {
        loop {
            match self.cursor.current_char() {
                ' ' | '\t' | '\r' => self.cursor.advance(),
                '#' => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                _ => break,
            }
        }
    }

    fn span_here(&self) -> Span {
        let pos = self.cursor.position() as u32;
        Span::new(pos, pos)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start as u32, self.cursor.position() as u32)
    }

    fn text_from(&self, start: usize) -> &'a str {
        &self.source[start..self.cursor.position()]
    }
}

/// Tokenize an entire source text, including the trailing `Eof`.
pub fn tokenize(source: &str, handler: &Handler) -> Vec<(Token, Span)> {
    let mut lexer = Lexer::new(source, handler);
    let mut tokens = Vec::new();

    loop {
        let (token, span) = lexer.next_token();
        let is_eof = token == Token::Eof;
        tokens.push((token, span));
        if is_eof {
            break;
        }
    }

    tokens
}
