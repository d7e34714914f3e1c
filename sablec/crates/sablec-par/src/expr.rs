//! Expression parsing.

use sablec_lex::Token;

use crate::ast::{BinOpKind, CmpOpKind, Constant, Expr, ExprContext, ExprId};
use crate::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> Option<ExprId> {
        self.parse_comparison()
    }

    /// Comparison chains: `a == b != c` keeps the left operand plus parallel
    /// operator/comparator lists.
    fn parse_comparison(&mut self) -> Option<ExprId> {
        let left = self.parse_additive()?;

        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        loop {
            let op = match self.peek() {
                Token::EqEq => CmpOpKind::Eq,
                Token::NotEq => CmpOpKind::NotEq,
                Token::Gt => CmpOpKind::Gt,
                Token::Lt => CmpOpKind::Lt,
                _ => break,
            };
            self.bump();
            ops.push(op);
            comparators.push(self.parse_additive()?);
        }

        if ops.is_empty() {
            return Some(left);
        }

        let span = self
            .ast
            .expr(left)
            .span()
            .to(self.ast.expr(*comparators.last().unwrap()).span());
        Some(self.ast.add_expr(Expr::Compare {
            left,
            ops,
            comparators,
            span,
        }))
    }

    fn parse_additive(&mut self) -> Option<ExprId> {
        let mut left = self.parse_postfix()?;

        loop {
            let op = match self.peek() {
                Token::Plus => BinOpKind::Add,
                Token::Minus => BinOpKind::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_postfix()?;

            let span = self.ast.expr(left).span().to(self.ast.expr(right).span());
            left = self.ast.add_expr(Expr::BinOp {
                left,
                op,
                right,
                span,
            });
        }

        Some(left)
    }

    /// Atoms followed by call suffixes.
    fn parse_postfix(&mut self) -> Option<ExprId> {
        let mut expr = self.parse_atom()?;

        while self.check(&Token::LParen) {
            self.bump();

            let mut args = Vec::new();
            while !self.check(&Token::RParen) {
                args.push(self.parse_expr()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            let close = self.expect(&Token::RParen)?;

            let span = self.ast.expr(expr).span().to(close);
            expr = self.ast.add_expr(Expr::Call {
                func: expr,
                args,
                span,
            });
        }

        Some(expr)
    }

    fn parse_atom(&mut self) -> Option<ExprId> {
        let (token, span) = self.bump();

        let expr = match token {
            Token::Int(value) => Expr::Constant {
                value: Constant::Int(value),
                span,
            },
            Token::Float(value) => Expr::Constant {
                value: Constant::Float(value),
                span,
            },
            Token::Str(value) => Expr::Constant {
                value: Constant::Str(value),
                span,
            },
            Token::True => Expr::Constant {
                value: Constant::Bool(true),
                span,
            },
            Token::False => Expr::Constant {
                value: Constant::Bool(false),
                span,
            },
            Token::None => Expr::Constant {
                value: Constant::None,
                span,
            },
            Token::Ident(id) => Expr::Name {
                id,
                ctx: ExprContext::Load,
                span,
            },
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                return Some(inner);
            }
            other => {
                self.error_at(
                    span,
                    format!("expected expression, found {}", other.describe()),
                );
                return None;
            }
        };

        Some(self.ast.add_expr(expr))
    }
}
