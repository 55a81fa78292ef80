//! Expression parsing via operator precedence (Pratt parsing).
//!
//! # Precedence (higher binds tighter)
//!
//! | Level | Operators |
//! |-------|-----------|
//! | 40 | `*`, `/`, `DIV`, `MOD` |
//! | 20 | `+`, `-` |
//! | 10 | `=`, `<>`, `<`, `>`, `<=`, `>=` |
//! | 5  | `AND` |
//! | 4  | `OR` |
//!
//! All binary operators are left-associative. `NOT` and unary `-` are
//! prefix operators that bind tighter than any binary operator.

use crate::ast::{BinOp, Expr, UnOp};
use crate::Parser;
use pscc_lex::Token;

/// Maps a token to its binary operator and precedence, if it is one.
fn binop_for(token: &Token) -> Option<(BinOp, u8)> {
    let entry = match token {
        Token::Star => (BinOp::Mul, 40),
        Token::Slash => (BinOp::Div, 40),
        Token::Div => (BinOp::IntDiv, 40),
        Token::Mod => (BinOp::Mod, 40),
        Token::Plus => (BinOp::Add, 20),
        Token::Minus => (BinOp::Sub, 20),
        Token::Eq => (BinOp::Eq, 10),
        Token::Ne => (BinOp::Ne, 10),
        Token::Lt => (BinOp::Lt, 10),
        Token::Gt => (BinOp::Gt, 10),
        Token::Le => (BinOp::Le, 10),
        Token::Ge => (BinOp::Ge, 10),
        Token::And => (BinOp::And, 5),
        Token::Or => (BinOp::Or, 4),
        _ => return None,
    };
    Some(entry)
}

impl<'a> Parser<'a> {
    /// Parses a complete expression.
    pub(crate) fn parse_expr(&mut self) -> Option<Expr> {
        let lhs = self.parse_unary()?;
        self.parse_binop_rhs(1, lhs)
    }

    /// The Pratt loop: folds operators of at least `min_prec` onto `lhs`.
    ///
    /// When the operator after the right-hand side binds tighter than the
    /// one just consumed, the right-hand side is extended first; this is
    /// what makes `a + b * c` parse as `a + (b * c)` while `a - b - c`
    /// stays left-associated.
    fn parse_binop_rhs(&mut self, min_prec: u8, mut lhs: Expr) -> Option<Expr> {
        loop {
            let Some((op, prec)) = binop_for(self.current()) else {
                return Some(lhs);
            };
            if prec < min_prec {
                return Some(lhs);
            }

            let line = self.line();
            self.advance();

            let mut rhs = self.parse_unary()?;

            if let Some((_, next_prec)) = binop_for(self.current()) {
                if prec < next_prec {
                    rhs = self.parse_binop_rhs(prec + 1, rhs)?;
                }
            }

            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
    }

    /// Parses a prefix operator chain or a primary.
    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.current() {
            Token::Minus => UnOp::Neg,
            Token::Not => UnOp::Not,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Some(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// Parses a primary expression.
    ///
    /// Literals, `TRUE`/`FALSE`, parenthesized expressions, and identifier
    /// forms. On failure nothing is consumed; statement-level recovery
    /// makes the progress.
    fn parse_primary(&mut self) -> Option<Expr> {
        match self.current().clone() {
            Token::Int(value) => {
                self.advance();
                Some(Expr::Int(value))
            },
            Token::Float(value) => {
                self.advance();
                Some(Expr::Real(value))
            },
            Token::True => {
                self.advance();
                Some(Expr::Bool(true))
            },
            Token::False => {
                self.advance();
                Some(Expr::Bool(false))
            },
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(Token::RParen);
                Some(inner)
            },
            Token::Ident(name) => {
                let line = self.line();
                self.advance();
                self.parse_ident_expr(name, line)
            },
            other => {
                self.error(format!("expected expression, found {}", other));
                None
            },
        }
    }

    /// Disambiguates an identifier primary by its follower.
    ///
    /// `(` starts a call, `[` an array access, anything else leaves a plain
    /// variable reference.
    fn parse_ident_expr(&mut self, name: String, line: u32) -> Option<Expr> {
        match self.current() {
            Token::LParen => {
                self.advance();
                let args = self.parse_expr_list(Token::RParen)?;
                Some(Expr::Call { callee: name, args })
            },
            Token::LBracket => {
                self.advance();
                let indices = self.parse_expr_list(Token::RBracket)?;
                if indices.is_empty() {
                    self.error(format!("array access `{}[]` needs at least one index", name));
                    return None;
                }
                Some(Expr::ArrayAccess {
                    name,
                    indices,
                    line,
                })
            },
            _ => Some(Expr::Var(name)),
        }
    }

    /// Parses a comma-separated expression list up to `close`.
    ///
    /// Consumes the closing token. An empty list is allowed (for calls).
    pub(crate) fn parse_expr_list(&mut self, close: Token) -> Option<Vec<Expr>> {
        let mut items = Vec::new();

        if self.eat(&close) {
            return Some(items);
        }

        loop {
            items.push(self.parse_expr()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            break;
        }

        self.expect(close);
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pscc_util::Handler;

    fn parse_one(source: &str) -> Expr {
        let handler = Handler::new_quiet();
        let mut parser = Parser::new(source, &handler);
        let expr = parser.parse_expr().expect("expression should parse");
        assert!(!handler.has_errors(), "unexpected diagnostics");
        expr
    }

    fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            line: 1,
        }
    }

    #[test]
    fn test_mul_binds_tighter_than_add() {
        assert_eq!(
            parse_one("a + b * c"),
            binary(
                BinOp::Add,
                Expr::Var("a".into()),
                binary(BinOp::Mul, Expr::Var("b".into()), Expr::Var("c".into())),
            )
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        assert_eq!(
            parse_one("a AND b OR c"),
            binary(
                BinOp::Or,
                binary(BinOp::And, Expr::Var("a".into()), Expr::Var("b".into())),
                Expr::Var("c".into()),
            )
        );
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        assert_eq!(
            parse_one("a - b - c"),
            binary(
                BinOp::Sub,
                binary(BinOp::Sub, Expr::Var("a".into()), Expr::Var("b".into())),
                Expr::Var("c".into()),
            )
        );
    }

    #[test]
    fn test_comparison_of_sums() {
        assert_eq!(
            parse_one("a + 1 <= b * 2"),
            binary(
                BinOp::Le,
                binary(BinOp::Add, Expr::Var("a".into()), Expr::Int(1)),
                binary(BinOp::Mul, Expr::Var("b".into()), Expr::Int(2)),
            )
        );
    }

    #[test]
    fn test_parens_override_precedence() {
        assert_eq!(
            parse_one("(a + b) * c"),
            binary(
                BinOp::Mul,
                binary(BinOp::Add, Expr::Var("a".into()), Expr::Var("b".into())),
                Expr::Var("c".into()),
            )
        );
    }

    #[test]
    fn test_div_mod_keywords() {
        assert_eq!(
            parse_one("a DIV b MOD c"),
            binary(
                BinOp::Mod,
                binary(BinOp::IntDiv, Expr::Var("a".into()), Expr::Var("b".into())),
                Expr::Var("c".into()),
            )
        );
    }

    #[test]
    fn test_unary_not_and_neg() {
        assert_eq!(
            parse_one("NOT -x"),
            Expr::Unary {
                op: UnOp::Not,
                operand: Box::new(Expr::Unary {
                    op: UnOp::Neg,
                    operand: Box::new(Expr::Var("x".into())),
                }),
            }
        );
    }

    #[test]
    fn test_unary_binds_tighter_than_binary() {
        assert_eq!(
            parse_one("-a + b"),
            binary(
                BinOp::Add,
                Expr::Unary {
                    op: UnOp::Neg,
                    operand: Box::new(Expr::Var("a".into())),
                },
                Expr::Var("b".into()),
            )
        );
    }

    #[test]
    fn test_call_expression() {
        assert_eq!(
            parse_one("f(x, 1 + 2)"),
            Expr::Call {
                callee: "f".into(),
                args: vec![
                    Expr::Var("x".into()),
                    binary(BinOp::Add, Expr::Int(1), Expr::Int(2)),
                ],
            }
        );
    }

    #[test]
    fn test_call_no_args() {
        assert_eq!(
            parse_one("f()"),
            Expr::Call {
                callee: "f".into(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_array_access() {
        assert_eq!(
            parse_one("a[i, j + 1]"),
            Expr::ArrayAccess {
                name: "a".into(),
                indices: vec![
                    Expr::Var("i".into()),
                    binary(BinOp::Add, Expr::Var("j".into()), Expr::Int(1)),
                ],
                line: 1,
            }
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_one("42"), Expr::Int(42));
        assert_eq!(parse_one("3.5"), Expr::Real(3.5));
        assert_eq!(parse_one("TRUE"), Expr::Bool(true));
        assert_eq!(parse_one("FALSE"), Expr::Bool(false));
    }

    #[test]
    fn test_missing_operand_is_reported() {
        let handler = Handler::new_quiet();
        let mut parser = Parser::new("a + ", &handler);
        assert_eq!(parser.parse_expr(), None);
        assert!(handler.has_errors());
    }
}
