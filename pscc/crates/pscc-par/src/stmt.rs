//! Statement parsing.
//!
//! One function per statement form, dispatched on the current token. Every
//! function returns `None` after reporting a diagnostic; the caller skips a
//! token and tries again at statement level.

use crate::ast::{Stmt, TypeTag};
use crate::Parser;
use pscc_lex::Token;

impl<'a> Parser<'a> {
    /// Parses one statement, dispatching on the current token.
    pub(crate) fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.current() {
            Token::Declare => self.parse_declare(),
            Token::Ident(_) => self.parse_assign(),
            Token::Input => self.parse_input(),
            Token::Output => self.parse_output(),
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            Token::Repeat => self.parse_repeat(),
            Token::For => self.parse_for(),
            Token::Function => self.parse_function(),
            Token::Procedure => self.parse_procedure(),
            Token::Call => self.parse_call_stmt(),
            Token::Return => self.parse_return(),
            other => {
                self.error(format!("unexpected {} at start of statement", other));
                None
            },
        }
    }

    /// Parses statements until one of `terminators` (or end of input).
    ///
    /// The terminator itself is left for the caller. Unparseable tokens
    /// inside the block are skipped one at a time, same as at top level.
    pub(crate) fn parse_block(&mut self, terminators: &[Token]) -> Vec<Stmt> {
        let mut body = Vec::new();

        while self.current() != &Token::Eof && !terminators.contains(self.current()) {
            match self.parse_stmt() {
                Some(stmt) => body.push(stmt),
                None => {
                    if self.current() != &Token::Eof && !terminators.contains(self.current()) {
                        self.advance();
                    }
                },
            }
        }

        body
    }

    /// Parses a type name in declaration or signature position.
    ///
    /// `STRING` is not a reserved word; it arrives as an identifier and is
    /// recognized here by spelling.
    pub(crate) fn parse_type_tag(&mut self) -> Option<TypeTag> {
        match self.current() {
            Token::Integer => {
                self.advance();
                Some(TypeTag::Integer)
            },
            Token::Real => {
                self.advance();
                Some(TypeTag::Real)
            },
            Token::Boolean => {
                self.advance();
                Some(TypeTag::Boolean)
            },
            Token::Ident(name) if name == "STRING" => {
                self.advance();
                Some(TypeTag::String)
            },
            other => {
                self.error(format!("expected a type name, found {}", other));
                None
            },
        }
    }

    /// `DECLARE name : type` or `DECLARE name : ARRAY[lb:ub, ...] OF type`
    fn parse_declare(&mut self) -> Option<Stmt> {
        self.advance();
        let name = self.expect_ident("a variable name after DECLARE")?;
        self.expect(Token::Colon);

        if self.eat(&Token::Array) {
            return self.parse_array_declare(name);
        }

        let ty = self.parse_type_tag()?;
        Some(Stmt::Declare { name, ty })
    }

    /// The bracketed bounds and element type of an array declaration.
    fn parse_array_declare(&mut self, name: String) -> Option<Stmt> {
        self.expect(Token::LBracket);

        let mut bounds = Vec::new();
        loop {
            let lower = self.parse_expr()?;
            self.expect(Token::Colon);
            let upper = self.parse_expr()?;
            bounds.push((lower, upper));

            if self.eat(&Token::Comma) {
                continue;
            }
            break;
        }
        self.expect(Token::RBracket);

        self.expect(Token::Of);
        let elem = self.parse_type_tag()?;

        Some(Stmt::DeclareArray { name, elem, bounds })
    }

    /// `name <- expr` or `name[indices] <- expr`.
    ///
    /// The identifier has already been seen but not consumed; the next
    /// token decides which assignment form this is.
    fn parse_assign(&mut self) -> Option<Stmt> {
        let line = self.line();
        let name = self.expect_ident("an identifier")?;

        if self.eat(&Token::Assign) {
            let value = self.parse_expr()?;
            return Some(Stmt::Assign { name, value });
        }

        if self.eat(&Token::LBracket) {
            let indices = self.parse_expr_list(Token::RBracket)?;
            if indices.is_empty() {
                self.error(format!("array assignment to `{}` needs at least one index", name));
                return None;
            }
            self.expect(Token::Assign);
            let value = self.parse_expr()?;
            return Some(Stmt::AssignArray {
                name,
                indices,
                value,
                line,
            });
        }

        self.error(format!(
            "expected `<-` or `[` after identifier `{}`, found {}",
            name,
            self.current()
        ));
        None
    }

    /// `INPUT name`
    fn parse_input(&mut self) -> Option<Stmt> {
        self.advance();
        let name = self.expect_ident("a variable name after INPUT")?;
        Some(Stmt::Input(name))
    }

    /// `OUTPUT expr`
    fn parse_output(&mut self) -> Option<Stmt> {
        self.advance();
        let expr = self.parse_expr()?;
        Some(Stmt::Output(expr))
    }

    /// `IF cond THEN then-block [ELSE else-block] ENDIF`
    fn parse_if(&mut self) -> Option<Stmt> {
        self.advance();
        let cond = self.parse_expr()?;
        self.expect(Token::Then);

        let then_body = self.parse_block(&[Token::Else, Token::EndIf]);

        let else_body = if self.eat(&Token::Else) {
            self.parse_block(&[Token::EndIf])
        } else {
            Vec::new()
        };

        self.expect(Token::EndIf);
        Some(Stmt::If {
            cond,
            then_body,
            else_body,
        })
    }

    /// `WHILE cond DO body ENDWHILE`
    fn parse_while(&mut self) -> Option<Stmt> {
        self.advance();
        let cond = self.parse_expr()?;
        self.expect(Token::Do);

        let body = self.parse_block(&[Token::EndWhile]);
        self.expect(Token::EndWhile);

        Some(Stmt::While { cond, body })
    }

    /// `REPEAT body UNTIL cond`
    fn parse_repeat(&mut self) -> Option<Stmt> {
        self.advance();
        let body = self.parse_block(&[Token::Until]);
        self.expect(Token::Until);
        let until = self.parse_expr()?;

        Some(Stmt::Repeat { body, until })
    }

    /// `FOR var <- start TO end [STEP step] body NEXT var`
    ///
    /// The identifier after NEXT must name the loop variable.
    fn parse_for(&mut self) -> Option<Stmt> {
        self.advance();
        let var = self.expect_ident("a loop variable after FOR")?;
        self.expect(Token::Assign);
        let start = self.parse_expr()?;
        self.expect(Token::To);
        let end = self.parse_expr()?;

        let step = if self.eat(&Token::Step) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let body = self.parse_block(&[Token::Next]);
        self.expect(Token::Next);

        if let Some(next_var) = self.expect_ident("the loop variable after NEXT") {
            if next_var != var {
                self.error(format!(
                    "NEXT names `{}` but the loop variable is `{}`",
                    next_var, var
                ));
            }
        }

        Some(Stmt::For {
            var,
            start,
            end,
            step,
            body,
        })
    }
}
