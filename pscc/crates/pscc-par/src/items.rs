//! FUNCTION / PROCEDURE definitions, CALL statements, and RETURN.

use crate::ast::{FunctionDef, Param, Prototype, Stmt, TypeTag};
use crate::Parser;
use pscc_lex::Token;

/// Tokens that may legally follow a bare `RETURN`.
///
/// A RETURN with no expression is recognized by its follower being a block
/// terminator (or the end of input).
const RETURN_FOLLOWERS: &[Token] = &[
    Token::EndIf,
    Token::Else,
    Token::EndFunction,
    Token::EndProcedure,
    Token::EndWhile,
    Token::Until,
    Token::Next,
    Token::Eof,
];

impl<'a> Parser<'a> {
    /// `FUNCTION name(params) RETURNS type body ENDFUNCTION`
    pub(crate) fn parse_function(&mut self) -> Option<Stmt> {
        self.advance();
        let name = self.expect_ident("a function name")?;
        let params = self.parse_param_list()?;

        self.expect(Token::Returns);
        let ret = self.parse_type_tag().unwrap_or(TypeTag::Integer);

        let body = self.parse_block(&[Token::EndFunction]);
        self.expect(Token::EndFunction);

        Some(Stmt::FunctionDef(FunctionDef {
            proto: Prototype { name, params, ret },
            body,
        }))
    }

    /// `PROCEDURE name(params) body ENDPROCEDURE`
    ///
    /// Procedures are functions returning VOID.
    pub(crate) fn parse_procedure(&mut self) -> Option<Stmt> {
        self.advance();
        let name = self.expect_ident("a procedure name")?;
        let params = self.parse_param_list()?;

        let body = self.parse_block(&[Token::EndProcedure]);
        self.expect(Token::EndProcedure);

        Some(Stmt::FunctionDef(FunctionDef {
            proto: Prototype {
                name,
                params,
                ret: TypeTag::Void,
            },
            body,
        }))
    }

    /// Parses a parenthesized parameter list.
    ///
    /// Form: `([BYREF|BYVAL] name : type {, ...})`. The parentheses are
    /// optional as a whole: `PROCEDURE p` declares a parameterless
    /// procedure.
    fn parse_param_list(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();

        if !self.eat(&Token::LParen) {
            return Some(params);
        }
        if self.eat(&Token::RParen) {
            return Some(params);
        }

        loop {
            let by_ref = if self.eat(&Token::ByRef) {
                true
            } else {
                self.eat(&Token::ByVal);
                false
            };

            let name = self.expect_ident("a parameter name")?;
            self.expect(Token::Colon);
            let ty = self.parse_type_tag()?;

            params.push(Param { name, ty, by_ref });

            if self.eat(&Token::Comma) {
                continue;
            }
            break;
        }

        self.expect(Token::RParen);
        Some(params)
    }

    /// `CALL name` or `CALL name(args)`
    pub(crate) fn parse_call_stmt(&mut self) -> Option<Stmt> {
        self.advance();
        let callee = self.expect_ident("a procedure name after CALL")?;

        let args = if self.eat(&Token::LParen) {
            self.parse_expr_list(Token::RParen)?
        } else {
            Vec::new()
        };

        Some(Stmt::Call { callee, args })
    }

    /// `RETURN [expr]`
    pub(crate) fn parse_return(&mut self) -> Option<Stmt> {
        self.advance();

        if RETURN_FOLLOWERS.contains(self.current()) {
            return Some(Stmt::Return(None));
        }

        let value = self.parse_expr()?;
        Some(Stmt::Return(Some(value)))
    }
}
