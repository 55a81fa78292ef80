//! Numeric literal lexing.
//!
//! A run of digits optionally followed by a single `.` and further digits.
//! The presence of the `.` decides between integer and real.

use crate::token::Token;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes an integer or real literal.
    ///
    /// # Returns
    ///
    /// `Token::Int(i64)` for `42`, `Token::Float(f64)` for `3.14`.
    /// A `.` not followed by anything still makes the literal real
    /// (`2.` lexes as `2.0`); a second `.` is left for the next token.
    pub(crate) fn lex_number(&mut self) -> Token {
        let start = self.cursor.position();

        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        let mut is_real = false;
        if self.cursor.current_char() == '.' {
            is_real = true;
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }

        let text = self.cursor.slice_from(start);
        if is_real {
            match text.parse::<f64>() {
                Ok(value) => Token::Float(value),
                Err(e) => {
                    self.report_error(format!("invalid real literal '{}': {}", text, e));
                    Token::Float(0.0)
                },
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => Token::Int(value),
                Err(e) => {
                    self.report_error(format!("integer literal overflow: {}", e));
                    Token::Int(0)
                },
            }
        }
    }
}
