//! Core lexer implementation.
//!
//! This module contains the main `Lexer` struct and its dispatch loop.

use pscc_util::Handler;

use crate::cursor::Cursor;
use crate::token::Token;

/// Lexer for exam-style pseudocode.
///
/// Produces one token per [`Lexer::next_token`] call and publishes the line
/// number the current token started on. The parser is the only consumer and
/// holds a single token of lookahead.
pub struct Lexer<'a> {
    /// Character cursor for source traversal.
    pub(crate) cursor: Cursor<'a>,

    /// Error handler for reporting lexical errors.
    handler: &'a Handler,

    /// Starting position of the current token (byte offset).
    pub(crate) token_start: usize,

    /// Line number where the current token starts (1-based).
    token_line: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over the given source code.
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            token_start: 0,
            token_line: 1,
        }
    }

    /// Returns the next token from the source code.
    ///
    /// Skips whitespace and comments, then dispatches on the current
    /// character. At end of input this stably returns [`Token::Eof`].
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        self.token_start = self.cursor.position();
        self.token_line = self.cursor.line();

        if self.cursor.is_at_end() {
            return Token::Eof;
        }

        match self.cursor.current_char() {
            '(' => {
                self.cursor.advance();
                Token::LParen
            },
            ')' => {
                self.cursor.advance();
                Token::RParen
            },
            '[' => {
                self.cursor.advance();
                Token::LBracket
            },
            ']' => {
                self.cursor.advance();
                Token::RBracket
            },
            ',' => {
                self.cursor.advance();
                Token::Comma
            },
            ':' => {
                self.cursor.advance();
                Token::Colon
            },
            '+' => {
                self.cursor.advance();
                Token::Plus
            },
            '-' => {
                self.cursor.advance();
                Token::Minus
            },
            '*' => {
                self.cursor.advance();
                Token::Star
            },
            '/' => self.lex_slash(),
            '<' => self.lex_less(),
            '>' => self.lex_greater(),
            '=' => {
                self.cursor.advance();
                Token::Eq
            },
            c if c.is_ascii_alphabetic() => self.lex_identifier(),
            c if c.is_ascii_digit() => self.lex_number(),
            c => {
                self.report_error(format!("unexpected character '{}'", c));
                self.cursor.advance();
                Token::Invalid(c)
            },
        }
    }

    /// Returns the line number the most recent token started on (1-based).
    pub fn token_line(&self) -> u32 {
        self.token_line
    }

    /// Reports a lexical error at the current token position.
    pub(crate) fn report_error(&self, message: String) {
        self.handler.error_at(self.token_line, message);
    }
}
