//! Multi-character operator lexing.

use crate::token::Token;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes `<`, `<-`, `<=`, or `<>`.
    ///
    /// `<` is the only character that starts three different two-character
    /// operators; one character of lookahead decides between them.
    pub(crate) fn lex_less(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('-') {
            Token::Assign
        } else if self.cursor.match_char('=') {
            Token::Le
        } else if self.cursor.match_char('>') {
            Token::Ne
        } else {
            Token::Lt
        }
    }

    /// Lexes `>` or `>=`.
    pub(crate) fn lex_greater(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::Ge
        } else {
            Token::Gt
        }
    }

    /// Lexes `/` or a `//` line comment.
    ///
    /// On a comment the rest of the line is skipped and the lexer continues
    /// with the next real token.
    pub(crate) fn lex_slash(&mut self) -> Token {
        self.cursor.advance();

        if self.cursor.match_char('/') {
            self.skip_rest_of_line();
            return self.next_token();
        }

        Token::Slash
    }
}
