//! Identifier and keyword lexing.

use crate::token::{keyword_from_ident, Token};
use crate::Lexer;

/// Returns true for characters that may continue an identifier.
///
/// Identifiers start with a letter and continue with letters, digits, or
/// underscores. Underscore cannot start an identifier.
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Lexer<'a> {
    /// Lexes an identifier or keyword.
    ///
    /// After reading the full spelling, checks it against the keyword
    /// table; reserved spellings become keyword tokens, everything else
    /// becomes [`Token::Ident`] carrying the spelling.
    pub(crate) fn lex_identifier(&mut self) -> Token {
        while is_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(self.token_start);

        keyword_from_ident(text).unwrap_or_else(|| Token::Ident(text.to_string()))
    }
}
