//! Whitespace and comment skipping.

use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Skips whitespace before the next token.
    ///
    /// Newlines are counted by the cursor as they are consumed; CR and LF
    /// are both plain whitespace here.
    pub(crate) fn skip_whitespace_and_comments(&mut self) {
        while matches!(self.cursor.current_char(), ' ' | '\t' | '\r' | '\n') {
            self.cursor.advance();
        }
    }

    /// Skips to the end of the current line, for `//` comments.
    ///
    /// Stops at LF, CR, or end of input without consuming the terminator,
    /// so line counting stays with the whitespace skipper.
    pub(crate) fn skip_rest_of_line(&mut self) {
        while !self.cursor.is_at_end()
            && self.cursor.current_char() != '\n'
            && self.cursor.current_char() != '\r'
        {
            self.cursor.advance();
        }
    }
}
