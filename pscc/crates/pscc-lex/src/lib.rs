//! pscc-lex - Lexical analysis for exam-style pseudocode.
//!
//! The lexer turns a character stream into a stream of [`Token`]s, one at a
//! time, on demand. The surface it recognizes:
//!
//! - uppercase keywords (`DECLARE`, `IF`, `ENDWHILE`, ...), case-sensitive
//! - identifiers matching `[A-Za-z][A-Za-z0-9_]*`
//! - integer and real literals (`42`, `3.14`; a `.` makes it real)
//! - multi-character operators `<-`, `<>`, `<=`, `>=` (and bare `<`, `>`,
//!   `=` which is always equality - assignment is `<-`)
//! - single-character punctuation `+ - * / ( ) [ ] , :`
//! - `//` line comments, skipped entirely
//!
//! Each token implicitly carries the line it started on; the parser reads
//! it from [`Lexer::token_line`] right after fetching the token. Repeated
//! calls at end of input keep returning [`Token::Eof`].
//!
//! ```
//! use pscc_lex::{Lexer, Token};
//! use pscc_util::Handler;
//!
//! let handler = Handler::new();
//! let mut lexer = Lexer::new("x <- 21 * 2", &handler);
//!
//! assert_eq!(lexer.next_token(), Token::Ident("x".into()));
//! assert_eq!(lexer.next_token(), Token::Assign);
//! assert_eq!(lexer.next_token(), Token::Int(21));
//! assert_eq!(lexer.next_token(), Token::Star);
//! assert_eq!(lexer.next_token(), Token::Int(2));
//! assert_eq!(lexer.next_token(), Token::Eof);
//! assert_eq!(lexer.next_token(), Token::Eof);
//! ```

pub mod cursor;
mod lexer;
mod token;

pub use lexer::Lexer;
pub use token::{keyword_from_ident, Token};
