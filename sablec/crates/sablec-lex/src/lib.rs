//! sablec-lex - Lexical Analysis
//!
//! Transforms source text into a token stream. The surface language uses
//! significant indentation, so the lexer synthesizes `Indent`/`Dedent`
//! tokens from an indentation stack in addition to ordinary tokens.

mod cursor;
mod lexer;
mod token;

pub use cursor::Cursor;
pub use lexer::{tokenize, Lexer};
pub use token::Token;
