//! Lexing and parsing of textual assembly dumps.

pub mod lexer;
pub mod parser;

pub use lexer::{tokenize_line, LexError, Token, TokenKind};
pub use parser::{parse_source, Diagnostic, LineShape, ParseReport, ParsedLine, Parser};
