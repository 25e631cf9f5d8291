pub mod ast;
pub mod lexer;
pub mod parser;
pub mod printer;

pub use parser::{parse_str, ParseError, Parser};
