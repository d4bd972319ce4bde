pub mod command;
mod error;
pub mod graph;
pub mod matcher;
pub mod resolver;
pub mod scheme_lexer;
pub mod scheme_parser;
pub mod segment;
pub mod tokenizer;
pub mod value;

pub use error::*;
