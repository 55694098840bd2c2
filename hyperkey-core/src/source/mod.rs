//! Reading and writing the rules source file.
//!
//! A regex only finds the `createHyperSubLayers(` call; the argument itself goes through a small
//! tokenizer and object-literal parser, and helper calls are interpreted as plain data.

pub mod extract;
pub mod generate;
pub mod lexer;
pub mod parser;

pub use extract::{parse_source, try_parse_source};
pub use generate::generate_source;
