/*!
# Rust Language Module

This Rust module provides lexical analysis and parsing of the register language.
Source text flows through [`lex`], [`parse`] and [`build`] to become an [`ast::Ast`].

*/

pub type LineNumber = Option<usize>;
pub type Column = std::ops::Range<usize>;

#[macro_use]
mod error;
mod lex;
mod parse;

pub mod ast;
pub mod token;

pub use ast::build;
pub use error::Error;
pub use error::ErrorCode;
pub use error::Stage;
pub use lex::lex;
pub use lex::Lexed;
pub use parse::parse;
