//! Frontend: lexer, grammar-driven parser and AST for Pascal-S.
//!
//! The pipeline is lexer → backtracking parser (driven by a [`Grammar`]) →
//! concrete parse tree → AST.
//!
//! ## Language Overview
//!
//! Pascal-S with Indonesian keywords:
//!
//! ```text
//! program Hitung;
//! variabel i, total: integer;
//! mulai
//!     total := 0;
//!     untuk i := 1 ke 10 lakukan
//!         total := total + i
//! selesai.
//! ```

pub mod token;
pub mod lexer;
pub mod grammar;
pub mod parse_tree;
pub mod parser;
pub mod ast;
pub mod lower;

// Re-exports
pub use lexer::Lexer;
pub use grammar::{Grammar, Symbol};
pub use parse_tree::{NodeLabel, ParseNode};
pub use parser::Parser;
pub use ast::*;
pub use token::{Token, TokenKind};
pub use crate::utils::errors::ParseError;

use crate::utils::errors::PascalResult;

/// Tokenize source code.
pub fn tokenize(source: &str) -> PascalResult<Vec<Token>> {
    Ok(Lexer::new(source).tokenize()?)
}

/// Parse source code into a concrete parse tree with the given grammar.
pub fn parse_tree(source: &str, grammar: &Grammar, start: &str) -> PascalResult<ParseNode> {
    let tokens = tokenize(source)?;
    parser::parse(start, grammar, &tokens)
}

/// Parse source code into an AST using the built-in Pascal-S grammar.
pub fn parse(source: &str) -> PascalResult<ast::Program> {
    let grammar = Grammar::pascal_s()?;
    let tree = parse_tree(source, &grammar, "Program")?;
    Ok(lower::lower_program(&tree)?)
}
