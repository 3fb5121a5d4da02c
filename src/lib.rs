//! # pascals - Pascal-S front end
//!
//! A grammar-driven front end for Pascal-S with Indonesian keywords:
//! - Hand-written lexer
//! - Backtracking parser interpreting a BNF grammar, with farthest-failure
//!   syntax errors
//! - Parse tree to AST lowering
//! - Pascal-S symbol table (`tab`/`btab`/`atab` with a display) and a
//!   semantic checker that annotates the AST
//!
//! ## Architecture
//!
//! ```text
//! Source → Lexer → Tokens → Parser(Grammar) → Parse tree → AST → Checker → Annotated AST + tables
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use pascals::prelude::*;
//!
//! let source = r#"
//!     program Hitung;
//!     variabel x: integer;
//!     mulai
//!         x := 5 + 3
//!     selesai.
//! "#;
//!
//! let compilation = pascals::compile(source, &CompilerConfig::default())?;
//! assert!(compilation.analysis.is_ok());
//! println!("{}", pascals::utils::symbol_tables(&compilation.analysis.table));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod frontend;
pub mod semantic;
pub mod utils;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::frontend::ast::*;
    pub use crate::frontend::{Grammar, Lexer, ParseNode, Parser, Symbol, Token, TokenKind};
    pub use crate::semantic::{check, Analysis, ErrorPolicy, ObjectClass, SymbolTable};
    pub use crate::utils::errors::*;
    pub use crate::utils::pretty::PrettyPrint;
    pub use crate::{compile, CompilerConfig, Compilation};
}

use anyhow::{Context, Result};
use frontend::parser::DEFAULT_MAX_DEPTH;
use frontend::{Grammar, ParseNode, Parser, Token};
use semantic::{Analysis, ErrorPolicy};
use std::fs;
use std::path::PathBuf;
use utils::errors::PascalError;

/// Parse source code into an AST with the built-in grammar.
pub fn parse(source: &str) -> Result<frontend::ast::Program> {
    Ok(frontend::parse(source)?)
}

/// Configuration for the front-end pipeline.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Nonterminal to parse; `None` uses the grammar's start symbol
    pub start_symbol: Option<String>,
    /// Limit on nested nonterminal expansions
    pub max_depth: usize,
    /// Whether checking stops at the first semantic error
    pub error_policy: ErrorPolicy,
    /// Grammar file to use instead of the built-in Pascal-S grammar
    pub grammar_path: Option<PathBuf>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            start_symbol: None,
            max_depth: DEFAULT_MAX_DEPTH,
            error_policy: ErrorPolicy::CollectAll,
            grammar_path: None,
        }
    }
}

impl CompilerConfig {
    /// Set the start symbol.
    pub fn with_start_symbol(mut self, name: impl Into<String>) -> Self {
        self.start_symbol = Some(name.into());
        self
    }

    /// Set the recursion limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the error policy.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Load the grammar from a file instead of using the built-in one.
    pub fn with_grammar_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.grammar_path = Some(path.into());
        self
    }

    /// Load the configured grammar.
    pub fn grammar(&self) -> Result<Grammar> {
        let grammar = match &self.grammar_path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read grammar file: {:?}", path))?;
                Grammar::from_bnf(&text)
                    .map_err(PascalError::from)
                    .with_context(|| format!("Invalid grammar file: {:?}", path))?
            }
            None => Grammar::pascal_s().map_err(PascalError::from)?,
        };
        Ok(grammar)
    }

    /// The start symbol to use with `grammar`.
    pub fn start_for<'g>(&'g self, grammar: &'g Grammar) -> &'g str {
        self.start_symbol
            .as_deref()
            .or_else(|| grammar.start_symbol())
            .unwrap_or("Program")
    }
}

/// Every product of a successful run through the pipeline.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// Token stream, ending with EOF
    pub tokens: Vec<Token>,
    /// Concrete parse tree
    pub tree: ParseNode,
    /// Annotated AST
    pub program: frontend::ast::Program,
    /// Symbol table and semantic errors
    pub analysis: Analysis,
}

/// Tokenize source code.
pub fn lex(source: &str) -> Result<Vec<Token>> {
    frontend::tokenize(source).context("Lexical analysis failed")
}

/// Parse a token stream with the configured grammar.
pub fn parse_tokens(tokens: &[Token], grammar: &Grammar, config: &CompilerConfig) -> Result<ParseNode> {
    let start = config.start_for(grammar);
    log::debug!("parsing {} tokens from <{}>", tokens.len(), start);
    Parser::new(grammar, tokens)
        .with_max_depth(config.max_depth)
        .parse(start)
        .context("Syntax analysis failed")
}

/// Lower a Pascal-S parse tree and check it.
pub fn analyze(tree: &ParseNode, config: &CompilerConfig) -> Result<(frontend::ast::Program, Analysis)> {
    let mut program = frontend::lower::lower_program(tree)
        .map_err(PascalError::from)
        .context("AST construction failed")?;
    let analysis = semantic::check(&mut program, config.error_policy)
        .map_err(PascalError::from)
        .context("Semantic analysis failed")?;
    Ok((program, analysis))
}

/// Full pipeline: lex, parse, lower and check.
///
/// Semantic errors collected under [`ErrorPolicy::CollectAll`] are returned
/// in the analysis; every other failure is an `Err`.
pub fn compile(source: &str, config: &CompilerConfig) -> Result<Compilation> {
    let grammar = config.grammar()?;
    let tokens = lex(source)?;
    let tree = parse_tokens(&tokens, &grammar, config)?;
    let (program, analysis) = analyze(&tree, config)?;
    log::info!(
        "checked '{}': {} symbols, {} error(s)",
        program.name,
        analysis.table.entries().len() - 1,
        analysis.errors.len()
    );
    Ok(Compilation { tokens, tree, program, analysis })
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_config_builders() {
        let config = CompilerConfig::default()
            .with_start_symbol("Expression")
            .with_max_depth(64)
            .with_error_policy(ErrorPolicy::FailFast);
        let grammar = config.grammar().unwrap();
        assert_eq!(config.start_for(&grammar), "Expression");
        assert_eq!(config.max_depth, 64);
        assert_eq!(CompilerConfig::default().start_for(&grammar), "Program");
    }

    #[test]
    fn test_compile() {
        let source = "program P; variabel x: integer; mulai x := 5 + 3 selesai.";
        let compilation = compile(source, &CompilerConfig::default()).unwrap();
        assert!(compilation.analysis.is_ok());
        assert!(compilation.tokens.last().unwrap().is_eof());
        assert!(compilation.tree.is("Program"));
    }

    #[test]
    fn test_compile_reports_phase() {
        let err = compile("program P; mulai x := selesai.", &CompilerConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Syntax analysis failed"));
        assert!(matches!(err.downcast_ref::<PascalError>(), Some(PascalError::Parse(_))));
    }

    #[test]
    fn test_missing_grammar_file() {
        let config = CompilerConfig::default().with_grammar_path("/nonexistent/grammar.bnf");
        assert!(config.grammar().is_err());
    }
}
