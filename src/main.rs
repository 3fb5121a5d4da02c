//! pascals command line interface
//!
//! Usage:
//!   pascals [OPTIONS] <input-file>
//!   pascals --help
//!
//! Examples:
//!   pascals hitung.pas                      # Check and print everything
//!   pascals --emit=tokens hitung.pas        # Just the token stream
//!   pascals --emit=symbols hitung.pas       # tab / btab / atab
//!   pascals --grammar=expr.bnf --emit=tree input.txt

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use pascals::frontend::{ast::Program, ParseNode, Token};
use pascals::semantic::{ErrorPolicy, SymbolTable};
use pascals::utils::errors::{Diagnostic, PascalError};
use pascals::utils::location::SourceMap;
use pascals::utils::pretty::{ast_tree, render_diagnostic, symbol_tables, PrettyPrint};
use pascals::CompilerConfig;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Pascal-S front end: parse and check Indonesian Pascal-S programs
#[derive(Parser, Debug)]
#[command(name = "pascals")]
#[command(version)]
#[command(about = "Grammar-driven parser and semantic checker for Pascal-S", long_about = None)]
struct Cli {
    /// Source file to check
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// What to emit
    #[arg(long, default_value = "all")]
    emit: EmitKind,

    /// Grammar file to use instead of the built-in Pascal-S grammar
    #[arg(long, value_name = "FILE")]
    grammar: Option<PathBuf>,

    /// Nonterminal to start parsing from
    #[arg(long, value_name = "NAME")]
    start: Option<String>,

    /// Stop at the first semantic error
    #[arg(long)]
    fail_fast: bool,

    /// Limit on nested nonterminal expansions
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress warnings)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EmitKind {
    /// Token stream
    Tokens,
    /// Concrete parse tree
    Tree,
    /// Annotated abstract syntax tree
    Ast,
    /// Normalised source
    Source,
    /// Symbol tables
    Symbols,
    /// Everything, as JSON
    Json,
    /// All text renderings
    All,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    tokens: &'a [Token],
    tree: &'a ParseNode,
    program: &'a Program,
    symbols: &'a SymbolTable,
    errors: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    info!("pascals v{}", pascals::VERSION);
    debug!("Input file: {:?}", cli.input);

    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read input file: {:?}", cli.input))?;
    let source_map = SourceMap::new(source.clone());
    let file_name = cli.input.display().to_string();

    let config = build_config(&cli);
    debug!("Config: {:?}", config);

    let run = || -> Result<String> {
        let grammar = config.grammar()?;
        let tokens = pascals::lex(&source)?;
        if cli.emit == EmitKind::Tokens {
            return Ok(render_tokens(&tokens));
        }

        let tree = pascals::parse_tokens(&tokens, &grammar, &config)?;
        if cli.emit == EmitKind::Tree {
            return Ok(tree.to_string());
        }

        let (program, analysis) = pascals::analyze(&tree, &config)?;
        for error in &analysis.errors {
            eprint!("{}", render_diagnostic(&Diagnostic::from(error), &source_map, &file_name));
        }

        let output = match cli.emit {
            EmitKind::Ast => ast_tree(&program),
            EmitKind::Source => program.pretty(),
            EmitKind::Symbols => symbol_tables(&analysis.table),
            EmitKind::Json => {
                let report = JsonReport {
                    tokens: &tokens,
                    tree: &tree,
                    program: &program,
                    symbols: &analysis.table,
                    errors: analysis.errors.iter().map(ToString::to_string).collect(),
                };
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?
            }
            EmitKind::All | EmitKind::Tokens | EmitKind::Tree => format!(
                "== tokens ==\n{}\n== parse tree ==\n{}\n== ast ==\n{}\n== symbol tables ==\n{}",
                render_tokens(&tokens),
                tree,
                ast_tree(&program),
                symbol_tables(&analysis.table)
            ),
        };
        write_output(&cli.output, &output)?;

        if !analysis.is_ok() {
            bail!("{} semantic error(s) in {}", analysis.errors.len(), file_name);
        }
        Ok(String::new())
    };

    match run() {
        Ok(output) if output.is_empty() => Ok(()),
        Ok(output) => write_output(&cli.output, &output),
        Err(err) => {
            if let Some(pascal) = err.downcast_ref::<PascalError>() {
                eprint!("{}", render_diagnostic(&Diagnostic::from(pascal), &source_map, &file_name));
            }
            Err(err)
        }
    }
}

fn build_config(cli: &Cli) -> CompilerConfig {
    let mut config = CompilerConfig::default();
    if let Some(ref start) = cli.start {
        config = config.with_start_symbol(start.clone());
    }
    if let Some(depth) = cli.max_depth {
        config = config.with_max_depth(depth);
    }
    if let Some(ref path) = cli.grammar {
        config = config.with_grammar_path(path.clone());
    }
    if cli.fail_fast {
        config = config.with_error_policy(ErrorPolicy::FailFast);
    }
    config
}

fn render_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| format!("{:>4}:{:<3} {}", t.line(), t.column(), t))
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_output(path: &Option<PathBuf>, content: &str) -> Result<()> {
    match path {
        Some(p) => {
            fs::write(p, content)
                .with_context(|| format!("Failed to write output file: {:?}", p))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
