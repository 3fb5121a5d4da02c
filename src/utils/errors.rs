//! Error types for the Pascal-S front end.
//!
//! Every phase has its own error type carrying a span and a `kind`; all of
//! them convert into [`PascalError`] so the pipeline can use `?` throughout.

use thiserror::Error;
use crate::utils::location::Span;
use std::fmt;

/// Top-level error type for the front end.
#[derive(Error, Debug)]
pub enum PascalError {
    /// Error during lexing/tokenization
    #[error("Lexer error: {0}")]
    Lexer(#[from] LexerError),

    /// Broken or unusable grammar configuration
    #[error("Grammar error: {0}")]
    Grammar(#[from] GrammarError),

    /// Input rejected by the grammar
    #[error("Syntax error: {0}")]
    Parse(#[from] ParseError),

    /// Parse tree could not be folded into an AST
    #[error("AST error: {0}")]
    Ast(#[from] AstError),

    /// Error during semantic analysis
    #[error("Semantic error: {0}")]
    Semantic(#[from] SemanticError),

    /// Internal compiler error
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error during lexical analysis.
#[derive(Error, Debug, Clone)]
pub struct LexerError {
    /// The error message
    pub message: String,
    /// Location in source
    pub span: Span,
    /// The kind of lexer error
    pub kind: LexerErrorKind,
}

impl fmt::Display for LexerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

/// Classification of lexer failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerErrorKind {
    /// Character that starts no token
    UnexpectedChar,
    /// String or character literal without closing quote
    UnterminatedString,
    /// Block comment without closing delimiter
    UnterminatedComment,
    /// Malformed number literal
    InvalidNumber,
}

/// Fatal problems with the production table itself.
///
/// These are configuration errors, never user syntax errors: the parse is
/// aborted as soon as one is detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A production references a nonterminal with no rules
    #[error("nonterminal <{name}> is referenced but never defined")]
    UndefinedNonTerminal {
        /// Name of the missing nonterminal
        name: String,
    },

    /// The nesting of nonterminal calls exceeded the configured limit,
    /// which almost always means the grammar is left-recursive.
    #[error("recursion limit of {limit} exceeded while expanding <{nonterminal}> (left-recursive grammar?)")]
    RecursionLimit {
        /// Nonterminal being expanded when the limit was hit
        nonterminal: String,
        /// The configured limit
        limit: usize,
    },

    /// A nonterminal was defined with no alternatives
    #[error("nonterminal <{name}> has no alternatives")]
    EmptyProduction {
        /// Name of the empty nonterminal
        name: String,
    },

    /// The grammar text could not be read
    #[error("malformed grammar at line {line}: {message}")]
    Malformed {
        /// 1-based line in the grammar text
        line: usize,
        /// What went wrong
        message: String,
    },
}

/// Error during parsing.
#[derive(Error, Debug, Clone)]
pub struct ParseError {
    /// The error message
    pub message: String,
    /// Location in source
    pub span: Span,
    /// The kind of parse error
    pub kind: ParseErrorKind,
    /// Token index of the failure
    pub position: usize,
    /// Expected grammar symbols
    pub expected: Vec<String>,
    /// What was found
    pub found: Option<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Classification of syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A token did not match any expected terminal
    UnexpectedToken,
    /// Input ended while more tokens were expected
    UnexpectedEof,
    /// The start symbol matched but tokens remain
    TrailingInput,
}

/// Error while folding a parse tree into the AST.
#[derive(Error, Debug, Clone)]
pub struct AstError {
    /// The error message
    pub message: String,
    /// Nonterminal whose node had an unexpected shape
    pub nonterminal: String,
    /// Location in source
    pub span: Span,
}

impl fmt::Display for AstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in <{}> at {}", self.message, self.nonterminal, self.span)
    }
}

/// Error during semantic analysis.
#[derive(Error, Debug, Clone)]
pub struct SemanticError {
    /// The error message
    pub message: String,
    /// Location in source
    pub span: Span,
    /// The kind of semantic error
    pub kind: SemanticErrorKind,
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.span)
    }
}

/// Classification of semantic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticErrorKind {
    /// Name not found in any enclosing scope
    UndeclaredIdentifier,
    /// Name declared twice in the same block
    DuplicateIdentifier,
    /// Incompatible types in assignment, argument or case label
    TypeMismatch,
    /// `jika`/`selama`/`sampai` condition is not boolean
    ConditionNotBoolean,
    /// `untuk` start or end bound is not integer
    ForBoundsNotInteger,
    /// `bagi`/`mod` applied to a real operand
    IntegerOnlyOperator,
    /// `dan`/`atau`/`tidak` applied to a non-boolean operand
    LogicalOperandNotBoolean,
    /// Arithmetic on non-numeric operands
    InvalidOperands,
    /// Indexing something that is not an array
    NotAnArray,
    /// Array index of the wrong type
    IndexNotInteger,
    /// Constant index outside the declared range
    IndexOutOfBounds,
    /// Array range with low bound above high bound
    InvalidRange,
    /// Calling something that is not a procedure or function
    NotCallable,
    /// Using a type, procedure or program name as a value
    NotAValue,
    /// Using a non-type name as a type
    NotAType,
    /// Assigning to something that is not a variable
    NotAssignable,
    /// Wrong number of arguments in a call
    ArgumentCountMismatch,
    /// Static nesting deeper than the display allows
    NestingTooDeep,
    /// Construct the checker does not support
    Unsupported,
}

/// A diagnostic message with severity level.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level
    pub severity: DiagnosticSeverity,
    /// Message
    pub message: String,
    /// Primary span
    pub span: Option<Span>,
    /// Additional notes
    pub notes: Vec<String>,
}

/// How serious a [`Diagnostic`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    /// Compilation cannot succeed
    Error,
    /// Compilation continues
    Warning,
    /// Informational
    Note,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
            DiagnosticSeverity::Note => write!(f, "note"),
        }
    }
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            message: message.into(),
            span: None,
            notes: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            message: message.into(),
            span: None,
            notes: Vec::new(),
        }
    }

    /// Add a span to the diagnostic.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Add a note to the diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl From<&SemanticError> for Diagnostic {
    fn from(err: &SemanticError) -> Self {
        Diagnostic::error(err.message.clone())
            .with_span(err.span)
            .with_note(format!("{:?}", err.kind))
    }
}

impl From<&ParseError> for Diagnostic {
    fn from(err: &ParseError) -> Self {
        Diagnostic::error(err.message.clone()).with_span(err.span)
    }
}

impl From<&LexerError> for Diagnostic {
    fn from(err: &LexerError) -> Self {
        Diagnostic::error(err.message.clone()).with_span(err.span)
    }
}

impl From<&PascalError> for Diagnostic {
    fn from(err: &PascalError) -> Self {
        match err {
            PascalError::Lexer(e) => e.into(),
            PascalError::Parse(e) => e.into(),
            PascalError::Semantic(e) => e.into(),
            PascalError::Ast(e) => Diagnostic::error(e.to_string()).with_span(e.span),
            other => Diagnostic::error(other.to_string()),
        }
    }
}

/// Result type using PascalError.
pub type PascalResult<T> = Result<T, PascalError>;
