//! Abstract Syntax Tree (AST) for Pascal-S.
//!
//! The AST is built from the parse tree by [`crate::frontend::lower`] and
//! then annotated in place by the semantic checker: expressions receive their
//! inferred [`ExprType`], and every node that names something receives the
//! `tab` index of the entry it resolved to (0 while unresolved).

use crate::utils::location::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Program name from the header
    pub name: String,
    /// Top-level block
    pub block: Block,
    /// `tab` index of the program entry
    pub symbol: usize,
    /// Source span
    pub span: Span,
}

/// Declarations followed by a compound statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Constant, type, variable and subprogram declarations, in source order
    pub declarations: Vec<Decl>,
    /// Statements between `mulai` and `selesai`
    pub statements: Vec<Stmt>,
    /// `btab` index of the block's scope
    pub block_index: usize,
    /// Source span
    pub span: Span,
}

impl Block {
    /// Create a block with no annotations yet.
    pub fn new(declarations: Vec<Decl>, statements: Vec<Stmt>, span: Span) -> Self {
        Self { declarations, statements, block_index: 0, span }
    }
}

/// A declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decl {
    /// The kind of declaration
    pub kind: DeclKind,
    /// `tab` index of the declared entry
    pub symbol: usize,
    /// Source span
    pub span: Span,
}

impl Decl {
    /// Create an unresolved declaration.
    pub fn new(kind: DeclKind, span: Span) -> Self {
        Self { kind, symbol: 0, span }
    }

    /// The declared name.
    pub fn name(&self) -> &str {
        match &self.kind {
            DeclKind::Const { name, .. }
            | DeclKind::Type { name, .. }
            | DeclKind::Var { name, .. }
            | DeclKind::Procedure { name, .. }
            | DeclKind::Function { name, .. } => name,
        }
    }
}

/// The kind of a declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeclKind {
    /// `konstanta name = value;`
    Const { name: String, value: Expr },
    /// `tipe name = type;`
    Type { name: String, ty: TypeExpr },
    /// One name of `variabel a, b: type;`
    Var { name: String, ty: TypeExpr },
    /// `prosedur name(params); block`
    Procedure { name: String, params: Vec<Param>, block: Block },
    /// `fungsi name(params): type; block`
    Function { name: String, params: Vec<Param>, return_type: TypeExpr, block: Block },
}

/// A formal parameter (one per name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub ty: TypeExpr,
    /// Value or `variabel` (by reference)
    pub mode: PassMode,
    /// `tab` index of the parameter entry
    pub symbol: usize,
    /// Source span
    pub span: Span,
}

/// Parameter passing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PassMode {
    /// Passed by value
    #[default]
    Normal,
    /// Passed by reference (`variabel` parameter)
    ByReference,
}

impl fmt::Display for PassMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassMode::Normal => write!(f, "normal"),
            PassMode::ByReference => write!(f, "ref"),
        }
    }
}

/// A type as written in the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeExpr {
    /// The kind of type expression
    pub kind: TypeExprKind,
    /// Source span
    pub span: Span,
}

/// The kind of a type expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeExprKind {
    /// `integer`, `real`, `boolean` or `char`
    Simple(TypeKind),
    /// A user-declared type name
    Named(String),
    /// `larik [low..high] dari element`
    Array { low: Expr, high: Expr, element: Box<TypeExpr> },
    /// `rekaman fields selesai`
    Record(Vec<Field>),
}

/// A record field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Field type
    pub ty: TypeExpr,
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeExprKind::Simple(kind) => write!(f, "{}", kind),
            TypeExprKind::Named(name) => write!(f, "{}", name),
            TypeExprKind::Array { low, high, element } => {
                write!(f, "larik [{}..{}] dari {}", low, high, element)
            }
            TypeExprKind::Record(fields) => write!(f, "rekaman ({} fields)", fields.len()),
        }
    }
}

/// Base type of a symbol table entry or an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TypeKind {
    /// Unknown or erroneous; never causes further errors
    #[default]
    NoType,
    /// `integer`
    Integer,
    /// `boolean`
    Boolean,
    /// `char`
    Char,
    /// `real`
    Real,
    /// `larik`; the shape lives in `atab`
    Array,
    /// String literal
    String,
}

impl TypeKind {
    /// Map a built-in type keyword to its kind.
    pub fn from_keyword(word: &str) -> Option<TypeKind> {
        match word {
            "integer" => Some(TypeKind::Integer),
            "real" => Some(TypeKind::Real),
            "boolean" => Some(TypeKind::Boolean),
            "char" => Some(TypeKind::Char),
            _ => None,
        }
    }

    /// Check if this is `integer` or `real`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeKind::Integer | TypeKind::Real)
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeKind::NoType => "notype",
            TypeKind::Integer => "integer",
            TypeKind::Boolean => "boolean",
            TypeKind::Char => "char",
            TypeKind::Real => "real",
            TypeKind::Array => "array",
            TypeKind::String => "string",
        };
        write!(f, "{}", name)
    }
}

/// Inferred type of an expression: a base type plus, for arrays, the
/// `atab` index of the shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExprType {
    /// Base type
    pub kind: TypeKind,
    /// `atab` index for arrays, else 0
    pub composite_ref: usize,
}

impl ExprType {
    /// A non-array type.
    pub fn scalar(kind: TypeKind) -> Self {
        Self { kind, composite_ref: 0 }
    }

    /// An array type with the given shape.
    pub fn array(composite_ref: usize) -> Self {
        Self { kind: TypeKind::Array, composite_ref }
    }

    /// The error type.
    pub fn none() -> Self {
        Self::default()
    }

    /// Check if this is the error type.
    pub fn is_none(&self) -> bool {
        self.kind == TypeKind::NoType
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TypeKind::Array => write!(f, "array#{}", self.composite_ref),
            kind => write!(f, "{}", kind),
        }
    }
}

/// A statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stmt {
    /// The kind of statement
    pub kind: StmtKind,
    /// Source span
    pub span: Span,
}

impl Stmt {
    /// Create a statement.
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Create an empty statement.
    pub fn empty() -> Self {
        Self::new(StmtKind::Empty, Span::dummy())
    }
}

/// The kind of a statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StmtKind {
    /// `target := value`; target is a variable, indexed or field expression
    Assign { target: Expr, value: Expr },

    /// `name(args)` or bare `name`
    Call { name: String, args: Vec<Expr>, symbol: usize },

    /// `mulai ... selesai`
    Compound(Vec<Stmt>),

    /// `jika cond maka stmt [selain-itu stmt]`
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `selama cond lakukan stmt`
    While { condition: Expr, body: Box<Stmt> },

    /// `ulangi stmts sampai cond`
    Repeat { body: Vec<Stmt>, condition: Expr },

    /// `untuk var := start ke|turun-ke end lakukan stmt`
    For {
        variable: String,
        start: Expr,
        direction: ForDirection,
        end: Expr,
        body: Box<Stmt>,
        symbol: usize,
    },

    /// `kasus selector dari label: stmt; ... selesai`
    Case { selector: Expr, arms: Vec<CaseArm> },

    /// Nothing between separators
    Empty,
}

/// Counting direction of a `untuk` loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForDirection {
    /// `ke`
    Up,
    /// `turun-ke`
    Down,
}

impl fmt::Display for ForDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForDirection::Up => write!(f, "ke"),
            ForDirection::Down => write!(f, "turun-ke"),
        }
    }
}

/// One `label: statement` arm of a `kasus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseArm {
    /// Constant label
    pub label: Expr,
    /// Statement executed for the label
    pub body: Stmt,
}

/// An expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    /// The kind of expression
    pub kind: ExprKind,
    /// Inferred type (filled in during semantic analysis)
    pub ty: ExprType,
    /// `tab` index of the referenced entry for names and calls
    pub symbol: usize,
    /// Source span
    pub span: Span,
}

impl Expr {
    /// Create a new expression with unknown type.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, ty: ExprType::none(), symbol: 0, span }
    }

    /// Create an integer literal.
    pub fn int_lit(value: i64, span: Span) -> Self {
        Self::new(ExprKind::Integer(value), span)
    }

    /// Create a variable reference.
    pub fn var(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Variable(name.into()), span)
    }

    /// Check if this is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Integer(_)
                | ExprKind::Real(_)
                | ExprKind::Char(_)
                | ExprKind::Str(_)
                | ExprKind::Boolean(_)
        )
    }

    /// The name this expression ultimately designates, for variables,
    /// indexed variables and field accesses.
    pub fn root_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Variable(name) => Some(name),
            ExprKind::Index { base, .. } | ExprKind::Field { base, .. } => base.root_name(),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Integer(v) => write!(f, "{}", v),
            ExprKind::Real(v) => write!(f, "{:?}", v),
            ExprKind::Char(c) => write!(f, "'{}'", c),
            ExprKind::Str(s) => write!(f, "'{}'", s.replace('\'', "''")),
            ExprKind::Boolean(b) => write!(f, "{}", b),
            ExprKind::Variable(name) => write!(f, "{}", name),
            ExprKind::Index { base, index } => write!(f, "{}[{}]", base, index),
            ExprKind::Field { base, field } => write!(f, "{}.{}", base, field),
            ExprKind::Call { name, args } => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{}({})", name, args.join(", "))
            }
            ExprKind::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
            ExprKind::Unary { op: UnaryOp::Not, operand } => write!(f, "tidak {}", operand),
            ExprKind::Unary { op, operand } => write!(f, "{}{}", op, operand),
        }
    }
}

/// The kind of an expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    /// Integer literal
    Integer(i64),
    /// Real literal
    Real(f64),
    /// Character literal
    Char(char),
    /// String literal
    Str(String),
    /// `true` / `false`
    Boolean(bool),

    /// Name of a variable, constant, parameter or parameterless function
    Variable(String),

    /// `base[index]`
    Index { base: Box<Expr>, index: Box<Expr> },

    /// `base.field`
    Field { base: Box<Expr>, field: String },

    /// Function call with arguments: `name(args)`
    Call { name: String, args: Vec<Expr> },

    /// Binary operation: `left op right`
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation: `op operand`
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    /// `/`, always real-valued
    RealDiv,
    /// `bagi`
    IntDiv,
    Mod,

    // Relational
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,
}

impl BinaryOp {
    /// Map an operator lexeme to its operator.
    pub fn from_lexeme(lexeme: &str) -> Option<BinaryOp> {
        let op = match lexeme {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::RealDiv,
            "bagi" => BinaryOp::IntDiv,
            "mod" => BinaryOp::Mod,
            "=" => BinaryOp::Eq,
            "<>" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "dan" => BinaryOp::And,
            "atau" => BinaryOp::Or,
            _ => return None,
        };
        Some(op)
    }

    /// Check if this is a relational operator.
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Check if this is `dan` or `atau`.
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Check if this operator only accepts integer operands.
    pub fn is_integer_only(&self) -> bool {
        matches!(self, BinaryOp::IntDiv | BinaryOp::Mod)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::RealDiv => "/",
            BinaryOp::IntDiv => "bagi",
            BinaryOp::Mod => "mod",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "dan",
            BinaryOp::Or => "atau",
        };
        write!(f, "{}", text)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Negation: `-x`
    Neg,
    /// Identity: `+x`
    Plus,
    /// Logical not: `tidak x`
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Plus => write!(f, "+"),
            UnaryOp::Not => write!(f, "tidak"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::new(
            ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) },
            Span::dummy(),
        )
    }

    #[test]
    fn test_operator_lexemes() {
        for lexeme in ["+", "-", "*", "/", "bagi", "mod", "=", "<>", "<", "<=", ">", ">=", "dan", "atau"] {
            let op = BinaryOp::from_lexeme(lexeme).unwrap();
            assert_eq!(op.to_string(), lexeme);
        }
        assert_eq!(BinaryOp::from_lexeme("tidak"), None);
        assert!(BinaryOp::IntDiv.is_integer_only());
        assert!(!BinaryOp::RealDiv.is_integer_only());
        assert!(BinaryOp::Ne.is_relational());
        assert!(BinaryOp::Or.is_logical());
    }

    #[test]
    fn test_type_display() {
        assert_eq!(TypeKind::Integer.to_string(), "integer");
        assert_eq!(TypeKind::NoType.to_string(), "notype");
        assert_eq!(ExprType::array(3).to_string(), "array#3");
        assert_eq!(TypeKind::from_keyword("char"), Some(TypeKind::Char));
        assert_eq!(TypeKind::from_keyword("larik"), None);
    }

    #[test]
    fn test_expr_display() {
        let sum = bin(BinaryOp::Add, Expr::var("x", Span::dummy()), Expr::int_lit(3, Span::dummy()));
        let cmp = bin(BinaryOp::Le, sum, Expr::new(ExprKind::Real(2.5), Span::dummy()));
        assert_eq!(cmp.to_string(), "((x + 3) <= 2.5)");
    }

    #[test]
    fn test_root_name() {
        let indexed = Expr::new(
            ExprKind::Index {
                base: Box::new(Expr::var("a", Span::dummy())),
                index: Box::new(Expr::int_lit(1, Span::dummy())),
            },
            Span::dummy(),
        );
        assert_eq!(indexed.root_name(), Some("a"));
        assert_eq!(Expr::int_lit(1, Span::dummy()).root_name(), None);
    }
}
