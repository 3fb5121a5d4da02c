//! Semantic analysis: the Pascal-S symbol table and the checker that fills
//! it while validating a program.

pub mod symbol_table;
pub mod checker;

pub use checker::{check, Analysis, ErrorPolicy, SemanticChecker};
pub use symbol_table::{
    ArrayShape, BlockEntry, ConstValue, ObjectClass, SymbolError, SymbolTable, TabEntry, MAX_LEVELS,
};
