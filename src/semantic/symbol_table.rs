//! Pascal-S style symbol table.
//!
//! Three append-only arenas, each with index 0 reserved as the "none"
//! sentinel:
//!
//! * `tab`: one entry per declared identifier. Entries of one block form a
//!   singly linked list through `link`, newest first.
//! * `btab`: one entry per block (program, procedure, function); `last`
//!   points at the newest identifier of the block.
//! * `atab`: one entry per array shape.
//!
//! Name resolution walks the `display`, an array mapping each active static
//! level to its block, from the innermost level outwards. Exiting a scope
//! only clears its display slot: entries stay in the arenas so the final
//! tables can be printed after checking.

use crate::frontend::ast::{PassMode, TypeKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of static levels the display can hold (level 0 is global).
pub const MAX_LEVELS: usize = 16;

/// Index of the global block in `btab`.
pub const GLOBAL_BLOCK: usize = 1;

/// What kind of object an identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectClass {
    /// `konstanta`, `true`, `false`
    Constant,
    /// Variable or parameter
    Variable,
    /// Built-in or `tipe` declared type
    Type,
    /// `prosedur`
    Procedure,
    /// `fungsi`
    Function,
    /// The program itself
    Program,
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectClass::Constant => "constant",
            ObjectClass::Variable => "variable",
            ObjectClass::Type => "type",
            ObjectClass::Procedure => "procedure",
            ObjectClass::Function => "function",
            ObjectClass::Program => "program",
        };
        write!(f, "{}", name)
    }
}

/// An identifier table entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabEntry {
    /// Name as declared
    pub identifier: String,
    /// Previous entry of the same block (0 ends the chain)
    pub link: usize,
    /// Object class
    pub class: ObjectClass,
    /// Base type; for procedures `NoType`, for functions the return type
    pub base_type: TypeKind,
    /// `atab` index for arrays, `btab` index for procedures and functions
    pub composite_ref: usize,
    /// Parameter passing mode
    pub mode: PassMode,
    /// Static level of declaration
    pub level: usize,
    /// Storage offset, or the encoded value for constants
    pub slot: i64,
}

impl TabEntry {
    fn sentinel() -> Self {
        Self {
            identifier: String::new(),
            link: 0,
            class: ObjectClass::Constant,
            base_type: TypeKind::NoType,
            composite_ref: 0,
            mode: PassMode::Normal,
            level: 0,
            slot: 0,
        }
    }

    /// Check if this entry can be called.
    pub fn is_callable(&self) -> bool {
        matches!(self.class, ObjectClass::Procedure | ObjectClass::Function)
    }
}

/// A block table entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntry {
    /// Name of the program or subprogram owning the block
    pub name: String,
    /// Newest identifier declared in the block
    pub last: usize,
    /// Last parameter; entries after it are locals
    pub param_boundary: usize,
    /// Storage used by parameters
    pub param_frame_size: usize,
    /// Storage used by local variables
    pub local_frame_size: usize,
}

/// An array shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayShape {
    /// Type of the index
    pub index_type: TypeKind,
    /// Type of the elements
    pub element_type: TypeKind,
    /// `atab` index of the element shape when elements are arrays
    pub element_ref: usize,
    /// Lowest index
    pub low: i64,
    /// Highest index
    pub high: i64,
    /// Storage per element
    pub element_size: usize,
    /// `(high - low + 1) * element_size`, 0 for an empty range
    pub total_size: usize,
}

impl ArrayShape {
    /// Number of elements, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    /// Number of elements, or `None` if it does not fit in a `usize`.
    pub fn checked_len(&self) -> Option<usize> {
        if self.high < self.low {
            return Some(0);
        }
        usize::try_from(i128::from(self.high) - i128::from(self.low) + 1).ok()
    }

    /// `len() * element_size`, or `None` on overflow.
    pub fn checked_total_size(&self) -> Option<usize> {
        self.checked_len()?.checked_mul(self.element_size)
    }

    /// Check if the range holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if an index lies inside the range.
    pub fn contains(&self, index: i64) -> bool {
        self.low <= index && index <= self.high
    }
}

/// Literal value of a constant declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// Integer constant
    Integer(i64),
    /// Real constant
    Real(f64),
    /// Boolean constant
    Boolean(bool),
    /// Character constant
    Char(char),
    /// String constant
    Str(String),
}

/// Symbol table failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// Name already declared in the current block
    #[error("identifier '{name}' is already declared in this block")]
    DuplicateIdentifier {
        /// The duplicated name
        name: String,
        /// `tab` index of the earlier declaration
        previous: usize,
    },

    /// Array range with `low > high`; the shape was still recorded
    #[error("invalid array range {low}..{high}")]
    InvalidRange {
        /// `atab` index of the recorded shape
        index: usize,
        /// Lower bound
        low: i64,
        /// Upper bound
        high: i64,
    },

    /// Array whose storage size does not fit in a `usize`; the shape was
    /// recorded with a saturated size
    #[error("array range {low}..{high} is too large")]
    SizeOverflow {
        /// `atab` index of the recorded shape
        index: usize,
        /// Lower bound
        low: i64,
        /// Upper bound
        high: i64,
    },

    /// A block's frame grew past `usize::MAX`; the entry was still added
    #[error("storage for '{name}' does not fit in the frame of block {block}")]
    FrameOverflow {
        /// The variable or parameter
        name: String,
        /// `btab` index of the block
        block: usize,
        /// `tab` index of the new entry
        index: usize,
    },

    /// Opening one more scope would overflow the display
    #[error("procedures nested deeper than {max} levels")]
    NestingTooDeep {
        /// Display capacity
        max: usize,
    },

    /// `exit_scope` at the global level
    #[error("cannot leave the global scope")]
    ScopeUnderflow,
}

/// The symbol table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolTable {
    tab: Vec<TabEntry>,
    btab: Vec<BlockEntry>,
    atab: Vec<ArrayShape>,
    display: [usize; MAX_LEVELS],
    current_level: usize,
    /// Pool for real constants; a real constant's slot indexes it
    real_constants: Vec<f64>,
    /// Pool for string constants; a string constant's slot indexes it
    strings: Vec<String>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table with the global block active and the built-ins
    /// declared.
    pub fn new() -> Self {
        let mut display = [0; MAX_LEVELS];
        display[0] = GLOBAL_BLOCK;
        let global = BlockEntry { name: "global".to_string(), ..BlockEntry::default() };
        let mut table = Self {
            tab: vec![TabEntry::sentinel()],
            btab: vec![BlockEntry::default(), global],
            atab: vec![ArrayShape {
                index_type: TypeKind::NoType,
                element_type: TypeKind::NoType,
                element_ref: 0,
                low: 0,
                high: 0,
                element_size: 0,
                total_size: 0,
            }],
            display,
            current_level: 0,
            real_constants: Vec::new(),
            strings: Vec::new(),
        };
        table.declare_global_builtins();
        table
    }

    /// Declare the built-in types and boolean constants at level 0.
    pub fn declare_global_builtins(&mut self) {
        for (name, ty) in [
            ("integer", TypeKind::Integer),
            ("boolean", TypeKind::Boolean),
            ("char", TypeKind::Char),
            ("real", TypeKind::Real),
        ] {
            self.enter(name, ObjectClass::Type, ty, 0, PassMode::Normal, 0, 1);
        }
        self.enter("true", ObjectClass::Constant, TypeKind::Boolean, 0, PassMode::Normal, 0, 1);
        self.enter("false", ObjectClass::Constant, TypeKind::Boolean, 0, PassMode::Normal, 0, 0);
    }

    /// Append an entry to the block active at `level`. Performs no
    /// duplicate check.
    #[allow(clippy::too_many_arguments)]
    pub fn enter(
        &mut self,
        name: &str,
        class: ObjectClass,
        base_type: TypeKind,
        composite_ref: usize,
        mode: PassMode,
        level: usize,
        slot: i64,
    ) -> usize {
        let block = self.display[level];
        let index = self.tab.len();
        self.tab.push(TabEntry {
            identifier: name.to_string(),
            link: self.btab[block].last,
            class,
            base_type,
            composite_ref,
            mode,
            level,
            slot,
        });
        self.btab[block].last = index;
        log::trace!("tab[{}] = {} {} at level {}", index, class, name, level);
        index
    }

    fn check_local(&self, name: &str) -> Result<(), SymbolError> {
        match self.lookup_local(name) {
            0 => Ok(()),
            previous => Err(SymbolError::DuplicateIdentifier { name: name.to_string(), previous }),
        }
    }

    /// Storage cells needed by a value of this type.
    pub fn storage_size(&self, base_type: TypeKind, composite_ref: usize) -> usize {
        match (base_type, self.atab.get(composite_ref)) {
            (TypeKind::Array, Some(shape)) if composite_ref != 0 => shape.total_size,
            _ => 1,
        }
    }

    /// Declare a local variable in the current block.
    pub fn add_variable(&mut self, name: &str, base_type: TypeKind, composite_ref: usize) -> Result<usize, SymbolError> {
        self.check_local(name)?;
        let block = self.current_block();
        let slot = self.btab[block].local_frame_size;
        let index = self.enter(
            name,
            ObjectClass::Variable,
            base_type,
            composite_ref,
            PassMode::Normal,
            self.current_level,
            slot as i64,
        );
        let size = self.storage_size(base_type, composite_ref);
        match slot.checked_add(size) {
            Some(total) => self.btab[block].local_frame_size = total,
            None => {
                self.btab[block].local_frame_size = usize::MAX;
                return Err(SymbolError::FrameOverflow { name: name.to_string(), block, index });
            }
        }
        Ok(index)
    }

    /// Declare a formal parameter of the current block.
    pub fn add_parameter(
        &mut self,
        name: &str,
        base_type: TypeKind,
        composite_ref: usize,
        mode: PassMode,
    ) -> Result<usize, SymbolError> {
        self.check_local(name)?;
        let block = self.current_block();
        let slot = self.btab[block].param_frame_size;
        let index = self.enter(name, ObjectClass::Variable, base_type, composite_ref, mode, self.current_level, slot as i64);
        let size = match mode {
            PassMode::ByReference => 1,
            PassMode::Normal => self.storage_size(base_type, composite_ref),
        };
        let entry = &mut self.btab[block];
        entry.param_boundary = index;
        match slot.checked_add(size) {
            Some(total) => entry.param_frame_size = total,
            None => {
                entry.param_frame_size = usize::MAX;
                return Err(SymbolError::FrameOverflow { name: name.to_string(), block, index });
            }
        }
        Ok(index)
    }

    /// Declare a named constant in the current block. The slot holds the
    /// value itself, or an index into the real or string pool.
    pub fn add_constant(&mut self, name: &str, base_type: TypeKind, value: ConstValue) -> Result<usize, SymbolError> {
        self.check_local(name)?;
        let slot = match value {
            ConstValue::Integer(v) => v,
            ConstValue::Boolean(b) => i64::from(b),
            ConstValue::Char(c) => i64::from(u32::from(c)),
            ConstValue::Real(v) => {
                self.real_constants.push(v);
                (self.real_constants.len() - 1) as i64
            }
            ConstValue::Str(s) => {
                self.strings.push(s);
                (self.strings.len() - 1) as i64
            }
        };
        Ok(self.enter(name, ObjectClass::Constant, base_type, 0, PassMode::Normal, self.current_level, slot))
    }

    /// Declare a type name in the current block.
    pub fn add_type(&mut self, name: &str, base_type: TypeKind, composite_ref: usize) -> Result<usize, SymbolError> {
        self.check_local(name)?;
        Ok(self.enter(name, ObjectClass::Type, base_type, composite_ref, PassMode::Normal, self.current_level, 0))
    }

    /// Declare a procedure, function or program name in the current block.
    /// Link it to its own block later with [`SymbolTable::set_composite_ref`].
    pub fn add_routine(&mut self, name: &str, class: ObjectClass, return_type: TypeKind) -> Result<usize, SymbolError> {
        self.check_local(name)?;
        Ok(self.enter(name, class, return_type, 0, PassMode::Normal, self.current_level, 0))
    }

    /// Point an entry at its array shape or block.
    pub fn set_composite_ref(&mut self, index: usize, composite_ref: usize) {
        if index == 0 {
            return;
        }
        if let Some(entry) = self.tab.get_mut(index) {
            entry.composite_ref = composite_ref;
        }
    }

    /// Record an array shape. The shape is recorded even when the range is
    /// empty or too large; the error then carries its index.
    pub fn add_array_shape(
        &mut self,
        index_type: TypeKind,
        element_type: TypeKind,
        element_ref: usize,
        low: i64,
        high: i64,
    ) -> Result<usize, SymbolError> {
        let element_size = self.storage_size(element_type, element_ref);
        let mut shape = ArrayShape {
            index_type,
            element_type,
            element_ref,
            low,
            high,
            element_size,
            total_size: 0,
        };
        let total_size = shape.checked_total_size();
        shape.total_size = total_size.unwrap_or(usize::MAX);
        let index = self.atab.len();
        self.atab.push(shape);
        if low > high {
            return Err(SymbolError::InvalidRange { index, low, high });
        }
        if total_size.is_none() {
            return Err(SymbolError::SizeOverflow { index, low, high });
        }
        Ok(index)
    }

    /// Open a new block one level deeper and make it active.
    pub fn enter_scope(&mut self, name: &str) -> Result<usize, SymbolError> {
        if self.current_level + 1 >= MAX_LEVELS {
            return Err(SymbolError::NestingTooDeep { max: MAX_LEVELS - 1 });
        }
        let block = self.btab.len();
        self.btab.push(BlockEntry { name: name.to_string(), ..BlockEntry::default() });
        self.current_level += 1;
        self.display[self.current_level] = block;
        log::trace!("enter scope '{}' (btab[{}], level {})", name, block, self.current_level);
        Ok(block)
    }

    /// Deactivate the innermost block. Its entries stay in the tables.
    pub fn exit_scope(&mut self) -> Result<(), SymbolError> {
        if self.current_level == 0 {
            return Err(SymbolError::ScopeUnderflow);
        }
        self.display[self.current_level] = 0;
        self.current_level -= 1;
        Ok(())
    }

    fn lookup_in_block(&self, block: usize, name: &str) -> usize {
        let mut index = self.btab.get(block).map_or(0, |b| b.last);
        while index != 0 {
            let entry = &self.tab[index];
            if entry.identifier.eq_ignore_ascii_case(name) {
                return index;
            }
            index = entry.link;
        }
        0
    }

    /// Resolve a name, innermost scope first. Returns 0 if not found.
    pub fn lookup(&self, name: &str) -> usize {
        (0..=self.current_level)
            .rev()
            .map(|level| self.lookup_in_block(self.display[level], name))
            .find(|&index| index != 0)
            .unwrap_or(0)
    }

    /// Resolve a name in the current block only. Returns 0 if not found.
    pub fn lookup_local(&self, name: &str) -> usize {
        self.lookup_in_block(self.current_block(), name)
    }

    /// Parameters of a block, in declaration order.
    pub fn parameters(&self, block: usize) -> Vec<usize> {
        let mut params = Vec::new();
        let mut index = self.btab.get(block).map_or(0, |b| b.param_boundary);
        while index != 0 {
            params.push(index);
            index = self.tab[index].link;
        }
        params.reverse();
        params
    }

    /// Decode the value of an integer-like constant entry.
    pub fn ordinal_value(&self, index: usize) -> Option<i64> {
        let entry = self.entry(index)?;
        match (entry.class, entry.base_type) {
            (ObjectClass::Constant, TypeKind::Integer | TypeKind::Char | TypeKind::Boolean) => Some(entry.slot),
            _ => None,
        }
    }

    /// Decode the value of a constant entry.
    pub fn constant_value(&self, index: usize) -> Option<ConstValue> {
        let entry = self.entry(index)?;
        if entry.class != ObjectClass::Constant {
            return None;
        }
        match entry.base_type {
            TypeKind::Integer => Some(ConstValue::Integer(entry.slot)),
            TypeKind::Boolean => Some(ConstValue::Boolean(entry.slot != 0)),
            TypeKind::Char => u32::try_from(entry.slot).ok().and_then(char::from_u32).map(ConstValue::Char),
            TypeKind::Real => usize::try_from(entry.slot)
                .ok()
                .and_then(|i| self.real_constants.get(i))
                .map(|&v| ConstValue::Real(v)),
            TypeKind::String => usize::try_from(entry.slot)
                .ok()
                .and_then(|i| self.strings.get(i))
                .map(|s| ConstValue::Str(s.clone())),
            TypeKind::NoType | TypeKind::Array => None,
        }
    }

    /// Entry by `tab` index; `None` for the sentinel and out-of-range indices.
    pub fn entry(&self, index: usize) -> Option<&TabEntry> {
        if index == 0 {
            None
        } else {
            self.tab.get(index)
        }
    }

    /// Block by `btab` index; `None` for the sentinel.
    pub fn block(&self, index: usize) -> Option<&BlockEntry> {
        if index == 0 {
            None
        } else {
            self.btab.get(index)
        }
    }

    /// Array shape by `atab` index; `None` for the sentinel.
    pub fn array(&self, index: usize) -> Option<&ArrayShape> {
        if index == 0 {
            None
        } else {
            self.atab.get(index)
        }
    }

    /// All identifier entries, including the sentinel at index 0.
    pub fn entries(&self) -> &[TabEntry] {
        &self.tab
    }

    /// All block entries, including the sentinel at index 0.
    pub fn blocks(&self) -> &[BlockEntry] {
        &self.btab
    }

    /// All array shapes, including the sentinel at index 0.
    pub fn arrays(&self) -> &[ArrayShape] {
        &self.atab
    }

    /// The real-constant pool.
    pub fn real_constants(&self) -> &[f64] {
        &self.real_constants
    }

    /// The string-constant pool.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Static level of the innermost active block.
    pub fn current_level(&self) -> usize {
        self.current_level
    }

    /// `btab` index of the innermost active block.
    pub fn current_block(&self) -> usize {
        self.display[self.current_level]
    }

    /// The active display slots, level 0 first.
    pub fn display(&self) -> &[usize] {
        &self.display[..=self.current_level]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_global() {
        let table = SymbolTable::new();
        let integer = table.lookup("integer");
        assert_ne!(integer, 0);
        let entry = table.entry(integer).unwrap();
        assert_eq!(entry.class, ObjectClass::Type);
        assert_eq!(entry.base_type, TypeKind::Integer);
        assert_eq!(entry.level, 0);

        let truth = table.entry(table.lookup("TRUE")).unwrap();
        assert_eq!(truth.class, ObjectClass::Constant);
        assert_eq!(truth.slot, 1);
        assert_eq!(table.lookup("tidak_ada"), 0);
    }

    #[test]
    fn test_shadowing_and_scope_exit() {
        let mut table = SymbolTable::new();
        let outer = table.add_variable("x", TypeKind::Integer, 0).unwrap();
        table.enter_scope("p").unwrap();
        let inner = table.add_variable("x", TypeKind::Real, 0).unwrap();

        assert_eq!(table.lookup("x"), inner);
        assert_eq!(table.entry(table.lookup("x")).unwrap().base_type, TypeKind::Real);
        assert_eq!(table.entry(inner).unwrap().level, 1);

        table.exit_scope().unwrap();
        assert_eq!(table.lookup("x"), outer);
        assert_eq!(table.entry(table.lookup("x")).unwrap().base_type, TypeKind::Integer);
        // the inner entry is kept for printing
        assert_eq!(table.entries()[inner].identifier, "x");
    }

    #[test]
    fn test_duplicates_are_block_local() {
        let mut table = SymbolTable::new();
        let first = table.add_variable("x", TypeKind::Integer, 0).unwrap();
        let err = table.add_variable("X", TypeKind::Real, 0).unwrap_err();
        assert_eq!(err, SymbolError::DuplicateIdentifier { name: "X".to_string(), previous: first });

        table.enter_scope("p").unwrap();
        assert!(table.add_variable("x", TypeKind::Real, 0).is_ok());
        assert!(table.add_constant("x", TypeKind::Integer, ConstValue::Integer(1)).is_err());
    }

    #[test]
    fn test_lookup_local_ignores_outer_scopes() {
        let mut table = SymbolTable::new();
        table.add_variable("g", TypeKind::Integer, 0).unwrap();
        table.enter_scope("p").unwrap();
        assert_eq!(table.lookup_local("g"), 0);
        assert_ne!(table.lookup("g"), 0);
    }

    #[test]
    fn test_variable_slots_follow_frame_size() {
        let mut table = SymbolTable::new();
        let shape = table.add_array_shape(TypeKind::Integer, TypeKind::Integer, 0, 1, 10).unwrap();
        let a = table.add_variable("a", TypeKind::Integer, 0).unwrap();
        let v = table.add_variable("v", TypeKind::Array, shape).unwrap();
        let b = table.add_variable("b", TypeKind::Real, 0).unwrap();
        assert_eq!(table.entry(a).unwrap().slot, 0);
        assert_eq!(table.entry(v).unwrap().slot, 1);
        assert_eq!(table.entry(b).unwrap().slot, 11);
        assert_eq!(table.block(GLOBAL_BLOCK).unwrap().local_frame_size, 12);
    }

    #[test]
    fn test_array_shapes() {
        let mut table = SymbolTable::new();
        let flat = table.add_array_shape(TypeKind::Integer, TypeKind::Integer, 0, 1, 10).unwrap();
        assert_eq!(table.array(flat).unwrap().total_size, 10);

        let inner = table.add_array_shape(TypeKind::Integer, TypeKind::Integer, 0, 1, 5).unwrap();
        let outer = table.add_array_shape(TypeKind::Integer, TypeKind::Array, inner, 1, 3).unwrap();
        let shape = table.array(outer).unwrap();
        assert_eq!(shape.element_size, 5);
        assert_eq!(shape.total_size, 15);
    }

    #[test]
    fn test_invalid_range_still_records_shape() {
        let mut table = SymbolTable::new();
        let err = table.add_array_shape(TypeKind::Integer, TypeKind::Real, 0, 10, 1).unwrap_err();
        let SymbolError::InvalidRange { index, low, high } = err else { panic!("wrong error") };
        assert_eq!((low, high), (10, 1));
        assert_eq!(table.array(index).unwrap().total_size, 0);
    }

    #[test]
    fn test_full_i64_range_length() {
        let mut table = SymbolTable::new();
        let index = table.add_array_shape(TypeKind::Integer, TypeKind::Integer, 0, 0, i64::MAX).unwrap();
        let shape = table.array(index).unwrap();
        assert_eq!(shape.len() as u64, 1u64 << 63);
        assert_eq!(shape.total_size as u64, 1u64 << 63);

        let err = table.add_array_shape(TypeKind::Integer, TypeKind::Integer, 0, i64::MIN, i64::MAX).unwrap_err();
        let SymbolError::SizeOverflow { index, .. } = err else { panic!("wrong error") };
        assert_eq!(table.array(index).unwrap().total_size, usize::MAX);
    }

    #[test]
    fn test_nested_array_size_overflow() {
        let mut table = SymbolTable::new();
        let inner = table.add_array_shape(TypeKind::Integer, TypeKind::Integer, 0, 1, 1 << 32).unwrap();
        let err = table.add_array_shape(TypeKind::Integer, TypeKind::Array, inner, 1, 1 << 32).unwrap_err();
        assert!(matches!(err, SymbolError::SizeOverflow { low: 1, .. }));
    }

    #[test]
    fn test_frame_overflow_keeps_entry() {
        let mut table = SymbolTable::new();
        let big = match table.add_array_shape(TypeKind::Integer, TypeKind::Integer, 0, i64::MIN, i64::MAX) {
            Err(SymbolError::SizeOverflow { index, .. }) => index,
            other => panic!("unexpected {:?}", other),
        };
        table.add_variable("a", TypeKind::Array, big).unwrap();
        let err = table.add_variable("b", TypeKind::Array, big).unwrap_err();
        let SymbolError::FrameOverflow { index, block, .. } = err else { panic!("wrong error") };
        assert_eq!(table.lookup("b"), index);
        assert_eq!(table.block(block).unwrap().local_frame_size, usize::MAX);
    }

    #[test]
    fn test_parameters_in_declaration_order() {
        let mut table = SymbolTable::new();
        let proc_index = table.add_routine("tukar", ObjectClass::Procedure, TypeKind::NoType).unwrap();
        let block = table.enter_scope("tukar").unwrap();
        table.set_composite_ref(proc_index, block);
        let a = table.add_parameter("a", TypeKind::Integer, 0, PassMode::ByReference).unwrap();
        let b = table.add_parameter("b", TypeKind::Real, 0, PassMode::Normal).unwrap();
        table.add_variable("t", TypeKind::Integer, 0).unwrap();

        assert_eq!(table.parameters(block), vec![a, b]);
        assert_eq!(table.block(block).unwrap().param_boundary, b);
        assert_eq!(table.block(block).unwrap().param_frame_size, 2);
        assert_eq!(table.entry(proc_index).unwrap().composite_ref, block);
    }

    #[test]
    fn test_constant_values() {
        let mut table = SymbolTable::new();
        let n = table.add_constant("n", TypeKind::Integer, ConstValue::Integer(-4)).unwrap();
        let pi = table.add_constant("pi", TypeKind::Real, ConstValue::Real(3.14)).unwrap();
        let c = table.add_constant("c", TypeKind::Char, ConstValue::Char('A')).unwrap();
        let s = table.add_constant("s", TypeKind::String, ConstValue::Str("halo".to_string())).unwrap();

        assert_eq!(table.constant_value(n), Some(ConstValue::Integer(-4)));
        assert_eq!(table.constant_value(pi), Some(ConstValue::Real(3.14)));
        assert_eq!(table.ordinal_value(c), Some(65));
        assert_eq!(table.constant_value(s), Some(ConstValue::Str("halo".to_string())));
        assert_eq!(table.ordinal_value(pi), None);
    }

    #[test]
    fn test_scope_limits() {
        let mut table = SymbolTable::new();
        assert_eq!(table.exit_scope(), Err(SymbolError::ScopeUnderflow));
        for depth in 1..MAX_LEVELS {
            table.enter_scope(&format!("p{}", depth)).unwrap();
        }
        assert_eq!(table.current_level(), MAX_LEVELS - 1);
        assert!(matches!(table.enter_scope("deep"), Err(SymbolError::NestingTooDeep { .. })));
        assert_eq!(table.display().len(), MAX_LEVELS);
    }
}
