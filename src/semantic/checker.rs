//! Semantic checking for Pascal-S.
//!
//! The checker walks the AST once, top to bottom. Declarations are entered
//! into the [`SymbolTable`] as they are met, so every use sees exactly the
//! names declared before it, and every expression node is annotated with
//! its inferred type and the `tab` index it resolved to.
//!
//! A node whose type could not be determined gets [`TypeKind::NoType`],
//! which every rule accepts silently: one mistake produces one error.

use crate::frontend::ast::*;
use crate::semantic::symbol_table::{ConstValue, ObjectClass, SymbolError, SymbolTable, GLOBAL_BLOCK};
use crate::utils::errors::{SemanticError, SemanticErrorKind};
use crate::utils::location::Span;
use log::{debug, warn};

/// Procedures the language provides without a declaration. Their argument
/// lists are checked as expressions only.
const BUILTIN_PROCEDURES: [&str; 4] = ["write", "writeln", "read", "readln"];

/// What to do after the first semantic error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Record every error and keep checking
    #[default]
    CollectAll,
    /// Stop at the first error
    FailFast,
}

/// Result of checking a program.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The populated symbol table
    pub table: SymbolTable,
    /// Errors in source order
    pub errors: Vec<SemanticError>,
}

impl Analysis {
    /// Check if the program had no semantic errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a program and annotate it in place.
///
/// Under [`ErrorPolicy::FailFast`] the first error is returned as `Err`;
/// under [`ErrorPolicy::CollectAll`] errors are returned in the analysis.
pub fn check(program: &mut Program, policy: ErrorPolicy) -> Result<Analysis, SemanticError> {
    let mut checker = SemanticChecker::new(policy);
    checker.check_program(program)?;
    Ok(checker.finish())
}

type CheckResult<T> = Result<T, SemanticError>;

/// Semantic checker state.
pub struct SemanticChecker {
    table: SymbolTable,
    errors: Vec<SemanticError>,
    policy: ErrorPolicy,
    /// `tab` indices of the functions being checked, innermost last
    functions: Vec<usize>,
}

impl Default for SemanticChecker {
    fn default() -> Self {
        Self::new(ErrorPolicy::default())
    }
}

impl SemanticChecker {
    /// Create a checker with a fresh symbol table.
    pub fn new(policy: ErrorPolicy) -> Self {
        Self { table: SymbolTable::new(), errors: Vec::new(), policy, functions: Vec::new() }
    }

    /// Symbol table built so far.
    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Errors reported so far.
    pub fn errors(&self) -> &[SemanticError] {
        &self.errors
    }

    /// Consume the checker.
    pub fn finish(self) -> Analysis {
        Analysis { table: self.table, errors: self.errors }
    }

    /// Check a whole program. The program's declarations live in the
    /// global block.
    pub fn check_program(&mut self, program: &mut Program) -> CheckResult<()> {
        debug!("checking program '{}'", program.name);
        program.symbol = match self.table.add_routine(&program.name, ObjectClass::Program, TypeKind::NoType) {
            Ok(index) => index,
            Err(err) => {
                self.symbol_error(err, program.span)?;
                0
            }
        };
        program.block.block_index = GLOBAL_BLOCK;
        self.table.set_composite_ref(program.symbol, GLOBAL_BLOCK);
        self.check_block(&mut program.block)?;
        debug!("semantic check finished with {} error(s)", self.errors.len());
        Ok(())
    }

    fn check_block(&mut self, block: &mut Block) -> CheckResult<()> {
        for decl in &mut block.declarations {
            self.check_declaration(decl)?;
        }
        for stmt in &mut block.statements {
            self.check_statement(stmt)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------

    fn check_declaration(&mut self, decl: &mut Decl) -> CheckResult<()> {
        let span = decl.span;
        match &mut decl.kind {
            DeclKind::Const { name, value } => {
                let Some((ty, constant)) = self.const_value(value)? else {
                    return Ok(());
                };
                match self.table.add_constant(name, ty, constant) {
                    Ok(index) => decl.symbol = index,
                    Err(err) => self.symbol_error(err, span)?,
                }
            }
            DeclKind::Type { name, ty } => {
                let resolved = self.resolve_type(ty)?;
                match self.table.add_type(name, resolved.kind, resolved.composite_ref) {
                    Ok(index) => decl.symbol = index,
                    Err(err) => self.symbol_error(err, span)?,
                }
            }
            DeclKind::Var { name, ty } => {
                let resolved = self.resolve_type(ty)?;
                match self.table.add_variable(name, resolved.kind, resolved.composite_ref) {
                    Ok(index) => decl.symbol = index,
                    Err(err) => {
                        if let SymbolError::FrameOverflow { index, .. } = err {
                            decl.symbol = index;
                        }
                        self.symbol_error(err, span)?
                    }
                }
            }
            DeclKind::Procedure { name, params, block } => {
                decl.symbol = self.declare_routine(name, ObjectClass::Procedure, TypeKind::NoType, span)?;
                self.check_routine(decl.symbol, name, params, block, span)?;
            }
            DeclKind::Function { name, params, return_type, block } => {
                let ret = self.resolve_type(return_type)?;
                decl.symbol = self.declare_routine(name, ObjectClass::Function, ret.kind, span)?;
                self.functions.push(decl.symbol);
                let result = self.check_routine(decl.symbol, name, params, block, span);
                self.functions.pop();
                result?;
            }
        }
        Ok(())
    }

    fn declare_routine(&mut self, name: &str, class: ObjectClass, ty: TypeKind, span: Span) -> CheckResult<usize> {
        match self.table.add_routine(name, class, ty) {
            Ok(index) => Ok(index),
            Err(err) => {
                self.symbol_error(err, span)?;
                Ok(0)
            }
        }
    }

    /// Open the routine's scope, enter its parameters, check its body.
    fn check_routine(
        &mut self,
        symbol: usize,
        name: &str,
        params: &mut [Param],
        block: &mut Block,
        span: Span,
    ) -> CheckResult<()> {
        let block_index = match self.table.enter_scope(name) {
            Ok(index) => index,
            Err(err) => return self.symbol_error(err, span),
        };
        self.table.set_composite_ref(symbol, block_index);
        block.block_index = block_index;

        for param in params.iter_mut() {
            let resolved = self.resolve_type(&mut param.ty)?;
            match self.table.add_parameter(&param.name, resolved.kind, resolved.composite_ref, param.mode) {
                Ok(index) => param.symbol = index,
                Err(err) => {
                    if let SymbolError::FrameOverflow { index, .. } = err {
                        param.symbol = index;
                    }
                    self.symbol_error(err, param.span)?
                }
            }
        }

        let result = self.check_block(block);
        if let Err(err) = self.table.exit_scope() {
            self.symbol_error(err, span)?;
        }
        result
    }

    /// Resolve a written type to a base type and `atab` reference.
    fn resolve_type(&mut self, ty: &mut TypeExpr) -> CheckResult<ExprType> {
        let span = ty.span;
        match &mut ty.kind {
            TypeExprKind::Simple(kind) => Ok(ExprType::scalar(*kind)),
            TypeExprKind::Named(name) => {
                let index = self.table.lookup(name);
                let Some(entry) = self.table.entry(index) else {
                    self.report(SemanticErrorKind::UndeclaredIdentifier, format!("undeclared type '{}'", name), span)?;
                    return Ok(ExprType::none());
                };
                if entry.class != ObjectClass::Type {
                    let message = format!("'{}' is a {}, not a type", name, entry.class);
                    self.report(SemanticErrorKind::NotAType, message, span)?;
                    return Ok(ExprType::none());
                }
                Ok(ExprType { kind: entry.base_type, composite_ref: entry.composite_ref })
            }
            TypeExprKind::Array { low, high, element } => {
                let element = self.resolve_type(element)?;
                let low = self.bound(low)?;
                let high = self.bound(high)?;
                let (Some((low_ty, low)), Some((high_ty, high))) = (low, high) else {
                    return Ok(ExprType::none());
                };
                if low_ty != high_ty {
                    let message = format!("array bounds have different types {} and {}", low_ty, high_ty);
                    self.report(SemanticErrorKind::TypeMismatch, message, span)?;
                    return Ok(ExprType::none());
                }
                match self.table.add_array_shape(low_ty, element.kind, element.composite_ref, low, high) {
                    Ok(index) => Ok(ExprType::array(index)),
                    Err(SymbolError::InvalidRange { index, low, high }) => {
                        let message = format!("invalid array range {}..{}: low bound exceeds high bound", low, high);
                        self.report(SemanticErrorKind::InvalidRange, message, span)?;
                        Ok(ExprType::array(index))
                    }
                    Err(err @ SymbolError::SizeOverflow { index, .. }) => {
                        self.symbol_error(err, span)?;
                        Ok(ExprType::array(index))
                    }
                    Err(err) => {
                        self.symbol_error(err, span)?;
                        Ok(ExprType::none())
                    }
                }
            }
            TypeExprKind::Record(fields) => {
                warn!("record type with {} field(s) at {} is not checked", fields.len(), span);
                Ok(ExprType::none())
            }
        }
    }

    /// Evaluate an array bound to its ordinal value.
    fn bound(&mut self, expr: &mut Expr) -> CheckResult<Option<(TypeKind, i64)>> {
        let ty = self.check_expr(expr)?;
        if ty.is_none() {
            return Ok(None);
        }
        match self.ordinal(expr) {
            Some(value) if matches!(ty.kind, TypeKind::Integer | TypeKind::Char | TypeKind::Boolean) => {
                Ok(Some((ty.kind, value)))
            }
            _ => {
                let message = format!("array bound '{}' must be an ordinal constant", expr);
                self.report(SemanticErrorKind::InvalidRange, message, expr.span)?;
                Ok(None)
            }
        }
    }

    /// Evaluate the right-hand side of a constant declaration.
    fn const_value(&mut self, expr: &mut Expr) -> CheckResult<Option<(TypeKind, ConstValue)>> {
        let ty = self.check_expr(expr)?;
        let value = match &expr.kind {
            ExprKind::Integer(v) => ConstValue::Integer(*v),
            ExprKind::Real(v) => ConstValue::Real(*v),
            ExprKind::Boolean(b) => ConstValue::Boolean(*b),
            ExprKind::Char(c) => ConstValue::Char(*c),
            ExprKind::Str(s) => ConstValue::Str(s.clone()),
            ExprKind::Variable(_) | ExprKind::Unary { .. } if !ty.is_none() => {
                let (negate, symbol) = match &expr.kind {
                    ExprKind::Unary { op, operand } => (*op == UnaryOp::Neg, operand.symbol),
                    _ => (false, expr.symbol),
                };
                match (self.table.constant_value(symbol), negate) {
                    (Some(ConstValue::Integer(v)), true) => ConstValue::Integer(-v),
                    (Some(ConstValue::Real(v)), true) => ConstValue::Real(-v),
                    (Some(value), false) => value,
                    _ => {
                        let message = format!("'{}' is not a constant value", expr);
                        self.report(SemanticErrorKind::TypeMismatch, message, expr.span)?;
                        return Ok(None);
                    }
                }
            }
            _ => return Ok(None),
        };
        Ok(Some((ty.kind, value)))
    }

    /// Compile-time ordinal value of a literal or named constant.
    fn ordinal(&self, expr: &Expr) -> Option<i64> {
        match &expr.kind {
            ExprKind::Integer(v) => Some(*v),
            ExprKind::Char(c) => Some(i64::from(u32::from(*c))),
            ExprKind::Boolean(b) => Some(i64::from(*b)),
            ExprKind::Variable(_) => self.table.ordinal_value(expr.symbol),
            ExprKind::Unary { op: UnaryOp::Neg, operand } => self.ordinal(operand).and_then(i64::checked_neg),
            ExprKind::Unary { op: UnaryOp::Plus, operand } => self.ordinal(operand),
            _ => None,
        }
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    fn check_statement(&mut self, stmt: &mut Stmt) -> CheckResult<()> {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::Assign { target, value } => {
                let target_ty = self.check_target(target)?;
                let value_ty = self.check_expr(value)?;
                if !self.assignable(target_ty, value_ty) {
                    let message = format!(
                        "type mismatch: cannot assign {} to '{}' of type {}",
                        value_ty, target, target_ty
                    );
                    self.report(SemanticErrorKind::TypeMismatch, message, span)?;
                }
            }

            StmtKind::Call { name, args, symbol } => {
                let (index, _) = self.check_call(name, args, span)?;
                *symbol = index;
            }

            StmtKind::Compound(stmts) => {
                for s in stmts {
                    self.check_statement(s)?;
                }
            }

            StmtKind::If { condition, then_branch, else_branch } => {
                self.check_condition(condition, "jika")?;
                self.check_statement(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.check_statement(else_branch)?;
                }
            }

            StmtKind::While { condition, body } => {
                self.check_condition(condition, "selama")?;
                self.check_statement(body)?;
            }

            StmtKind::Repeat { body, condition } => {
                for s in body {
                    self.check_statement(s)?;
                }
                self.check_condition(condition, "sampai")?;
            }

            StmtKind::For { variable, start, end, body, symbol, .. } => {
                let index = self.table.lookup(variable);
                *symbol = index;
                match self.table.entry(index) {
                    None => {
                        let message = format!("undeclared loop variable '{}'", variable);
                        self.report(SemanticErrorKind::UndeclaredIdentifier, message, span)?;
                    }
                    Some(entry) if entry.class != ObjectClass::Variable => {
                        let message = format!("loop variable '{}' is a {}, not a variable", variable, entry.class);
                        self.report(SemanticErrorKind::NotAssignable, message, span)?;
                    }
                    Some(_) => {}
                }
                for (bound, which) in [(start, "start"), (end, "end")] {
                    let ty = self.check_expr(bound)?;
                    if !ty.is_none() && ty.kind != TypeKind::Integer {
                        let message = format!("for-loop {} bound must be integer, found {}", which, ty);
                        self.report(SemanticErrorKind::ForBoundsNotInteger, message, bound.span)?;
                    }
                }
                self.check_statement(body)?;
            }

            StmtKind::Case { selector, arms } => {
                let selector_ty = self.check_expr(selector)?;
                for arm in arms {
                    let label_ty = self.check_expr(&mut arm.label)?;
                    if !selector_ty.is_none() && !label_ty.is_none() && selector_ty.kind != label_ty.kind {
                        let message = format!(
                            "type mismatch: case label of type {} does not match selector of type {}",
                            label_ty, selector_ty
                        );
                        self.report(SemanticErrorKind::TypeMismatch, message, arm.label.span)?;
                    }
                    self.check_statement(&mut arm.body)?;
                }
            }

            StmtKind::Empty => {}
        }
        Ok(())
    }

    fn check_condition(&mut self, condition: &mut Expr, construct: &str) -> CheckResult<()> {
        let ty = self.check_expr(condition)?;
        if !ty.is_none() && ty.kind != TypeKind::Boolean {
            let message = format!("condition of '{}' must be boolean, found {}", construct, ty);
            self.report(SemanticErrorKind::ConditionNotBoolean, message, condition.span)?;
        }
        Ok(())
    }

    /// Type of an assignment target.
    fn check_target(&mut self, target: &mut Expr) -> CheckResult<ExprType> {
        let ExprKind::Variable(name) = &target.kind else {
            let ty = self.check_expr(target)?;
            if !matches!(target.kind, ExprKind::Index { .. } | ExprKind::Field { .. }) {
                let message = format!("cannot assign to '{}'", target);
                self.report(SemanticErrorKind::NotAssignable, message, target.span)?;
                return Ok(ExprType::none());
            }
            return Ok(ty);
        };

        let index = self.table.lookup(name);
        target.symbol = index;
        let Some(entry) = self.table.entry(index) else {
            let message = format!("undeclared identifier '{}'", name);
            self.report(SemanticErrorKind::UndeclaredIdentifier, message, target.span)?;
            return Ok(ExprType::none());
        };
        let ty = match entry.class {
            ObjectClass::Variable => ExprType { kind: entry.base_type, composite_ref: entry.composite_ref },
            ObjectClass::Function if self.functions.contains(&index) => ExprType::scalar(entry.base_type),
            class => {
                let message = format!("cannot assign to {} '{}'", class, name);
                self.report(SemanticErrorKind::NotAssignable, message, target.span)?;
                ExprType::none()
            }
        };
        target.ty = ty;
        Ok(ty)
    }

    /// Whether an argument names storage a by-reference parameter can alias.
    fn designates_variable(&self, arg: &Expr) -> bool {
        match &arg.kind {
            ExprKind::Variable(_) => self
                .table
                .entry(arg.symbol)
                .is_some_and(|entry| entry.class == ObjectClass::Variable),
            ExprKind::Index { base, .. } | ExprKind::Field { base, .. } => self.designates_variable(base),
            _ => false,
        }
    }

    /// Check a call and return the callee's `tab` index and result type.
    fn check_call(&mut self, name: &str, args: &mut [Expr], span: Span) -> CheckResult<(usize, ExprType)> {
        let index = self.table.lookup(name);
        if index == 0 && BUILTIN_PROCEDURES.iter().any(|b| b.eq_ignore_ascii_case(name)) {
            for arg in args.iter_mut() {
                self.check_expr(arg)?;
            }
            return Ok((0, ExprType::none()));
        }

        let Some(entry) = self.table.entry(index).cloned() else {
            for arg in args.iter_mut() {
                self.check_expr(arg)?;
            }
            self.report(SemanticErrorKind::UndeclaredIdentifier, format!("undeclared identifier '{}'", name), span)?;
            return Ok((0, ExprType::none()));
        };
        if !entry.is_callable() {
            for arg in args.iter_mut() {
                self.check_expr(arg)?;
            }
            let message = format!("'{}' is a {}, not a procedure or function", name, entry.class);
            self.report(SemanticErrorKind::NotCallable, message, span)?;
            return Ok((index, ExprType::none()));
        }

        let params = self.table.parameters(entry.composite_ref);
        if params.len() != args.len() {
            for arg in args.iter_mut() {
                self.check_expr(arg)?;
            }
            let message = format!(
                "{} '{}' expects {} argument(s), found {}",
                entry.class,
                name,
                params.len(),
                args.len()
            );
            self.report(SemanticErrorKind::ArgumentCountMismatch, message, span)?;
        } else {
            for (position, (arg, param)) in args.iter_mut().zip(params).enumerate() {
                let arg_ty = self.check_expr(arg)?;
                let Some(param) = self.table.entry(param).cloned() else { continue };
                let param_ty = ExprType { kind: param.base_type, composite_ref: param.composite_ref };
                if !self.assignable(param_ty, arg_ty) {
                    let message = format!(
                        "type mismatch: argument {} of '{}' is {}, expected {}",
                        position + 1,
                        name,
                        arg_ty,
                        param_ty
                    );
                    self.report(SemanticErrorKind::TypeMismatch, message, arg.span)?;
                } else if param.mode == PassMode::ByReference && !self.designates_variable(arg) {
                    let message = format!(
                        "argument {} of '{}' is passed by reference and must be a variable",
                        position + 1,
                        name
                    );
                    self.report(SemanticErrorKind::NotAssignable, message, arg.span)?;
                }
            }
        }

        let ty = match entry.class {
            ObjectClass::Function => ExprType::scalar(entry.base_type),
            _ => ExprType::none(),
        };
        Ok((index, ty))
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    /// Infer an expression's type and annotate the node.
    fn check_expr(&mut self, expr: &mut Expr) -> CheckResult<ExprType> {
        let span = expr.span;
        let ty = match &mut expr.kind {
            ExprKind::Integer(_) => ExprType::scalar(TypeKind::Integer),
            ExprKind::Real(_) => ExprType::scalar(TypeKind::Real),
            ExprKind::Char(_) => ExprType::scalar(TypeKind::Char),
            ExprKind::Str(_) => ExprType::scalar(TypeKind::String),
            ExprKind::Boolean(_) => ExprType::scalar(TypeKind::Boolean),

            ExprKind::Variable(name) => {
                let index = self.table.lookup(name);
                expr.symbol = index;
                self.check_name(name, index, span)?
            }

            ExprKind::Index { base, index } => {
                let base_ty = self.check_expr(base)?;
                let index_ty = self.check_expr(index)?;
                self.check_index(base, base_ty, index, index_ty)?
            }

            ExprKind::Field { base, field } => {
                self.check_expr(base)?;
                let message = format!("record field access '.{}' is not supported", field);
                self.report(SemanticErrorKind::Unsupported, message, span)?;
                ExprType::none()
            }

            ExprKind::Call { name, args } => {
                let (index, ty) = self.check_call(name, args, span)?;
                expr.symbol = index;
                let is_procedure = self.table.entry(index).is_some_and(|e| e.class == ObjectClass::Procedure);
                if is_procedure {
                    let message = format!("procedure '{}' does not return a value", name);
                    self.report(SemanticErrorKind::NotAValue, message, span)?;
                }
                ty
            }

            ExprKind::Binary { op, left, right } => {
                let left_ty = self.check_expr(left)?;
                let right_ty = self.check_expr(right)?;
                self.check_binary(*op, left_ty, right_ty, span)?
            }

            ExprKind::Unary { op, operand } => {
                let operand_ty = self.check_expr(operand)?;
                self.check_unary(*op, operand_ty, span)?
            }
        };
        expr.ty = ty;
        Ok(ty)
    }

    /// Type of a bare name used as a value.
    fn check_name(&mut self, name: &str, index: usize, span: Span) -> CheckResult<ExprType> {
        let Some(entry) = self.table.entry(index) else {
            self.report(SemanticErrorKind::UndeclaredIdentifier, format!("undeclared identifier '{}'", name), span)?;
            return Ok(ExprType::none());
        };
        match entry.class {
            ObjectClass::Variable | ObjectClass::Constant => {
                Ok(ExprType { kind: entry.base_type, composite_ref: entry.composite_ref })
            }
            // Bare function name: zero-argument call
            ObjectClass::Function => {
                let ty = ExprType::scalar(entry.base_type);
                let expected = self.table.parameters(entry.composite_ref).len();
                if expected != 0 && !self.functions.contains(&index) {
                    let message = format!("function '{}' expects {} argument(s), found 0", name, expected);
                    self.report(SemanticErrorKind::ArgumentCountMismatch, message, span)?;
                }
                Ok(ty)
            }
            class => {
                let message = format!("{} '{}' cannot be used as a value", class, name);
                self.report(SemanticErrorKind::NotAValue, message, span)?;
                Ok(ExprType::none())
            }
        }
    }

    fn check_index(&mut self, base: &Expr, base_ty: ExprType, index: &Expr, index_ty: ExprType) -> CheckResult<ExprType> {
        if base_ty.is_none() {
            return Ok(ExprType::none());
        }
        let shape = match self.table.array(base_ty.composite_ref) {
            Some(shape) if base_ty.kind == TypeKind::Array => shape.clone(),
            _ => {
                let message = format!("'{}' of type {} is not an array", base, base_ty);
                self.report(SemanticErrorKind::NotAnArray, message, base.span)?;
                return Ok(ExprType::none());
            }
        };
        let element = ExprType { kind: shape.element_type, composite_ref: shape.element_ref };

        if !index_ty.is_none() && index_ty.kind != shape.index_type {
            let message = format!("array index must be {}, found {}", shape.index_type, index_ty);
            self.report(SemanticErrorKind::IndexNotInteger, message, index.span)?;
            return Ok(element);
        }
        if let Some(value) = self.ordinal(index) {
            if !shape.contains(value) {
                let message = format!("index {} is out of bounds {}..{}", value, shape.low, shape.high);
                self.report(SemanticErrorKind::IndexOutOfBounds, message, index.span)?;
            }
        }
        Ok(element)
    }

    fn check_binary(&mut self, op: BinaryOp, left: ExprType, right: ExprType, span: Span) -> CheckResult<ExprType> {
        if op.is_relational() {
            return Ok(ExprType::scalar(TypeKind::Boolean));
        }

        if op.is_logical() {
            for side in [left, right] {
                if !side.is_none() && side.kind != TypeKind::Boolean {
                    let message = format!("operator '{}' requires boolean operands, found {}", op, side);
                    self.report(SemanticErrorKind::LogicalOperandNotBoolean, message, span)?;
                }
            }
            return Ok(ExprType::scalar(TypeKind::Boolean));
        }

        if left.is_none() || right.is_none() {
            return Ok(ExprType::none());
        }
        if !left.kind.is_numeric() || !right.kind.is_numeric() {
            let message = format!("operator '{}' cannot be applied to {} and {}", op, left, right);
            self.report(SemanticErrorKind::InvalidOperands, message, span)?;
            return Ok(ExprType::none());
        }
        let any_real = left.kind == TypeKind::Real || right.kind == TypeKind::Real;
        if op.is_integer_only() {
            if any_real {
                let message = format!("operator '{}' requires integer operands, found {} and {}", op, left, right);
                self.report(SemanticErrorKind::IntegerOnlyOperator, message, span)?;
                return Ok(ExprType::none());
            }
            return Ok(ExprType::scalar(TypeKind::Integer));
        }
        if op == BinaryOp::RealDiv || any_real {
            Ok(ExprType::scalar(TypeKind::Real))
        } else {
            Ok(ExprType::scalar(TypeKind::Integer))
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: ExprType, span: Span) -> CheckResult<ExprType> {
        if operand.is_none() {
            return Ok(match op {
                UnaryOp::Not => ExprType::scalar(TypeKind::Boolean),
                _ => ExprType::none(),
            });
        }
        match op {
            UnaryOp::Not => {
                if operand.kind != TypeKind::Boolean {
                    let message = format!("operator 'tidak' requires a boolean operand, found {}", operand);
                    self.report(SemanticErrorKind::LogicalOperandNotBoolean, message, span)?;
                }
                Ok(ExprType::scalar(TypeKind::Boolean))
            }
            UnaryOp::Neg | UnaryOp::Plus => {
                if !operand.kind.is_numeric() {
                    let message = format!("operator '{}' cannot be applied to {}", op, operand);
                    self.report(SemanticErrorKind::InvalidOperands, message, span)?;
                    return Ok(ExprType::none());
                }
                Ok(operand)
            }
        }
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    /// Assignment compatibility, with integer to real widening.
    fn assignable(&self, target: ExprType, value: ExprType) -> bool {
        if target.is_none() || value.is_none() {
            return true;
        }
        match (target.kind, value.kind) {
            (TypeKind::Array, TypeKind::Array) => self.same_shape(target.composite_ref, value.composite_ref),
            (TypeKind::Real, TypeKind::Integer) => true,
            (t, v) => t == v,
        }
    }

    fn same_shape(&self, a: usize, b: usize) -> bool {
        if a == b {
            return true;
        }
        match (self.table.array(a), self.table.array(b)) {
            (Some(x), Some(y)) => {
                x.index_type == y.index_type
                    && x.element_type == y.element_type
                    && x.low == y.low
                    && x.high == y.high
                    && (x.element_type != TypeKind::Array || self.same_shape(x.element_ref, y.element_ref))
            }
            _ => false,
        }
    }

    fn symbol_error(&mut self, err: SymbolError, span: Span) -> CheckResult<()> {
        let kind = match &err {
            SymbolError::DuplicateIdentifier { .. } => SemanticErrorKind::DuplicateIdentifier,
            SymbolError::InvalidRange { .. }
            | SymbolError::SizeOverflow { .. }
            | SymbolError::FrameOverflow { .. } => SemanticErrorKind::InvalidRange,
            SymbolError::NestingTooDeep { .. } => SemanticErrorKind::NestingTooDeep,
            SymbolError::ScopeUnderflow => SemanticErrorKind::Unsupported,
        };
        self.report(kind, err.to_string(), span)
    }

    /// Record an error; under fail-fast also return it.
    fn report(&mut self, kind: SemanticErrorKind, message: String, span: Span) -> CheckResult<()> {
        let error = SemanticError { message, span, kind };
        debug!("semantic error: {}", error);
        self.errors.push(error.clone());
        match self.policy {
            ErrorPolicy::CollectAll => Ok(()),
            ErrorPolicy::FailFast => Err(error),
        }
    }
}
