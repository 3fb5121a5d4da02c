//! Folding the Pascal-S parse tree into the AST.
//!
//! The grammar is free of left recursion, so lists and operator chains come
//! out of the engine as right-nested `...Prime` nodes. Lowering flattens the
//! lists and rebuilds operator chains left-associatively. A node whose
//! shape does not match the built-in grammar produces an [`AstError`]; that
//! can only happen when a different grammar file is loaded.

use crate::frontend::ast::*;
use crate::frontend::parse_tree::ParseNode;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::errors::AstError;
use crate::utils::location::Span;

type LowerResult<T> = Result<T, AstError>;

/// Convert a `<Program>` parse tree into an AST.
pub fn lower_program(root: &ParseNode) -> LowerResult<Program> {
    expect(root, "Program")?;
    let header = expect(child(root, 0)?, "ProgramHeader")?;
    let (name, _) = identifier(child(header, 1)?)?;
    let block = lower_block(child(root, 1)?)?;
    log::debug!(
        "lowered program '{}' with {} declarations and {} statements",
        name,
        block.declarations.len(),
        block.statements.len()
    );
    Ok(Program { name, block, symbol: 0, span: root.span() })
}

fn shape_error(node: &ParseNode, message: impl Into<String>) -> AstError {
    AstError {
        message: message.into(),
        nonterminal: node.name().unwrap_or("token").to_string(),
        span: node.span(),
    }
}

fn expect<'a>(node: &'a ParseNode, name: &str) -> LowerResult<&'a ParseNode> {
    if node.is(name) {
        Ok(node)
    } else {
        Err(shape_error(node, format!("expected <{}>", name)))
    }
}

fn child(node: &ParseNode, index: usize) -> LowerResult<&ParseNode> {
    node.children
        .get(index)
        .ok_or_else(|| shape_error(node, format!("missing child {}", index)))
}

fn token(node: &ParseNode) -> LowerResult<&Token> {
    node.token().ok_or_else(|| shape_error(node, "expected a token"))
}

fn identifier(node: &ParseNode) -> LowerResult<(String, Span)> {
    let tok = token(node)?;
    if tok.kind != TokenKind::Identifier {
        return Err(shape_error(node, format!("expected identifier, found {}", tok)));
    }
    Ok((tok.lexeme.clone(), tok.span))
}

/// Collect the non-empty nodes of a right-recursive list, whose last child
/// is the rest of the list.
fn list_nodes<'a>(mut node: &'a ParseNode, name: &str) -> Vec<&'a ParseNode> {
    let mut nodes = Vec::new();
    while node.is(name) && !node.children.is_empty() {
        nodes.push(node);
        match node.children.last() {
            Some(tail) if tail.is(name) => node = tail,
            _ => break,
        }
    }
    nodes
}

fn lower_block(node: &ParseNode) -> LowerResult<Block> {
    expect(node, "Block")?;
    let declarations = lower_declaration_part(child(node, 0)?)?;
    let statement_part = expect(child(node, 1)?, "StatementPart")?;
    let statements = lower_compound(child(statement_part, 0)?)?;
    Ok(Block::new(declarations, statements, node.span()))
}

fn lower_declaration_part(node: &ParseNode) -> LowerResult<Vec<Decl>> {
    expect(node, "DeclarationPart")?;
    let mut declarations = Vec::new();
    for section in &node.children {
        match section.name() {
            Some("ConstDeclOpt") => {
                if let Some(list) = section.children.get(1) {
                    for item in list_nodes(list, "ConstList") {
                        let (name, _) = identifier(child(item, 0)?)?;
                        let value = lower_constant(child(item, 2)?)?;
                        declarations.push(Decl::new(DeclKind::Const { name, value }, item_span(item)));
                    }
                }
            }
            Some("TypeDeclOpt") => {
                if let Some(list) = section.children.get(1) {
                    for item in list_nodes(list, "TypeList") {
                        let (name, _) = identifier(child(item, 0)?)?;
                        let ty = lower_type(child(item, 2)?)?;
                        declarations.push(Decl::new(DeclKind::Type { name, ty }, item_span(item)));
                    }
                }
            }
            Some("VarDeclOpt") => {
                if let Some(list) = section.children.get(1) {
                    for (name, ty, span) in lower_var_decl_list(list)? {
                        declarations.push(Decl::new(DeclKind::Var { name, ty }, span));
                    }
                }
            }
            Some("SubprogDeclList") => {
                for item in list_nodes(section, "SubprogDeclList") {
                    let decl = child(expect(child(item, 0)?, "SubprogramDeclaration")?, 0)?;
                    declarations.push(lower_subprogram(decl)?);
                }
            }
            _ => return Err(shape_error(section, "unexpected declaration section")),
        }
    }
    Ok(declarations)
}

/// Span of a list item without its tail.
fn item_span(item: &ParseNode) -> Span {
    let head = &item.children[..item.children.len().saturating_sub(1)];
    head.iter().fold(Span::dummy(), |acc, n| acc.cover(&n.span()))
}

/// `<VarDeclList>` as `(name, type, span)` triples, one per declared name.
fn lower_var_decl_list(node: &ParseNode) -> LowerResult<Vec<(String, TypeExpr, Span)>> {
    let mut out = Vec::new();
    for item in list_nodes(node, "VarDeclList") {
        let declaration = expect(child(item, 0)?, "VarDeclaration")?;
        let ty = lower_type(child(declaration, 2)?)?;
        for (name, span) in lower_identifier_list(child(declaration, 0)?)? {
            out.push((name, ty.clone(), span.cover(&ty.span)));
        }
    }
    Ok(out)
}

fn lower_identifier_list(node: &ParseNode) -> LowerResult<Vec<(String, Span)>> {
    expect(node, "IdentifierList")?;
    let mut names = vec![identifier(child(node, 0)?)?];
    for item in list_nodes(child(node, 1)?, "IdentifierListPrime") {
        names.push(identifier(child(item, 1)?)?);
    }
    Ok(names)
}

fn lower_type(node: &ParseNode) -> LowerResult<TypeExpr> {
    let inner = child(expect(node, "Type")?, 0)?;
    match inner.name() {
        Some("SimpleType") => lower_simple_type(inner),
        Some("ArrayType") => {
            let range = expect(child(inner, 2)?, "Range")?;
            let low = lower_constant(child(range, 0)?)?;
            let high = lower_constant(child(range, 2)?)?;
            let element = Box::new(lower_type(child(inner, 5)?)?);
            Ok(TypeExpr { kind: TypeExprKind::Array { low, high, element }, span: inner.span() })
        }
        Some("RecordType") => {
            let fields = lower_var_decl_list(child(inner, 1)?)?
                .into_iter()
                .map(|(name, ty, _)| Field { name, ty })
                .collect();
            Ok(TypeExpr { kind: TypeExprKind::Record(fields), span: inner.span() })
        }
        _ => Err(shape_error(inner, "unknown type form")),
    }
}

fn lower_simple_type(node: &ParseNode) -> LowerResult<TypeExpr> {
    let tok = token(child(expect(node, "SimpleType")?, 0)?)?;
    let kind = match tok.kind {
        TokenKind::Keyword => TypeKind::from_keyword(&tok.lexeme)
            .map(TypeExprKind::Simple)
            .ok_or_else(|| shape_error(node, format!("`{}` is not a type", tok.lexeme)))?,
        TokenKind::Identifier => TypeExprKind::Named(tok.lexeme.clone()),
        _ => return Err(shape_error(node, format!("unexpected {} in type", tok))),
    };
    Ok(TypeExpr { kind, span: tok.span })
}

fn lower_subprogram(node: &ParseNode) -> LowerResult<Decl> {
    let (name, _) = identifier(child(node, 1)?)?;
    let params = lower_formal_params(child(node, 2)?)?;
    let kind = match node.name() {
        Some("ProcedureDeclaration") => DeclKind::Procedure {
            name,
            params,
            block: lower_block(child(node, 4)?)?,
        },
        Some("FunctionDeclaration") => DeclKind::Function {
            name,
            params,
            return_type: lower_simple_type(child(node, 4)?)?,
            block: lower_block(child(node, 6)?)?,
        },
        _ => return Err(shape_error(node, "expected a procedure or function")),
    };
    Ok(Decl::new(kind, node.span()))
}

fn lower_formal_params(node: &ParseNode) -> LowerResult<Vec<Param>> {
    let Some(list) = expect(node, "FormalParamOpt")?.children.first() else {
        return Ok(Vec::new());
    };
    let sections = expect(child(list, 1)?, "ParamSectionList")?;
    let mut section_nodes = vec![child(sections, 0)?];
    for item in list_nodes(child(sections, 1)?, "ParamSectionListPrime") {
        section_nodes.push(child(item, 1)?);
    }

    let mut params = Vec::new();
    for section in section_nodes {
        expect(section, "ParamSection")?;
        let mode = if child(section, 0)?.children.is_empty() {
            PassMode::Normal
        } else {
            PassMode::ByReference
        };
        let ty = lower_simple_type(child(section, 3)?)?;
        for (name, span) in lower_identifier_list(child(section, 1)?)? {
            params.push(Param { name, ty: ty.clone(), mode, symbol: 0, span });
        }
    }
    Ok(params)
}

fn lower_compound(node: &ParseNode) -> LowerResult<Vec<Stmt>> {
    lower_statement_list(child(expect(node, "CompoundStatement")?, 1)?)
}

/// `<StatementList>` without its empty statements.
fn lower_statement_list(node: &ParseNode) -> LowerResult<Vec<Stmt>> {
    expect(node, "StatementList")?;
    let mut nodes = vec![child(node, 0)?];
    for item in list_nodes(child(node, 1)?, "StatementListPrime") {
        nodes.push(child(item, 1)?);
    }
    let mut statements = Vec::with_capacity(nodes.len());
    for n in nodes {
        let stmt = lower_statement(n)?;
        if !matches!(stmt.kind, StmtKind::Empty) {
            statements.push(stmt);
        }
    }
    Ok(statements)
}

fn lower_statement(node: &ParseNode) -> LowerResult<Stmt> {
    expect(node, "Statement")?;
    let Some(inner) = node.children.first() else {
        return Ok(Stmt::empty());
    };
    let span = inner.span();
    let kind = match inner.name() {
        Some("AssignmentStatement") => {
            let (name, name_span) = identifier(child(inner, 0)?)?;
            let target = apply_variable_tail(Expr::var(name, name_span), child(inner, 1)?)?;
            let value = lower_expression(child(inner, 3)?)?;
            StmtKind::Assign { target, value }
        }
        Some("ProcedureCall") => {
            let (name, _) = identifier(child(inner, 0)?)?;
            let args = match child(inner, 1)?.children.first() {
                Some(list) => lower_parameter_list(list)?,
                None => Vec::new(),
            };
            StmtKind::Call { name, args, symbol: 0 }
        }
        Some("CompoundStatement") => StmtKind::Compound(lower_compound(inner)?),
        Some("IfStatement") => {
            let condition = lower_expression(child(inner, 1)?)?;
            let then_branch = Box::new(lower_statement(child(inner, 3)?)?);
            let else_branch = match child(inner, 4)?.children.get(1) {
                Some(stmt) => Some(Box::new(lower_statement(stmt)?)),
                None => None,
            };
            StmtKind::If { condition, then_branch, else_branch }
        }
        Some("WhileStatement") => StmtKind::While {
            condition: lower_expression(child(inner, 1)?)?,
            body: Box::new(lower_statement(child(inner, 3)?)?),
        },
        Some("RepeatStatement") => StmtKind::Repeat {
            body: lower_statement_list(child(inner, 1)?)?,
            condition: lower_expression(child(inner, 3)?)?,
        },
        Some("ForStatement") => {
            let (variable, _) = identifier(child(inner, 1)?)?;
            let direction = match token(child(child(inner, 4)?, 0)?)?.lexeme.as_str() {
                "ke" => ForDirection::Up,
                _ => ForDirection::Down,
            };
            StmtKind::For {
                variable,
                start: lower_expression(child(inner, 3)?)?,
                direction,
                end: lower_expression(child(inner, 5)?)?,
                body: Box::new(lower_statement(child(inner, 7)?)?),
                symbol: 0,
            }
        }
        Some("CaseStatement") => {
            let selector = lower_expression(child(inner, 1)?)?;
            let list = expect(child(inner, 3)?, "CaseList")?;
            let mut elements = vec![child(list, 0)?];
            for item in list_nodes(child(list, 1)?, "CaseListPrime") {
                elements.push(child(item, 1)?);
            }
            let arms = elements
                .into_iter()
                .map(|element| {
                    Ok(CaseArm {
                        label: lower_constant(child(element, 0)?)?,
                        body: lower_statement(child(element, 2)?)?,
                    })
                })
                .collect::<LowerResult<Vec<_>>>()?;
            StmtKind::Case { selector, arms }
        }
        _ => return Err(shape_error(inner, "unknown statement form")),
    };
    Ok(Stmt::new(kind, span))
}

fn lower_parameter_list(node: &ParseNode) -> LowerResult<Vec<Expr>> {
    let list = expect(child(expect(node, "ParameterList")?, 1)?, "ExpressionList")?;
    let mut args = vec![lower_expression(child(list, 0)?)?];
    for item in list_nodes(child(list, 1)?, "ExpressionListPrime") {
        args.push(lower_expression(child(item, 1)?)?);
    }
    Ok(args)
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.cover(&right.span);
    Expr::new(ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) }, span)
}

fn operator(node: &ParseNode) -> LowerResult<BinaryOp> {
    let tok = token(child(node, 0)?)?;
    BinaryOp::from_lexeme(&tok.lexeme)
        .ok_or_else(|| shape_error(node, format!("unknown operator `{}`", tok.lexeme)))
}

fn lower_expression(node: &ParseNode) -> LowerResult<Expr> {
    expect(node, "Expression")?;
    let left = lower_simple_expression(child(node, 0)?)?;
    let tail = child(node, 1)?;
    if tail.children.is_empty() {
        return Ok(left);
    }
    let op = operator(child(tail, 0)?)?;
    let right = lower_simple_expression(child(tail, 1)?)?;
    Ok(binary(op, left, right))
}

fn lower_simple_expression(node: &ParseNode) -> LowerResult<Expr> {
    expect(node, "SimpleExpression")?;
    let signed = expect(child(node, 0)?, "SignedTerm")?;
    let sign = lower_sign(child(signed, 0)?)?;
    let mut acc = apply_sign(sign, lower_term(child(signed, 1)?)?, signed.span());
    for item in list_nodes(child(node, 1)?, "SimpleExpressionPrime") {
        let op = operator(child(item, 0)?)?;
        acc = binary(op, acc, lower_term(child(item, 1)?)?);
    }
    Ok(acc)
}

fn lower_term(node: &ParseNode) -> LowerResult<Expr> {
    expect(node, "Term")?;
    let mut acc = lower_factor(child(node, 0)?)?;
    for item in list_nodes(child(node, 1)?, "TermPrime") {
        let op = operator(child(item, 0)?)?;
        acc = binary(op, acc, lower_factor(child(item, 1)?)?);
    }
    Ok(acc)
}

fn lower_factor(node: &ParseNode) -> LowerResult<Expr> {
    expect(node, "Factor")?;
    let first = child(node, 0)?;
    if first.is("Constant") {
        return lower_constant(first);
    }
    let tok = token(first)?;
    match tok.kind {
        TokenKind::Identifier => {
            let tail = child(child(node, 1)?, 0)?;
            if tail.is("ParameterList") {
                let args = lower_parameter_list(tail)?;
                Ok(Expr::new(ExprKind::Call { name: tok.lexeme.clone(), args }, node.span()))
            } else {
                apply_variable_tail(Expr::var(tok.lexeme.clone(), tok.span), tail)
            }
        }
        TokenKind::LParenthesis => lower_expression(child(node, 1)?),
        TokenKind::LogicalOperator => {
            let operand = Box::new(lower_factor(child(node, 1)?)?);
            Ok(Expr::new(ExprKind::Unary { op: UnaryOp::Not, operand }, node.span()))
        }
        _ => Err(shape_error(node, format!("unexpected {} in factor", tok))),
    }
}

/// Wrap `base` in the index and field selectors of a `<VariableTail>`.
fn apply_variable_tail(mut base: Expr, mut tail: &ParseNode) -> LowerResult<Expr> {
    loop {
        expect(tail, "VariableTail")?;
        let Some(first) = tail.children.first() else {
            return Ok(base);
        };
        let selector_span = base.span.cover(&child(tail, 1)?.span());
        base = match token(first)?.kind {
            TokenKind::LBracket => {
                let index = lower_expression(child(tail, 1)?)?;
                let span = selector_span.cover(&child(tail, 2)?.span());
                Expr::new(ExprKind::Index { base: Box::new(base), index: Box::new(index) }, span)
            }
            TokenKind::Dot => {
                let (field, _) = identifier(child(tail, 1)?)?;
                Expr::new(ExprKind::Field { base: Box::new(base), field }, selector_span)
            }
            _ => return Err(shape_error(tail, "unknown selector")),
        };
        tail = child(tail, tail.children.len() - 1)?;
    }
}

fn lower_sign(node: &ParseNode) -> LowerResult<Option<UnaryOp>> {
    let Some(sign) = expect(node, "SignOpt")?.children.first() else {
        return Ok(None);
    };
    match token(child(sign, 0)?)?.lexeme.as_str() {
        "-" => Ok(Some(UnaryOp::Neg)),
        "+" => Ok(Some(UnaryOp::Plus)),
        other => Err(shape_error(sign, format!("unknown sign `{}`", other))),
    }
}

/// Apply a sign, folding it into numeric literals.
fn apply_sign(sign: Option<UnaryOp>, expr: Expr, span: Span) -> Expr {
    match (sign, &expr.kind) {
        (None, _) | (Some(UnaryOp::Plus), ExprKind::Integer(_) | ExprKind::Real(_)) => expr,
        (Some(UnaryOp::Neg), ExprKind::Integer(v)) => Expr::new(ExprKind::Integer(-v), span),
        (Some(UnaryOp::Neg), ExprKind::Real(v)) => Expr::new(ExprKind::Real(-v), span),
        (Some(op), _) => Expr::new(ExprKind::Unary { op, operand: Box::new(expr) }, span),
    }
}

fn lower_constant(node: &ParseNode) -> LowerResult<Expr> {
    expect(node, "Constant")?;
    let first = child(node, 0)?;
    if first.is("SignOpt") {
        let sign = lower_sign(first)?;
        let tok = token(child(child(node, 1)?, 0)?)?;
        let value = match tok.kind {
            TokenKind::Number => number_literal(tok).map_err(|m| shape_error(node, m))?,
            _ => Expr::var(tok.lexeme.clone(), tok.span),
        };
        return Ok(apply_sign(sign, value, node.span()));
    }

    let tok = token(first)?;
    let kind = match tok.kind {
        TokenKind::StringLiteral => ExprKind::Str(unquote(&tok.lexeme)),
        TokenKind::CharLiteral => {
            let text = unquote(&tok.lexeme);
            let c = text
                .chars()
                .next()
                .ok_or_else(|| shape_error(node, "empty character literal"))?;
            ExprKind::Char(c)
        }
        TokenKind::Keyword if tok.lexeme == "true" => ExprKind::Boolean(true),
        TokenKind::Keyword if tok.lexeme == "false" => ExprKind::Boolean(false),
        _ => return Err(shape_error(node, format!("unexpected {} in constant", tok))),
    };
    Ok(Expr::new(kind, tok.span))
}

fn number_literal(tok: &Token) -> Result<Expr, String> {
    let text = tok.lexeme.as_str();
    let kind = if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>()
            .map(ExprKind::Real)
            .map_err(|e| format!("invalid real literal `{}`: {}", text, e))?
    } else {
        text.parse::<i64>()
            .map(ExprKind::Integer)
            .map_err(|e| format!("invalid integer literal `{}`: {}", text, e))?
    };
    Ok(Expr::new(kind, tok.span))
}

/// Strip the surrounding quotes and undouble embedded quotes.
fn unquote(lexeme: &str) -> String {
    let inner = lexeme
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(lexeme);
    inner.replace("''", "'")
}
