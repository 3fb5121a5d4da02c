//! Pretty printing for the AST, the symbol tables and diagnostics.
//!
//! Three renderings are provided:
//! - [`PrettyPrint`]: normalised Pascal-S source, laid out with the `pretty`
//!   crate
//! - [`ast_tree`]: an indented tree with the checker's `idx:`/`type:`
//!   annotations
//! - [`symbol_tables`] and [`render_diagnostic`] for the CLI

use crate::frontend::ast::*;
use crate::semantic::symbol_table::SymbolTable;
use crate::utils::errors::Diagnostic;
use crate::utils::location::SourceMap;
use pretty::{BoxAllocator, DocAllocator, DocBuilder};
use std::fmt;

/// Default line width for pretty printing.
pub const DEFAULT_WIDTH: usize = 80;

/// Indentation used inside blocks.
const NEST: isize = 4;

/// A pretty-printable value.
pub trait PrettyPrint {
    /// Convert to a pretty document.
    fn to_doc<'a, D: DocAllocator<'a>>(&self, allocator: &'a D) -> DocBuilder<'a, D>;

    /// Pretty print to a string with the given width.
    fn pretty_print(&self, width: usize) -> String {
        let allocator = BoxAllocator;
        let doc = self.to_doc(&allocator);
        let mut output = String::new();
        match doc.render_fmt(width, &mut output) {
            Ok(()) => output,
            Err(_) => String::new(),
        }
    }

    /// Pretty print with default width.
    fn pretty(&self) -> String {
        self.pretty_print(DEFAULT_WIDTH)
    }
}

impl PrettyPrint for Program {
    fn to_doc<'a, D: DocAllocator<'a>>(&self, a: &'a D) -> DocBuilder<'a, D> {
        a.text(format!("program {};", self.name))
            .append(a.hardline())
            .append(block_doc(&self.block, a))
            .append(".")
            .append(a.hardline())
    }
}

impl PrettyPrint for Stmt {
    fn to_doc<'a, D: DocAllocator<'a>>(&self, a: &'a D) -> DocBuilder<'a, D> {
        stmt_doc(self, a)
    }
}

fn block_doc<'a, D: DocAllocator<'a>>(block: &Block, a: &'a D) -> DocBuilder<'a, D> {
    let mut doc = a.nil();
    let mut section = "";
    for decl in &block.declarations {
        let keyword = match decl.kind {
            DeclKind::Const { .. } => "konstanta",
            DeclKind::Type { .. } => "tipe",
            DeclKind::Var { .. } => "variabel",
            DeclKind::Procedure { .. } | DeclKind::Function { .. } => "",
        };
        if !keyword.is_empty() && keyword != section {
            doc = doc.append(keyword).append(a.hardline());
        }
        section = keyword;
        doc = doc.append(decl_doc(decl, a)).append(a.hardline());
    }
    doc.append(compound_doc(&block.statements, a))
}

fn decl_doc<'a, D: DocAllocator<'a>>(decl: &Decl, a: &'a D) -> DocBuilder<'a, D> {
    let line = match &decl.kind {
        DeclKind::Const { name, value } => format!("{} = {};", name, value),
        DeclKind::Type { name, ty } => format!("{} = {};", name, ty),
        DeclKind::Var { name, ty } => format!("{}: {};", name, ty),
        DeclKind::Procedure { name, params, block } => {
            return a
                .text(format!("prosedur {}{};", name, params_text(params)))
                .append(a.hardline())
                .append(block_doc(block, a))
                .append(";");
        }
        DeclKind::Function { name, params, return_type, block } => {
            return a
                .text(format!("fungsi {}{}: {};", name, params_text(params), return_type))
                .append(a.hardline())
                .append(block_doc(block, a))
                .append(";");
        }
    };
    a.text(" ".repeat(NEST as usize)).append(line)
}

fn params_text(params: &[Param]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let items: Vec<String> = params
        .iter()
        .map(|p| match p.mode {
            PassMode::ByReference => format!("variabel {}: {}", p.name, p.ty),
            PassMode::Normal => format!("{}: {}", p.name, p.ty),
        })
        .collect();
    format!("({})", items.join("; "))
}

/// `mulai` + nested statement list + `selesai`.
fn compound_doc<'a, D: DocAllocator<'a>>(stmts: &[Stmt], a: &'a D) -> DocBuilder<'a, D> {
    a.text("mulai")
        .append(a.hardline().append(stmt_list_doc(stmts, a)).nest(NEST))
        .append(a.hardline())
        .append("selesai")
}

fn stmt_list_doc<'a, D: DocAllocator<'a>>(stmts: &[Stmt], a: &'a D) -> DocBuilder<'a, D> {
    let mut doc = a.nil();
    for (i, stmt) in stmts.iter().enumerate() {
        if i > 0 {
            doc = doc.append(";").append(a.hardline());
        }
        doc = doc.append(stmt_doc(stmt, a));
    }
    doc
}

/// A statement nested one level under its header.
fn nested<'a, D: DocAllocator<'a>>(stmt: &Stmt, a: &'a D) -> DocBuilder<'a, D> {
    match stmt.kind {
        StmtKind::Compound(_) => a.text(" ").append(stmt_doc(stmt, a)),
        _ => a.hardline().append(stmt_doc(stmt, a)).nest(NEST),
    }
}

fn stmt_doc<'a, D: DocAllocator<'a>>(stmt: &Stmt, a: &'a D) -> DocBuilder<'a, D> {
    match &stmt.kind {
        StmtKind::Assign { target, value } => a.text(format!("{} := {}", target, value)),
        StmtKind::Call { name, args, .. } if args.is_empty() => a.text(name.clone()),
        StmtKind::Call { name, args, .. } => {
            let args: Vec<String> = args.iter().map(ToString::to_string).collect();
            a.text(format!("{}({})", name, args.join(", ")))
        }
        StmtKind::Compound(stmts) => compound_doc(stmts, a),
        StmtKind::If { condition, then_branch, else_branch } => {
            let doc = a.text(format!("jika {} maka", condition)).append(nested(then_branch, a));
            match else_branch {
                Some(other) => doc.append(a.hardline()).append("selain-itu").append(nested(other, a)),
                None => doc,
            }
        }
        StmtKind::While { condition, body } => {
            a.text(format!("selama {} lakukan", condition)).append(nested(body, a))
        }
        StmtKind::Repeat { body, condition } => a
            .text("ulangi")
            .append(a.hardline().append(stmt_list_doc(body, a)).nest(NEST))
            .append(a.hardline())
            .append(a.text(format!("sampai {}", condition))),
        StmtKind::For { variable, start, direction, end, body, .. } => a
            .text(format!("untuk {} := {} {} {} lakukan", variable, start, direction, end))
            .append(nested(body, a)),
        StmtKind::Case { selector, arms } => {
            let mut inner = a.nil();
            for (i, arm) in arms.iter().enumerate() {
                if i > 0 {
                    inner = inner.append(";");
                }
                inner = inner
                    .append(a.hardline())
                    .append(a.text(format!("{}: ", arm.label)))
                    .append(stmt_doc(&arm.body, a));
            }
            a.text(format!("kasus {} dari", selector))
                .append(inner.nest(NEST))
                .append(a.hardline())
                .append("selesai")
        }
        StmtKind::Empty => a.nil(),
    }
}

/// Indent a block of text.
pub fn indent(s: &str, spaces: usize) -> String {
    let indent_str = " ".repeat(spaces);
    s.lines()
        .map(|line| {
            if line.is_empty() {
                line.to_string()
            } else {
                format!("{}{}", indent_str, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line-oriented writer with an indentation level.
#[derive(Debug)]
pub struct CodeFormatter {
    output: String,
    indent_level: usize,
    indent_str: String,
    at_line_start: bool,
}

impl CodeFormatter {
    /// Create a new formatter with the given indent string.
    pub fn new(indent_str: &str) -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            indent_str: indent_str.to_string(),
            at_line_start: true,
        }
    }

    /// Create a formatter with default settings (2 spaces).
    pub fn default_indent() -> Self {
        Self::new("  ")
    }

    /// Increase indentation level.
    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    /// Decrease indentation level.
    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    /// Write text.
    pub fn write(&mut self, s: &str) {
        for c in s.chars() {
            if c == '\n' {
                self.output.push('\n');
                self.at_line_start = true;
            } else {
                if self.at_line_start {
                    for _ in 0..self.indent_level {
                        self.output.push_str(&self.indent_str);
                    }
                    self.at_line_start = false;
                }
                self.output.push(c);
            }
        }
    }

    /// Write a line.
    pub fn writeln(&mut self, s: &str) {
        self.write(s);
        self.write("\n");
    }

    /// Write a header line and its children one level deeper.
    pub fn node<F: FnOnce(&mut Self)>(&mut self, header: &str, f: F) {
        self.writeln(header);
        self.indent();
        f(self);
        self.dedent();
    }

    /// Get the formatted output.
    pub fn finish(self) -> String {
        self.output
    }
}

impl fmt::Write for CodeFormatter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s);
        Ok(())
    }
}

// -------------------------------------------------------------------------
// Annotated AST tree
// -------------------------------------------------------------------------

/// Render the AST as an indented tree. Resolved names carry `idx:` (their
/// `tab` index) and expressions carry `type:` once the checker has run.
pub fn ast_tree(program: &Program) -> String {
    let mut f = CodeFormatter::default_indent();
    f.node(&format!("Program {} [idx: {}]", program.name, program.symbol), |f| {
        tree_block(f, &program.block);
    });
    f.finish()
}

fn tree_block(f: &mut CodeFormatter, block: &Block) {
    f.node(&format!("Block [btab: {}]", block.block_index), |f| {
        for decl in &block.declarations {
            tree_decl(f, decl);
        }
        for stmt in &block.statements {
            tree_stmt(f, stmt);
        }
    });
}

fn tree_decl(f: &mut CodeFormatter, decl: &Decl) {
    match &decl.kind {
        DeclKind::Const { name, value } => {
            f.node(&format!("Const {} [idx: {}]", name, decl.symbol), |f| tree_expr(f, value));
        }
        DeclKind::Type { name, ty } => f.writeln(&format!("Type {} = {} [idx: {}]", name, ty, decl.symbol)),
        DeclKind::Var { name, ty } => f.writeln(&format!("Var {}: {} [idx: {}]", name, ty, decl.symbol)),
        DeclKind::Procedure { name, params, block } => {
            f.node(&format!("Procedure {} [idx: {}]", name, decl.symbol), |f| {
                tree_params(f, params);
                tree_block(f, block);
            });
        }
        DeclKind::Function { name, params, return_type, block } => {
            f.node(&format!("Function {}: {} [idx: {}]", name, return_type, decl.symbol), |f| {
                tree_params(f, params);
                tree_block(f, block);
            });
        }
    }
}

fn tree_params(f: &mut CodeFormatter, params: &[Param]) {
    for p in params {
        f.writeln(&format!("Param {}: {} ({}) [idx: {}]", p.name, p.ty, p.mode, p.symbol));
    }
}

fn tree_stmt(f: &mut CodeFormatter, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Assign { target, value } => f.node("Assign", |f| {
            tree_expr(f, target);
            tree_expr(f, value);
        }),
        StmtKind::Call { name, args, symbol } => f.node(&format!("Call {} [idx: {}]", name, symbol), |f| {
            for arg in args {
                tree_expr(f, arg);
            }
        }),
        StmtKind::Compound(stmts) => f.node("Compound", |f| {
            for s in stmts {
                tree_stmt(f, s);
            }
        }),
        StmtKind::If { condition, then_branch, else_branch } => f.node("If", |f| {
            tree_expr(f, condition);
            tree_stmt(f, then_branch);
            if let Some(other) = else_branch {
                f.node("Else", |f| tree_stmt(f, other));
            }
        }),
        StmtKind::While { condition, body } => f.node("While", |f| {
            tree_expr(f, condition);
            tree_stmt(f, body);
        }),
        StmtKind::Repeat { body, condition } => f.node("Repeat", |f| {
            for s in body {
                tree_stmt(f, s);
            }
            f.node("Until", |f| tree_expr(f, condition));
        }),
        StmtKind::For { variable, start, direction, end, body, symbol } => {
            f.node(&format!("For {} {} [idx: {}]", variable, direction, symbol), |f| {
                tree_expr(f, start);
                tree_expr(f, end);
                tree_stmt(f, body);
            })
        }
        StmtKind::Case { selector, arms } => f.node("Case", |f| {
            tree_expr(f, selector);
            for arm in arms {
                f.node("Arm", |f| {
                    tree_expr(f, &arm.label);
                    tree_stmt(f, &arm.body);
                });
            }
        }),
        StmtKind::Empty => f.writeln("Empty"),
    }
}

fn annotation(expr: &Expr) -> String {
    match (expr.symbol, expr.ty.is_none()) {
        (0, true) => String::new(),
        (0, false) => format!(" [type: {}]", expr.ty),
        (idx, true) => format!(" [idx: {}]", idx),
        (idx, false) => format!(" [idx: {}, type: {}]", idx, expr.ty),
    }
}

fn tree_expr(f: &mut CodeFormatter, expr: &Expr) {
    let note = annotation(expr);
    match &expr.kind {
        ExprKind::Integer(_) | ExprKind::Real(_) | ExprKind::Char(_) | ExprKind::Str(_) | ExprKind::Boolean(_) => {
            f.writeln(&format!("Literal {}{}", expr, note))
        }
        ExprKind::Variable(name) => f.writeln(&format!("Variable {}{}", name, note)),
        ExprKind::Index { base, index } => f.node(&format!("Index{}", note), |f| {
            tree_expr(f, base);
            tree_expr(f, index);
        }),
        ExprKind::Field { base, field } => f.node(&format!("Field .{}{}", field, note), |f| tree_expr(f, base)),
        ExprKind::Call { name, args } => f.node(&format!("Call {}{}", name, note), |f| {
            for arg in args {
                tree_expr(f, arg);
            }
        }),
        ExprKind::Binary { op, left, right } => f.node(&format!("Binary {}{}", op, note), |f| {
            tree_expr(f, left);
            tree_expr(f, right);
        }),
        ExprKind::Unary { op, operand } => f.node(&format!("Unary {}{}", op, note), |f| tree_expr(f, operand)),
    }
}

// -------------------------------------------------------------------------
// Symbol tables
// -------------------------------------------------------------------------

/// Render `tab`, `btab` and `atab` as aligned text tables.
pub fn symbol_tables(table: &SymbolTable) -> String {
    let mut out = String::new();

    out.push_str("tab:\n");
    out.push_str(&format!(
        "{:>4}  {:<12} {:>4}  {:<10} {:<8} {:>4} {:<6} {:>3} {:>5}\n",
        "idx", "id", "link", "obj", "type", "ref", "nrm", "lev", "adr"
    ));
    for (i, e) in table.entries().iter().enumerate().skip(1) {
        out.push_str(&format!(
            "{:>4}  {:<12} {:>4}  {:<10} {:<8} {:>4} {:<6} {:>3} {:>5}\n",
            i,
            e.identifier,
            e.link,
            e.class.to_string(),
            e.base_type.to_string(),
            e.composite_ref,
            e.mode.to_string(),
            e.level,
            e.slot
        ));
    }

    out.push_str("\nbtab:\n");
    out.push_str(&format!("{:>4}  {:<12} {:>5} {:>5} {:>5} {:>5}\n", "idx", "name", "last", "lpar", "psze", "vsze"));
    for (i, b) in table.blocks().iter().enumerate().skip(1) {
        out.push_str(&format!(
            "{:>4}  {:<12} {:>5} {:>5} {:>5} {:>5}\n",
            i, b.name, b.last, b.param_boundary, b.param_frame_size, b.local_frame_size
        ));
    }

    out.push_str("\natab:\n");
    out.push_str(&format!(
        "{:>4}  {:<8} {:<8} {:>4} {:>6} {:>6} {:>5} {:>5}\n",
        "idx", "xtyp", "etyp", "eref", "low", "high", "elsz", "size"
    ));
    for (i, s) in table.arrays().iter().enumerate().skip(1) {
        out.push_str(&format!(
            "{:>4}  {:<8} {:<8} {:>4} {:>6} {:>6} {:>5} {:>5}\n",
            i,
            s.index_type.to_string(),
            s.element_type.to_string(),
            s.element_ref,
            s.low,
            s.high,
            s.element_size,
            s.total_size
        ));
    }
    out
}

// -------------------------------------------------------------------------
// Diagnostics
// -------------------------------------------------------------------------

/// Render a diagnostic with the offending source line and a caret marker.
pub fn render_diagnostic(diagnostic: &Diagnostic, source: &SourceMap, file_name: &str) -> String {
    let mut out = format!("{}: {}\n", diagnostic.severity, diagnostic.message);
    if let Some(span) = diagnostic.span.filter(|s| !s.is_dummy()) {
        let gutter = " ".repeat(span.start_line.to_string().len());
        out.push_str(&format!("{}--> {}:{}:{}\n", gutter, file_name, span.start_line, span.start_column));
        if let Some(line) = source.line(span.start_line) {
            let width = if span.end_line == span.start_line && span.end_column > span.start_column {
                span.end_column - span.start_column
            } else {
                1
            };
            out.push_str(&format!("{} |\n", gutter));
            out.push_str(&format!("{} | {}\n", span.start_line, line));
            out.push_str(&format!(
                "{} | {}{}\n",
                gutter,
                " ".repeat(span.start_column.saturating_sub(1)),
                "^".repeat(width)
            ));
        }
    }
    for note in &diagnostic.notes {
        out.push_str(&format!("  = note: {}\n", note));
    }
    out
}
