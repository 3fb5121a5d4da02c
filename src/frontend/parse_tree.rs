//! Concrete parse trees produced by the grammar engine.

use crate::frontend::token::Token;
use crate::utils::location::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a parse tree node stands for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeLabel {
    /// Interior node built from a matched nonterminal
    NonTerminal(String),
    /// Leaf built from a matched terminal
    Token(Token),
}

/// A node in the parse tree.
///
/// Leaves hold the matched token. Interior nodes hold one child per
/// non-empty symbol of the alternative that matched; an alternative that
/// matched only through epsilon leaves the node with no children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseNode {
    /// Node label
    pub label: NodeLabel,
    /// Child nodes, in source order
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    /// Create an interior node.
    pub fn branch(name: impl Into<String>, children: Vec<ParseNode>) -> Self {
        Self { label: NodeLabel::NonTerminal(name.into()), children }
    }

    /// Create a leaf.
    pub fn leaf(token: Token) -> Self {
        Self { label: NodeLabel::Token(token), children: Vec::new() }
    }

    /// Nonterminal name of an interior node.
    pub fn name(&self) -> Option<&str> {
        match &self.label {
            NodeLabel::NonTerminal(name) => Some(name),
            NodeLabel::Token(_) => None,
        }
    }

    /// Token of a leaf.
    pub fn token(&self) -> Option<&Token> {
        match &self.label {
            NodeLabel::Token(token) => Some(token),
            NodeLabel::NonTerminal(_) => None,
        }
    }

    /// Check if this node was built from the given nonterminal.
    pub fn is(&self, name: &str) -> bool {
        self.name() == Some(name)
    }

    /// Check if this is a token leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self.label, NodeLabel::Token(_))
    }

    /// All tokens under this node, left to right.
    pub fn leaves(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Token>) {
        match &self.label {
            NodeLabel::Token(token) => out.push(token),
            NodeLabel::NonTerminal(_) => {
                for child in &self.children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Source span from the first to the last token; dummy if the node
    /// covers no tokens.
    pub fn span(&self) -> Span {
        let leaves = self.leaves();
        match (leaves.first(), leaves.last()) {
            (Some(first), Some(last)) => first.span.merge(&last.span),
            _ => Span::dummy(),
        }
    }

    /// Total number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ParseNode::node_count).sum::<usize>()
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, prefix: &str, last: bool, root: bool) -> fmt::Result {
        let (connector, extension) = match (root, last) {
            (true, _) => ("", ""),
            (false, true) => ("└── ", "    "),
            (false, false) => ("├── ", "│   "),
        };
        match &self.label {
            NodeLabel::NonTerminal(name) => writeln!(f, "{}{}<{}>", prefix, connector, name)?,
            NodeLabel::Token(token) => writeln!(f, "{}{}{}", prefix, connector, token)?,
        }
        let child_prefix = format!("{}{}", prefix, extension);
        let count = self.children.len();
        for (i, child) in self.children.iter().enumerate() {
            child.write_tree(f, &child_prefix, i + 1 == count, false)?;
        }
        Ok(())
    }
}

impl fmt::Display for ParseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, "", true, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::token::TokenKind;

    fn tok(kind: TokenKind, text: &str, col: usize) -> Token {
        Token::new(kind, Span::new(1, col, 1, col + text.len()), text)
    }

    fn sample() -> ParseNode {
        ParseNode::branch("Assign", vec![
            ParseNode::leaf(tok(TokenKind::Identifier, "x", 1)),
            ParseNode::leaf(tok(TokenKind::AssignOperator, ":=", 3)),
            ParseNode::branch("Value", vec![ParseNode::leaf(tok(TokenKind::Number, "5", 6))]),
            ParseNode::branch("Tail", vec![]),
        ])
    }

    #[test]
    fn test_accessors() {
        let tree = sample();
        assert!(tree.is("Assign"));
        assert_eq!(tree.children[0].token().map(|t| t.lexeme.as_str()), Some("x"));
        assert!(tree.children[0].is_leaf());
        assert_eq!(tree.node_count(), 6);
        assert_eq!(tree.leaves().len(), 3);
    }

    #[test]
    fn test_span_covers_tokens() {
        let tree = sample();
        let span = tree.span();
        assert_eq!(span.start_column, 1);
        assert_eq!(span.end_column, 7);
        assert!(tree.children[3].span().is_dummy());
    }

    #[test]
    fn test_tree_rendering() {
        let rendered = sample().to_string();
        let expected = "\
<Assign>
├── IDENTIFIER(x)
├── ASSIGN_OPERATOR(:=)
├── <Value>
│   └── NUMBER(5)
└── <Tail>
";
        assert_eq!(rendered, expected);
    }
}
