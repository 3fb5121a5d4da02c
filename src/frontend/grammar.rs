//! Grammar model: symbols, alternatives and the production table.
//!
//! A [`Grammar`] maps each nonterminal to an ordered list of alternatives;
//! each alternative is an ordered list of [`Symbol`]s. The parsing engine
//! interprets this table directly, so a grammar is plain data that can be
//! built in code or loaded from the line-oriented text format:
//!
//! ```text
//! # comment
//! <ElsePart> ::= KEYWORD(selain-itu) <Statement>
//!     | EPSILON
//! <RelationalOperator> ::= RELATIONAL_OPERATOR
//! ```
//!
//! `<Name>` is a nonterminal, `CATEGORY(text)` an exact terminal, a bare
//! `CATEGORY` a category terminal, and `EPSILON` the empty alternative. The
//! first rule's left-hand side is the start symbol.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::errors::GrammarError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Source of the built-in Pascal-S grammar.
pub const PASCAL_S_GRAMMAR: &str = include_str!("pascal_s.bnf");

/// One element of a production alternative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    /// Reference to another rule
    NonTerminal(String),
    /// Token with this category and exactly this lexeme
    Exact(TokenKind, String),
    /// Any token of this category
    Category(TokenKind),
    /// Matches without consuming input
    Empty,
}

impl Symbol {
    /// Create a nonterminal reference.
    pub fn nonterminal(name: impl Into<String>) -> Self {
        Symbol::NonTerminal(name.into())
    }

    /// Create an exact terminal.
    pub fn exact(kind: TokenKind, text: impl Into<String>) -> Self {
        Symbol::Exact(kind, text.into())
    }

    /// Create a category terminal.
    pub fn category(kind: TokenKind) -> Self {
        Symbol::Category(kind)
    }

    /// Check whether a token satisfies this terminal. Nonterminals and
    /// `Empty` never match a token directly.
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            Symbol::Exact(kind, text) => token.kind == *kind && token.lexeme == *text,
            Symbol::Category(kind) => token.kind == *kind,
            Symbol::NonTerminal(_) | Symbol::Empty => false,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::NonTerminal(name) => write!(f, "<{}>", name),
            Symbol::Exact(kind, text) => write!(f, "{}({})", kind, text),
            Symbol::Category(kind) => write!(f, "{}", kind),
            Symbol::Empty => write!(f, "EPSILON"),
        }
    }
}

/// An ordered sequence of symbols.
pub type Alternative = Vec<Symbol>;

/// A context-free production table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Grammar {
    /// Alternatives for each nonterminal
    rules: HashMap<String, Vec<Alternative>>,
    /// Nonterminals in definition order
    order: Vec<String>,
}

impl Grammar {
    /// Create an empty grammar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the built-in Pascal-S grammar.
    pub fn pascal_s() -> Result<Self, GrammarError> {
        Self::from_bnf(PASCAL_S_GRAMMAR)
    }

    /// Append alternatives to a rule, creating it if needed.
    pub fn add_rule(&mut self, name: impl Into<String>, alternatives: Vec<Alternative>) {
        let name = name.into();
        match self.rules.get_mut(&name) {
            Some(existing) => existing.extend(alternatives),
            None => {
                self.order.push(name.clone());
                self.rules.insert(name, alternatives);
            }
        }
    }

    /// Builder form of [`Grammar::add_rule`].
    pub fn with_rule(mut self, name: impl Into<String>, alternatives: Vec<Alternative>) -> Self {
        self.add_rule(name, alternatives);
        self
    }

    /// The start symbol: the first rule defined.
    pub fn start_symbol(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }

    /// Alternatives of a nonterminal, in trial order.
    pub fn alternatives(&self, name: &str) -> Option<&[Alternative]> {
        self.rules.get(name).map(Vec::as_slice)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the grammar has no rules.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Eagerly check that every referenced nonterminal is defined and no
    /// rule is empty. The engine performs the same checks lazily.
    pub fn validate(&self) -> Result<(), GrammarError> {
        if let Some(start) = self.start_symbol() {
            if !self.rules.contains_key(start) {
                return Err(GrammarError::UndefinedNonTerminal { name: start.to_string() });
            }
        }
        for name in &self.order {
            let alternatives = &self.rules[name];
            if alternatives.is_empty() {
                return Err(GrammarError::EmptyProduction { name: name.clone() });
            }
            for symbol in alternatives.iter().flatten() {
                if let Symbol::NonTerminal(target) = symbol {
                    if !self.rules.contains_key(target) {
                        return Err(GrammarError::UndefinedNonTerminal { name: target.clone() });
                    }
                }
            }
        }
        Ok(())
    }

    /// Parse a grammar from its text form.
    pub fn from_bnf(text: &str) -> Result<Self, GrammarError> {
        let mut grammar = Grammar::new();
        let mut current: Option<String> = None;

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix('|') {
                let name = current.clone().ok_or_else(|| GrammarError::Malformed {
                    line,
                    message: "continuation line before any rule".to_string(),
                })?;
                grammar.add_rule(name, parse_alternatives(rest, line)?);
                continue;
            }

            let (lhs, rhs) = trimmed.split_once("::=").ok_or_else(|| GrammarError::Malformed {
                line,
                message: "expected `<Name> ::= ...`".to_string(),
            })?;
            let name = match parse_symbol(lhs.trim(), line)? {
                Symbol::NonTerminal(name) => name,
                other => {
                    return Err(GrammarError::Malformed {
                        line,
                        message: format!("left-hand side must be a nonterminal, found {}", other),
                    });
                }
            };
            grammar.add_rule(name.clone(), parse_alternatives(rhs, line)?);
            current = Some(name);
        }

        if grammar.is_empty() {
            return Err(GrammarError::Malformed { line: 0, message: "grammar defines no rules".to_string() });
        }
        log::debug!("loaded grammar with {} rules", grammar.len());
        Ok(grammar)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in &self.order {
            for (i, alternative) in self.rules[name].iter().enumerate() {
                let body: Vec<String> = alternative.iter().map(ToString::to_string).collect();
                if i == 0 {
                    writeln!(f, "<{}> ::= {}", name, body.join(" "))?;
                } else {
                    writeln!(f, "    | {}", body.join(" "))?;
                }
            }
        }
        Ok(())
    }
}

fn parse_alternatives(text: &str, line: usize) -> Result<Vec<Alternative>, GrammarError> {
    let mut alternatives = Vec::new();
    let mut current = Vec::new();
    for word in text.split_whitespace() {
        if word == "|" {
            alternatives.push(finish_alternative(std::mem::take(&mut current), line)?);
        } else {
            current.push(parse_symbol(word, line)?);
        }
    }
    alternatives.push(finish_alternative(current, line)?);
    Ok(alternatives)
}

fn finish_alternative(symbols: Alternative, line: usize) -> Result<Alternative, GrammarError> {
    if symbols.is_empty() {
        return Err(GrammarError::Malformed {
            line,
            message: "empty alternative (write EPSILON)".to_string(),
        });
    }
    Ok(symbols)
}

fn parse_symbol(word: &str, line: usize) -> Result<Symbol, GrammarError> {
    if word == "EPSILON" || word == "ε" {
        return Ok(Symbol::Empty);
    }
    if let Some(name) = word.strip_prefix('<').and_then(|w| w.strip_suffix('>')) {
        if name.is_empty() {
            return Err(GrammarError::Malformed { line, message: "empty nonterminal name".to_string() });
        }
        return Ok(Symbol::NonTerminal(name.to_string()));
    }

    let malformed = |message: String| GrammarError::Malformed { line, message };
    match word.find('(') {
        Some(open) if word.ends_with(')') && word.len() > open + 2 => {
            let category = &word[..open];
            let text = &word[open + 1..word.len() - 1];
            let kind = TokenKind::from_name(category)
                .ok_or_else(|| malformed(format!("unknown token category `{}`", category)))?;
            Ok(Symbol::Exact(kind, text.to_string()))
        }
        Some(_) => Err(malformed(format!("malformed exact terminal `{}`", word))),
        None => TokenKind::from_name(word)
            .map(Symbol::Category)
            .ok_or_else(|| malformed(format!("unrecognized symbol `{}`", word))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::location::Span;

    fn token(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, Span::dummy(), text)
    }

    #[test]
    fn test_exact_and_category_matching() {
        let begin = token(TokenKind::Keyword, "begin");
        assert!(Symbol::exact(TokenKind::Keyword, "begin").matches(&begin));
        assert!(!Symbol::exact(TokenKind::Keyword, "end").matches(&begin));
        assert!(Symbol::category(TokenKind::Keyword).matches(&begin));
        assert!(!Symbol::category(TokenKind::Identifier).matches(&begin));
        assert!(!Symbol::exact(TokenKind::Identifier, "begin").matches(&begin));
        assert!(!Symbol::Empty.matches(&begin));
        assert!(!Symbol::nonterminal("Begin").matches(&begin));
    }

    #[test]
    fn test_symbol_display() {
        assert_eq!(Symbol::nonterminal("Factor").to_string(), "<Factor>");
        assert_eq!(Symbol::exact(TokenKind::Semicolon, ";").to_string(), "SEMICOLON(;)");
        assert_eq!(Symbol::category(TokenKind::Identifier).to_string(), "IDENTIFIER");
        assert_eq!(Symbol::Empty.to_string(), "EPSILON");
    }

    #[test]
    fn test_from_bnf() {
        let grammar = Grammar::from_bnf(
            "# sample\n\
             <S> ::= <A> SEMICOLON(;)\n\
             <A> ::= IDENTIFIER | NUMBER\n\
             \x20   | LPARENTHESIS(() <A> RPARENTHESIS())\n\
             \x20   | EPSILON\n",
        )
        .unwrap();
        assert_eq!(grammar.start_symbol(), Some("S"));
        let a = grammar.alternatives("A").unwrap();
        assert_eq!(a.len(), 4);
        assert_eq!(a[2][0], Symbol::exact(TokenKind::LParenthesis, "("));
        assert_eq!(a[2][2], Symbol::exact(TokenKind::RParenthesis, ")"));
        assert_eq!(a[3], vec![Symbol::Empty]);
        grammar.validate().unwrap();
    }

    #[test]
    fn test_from_bnf_errors() {
        let err = Grammar::from_bnf("<S> ::= FOO").unwrap_err();
        assert!(matches!(err, GrammarError::Malformed { line: 1, .. }));

        let err = Grammar::from_bnf("<S> ::= IDENTIFIER |").unwrap_err();
        assert!(matches!(err, GrammarError::Malformed { .. }));

        let err = Grammar::from_bnf("| IDENTIFIER").unwrap_err();
        assert!(matches!(err, GrammarError::Malformed { line: 1, .. }));

        let err = Grammar::from_bnf("S ::= IDENTIFIER").unwrap_err();
        assert!(matches!(err, GrammarError::Malformed { .. }));

        assert!(Grammar::from_bnf("# nothing\n").is_err());
    }

    #[test]
    fn test_validate_reports_undefined() {
        let grammar = Grammar::new()
            .with_rule("S", vec![vec![Symbol::nonterminal("Missing")]]);
        assert_eq!(
            grammar.validate(),
            Err(GrammarError::UndefinedNonTerminal { name: "Missing".to_string() })
        );
    }

    #[test]
    fn test_builtin_grammar_is_complete() {
        let grammar = Grammar::pascal_s().unwrap();
        assert_eq!(grammar.start_symbol(), Some("Program"));
        grammar.validate().unwrap();
        assert!(grammar.alternatives("ElsePart").is_some());
        let direction = grammar.alternatives("ForDirection").unwrap();
        assert_eq!(direction[1], vec![Symbol::exact(TokenKind::Keyword, "turun-ke")]);
    }

    #[test]
    fn test_display_reloads() {
        let grammar = Grammar::pascal_s().unwrap();
        let reloaded = Grammar::from_bnf(&grammar.to_string()).unwrap();
        assert_eq!(reloaded.len(), grammar.len());
        assert_eq!(reloaded.alternatives("Factor"), grammar.alternatives("Factor"));
    }
}
