//! Grammar-driven backtracking parser.
//!
//! The [`Parser`] interprets a [`Grammar`] directly: each nonterminal tries
//! its alternatives in order from the same saved cursor, and the first
//! alternative whose symbols all match wins. There is no lookahead table and
//! no memoization, so exponential behavior is possible on pathological
//! grammars; the Pascal-S grammar is written so that cheap failures come
//! early.
//!
//! Syntax errors are reported from the farthest point any terminal
//! comparison reached, which is almost always where the user's mistake is,
//! rather than from wherever the last backtrack happened to give up.

use crate::frontend::grammar::{Grammar, Symbol};
use crate::frontend::parse_tree::ParseNode;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::errors::{GrammarError, ParseError, ParseErrorKind, PascalResult};
use crate::utils::location::Span;

/// Default limit on nested nonterminal expansions.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// The farthest terminal mismatch seen during a parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FarthestFailure {
    /// Token index of the mismatch; `None` until the first one
    pub position: Option<usize>,
    /// Terminals that would have been accepted there, in first-seen order
    pub expected: Vec<Symbol>,
    /// Token actually found there
    pub found: Option<Token>,
}

impl FarthestFailure {
    /// Record a terminal mismatch.
    ///
    /// A later position replaces the record, the same position adds to the
    /// expected set, an earlier position is ignored.
    pub fn record(&mut self, position: usize, expected: &Symbol, found: &Token) {
        match self.position {
            Some(current) if position < current => {}
            Some(current) if position == current => {
                if !self.expected.contains(expected) {
                    self.expected.push(expected.clone());
                }
            }
            _ => {
                self.position = Some(position);
                self.expected = vec![expected.clone()];
                self.found = Some(found.clone());
            }
        }
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        *self = FarthestFailure::default();
    }

    /// Build the user-facing syntax error.
    pub fn to_error(&self, start: &str) -> ParseError {
        let (Some(position), Some(found)) = (self.position, self.found.as_ref()) else {
            return ParseError {
                message: format!("input does not match <{}>", start),
                span: Span::dummy(),
                kind: ParseErrorKind::UnexpectedToken,
                position: 0,
                expected: Vec::new(),
                found: None,
            };
        };

        let expected: Vec<String> = self.expected.iter().map(ToString::to_string).collect();
        let wanted = match expected.as_slice() {
            [single] => format!("expected `{}`", single),
            many => format!("expected one of {{{}}}", many.join(", ")),
        };
        let (kind, what) = if found.is_eof() {
            (ParseErrorKind::UnexpectedEof, "unexpected end of input".to_string())
        } else {
            (ParseErrorKind::UnexpectedToken, format!("unexpected token `{}`", found))
        };

        ParseError {
            message: format!("{} at line {} col {}, {}", what, found.line(), found.column(), wanted),
            span: found.span,
            kind,
            position,
            expected,
            found: Some(found.to_string()),
        }
    }
}

/// Outcome of matching one symbol.
enum Match {
    /// Matched and produced a node
    Node(ParseNode),
    /// Matched epsilon
    Empty,
    /// Did not match; cursor restored by the caller
    Failed,
}

/// Parser state for one parse of one token stream.
pub struct Parser<'g, 't> {
    grammar: &'g Grammar,
    tokens: &'t [Token],
    /// Index of the next token to match
    cursor: usize,
    failure: FarthestFailure,
    depth: usize,
    max_depth: usize,
    /// Stands in for every position past the end of `tokens`
    eof: Token,
}

impl<'g, 't> Parser<'g, 't> {
    /// Create a parser over a token stream. The stream may or may not end
    /// with an EOF token.
    pub fn new(grammar: &'g Grammar, tokens: &'t [Token]) -> Self {
        let eof_span = match tokens.last() {
            Some(last) => Span::from_locations(last.span.end(), last.span.end()),
            None => Span::new(1, 1, 1, 1),
        };
        Self {
            grammar,
            tokens,
            cursor: 0,
            failure: FarthestFailure::default(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            eof: Token::eof(eof_span),
        }
    }

    /// Set the limit on nested nonterminal expansions.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Current cursor position (token index).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The farthest-failure record of the last parse.
    pub fn farthest_failure(&self) -> &FarthestFailure {
        &self.failure
    }

    /// Parse the whole token stream as `start`.
    ///
    /// Succeeds only if `start` matches and every token up to end-of-input
    /// is consumed.
    pub fn parse(&mut self, start: &str) -> PascalResult<ParseNode> {
        let tree = match self.parse_partial(start)? {
            Some(tree) => tree,
            None => return Err(self.failure.to_error(start).into()),
        };
        if !self.at_end() {
            return Err(self.trailing_error().into());
        }
        log::debug!("parsed <{}> into {} nodes", start, tree.node_count());
        Ok(tree)
    }

    /// Match `start` from the beginning of the stream without requiring all
    /// input to be consumed. `Ok(None)` means no alternative matched.
    pub fn parse_partial(&mut self, start: &str) -> Result<Option<ParseNode>, GrammarError> {
        self.cursor = 0;
        self.depth = 0;
        self.failure.clear();
        self.match_nonterminal(start)
    }

    fn at_end(&self) -> bool {
        self.tokens.get(self.cursor).map_or(true, Token::is_eof)
    }

    fn trailing_error(&self) -> ParseError {
        let found = self.tokens.get(self.cursor).unwrap_or(&self.eof);
        ParseError {
            message: format!(
                "unexpected token `{}` at line {} col {}, expected end of input",
                found,
                found.line(),
                found.column()
            ),
            span: found.span,
            kind: ParseErrorKind::TrailingInput,
            position: self.cursor,
            expected: vec![TokenKind::Eof.name().to_string()],
            found: Some(found.to_string()),
        }
    }

    fn match_nonterminal(&mut self, name: &str) -> Result<Option<ParseNode>, GrammarError> {
        let grammar = self.grammar;
        let alternatives = grammar
            .alternatives(name)
            .ok_or_else(|| GrammarError::UndefinedNonTerminal { name: name.to_string() })?;
        if alternatives.is_empty() {
            return Err(GrammarError::EmptyProduction { name: name.to_string() });
        }
        if self.depth >= self.max_depth {
            return Err(GrammarError::RecursionLimit {
                nonterminal: name.to_string(),
                limit: self.max_depth,
            });
        }

        self.depth += 1;
        let entry = self.cursor;
        let mut result = None;
        for alternative in alternatives {
            self.cursor = entry;
            if let Some(children) = self.match_alternative(alternative)? {
                result = Some(ParseNode::branch(name, children));
                break;
            }
        }
        if result.is_none() {
            self.cursor = entry;
        }
        self.depth -= 1;
        Ok(result)
    }

    fn match_alternative(&mut self, alternative: &[Symbol]) -> Result<Option<Vec<ParseNode>>, GrammarError> {
        let mut children = Vec::with_capacity(alternative.len());
        for symbol in alternative {
            match self.match_symbol(symbol)? {
                Match::Node(node) => children.push(node),
                Match::Empty => {}
                Match::Failed => return Ok(None),
            }
        }
        Ok(Some(children))
    }

    fn match_symbol(&mut self, symbol: &Symbol) -> Result<Match, GrammarError> {
        match symbol {
            Symbol::NonTerminal(name) => Ok(match self.match_nonterminal(name)? {
                Some(node) => Match::Node(node),
                None => Match::Failed,
            }),
            Symbol::Empty => Ok(Match::Empty),
            Symbol::Exact(..) | Symbol::Category(_) => Ok(self.match_terminal(symbol)),
        }
    }

    fn match_terminal(&mut self, terminal: &Symbol) -> Match {
        let token = self.tokens.get(self.cursor).unwrap_or(&self.eof);
        if terminal.matches(token) {
            let leaf = ParseNode::leaf(token.clone());
            self.cursor += 1;
            Match::Node(leaf)
        } else {
            log::trace!("expected {} at {}, found {}", terminal, self.cursor, token);
            self.failure.record(self.cursor, terminal, token);
            Match::Failed
        }
    }
}

/// Parse a token stream against a grammar starting from `start`.
pub fn parse(start: &str, grammar: &Grammar, tokens: &[Token]) -> PascalResult<ParseNode> {
    Parser::new(grammar, tokens).parse(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::utils::errors::PascalError;

    fn ident(text: &str, col: usize) -> Token {
        Token::new(TokenKind::Identifier, Span::new(1, col, 1, col + text.len()), text)
    }

    fn idents(words: &[&str]) -> Vec<Token> {
        let mut col = 1;
        words
            .iter()
            .map(|w| {
                let t = ident(w, col);
                col += w.len() + 1;
                t
            })
            .collect()
    }

    fn exact(text: &str) -> Symbol {
        Symbol::exact(TokenKind::Identifier, text)
    }

    fn nt(name: &str) -> Symbol {
        Symbol::nonterminal(name)
    }

    #[test]
    fn test_backtracking_restores_cursor() {
        let grammar = Grammar::new().with_rule("A", vec![
            vec![exact("x"), exact("y"), exact("z"), exact("q")],
            vec![exact("x"), exact("y")],
        ]);
        let tokens = idents(&["x", "y", "z", "w"]);
        let mut parser = Parser::new(&grammar, &tokens);
        let tree = parser.parse_partial("A").unwrap().unwrap();
        assert_eq!(tree.children.len(), 2);
        assert_eq!(parser.cursor(), 2);
    }

    #[test]
    fn test_failed_nonterminal_restores_entry_cursor() {
        let grammar = Grammar::new()
            .with_rule("S", vec![vec![nt("A"), exact("c")], vec![exact("a"), exact("b"), exact("d")]])
            .with_rule("A", vec![vec![exact("a"), exact("b")]]);
        let tokens = idents(&["a", "b", "d"]);
        let tree = parse("S", &grammar, &tokens).unwrap();
        assert_eq!(tree.children.len(), 3);
        assert!(tree.children.iter().all(ParseNode::is_leaf));
    }

    #[test]
    fn test_epsilon_gives_childless_node() {
        let grammar = Grammar::new().with_rule("A", vec![vec![Symbol::Empty]]);
        let tree = parse("A", &grammar, &[]).unwrap();
        assert!(tree.is("A"));
        assert!(tree.children.is_empty());
    }

    #[test]
    fn test_first_alternative_wins() {
        let grammar = Grammar::new().with_rule("A", vec![
            vec![Symbol::category(TokenKind::Identifier)],
            vec![exact("x")],
        ]);
        let tokens = idents(&["x"]);
        let tree = parse("A", &grammar, &tokens).unwrap();
        assert_eq!(tree.children[0].token().map(|t| t.lexeme.as_str()), Some("x"));
    }

    #[test]
    fn test_farthest_failure_unions_same_position() {
        let mut failure = FarthestFailure::default();
        let found = ident("w", 5);
        failure.record(2, &exact("X"), &found);
        failure.record(2, &exact("Y"), &found);
        failure.record(2, &exact("X"), &found);
        assert_eq!(failure.position, Some(2));
        assert_eq!(failure.expected, vec![exact("X"), exact("Y")]);
    }

    #[test]
    fn test_farthest_failure_replaces_on_later_position() {
        let mut failure = FarthestFailure::default();
        failure.record(2, &exact("X"), &ident("a", 1));
        failure.record(5, &exact("Y"), &ident("b", 9));
        failure.record(3, &exact("Z"), &ident("c", 4));
        assert_eq!(failure.position, Some(5));
        assert_eq!(failure.expected, vec![exact("Y")]);
        assert_eq!(failure.found.as_ref().map(|t| t.lexeme.as_str()), Some("b"));
    }

    #[test]
    fn test_alternatives_failing_at_same_token_are_merged() {
        let grammar = Grammar::new().with_rule("S", vec![
            vec![exact("a"), exact("b"), exact("X")],
            vec![exact("a"), exact("b"), exact("Y")],
        ]);
        let tokens = idents(&["a", "b", "c"]);
        let mut parser = Parser::new(&grammar, &tokens);
        let err = parser.parse("S").unwrap_err();
        assert_eq!(parser.farthest_failure().position, Some(2));
        assert_eq!(parser.farthest_failure().expected, vec![exact("X"), exact("Y")]);
        let PascalError::Parse(err) = err else { panic!("expected syntax error") };
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(
            err.message,
            "unexpected token `IDENTIFIER(c)` at line 1 col 5, expected one of {IDENTIFIER(X), IDENTIFIER(Y)}"
        );
    }

    #[test]
    fn test_trailing_tokens_are_rejected() {
        let grammar = Grammar::new().with_rule("S", vec![vec![exact("a")]]);
        let tokens = idents(&["a", "b"]);
        let err = parse("S", &grammar, &tokens).unwrap_err();
        let PascalError::Parse(err) = err else { panic!("expected syntax error") };
        assert_eq!(err.kind, ParseErrorKind::TrailingInput);
        assert_eq!(err.position, 1);
        assert!(err.message.contains("expected end of input"));
    }

    #[test]
    fn test_missing_input_reports_eof() {
        let grammar = Grammar::new().with_rule("S", vec![vec![exact("a"), exact("b")]]);
        let tokens = idents(&["a"]);
        let err = parse("S", &grammar, &tokens).unwrap_err();
        let PascalError::Parse(err) = err else { panic!("expected syntax error") };
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
        assert_eq!(err.position, 1);
        assert!(err.message.ends_with("expected `IDENTIFIER(b)`"));
    }

    #[test]
    fn test_undefined_nonterminal_is_fatal() {
        let grammar = Grammar::new()
            .with_rule("S", vec![vec![exact("a")], vec![nt("Ghost")]]);
        // first alternative succeeds, so the missing rule is never reached
        assert!(parse("S", &grammar, &idents(&["a"])).is_ok());

        let err = parse("S", &grammar, &idents(&["b"])).unwrap_err();
        assert!(matches!(
            err,
            PascalError::Grammar(GrammarError::UndefinedNonTerminal { ref name }) if name == "Ghost"
        ));
    }

    #[test]
    fn test_left_recursion_hits_depth_limit() {
        let grammar = Grammar::new().with_rule("E", vec![
            vec![nt("E"), exact("plus"), exact("n")],
            vec![exact("n")],
        ]);
        let tokens = idents(&["n"]);
        let err = Parser::new(&grammar, &tokens).with_max_depth(64).parse("E").unwrap_err();
        assert!(matches!(
            err,
            PascalError::Grammar(GrammarError::RecursionLimit { limit: 64, .. })
        ));
    }

    #[test]
    fn test_pascal_s_program() {
        let grammar = Grammar::pascal_s().unwrap();
        let tokens = Lexer::new("program P; variabel x: integer; mulai x := 5 + 3 selesai.")
            .tokenize()
            .unwrap();
        let tree = parse("Program", &grammar, &tokens).unwrap();
        assert!(tree.is("Program"));
        assert_eq!(tree.leaves().len(), tokens.len() - 1);
    }

    #[test]
    fn test_pascal_s_syntax_error_points_at_mistake() {
        let grammar = Grammar::pascal_s().unwrap();
        let tokens = Lexer::new("program P;\nmulai\n  x := 5 +\nselesai.").tokenize().unwrap();
        let err = parse("Program", &grammar, &tokens).unwrap_err();
        let PascalError::Parse(err) = err else { panic!("expected syntax error") };
        assert_eq!(err.found.as_deref(), Some("KEYWORD(selesai)"));
        assert_eq!(err.span.start_line, 4);
    }
}
