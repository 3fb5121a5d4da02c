//! Token types for Pascal-S.
//!
//! Tokens are classified into coarse categories (the names grammar files use,
//! such as `KEYWORD` or `SEMICOLON`); the exact spelling lives in the lexeme.

use crate::utils::location::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A token in the source code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The token category
    pub kind: TokenKind,
    /// The source span
    pub span: Span,
    /// The lexeme; keywords and word operators are lower-cased
    pub lexeme: String,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, lexeme: impl Into<String>) -> Self {
        Self { kind, span, lexeme: lexeme.into() }
    }

    /// Create an end-of-input token at the given span.
    pub fn eof(span: Span) -> Self {
        Self::new(TokenKind::Eof, span, "")
    }

    /// Check if this is an EOF token.
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Check if this token is the given keyword.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.lexeme == word
    }

    /// Line of the first character.
    pub fn line(&self) -> usize {
        self.span.start_line
    }

    /// Column of the first character.
    pub fn column(&self) -> usize {
        self.span.start_column
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_eof() {
            write!(f, "EOF")
        } else {
            write!(f, "{}({})", self.kind, self.lexeme)
        }
    }
}

/// The category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Reserved word (`program`, `mulai`, `selain-itu`, ...)
    Keyword,
    /// User identifier
    Identifier,
    /// Integer or real literal
    Number,
    /// Quoted literal of length other than one
    StringLiteral,
    /// Quoted literal of exactly one character
    CharLiteral,
    /// `+ - * /` and the words `bagi`, `mod`
    ArithmeticOperator,
    /// `= <> < <= > >=`
    RelationalOperator,
    /// `dan`, `atau`, `tidak`
    LogicalOperator,
    /// `:=`
    AssignOperator,
    /// `..`
    RangeOperator,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `(`
    LParenthesis,
    /// `)`
    RParenthesis,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// End of input
    Eof,
}

impl TokenKind {
    /// Every category, in declaration order.
    pub const ALL: [TokenKind; 19] = [
        TokenKind::Keyword,
        TokenKind::Identifier,
        TokenKind::Number,
        TokenKind::StringLiteral,
        TokenKind::CharLiteral,
        TokenKind::ArithmeticOperator,
        TokenKind::RelationalOperator,
        TokenKind::LogicalOperator,
        TokenKind::AssignOperator,
        TokenKind::RangeOperator,
        TokenKind::Semicolon,
        TokenKind::Comma,
        TokenKind::Colon,
        TokenKind::Dot,
        TokenKind::LParenthesis,
        TokenKind::RParenthesis,
        TokenKind::LBracket,
        TokenKind::RBracket,
        TokenKind::Eof,
    ];

    /// The category name used in grammar files and token dumps.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Number => "NUMBER",
            TokenKind::StringLiteral => "STRING_LITERAL",
            TokenKind::CharLiteral => "CHAR_LITERAL",
            TokenKind::ArithmeticOperator => "ARITHMETIC_OPERATOR",
            TokenKind::RelationalOperator => "RELATIONAL_OPERATOR",
            TokenKind::LogicalOperator => "LOGICAL_OPERATOR",
            TokenKind::AssignOperator => "ASSIGN_OPERATOR",
            TokenKind::RangeOperator => "RANGE_OPERATOR",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Comma => "COMMA",
            TokenKind::Colon => "COLON",
            TokenKind::Dot => "DOT",
            TokenKind::LParenthesis => "LPARENTHESIS",
            TokenKind::RParenthesis => "RPARENTHESIS",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::Eof => "EOF",
        }
    }

    /// Look up a category by its grammar-file name.
    pub fn from_name(name: &str) -> Option<TokenKind> {
        TokenKind::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Check if tokens of this kind carry a literal value.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Number | TokenKind::StringLiteral | TokenKind::CharLiteral
        )
    }

    /// Check if this is an operator category.
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::ArithmeticOperator
                | TokenKind::RelationalOperator
                | TokenKind::LogicalOperator
                | TokenKind::AssignOperator
                | TokenKind::RangeOperator
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names_round_trip() {
        for kind in TokenKind::ALL {
            assert_eq!(TokenKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(TokenKind::from_name("KEYWORDS"), None);
        assert_eq!(TokenKind::from_name("keyword"), None);
    }

    #[test]
    fn test_token_display() {
        let tok = Token::new(TokenKind::AssignOperator, Span::new(1, 3, 1, 5), ":=");
        assert_eq!(tok.to_string(), "ASSIGN_OPERATOR(:=)");
        assert_eq!(Token::eof(Span::dummy()).to_string(), "EOF");
    }

    #[test]
    fn test_is_keyword() {
        let tok = Token::new(TokenKind::Keyword, Span::dummy(), "mulai");
        assert!(tok.is_keyword("mulai"));
        assert!(!tok.is_keyword("selesai"));
        let ident = Token::new(TokenKind::Identifier, Span::dummy(), "mulai");
        assert!(!ident.is_keyword("mulai"));
    }

    #[test]
    fn test_is_operator() {
        assert!(TokenKind::LogicalOperator.is_operator());
        assert!(TokenKind::RangeOperator.is_operator());
        assert!(!TokenKind::Semicolon.is_operator());
        assert!(TokenKind::CharLiteral.is_literal());
    }
}
