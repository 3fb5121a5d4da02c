//! Lexer for Pascal-S.
//!
//! The lexer converts source text into a stream of categorized tokens that
//! the grammar engine matches against. Keywords are case-insensitive and are
//! normalized to lower case; `selain-itu` and `turun-ke` are single tokens.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::location::{Span, SourceLocation};
use crate::utils::errors::{LexerError, LexerErrorKind};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;
use unicode_xid::UnicodeXID;

/// Reserved words and word operators, keyed by lower-case spelling.
static RESERVED: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let keywords = [
        "program", "variabel", "konstanta", "tipe", "prosedur", "fungsi",
        "mulai", "selesai", "jika", "maka", "selain-itu", "selama", "lakukan",
        "untuk", "ke", "turun-ke", "ulangi", "sampai", "kasus", "dari",
        "larik", "rekaman", "integer", "real", "boolean", "char", "true",
        "false",
    ];
    let mut table: HashMap<&'static str, TokenKind> =
        keywords.iter().map(|&k| (k, TokenKind::Keyword)).collect();
    table.insert("bagi", TokenKind::ArithmeticOperator);
    table.insert("mod", TokenKind::ArithmeticOperator);
    table.insert("dan", TokenKind::LogicalOperator);
    table.insert("atau", TokenKind::LogicalOperator);
    table.insert("tidak", TokenKind::LogicalOperator);
    table
});

/// Keywords spelled with a hyphen: (first word, remainder including hyphen).
const HYPHENATED: [(&str, &str); 2] = [("selain", "-itu"), ("turun", "-ke")];

/// Check whether a word is reserved (case-insensitively).
pub fn is_reserved(word: &str) -> bool {
    RESERVED.contains_key(word.to_ascii_lowercase().as_str())
}

/// A lexer for tokenizing source code.
pub struct Lexer<'a> {
    /// The source text
    source: &'a str,
    /// Character iterator
    chars: Peekable<Chars<'a>>,
    /// Current byte offset
    offset: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Start of current token
    token_start: SourceLocation,
    /// Whether we've hit EOF
    at_eof: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
            offset: 0,
            line: 1,
            column: 1,
            token_start: SourceLocation::start(),
            at_eof: false,
        }
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column, self.offset)
    }

    fn mark_token_start(&mut self) {
        self.token_start = self.current_location();
    }

    fn make_span(&self) -> Span {
        Span::from_locations(self.token_start, self.current_location())
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Peek at the next character (one ahead).
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    /// Consume and return the current character.
    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume the current character if it matches.
    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_is_digit(&mut self) -> bool {
        self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false)
    }

    /// Skip whitespace and the three comment forms: `{ }`, `(* *)`, `//`.
    fn skip_whitespace(&mut self) -> Result<(), LexerError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while self.peek().is_some() && self.peek() != Some('\n') {
                        self.advance();
                    }
                }
                Some('{') => {
                    self.mark_token_start();
                    self.advance();
                    loop {
                        match self.advance() {
                            Some('}') => break,
                            Some(_) => {}
                            None => {
                                return Err(self.make_error(
                                    "Unterminated comment: missing '}'",
                                    LexerErrorKind::UnterminatedComment,
                                ));
                            }
                        }
                    }
                }
                Some('(') if self.peek_next() == Some('*') => {
                    self.mark_token_start();
                    self.advance(); // (
                    self.advance(); // *
                    loop {
                        match self.advance() {
                            Some('*') if self.peek() == Some(')') => {
                                self.advance();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(self.make_error(
                                    "Unterminated comment: missing '*)'",
                                    LexerErrorKind::UnterminatedComment,
                                ));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        let span = self.make_span();
        let lexeme = &self.source[span.start_offset..span.end_offset];
        Token::new(kind, span, lexeme)
    }

    fn make_error(&self, message: &str, kind: LexerErrorKind) -> LexerError {
        LexerError {
            message: message.to_string(),
            span: self.make_span(),
            kind,
        }
    }

    /// Scan a number literal: digits, optional fraction, optional exponent.
    ///
    /// A `.` only starts a fraction when a digit follows, so `1..10` lexes as
    /// a range.
    fn scan_number(&mut self) -> Result<Token, LexerError> {
        while self.peek_is_digit() {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.advance();
            while self.peek_is_digit() {
                self.advance();
            }
        }

        if self.peek() == Some('e') || self.peek() == Some('E') {
            self.advance();
            if self.peek() == Some('+') || self.peek() == Some('-') {
                self.advance();
            }
            if !self.peek_is_digit() {
                return Err(self.make_error(
                    "Invalid real literal: exponent has no digits",
                    LexerErrorKind::InvalidNumber,
                ));
            }
            while self.peek_is_digit() {
                self.advance();
            }
        }

        Ok(self.make_token(TokenKind::Number))
    }

    /// Scan an identifier, keyword or word operator.
    fn scan_identifier(&mut self) -> Token {
        while self.peek().map(|c| c.is_xid_continue()).unwrap_or(false) {
            self.advance();
        }

        let mut lowered = self.source[self.token_start.offset..self.offset].to_ascii_lowercase();
        for (head, tail) in HYPHENATED {
            if lowered == head && self.continues_with(tail) {
                for _ in 0..tail.len() {
                    self.advance();
                }
                lowered.push_str(tail);
                break;
            }
        }

        match RESERVED.get(lowered.as_str()) {
            Some(&kind) => Token::new(kind, self.make_span(), lowered),
            None => self.make_token(TokenKind::Identifier),
        }
    }

    /// Check whether the unread input starts with `tail` (ASCII
    /// case-insensitive) as a complete word.
    fn continues_with(&self, tail: &str) -> bool {
        let rest = &self.source[self.offset..];
        match rest.get(..tail.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(tail) => !rest[tail.len()..]
                .chars()
                .next()
                .map(|c| c.is_xid_continue())
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Scan a quoted literal. The opening quote is already consumed; `''`
    /// inside the literal is an escaped quote.
    fn scan_string(&mut self) -> Result<Token, LexerError> {
        let mut length = 0usize;
        loop {
            match self.advance() {
                Some('\'') => {
                    if self.match_char('\'') {
                        length += 1;
                    } else {
                        break;
                    }
                }
                Some('\n') | None => {
                    return Err(self.make_error(
                        "Unterminated string literal",
                        LexerErrorKind::UnterminatedString,
                    ));
                }
                Some(_) => length += 1,
            }
        }

        if length == 1 {
            Ok(self.make_token(TokenKind::CharLiteral))
        } else {
            Ok(self.make_token(TokenKind::StringLiteral))
        }
    }

    /// Scan the next token.
    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        self.skip_whitespace()?;
        self.mark_token_start();

        let c = match self.advance() {
            Some(c) => c,
            None => {
                self.at_eof = true;
                return Ok(self.make_token(TokenKind::Eof));
            }
        };

        match c {
            ';' => Ok(self.make_token(TokenKind::Semicolon)),
            ',' => Ok(self.make_token(TokenKind::Comma)),
            '(' => Ok(self.make_token(TokenKind::LParenthesis)),
            ')' => Ok(self.make_token(TokenKind::RParenthesis)),
            '[' => Ok(self.make_token(TokenKind::LBracket)),
            ']' => Ok(self.make_token(TokenKind::RBracket)),

            ':' => {
                if self.match_char('=') {
                    Ok(self.make_token(TokenKind::AssignOperator))
                } else {
                    Ok(self.make_token(TokenKind::Colon))
                }
            }
            '.' => {
                if self.match_char('.') {
                    Ok(self.make_token(TokenKind::RangeOperator))
                } else {
                    Ok(self.make_token(TokenKind::Dot))
                }
            }

            '+' | '-' | '*' | '/' => Ok(self.make_token(TokenKind::ArithmeticOperator)),

            '=' => Ok(self.make_token(TokenKind::RelationalOperator)),
            '<' => {
                if !self.match_char('=') {
                    self.match_char('>');
                }
                Ok(self.make_token(TokenKind::RelationalOperator))
            }
            '>' => {
                self.match_char('=');
                Ok(self.make_token(TokenKind::RelationalOperator))
            }

            '\'' => self.scan_string(),

            c if c.is_ascii_digit() => self.scan_number(),

            c if c.is_xid_start() || c == '_' => Ok(self.scan_identifier()),

            _ => Err(self.make_error(
                &format!("Unexpected character: '{}'", c),
                LexerErrorKind::UnexpectedChar,
            )),
        }
    }

    /// Collect all tokens into a vector, ending with an EOF token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        log::debug!("lexed {} tokens", tokens.len());
        Ok(tokens)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LexerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.at_eof {
            None
        } else {
            let result = self.next_token();
            if result.is_err() {
                self.at_eof = true;
            }
            Some(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap()
    }

    fn token_kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|t| t.kind).collect()
    }

    fn lexemes(source: &str) -> Vec<String> {
        lex(source).into_iter().map(|t| t.lexeme).collect()
    }

    #[test]
    fn test_empty() {
        let tokens = lex("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let tokens = lex("Program MULAI selesai");
        assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Keyword));
        assert_eq!(tokens[0].lexeme, "program");
        assert_eq!(tokens[1].lexeme, "mulai");
    }

    #[test]
    fn test_hyphenated_keywords() {
        let tokens = lex("selain-itu turun-ke Selain-Itu");
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[0].lexeme, "selain-itu");
        assert_eq!(tokens[1].lexeme, "turun-ke");
        assert_eq!(tokens[2].lexeme, "selain-itu");
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_hyphen_without_keyword_tail() {
        // `turun-kecil` is `turun - kecil`, not the keyword
        let kinds = token_kinds("turun-kecil");
        assert_eq!(kinds, vec![
            TokenKind::Identifier,
            TokenKind::ArithmeticOperator,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_word_operators() {
        let kinds = token_kinds("a bagi b mod c dan tidak d atau e");
        assert_eq!(kinds[1], TokenKind::ArithmeticOperator);
        assert_eq!(kinds[3], TokenKind::ArithmeticOperator);
        assert_eq!(kinds[5], TokenKind::LogicalOperator);
        assert_eq!(kinds[6], TokenKind::LogicalOperator);
        assert_eq!(kinds[8], TokenKind::LogicalOperator);
    }

    #[test]
    fn test_numbers_and_ranges() {
        let tokens = lex("123 45.67 1e10 3.14E-2 1..10");
        assert!(tokens[..4].iter().all(|t| t.kind == TokenKind::Number));
        assert_eq!(tokens[1].lexeme, "45.67");
        assert_eq!(tokens[3].lexeme, "3.14E-2");
        assert_eq!(tokens[4].lexeme, "1");
        assert_eq!(tokens[5].kind, TokenKind::RangeOperator);
        assert_eq!(tokens[6].lexeme, "10");
    }

    #[test]
    fn test_bad_exponent() {
        let err = Lexer::new("1e+").tokenize().unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::InvalidNumber);
    }

    #[test]
    fn test_operators_and_punctuation() {
        assert_eq!(
            lexemes(":= : .. . <= <> < >= > = ( ) [ ] ; ,"),
            vec![":=", ":", "..", ".", "<=", "<>", "<", ">=", ">", "=", "(", ")", "[", "]", ";", ",", ""]
        );
        let kinds = token_kinds(":= .. <>");
        assert_eq!(kinds, vec![
            TokenKind::AssignOperator,
            TokenKind::RangeOperator,
            TokenKind::RelationalOperator,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_string_and_char_literals() {
        let tokens = lex("'a' 'halo dunia' '''' ''");
        assert_eq!(tokens[0].kind, TokenKind::CharLiteral);
        assert_eq!(tokens[0].lexeme, "'a'");
        assert_eq!(tokens[1].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[2].kind, TokenKind::CharLiteral);
        assert_eq!(tokens[3].kind, TokenKind::StringLiteral);
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("x := 'abc\n").tokenize().unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::UnterminatedString);
    }

    #[test]
    fn test_comments() {
        assert_eq!(lexemes("a { kurung } b (* bintang *) c // baris\nd"), vec!["a", "b", "c", "d", ""]);
    }

    #[test]
    fn test_unterminated_comment() {
        let err = Lexer::new("mulai { lupa ditutup").tokenize().unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::UnterminatedComment);
        assert_eq!(err.span.start_column, 7);
    }

    #[test]
    fn test_unexpected_char() {
        let err = Lexer::new("x := 1 # 2").tokenize().unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::UnexpectedChar);
        assert!(err.message.contains('#'));
    }

    #[test]
    fn test_location_tracking() {
        let tokens = lex("mulai\n  x := 1\nselesai");
        assert_eq!((tokens[0].line(), tokens[0].column()), (1, 1));
        assert_eq!((tokens[1].line(), tokens[1].column()), (2, 3));
        assert_eq!((tokens[2].line(), tokens[2].column()), (2, 5));
        assert_eq!(tokens[4].line(), 3);
    }

    #[test]
    fn test_complete_program() {
        let source = r#"
            program Hitung;
            variabel
                a: larik [1..10] dari integer;
                i: integer;
            mulai
                untuk i := 1 ke 10 lakukan
                    a[i] := i * i;
                writeln('selesai')
            selesai.
        "#;
        let tokens = lex(source);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        assert!(tokens.iter().any(|t| t.is_keyword("larik")));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::StringLiteral));
    }

    #[test]
    fn test_reserved_lookup() {
        assert!(is_reserved("Mulai"));
        assert!(is_reserved("selain-itu"));
        assert!(is_reserved("dan"));
        assert!(!is_reserved("writeln"));
    }
}
