//! Go tokenizer
//!
//! Covers as much of the Go lexical grammar as test discovery needs:
//! identifiers, literals, comments and punctuation. Operators are
//! emitted one character at a time except for `:=` and `...`, which the
//! parser matches on. Automatic semicolon insertion is not modelled;
//! nothing downstream depends on statement boundaries.
//!
//! Bracket balance is checked while lexing so later stages can assume
//! every `(`, `[` and `{` has a partner.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::SourceError;

// ============================================================================
// TOKEN TYPES
// ============================================================================

/// Token kinds produced by [`Lexer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword
    Ident(String),
    /// Numeric literal (integer, float or imaginary)
    Number,
    /// String literal including its quotes
    String(String),
    /// Rune literal
    Rune,
    /// `:=`
    Define,
    /// `...`
    Ellipsis,
    /// Any other single punctuation character
    Punct(char),
}

/// A token together with its location in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What was scanned
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub offset: usize,
    /// 1-based line
    pub line: usize,
    /// 1-based byte column
    pub column: usize,
}

impl Token {
    /// The identifier text, if this is an identifier
    #[must_use]
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Whether this is the identifier (or keyword) `name`
    #[must_use]
    pub fn is_ident(&self, name: &str) -> bool {
        self.ident() == Some(name)
    }

    /// Whether this is the punctuation character `c`
    #[must_use]
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    /// Whether this opens a bracketed group
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.kind, TokenKind::Punct('(' | '[' | '{'))
    }

    /// Whether this closes a bracketed group
    #[must_use]
    pub fn is_close(&self) -> bool {
        matches!(self.kind, TokenKind::Punct(')' | ']' | '}'))
    }
}

// ============================================================================
// LEXER
// ============================================================================

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Tokenizer for one Go source file
pub struct Lexer<'a> {
    file: &'a str,
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    line_start: usize,
    /// Open brackets awaiting their partner: (char, line, column)
    brackets: Vec<(char, usize, usize)>,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer for `source`; `file` is used in error messages only.
    #[must_use]
    pub fn new(file: &'a str, source: &'a str) -> Self {
        let mut chars = source.char_indices().peekable();
        let mut line_start = 0;
        // a leading byte order mark is not part of the source text
        if source.starts_with(BYTE_ORDER_MARK) {
            chars.next();
            line_start = BYTE_ORDER_MARK.len_utf8();
        }
        Self {
            file,
            source,
            chars,
            line: 1,
            line_start,
            brackets: Vec::new(),
            tokens: Vec::new(),
        }
    }

    /// Tokenize the whole file.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Syntax` for unterminated literals or comments,
    /// invalid characters and unbalanced brackets.
    pub fn tokenize(mut self) -> Result<Vec<Token>, SourceError> {
        while self.scan_token()? {}

        if let Some(&(open, line, column)) = self.brackets.last() {
            return Err(self.error_at(line, column, format!("unclosed '{open}'")));
        }

        Ok(self.tokens)
    }

    /// Tokenize up to the first error and return what was scanned.
    ///
    /// Used where a best-effort look at a file is enough, e.g. deciding
    /// whether a directory holds tests at all.
    #[must_use]
    pub fn tokenize_lossy(mut self) -> Vec<Token> {
        while let Ok(true) = self.scan_token() {}
        self.tokens
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source.get(offset..).and_then(|rest| rest.chars().next())
    }

    fn advance(&mut self) -> Option<char> {
        let (idx, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.line_start = idx + 1;
        }
        Some(c)
    }

    fn column_of(&self, offset: usize) -> usize {
        offset - self.line_start + 1
    }

    fn error_at(&self, line: usize, column: usize, message: String) -> SourceError {
        SourceError::Syntax {
            file: self.file.to_string(),
            line,
            column,
            message,
        }
    }

    fn push(&mut self, kind: TokenKind, offset: usize, line: usize, column: usize) {
        self.tokens.push(Token {
            kind,
            offset,
            line,
            column,
        });
    }

    /// Scan one token. Returns `Ok(false)` at end of input.
    fn scan_token(&mut self) -> Result<bool, SourceError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }

        let Some(&(start, c)) = self.chars.peek() else {
            return Ok(false);
        };
        let line = self.line;
        let column = self.column_of(start);

        match c {
            '/' if self.peek_at(start + 1) == Some('/') => {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            }
            '/' if self.peek_at(start + 1) == Some('*') => {
                self.advance();
                self.advance();
                let mut star = false;
                loop {
                    match self.advance() {
                        None => {
                            return Err(self.error_at(
                                line,
                                column,
                                "comment not terminated".to_string(),
                            ));
                        }
                        Some('/') if star => break,
                        Some(c) => star = c == '*',
                    }
                }
            }
            '"' => {
                let text = self.scan_interpreted(start, line, column)?;
                self.push(TokenKind::String(text), start, line, column);
            }
            '`' => {
                let text = self.scan_raw(start, line, column)?;
                self.push(TokenKind::String(text), start, line, column);
            }
            '\'' => {
                self.scan_rune(line, column)?;
                self.push(TokenKind::Rune, start, line, column);
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start;
                while let Some(&(idx, c)) = self.chars.peek() {
                    if !(c.is_alphanumeric() || c == '_') {
                        break;
                    }
                    end = idx + c.len_utf8();
                    self.advance();
                }
                let name = self.source[start..end].to_string();
                self.push(TokenKind::Ident(name), start, line, column);
            }
            c if c.is_ascii_digit() => {
                self.scan_number();
                self.push(TokenKind::Number, start, line, column);
            }
            '.' if self.peek_at(start + 1).is_some_and(|c| c.is_ascii_digit()) => {
                self.advance();
                self.scan_number();
                self.push(TokenKind::Number, start, line, column);
            }
            '.' if self.peek_at(start + 1) == Some('.') && self.peek_at(start + 2) == Some('.') => {
                self.advance();
                self.advance();
                self.advance();
                self.push(TokenKind::Ellipsis, start, line, column);
            }
            ':' if self.peek_at(start + 1) == Some('=') => {
                self.advance();
                self.advance();
                self.push(TokenKind::Define, start, line, column);
            }
            '(' | '[' | '{' => {
                self.advance();
                self.brackets.push((c, line, column));
                self.push(TokenKind::Punct(c), start, line, column);
            }
            ')' | ']' | '}' => {
                self.advance();
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match self.brackets.pop() {
                    Some((open, _, _)) if open == expected => {}
                    _ => return Err(self.error_at(line, column, format!("unexpected '{c}'"))),
                }
                self.push(TokenKind::Punct(c), start, line, column);
            }
            '+' | '-' | '*' | '/' | '%' | '&' | '|' | '^' | '<' | '>' | '=' | '!' | ','
            | ';' | '.' | ':' | '~' => {
                self.advance();
                self.push(TokenKind::Punct(c), start, line, column);
            }
            other => {
                return Err(self.error_at(line, column, format!("invalid character {other:?}")));
            }
        }

        Ok(true)
    }

    fn scan_interpreted(
        &mut self,
        start: usize,
        line: usize,
        column: usize,
    ) -> Result<String, SourceError> {
        self.advance();
        loop {
            match self.chars.next() {
                None | Some((_, '\n')) => {
                    return Err(self.error_at(
                        line,
                        column,
                        "string literal not terminated".to_string(),
                    ));
                }
                Some((_, '\\')) => {
                    if self.peek() == Some('\n') {
                        return Err(self.error_at(
                            line,
                            column,
                            "string literal not terminated".to_string(),
                        ));
                    }
                    self.chars.next();
                }
                Some((idx, '"')) => return Ok(self.source[start..=idx].to_string()),
                Some(_) => {}
            }
        }
    }

    fn scan_raw(&mut self, start: usize, line: usize, column: usize) -> Result<String, SourceError> {
        self.advance();
        loop {
            let Some(&(idx, c)) = self.chars.peek() else {
                return Err(self.error_at(
                    line,
                    column,
                    "raw string literal not terminated".to_string(),
                ));
            };
            self.advance();
            if c == '`' {
                return Ok(self.source[start..=idx].to_string());
            }
        }
    }

    fn scan_rune(&mut self, line: usize, column: usize) -> Result<(), SourceError> {
        self.advance();
        loop {
            match self.chars.next() {
                None | Some((_, '\n')) => {
                    return Err(self.error_at(
                        line,
                        column,
                        "rune literal not terminated".to_string(),
                    ));
                }
                Some((_, '\\')) => {
                    self.chars.next();
                }
                Some((_, '\'')) => return Ok(()),
                Some(_) => {}
            }
        }
    }

    fn scan_number(&mut self) {
        let mut last = '0';
        while let Some(c) = self.peek() {
            let exponent_sign =
                (c == '+' || c == '-') && matches!(last, 'e' | 'E' | 'p' | 'P');
            if !(c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign) {
                break;
            }
            last = c;
            self.advance();
        }
    }
}

/// Tokenize `source`, reporting errors against `file`.
///
/// # Errors
///
/// See [`Lexer::tokenize`].
pub fn tokenize(file: &str, source: &str) -> Result<Vec<Token>, SourceError> {
    Lexer::new(file, source).tokenize()
}
