// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Top-level Go declarations
//!
//! A shallow parser over the token stream: it recognizes the package
//! clause, import declarations and function declarations (receiver,
//! name, parameter count, body). Everything else at the top level is
//! skipped one bracketed group at a time.

use std::ops::Range;

use crate::error::SourceError;
use crate::lexer::{Token, TokenKind};

/// One import spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit name: `.`, `_` or an identifier
    pub alias: Option<String>,
    /// Import path without quotes
    pub path: String,
}

/// The receiver of a method declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    /// Base type name, without `*` or type arguments
    pub type_name: String,
    /// Whether the receiver is a pointer
    pub pointer: bool,
}

/// A function or method declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    /// Function name
    pub name: String,
    /// Receiver for methods
    pub receiver: Option<Receiver>,
    /// Number of declared parameters (`a, b int` counts two)
    pub params: usize,
    /// Index of the `func` keyword in the token stream
    pub start: usize,
    /// Token range of the body between its braces, if there is one
    pub body: Option<Range<usize>>,
}

/// The declarations of one file that test discovery cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSyntax {
    /// Package name from the package clause
    pub package: String,
    /// Import specs in source order
    pub imports: Vec<ImportSpec>,
    /// Function declarations in source order
    pub funcs: Vec<FuncDecl>,
}

/// Parse the declarations of one tokenized file.
///
/// # Errors
///
/// Returns `SourceError::MissingPackage` when the package clause is
/// missing and `SourceError::Syntax` for malformed imports or function
/// headers.
pub fn parse_file(file: &str, tokens: &[Token]) -> Result<FileSyntax, SourceError> {
    DeclParser::new(file, tokens).parse()
}

struct DeclParser<'a> {
    file: &'a str,
    tokens: &'a [Token],
    /// Index of the matching bracket for every bracket token
    partner: Vec<usize>,
    pos: usize,
}

impl<'a> DeclParser<'a> {
    fn new(file: &'a str, tokens: &'a [Token]) -> Self {
        // The lexer guarantees balance, so every open finds its close.
        let mut partner = vec![usize::MAX; tokens.len()];
        let mut stack = Vec::new();
        for (idx, token) in tokens.iter().enumerate() {
            if token.is_open() {
                stack.push(idx);
            } else if token.is_close()
                && let Some(open) = stack.pop()
            {
                partner[open] = idx;
                partner[idx] = open;
            }
        }

        Self {
            file,
            tokens,
            partner,
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<FileSyntax, SourceError> {
        let package = match (self.tokens.first(), self.tokens.get(1)) {
            (Some(kw), Some(name)) if kw.is_ident("package") => match name.ident() {
                Some(name) => name.to_string(),
                None => return Err(self.error(name, "expected package name")),
            },
            _ => {
                return Err(SourceError::MissingPackage {
                    file: self.file.to_string(),
                });
            }
        };
        self.pos = 2;

        let mut imports = Vec::new();
        let mut funcs = Vec::new();

        while let Some(token) = self.tokens.get(self.pos) {
            if token.is_ident("import") {
                self.pos += 1;
                self.parse_imports(&mut imports)?;
            } else if token.is_ident("func") && self.starts_line() {
                funcs.push(self.parse_func()?);
            } else {
                self.skip_one();
            }
        }

        Ok(FileSyntax {
            package,
            imports,
            funcs,
        })
    }

    fn error(&self, token: &Token, message: &str) -> SourceError {
        SourceError::Syntax {
            file: self.file.to_string(),
            line: token.line,
            column: token.column,
            message: message.to_string(),
        }
    }

    fn error_at_end(&self, message: &str) -> SourceError {
        let (line, column) = self
            .tokens
            .last()
            .map_or((1, 1), |t| (t.line, t.column));
        SourceError::Syntax {
            file: self.file.to_string(),
            line,
            column,
            message: message.to_string(),
        }
    }

    /// Whether the cursor token is the first on its line.
    ///
    /// Distinguishes top-level declarations from function literals in
    /// `var` initializers.
    fn starts_line(&self) -> bool {
        self.pos == 0 || self.tokens[self.pos - 1].line < self.tokens[self.pos].line
    }

    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    /// Step over one token, or a whole bracketed group.
    fn skip_one(&mut self) {
        match self.current() {
            Some(token) if token.is_open() => self.pos = self.partner[self.pos] + 1,
            Some(_) => self.pos += 1,
            None => {}
        }
    }

    fn parse_imports(&mut self, imports: &mut Vec<ImportSpec>) -> Result<(), SourceError> {
        let Some(token) = self.current() else {
            return Err(self.error_at_end("expected import path"));
        };

        if !token.is_punct('(') {
            imports.push(self.parse_import_spec()?);
            return Ok(());
        }

        let close = self.partner[self.pos];
        self.pos += 1;
        while self.pos < close {
            if self.tokens[self.pos].is_punct(';') {
                self.pos += 1;
                continue;
            }
            imports.push(self.parse_import_spec()?);
        }
        self.pos = close + 1;
        Ok(())
    }

    fn parse_import_spec(&mut self) -> Result<ImportSpec, SourceError> {
        let mut alias = None;
        if let Some(token) = self.current() {
            if token.is_punct('.') {
                alias = Some(".".to_string());
                self.pos += 1;
            } else if let Some(name) = token.ident() {
                alias = Some(name.to_string());
                self.pos += 1;
            }
        }

        match self.current() {
            Some(Token {
                kind: TokenKind::String(text),
                ..
            }) => {
                self.pos += 1;
                Ok(ImportSpec {
                    alias,
                    path: unquote(text),
                })
            }
            Some(token) => Err(self.error(token, "expected import path")),
            None => Err(self.error_at_end("expected import path")),
        }
    }

    fn parse_func(&mut self) -> Result<FuncDecl, SourceError> {
        let tokens = self.tokens;
        let start = self.pos;
        let func = &tokens[start];
        self.pos += 1;

        let mut receiver = None;
        if self.current().is_some_and(|t| t.is_punct('(')) {
            receiver = Some(self.parse_receiver(func)?);
        }

        let name = match self.current().and_then(Token::ident) {
            Some(name) => name.to_string(),
            None => return Err(self.error(func, "malformed function declaration")),
        };
        self.pos += 1;

        // Type parameters
        if receiver.is_none() && self.current().is_some_and(|t| t.is_punct('[')) {
            self.skip_one();
        }

        let params = match self.current() {
            Some(token) if token.is_punct('(') => {
                let close = self.partner[self.pos];
                let count = count_list(&self.tokens[self.pos + 1..close]);
                self.pos = close + 1;
                count
            }
            _ => return Err(self.error(func, "expected parameter list")),
        };

        let body = self.skip_results();

        Ok(FuncDecl {
            name,
            receiver,
            params,
            start,
            body,
        })
    }

    fn parse_receiver(&mut self, func: &Token) -> Result<Receiver, SourceError> {
        let open = self.pos;
        let close = self.partner[open];
        let mut pointer = false;
        let mut type_name = None;

        let mut idx = open + 1;
        while idx < close {
            let token = &self.tokens[idx];
            if token.is_punct('*') {
                pointer = true;
            } else if let Some(name) = token.ident() {
                type_name = Some(name.to_string());
            } else if token.is_open() {
                // Type arguments of a generic receiver
                idx = self.partner[idx];
            }
            idx += 1;
        }
        self.pos = close + 1;

        match type_name {
            Some(type_name) => Ok(Receiver { type_name, pointer }),
            None => Err(self.error(func, "malformed receiver")),
        }
    }

    /// Skip the result list and return the body's token range.
    fn skip_results(&mut self) -> Option<Range<usize>> {
        while let Some(token) = self.current() {
            if token.is_punct('{') {
                let open = self.pos;
                let close = self.partner[open];
                self.pos = close + 1;
                return Some(open + 1..close);
            }
            if ["struct", "interface"].iter().any(|kw| token.is_ident(kw))
                && self
                    .tokens
                    .get(self.pos + 1)
                    .is_some_and(|next| next.is_punct('{'))
            {
                // Literal type in the result list
                self.pos += 1;
                self.skip_one();
                continue;
            }
            if token.is_punct(';')
                || ["func", "type", "var", "const", "import"]
                    .iter()
                    .any(|kw| token.is_ident(kw))
                    && !self.is_func_type()
            {
                // Declaration without a body
                return None;
            }
            self.skip_one();
        }
        None
    }

    /// Whether the `func` at the cursor is a function type in a result list.
    fn is_func_type(&self) -> bool {
        self.current().is_some_and(|t| t.is_ident("func"))
            && self
                .tokens
                .get(self.pos + 1)
                .is_some_and(|next| next.is_punct('('))
            && self.pos > 0
            && !self.tokens[self.pos - 1].is_punct('}')
    }
}

/// Count the non-empty comma separated entries of a bracket's content.
fn count_list(tokens: &[Token]) -> usize {
    let mut count = 0;
    let mut depth = 0usize;
    let mut entry = false;
    for token in tokens {
        if token.is_open() {
            depth += 1;
        } else if token.is_close() {
            depth = depth.saturating_sub(1);
        }
        if depth == 0 && token.is_punct(',') {
            if entry {
                count += 1;
            }
            entry = false;
        } else {
            entry = true;
        }
    }
    if entry {
        count += 1;
    }
    count
}

fn unquote(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '`').to_string()
}
