// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Test and suite extraction
//!
//! Turns the test files of one Go package into the ordered set of tests
//! and suites the package declares. `go test` reports tests in execution
//! order, which under `t.Parallel` says nothing about where a test was
//! written; declaration order comes from here.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SourceError;
use crate::lexer::{Lexer, Token, tokenize};
use crate::suite::{LIFECYCLE_METHODS, RunnerAccess, SuiteFramework, suite_type};
use crate::syntax::{FileSyntax, FuncDecl, parse_file};

/// Prefix of test function names
pub const TEST_PREFIX: &str = "Test";

/// `TestMain` sets a package's tests up; it is never reported as a test.
pub const TEST_MAIN: &str = "TestMain";

/// A test file's name, modification time and content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// File name (without directory)
    pub name: String,
    /// Last modification time
    pub mod_time: DateTime<Utc>,
    /// File content
    pub content: String,
}

/// Where a declaration starts
///
/// Orders by file (in processing order) first, then by offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Index of the declaring file in the parsed file list
    pub file: usize,
    /// Byte offset of the `func` keyword
    pub offset: usize,
    /// 1-based line
    pub line: usize,
    /// 1-based byte column
    pub column: usize,
}

/// A test function or suite member test
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Test {
    /// Function or method name
    pub name: String,
    /// Declaration position
    pub position: Position,
}

impl Test {
    /// Index of the file declaring this test
    #[must_use]
    pub fn file(&self) -> usize {
        self.position.file
    }
}

/// A suite: its runner test and the member tests run by it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuite {
    /// The `Test*` function running the suite
    pub runner: Test,
    /// Name of the suite's type
    pub type_name: String,
    /// Member tests in declaration order
    pub tests: Vec<Test>,
}

impl TestSuite {
    /// Name the runner reports results under
    #[must_use]
    pub fn name(&self) -> &str {
        &self.runner.name
    }

    /// Number of member tests
    #[must_use]
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Whether the suite has no member tests
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Indices of all files contributing to the suite
    pub fn files(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::once(self.runner.file()).chain(self.tests.iter().map(Test::file))
    }
}

/// Everything a package's test files declare
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSet {
    /// Plain tests in declaration order
    pub tests: Vec<Test>,
    /// Suites, the most recently modified last
    pub suites: Vec<TestSuite>,
}

impl TestSet {
    /// Whether nothing was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty() && self.suites.is_empty()
    }

    /// Keep only tests and suites whose names `keep` accepts.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.tests.retain(|t| keep(&t.name));
        self.suites.retain(|s| keep(s.name()));
    }
}

/// Extracts tests and suites from Go test files
#[derive(Debug, Clone, Default)]
pub struct Parser {
    framework: SuiteFramework,
}

impl Parser {
    /// Create a parser recognizing suites of the given framework
    #[must_use]
    pub fn new(framework: SuiteFramework) -> Self {
        Self { framework }
    }

    /// The suite framework this parser recognizes
    #[must_use]
    pub fn framework(&self) -> &SuiteFramework {
        &self.framework
    }

    /// Parse one package's test files.
    ///
    /// Files are processed in the given order, which defines the `file`
    /// index of every [`Position`].
    ///
    /// # Errors
    ///
    /// Returns the first `SourceError` of any file; a package with one
    /// broken file yields no tests at all.
    pub fn parse(&self, files: &[SourceFile]) -> Result<TestSet, SourceError> {
        let mut parsed = Vec::with_capacity(files.len());
        for file in files {
            let tokens = tokenize(&file.name, &file.content)?;
            let syntax = parse_file(&file.name, &tokens)?;
            let access = self.framework.access(&syntax);
            parsed.push((tokens, syntax, access));
        }

        let mut set = TestSet::default();

        for (idx, (tokens, syntax, access)) in parsed.iter().enumerate() {
            self.collect_tests(idx, tokens, syntax, access, &mut set);
        }

        let suite_types: HashSet<String> =
            set.suites.iter().map(|s| s.type_name.clone()).collect();
        for (idx, (tokens, syntax, _)) in parsed.iter().enumerate() {
            collect_members(idx, tokens, syntax, &suite_types, &mut set);
        }

        sort_suites(&mut set.suites, files);

        debug!(
            files = files.len(),
            tests = set.tests.len(),
            suites = set.suites.len(),
            "parsed test files"
        );
        Ok(set)
    }

    fn collect_tests(
        &self,
        file: usize,
        tokens: &[Token],
        syntax: &FileSyntax,
        access: &RunnerAccess,
        set: &mut TestSet,
    ) {
        for func in syntax.funcs.iter().filter(|f| is_test_function(f)) {
            let test = Test {
                name: func.name.clone(),
                position: position(file, &tokens[func.start]),
            };
            let body = func.body.clone().map_or(&[][..], |range| &tokens[range]);

            match suite_type(body, access, &self.framework.runner) {
                Some(type_name) => set.suites.push(TestSuite {
                    runner: test,
                    type_name,
                    tests: Vec::new(),
                }),
                None => set.tests.push(test),
            }
        }
    }
}

fn is_test_function(func: &FuncDecl) -> bool {
    func.receiver.is_none() && is_test_name(&func.name)
}

/// `Test`, optionally followed by a name not starting lowercase
fn is_test_name(name: &str) -> bool {
    name.strip_prefix(TEST_PREFIX)
        .is_some_and(|rest| rest.chars().next().is_none_or(|c| !c.is_lowercase()))
        && name != TEST_MAIN
}

fn is_member(func: &FuncDecl) -> bool {
    func.params == 1
        && func.name.starts_with(|c: char| c.is_uppercase())
        && !LIFECYCLE_METHODS.contains(&func.name.as_str())
}

fn collect_members(
    file: usize,
    tokens: &[Token],
    syntax: &FileSyntax,
    suite_types: &HashSet<String>,
    set: &mut TestSet,
) {
    for func in &syntax.funcs {
        let Some(receiver) = &func.receiver else {
            continue;
        };
        if !suite_types.contains(&receiver.type_name) || !is_member(func) {
            continue;
        }
        let test = Test {
            name: func.name.clone(),
            position: position(file, &tokens[func.start]),
        };
        for suite in set
            .suites
            .iter_mut()
            .filter(|s| s.type_name == receiver.type_name)
        {
            suite.tests.push(test.clone());
        }
    }
}

/// Order suites by their most recently modified file, then by position.
fn sort_suites(suites: &mut [TestSuite], files: &[SourceFile]) {
    let latest = |suite: &TestSuite| {
        suite
            .files()
            .filter_map(|idx| files.get(idx).map(|f| f.mod_time))
            .max()
    };
    suites.sort_by(|a, b| {
        latest(a)
            .cmp(&latest(b))
            .then_with(|| a.runner.position.cmp(&b.runner.position))
    });
}

fn position(file: usize, token: &Token) -> Position {
    Position {
        file,
        offset: token.offset,
        line: token.line,
        column: token.column,
    }
}

/// Whether a test file declares at least one test function.
///
/// Looks at tokens only and tolerates broken files: a file that fails to
/// lex is judged by what precedes the error.
#[must_use]
pub fn has_test_function(content: &str) -> bool {
    let tokens = Lexer::new("", content).tokenize_lossy();
    let mut depth = 0usize;
    for (idx, token) in tokens.iter().enumerate() {
        if token.is_open() {
            depth += 1;
        } else if token.is_close() {
            depth = depth.saturating_sub(1);
        } else if depth == 0
            && token.is_ident("func")
            && let Some(name) = tokens.get(idx + 1).and_then(Token::ident)
            && is_test_name(name)
        {
            return true;
        }
    }
    false
}
