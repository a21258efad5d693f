//! Recognizing suite runs
//!
//! A test function runs a suite when its body calls the framework's
//! runner, e.g. `gounit.Run(&MySuite{}, t)`. How the runner can be
//! reached depends on the file's imports:
//!
//! | import                        | call shape            |
//! |-------------------------------|-----------------------|
//! | `. "github.com/slukits/gounit"` | `Run(...)`          |
//! | `gu "github.com/slukits/gounit"`| `gu.Run(...)`       |
//! | `"github.com/slukits/gounit"`   | `gounit.Run(...)`   |
//!
//! and the first argument can take any shape of [`ARGUMENT_SHAPES`].
//! This is pattern matching on tokens, not type checking, so it is kept
//! apart from the rest of the parser.

use serde::{Deserialize, Serialize};

use crate::lexer::{Token, TokenKind};
use crate::syntax::FileSyntax;

/// Default import path of the suite framework
pub const DEFAULT_IMPORT_PATH: &str = "github.com/slukits/gounit";

/// Default name of the framework's suite runner function
pub const DEFAULT_RUNNER: &str = "Run";

/// Method names a suite reserves for its lifecycle
pub const LIFECYCLE_METHODS: &[&str] = &["Init", "SetUp", "TearDown", "Finalize"];

/// Identifies the suite framework in test sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteFramework {
    /// Import path of the framework package
    pub import_path: String,
    /// Name of the function that runs a suite
    pub runner: String,
}

impl Default for SuiteFramework {
    fn default() -> Self {
        Self {
            import_path: DEFAULT_IMPORT_PATH.to_string(),
            runner: DEFAULT_RUNNER.to_string(),
        }
    }
}

impl SuiteFramework {
    /// Last element of the import path, the default package name
    #[must_use]
    pub fn basename(&self) -> &str {
        self.import_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.import_path)
    }

    /// Work out how a file can call the runner.
    #[must_use]
    pub fn access(&self, syntax: &FileSyntax) -> RunnerAccess {
        let mut access = RunnerAccess {
            qualifier: None,
            unqualified: syntax.package == self.basename(),
        };

        for import in syntax.imports.iter().filter(|i| i.path == self.import_path) {
            match import.alias.as_deref() {
                Some(".") => access.unqualified = true,
                Some("_") => {}
                Some(alias) => access.qualifier = Some(alias.to_string()),
                None => access.qualifier = Some(self.basename().to_string()),
            }
        }

        access
    }
}

/// How the runner function is reachable from one file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunnerAccess {
    /// Package name through which a qualified call goes
    pub qualifier: Option<String>,
    /// Whether a bare call is possible (dot import or the framework itself)
    pub unqualified: bool,
}

impl RunnerAccess {
    /// Whether the file cannot call the runner at all
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.qualifier.is_none() && !self.unqualified
    }
}

/// What a run call's first argument says about the suite
#[derive(Debug, Clone, PartialEq, Eq)]
enum Argument {
    /// The suite's type is spelled out
    Type(String),
    /// A variable holding the suite
    Variable(String),
}

type Shape = fn(&[Token]) -> Option<Argument>;

/// Recognized forms of a run call's first argument
///
/// Tried in order; the first that matches wins.
const ARGUMENT_SHAPES: &[Shape] = &[
    address_of_literal,
    qualified_address_of_literal,
    literal,
    new_call,
    address_of_variable,
    variable,
];

fn ident_at(tokens: &[Token], idx: usize) -> Option<&str> {
    tokens.get(idx).and_then(Token::ident)
}

fn punct_at(tokens: &[Token], idx: usize, c: char) -> bool {
    tokens.get(idx).is_some_and(|t| t.is_punct(c))
}

/// `&T{...}`
fn address_of_literal(tokens: &[Token]) -> Option<Argument> {
    (punct_at(tokens, 0, '&') && punct_at(tokens, 2, '{'))
        .then(|| ident_at(tokens, 1))
        .flatten()
        .map(|name| Argument::Type(name.to_string()))
}

/// `&pkg.T{...}`
fn qualified_address_of_literal(tokens: &[Token]) -> Option<Argument> {
    (punct_at(tokens, 0, '&')
        && ident_at(tokens, 1).is_some()
        && punct_at(tokens, 2, '.')
        && punct_at(tokens, 4, '{'))
    .then(|| ident_at(tokens, 3))
    .flatten()
    .map(|name| Argument::Type(name.to_string()))
}

/// `T{...}`
fn literal(tokens: &[Token]) -> Option<Argument> {
    punct_at(tokens, 1, '{')
        .then(|| ident_at(tokens, 0))
        .flatten()
        .map(|name| Argument::Type(name.to_string()))
}

/// `new(T)`
fn new_call(tokens: &[Token]) -> Option<Argument> {
    (tokens.first().is_some_and(|t| t.is_ident("new"))
        && punct_at(tokens, 1, '(')
        && punct_at(tokens, 3, ')'))
    .then(|| ident_at(tokens, 2))
    .flatten()
    .map(|name| Argument::Type(name.to_string()))
}

/// `&s` followed by the end of the argument
fn address_of_variable(tokens: &[Token]) -> Option<Argument> {
    (punct_at(tokens, 0, '&') && (punct_at(tokens, 2, ',') || punct_at(tokens, 2, ')')))
        .then(|| ident_at(tokens, 1))
        .flatten()
        .map(|name| Argument::Variable(name.to_string()))
}

/// `s` followed by the end of the argument
fn variable(tokens: &[Token]) -> Option<Argument> {
    (punct_at(tokens, 1, ',') || punct_at(tokens, 1, ')'))
        .then(|| ident_at(tokens, 0))
        .flatten()
        .map(|name| Argument::Variable(name.to_string()))
}

fn match_argument(tokens: &[Token]) -> Option<Argument> {
    ARGUMENT_SHAPES.iter().find_map(|shape| shape(tokens))
}

/// Find the suite type run by a test function body.
///
/// Returns `None` when the body never calls the runner (or calls it with
/// an argument of unknown shape).
#[must_use]
pub fn suite_type(body: &[Token], access: &RunnerAccess, runner: &str) -> Option<String> {
    if access.is_none() {
        return None;
    }

    for idx in 0..body.len() {
        if idx > 0 && body[idx - 1].is_punct('.') {
            continue;
        }

        let argument_start = if access
            .qualifier
            .as_deref()
            .is_some_and(|q| body[idx].is_ident(q))
            && punct_at(body, idx + 1, '.')
            && body.get(idx + 2).is_some_and(|t| t.is_ident(runner))
            && punct_at(body, idx + 3, '(')
        {
            idx + 4
        } else if access.unqualified && body[idx].is_ident(runner) && punct_at(body, idx + 1, '(')
        {
            idx + 2
        } else {
            continue;
        };

        match match_argument(&body[argument_start..]) {
            Some(Argument::Type(name)) => return Some(name),
            Some(Argument::Variable(name)) => {
                return Some(resolve_variable(&body[..idx], &name).unwrap_or(name));
            }
            None => {}
        }
    }

    None
}

/// Look for the type of a local suite variable declared before the call.
///
/// Understands `s := <shape>`, `var s = <shape>` and `var s T`/`var s *T`.
fn resolve_variable(body: &[Token], name: &str) -> Option<String> {
    let mut found = None;
    for idx in 0..body.len() {
        let declared = if body[idx].is_ident(name)
            && body.get(idx + 1).is_some_and(|t| t.kind == TokenKind::Define)
        {
            value_type(&body[idx + 2..])
        } else if body[idx].is_ident("var") && body.get(idx + 1).is_some_and(|t| t.is_ident(name))
        {
            if punct_at(body, idx + 2, '=') {
                value_type(&body[idx + 3..])
            } else if punct_at(body, idx + 2, '*') {
                ident_at(body, idx + 3).map(str::to_string)
            } else {
                ident_at(body, idx + 2).map(str::to_string)
            }
        } else {
            None
        };

        // The declaration closest to the call wins.
        if declared.is_some() {
            found = declared;
        }
    }
    found
}

fn value_type(tokens: &[Token]) -> Option<String> {
    match match_argument(tokens) {
        Some(Argument::Type(name)) => Some(name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::syntax::{ImportSpec, parse_file};
    use similar_asserts::assert_eq;

    fn body(source: &str) -> Vec<Token> {
        tokenize("x_test.go", source).expect("tokenize")
    }

    fn qualified(q: &str) -> RunnerAccess {
        RunnerAccess {
            qualifier: Some(q.to_string()),
            unqualified: false,
        }
    }

    fn dot() -> RunnerAccess {
        RunnerAccess {
            qualifier: None,
            unqualified: true,
        }
    }

    fn syntax_with(imports: Vec<ImportSpec>) -> FileSyntax {
        FileSyntax {
            package: "p_test".to_string(),
            imports,
            funcs: Vec::new(),
        }
    }

    #[test]
    fn test_access_default_basename() {
        let fw = SuiteFramework::default();
        let syntax = syntax_with(vec![ImportSpec {
            alias: None,
            path: DEFAULT_IMPORT_PATH.to_string(),
        }]);
        assert_eq!(fw.access(&syntax), qualified("gounit"));
    }

    #[test]
    fn test_access_named_alias() {
        let fw = SuiteFramework::default();
        let syntax = syntax_with(vec![ImportSpec {
            alias: Some("gu".to_string()),
            path: DEFAULT_IMPORT_PATH.to_string(),
        }]);
        assert_eq!(fw.access(&syntax), qualified("gu"));
    }

    #[test]
    fn test_access_dot_import() {
        let fw = SuiteFramework::default();
        let syntax = syntax_with(vec![ImportSpec {
            alias: Some(".".to_string()),
            path: DEFAULT_IMPORT_PATH.to_string(),
        }]);
        assert_eq!(fw.access(&syntax), dot());
    }

    #[test]
    fn test_access_without_import() {
        let fw = SuiteFramework::default();
        let syntax = syntax_with(vec![ImportSpec {
            alias: None,
            path: "testing".to_string(),
        }]);
        assert!(fw.access(&syntax).is_none());
    }

    #[test]
    fn test_access_inside_framework_package() {
        let fw = SuiteFramework::default();
        let tokens = body("package gounit\nfunc TestRun(t *testing.T) {}");
        let syntax = parse_file("run_test.go", &tokens).expect("parse");
        assert!(fw.access(&syntax).unqualified);
    }

    #[test]
    fn test_shapes() {
        let cases = [
            ("gounit.Run(&FxSuite{}, t)", Some("FxSuite")),
            ("gounit.Run(&fx.Suite{X: 1}, t)", Some("Suite")),
            ("gounit.Run(FxSuite{}, t)", Some("FxSuite")),
            ("gounit.Run(new(FxSuite), t)", Some("FxSuite")),
            ("gounit.Run(suite, t)", Some("suite")),
            ("gounit.Run(makeSuite(), t)", None),
            ("other.Run(&FxSuite{}, t)", None),
            ("t.Run(\"x\", func(t *testing.T) {})", None),
        ];
        for (source, expected) in cases {
            assert_eq!(
                suite_type(&body(source), &qualified("gounit"), "Run").as_deref(),
                expected,
                "{source}"
            );
        }
    }

    #[test]
    fn test_unqualified_requires_dot_access() {
        let tokens = body("Run(&FxSuite{}, t)");
        assert_eq!(
            suite_type(&tokens, &dot(), "Run").as_deref(),
            Some("FxSuite")
        );
        assert_eq!(suite_type(&tokens, &qualified("gounit"), "Run"), None);
    }

    #[test]
    fn test_method_call_named_run_is_ignored() {
        let tokens = body("s.Run(&FxSuite{}, t)");
        assert_eq!(suite_type(&tokens, &dot(), "Run"), None);
    }

    #[test]
    fn test_variable_resolution() {
        let cases = [
            ("s := &FxSuite{}; gounit.Run(s, t)", "FxSuite"),
            ("var s = new(FxSuite); gounit.Run(s, t)", "FxSuite"),
            ("var s FxSuite; gounit.Run(&s, t)", "FxSuite"),
            ("var s *FxSuite; gounit.Run(s, t)", "FxSuite"),
            ("s := build(); gounit.Run(s, t)", "s"),
        ];
        for (source, expected) in cases {
            assert_eq!(
                suite_type(&body(source), &qualified("gounit"), "Run").as_deref(),
                Some(expected),
                "{source}"
            );
        }
    }
}
