// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Go module discovery

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::PackagesError;

/// File marking a module root
pub const MODULE_FILE: &str = "go.mod";

/// Id of the package in the module root
pub const ROOT_ID: &str = ".";

/// A Go module: its root directory and module path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    root: PathBuf,
    name: String,
}

impl Module {
    /// Find the module containing `dir` by walking up to the nearest
    /// directory with a `go.mod`.
    ///
    /// # Errors
    ///
    /// Returns `PackagesError::ModuleNotFound` if no ancestor has a
    /// module file, `PackagesError::InvalidModuleFile` if the nearest one
    /// lacks a module directive and `PackagesError::Io` if `dir` cannot
    /// be resolved.
    pub fn find(dir: &Path) -> Result<Self, PackagesError> {
        let start = dir.canonicalize()?;
        for candidate in start.ancestors() {
            let file = candidate.join(MODULE_FILE);
            if !file.is_file() {
                continue;
            }
            let content = fs::read_to_string(&file)?;
            let name = module_path(&content).ok_or_else(|| PackagesError::InvalidModuleFile {
                path: file.display().to_string(),
                message: "missing module directive".to_string(),
            })?;
            debug!(root = %candidate.display(), module = %name, "found go module");
            return Ok(Self {
                root: candidate.to_path_buf(),
                name,
            });
        }
        Err(PackagesError::ModuleNotFound {
            path: dir.display().to_string(),
        })
    }

    /// Module root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Module path from the module directive
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the package in `dir`, `None` if `dir` is outside the module
    #[must_use]
    pub fn package_id(&self, dir: &Path) -> Option<String> {
        package_id(&self.root, dir)
    }

    /// Import path of the package with the given id
    #[must_use]
    pub fn import_path(&self, id: &str) -> String {
        if id == ROOT_ID {
            self.name.clone()
        } else {
            format!("{}/{id}", self.name)
        }
    }
}

/// Id of the package in `dir` relative to `root`
pub(crate) fn package_id(root: &Path, dir: &Path) -> Option<String> {
    let relative = dir.strip_prefix(root).ok()?;
    let segments: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        Some(ROOT_ID.to_string())
    } else {
        Some(segments.join("/"))
    }
}

/// Module path of a `go.mod` file's content
fn module_path(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or(line).trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) && !rest.starts_with('"') {
            return None;
        }
        let name = rest.trim().trim_matches('"');
        (!name.is_empty()).then(|| name.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_module_path() {
        assert_eq!(
            module_path("module example.com/x\n\ngo 1.22\n"),
            Some("example.com/x".to_string())
        );
        assert_eq!(
            module_path("// header\nmodule \"example.com/q\" // quoted\n"),
            Some("example.com/q".to_string())
        );
        assert_eq!(module_path("go 1.22\n"), None);
        assert_eq!(module_path("modules x\n"), None);
    }

    #[test]
    fn test_package_id() {
        let root = Path::new("/m");
        assert_eq!(package_id(root, Path::new("/m")), Some(".".to_string()));
        assert_eq!(package_id(root, Path::new("/m/a/b")), Some("a/b".to_string()));
        assert_eq!(package_id(root, Path::new("/elsewhere")), None);
    }

    #[test]
    fn test_find_walks_upward() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(MODULE_FILE), "module example.com/m\n").expect("go.mod");
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).expect("dirs");

        let module = Module::find(&nested).expect("Should find module");
        assert_eq!(module.name(), "example.com/m");
        assert_eq!(module.root(), dir.path().canonicalize().expect("canonical"));
        assert_eq!(module.import_path("a/b"), "example.com/m/a/b");
        assert_eq!(module.import_path(ROOT_ID), "example.com/m");
    }

    #[test]
    fn test_find_invalid_module_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(MODULE_FILE), "go 1.22\n").expect("go.mod");
        let err = Module::find(dir.path()).expect_err("Should fail");
        assert!(matches!(err, PackagesError::InvalidModuleFile { .. }));
    }
}
