// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Package snapshots

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A testing package at the time of a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageStat {
    /// Package directory relative to the module root, `/` separated
    pub id: String,
    /// Absolute package directory
    pub abs_path: PathBuf,
    /// Latest modification time of the package's `.go` files
    pub mod_time: DateTime<Utc>,
}

impl PackageStat {
    /// Whether this package changed after `other` was taken
    #[must_use]
    pub fn is_newer_than(&self, other: &PackageStat) -> bool {
        self.mod_time > other.mod_time
    }
}

/// All testing packages of a module at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageSnapshot {
    packages: BTreeMap<String, PackageStat>,
    mod_time: Option<DateTime<Utc>>,
}

impl PackageSnapshot {
    /// Snapshot of the given packages
    #[must_use]
    pub fn new(packages: impl IntoIterator<Item = PackageStat>) -> Self {
        let packages: BTreeMap<_, _> = packages
            .into_iter()
            .map(|stat| (stat.id.clone(), stat))
            .collect();
        let mod_time = packages.values().map(|s| s.mod_time).max();
        Self { packages, mod_time }
    }

    /// Number of packages
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the snapshot has no packages
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Package with the given id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PackageStat> {
        self.packages.get(id)
    }

    /// Packages ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &PackageStat> {
        self.packages.values()
    }

    /// Latest modification time of any package
    #[must_use]
    pub fn mod_time(&self) -> Option<DateTime<Utc>> {
        self.mod_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    fn stat(id: &str, secs: i64) -> PackageStat {
        PackageStat {
            id: id.to_string(),
            abs_path: PathBuf::from("/m").join(id),
            mod_time: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_snapshot_mod_time_is_max() {
        let snapshot = PackageSnapshot::new([stat("a", 10), stat("b", 30), stat("c", 20)]);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.mod_time(), Some(Utc.timestamp_opt(30, 0).unwrap()));
        assert!(snapshot.get("b").is_some());
        assert!(PackageSnapshot::default().mod_time().is_none());
    }

    #[test]
    fn test_is_newer_than() {
        assert!(stat("a", 2).is_newer_than(&stat("a", 1)));
        assert!(!stat("a", 1).is_newer_than(&stat("a", 1)));
    }
}
