// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Snapshot diffing

use std::sync::Arc;

use crate::snapshot::{PackageSnapshot, PackageStat};

/// The difference between two snapshots of a module
///
/// Only built for snapshots that actually differ, see [`diff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagesDiff {
    previous: Arc<PackageSnapshot>,
    current: Arc<PackageSnapshot>,
}

/// Diff `current` against `previous`, `None` if nothing changed.
///
/// Snapshots differ if they hold a different number of packages or a
/// package of `current` is new or modified after its counterpart.
#[must_use]
pub fn diff(
    current: &Arc<PackageSnapshot>,
    previous: &Arc<PackageSnapshot>,
) -> Option<PackagesDiff> {
    let differs = current.len() != previous.len()
        || current.iter().any(|stat| is_updated(stat, previous));
    differs.then(|| PackagesDiff {
        previous: Arc::clone(previous),
        current: Arc::clone(current),
    })
}

fn is_updated(stat: &PackageStat, previous: &PackageSnapshot) -> bool {
    previous
        .get(&stat.id)
        .is_none_or(|old| stat.is_newer_than(old))
}

impl PackagesDiff {
    /// Snapshot the diff is taken against
    #[must_use]
    pub fn previous(&self) -> &Arc<PackageSnapshot> {
        &self.previous
    }

    /// Snapshot the diff leads to
    #[must_use]
    pub fn current(&self) -> &Arc<PackageSnapshot> {
        &self.current
    }

    /// New and modified packages, most recently modified first
    #[must_use]
    pub fn updated(&self) -> Vec<&PackageStat> {
        let mut updated: Vec<_> = self
            .current
            .iter()
            .filter(|stat| is_updated(stat, &self.previous))
            .collect();
        updated.sort_by(|a, b| b.mod_time.cmp(&a.mod_time).then_with(|| a.id.cmp(&b.id)));
        updated
    }

    /// Packages no longer present
    #[must_use]
    pub fn removed(&self) -> Vec<&PackageStat> {
        self.previous
            .iter()
            .filter(|stat| self.current.get(&stat.id).is_none())
            .collect()
    }
}
