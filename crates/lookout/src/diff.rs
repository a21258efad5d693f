//! Delivered diffs

use std::sync::Arc;

use lookout_packages::{PackageSnapshot, PackagesDiff};
use tracing::warn;

use crate::package::{PackageContext, TestingPackage};

/// A change of the watched module, as delivered to a subscriber
#[derive(Debug, Clone)]
pub struct Diff {
    inner: PackagesDiff,
    context: Arc<PackageContext>,
}

impl Diff {
    pub(crate) fn new(inner: PackagesDiff, context: Arc<PackageContext>) -> Self {
        Self { inner, context }
    }

    /// Snapshot the diff leads to
    #[must_use]
    pub fn current(&self) -> &Arc<PackageSnapshot> {
        self.inner.current()
    }

    /// Snapshot the diff is taken against
    #[must_use]
    pub fn previous(&self) -> &Arc<PackageSnapshot> {
        self.inner.previous()
    }

    /// Module path of the watched module
    #[must_use]
    pub fn module(&self) -> &str {
        self.context.module.name()
    }

    /// New and modified packages, most recently modified first
    ///
    /// Reads every package's test files. A package whose files cannot be
    /// read, typically because it vanished after the scan, is left out.
    #[must_use]
    pub fn updated(&self) -> Vec<TestingPackage> {
        self.inner
            .updated()
            .into_iter()
            .filter_map(|stat| {
                TestingPackage::updated(stat, Arc::clone(&self.context))
                    .map_err(|e| warn!(package = %stat.id, error = %e, "cannot read test files"))
                    .ok()
            })
            .collect()
    }

    /// Packages no longer present, identity only
    #[must_use]
    pub fn removed(&self) -> Vec<TestingPackage> {
        self.inner
            .removed()
            .into_iter()
            .map(|stat| TestingPackage::removed(stat, Arc::clone(&self.context)))
            .collect()
    }
}
