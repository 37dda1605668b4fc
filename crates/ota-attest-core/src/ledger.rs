//! VersionLedger: the ordered view of builds used to compute "next update".
//!
//! Builds are ordered by `(created_at, seq)`. `seq` is the insertion order
//! assigned by the store, so two builds with the same `created_at` are still
//! strictly ordered: the one inserted first comes first.
//!
//! Devices always step forward one build at a time. [`VersionLedger::next_build`]
//! returns the immediate successor, never the latest build.

use std::collections::HashMap;

use crate::types::{BuildId, Release};

/// Result of asking for the build after a device's current build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextBuild {
    /// The immediate successor of the current build.
    Next(Release),
    /// The current build is the newest one.
    UpToDate,
    /// The current build is not in the ledger.
    NotFound,
}

/// An immutable, ordered snapshot of releases.
#[derive(Debug, Clone, Default)]
pub struct VersionLedger {
    /// Releases sorted by `order_key`.
    ordered: Vec<Release>,
    /// build id -> index into `ordered`.
    positions: HashMap<BuildId, usize>,
}

impl VersionLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from releases in any order.
    ///
    /// If the same build id appears twice the later entry wins.
    pub fn from_releases(releases: impl IntoIterator<Item = Release>) -> Self {
        let mut by_id: HashMap<BuildId, Release> = HashMap::new();
        for release in releases {
            by_id.insert(release.build.build_id.clone(), release);
        }

        let mut ordered: Vec<Release> = by_id.into_values().collect();
        ordered.sort_by_key(Release::order_key);

        let positions = ordered
            .iter()
            .enumerate()
            .map(|(i, r)| (r.build.build_id.clone(), i))
            .collect();

        Self { ordered, positions }
    }

    /// Resolve the build a device on `current` should install next.
    pub fn next_build(&self, current: &str) -> NextBuild {
        let Some(&index) = self.positions.get(current) else {
            return NextBuild::NotFound;
        };
        match self.ordered.get(index + 1) {
            Some(next) => NextBuild::Next(next.clone()),
            None => NextBuild::UpToDate,
        }
    }

    /// Whether a build id is in the ledger.
    pub fn is_known(&self, build_id: &str) -> bool {
        self.positions.contains_key(build_id)
    }

    /// Look up a release by build id.
    pub fn get(&self, build_id: &str) -> Option<&Release> {
        self.positions.get(build_id).map(|&i| &self.ordered[i])
    }

    /// The newest release.
    pub fn latest(&self) -> Option<&Release> {
        self.ordered.last()
    }

    /// Every release after `current`, oldest first.
    ///
    /// `None` if `current` is unknown. Used to surface the patch notes of
    /// each intermediate step.
    pub fn upgrade_path(&self, current: &str) -> Option<&[Release]> {
        let &index = self.positions.get(current)?;
        Some(&self.ordered[index + 1..])
    }

    /// Iterate releases in ledger order.
    pub fn iter(&self) -> impl Iterator<Item = &Release> {
        self.ordered.iter()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
