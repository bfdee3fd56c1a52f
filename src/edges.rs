//! Upgrade edges of a single channel entry.
//!
//! Every entry gets three edges:
//!
//! - `replaces`: the immediately preceding version, unless the version is
//!   a graph root
//! - `skipRange`: `>= <floor major>.<floor minor>.0 < <version>`
//! - `skips`: every broken `B` with `B < version < B.major.(B.minor + window).0`
//!
//! A broken release therefore stays skippable for `window` minor lines and
//! then drops out of all later skip lists.

use std::collections::BTreeSet;

use crate::policy::UpdateGraphPolicyV1;
use crate::types::{ChannelEntry, Version};

/// Error type for edge computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EdgeError {
    /// A non-root version has nothing to replace.
    #[error("version {version} has no predecessor to replace and is not listed as rootless")]
    MissingPredecessor {
        /// Version being added.
        version: Version,
    },
    /// The predecessor handed in is not lower than the version.
    #[error("predecessor {predecessor} of version {version} is not a lower version")]
    PredecessorNotLower {
        /// Version being added.
        version: Version,
        /// Offending predecessor.
        predecessor: Version,
    },
}

/// Builds channel entries for one compile run.
#[derive(Debug, Clone, Copy)]
pub struct EdgeBuilder<'a> {
    policy: &'a UpdateGraphPolicyV1,
    broken: &'a BTreeSet<Version>,
}

impl<'a> EdgeBuilder<'a> {
    /// Create a builder over the policy and the broken-version set.
    pub fn new(policy: &'a UpdateGraphPolicyV1, broken: &'a BTreeSet<Version>) -> Self {
        Self { policy, broken }
    }

    /// Build the entry for `version`.
    ///
    /// # Arguments
    /// * `version` - Version being added
    /// * `predecessor` - The version right before it, `None` for the first one
    /// * `floor` - Floor of the channel segment the version is added in
    pub fn build(
        &self,
        version: &Version,
        predecessor: Option<&Version>,
        floor: &Version,
    ) -> Result<ChannelEntry, EdgeError> {
        Ok(ChannelEntry {
            name: self.policy.bundle_name(version),
            replaces: self.replaces(version, predecessor)?,
            skip_range: self.skip_range(version, floor),
            skips: self.skips(version),
        })
    }

    /// Name of the replaced bundle, `None` for roots.
    pub fn replaces(
        &self,
        version: &Version,
        predecessor: Option<&Version>,
    ) -> Result<Option<String>, EdgeError> {
        if self.policy.exceptions.is_rootless(version) {
            return Ok(None);
        }
        match predecessor {
            None => Err(EdgeError::MissingPredecessor { version: version.clone() }),
            Some(p) if p >= version => Err(EdgeError::PredecessorNotLower {
                version: version.clone(),
                predecessor: p.clone(),
            }),
            Some(p) => Ok(Some(self.policy.bundle_name(p))),
        }
    }

    /// `>= F.major.F.minor.0 < version`.
    pub fn skip_range(&self, version: &Version, floor: &Version) -> String {
        format!(">= {}.{}.0 < {}", floor.major(), floor.minor(), version)
    }

    /// Broken bundles `version` may skip, ascending.
    pub fn skips(&self, version: &Version) -> Vec<String> {
        if self.policy.exceptions.is_skip_exempt(version) {
            return Vec::new();
        }
        self.broken
            .range(..version.clone())
            .filter(|broken| version < &broken.minor_offset(self.policy.skip_window_minors))
            .map(|broken| self.policy.bundle_name(broken))
            .collect()
    }
}
