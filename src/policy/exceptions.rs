//! Historical exception table.
//!
//! The channel layout of a long-lived operator carries a handful of one-off
//! decisions made over its release history. They are kept here as data so the
//! assigner and the edge builder stay generic, and so that every exception is
//! visible in one reviewed place.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{MinorLine, Version};

/// Revision identifier of the production table.
pub const RHACS_EXCEPTIONS_REVISION: &str = "rhacs-exceptions-v3";

/// Versioned set of historical exceptions to the general channel rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExceptionTable {
    /// Identifier of this table, logged with every compile.
    pub revision: String,
    /// Floor of the very first channel segment. `None` means the first
    /// version's own `major.minor.0`.
    pub initial_floor: Option<Version>,
    /// Versions that start an upgrade graph and get no `replaces`.
    pub rootless: BTreeSet<Version>,
    /// Lines that never got a channel of their own; their entries go into
    /// the channel that is open when they appear.
    pub merged_lines: BTreeSet<MinorLine>,
    /// Non-zero patch versions that are still carried into later channels.
    pub pinned_persistent: BTreeSet<Version>,
    /// From this version on every entry is carried into later channels.
    pub persist_all_from: Option<Version>,
    /// First version of the new era: the carried entries are dropped here.
    pub era_boundary: Option<Version>,
    /// The `latest` channel is frozen right before this version.
    pub latest_cutover: Option<Version>,
    /// Versions that never list `skips`.
    pub skips_exempt: BTreeSet<Version>,
}

impl ExceptionTable {
    /// Table with no exceptions at all.
    pub fn none() -> Self {
        Self {
            revision: "none".to_string(),
            initial_floor: None,
            rootless: BTreeSet::new(),
            merged_lines: BTreeSet::new(),
            pinned_persistent: BTreeSet::new(),
            persist_all_from: None,
            era_boundary: None,
            latest_cutover: None,
            skips_exempt: BTreeSet::new(),
        }
    }

    /// The production table of the RHACS operator catalog.
    ///
    /// - 3.62.0 and 4.0.0 are the roots of the 3.x and 4.x graphs.
    /// - The 3.63 line was released into the 3.62 channel.
    /// - 4.1.1 to 4.1.3 stay reachable from later channels; from 4.7.0 on,
    ///   every release does.
    /// - `latest` was retired at the move to 4.0.0, which also starts a
    ///   fresh set of carried entries.
    pub fn rhacs() -> Self {
        Self {
            revision: RHACS_EXCEPTIONS_REVISION.to_string(),
            initial_floor: Some(Version::new(3, 61, 0)),
            rootless: [Version::new(3, 62, 0), Version::new(4, 0, 0)].into_iter().collect(),
            merged_lines: [MinorLine::new(3, 63)].into_iter().collect(),
            pinned_persistent: [Version::new(4, 1, 1), Version::new(4, 1, 2), Version::new(4, 1, 3)]
                .into_iter()
                .collect(),
            persist_all_from: Some(Version::new(4, 7, 0)),
            era_boundary: Some(Version::new(4, 0, 0)),
            latest_cutover: Some(Version::new(4, 0, 0)),
            skips_exempt: BTreeSet::new(),
        }
    }

    /// Whether `version` gets no `replaces` edge.
    pub fn is_rootless(&self, version: &Version) -> bool {
        self.rootless.contains(version)
    }

    /// Whether `line` is merged into its predecessor's channel.
    pub fn is_merged(&self, line: &MinorLine) -> bool {
        self.merged_lines.contains(line)
    }

    /// Whether `version` is carried into later channels by exception.
    pub fn is_pinned_persistent(&self, version: &Version) -> bool {
        self.pinned_persistent.contains(version)
            || self.persist_all_from.as_ref().is_some_and(|t| version >= t)
    }

    /// Whether `version` must not list `skips`.
    pub fn is_skip_exempt(&self, version: &Version) -> bool {
        self.skips_exempt.contains(version)
    }
}

impl Default for ExceptionTable {
    fn default() -> Self {
        Self::none()
    }
}
