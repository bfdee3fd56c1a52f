//! UpdateGraphPolicy v1: naming, skip window and exception table.
//!
//! A policy fully determines how a catalog is compiled. Together with the
//! input catalog it is the only input of [`crate::compile`], so its
//! `params_hash` is logged next to the template fingerprint.

use serde::{Deserialize, Serialize};

use super::exceptions::ExceptionTable;
use crate::canonical::{canonical_hash_hex, CanonicalError};
use crate::types::{MinorLine, Version};
use crate::DEFAULT_POLICY_VERSION;

/// Default number of minor lines a broken release stays skippable for.
pub const DEFAULT_SKIP_WINDOW_MINORS: u64 = 2;

/// Update graph policy version 1.
///
/// ## Parameters
///
/// - `package`: package name, also the prefix of every bundle name
/// - `channel_family`: prefix of y-stream channel names
/// - `skip_window_minors`: a broken `X.Y.Z` is skipped by versions below `X.(Y+n).0`
/// - `exceptions`: historical exception table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateGraphPolicyV1 {
    /// Policy version identifier.
    pub version: String,
    /// Package name.
    pub package: String,
    /// Channel name prefix.
    pub channel_family: String,
    /// Skip retention in minor lines.
    pub skip_window_minors: u64,
    /// Historical exceptions.
    #[serde(default)]
    pub exceptions: ExceptionTable,
}

impl UpdateGraphPolicyV1 {
    /// Create a policy without historical exceptions.
    pub fn new(package: impl Into<String>, channel_family: impl Into<String>) -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            package: package.into(),
            channel_family: channel_family.into(),
            skip_window_minors: DEFAULT_SKIP_WINDOW_MINORS,
            exceptions: ExceptionTable::none(),
        }
    }

    /// Replace the exception table.
    pub fn with_exceptions(mut self, exceptions: ExceptionTable) -> Self {
        self.exceptions = exceptions;
        self
    }

    /// Replace the skip window.
    pub fn with_skip_window(mut self, minors: u64) -> Self {
        self.skip_window_minors = minors;
        self
    }

    /// Get the policy ID.
    pub fn policy_id(&self) -> &str {
        &self.version
    }

    /// Deterministic hash of every parameter, exceptions included.
    pub fn params_hash(&self) -> Result<String, CanonicalError> {
        canonical_hash_hex(self)
    }

    /// `<package>.v<version>`.
    pub fn bundle_name(&self, version: &Version) -> String {
        format!("{}.v{}", self.package, version)
    }

    /// `<family>-<major>.<minor>`.
    pub fn channel_name(&self, line: &MinorLine) -> String {
        format!("{}-{}", self.channel_family, line)
    }

    /// Create a minimal policy for testing.
    #[cfg(test)]
    pub fn minimal() -> Self {
        Self::new("test-operator", "test")
    }
}

impl Default for UpdateGraphPolicyV1 {
    fn default() -> Self {
        Self::new("rhacs-operator", "rhacs").with_exceptions(ExceptionTable::rhacs())
    }
}
