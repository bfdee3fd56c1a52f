//! Deprecation of retired channels and unsupported bundles.
//!
//! Deprecations are additive and ordered:
//!
//! 1. the `latest` channel, always
//! 2. every y-stream channel whose floor is below the oldest supported
//!    version, ascending
//! 3. every bundle below the oldest supported version, ascending
//!
//! Raising the threshold can only add entries.

use std::collections::BTreeSet;

use tracing::warn;

use crate::policy::UpdateGraphPolicyV1;
use crate::types::{
    DeprecationEntry, DeprecationReference, Deprecations, MinorLine, Version, LATEST_CHANNEL,
    SCHEMA_BUNDLE, SCHEMA_CHANNEL, SCHEMA_DEPRECATIONS,
};

/// Message attached to the `latest` channel.
pub const LATEST_CHANNEL_MESSAGE: &str =
    "The `latest` channel is no longer supported.  Please switch to the `stable` channel.\n";

/// Message attached to unsupported y-stream channels.
pub const CHANNEL_MESSAGE: &str = "This version is no longer supported. Please switch to the `stable` channel or a channel for a version that is still supported.\n";

/// Message attached to unsupported bundles.
pub const BUNDLE_MESSAGE: &str =
    "This version is no longer supported. Please upgrade to a version that is still supported.\n";

/// Computes the deprecations record.
#[derive(Debug, Clone, Copy)]
pub struct DeprecationMarker<'a> {
    policy: &'a UpdateGraphPolicyV1,
}

impl<'a> DeprecationMarker<'a> {
    /// Create a marker for the policy's package.
    pub fn new(policy: &'a UpdateGraphPolicyV1) -> Self {
        Self { policy }
    }

    /// Build the deprecations record.
    ///
    /// # Arguments
    /// * `ystream_lines` - Lines that got a y-stream channel
    /// * `versions` - Every bundle version
    /// * `oldest_supported` - Support threshold
    pub fn mark<'v>(
        &self,
        ystream_lines: &[MinorLine],
        versions: impl IntoIterator<Item = &'v Version>,
        oldest_supported: &Version,
    ) -> Deprecations {
        let lines: BTreeSet<&MinorLine> = ystream_lines
            .iter()
            .filter(|line| &line.floor() < oldest_supported)
            .collect();
        let bundles: BTreeSet<&Version> = versions
            .into_iter()
            .filter(|v| *v < oldest_supported)
            .collect();

        if !ystream_lines.is_empty() && lines.len() == ystream_lines.len() {
            warn!(
                oldest_supported = %oldest_supported,
                channels = lines.len(),
                "every y-stream channel is below the oldest supported version"
            );
        }

        let mut entries = Vec::with_capacity(1 + lines.len() + bundles.len());
        entries.push(entry(SCHEMA_CHANNEL, LATEST_CHANNEL.to_string(), LATEST_CHANNEL_MESSAGE));
        entries.extend(
            lines
                .into_iter()
                .map(|line| entry(SCHEMA_CHANNEL, self.policy.channel_name(line), CHANNEL_MESSAGE)),
        );
        entries.extend(
            bundles
                .into_iter()
                .map(|v| entry(SCHEMA_BUNDLE, self.policy.bundle_name(v), BUNDLE_MESSAGE)),
        );

        Deprecations {
            schema: SCHEMA_DEPRECATIONS.to_string(),
            package: self.policy.package.clone(),
            entries,
        }
    }
}

fn entry(schema: &str, name: String, message: &str) -> DeprecationEntry {
    DeprecationEntry {
        reference: DeprecationReference {
            schema: schema.to_string(),
            name,
        },
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(deprecations: &Deprecations) -> Vec<(&str, &str)> {
        deprecations
            .entries
            .iter()
            .map(|e| (e.reference.schema.as_str(), e.reference.name.as_str()))
            .collect()
    }

    fn versions(list: &[&str]) -> Vec<Version> {
        list.iter().map(|s| Version::parse(s).unwrap()).collect()
    }

    #[test]
    fn test_latest_always_first() {
        let policy = UpdateGraphPolicyV1::default();
        let marker = DeprecationMarker::new(&policy);
        let deprecations = marker.mark(&[], &[], &Version::new(4, 0, 0));

        assert_eq!(deprecations.schema, "olm.deprecations");
        assert_eq!(deprecations.package, "rhacs-operator");
        assert_eq!(refs(&deprecations), vec![("olm.channel", "latest")]);
        assert_eq!(deprecations.entries[0].message, LATEST_CHANNEL_MESSAGE);
    }

    #[test]
    fn test_channels_then_bundles_below_threshold() {
        let policy = UpdateGraphPolicyV1::default();
        let marker = DeprecationMarker::new(&policy);
        let lines = [MinorLine::new(3, 62), MinorLine::new(4, 0)];
        let all = versions(&["3.62.0", "3.62.1", "4.0.0", "4.0.1"]);

        let deprecations = marker.mark(&lines, &all, &Version::new(4, 0, 0));
        assert_eq!(
            refs(&deprecations),
            vec![
                ("olm.channel", "latest"),
                ("olm.channel", "rhacs-3.62"),
                ("olm.bundle", "rhacs-operator.v3.62.0"),
                ("olm.bundle", "rhacs-operator.v3.62.1"),
            ]
        );
        assert_eq!(deprecations.entries[1].message, CHANNEL_MESSAGE);
        assert_eq!(deprecations.entries[2].message, BUNDLE_MESSAGE);
    }

    #[test]
    fn test_threshold_inside_a_line_deprecates_its_channel() {
        let policy = UpdateGraphPolicyV1::default();
        let marker = DeprecationMarker::new(&policy);
        let lines = [MinorLine::new(4, 1), MinorLine::new(4, 2)];
        let all = versions(&["4.1.0", "4.1.1", "4.1.2", "4.2.0"]);

        let deprecations = marker.mark(&lines, &all, &Version::new(4, 1, 2));
        assert_eq!(
            refs(&deprecations),
            vec![
                ("olm.channel", "latest"),
                ("olm.channel", "rhacs-4.1"),
                ("olm.bundle", "rhacs-operator.v4.1.0"),
                ("olm.bundle", "rhacs-operator.v4.1.1"),
            ]
        );
    }

    #[test]
    fn test_raising_threshold_only_adds() {
        let policy = UpdateGraphPolicyV1::default();
        let marker = DeprecationMarker::new(&policy);
        let lines = [MinorLine::new(4, 0), MinorLine::new(4, 1), MinorLine::new(4, 2)];
        let all = versions(&["4.0.0", "4.1.0", "4.1.3", "4.2.0"]);

        let mut previous: Vec<DeprecationEntry> = Vec::new();
        for threshold in ["4.0.0", "4.1.0", "4.1.3", "4.2.0", "5.0.0"] {
            let current = marker.mark(&lines, &all, &Version::parse(threshold).unwrap()).entries;
            for e in &previous {
                assert!(current.contains(e), "{threshold} dropped {:?}", e.reference);
            }
            previous = current;
        }
        assert_eq!(previous.len(), 1 + 3 + 4);
    }
}
