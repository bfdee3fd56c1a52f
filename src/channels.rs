//! Deterministic channel assignment.
//!
//! The assigner folds over the ascending version list once. Each step sees
//! only state produced by strictly lower versions, carried in an explicit
//! accumulator (`AssignerState`) that is returned from every step.
//!
//! ## Algorithm
//!
//! For every version `v`:
//!
//! 1. If `v` starts a new (major, minor) line that is not merged, close the
//!    open channel segment
//! 2. If `v` is the first version at or past the `latest` cut-over, freeze
//!    every entry produced so far into the `latest` channel
//! 3. If `v` is the first version at or past the era boundary, drop the
//!    carried ("persistent") entries
//! 4. On a line change, move the floor to the previous line and, unless the
//!    line is merged, open a segment seeded with the persistent entries
//! 5. Build the entry, append it to the open segment and to the history
//! 6. Remember the entry as persistent if its patch is 0 or the exception
//!    table pins it
//!
//! After the last version the open segment is closed and `stable` is emitted
//! with the full history.

use tracing::debug;

use crate::edges::{EdgeBuilder, EdgeError};
use crate::policy::UpdateGraphPolicyV1;
use crate::types::{
    Channel, ChannelEntry, MinorLine, Version, VersionCatalog, LATEST_CHANNEL, STABLE_CHANNEL,
};

/// Error type for channel assignment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignError {
    /// A merged line appeared while no channel was open to receive it.
    #[error("version {version} belongs to merged line {line} but no channel is open to merge it into")]
    NoOpenChannel {
        /// Offending version.
        version: Version,
        /// Its line.
        line: MinorLine,
    },
    /// A segment was closed without any entry.
    #[error("channel segment for line {line} was closed with no entries")]
    EmptySegment {
        /// Line of the empty segment.
        line: MinorLine,
    },
    /// Edge computation failed.
    #[error(transparent)]
    Edge(#[from] EdgeError),
}

/// Channels produced by one assignment pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLayout {
    /// Channels in emission order: y-streams ascending with `latest` at its
    /// cut-over point, `stable` last.
    pub channels: Vec<Channel>,
    /// Lines that got a y-stream channel, ascending.
    pub ystream_lines: Vec<MinorLine>,
}

#[derive(Debug, Clone)]
struct Segment {
    line: MinorLine,
    entries: Vec<ChannelEntry>,
}

/// Rolling state threaded through the fold.
#[derive(Debug, Clone, Default)]
struct AssignerState {
    channels: Vec<Channel>,
    ystream_lines: Vec<MinorLine>,
    open: Option<Segment>,
    persistent: Vec<ChannelEntry>,
    history: Vec<ChannelEntry>,
    previous: Option<Version>,
    floor: Option<Version>,
    latest_frozen: bool,
    era_started: bool,
}

/// Partitions a catalog into channels.
#[derive(Debug, Clone, Copy)]
pub struct ChannelAssigner<'a> {
    policy: &'a UpdateGraphPolicyV1,
    edges: EdgeBuilder<'a>,
}

impl<'a> ChannelAssigner<'a> {
    /// Create an assigner for one catalog.
    pub fn new(policy: &'a UpdateGraphPolicyV1, catalog: &'a VersionCatalog) -> Self {
        Self {
            policy,
            edges: EdgeBuilder::new(policy, catalog.broken_versions()),
        }
    }

    /// Run the pass. `versions` must be strictly ascending, which
    /// [`VersionCatalog`] guarantees.
    pub fn assign<'v>(
        &self,
        versions: impl IntoIterator<Item = &'v Version>,
    ) -> Result<ChannelLayout, AssignError> {
        let state = versions
            .into_iter()
            .try_fold(AssignerState::default(), |state, version| self.step(state, version))?;
        self.finish(state)
    }

    fn step(&self, mut state: AssignerState, version: &Version) -> Result<AssignerState, AssignError> {
        let exceptions = &self.policy.exceptions;
        let line = version.line();
        let previous_line = state.previous.as_ref().map(Version::line);
        let line_changed = previous_line != Some(line);
        let merged = exceptions.is_merged(&line);

        if line_changed && !merged {
            if let Some(segment) = state.open.take() {
                self.close(&mut state, segment)?;
            }
        }

        if !state.latest_frozen && reached(exceptions.latest_cutover.as_ref(), version) {
            debug!(at = %version, entries = state.history.len(), "freezing latest channel");
            state.channels.push(self.channel(LATEST_CHANNEL, state.history.clone()));
            state.latest_frozen = true;
        }

        if !state.era_started && reached(exceptions.era_boundary.as_ref(), version) {
            debug!(at = %version, dropped = state.persistent.len(), "era boundary, dropping carried entries");
            state.persistent.clear();
            state.era_started = true;
        }

        if line_changed {
            state.floor = Some(match previous_line {
                Some(previous) => previous.floor(),
                None => exceptions.initial_floor.clone().unwrap_or_else(|| line.floor()),
            });
            if !merged {
                debug!(
                    channel = %self.policy.channel_name(&line),
                    inherited = state.persistent.len(),
                    "opening channel"
                );
                state.open = Some(Segment { line, entries: state.persistent.clone() });
                state.ystream_lines.push(line);
            }
        }

        let floor = state.floor.clone().unwrap_or_else(|| line.floor());
        let segment = state.open.as_mut().ok_or_else(|| AssignError::NoOpenChannel {
            version: version.clone(),
            line,
        })?;
        let entry = self.edges.build(version, state.previous.as_ref(), &floor)?;
        segment.entries.push(entry.clone());
        state.history.push(entry.clone());

        if self.is_persistent(version) {
            state.persistent.push(entry);
        }
        state.previous = Some(version.clone());

        Ok(state)
    }

    fn finish(&self, mut state: AssignerState) -> Result<ChannelLayout, AssignError> {
        if let Some(segment) = state.open.take() {
            self.close(&mut state, segment)?;
        }
        let stable = self.channel(STABLE_CHANNEL, std::mem::take(&mut state.history));
        state.channels.push(stable);

        Ok(ChannelLayout {
            channels: state.channels,
            ystream_lines: state.ystream_lines,
        })
    }

    fn close(&self, state: &mut AssignerState, segment: Segment) -> Result<(), AssignError> {
        if segment.entries.is_empty() {
            return Err(AssignError::EmptySegment { line: segment.line });
        }
        let name = self.policy.channel_name(&segment.line);
        state.channels.push(self.channel(name, segment.entries));
        Ok(())
    }

    fn channel(&self, name: impl Into<String>, entries: Vec<ChannelEntry>) -> Channel {
        Channel::new(name, self.policy.package.clone(), entries)
    }

    /// Whether the entry for `version` is carried into later segments.
    pub fn is_persistent(&self, version: &Version) -> bool {
        version.patch() == 0 || self.policy.exceptions.is_pinned_persistent(version)
    }
}

fn reached(threshold: Option<&Version>, version: &Version) -> bool {
    threshold.is_some_and(|t| version >= t)
}
