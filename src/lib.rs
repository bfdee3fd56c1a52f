//! # update-graph
//!
//! Deterministic compilation of released operator versions into an OLM
//! file-based catalog template.
//!
//! The compiler answers one question:
//!
//! > Given every released bundle, which upgrade paths may a cluster take?
//!
//! ## Core Contract
//!
//! 1. Given a sorted, digest-addressed version list, place every version in
//!    exactly one y-stream channel and in `stable`
//! 2. Give every channel entry `replaces`, `skipRange` and `skips` edges
//! 3. Deprecate the `latest` channel plus every channel and bundle below the
//!    oldest supported version
//!
//! ## Architecture
//!
//! ```text
//! bundles.yaml → loader → VersionCatalog → compile → CatalogTemplate → render
//!                                             ↓
//!                          UpdateGraphPolicyV1 (+ ExceptionTable)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same catalog + same policy + same icon → byte-identical output
//! - Channels are ordered by opening, entries by version
//! - Deprecations are ordered `latest`, channels, bundles, each ascending

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod policy;
pub mod canonical;
pub mod edges;
pub mod channels;
pub mod deprecation;
pub mod assembler;
pub mod loader;
pub mod render;

// Re-exports
pub use types::{
    Version, VersionError, MinorLine, ImageReference, ImageDigest, ImageReferenceError,
    BundleImage, VersionCatalog, CatalogError,
    CatalogTemplate, CatalogEntry, Package, Icon, Channel, ChannelEntry,
    Deprecations, DeprecationEntry, DeprecationReference, BundleEntry,
    LATEST_CHANNEL, STABLE_CHANNEL,
};
pub use policy::{UpdateGraphPolicyV1, ExceptionTable, DEFAULT_SKIP_WINDOW_MINORS, RHACS_EXCEPTIONS_REVISION};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex, CanonicalError};
pub use edges::{EdgeBuilder, EdgeError};
pub use channels::{ChannelAssigner, ChannelLayout, AssignError};
pub use deprecation::DeprecationMarker;
pub use assembler::{compile, CatalogAssembler, CompileError};
pub use loader::{parse_input, load_input, load_icon, load_policy, LoadError};
pub use render::{render, render_yaml, render_json, write_template, output_digest, OutputFormat, RenderError};

/// Schema version of the policy and exception table types.
/// Increment on breaking changes to either.
pub const UPDATE_GRAPH_SCHEMA_VERSION: &str = "1.0.0";

/// Default policy version identifier.
pub const DEFAULT_POLICY_VERSION: &str = "update_graph_policy_v1";
