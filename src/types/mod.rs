//! Core types for the update-graph compiler.

pub mod version;
pub mod image;
pub mod catalog;
pub mod template;

pub use version::{Version, VersionError, MinorLine};
pub use image::{ImageReference, ImageDigest, ImageReferenceError};
pub use catalog::{BundleImage, VersionCatalog, CatalogError};
pub use template::{
    CatalogTemplate, CatalogEntry, Package, Icon, Channel, ChannelEntry,
    Deprecations, DeprecationEntry, DeprecationReference, BundleEntry,
    SCHEMA_TEMPLATE, SCHEMA_PACKAGE, SCHEMA_CHANNEL, SCHEMA_DEPRECATIONS, SCHEMA_BUNDLE,
    LATEST_CHANNEL, STABLE_CHANNEL,
};
