//! The validated input of a compile run.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::image::ImageReference;
use super::version::Version;

/// Error returned when the version sequence breaks the ordering precondition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Two images carry the same version.
    #[error("duplicate version {version} at position {index} (already listed at position {first_index})")]
    DuplicateVersion {
        /// Repeated version.
        version: Version,
        /// Position of the first occurrence.
        first_index: usize,
        /// Position of the repeat.
        index: usize,
    },
    /// A version is lower than the one before it.
    #[error("versions are not sorted ascending: {version} at position {index} follows {previous}")]
    Unsorted {
        /// Version at `index - 1`.
        previous: Version,
        /// Version at `index`.
        version: Version,
        /// Position of the out-of-order version.
        index: usize,
    },
}

/// One released version and the bundle image that ships it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleImage {
    /// Bundle image, always digest-qualified.
    pub image: ImageReference,
    /// Released version.
    pub version: Version,
}

impl BundleImage {
    /// Create a new bundle image.
    pub fn new(version: Version, image: ImageReference) -> Self {
        Self { image, version }
    }
}

/// Ascending, duplicate-free list of bundle images with support metadata.
///
/// Construction validates the ordering precondition; every later stage
/// relies on it and does not re-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCatalog {
    images: Vec<BundleImage>,
    oldest_supported_version: Version,
    broken_versions: BTreeSet<Version>,
}

impl VersionCatalog {
    /// Validate and build a catalog.
    ///
    /// Fails on the first out-of-order or repeated version.
    pub fn new(
        images: Vec<BundleImage>,
        oldest_supported_version: Version,
        broken_versions: impl IntoIterator<Item = Version>,
    ) -> Result<Self, CatalogError> {
        for (index, pair) in images.windows(2).enumerate() {
            let (previous, current) = (&pair[0].version, &pair[1].version);
            if current == previous {
                return Err(CatalogError::DuplicateVersion {
                    version: current.clone(),
                    first_index: index,
                    index: index + 1,
                });
            }
            if current < previous {
                return Err(CatalogError::Unsorted {
                    previous: previous.clone(),
                    version: current.clone(),
                    index: index + 1,
                });
            }
        }

        Ok(Self {
            images,
            oldest_supported_version,
            broken_versions: broken_versions.into_iter().collect(),
        })
    }

    /// Bundle images in ascending version order.
    pub fn images(&self) -> &[BundleImage] {
        &self.images
    }

    /// Versions in ascending order.
    pub fn versions(&self) -> impl Iterator<Item = &Version> + '_ {
        self.images.iter().map(|b| &b.version)
    }

    /// Every version strictly below this one is unsupported.
    pub fn oldest_supported_version(&self) -> &Version {
        &self.oldest_supported_version
    }

    /// Versions known to be defective.
    pub fn broken_versions(&self) -> &BTreeSet<Version> {
        &self.broken_versions
    }

    /// Number of bundle images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the catalog has no images.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
