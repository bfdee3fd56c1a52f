//! Input loading.
//!
//! Reads the bundle list document, the package icon and an optional policy
//! file. Every failure names the field or list position it came from.
//!
//! ```yaml
//! oldest_supported_version: 4.0.0
//! broken_versions:
//!   - 4.1.0
//! images:
//!   - image: registry.example.com/operator-bundle@sha256:<hex>
//!     version: 4.0.0
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::policy::UpdateGraphPolicyV1;
use crate::types::{
    BundleImage, CatalogError, Icon, ImageReference, ImageReferenceError, Version, VersionCatalog,
    VersionError,
};

/// Error type for loading inputs.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File could not be read.
    #[error("failed to read {path}: {error}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        error: std::io::Error,
    },
    /// Document is not valid YAML for the expected shape.
    #[error("failed to unmarshal YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Policy file is not valid JSON for the expected shape.
    #[error("failed to parse policy: {0}")]
    Policy(#[from] serde_json::Error),
    /// `oldest_supported_version` is not a strict version.
    #[error("invalid oldest_supported_version: {0}")]
    OldestSupportedVersion(VersionError),
    /// An item of `broken_versions` is not a strict version.
    #[error("invalid item in broken_versions at position {index}: {error}")]
    BrokenVersion {
        /// Position in the list.
        index: usize,
        /// Parse error.
        error: VersionError,
    },
    /// An image's version is not a strict version.
    #[error("invalid version of image at position {index}: {error}")]
    ImageVersion {
        /// Position in the list.
        index: usize,
        /// Parse error.
        error: VersionError,
    },
    /// An image reference is malformed or has no digest.
    #[error("invalid image reference for version {version}: {error}")]
    ImageReference {
        /// Version the image was listed for.
        version: Version,
        /// Validation error.
        error: ImageReferenceError,
    },
    /// The image list breaks the ordering precondition.
    #[error("invalid image list: {0}")]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InputDocument {
    oldest_supported_version: String,
    #[serde(default)]
    broken_versions: Vec<String>,
    #[serde(default)]
    images: Vec<InputImage>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InputImage {
    image: String,
    #[serde(alias = "tag")]
    version: String,
}

/// Parse a bundle list document into a validated catalog.
pub fn parse_input(yaml: &str) -> Result<VersionCatalog, LoadError> {
    let document: InputDocument = serde_yaml::from_str(yaml)?;

    let oldest = Version::parse(&document.oldest_supported_version)
        .map_err(LoadError::OldestSupportedVersion)?;

    let broken = document
        .broken_versions
        .iter()
        .enumerate()
        .map(|(index, raw)| Version::parse(raw).map_err(|error| LoadError::BrokenVersion { index, error }))
        .collect::<Result<Vec<_>, _>>()?;

    let images = document
        .images
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let version =
                Version::parse(&raw.version).map_err(|error| LoadError::ImageVersion { index, error })?;
            let image = ImageReference::parse(&raw.image).map_err(|error| LoadError::ImageReference {
                version: version.clone(),
                error,
            })?;
            Ok(BundleImage::new(version, image))
        })
        .collect::<Result<Vec<_>, LoadError>>()?;

    let catalog = VersionCatalog::new(images, oldest, broken)?;
    debug!(
        images = catalog.len(),
        broken = catalog.broken_versions().len(),
        oldest_supported = %catalog.oldest_supported_version(),
        "bundle list parsed"
    );
    Ok(catalog)
}

/// Read and parse a bundle list file.
pub fn load_input(path: &Path) -> Result<VersionCatalog, LoadError> {
    parse_input(&read_to_string(path)?)
}

/// Read a PNG icon file.
pub fn load_icon(path: &Path) -> Result<Icon, LoadError> {
    let bytes = std::fs::read(path).map_err(|error| LoadError::Read {
        path: path.to_path_buf(),
        error,
    })?;
    Ok(Icon::from_png(&bytes))
}

/// Read a JSON policy file.
pub fn load_policy(path: &Path) -> Result<UpdateGraphPolicyV1, LoadError> {
    Ok(serde_json::from_str(&read_to_string(path)?)?)
}

fn read_to_string(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|error| LoadError::Read {
        path: path.to_path_buf(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
oldest_supported_version: 4.0.0
broken_versions:
  - 4.1.0
images:
  - image: example.com/image@sha256:6cdcf20771f9c46640b466f804190d00eaf2e59caee6d420436e78b283d177bf
    version: 3.62.0
  - image: example.com/image@sha256:7fd7595e6a61352088f9a3a345be03a6c0b9caa0bbc5ddd8c61ba1d38b2c3b8e
    version: 4.0.0
  - image: example.com/image@sha256:272e3d6e2f7f207b3d3866d8be00715e6a6086d50b110c45662d99d217d48dbc
    version: 4.1.0
  - image: example.com/image@sha256:68633e6b12768689f352e1318dc0acc388522d8b6295bf6ca662834cf1367b85
    version: 4.2.0
"#;

    const DIGEST: &str = "6cdcf20771f9c46640b466f804190d00eaf2e59caee6d420436e78b283d177bf";

    fn expect_error(yaml: &str, needle: &str) {
        let err = parse_input(yaml).unwrap_err();
        assert!(err.to_string().contains(needle), "{err} does not contain {needle:?}");
    }

    #[test]
    fn test_valid_input() {
        let catalog = parse_input(VALID).unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.oldest_supported_version(), &Version::new(4, 0, 0));
        assert_eq!(catalog.broken_versions().iter().collect::<Vec<_>>(), vec![&Version::new(4, 1, 0)]);
        assert_eq!(
            catalog.versions().map(Version::to_string).collect::<Vec<_>>(),
            vec!["3.62.0", "4.0.0", "4.1.0", "4.2.0"]
        );
        assert_eq!(
            catalog.images()[3].image.as_str(),
            "example.com/image@sha256:68633e6b12768689f352e1318dc0acc388522d8b6295bf6ca662834cf1367b85"
        );
        assert!(VALID.contains(catalog.images()[0].image.as_str()));
    }

    #[test]
    fn test_legacy_tag_field() {
        let yaml = format!(
            "oldest_supported_version: 4.0.0\nimages:\n  - image: example.com/i@sha256:{DIGEST}\n    tag: 4.0.0\n"
        );
        let catalog = parse_input(&yaml).unwrap();
        assert!(catalog.broken_versions().is_empty());
        assert_eq!(catalog.images()[0].version, Version::new(4, 0, 0));
    }

    #[test]
    fn test_invalid_yaml() {
        expect_error("images: [unclosed", "failed to unmarshal YAML");
        expect_error("images: []\n", "failed to unmarshal YAML");
    }

    #[test]
    fn test_invalid_oldest_supported_version() {
        expect_error("oldest_supported_version: four\n", "invalid oldest_supported_version");
        expect_error("oldest_supported_version: 4.0.0-rc1\n", "invalid semantic version");
    }

    #[test]
    fn test_invalid_broken_versions() {
        expect_error(
            "oldest_supported_version: 4.0.0\nbroken_versions: [4.1.0, 4.1.x]\n",
            "invalid item in broken_versions at position 1",
        );
    }

    #[test]
    fn test_invalid_image_version() {
        let yaml = format!(
            "oldest_supported_version: 4.0.0\nimages:\n  - image: example.com/i@sha256:{DIGEST}\n    version: v4.0.0\n"
        );
        expect_error(&yaml, "invalid version");
    }

    #[test]
    fn test_image_without_digest() {
        let yaml = "oldest_supported_version: 4.0.0\nimages:\n  - image: example.com/i:4.0.0\n    version: 4.0.0\n";
        expect_error(yaml, "does not include a digest");
    }

    #[test]
    fn test_unsorted_images() {
        let yaml = format!(
            "oldest_supported_version: 4.0.0\nimages:\n  - image: example.com/i@sha256:{DIGEST}\n    version: 4.1.0\n  - image: example.com/i@sha256:{DIGEST}\n    version: 4.0.0\n"
        );
        expect_error(&yaml, "not sorted ascending");
    }

    #[test]
    fn test_missing_file() {
        let err = load_input(Path::new("/nonexistent/bundles.yaml")).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }
}
