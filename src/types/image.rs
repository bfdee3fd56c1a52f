//! Digest-qualified container image references.
//!
//! Every bundle must be addressed by content, so a reference is only accepted
//! when it carries a digest (`name[:tag]@algorithm:hex`). The grammar follows
//! the container distribution reference format.

use std::fmt;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Maximum length of the repository name part.
const NAME_TOTAL_LENGTH_MAX: usize = 255;

const DOMAIN_COMPONENT: &str = r"(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])";
const PATH_COMPONENT: &str = r"[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*";
const TAG: &str = r"[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}";
const DIGEST: &str = r"[A-Za-z][A-Za-z0-9]*(?:[-_+.][A-Za-z][A-Za-z0-9]*)*:[0-9a-fA-F]{32,}";

fn reference_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        let domain = format!(r"{d}(?:\.{d})*(?::[0-9]+)?", d = DOMAIN_COMPONENT);
        let name = format!(r"(?:{domain}/)?{p}(?:/{p})*", domain = domain, p = PATH_COMPONENT);
        let pattern = format!(
            r"^(?P<name>{name})(?::(?P<tag>{tag}))?(?:@(?P<digest>{digest}))?$",
            name = name,
            tag = TAG,
            digest = DIGEST,
        );
        Regex::new(&pattern).expect("image reference grammar is a valid regex")
    })
}

/// Error returned when an image reference is not usable as a bundle image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageReferenceError {
    /// The string does not follow the reference grammar.
    #[error("cannot parse {0:?} as a container image reference")]
    Invalid(String),
    /// Repository name exceeds the allowed length.
    #[error("repository name of {reference:?} is longer than {max} characters")]
    NameTooLong {
        /// Offending reference.
        reference: String,
        /// Maximum allowed length.
        max: usize,
    },
    /// Reference parsed but carries no digest.
    #[error("image reference {0:?} does not include a digest")]
    MissingDigest(String),
    /// Digest algorithm is not one we can verify.
    #[error("image reference {reference:?} uses unsupported digest algorithm {algorithm:?}")]
    UnsupportedAlgorithm {
        /// Offending reference.
        reference: String,
        /// Algorithm named in the digest.
        algorithm: String,
    },
    /// Digest hex has the wrong shape for its algorithm.
    #[error("image reference {reference:?} has an invalid {algorithm} digest: {reason}")]
    InvalidDigest {
        /// Offending reference.
        reference: String,
        /// Algorithm named in the digest.
        algorithm: String,
        /// What is wrong with the encoded part.
        reason: String,
    },
}

/// The `algorithm:hex` part of a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageDigest {
    algorithm: String,
    encoded: String,
}

impl ImageDigest {
    /// Digest algorithm (`sha256`, `sha384` or `sha512`).
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Lowercase hex encoding of the digest.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    fn validate(reference: &str, raw: &str) -> Result<Self, ImageReferenceError> {
        let (algorithm, encoded) = raw
            .split_once(':')
            .ok_or_else(|| ImageReferenceError::Invalid(reference.to_string()))?;

        let expected_bytes = match algorithm {
            "sha256" => <Sha256 as Digest>::output_size(),
            "sha384" => <Sha384 as Digest>::output_size(),
            "sha512" => <Sha512 as Digest>::output_size(),
            _ => {
                return Err(ImageReferenceError::UnsupportedAlgorithm {
                    reference: reference.to_string(),
                    algorithm: algorithm.to_string(),
                })
            }
        };

        let invalid = |reason: String| ImageReferenceError::InvalidDigest {
            reference: reference.to_string(),
            algorithm: algorithm.to_string(),
            reason,
        };

        if encoded.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(invalid("hex must be lowercase".to_string()));
        }
        let bytes = hex::decode(encoded).map_err(|e| invalid(e.to_string()))?;
        if bytes.len() != expected_bytes {
            return Err(invalid(format!(
                "expected {} hex characters, got {}",
                expected_bytes * 2,
                encoded.len()
            )));
        }

        Ok(Self {
            algorithm: algorithm.to_string(),
            encoded: encoded.to_string(),
        })
    }
}

impl fmt::Display for ImageDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.encoded)
    }
}

/// A validated, digest-qualified image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    original: String,
    name: String,
    tag: Option<String>,
    digest: ImageDigest,
}

impl ImageReference {
    /// Parse and validate a reference. A reference without digest is rejected.
    pub fn parse(reference: &str) -> Result<Self, ImageReferenceError> {
        let captures = reference_regex()
            .captures(reference)
            .ok_or_else(|| ImageReferenceError::Invalid(reference.to_string()))?;

        let name = captures
            .name("name")
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ImageReferenceError::Invalid(reference.to_string()))?;
        if name.len() > NAME_TOTAL_LENGTH_MAX {
            return Err(ImageReferenceError::NameTooLong {
                reference: reference.to_string(),
                max: NAME_TOTAL_LENGTH_MAX,
            });
        }

        let tag = captures.name("tag").map(|m| m.as_str().to_string());
        let digest = match captures.name("digest") {
            Some(raw) => ImageDigest::validate(reference, raw.as_str())?,
            None => return Err(ImageReferenceError::MissingDigest(reference.to_string())),
        };

        Ok(Self {
            original: reference.to_string(),
            name,
            tag,
            digest,
        })
    }

    /// Repository name, including the registry domain when present.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag, if the reference carries one next to the digest.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Content digest.
    pub fn digest(&self) -> &ImageDigest {
        &self.digest
    }

    /// The reference exactly as supplied.
    pub fn as_str(&self) -> &str {
        &self.original
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Serialize for ImageReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.original)
    }
}

impl<'de> Deserialize<'de> for ImageReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ImageReference::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA: &str = "6cdcf20771f9c46640b466f804190d00eaf2e59caee6d420436e78b283d177bf";

    #[test]
    fn test_parse_digest_reference() {
        let raw = format!("registry.redhat.io/advanced-cluster-security/rhacs-operator-bundle@sha256:{SHA}");
        let r = ImageReference::parse(&raw).unwrap();
        assert_eq!(r.name(), "registry.redhat.io/advanced-cluster-security/rhacs-operator-bundle");
        assert_eq!(r.tag(), None);
        assert_eq!(r.digest().algorithm(), "sha256");
        assert_eq!(r.digest().encoded(), SHA);
        assert_eq!(r.as_str(), raw);
    }

    #[test]
    fn test_parse_tag_and_digest_with_port() {
        let raw = format!("localhost:5000/team/bundle:4.1.0@sha256:{SHA}");
        let r = ImageReference::parse(&raw).unwrap();
        assert_eq!(r.name(), "localhost:5000/team/bundle");
        assert_eq!(r.tag(), Some("4.1.0"));
    }

    #[test]
    fn test_missing_digest_rejected() {
        let err = ImageReference::parse("example.com/image:4.0.0").unwrap_err();
        assert!(matches!(err, ImageReferenceError::MissingDigest(_)));
        assert!(err.to_string().contains("does not include a digest"));
    }

    #[test]
    fn test_malformed_rejected() {
        for raw in ["", "Example.com/UPPER@sha256:abc", "image@@sha256:x", "image with space"] {
            assert!(ImageReference::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_digest_length_checked() {
        let short = "example.com/image@sha256:6cdcf20771f9c46640b466f804190d00";
        assert!(matches!(
            ImageReference::parse(short),
            Err(ImageReferenceError::InvalidDigest { .. })
        ));

        let sha512 = format!("example.com/image@sha512:{SHA}{SHA}");
        assert!(ImageReference::parse(&sha512).is_ok());
    }

    #[test]
    fn test_unsupported_algorithm() {
        let raw = format!("example.com/image@md5:{SHA}");
        assert!(matches!(
            ImageReference::parse(&raw),
            Err(ImageReferenceError::UnsupportedAlgorithm { .. })
        ));
    }

    #[test]
    fn test_uppercase_hex_rejected() {
        let raw = format!("example.com/image@sha256:{}", SHA.to_uppercase());
        assert!(matches!(
            ImageReference::parse(&raw),
            Err(ImageReferenceError::InvalidDigest { .. })
        ));
    }
}
