//! Strict release versions.
//!
//! A [`Version`] is a `major.minor.patch` triple. Parsing is strict: exactly
//! three numeric components, no leading zeros, no `v` prefix and no
//! pre-release or build metadata. The text supplied in the input is kept and
//! used verbatim wherever the version is embedded into generated names.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when a string is not a strict `major.minor.patch` version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// Wrong number of dot-separated components.
    #[error("invalid semantic version {input:?}: expected exactly three components major.minor.patch")]
    Malformed {
        /// Offending input.
        input: String,
    },
    /// Pre-release or build metadata present.
    #[error("invalid semantic version {input:?}: pre-release and build metadata are not permitted")]
    Metadata {
        /// Offending input.
        input: String,
    },
    /// A component contains something other than ASCII digits.
    #[error("invalid semantic version {input:?}: component {component:?} is not numeric")]
    NotNumeric {
        /// Offending input.
        input: String,
        /// Offending component.
        component: String,
    },
    /// A component has a leading zero.
    #[error("invalid semantic version {input:?}: component {component:?} has a leading zero")]
    LeadingZero {
        /// Offending input.
        input: String,
        /// Offending component.
        component: String,
    },
    /// A component does not fit in 64 bits.
    #[error("invalid semantic version {input:?}: component {component:?} is out of range")]
    OutOfRange {
        /// Offending input.
        input: String,
        /// Offending component.
        component: String,
    },
}

/// A released version.
///
/// Equality, hashing and ordering only look at the numeric triple.
#[derive(Debug, Clone)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    original: String,
}

impl Version {
    /// Create a version from its components.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            original: format!("{}.{}.{}", major, minor, patch),
        }
    }

    /// Parse a strict `major.minor.patch` version.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        if input.contains(['-', '+']) {
            return Err(VersionError::Metadata { input: input.to_string() });
        }

        let components: Vec<&str> = input.split('.').collect();
        let [major, minor, patch] = components.as_slice() else {
            return Err(VersionError::Malformed { input: input.to_string() });
        };

        Ok(Self {
            major: parse_component(input, major)?,
            minor: parse_component(input, minor)?,
            patch: parse_component(input, patch)?,
            original: input.to_string(),
        })
    }

    /// Major component.
    pub fn major(&self) -> u64 {
        self.major
    }

    /// Minor component.
    pub fn minor(&self) -> u64 {
        self.minor
    }

    /// Patch component.
    pub fn patch(&self) -> u64 {
        self.patch
    }

    /// The (major, minor) line this version belongs to.
    pub fn line(&self) -> MinorLine {
        MinorLine::new(self.major, self.minor)
    }

    /// `major.(minor + offset).0`.
    pub fn minor_offset(&self, offset: u64) -> Version {
        Version::new(self.major, self.minor.saturating_add(offset), 0)
    }

    fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

fn parse_component(input: &str, component: &str) -> Result<u64, VersionError> {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::NotNumeric {
            input: input.to_string(),
            component: component.to_string(),
        });
    }
    if component.len() > 1 && component.starts_with('0') {
        return Err(VersionError::LeadingZero {
            input: input.to_string(),
            component: component.to_string(),
        });
    }
    component.parse().map_err(|_| VersionError::OutOfRange {
        input: input.to_string(),
        component: component.to_string(),
    })
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.triple() == other.triple()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.triple().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple().cmp(&other.triple())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.original)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A (major, minor) line, the unit a y-stream channel is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MinorLine {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
}

impl MinorLine {
    /// Create a new line.
    pub fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }

    /// `major.minor.0`.
    pub fn floor(&self) -> Version {
        Version::new(self.major, self.minor, 0)
    }
}

impl fmt::Display for MinorLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
