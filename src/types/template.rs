//! Output objects of the basic catalog template.
//!
//! Field names and field order match the `olm.template.basic` schema; the
//! serializers emit fields in declaration order, which keeps rendering
//! byte-stable.

use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_hash_hex, CanonicalError};

/// Schema discriminator of the whole template.
pub const SCHEMA_TEMPLATE: &str = "olm.template.basic";
/// Schema of the package record.
pub const SCHEMA_PACKAGE: &str = "olm.package";
/// Schema of channel records and channel deprecation references.
pub const SCHEMA_CHANNEL: &str = "olm.channel";
/// Schema of the deprecations record.
pub const SCHEMA_DEPRECATIONS: &str = "olm.deprecations";
/// Schema of bundle records and bundle deprecation references.
pub const SCHEMA_BUNDLE: &str = "olm.bundle";

/// Name of the frozen legacy channel.
pub const LATEST_CHANNEL: &str = "latest";
/// Name of the default channel.
pub const STABLE_CHANNEL: &str = "stable";

/// Package icon payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    /// Base64 of the image bytes.
    pub base64data: String,
    /// Media type of the image.
    pub mediatype: String,
}

impl Icon {
    /// Encode PNG bytes as an icon.
    pub fn from_png(bytes: &[u8]) -> Self {
        use base64::Engine as _;
        Self {
            base64data: base64::engine::general_purpose::STANDARD.encode(bytes),
            mediatype: "image/png".to_string(),
        }
    }
}

/// `olm.package` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Always [`SCHEMA_PACKAGE`].
    pub schema: String,
    /// Package name.
    pub name: String,
    /// Channel new subscriptions use.
    #[serde(rename = "defaultChannel")]
    pub default_channel: String,
    /// Icon shown in catalogs.
    pub icon: Icon,
}

/// One version's node in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEntry {
    /// Bundle name, `<package>.v<version>`.
    pub name: String,
    /// Single predecessor, absent for rootless versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<String>,
    /// `>= <floor> < <version>`.
    #[serde(rename = "skipRange")]
    pub skip_range: String,
    /// Broken bundles this version may jump over.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skips: Vec<String>,
}

/// `olm.channel` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Always [`SCHEMA_CHANNEL`].
    pub schema: String,
    /// Channel name.
    pub name: String,
    /// Owning package.
    pub package: String,
    /// Entries in ascending version order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<ChannelEntry>,
}

impl Channel {
    /// Create a channel with the given entries.
    pub fn new(name: impl Into<String>, package: impl Into<String>, entries: Vec<ChannelEntry>) -> Self {
        Self {
            schema: SCHEMA_CHANNEL.to_string(),
            name: name.into(),
            package: package.into(),
            entries,
        }
    }

    /// Find an entry by bundle name.
    pub fn entry(&self, name: &str) -> Option<&ChannelEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// What a deprecation points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecationReference {
    /// [`SCHEMA_CHANNEL`] or [`SCHEMA_BUNDLE`].
    pub schema: String,
    /// Channel or bundle name.
    pub name: String,
}

/// One deprecated channel or bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecationEntry {
    /// Deprecated object.
    pub reference: DeprecationReference,
    /// User-facing message.
    pub message: String,
}

/// `olm.deprecations` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deprecations {
    /// Always [`SCHEMA_DEPRECATIONS`].
    pub schema: String,
    /// Owning package.
    pub package: String,
    /// Ordered deprecation entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<DeprecationEntry>,
}

/// `olm.bundle` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleEntry {
    /// Always [`SCHEMA_BUNDLE`].
    pub schema: String,
    /// Digest-qualified bundle image.
    pub image: String,
}

impl BundleEntry {
    /// Create a bundle record.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            schema: SCHEMA_BUNDLE.to_string(),
            image: image.into(),
        }
    }
}

/// Any object of the template; each variant carries its own `schema` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    /// Package record.
    Package(Package),
    /// Channel record.
    Channel(Channel),
    /// Deprecations record.
    Deprecations(Deprecations),
    /// Bundle record.
    Bundle(BundleEntry),
}

impl CatalogEntry {
    /// Schema discriminator of the wrapped object.
    pub fn schema(&self) -> &str {
        match self {
            Self::Package(p) => &p.schema,
            Self::Channel(c) => &c.schema,
            Self::Deprecations(d) => &d.schema,
            Self::Bundle(b) => &b.schema,
        }
    }
}

/// The generated catalog template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTemplate {
    /// Always [`SCHEMA_TEMPLATE`].
    pub schema: String,
    /// Package, channels, deprecations, bundles, in that order.
    pub entries: Vec<CatalogEntry>,
}

impl CatalogTemplate {
    /// Empty template.
    pub fn new() -> Self {
        Self {
            schema: SCHEMA_TEMPLATE.to_string(),
            entries: Vec::new(),
        }
    }

    /// The package record, if present.
    pub fn package(&self) -> Option<&Package> {
        self.entries.iter().find_map(|e| match e {
            CatalogEntry::Package(p) => Some(p),
            _ => None,
        })
    }

    /// Channel records in template order.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> + '_ {
        self.entries.iter().filter_map(|e| match e {
            CatalogEntry::Channel(c) => Some(c),
            _ => None,
        })
    }

    /// Channel by name.
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels().find(|c| c.name == name)
    }

    /// The deprecations record, if present.
    pub fn deprecations(&self) -> Option<&Deprecations> {
        self.entries.iter().find_map(|e| match e {
            CatalogEntry::Deprecations(d) => Some(d),
            _ => None,
        })
    }

    /// Bundle records in template order.
    pub fn bundles(&self) -> impl Iterator<Item = &BundleEntry> + '_ {
        self.entries.iter().filter_map(|e| match e {
            CatalogEntry::Bundle(b) => Some(b),
            _ => None,
        })
    }

    /// Deterministic fingerprint of the whole template (xxh64 of canonical JSON).
    pub fn fingerprint(&self) -> Result<String, CanonicalError> {
        canonical_hash_hex(self)
    }
}

impl Default for CatalogTemplate {
    fn default() -> Self {
        Self::new()
    }
}
