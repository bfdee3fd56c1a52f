//! Catalog assembly and the compile entry point.
//!
//! ```text
//! VersionCatalog → ChannelAssigner (+ EdgeBuilder) → DeprecationMarker → CatalogAssembler
//! ```
//!
//! [`compile`] is a pure function of the catalog, the policy and the icon:
//! running it twice yields identical templates.

use tracing::{info, info_span};

use crate::canonical::CanonicalError;
use crate::channels::{AssignError, ChannelAssigner};
use crate::deprecation::DeprecationMarker;
use crate::policy::UpdateGraphPolicyV1;
use crate::types::{
    BundleEntry, BundleImage, CatalogEntry, CatalogTemplate, Channel, Deprecations, Icon, Package,
    VersionCatalog, SCHEMA_PACKAGE, STABLE_CHANNEL,
};

/// Error type for a compile run.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Channel assignment failed.
    #[error("channel assignment failed: {0}")]
    Assign(#[from] AssignError),
    /// The assembled template is missing a required part.
    #[error("assembled catalog is incomplete: {0}")]
    Incomplete(String),
    /// Policy or template could not be fingerprinted.
    #[error("fingerprint failed: {0}")]
    Fingerprint(#[from] CanonicalError),
}

/// Appends template objects in the fixed schema order.
#[derive(Debug, Clone, Default)]
pub struct CatalogAssembler {
    template: CatalogTemplate,
}

impl CatalogAssembler {
    /// Start an empty template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the package record.
    pub fn package(mut self, package: Package) -> Self {
        self.template.entries.push(CatalogEntry::Package(package));
        self
    }

    /// Append channel records in the given order.
    pub fn channels(mut self, channels: impl IntoIterator<Item = Channel>) -> Self {
        self.template.entries.extend(channels.into_iter().map(CatalogEntry::Channel));
        self
    }

    /// Append the deprecations record.
    pub fn deprecations(mut self, deprecations: Deprecations) -> Self {
        self.template.entries.push(CatalogEntry::Deprecations(deprecations));
        self
    }

    /// Append one bundle record per image.
    pub fn bundles<'b>(mut self, images: impl IntoIterator<Item = &'b BundleImage>) -> Self {
        self.template.entries.extend(
            images
                .into_iter()
                .map(|b| CatalogEntry::Bundle(BundleEntry::new(b.image.as_str()))),
        );
        self
    }

    /// Check structural completeness and return the template.
    pub fn finish(self, expected_bundles: usize) -> Result<CatalogTemplate, CompileError> {
        let template = self.template;

        let packages = template.entries.iter().filter(|e| matches!(e, CatalogEntry::Package(_))).count();
        if packages != 1 {
            return Err(CompileError::Incomplete(format!("expected one package record, found {packages}")));
        }
        if !matches!(template.entries.first(), Some(CatalogEntry::Package(_))) {
            return Err(CompileError::Incomplete("package record must come first".to_string()));
        }
        if template.channels().last().map(|c| c.name.as_str()) != Some(STABLE_CHANNEL) {
            return Err(CompileError::Incomplete(format!("`{STABLE_CHANNEL}` must be the last channel")));
        }
        let deprecations = template
            .entries
            .iter()
            .filter(|e| matches!(e, CatalogEntry::Deprecations(_)))
            .count();
        if deprecations != 1 {
            return Err(CompileError::Incomplete(format!(
                "expected one deprecations record, found {deprecations}"
            )));
        }
        let bundles = template.bundles().count();
        if bundles != expected_bundles {
            return Err(CompileError::Incomplete(format!(
                "expected {expected_bundles} bundle records, found {bundles}"
            )));
        }

        Ok(template)
    }
}

/// Compile a validated catalog into a basic catalog template.
pub fn compile(
    catalog: &VersionCatalog,
    policy: &UpdateGraphPolicyV1,
    icon: Icon,
) -> Result<CatalogTemplate, CompileError> {
    let params_hash = policy.params_hash()?;
    let span = info_span!(
        "compile",
        policy = policy.policy_id(),
        params_hash = %params_hash,
        exceptions = %policy.exceptions.revision,
    );
    let _guard = span.enter();

    let layout = ChannelAssigner::new(policy, catalog).assign(catalog.versions())?;
    let deprecations = DeprecationMarker::new(policy).mark(
        &layout.ystream_lines,
        catalog.versions(),
        catalog.oldest_supported_version(),
    );

    let package = Package {
        schema: SCHEMA_PACKAGE.to_string(),
        name: policy.package.clone(),
        default_channel: STABLE_CHANNEL.to_string(),
        icon,
    };

    let channel_count = layout.channels.len();
    let deprecation_count = deprecations.entries.len();
    let template = CatalogAssembler::new()
        .package(package)
        .channels(layout.channels)
        .deprecations(deprecations)
        .bundles(catalog.images())
        .finish(catalog.len())?;

    let fingerprint = template.fingerprint()?;
    info!(
        bundles = catalog.len(),
        channels = channel_count,
        deprecations = deprecation_count,
        fingerprint = %fingerprint,
        "catalog compiled"
    );

    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImageReference, Version, LATEST_CHANNEL};

    fn catalog(versions: &[&str], oldest: &str) -> VersionCatalog {
        let images = versions
            .iter()
            .enumerate()
            .map(|(i, s)| {
                BundleImage::new(
                    Version::parse(s).unwrap(),
                    ImageReference::parse(&format!("example.com/b@sha256:{:064x}", i + 1)).unwrap(),
                )
            })
            .collect();
        VersionCatalog::new(images, Version::parse(oldest).unwrap(), []).unwrap()
    }

    fn icon() -> Icon {
        Icon::from_png(b"icon")
    }

    #[test]
    fn test_template_order() {
        let policy = UpdateGraphPolicyV1::default();
        let template = compile(&catalog(&["3.62.0", "3.62.1", "4.0.0", "4.0.1"], "4.0.0"), &policy, icon()).unwrap();

        let schemas: Vec<&str> = template.entries.iter().map(CatalogEntry::schema).collect();
        assert_eq!(
            schemas,
            vec![
                "olm.package",
                "olm.channel",
                "olm.channel",
                "olm.channel",
                "olm.channel",
                "olm.deprecations",
                "olm.bundle",
                "olm.bundle",
                "olm.bundle",
                "olm.bundle",
            ]
        );
        let package = template.package().unwrap();
        assert_eq!(package.name, "rhacs-operator");
        assert_eq!(package.default_channel, "stable");
        assert!(template.channel(LATEST_CHANNEL).is_some());

        let images: Vec<&str> = template.bundles().map(|b| b.image.as_str()).collect();
        assert_eq!(images[0], format!("example.com/b@sha256:{:064x}", 1));
        assert_eq!(images[3], format!("example.com/b@sha256:{:064x}", 4));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let policy = UpdateGraphPolicyV1::default();
        let catalog = catalog(&["3.62.0", "3.62.1", "3.63.0", "3.64.0", "4.0.0", "4.1.0"], "4.0.0");
        let a = compile(&catalog, &policy, icon()).unwrap();
        let b = compile(&catalog, &policy, icon()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn test_assign_error_propagates() {
        let policy = UpdateGraphPolicyV1::minimal();
        let err = compile(&catalog(&["1.0.0"], "1.0.0"), &policy, icon()).unwrap_err();
        assert!(matches!(err, CompileError::Assign(AssignError::Edge(_))));
        assert!(err.to_string().contains("1.0.0"));
    }

    #[test]
    fn test_finish_checks_completeness() {
        let policy = UpdateGraphPolicyV1::default();
        let package = Package {
            schema: SCHEMA_PACKAGE.to_string(),
            name: policy.package.clone(),
            default_channel: STABLE_CHANNEL.to_string(),
            icon: icon(),
        };

        let missing_stable = CatalogAssembler::new()
            .package(package.clone())
            .deprecations(DeprecationMarker::new(&policy).mark(&[], &[], &Version::new(4, 0, 0)))
            .finish(0);
        assert!(matches!(missing_stable, Err(CompileError::Incomplete(_))));

        let wrong_bundle_count = CatalogAssembler::new()
            .package(package)
            .channels([Channel::new(STABLE_CHANNEL, "rhacs-operator", vec![])])
            .deprecations(DeprecationMarker::new(&policy).mark(&[], &[], &Version::new(4, 0, 0)))
            .finish(2);
        assert!(matches!(wrong_bundle_count, Err(CompileError::Incomplete(_))));
    }
}
