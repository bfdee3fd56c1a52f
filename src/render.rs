//! Rendering and writing of catalog templates.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::types::CatalogTemplate;

/// Head comment placed above rendered YAML.
pub const YAML_HEAD_COMMENT: &str = "\
# ---------------------------------------------------------------------------
# This file is generated by generate_catalog. Do not edit it manually.
# Update bundles.yaml and regenerate instead.
# ---------------------------------------------------------------------------
";

/// Error type for rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// YAML serialization failed.
    #[error("failed to marshal catalog as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// JSON serialization failed.
    #[error("failed to marshal catalog as JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Output file could not be written.
    #[error("failed to write {path}: {error}")]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error.
        error: std::io::Error,
    },
    /// Unrecognized output format name.
    #[error("unknown output format `{0}`, expected `yaml` or `json`")]
    UnknownFormat(String),
}

/// Output encoding of the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// YAML with a generated-file head comment.
    #[default]
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(RenderError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yaml => write!(f, "yaml"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Render as YAML, head comment first.
pub fn render_yaml(template: &CatalogTemplate) -> Result<String, RenderError> {
    let body = serde_yaml::to_string(template)?;
    Ok(format!("{YAML_HEAD_COMMENT}{body}"))
}

/// Render as pretty JSON with a trailing newline.
pub fn render_json(template: &CatalogTemplate) -> Result<String, RenderError> {
    let mut body = serde_json::to_string_pretty(template)?;
    body.push('\n');
    Ok(body)
}

/// Render in the requested format.
pub fn render(template: &CatalogTemplate, format: OutputFormat) -> Result<String, RenderError> {
    match format {
        OutputFormat::Yaml => render_yaml(template),
        OutputFormat::Json => render_json(template),
    }
}

/// `sha256:<hex>` digest of rendered bytes.
pub fn output_digest(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}

/// Render and write the template, returning the digest of the written bytes.
pub fn write_template(
    template: &CatalogTemplate,
    format: OutputFormat,
    path: &Path,
) -> Result<String, RenderError> {
    let rendered = render(template, format)?;
    std::fs::write(path, rendered.as_bytes()).map_err(|error| RenderError::Write {
        path: path.to_path_buf(),
        error,
    })?;

    let digest = output_digest(rendered.as_bytes());
    debug!(path = %path.display(), format = %format, bytes = rendered.len(), digest = %digest, "template written");
    Ok(digest)
}
