//! Error taxonomy and non-fatal diagnostics.

use serde::Serialize;
use thiserror::Error;

/// Errors that abort the build before the pipeline starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("duplicate slug '{slug}' from '{first}' and '{second}'")]
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },

    #[error("path '{path}' does not produce a valid slug: {reason}")]
    InvalidSlug { path: String, reason: String },

    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("missing required option: {0}")]
    MissingOption(String),
}

/// Errors that abort a running build. No partial output is produced.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("frontmatter error in '{path}': {source}")]
    Frontmatter {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("transformer '{plugin}' failed on '{slug}': {source}")]
    Transform {
        plugin: String,
        slug: String,
        source: anyhow::Error,
    },

    #[error("transformer '{plugin}' changed document identity from '{was}' to '{now}'")]
    IdentityChanged {
        plugin: String,
        was: String,
        now: String,
    },

    #[error("filter '{plugin}' failed on '{slug}': {source}")]
    Filter {
        plugin: String,
        slug: String,
        source: anyhow::Error,
    },
}

/// A failed emitter. Isolated: sibling emitters still run, the failure is
/// surfaced in the build report.
#[derive(Debug, Clone, Serialize)]
pub struct EmitFailure {
    pub emitter: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// Non-fatal issue collected during the build and reported at the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Stable machine-readable code, e.g. "link.ambiguous".
    pub code: String,
    pub message: String,
    pub severity: Severity,

    /// Slug of the document the diagnostic belongs to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl Diagnostic {
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: Severity::Warning,
            slug: None,
        }
    }

    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: Severity::Info,
            slug: None,
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }
}
