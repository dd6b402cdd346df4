//! Error taxonomy.
//!
//! Only load-time failures are errors. Out-of-domain inputs and numerical
//! anomalies during a tick are recovered and reported through
//! [`crate::state::FrameFlags`] instead.

use thiserror::Error;

/// Result type used throughout the workspace.
pub type Result<T> = std::result::Result<T, PropwashError>;

#[derive(Error, Debug)]
pub enum PropwashError {
    /// Bad geometry, malformed curves, malformed grid or config document.
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// A required table or grid could not be obtained.
    #[error("upstream unavailable: {resource}: {reason}")]
    UpstreamUnavailable { resource: String, reason: String },

    /// Failure while writing exported frames.
    #[error("export failed: {0}")]
    Export(String),

    /// The threaded runner could not be started or stopped cleanly.
    #[error("runner failed: {0}")]
    Runner(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PropwashError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that must stop startup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration { .. } | Self::UpstreamUnavailable { .. }
        )
    }
}
