//! Error types for the bizharvest crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. The provider API key never appears in
//! error messages.

/// Errors that can occur during business discovery and enrichment.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// A malformed search request, rejected before any task is created.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The places provider rejected the request outright. Never retried.
    #[error("places request denied: {0}")]
    RequestDenied(String),

    /// Retries against the places provider were exhausted.
    #[error("places service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The places provider returned a retryable non-success status.
    #[error("places API error: {0}")]
    Upstream(String),

    /// An HTTP request failed at the transport level.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Failed to decode a provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid harvest configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The requested export format is not recognised.
    #[error("unsupported export format: {0}")]
    InvalidFormat(String),

    /// Export was requested while the result set is empty.
    #[error("no results to export")]
    EmptyResult,

    /// Writing an export file failed.
    #[error("export failed: {0}")]
    Export(String),
}

impl HarvestError {
    /// Whether a search-stage failure with this error may be retried.
    ///
    /// Provider denials are final; transport, parse and other upstream
    /// statuses are transient per the provider's documented behaviour.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::RequestDenied(_))
    }
}

/// Convenience type alias for bizharvest results.
pub type Result<T> = std::result::Result<T, HarvestError>;
