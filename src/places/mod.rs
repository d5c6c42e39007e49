//! Places provider: text search with pagination, detail lookups, retry policy.
//!
//! [`PlaceProvider`] is the seam between the orchestrator and the external
//! places API. The production implementation is [`PlacesClient`]; tests
//! substitute mock providers.

pub mod client;
pub mod translate;

pub use client::PlacesClient;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::Business;

/// A source of business records keyed by (category, location).
///
/// Implementations own pagination, retry and status handling; consumers
/// see a single logical stream per search and plain fallible detail
/// lookups. All implementations must be `Send + Sync` so that many task
/// pipelines can share one provider.
#[async_trait]
pub trait PlaceProvider: Send + Sync {
    /// Search for businesses matching a category within a location.
    ///
    /// The stream spans all result pages; consumers never see page
    /// boundaries. An `Err` item terminates the stream and represents a
    /// search-stage failure for the owning task.
    fn search(&self, category: &str, location: &str) -> BoxStream<'static, Result<Business>>;

    /// Fetch full details for a single place.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::HarvestError::Upstream`] on a non-success
    /// provider status, or an HTTP/parse error from the transport.
    async fn details(&self, place_id: &str) -> Result<Business>;
}
