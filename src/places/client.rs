//! HTTP places client: paged text search, retrying fetches, detail lookups.
//!
//! The search stream chains continuation tokens across pages, observing the
//! provider's mandatory delay before a token becomes usable. Page fetches
//! are retried with a fixed delay for transport, parse and retryable status
//! failures; an explicit request denial is surfaced immediately. Detail
//! responses are cached by place id, since the same business frequently
//! appears in several (category, location) tasks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use moka::future::Cache;
use serde::Deserialize;

use crate::config::HarvestConfig;
use crate::error::{HarvestError, Result};
use crate::http;
use crate::types::Business;

use super::translate::build_query;
use super::PlaceProvider;

/// Maximum number of cached place-detail responses.
const DETAIL_CACHE_ENTRIES: u64 = 1_000;

/// Detail fields requested from the provider.
const DETAIL_FIELDS: &str = "name,formatted_address,formatted_phone_number,\
website,address_component,geometry,url,international_phone_number";

/// HTTP-backed [`PlaceProvider`] implementation.
pub struct PlacesClient {
    fetcher: Arc<PageFetcher>,
    detail_cache: Option<Cache<String, Business>>,
}

impl PlacesClient {
    /// Build a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Config`] for invalid configuration or a
    /// missing API key, [`HarvestError::Http`] if the HTTP client cannot
    /// be constructed.
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        config.validate()?;
        if config.api_key.trim().is_empty() {
            return Err(HarvestError::Config("api_key must not be empty".into()));
        }

        let client = http::build_client(config.search_timeout_secs, config.user_agent.as_deref())?;
        let detail_cache = (config.detail_cache_ttl_secs > 0).then(|| {
            Cache::builder()
                .max_capacity(DETAIL_CACHE_ENTRIES)
                .time_to_live(Duration::from_secs(config.detail_cache_ttl_secs))
                .build()
        });

        Ok(Self {
            fetcher: Arc::new(PageFetcher {
                client,
                config: config.clone(),
            }),
            detail_cache,
        })
    }

    async fn fetch_details(&self, place_id: &str) -> Result<Business> {
        let fetcher = &self.fetcher;
        let url = format!("{}/details/json", fetcher.config.base_url);
        let response = fetcher
            .client
            .get(&url)
            .query(&[
                ("place_id", place_id),
                ("fields", DETAIL_FIELDS),
                ("key", &fetcher.config.api_key),
            ])
            .timeout(Duration::from_secs(fetcher.config.detail_timeout_secs))
            .send()
            .await
            .map_err(|e| HarvestError::Http(format!("details request failed: {e}")))?
            .error_for_status()
            .map_err(|e| HarvestError::Http(format!("details HTTP error: {e}")))?;

        let body = response
            .text()
            .await
            .map_err(|e| HarvestError::Http(format!("details response read failed: {e}")))?;

        parse_details(&body)
    }
}

#[async_trait]
impl PlaceProvider for PlacesClient {
    fn search(&self, category: &str, location: &str) -> BoxStream<'static, Result<Business>> {
        let query = build_query(category, location);
        tracing::debug!(category, location, %query, "starting places text search");

        let fetcher = Arc::clone(&self.fetcher);
        stream::try_unfold(PageState::Start, move |state| {
            let fetcher = Arc::clone(&fetcher);
            let query = query.clone();
            async move {
                let page = match state {
                    PageState::Done => return Ok(None),
                    PageState::Start => fetcher.fetch_with_retry(&query, None).await?,
                    PageState::Next(token) => {
                        // The provider rejects a continuation token used too soon.
                        tokio::time::sleep(Duration::from_millis(fetcher.config.page_delay_ms))
                            .await;
                        fetcher.fetch_with_retry(&query, Some(&token)).await?
                    }
                };
                let next = match page.next_page_token {
                    Some(token) if !token.is_empty() => PageState::Next(token),
                    _ => PageState::Done,
                };
                Ok(Some((page.items, next)))
            }
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
    }

    async fn details(&self, place_id: &str) -> Result<Business> {
        if let Some(cache) = &self.detail_cache {
            if let Some(hit) = cache.get(place_id).await {
                tracing::trace!(place_id, "detail cache hit");
                return Ok(hit);
            }
        }

        let record = self.fetch_details(place_id).await?;
        if let Some(cache) = &self.detail_cache {
            cache.insert(place_id.to_owned(), record.clone()).await;
        }
        Ok(record)
    }
}

/// Pagination cursor for the search stream.
enum PageState {
    Start,
    Next(String),
    Done,
}

/// Shared request state captured by the search stream.
struct PageFetcher {
    client: reqwest::Client,
    config: HarvestConfig,
}

impl PageFetcher {
    /// Fetch one results page, retrying retryable failures per policy.
    async fn fetch_with_retry(&self, query: &str, page_token: Option<&str>) -> Result<SearchPage> {
        let max_attempts = self.config.retry_attempts.max(1);
        let delay =
            Duration::from_millis(self.config.retry_delay_ms.min(self.config.max_backoff_ms));
        let mut attempt = 1u32;

        loop {
            match self.fetch_page(query, page_token).await {
                Ok(page) => return Ok(page),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempt < max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %err,
                        "retrying places page fetch"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(error = %err, "all places retry attempts failed");
                    return Err(HarvestError::ServiceUnavailable(format!(
                        "failed to retrieve data after {max_attempts} attempts: {err}"
                    )));
                }
            }
        }
    }

    async fn fetch_page(&self, query: &str, page_token: Option<&str>) -> Result<SearchPage> {
        let url = format!("{}/textsearch/json", self.config.base_url);
        let request = match page_token {
            Some(token) => {
                tracing::trace!("fetching next results page with continuation token");
                self.client
                    .get(&url)
                    .query(&[("pagetoken", token), ("key", &self.config.api_key)])
            }
            None => self
                .client
                .get(&url)
                .query(&[("query", query), ("key", &self.config.api_key)]),
        };

        let response = request
            .timeout(Duration::from_secs(self.config.search_timeout_secs))
            .send()
            .await
            .map_err(|e| HarvestError::Http(format!("search request failed: {e}")))?
            .error_for_status()
            .map_err(|e| HarvestError::Http(format!("search HTTP error: {e}")))?;

        let body = response
            .text()
            .await
            .map_err(|e| HarvestError::Http(format!("search response read failed: {e}")))?;

        parse_search_page(&body)
    }
}

/// One decoded page of text-search results.
#[derive(Debug)]
struct SearchPage {
    items: Vec<Business>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<PlaceSummary>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct PlaceSummary {
    place_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    vicinity: Option<String>,
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<PlaceDetail>,
}

#[derive(Deserialize)]
struct PlaceDetail {
    #[serde(default)]
    place_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    formatted_phone_number: String,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    geometry: Option<Geometry>,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Deserialize)]
struct AddressComponent {
    #[serde(default)]
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

/// Canonical map link for a place id.
fn maps_link(place_id: &str) -> String {
    format!("https://www.google.com/maps/place/?q=place_id:{place_id}")
}

/// Decode a text-search response body into a results page.
///
/// Extracted as a separate function for testability with fixture JSON.
fn parse_search_page(body: &str) -> Result<SearchPage> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| HarvestError::Parse(format!("search response decode failed: {e}")))?;

    match response.status.as_str() {
        "REQUEST_DENIED" => {
            let message = response
                .error_message
                .unwrap_or_else(|| "unknown error".into());
            return Err(HarvestError::RequestDenied(message));
        }
        "OK" | "ZERO_RESULTS" => {}
        other => return Err(HarvestError::Upstream(other.to_string())),
    }

    let items: Vec<Business> = response
        .results
        .into_iter()
        .map(|summary| {
            let (latitude, longitude) = match summary.geometry {
                Some(g) => (Some(g.location.lat), Some(g.location.lng)),
                None => (None, None),
            };
            Business {
                maps_link: maps_link(&summary.place_id),
                id: summary.place_id,
                business_name: summary.name,
                address: summary
                    .vicinity
                    .or(summary.formatted_address)
                    .unwrap_or_default(),
                latitude,
                longitude,
                ..Default::default()
            }
        })
        .collect();

    tracing::debug!(
        count = items.len(),
        has_next = response.next_page_token.is_some(),
        "search page parsed"
    );

    Ok(SearchPage {
        items,
        next_page_token: response.next_page_token,
    })
}

/// Decode a place-details response body into an enriched record.
fn parse_details(body: &str) -> Result<Business> {
    let response: DetailsResponse = serde_json::from_str(body)
        .map_err(|e| HarvestError::Parse(format!("details response decode failed: {e}")))?;

    if response.status != "OK" {
        return Err(HarvestError::Upstream(response.status));
    }
    let detail = response
        .result
        .ok_or_else(|| HarvestError::Parse("details response missing result".into()))?;

    let mut city = String::new();
    let mut state = String::new();
    let mut postal_code = String::new();
    let mut country = String::new();
    for component in &detail.address_components {
        for kind in &component.types {
            match kind.as_str() {
                "locality" => city = component.long_name.clone(),
                "administrative_area_level_1" => state = component.long_name.clone(),
                "postal_code" => postal_code = component.long_name.clone(),
                "country" => country = component.long_name.clone(),
                _ => {}
            }
        }
    }

    let (latitude, longitude) = match detail.geometry {
        Some(g) => (Some(g.location.lat), Some(g.location.lng)),
        None => (None, None),
    };

    // A business with no website of its own still has a canonical listing
    // URL, which downstream consumers treat as a substitute website.
    let website = detail
        .website
        .filter(|w| !w.is_empty())
        .or_else(|| detail.url.clone());

    Ok(Business {
        maps_link: maps_link(&detail.place_id),
        id: detail.place_id,
        business_name: detail.name,
        address: detail.formatted_address,
        city,
        state,
        postal_code,
        country,
        phone: detail.formatted_phone_number,
        website,
        details_link: detail.url,
        latitude,
        longitude,
        ..Default::default()
    })
}
