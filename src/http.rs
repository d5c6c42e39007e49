//! Shared HTTP client with User-Agent rotation.
//!
//! Provides configured [`reqwest::Client`] instances with browser-like
//! headers, cookie support and rotating User-Agent strings. Business
//! websites block obvious bots, so the email scraper in particular
//! benefits from realistic headers.

use crate::error::HarvestError;
use rand::seq::SliceRandom;
use std::time::Duration;

/// Realistic browser User-Agent strings, rotated per client.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build a [`reqwest::Client`] with the given overall timeout.
///
/// The client has:
/// - Cookie store enabled (consent interstitials on scraped websites)
/// - The given timeout applied to every request
/// - A random User-Agent from the built-in rotation (or `user_agent` if given)
/// - Brotli and gzip decompression
///
/// # Errors
///
/// Returns [`HarvestError::Http`] if the client cannot be constructed.
pub fn build_client(
    timeout_secs: u64,
    user_agent: Option<&str>,
) -> Result<reqwest::Client, HarvestError> {
    let ua = match user_agent {
        Some(custom) => custom.to_owned(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| HarvestError::Http(format!("failed to build HTTP client: {e}")))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    // choose only returns None on an empty slice
    USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0])
}
