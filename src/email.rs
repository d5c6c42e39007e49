//! Best-effort email discovery from business websites.
//!
//! Fetches a website's HTML and scans for the first plausible email token;
//! if none is found and the page mentions a contact section, follows one
//! relative contact/about link and scans that page too. The scan itself is
//! a pure function over raw text so it can be tested without any network.
//!
//! This whole module is best-effort: every failure degrades to "no email
//! found", never an error.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::config::HarvestConfig;
use crate::error::Result;
use crate::http;

/// Email tokens longer than this are assumed to be malformed matches.
const MAX_EMAIL_LEN: usize = 100;

/// Placeholder domains that never belong to a real business.
const DENYLISTED_DOMAINS: &[&str] = &["example.com", "domain.com", "email.com"];

/// Relative link prefixes that usually lead to a contact page.
const CONTACT_PREFIXES: &[&str] = &["/contact", "/about", "/kontakt"];

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // local@domain.tld with a 2-6 letter TLD.
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,6}")
            .expect("email pattern is valid")
    })
}

/// Scan raw text for the first plausible email address.
///
/// A match is accepted when it is under the length bound and does not
/// contain a denylisted placeholder domain. Later, denylisted matches do
/// not block earlier acceptable ones — the first acceptable match wins.
pub fn find_email(text: &str) -> Option<String> {
    for token in email_pattern().find_iter(text) {
        let candidate = token.as_str();
        if candidate.len() >= MAX_EMAIL_LEN {
            continue;
        }
        let lowered = candidate.to_ascii_lowercase();
        if DENYLISTED_DOMAINS.iter().any(|d| lowered.contains(d)) {
            continue;
        }
        return Some(candidate.to_owned());
    }
    None
}

/// Find a relative contact-page link in raw HTML.
///
/// Only consulted when the page body mentions "contact"; returns the first
/// `<a href>` whose path starts with a contact/about prefix.
pub fn find_contact_path(html: &str) -> Option<String> {
    if !html.to_ascii_lowercase().contains("contact") {
        return None;
    }

    let document = Html::parse_document(html);
    let links = Selector::parse("a[href]").ok()?;

    for anchor in document.select(&links) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let lowered = href.to_ascii_lowercase();
        if CONTACT_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
            return Some(href.to_owned());
        }
    }
    None
}

/// Prefix a schemeless website URL with `https://`.
pub fn normalise_website_url(website: &str) -> String {
    let trimmed = website.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    }
}

/// A source of best-effort email addresses for a website.
#[async_trait]
pub trait EmailSource: Send + Sync {
    /// Returns an email found on the website, or `None`. Never fails.
    async fn extract(&self, website: &str) -> Option<String>;
}

/// HTTP-backed [`EmailSource`] applying the [`find_email`] heuristic.
pub struct EmailScraper {
    client: reqwest::Client,
    timeout: Duration,
}

impl EmailScraper {
    /// Build a scraper with the configured timeout and User-Agent policy.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::HarvestError::Http`] if the HTTP client
    /// cannot be constructed.
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.scrape_timeout_secs, config.user_agent.as_deref())?,
            timeout: Duration::from_secs(config.scrape_timeout_secs),
        })
    }

    async fn fetch_body(&self, url: &str) -> Option<String> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .ok()?;
        response.text().await.ok()
    }
}

#[async_trait]
impl EmailSource for EmailScraper {
    async fn extract(&self, website: &str) -> Option<String> {
        if website.trim().is_empty() {
            return None;
        }
        let url = normalise_website_url(website);
        tracing::trace!(%url, "scraping website for email");

        let body = self.fetch_body(&url).await?;
        if let Some(email) = find_email(&body) {
            tracing::debug!(%url, %email, "email found on landing page");
            return Some(email);
        }

        let contact_path = find_contact_path(&body)?;
        let contact_url = Url::parse(&url).ok()?.join(&contact_path).ok()?;
        tracing::trace!(%contact_url, "checking contact page for email");

        let contact_body = self.fetch_body(contact_url.as_str()).await?;
        let email = find_email(&contact_body);
        if let Some(ref email) = email {
            tracing::debug!(%contact_url, %email, "email found on contact page");
        }
        email
    }
}
