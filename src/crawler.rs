use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::extractor;
use crate::fallback;
use crate::models::{ListingRecord, Platform};
use crate::report::Summary;

static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ]
});

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// ============================================================================
// Request building
// ============================================================================

/// Browser-like header set with a User-Agent picked at random from the pool.
pub fn browser_headers() -> HeaderMap {
    use rand::seq::SliceRandom;
    let user_agent = USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(DEFAULT_USER_AGENT);

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(user_agent));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}

/// Search URL for `keyword` on `platform`, or `None` when the platform has no
/// search endpoint wired up.
///
/// Amazon joins words with `+`, Flipkart percent-encodes spaces as `%20`.
pub fn search_url(platform: Platform, base_url: &str, keyword: &str) -> Option<String> {
    match platform {
        Platform::AmazonIndia => {
            let query = keyword
                .split(' ')
                .map(|word| urlencoding::encode(word).into_owned())
                .collect::<Vec<_>>()
                .join("+");
            Some(format!("{}/s?k={}", base_url, query))
        }
        Platform::Flipkart => Some(format!("{}/search?q={}", base_url, urlencoding::encode(keyword))),
        Platform::Meesho | Platform::Myntra => None,
    }
}

/// Shared outbound client. One request per fetch, fixed timeout, no retries.
pub fn build_client(config: &AppConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.fetch_timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("failed to build HTTP client")
}

/// Issues a single GET and returns the body. Anything but `200 OK` is an error.
pub async fn fetch_search_page(client: &Client, url: &str) -> Result<String> {
    let resp = client.get(url).headers(browser_headers()).send().await?;
    let status = resp.status();
    if status != StatusCode::OK {
        anyhow::bail!("unexpected status {} from {}", status, url);
    }
    let html = resp.text().await?;
    info!("Fetched {} bytes from {}", html.len(), url);
    Ok(html)
}

// ============================================================================
// Rank pipeline
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// User-facing message attached to a fetch (spinner text, warnings, errors).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }
}

/// One keyword-rank request, already validated.
#[derive(Debug, Clone)]
pub struct RankQuery {
    pub keyword: String,
    pub platform: Platform,
    pub limit: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct RankOutcome {
    #[schema(value_type = String)]
    pub batch_id: Uuid,
    pub keyword: String,
    pub platform: Platform,
    pub records: Vec<ListingRecord>,
    pub summary: Summary,
    pub notices: Vec<Notice>,
}

/// Fetches and extracts one platform's first results page.
pub async fn scrape_platform<R: Rng + ?Sized>(
    client: &Client,
    config: &AppConfig,
    query: &RankQuery,
    rng: &mut R,
) -> Result<Vec<ListingRecord>> {
    let base_url = config
        .base_url(query.platform)
        .with_context(|| format!("no scraper for {}", query.platform))?;
    let url = search_url(query.platform, base_url, &query.keyword)
        .with_context(|| format!("no search endpoint for {}", query.platform))?;

    info!("🔍 Scraping {} for \"{}\"", query.platform, query.keyword);
    let html = fetch_search_page(client, &url).await?;
    Ok(extractor::extract_listings(query.platform, &html, base_url, query.limit, rng))
}

/// Runs the whole keyword-rank flow: scrape when possible, otherwise (or when
/// the scrape comes back empty) substitute generated listings.
pub async fn fetch_rankings<R: Rng + ?Sized>(
    client: &Client,
    config: &AppConfig,
    query: &RankQuery,
    rng: &mut R,
) -> RankOutcome {
    let batch_id = Uuid::new_v4();
    let mut notices = Vec::new();

    let mut records = if query.platform.has_extractor() {
        match scrape_platform(client, config, query, rng).await {
            Ok(records) => records,
            Err(e) => {
                warn!("[{}] Scrape of {} failed: {:#}", batch_id, query.platform, e);
                notices.push(Notice::new(
                    NoticeLevel::Error,
                    format!("Error scraping {}: {}", query.platform, e),
                ));
                Vec::new()
            }
        }
    } else {
        notices.push(Notice::new(
            NoticeLevel::Info,
            format!("{} scraper coming soon! Showing demo data...", query.platform),
        ));
        fallback::generate(&query.keyword, query.limit, query.platform, rng)
    };

    if records.is_empty() {
        warn!("[{}] No listings extracted, substituting demo data", batch_id);
        notices.push(Notice::new(
            NoticeLevel::Warning,
            "Scraping returned no results. Showing demo data instead.",
        ));
        records = fallback::generate(&query.keyword, query.limit, query.platform, rng);
    }

    notices.push(Notice::new(
        NoticeLevel::Success,
        format!("Found {} products!", records.len()),
    ));
    info!(
        "✅ [{}] {} listings for \"{}\" on {} ({} synthetic)",
        batch_id,
        records.len(),
        query.keyword,
        query.platform,
        records.iter().filter(|r| r.is_synthetic).count()
    );

    RankOutcome {
        batch_id,
        keyword: query.keyword.clone(),
        platform: query.platform,
        summary: Summary::from_records(&records),
        records,
        notices,
    }
}
