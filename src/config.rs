use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::models::Platform;

pub const DEFAULT_AMAZON_BASE_URL: &str = "https://www.amazon.in";
pub const DEFAULT_FLIPKART_BASE_URL: &str = "https://www.flipkart.com";

/// Highest rank limit a request may ask for; `MAX_RANK_LIMIT` may only lower it.
pub const RANK_LIMIT_CEILING: u32 = 50;

fn parse_max_rank_limit(raw: &str) -> Result<u32> {
    let limit = raw
        .trim()
        .parse::<u32>()
        .with_context(|| format!("invalid MAX_RANK_LIMIT: {}", raw))?;
    if !(1..=RANK_LIMIT_CEILING).contains(&limit) {
        anyhow::bail!("MAX_RANK_LIMIT must be between 1 and {}, got {}", RANK_LIMIT_CEILING, limit);
    }
    Ok(limit)
}

/// Runtime settings, read once at start-up from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub fetch_timeout: Duration,
    pub max_rank_limit: u32,
    pub amazon_base_url: String,
    pub flipkart_base_url: String,
    pub static_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 3000,
            fetch_timeout: Duration::from_secs(15),
            max_rank_limit: RANK_LIMIT_CEILING,
            amazon_base_url: DEFAULT_AMAZON_BASE_URL.to_string(),
            flipkart_base_url: DEFAULT_FLIPKART_BASE_URL.to_string(),
            static_dir: "static".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(v) => v.parse::<u16>().with_context(|| format!("invalid PORT: {}", v))?,
            Err(_) => defaults.port,
        };
        let fetch_timeout = match env::var("FETCH_TIMEOUT_SECS") {
            Ok(v) => Duration::from_secs(
                v.parse::<u64>()
                    .with_context(|| format!("invalid FETCH_TIMEOUT_SECS: {}", v))?,
            ),
            Err(_) => defaults.fetch_timeout,
        };
        let max_rank_limit = match env::var("MAX_RANK_LIMIT") {
            Ok(v) => parse_max_rank_limit(&v)?,
            Err(_) => defaults.max_rank_limit,
        };

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
            fetch_timeout,
            max_rank_limit,
            amazon_base_url: env::var("AMAZON_BASE_URL").unwrap_or(defaults.amazon_base_url),
            flipkart_base_url: env::var("FLIPKART_BASE_URL").unwrap_or(defaults.flipkart_base_url),
            static_dir: env::var("STATIC_DIR").unwrap_or(defaults.static_dir),
        })
    }

    /// Search host for platforms that have a real extractor.
    pub fn base_url(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::AmazonIndia => Some(self.amazon_base_url.trim_end_matches('/')),
            Platform::Flipkart => Some(self.flipkart_base_url.trim_end_matches('/')),
            Platform::Meesho | Platform::Myntra => None,
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}
