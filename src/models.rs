use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Titles longer than this many characters are cut and suffixed with `...`.
pub const TITLE_MAX_CHARS: usize = 80;
pub const ELLIPSIS: &str = "...";

/// Plausible rating range shared by parsed and generated listings.
pub const RATING_MIN: f64 = 3.5;
pub const RATING_MAX: f64 = 5.0;

// ============================================================================
// Platforms
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
pub enum Platform {
    #[serde(rename = "Amazon India")]
    AmazonIndia,
    #[serde(rename = "Flipkart")]
    Flipkart,
    #[serde(rename = "Meesho")]
    Meesho,
    #[serde(rename = "Myntra")]
    Myntra,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::AmazonIndia,
        Platform::Flipkart,
        Platform::Meesho,
        Platform::Myntra,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::AmazonIndia => "Amazon India",
            Platform::Flipkart => "Flipkart",
            Platform::Meesho => "Meesho",
            Platform::Myntra => "Myntra",
        }
    }

    /// Whether a real listing extractor exists for this platform.
    pub fn has_extractor(&self) -> bool {
        matches!(self, Platform::AmazonIndia | Platform::Flipkart)
    }

    /// Two-letter prefix used for generated identifiers ("AM", "FL", "ME", "MY").
    pub fn code_prefix(&self) -> String {
        self.display_name()
            .chars()
            .take(2)
            .collect::<String>()
            .to_uppercase()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Listings
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum ListingType {
    Sponsored,
    Organic,
}

impl ListingType {
    pub fn from_sponsored(sponsored: bool) -> Self {
        if sponsored {
            ListingType::Sponsored
        } else {
            ListingType::Organic
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingType::Sponsored => f.write_str("Sponsored"),
            ListingType::Organic => f.write_str("Organic"),
        }
    }
}

/// One scraped or generated product entry in a keyword-rank batch.
///
/// Every field is always populated. Values that could not be read from the
/// page are replaced by plausible random ones, so `is_synthetic` only marks
/// records that were generated as a whole.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ListingRecord {
    /// 1-based position inside the batch
    pub rank: u32,
    /// ASIN on Amazon, generated code elsewhere
    pub identifier: String,
    pub title: String,
    /// Display price including the currency symbol
    pub price: String,
    pub rating: f64,
    pub review_count: u64,
    pub listing_type: ListingType,
    pub link: String,
    pub platform: Platform,
    #[schema(value_type = String)]
    pub captured_at: DateTime<Local>,
    pub is_synthetic: bool,
}

/// Product detail row produced by the product-info lookup.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct ProductDetail {
    #[serde(rename = "asin")]
    pub identifier: String,
    pub title: String,
    pub price: String,
    pub rating: f64,
    #[serde(rename = "reviews")]
    pub review_count: u64,
    pub stock_status: String,
    pub link: String,
    #[serde(rename = "timestamp")]
    #[schema(value_type = String)]
    pub captured_at: DateTime<Local>,
}

/// Cuts a title to [`TITLE_MAX_CHARS`] characters, appending [`ELLIPSIS`] when cut.
pub fn truncate_title(title: &str) -> String {
    if title.chars().count() > TITLE_MAX_CHARS {
        let mut cut: String = title.chars().take(TITLE_MAX_CHARS).collect();
        cut.push_str(ELLIPSIS);
        cut
    } else {
        title.to_string()
    }
}

/// Rounds to one decimal place, the precision ratings are shown with.
pub fn round_rating(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
