//! Summary metrics, the table view and CSV exports.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{ListingRecord, ListingType, Platform, ProductDetail};

/// Column order of the keyword-rank table and of its CSV export.
pub const TABLE_COLUMNS: [&str; 10] = [
    "rank",
    "platform",
    "type",
    "title",
    "price",
    "rating",
    "reviews",
    "asin",
    "link",
    "synthetic",
];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct Summary {
    pub total: usize,
    pub sponsored: usize,
    pub organic: usize,
    pub avg_rating: f64,
    /// Average rating as shown on the dashboard, e.g. "4.3⭐"
    pub avg_rating_display: String,
}

impl Summary {
    pub fn from_records(records: &[ListingRecord]) -> Self {
        let total = records.len();
        let sponsored = records
            .iter()
            .filter(|r| r.listing_type == ListingType::Sponsored)
            .count();
        let avg_rating = if total == 0 {
            0.0
        } else {
            records.iter().map(|r| r.rating).sum::<f64>() / total as f64
        };

        Self {
            total,
            sponsored,
            organic: total - sponsored,
            avg_rating,
            avg_rating_display: format!("{:.1}⭐", avg_rating),
        }
    }
}

/// One row of the keyword-rank table.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct TableRow {
    pub rank: u32,
    pub platform: Platform,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub title: String,
    pub price: String,
    pub rating: f64,
    pub reviews: u64,
    pub asin: String,
    pub link: String,
    pub synthetic: bool,
}

impl From<&ListingRecord> for TableRow {
    fn from(r: &ListingRecord) -> Self {
        Self {
            rank: r.rank,
            platform: r.platform,
            listing_type: r.listing_type,
            title: r.title.clone(),
            price: r.price.clone(),
            rating: r.rating,
            reviews: r.review_count,
            asin: r.identifier.clone(),
            link: r.link.clone(),
            synthetic: r.is_synthetic,
        }
    }
}

pub fn table_rows(records: &[ListingRecord]) -> Vec<TableRow> {
    records.iter().map(TableRow::from).collect()
}

fn write_csv<T: Serialize>(headers: &[&str], rows: impl IntoIterator<Item = T>) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    // Written explicitly so an empty batch still carries its header row.
    wtr.write_record(headers)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// CSV export of the keyword-rank table (same columns as the table view).
pub fn rank_report_csv(records: &[ListingRecord]) -> Result<String> {
    write_csv(&TABLE_COLUMNS, records.iter().map(TableRow::from))
}

pub const PRODUCT_COLUMNS: [&str; 8] = [
    "asin",
    "title",
    "price",
    "rating",
    "reviews",
    "stock_status",
    "link",
    "timestamp",
];

/// CSV export of every product-detail field.
pub fn product_details_csv(records: &[ProductDetail]) -> Result<String> {
    write_csv(&PRODUCT_COLUMNS, records)
}

/// Filename-safe keyword fragment: spaces become `_`,
/// anything outside `[A-Za-z0-9_-]` is dropped.
fn filename_keyword(keyword: &str) -> String {
    let cleaned: String = keyword
        .trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        "search".to_string()
    } else {
        cleaned
    }
}

/// `rank_report_<keyword>_<YYYYMMDD>.csv`
pub fn rank_report_filename(keyword: &str, date: NaiveDate) -> String {
    format!("rank_report_{}_{}.csv", filename_keyword(keyword), date.format("%Y%m%d"))
}

/// `product_details_<YYYYMMDD>.csv`
pub fn product_details_filename(date: NaiveDate) -> String {
    format!("product_details_{}.csv", date.format("%Y%m%d"))
}
