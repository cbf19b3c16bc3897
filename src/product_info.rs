use chrono::Local;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{round_rating, ProductDetail, Platform, RATING_MAX};

const STOCK_STATES: [&str; 3] = ["In Stock", "Low Stock", "Out of Stock"];
const DETAIL_RATING_MIN: f64 = 3.8;

/// Non-blank, trimmed lines of the pasted ASIN/link list.
pub fn parse_inputs(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Product code for one input line: links yield their last path segment,
/// bare codes are used as-is.
pub fn identifier_for<R: Rng + ?Sized>(input: &str, rng: &mut R) -> String {
    if !input.contains("http") {
        return input.to_string();
    }
    let without_query = input.split(['?', '#']).next().unwrap_or(input);
    match without_query.trim_end_matches('/').rsplit('/').next() {
        Some(segment) if !segment.is_empty() && !segment.contains(':') => segment.to_string(),
        _ => format!("ID{}", rng.gen_range(1_000_000..=9_999_999u32)),
    }
}

/// Builds one detail row per input line. Values are generated; only the
/// identifier and link come from the input.
pub fn lookup<R: Rng + ?Sized>(platform: Platform, inputs: &[String], rng: &mut R) -> Vec<ProductDetail> {
    inputs
        .iter()
        .enumerate()
        .map(|(idx, input)| {
            let identifier = identifier_for(input, rng);
            let stock_status = if platform == Platform::AmazonIndia {
                STOCK_STATES.choose(rng).copied().unwrap_or("In Stock").to_string()
            } else {
                "N/A".to_string()
            };
            let link = if input.contains("http") {
                input.clone()
            } else {
                format!("https://example.com/product/{}", identifier)
            };

            ProductDetail {
                title: format!("Product {} - High Quality Item", idx + 1),
                price: format!("₹{}", rng.gen_range(499..=9999)),
                rating: round_rating(rng.gen_range(DETAIL_RATING_MIN..=RATING_MAX)),
                review_count: rng.gen_range(100..=15_000),
                stock_status,
                link,
                identifier,
                captured_at: Local::now(),
            }
        })
        .collect()
}
