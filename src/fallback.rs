use chrono::Local;
use rand::Rng;

use crate::extractor::{random_price, random_rating};
use crate::models::{truncate_title, ListingRecord, ListingType, Platform};

/// Share of generated listings marked as sponsored.
pub const SPONSORED_PROBABILITY: f64 = 0.2;

fn is_cased(c: char) -> bool {
    c.is_uppercase() || c.is_lowercase()
}

/// Uppercases every letter that follows a non-letter and lowercases the rest,
/// leaving all other characters (spacing included) untouched:
/// "wireless HEADPHONES" -> "Wireless Headphones", "t-shirt" -> "T-Shirt".
fn title_case(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    let mut prev_cased = false;
    for c in keyword.chars() {
        if prev_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_cased = is_cased(c);
    }
    out
}

/// Builds exactly `limit` synthetic listings for `platform`.
///
/// Used for platforms without an extractor and whenever a real extraction
/// comes back empty.
pub fn generate<R: Rng + ?Sized>(
    keyword: &str,
    limit: usize,
    platform: Platform,
    rng: &mut R,
) -> Vec<ListingRecord> {
    let name = title_case(keyword);
    let prefix = platform.code_prefix();

    (1..=limit)
        .map(|i| ListingRecord {
            rank: i as u32,
            identifier: format!("{}{}", prefix, rng.gen_range(1_000_000_000..=9_999_999_999u64)),
            title: truncate_title(&format!("{} Product {} - Premium Quality", name, i)),
            price: random_price(rng),
            rating: random_rating(rng),
            review_count: rng.gen_range(50..=10_000),
            listing_type: ListingType::from_sponsored(rng.gen_bool(SPONSORED_PROBABILITY)),
            link: format!("https://example.com/product/{}", i),
            platform,
            captured_at: Local::now(),
            is_synthetic: true,
        })
        .collect()
}
