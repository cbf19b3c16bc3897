//! Listing extraction from search-result pages.
//!
//! Every field is read through an ordered chain of `try-extract` strategies.
//! The first strategy returning `Some` wins; when all of them miss, the field
//! gets a random value from its plausible range. A bad field never drops the
//! card and a bad card never drops the batch.

use chrono::Local;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::{
    round_rating, truncate_title, ListingRecord, ListingType, Platform, RATING_MAX, RATING_MIN,
};
use crate::selectors::{amazon, flipkart};

/// A single way of reading one field out of a listing card.
pub type Strategy<T> = for<'a> fn(ElementRef<'a>) -> Option<T>;

pub const PLACEHOLDER_TITLE: &str = "Product Title";

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Runs the strategies in order and returns the first hit.
pub fn first_success<T>(card: ElementRef<'_>, strategies: &[Strategy<T>]) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(card))
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Whitespace-normalized text of the first element matching `selector`.
fn text_of(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|e| e.text().collect::<Vec<_>>().join(" "))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
}

fn href_of(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .and_then(|e| e.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
}

/// Parses the leading number of texts like "4.3 out of 5 stars" or "4.1".
fn parse_rating(text: &str) -> Option<f64> {
    let first = text.split_whitespace().next()?;
    let value = LEADING_NUMBER.find(first)?.as_str().parse::<f64>().ok()?;
    Some(value.clamp(RATING_MIN, RATING_MAX))
}

/// Keeps only the digits of texts like "(12,345)" or "1,024 Ratings".
fn parse_review_count(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<u64>().ok()
}

/// Resolves a card href against the page's base URL the way a browser would,
/// so protocol-relative (`//host/..`) and query-only (`?..`) links stay valid.
fn absolutize(base: Option<&Url>, href: &str) -> Option<String> {
    base?.join(href).ok().map(String::from)
}

pub fn random_price<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("₹{}", rng.gen_range(299..=9999))
}

pub fn random_rating<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    round_rating(rng.gen_range(RATING_MIN..=RATING_MAX))
}

pub fn random_review_count<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    rng.gen_range(50..=5000)
}

// ============================================================================
// Amazon India
// ============================================================================

fn amazon_title_mini(card: ElementRef<'_>) -> Option<String> {
    text_of(card, &amazon::TITLE_MINI)
}

fn amazon_title_medium(card: ElementRef<'_>) -> Option<String> {
    text_of(card, &amazon::TITLE_MEDIUM)
}

fn amazon_asin(card: ElementRef<'_>) -> Option<String> {
    card.value()
        .attr(amazon::ASIN_ATTR)
        .map(str::trim)
        .filter(|asin| !asin.is_empty())
        .map(str::to_string)
}

fn amazon_price(card: ElementRef<'_>) -> Option<String> {
    let whole = text_of(card, &amazon::PRICE_WHOLE)?;
    let fraction = text_of(card, &amazon::PRICE_FRACTION).unwrap_or_default();
    Some(format!("₹{}{}", whole, fraction))
}

fn amazon_rating(card: ElementRef<'_>) -> Option<f64> {
    text_of(card, &amazon::RATING).and_then(|t| parse_rating(&t))
}

fn amazon_reviews(card: ElementRef<'_>) -> Option<u64> {
    text_of(card, &amazon::REVIEWS).and_then(|t| parse_review_count(&t))
}

fn amazon_link(card: ElementRef<'_>) -> Option<String> {
    href_of(card, &amazon::LINK)
}

fn amazon_is_sponsored(card: ElementRef<'_>) -> bool {
    card.select(&amazon::SPAN)
        .any(|span| span.text().collect::<String>().trim() == amazon::SPONSORED_MARKER)
}

const AMAZON_TITLE: &[Strategy<String>] = &[amazon_title_mini, amazon_title_medium];
const AMAZON_ASIN: &[Strategy<String>] = &[amazon_asin];
const AMAZON_PRICE: &[Strategy<String>] = &[amazon_price];
const AMAZON_RATING: &[Strategy<f64>] = &[amazon_rating];
const AMAZON_REVIEWS: &[Strategy<u64>] = &[amazon_reviews];
const AMAZON_LINK: &[Strategy<String>] = &[amazon_link];

/// Extracts up to `limit` listings from an Amazon India search page.
pub fn extract_amazon<R: Rng + ?Sized>(
    html: &str,
    base_url: &str,
    limit: usize,
    rng: &mut R,
) -> Vec<ListingRecord> {
    let document = Html::parse_document(html);
    let cards = amazon::CARDS.select(&document);
    let base = Url::parse(base_url).ok();
    debug!("Amazon page has {} listing cards", cards.len());

    cards
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, card)| {
            let title = first_success(card, AMAZON_TITLE).unwrap_or_else(|| PLACEHOLDER_TITLE.to_string());
            let asin = first_success(card, AMAZON_ASIN)
                .unwrap_or_else(|| format!("B0{}", rng.gen_range(10_000_000..=99_999_999u32)));
            let price = first_success(card, AMAZON_PRICE).unwrap_or_else(|| random_price(rng));
            let rating = first_success(card, AMAZON_RATING).unwrap_or_else(|| random_rating(rng));
            let review_count =
                first_success(card, AMAZON_REVIEWS).unwrap_or_else(|| random_review_count(rng));
            let link = first_success(card, AMAZON_LINK)
                .and_then(|href| absolutize(base.as_ref(), &href))
                .unwrap_or_else(|| format!("{}/dp/{}", base_url, asin));

            ListingRecord {
                rank: idx as u32 + 1,
                identifier: asin,
                title: truncate_title(&title),
                price,
                rating,
                review_count,
                listing_type: ListingType::from_sponsored(amazon_is_sponsored(card)),
                link,
                platform: Platform::AmazonIndia,
                captured_at: Local::now(),
                is_synthetic: false,
            }
        })
        .collect()
}

// ============================================================================
// Flipkart
// ============================================================================

fn flipkart_title_link(card: ElementRef<'_>) -> Option<String> {
    text_of(card, &flipkart::TITLE_LINK)
}

fn flipkart_title_block(card: ElementRef<'_>) -> Option<String> {
    text_of(card, &flipkart::TITLE_BLOCK)
}

fn flipkart_price(card: ElementRef<'_>) -> Option<String> {
    text_of(card, &flipkart::PRICE)
}

fn flipkart_price_alt(card: ElementRef<'_>) -> Option<String> {
    text_of(card, &flipkart::PRICE_ALT)
}

fn flipkart_rating(card: ElementRef<'_>) -> Option<f64> {
    text_of(card, &flipkart::RATING).and_then(|t| parse_rating(&t))
}

fn flipkart_reviews(card: ElementRef<'_>) -> Option<u64> {
    text_of(card, &flipkart::REVIEWS).and_then(|t| parse_review_count(&t))
}

fn flipkart_link(card: ElementRef<'_>) -> Option<String> {
    href_of(card, &flipkart::LINK)
}

fn flipkart_link_alt(card: ElementRef<'_>) -> Option<String> {
    href_of(card, &flipkart::LINK_ALT)
}

const FLIPKART_TITLE: &[Strategy<String>] = &[flipkart_title_link, flipkart_title_block];
const FLIPKART_PRICE: &[Strategy<String>] = &[flipkart_price, flipkart_price_alt];
const FLIPKART_RATING: &[Strategy<f64>] = &[flipkart_rating];
const FLIPKART_REVIEWS: &[Strategy<u64>] = &[flipkart_reviews];
const FLIPKART_LINK: &[Strategy<String>] = &[flipkart_link, flipkart_link_alt];

/// Extracts up to `limit` listings from a Flipkart search page.
///
/// Flipkart cards carry no product code, so identifiers are always generated.
/// No sponsorship marker exists in these layouts; every listing is Organic.
pub fn extract_flipkart<R: Rng + ?Sized>(
    html: &str,
    base_url: &str,
    limit: usize,
    rng: &mut R,
) -> Vec<ListingRecord> {
    let document = Html::parse_document(html);
    let cards = flipkart::CARDS.select(&document);
    let base = Url::parse(base_url).ok();
    debug!("Flipkart page has {} listing cards", cards.len());

    cards
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, card)| {
            let title = first_success(card, FLIPKART_TITLE).unwrap_or_else(|| PLACEHOLDER_TITLE.to_string());
            let price = first_success(card, FLIPKART_PRICE).unwrap_or_else(|| random_price(rng));
            let rating = first_success(card, FLIPKART_RATING).unwrap_or_else(|| random_rating(rng));
            let review_count =
                first_success(card, FLIPKART_REVIEWS).unwrap_or_else(|| random_review_count(rng));
            let link = first_success(card, FLIPKART_LINK)
                .and_then(|href| absolutize(base.as_ref(), &href))
                .unwrap_or_else(|| base_url.to_string());

            ListingRecord {
                rank: idx as u32 + 1,
                identifier: format!("FK{}", rng.gen_range(1_000_000_000..=9_999_999_999u64)),
                title: truncate_title(&title),
                price,
                rating,
                review_count,
                listing_type: ListingType::Organic,
                link,
                platform: Platform::Flipkart,
                captured_at: Local::now(),
                is_synthetic: false,
            }
        })
        .collect()
}

/// Dispatches to the platform's extractor. Platforms without one yield nothing.
pub fn extract_listings<R: Rng + ?Sized>(
    platform: Platform,
    html: &str,
    base_url: &str,
    limit: usize,
    rng: &mut R,
) -> Vec<ListingRecord> {
    match platform {
        Platform::AmazonIndia => extract_amazon(html, base_url, limit, rng),
        Platform::Flipkart => extract_flipkart(html, base_url, limit, rng),
        Platform::Meesho | Platform::Myntra => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const AMAZON_BASE: &str = "https://www.amazon.in";
    const FLIPKART_BASE: &str = "https://www.flipkart.com";

    fn amazon_card(asin: &str, inner: &str) -> String {
        format!(
            r#"<div data-component-type="s-search-result" data-asin="{}">{}</div>"#,
            asin, inner
        )
    }

    fn amazon_page(cards: &[String]) -> String {
        format!("<html><body><div class=\"s-main-slot\">{}</div></body></html>", cards.join(""))
    }

    fn full_amazon_card() -> String {
        amazon_card(
            "B0C9JB1YQH",
            r#"
            <span class="puis-label-popover"><span>Sponsored</span></span>
            <h2 class="a-size-mini"><a class="a-link-normal" href="/boAt-Rockerz/dp/B0C9JB1YQH?ref=sr_1_1"><span>boAt Rockerz 450 Bluetooth On Ear Headphones</span></a></h2>
            <span class="a-price"><span class="a-price-whole">1,299.</span><span class="a-price-fraction">00</span></span>
            <i class="a-icon-star-small"><span class="a-icon-alt">4.1 out of 5 stars</span></i>
            <span class="a-size-base" dir="auto">(12,345)</span>
            "#,
        )
    }

    #[test]
    fn amazon_card_fields_are_read_from_markup() {
        let mut rng = StdRng::seed_from_u64(7);
        let records = extract_amazon(&amazon_page(&[full_amazon_card()]), AMAZON_BASE, 10, &mut rng);

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.rank, 1);
        assert_eq!(r.identifier, "B0C9JB1YQH");
        assert_eq!(r.title, "boAt Rockerz 450 Bluetooth On Ear Headphones");
        assert_eq!(r.price, "₹1,299.00");
        assert_eq!(r.rating, 4.1);
        assert_eq!(r.review_count, 12345);
        assert_eq!(r.listing_type, ListingType::Sponsored);
        assert_eq!(r.link, "https://www.amazon.in/boAt-Rockerz/dp/B0C9JB1YQH?ref=sr_1_1");
        assert_eq!(r.platform, Platform::AmazonIndia);
        assert!(!r.is_synthetic);
    }

    #[test]
    fn amazon_missing_fields_fall_back_independently() {
        let mut rng = StdRng::seed_from_u64(11);
        let bare = amazon_card("", r#"<span class="a-size-medium">Plain title</span>"#);
        let records = extract_amazon(&amazon_page(&[bare]), AMAZON_BASE, 10, &mut rng);

        let r = &records[0];
        assert_eq!(r.title, "Plain title");
        assert!(r.identifier.starts_with("B0"));
        assert_eq!(r.identifier.len(), 10);
        assert!(r.price.starts_with('₹'));
        assert!((RATING_MIN..=RATING_MAX).contains(&r.rating));
        assert!((50..=5000).contains(&r.review_count));
        assert_eq!(r.listing_type, ListingType::Organic);
        assert_eq!(r.link, format!("{}/dp/{}", AMAZON_BASE, r.identifier));
    }

    #[test]
    fn unparseable_rating_routes_to_fallback_without_dropping_card() {
        let mut rng = StdRng::seed_from_u64(3);
        let card = amazon_card(
            "B0AAAAAAAA",
            r#"<h2 class="a-size-mini">Earbuds</h2><span class="a-icon-alt">no stars yet</span>
               <span class="a-size-base" dir="auto">new</span>"#,
        );
        let records = extract_amazon(&amazon_page(&[card]), AMAZON_BASE, 10, &mut rng);
        assert_eq!(records.len(), 1);
        assert!((RATING_MIN..=RATING_MAX).contains(&records[0].rating));
        assert!((50..=5000).contains(&records[0].review_count));
        assert_eq!(records[0].title, "Earbuds");
    }

    #[test]
    fn amazon_respects_limit_and_dense_ranks() {
        let mut rng = StdRng::seed_from_u64(5);
        let cards: Vec<String> = (0..8).map(|i| amazon_card(&format!("B0TEST000{}", i), "")).collect();
        let records = extract_amazon(&amazon_page(&cards), AMAZON_BASE, 5, &mut rng);
        assert_eq!(records.len(), 5);
        let ranks: Vec<u32> = records.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        assert!(records.iter().all(|r| r.title == PLACEHOLDER_TITLE));
    }

    #[test]
    fn long_amazon_titles_are_truncated() {
        let mut rng = StdRng::seed_from_u64(1);
        let long = "Noise Cancelling ".repeat(10);
        let card = amazon_card("B0LONG0000", &format!(r#"<h2 class="a-size-mini">{}</h2>"#, long));
        let records = extract_amazon(&amazon_page(&[card]), AMAZON_BASE, 1, &mut rng);
        assert_eq!(records[0].title.chars().count(), 83);
        assert!(records[0].title.ends_with("..."));
    }

    #[test]
    fn out_of_range_ratings_are_clamped() {
        assert_eq!(parse_rating("2.0 out of 5 stars"), Some(RATING_MIN));
        assert_eq!(parse_rating("4.6"), Some(4.6));
        assert_eq!(parse_rating("stars"), None);
        assert_eq!(parse_review_count("1,024 Ratings"), Some(1024));
        assert_eq!(parse_review_count("Ratings"), None);
    }

    #[test]
    fn flipkart_uses_first_layout_with_matches() {
        let mut rng = StdRng::seed_from_u64(9);
        let html = r#"
            <div class="_2kHMtA">
                <a class="_1fQZEK" href="/apple-iphone-15/p/itm6ac6485515ae4">
                    <div class="_4rR01T">Apple iPhone 15 (Black, 128 GB)</div>
                    <div class="_3LWZlK">4.6</div>
                    <span class="_2_R_DZ"><span>1,52,210 Ratings</span></span>
                    <div class="_30jeq3">₹65,999</div>
                </a>
            </div>
            <div class="_13oc-S"><a class="s1Q9rs" href="/ignored">Ignored layout</a></div>
        "#;
        let records = extract_flipkart(html, FLIPKART_BASE, 10, &mut rng);

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.title, "Apple iPhone 15 (Black, 128 GB)");
        assert_eq!(r.price, "₹65,999");
        assert_eq!(r.rating, 4.6);
        assert_eq!(r.review_count, 152210);
        assert_eq!(r.link, "https://www.flipkart.com/apple-iphone-15/p/itm6ac6485515ae4");
        assert!(r.identifier.starts_with("FK"));
        assert_eq!(r.identifier.len(), 12);
        assert_eq!(r.listing_type, ListingType::Organic);
        assert_eq!(r.platform, Platform::Flipkart);
    }

    #[test]
    fn flipkart_empty_card_gets_placeholders() {
        let mut rng = StdRng::seed_from_u64(2);
        let records = extract_flipkart(r#"<div class="_1AtVbE"></div>"#, FLIPKART_BASE, 10, &mut rng);
        let r = &records[0];
        assert_eq!(r.title, PLACEHOLDER_TITLE);
        assert_eq!(r.link, FLIPKART_BASE);
        assert!(r.price.starts_with('₹'));
    }

    #[test]
    fn protocol_relative_and_query_only_links_resolve_against_base() {
        let mut rng = StdRng::seed_from_u64(6);
        let cards = vec![
            amazon_card("B0X0000001", r#"<a class="a-link-normal" href="//www.amazon.in/dp/B0X0000001">x</a>"#),
            amazon_card("B0X0000002", r#"<a class="a-link-normal" href="?ref=sr_pg_2">x</a>"#),
            amazon_card("B0X0000003", r#"<a class="a-link-normal" href="dp/B0X0000003">x</a>"#),
        ];
        let records = extract_amazon(&amazon_page(&cards), AMAZON_BASE, 10, &mut rng);
        assert_eq!(records[0].link, "https://www.amazon.in/dp/B0X0000001");
        assert_eq!(records[1].link, "https://www.amazon.in/?ref=sr_pg_2");
        assert_eq!(records[2].link, "https://www.amazon.in/dp/B0X0000003");

        let html = r#"<div class="_1AtVbE"><a class="_1fQZEK" href="?page=2">Page two</a></div>"#;
        let records = extract_flipkart(html, FLIPKART_BASE, 10, &mut rng);
        assert_eq!(records[0].link, "https://www.flipkart.com/?page=2");
    }

    #[test]
    fn unparseable_base_uses_field_fallback() {
        let mut rng = StdRng::seed_from_u64(8);
        let card = amazon_card("B0X0000009", r#"<a class="a-link-normal" href="/dp/B0X0000009">x</a>"#);
        let records = extract_amazon(&amazon_page(&[card]), "not a url", 10, &mut rng);
        assert_eq!(records[0].link, "not a url/dp/B0X0000009");
    }

    #[test]
    fn flipkart_respects_limit_and_dense_ranks() {
        let mut rng = StdRng::seed_from_u64(10);
        let html: String = (0..7)
            .map(|i| {
                format!(
                    r#"<div class="_1AtVbE"><a class="s1Q9rs" href="/item-{i}/p/itm{i}">Item {i}</a><div class="_30jeq3">₹{i}99</div></div>"#
                )
            })
            .collect();
        let records = extract_flipkart(&html, FLIPKART_BASE, 4, &mut rng);

        assert_eq!(records.len(), 4);
        let ranks: Vec<u32> = records.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        assert_eq!(records[3].link, "https://www.flipkart.com/item-3/p/itm3");
        assert!(records.iter().all(|r| r.platform == Platform::Flipkart && !r.is_synthetic));
    }

    #[test]
    fn pages_without_cards_yield_nothing() {
        let mut rng = StdRng::seed_from_u64(4);
        let captcha = "<html><body><form action=\"/errors/validateCaptcha\"></form></body></html>";
        assert!(extract_listings(Platform::AmazonIndia, captcha, AMAZON_BASE, 10, &mut rng).is_empty());
        assert!(extract_listings(Platform::Flipkart, captcha, FLIPKART_BASE, 10, &mut rng).is_empty());
        assert!(extract_listings(Platform::Meesho, captcha, "", 10, &mut rng).is_empty());
    }
}
