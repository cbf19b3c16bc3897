//! CSS selectors for the supported search-result layouts.
//!
//! Card selectors are ordered: the first one that matches anything on the page
//! decides the card set. Field selectors are wired into per-field strategy
//! chains in `extractor`.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

fn parse(pattern: &str) -> Selector {
    Selector::parse(pattern).unwrap_or_else(|e| panic!("invalid built-in selector {pattern:?}: {e:?}"))
}

/// Ordered list of card-level selectors. No merging across entries.
pub struct CardChain(Vec<Selector>);

impl CardChain {
    fn new(patterns: &[&str]) -> Self {
        Self(patterns.iter().map(|p| parse(p)).collect())
    }

    /// Cards matched by the first selector that yields anything.
    pub fn select<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for selector in &self.0 {
            let cards: Vec<ElementRef<'a>> = document.select(selector).collect();
            if !cards.is_empty() {
                return cards;
            }
        }
        Vec::new()
    }
}

pub mod amazon {
    use super::*;

    pub static CARDS: Lazy<CardChain> =
        Lazy::new(|| CardChain::new(&["div[data-component-type='s-search-result']"]));

    pub const ASIN_ATTR: &str = "data-asin";

    pub static TITLE_MINI: Lazy<Selector> = Lazy::new(|| parse("h2.a-size-mini"));
    pub static TITLE_MEDIUM: Lazy<Selector> = Lazy::new(|| parse("span.a-size-medium"));
    pub static PRICE_WHOLE: Lazy<Selector> = Lazy::new(|| parse("span.a-price-whole"));
    pub static PRICE_FRACTION: Lazy<Selector> = Lazy::new(|| parse("span.a-price-fraction"));
    pub static RATING: Lazy<Selector> = Lazy::new(|| parse("span.a-icon-alt"));
    pub static REVIEWS: Lazy<Selector> = Lazy::new(|| parse("span.a-size-base[dir='auto']"));
    pub static LINK: Lazy<Selector> = Lazy::new(|| parse("a.a-link-normal[href]"));
    /// Any span; sponsored cards carry one whose whole text is "Sponsored".
    pub static SPAN: Lazy<Selector> = Lazy::new(|| parse("span"));
    pub const SPONSORED_MARKER: &str = "Sponsored";
}

pub mod flipkart {
    use super::*;

    // Flipkart rotates between list, grid and compact layouts.
    pub static CARDS: Lazy<CardChain> =
        Lazy::new(|| CardChain::new(&["div._1AtVbE", "div._2kHMtA", "div._13oc-S"]));

    pub static TITLE_LINK: Lazy<Selector> = Lazy::new(|| parse("a.s1Q9rs"));
    pub static TITLE_BLOCK: Lazy<Selector> = Lazy::new(|| parse("div._4rR01T"));
    pub static PRICE: Lazy<Selector> = Lazy::new(|| parse("div._30jeq3"));
    pub static PRICE_ALT: Lazy<Selector> = Lazy::new(|| parse("div._25b18c"));
    pub static RATING: Lazy<Selector> = Lazy::new(|| parse("div._3LWZlK"));
    pub static REVIEWS: Lazy<Selector> = Lazy::new(|| parse("span._2_R_DZ"));
    pub static LINK: Lazy<Selector> = Lazy::new(|| parse("a.s1Q9rs[href]"));
    pub static LINK_ALT: Lazy<Selector> = Lazy::new(|| parse("a._1fQZEK[href]"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_card_selector_wins() {
        let html = Html::parse_document(
            r#"<div class="_2kHMtA">a</div><div class="_2kHMtA">b</div><div class="_13oc-S">c</div>"#,
        );
        let cards = flipkart::CARDS.select(&html);
        assert_eq!(cards.len(), 2);
    }

    #[test]
    fn no_matching_cards_is_empty() {
        let html = Html::parse_document("<html><body><p>blocked</p></body></html>");
        assert!(amazon::CARDS.select(&html).is_empty());
        assert!(flipkart::CARDS.select(&html).is_empty());
    }
}
