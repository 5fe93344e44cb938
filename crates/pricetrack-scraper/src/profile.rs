//! Per-site extraction profiles.

use pricetrack_core::{
    canonical_host, FetchStrategy, LocatorChain, PhotoRule, PriceRule, SiteConfig,
};

use crate::image::ImageReference;
use crate::locator::Located;

/// Everything needed to scrape one site: which strategy opens its pages,
/// where price and photo live, and how to read them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    name: String,
    host: String,
    strategy: FetchStrategy,
    price: LocatorChain,
    photo: LocatorChain,
    price_rule: PriceRule,
    photo_rule: PhotoRule,
}

impl From<SiteConfig> for SiteProfile {
    /// The host is stored in parsed form so it compares equal to the host of
    /// a request URL; a host that does not parse is kept as written.
    fn from(config: SiteConfig) -> Self {
        let host = canonical_host(&config.host).unwrap_or(config.host);
        Self {
            name: config.name,
            host,
            strategy: config.strategy,
            price: config.price,
            photo: config.photo,
            price_rule: config.price_rule,
            photo_rule: config.photo_rule,
        }
    }
}

impl SiteProfile {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn strategy(&self) -> FetchStrategy {
        self.strategy
    }

    #[must_use]
    pub fn price_chain(&self) -> &LocatorChain {
        &self.price
    }

    #[must_use]
    pub fn photo_chain(&self) -> &LocatorChain {
        &self.photo
    }

    /// Read the price from the located elements using this site's rule.
    ///
    /// Returns `None` when the rule's element index is out of range, the
    /// rule's attribute is absent, or the text holds no digits.
    #[must_use]
    pub fn normalize_price(&self, located: &Located) -> Option<u64> {
        let element = located.get(self.price_rule.element)?;
        let raw = match &self.price_rule.attribute {
            Some(attribute) => element.attribute(attribute)?,
            None => element.text.as_str(),
        };
        normalize_price_text(raw)
    }

    /// Read the photo reference from the located elements using this site's
    /// rule, resolved against `page_url` when relative.
    #[must_use]
    pub fn resolve_photo(&self, located: &Located, page_url: &str) -> Option<ImageReference> {
        let element = located.get(self.photo_rule.element)?;
        let raw = element.attribute(&self.photo_rule.attribute)?.trim();
        if raw.is_empty() {
            return None;
        }
        Some(ImageReference::new(absolutize_url(page_url, raw)))
    }
}

/// Keep only the ASCII digits of `text` and parse them as a whole number.
///
/// Separators, currency signs and decimal points are all dropped, so
/// `"1 234 ₽"` reads as `1234`. Only `0`-`9` count as digits; other Unicode
/// decimal digits (Arabic-Indic, fullwidth) are dropped like any other
/// character. Returns `None` when no digits remain or the number does not
/// fit in a `u64`.
#[must_use]
pub fn normalize_price_text(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Resolve `candidate` against `base_url`. Returns `candidate` unchanged when
/// either does not parse.
fn absolutize_url(base_url: &str, candidate: &str) -> String {
    let candidate = candidate.replace("&amp;", "&");
    reqwest::Url::parse(base_url)
        .and_then(|base| base.join(&candidate))
        .map_or(candidate, |url| url.to_string())
}
