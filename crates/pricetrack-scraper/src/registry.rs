//! Host → profile lookup.

use pricetrack_core::{builtin_sites, SiteConfig};

use crate::error::ScraperError;
use crate::profile::SiteProfile;

/// Immutable set of site profiles, built once and passed to the extractor.
///
/// Registration order is lookup priority.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    profiles: Vec<SiteProfile>,
}

impl SiteRegistry {
    #[must_use]
    pub fn new(profiles: Vec<SiteProfile>) -> Self {
        Self { profiles }
    }

    #[must_use]
    pub fn from_configs(configs: Vec<SiteConfig>) -> Self {
        Self::new(configs.into_iter().map(SiteProfile::from).collect())
    }

    #[must_use]
    pub fn builtin() -> Self {
        Self::from_configs(builtin_sites())
    }

    #[must_use]
    pub fn profiles(&self) -> &[SiteProfile] {
        &self.profiles
    }

    /// Find the profile whose host equals `url`'s host.
    ///
    /// Hosts compare case-insensitively and exactly; `shop.example.com` does
    /// not match `m.shop.example.com`. Port, path and query are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::UnsupportedSite`] if `url` has no host or no
    /// profile is registered for it.
    pub fn get_profile(&self, url: &str) -> Result<&SiteProfile, ScraperError> {
        let unsupported = || ScraperError::UnsupportedSite {
            url: url.to_owned(),
        };

        let parsed = reqwest::Url::parse(url.trim()).map_err(|_| unsupported())?;
        let host = parsed.host_str().ok_or_else(unsupported)?;

        self.profiles
            .iter()
            .find(|profile| profile.host().eq_ignore_ascii_case(host))
            .ok_or_else(unsupported)
    }
}

#[cfg(test)]
mod tests {
    use pricetrack_core::{FetchStrategy, Locator, LocatorChain, PhotoRule, PriceRule};

    use super::*;

    fn config(name: &str, host: &str) -> SiteConfig {
        SiteConfig {
            name: name.to_owned(),
            host: host.to_owned(),
            strategy: FetchStrategy::StaticHtml,
            price: LocatorChain::single(Locator::id("price")),
            photo: LocatorChain::single(Locator::tag("img")),
            price_rule: PriceRule::default(),
            photo_rule: PhotoRule::default(),
        }
    }

    #[test]
    fn unknown_host_is_unsupported() {
        let registry = SiteRegistry::builtin();
        let err = registry
            .get_profile("https://www.ozon.ru/product/123")
            .unwrap_err();
        assert!(
            matches!(
                &err,
                ScraperError::UnsupportedSite { url } if url == "https://www.ozon.ru/product/123"
            ),
            "expected UnsupportedSite, got: {err:?}"
        );
    }

    #[test]
    fn registered_host_matches_regardless_of_path_and_query() {
        let registry = SiteRegistry::builtin();
        let profile = registry
            .get_profile("https://www.lamoda.ru/p/mp002xw0/clothes-shirt/?utm_source=x#reviews")
            .unwrap();
        assert_eq!(profile.name(), "Lamoda");
        assert_eq!(profile.strategy(), FetchStrategy::Rendered);
    }

    #[test]
    fn host_match_is_exact_not_substring() {
        let registry = SiteRegistry::builtin();
        assert!(registry.get_profile("https://wildberries.ru/catalog/1").is_err());
        assert!(registry
            .get_profile("https://www.wildberries.ru.evil.test/catalog/1")
            .is_err());
    }

    #[test]
    fn host_match_ignores_case_and_port() {
        let registry = SiteRegistry::builtin();
        let profile = registry
            .get_profile("https://WWW.Wildberries.RU:443/catalog/1/detail.aspx")
            .unwrap();
        assert_eq!(profile.name(), "Wildberries");
    }

    #[test]
    fn first_registered_profile_wins() {
        let registry = SiteRegistry::from_configs(vec![
            config("First", "shop.test"),
            config("Second", "shop.test"),
        ]);
        assert_eq!(
            registry.get_profile("http://shop.test/a").unwrap().name(),
            "First"
        );
    }

    #[test]
    fn internationalized_host_matches_unicode_and_punycode_urls() {
        let registry = SiteRegistry::from_configs(vec![config("Магазин", "магазин.рф")]);
        assert_eq!(registry.profiles()[0].host(), "xn--80aa0agaebmd.xn--p1ai");

        let profile = registry.get_profile("https://магазин.рф/item/1").unwrap();
        assert_eq!(profile.name(), "Магазин");
        assert!(registry
            .get_profile("https://xn--80aa0agaebmd.xn--p1ai/item/2")
            .is_ok());
        assert!(registry.get_profile("https://shop.рф/item/1").is_err());
    }

    #[test]
    fn configured_host_case_does_not_matter() {
        let registry = SiteRegistry::from_configs(vec![config("Shop", "Shop.Example.COM")]);
        assert!(registry.get_profile("https://shop.example.com/p/1").is_ok());
    }

    #[test]
    fn unparseable_url_is_unsupported() {
        let registry = SiteRegistry::builtin();
        assert!(matches!(
            registry.get_profile("not a url"),
            Err(ScraperError::UnsupportedSite { .. })
        ));
        assert!(matches!(
            registry.get_profile("mailto:someone@www.lamoda.ru"),
            Err(ScraperError::UnsupportedSite { .. })
        ));
    }
}
