//! Element location over an open page.
//!
//! A chain is resolved by querying its locators in order against one
//! [`PageSession`]; the first locator that yields at least one element wins.

pub mod types;

pub use types::{Element, Located, SearchRoot};

use pricetrack_core::LocatorChain;

use crate::error::ScraperError;
use crate::fetch::PageSession;

/// Resolve `chain` beneath `root`, trying each locator in order.
///
/// A locator whose query fails is logged and skipped so the next one can be
/// tried. Locators after the first one that matches are never queried.
///
/// # Errors
///
/// - [`ScraperError::NotSupported`] if the session cannot run queries at all.
/// - [`ScraperError::ElementNotFound`] if no locator in the chain matched.
pub async fn locate_chain<S>(
    session: &S,
    root: &SearchRoot,
    chain: &LocatorChain,
) -> Result<Located, ScraperError>
where
    S: PageSession + ?Sized,
{
    for locator in chain {
        match session.query(root, locator).await {
            Ok(elements) => {
                if let Some(located) = Located::new(locator.clone(), elements) {
                    tracing::debug!(
                        url = session.url(),
                        %locator,
                        matches = located.elements().len(),
                        "locator resolved"
                    );
                    return Ok(located);
                }
                tracing::debug!(url = session.url(), %locator, "locator matched nothing");
            }
            Err(err @ ScraperError::NotSupported { .. }) => return Err(err),
            Err(err) => {
                tracing::warn!(
                    url = session.url(),
                    %locator,
                    error = %err,
                    "locator query failed; trying next"
                );
            }
        }
    }

    Err(ScraperError::ElementNotFound {
        attempted: chain.clone(),
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{BTreeMap, HashMap};

    use pricetrack_core::{FetchStrategy, Locator};

    use super::*;

    /// Session whose query results are keyed by locator value. Values listed
    /// in `failing` return an error instead.
    struct ScriptedSession {
        results: HashMap<String, Vec<Element>>,
        failing: Vec<String>,
        queried: RefCell<Vec<String>>,
    }

    impl ScriptedSession {
        fn new() -> Self {
            Self {
                results: HashMap::new(),
                failing: Vec::new(),
                queried: RefCell::new(Vec::new()),
            }
        }

        fn with(mut self, value: &str, elements: Vec<Element>) -> Self {
            self.results.insert(value.to_owned(), elements);
            self
        }

        fn failing(mut self, value: &str) -> Self {
            self.failing.push(value.to_owned());
            self
        }
    }

    impl PageSession for ScriptedSession {
        fn url(&self) -> &str {
            "https://shop.test/item"
        }

        async fn query(
            &self,
            _root: &SearchRoot,
            locator: &Locator,
        ) -> Result<Vec<Element>, ScraperError> {
            self.queried.borrow_mut().push(locator.value.clone());
            if self.failing.contains(&locator.value) {
                return Err(ScraperError::UnexpectedStatus {
                    status: 500,
                    url: self.url().to_owned(),
                });
            }
            Ok(self.results.get(&locator.value).cloned().unwrap_or_default())
        }

        async fn close(self) {}
    }

    fn element(text: &str) -> Element {
        Element {
            tag: "span".to_owned(),
            text: text.to_owned(),
            attributes: BTreeMap::new(),
            path: "/html[1]/body[1]/span[1]".to_owned(),
        }
    }

    fn chain(values: &[&str]) -> LocatorChain {
        LocatorChain::new(values.iter().map(|v| Locator::class_name(*v)).collect()).unwrap()
    }

    #[tokio::test]
    async fn first_resolving_locator_wins_and_later_ones_are_not_queried() {
        let session = ScriptedSession::new()
            .with("b", vec![element("1 234 ₽")])
            .with("c", vec![element("999")]);

        let located = locate_chain(&session, &SearchRoot::Document, &chain(&["a", "b", "c"]))
            .await
            .unwrap();

        assert_eq!(located.locator(), &Locator::class_name("b"));
        assert_eq!(located.first().text, "1 234 ₽");
        assert_eq!(*session.queried.borrow(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn exhausted_chain_reports_every_attempted_locator() {
        let session = ScriptedSession::new();
        let attempted = chain(&["a", "b"]);

        let err = locate_chain(&session, &SearchRoot::Document, &attempted)
            .await
            .unwrap_err();

        match err {
            ScraperError::ElementNotFound { attempted: got } => assert_eq!(got, attempted),
            other => panic!("expected ElementNotFound, got {other:?}"),
        }
        assert_eq!(*session.queried.borrow(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn failed_query_falls_through_to_next_locator() {
        let session = ScriptedSession::new()
            .failing("a")
            .with("b", vec![element("42")]);

        let located = locate_chain(&session, &SearchRoot::Document, &chain(&["a", "b"]))
            .await
            .unwrap();

        assert_eq!(located.first().text, "42");
    }

    #[tokio::test]
    async fn not_supported_is_propagated_immediately() {
        struct Unsupported;

        impl PageSession for Unsupported {
            fn url(&self) -> &str {
                "https://shop.test/"
            }

            async fn query(
                &self,
                _root: &SearchRoot,
                _locator: &Locator,
            ) -> Result<Vec<Element>, ScraperError> {
                Err(ScraperError::NotSupported {
                    strategy: FetchStrategy::StaticHtml,
                    operation: "locate",
                })
            }

            async fn close(self) {}
        }

        let err = locate_chain(&Unsupported, &SearchRoot::Document, &chain(&["a", "b"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ScraperError::NotSupported { .. }));
    }

    #[test]
    fn located_root_points_at_first_match() {
        let located = Located::new(Locator::tag("span"), vec![element("x")]).unwrap();
        assert_eq!(
            located.root(),
            SearchRoot::Element("/html[1]/body[1]/span[1]".to_owned())
        );
        assert!(Located::new(Locator::tag("span"), vec![]).is_none());
    }
}
