//! Integration tests for the static-HTML strategy and the open retry budget.
//!
//! Uses `wiremock` for the page server; no browser is launched.

use std::time::Duration;

use pricetrack_core::{FetchStrategy, Locator, LocatorChain};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pricetrack_scraper::{
    FetchSettings, PageOpener, PageSession, ScraperError, SearchRoot, StrategyOpener,
};

fn test_settings(open_attempts: u32) -> FetchSettings {
    FetchSettings {
        user_agent: "pricetrack-test/0.1".to_owned(),
        request_timeout_secs: 5,
        page_load_timeout_secs: 5,
        open_attempts,
        open_retry_delay: Duration::ZERO,
        chromium_path: None,
        headless: true,
    }
}

fn test_opener(open_attempts: u32) -> StrategyOpener {
    StrategyOpener::new(test_settings(open_attempts)).expect("failed to build test opener")
}

const PRODUCT_HTML: &str = r#"<!doctype html>
<html>
  <head><title> Linen Shirt </title></head>
  <body><span class="final-cost">1 990 ₽</span></body>
</html>"#;

#[tokio::test]
async fn static_open_parses_page_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/item/1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PRODUCT_HTML, "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/item/1", server.uri());
    let session = test_opener(2)
        .open(FetchStrategy::StaticHtml, &url)
        .await
        .unwrap();

    assert_eq!(session.url(), url);
    match &session {
        pricetrack_scraper::AnySession::Static(page) => {
            assert_eq!(page.title().as_deref(), Some("Linen Shirt"));
        }
        pricetrack_scraper::AnySession::Rendered(_) => panic!("expected a static session"),
    }
    session.close().await;
}

#[tokio::test]
async fn static_locate_signals_not_supported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/item/2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PRODUCT_HTML, "text/html"))
        .mount(&server)
        .await;

    let url = format!("{}/item/2", server.uri());
    let session = test_opener(1)
        .open(FetchStrategy::StaticHtml, &url)
        .await
        .unwrap();

    let chain = LocatorChain::single(Locator::class_name("final-cost"));
    let err = session
        .locate(&SearchRoot::Document, &chain)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ScraperError::NotSupported {
                strategy: FetchStrategy::StaticHtml,
                ..
            }
        ),
        "expected NotSupported, got: {err:?}"
    );
    session.close().await;
}

#[tokio::test]
async fn failing_open_is_retried_then_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/item/3"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let url = format!("{}/item/3", server.uri());
    let result = test_opener(2).open(FetchStrategy::StaticHtml, &url).await;

    match result {
        Err(ScraperError::PageOpenFailed {
            url: failed_url,
            attempts,
            reason,
        }) => {
            assert_eq!(failed_url, url);
            assert_eq!(attempts, 2);
            assert!(reason.contains("500"), "reason: {reason}");
        }
        Err(other) => panic!("expected PageOpenFailed, got: {other:?}"),
        Ok(_) => panic!("expected PageOpenFailed, got a session"),
    }
}

#[tokio::test]
async fn open_recovers_when_second_attempt_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/item/4"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/item/4"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PRODUCT_HTML, "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/item/4", server.uri());
    let session = test_opener(2)
        .open(FetchStrategy::StaticHtml, &url)
        .await
        .unwrap();
    assert_eq!(session.url(), url);
    session.close().await;
}
