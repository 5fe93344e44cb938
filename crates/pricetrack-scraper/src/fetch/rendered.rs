//! Rendered-DOM strategy: a headless browser per page.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::Browser;
use chromiumoxide::Page;
use pricetrack_core::Locator;
use tokio::task::JoinHandle;

use super::browser::{launch_browser, remove_profile_dir};
use super::{FetchSettings, PageSession};
use crate::error::ScraperError;
use crate::locator::{Element, SearchRoot};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Evaluated in the page for every query. `__ARGS__` is replaced with a JSON
/// object `{root, kind, value, name, expected}`. A drill-down root that no
/// longer exists yields no matches.
const QUERY_SCRIPT: &str = r#"
(() => {
  const args = __ARGS__;
  const xpathAll = (expr, ctx) => {
    const snap = document.evaluate(expr, ctx, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
    const out = [];
    for (let i = 0; i < snap.snapshotLength; i++) {
      const node = snap.snapshotItem(i);
      if (node.nodeType === Node.ELEMENT_NODE) out.push(node);
    }
    return out;
  };
  const pathOf = (el) => {
    const parts = [];
    for (let node = el; node; node = node.parentElement) {
      let index = 1;
      for (let sib = node.previousElementSibling; sib; sib = sib.previousElementSibling) {
        if (sib.localName === node.localName) index++;
      }
      parts.unshift(node.localName + '[' + index + ']');
    }
    return '/' + parts.join('/');
  };
  const textOf = (el) => ((el.innerText ?? el.textContent) || '').trim();

  let root = document;
  if (args.root !== null) {
    const found = xpathAll(args.root, document);
    if (found.length === 0) return [];
    root = found[0];
  }
  const scope = root === document ? document.documentElement : root;

  let matches = [];
  switch (args.kind) {
    case 'id':
      matches = Array.from(root.querySelectorAll('[id=\"' + CSS.escape(args.value) + '\"]')).slice(0, 1);
      break;
    case 'class_name':
      matches = Array.from(root.getElementsByClassName(args.value));
      break;
    case 'tag':
      matches = Array.from(root.getElementsByTagName(args.value));
      break;
    case 'xpath':
      matches = xpathAll(args.value, root);
      break;
    case 'attribute':
      matches = Array.from(root.querySelectorAll('[' + CSS.escape(args.name) + ']'))
        .filter((el) => args.expected === null || el.getAttribute(args.name) === args.expected);
      break;
    case 'text': {
      const hits = [scope, ...scope.querySelectorAll('*')].filter((el) => textOf(el) === args.value);
      matches = hits.filter((el) => !hits.some((other) => other !== el && el.contains(other)));
      break;
    }
  }

  return matches.map((el) => ({
    tag: el.localName,
    text: textOf(el),
    attributes: Object.fromEntries(Array.from(el.attributes).map((a) => [a.name, a.value])),
    path: pathOf(el),
  }));
})()
"#;

/// Build the query script for one locator beneath `root`.
fn build_query_script(root: &SearchRoot, locator: &Locator) -> String {
    let (name, expected) = match locator.attribute_parts() {
        Some((name, expected)) => (Some(name), expected),
        None => (None, None),
    };
    let args = serde_json::json!({
        "root": root.path(),
        "kind": locator.by.as_str(),
        "value": locator.value,
        "name": name,
        "expected": expected,
    });
    QUERY_SCRIPT.replace("__ARGS__", &args.to_string())
}

/// A page loaded in a dedicated headless browser.
///
/// Dropping the session without calling [`PageSession::close`] still kills
/// the browser process and removes its profile directory.
pub struct RenderedPage {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    url: String,
    timeout: Duration,
    user_data_dir: Option<PathBuf>,
}

impl RenderedPage {
    /// Launch a browser and navigate to `url`.
    ///
    /// The browser is shut down before returning if navigation fails, so a
    /// failed attempt leaves nothing running.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::BrowserLaunch`] if no browser could be started.
    /// - [`ScraperError::Browser`] if navigation fails.
    /// - [`ScraperError::Timeout`] if navigation exceeds the page-load timeout.
    pub async fn open(url: &str, settings: &FetchSettings) -> Result<Self, ScraperError> {
        let (mut browser, handler, user_data_dir) = launch_browser(settings).await?;
        let timeout = settings.page_load_timeout();

        let navigation = async {
            let page = browser.new_page("about:blank").await?;
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<Page, ScraperError>(page)
        };

        match bounded(timeout, "navigation", url, navigation).await {
            Ok(page) => {
                tracing::debug!(url, "page rendered");
                Ok(Self {
                    browser,
                    handler,
                    page,
                    url: url.to_owned(),
                    timeout,
                    user_data_dir: Some(user_data_dir),
                })
            }
            Err(err) => {
                shutdown(&mut browser, &handler).await;
                remove_profile_dir(&user_data_dir);
                Err(err)
            }
        }
    }
}

impl PageSession for RenderedPage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn query(
        &self,
        root: &SearchRoot,
        locator: &Locator,
    ) -> Result<Vec<Element>, ScraperError> {
        let script = build_query_script(root, locator);
        let evaluation = async {
            let result = self.page.evaluate_expression(script.as_str()).await?;
            result
                .into_value::<Vec<Element>>()
                .map_err(|e| ScraperError::Deserialize {
                    context: format!("{} query {locator}", locator.by),
                    source: e,
                })
        };
        bounded(self.timeout, "element query", &self.url, evaluation).await
    }

    async fn close(mut self) {
        shutdown(&mut self.browser, &self.handler).await;
        if let Some(dir) = self.user_data_dir.take() {
            remove_profile_dir(&dir);
        }
        tracing::debug!(url = %self.url, "browser released");
    }
}

impl Drop for RenderedPage {
    fn drop(&mut self) {
        self.handler.abort();
        if let Some(dir) = self.user_data_dir.take() {
            remove_profile_dir(&dir);
        }
    }
}

async fn shutdown(browser: &mut Browser, handler: &JoinHandle<()>) {
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, browser.close()).await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => tracing::warn!(error = %err, "browser close failed"),
        Err(_) => tracing::warn!("browser close timed out"),
    }
    match tokio::time::timeout(SHUTDOWN_TIMEOUT, browser.wait()).await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => tracing::warn!(error = %err, "waiting for browser exit failed"),
        Err(_) => {
            tracing::warn!("browser did not exit; killing");
            if let Some(Err(err)) = browser.kill().await {
                tracing::warn!(error = %err, "failed to kill browser");
            }
        }
    }
    handler.abort();
}

async fn bounded<T, F>(
    limit: Duration,
    operation: &'static str,
    url: &str,
    future: F,
) -> Result<T, ScraperError>
where
    F: Future<Output = Result<T, ScraperError>>,
{
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| ScraperError::Timeout {
            operation,
            url: url.to_owned(),
            secs: limit.as_secs(),
        })?
}
