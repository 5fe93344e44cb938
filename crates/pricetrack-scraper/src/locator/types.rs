use std::collections::BTreeMap;

use pricetrack_core::Locator;
use serde::{Deserialize, Serialize};

/// Snapshot of one element taken when it was located.
///
/// Holds no handle into the live page; `path` is an absolute element path
/// (`/html[1]/body[1]/div[2]`) that can be used as a [`SearchRoot`] for a
/// later drill-down query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Lower-case tag name, e.g. `"span"`.
    pub tag: String,
    /// Visible text, trimmed.
    pub text: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub path: String,
}

impl Element {
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// A search root that narrows later queries to this element's subtree.
    #[must_use]
    pub fn as_root(&self) -> SearchRoot {
        SearchRoot::Element(self.path.clone())
    }
}

/// Where a query starts. Passed explicitly to every query; sessions keep no
/// "current element".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchRoot {
    #[default]
    Document,
    /// Absolute path of a previously located element.
    Element(String),
}

impl SearchRoot {
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            SearchRoot::Document => None,
            SearchRoot::Element(path) => Some(path),
        }
    }
}

/// Result of resolving a chain: the locator that won and its ordered matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    locator: Locator,
    elements: Vec<Element>,
}

impl Located {
    /// Returns `None` when `elements` is empty; a resolved locator always has
    /// at least one match.
    #[must_use]
    pub fn new(locator: Locator, elements: Vec<Element>) -> Option<Self> {
        if elements.is_empty() {
            None
        } else {
            Some(Self { locator, elements })
        }
    }

    #[must_use]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[must_use]
    pub fn first(&self) -> &Element {
        &self.elements[0]
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Root for a drill-down query beneath the first match.
    #[must_use]
    pub fn root(&self) -> SearchRoot {
        self.first().as_root()
    }
}
