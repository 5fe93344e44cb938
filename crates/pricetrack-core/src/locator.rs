//! Locator value types: where on a page a datum lives.
//!
//! A [`Locator`] names one identifier (kind + value). A [`LocatorChain`] is a
//! non-empty, ordered list of locators tried in turn until one resolves. Both
//! are plain values with no knowledge of how a page is fetched.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// How a locator's `value` identifies elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorKind {
    /// Element `id` attribute.
    Id,
    /// One class name; may match several elements, returned in document order.
    ClassName,
    /// An XPath expression.
    #[serde(rename = "xpath")]
    XPath,
    /// Tag name, e.g. `"img"`.
    Tag,
    /// `name` matches elements carrying the attribute; `name=value` also
    /// requires the value to be equal.
    Attribute,
    /// Innermost element whose trimmed visible text equals the value.
    Text,
}

impl LocatorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LocatorKind::Id => "id",
            LocatorKind::ClassName => "class_name",
            LocatorKind::XPath => "xpath",
            LocatorKind::Tag => "tag",
            LocatorKind::Attribute => "attribute",
            LocatorKind::Text => "text",
        }
    }
}

impl std::fmt::Display for LocatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub by: LocatorKind,
    pub value: String,
}

impl Locator {
    #[must_use]
    pub fn new(by: LocatorKind, value: impl Into<String>) -> Self {
        Self {
            by,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::Id, value)
    }

    #[must_use]
    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::ClassName, value)
    }

    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::XPath, value)
    }

    #[must_use]
    pub fn tag(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::Tag, value)
    }

    /// Splits an [`LocatorKind::Attribute`] value into `(name, expected)`.
    ///
    /// `"itemprop=price"` yields `("itemprop", Some("price"))`; `"data-price"`
    /// yields `("data-price", None)`. Returns `None` for other kinds.
    #[must_use]
    pub fn attribute_parts(&self) -> Option<(&str, Option<&str>)> {
        if self.by != LocatorKind::Attribute {
            return None;
        }
        Some(match self.value.split_once('=') {
            Some((name, expected)) => (name.trim(), Some(expected)),
            None => (self.value.trim(), None),
        })
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={:?}", self.by, self.value)
    }
}

/// Serialized shape of a chain: one locator mapping or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChainRepr {
    One(Locator),
    Many(Vec<Locator>),
}

/// A non-empty, ordered fallback list of locators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LocatorChain(Vec<Locator>);

impl LocatorChain {
    /// Builds a chain from an ordered list. Returns `None` when `locators` is empty.
    #[must_use]
    pub fn new(locators: Vec<Locator>) -> Option<Self> {
        if locators.is_empty() {
            None
        } else {
            Some(Self(locators))
        }
    }

    #[must_use]
    pub fn single(locator: Locator) -> Self {
        Self(vec![locator])
    }

    /// Builds a chain that tries `first`, then each of `rest` in order.
    #[must_use]
    pub fn with_fallbacks(first: Locator, rest: impl IntoIterator<Item = Locator>) -> Self {
        let mut locators = vec![first];
        locators.extend(rest);
        Self(locators)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Locator> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Locator] {
        &self.0
    }
}

impl From<Locator> for LocatorChain {
    fn from(locator: Locator) -> Self {
        Self::single(locator)
    }
}

impl From<LocatorChain> for Vec<Locator> {
    fn from(chain: LocatorChain) -> Self {
        chain.0
    }
}

impl<'de> Deserialize<'de> for LocatorChain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match ChainRepr::deserialize(deserializer)? {
            ChainRepr::One(locator) => Ok(Self::single(locator)),
            ChainRepr::Many(list) => {
                Self::new(list).ok_or_else(|| D::Error::custom("locator chain must not be empty"))
            }
        }
    }
}

impl<'a> IntoIterator for &'a LocatorChain {
    type Item = &'a Locator;
    type IntoIter = std::slice::Iter<'a, Locator>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::fmt::Display for LocatorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (idx, locator) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{locator}")?;
        }
        f.write_str("]")
    }
}
