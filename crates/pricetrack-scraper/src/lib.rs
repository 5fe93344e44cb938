pub mod error;
pub mod extract;
pub mod fetch;
pub mod image;
pub mod locator;
pub mod profile;
pub mod registry;

pub use error::ScraperError;
pub use extract::{Extractor, ScrapeOutcome};
pub use fetch::{
    AnySession, FetchSettings, PageOpener, PageSession, RenderedPage, StaticPage, StrategyOpener,
};
pub use image::{
    ImageAcquirer, ImageReference, ImageSettings, NameSource, RandomNames, StoredImage,
};
pub use locator::{locate_chain, Element, Located, SearchRoot};
pub use profile::{normalize_price_text, SiteProfile};
pub use registry::SiteRegistry;
