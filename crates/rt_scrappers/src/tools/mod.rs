//! Tools the agents call to read the regulator's website.

use schemars::JsonSchema;
use serde::Deserialize;

mod listing;
mod scrape;
mod search;
mod validate;

pub use listing::ListPressReleasesTool;
pub use scrape::ScrapeWebsiteTool;
pub use search::WebsiteSearchTool;
pub use validate::{LinkStatus, ValidateLinkTool};

/// Arguments of tools bound to a fixed page.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct NoArgs {}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WebsiteArgs {
    /// Absolute URL of the page to read.
    pub website_url: Option<String>,
}

fn require_website(bound: &Option<String>, given: Option<String>) -> rt_core::Result<String> {
    bound
        .clone()
        .or(given)
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| rt_core::Error::Scraping("website_url is required".to_string()))
}
