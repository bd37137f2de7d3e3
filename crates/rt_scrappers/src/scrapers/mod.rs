use reqwest::Client;
use rt_core::{Error, Result};
use scraper::{Html, Selector};
use url::Url;

pub mod press_releases;

pub use press_releases::PressReleaseScraper;

const USER_AGENT: &str = concat!("regulatory-tracker/", env!("CARGO_PKG_VERSION"));

/// Tags whose text never reaches the reader.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: Url,
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PageFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let url = utils::parse_url(url)?;
        tracing::debug!("🌐 Fetching {}", url);
        let response = self.client.get(url).send().await?;
        let url = response.url().clone();
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchedPage { url, status, body })
    }

    /// Like [`fetch`](Self::fetch) but non-success statuses are errors.
    pub async fn fetch_ok(&self, url: &str) -> Result<FetchedPage> {
        let page = self.fetch(url).await?;
        if !page.is_success() {
            return Err(Error::Scraping(format!("{} returned HTTP {}", page.url, page.status)));
        }
        Ok(page)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLink {
    pub text: String,
    pub url: String,
}

/// What the tools need from a page, extracted in one pass.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub title: String,
    pub text: String,
    pub links: Vec<PageLink>,
    /// Headings, paragraphs, list items and links, in document order.
    pub passages: Vec<String>,
}

pub fn extract_page(html: &str, base: &Url) -> Result<PageContent> {
    let document = Html::parse_document(html);

    let title = utils::extract_text(&document, "title")
        .or_else(|_| utils::extract_text(&document, "h1"))
        .map(|t| utils::collapse_whitespace(&t))
        .unwrap_or_default();

    let links = utils::extract_links(&document, base)?;

    let mut passages = Vec::new();
    let passage_selector = utils::selector("h1, h2, h3, h4, p, li, a[href]")?;
    for element in document.select(&passage_selector) {
        let text = utils::collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
        if text.is_empty() {
            continue;
        }
        let passage = match element.value().attr("href").and_then(|href| utils::resolve(base, href)) {
            Some(url) => format!("{} ({})", text, url),
            None => text,
        };
        if !passages.contains(&passage) {
            passages.push(passage);
        }
    }

    Ok(PageContent {
        title,
        text: utils::visible_text(&document),
        links,
        passages,
    })
}

/// Common utilities for scrapers
pub(crate) mod utils {
    use super::*;

    pub fn parse_url(url: &str) -> Result<Url> {
        Url::parse(url.trim()).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))
    }

    pub fn selector(css: &str) -> Result<Selector> {
        Selector::parse(css).map_err(|e| Error::Scraping(format!("Invalid selector: {}", e)))
    }

    pub fn extract_text(document: &Html, css: &str) -> Result<String> {
        let selector = selector(css)?;
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| Error::Scraping(format!("No element found for selector: {}", css)))
    }

    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Absolute URL for `href`, or `None` for anchors, scripts and mail links.
    pub fn resolve(base: &Url, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            return None;
        }
        base.join(href).ok().map(|mut url| {
            url.set_fragment(None);
            url.to_string()
        })
    }

    pub fn extract_links(document: &Html, base: &Url) -> Result<Vec<PageLink>> {
        let selector = selector("a[href]")?;
        let mut links: Vec<PageLink> = Vec::new();
        for element in document.select(&selector) {
            let Some(url) = element.value().attr("href").and_then(|href| resolve(base, href)) else {
                continue;
            };
            let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
            if !links.iter().any(|l| l.url == url) {
                links.push(PageLink { text, url });
            }
        }
        Ok(links)
    }

    pub fn visible_text(document: &Html) -> String {
        let mut words: Vec<&str> = Vec::new();
        for node in document.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map_or(false, |el| HIDDEN_TAGS.contains(&el.name()))
            });
            if !hidden {
                words.extend(text.split_whitespace());
            }
        }
        words.join(" ")
    }

    pub fn truncate_chars(text: &str, max: usize) -> String {
        match text.char_indices().nth(max) {
            Some((index, _)) => format!("{}...", &text[..index]),
            None => text.to_string(),
        }
    }
}
