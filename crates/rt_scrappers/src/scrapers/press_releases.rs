use rt_core::Result;

use super::{extract_page, PageFetcher, PageLink};
use crate::regulator::RegulatorSite;

/// Lists the article links on a regulator's press-release page.
#[derive(Debug, Clone)]
pub struct PressReleaseScraper {
    site: RegulatorSite,
    fetcher: PageFetcher,
}

impl PressReleaseScraper {
    pub fn new(site: RegulatorSite) -> Self {
        Self {
            site,
            fetcher: PageFetcher::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.site.name
    }

    pub fn can_handle(&self, url: &str) -> bool {
        self.site.is_article_url(url)
    }

    /// Article links from the listing page, in page order, without duplicates.
    pub async fn get_article_urls(&self) -> Result<Vec<PageLink>> {
        let page = self.fetcher.fetch_ok(&self.site.press_releases_url()).await?;
        let content = extract_page(&page.body, &page.url)?;
        let links: Vec<PageLink> = content
            .links
            .into_iter()
            .filter(|link| self.can_handle(&link.url))
            .collect();
        tracing::info!("🦗 Found {} articles on {}", links.len(), self.source());
        Ok(links)
    }
}
