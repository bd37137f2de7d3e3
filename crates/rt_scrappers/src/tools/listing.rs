use async_trait::async_trait;
use rt_core::{Result, Tool, ToolDefinition};

use super::NoArgs;
use crate::regulator::RegulatorSite;
use crate::scrapers::PressReleaseScraper;

/// Lists the article links currently on the press-release page.
#[derive(Debug, Clone)]
pub struct ListPressReleasesTool {
    scraper: PressReleaseScraper,
}

impl ListPressReleasesTool {
    pub fn new(site: RegulatorSite) -> Self {
        Self {
            scraper: PressReleaseScraper::new(site),
        }
    }
}

#[async_trait]
impl Tool for ListPressReleasesTool {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<NoArgs>(
            "list_press_releases",
            &format!("List the titles and links of the latest {} press releases", self.scraper.source()),
        )
    }

    async fn invoke(&self, _args: serde_json::Value) -> Result<String> {
        let links = self.scraper.get_article_urls().await?;
        if links.is_empty() {
            return Ok(format!("No press releases found on {}.", self.scraper.source()));
        }
        Ok(links
            .iter()
            .map(|link| format!("- {} <{}>", link.text, link.url))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
