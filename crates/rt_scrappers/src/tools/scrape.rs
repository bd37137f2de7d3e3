use async_trait::async_trait;
use rt_core::{parse_args, Result, Tool, ToolDefinition};

use super::{require_website, NoArgs, WebsiteArgs};
use crate::scrapers::{extract_page, utils, PageFetcher};

const MAX_TEXT_CHARS: usize = 20_000;
const MAX_LINKS: usize = 200;

/// Returns the visible text of a page followed by its links.
#[derive(Debug, Clone)]
pub struct ScrapeWebsiteTool {
    website: Option<String>,
    fetcher: PageFetcher,
}

impl ScrapeWebsiteTool {
    /// A tool that reads any page the agent names.
    pub fn new() -> Self {
        Self {
            website: None,
            fetcher: PageFetcher::new(),
        }
    }

    /// A tool that always reads `website`.
    pub fn bound(website: impl Into<String>) -> Self {
        Self {
            website: Some(website.into()),
            fetcher: PageFetcher::new(),
        }
    }

    pub async fn scrape(&self, url: &str) -> Result<String> {
        let page = self.fetcher.fetch_ok(url).await?;
        let content = extract_page(&page.body, &page.url)?;

        let mut out = format!(
            "The following text is scraped website content from {}:\n\n{}\n",
            page.url,
            utils::truncate_chars(&content.text, MAX_TEXT_CHARS)
        );
        if !content.links.is_empty() {
            out.push_str("\nLinks on this page:\n");
            for link in content.links.iter().take(MAX_LINKS) {
                out.push_str(&format!("- {} <{}>\n", link.text, link.url));
            }
        }
        Ok(out)
    }
}

impl Default for ScrapeWebsiteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ScrapeWebsiteTool {
    fn definition(&self) -> Result<ToolDefinition> {
        match &self.website {
            Some(website) => ToolDefinition::new::<NoArgs>(
                "read_website_content",
                &format!("Read the text and links of {}", website),
            ),
            None => ToolDefinition::new::<WebsiteArgs>(
                "read_website_content",
                "Read the text and links of a website page. Give the absolute website_url.",
            ),
        }
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<String> {
        let args: WebsiteArgs = parse_args(args)?;
        let url = require_website(&self.website, args.website_url)?;
        self.scrape(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scrape_bound_page() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/news-media/press-releases")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(
                r#"<html><head><script>ignored()</script></head><body>
                    <h1>Press releases</h1>
                    <p>23 May 2025 Enforcement action against a credit union</p>
                    <a href="/news/article/enforcement-action">Enforcement action</a>
                </body></html>"#,
            )
            .create_async()
            .await;

        let tool = ScrapeWebsiteTool::bound(format!("{}/news-media/press-releases", server.url()));
        let out = tool.invoke(serde_json::json!({})).await.unwrap();

        assert!(out.contains("23 May 2025 Enforcement action against a credit union"));
        assert!(!out.contains("ignored()"));
        assert!(out.contains(&format!(
            "- Enforcement action <{}/news/article/enforcement-action>",
            server.url()
        )));
    }

    #[tokio::test]
    async fn test_unbound_requires_url() {
        let tool = ScrapeWebsiteTool::new();
        let err = tool.invoke(serde_json::json!({})).await.unwrap_err();
        assert!(err.to_string().contains("website_url is required"));
    }

    #[tokio::test]
    async fn test_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _page = server.mock("GET", "/missing").with_status(404).create_async().await;

        let tool = ScrapeWebsiteTool::new();
        let err = tool
            .invoke(serde_json::json!({"website_url": format!("{}/missing", server.url())}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_definition_depends_on_binding() {
        let bound = ScrapeWebsiteTool::bound("https://www.centralbank.ie").definition().unwrap();
        assert!(bound.parameters["properties"].as_object().map_or(true, |p| p.is_empty()));

        let unbound = ScrapeWebsiteTool::new().definition().unwrap();
        assert!(unbound.parameters["properties"]["website_url"].is_object());
    }
}
