use async_trait::async_trait;
use rt_core::{parse_args, Result, Tool, ToolDefinition};
use schemars::JsonSchema;
use serde::Deserialize;
use std::fmt;

use crate::regulator::RegulatorSite;
use crate::scrapers::{extract_page, PageFetcher};

#[derive(Debug, Deserialize, JsonSchema)]
struct ValidateArgs {
    /// The news link to check.
    url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkStatus {
    Valid { title: String },
    Invalid { reason: String },
}

impl LinkStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, LinkStatus::Valid { .. })
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Valid { title } => write!(f, "VALID ({})", title),
            LinkStatus::Invalid { reason } => write!(f, "INVALID: {}", reason),
        }
    }
}

/// Checks that a news link is a reachable article on the regulator's site.
#[derive(Debug, Clone)]
pub struct ValidateLinkTool {
    site: RegulatorSite,
    fetcher: PageFetcher,
}

impl ValidateLinkTool {
    pub fn new(site: RegulatorSite) -> Self {
        Self {
            site,
            fetcher: PageFetcher::new(),
        }
    }

    pub async fn validate(&self, url: &str) -> LinkStatus {
        if !self.site.is_article_url(url) {
            return LinkStatus::Invalid {
                reason: format!(
                    "{} does not follow the article pattern {}<slug>",
                    url,
                    self.site.article_prefix()
                ),
            };
        }

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                return LinkStatus::Invalid {
                    reason: format!("{} is unreachable: {}", url, e),
                }
            }
        };

        if !page.is_success() {
            return LinkStatus::Invalid {
                reason: format!("{} returned HTTP {}", url, page.status),
            };
        }

        // A retired article usually redirects to a listing or the home page.
        if !self.site.is_article_url(page.url.as_str()) {
            return LinkStatus::Invalid {
                reason: format!("{} redirected to {}, which is not an article", url, page.url),
            };
        }

        let title = extract_page(&page.body, &page.url)
            .map(|content| content.title)
            .unwrap_or_default();
        LinkStatus::Valid { title }
    }
}

#[async_trait]
impl Tool for ValidateLinkTool {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<ValidateArgs>(
            "validate_news_link",
            &format!(
                "Check that a news link opens a {} article page. Answers VALID or INVALID with a reason.",
                self.site.name
            ),
        )
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<String> {
        let args: ValidateArgs = parse_args(args)?;
        let status = self.validate(&args.url).await;
        tracing::info!("🔗 {} -> {}", args.url, status);
        Ok(status.to_string())
    }
}
