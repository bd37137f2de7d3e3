use async_trait::async_trait;
use rt_core::{parse_args, Result, Tool, ToolDefinition};
use schemars::JsonSchema;
use serde::Deserialize;

use super::require_website;
use crate::scrapers::{extract_page, PageFetcher};

const TOP_PASSAGES: usize = 10;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "it", "of", "on", "or",
    "the", "to", "with", "about", "news", "any", "all",
];

#[derive(Debug, Deserialize, JsonSchema)]
struct BoundSearchArgs {
    /// What to look for on the page.
    #[allow(dead_code)]
    search_query: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchArgs {
    /// What to look for on the page.
    search_query: String,
    /// Absolute URL of the page to search.
    website_url: Option<String>,
}

/// Ranks the passages of a page against a query.
///
/// Ranking is lexical: a passage scores one point per distinct query term it
/// contains. Ties keep document order.
#[derive(Debug, Clone)]
pub struct WebsiteSearchTool {
    website: Option<String>,
    fetcher: PageFetcher,
}

impl WebsiteSearchTool {
    pub fn new() -> Self {
        Self {
            website: None,
            fetcher: PageFetcher::new(),
        }
    }

    pub fn bound(website: impl Into<String>) -> Self {
        Self {
            website: Some(website.into()),
            fetcher: PageFetcher::new(),
        }
    }

    pub async fn search(&self, url: &str, query: &str) -> Result<String> {
        let page = self.fetcher.fetch_ok(url).await?;
        let content = extract_page(&page.body, &page.url)?;
        let ranked = rank_passages(&content.passages, query);

        if ranked.is_empty() {
            return Ok(format!("No relevant passages for \"{}\" on {}.", query, page.url));
        }

        let mut out = format!("Relevant content on {} for \"{}\":\n", page.url, query);
        for (i, passage) in ranked.iter().take(TOP_PASSAGES).enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, passage));
        }
        Ok(out)
    }
}

impl Default for WebsiteSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

fn terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() > 1 && !STOPWORDS.contains(&w.as_str()))
    {
        if !terms.contains(&word) {
            terms.push(word);
        }
    }
    terms
}

pub(crate) fn rank_passages<'a>(passages: &'a [String], query: &str) -> Vec<&'a str> {
    let query_terms = terms(query);
    let mut scored: Vec<(usize, usize, &str)> = passages
        .iter()
        .enumerate()
        .filter_map(|(position, passage)| {
            let passage_terms = terms(passage);
            let score = query_terms.iter().filter(|t| passage_terms.contains(t)).count();
            (score > 0).then_some((score, position, passage.as_str()))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, _, passage)| passage).collect()
}

#[async_trait]
impl Tool for WebsiteSearchTool {
    fn definition(&self) -> Result<ToolDefinition> {
        match &self.website {
            Some(website) => ToolDefinition::new::<BoundSearchArgs>(
                "search_website",
                &format!("Search the content of {} for passages matching search_query", website),
            ),
            None => ToolDefinition::new::<SearchArgs>(
                "search_website",
                "Search the content of website_url for passages matching search_query",
            ),
        }
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<String> {
        let args: SearchArgs = parse_args(args)?;
        let url = require_website(&self.website, args.website_url)?;
        self.search(&url, &args.search_query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms() {
        assert_eq!(terms("Anti-Money Laundering news for the CBI"), ["anti", "money", "laundering", "cbi"]);
        assert!(terms("the a of").is_empty());
    }

    #[test]
    fn test_rank_passages() {
        let passages = vec![
            "Consumer protection update".to_string(),
            "Fine for money laundering breaches".to_string(),
            "Anti-Money Laundering Authority board appointment".to_string(),
            "Money markets review".to_string(),
        ];
        let ranked = rank_passages(&passages, "anti-money laundering");
        assert_eq!(
            ranked,
            [
                "Anti-Money Laundering Authority board appointment",
                "Fine for money laundering breaches",
                "Money markets review",
            ]
        );
        assert!(rank_passages(&passages, "crypto").is_empty());
    }

    #[tokio::test]
    async fn test_search_bound_page() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/news-media/press-releases")
            .with_status(200)
            .with_body(
                r#"<html><body>
                    <a href="/news/article/mortgage-rules">Mortgage measures review</a>
                    <a href="/news/article/aml-fine">Credit union fined for anti-money laundering breaches</a>
                </body></html>"#,
            )
            .create_async()
            .await;

        let tool = WebsiteSearchTool::bound(format!("{}/news-media/press-releases", server.url()));
        let out = tool
            .invoke(serde_json::json!({"search_query": "anti-money laundering"}))
            .await
            .unwrap();
        assert!(out.contains(&format!(
            "1. Credit union fined for anti-money laundering breaches ({}/news/article/aml-fine)",
            server.url()
        )));
        assert!(!out.contains("Mortgage"));

        let none = tool
            .invoke(serde_json::json!({"search_query": "cryptocurrency"}))
            .await
            .unwrap();
        assert!(none.starts_with("No relevant passages"));
    }
}
