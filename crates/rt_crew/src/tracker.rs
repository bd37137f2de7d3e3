use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rt_core::{CrewOutput, Error, InferenceModel, NewsItem, NewsTracker, Result};
use rt_scrappers::{
    ListPressReleasesTool, RegulatorSite, ScrapeWebsiteTool, ValidateLinkTool, WebsiteSearchTool,
};
use tracing::info;

use crate::agent::{Agent, DEFAULT_MAX_ITER};
use crate::crew::Crew;
use crate::delegation::DEFAULT_MAX_DELEGATIONS;
use crate::prompt::Inputs;
use crate::task::Task;

pub const DEFAULT_TOPIC: &str = "Anti-Money Laundering";

pub const SEARCHER: &str = "Web Searcher";
pub const SCRAPER: &str = "Web Scraper";
pub const ANALYZER: &str = "Content Analyzer";

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub site: RegulatorSite,
    /// Updates published before this date are ignored.
    pub since: NaiveDate,
    pub max_delegations: u32,
    pub max_iter: usize,
}

impl TrackerConfig {
    pub fn default_since() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap_or(NaiveDate::MIN)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            site: RegulatorSite::default(),
            since: Self::default_since(),
            max_delegations: DEFAULT_MAX_DELEGATIONS,
            max_iter: DEFAULT_MAX_ITER,
        }
    }
}

/// Searcher, Scraper and Analyzer run in sequence against one regulator site.
#[derive(Debug, Clone)]
pub struct RegulatoryTracker {
    config: TrackerConfig,
    crew: Crew,
}

impl RegulatoryTracker {
    pub fn new(llm: Arc<dyn InferenceModel>, config: TrackerConfig) -> Result<Self> {
        let site = &config.site;
        let listing = site.press_releases_url();

        let searcher = Agent::builder()
            .role(SEARCHER)
            .goal("Find {site} press releases about {topic}")
            .backstory(
                "You are an expert researcher who knows how the {site} publishes its news \
                 and can quickly spot the releases that matter for {topic}.",
            )
            .max_iter(config.max_iter)
            .tool(Arc::new(WebsiteSearchTool::bound(listing.clone())))
            .tool(Arc::new(ListPressReleasesTool::new(site.clone())))
            .llm(llm.clone())
            .build()?;

        let scraper = Agent::builder()
            .role(SCRAPER)
            .goal("Efficiently scrape and extract content about {topic} from the {site} website")
            .backstory(
                "You are an expert web scraper specialized in extracting information \
                 from financial regulatory websites.",
            )
            .max_iter(config.max_iter)
            .tool(Arc::new(ScrapeWebsiteTool::bound(listing.clone())))
            .tool(Arc::new(WebsiteSearchTool::bound(listing)))
            .llm(llm.clone())
            .build()?;

        let analyzer = Agent::builder()
            .role(ANALYZER)
            .goal(
                "Analyze content for {topic} relevance and extract key information. \
                 Check every news link. If a link is not accessible, do not scrape the content \
                 yourself but delegate the work back to the Web Scraper and tell it to find the correct link.",
            )
            .backstory("You are a financial regulation expert specialized in {topic}.")
            .allow_delegation(true)
            .max_iter(config.max_iter)
            .tool(Arc::new(ScrapeWebsiteTool::new()))
            .tool(Arc::new(WebsiteSearchTool::new()))
            .tool(Arc::new(ValidateLinkTool::new(site.clone())))
            .llm(llm)
            .build()?;

        let search_task = Task::new(
            "1. Search the {site} press releases at {press_releases_url} for news about {topic}\n\
             2. List every candidate release with its title, its date when shown, and its link\n\
             3. If nothing matches, say so plainly",
            "A list of candidate {site} press releases about {topic}, with titles, dates and links.",
            SEARCHER,
        );

        let scrape_task = Task::new(
            "1. Read the {site} press releases at {press_releases_url}\n\
             2. Keep only updates published on or after {since}\n\
             3. For each update extract: date, title, a short summary and the link\n\
             4. Links must follow the pattern {article_prefix}<slug>, for example:\n{example_articles}\n\
             5. If you cannot confirm a link, give your best guess following that pattern instead of leaving it out\n\
             6. Set Publisher_Name to {publisher}",
            "A structured dataset containing dates, titles, summaries and links of each relevant update.",
            SCRAPER,
        )
        .with_output_json::<NewsItem>();

        let analysis_task = Task::new(
            "1. Validate each News_Link with the link validator. If a link is invalid, delegate to \
             the Web Scraper with the update's title and date and ask for the correct link\n\
             2. Keep only updates related to {topic}\n\
             3. Summarize the key points of each update in News_Summary\n\
             4. Set Relevance to a short note on how the update relates to {topic} and \
             Importance to High, Medium or Low\n\
             5. If a link still cannot be confirmed, set News_Link to UNRESOLVABLE",
            "A list of {topic} related updates from {publisher} published since {since}, \
             with Publisher_Name, News_Title, News_Summary, News_Date and News_Link.",
            ANALYZER,
        )
        .with_output_json::<NewsItem>();

        let crew = Crew::new(
            vec![searcher, scraper, analyzer],
            vec![search_task, scrape_task, analysis_task],
        )
        .with_max_delegations(config.max_delegations);

        Ok(Self { config, crew })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn crew(&self) -> &Crew {
        &self.crew
    }

    /// Placeholder values for one run on `topic`.
    pub fn inputs(&self, topic: &str) -> Inputs {
        let site = &self.config.site;
        let mut inputs = Inputs::new();
        inputs.insert("topic".to_string(), topic.to_string());
        inputs.insert("since".to_string(), self.config.since.format("%B %-d, %Y").to_string());
        inputs.insert("site".to_string(), site.name.clone());
        inputs.insert("publisher".to_string(), site.publisher.clone());
        inputs.insert("press_releases_url".to_string(), site.press_releases_url());
        inputs.insert("article_prefix".to_string(), site.article_prefix());
        inputs.insert(
            "example_articles".to_string(),
            site.example_articles
                .iter()
                .map(|url| format!("   - {}", url))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        inputs
    }
}

#[async_trait]
impl NewsTracker for RegulatoryTracker {
    async fn track(&self, topic: &str) -> Result<CrewOutput> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(Error::Pipeline("topic must not be empty".to_string()));
        }
        info!("🔎 Tracking {} news on {}", topic, self.config.site.name);
        let output = self.crew.kickoff(&self.inputs(topic)).await?;
        info!(
            "📊 Run finished: {} tasks, {} tokens",
            output.tasks_output.len(),
            output.token_usage.total_tokens
        );
        Ok(output)
    }
}
