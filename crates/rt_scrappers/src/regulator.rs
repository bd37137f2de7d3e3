use serde::{Deserialize, Serialize};
use url::Url;

/// The regulator whose press releases are tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatorSite {
    pub name: String,
    /// Short name written into `Publisher_Name`.
    pub publisher: String,
    pub base_url: String,
    pub press_releases_path: String,
    /// Every news article lives under this path.
    pub article_path: String,
    /// Known-good article URLs, shown to agents as a format reference.
    pub example_articles: Vec<String>,
}

impl Default for RegulatorSite {
    fn default() -> Self {
        Self::central_bank_of_ireland()
    }
}

impl RegulatorSite {
    pub fn central_bank_of_ireland() -> Self {
        Self {
            name: "Central Bank of Ireland".to_string(),
            publisher: "CBI".to_string(),
            base_url: "https://www.centralbank.ie".to_string(),
            press_releases_path: "/news-media/press-releases".to_string(),
            article_path: "/news/article/".to_string(),
            example_articles: vec![
                "https://www.centralbank.ie/news/article/the-central-bank-takes-enforcement-action-against-swilly-mulroy-credit-union-for-breaches-of-anti-money-laundering-requirements".to_string(),
                "https://www.centralbank.ie/news/article/press-release-derville-rowland-appointed-to-executive-board-of-new-eu-authority-for-anti-money-laundering-23-May-25".to_string(),
            ],
        }
    }

    /// Points the site at another host, keeping its paths. Example URLs are rebased too.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        self.example_articles = self
            .example_articles
            .iter()
            .map(|url| url.replacen(&self.base_url, &base_url, 1))
            .collect();
        self.base_url = base_url;
        self
    }

    pub fn press_releases_url(&self) -> String {
        format!("{}{}", self.base_url, self.press_releases_path)
    }

    pub fn article_prefix(&self) -> String {
        format!("{}{}", self.base_url, self.article_path)
    }

    /// True when `url` is on the regulator's host and names an article under the article path.
    pub fn is_article_url(&self, url: &str) -> bool {
        let (Ok(base), Ok(url)) = (Url::parse(&self.base_url), Url::parse(url)) else {
            return false;
        };
        let same_host = base.host_str() == url.host_str() && base.port_or_known_default() == url.port_or_known_default();
        let slug = url.path().strip_prefix(self.article_path.as_str()).unwrap_or_default();
        same_host && !slug.trim_matches('/').is_empty()
    }
}
