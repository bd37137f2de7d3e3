use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::table::RawOutput;

/// One regulator update as produced by the analysis task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewsItem {
    #[serde(rename = "Publisher_Name")]
    pub publisher_name: String,
    #[serde(rename = "News_Title")]
    pub news_title: String,
    #[serde(rename = "News_Summary")]
    pub news_summary: String,
    /// Free text, usually `YYYY-MM-DD`. Not validated.
    #[serde(rename = "News_Date")]
    pub news_date: String,
    #[serde(rename = "News_Link")]
    pub news_link: String,
    #[serde(rename = "Relevance", default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<String>,
    #[serde(rename = "Importance", default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<String>,
}

/// Token counters accumulated over every model call of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetrics {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub successful_requests: u64,
}

impl UsageMetrics {
    pub fn add(&mut self, other: &UsageMetrics) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
        self.successful_requests += other.successful_requests;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationOutcome {
    Completed,
    Failed,
    /// The run's delegation budget was spent; the link is left unresolvable.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationRecord {
    pub coworker: String,
    pub task: String,
    pub outcome: DelegationOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutput {
    pub description: String,
    pub agent: String,
    pub raw: String,
    pub json_dict: Option<serde_json::Value>,
    #[serde(default)]
    pub delegations: Vec<DelegationRecord>,
}

impl TaskOutput {
    /// First ten words of the description, for compact listings.
    pub fn summary(&self) -> String {
        let mut words = self.description.split_whitespace();
        let head: Vec<&str> = words.by_ref().take(10).collect();
        let head = head.join(" ");
        if words.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrewOutput {
    pub raw: String,
    pub json_dict: Option<serde_json::Value>,
    pub tasks_output: Vec<TaskOutput>,
    pub token_usage: UsageMetrics,
}

impl CrewOutput {
    /// The structured output when the final task produced one, the raw text otherwise.
    pub fn raw_output(&self) -> RawOutput {
        match &self.json_dict {
            Some(value) => RawOutput::Structured(value.clone()),
            None => RawOutput::Text(self.raw.clone()),
        }
    }
}
