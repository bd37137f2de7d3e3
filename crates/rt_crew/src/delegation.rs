use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rt_core::{
    parse_args, DelegationOutcome, DelegationRecord, Error, Result, Tool, ToolDefinition,
};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::agent::Agent;
use crate::crew::UsageTracker;
use crate::prompt;

pub const DEFAULT_MAX_DELEGATIONS: u32 = 2;

#[derive(Debug, Default)]
struct BudgetState {
    used: u32,
    records: Vec<DelegationRecord>,
}

/// Delegations allowed per pipeline run, shared by every delegating agent.
#[derive(Debug)]
pub struct DelegationBudget {
    max: u32,
    state: Mutex<BudgetState>,
}

impl DelegationBudget {
    pub fn new(max: u32) -> Self {
        Self {
            max,
            state: Mutex::new(BudgetState::default()),
        }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn used(&self) -> u32 {
        self.lock().used
    }

    fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        if state.used >= self.max {
            return false;
        }
        state.used += 1;
        true
    }

    fn record(&self, record: DelegationRecord) {
        self.lock().records.push(record);
    }

    /// Drains the records gathered since the last call.
    pub fn take_records(&self) -> Vec<DelegationRecord> {
        std::mem::take(&mut self.lock().records)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BudgetState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DelegateArgs {
    /// What the coworker should do.
    pub task: String,
    /// Everything the coworker needs to know to do it.
    #[serde(default)]
    pub context: String,
    /// Role of the coworker to hand the work to.
    pub coworker: String,
}

/// Hands a sub-task to another agent and returns its answer.
///
/// Coworkers run without this tool, so delegation is one level deep.
pub struct DelegateWorkTool {
    coworkers: Vec<Agent>,
    budget: Arc<DelegationBudget>,
    usage: UsageTracker,
}

impl DelegateWorkTool {
    pub const NAME: &'static str = "delegate_work_to_coworker";

    pub fn new(coworkers: Vec<Agent>, budget: Arc<DelegationBudget>, usage: UsageTracker) -> Self {
        Self {
            coworkers,
            budget,
            usage,
        }
    }

    fn roles(&self) -> Vec<&str> {
        self.coworkers.iter().map(|a| a.role.as_str()).collect()
    }

    fn find(&self, name: &str) -> Option<&Agent> {
        let name = name.trim().trim_matches('"');
        self.coworkers
            .iter()
            .find(|a| a.role.eq_ignore_ascii_case(name))
    }

    fn exhausted_message(&self) -> String {
        format!(
            "Delegation limit of {} reached for this run. Do not delegate again. \
             Mark any link you could not confirm as UNRESOLVABLE and finish the task with what you have.",
            self.budget.max()
        )
    }
}

#[async_trait]
impl Tool for DelegateWorkTool {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<DelegateArgs>(
            Self::NAME,
            &format!(
                "Delegate a specific task to one of these coworkers: {}. \
                 Explain everything they need to know, they know nothing about your task.",
                self.roles().join(", ")
            ),
        )
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<String> {
        let args: DelegateArgs = parse_args(args)?;
        let coworker = self.find(&args.coworker).ok_or_else(|| {
            Error::Pipeline(format!(
                "no coworker named '{}'. Choose one of: {}",
                args.coworker,
                self.roles().join(", ")
            ))
        })?;

        if !self.budget.try_acquire() {
            tracing::warn!(
                "🚫 Delegation to {} refused, budget of {} spent",
                coworker.role,
                self.budget.max()
            );
            self.budget.record(DelegationRecord {
                coworker: coworker.role.clone(),
                task: args.task,
                outcome: DelegationOutcome::Exhausted,
            });
            return Ok(self.exhausted_message());
        }

        tracing::info!(
            "🤝 Delegating to {} ({}/{})",
            coworker.role,
            self.budget.used(),
            self.budget.max()
        );
        let result = coworker
            .execute_task(prompt::delegated_prompt(&args.task, &args.context), &[], &self.usage)
            .await;

        let outcome = if result.is_ok() {
            DelegationOutcome::Completed
        } else {
            DelegationOutcome::Failed
        };
        self.budget.record(DelegationRecord {
            coworker: coworker.role.clone(),
            task: args.task,
            outcome,
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rt_core::InferenceModel;
    use rt_inference::models::DummyModel;
    use serde_json::json;

    fn scraper(llm: Arc<dyn InferenceModel>) -> Agent {
        Agent::builder().role("Web Scraper").llm(llm).build().unwrap()
    }

    #[test]
    fn test_budget() {
        let budget = DelegationBudget::new(1);
        assert!(budget.try_acquire());
        assert!(!budget.try_acquire());
        assert_eq!(budget.used(), 1);
        assert!(!DelegationBudget::new(0).try_acquire());
    }

    #[test]
    fn test_definition_lists_coworkers() {
        let llm: Arc<dyn InferenceModel> = Arc::new(DummyModel::new());
        let tool = DelegateWorkTool::new(
            vec![scraper(llm)],
            Arc::new(DelegationBudget::new(2)),
            UsageTracker::default(),
        );
        let definition = tool.definition().unwrap();
        assert_eq!(definition.name, "delegate_work_to_coworker");
        assert!(definition.description.contains("Web Scraper"));
        assert!(definition.parameters["properties"]["coworker"].is_object());
    }

    #[tokio::test]
    async fn test_delegation_until_exhausted() {
        let llm = Arc::new(DummyModel::new().then_answer("https://www.centralbank.ie/news/article/fixed"));
        let budget = Arc::new(DelegationBudget::new(1));
        let usage = UsageTracker::default();
        let tool = DelegateWorkTool::new(vec![scraper(llm.clone())], budget.clone(), usage.clone());

        let answer = tool
            .invoke(json!({"task": "Find the right link", "context": "It 404s", "coworker": "web scraper"}))
            .await
            .unwrap();
        assert_eq!(answer, "https://www.centralbank.ie/news/article/fixed");
        assert_eq!(usage.snapshot().successful_requests, 1);

        let refused = tool
            .invoke(json!({"task": "Try again", "coworker": "Web Scraper"}))
            .await
            .unwrap();
        assert!(refused.contains("UNRESOLVABLE"));
        assert_eq!(llm.requests().len(), 1);

        let outcomes: Vec<DelegationOutcome> =
            budget.take_records().into_iter().map(|r| r.outcome).collect();
        assert_eq!(
            outcomes,
            vec![DelegationOutcome::Completed, DelegationOutcome::Exhausted]
        );
        assert!(budget.take_records().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_coworker() {
        let llm: Arc<dyn InferenceModel> = Arc::new(DummyModel::new());
        let budget = Arc::new(DelegationBudget::new(2));
        let tool = DelegateWorkTool::new(vec![scraper(llm)], budget.clone(), UsageTracker::default());

        let err = tool
            .invoke(json!({"task": "x", "coworker": "Legal Team"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Choose one of: Web Scraper"));
        assert_eq!(budget.used(), 0);
    }
}
