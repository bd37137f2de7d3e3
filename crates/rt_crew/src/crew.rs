use std::sync::{Arc, Mutex};

use rt_core::{extract_json, CrewOutput, Error, Result, TaskOutput, Tool, UsageMetrics};
use tracing::info;

use crate::agent::Agent;
use crate::delegation::{DelegateWorkTool, DelegationBudget, DEFAULT_MAX_DELEGATIONS};
use crate::prompt::{self, Inputs};
use crate::task::Task;

/// Token usage shared by every model call of one run, delegations included.
#[derive(Debug, Clone, Default)]
pub struct UsageTracker(Arc<Mutex<UsageMetrics>>);

impl UsageTracker {
    pub fn add(&self, usage: &UsageMetrics) {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).add(usage);
    }

    pub fn snapshot(&self) -> UsageMetrics {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Agents plus the tasks they run, in order.
#[derive(Debug, Clone)]
pub struct Crew {
    agents: Vec<Agent>,
    tasks: Vec<Task>,
    max_delegations: u32,
}

impl Crew {
    pub fn new(agents: Vec<Agent>, tasks: Vec<Task>) -> Self {
        Self {
            agents,
            tasks,
            max_delegations: DEFAULT_MAX_DELEGATIONS,
        }
    }

    pub fn with_max_delegations(mut self, max_delegations: u32) -> Self {
        self.max_delegations = max_delegations;
        self
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Runs every task sequentially. Each task sees the previous task's
    /// answer as context; the crew's result is the last task's output.
    pub async fn kickoff(&self, inputs: &Inputs) -> Result<CrewOutput> {
        if self.tasks.is_empty() {
            return Err(Error::Pipeline("crew has no tasks".to_string()));
        }

        let agents: Vec<Agent> = self.agents.iter().map(|a| a.interpolate(inputs)).collect();
        let usage = UsageTracker::default();
        let budget = Arc::new(DelegationBudget::new(self.max_delegations));
        let mut tasks_output: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());
        let mut context: Option<String> = None;

        for (number, task) in self.tasks.iter().enumerate() {
            let index = self
                .agents
                .iter()
                .position(|a| a.role == task.agent)
                .ok_or_else(|| {
                    Error::Pipeline(format!("no agent with role '{}' in the crew", task.agent))
                })?;
            let agent = &agents[index];
            let task = task.interpolate(inputs);

            let mut extra_tools: Vec<Arc<dyn Tool>> = Vec::new();
            if agent.allow_delegation {
                let coworkers: Vec<Agent> = agents
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, a)| a.clone())
                    .collect();
                if !coworkers.is_empty() {
                    extra_tools.push(Arc::new(DelegateWorkTool::new(
                        coworkers,
                        budget.clone(),
                        usage.clone(),
                    )));
                }
            }

            info!(
                "🚀 Task {}/{} started by {}",
                number + 1,
                self.tasks.len(),
                agent.role
            );
            let raw = agent
                .execute_task(
                    prompt::task_prompt(&task, context.as_deref()),
                    &extra_tools,
                    &usage,
                )
                .await?;

            let json_dict = match task.output_json {
                Some(_) => {
                    let parsed = extract_json(&raw);
                    if parsed.is_none() {
                        tracing::warn!("⚠️ {} did not return JSON", agent.role);
                    }
                    parsed
                }
                None => None,
            };

            info!("✅ Task {}/{} completed", number + 1, self.tasks.len());
            context = Some(raw.clone());
            tasks_output.push(TaskOutput {
                description: task.description,
                agent: agent.role.clone(),
                raw,
                json_dict,
                delegations: budget.take_records(),
            });
        }

        let (raw, json_dict) = match tasks_output.last() {
            Some(last) => (last.raw.clone(), last.json_dict.clone()),
            None => (String::new(), None),
        };

        Ok(CrewOutput {
            raw,
            json_dict,
            tasks_output,
            token_usage: usage.snapshot(),
        })
    }
}
