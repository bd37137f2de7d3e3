use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rt_core::{ChatRequest, Error, InferenceModel, Message, Result, Tool, ToolCall, ToolDefinition};

use crate::crew::UsageTracker;
use crate::logging::Logger;
use crate::prompt::{self, interpolate, Inputs};

pub const DEFAULT_MAX_ITER: usize = 15;

/// A role-playing worker: persona, tools and the model it thinks with.
#[derive(Clone)]
pub struct Agent {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub allow_delegation: bool,
    pub max_iter: usize,
    tools: Vec<Arc<dyn Tool>>,
    llm: Arc<dyn InferenceModel>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("role", &self.role)
            .field("allow_delegation", &self.allow_delegation)
            .field("max_iter", &self.max_iter)
            .field("tools", &self.tools.len())
            .field("llm", &self.llm.name())
            .finish()
    }
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::default()
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn interpolate(&self, inputs: &Inputs) -> Self {
        Self {
            role: interpolate(&self.role, inputs),
            goal: interpolate(&self.goal, inputs),
            backstory: interpolate(&self.backstory, inputs),
            ..self.clone()
        }
    }

    /// Runs the tool loop for one prompt and returns the final answer.
    ///
    /// Tool failures, unknown tools and malformed arguments are fed back to
    /// the model as tool results. Only model errors abort the run. After
    /// `max_iter` rounds of tool calls the model is asked once more, without
    /// tools, for its best final answer.
    pub async fn execute_task(
        &self,
        task_prompt: String,
        extra_tools: &[Arc<dyn Tool>],
        usage: &UsageTracker,
    ) -> Result<String> {
        let logger = Logger::new().with_prefix(format!("[{}]", self.role));

        let mut definitions: Vec<ToolDefinition> = Vec::new();
        let mut registry: HashMap<String, Arc<dyn Tool>> = HashMap::new();
        for tool in self.tools.iter().chain(extra_tools) {
            let definition = tool.definition()?;
            registry.insert(definition.name.clone(), tool.clone());
            definitions.push(definition);
        }

        let mut messages = vec![
            Message::System(prompt::system_prompt(self, !definitions.is_empty())),
            Message::User(task_prompt),
        ];

        for iteration in 1..=self.max_iter {
            let response = self
                .llm
                .chat(ChatRequest {
                    messages: messages.clone(),
                    tools: definitions.clone(),
                })
                .await?;
            usage.add(&response.usage);

            if response.tool_calls.is_empty() {
                logger.info(&format!("✅ Final answer after {} step(s)", iteration));
                return Ok(response.content);
            }

            messages.push(Message::Assistant {
                content: response.content,
                tool_calls: response.tool_calls.clone(),
            });

            for call in response.tool_calls {
                logger.info(&format!("🔧 Using tool {}", call.name));
                let result = Self::run_tool(&registry, &call).await;
                logger.debug(&format!("Tool {} returned {} chars", call.name, result.len()));
                messages.push(Message::Tool {
                    id: call.id,
                    name: call.name,
                    result,
                });
            }
        }

        logger.warn(&format!(
            "⚠️ Reached {} iterations, asking for a final answer",
            self.max_iter
        ));
        messages.push(Message::User(prompt::FORCE_FINAL_ANSWER.to_string()));
        let response = self
            .llm
            .chat(ChatRequest {
                messages,
                tools: vec![],
            })
            .await?;
        usage.add(&response.usage);
        Ok(response.content)
    }

    async fn run_tool(registry: &HashMap<String, Arc<dyn Tool>>, call: &ToolCall) -> String {
        let Some(tool) = registry.get(&call.name) else {
            let mut available: Vec<&str> = registry.keys().map(String::as_str).collect();
            available.sort_unstable();
            return format!(
                "Error: unknown tool '{}'. Available tools: {}",
                call.name,
                available.join(", ")
            );
        };

        let args = match call.args() {
            Ok(args) => args,
            Err(e) => return format!("Error: invalid arguments for {}: {}", call.name, e),
        };

        match tool.invoke(args).await {
            Ok(output) => output,
            Err(e) => format!("Error: {}", e),
        }
    }
}

#[derive(Default)]
pub struct AgentBuilder {
    role: Option<String>,
    goal: String,
    backstory: String,
    allow_delegation: bool,
    max_iter: Option<usize>,
    tools: Vec<Arc<dyn Tool>>,
    llm: Option<Arc<dyn InferenceModel>>,
}

impl AgentBuilder {
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    pub fn allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn llm(mut self, llm: Arc<dyn InferenceModel>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let role = self
            .role
            .ok_or_else(|| Error::Pipeline("agent role is required".to_string()))?;
        let llm = self
            .llm
            .ok_or_else(|| Error::Pipeline(format!("agent {} has no model", role)))?;
        Ok(Agent {
            role,
            goal: self.goal,
            backstory: self.backstory,
            allow_delegation: self.allow_delegation,
            max_iter: self.max_iter.unwrap_or(DEFAULT_MAX_ITER),
            tools: self.tools,
            llm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rt_inference::models::DummyModel;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> Result<ToolDefinition> {
            Ok(ToolDefinition {
                name: "echo".to_string(),
                description: "Echoes its text argument".to_string(),
                parameters: json!({"type": "object", "properties": {"text": {"type": "string"}}}),
            })
        }

        async fn invoke(&self, args: serde_json::Value) -> Result<String> {
            match args.get("text").and_then(|t| t.as_str()) {
                Some(text) => Ok(format!("echo: {}", text)),
                None => Err(Error::Pipeline("text is required".to_string())),
            }
        }
    }

    fn agent(llm: Arc<DummyModel>, max_iter: usize) -> Agent {
        Agent::builder()
            .role("Web Searcher")
            .goal("Find {topic} news")
            .backstory("You know the site.")
            .max_iter(max_iter)
            .tool(Arc::new(EchoTool))
            .llm(llm)
            .build()
            .unwrap()
    }

    fn tool_results(request: &ChatRequest) -> Vec<String> {
        request
            .messages
            .iter()
            .filter_map(|m| match m {
                Message::Tool { result, .. } => Some(result.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_builder_requires_role_and_model() {
        let llm: Arc<dyn InferenceModel> = Arc::new(DummyModel::new());
        assert!(Agent::builder().llm(llm.clone()).build().is_err());
        assert!(Agent::builder().role("Web Scraper").build().is_err());

        let agent = Agent::builder().role("Web Scraper").llm(llm).build().unwrap();
        assert_eq!(agent.max_iter, DEFAULT_MAX_ITER);
        assert!(!agent.allow_delegation);
    }

    #[test]
    fn test_interpolate_persona() {
        let agent = agent(Arc::new(DummyModel::new()), 3);
        let mut inputs = Inputs::new();
        inputs.insert("topic".to_string(), "AML".to_string());
        let agent = agent.interpolate(&inputs);
        assert_eq!(agent.goal, "Find AML news");
        assert_eq!(agent.tools().len(), 1);
    }

    #[tokio::test]
    async fn test_tool_loop_feeds_results_back() {
        let llm = Arc::new(
            DummyModel::new()
                .then_call_tool("echo", json!({"text": "hello"}))
                .then_answer("done"),
        );
        let usage = UsageTracker::default();
        let answer = agent(llm.clone(), 5)
            .execute_task("Say hello".to_string(), &[], &usage)
            .await
            .unwrap();

        assert_eq!(answer, "done");
        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(tool_results(&requests[1]), vec!["echo: hello".to_string()]);
        assert_eq!(usage.snapshot().successful_requests, 2);
    }

    #[tokio::test]
    async fn test_tool_errors_become_observations() {
        let llm = Arc::new(
            DummyModel::new()
                .then_call_tool("missing", json!({}))
                .then_call_tool("echo", json!({}))
                .then_answer("done"),
        );
        let usage = UsageTracker::default();
        let answer = agent(llm.clone(), 5)
            .execute_task("Say hello".to_string(), &[], &usage)
            .await
            .unwrap();

        assert_eq!(answer, "done");
        let results = tool_results(&llm.requests()[2]);
        assert_eq!(results[0], "Error: unknown tool 'missing'. Available tools: echo");
        assert_eq!(results[1], "Error: Pipeline error: text is required");
    }

    #[tokio::test]
    async fn test_max_iter_forces_final_answer() {
        let llm = Arc::new(
            DummyModel::new()
                .then_call_tool("echo", json!({"text": "1"}))
                .then_call_tool("echo", json!({"text": "2"}))
                .then_answer("best effort"),
        );
        let usage = UsageTracker::default();
        let answer = agent(llm.clone(), 2)
            .execute_task("Loop".to_string(), &[], &usage)
            .await
            .unwrap();

        assert_eq!(answer, "best effort");
        let requests = llm.requests();
        assert_eq!(requests.len(), 3);
        let last = &requests[2];
        assert!(last.tools.is_empty());
        assert_eq!(
            last.messages.last(),
            Some(&Message::User(prompt::FORCE_FINAL_ANSWER.to_string()))
        );
    }
}
