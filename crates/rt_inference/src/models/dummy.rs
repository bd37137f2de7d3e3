use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use rt_core::{ChatRequest, ChatResponse, InferenceModel, Result, ToolCall, UsageMetrics};

pub const FALLBACK_ANSWER: &str = "No relevant results found.";

/// Only the most recent requests are kept.
pub const MAX_RECORDED_REQUESTS: usize = 64;

/// Offline model that replays a fixed script of responses.
///
/// Once the script runs out every call answers [`FALLBACK_ANSWER`]. The last
/// [`MAX_RECORDED_REQUESTS`] requests are kept so callers can inspect what the
/// agents sent.
pub struct DummyModel {
    script: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<VecDeque<ChatRequest>>,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(VecDeque::new()),
        }
    }

    pub fn then_answer(self, content: impl Into<String>) -> Self {
        self.push(ChatResponse {
            content: content.into(),
            tool_calls: vec![],
            usage: scripted_usage(),
        })
    }

    pub fn then_call_tool(self, name: &str, args: serde_json::Value) -> Self {
        let id = format!("call_{}", self.script_len());
        self.push(ChatResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id,
                name: name.to_string(),
                arguments: args.to_string(),
            }],
            usage: scripted_usage(),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    fn push(self, response: ChatResponse) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
        self
    }

    fn script_len(&self) -> usize {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

fn scripted_usage() -> UsageMetrics {
    UsageMetrics {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
        successful_requests: 1,
    }
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        {
            let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
            if requests.len() == MAX_RECORDED_REQUESTS {
                requests.pop_front();
            }
            requests.push_back(request);
        }

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        Ok(next.unwrap_or_else(|| ChatResponse {
            content: FALLBACK_ANSWER.to_string(),
            tool_calls: vec![],
            usage: scripted_usage(),
        }))
    }
}
