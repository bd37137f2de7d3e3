use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tools::ToolDefinition;
use crate::types::UsageMetrics;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// JSON-encoded arguments, exactly as the model produced them.
    pub arguments: String,
}

impl ToolCall {
    pub fn args(&self) -> Result<serde_json::Value> {
        if self.arguments.trim().is_empty() {
            return Ok(serde_json::Value::Object(Default::default()));
        }
        Ok(serde_json::from_str(&self.arguments)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    System(String),
    User(String),
    Assistant {
        content: String,
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        id: String,
        name: String,
        result: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: UsageMetrics,
}

#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// One chat-completion round trip.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_call_args() {
        let call = ToolCall {
            id: "1".to_string(),
            name: "search".to_string(),
            arguments: r#"{"search_query": "aml"}"#.to_string(),
        };
        assert_eq!(call.args().unwrap()["search_query"], "aml");

        let empty = ToolCall { arguments: String::new(), ..call.clone() };
        assert!(empty.args().unwrap().as_object().unwrap().is_empty());

        let broken = ToolCall { arguments: "{oops".to_string(), ..call };
        assert!(broken.args().is_err());
    }
}
