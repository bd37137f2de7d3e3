use schemars::JsonSchema;

use crate::prompt::{interpolate, Inputs};

/// One unit of work, assigned to an agent by role.
#[derive(Debug, Clone)]
pub struct Task {
    pub description: String,
    pub expected_output: String,
    pub agent: String,
    /// JSON schema the final answer must follow. When set, the answer is
    /// also parsed into the task's `json_dict`.
    pub output_json: Option<serde_json::Value>,
}

impl Task {
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent: agent.into(),
            output_json: None,
        }
    }

    pub fn with_output_json<T: JsonSchema>(mut self) -> Self {
        let schema = schemars::schema_for!(T);
        self.output_json = serde_json::to_value(schema).ok();
        self
    }

    pub fn interpolate(&self, inputs: &Inputs) -> Self {
        Self {
            description: interpolate(&self.description, inputs),
            expected_output: interpolate(&self.expected_output, inputs),
            agent: self.agent.clone(),
            output_json: self.output_json.clone(),
        }
    }
}
