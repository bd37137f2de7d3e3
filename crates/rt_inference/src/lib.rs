use std::fmt;

pub mod models;

pub const DEFAULT_MODEL_NAME: &str = "openai/gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Clone)]
pub struct Config {
    /// Which backend to build: `openai` or `dummy`.
    pub model: String,
    pub api_key: Option<String>,
    /// Provider-qualified model id, e.g. `openai/gpt-4o-mini`.
    pub model_name: String,
    pub base_url: String,
    pub temperature: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("frequency_penalty", &self.frequency_penalty)
            .field("presence_penalty", &self.presence_penalty)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "openai".to_string(),
            api_key: None,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.1,
            frequency_penalty: 0.1,
            presence_penalty: 0.1,
        }
    }
}

pub mod prelude {
    pub use super::Config;
    pub use super::models::create_model;
    pub use rt_core::{ChatRequest, ChatResponse, Error, InferenceModel, Message, Result};
}

pub use models::create_model;
