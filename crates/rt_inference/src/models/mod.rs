use std::sync::Arc;

use rt_core::{Error, InferenceModel, Result};

use crate::Config;

pub mod dummy;
pub mod openai;

pub use dummy::DummyModel;
pub use openai::OpenAiModel;

pub async fn create_model(config: Option<Config>) -> Result<Arc<dyn InferenceModel>> {
    let config = config.unwrap_or_default();
    match config.model.as_str() {
        "openai" => {
            if config.api_key.is_none() {
                tracing::warn!("⚠️ OPENAI_API_KEY is not set, requests to the model provider will be rejected");
            }
            Ok(Arc::new(OpenAiModel::new(&config)))
        }
        "dummy" => Ok(Arc::new(DummyModel::new())),
        other => Err(Error::Inference(format!(
            "Unknown model: {}. Available models: openai, dummy",
            other
        ))),
    }
}
