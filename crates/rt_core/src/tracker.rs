use async_trait::async_trait;

use crate::types::CrewOutput;
use crate::Result;

#[async_trait]
pub trait NewsTracker: Send + Sync {
    /// Runs one full pipeline for `topic`.
    async fn track(&self, topic: &str) -> Result<CrewOutput>;
}
