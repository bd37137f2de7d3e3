pub mod error;
pub mod models;
pub mod table;
pub mod tools;
pub mod tracker;
pub mod types;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

pub use models::{ChatRequest, ChatResponse, InferenceModel, Message, ToolCall};
pub use table::{extract_json, normalize, NormalizeOutcome, RawOutput, ResultTable, NO_TABULAR_DATA};
pub use tools::{parse_args, Tool, ToolDefinition};
pub use tracker::NewsTracker;
pub use types::{CrewOutput, DelegationOutcome, DelegationRecord, NewsItem, TaskOutput, UsageMetrics};
