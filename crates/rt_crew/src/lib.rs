pub mod agent;
pub mod crew;
pub mod delegation;
pub mod logging;
pub mod prompt;
pub mod task;
pub mod tracker;

pub use agent::{Agent, AgentBuilder};
pub use crew::{Crew, UsageTracker};
pub use delegation::{DelegateWorkTool, DelegationBudget};
pub use prompt::Inputs;
pub use task::Task;
pub use tracker::{RegulatoryTracker, TrackerConfig, DEFAULT_TOPIC};

pub mod prelude {
    pub use super::{Agent, AgentBuilder, Crew, Inputs, Task};
    pub use rt_core::{CrewOutput, Error, NewsTracker, Result, TaskOutput};
}
