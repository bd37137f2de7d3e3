pub mod regulator;
pub mod scrapers;
pub mod tools;

pub use regulator::RegulatorSite;
pub use scrapers::{PageFetcher, PressReleaseScraper};
pub use tools::{ListPressReleasesTool, LinkStatus, ScrapeWebsiteTool, ValidateLinkTool, WebsiteSearchTool};

pub mod prelude {
    pub use super::tools::*;
    pub use super::RegulatorSite;
    pub use rt_core::{Error, Result, Tool};
}
