use std::sync::Arc;

use rt_core::NewsTracker;

pub struct AppState {
    pub tracker: Arc<dyn NewsTracker>,
}

impl AppState {
    pub fn new(tracker: Arc<dyn NewsTracker>) -> Self {
        Self { tracker }
    }
}
