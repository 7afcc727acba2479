use std::sync::Arc;

use crate::config::Config;
use crate::llm::gateway::ModelGateway;
use crate::pipeline::CompressionOptions;

/// Shared, read-only context handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gateway: Arc<dyn ModelGateway>,
}

impl AppState {
    pub fn new(config: Arc<Config>, gateway: Arc<dyn ModelGateway>) -> Self {
        AppState { config, gateway }
    }

    pub fn compression_options(&self) -> CompressionOptions {
        CompressionOptions {
            threshold_bytes: self.config.compression_threshold_bytes,
            max_size_bytes: self.config.compression_target_bytes,
            ..CompressionOptions::default()
        }
    }
}
