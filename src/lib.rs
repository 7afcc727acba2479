pub mod config;
pub mod handlers;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod state;
pub mod utils;
pub mod wizard;
