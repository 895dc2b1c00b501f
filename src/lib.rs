pub mod cache;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod generator;
pub mod i18n;
pub mod llm;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use generator::aggregator::{CompletionStatus, ResultBundle};
pub use generator::workflow::{launch, launch_ideation};
