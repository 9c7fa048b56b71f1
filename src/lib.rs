pub mod cli;
pub mod config;
pub mod llm;
pub mod research;
pub mod search;
pub mod workflow;

// Re-export commonly used types
pub use config::Config;
pub use research::{ResearchError, ResearchOrchestrator};
pub use workflow::launch;
