//! 推理式研究：计划、展开、执行、缺口补全与综合

pub mod context;
pub mod engine;
pub mod error;
pub mod events;
pub mod expand;
pub mod gap;
pub mod generation;
pub mod orchestrator;
pub mod plan;
pub mod prompts;
pub mod types;

pub use context::ResearchSettings;
pub use error::ResearchError;
pub use events::{ChannelSink, EventKind, EventStatus, NullSink, ProgressEvent, ProgressSink};
pub use generation::{GenerationError, GenerationRequest, GenerationTask, StructuredGenerator};
pub use orchestrator::ResearchOrchestrator;
pub use types::{ResearchDepth, ResearchOutcome};
