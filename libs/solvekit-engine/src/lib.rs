pub mod comparator;
pub mod error;
pub mod orchestrator;
pub mod process;
pub mod provider;
pub mod report;
pub mod resources;
pub mod runner;
pub mod settings;
pub mod store;

mod engine_tests;

pub use error::{EngineError, ErrorCategory, Result};
pub use orchestrator::{RunOptions, RunOrchestrator, RunPhase, RunReport};
pub use runner::{LanguageRunner, RunnerRegistry};
