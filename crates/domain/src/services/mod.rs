mod classification;
mod reconciliation;
pub mod task_orchestrator;

pub use task_orchestrator::{OrchestratorSettings, TaskOrchestrator};
