//! DeepFence core - staged agent pipeline orchestration
//!
//! Coordinates a pipeline of external analysis agents over a target path:
//! - Synchronizes each agent's repository (parallel, bounded)
//! - Archives prior run outputs into numbered slots
//! - Runs mappers, organizers, then the reporter as child processes
//! - Collects each agent's declared artifacts into a namespaced output area
//! - Applies declarative cross-agent stitch rules and locates the report

pub mod archive;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod roster;
pub mod runner;
pub mod stitch;
pub mod sync;
pub mod telemetry;
pub mod viewer;

// Re-export key types
pub use archive::archive_prior_outputs;
pub use error::{PipelineError, Result};
pub use events::{NullObserver, PipelineEvent, PipelineObserver, Stage};
pub use pipeline::{AgentRunResult, Pipeline, PipelineConfig, PipelineResult};
pub use roster::{AgentSpec, Roster};
pub use runner::{AgentOutcome, AgentRole, AgentRunner};
pub use stitch::{default_rules, StitchRule};
pub use sync::{sync_all, sync_repo, SyncResult};
pub use telemetry::init_tracing;
