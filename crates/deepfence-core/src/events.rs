//! Structured pipeline events.
//!
//! The orchestrator emits one event per stage transition and per-agent
//! outcome. Presentation (colored banners, progress lines) lives entirely in
//! the observer implementation; the core never formats console output
//! itself.

use crate::runner::{AgentOutcome, AgentRole};
use std::path::PathBuf;

/// The orchestrator's sequential stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Archiving the previous run's output area.
    ArchivePrior,
    /// Creating the agents/outputs/archive directories.
    PrepareDirs,
    /// Parallel repository synchronization.
    SyncAgents,
    /// Sequential mapper execution.
    RunMappers,
    /// Sequential organizer execution.
    RunOrganizers,
    /// Reporter execution and final collection.
    RunReporter,
    /// Pipeline finished.
    Done,
}

impl Stage {
    /// Stable lowercase stage name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::ArchivePrior => "archive",
            Stage::PrepareDirs => "dirs",
            Stage::SyncAgents => "sync",
            Stage::RunMappers => "mappers",
            Stage::RunOrganizers => "organizers",
            Stage::RunReporter => "reporter",
            Stage::Done => "done",
        }
    }
}

/// One observable pipeline occurrence.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A stage began.
    StageStarted { stage: Stage },

    /// The prior output area was moved into an archive slot.
    Archived { slot: PathBuf },

    /// One agent's repository sync finished.
    SyncFinished {
        agent: String,
        ok: bool,
        message: String,
    },

    /// One agent's process is about to start.
    AgentStarted { role: AgentRole, agent: String },

    /// One agent's process finished and its artifacts were collected.
    AgentFinished {
        role: AgentRole,
        agent: String,
        outcome: AgentOutcome,
    },

    /// A cross-agent stitch rule was applied.
    Stitched { source: PathBuf, dest: PathBuf },

    /// The final report was located.
    ReportReady { path: PathBuf },

    /// No final report was produced by the reporter.
    ReportMissing,
}

/// Receives pipeline events for rendering.
///
/// Implementations must be cheap and non-blocking; the orchestrator calls
/// them inline between stage steps.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Observer that discards every event.
#[derive(Debug, Default)]
pub struct NullObserver;

impl PipelineObserver for NullObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}
