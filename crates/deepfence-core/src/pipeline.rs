//! Staged pipeline orchestration.
//!
//! The orchestrator drives a strict, non-reentrant stage sequence:
//! archive prior outputs → prepare directories → sync agent repositories
//! (parallel) → run mappers → run organizers → run reporter → stitch →
//! locate the final report. Stages always advance: per-agent failures are
//! absorbed into the [`PipelineResult`], and only roster or directory
//! preparation problems abort the run.

use crate::archive::archive_prior_outputs;
use crate::error::{PipelineError, Result};
use crate::events::{PipelineEvent, PipelineObserver, Stage};
use crate::roster::{AgentSpec, Roster};
use crate::runner::{AgentOutcome, AgentRole, AgentRunner};
use crate::stitch::{self, StitchRule};
use crate::sync::{sync_all, SyncResult};
use crate::viewer;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Default bound on concurrent repository syncs.
pub const DEFAULT_SYNC_CONCURRENCY: usize = 4;

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding `agents/`, `outputs/`, and `archive/`.
    pub base_dir: PathBuf,

    /// Absolute target path handed to every mapper.
    pub target: PathBuf,

    /// Worker-pool bound for the sync stage.
    pub sync_concurrency: usize,

    /// Whether to attempt opening the final report in a viewer.
    pub open_report: bool,

    /// Post-reporter stitch rules, relative to the output area.
    pub stitch_rules: Vec<StitchRule>,
}

impl PipelineConfig {
    pub fn new(base_dir: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            target: target.into(),
            sync_concurrency: DEFAULT_SYNC_CONCURRENCY,
            open_report: false,
            stitch_rules: stitch::default_rules(),
        }
    }
}

/// Execution record for one agent.
#[derive(Debug, Clone)]
pub struct AgentRunResult {
    pub agent: String,
    pub role: AgentRole,
    pub outcome: AgentOutcome,
}

/// Result of a complete pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Archive slot the previous run was moved into, if any existed.
    pub archived_to: Option<PathBuf>,

    /// Per-agent sync outcomes, in roster order.
    pub syncs: Vec<SyncResult>,

    /// Mapper executions, in list order.
    pub mappers: Vec<AgentRunResult>,

    /// Organizer executions, in list order.
    pub organizers: Vec<AgentRunResult>,

    /// Reporter execution, when a reporter is configured.
    pub reporter: Option<AgentRunResult>,

    /// Stitch rules that actually copied an artifact.
    pub stitched: Vec<StitchRule>,

    /// Location of the final report, when one was produced.
    pub report_path: Option<PathBuf>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl PipelineResult {
    fn agent_results(&self) -> impl Iterator<Item = &AgentRunResult> {
        self.mappers
            .iter()
            .chain(self.organizers.iter())
            .chain(self.reporter.iter())
    }

    /// Number of agents that ran to successful completion.
    pub fn succeeded_count(&self) -> usize {
        self.agent_results()
            .filter(|r| r.outcome.succeeded())
            .count()
    }

    /// Number of agents that failed (missing entry point or nonzero exit).
    pub fn failed_count(&self) -> usize {
        self.agent_results()
            .filter(|r| !r.outcome.succeeded())
            .count()
    }
}

/// The top-level pipeline orchestrator.
pub struct Pipeline;

impl Pipeline {
    /// Execute a full pipeline run.
    ///
    /// Returns `Err` only for configuration-class failures (invalid roster,
    /// unpreparable base directory); all per-agent failures land in the
    /// returned [`PipelineResult`].
    pub async fn run(
        config: &PipelineConfig,
        roster: &Roster,
        observer: &dyn PipelineObserver,
    ) -> Result<PipelineResult> {
        let start = Instant::now();
        roster.validate()?;

        let base_dir = std::path::absolute(&config.base_dir)?;
        let agents_dir = base_dir.join("agents");
        let output_area = base_dir.join("outputs");
        let archive_root = base_dir.join("archive");

        info!(
            base = %base_dir.display(),
            agents = roster.len(),
            "Starting pipeline"
        );

        // ARCHIVE_PRIOR: move last run's outputs aside. A failed archive is
        // absorbed; the run proceeds against the existing output area.
        observer.on_event(&PipelineEvent::StageStarted {
            stage: Stage::ArchivePrior,
        });
        let archived_to = match archive_prior_outputs(&output_area, &archive_root) {
            Ok(slot) => {
                if let Some(slot) = &slot {
                    observer.on_event(&PipelineEvent::Archived { slot: slot.clone() });
                }
                slot
            }
            Err(e) => {
                warn!(error = %e, "Archiving prior outputs failed, continuing");
                None
            }
        };

        // PREPARE_DIRS: the one stage that must succeed.
        observer.on_event(&PipelineEvent::StageStarted {
            stage: Stage::PrepareDirs,
        });
        for dir in [&agents_dir, &output_area] {
            std::fs::create_dir_all(dir).map_err(|e| PipelineError::PrepareDirs {
                path: dir.display().to_string(),
                source: e,
            })?;
        }

        // SYNC_AGENTS: bounded-parallel clone/pull across the whole roster.
        observer.on_event(&PipelineEvent::StageStarted {
            stage: Stage::SyncAgents,
        });
        let roster_agents: Vec<AgentSpec> = roster.all_agents().cloned().collect();
        let syncs = sync_all(&roster_agents, &agents_dir, config.sync_concurrency).await;
        for sync in &syncs {
            observer.on_event(&PipelineEvent::SyncFinished {
                agent: sync.agent.clone(),
                ok: sync.ok,
                message: sync.message.clone(),
            });
        }

        // RUN_MAPPERS: sequential, list order, failures absorbed.
        observer.on_event(&PipelineEvent::StageStarted {
            stage: Stage::RunMappers,
        });
        let mut mappers = Vec::new();
        for agent in &roster.mapper_agents {
            let workspace = agents_dir.join(&agent.name);
            let outcome = Self::run_one(
                AgentRole::Mapper,
                agent,
                &workspace,
                &output_area,
                &config.target,
                observer,
            )
            .await;
            mappers.push(outcome);
        }

        // RUN_ORGANIZERS: sequential, list order.
        observer.on_event(&PipelineEvent::StageStarted {
            stage: Stage::RunOrganizers,
        });
        let mut organizers = Vec::new();
        for agent in &roster.organizer_agents {
            let workspace = agents_dir.join(&agent.name);
            let outcome = Self::run_one(
                AgentRole::Organizer,
                agent,
                &workspace,
                &output_area,
                &config.target,
                observer,
            )
            .await;
            organizers.push(outcome);
        }

        // RUN_REPORTER: single terminal agent, then stitch and report lookup.
        observer.on_event(&PipelineEvent::StageStarted {
            stage: Stage::RunReporter,
        });
        let reporter = match &roster.reporter_agent {
            Some(agent) => {
                let workspace = agents_dir.join(&agent.name);
                Some(
                    Self::run_one(
                        AgentRole::Reporter,
                        agent,
                        &workspace,
                        &output_area,
                        &config.target,
                        observer,
                    )
                    .await,
                )
            }
            None => None,
        };

        let stitched = stitch::apply_rules(&output_area, &config.stitch_rules);
        for rule in &stitched {
            observer.on_event(&PipelineEvent::Stitched {
                source: rule.source.clone(),
                dest: rule.dest.clone(),
            });
        }

        let report_path = roster
            .reporter_agent
            .as_ref()
            .and_then(|agent| viewer::find_report(&output_area.join(&agent.name)));

        match &report_path {
            Some(path) => {
                observer.on_event(&PipelineEvent::ReportReady { path: path.clone() });
                if config.open_report {
                    viewer::open_in_viewer(path);
                }
            }
            None => {
                if roster.reporter_agent.is_some() {
                    observer.on_event(&PipelineEvent::ReportMissing);
                }
            }
        }

        observer.on_event(&PipelineEvent::StageStarted { stage: Stage::Done });

        let result = PipelineResult {
            archived_to,
            syncs,
            mappers,
            organizers,
            reporter,
            stitched,
            report_path,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            succeeded = result.succeeded_count(),
            failed = result.failed_count(),
            duration_ms = result.duration_ms,
            "Pipeline finished"
        );

        Ok(result)
    }

    /// Run one agent and wrap its outcome, emitting start/finish events.
    async fn run_one(
        role: AgentRole,
        agent: &AgentSpec,
        workspace: &Path,
        output_area: &Path,
        target: &Path,
        observer: &dyn PipelineObserver,
    ) -> AgentRunResult {
        observer.on_event(&PipelineEvent::AgentStarted {
            role,
            agent: agent.name.clone(),
        });

        let outcome = match role {
            AgentRole::Mapper => {
                AgentRunner::run_mapper(workspace, &agent.name, output_area, target).await
            }
            AgentRole::Organizer => {
                AgentRunner::run_organizer(workspace, &agent.name, output_area).await
            }
            AgentRole::Reporter => {
                AgentRunner::run_reporter(workspace, &agent.name, output_area).await
            }
        };

        observer.on_event(&PipelineEvent::AgentFinished {
            role,
            agent: agent.name.clone(),
            outcome: outcome.clone(),
        });

        AgentRunResult {
            agent: agent.name.clone(),
            role,
            outcome,
        }
    }
}
