//! Console presentation for pipeline events.
//!
//! Renders the core's structured events as colored stage banners and
//! per-agent outcome lines. All formatting lives here; the core knows
//! nothing about the terminal.

use colored::{Color, Colorize};
use deepfence_core::{AgentOutcome, PipelineEvent, PipelineObserver, Stage};

const FRAME: &str =
    "+================================================================+";

/// Print a framed, colored stage banner.
pub fn banner(tag: &str, message: &str, color: Color) {
    println!();
    println!("{}", FRAME.color(color));
    println!("{}", format!("|  [{tag}] {message}").color(color));
    println!("{}", FRAME.color(color));
}

/// Banner shown before the pipeline itself starts.
pub fn start_banner() {
    banner("START", "DeepFence AI - Starting the Journey", Color::Green);
}

/// Banner shown while the roster config is loaded.
pub fn config_banner() {
    banner("CONFIG", "Loading Configuration", Color::Blue);
}

/// Observer that renders pipeline events to the terminal.
pub struct ConsoleObserver;

impl PipelineObserver for ConsoleObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { stage } => stage_banner(*stage),
            PipelineEvent::Archived { slot } => {
                println!("  archived previous outputs to {}", slot.display());
            }
            PipelineEvent::SyncFinished { agent, ok, message } => {
                if *ok {
                    println!("  {} {agent}: {message}", "[ok]".green());
                } else {
                    println!("  {} {agent}: {message}", "[failed]".red());
                }
            }
            PipelineEvent::AgentStarted { role, agent } => {
                println!("  {} {} {agent}", "[run]".cyan(), role.name());
            }
            PipelineEvent::AgentFinished {
                agent, outcome, ..
            } => match outcome {
                AgentOutcome::Succeeded { artifacts } => {
                    println!(
                        "  {} {agent}: collected {} artifact(s)",
                        "[done]".green(),
                        artifacts.len()
                    );
                }
                AgentOutcome::EntrypointMissing => {
                    println!("  {} {agent}: entry point not found", "[skip]".yellow());
                }
                AgentOutcome::Failed { exit_code, .. } => {
                    println!("  {} {agent}: exited with code {exit_code}", "[fail]".red());
                }
            },
            PipelineEvent::Stitched { source, dest } => {
                println!(
                    "  {} {} -> {}",
                    "[stitch]".magenta(),
                    source.display(),
                    dest.display()
                );
            }
            PipelineEvent::ReportReady { path } => {
                println!();
                println!(
                    "{}",
                    format!("Final report: {}", path.display()).green().bold()
                );
            }
            PipelineEvent::ReportMissing => {
                println!();
                println!("{}", "No final report was produced".yellow());
            }
        }
    }
}

fn stage_banner(stage: Stage) {
    match stage {
        Stage::ArchivePrior => banner("ARCHIVE", "Archiving Previous Outputs", Color::Magenta),
        Stage::PrepareDirs => banner("DIRS", "Preparing Directories", Color::Cyan),
        Stage::SyncAgents => banner("CLONE", "Syncing Agent Repositories", Color::Yellow),
        Stage::RunMappers => banner("MAPPER", "Executing Mapper Agents", Color::Blue),
        Stage::RunOrganizers => banner("ORGANIZER", "Executing Organizer Agents", Color::Magenta),
        Stage::RunReporter => banner("REPORTER", "Generating Reports", Color::Cyan),
        Stage::Done => banner("COMPLETE", "All Stages Completed", Color::Green),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_console_observer_handles_every_event() {
        let obs = ConsoleObserver;
        obs.on_event(&PipelineEvent::StageStarted {
            stage: Stage::SyncAgents,
        });
        obs.on_event(&PipelineEvent::Archived {
            slot: PathBuf::from("archive/output-00001"),
        });
        obs.on_event(&PipelineEvent::SyncFinished {
            agent: "m1".to_string(),
            ok: false,
            message: "git clone failed".to_string(),
        });
        obs.on_event(&PipelineEvent::ReportMissing);
    }
}
