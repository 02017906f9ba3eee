//! Agent process execution and artifact collection.
//!
//! Every agent exposes the same entry point: a `main.py` at its workspace
//! root, executed with the workspace as working directory. The three roles
//! differ only in the argument they receive and in which artifacts are
//! collected afterwards:
//!
//! - mapper: argv = absolute target path; collects `output.json` as
//!   `<name>_output.json`
//! - organizer: no argv; collects the `output/` tree into `<name>/`
//! - reporter: argv = absolute output area path; collects `output.json`,
//!   `output.html`, and the `output/` tree, each independently optional
//!
//! A missing entry point or a nonzero exit is reported in the outcome and
//! never aborts the surrounding stage. Artifacts are copied, never moved;
//! the workspace is left untouched.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

/// Entry point file every agent must provide at its workspace root.
pub const ENTRYPOINT: &str = "main.py";

/// Interpreter used to execute the entry point.
const INTERPRETER: &str = "python3";

/// The three agent roles, in pipeline stage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    Mapper,
    Organizer,
    Reporter,
}

impl AgentRole {
    /// Stable lowercase role name for logs and events.
    pub fn name(&self) -> &'static str {
        match self {
            AgentRole::Mapper => "mapper",
            AgentRole::Organizer => "organizer",
            AgentRole::Reporter => "reporter",
        }
    }
}

/// Outcome of one agent execution.
#[derive(Debug, Clone)]
pub enum AgentOutcome {
    /// Process exited 0; `artifacts` lists the collected destination paths.
    /// A mapper that exits 0 without writing its artifact still succeeds,
    /// with an empty list.
    Succeeded { artifacts: Vec<PathBuf> },

    /// No entry point file in the workspace (likely a failed sync).
    EntrypointMissing,

    /// Process exited nonzero or could not be spawned (exit_code -1).
    Failed { exit_code: i32, stderr: String },
}

impl AgentOutcome {
    /// Whether the agent process ran to completion successfully.
    pub fn succeeded(&self) -> bool {
        matches!(self, AgentOutcome::Succeeded { .. })
    }

    /// Collected artifact paths, empty unless succeeded.
    pub fn artifacts(&self) -> &[PathBuf] {
        match self {
            AgentOutcome::Succeeded { artifacts } => artifacts,
            _ => &[],
        }
    }
}

/// Role-specialized runner for one agent process.
pub struct AgentRunner;

impl AgentRunner {
    /// Run a mapper: entry point gets the absolute target path.
    ///
    /// On success, `output.json` from the workspace root is collected as
    /// `<name>_output.json` in the output area.
    pub async fn run_mapper(
        workspace: &Path,
        name: &str,
        output_area: &Path,
        target: &Path,
    ) -> AgentOutcome {
        let target_arg = target.to_string_lossy().to_string();
        let outcome = execute_entrypoint(workspace, name, &[&target_arg]).await;

        match outcome {
            AgentOutcome::Succeeded { .. } => {
                let mut artifacts = Vec::new();
                collect_file(
                    &workspace.join("output.json"),
                    &output_area.join(format!("{name}_output.json")),
                    name,
                    &mut artifacts,
                );
                if artifacts.is_empty() {
                    warn!(agent = name, "Mapper produced no output.json");
                }
                AgentOutcome::Succeeded { artifacts }
            }
            other => other,
        }
    }

    /// Run an organizer: entry point gets no arguments.
    ///
    /// On success, the workspace's `output/` tree is merged into
    /// `<name>/` in the output area.
    pub async fn run_organizer(workspace: &Path, name: &str, output_area: &Path) -> AgentOutcome {
        let outcome = execute_entrypoint(workspace, name, &[]).await;

        match outcome {
            AgentOutcome::Succeeded { .. } => {
                let mut artifacts = Vec::new();
                collect_tree(
                    &workspace.join("output"),
                    &output_area.join(name),
                    name,
                    &mut artifacts,
                );
                AgentOutcome::Succeeded { artifacts }
            }
            other => other,
        }
    }

    /// Run the reporter: entry point gets the absolute output area path,
    /// since it is the only role that consumes prior agents' artifacts.
    ///
    /// On success, up to three artifact kinds are collected, each
    /// independently optional: `output.json` as `<name>_output.json`,
    /// `output.html` as `<name>_report.html`, and the `output/` tree into
    /// `<name>/`.
    pub async fn run_reporter(workspace: &Path, name: &str, output_area: &Path) -> AgentOutcome {
        let area_arg = output_area.to_string_lossy().to_string();
        let outcome = execute_entrypoint(workspace, name, &[&area_arg]).await;

        match outcome {
            AgentOutcome::Succeeded { .. } => {
                let mut artifacts = Vec::new();
                collect_file(
                    &workspace.join("output.json"),
                    &output_area.join(format!("{name}_output.json")),
                    name,
                    &mut artifacts,
                );
                collect_file(
                    &workspace.join("output.html"),
                    &output_area.join(format!("{name}_report.html")),
                    name,
                    &mut artifacts,
                );
                collect_tree(
                    &workspace.join("output"),
                    &output_area.join(name),
                    name,
                    &mut artifacts,
                );
                AgentOutcome::Succeeded { artifacts }
            }
            other => other,
        }
    }
}

/// Spawn the agent's entry point and wait for it to exit.
///
/// The call blocks the stage until the child exits; no timeout is imposed.
async fn execute_entrypoint(workspace: &Path, name: &str, args: &[&str]) -> AgentOutcome {
    let entrypoint = workspace.join(ENTRYPOINT);
    if !entrypoint.exists() {
        warn!(agent = name, "{} not found in {:?}", ENTRYPOINT, workspace);
        return AgentOutcome::EntrypointMissing;
    }

    info!(agent = name, ?args, "Running agent entry point");

    let output = Command::new(INTERPRETER)
        .arg(ENTRYPOINT)
        .args(args)
        .current_dir(workspace)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match output {
        Ok(out) => out,
        Err(e) => {
            warn!(agent = name, error = %e, "Failed to spawn agent process");
            return AgentOutcome::Failed {
                exit_code: -1,
                stderr: e.to_string(),
            };
        }
    };

    if output.status.success() {
        AgentOutcome::Succeeded {
            artifacts: Vec::new(),
        }
    } else {
        let exit_code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!(agent = name, exit_code, "Agent exited nonzero");
        AgentOutcome::Failed { exit_code, stderr }
    }
}

/// Copy a single declared artifact file if the agent produced it.
fn collect_file(source: &Path, dest: &Path, agent: &str, artifacts: &mut Vec<PathBuf>) {
    if !source.is_file() {
        return;
    }
    match std::fs::copy(source, dest) {
        Ok(_) => {
            info!(agent, "Collected {:?}", dest);
            artifacts.push(dest.to_path_buf());
        }
        Err(e) => warn!(agent, error = %e, "Failed to collect {:?}", source),
    }
}

/// Recursively copy a declared `output/` tree if the agent produced one.
fn collect_tree(source: &Path, dest: &Path, agent: &str, artifacts: &mut Vec<PathBuf>) {
    if !source.is_dir() {
        return;
    }
    match copy_dir_all(source, dest) {
        Ok(()) => {
            info!(agent, "Collected output tree into {:?}", dest);
            artifacts.push(dest.to_path_buf());
        }
        Err(e) => warn!(agent, error = %e, "Failed to collect tree {:?}", source),
    }
}

/// Recursively copy `src` into `dest`, merging with any existing contents.
///
/// Files and subdirectories are copied; existing files at the destination
/// are overwritten, which is safe because each agent owns its namespace.
pub(crate) fn copy_dir_all(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let target = dest.join(entry.file_name());
        if path.is_dir() {
            copy_dir_all(&path, &target)?;
        } else {
            std::fs::copy(&path, &target)?;
        }
    }
    Ok(())
}
