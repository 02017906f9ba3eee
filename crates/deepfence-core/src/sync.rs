//! Repository synchronization for agent workspaces.
//!
//! Each agent's code lives in its own workspace directory under `agents/`.
//! A sync is a fresh `git clone` when the workspace is absent and a
//! `git pull` in place when it exists (the directory is assumed to already
//! be a checkout of the right origin). Sync failures never raise past this
//! module: every outcome is a [`SyncResult`] so sibling syncs and the rest
//! of the pipeline keep going.

use crate::roster::AgentSpec;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

/// Outcome of synchronizing one agent's repository.
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// Agent name.
    pub agent: String,

    /// Workspace path that was synchronized.
    pub workspace: PathBuf,

    /// Whether the clone/pull succeeded.
    pub ok: bool,

    /// Human-readable summary (git stderr on failure).
    pub message: String,
}

/// Clone or update one repository into `dest`.
///
/// Never returns an error: failures are captured in the result so the
/// caller can continue with its siblings.
pub async fn sync_repo(agent: &str, repo: &str, dest: &Path) -> SyncResult {
    let outcome = if dest.exists() {
        run_git(&["pull"], Some(dest)).await
    } else {
        let dest_str = dest.to_string_lossy();
        run_git(&["clone", repo, dest_str.as_ref()], None).await
    };

    match outcome {
        Ok(()) => {
            info!(agent, repo, "Synchronized repository");
            SyncResult {
                agent: agent.to_string(),
                workspace: dest.to_path_buf(),
                ok: true,
                message: format!("synchronized {repo}"),
            }
        }
        Err(message) => {
            warn!(agent, repo, %message, "Repository sync failed");
            SyncResult {
                agent: agent.to_string(),
                workspace: dest.to_path_buf(),
                ok: false,
                message,
            }
        }
    }
}

/// Synchronize every agent in the roster, at most `limit` at a time.
///
/// Workspaces are disjoint per agent, so the syncs share no mutable state
/// and completion order is irrelevant; results are returned in input order.
pub async fn sync_all(agents: &[AgentSpec], agents_dir: &Path, limit: usize) -> Vec<SyncResult> {
    let limit = limit.max(1);
    let mut results: Vec<SyncResult> = stream::iter(agents.iter().map(|agent| {
        let dest = agents_dir.join(&agent.name);
        async move { sync_repo(&agent.name, &agent.repo, &dest).await }
    }))
    .buffer_unordered(limit)
    .collect()
    .await;

    // buffer_unordered yields in completion order; restore roster order.
    results.sort_by_key(|r| {
        agents
            .iter()
            .position(|a| a.name == r.agent)
            .unwrap_or(usize::MAX)
    });
    results
}

/// Run a git subcommand, capturing stderr for diagnostics.
async fn run_git(args: &[&str], cwd: Option<&Path>) -> std::result::Result<(), String> {
    let mut cmd = Command::new("git");
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd
        .output()
        .await
        .map_err(|e| format!("failed to run git: {e}"))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!(
            "git {} failed: {}",
            args.first().unwrap_or(&""),
            stderr.trim()
        ))
    }
}
