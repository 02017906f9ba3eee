//! Cross-agent artifact stitching.
//!
//! Some reports need an artifact produced by an earlier agent placed inside
//! another agent's namespace. Rather than hard-wiring those copies into the
//! orchestrator, they are declarative [`StitchRule`]s evaluated once, after
//! the reporter stage. Every rule is best-effort: an absent source or a
//! failed copy is logged and skipped.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One post-reporter copy inside the output area.
///
/// Both paths are relative to the output area root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StitchRule {
    /// Artifact to copy, e.g. `mapper-agent/topological-graph-output.json`.
    pub source: PathBuf,

    /// Destination path, e.g. `reporter/reports/topological-graph-output.json`.
    pub dest: PathBuf,
}

impl StitchRule {
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
        }
    }
}

/// The stock rule set: the mapper's topological graph feeds the reporter's
/// reports folder.
pub fn default_rules() -> Vec<StitchRule> {
    vec![StitchRule::new(
        "mapper-agent/topological-graph-output.json",
        "reporter/reports/topological-graph-output.json",
    )]
}

/// Apply every rule against the output area, returning the rules that
/// actually copied something.
pub fn apply_rules(output_area: &Path, rules: &[StitchRule]) -> Vec<StitchRule> {
    let mut applied = Vec::new();
    for rule in rules {
        let source = output_area.join(&rule.source);
        let dest = output_area.join(&rule.dest);

        if !source.is_file() {
            debug!("Stitch source {:?} absent, skipping", rule.source);
            continue;
        }

        if let Some(parent) = dest.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(error = %e, "Failed to create stitch destination {:?}", parent);
                continue;
            }
        }

        match std::fs::copy(&source, &dest) {
            Ok(_) => {
                info!("Stitched {:?} -> {:?}", rule.source, rule.dest);
                applied.push(rule.clone());
            }
            Err(e) => warn!(error = %e, "Stitch copy {:?} failed", rule.source),
        }
    }
    applied
}
