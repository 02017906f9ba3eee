//! Agent roster configuration.
//!
//! The roster names every external agent the pipeline drives, grouped by
//! role: mappers analyze the target, organizers restructure prior outputs,
//! and a single optional reporter produces the final report. Agent names
//! become filesystem path segments, so they must be unique across the whole
//! roster.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One external agent: a unique name and the repository it is fetched from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentSpec {
    /// Agent name, used as the workspace directory and output namespace.
    pub name: String,

    /// Repository location (anything `git clone` accepts).
    pub repo: String,
}

/// The full agent roster, loaded once per run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    /// Mapper agents, executed in list order.
    #[serde(default)]
    pub mapper_agents: Vec<AgentSpec>,

    /// Organizer agents, executed in list order after all mappers.
    #[serde(default)]
    pub organizer_agents: Vec<AgentSpec>,

    /// The terminal reporter agent, if configured.
    #[serde(default)]
    pub reporter_agent: Option<AgentSpec>,
}

impl Roster {
    /// Load and validate a roster from a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::ConfigRead {
            path: path.display().to_string(),
            source: e,
        })?;

        let roster: Roster =
            serde_json::from_str(&content).map_err(|e| PipelineError::ConfigParse {
                path: path.display().to_string(),
                source: e,
            })?;

        roster.validate()?;
        Ok(roster)
    }

    /// Validate roster invariants: non-empty names, unique across all roles.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for agent in self.all_agents() {
            if agent.name.trim().is_empty() {
                return Err(PipelineError::InvalidRoster(
                    "agent name must not be empty".to_string(),
                ));
            }
            if agent.name.contains('/') || agent.name.contains('\\') {
                return Err(PipelineError::InvalidRoster(format!(
                    "agent name '{}' must not contain path separators",
                    agent.name
                )));
            }
            if !seen.insert(agent.name.as_str()) {
                return Err(PipelineError::InvalidRoster(format!(
                    "duplicate agent name '{}'",
                    agent.name
                )));
            }
        }
        Ok(())
    }

    /// Iterate over every agent in the roster, in pipeline order.
    pub fn all_agents(&self) -> impl Iterator<Item = &AgentSpec> {
        self.mapper_agents
            .iter()
            .chain(self.organizer_agents.iter())
            .chain(self.reporter_agent.iter())
    }

    /// Total number of agents across all roles.
    pub fn len(&self) -> usize {
        self.all_agents().count()
    }

    /// Whether the roster has no agents at all.
    pub fn is_empty(&self) -> bool {
        self.all_agents().next().is_none()
    }
}
