// ABOUTME: Persisted deployment record and its lifecycle states.
// ABOUTME: Historical related processes outlive the live processes they describe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AppGuid, DeploymentGuid, DropletGuid, ProcessGuid, RevisionGuid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeploymentState {
    Deploying,
    Deployed,
    Canceling,
    Canceled,
}

impl DeploymentState {
    /// Whether the retention sweep may delete a deployment in this state.
    ///
    /// Only an in-flight rollout is protected.
    pub fn is_prunable(&self) -> bool {
        !matches!(self, DeploymentState::Deploying)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentState::Deploying => "DEPLOYING",
            DeploymentState::Deployed => "DEPLOYED",
            DeploymentState::Canceling => "CANCELING",
            DeploymentState::Canceled => "CANCELED",
        }
    }
}

impl std::fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Revision captured at deployment creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRef {
    pub guid: RevisionGuid,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub guid: DeploymentGuid,
    pub app: AppGuid,
    pub droplet: Option<DropletGuid>,
    pub previous_droplet: Option<DropletGuid>,
    pub state: DeploymentState,
    pub deploying_web_process: Option<ProcessGuid>,
    pub original_web_process_instance_count: u32,
    pub revision: Option<RevisionRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deployment {
    /// A bare deployment record in the given state, without a deploying process.
    pub fn new(app: &AppGuid, state: DeploymentState) -> Self {
        let now = Utc::now();
        Self {
            guid: DeploymentGuid::generate(),
            app: app.clone(),
            droplet: None,
            previous_droplet: None,
            state,
            deploying_web_process: None,
            original_web_process_instance_count: 0,
            revision: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_deploying(&self) -> bool {
        self.state == DeploymentState::Deploying
    }
}

/// A process that took part in a deployment, kept for history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalRelatedProcess {
    pub deployment: DeploymentGuid,
    pub process_guid: ProcessGuid,
    pub process_type: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_deploying_is_protected_from_pruning() {
        assert!(!DeploymentState::Deploying.is_prunable());
        assert!(DeploymentState::Deployed.is_prunable());
        assert!(DeploymentState::Canceling.is_prunable());
        assert!(DeploymentState::Canceled.is_prunable());
    }

    #[test]
    fn state_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&DeploymentState::Deploying).unwrap(),
            "\"DEPLOYING\""
        );
    }
}
