// ABOUTME: Semantic process types with an explicit deploying-web role.
// ABOUTME: Renders the legacy `web-deployment-<guid>` label only for display and history.

use super::id::DeploymentGuid;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reserved type name of the process that receives routed traffic.
pub const WEB: &str = "web";

/// Reserved type name of one-off task processes.
pub const TASK: &str = "task";

#[derive(Debug, Error)]
pub enum ProcessTypeError {
    #[error("process type cannot be empty")]
    Empty,

    #[error("process type is reserved for deployments: {0}")]
    ReservedForDeployment(String),

    #[error("invalid character in process type: '{0}'")]
    InvalidChar(char),
}

/// What a process is for.
///
/// The deploying web process is identified by its role plus the process's
/// `deployment` reference, never by parsing its type string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "role", content = "name")]
pub enum ProcessType {
    Web,
    /// Shadow web process created for a rollout; coexists with `Web`.
    DeployingWeb,
    Task,
    /// Any other declared process type (`worker`, `clock`, ...).
    Worker(String),
}

impl ProcessType {
    /// Parse a declared process type name.
    pub fn parse(value: &str) -> Result<Self, ProcessTypeError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ProcessTypeError::Empty);
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '-' && c != '_' {
                return Err(ProcessTypeError::InvalidChar(c));
            }
        }

        match value {
            WEB => Ok(ProcessType::Web),
            TASK => Ok(ProcessType::Task),
            v if v.starts_with("web-deployment-") => {
                Err(ProcessTypeError::ReservedForDeployment(v.to_string()))
            }
            v => Ok(ProcessType::Worker(v.to_string())),
        }
    }

    pub fn is_web(&self) -> bool {
        matches!(self, ProcessType::Web)
    }

    /// Wire label for this type.
    ///
    /// The deploying web process needs its deployment guid to render the
    /// legacy label; without one it renders as plain `web-deployment`.
    pub fn label(&self, deployment: Option<&DeploymentGuid>) -> String {
        match (self, deployment) {
            (ProcessType::Web, _) => WEB.to_string(),
            (ProcessType::Task, _) => TASK.to_string(),
            (ProcessType::Worker(name), _) => name.clone(),
            (ProcessType::DeployingWeb, Some(guid)) => format!("{WEB}-deployment-{guid}"),
            (ProcessType::DeployingWeb, None) => format!("{WEB}-deployment"),
        }
    }
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reserved_names() {
        assert_eq!(ProcessType::parse("web").unwrap(), ProcessType::Web);
        assert_eq!(ProcessType::parse("task").unwrap(), ProcessType::Task);
        assert_eq!(
            ProcessType::parse("worker").unwrap(),
            ProcessType::Worker("worker".to_string())
        );
    }

    #[test]
    fn rejects_synthesized_deployment_labels() {
        assert!(matches!(
            ProcessType::parse("web-deployment-abc"),
            Err(ProcessTypeError::ReservedForDeployment(_))
        ));
    }

    #[test]
    fn deploying_label_embeds_guid() {
        let guid = DeploymentGuid::new("d-1");
        assert_eq!(
            ProcessType::DeployingWeb.label(Some(&guid)),
            "web-deployment-d-1"
        );
    }
}
