// ABOUTME: Process records and their health check configuration.
// ABOUTME: A deploying process references its deployment explicitly instead of encoding it in its type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AppGuid, DeploymentGuid, ProcessGuid, ProcessType, RevisionGuid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthCheckType {
    #[default]
    Port,
    Process,
    Http,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(rename = "type", default)]
    pub kind: HealthCheckType,

    /// Seconds allowed for the first healthy check after start.
    #[serde(default)]
    pub timeout: Option<u32>,

    /// Seconds allowed for a single check invocation.
    #[serde(default)]
    pub invocation_timeout: Option<u32>,

    /// Only meaningful for `http` checks.
    #[serde(default)]
    pub http_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessState {
    #[default]
    Stopped,
    Started,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub guid: ProcessGuid,
    pub app: AppGuid,
    #[serde(rename = "type")]
    pub process_type: ProcessType,
    pub state: ProcessState,
    pub instances: u32,
    pub memory_mb: u64,
    pub disk_quota_mb: u64,
    pub file_descriptors: u64,
    pub command: Option<String>,
    pub detected_buildpack: Option<String>,
    pub health_check: HealthCheck,
    pub enable_ssh: bool,
    pub ports: Option<Vec<u16>>,
    /// Free-form labels and annotations.
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub revision: Option<RevisionGuid>,
    /// Set only on deploying web processes.
    pub deployment: Option<DeploymentGuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Process {
    /// A new stopped process with platform default quotas.
    pub fn new(app: &AppGuid, process_type: ProcessType) -> Self {
        let now = Utc::now();
        Self {
            guid: ProcessGuid::generate(),
            app: app.clone(),
            process_type,
            state: ProcessState::Stopped,
            instances: 1,
            memory_mb: 1024,
            disk_quota_mb: 1024,
            file_descriptors: 16384,
            command: None,
            detected_buildpack: None,
            health_check: HealthCheck::default(),
            enable_ssh: true,
            ports: None,
            metadata: serde_json::Map::new(),
            revision: None,
            deployment: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Type label as the scheduler and history records see it.
    pub fn type_label(&self) -> String {
        self.process_type.label(self.deployment.as_ref())
    }

    pub fn is_started(&self) -> bool {
        self.state == ProcessState::Started
    }
}
