// ABOUTME: Audit event records and the sink collaborator that receives them.
// ABOUTME: Provides a tracing-backed sink and an in-memory sink for inspection.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::model::App;

/// Event type recorded when a deployment is created.
pub const DEPLOYMENT_CREATE: &str = "audit.app.deployment.create";

/// Identity of the user performing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAuditInfo {
    pub user_guid: String,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
}

impl UserAuditInfo {
    pub fn new(user_guid: impl Into<String>) -> Self {
        Self {
            user_guid: user_guid.into(),
            user_email: None,
            user_name: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub actor: String,
    pub actor_type: String,
    pub actor_name: Option<String>,
    pub actor_username: Option<String>,
    pub actee: String,
    pub actee_type: String,
    pub actee_name: String,
    pub timestamp: DateTime<Utc>,
    pub space_guid: String,
    pub organization_guid: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl AuditEvent {
    /// An event performed by `user` against `app`.
    pub fn for_app(
        event_type: &str,
        user: &UserAuditInfo,
        app: &App,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            event_type: event_type.to_string(),
            actor: user.user_guid.clone(),
            actor_type: "user".to_string(),
            actor_name: user.user_email.clone(),
            actor_username: user.user_name.clone(),
            actee: app.guid.to_string(),
            actee_type: "app".to_string(),
            actee_name: app.name.clone(),
            timestamp: Utc::now(),
            space_guid: app.space_guid.clone(),
            organization_guid: app.organization_guid.clone(),
            metadata,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to record audit event {event_type}: {reason}")]
    RecordFailed { event_type: String, reason: String },
}

/// Receives audit records.
///
/// Called from inside the operation's transaction: returning an error aborts
/// the operation.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Writes audit events to the `audit` tracing target as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let payload = serde_json::to_string(&event).map_err(|e| AuditError::RecordFailed {
            event_type: event.event_type.clone(),
            reason: e.to_string(),
        })?;
        tracing::info!(target: "audit", event_type = %event.event_type, actee = %event.actee, "{payload}");
        Ok(())
    }
}

/// Keeps audit events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    pub fn last(&self) -> Option<AuditEvent> {
        self.events.lock().last().cloned()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events.lock().push(event);
        Ok(())
    }
}
