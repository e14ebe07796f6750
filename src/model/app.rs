// ABOUTME: Application, droplet and revision records.
// ABOUTME: Droplets carry the content digests used to verify downloads and layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AppGuid, DropletGuid, RevisionGuid};

/// An application: the unit that owns processes, droplets and deployments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub guid: AppGuid,
    pub name: String,
    pub space_guid: String,
    pub organization_guid: String,
    /// The droplet currently assigned to run this app.
    pub droplet: Option<DropletGuid>,
    pub created_at: DateTime<Utc>,
}

impl App {
    pub fn new(
        name: impl Into<String>,
        space_guid: impl Into<String>,
        organization_guid: impl Into<String>,
    ) -> Self {
        Self {
            guid: AppGuid::generate(),
            name: name.into(),
            space_guid: space_guid.into(),
            organization_guid: organization_guid.into(),
            droplet: None,
            created_at: Utc::now(),
        }
    }
}

/// A staged, runnable artifact produced by a buildpack build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Droplet {
    pub guid: DropletGuid,
    pub app: AppGuid,
    /// SHA-256 of the droplet tarball. Absent on droplets staged before it was computed.
    pub sha256_checksum: Option<String>,
    /// Legacy SHA-1 droplet hash.
    pub droplet_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Droplet {
    pub fn new(app: &AppGuid) -> Self {
        Self {
            guid: DropletGuid::generate(),
            app: app.clone(),
            sha256_checksum: None,
            droplet_hash: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_sha256(mut self, checksum: impl Into<String>) -> Self {
        self.sha256_checksum = Some(checksum.into());
        self
    }

    pub fn with_droplet_hash(mut self, hash: impl Into<String>) -> Self {
        self.droplet_hash = Some(hash.into());
        self
    }

    pub fn belongs_to(&self, app: &AppGuid) -> bool {
        &self.app == app
    }
}

/// An immutable snapshot of what an app runs, versioned per app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub guid: RevisionGuid,
    pub app: AppGuid,
    pub version: u32,
    pub droplet: DropletGuid,
    pub created_at: DateTime<Utc>,
}
