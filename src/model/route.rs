// ABOUTME: Route mapping records binding a route to a specific process.
// ABOUTME: Weight is carried verbatim when mappings move to a deploying process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AppGuid, ProcessGuid, RouteGuid, RouteMappingGuid};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMapping {
    pub guid: RouteMappingGuid,
    pub app: AppGuid,
    pub route: RouteGuid,
    pub process: ProcessGuid,
    pub weight: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl RouteMapping {
    pub fn new(app: &AppGuid, route: &RouteGuid, process: &ProcessGuid) -> Self {
        Self {
            guid: RouteMappingGuid::generate(),
            app: app.clone(),
            route: route.clone(),
            process: process.clone(),
            weight: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }
}
