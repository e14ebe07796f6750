// ABOUTME: Copies route mappings from a replaced process onto its successor.
// ABOUTME: Idempotent per (route, process) pair.

use chrono::Utc;

use crate::model::RouteMapping;
use crate::store::{StoreError, Transaction};
use crate::types::{ProcessGuid, RouteMappingGuid};

pub struct RouteCarryover;

impl RouteCarryover {
    /// Map every route of `source` onto `target` with the same weight.
    ///
    /// Routes already mapped to `target` are skipped. Returns the number of
    /// mappings created.
    pub fn carry_over(
        tx: &mut dyn Transaction,
        source: &ProcessGuid,
        target: &ProcessGuid,
    ) -> Result<usize, StoreError> {
        let existing = tx.route_mappings_for_process(target)?;
        let mut created = 0;

        for mapping in tx.route_mappings_for_process(source)? {
            if existing.iter().any(|m| m.route == mapping.route) {
                continue;
            }

            tx.insert_route_mapping(RouteMapping {
                guid: RouteMappingGuid::generate(),
                app: mapping.app,
                route: mapping.route,
                process: target.clone(),
                weight: mapping.weight,
                created_at: Utc::now(),
            })?;
            created += 1;
        }

        tracing::debug!(source = %source, target = %target, created, "carried over route mappings");
        Ok(created)
    }
}
