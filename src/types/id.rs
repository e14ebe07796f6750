// ABOUTME: Phantom-typed guids for compile-time type safety.
// ABOUTME: Prevents accidental swapping of app, droplet, process, deployment and route guids.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum AppMarker {}
pub enum DropletMarker {}
pub enum ProcessMarker {}
pub enum DeploymentMarker {}
pub enum RevisionMarker {}
pub enum RouteMarker {}
pub enum RouteMappingMarker {}

/// A type-safe guid that prevents accidental mixing of different record kinds.
///
/// A `DeploymentGuid` cannot be passed where a `ProcessGuid` is expected, even
/// though both are plain strings on the wire.
#[must_use = "guids reference records and should not be ignored"]
pub struct Guid<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Guid<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    /// Generate a fresh random (v4) guid.
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

// Manual trait implementations that don't require T to implement the trait.
// T is only used as a phantom type marker.

impl<T> std::fmt::Debug for Guid<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Guid").field(&self.value).finish()
    }
}

impl<T> Clone for Guid<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Guid<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Guid<T> {}

impl<T> Hash for Guid<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Guid<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Guid<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Guid<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

pub type AppGuid = Guid<AppMarker>;
pub type DropletGuid = Guid<DropletMarker>;
pub type ProcessGuid = Guid<ProcessMarker>;
pub type DeploymentGuid = Guid<DeploymentMarker>;
pub type RevisionGuid = Guid<RevisionMarker>;
pub type RouteGuid = Guid<RouteMarker>;
pub type RouteMappingGuid = Guid<RouteMappingMarker>;
