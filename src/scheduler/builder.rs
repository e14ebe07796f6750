// ABOUTME: The contract shared by action-graph builders and the settings they read.
// ABOUTME: Also builds the platform-options variable exported to workloads.

use serde_json::json;

use super::actions::{Action, ActionGraph, CachedDependency, EnvironmentVariable, ImageLayer};
use super::delivery::ImageDeliveryMode;
use super::error::ActionGraphError;
use super::lifecycle::LifecycleBundles;

pub const PLATFORM_OPTIONS_VAR: &str = "VCAP_PLATFORM_OPTIONS";

/// Platform configuration consulted while building action graphs.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub lifecycle_bundles: LifecycleBundles,
    pub image_delivery_mode: ImageDeliveryMode,
    pub default_app_port: u16,
    /// Internal URL of the credential broker, if one is deployed.
    pub credhub_url: Option<String>,
    pub interpolate_service_bindings: bool,
}

impl SchedulerSettings {
    pub fn new(lifecycle_bundles: LifecycleBundles) -> Self {
        Self {
            lifecycle_bundles,
            image_delivery_mode: ImageDeliveryMode::Unset,
            default_app_port: 8080,
            credhub_url: None,
            interpolate_service_bindings: false,
        }
    }

    /// `VCAP_PLATFORM_OPTIONS` carrying the credential broker URL.
    ///
    /// Absent unless a broker URL is set and service-binding interpolation is on.
    pub fn platform_options(&self) -> Option<EnvironmentVariable> {
        let url = self.credhub_url.as_deref().filter(|u| !u.is_empty())?;
        if !self.interpolate_service_bindings {
            return None;
        }

        let options = json!({ "credhub-uri": url });
        Some(EnvironmentVariable::new(PLATFORM_OPTIONS_VAR, options.to_string()))
    }
}

/// Builds the pieces of a scheduler submission for one workload.
pub trait ActionBuilder {
    fn action(&self) -> Result<Action, ActionGraphError>;

    fn image_layers(&self) -> Result<Option<Vec<ImageLayer>>, ActionGraphError>;

    fn cached_dependencies(&self) -> Result<Option<Vec<CachedDependency>>, ActionGraphError>;

    fn environment_variables(&self) -> Result<Vec<EnvironmentVariable>, ActionGraphError>;

    /// Assemble the full submission.
    fn build(&self) -> Result<ActionGraph, ActionGraphError> {
        Ok(ActionGraph {
            action: self.action()?,
            image_layers: self.image_layers()?,
            cached_dependencies: self.cached_dependencies()?,
            environment_variables: self.environment_variables()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SchedulerSettings {
        SchedulerSettings::new(LifecycleBundles::default())
    }

    #[test]
    fn platform_options_need_url_and_interpolation() {
        let mut s = settings();
        assert!(s.platform_options().is_none());

        s.credhub_url = Some("https://credhub.service.cf.internal:8844".to_string());
        assert!(s.platform_options().is_none());

        s.interpolate_service_bindings = true;
        let var = s.platform_options().unwrap();
        assert_eq!(var.name, "VCAP_PLATFORM_OPTIONS");
        assert_eq!(
            var.value,
            r#"{"credhub-uri":"https://credhub.service.cf.internal:8844"}"#
        );
    }

    #[test]
    fn interpolation_without_url_emits_nothing() {
        let mut s = settings();
        s.interpolate_service_bindings = true;
        assert!(s.platform_options().is_none());
    }
}
