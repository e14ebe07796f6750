// ABOUTME: Resolves lifecycle bundle locations from the configured bundle table.
// ABOUTME: Relative bundle paths are served from the platform file server.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use url::Url;

/// Directory the lifecycle binaries are unpacked into inside the container.
pub const LIFECYCLE_DESTINATION: &str = "/tmp/lifecycle";

/// Entry point shipped in every lifecycle bundle.
pub const LAUNCHER_PATH: &str = "/tmp/lifecycle/launcher";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("no compiler defined for requested stack: {0}")]
    InvalidStack(String),

    #[error("lifecycle bundle {0} is a relative path but no file_server_url is configured")]
    NoFileServer(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleType {
    Buildpack,
    Docker,
}

impl LifecycleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleType::Buildpack => "buildpack",
            LifecycleType::Docker => "docker",
        }
    }

    /// Key into the bundle table: `buildpack/<stack>`, or `docker` without a stack.
    pub fn bundle_key(&self, stack: Option<&str>) -> String {
        match stack {
            Some(stack) => format!("{}/{}", self.as_str(), stack),
            None => self.as_str().to_string(),
        }
    }

    /// Scheduler cache key and shared-layer name for the bundle.
    pub fn cache_key(&self, stack: Option<&str>) -> String {
        format!("{}-lifecycle", self.bundle_key(stack).replace('/', "-"))
    }
}

impl fmt::Display for LifecycleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The lifecycle bundle table.
#[derive(Debug, Clone, Default)]
pub struct LifecycleBundles {
    bundles: BTreeMap<String, String>,
    file_server_url: Option<Url>,
}

impl LifecycleBundles {
    pub fn new(bundles: BTreeMap<String, String>, file_server_url: Option<Url>) -> Self {
        Self {
            bundles,
            file_server_url,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Every configured key with its download location.
    pub fn entries(&self) -> Result<Vec<(&str, String)>, LifecycleError> {
        self.bundles
            .iter()
            .map(|(key, bundle)| Ok((key.as_str(), self.bundle_uri(bundle)?)))
            .collect()
    }

    /// Checks that every bundle resolves to a fetchable location.
    pub fn validate(&self) -> Result<(), LifecycleError> {
        self.entries().map(|_| ())
    }

    /// Download location of the bundle for `lifecycle` on `stack`.
    ///
    /// Fails with `InvalidStack` when the pair is not configured, no matter
    /// what else is.
    pub fn resolve(
        &self,
        lifecycle: LifecycleType,
        stack: Option<&str>,
    ) -> Result<String, LifecycleError> {
        let key = lifecycle.bundle_key(stack);
        let bundle = self
            .bundles
            .get(&key)
            .ok_or_else(|| LifecycleError::InvalidStack(key.clone()))?;

        self.bundle_uri(bundle)
    }

    fn bundle_uri(&self, bundle: &str) -> Result<String, LifecycleError> {
        if Url::parse(bundle).is_ok() {
            return Ok(bundle.to_string());
        }

        let base = self
            .file_server_url
            .as_ref()
            .ok_or_else(|| LifecycleError::NoFileServer(bundle.to_string()))?;
        Ok(format!(
            "{}/v1/static/{}",
            base.as_str().trim_end_matches('/'),
            bundle.trim_start_matches('/')
        ))
    }
}
