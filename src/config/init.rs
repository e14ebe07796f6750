// ABOUTME: Config scaffolding for new installations.
// ABOUTME: Creates capstan.yml template files.

use std::fmt::Write as _;
use std::path::Path;

use url::Url;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, file_server_url: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();

    if let Some(url) = file_server_url {
        Url::parse(url).map_err(|e| Error::InvalidConfig(format!("file_server_url {url}: {e}")))?;
        config.file_server_url = Some(url.to_string());
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    let mut bundles = String::new();
    for (key, path) in &config.lifecycle_bundles {
        let _ = writeln!(bundles, "  {key}: {path}");
    }

    format!(
        r#"lifecycle_bundles:
{bundles}file_server_url: {}
# Set to "oci-phase-1" to deliver droplets and lifecycles as image layers
# image_delivery_mode: ""
default_app_port: {}
# credhub_api:
#   internal_url:
#     env: CREDHUB_INTERNAL_URL
credential_references:
  interpolate_service_bindings: {}
deployments:
  max_retained_per_app: {}
"#,
        config.file_server_url.as_deref().unwrap_or(""),
        config.default_app_port,
        config.credential_references.interpolate_service_bindings,
        config.deployments.max_retained_per_app,
    )
}
