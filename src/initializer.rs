//! The application initializer run at the end of bootstrap.

use crate::bootstrap::{AppInitializer, InitContext};
use crate::config::Settings;
use anyhow::{bail, Context, Result};
use tracing::{debug, info};

/// Validates settings and backing service endpoints.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultInitializer;

impl DefaultInitializer {
    pub fn new() -> Self {
        Self
    }

    /// Checks the options a running process cannot do without.
    fn validate_services(settings: &Settings) -> Result<()> {
        match settings.system.secret_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => bail!("system.secret_key must be set"),
        }

        for (name, endpoint) in &settings.services {
            validate_endpoint(endpoint)
                .with_context(|| format!("invalid endpoint for services.{}", name))?;
            debug!(service = %name, %endpoint, "Service endpoint validated");
        }
        Ok(())
    }
}

/// Accepts `host:port` with a non-empty host and a numeric port.
fn validate_endpoint(endpoint: &str) -> Result<()> {
    let Some((host, port)) = endpoint.rsplit_once(':') else {
        bail!("'{}' is not of the form host:port", endpoint);
    };
    if host.trim().is_empty() {
        bail!("'{}' has an empty host", endpoint);
    }
    port.parse::<u16>()
        .with_context(|| format!("'{}' has an invalid port", endpoint))?;
    Ok(())
}

impl AppInitializer for DefaultInitializer {
    fn initialize(&self, ctx: &InitContext<'_>, skip_service_validation: bool) -> Result<()> {
        info!(
            config_path = %ctx.config_path.display(),
            options = ?ctx.options,
            "Initializing application"
        );
        if skip_service_validation {
            debug!("Service validation skipped");
            return Ok(());
        }
        Self::validate_services(ctx.settings)
    }
}
