//! Registry project provider
//!
//! Hands out [`RegistryProject`] handles according to the configured
//! [`ConnectionPolicy`]: one shared client for the process, or a fresh client
//! for every inbound request.

use super::project::{RedcapProject, RegistryProject};
use crate::config::{ConnectionPolicy, RedcapConfig};
use crate::domain::Result;
use std::sync::Arc;

/// Source of registry project handles
#[derive(Clone)]
pub struct RegistryProvider {
    inner: ProviderInner,
}

#[derive(Clone)]
enum ProviderInner {
    Shared(Arc<dyn RegistryProject>),
    PerRequest(Arc<RedcapConfig>),
}

impl RegistryProvider {
    /// Create a provider from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the shared HTTP client cannot be built.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use redcap_bridge::adapters::redcap::RegistryProvider;
    /// use redcap_bridge::config::RedcapConfig;
    ///
    /// # async fn example() -> redcap_bridge::domain::Result<()> {
    /// let provider = RegistryProvider::from_config(&RedcapConfig::default())?;
    /// let project = provider.project()?;
    /// let groups = project.export_dags().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_config(config: &RedcapConfig) -> Result<Self> {
        let inner = match config.connection_policy {
            ConnectionPolicy::Shared => {
                ProviderInner::Shared(Arc::new(RedcapProject::new(config)?))
            }
            ConnectionPolicy::PerRequest => ProviderInner::PerRequest(Arc::new(config.clone())),
        };

        tracing::debug!(
            policy = ?config.connection_policy,
            "Registry provider initialized"
        );

        Ok(Self { inner })
    }

    /// Always hand out the same project
    pub fn fixed(project: Arc<dyn RegistryProject>) -> Self {
        Self {
            inner: ProviderInner::Shared(project),
        }
    }

    /// Project handle for one unit of work
    pub fn project(&self) -> Result<Arc<dyn RegistryProject>> {
        match &self.inner {
            ProviderInner::Shared(project) => Ok(Arc::clone(project)),
            ProviderInner::PerRequest(config) => Ok(Arc::new(RedcapProject::new(config)?)),
        }
    }

    /// Active connection policy
    pub fn policy(&self) -> ConnectionPolicy {
        match self.inner {
            ProviderInner::Shared(_) => ConnectionPolicy::Shared,
            ProviderInner::PerRequest(_) => ConnectionPolicy::PerRequest,
        }
    }

    /// Verify the registry is reachable and accepts the token
    pub async fn health_check(&self) -> Result<()> {
        let project = self.project()?;
        match project.is_longitudinal().await {
            Ok(longitudinal) => {
                tracing::info!(
                    api_url = project.api_url(),
                    longitudinal = longitudinal,
                    "Registry health check passed"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    api_url = project.api_url(),
                    error = %e,
                    "Registry health check failed"
                );
                Err(e)
            }
        }
    }
}
