use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

mod error;

use crate::auth::{AccessController, Options, SchemeRegistry};
pub use error::Error;

#[derive(Clone, Debug, Deserialize)]
pub struct Configuration {
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: BTreeMap<String, Options>, // hashmap of scheme name <-> scheme options
    #[serde(default)]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    pub bind_address: IpAddr,
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
    #[serde(default = "ServerConfig::default_query_timeout")]
    pub query_timeout: u64,
    #[serde(default = "ServerConfig::default_query_timeout_grace_period")]
    pub query_timeout_grace_period: u64,
    pub tls: Option<ServerTlsConfig>,
}

impl ServerConfig {
    fn default_port() -> u16 {
        8000
    }

    fn default_query_timeout() -> u64 {
        3600
    }

    fn default_query_timeout_grace_period() -> u64 {
        60
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerTlsConfig {
    pub server_certificate_bundle: String,
    pub server_private_key: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub tracing: Option<TracingConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TracingConfig {
    pub endpoint: String,
    pub sampling_rate: f64,
}

impl Configuration {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let config_str = fs::read_to_string(path)?;
        Self::load_from_str(&config_str)
    }

    pub fn load_from_str(slice: &str) -> Result<Self, Error> {
        let config: Configuration = toml::from_str(slice).map_err(|e| {
            println!("Configuration file format error:");
            println!("{e}");
            Error::ConfigurationFileFormat(e.to_string())
        })?;

        if config.auth.len() > 1 {
            let schemes = config.auth.keys().cloned().collect::<Vec<_>>();
            return Err(Error::MultipleAuthSchemes(schemes.join(", ")));
        }

        Ok(config)
    }

    /// Builds the access controller of the configured auth scheme, if any.
    pub fn access_controller(
        &self,
        registry: &SchemeRegistry,
    ) -> Result<Option<Arc<dyn AccessController>>, Error> {
        let Some((scheme, options)) = self.auth.iter().next() else {
            tracing::warn!("No auth scheme configured, all requests are allowed");
            return Ok(None);
        };

        tracing::info!("Using '{scheme}' access controller");
        let controller = registry.build(scheme, options)?;
        Ok(Some(controller))
    }
}
