//! Environment configuration for the two relay functions.
//!
//! Every option is read from a `RELAY_`-prefixed variable, e.g.
//! `RELAY_ACCESS_KEY` or `RELAY_ENDPOINT_HOST`.

use std::collections::HashMap;
use std::fmt;

use config::{Config, Environment};
use device_relay_core::channel::DEFAULT_FALLBACK_CHANNEL;
use device_relay_core::cooldown::DEFAULT_COOLDOWN_SECS;
use device_relay_core::phone::DEFAULT_COUNTRY_CODE;
use device_relay_core::RelayError;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const ENV_PREFIX: &str = "RELAY";

#[derive(Clone, Deserialize)]
pub struct ReporterConfig {
    pub access_key: String,
    pub secret_key: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_service")]
    pub service: String,

    /// Account-specific IoT data endpoint, without scheme.
    pub endpoint_host: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    pub webhook_url: String,

    /// Channel for devices whose id has no `<group>_` prefix.
    #[serde(default = "default_fallback_channel")]
    pub fallback_channel: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Clone, Deserialize)]
pub struct DispatcherConfig {
    pub app_id: String,
    pub access_token: String,

    #[serde(default = "default_telephony_url")]
    pub telephony_url: String,

    #[serde(default = "default_country_code")]
    pub country_code: String,

    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_service() -> String {
    "iotdata".to_string()
}

fn default_user_agent() -> String {
    "TP-IoT".to_string()
}

fn default_fallback_channel() -> String {
    DEFAULT_FALLBACK_CHANNEL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_telephony_url() -> String {
    "https://secure.hoiio.com/open/ivr/start/dial".to_string()
}

fn default_country_code() -> String {
    DEFAULT_COUNTRY_CODE.to_string()
}

fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN_SECS
}

impl ReporterConfig {
    pub fn from_env() -> Result<Self, RelayError> {
        load::<Self>(None)?.validated()
    }

    /// Load from an explicit variable map instead of the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, RelayError> {
        load::<Self>(Some(vars))?.validated()
    }

    fn validated(self) -> Result<Self, RelayError> {
        require("access_key", &self.access_key)?;
        require("secret_key", &self.secret_key)?;
        require("region", &self.region)?;
        require("service", &self.service)?;
        require("endpoint_host", &self.endpoint_host)?;
        require("webhook_url", &self.webhook_url)?;
        if self.endpoint_host.contains("://") || self.endpoint_host.contains('/') {
            return Err(RelayError::Configuration(
                "endpoint_host must be a bare host name".to_string(),
            ));
        }
        Ok(self)
    }
}

impl DispatcherConfig {
    pub fn from_env() -> Result<Self, RelayError> {
        load::<Self>(None)?.validated()
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, RelayError> {
        load::<Self>(Some(vars))?.validated()
    }

    fn validated(self) -> Result<Self, RelayError> {
        require("app_id", &self.app_id)?;
        require("access_token", &self.access_token)?;
        require("telephony_url", &self.telephony_url)?;
        Ok(self)
    }
}

fn load<T: DeserializeOwned>(vars: Option<HashMap<String, String>>) -> Result<T, RelayError> {
    Config::builder()
        .add_source(Environment::with_prefix(ENV_PREFIX).source(vars))
        .build()
        .and_then(|config| config.try_deserialize())
        .map_err(|error| RelayError::Configuration(error.to_string()))
}

fn require(name: &str, value: &str) -> Result<(), RelayError> {
    if value.trim().is_empty() {
        return Err(RelayError::Configuration(format!(
            "{ENV_PREFIX}_{} must be configured",
            name.to_ascii_uppercase()
        )));
    }
    Ok(())
}

impl fmt::Debug for ReporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("service", &self.service)
            .field("endpoint_host", &self.endpoint_host)
            .field("user_agent", &self.user_agent)
            .field("webhook_url", &"<redacted>")
            .field("fallback_channel", &self.fallback_channel)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl fmt::Debug for DispatcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherConfig")
            .field("app_id", &self.app_id)
            .field("access_token", &"<redacted>")
            .field("telephony_url", &self.telephony_url)
            .field("country_code", &self.country_code)
            .field("cooldown_secs", &self.cooldown_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}
