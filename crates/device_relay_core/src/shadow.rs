use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;

pub const TIMESTAMP_KEY: &str = "timestamp";

/// Marker whose presence in a shadow update response is taken as success.
pub const SHADOW_ACCEPTED_MARKER: &str = "metadata";

/// `{state: {reported: {<attribute>: <value>, timestamp}}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShadowPayload {
    pub state: ShadowState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShadowState {
    pub reported: BTreeMap<String, String>,
}

impl ShadowPayload {
    /// Report a single attribute, stamped with `timestamp`.
    pub fn reported(
        attribute: &str,
        value: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, RelayError> {
        if attribute.is_empty() {
            return Err(RelayError::MalformedEvent(
                "attribute name cannot be empty".to_string(),
            ));
        }
        if attribute == TIMESTAMP_KEY {
            return Err(RelayError::MalformedEvent(format!(
                "attribute name '{TIMESTAMP_KEY}' is reserved"
            )));
        }

        let reported = BTreeMap::from([
            (attribute.to_string(), value.to_string()),
            (
                TIMESTAMP_KEY.to_string(),
                timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            ),
        ]);
        Ok(Self {
            state: ShadowState { reported },
        })
    }

    pub fn to_body(&self) -> Result<String, RelayError> {
        serde_json::to_string(self)
            .map_err(|error| RelayError::MalformedEvent(format!("shadow payload: {error}")))
    }

    pub fn to_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// REST path of a device's Thing Shadow.
///
/// Thing names are restricted to `[A-Za-z0-9:_-]`, so the path never needs
/// percent-encoding before it goes into the canonical request.
pub fn shadow_path(device: &str) -> Result<String, RelayError> {
    let valid = !device.is_empty()
        && device
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '-'));
    if !valid {
        return Err(RelayError::MalformedEvent(format!(
            "invalid thing name: {device:?}"
        )));
    }
    Ok(format!("/things/{device}/shadow"))
}

/// Substring heuristic on the serialized response, not a status check.
pub fn shadow_update_accepted(response: &Value) -> bool {
    response.to_string().contains(SHADOW_ACCEPTED_MARKER)
}
