use std::sync::Arc;

use device_relay_core::clock::Clock;
use device_relay_core::cooldown::CooldownStore;
use device_relay_core::event::{event_records, CallEvent};
use device_relay_core::phone::normalize_phone;
use device_relay_core::RelayError;
use reqwest::Url;
use serde_json::Value;
use tracing::{error, info};

use crate::adapters::http::{HttpRequest, HttpTransport};
use crate::config::DispatcherConfig;

const TELEPHONY_TARGET: &str = "telephony";

/// Literal the provider puts in the body of an accepted call request.
pub const CALL_ACCEPTED_MARKER: &str = "success_ok";

const REDACTED: &str = "<redacted>";

/// Places automated voice calls, at most one per number per cooldown window.
pub struct CallDispatcher {
    app_id: String,
    access_token: String,
    telephony_url: String,
    country_code: String,
    transport: Arc<dyn HttpTransport>,
    cooldowns: Arc<dyn CooldownStore>,
    clock: Arc<dyn Clock>,
}

impl CallDispatcher {
    pub fn new(
        config: &DispatcherConfig,
        transport: Arc<dyn HttpTransport>,
        cooldowns: Arc<dyn CooldownStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            app_id: config.app_id.clone(),
            access_token: config.access_token.clone(),
            telephony_url: config.telephony_url.clone(),
            country_code: config.country_code.clone(),
            transport,
            cooldowns,
            clock,
        }
    }

    /// Dispatch every call request of an invocation in order and return the
    /// provider response of the last one.
    pub fn handle_event(&self, event: &Value) -> Result<String, RelayError> {
        let mut last_response = None;
        for (index, record) in event_records(event)?.enumerate() {
            let outcome = record
                .and_then(|record| CallEvent::from_record(&record))
                .and_then(|call| self.dispatch(&call));
            match outcome {
                Ok(response) => last_response = Some(response),
                Err(relay_error) => {
                    error!(
                        component = "call_dispatcher",
                        event = "invocation_failed",
                        record_index = index,
                        error_code = relay_error.code(),
                        error = %relay_error,
                    );
                    return Err(relay_error);
                }
            }
        }

        last_response
            .ok_or_else(|| RelayError::MalformedEvent("event contains no records".to_string()))
    }

    pub fn dispatch(&self, call: &CallEvent) -> Result<String, RelayError> {
        let phone = normalize_phone(&call.phone, &self.country_code);
        let now = self.clock.now();

        info!(
            component = "call_dispatcher",
            event = "cooldown_check",
            phone = %phone,
            last_sent = ?self.cooldowns.last_attempt(&phone),
        );
        self.cooldowns.try_acquire(&phone, now)?;

        let url = self.call_url(&phone, &call.message, &self.access_token)?;
        let logged_url = self.call_url(&phone, &call.message, REDACTED)?;
        info!(
            component = "call_dispatcher",
            event = "call_request_sending",
            url = %logged_url,
        );

        let response = self
            .transport
            .send(&HttpRequest::get(url))
            .map_err(|message| RelayError::upstream(TELEPHONY_TARGET, message))?;
        if !response.is_success() {
            return Err(RelayError::upstream(
                TELEPHONY_TARGET,
                format!("status {}: {}", response.status, response.body),
            ));
        }
        if !response.body.contains(CALL_ACCEPTED_MARKER) {
            return Err(RelayError::malformed_response(TELEPHONY_TARGET, response.body));
        }

        info!(
            component = "call_dispatcher",
            event = "call_request_accepted",
            phone = %phone,
            response = %response.body,
        );
        Ok(response.body)
    }

    fn call_url(
        &self,
        dest: &str,
        message: &str,
        access_token: &str,
    ) -> Result<String, RelayError> {
        let mut url = Url::parse(&self.telephony_url).map_err(|error| {
            RelayError::Configuration(format!("invalid telephony URL: {error}"))
        })?;
        url.query_pairs_mut()
            .append_pair("app_id", &self.app_id)
            .append_pair("access_token", access_token)
            .append_pair("dest", dest)
            .append_pair("msg", message);
        Ok(url.into())
    }
}
