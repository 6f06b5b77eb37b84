use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use device_relay_core::channel::ChannelMap;
use device_relay_core::clock::Clock;
use device_relay_core::event::{event_records, StateUpdateEvent};
use device_relay_core::shadow::{shadow_path, shadow_update_accepted, ShadowPayload};
use device_relay_core::signing::{amz_date, RequestToSign, Signer, SigningCredentials};
use device_relay_core::RelayError;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::adapters::http::{HttpRequest, HttpTransport};
use crate::config::ReporterConfig;
use crate::notifier::ChatNotifier;

const SHADOW_TARGET: &str = "iot shadow";

pub const REPORT_SUCCEEDED_TEXT: &str = "Device has set reported state successfully";
pub const REPORT_FAILED_TEXT: &str = "Error: Device failed to set reported state";

/// Updates the reported state of a device's Thing Shadow and mirrors the
/// outcome to the device's chat channel.
pub struct StateReporter {
    signer: Signer,
    endpoint_host: String,
    user_agent: String,
    transport: Arc<dyn HttpTransport>,
    notifier: ChatNotifier,
    clock: Arc<dyn Clock>,
}

impl StateReporter {
    pub fn new(
        config: &ReporterConfig,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let signer = Signer::new(
            SigningCredentials {
                access_key: config.access_key.clone(),
                secret_key: config.secret_key.clone(),
            },
            config.region.clone(),
            config.service.clone(),
        );
        let notifier = ChatNotifier::new(
            config.webhook_url.clone(),
            ChannelMap::with_fallback(config.fallback_channel.clone()),
            transport.clone(),
        );
        Self {
            signer,
            endpoint_host: config.endpoint_host.clone(),
            user_agent: config.user_agent.clone(),
            transport,
            notifier,
            clock,
        }
    }

    /// Process every record of an invocation in order.
    ///
    /// Stops at the first failing record; records before it stay reported.
    /// Returns the shadow service response of the last record.
    pub fn handle_event(&self, event: &Value) -> Result<Value, RelayError> {
        let started_at = Instant::now();
        info!(component = "state_reporter", event = "invocation_started", payload = %event);

        let mut last_response = None;
        let mut processed = 0usize;
        for (index, record) in event_records(event)?.enumerate() {
            let outcome = record
                .and_then(|record| StateUpdateEvent::from_record(&record))
                .and_then(|update| self.report(&update));
            match outcome {
                Ok(response) => {
                    processed += 1;
                    last_response = Some(response);
                }
                Err(relay_error) => {
                    error!(
                        component = "state_reporter",
                        event = "invocation_failed",
                        record_index = index,
                        records_processed = processed,
                        error_code = relay_error.code(),
                        error = %relay_error,
                    );
                    return Err(relay_error);
                }
            }
        }

        info!(
            component = "state_reporter",
            event = "invocation_completed",
            records_processed = processed,
            duration_ms = started_at.elapsed().as_millis() as u64,
        );
        last_response
            .ok_or_else(|| RelayError::MalformedEvent("event contains no records".to_string()))
    }

    /// Report one attribute value for one device.
    pub fn report(&self, update: &StateUpdateEvent) -> Result<Value, RelayError> {
        let now = self.clock.now();
        let path = shadow_path(&update.device)?;
        let payload = ShadowPayload::reported(&update.attribute, &update.value, now)?;
        let pretty = payload.to_pretty();

        info!(
            component = "state_reporter",
            event = "shadow_payload_built",
            device = %update.device,
            payload = %pretty,
        );
        self.notifier.notify(
            &update.device,
            &format!("Sending reported state to device:\n```{pretty}```"),
        );

        let response = self.send_shadow_update(&path, &payload.to_body()?, now)?;
        info!(
            component = "state_reporter",
            event = "shadow_update_response",
            device = %update.device,
            response = %response,
        );

        let status_text = if shadow_update_accepted(&response) {
            REPORT_SUCCEEDED_TEXT
        } else {
            REPORT_FAILED_TEXT
        };
        self.notifier.notify(&update.device, status_text);

        Ok(response)
    }

    fn send_shadow_update(
        &self,
        path: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Value, RelayError> {
        let amz_date = amz_date(now);
        let signed_headers = [
            ("host", self.endpoint_host.as_str()),
            ("user-agent", self.user_agent.as_str()),
            ("x-amz-date", amz_date.as_str()),
        ];
        let signed = self.signer.sign(
            &RequestToSign {
                method: "POST",
                uri: path,
                query: "",
                headers: &signed_headers,
                body: body.as_bytes(),
            },
            now,
        )?;
        debug!(
            component = "state_reporter",
            event = "request_signed",
            canonical_request = %signed.canonical_request,
            string_to_sign = %signed.string_to_sign,
        );

        let url = format!("https://{}{path}", self.endpoint_host);
        let request = HttpRequest::post(&url, body)
            .with_header("Content-Type", "application/json")
            .with_header("Host", &self.endpoint_host)
            .with_header("User-Agent", &self.user_agent)
            .with_header("X-Amz-Date", &signed.amz_date)
            .with_header("Authorization", &signed.authorization);

        info!(component = "state_reporter", event = "shadow_update_sending", url = %url);
        let response = self
            .transport
            .send(&request)
            .map_err(|message| RelayError::upstream(SHADOW_TARGET, message))?;
        if !response.is_success() {
            return Err(RelayError::upstream(
                SHADOW_TARGET,
                format!("status {}: {}", response.status, response.body),
            ));
        }

        serde_json::from_str(&response.body).map_err(|error| {
            RelayError::malformed_response(SHADOW_TARGET, format!("invalid JSON body: {error}"))
        })
    }
}
