#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use device_relay_core::clock::ManualClock;
use device_relay_lambda::adapters::http::{HttpRequest, HttpResponse, HttpTransport};
use device_relay_lambda::config::{DispatcherConfig, ReporterConfig};

pub const ENDPOINT_HOST: &str = "a1p01iym2doza0.iot.us-west-2.amazonaws.com";
pub const WEBHOOK_URL: &str = "https://hooks.example.com/services/T000/B000/xyz";

type Responder = dyn Fn(&HttpRequest) -> Result<HttpResponse, String> + Send + Sync;

/// Transport that records every request and answers from a closure.
pub struct ScriptedTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responder: Box<Responder>,
}

impl ScriptedTransport {
    pub fn new(
        responder: impl Fn(&HttpRequest) -> Result<HttpResponse, String> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    /// Shadow updates succeed with a `metadata` document, chat posts ack `ok`.
    pub fn happy_path() -> Arc<Self> {
        Self::new(|request| {
            if request.url.starts_with(WEBHOOK_URL) {
                Ok(ok("ok"))
            } else {
                Ok(ok(&shadow_accepted_body()))
            }
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("poisoned mutex").clone()
    }

    pub fn shadow_requests(&self) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url.starts_with(&format!("https://{ENDPOINT_HOST}")))
            .collect()
    }

    pub fn chat_texts(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|request| request.url == WEBHOOK_URL)
            .map(|request| {
                let body: serde_json::Value =
                    serde_json::from_str(request.body.as_deref().expect("chat body"))
                        .expect("chat body is JSON");
                body["text"].as_str().expect("text field").to_string()
            })
            .collect()
    }
}

impl HttpTransport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        self.requests
            .lock()
            .expect("poisoned mutex")
            .push(request.clone());
        (self.responder)(request)
    }
}

pub fn ok(body: &str) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: body.to_string(),
    }
}

pub fn shadow_accepted_body() -> String {
    serde_json::json!({
        "state": {"reported": {"led": "on"}},
        "metadata": {"reported": {"led": {"timestamp": 1445160615}}},
        "version": 3,
        "timestamp": 1445160615
    })
    .to_string()
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 10, 18, 9, 30, 15)
        .single()
        .expect("valid timestamp")
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(start_time()))
}

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn reporter_config() -> ReporterConfig {
    ReporterConfig::from_vars(vars(&[
        ("RELAY_ACCESS_KEY", "AKIDEXAMPLE"),
        ("RELAY_SECRET_KEY", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
        ("RELAY_ENDPOINT_HOST", ENDPOINT_HOST),
        ("RELAY_WEBHOOK_URL", WEBHOOK_URL),
    ]))
    .expect("reporter config loads")
}

pub fn dispatcher_config() -> DispatcherConfig {
    DispatcherConfig::from_vars(vars(&[
        ("RELAY_APP_ID", "app-1"),
        ("RELAY_ACCESS_TOKEN", "token-1"),
    ]))
    .expect("dispatcher config loads")
}
