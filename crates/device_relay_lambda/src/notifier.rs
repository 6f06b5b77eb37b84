use std::sync::Arc;

use device_relay_core::channel::{ChannelMap, ChatMessage};
use tracing::{debug, info, warn};

use crate::adapters::http::{HttpRequest, HttpTransport};

/// Best-effort chat webhook poster. Delivery problems are logged and
/// swallowed so they never fail the calling invocation.
pub struct ChatNotifier {
    webhook_url: String,
    channels: ChannelMap,
    transport: Arc<dyn HttpTransport>,
}

impl ChatNotifier {
    pub fn new(
        webhook_url: impl Into<String>,
        channels: ChannelMap,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            channels,
            transport,
        }
    }

    /// Post `text` to the device's channel as the device. Returns the
    /// webhook acknowledgment when delivery succeeded.
    pub fn notify(&self, device: &str, text: &str) -> Option<String> {
        let message = self.channels.message_for(device, text);
        self.post(&message)
    }

    fn post(&self, message: &ChatMessage) -> Option<String> {
        info!(
            component = "chat_notifier",
            event = "chat_post",
            channel = %message.channel,
            username = %message.username,
            text = %message.text,
        );

        let body = match serde_json::to_string(message) {
            Ok(body) => body,
            Err(error) => {
                warn!(component = "chat_notifier", event = "chat_post_failed", error = %error);
                return None;
            }
        };

        let request = HttpRequest::post(&self.webhook_url, body)
            .with_header("Content-Type", "application/json");
        match self.transport.send(&request) {
            Ok(response) if response.is_success() => {
                debug!(
                    component = "chat_notifier",
                    event = "chat_post_acknowledged",
                    status = response.status,
                    result = %response.body,
                );
                Some(response.body)
            }
            Ok(response) => {
                warn!(
                    component = "chat_notifier",
                    event = "chat_post_failed",
                    status = response.status,
                    error = %response.body,
                );
                None
            }
            Err(error) => {
                warn!(component = "chat_notifier", event = "chat_post_failed", error = %error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::{json, Value};

    use super::*;
    use crate::adapters::http::{HttpMethod, HttpResponse};

    struct CapturingTransport {
        requests: Mutex<Vec<HttpRequest>>,
        outcome: Result<HttpResponse, String>,
    }

    impl CapturingTransport {
        fn new(outcome: Result<HttpResponse, String>) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                outcome,
            }
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().expect("poisoned mutex").clone()
        }
    }

    impl HttpTransport for CapturingTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
            self.requests
                .lock()
                .expect("poisoned mutex")
                .push(request.clone());
            self.outcome.clone()
        }
    }

    fn notifier(transport: Arc<CapturingTransport>) -> ChatNotifier {
        ChatNotifier::new(
            "https://hooks.example.com/services/x",
            ChannelMap::default(),
            transport,
        )
    }

    #[test]
    fn posts_channel_username_and_text() {
        let transport = Arc::new(CapturingTransport::new(Ok(HttpResponse {
            status: 200,
            body: "ok".to_string(),
        })));

        let ack = notifier(transport.clone()).notify("g88_pi", "Device has set reported state");
        assert_eq!(ack.as_deref(), Some("ok"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].url, "https://hooks.example.com/services/x");
        let body: Value =
            serde_json::from_str(requests[0].body.as_deref().expect("body")).expect("json body");
        assert_eq!(
            body,
            json!({
                "channel": "#g88a",
                "username": "g88_pi",
                "text": "Device has set reported state",
            })
        );
    }

    #[test]
    fn transport_failure_is_swallowed() {
        let transport = Arc::new(CapturingTransport::new(Err("connection reset".to_string())));
        assert_eq!(notifier(transport).notify("hall_light", "hello"), None);
    }

    #[test]
    fn error_status_is_swallowed() {
        let transport = Arc::new(CapturingTransport::new(Ok(HttpResponse {
            status: 404,
            body: "channel_not_found".to_string(),
        })));
        assert_eq!(notifier(transport).notify("hall_light", "hello"), None);
    }
}
