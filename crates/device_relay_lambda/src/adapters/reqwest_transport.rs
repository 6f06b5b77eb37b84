use reqwest::blocking::Client;

use super::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

/// [`HttpTransport`] over reqwest's blocking client.
///
/// Must be created and used off the async executor threads (inside
/// `tokio::task::block_in_place` when called from a Lambda handler).
#[derive(Debug, Clone)]
pub struct BlockingHttpTransport {
    client: Client,
}

impl BlockingHttpTransport {
    pub fn new() -> Result<Self, String> {
        let client = Client::builder()
            .build()
            .map_err(|error| format!("failed to build HTTP client: {error}"))?;
        Ok(Self { client })
    }
}

impl HttpTransport for BlockingHttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(|error| {
            format!(
                "{} request failed: {}",
                request.method.as_str(),
                error.without_url()
            )
        })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|error| format!("failed to read response body: {}", error.without_url()))?;

        Ok(HttpResponse { status, body })
    }
}
