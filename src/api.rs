use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::config::API_KEY_ENV;
use crate::errors::{CliError, redact_secret, with_debug_hint};
use crate::parse::response::{Completion, extract_completion};
use crate::parse::stream::CompletionStream;
use crate::prompts::ChatMessage;

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    stream: bool,
    debug: bool,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

impl ApiClient {
    /// `timeout_ms == 0` leaves requests unbounded.
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        model: String,
        stream: bool,
        timeout_ms: u64,
        debug: bool,
    ) -> Result<Self, CliError> {
        let mut builder = Client::builder();
        if timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        Ok(Self {
            client: builder.build()?,
            endpoint,
            api_key,
            model,
            stream,
            debug,
        })
    }

    /// Send one prompt and wait for the whole completion. Errors are logged
    /// once here and handed back untouched; nothing is retried.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, CliError> {
        let started = Instant::now();
        let result = self.send(messages).await;
        match &result {
            Ok(completion) => debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                chars = completion.content.chars().count(),
                "completion received"
            ),
            Err(err) => error!(endpoint = %self.endpoint, "completion request failed: {err}"),
        }
        result
    }

    async fn send(&self, messages: &[ChatMessage]) -> Result<Completion, CliError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            CliError::Configuration(format!(
                "Missing {API_KEY_ENV}. Export it or run `intellistudy config set apiKey <key>`."
            ))
        })?;

        let body = CompletionRequest {
            model: &self.model,
            messages,
            stream: self.stream,
        };
        debug!(model = %self.model, messages = messages.len(), stream = self.stream, "sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                let message = if err.is_timeout() {
                    "Request timed out.".to_string()
                } else {
                    format!("Network request failed: {err}")
                };
                CliError::Network(with_debug_hint(&message, self.debug))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.http_error(status, &text));
        }

        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("text/event-stream"));

        if is_event_stream {
            let mut stream = CompletionStream::new();
            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                stream.feed(&chunk);
                if stream.is_finished() {
                    break;
                }
            }
            if stream.skipped() > 0 {
                debug!(skipped = stream.skipped(), "ignored malformed stream fragments");
            }
            return Ok(stream.finish());
        }

        let text = response.text().await?;
        extract_completion(&text).ok_or_else(|| {
            CliError::Upstream(with_debug_hint(
                "The model response was not a chat completion.",
                self.debug,
            ))
        })
    }

    fn http_error(&self, status: StatusCode, body: &str) -> CliError {
        let payload = serde_json::from_str::<Value>(body).unwrap_or(Value::Null);
        let message = payload
            .get("error")
            .and_then(|v| v.as_str().or_else(|| v.get("message").and_then(|m| m.as_str())))
            .or_else(|| payload.get("message").and_then(|v| v.as_str()))
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("API request failed with status {}", status.as_u16()));

        let details = if self.debug {
            let mut raw = body.to_string();
            if let Some(key) = &self.api_key {
                raw = raw.replace(key, &redact_secret(key));
            }
            format!("{message} (status {}) payload={raw}", status.as_u16())
        } else {
            with_debug_hint(&message, false)
        };
        CliError::Upstream(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::prompts;

    fn client(server: &MockServer, key: Option<&str>, stream: bool) -> ApiClient {
        ApiClient::new(
            format!("{}/api/chat", server.uri()),
            key.map(str::to_string),
            "qwen3-32b".to_string(),
            stream,
            5_000,
            false,
        )
        .unwrap()
    }

    fn sse(pieces: &[&str]) -> String {
        let mut body = String::new();
        for piece in pieces {
            let chunk = serde_json::json!({ "choices": [{ "delta": { "content": piece } }] });
            body.push_str(&format!("data: {chunk}\n\n"));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server, None, true)
            .complete(&prompts::summarize("text"))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Configuration(_)));
    }

    #[tokio::test]
    async fn json_response_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "qwen3-32b",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cmpl-1",
                "model": "qwen3-32b",
                "choices": [{ "index": 0, "message": { "role": "assistant", "content": "A short summary." } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = client(&server, Some("test-key"), false)
            .complete(&prompts::summarize("long text"))
            .await
            .unwrap();
        assert_eq!(completion.content, "A short summary.");
    }

    #[tokio::test]
    async fn event_stream_is_reassembled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({ "stream": true })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    sse(&["**Intelli", "Bot** here", " to help"]),
                    "text/event-stream; charset=utf-8",
                ),
            )
            .mount(&server)
            .await;

        let completion = client(&server, Some("k"), true)
            .complete(&prompts::chat("hi", &[]))
            .await
            .unwrap();
        assert_eq!(completion.content, "**IntelliBot** here to help");
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(serde_json::json!({ "error": "rate limited" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, Some("k"), true)
            .complete(&prompts::summarize("x"))
            .await
            .unwrap_err();
        match err {
            CliError::Upstream(message) => assert!(message.starts_with("rate limited")),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_body_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server, Some("k"), false)
            .complete(&prompts::summarize("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Upstream(_)));
    }
}
