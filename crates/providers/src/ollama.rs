//! Ollama native provider implementation.
//!
//! Talks to Ollama's own `/api/chat` endpoint rather than its
//! OpenAI-compatible shim. Streaming responses arrive as line-delimited
//! JSON chunks, not SSE.

use async_trait::async_trait;
use futures::StreamExt;
use lodestar_core::error::ProviderError;
use lodestar_core::message::ChatMessage;
use lodestar_core::provider::{GenerateRequest, GenerateResponse, ModelProvider, StreamChunk};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

const DEFAULT_HOST: &str = "http://localhost:11434";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Ollama chat provider.
pub struct OllamaProvider {
    host: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider against the given host.
    pub fn new(host: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        let host = host.into();
        let host = if host.trim().is_empty() {
            DEFAULT_HOST.to_string()
        } else {
            host.trim_end_matches('/').to_string()
        };

        Self { host, client }
    }

    fn build_body(request: &GenerateRequest, stream: bool) -> OllamaChatRequest<'_> {
        OllamaChatRequest {
            model: &request.model,
            messages: &request.messages,
            stream,
            options: OllamaOptions {
                temperature: request.temperature,
                top_p: 0.9,
                num_predict: request.max_tokens,
            },
        }
    }

    fn map_transport_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> std::result::Result<GenerateResponse, ProviderError> {
        let url = format!("{}/api/chat", self.host);
        let body = Self::build_body(&request, false);

        debug!(provider = "ollama", model = %request.model, "Sending chat request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(GenerateResponse {
            content: api_resp.message.content,
            model: if api_resp.model.is_empty() {
                request.model
            } else {
                api_resp.model
            },
        })
    }

    async fn stream_generate(
        &self,
        request: GenerateRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>,
        ProviderError,
    > {
        let url = format!("{}/api/chat", self.host);
        let body = Self::build_body(&request, true);

        debug!(provider = "ollama", model = %request.model, "Sending streaming chat request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // Ollama streams one JSON object per line
                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() {
                        continue;
                    }

                    match serde_json::from_str::<OllamaStreamChunk>(&line) {
                        Ok(chunk) => {
                            let done = chunk.done;
                            let content = chunk.message.map(|m| m.content).filter(|c| !c.is_empty());
                            if tx.send(Ok(StreamChunk { content, done })).await.is_err() {
                                return; // receiver dropped
                            }
                            if done {
                                return;
                            }
                        }
                        Err(e) => {
                            trace!(error = %e, line = %line, "Ignoring unparseable Ollama chunk");
                        }
                    }
                }
            }

            // Stream ended without a done chunk
            let _ = tx
                .send(Ok(StreamChunk {
                    content: None,
                    done: true,
                }))
                .await;
        });

        Ok(rx)
    }
}

// --- Ollama API types (internal) ---

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    message: OllamaMessage,
}

#[derive(Debug, Default, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaStreamChunk {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let provider = OllamaProvider::new("http://ollama.local:11434/");
        assert_eq!(provider.host, "http://ollama.local:11434");
    }

    #[test]
    fn empty_host_falls_back_to_default() {
        let provider = OllamaProvider::new("");
        assert_eq!(provider.host, DEFAULT_HOST);
    }

    #[test]
    fn request_body_serialization() {
        let request = GenerateRequest::new(
            "llama3.2",
            vec![ChatMessage::system("Be brief."), ChatMessage::user("hi")],
        )
        .with_temperature(0.1)
        .with_max_tokens(256);

        let body = OllamaProvider::build_body(&request, false);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert!((json["options"]["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert_eq!(json["options"]["num_predict"], 256);
    }

    #[test]
    fn request_body_omits_num_predict_when_unset() {
        let request = GenerateRequest::new("llama3.2", vec![ChatMessage::user("hi")]);
        let body = OllamaProvider::build_body(&request, true);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["options"].get("num_predict").is_none());
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn parse_chat_response() {
        let resp: OllamaChatResponse = serde_json::from_str(
            r#"{"model":"llama3.2","message":{"role":"assistant","content":"Paris."},"done":true}"#,
        )
        .unwrap();
        assert_eq!(resp.message.content, "Paris.");
        assert_eq!(resp.model, "llama3.2");
    }

    #[test]
    fn parse_stream_chunks() {
        let chunk: OllamaStreamChunk = serde_json::from_str(
            r#"{"model":"llama3.2","message":{"role":"assistant","content":"Par"},"done":false}"#,
        )
        .unwrap();
        assert_eq!(chunk.message.unwrap().content, "Par");
        assert!(!chunk.done);

        let last: OllamaStreamChunk = serde_json::from_str(
            r#"{"model":"llama3.2","message":{"role":"assistant","content":""},"done":true}"#,
        )
        .unwrap();
        assert!(last.done);
    }
}
