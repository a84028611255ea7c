use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{ChatMessage, LlmError, LlmProvider, LlmResult};
use crate::conversation::PromptRequest;
use crate::http::HttpClient;

const ERROR_BODY_LIMIT: usize = 400;
const STREAM_DONE: &str = "[DONE]";

/// Chat-completions client for OpenAI and API-compatible hosts.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub stream: bool,
}

impl OpenAiProvider {
    pub fn new(http: HttpClient, settings: OpenAiSettings) -> LlmResult<Self> {
        let api_key = settings
            .api_key
            .filter(|v| !v.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        Ok(Self {
            http,
            api_key,
            model: settings.model,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            temperature: settings.temperature,
            stream: settings.stream,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, request: &PromptRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: request.messages(),
            temperature: self.temperature,
            stream: self.stream,
        }
    }

    async fn complete_whole(
        &self,
        payload: &ChatCompletionRequest,
        on_delta: &mut (dyn FnMut(&str) + Send),
    ) -> LlmResult<String> {
        let resp = self.send(payload).await?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|err| {
            self.http.record_failure(&err.to_string());
            LlmError::Transport(err.to_string())
        })?;
        self.http.record_body(&body);

        if !(200..300).contains(&status) {
            return Err(LlmError::HttpStatus {
                status,
                body: truncate_error_body(&body),
            });
        }

        let parsed = serde_json::from_str::<ChatCompletionResponse>(&body)
            .map_err(|err| LlmError::Parse(err.to_string()))?;
        let text = extract_text(parsed)?;
        on_delta(&text);
        Ok(text)
    }

    /// Reads the event stream to its end. Text is handed to `on_delta` as it
    /// arrives, but the aggregate is only returned once the server has
    /// signalled completion with `[DONE]` or a `finish_reason`.
    async fn complete_streaming(
        &self,
        payload: &ChatCompletionRequest,
        on_delta: &mut (dyn FnMut(&str) + Send),
    ) -> LlmResult<String> {
        let resp = self.send(payload).await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            self.http.record_body(&body);
            return Err(LlmError::HttpStatus {
                status,
                body: truncate_error_body(&body),
            });
        }

        let mut events = resp.bytes_stream().eventsource();
        let mut text = String::new();
        let mut finished = false;
        let outcome = loop {
            let Some(event) = events.next().await else {
                break if finished {
                    Ok(())
                } else {
                    Err(LlmError::IncompleteStream(
                        "connection closed before the answer was finished".to_string(),
                    ))
                };
            };
            let data = match event {
                Ok(event) => event.data,
                Err(err) => break Err(LlmError::Transport(err.to_string())),
            };
            let data = data.trim();
            if data == STREAM_DONE {
                break Ok(());
            }
            if data.is_empty() {
                continue;
            }

            let chunk = match serde_json::from_str::<ChatCompletionChunk>(data) {
                Ok(chunk) => chunk,
                Err(err) => break Err(LlmError::Parse(err.to_string())),
            };
            if let Some(error) = chunk.error {
                break Err(LlmError::IncompleteStream(stream_error_message(&error)));
            }
            for choice in chunk.choices {
                if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                    on_delta(&content);
                    text.push_str(&content);
                }
                finished |= choice.finish_reason.is_some();
            }
        };

        self.http.record_body(&text);
        if let Err(err) = outcome {
            self.http.record_failure(&err.to_string());
            return Err(err);
        }
        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }

    async fn send(&self, payload: &ChatCompletionRequest) -> LlmResult<reqwest::Response> {
        self.http
            .post_chat(&self.endpoint(), &self.api_key, payload)
            .await
            .map_err(|err| LlmError::Transport(err.to_string()))
    }
}

impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        request: &PromptRequest,
        on_delta: &mut (dyn FnMut(&str) + Send),
    ) -> LlmResult<String> {
        let payload = self.build_request(request);
        if payload.stream {
            self.complete_streaming(&payload, on_delta).await
        } else {
            self.complete_whole(&payload, on_delta).await
        }
    }
}

fn extract_text(resp: ChatCompletionResponse) -> LlmResult<String> {
    resp.choices
        .into_iter()
        .filter_map(|choice| choice.message.content)
        .find(|text| !text.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)
}

fn stream_error_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map_or_else(|| error.to_string(), ToOwned::to_owned)
}

fn truncate_error_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}
