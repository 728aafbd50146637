use crate::constants::{endpoints, models};
use crate::error::KbChatError;
use crate::llm::traits::*;
use crate::llm::{FragmentStream, SafetySetting};
use futures::channel::mpsc;
use serde_json::Value;

/// Finish reasons that mean the model refused to produce text.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "OTHER",
];

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    safety_settings: Vec<SafetySetting>,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: models::DEFAULT_GEMINI_MODEL.to_string(),
            base_url: endpoints::GEMINI_BASE_URL.to_string(),
            safety_settings: SafetySetting::permissive(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_safety_settings(mut self, settings: Vec<SafetySetting>) -> Self {
        self.safety_settings = settings;
        self
    }

    pub fn safety_settings(&self) -> &[SafetySetting] {
        &self.safety_settings
    }

    pub fn stream_url(&self) -> String {
        format!(
            "{}/{}/models/{}:{}",
            self.base_url.trim_end_matches('/'),
            endpoints::GEMINI_API_VERSION,
            self.model,
            endpoints::STREAM_METHOD,
        )
    }

    pub fn build_request_body(&self, payload: &str) -> Value {
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": payload }],
            }],
            "safetySettings": self.safety_settings,
        })
    }
}

/// What one decoded SSE chunk means for the fragment sequence.
#[derive(Debug, PartialEq, Eq)]
enum ChunkOutcome {
    Text(String),
    Failed(String),
    Empty,
}

fn parse_chunk(chunk: &Value, saw_text: bool) -> ChunkOutcome {
    if let Some(error) = chunk.get("error") {
        let code = error.get("code").and_then(|c| c.as_u64()).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error");
        return ChunkOutcome::Failed(format!("Gemini API error ({code}): {message}"));
    }

    if let Some(reason) = chunk
        .pointer("/promptFeedback/blockReason")
        .and_then(|r| r.as_str())
    {
        return ChunkOutcome::Failed(format!("prompt blocked: {reason}"));
    }

    let text: String = chunk
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if !text.is_empty() {
        return ChunkOutcome::Text(text);
    }

    if let Some(reason) = chunk
        .pointer("/candidates/0/finishReason")
        .and_then(|r| r.as_str())
    {
        if !saw_text && BLOCKING_FINISH_REASONS.contains(&reason) {
            return ChunkOutcome::Failed(format!("response blocked: {reason}"));
        }
    }

    ChunkOutcome::Empty
}

/// Returns false once the stream has ended (done or failed).
fn process_line(
    line: &str,
    tx: &mpsc::UnboundedSender<StreamEvent>,
    saw_text: &mut bool,
    fragments: &mut usize,
) -> bool {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return true;
    };
    let data = data.trim_start();
    if data.is_empty() {
        return true;
    }
    if data == "[DONE]" {
        let _ = tx.unbounded_send(StreamEvent::Done);
        return false;
    }

    let chunk: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            let _ = tx.unbounded_send(StreamEvent::Error(format!("malformed stream chunk: {e}")));
            return false;
        }
    };

    match parse_chunk(&chunk, *saw_text) {
        ChunkOutcome::Text(text) => {
            *saw_text = true;
            *fragments += 1;
            let _ = tx.unbounded_send(StreamEvent::TextDelta(text));
            true
        }
        ChunkOutcome::Failed(reason) => {
            let _ = tx.unbounded_send(StreamEvent::Error(reason));
            false
        }
        ChunkOutcome::Empty => true,
    }
}

#[async_trait::async_trait]
impl GenerationClient for GeminiClient {
    async fn generate_stream(&self, payload: &str) -> Result<FragmentStream, KbChatError> {
        let url = self.stream_url();
        let request_body = self.build_request_body(payload);

        tracing::debug!(model = %self.model, payload_len = payload.len(), "sending generation request");

        let response = self
            .client
            .post(&url)
            .query(&[("alt", "sse")])
            .header(endpoints::API_KEY_HEADER, &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(KbChatError::generation(format!(
                "Gemini API error ({}): {}",
                status, text
            )));
        }

        let (tx, rx) = mpsc::unbounded();

        let mut stream = response.bytes_stream();
        tokio::spawn(async move {
            use futures::StreamExt;
            // Raw bytes: a multi-byte character may straddle two network chunks.
            let mut buffer: Vec<u8> = Vec::new();
            let mut saw_text = false;
            let mut fragments = 0usize;

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.unbounded_send(StreamEvent::Error(e.to_string()));
                        return;
                    }
                };

                buffer.extend_from_slice(&chunk);

                while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=line_end).collect();
                    let line = String::from_utf8_lossy(&line);
                    if !process_line(&line, &tx, &mut saw_text, &mut fragments) {
                        tracing::debug!(fragments, "stream closed early");
                        return;
                    }
                }
            }

            if !buffer.is_empty() {
                let line = String::from_utf8_lossy(&buffer).into_owned();
                if !process_line(&line, &tx, &mut saw_text, &mut fragments) {
                    return;
                }
            }

            tracing::debug!(fragments, "stream finished");
            let _ = tx.unbounded_send(StreamEvent::Done);
        });

        Ok(FragmentStream::new(rx))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
