//! Transport to the engine bridge.

use async_trait::async_trait;
use futures_util::StreamExt;

use storypulse_protocol::{ChatCompletion, ChatCompletionChunk, ChatRequest};

/// Default engine address for local development.
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:4000";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("server returned status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Port for one complete chat turn against the bridge.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatCompletion, TransportError>;
}

/// HTTP implementation talking to the engine's `/api/chat` endpoints.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Stream a chat turn, invoking `on_token` for each content delta.
    ///
    /// Frames arrive as `data: <chunk json>` blocks separated by blank
    /// lines, with `: ping` comments interleaved; the stream ends at the
    /// `data: [DONE]` marker. Reads are buffered so a frame split across
    /// network reads is reassembled rather than lost.
    pub async fn stream_chat(
        &self,
        mut request: ChatRequest,
        mut on_token: impl FnMut(&str) + Send,
    ) -> Result<(), TransportError> {
        request.stream = true;
        let response = self
            .client
            .post(format!("{}/api/chat/stream", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|error| TransportError::Request(error.to_string()))?;
        let response = check_status(response).await?;

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|error| TransportError::Request(error.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(chunk.as_ref()));

            while let Some(boundary) = buffer.find("\n\n") {
                let frame: String = buffer.drain(..boundary + 2).collect();
                for line in frame.lines() {
                    let Some(data) = line.trim().strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data == "[DONE]" {
                        return Ok(());
                    }
                    let Ok(chunk) = serde_json::from_str::<ChatCompletionChunk>(data) else {
                        continue;
                    };
                    if let Some(content) = chunk
                        .choices
                        .first()
                        .and_then(|choice| choice.delta.content.as_deref())
                        .filter(|content| !content.is_empty())
                    {
                        on_token(content);
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_ENGINE_URL)
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn chat(&self, request: ChatRequest) -> Result<ChatCompletion, TransportError> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|error| TransportError::Request(error.to_string()))?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|error| TransportError::InvalidResponse(error.to_string()))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        status: status.as_u16(),
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let transport = HttpTransport::new("http://localhost:4000/");
        assert_eq!(transport.base_url, "http://localhost:4000");
    }
}
