//! Client-facing response envelopes.
//!
//! Both upstream flavors are normalized into these shapes before anything
//! reaches the client: [`ChatCompletion`] for a whole turn,
//! [`ChatCompletionChunk`] for one streaming delta frame.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::message::{ChatMessage, Role};

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    #[default]
    Stop,
    Length,
    ContentFilter,
}

impl FinishReason {
    /// Parse an upstream finish reason, defaulting to `Stop` for anything
    /// unrecognized.
    pub fn parse(tag: &str) -> FinishReason {
        match tag {
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        }
    }
}

/// The single normalized reply shape both upstream flavors converge to.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedChatResponse {
    pub role: Role,
    pub content: String,
    pub finish_reason: FinishReason,
}

impl UnifiedChatResponse {
    pub fn into_message(self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content,
        }
    }
}

/// Non-streaming reply envelope sent to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: FinishReason,
}

impl ChatCompletion {
    pub fn new(model: &str, message: ChatMessage, finish_reason: FinishReason) -> Self {
        let now = Utc::now();
        Self {
            id: format!("chatcmpl_{}", now.timestamp_millis()),
            object: "chat.completion".to_string(),
            created: now.timestamp(),
            model: model.to_string(),
            choices: vec![ChatChoice {
                index: 0,
                message,
                finish_reason,
            }],
        }
    }
}

/// One streaming delta frame sent to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    /// Serialized as an explicit `null` on content frames; clients key off
    /// its presence to detect the synthetic stop frame.
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    fn envelope(model: &str, choice: ChunkChoice) -> Self {
        let now = Utc::now();
        Self {
            id: format!("chatcmpl_{}", now.timestamp_millis()),
            object: "chat.completion.chunk".to_string(),
            created: now.timestamp(),
            model: model.to_string(),
            choices: vec![choice],
        }
    }

    /// A content-bearing delta frame.
    pub fn delta(model: &str, content: impl Into<String>) -> Self {
        Self::envelope(
            model,
            ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    content: Some(content.into()),
                },
                finish_reason: None,
            },
        )
    }

    /// The synthetic stop frame emitted just before the done marker.
    pub fn stop(model: &str) -> Self {
        Self::envelope(
            model,
            ChunkChoice {
                index: 0,
                delta: ChunkDelta::default(),
                finish_reason: Some(FinishReason::Stop),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_envelope_shape() {
        let completion =
            ChatCompletion::new("gpt-oss:20b", ChatMessage::assistant("hi"), FinishReason::Stop);
        let wire = serde_json::to_value(&completion).expect("serialize");

        assert_eq!(wire["object"], "chat.completion");
        assert_eq!(wire["model"], "gpt-oss:20b");
        assert_eq!(wire["choices"][0]["index"], 0);
        assert_eq!(wire["choices"][0]["message"]["content"], "hi");
        assert_eq!(wire["choices"][0]["finish_reason"], "stop");
        assert!(wire["id"].as_str().expect("id").starts_with("chatcmpl_"));
    }

    #[test]
    fn test_delta_frame_has_null_finish_reason() {
        let chunk = ChatCompletionChunk::delta("m", "tok");
        let wire = serde_json::to_value(&chunk).expect("serialize");

        assert_eq!(wire["object"], "chat.completion.chunk");
        assert_eq!(wire["choices"][0]["delta"]["content"], "tok");
        assert!(wire["choices"][0]["finish_reason"].is_null());
    }

    #[test]
    fn test_stop_frame_has_empty_delta() {
        let chunk = ChatCompletionChunk::stop("m");
        let wire = serde_json::to_value(&chunk).expect("serialize");

        assert_eq!(wire["choices"][0]["finish_reason"], "stop");
        assert!(wire["choices"][0]["delta"].as_object().expect("delta").is_empty());
    }

    #[test]
    fn test_finish_reason_parse_defaults_to_stop() {
        assert_eq!(FinishReason::parse("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::parse("length"), FinishReason::Length);
        assert_eq!(FinishReason::parse("whatever"), FinishReason::Stop);
    }
}
