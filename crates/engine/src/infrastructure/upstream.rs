//! Upstream model dispatch.
//!
//! Two upstream wire shapes are supported, selected once at startup from
//! the configured URL: the OpenAI-compatible `/v1/chat/completions` API
//! and the native chat API (Ollama style). Outgoing payloads are shaped
//! per flavor; replies from either flavor are normalized into one
//! [`UnifiedChatResponse`] before anything downstream sees them.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::{json, Map, Value};

use storypulse_domain::extract_first_json_object;
use storypulse_protocol::{
    ChatMessage, ChatRequest, FinishReason, ModelRequestAdapter, Role, UnifiedChatResponse,
    DEFAULT_TEMPERATURE, STUBBORN_TEMPERATURE_CEILING,
};

use crate::config::UpstreamFlavor;
use crate::infrastructure::ports::DispatchError;

/// Token limit sent to v1 upstreams when the caller does not set one.
pub const DEFAULT_MAX_TOKENS: u32 = 600;

/// Deadline for non-streaming requests. Streaming requests carry no
/// deadline at all; generation length is unknown and liveness is handled
/// by the SSE heartbeat instead.
pub const REQUEST_TIMEOUT_SECS: u64 = 90;

/// A chat turn after model resolution and adapter rewriting, ready to be
/// shaped into either upstream payload.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub wants_json: bool,
    pub force_plain: bool,
    pub stubborn: bool,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub num_ctx: Option<u32>,
    pub num_batch: Option<u32>,
}

impl DispatchRequest {
    /// Resolve the target model, run the message sequence through the
    /// request adapter, and carry the caller's sampling parameters along.
    pub fn prepare(
        request: ChatRequest,
        adapter: &ModelRequestAdapter,
        default_model: &str,
    ) -> Self {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| default_model.to_string());
        let wants_json = request.wants_json();
        let stubborn = adapter.is_stubborn(&model);
        let adapted = adapter.adapt(&model, request.messages, wants_json);

        Self {
            model,
            messages: adapted.messages,
            wants_json,
            force_plain: adapted.force_plain,
            stubborn,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            num_ctx: request.num_ctx,
            num_batch: request.num_batch,
        }
    }
}

/// Client for the configured upstream model API.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    url: String,
    flavor: UpstreamFlavor,
    api_key: Option<String>,
}

impl UpstreamClient {
    pub fn new(url: &str, flavor: UpstreamFlavor, api_key: Option<String>) -> Self {
        // No client-level timeout: the streaming path is unbounded by
        // design, and the non-streaming path sets its own per-request
        // deadline.
        Self {
            client: Client::new(),
            url: url.to_string(),
            flavor,
            api_key,
        }
    }

    pub fn flavor(&self) -> UpstreamFlavor {
        self.flavor
    }

    /// One complete chat turn against the upstream, normalized.
    pub async fn dispatch(
        &self,
        request: &DispatchRequest,
    ) -> Result<UnifiedChatResponse, DispatchError> {
        let payload = build_payload(self.flavor, request, false);
        tracing::debug!(
            model = %request.model,
            flavor = %self.flavor.as_str(),
            wants_json = request.wants_json,
            "dispatching chat request"
        );

        let response = self
            .post(&payload)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await
            .map_err(map_send_error)?;
        let response = check_status(response).await?;

        let value: Value = response
            .json()
            .await
            .map_err(|error| DispatchError::InvalidResponse(error.to_string()))?;

        let mut reply = normalize_reply(&value);
        if request.wants_json {
            rescue_json_content(&mut reply);
        }
        Ok(reply)
    }

    /// Start a streaming chat turn. Returns the live upstream response;
    /// the caller feeds its byte stream through the reframer. Non-2xx
    /// responses are surfaced as dispatch failures before any bytes flow.
    pub async fn dispatch_stream(
        &self,
        request: &DispatchRequest,
    ) -> Result<reqwest::Response, DispatchError> {
        let payload = build_payload(self.flavor, request, true);
        tracing::debug!(
            model = %request.model,
            flavor = %self.flavor.as_str(),
            "dispatching streaming chat request"
        );

        let response = self.post(&payload).send().await.map_err(map_send_error)?;
        check_status(response).await
    }

    fn post(&self, payload: &Value) -> RequestBuilder {
        let mut builder = self.client.post(&self.url).json(payload);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }
}

/// Shape a dispatch request into the upstream payload for `flavor`.
fn build_payload(flavor: UpstreamFlavor, request: &DispatchRequest, stream: bool) -> Value {
    match flavor {
        UpstreamFlavor::V1 => {
            let mut payload = json!({
                "model": request.model,
                "messages": request.messages,
                "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                "temperature": v1_temperature(request),
                "stream": stream,
            });
            if request.wants_json && !request.force_plain {
                payload["response_format"] = json!({"type": "json_object"});
            }
            payload
        }
        UpstreamFlavor::Native => {
            let mut payload = json!({
                "model": request.model,
                "messages": request.messages,
                "stream": stream,
            });
            if let Some(options) = native_options(request) {
                payload["options"] = options;
            }
            if request.wants_json && !request.force_plain {
                payload["format"] = json!("json");
            }
            payload
        }
    }
}

fn v1_temperature(request: &DispatchRequest) -> f32 {
    let temperature = request.temperature.unwrap_or(DEFAULT_TEMPERATURE);
    if request.stubborn {
        temperature.min(STUBBORN_TEMPERATURE_CEILING)
    } else {
        temperature
    }
}

/// Translate generic sampling parameters into the native options bag.
/// Only explicitly provided fields are forwarded; absent fields are
/// omitted entirely so the upstream's own defaults apply.
fn native_options(request: &DispatchRequest) -> Option<Value> {
    let mut options = Map::new();
    if let Some(temperature) = request.temperature {
        let temperature = if request.stubborn {
            temperature.min(STUBBORN_TEMPERATURE_CEILING)
        } else {
            temperature
        };
        options.insert("temperature".into(), json!(temperature));
    }
    if let Some(top_p) = request.top_p {
        options.insert("top_p".into(), json!(top_p));
    }
    if let Some(max_tokens) = request.max_tokens {
        options.insert("num_predict".into(), json!(max_tokens));
    }
    if let Some(num_ctx) = request.num_ctx {
        options.insert("num_ctx".into(), json!(num_ctx));
    }
    if let Some(num_batch) = request.num_batch {
        options.insert("num_batch".into(), json!(num_batch));
    }

    if options.is_empty() {
        None
    } else {
        Some(Value::Object(options))
    }
}

/// Normalize any of the three observed reply shapes into one envelope:
/// v1 `choices`, native chat `message` + `done`, native generate
/// `response`. Rendered thought content is stripped before the message is
/// handed any further.
fn normalize_reply(value: &Value) -> UnifiedChatResponse {
    let (message, finish_reason) =
        if let Some(choice) = value.get("choices").and_then(|choices| choices.get(0)) {
            let finish = choice
                .get("finish_reason")
                .and_then(Value::as_str)
                .map(FinishReason::parse)
                .unwrap_or_default();
            (choice.get("message").cloned(), finish)
        } else if let Some(message) = value.get("message") {
            (Some(message.clone()), FinishReason::Stop)
        } else if let Some(text) = value.get("response").and_then(Value::as_str) {
            (
                Some(json!({"role": "assistant", "content": text})),
                FinishReason::Stop,
            )
        } else {
            (None, FinishReason::Stop)
        };

    let mut message = message.unwrap_or_else(|| json!({"role": "assistant", "content": ""}));
    strip_reasoning(&mut message);

    let role = message
        .get("role")
        .and_then(|role| serde_json::from_value::<Role>(role.clone()).ok())
        .unwrap_or(Role::Assistant);
    let content = message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    UnifiedChatResponse {
        role,
        content,
        finish_reason,
    }
}

/// Remove rendered thought fields. Thought content must never reach the
/// structured-output consumer or the user-facing transcript.
fn strip_reasoning(message: &mut Value) {
    if let Some(object) = message.as_object_mut() {
        object.remove("thinking");
        object.remove("reasoning");
    }
}

/// If the content still carries prose around its JSON object, replace it
/// with the re-serialized rescued object. Content without a rescuable
/// object is left as-is for the caller to handle.
fn rescue_json_content(reply: &mut UnifiedChatResponse) {
    if let Some(rescued) = extract_first_json_object(&reply.content) {
        reply.content = rescued.to_string();
    }
}

fn map_send_error(error: reqwest::Error) -> DispatchError {
    if error.is_timeout() {
        DispatchError::Timeout(REQUEST_TIMEOUT_SECS)
    } else {
        DispatchError::Connect(error.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DispatchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<Value>(&text)
        .ok()
        .or_else(|| (!text.is_empty()).then(|| Value::String(text)));
    tracing::warn!(status = status.as_u16(), "upstream returned error status");

    Err(DispatchError::UpstreamStatus {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use storypulse_protocol::{ChatRequest, ResponseFormat};

    fn prepared(request: ChatRequest) -> DispatchRequest {
        DispatchRequest::prepare(request, &ModelRequestAdapter::default(), "gpt-oss:20b")
    }

    fn plain_request(model: &str) -> DispatchRequest {
        prepared(ChatRequest {
            model: Some(model.to_string()),
            messages: vec![ChatMessage::user("hello")],
            ..Default::default()
        })
    }

    // =========================================================================
    // Payload building
    // =========================================================================

    #[test]
    fn test_v1_payload_defaults() {
        let payload = build_payload(UpstreamFlavor::V1, &plain_request("llama3.2"), false);

        assert_eq!(payload["model"], "llama3.2");
        assert_eq!(payload["max_tokens"], 600);
        assert!((payload["temperature"].as_f64().expect("temperature") - 0.6).abs() < 1e-6);
        assert_eq!(payload["stream"], false);
        assert!(payload.get("response_format").is_none());
    }

    #[test]
    fn test_v1_json_mode_for_compliant_model() {
        let request = prepared(ChatRequest {
            model: Some("llama3.2".into()),
            messages: vec![ChatMessage::user("hi")],
            format: Some(ResponseFormat::Json),
            ..Default::default()
        });
        let payload = build_payload(UpstreamFlavor::V1, &request, false);
        assert_eq!(payload["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_v1_json_mode_suppressed_for_stubborn_model() {
        let request = prepared(ChatRequest {
            messages: vec![ChatMessage::user("hi")],
            format: Some(ResponseFormat::Json),
            ..Default::default()
        });
        assert!(request.force_plain);

        let payload = build_payload(UpstreamFlavor::V1, &request, false);
        assert!(payload.get("response_format").is_none());
        // Stubborn clamp applies even though the caller never set a value.
        assert!((payload["temperature"].as_f64().expect("temperature") - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_v1_stubborn_temperature_clamped() {
        let request = prepared(ChatRequest {
            messages: vec![ChatMessage::user("hi")],
            temperature: Some(0.9),
            format: Some(ResponseFormat::Json),
            ..Default::default()
        });
        let payload = build_payload(UpstreamFlavor::V1, &request, true);
        assert!((payload["temperature"].as_f64().expect("temperature") - 0.4).abs() < 1e-6);
        assert_eq!(payload["stream"], true);
    }

    #[test]
    fn test_native_payload_omits_absent_options() {
        let payload = build_payload(UpstreamFlavor::Native, &plain_request("llama3.2"), false);

        assert_eq!(payload["model"], "llama3.2");
        assert!(payload.get("options").is_none());
        assert!(payload.get("format").is_none());
        assert!(payload.get("max_tokens").is_none());
    }

    #[test]
    fn test_native_options_map_provided_fields() {
        let request = prepared(ChatRequest {
            model: Some("llama3.2".into()),
            messages: vec![ChatMessage::user("hi")],
            temperature: Some(0.7),
            max_tokens: Some(256),
            num_ctx: Some(4096),
            ..Default::default()
        });
        let payload = build_payload(UpstreamFlavor::Native, &request, false);

        let options = &payload["options"];
        assert!((options["temperature"].as_f64().expect("temperature") - 0.7).abs() < 1e-6);
        assert_eq!(options["num_predict"], 256);
        assert_eq!(options["num_ctx"], 4096);
        assert!(options.get("top_p").is_none());
        assert!(options.get("num_batch").is_none());
    }

    #[test]
    fn test_native_json_format_suppressed_by_force_plain() {
        let request = prepared(ChatRequest {
            messages: vec![ChatMessage::user("hi")],
            format: Some(ResponseFormat::Json),
            ..Default::default()
        });
        let payload = build_payload(UpstreamFlavor::Native, &request, false);
        assert!(payload.get("format").is_none());

        let compliant = prepared(ChatRequest {
            model: Some("llama3.2".into()),
            messages: vec![ChatMessage::user("hi")],
            format: Some(ResponseFormat::Json),
            ..Default::default()
        });
        let payload = build_payload(UpstreamFlavor::Native, &compliant, false);
        assert_eq!(payload["format"], "json");
    }

    #[test]
    fn test_prepare_falls_back_to_default_model() {
        let request = prepared(ChatRequest {
            messages: vec![ChatMessage::user("hi")],
            ..Default::default()
        });
        assert_eq!(request.model, "gpt-oss:20b");
        assert!(request.stubborn);
    }

    // =========================================================================
    // Reply normalization
    // =========================================================================

    #[test]
    fn test_normalize_v1_reply() {
        let reply = normalize_reply(&json!({
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "hello"},
                "finish_reason": "stop",
            }],
        }));
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "hello");
        assert_eq!(reply.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn test_normalize_native_chat_reply() {
        let reply = normalize_reply(&json!({
            "message": {"role": "assistant", "content": "native"},
            "done": true,
        }));
        assert_eq!(reply.content, "native");
        assert_eq!(reply.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn test_normalize_native_generate_reply() {
        let reply = normalize_reply(&json!({"response": "plain completion"}));
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "plain completion");
    }

    #[test]
    fn test_normalize_unrecognized_reply_is_empty_assistant() {
        let reply = normalize_reply(&json!({"unexpected": true}));
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "");
    }

    #[test]
    fn test_thinking_and_reasoning_fields_are_stripped() {
        let reply = normalize_reply(&json!({
            "message": {
                "role": "assistant",
                "content": "answer",
                "thinking": "step by step...",
                "reasoning": "because...",
            },
        }));
        assert_eq!(reply.content, "answer");
        // Stripping happens on the message value itself; the unified reply
        // only ever carries role/content/finish_reason.
    }

    #[test]
    fn test_rescue_replaces_prose_wrapped_json() {
        let mut reply = UnifiedChatResponse {
            role: Role::Assistant,
            content: "Sure thing! {\"locations\":[]} Enjoy.".into(),
            finish_reason: FinishReason::Stop,
        };
        rescue_json_content(&mut reply);
        assert_eq!(reply.content, "{\"locations\":[]}");
    }

    #[test]
    fn test_rescue_leaves_unusable_content_alone() {
        let mut reply = UnifiedChatResponse {
            role: Role::Assistant,
            content: "no json here".into(),
            finish_reason: FinishReason::Stop,
        };
        rescue_json_content(&mut reply);
        assert_eq!(reply.content, "no json here");
    }
}
