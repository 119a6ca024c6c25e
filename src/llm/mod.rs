//! Model gateway: conversation types and the client abstraction.
//!
//! The relay loop only talks to the model through [`ModelGateway`], so the
//! provider client can be swapped (or scripted in tests).

mod gemini;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use gemini::GeminiClient;

/// Errors surfaced by a model gateway.
///
/// Every variant is an upstream failure from the caller's point of view; none is
/// retried.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Transcript must contain at least one turn")]
    EmptyTranscript,

    #[error("Upstream model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream model returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Upstream model returned no candidates{}", reason_suffix(.reason))]
    NoCandidates { reason: Option<String> },

    #[error("Upstream model returned no content{}", reason_suffix(.finish_reason))]
    NoContent { finish_reason: Option<String> },
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(" ({})", r))
        .unwrap_or_default()
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
    /// Tool results fed back to the model.
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    /// Provider-assigned call id, echoed on the matching result.
    pub id: Option<String>,
    pub name: String,
    /// Named arguments, normally a JSON object.
    pub args: Value,
    /// Opaque reasoning signature that must travel back with the call.
    pub signature: Option<String>,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            args,
            signature: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// The outcome of one tool call, as fed back to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Id of the originating call, when the provider assigned one.
    pub id: Option<String>,
    /// Name of the tool that was requested.
    pub name: String,
    /// Structured payload, or a string for errors and placeholders.
    pub content: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text {
        text: String,
        /// Reasoning summary rather than answer text.
        thought: bool,
        signature: Option<String>,
    },
    FunctionCall(ToolCallRequest),
    FunctionResponse(ToolResult),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            thought: false,
            signature: None,
        }
    }
}

/// One entry of the conversation transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    /// A model turn, echoed back verbatim so the provider sees its own request.
    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: Role::Tool,
            parts: results.into_iter().map(Part::FunctionResponse).collect(),
        }
    }

    /// Function responses carried by this turn, in order.
    pub fn results(&self) -> impl Iterator<Item = &ToolResult> {
        self.parts.iter().filter_map(|p| match p {
            Part::FunctionResponse(r) => Some(r),
            _ => None,
        })
    }
}

/// Ordered conversation history for a single request.
pub type Transcript = Vec<Turn>;

/// What the model produced for one gateway call, part by part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub parts: Vec<Part>,
}

impl ModelResponse {
    /// A response that only carries text.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::text(text)],
        }
    }

    pub fn with_tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            parts: tool_calls.into_iter().map(Part::FunctionCall).collect(),
        }
    }

    /// Requested tool calls, in order.
    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCallRequest> {
        self.parts.iter().filter_map(|p| match p {
            Part::FunctionCall(call) => Some(call),
            _ => None,
        })
    }

    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls().next().is_some()
    }

    /// Answer text: every non-thought text part concatenated in order.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text {
                    text,
                    thought: false,
                    ..
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A tool the model is allowed to call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// Client for a remote generation endpoint.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Send the transcript and tool schema, returning text and/or tool-call requests.
    async fn send(
        &self,
        transcript: &[Turn],
        tools: &[ToolDeclaration],
    ) -> Result<ModelResponse, LlmError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
