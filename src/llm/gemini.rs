//! Gemini `generateContent` client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{
    LlmError, ModelGateway, ModelResponse, Part, Role, ToolCallRequest, ToolDeclaration, Turn,
};

/// Stateless Gemini REST client. Built once at startup and shared by all requests.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ModelGateway for GeminiClient {
    async fn send(
        &self,
        transcript: &[Turn],
        tools: &[ToolDeclaration],
    ) -> Result<ModelResponse, LlmError> {
        if transcript.is_empty() {
            return Err(LlmError::EmptyTranscript);
        }

        let body = GenerateContentRequest {
            contents: transcript.iter().map(WireContent::from_turn).collect(),
            tools: if tools.is_empty() {
                Vec::new()
            } else {
                vec![WireTool {
                    function_declarations: tools,
                }]
            },
        };

        tracing::debug!(
            model = %self.model,
            turns = transcript.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed.into_model_response()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTool<'a> {
    function_declarations: &'a [ToolDeclaration],
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

impl WireContent {
    fn from_turn(turn: &Turn) -> Self {
        // Function responses travel in a user-role content.
        let role = match turn.role {
            Role::User | Role::Tool => "user",
            Role::Model => "model",
        };
        Self {
            role: Some(role.to_string()),
            parts: turn.parts.iter().map(WirePart::from_part).collect(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<WireFunctionResponse>,
}

impl WirePart {
    fn from_part(part: &Part) -> Self {
        match part {
            Part::Text {
                text,
                thought,
                signature,
            } => Self {
                text: Some(text.clone()),
                thought: thought.then_some(true),
                thought_signature: signature.clone(),
                ..Default::default()
            },
            Part::FunctionCall(call) => Self {
                thought_signature: call.signature.clone(),
                function_call: Some(WireFunctionCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    args: call.args.clone(),
                }),
                ..Default::default()
            },
            Part::FunctionResponse(result) => Self {
                function_response: Some(WireFunctionResponse {
                    id: result.id.clone(),
                    name: result.name.clone(),
                    response: json!({ "content": result.content }),
                }),
                ..Default::default()
            },
        }
    }

    /// Convert a received part; parts of kinds the relay does not use are dropped.
    fn into_part(self) -> Option<Part> {
        if let Some(call) = self.function_call {
            let args = if call.args.is_null() {
                json!({})
            } else {
                call.args
            };
            return Some(Part::FunctionCall(ToolCallRequest {
                id: call.id,
                name: call.name,
                args,
                signature: self.thought_signature,
            }));
        }
        self.text.map(|text| Part::Text {
            text,
            thought: self.thought == Some(true),
            signature: self.thought_signature,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    response: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_model_response(self) -> Result<ModelResponse, LlmError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(LlmError::NoCandidates {
                reason: self.prompt_feedback.and_then(|f| f.block_reason),
            });
        };

        // Safety blocks and malformed calls come back with no parts at all.
        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        if parts.is_empty() {
            return Err(LlmError::NoContent {
                finish_reason: candidate.finish_reason,
            });
        }

        Ok(ModelResponse {
            parts: parts.into_iter().filter_map(WirePart::into_part).collect(),
        })
    }
}
