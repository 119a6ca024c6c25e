//! Core relay loop implementation.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use thiserror::Error;

use crate::llm::{
    LlmError, ModelGateway, ToolCallRequest, ToolDeclaration, ToolResult, Transcript, Turn,
};
use crate::tools::{ToolCallError, ToolExecutor, ToolInvocation};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Upstream(#[from] LlmError),

    #[error("Tool-call limit exceeded: model still requested tools after {0} rounds")]
    ToolCallLimitExceeded(usize),
}

/// Result of a completed relay.
#[derive(Debug, Clone)]
pub struct RelayOutcome {
    /// Final answer, trimmed.
    pub response: String,
    /// Everything exchanged with the model, in order.
    pub transcript: Transcript,
    /// Number of tool-call rounds executed.
    pub tool_rounds: usize,
}

/// Relays a conversation between the model and the tool executors.
///
/// Holds only shared, read-only collaborators; each call to [`Agent::run`] owns its
/// own transcript.
pub struct Agent {
    llm: Arc<dyn ModelGateway>,
    tools: Arc<dyn ToolExecutor>,
    schema: Arc<[ToolDeclaration]>,
    max_tool_rounds: usize,
}

impl Agent {
    pub fn new(
        llm: Arc<dyn ModelGateway>,
        tools: Arc<dyn ToolExecutor>,
        schema: Vec<ToolDeclaration>,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            llm,
            tools,
            schema: schema.into(),
            max_tool_rounds,
        }
    }

    /// Run the relay for one persona-conditioned prompt.
    pub async fn run(&self, prompt: String) -> Result<RelayOutcome, RelayError> {
        let mut transcript: Transcript = vec![Turn::user(prompt)];
        let mut tool_rounds = 0;

        loop {
            tracing::debug!(
                model = self.llm.model_name(),
                round = tool_rounds,
                "Calling model"
            );
            let response = self.llm.send(&transcript, &self.schema).await?;
            let calls: Vec<ToolCallRequest> = response.tool_calls().cloned().collect();

            if calls.is_empty() {
                let text = response.text();
                tracing::info!(
                    tool_rounds,
                    response = %truncate_for_log(&text, 200),
                    "Model produced final answer"
                );
                return Ok(RelayOutcome {
                    response: text.trim().to_string(),
                    transcript,
                    tool_rounds,
                });
            }

            if tool_rounds >= self.max_tool_rounds {
                tracing::warn!(tool_rounds, "Model kept requesting tools past the limit");
                return Err(RelayError::ToolCallLimitExceeded(tool_rounds));
            }
            tool_rounds += 1;

            // Echo the model turn whole: text, call ids and signatures included.
            transcript.push(Turn::model(response.parts));

            // Calls within a round are independent; join_all keeps request order.
            let results = join_all(calls.iter().map(|call| self.execute_tool_call(call))).await;

            transcript.push(Turn::tool_results(results));
        }
    }

    /// Execute a single tool call. Failures become result text, never errors.
    async fn execute_tool_call(&self, call: &ToolCallRequest) -> ToolResult {
        tracing::info!(tool = %call.name, args = %call.args, "Calling tool");

        let content = match ToolInvocation::parse(call) {
            Ok(invocation) => match self.tools.execute(invocation).await {
                Ok(value) => value,
                Err(e) => Value::String(format!("Error executing {}: {}", call.name, e)),
            },
            Err(ToolCallError::Unknown(name)) => Value::String(format!("Unknown tool: {}", name)),
            Err(e) => Value::String(format!("Error executing {}: {}", call.name, e)),
        };

        tracing::debug!(
            tool = %call.name,
            result = %truncate_for_log(&content.to_string(), 1000),
            "Tool finished"
        );

        ToolResult {
            id: call.id.clone(),
            name: call.name.clone(),
            content,
        }
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}... [truncated]", head)
    }
}
