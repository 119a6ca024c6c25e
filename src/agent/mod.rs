//! Agent module - the tool-calling relay loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Seed the transcript with the persona-conditioned user message
//! 2. Call the model with the static tool schema
//! 3. If the model requests tool calls, execute them and feed the results back
//! 4. Repeat until the model answers without tool calls or the round limit is hit

mod agent_loop;
mod prompt;

pub use agent_loop::{Agent, RelayError, RelayOutcome};
pub use prompt::{build_prompt, DEFAULT_PERSONA};
