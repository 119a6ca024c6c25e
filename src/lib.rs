//! # Chat Relay
//!
//! A thin HTTP service that relays chat messages to Gemini and lets the model call
//! lookup tools before it answers.
//!
//! This library provides:
//! - An HTTP API (`POST /chat`) for submitting a message
//! - A tool-calling relay loop around a pluggable model gateway
//! - Web search, Wikipedia search and page extraction tools
//!
//! ## Architecture
//!
//! The relay follows the "tools in a loop" pattern:
//! 1. Receive a message via the API and prepend the persona preamble
//! 2. Call the model with the static tool schema
//! 3. Execute any requested tool calls and append their results
//! 4. Repeat until the model answers without tool calls
//!
//! ## Example
//!
//! ```rust,ignore
//! use chat_relay::{api::AppState, config::Config};
//!
//! let config = Config::from_env()?;
//! let state = AppState::new(config)?;
//! let outcome = state.agent.run("What is Rust?".to_string()).await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use config::Config;
