//! Tool system: the lookups the model may call before answering.
//!
//! The model names tools by string; [`ToolInvocation::parse`] turns a request into
//! one of a closed set of typed invocations, and a [`ToolExecutor`] runs it.

mod web;
mod wiki;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::ToolsConfig;
use crate::llm::{ToolCallRequest, ToolDeclaration};

pub use web::{extract_main_text, fetch_page_content, google_search, NO_CONTENT_PLACEHOLDER};
pub use wiki::wiki_search;

pub const WEB_SEARCH: &str = "google_search";
pub const WIKI_SEARCH: &str = "wiki_search";
pub const FETCH_PAGE: &str = "fetch_page_content";

/// Default number of results returned by the search tools.
pub const DEFAULT_NUM_RESULTS: usize = 5;

/// One search hit, shared by web and encyclopedia search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchItem {
    pub title: String,
    pub content: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default = "default_num_results", deserialize_with = "lenient_count")]
    pub num_results: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FetchPageArgs {
    pub url: String,
}

fn default_num_results() -> usize {
    DEFAULT_NUM_RESULTS
}

/// Models often send integers as floats (`3.0`); accept any non-negative number.
fn lenient_count<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(DEFAULT_NUM_RESULTS),
        Value::Number(n) => n
            .as_u64()
            .map(|v| v as usize)
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as usize))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid result count: {}", n))),
        other => Err(serde::de::Error::custom(format!(
            "expected a number for num_results, got {}",
            other
        ))),
    }
}

/// A tool call the relay knows how to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    WebSearch(SearchArgs),
    WikiSearch(SearchArgs),
    FetchPage(FetchPageArgs),
}

#[derive(Debug, Error)]
pub enum ToolCallError {
    #[error("Unknown tool: {0}")]
    Unknown(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),
}

impl ToolInvocation {
    /// Resolve a model request into a typed invocation.
    pub fn parse(call: &ToolCallRequest) -> Result<Self, ToolCallError> {
        let args = if call.args.is_null() {
            json!({})
        } else {
            call.args.clone()
        };
        match call.name.as_str() {
            WEB_SEARCH => Ok(Self::WebSearch(serde_json::from_value(args)?)),
            WIKI_SEARCH => Ok(Self::WikiSearch(serde_json::from_value(args)?)),
            FETCH_PAGE => Ok(Self::FetchPage(serde_json::from_value(args)?)),
            other => Err(ToolCallError::Unknown(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::WebSearch(_) => WEB_SEARCH,
            Self::WikiSearch(_) => WIKI_SEARCH,
            Self::FetchPage(_) => FETCH_PAGE,
        }
    }
}

/// The static tool schema offered to the model.
pub fn declarations() -> Vec<ToolDeclaration> {
    let search_params = json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "The search query"
            },
            "num_results": {
                "type": "integer",
                "description": "Maximum number of results to return (default: 5)"
            }
        },
        "required": ["query"]
    });

    vec![
        ToolDeclaration {
            name: WEB_SEARCH.to_string(),
            description: "Search Google using Custom Search API. Returns titles, snippets and links."
                .to_string(),
            parameters: search_params.clone(),
        },
        ToolDeclaration {
            name: WIKI_SEARCH.to_string(),
            description: "Search Wikipedia for relevant articles. Returns short summaries and links."
                .to_string(),
            parameters: search_params,
        },
        ToolDeclaration {
            name: FETCH_PAGE.to_string(),
            description: "Extract readable content from a webpage.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The URL to fetch"
                    }
                },
                "required": ["url"]
            }),
        },
    ]
}

/// Runs typed tool invocations.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, invocation: ToolInvocation) -> anyhow::Result<Value>;
}

/// Production executor backed by the real upstream services.
pub struct ToolRegistry {
    client: reqwest::Client,
    config: ToolsConfig,
}

impl ToolRegistry {
    pub fn new(config: ToolsConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("chat-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, invocation: ToolInvocation) -> anyhow::Result<Value> {
        match invocation {
            ToolInvocation::WebSearch(args) => {
                let items =
                    google_search(&self.client, &self.config, &args.query, args.num_results)
                        .await?;
                Ok(serde_json::to_value(items)?)
            }
            ToolInvocation::WikiSearch(args) => {
                let items = wiki_search(
                    &self.client,
                    &self.config.wikipedia_base_url,
                    &args.query,
                    args.num_results,
                )
                .await?;
                Ok(serde_json::to_value(items)?)
            }
            ToolInvocation::FetchPage(args) => Ok(Value::String(
                fetch_page_content(&self.client, &args.url, self.config.page_fetch_timeout).await,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tools_with_defaults() {
        let call = ToolCallRequest::new(WEB_SEARCH, json!({"query": "rust async"}));
        assert_eq!(
            ToolInvocation::parse(&call).unwrap(),
            ToolInvocation::WebSearch(SearchArgs {
                query: "rust async".to_string(),
                num_results: 5,
            })
        );

        let call = ToolCallRequest::new(FETCH_PAGE, json!({"url": "https://example.com"}));
        let invocation = ToolInvocation::parse(&call).unwrap();
        assert_eq!(invocation.name(), FETCH_PAGE);
    }

    #[test]
    fn float_result_counts_are_accepted() {
        let call = ToolCallRequest::new(WIKI_SEARCH, json!({"query": "tokio", "num_results": 3.0}));
        match ToolInvocation::parse(&call).unwrap() {
            ToolInvocation::WikiSearch(args) => assert_eq!(args.num_results, 3),
            other => panic!("unexpected invocation: {other:?}"),
        }
    }

    #[test]
    fn unknown_tool_is_reported_by_name() {
        let call = ToolCallRequest::new("launch_rocket", json!({}));
        let err = ToolInvocation::parse(&call).unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: launch_rocket");
    }

    #[test]
    fn missing_required_argument_is_invalid() {
        let call = ToolCallRequest::new(WEB_SEARCH, Value::Null);
        let err = ToolInvocation::parse(&call).unwrap_err();
        assert!(matches!(err, ToolCallError::InvalidArguments(_)));
        assert!(err.to_string().contains("query"));
    }

    #[test]
    fn declarations_cover_every_invocation() {
        let names: Vec<_> = declarations().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec![WEB_SEARCH, WIKI_SEARCH, FETCH_PAGE]);
        for decl in declarations() {
            assert_eq!(decl.parameters["type"], "object");
            assert!(decl.parameters["required"].as_array().is_some());
        }
    }
}
