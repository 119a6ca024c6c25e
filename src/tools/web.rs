//! Web access tools: Custom Search queries and page content extraction.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use super::SearchItem;
use crate::config::ToolsConfig;

/// Returned when a page has no readable text.
pub const NO_CONTENT_PLACEHOLDER: &str = "[No main content extracted]";

/// Extracted page text is cut to this many characters.
const PAGE_CONTENT_LIMIT: usize = 2000;

/// Custom Search caps `num` at 10 per request.
const SEARCH_PAGE_SIZE: usize = 10;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct CustomSearchResponse {
    #[serde(default)]
    items: Vec<CustomSearchItem>,
}

#[derive(Debug, Deserialize)]
struct CustomSearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}

/// Search the web through the Google Custom Search JSON API.
///
/// Returns at most `num_results` items even if upstream sends more.
pub async fn google_search(
    client: &reqwest::Client,
    config: &ToolsConfig,
    query: &str,
    num_results: usize,
) -> anyhow::Result<Vec<SearchItem>> {
    if num_results == 0 {
        return Ok(Vec::new());
    }

    let num = num_results.min(SEARCH_PAGE_SIZE).to_string();
    let response = client
        .get(&config.search_base_url)
        .query(&[
            ("q", query),
            ("key", config.search_api_key.as_str()),
            ("cx", config.search_engine_id.as_str()),
            ("num", num.as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!("Search API error {}: {}", status, body));
    }

    let parsed: CustomSearchResponse = response.json().await?;
    tracing::debug!(query, hits = parsed.items.len(), "Custom Search returned");

    Ok(parsed
        .items
        .into_iter()
        .take(num_results)
        .map(|item| SearchItem {
            title: item.title,
            content: item.snippet,
            link: item.link,
        })
        .collect())
}

/// Fetch a page and return its main readable text.
///
/// Never fails: errors come back as `[Error fetching page: ...]` so the model can
/// read them.
pub async fn fetch_page_content(client: &reqwest::Client, url: &str, timeout: Duration) -> String {
    match fetch_html(client, url, timeout).await {
        Ok(html) => {
            let text = extract_main_text(&html);
            if text.is_empty() {
                NO_CONTENT_PLACEHOLDER.to_string()
            } else {
                text.chars().take(PAGE_CONTENT_LIMIT).collect()
            }
        }
        Err(e) => {
            tracing::debug!(url, error = %e, "Page fetch failed");
            format!("[Error fetching page: {}]", e)
        }
    }
}

async fn fetch_html(client: &reqwest::Client, url: &str, timeout: Duration) -> anyhow::Result<String> {
    let parsed = url::Url::parse(url)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow::anyhow!("unsupported URL scheme: {}", parsed.scheme()));
    }

    let response = client
        .get(parsed)
        .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?;

    Ok(response.text().await?)
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
}

/// Elements whose content never counts as main text.
const DISCARDED_ELEMENTS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "svg", "iframe", "table", "nav", "header",
    "footer", "aside", "form", "button", "select",
];

/// Offset of the next `<tag` or `</tag` token in `lower` at or after `from`.
fn find_token(lower: &str, from: usize, token: &str) -> Option<usize> {
    let mut search = from;
    while let Some(rel) = lower[search..].find(token) {
        let at = search + rel;
        let after = lower[at + token.len()..].chars().next();
        if after.map_or(true, |c| c == '>' || c == '/' || c.is_whitespace()) {
            return Some(at);
        }
        search = at + token.len();
    }
    None
}

/// Offset just past the `>` closing the tag that starts at `from`.
fn tag_end(lower: &str, from: usize) -> usize {
    lower[from..].find('>').map_or(lower.len(), |i| from + i + 1)
}

/// Where an element without a matching close tag ends.
///
/// HTML5 lets `</head>` be omitted, so an open head runs up to `<body`. Anything
/// else loses only its opening tag.
fn unclosed_end(lower: &str, tag: &str, start: usize) -> usize {
    if tag == "head" {
        if let Some(body) = find_token(lower, start, "<body") {
            return body;
        }
    }
    tag_end(lower, start)
}

/// Remove every `tag` element with its content, honouring nesting.
fn strip_element(html: &str, tag: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}");

    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while let Some(start) = find_token(&lower, pos, &open) {
        out.push_str(&html[pos..start]);
        out.push(' ');

        let mut depth = 0usize;
        let mut cursor = start;
        pos = loop {
            let next_open = find_token(&lower, cursor, &open);
            let next_close = find_token(&lower, cursor, &close);
            match (next_open, next_close) {
                (Some(o), c) if c.map_or(true, |c| o < c) => {
                    let end = tag_end(&lower, o);
                    if lower[..end].ends_with("/>") {
                        if depth == 0 {
                            break end;
                        }
                    } else {
                        depth += 1;
                    }
                    cursor = end;
                }
                (_, Some(c)) => {
                    depth = depth.saturating_sub(1);
                    cursor = tag_end(&lower, c);
                    if depth == 0 {
                        break cursor;
                    }
                }
                (_, None) => break unclosed_end(&lower, tag, start),
            }
        };
    }
    out.push_str(&html[pos..]);
    out
}

fn comment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| compile(r"(?s)<!--.*?-->"))
}

fn block_break_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        compile(r"(?i)</?(p|div|br|li|ul|ol|h[1-6]|section|article|main|blockquote|pre|dd|dt)\b[^>]*>")
    })
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| compile(r"(?s)<[^>]*>"))
}

/// Narrow the document to its most likely content container.
fn main_region(html: &str) -> &str {
    let lower = html.to_ascii_lowercase();
    for tag in ["article", "main", "body"] {
        let open = format!("<{tag}");
        let close = format!("</{tag}>");
        let start = find_token(&lower, 0, &open);
        if let (Some(start), Some(end)) = (start, lower.rfind(&close)) {
            if end > start {
                return &html[start..end + close.len()];
            }
        }
    }
    html
}

/// Extract readable text from HTML.
///
/// Comments, tables, scripts and page chrome are dropped; block elements become
/// line breaks and whitespace is collapsed.
pub fn extract_main_text(html: &str) -> String {
    let mut text = comment_pattern().replace_all(html, " ").into_owned();

    for tag in DISCARDED_ELEMENTS {
        text = strip_element(&text, tag);
    }

    let region = main_region(&text);
    let broken = block_break_pattern().replace_all(region, "\n");
    let stripped = tag_pattern().replace_all(&broken, " ");

    html_decode(&stripped)
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
