//! Wikipedia lookup: title search plus short plain-text intro extracts.

use futures::future::join_all;
use serde::Deserialize;

use super::SearchItem;

/// Sentences kept from each page intro. MediaWiki does the sentence splitting.
const SUMMARY_SENTENCES: &str = "2";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PagesResponse {
    #[serde(default)]
    query: Option<PagesQuery>,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    fullurl: Option<String>,
    #[serde(default)]
    pageprops: Option<PageProps>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    #[serde(default)]
    disambiguation: Option<serde_json::Value>,
}

/// Search Wikipedia by title and summarise each hit.
///
/// Hits whose summary cannot be fetched (missing page, disambiguation, transport
/// error) are skipped, so fewer than `num_results` items may come back.
pub async fn wiki_search(
    client: &reqwest::Client,
    base_url: &str,
    query: &str,
    num_results: usize,
) -> anyhow::Result<Vec<SearchItem>> {
    let titles = search_titles(client, base_url, query, num_results).await?;
    if titles.is_empty() {
        return Ok(Vec::new());
    }

    let lookups = titles.iter().map(|title| page_summary(client, base_url, title));
    let summaries = join_all(lookups).await;

    let mut items = Vec::with_capacity(titles.len());
    for (title, summary) in titles.into_iter().zip(summaries) {
        match summary {
            Ok(item) => items.push(item),
            Err(e) => tracing::debug!(title = %title, error = %e, "Skipping Wikipedia page"),
        }
    }
    Ok(items)
}

fn api_url(base_url: &str) -> String {
    format!("{}/w/api.php", base_url.trim_end_matches('/'))
}

async fn search_titles(
    client: &reqwest::Client,
    base_url: &str,
    query: &str,
    num_results: usize,
) -> anyhow::Result<Vec<String>> {
    if num_results == 0 {
        return Ok(Vec::new());
    }

    let limit = num_results.to_string();
    let response: SearchResponse = client
        .get(api_url(base_url))
        .query(&[
            ("action", "query"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", limit.as_str()),
            ("srprop", ""),
            ("format", "json"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(response
        .query
        .map(|q| q.search)
        .unwrap_or_default()
        .into_iter()
        .take(num_results)
        .map(|hit| hit.title)
        .collect())
}

async fn page_summary(
    client: &reqwest::Client,
    base_url: &str,
    title: &str,
) -> anyhow::Result<SearchItem> {
    let response: PagesResponse = client
        .get(api_url(base_url))
        .query(&[
            ("action", "query"),
            ("prop", "extracts|info|pageprops"),
            ("exintro", "1"),
            ("explaintext", "1"),
            ("exsentences", SUMMARY_SENTENCES),
            ("inprop", "url"),
            ("ppprop", "disambiguation"),
            ("redirects", "1"),
            ("titles", title),
            ("format", "json"),
            ("formatversion", "2"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let page = response
        .query
        .and_then(|q| q.pages.into_iter().next())
        .filter(|page| !page.missing)
        .ok_or_else(|| anyhow::anyhow!("no page titled '{}'", title))?;

    if page.pageprops.is_some_and(|p| p.disambiguation.is_some()) {
        return Err(anyhow::anyhow!("'{}' is a disambiguation page", title));
    }
    let link = page
        .fullurl
        .ok_or_else(|| anyhow::anyhow!("no canonical URL for '{}'", title))?;

    Ok(SearchItem {
        title: title.to_string(),
        content: page.extract.trim().to_string(),
        link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn page(title: &str, extract: &str) -> Value {
        json!({
            "pageid": 1,
            "ns": 0,
            "title": title,
            "extract": extract,
            "fullurl": format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_"))
        })
    }

    fn lookup(params: &HashMap<String, String>) -> Value {
        // Extracts are only trimmed to two sentences when asked for plain text.
        assert_eq!(params["exsentences"], "2");
        assert_eq!(params["explaintext"], "1");
        let title = params["titles"].as_str();
        let page = match title {
            "Ferris (mascot)" => page(title, "Ferris is a crab. Ferris is orange."),
            "Washington, D.C." => page(
                title,
                "Washington, D.C. is the capital of the U.S. It lies on the Potomac River.",
            ),
            "Crab (disambiguation)" => {
                let mut p = page(title, "Crab may refer to:");
                p["pageprops"] = json!({"disambiguation": ""});
                p
            }
            _ => json!({"ns": 0, "title": title, "missing": true}),
        };
        json!({"batchcomplete": true, "query": {"pages": [page]}})
    }

    fn search(params: &HashMap<String, String>) -> Value {
        let titles: Vec<&str> = match params.get("srsearch").map(String::as_str) {
            Some("crab") => vec!["Ferris (mascot)", "Missing page", "Crab (disambiguation)", "Washington, D.C."],
            _ => vec![],
        };
        let limit: usize = params["srlimit"].parse().unwrap();
        let hits: Vec<_> = titles
            .into_iter()
            .take(limit)
            .map(|t| json!({"ns": 0, "title": t}))
            .collect();
        json!({"batchcomplete": "", "query": {"search": hits}})
    }

    async fn wiki_server() -> String {
        let router = Router::new().route(
            "/w/api.php",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                if params.contains_key("list") {
                    Json(search(&params))
                } else {
                    Json(lookup(&params))
                }
            }),
        );
        spawn_server(router).await
    }

    #[tokio::test]
    async fn summarises_hits_and_skips_failures() {
        let base = wiki_server().await;
        let items = wiki_search(&reqwest::Client::new(), &base, "crab", 5).await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            SearchItem {
                title: "Ferris (mascot)".to_string(),
                content: "Ferris is a crab. Ferris is orange.".to_string(),
                link: "https://en.wikipedia.org/wiki/Ferris_(mascot)".to_string(),
            }
        );
        assert_eq!(items[1].title, "Washington, D.C.");
    }

    #[tokio::test]
    async fn abbreviations_survive_in_extracts() {
        let base = wiki_server().await;
        let items = wiki_search(&reqwest::Client::new(), &base, "crab", 5).await.unwrap();
        assert_eq!(
            items[1].content,
            "Washington, D.C. is the capital of the U.S. It lies on the Potomac River."
        );
    }

    #[tokio::test]
    async fn respects_requested_count() {
        let base = wiki_server().await;
        let items = wiki_search(&reqwest::Client::new(), &base, "crab", 1).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Ferris (mascot)");
    }

    #[tokio::test]
    async fn no_matching_titles_is_empty_not_error() {
        let base = wiki_server().await;
        let items = wiki_search(&reqwest::Client::new(), &base, "zzzz", 5).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn failing_title_search_is_an_error() {
        let router = Router::new().route("/w/api.php", get(|| async { StatusCode::BAD_GATEWAY }));
        let base = spawn_server(router).await;
        let result = wiki_search(&reqwest::Client::new(), &base, "crab", 5).await;
        assert!(result.is_err());
    }
}
