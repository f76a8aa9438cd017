//! Web search tool backed by DuckDuckGo's HTML endpoint (no API key needed).

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;

const DDG_HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const DEFAULT_RESULTS: u64 = 5;
const MAX_RESULTS: u64 = 10;

/// Search the web for a free-text query.
pub struct WebSearch {
    endpoint: String,
}

impl WebSearch {
    pub fn new() -> Self {
        Self {
            endpoint: DDG_HTML_ENDPOINT.to_string(),
        }
    }
}

impl Default for WebSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Returns search results with titles, snippets and URLs. Use for current events or facts you are not sure about."
    }

    fn parameters_schema(&self) -> Value {
        json!({
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
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let query = args["query"]
            .as_str()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' argument"))?;
        let num_results = args["num_results"]
            .as_u64()
            .unwrap_or(DEFAULT_RESULTS)
            .clamp(1, MAX_RESULTS) as usize;

        let url = format!("{}?q={}", self.endpoint, urlencoding::encode(query));

        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; LoopingAgent/0.1)")
            .build()?;

        let response = client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("Search request failed: HTTP {}", status));
        }
        let html = response.text().await?;

        let results = extract_ddg_results(&html, num_results);

        if results.is_empty() {
            Ok(format!("No results found for: {}", query))
        } else {
            Ok(results.join("\n\n"))
        }
    }
}

/// Extract up to `limit` results from DuckDuckGo HTML.
fn extract_ddg_results(html: &str, limit: usize) -> Vec<String> {
    let mut results = Vec::new();

    for chunk in html.split("class=\"result__body\"").skip(1) {
        if results.len() >= limit {
            break;
        }

        let title = field_text(chunk, "result__a").unwrap_or("");
        let snippet = field_text(chunk, "result__snippet").unwrap_or("No snippet");
        let url = field_text(chunk, "result__url").map(str::trim).unwrap_or("");

        if !title.is_empty() {
            results.push(format!(
                "**{}**\n{}\nURL: {}",
                html_decode(title),
                html_decode(snippet),
                url
            ));
        }
    }

    results
}

/// Text of the first element carrying `class_name` inside `chunk`.
fn field_text<'a>(chunk: &'a str, class_name: &str) -> Option<&'a str> {
    let marker = format!("class=\"{}\"", class_name);
    chunk
        .split(marker.as_str())
        .nth(1)
        .and_then(|s| s.split('>').nth(1))
        .and_then(|s| s.split('<').next())
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
}
