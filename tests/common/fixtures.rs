//! Upstream payloads for the mocked news and language-model endpoints

use serde_json::{Value, json};

/// Path the mocked news API answers on
pub const NEWS_PATH: &str = "/v1/news/all";

/// Deployment name used by the mocked language model
pub const DEPLOYMENT: &str = "digest";

/// Path the mocked chat completion endpoint answers on
pub fn completions_path() -> String {
    format!("/openai/deployments/{DEPLOYMENT}/chat/completions")
}

/// A news page containing one item per id, in order
pub fn news_page(ids: &[&str]) -> Value {
    let data: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "uuid": id,
                "title": format!("Headline {id}"),
                "description": format!("About {id}"),
                "url": format!("https://news.example.com/{id}"),
                "published_at": "2024-05-01T09:30:00.000000Z",
                "source": "news.example.com",
                "categories": ["business"]
            })
        })
        .collect();

    json!({
        "meta": {"found": ids.len(), "returned": ids.len(), "limit": 50, "page": 1},
        "data": data
    })
}

/// A chat completion whose first choice carries `content`
pub fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "finish_reason": "stop",
             "message": {"role": "assistant", "content": content}}
        ]
    })
}
