//! Mock Reddit server shared by the end-to-end collection tests

use collector_core::Credentials;
use reddit_client::RedditEndpoints;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn test_credentials() -> Credentials {
    Credentials {
        client_id: "test_client_id".to_string(),
        client_secret: "test_client_secret".to_string(),
        user_agent: "reddit-collector/0.1 by tester".to_string(),
        username: "tester".to_string(),
        password: "hunter2".to_string(),
    }
}

pub fn endpoints(server: &MockServer) -> RedditEndpoints {
    RedditEndpoints::with_base(&server.uri())
}

pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test_token",
            "token_type": "bearer",
            "expires_in": 86400,
            "scope": "*"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "u1", "name": "tester" })),
        )
        .mount(server)
        .await;
}

pub fn listing(posts: Vec<Value>, after: Option<&str>) -> Value {
    let children: Vec<Value> = posts
        .into_iter()
        .map(|data| json!({ "kind": "t3", "data": data }))
        .collect();
    json!({
        "kind": "Listing",
        "data": { "after": after, "before": null, "dist": children.len(), "children": children }
    })
}

pub fn post(id: &str, subreddit: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Post {id}"),
        "selftext": "",
        "author": "someone",
        "subreddit": subreddit,
        "url": format!("https://www.reddit.com/r/{subreddit}/comments/{id}"),
        "created_utc": 1700000000.0,
        "score": 10,
        "num_comments": 3,
        "over_18": false,
        "permalink": format!("/r/{subreddit}/comments/{id}")
    })
}
