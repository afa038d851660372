//! A local stand-in for the search endpoint. It applies the documented
//! validation rules so the catalog can be exercised without network access.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{Value, json};

use tavily_conformance::Config;

pub const TEST_KEY: &str = "tvly-test-key";

const MAX_QUERY_LEN: usize = 400;
const DEFAULT_MAX_RESULTS: u64 = 5;
const SEARCH_DEPTHS: &[&str] = &["basic", "advanced"];
const TOPICS: &[&str] = &["general", "news", "finance"];
const TIME_RANGES: &[&str] = &["day", "week", "month", "year", "d", "w", "m", "y"];
const COUNTRIES: &[&str] = &[
    "india",
    "united states",
    "united kingdom",
    "germany",
    "france",
    "japan",
    "brazil",
    "canada",
];
const BOOLEAN_PARAMS: &[&str] = &[
    "include_answer",
    "include_images",
    "include_raw_content",
    "include_favicon",
    "auto_parameters",
];

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Clone, Default)]
pub struct Recorder {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Recorder {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> RecordedRequest {
        self.requests().pop().expect("no request recorded")
    }
}

pub struct FakeSearchApi {
    pub addr: SocketAddr,
    pub recorder: Recorder,
}

impl FakeSearchApi {
    pub async fn start() -> FakeSearchApi {
        let recorder = Recorder::default();
        let app = Router::new()
            .route("/search", post(search_handler))
            .route("/html", post(html_handler))
            .with_state(recorder.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FakeSearchApi { addr, recorder }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn config(&self) -> Config {
        Config::new(TEST_KEY, &self.url("/search")).unwrap()
    }
}

type ApiReply = (StatusCode, Json<Value>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiReply {
    (status, Json(json!({ "detail": { "error": message.into() } })))
}

async fn html_handler() -> (StatusCode, [(header::HeaderName, &'static str); 1], &'static str) {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html")],
        "<html><body>upstream unavailable</body></html>",
    )
}

async fn search_handler(
    State(recorder): State<Recorder>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiReply {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => return error(StatusCode::BAD_REQUEST, format!("invalid json: {e}")),
    };
    recorder.requests.lock().unwrap().push(RecordedRequest {
        headers: headers.clone(),
        body: body.clone(),
    });

    let expected_auth = format!("Bearer {TEST_KEY}");
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        None => return error(StatusCode::UNAUTHORIZED, "missing API key"),
        Some(auth) if auth != expected_auth => {
            return error(StatusCode::UNAUTHORIZED, "invalid API key");
        }
        Some(_) => {}
    }

    match validate(&body) {
        Ok(max_results) => {
            let results: Vec<Value> = (0..max_results)
                .map(|i| {
                    json!({
                        "title": format!("result {i}"),
                        "url": format!("https://example.com/{i}"),
                        "content": "stub content",
                        "score": 0.5,
                    })
                })
                .collect();
            let answer = body
                .get("include_answer")
                .and_then(Value::as_bool)
                .unwrap_or(false)
                .then(|| "stub answer");
            (
                StatusCode::OK,
                Json(json!({
                    "query": body["query"],
                    "answer": answer,
                    "images": [],
                    "results": results,
                    "response_time": 0.12,
                })),
            )
        }
        Err(reply) => reply,
    }
}

/// Returns the number of results to serve, or the rejection.
fn validate(body: &Value) -> Result<u64, ApiReply> {
    let query = match body.get("query") {
        Some(Value::String(q)) => q,
        _ => return Err(error(StatusCode::UNPROCESSABLE_ENTITY, "query is required")),
    };
    if query.chars().count() > MAX_QUERY_LEN {
        return Err(error(StatusCode::BAD_REQUEST, "query is too long"));
    }

    for key in BOOLEAN_PARAMS {
        if let Some(value) = body.get(*key) {
            if !value.is_boolean() {
                return Err(error(StatusCode::BAD_REQUEST, format!("{key} must be a boolean")));
            }
        }
    }

    check_enum(body, "search_depth", SEARCH_DEPTHS)?;
    check_enum(body, "topic", TOPICS)?;
    check_enum(body, "time_range", TIME_RANGES)?;
    check_enum(body, "country", COUNTRIES)?;

    let max_results = match body.get("max_results") {
        None => DEFAULT_MAX_RESULTS,
        Some(value) => match value.as_u64() {
            Some(n @ 1..=20) => n,
            _ => return Err(error(StatusCode::BAD_REQUEST, "max_results must be 1..=20")),
        },
    };

    if let Some(value) = body.get("chunks_per_source") {
        if !matches!(value.as_u64(), Some(1..=3)) {
            return Err(error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "chunks_per_source must be 1..=3",
            ));
        }
    }

    for key in ["start_date", "end_date"] {
        if let Some(value) = body.get(key) {
            let valid = value
                .as_str()
                .is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok());
            if !valid {
                return Err(error(StatusCode::BAD_REQUEST, format!("{key} must be YYYY-MM-DD")));
            }
        }
    }

    for key in ["include_domains", "exclude_domains"] {
        if let Some(value) = body.get(key) {
            let valid = value
                .as_array()
                .is_some_and(|domains| domains.iter().all(Value::is_string));
            if !valid {
                return Err(error(StatusCode::BAD_REQUEST, format!("{key} must be a list")));
            }
        }
    }

    Ok(max_results)
}

fn check_enum(body: &Value, key: &str, allowed: &[&str]) -> Result<(), ApiReply> {
    match body.get(key) {
        None => Ok(()),
        Some(Value::String(v)) if allowed.contains(&v.to_lowercase().as_str()) => Ok(()),
        Some(_) => Err(error(StatusCode::BAD_REQUEST, format!("invalid {key}"))),
    }
}
