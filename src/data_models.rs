use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DriverError;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Request fields the search endpoint documents. Payload keys can only come
/// from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    Query,
    IncludeAnswer,
    IncludeImages,
    IncludeRawContent,
    IncludeFavicon,
    SearchDepth,
    AutoParameters,
    Topic,
    MaxResults,
    ChunksPerSource,
    TimeRange,
    StartDate,
    EndDate,
    IncludeDomains,
    ExcludeDomains,
    Country,
}

impl Param {
    pub const ALL: [Param; 16] = [
        Param::Query,
        Param::IncludeAnswer,
        Param::IncludeImages,
        Param::IncludeRawContent,
        Param::IncludeFavicon,
        Param::SearchDepth,
        Param::AutoParameters,
        Param::Topic,
        Param::MaxResults,
        Param::ChunksPerSource,
        Param::TimeRange,
        Param::StartDate,
        Param::EndDate,
        Param::IncludeDomains,
        Param::ExcludeDomains,
        Param::Country,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Param::Query => "query",
            Param::IncludeAnswer => "include_answer",
            Param::IncludeImages => "include_images",
            Param::IncludeRawContent => "include_raw_content",
            Param::IncludeFavicon => "include_favicon",
            Param::SearchDepth => "search_depth",
            Param::AutoParameters => "auto_parameters",
            Param::Topic => "topic",
            Param::MaxResults => "max_results",
            Param::ChunksPerSource => "chunks_per_source",
            Param::TimeRange => "time_range",
            Param::StartDate => "start_date",
            Param::EndDate => "end_date",
            Param::IncludeDomains => "include_domains",
            Param::ExcludeDomains => "exclude_domains",
            Param::Country => "country",
        }
    }

    pub fn from_key(key: &str) -> Option<Param> {
        Param::ALL.into_iter().find(|p| p.as_str() == key)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON body of one search request.
///
/// Values are plain JSON on purpose: negative cases need to send a string
/// where a boolean belongs, or a count outside its range.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Payload {
    fields: Map<String, Value>,
}

impl Payload {
    pub fn new() -> Payload {
        Payload::default()
    }

    pub fn query(query: impl Into<String>) -> Payload {
        let query: String = query.into();
        Payload::new().with(Param::Query, query)
    }

    pub fn with(mut self, param: Param, value: impl Into<Value>) -> Payload {
        self.fields.insert(param.as_str().to_string(), value.into());
        self
    }

    pub fn with_domains(self, param: Param, domains: &[&str]) -> Payload {
        let list: Vec<Value> = domains.iter().map(|d| Value::from(*d)).collect();
        self.with(param, list)
    }

    /// Sets `start_date`/`end_date` in the `YYYY-MM-DD` form the API expects.
    pub fn with_date_range(self, start: NaiveDate, end: NaiveDate) -> Payload {
        self.with(Param::StartDate, start.format("%Y-%m-%d").to_string())
            .with(Param::EndDate, end.format("%Y-%m-%d").to_string())
    }

    pub fn get(&self, param: Param) -> Option<&Value> {
        self.fields.get(param.as_str())
    }

    pub fn params(&self) -> impl Iterator<Item = Param> + '_ {
        self.fields.keys().filter_map(|k| Param::from_key(k))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> Result<Vec<u8>, DriverError> {
        serde_json::to_vec(&self.fields).map_err(DriverError::Encode)
    }
}

/// Headers sent with a request. The default set carries both content type
/// and bearer credential; overrides replace it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSet {
    pub content_type: String,
    pub authorization: Option<String>,
}

impl HeaderSet {
    pub fn bearer(token: &str) -> HeaderSet {
        HeaderSet {
            content_type: JSON_CONTENT_TYPE.to_string(),
            authorization: Some(format!("Bearer {token}")),
        }
    }

    pub fn content_type_only() -> HeaderSet {
        HeaderSet {
            content_type: JSON_CONTENT_TYPE.to_string(),
            authorization: None,
        }
    }

    pub fn to_header_map(&self) -> Result<HeaderMap, DriverError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, header_value("content-type", &self.content_type)?);
        if let Some(auth) = &self.authorization {
            let mut value = header_value("authorization", auth)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, DriverError> {
    HeaderValue::from_str(value).map_err(|e| DriverError::InvalidHeader {
        name,
        reason: e.to_string(),
    })
}

/// Successful search body. Only `results` and `response_time` are relied
/// upon; everything else is optional so that schema drift upstream doesn't
/// turn into decode errors.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub images: Vec<Value>,
    pub results: Vec<SearchResult>,
    pub response_time: ResponseTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub raw_content: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
}

/// The API has reported this both as a number and as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ResponseTime {
    Seconds(f64),
    Text(String),
}

/// Client-observed round trip of one request, body read included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Latency(Duration);

impl Latency {
    pub fn new(elapsed: Duration) -> Latency {
        Latency(elapsed)
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}s", self.as_secs_f64())
    }
}
