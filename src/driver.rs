use std::time::Instant;

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Config;
use crate::data_models::{HeaderSet, Latency, Payload, SearchResponse};
use crate::error::DriverError;

/// Sends search requests to one endpoint and times them.
///
/// Stateless apart from the client and the default header set, both of which
/// are read-only after construction.
#[derive(Debug, Clone)]
pub struct RequestDriver {
    client: reqwest::Client,
    endpoint: Url,
    default_headers: HeaderSet,
}

impl RequestDriver {
    pub fn new(config: &Config) -> Result<RequestDriver, DriverError> {
        let default_headers = HeaderSet::bearer(&config.api_key);
        // surface a malformed credential here instead of on the first request
        default_headers.to_header_map()?;

        Ok(RequestDriver {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            default_headers,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POSTs `payload` as JSON. `custom_headers` fully replaces the default
    /// set for this call. The latency covers sending the request and reading
    /// the whole body; a transport failure is returned as is.
    pub async fn send_request(
        &self,
        payload: &Payload,
        custom_headers: Option<&HeaderSet>,
    ) -> Result<(ApiResponse, Latency), DriverError> {
        let headers = custom_headers.unwrap_or(&self.default_headers).to_header_map()?;
        let body = payload.to_json()?;

        let start = Instant::now();
        let res = self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .body(body)
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;
        let latency = Latency::new(start.elapsed());

        log::debug!("POST {} -> {status} in {latency}", self.endpoint);

        Ok((ApiResponse { status, body }, latency))
    }
}

/// Status and raw body of one response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Hundreds digit of the status: 2 for success, 4 for client errors.
    pub fn status_class(&self) -> u16 {
        self.status.as_u16() / 100
    }

    pub fn json_value(&self) -> Result<Value, DriverError> {
        self.json()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DriverError> {
        serde_json::from_str(&self.body).map_err(DriverError::Decode)
    }

    pub fn search(&self) -> Result<SearchResponse, DriverError> {
        self.json()
    }
}
