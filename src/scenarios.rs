//! The conformance catalog: every request the suite sends and what the
//! search API is expected to answer.

use chrono::NaiveDate;
use reqwest::StatusCode;
use serde_json::Value;

use crate::data_models::{HeaderSet, Latency, Param, Payload};
use crate::driver::{ApiResponse, RequestDriver};
use crate::error::DriverError;

const QUERY: &str = "AI";
const LONG_QUERY_LEN: usize = 2000;
const INVALID_API_KEY: &str = "invalid-key";

const RANGE_START: NaiveDate = match NaiveDate::from_ymd_opt(2025, 1, 1) {
    Some(date) => date,
    None => panic!("invalid range start"),
};
const RANGE_END: NaiveDate = match NaiveDate::from_ymd_opt(2025, 1, 31) {
    Some(date) => date,
    None => panic!("invalid range end"),
};

/// Which headers a scenario sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderChoice {
    Default,
    ContentTypeOnly,
    Bearer(String),
}

impl HeaderChoice {
    pub fn resolve(&self) -> Option<HeaderSet> {
        match self {
            HeaderChoice::Default => None,
            HeaderChoice::ContentTypeOnly => Some(HeaderSet::content_type_only()),
            HeaderChoice::Bearer(token) => Some(HeaderSet::bearer(token)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    ResultsIsList,
    ResultsAtMost(usize),
    ResponseTimePresent,
    LatencyNonNegative,
}

impl Check {
    fn needs_body(&self) -> bool {
        !matches!(self, Check::LatencyNonNegative)
    }

    fn verify(&self, body: Option<&Value>, latency: Latency) -> Result<(), String> {
        match self {
            Check::LatencyNonNegative => {
                let secs = latency.as_secs_f64();
                if secs >= 0.0 {
                    Ok(())
                } else {
                    Err(format!("latency {secs} is negative"))
                }
            }
            Check::ResultsIsList => match body.and_then(|b| b.get("results")) {
                Some(Value::Array(_)) => Ok(()),
                Some(other) => Err(format!("`results` is not a list: {other}")),
                None => Err("body has no `results`".to_string()),
            },
            Check::ResultsAtMost(max) => match body.and_then(|b| b.get("results")) {
                Some(Value::Array(results)) if results.len() <= *max => Ok(()),
                Some(Value::Array(results)) => Err(format!(
                    "{} results returned, expected at most {max}",
                    results.len()
                )),
                _ => Err("body has no `results` list".to_string()),
            },
            Check::ResponseTimePresent => match body.and_then(|b| b.get("response_time")) {
                Some(Value::Number(_)) | Some(Value::String(_)) => Ok(()),
                Some(other) => Err(format!("`response_time` has unexpected type: {other}")),
                None => Err("body has no `response_time`".to_string()),
            },
        }
    }
}

/// Acceptable statuses plus checks on the body. An empty status list
/// accepts any status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expectation {
    pub statuses: Vec<u16>,
    pub checks: Vec<Check>,
}

impl Expectation {
    pub fn status(code: u16) -> Expectation {
        Expectation {
            statuses: vec![code],
            checks: Vec::new(),
        }
    }

    pub fn one_of(codes: &[u16]) -> Expectation {
        Expectation {
            statuses: codes.to_vec(),
            checks: Vec::new(),
        }
    }

    pub fn any_status() -> Expectation {
        Expectation::default()
    }

    pub fn and(mut self, check: Check) -> Expectation {
        self.checks.push(check);
        self
    }

    pub fn accepts(&self, status: StatusCode) -> bool {
        self.statuses.is_empty() || self.statuses.contains(&status.as_u16())
    }

    /// Every way `response` misses this expectation. Body checks are only
    /// run once the status is acceptable.
    pub fn evaluate(&self, response: &ApiResponse, latency: Latency) -> Vec<String> {
        let mut failures = Vec::new();

        if !self.accepts(response.status) {
            failures.push(format!(
                "status {} not in {:?}",
                response.status_code(),
                self.statuses
            ));
        }

        let body = if self.checks.iter().any(Check::needs_body) && failures.is_empty() {
            match response.json_value() {
                Ok(body) => Some(body),
                Err(e) => {
                    failures.push(format!("{e}"));
                    return failures;
                }
            }
        } else {
            None
        };

        for check in &self.checks {
            if check.needs_body() && body.is_none() {
                continue;
            }
            if let Err(reason) = check.verify(body.as_ref(), latency) {
                failures.push(reason);
            }
        }
        failures
    }
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub id: &'static str,
    pub name: &'static str,
    pub payload: Payload,
    pub headers: HeaderChoice,
    pub expect: Expectation,
}

impl Scenario {
    fn new(id: &'static str, name: &'static str, payload: Payload, expect: Expectation) -> Scenario {
        Scenario {
            id,
            name,
            payload,
            headers: HeaderChoice::Default,
            expect,
        }
    }

    fn with_headers(mut self, headers: HeaderChoice) -> Scenario {
        self.headers = headers;
        self
    }

    /// Case-insensitive substring match on id or name.
    pub fn matches(&self, pattern: &str) -> bool {
        let pattern = pattern.to_ascii_lowercase();
        self.id.to_ascii_lowercase().contains(&pattern)
            || self.name.to_ascii_lowercase().contains(&pattern)
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub id: &'static str,
    pub name: &'static str,
    pub status: StatusCode,
    pub latency: Latency,
    pub failures: Vec<String>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Sends one scenario and checks the answer. Assertion misses end up in the
/// report; transport errors are returned.
pub async fn run_scenario(
    driver: &RequestDriver,
    scenario: &Scenario,
) -> Result<ScenarioReport, DriverError> {
    let headers = scenario.headers.resolve();
    let (response, latency) = driver.send_request(&scenario.payload, headers.as_ref()).await?;
    let failures = scenario.expect.evaluate(&response, latency);

    log::info!(
        "{} {}: status {} Latency: {latency}",
        scenario.id,
        scenario.name,
        response.status_code()
    );
    for failure in &failures {
        log::warn!("{} {}: {failure}", scenario.id, scenario.name);
    }

    Ok(ScenarioReport {
        id: scenario.id,
        name: scenario.name,
        status: response.status,
        latency,
        failures,
    })
}

/// A scenario whose request never completed.
#[derive(Debug)]
pub struct ScenarioError {
    pub id: &'static str,
    pub name: &'static str,
    pub error: DriverError,
}

/// Outcome of a sequential run over several scenarios.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<ScenarioReport>,
    pub errors: Vec<ScenarioError>,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.reports.len() + self.errors.len()
    }

    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| !r.passed()).count()
    }

    pub fn errored(&self) -> usize {
        self.errors.len()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0 && self.errored() == 0
    }
}

/// Runs `scenarios` one after another. A transport error is recorded against
/// its scenario and the run carries on with the next one.
pub async fn run_all(driver: &RequestDriver, scenarios: &[Scenario]) -> RunSummary {
    let mut summary = RunSummary::default();
    for scenario in scenarios {
        match run_scenario(driver, scenario).await {
            Ok(report) => summary.reports.push(report),
            Err(error) => {
                log::error!("{} {}: {:#}", scenario.id, scenario.name, error);
                summary.errors.push(ScenarioError {
                    id: scenario.id,
                    name: scenario.name,
                    error,
                });
            }
        }
    }
    summary
}

/// Looks a scenario up by exact id (`TC17`) or name.
pub fn find(key: &str) -> Option<Scenario> {
    catalog()
        .into_iter()
        .find(|s| s.id.eq_ignore_ascii_case(key) || s.name == key)
}

fn ai() -> Payload {
    Payload::query(QUERY)
}

pub fn catalog() -> Vec<Scenario> {
    let ok = || Expectation::status(200);
    let bad_request = || Expectation::status(400);

    vec![
        Scenario::new(
            "TC01",
            "valid_query_basic",
            Payload::query("Artificial Intelligence")
                .with(Param::IncludeAnswer, true)
                .with(Param::IncludeImages, false)
                .with(Param::SearchDepth, "basic"),
            ok().and(Check::ResultsIsList),
        ),
        Scenario::new(
            "TC02",
            "valid_query_advanced",
            ai().with(Param::SearchDepth, "advanced"),
            ok(),
        ),
        Scenario::new(
            "TC03",
            "valid_query_auto_parameters",
            ai().with(Param::AutoParameters, true),
            ok(),
        ),
        Scenario::new(
            "TC04",
            "valid_query_topic_news",
            ai().with(Param::Topic, "news"),
            ok(),
        ),
        Scenario::new(
            "TC05",
            "valid_query_max_results_1",
            ai().with(Param::MaxResults, 1),
            ok().and(Check::ResultsIsList).and(Check::ResultsAtMost(1)),
        ),
        Scenario::new(
            "TC06",
            "valid_query_max_results_20",
            ai().with(Param::MaxResults, 20),
            ok().and(Check::ResultsIsList).and(Check::ResultsAtMost(20)),
        ),
        Scenario::new(
            "TC07",
            "valid_query_chunks_per_source",
            ai().with(Param::SearchDepth, "advanced")
                .with(Param::ChunksPerSource, 3),
            ok(),
        ),
        Scenario::new(
            "TC08",
            "valid_query_time_range",
            ai().with(Param::TimeRange, "week"),
            ok(),
        ),
        Scenario::new(
            "TC09",
            "valid_query_date_range",
            ai().with_date_range(RANGE_START, RANGE_END),
            ok(),
        ),
        Scenario::new(
            "TC10",
            "valid_query_include_raw_content",
            ai().with(Param::IncludeRawContent, true),
            ok(),
        ),
        Scenario::new(
            "TC11",
            "valid_query_include_favicon",
            ai().with(Param::IncludeFavicon, true),
            ok(),
        ),
        Scenario::new(
            "TC12",
            "valid_query_include_domains",
            ai().with_domains(Param::IncludeDomains, &["bbc.com"]),
            ok(),
        ),
        Scenario::new(
            "TC13",
            "valid_query_exclude_domains",
            ai().with_domains(Param::ExcludeDomains, &["cnn.com"]),
            ok(),
        ),
        Scenario::new(
            "TC14",
            "valid_query_country",
            ai().with(Param::Country, "india"),
            ok(),
        ),
        Scenario::new(
            "TC15",
            "valid_query_special_characters",
            Payload::query("!@#$%^&*()").with(Param::IncludeAnswer, true),
            ok(),
        ),
        Scenario::new(
            "TC16",
            "edge_very_short_query",
            Payload::query("a"),
            Expectation::one_of(&[200, 400]),
        ),
        Scenario::new(
            "TC17",
            "edge_very_long_query",
            Payload::query("a".repeat(LONG_QUERY_LEN)),
            bad_request(),
        ),
        Scenario::new(
            "TC18",
            "negative_missing_query",
            Payload::new().with(Param::IncludeAnswer, true),
            Expectation::status(422),
        ),
        Scenario::new(
            "TC19",
            "negative_missing_api_key",
            ai(),
            Expectation::one_of(&[400, 401]),
        )
        .with_headers(HeaderChoice::ContentTypeOnly),
        Scenario::new(
            "TC20",
            "negative_invalid_api_key",
            ai(),
            Expectation::status(401),
        )
        .with_headers(HeaderChoice::Bearer(INVALID_API_KEY.to_string())),
        // the API may coerce the string, both outcomes are accepted
        Scenario::new(
            "TC21",
            "negative_invalid_param_type",
            ai().with(Param::IncludeImages, "yes"),
            Expectation::one_of(&[200, 400]),
        ),
        Scenario::new(
            "TC22",
            "negative_invalid_search_depth",
            ai().with(Param::SearchDepth, "invalid"),
            bad_request(),
        ),
        Scenario::new(
            "TC23",
            "negative_invalid_topic",
            ai().with(Param::Topic, "invalid"),
            bad_request(),
        ),
        Scenario::new(
            "TC24",
            "negative_invalid_country",
            ai().with(Param::Country, "invalid"),
            bad_request(),
        ),
        Scenario::new(
            "TC25",
            "negative_invalid_max_results_-1",
            ai().with(Param::MaxResults, -1),
            Expectation::one_of(&[400, 200]),
        ),
        Scenario::new(
            "TC26",
            "negative_invalid_max_results_21",
            ai().with(Param::MaxResults, 21),
            Expectation::one_of(&[400, 200]),
        ),
        Scenario::new(
            "TC27",
            "negative_invalid_chunks_per_source_0",
            ai().with(Param::SearchDepth, "advanced")
                .with(Param::ChunksPerSource, 0),
            Expectation::one_of(&[200, 422]),
        ),
        Scenario::new(
            "TC28",
            "negative_invalid_chunks_per_source_4",
            ai().with(Param::SearchDepth, "advanced")
                .with(Param::ChunksPerSource, 4),
            Expectation::one_of(&[200, 422]),
        ),
        Scenario::new(
            "TC29",
            "negative_invalid_start_date_format",
            ai().with(Param::StartDate, "01-01-2025"),
            bad_request(),
        ),
        Scenario::new(
            "TC30",
            "negative_invalid_end_date_format",
            ai().with(Param::EndDate, "01-31-2025"),
            bad_request(),
        ),
        Scenario::new(
            "TC31",
            "response_structure",
            ai(),
            ok().and(Check::ResultsIsList)
                .and(Check::ResponseTimePresent),
        ),
        Scenario::new(
            "TC32",
            "latency_metric",
            ai(),
            Expectation::any_status().and(Check::LatencyNonNegative),
        ),
    ]
}
