//! Client for the remote paraphrasing service.
//!
//! Two endpoints: `POST /api/paraphrase` rewrites one text and
//! `GET /api/history` lists past rewrites. Calls are blocking and are meant
//! to run on a worker thread (see [`crate::worker`]); there is no retry, no
//! caching and no client-side timeout.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

const PARAPHRASE_PATH: &str = "/api/paraphrase";
const HISTORY_PATH: &str = "/api/history";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP error! status: {0}")]
    Status(StatusCode),

    #[error("malformed response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("request worker exited without a response")]
    WorkerLost,
}

/// One entry of the service's paraphrase history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub original_text: String,
    pub paraphrased_text: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ParaphraseRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ParaphraseResponse {
    paraphrased_text: String,
}

/// The operations the UI needs from the remote service.
pub trait ParaphraseService: Send + Sync {
    fn paraphrase(&self, text: &str) -> Result<String, ServiceError>;

    fn history(&self) -> Result<Vec<HistoryRecord>, ServiceError>;
}

pub struct HttpParaphraseService {
    client: Client,
    base_url: String,
}

impl HttpParaphraseService {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(ServiceError::Transport)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ServiceError::Status(status))
    }
}

impl ParaphraseService for HttpParaphraseService {
    fn paraphrase(&self, text: &str) -> Result<String, ServiceError> {
        let url = self.endpoint(PARAPHRASE_PATH);
        debug!("POST {url} ({} chars)", text.chars().count());

        let body = self
            .client
            .post(&url)
            .json(&ParaphraseRequest { text })
            .send()
            .map_err(ServiceError::Transport)
            .and_then(check_status)?
            .json::<ParaphraseResponse>()
            .map_err(ServiceError::Decode)?;
        Ok(body.paraphrased_text)
    }

    fn history(&self) -> Result<Vec<HistoryRecord>, ServiceError> {
        let url = self.endpoint(HISTORY_PATH);
        debug!("GET {url}");

        self.client
            .get(&url)
            .send()
            .map_err(ServiceError::Transport)
            .and_then(check_status)?
            .json::<Vec<HistoryRecord>>()
            .map_err(ServiceError::Decode)
    }
}

/// Parses the service's ISO-8601 timestamps. Values without an offset are
/// taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {raw:?}")))
}
