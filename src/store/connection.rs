use std::{collections::HashMap, future::Future};

use reqwest::{header::HeaderValue, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use url::Url;

use super::quiz::AppData;
use crate::{
    config::StoreConfig,
    error::{ConfigError, StoreError},
};

const MASTER_KEY_HEADER: &str = "X-Master-Key";

/// Raw access to the single JSON document holding the whole application state.
pub trait Document: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<AppData, StoreError>> + Send;

    /// Full overwrite. There is no version check: the last writer wins.
    fn write(&self, data: &AppData) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// A JSONBin-style document API: `GET <bin>/latest` reads, `PUT <bin>` replaces.
pub struct JsonBin {
    client: reqwest::Client,
    bin_url: Url,
    api_key: HeaderValue,
}

#[derive(Deserialize)]
struct Latest {
    record: Option<serde_json::Value>,
}

impl JsonBin {
    pub fn connect(config: &StoreConfig) -> Result<Self, ConfigError> {
        let bin_url = config
            .base_url
            .join(&config.bin_id)
            .map_err(|e| ConfigError::Invalid {
                name: "JSONBIN_BIN_ID",
                reason: e.to_string(),
            })?;
        let mut api_key =
            HeaderValue::from_str(&config.api_key).map_err(|e| ConfigError::Invalid {
                name: "JSONBIN_API_KEY",
                reason: e.to_string(),
            })?;
        api_key.set_sensitive(true);

        Ok(Self {
            client: reqwest::Client::new(),
            bin_url,
            api_key,
        })
    }

    fn latest_url(&self) -> String {
        format!("{}/latest", self.bin_url)
    }
}

/// Top-level shape of a stored document. Entries are checked one by one.
#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    quizzes: Vec<serde_json::Value>,
    #[serde(default)]
    podiums: HashMap<String, serde_json::Value>,
}

fn entries<T: DeserializeOwned>(values: Vec<serde_json::Value>, what: &str) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping malformed {} entry: {}", what, e);
                None
            }
        })
        .collect()
}

/// Pulls the document out of a `/latest` response body. Only a record of the
/// wrong shape counts as an empty document; bad entries inside it are skipped.
pub(crate) fn parse_latest(body: &str) -> AppData {
    let Some(record) = serde_json::from_str::<Latest>(body)
        .ok()
        .and_then(|latest| latest.record)
    else {
        return AppData::default();
    };

    let raw = match serde_json::from_value::<RawDocument>(record) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Stored document is malformed, using an empty one: {}", e);
            return AppData::default();
        }
    };

    let podiums = raw
        .podiums
        .into_iter()
        .filter_map(|(quiz_id, results)| match results {
            serde_json::Value::Array(results) => Some((quiz_id, entries(results, "result"))),
            _ => {
                log::warn!("Skipping malformed podium of quiz {}", quiz_id);
                None
            }
        })
        .collect();

    AppData {
        quizzes: entries(raw.quizzes, "quiz"),
        podiums,
    }
}

impl Document for JsonBin {
    async fn fetch(&self) -> Result<AppData, StoreError> {
        log::debug!("Fetching document from {}", self.bin_url);
        let response = self
            .client
            .get(self.latest_url())
            .header(MASTER_KEY_HEADER, self.api_key.clone())
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                log::info!("Document {} doesn't exist yet.", self.bin_url);
                Ok(AppData::default())
            }
            status if status.is_success() => {
                let body = response.text().await?;
                Ok(parse_latest(&body))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                log::error!("Fetching document failed: {} {}", status, body);
                Err(StoreError::Status { status, body })
            }
        }
    }

    async fn write(&self, data: &AppData) -> Result<(), StoreError> {
        let body = serde_json::to_vec(data)?;
        log::debug!("Writing {} bytes to {}", body.len(), self.bin_url);

        let response = self
            .client
            .put(self.bin_url.clone())
            .header(MASTER_KEY_HEADER, self.api_key.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            log::error!("Saving document failed: {} {}", status, body);
            Err(StoreError::Status { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_record_from_latest_response() {
        let body = r#"{
            "record": {"quizzes": [], "podiums": {"42": [{"id": "a", "name": "Ann", "score": 2}]}},
            "metadata": {"id": "bin", "private": true}
        }"#;

        let data = parse_latest(body);

        assert_eq!(data.podiums["42"][0].name(), "Ann");
    }

    #[test]
    fn bad_entries_are_skipped_not_the_whole_document() {
        let body = r#"{"record": {
            "quizzes": [
                {"id": "1", "title": "Party", "questions": [{"question": "Q", "options": ["a", "b"], "answerIndex": 0}]},
                {"id": "2"}
            ],
            "podiums": {"1": [{"id": "init"}, {"id": "r", "name": "Ann", "score": 2}, 7], "2": "oops"}
        }}"#;

        let data = parse_latest(body);

        assert_eq!(data.quizzes.len(), 1);
        assert_eq!(data.quizzes[0].title(), "Party");
        let podium = &data.podiums["1"];
        assert_eq!(podium.len(), 2);
        assert!(podium[0].is_sentinel());
        assert_eq!(podium[1].name(), "Ann");
        assert!(!data.podiums.contains_key("2"));
    }

    #[test]
    fn malformed_record_is_empty_document() {
        assert_eq!(parse_latest(r#"{"record": [1, 2, 3]}"#), AppData::default());
        assert_eq!(parse_latest(r#"{"metadata": {}}"#), AppData::default());
        assert_eq!(parse_latest("not json"), AppData::default());
    }

    #[test]
    fn bin_url_is_built_from_base_and_id() {
        let config = StoreConfig {
            api_key: "$2a$10$key".into(),
            bin_id: "68f6940f".into(),
            base_url: Url::parse("https://api.jsonbin.io/v3/b/").unwrap(),
        };

        let bin = JsonBin::connect(&config).unwrap();

        assert_eq!(bin.bin_url.as_str(), "https://api.jsonbin.io/v3/b/68f6940f");
        assert_eq!(bin.latest_url(), "https://api.jsonbin.io/v3/b/68f6940f/latest");
    }
}
