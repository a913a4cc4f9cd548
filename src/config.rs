use std::net::SocketAddr;

use url::Url;

use crate::error::ConfigError;

const DEFAULT_JSONBIN_URL: &str = "https://api.jsonbin.io/v3/b/";
const DEFAULT_PUBLIC_URL: &str = "https://quiz.party/";
const DEFAULT_ADMIN_PASSWORD: &str = "1234";

/// Credentials of the remote document. Both values are required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub api_key: String,
    pub bin_id: String,
    pub base_url: Url,
}

#[derive(Debug, Clone)]
pub struct Webhook {
    pub url: Url,
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub teloxide_token: String,
    /// `Err` keeps the reason around so the administrator can be told.
    pub store: Result<StoreConfig, ConfigError>,
    pub admin_password: String,
    pub public_url: Url,
    pub log_level: String,
    pub webhook: Option<Webhook>,
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse::<Url>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

impl StoreConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key =
            non_empty(&lookup, "JSONBIN_API_KEY").ok_or(ConfigError::Missing("JSONBIN_API_KEY"))?;
        let bin_id =
            non_empty(&lookup, "JSONBIN_BIN_ID").ok_or(ConfigError::Missing("JSONBIN_BIN_ID"))?;
        let mut base_url = parse_url(
            "JSONBIN_URL",
            &non_empty(&lookup, "JSONBIN_URL").unwrap_or_else(|| DEFAULT_JSONBIN_URL.into()),
        )?;
        // `Url::join` drops the last segment unless the base ends with a slash.
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self {
            api_key,
            bin_id,
            base_url,
        })
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let teloxide_token =
            non_empty(&lookup, "TELOXIDE_TOKEN").ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;

        let public_url = parse_url(
            "PUBLIC_URL",
            &non_empty(&lookup, "PUBLIC_URL").unwrap_or_else(|| DEFAULT_PUBLIC_URL.into()),
        )?;

        let webhook = match (non_empty(&lookup, "NGROK_URL"), non_empty(&lookup, "NGROK_ADDR")) {
            (Some(url), Some(addr)) => Some(Webhook {
                url: parse_url("NGROK_URL", &url)?,
                addr: addr.parse().map_err(|e: std::net::AddrParseError| {
                    ConfigError::Invalid {
                        name: "NGROK_ADDR",
                        reason: e.to_string(),
                    }
                })?,
            }),
            _ => None,
        };

        Ok(Self {
            teloxide_token,
            store: StoreConfig::from_lookup(&lookup),
            admin_password: non_empty(&lookup, "ADMIN_PASSWORD")
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.into()),
            public_url,
            log_level: non_empty(&lookup, "LOG_LEVEL").unwrap_or_else(|| "error".into()),
            webhook,
        })
    }
}
