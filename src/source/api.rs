//! HTTP JSON API reader

use super::DataSource;
use super::json::{dataset_from_records, select_records};
use crate::dataset::Dataset;
use crate::error::BoxError;
use base64::Engine;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::fmt;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Credentials sent with API requests
#[derive(Clone, PartialEq)]
pub enum Auth {
    /// `Authorization: ApiKey <key>`
    ApiKey(String),
    /// `Authorization: Basic <base64(user:password)>`
    Basic(String, String),
    None,
}

impl Auth {
    /// Pick the auth method from the `api_key`, `username` and `password`
    /// source options. An API key wins over basic credentials.
    pub fn from_source(source: &DataSource) -> Self {
        match (
            source.str_option("api_key"),
            source.str_option("username"),
            source.str_option("password"),
        ) {
            (Some(key), _, _) => Self::ApiKey(key.to_string()),
            (None, Some(user), Some(password)) => {
                Self::Basic(user.to_string(), password.to_string())
            }
            _ => Self::None,
        }
    }

    fn header(&self) -> Option<String> {
        match self {
            Self::ApiKey(key) => Some(format!("ApiKey {}", key)),
            Self::Basic(username, password) => {
                let credentials = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                Some(format!("Basic {}", credentials))
            }
            Self::None => None,
        }
    }
}

// Never print secrets
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => write!(f, "ApiKey"),
            Self::Basic(_, _) => write!(f, "Basic"),
            Self::None => write!(f, "None"),
        }
    }
}

pub(super) fn read(source: &DataSource) -> Result<Dataset, BoxError> {
    let url = Url::parse(&source.location)?;
    let auth = Auth::from_source(source);
    let timeout = source
        .u64_option("timeout_secs")?
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let mut headers = HeaderMap::new();
    if let Some(value) = auth.header() {
        let mut value = HeaderValue::from_str(&value)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    let client = Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout))
        .build()?;

    log::debug!("GET {} (auth: {})", url, auth);
    let response = client.get(url.clone()).send()?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(format!("GET {} returned {}: {}", url, status, body).into());
    }

    let document: serde_json::Value = response.json()?;
    let records = select_records(&document, source.str_option("records_path"))?;
    dataset_from_records(records)
}
