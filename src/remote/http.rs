//! HTTP contact source using blocking reqwest.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;

use crate::contact::Page;
use crate::error::FetchError;
use crate::remote::ContactSource;

const USER_AGENT: &str = concat!("cbrowse/", env!("CARGO_PKG_VERSION"));

pub struct HttpContactSource {
    client: Client,
}

impl HttpContactSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl ContactSource for HttpContactSource {
    fn fetch_page(&self, url: &str) -> Result<Page, FetchError> {
        let parsed = Url::parse(url).map_err(|err| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        })?;

        let response = self
            .client
            .get(parsed)
            .send()
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|source| FetchError::Network {
            url: url.to_string(),
            source,
        })?;

        Page::from_json(&body)
    }
}
