use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::provider::ProviderSpec;

/// Suffix appended to a provider name to form its fixture file name.
pub const FIXTURE_SUFFIX: &str = "_sample.json";

/// Supplies the raw response body for a provider query.
///
/// The resolver parses whatever a source returns through the same JSON path,
/// so live and canned responses are validated identically.
pub trait ResponseSource: fmt::Debug + Send + Sync {
    /// Return the body `provider` answers with for `encoded_address`.
    fn fetch(&self, provider: &ProviderSpec, encoded_address: &str) -> Result<String>;
}

/// Queries providers over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    /// Build a blocking HTTP client. `None` disables the request timeout.
    ///
    /// Must be called outside of an async runtime context.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("geoproxy/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl ResponseSource for HttpSource {
    fn fetch(&self, provider: &ProviderSpec, encoded_address: &str) -> Result<String> {
        let url = provider.request_url(encoded_address);
        tracing::debug!(provider = %provider.name, %url, "querying provider");

        // text() decodes using the charset from Content-Type, utf-8 otherwise
        let body = self
            .client
            .get(&url)
            .send()?
            .error_for_status()?
            .text()?;
        Ok(body)
    }
}

/// Reads canned provider responses from `<dir>/<name>_sample.json`.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    dir: Utf8PathBuf,
}

impl FixtureSource {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Path of the fixture standing in for `provider_name`.
    pub fn fixture_path(&self, provider_name: &str) -> Utf8PathBuf {
        self.dir.join(format!("{}{}", provider_name, FIXTURE_SUFFIX))
    }
}

impl ResponseSource for FixtureSource {
    fn fetch(&self, provider: &ProviderSpec, _encoded_address: &str) -> Result<String> {
        let path = self.fixture_path(&provider.name);
        std::fs::read_to_string(&path).map_err(|source| Error::Fixture { path, source })
    }
}
