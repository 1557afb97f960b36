use std::{fs, io, path::PathBuf, thread, time::Duration};

use tracing::{debug, info};

use crate::config::ScraperConfig;
use crate::deobfuscator::FontFetcher;
use crate::urls;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    /// Server errors and transport failures may go away on their own.
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Request { .. } => true,
            FetchError::Status { status, .. } => *status >= 500,
            FetchError::Io { .. } => false,
        }
    }
}

/// Blocking client for fussball.de pages and obfuscation fonts.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::blocking::Client,
    base_url: String,
    attempts: u32,
    retry_delay: Duration,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(&config.scraping.user_agent)
            .timeout(config.scraping.request_timeout())
            .build()
            .map_err(|source| FetchError::Request {
                url: config.site.base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: config.site.base_url.clone(),
            attempts: config.scraping.font_fetch_attempts.max(1),
            retry_delay: config.scraping.retry_delay(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.retry_with_backoff(url, || {
            let response = self.send(url)?;
            let bytes = response.bytes().map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;
            Ok(bytes.to_vec())
        })
    }

    pub fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.retry_with_backoff(url, || {
            self.send(url)?.text().map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })
        })
    }

    fn send(&self, url: &str) -> Result<reqwest::blocking::Response, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| FetchError::Request {
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
        Ok(response)
    }

    fn retry_with_backoff<F, T>(&self, url: &str, mut operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Result<T, FetchError>,
    {
        let mut delay = self.retry_delay;
        let mut attempt = 1;

        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.attempts && e.is_transient() => {
                    info!("Retry attempt {} for {} after error: {}", attempt, url, e);
                    thread::sleep(delay);
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Downloads obfuscation fonts from the configured site.
pub struct HttpFontFetcher {
    client: HttpClient,
}

impl HttpFontFetcher {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl FontFetcher for HttpFontFetcher {
    fn fetch_font(&self, obfuscation_id: &str) -> Result<Vec<u8>, FetchError> {
        let url = urls::font_url(self.client.base_url(), obfuscation_id);
        debug!("Fetching font {}", url);
        self.client.get_bytes(&url)
    }
}

/// Reads fonts saved next to archived pages, named `{id}.woff`.
pub struct DirFontFetcher {
    dir: PathBuf,
}

impl DirFontFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FontFetcher for DirFontFetcher {
    fn fetch_font(&self, obfuscation_id: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.dir.join(format!("{obfuscation_id}.woff"));
        fs::read(&path).map_err(|source| FetchError::Io { path, source })
    }
}
