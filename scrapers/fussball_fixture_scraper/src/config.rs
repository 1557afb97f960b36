use serde::{Deserialize, Serialize};
use std::{env, str::FromStr, time::Duration};
use tracing::Level;

use crate::urls::DEFAULT_BASE_URL;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteConfig {
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapingConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Total attempts per font download, first try included.
    pub font_fetch_attempts: u32,
    pub retry_delay_ms: u64,
}

impl ScrapingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; FussballFixtureScraper/0.1)".to_string(),
            request_timeout_secs: 30,
            font_fetch_attempts: 2,
            retry_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
}

impl LoggingConfig {
    /// Unknown level names fall back to INFO.
    pub fn level(&self) -> Level {
        Level::from_str(self.level.trim()).unwrap_or(Level::INFO)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScraperConfig {
    pub site: SiteConfig,
    pub scraping: ScrapingConfig,
    pub logging: LoggingConfig,
}

impl ScraperConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = env::var("FUSSBALL_BASE_URL") {
            config.site.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(user_agent) = env::var("SCRAPER_USER_AGENT") {
            config.scraping.user_agent = user_agent;
        }
        if let Some(timeout) = parse_var::<u64>("SCRAPER_TIMEOUT_SECS") {
            config.scraping.request_timeout_secs = timeout;
        }
        if let Some(attempts) = parse_var::<u32>("FONT_FETCH_RETRIES") {
            config.scraping.font_fetch_attempts = attempts.max(1);
        }
        if let Some(delay) = parse_var::<u64>("FONT_FETCH_RETRY_DELAY_MS") {
            config.scraping.retry_delay_ms = delay;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        config
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "FUSSBALL_BASE_URL",
        "SCRAPER_USER_AGENT",
        "SCRAPER_TIMEOUT_SECS",
        "FONT_FETCH_RETRIES",
        "FONT_FETCH_RETRY_DELAY_MS",
        "LOG_LEVEL",
    ];

    fn clear_vars() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_vars();
        let config = ScraperConfig::from_env();
        assert_eq!(config, ScraperConfig::default());
        assert_eq!(config.site.base_url, "https://www.fussball.de");
        assert_eq!(config.logging.level(), Level::INFO);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_vars();
        env::set_var("FUSSBALL_BASE_URL", "http://localhost:8080/");
        env::set_var("SCRAPER_TIMEOUT_SECS", "5");
        env::set_var("FONT_FETCH_RETRIES", "0");
        env::set_var("LOG_LEVEL", "debug");

        let config = ScraperConfig::from_env();
        assert_eq!(config.site.base_url, "http://localhost:8080");
        assert_eq!(config.scraping.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.scraping.font_fetch_attempts, 1);
        assert_eq!(config.logging.level(), Level::DEBUG);
        clear_vars();
    }

    #[test]
    #[serial]
    fn test_unparseable_values_are_ignored() {
        clear_vars();
        env::set_var("SCRAPER_TIMEOUT_SECS", "soon");
        env::set_var("LOG_LEVEL", "chatty");

        let config = ScraperConfig::from_env();
        assert_eq!(config.scraping.request_timeout_secs, 30);
        assert_eq!(config.logging.level(), Level::INFO);
        clear_vars();
    }
}
