use std::env;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_TICK_MS: u64 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REFRESH_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub tick_interval: Duration,
    pub request_timeout: Duration,
    pub refresh_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let base_url = lookup("FITPLAY_SERVER_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.base_url);

        Self {
            base_url: normalize_base_url(&base_url),
            tick_interval: positive(&lookup, "FITPLAY_TICK_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            request_timeout: positive(&lookup, "FITPLAY_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            refresh_interval: positive(&lookup, "FITPLAY_REFRESH_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.refresh_interval),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }
}

fn positive(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    lookup(key)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
