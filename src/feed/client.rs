// client.rs
use crate::config::SyncConfig;
use crate::domain::{Category, RawRow};
use crate::errors::ConfigError;
use crate::feed::{parse_csv, FeedError, FeedSource};
use rand::Rng;
use reqwest::blocking::Client;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("register_sync/", env!("CARGO_PKG_VERSION"));
const MAX_BACKOFF_SECS: u64 = 10;
const JITTER_MAX_SECS: u64 = 2;

/// Downloads category datasets from the published register.
pub struct HttpFeed {
    client: Client,
    base: Url,
    urls: BTreeMap<Category, Url>,
    max_attempts: u32,
}

impl HttpFeed {
    pub fn new(config: &SyncConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        let urls = config
            .categories
            .iter()
            .map(|(category, _)| Ok((*category, config.category_url(*category)?)))
            .collect::<Result<BTreeMap<Category, Url>, ConfigError>>()?;

        Ok(Self {
            client,
            base: config.base_url()?,
            urls,
            max_attempts: config.max_fetch_attempts.max(1),
        })
    }

    fn url(&self, category: Category) -> Result<&Url, FeedError> {
        self.urls
            .get(&category)
            .ok_or_else(|| ConfigError::UnknownCategory(category.to_string()).into())
    }

    /// Fetches `url`, retrying transient failures with capped backoff plus jitter.
    fn fetch_text(&self, url: &Url) -> Result<String, FeedError> {
        let mut attempt = 1;
        loop {
            let start = Instant::now();
            match self.try_fetch_text(url) {
                Ok(text) => {
                    debug!(%url, attempt, elapsed = ?start.elapsed(), "fetched");
                    return Ok(text);
                }
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    warn!(%url, attempt, error = %e, "fetch failed, retrying");
                    let base = std::cmp::min(2 * u64::from(attempt), MAX_BACKOFF_SECS);
                    let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_SECS);
                    std::thread::sleep(Duration::from_secs(base + jitter));
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn try_fetch_text(&self, url: &Url) -> Result<String, FeedError> {
        let resp = self.client.get(url.clone()).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.text()?)
    }
}

impl FeedSource for HttpFeed {
    fn describe(&self) -> String {
        self.base.to_string()
    }

    fn fetch(&self, category: Category) -> Result<Vec<RawRow>, FeedError> {
        let url = self.url(category)?;
        let text = self.fetch_text(url)?;
        parse_csv(text.as_bytes())
    }
}
