//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::utils::normalize_site;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the mirrored wiki
    #[serde(default = "defaults::site")]
    pub site: String,

    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Local capture store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Which optional capture phases run, and where they read from
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.site = normalize_site(&config.site);
        config.scope_title_index();
        Ok(config)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Replace the site, normalizing bare wiki names.
    pub fn with_site(mut self, site: &str) -> Self {
        self.site = normalize_site(site);
        self.scope_title_index();
        self
    }

    /// Drop the stock title index on sites other than the SCP wiki. Custom
    /// lists are kept.
    fn scope_title_index(&mut self) {
        if self.site != defaults::site()
            && self.capture.title_index_pages == defaults::title_index_pages()
        {
            self.capture.title_index_pages.clear();
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.site).is_err() {
            return Err(AppError::validation(format!(
                "site '{}' is not a valid URL",
                self.site
            )));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_attempts == 0 {
            return Err(AppError::validation("crawler.max_attempts must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.store.batch_size == 0 {
            return Err(AppError::validation("store.batch_size must be > 0"));
        }
        if self.store.queue_high_water == 0 {
            return Err(AppError::validation("store.queue_high_water must be > 0"));
        }
        if self.capture.metadata && !self.capture.image_review.url_template.contains("{}") {
            return Err(AppError::validation(
                "capture.image_review.url_template must contain '{}'",
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: defaults::site(),
            crawler: CrawlerConfig::default(),
            store: StoreConfig::default(),
            capture: CaptureConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Attempt ceiling for a single request
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Base delay between retries in milliseconds, multiplied by the attempt number
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,

    /// Maximum concurrent page fetches during a capture
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Session cookie of an already authenticated user
    #[serde(default)]
    pub session_id: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_attempts: defaults::max_attempts(),
            retry_delay_ms: defaults::retry_delay(),
            max_concurrent: defaults::max_concurrent(),
            session_id: None,
        }
    }
}

/// Local capture store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the SQLite capture file
    #[serde(default = "defaults::store_path")]
    pub path: PathBuf,

    /// Queue items accumulated before the writer flushes a transaction
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,

    /// Queue depth at which producers block until the writer catches up
    #[serde(default = "defaults::queue_high_water")]
    pub queue_high_water: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: defaults::store_path(),
            batch_size: defaults::batch_size(),
            queue_high_water: defaults::queue_high_water(),
        }
    }
}

/// Capture phase settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Also capture standalone forum categories and threads
    #[serde(default)]
    pub forums: bool,

    /// Capture license-reviewed images and author overrides
    #[serde(default)]
    pub metadata: bool,

    /// Also capture the wiki source of every page (one extra call per page)
    #[serde(default)]
    pub source_text: bool,

    /// Page holding the author override table
    #[serde(default = "defaults::attribution_page")]
    pub attribution_page: String,

    /// Where license review tables are published
    #[serde(default)]
    pub image_review: ImageReviewConfig,

    /// Index pages used to build the numbered-entry title table
    #[serde(default = "defaults::title_index_pages")]
    pub title_index_pages: Vec<String>,

    /// Forum categories skipped by the forum phase
    #[serde(default = "defaults::excluded_categories")]
    pub excluded_categories: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            forums: false,
            metadata: false,
            source_text: false,
            attribution_page: defaults::attribution_page(),
            image_review: ImageReviewConfig::default(),
            title_index_pages: defaults::title_index_pages(),
            excluded_categories: defaults::excluded_categories(),
        }
    }
}

/// Location of the image license review tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageReviewConfig {
    /// URL of one review page, `{}` replaced by the page number
    #[serde(default = "defaults::image_review_template")]
    pub url_template: String,

    /// Number of review pages
    #[serde(default = "defaults::image_review_pages")]
    pub pages: usize,
}

impl ImageReviewConfig {
    /// All review page URLs, in order.
    pub fn urls(&self) -> Vec<String> {
        (1..=self.pages)
            .map(|n| self.url_template.replace("{}", &n.to_string()))
            .collect()
    }
}

impl Default for ImageReviewConfig {
    fn default() -> Self {
        Self {
            url_template: defaults::image_review_template(),
            pages: defaults::image_review_pages(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum level: debug, info, warn or error
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn site() -> String {
        "http://www.scp-wiki.net".into()
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; wikimirror/0.1)".into()
    }
    pub fn timeout() -> u64 {
        60
    }
    pub fn max_attempts() -> u32 {
        10
    }
    pub fn retry_delay() -> u64 {
        250
    }
    pub fn max_concurrent() -> usize {
        20
    }

    // Store defaults
    pub fn store_path() -> PathBuf {
        PathBuf::from("capture.db")
    }
    pub fn batch_size() -> usize {
        500
    }
    pub fn queue_high_water() -> usize {
        10_000
    }

    // Capture defaults
    pub fn attribution_page() -> String {
        "attribution-metadata".into()
    }
    pub fn image_review_template() -> String {
        "http://scpsandbox2.wikidot.com/image-review-{}".into()
    }
    pub fn image_review_pages() -> usize {
        35
    }
    pub fn title_index_pages() -> Vec<String> {
        [
            "scp-series",
            "scp-series-2",
            "scp-series-3",
            "scp-series-4",
            "scp-series-5",
            "scp-series-6",
            "joke-scps",
            "scp-ex",
            "archived-scps",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
    pub fn excluded_categories() -> Vec<String> {
        vec!["Per page discussions".into()]
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
