use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Main configuration structure, loaded once at startup
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub selector: SelectorConfig,
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// How listing pages are discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedMode {
    /// Load the base URL and collect listing links with `selector.list-links`
    #[default]
    Auto,
    /// Use the configured `urls` list as listing pages
    Manual,
}

/// Algorithm used to walk a paginated listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStrategy {
    /// Follow the "next page" control until it disappears
    NextLink,
    /// Read the total result count and synthesize every page URL
    TotalCount,
}

impl CrawlStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NextLink => "next_link",
            Self::TotalCount => "total_count",
        }
    }
}

/// Where the page number lives in a listing URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationType {
    /// `/jobs?page=3`
    Query,
    /// `/jobs/page/3`
    Path,
    /// `/jobs/p3`
    Segment,
    /// Single page listing
    None,
}

impl PaginationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Path => "path",
            Self::Segment => "segment",
            Self::None => "none",
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// URL crawling starts from; relative listing links resolve against it
    pub base_url: String,

    /// Optional base used instead of the listing page URL when resolving detail links
    #[serde(default)]
    pub detail_base_url: Option<String>,

    #[serde(default)]
    pub seed_mode: SeedMode,

    /// Listing pages supplied directly (manual seed mode)
    #[serde(default)]
    pub urls: Vec<String>,

    pub strategy: CrawlStrategy,

    /// Politeness delay between listing pages (seconds)
    #[serde(default = "default_sleep_seconds")]
    pub sleep_seconds: u64,

    /// Timeout applied to every remote operation (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Extra navigation attempts after a transient failure
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Number of concurrent queue submissions per listing page
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Number of pending jobs fetched per executor batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between executor batches (seconds)
    #[serde(default = "default_batch_interval_seconds")]
    pub batch_interval_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Extra request headers sent with every navigation
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Directory receiving `<job id>.html` artifacts
    pub output_directory: String,
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn sleep(&self) -> Duration {
        Duration::from_secs(self.sleep_seconds)
    }

    pub fn batch_interval(&self) -> Duration {
        Duration::from_secs(self.batch_interval_seconds)
    }
}

/// CSS selectors used against listing and detail pages
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelectorConfig {
    /// Links from the base URL to listing pages (auto seed mode)
    #[serde(default)]
    pub list_links: Option<String>,

    /// Links from a listing page to detail pages
    #[serde(default)]
    pub detail_links: Option<String>,

    /// The "next page" control (next_link strategy)
    #[serde(default)]
    pub next_page: Option<String>,

    /// Element holding the total result count (total_count strategy)
    #[serde(default)]
    pub total_count: Option<String>,

    /// Control clicked on a detail page before capturing its HTML
    #[serde(default)]
    pub tab_click: Option<String>,
}

/// Pagination description for listing URLs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PaginationConfig {
    #[serde(rename = "type")]
    pub kind: PaginationType,

    /// Query parameter name or path identifier carrying the page number
    #[serde(default)]
    pub param_identifier: Option<String>,

    /// printf-style page number format (`%d`, `%02d`) for path and segment types
    #[serde(default)]
    pub page_format: Option<String>,

    /// First page number
    #[serde(default = "default_start")]
    pub start: u32,

    /// Results per listing page
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Upper bound on pages followed by the next_link strategy
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl PaginationConfig {
    pub fn identifier(&self) -> Option<&str> {
        self.param_identifier.as_deref().filter(|s| !s.is_empty())
    }

    pub fn format(&self) -> &str {
        self.page_format.as_deref().unwrap_or("%d")
    }
}

/// Key-value backend holding the job queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Redis,
}

/// Job queue store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// SQLite database file
    #[serde(default)]
    pub path: Option<String>,

    /// Redis connection URL
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: Some(default_store_path()),
            url: None,
        }
    }
}

fn default_sleep_seconds() -> u64 {
    1
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    2
}

fn default_concurrency() -> usize {
    8
}

fn default_batch_size() -> usize {
    100
}

fn default_batch_interval_seconds() -> u64 {
    3
}

fn default_user_agent() -> String {
    format!("job-crawl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_start() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

fn default_max_pages() -> u32 {
    500
}

fn default_store_path() -> String {
    "./crawl_jobs.db".to_string()
}
