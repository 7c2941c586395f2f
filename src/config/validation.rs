use crate::config::types::{
    Config, CrawlStrategy, CrawlerConfig, PaginationConfig, PaginationType, SeedMode,
    SelectorConfig, StoreBackend, StoreConfig,
};
use crate::url::{format_page_number, parse_absolute};
use crate::ConfigError;

/// Validates the entire configuration
///
/// Field ranges are checked per section, then the cross-field rules that tie
/// strategy, selectors, and pagination together.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_selectors(&config.crawler, &config.selector)?;
    validate_pagination(&config.pagination)?;
    validate_store(&config.store)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    parse_absolute(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if let Some(detail_base) = &config.detail_base_url {
        parse_absolute(detail_base)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid detail-base-url: {}", e)))?;
    }

    match config.seed_mode {
        SeedMode::Manual if config.urls.is_empty() => {
            return Err(ConfigError::Validation(
                "urls must list at least one listing page when seed-mode is manual".to_string(),
            ));
        }
        SeedMode::Manual => {
            for raw in &config.urls {
                crate::url::resolve(&config.base_url, raw).map_err(|e| {
                    ConfigError::InvalidUrl(format!("Invalid listing URL '{}': {}", raw, e))
                })?;
            }
        }
        SeedMode::Auto => {}
    }

    if config.sleep_seconds > 60 {
        return Err(ConfigError::Validation(format!(
            "sleep-seconds must be between 0 and 60, got {}",
            config.sleep_seconds
        )));
    }

    if config.timeout_seconds < 1 || config.timeout_seconds > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout-seconds must be between 1 and 300, got {}",
            config.timeout_seconds
        )));
    }

    if config.retry_count > 5 {
        return Err(ConfigError::Validation(format!(
            "retry-count must be between 0 and 5, got {}",
            config.retry_count
        )));
    }

    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.batch_size < 1 || config.batch_size > 1000 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be between 1 and 1000, got {}",
            config.batch_size
        )));
    }

    if config.batch_interval_seconds > 60 {
        return Err(ConfigError::Validation(format!(
            "batch-interval-seconds must be between 0 and 60, got {}",
            config.batch_interval_seconds
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.output_directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output-directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every selector the chosen strategy and seed mode need is present
fn validate_selectors(crawler: &CrawlerConfig, selector: &SelectorConfig) -> Result<(), ConfigError> {
    if crawler.seed_mode == SeedMode::Auto {
        require_selector("list-links", &selector.list_links, "seed-mode auto")?;
    }

    match crawler.strategy {
        CrawlStrategy::NextLink => {
            require_selector("next-page", &selector.next_page, "strategy next_link")?;
            require_selector("detail-links", &selector.detail_links, "strategy next_link")?;
        }
        CrawlStrategy::TotalCount => {
            require_selector("total-count", &selector.total_count, "strategy total_count")?;
        }
    }

    if let Some(tab) = &selector.tab_click {
        if tab.trim().is_empty() {
            return Err(ConfigError::Validation(
                "tab-click cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn require_selector(
    name: &str,
    value: &Option<String>,
    required_by: &str,
) -> Result<(), ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(()),
        _ => Err(ConfigError::Validation(format!(
            "selector.{} is required for {}",
            name, required_by
        ))),
    }
}

/// Validates pagination settings
fn validate_pagination(config: &PaginationConfig) -> Result<(), ConfigError> {
    if config.kind != PaginationType::None && config.identifier().is_none() {
        return Err(ConfigError::Validation(format!(
            "param-identifier is required when pagination type is {}",
            config.kind.as_str()
        )));
    }

    if matches!(config.kind, PaginationType::Path | PaginationType::Segment) {
        let format = config.page_format.as_deref().ok_or_else(|| {
            ConfigError::Validation(format!(
                "page-format is required when pagination type is {}",
                config.kind.as_str()
            ))
        })?;
        format_page_number(format, config.start)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
    }

    if config.per_page < 1 || config.per_page > 1000 {
        return Err(ConfigError::Validation(format!(
            "per-page must be between 1 and 1000, got {}",
            config.per_page
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max-pages must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the job queue store locator
fn validate_store(config: &StoreConfig) -> Result<(), ConfigError> {
    match config.backend {
        StoreBackend::Sqlite => match config.path.as_deref() {
            Some(path) if !path.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::Validation(
                "store.path is required for the sqlite backend".to_string(),
            )),
        },
        StoreBackend::Redis => {
            let url = config.url.as_deref().ok_or_else(|| {
                ConfigError::Validation("store.url is required for the redis backend".to_string())
            })?;
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(ConfigError::InvalidUrl(format!(
                    "store.url must use redis:// or rediss://, got '{}'",
                    url
                )));
            }
            Ok(())
        }
    }
}
