//! Shared fixtures for unit tests

use crate::browser::{dom, Browser, BrowserError, BrowserResult};
use crate::config::{
    Config, CrawlStrategy, CrawlerConfig, PaginationConfig, PaginationType, SeedMode,
    SelectorConfig, StoreConfig,
};
use crate::output::{ArtifactSink, SinkError};
use crate::url::resolve_against;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use url::Url;

/// A valid next_link configuration rooted at `base_url`
pub fn test_config(base_url: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            base_url: base_url.to_string(),
            detail_base_url: None,
            seed_mode: SeedMode::Auto,
            urls: Vec::new(),
            strategy: CrawlStrategy::NextLink,
            sleep_seconds: 0,
            timeout_seconds: 5,
            retry_count: 0,
            concurrency: 4,
            batch_size: 10,
            batch_interval_seconds: 0,
            user_agent: "job-crawl-test/1.0".to_string(),
            headers: HashMap::new(),
            output_directory: "./pages".to_string(),
        },
        selector: SelectorConfig {
            list_links: Some("a.area".to_string()),
            detail_links: Some("a.job".to_string()),
            next_page: Some("a.next".to_string()),
            total_count: None,
            tab_click: None,
        },
        pagination: PaginationConfig {
            kind: PaginationType::None,
            param_identifier: None,
            page_format: None,
            start: 1,
            per_page: 50,
            max_pages: 500,
        },
        store: StoreConfig::default(),
    }
}

fn normalize(url: &str) -> String {
    Url::parse(url).unwrap().to_string()
}

/// Fake browser serving canned HTML by URL
///
/// Unknown URLs answer 404; URLs marked failing raise a navigation error.
#[derive(Default)]
pub struct ScriptedBrowser {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    current: Option<(Url, String)>,
    visits: Arc<Mutex<Vec<String>>>,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(normalize(url), html.to_string());
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(normalize(url));
        self
    }

    /// Shared log of every URL navigated to, in order
    pub fn visits(&self) -> Arc<Mutex<Vec<String>>> {
        self.visits.clone()
    }

    fn current(&self) -> BrowserResult<&(Url, String)> {
        self.current.as_ref().ok_or(BrowserError::NoPage)
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn navigate(&mut self, url: &Url) -> BrowserResult<()> {
        self.visits.lock().unwrap().push(url.to_string());

        if self.failing.contains(url.as_str()) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "scripted failure".to_string(),
            });
        }

        match self.pages.get(url.as_str()) {
            Some(html) => {
                self.current = Some((url.clone(), html.clone()));
                Ok(())
            }
            None => Err(BrowserError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    async fn click(&mut self, selector: &str) -> BrowserResult<()> {
        let target = {
            let (url, html) = self.current()?;
            let href = dom::click_target(html, selector)?;
            resolve_against(url, &href)?
        };
        self.navigate(&target).await
    }

    async fn exists(&mut self, selector: &str) -> BrowserResult<bool> {
        Ok(dom::count(&self.current()?.1, selector)? > 0)
    }

    async fn extract_text(&mut self, selector: &str) -> BrowserResult<Vec<String>> {
        dom::texts(&self.current()?.1, selector)
    }

    async fn extract_attribute(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> BrowserResult<Vec<String>> {
        dom::attributes(&self.current()?.1, selector, attribute)
    }

    async fn current_url(&mut self) -> BrowserResult<Url> {
        Ok(self.current()?.0.clone())
    }

    async fn html(&mut self) -> BrowserResult<String> {
        Ok(self.current()?.1.clone())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.current = None;
        Ok(())
    }
}

/// Sink keeping artifacts in memory
#[derive(Default, Clone)]
pub struct MemorySink {
    files: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySink {
    pub fn files(&self) -> HashMap<String, String> {
        self.files.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn save_html(&self, name: &str, content: &str) -> Result<(), SinkError> {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), content.to_string());
        Ok(())
    }
}
