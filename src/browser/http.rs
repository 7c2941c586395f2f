//! HTTP browser implementation
//!
//! Fetches pages with reqwest and answers selector queries against the
//! static HTML with scraper. No JavaScript runs; a "click" follows the
//! `href` of the first matching element.

use crate::browser::{dom, Browser, BrowserError, BrowserResult};
use crate::config::CrawlerConfig;
use crate::url::resolve_against;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration (user agent, headers, timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(BrowserError)` - A header was invalid or the client failed to build
pub fn build_http_client(config: &CrawlerConfig) -> BrowserResult<Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| BrowserError::InvalidHeader(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| BrowserError::InvalidHeader(name.clone()))?;
        headers.insert(header_name, header_value);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.timeout())
        .connect_timeout(Duration::from_secs(10).min(config.timeout()))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// The document currently loaded
struct Page {
    /// Final URL after redirects
    url: Url,
    html: String,
}

/// Browser backed by plain HTTP requests
pub struct HttpBrowser {
    client: Client,
    page: Option<Page>,
}

impl HttpBrowser {
    pub fn new(config: &CrawlerConfig) -> BrowserResult<Self> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client, page: None }
    }

    fn page(&self) -> BrowserResult<&Page> {
        self.page.as_ref().ok_or(BrowserError::NoPage)
    }

    async fn load(&mut self, url: &Url) -> BrowserResult<()> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BrowserError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let html = response.text().await?;

        self.page = Some(Page {
            url: final_url,
            html,
        });
        Ok(())
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn navigate(&mut self, url: &Url) -> BrowserResult<()> {
        self.load(url).await
    }

    async fn click(&mut self, selector: &str) -> BrowserResult<()> {
        let target = {
            let page = self.page()?;
            let href = dom::click_target(&page.html, selector)?;
            resolve_against(&page.url, &href)?
        };
        self.load(&target).await
    }

    async fn exists(&mut self, selector: &str) -> BrowserResult<bool> {
        Ok(dom::count(&self.page()?.html, selector)? > 0)
    }

    async fn extract_text(&mut self, selector: &str) -> BrowserResult<Vec<String>> {
        dom::texts(&self.page()?.html, selector)
    }

    async fn extract_attribute(
        &mut self,
        selector: &str,
        attribute: &str,
    ) -> BrowserResult<Vec<String>> {
        dom::attributes(&self.page()?.html, selector, attribute)
    }

    async fn current_url(&mut self) -> BrowserResult<Url> {
        Ok(self.page()?.url.clone())
    }

    async fn html(&mut self) -> BrowserResult<String> {
        Ok(self.page()?.html.clone())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.page = None;
        Ok(())
    }
}
