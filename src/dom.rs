//! Document loading and the thin HTML query primitives the core consumes.
//!
//! Parsed documents (`scraper::Html`) are not `Send`, so loaders hand back
//! raw bodies and the orchestrator parses them inside synchronous sections.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, ScraperError};

/// Loads page bodies for the fetch orchestrator.
///
/// Timeouts and retry policy live here, not in the core; the orchestrator
/// treats any error as the end of the pagination chain it came from.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load_url(&self, url: &str) -> Result<String>;
}

/// Production loader backed by a shared reqwest client.
pub struct HttpLoader {
    client: reqwest::Client,
}

impl HttpLoader {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl Default for HttpLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentLoader for HttpLoader {
    async fn load_url(&self, url: &str) -> Result<String> {
        let body = self.client.get(url).send().await?.text().await?;
        Ok(body)
    }
}

/// Deterministic loader for tests: serves local files for registered URLs.
#[derive(Default)]
pub struct FixtureLoader {
    routes: HashMap<String, PathBuf>,
}

impl FixtureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.routes.insert(url.into(), path.into());
        self
    }
}

#[async_trait]
impl DocumentLoader for FixtureLoader {
    async fn load_url(&self, url: &str) -> Result<String> {
        let path = self.routes.get(url).ok_or_else(|| ScraperError::Scrape {
            message: format!("no fixture registered for {url}"),
        })?;
        Ok(std::fs::read_to_string(path)?)
    }
}

pub fn parse_document(body: &str) -> Html {
    Html::parse_document(body)
}

pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScraperError::Selector(format!("{selector}: {e}")))
}

pub fn query_first<'a>(node: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    node.select(selector).next()
}

pub fn query_all<'a>(node: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    node.select(selector).collect()
}

pub fn inner_text(node: ElementRef<'_>) -> String {
    node.text().collect()
}

pub fn attr<'a>(node: ElementRef<'a>, name: &str) -> Option<&'a str> {
    node.value().attr(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn fixture_loader_serves_only_registered_routes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<html><body>hi</body></html>").unwrap();
        let loader = FixtureLoader::new().route("https://example.com/a", file.path());

        let body = loader.load_url("https://example.com/a").await.unwrap();
        assert!(body.contains("hi"));
        assert!(loader.load_url("https://example.com/b").await.is_err());
    }

    #[test]
    fn selector_helpers() {
        let doc = parse_document("<ul><li>one</li><li>two</li></ul>");
        let sel = parse_selector("li").unwrap();
        let root = doc.root_element();
        assert_eq!(query_all(root, &sel).len(), 2);
        let first = query_first(root, &sel).unwrap();
        assert_eq!(inner_text(first), "one");
        assert!(parse_selector("li[").is_err());
    }
}
