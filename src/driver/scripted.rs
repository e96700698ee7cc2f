//! In-memory driver for exercising the crawl core without a network
//!
//! Pages are registered by URL; clicks on elements matching a registered
//! route selector navigate to the route's target page. Radios and text
//! fields behave as in [`Document`].

use crate::driver::document::{ClickAction, Document};
use crate::driver::{ElementHandle, PageDriver};
use crate::{DriverError, DriverResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use url::Url;

#[derive(Default)]
pub struct ScriptedDriver {
    pages: HashMap<String, Vec<u8>>,
    routes: Vec<(String, String)>,
    unreachable: HashSet<String>,
    unreadable: HashSet<String>,
    current: Option<Document>,
    history: Vec<Document>,
    generation: u64,
    pub visits: Vec<String>,
    pub closed: bool,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `html` at `url`
    pub fn page(mut self, url: &str, html: impl Into<Vec<u8>>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    /// Clicking an element matching `selector` loads `target`
    pub fn route(mut self, selector: &str, target: &str) -> Self {
        self.routes.push((selector.to_string(), target.to_string()));
        self
    }

    /// Navigation to `url` fails
    pub fn unreachable(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }

    /// Markup of the page at `url` cannot be read once it is shown
    pub fn unreadable(mut self, url: &str) -> Self {
        self.unreadable.insert(url.to_string());
        self
    }

    fn show(&mut self, url: &str) -> DriverResult<()> {
        if self.unreachable.contains(url) {
            return Err(DriverError::Status {
                url: url.to_string(),
                status: 503,
            });
        }
        let raw = self.pages.get(url).cloned().ok_or_else(|| DriverError::Status {
            url: url.to_string(),
            status: 404,
        })?;
        self.generation += 1;
        let page = Document::new(Url::parse(url)?, raw, self.generation);
        if let Some(previous) = self.current.replace(page) {
            self.history.push(previous);
        }
        self.visits.push(url.to_string());
        Ok(())
    }

    fn document(&self) -> DriverResult<&Document> {
        self.current.as_ref().ok_or(DriverError::NoDocument)
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.show(url)
    }

    fn current_url(&self) -> String {
        self.current
            .as_ref()
            .map(|d| d.url().to_string())
            .unwrap_or_else(|| "about:blank".to_string())
    }

    async fn title(&self) -> DriverResult<String> {
        Ok(self.document()?.title())
    }

    async fn query_one(&self, selector: &str) -> DriverResult<Option<ElementHandle>> {
        Ok(self.document()?.select(selector)?.into_iter().next())
    }

    async fn query_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>> {
        self.document()?.select(selector)
    }

    async fn query_within(
        &self,
        parent: ElementHandle,
        selector: &str,
    ) -> DriverResult<Vec<ElementHandle>> {
        self.document()?.select_within(parent, selector)
    }

    async fn text_content(&self, element: ElementHandle) -> DriverResult<String> {
        self.document()?.text(element)
    }

    async fn visible_text(&self) -> DriverResult<String> {
        Ok(self.document()?.visible_text())
    }

    async fn attribute(&self, element: ElementHandle, name: &str) -> DriverResult<Option<String>> {
        self.document()?.attribute(element, name)
    }

    async fn click(&mut self, element: ElementHandle) -> DriverResult<()> {
        let mut target = None;
        for (selector, url) in &self.routes {
            if self.document()?.select(selector)?.contains(&element) {
                target = Some(url.clone());
                break;
            }
        }
        match target {
            Some(url) => self.show(&url),
            None => {
                let doc = self.current.as_mut().ok_or(DriverError::NoDocument)?;
                match doc.click(element)? {
                    ClickAction::Follow(url) => self.show(url.as_str()),
                    _ => Ok(()),
                }
            }
        }
    }

    async fn fill(&mut self, element: ElementHandle, text: &str) -> DriverResult<()> {
        self.current
            .as_mut()
            .ok_or(DriverError::NoDocument)?
            .fill(element, text)
    }

    async fn is_checked(&self, element: ElementHandle) -> DriverResult<bool> {
        self.document()?.is_checked(element)
    }

    async fn content(&self) -> DriverResult<Vec<u8>> {
        let doc = self.document()?;
        if self.unreadable.contains(doc.url().as_str()) {
            return Err(DriverError::NoDocument);
        }
        Ok(doc.raw().to_vec())
    }

    async fn go_back(&mut self) -> DriverResult<()> {
        let mut previous = self.history.pop().ok_or(DriverError::NoHistory)?;
        self.generation += 1;
        previous.regenerate(self.generation);
        self.visits.push(format!("back:{}", previous.url()));
        self.current = Some(previous);
        Ok(())
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.closed = true;
        Ok(())
    }
}
