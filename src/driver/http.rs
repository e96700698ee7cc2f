//! HTTP page driver
//!
//! Drives server-rendered portals with plain requests: navigation is a GET,
//! clicking a submit control posts its enclosing form the way a browser
//! would, and a cookie store keeps the portal session alive across steps.

use crate::driver::document::{ClickAction, Document, FormMethod, FormSubmission};
use crate::driver::{ElementHandle, PageDriver};
use crate::{DriverError, DriverResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

/// Builds an HTTP client carrying the session cookie jar
///
/// # Arguments
///
/// * `user_agent` - The browser identity presented to the portal
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .cookie_store(true)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page driver backed by `reqwest`
pub struct HttpDriver {
    client: Client,
    current: Option<Document>,
    history: Vec<Document>,
    generation: u64,
}

impl HttpDriver {
    /// Creates a driver with a fresh session
    pub fn new(user_agent: &str) -> DriverResult<Self> {
        let client = build_http_client(user_agent).map_err(|source| DriverError::Http {
            url: String::new(),
            source,
        })?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            current: None,
            history: Vec::new(),
            generation: 0,
        }
    }

    fn document(&self) -> DriverResult<&Document> {
        self.current.as_ref().ok_or(DriverError::NoDocument)
    }

    fn document_mut(&mut self) -> DriverResult<&mut Document> {
        self.current.as_mut().ok_or(DriverError::NoDocument)
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Sends a request and makes the response the current page
    async fn load(&mut self, request: RequestBuilder, url: &str) -> DriverResult<()> {
        let response = request.send().await.map_err(|source| DriverError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DriverError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.bytes().await.map_err(|source| DriverError::Http {
            url: url.to_string(),
            source,
        })?;

        tracing::debug!(url = %final_url, bytes = body.len(), "Page loaded");

        let generation = self.next_generation();
        let page = Document::new(final_url, body.to_vec(), generation);
        if let Some(previous) = self.current.replace(page) {
            self.history.push(previous);
        }
        Ok(())
    }

    async fn submit(&mut self, submission: FormSubmission) -> DriverResult<()> {
        let url = submission.action.to_string();
        tracing::debug!(
            url = %url,
            method = ?submission.method,
            fields = submission.fields.len(),
            "Submitting form"
        );
        let request = match submission.method {
            FormMethod::Post => self
                .client
                .post(submission.action)
                .form(&submission.fields),
            FormMethod::Get => self
                .client
                .get(submission.action)
                .query(&submission.fields),
        };
        self.load(request, &url).await
    }
}

#[async_trait]
impl PageDriver for HttpDriver {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        let target = url::Url::parse(url)?;
        let request = self.client.get(target);
        self.load(request, url).await
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
        let action = self.document_mut()?.click(element)?;
        match action {
            ClickAction::Submit(submission) => self.submit(submission).await,
            ClickAction::Follow(url) => {
                let target = url.to_string();
                let request = self.client.get(url);
                self.load(request, &target).await
            }
            ClickAction::Toggled | ClickAction::Inert => Ok(()),
        }
    }

    async fn fill(&mut self, element: ElementHandle, text: &str) -> DriverResult<()> {
        self.document_mut()?.fill(element, text)
    }

    async fn is_checked(&self, element: ElementHandle) -> DriverResult<bool> {
        self.document()?.is_checked(element)
    }

    async fn content(&self) -> DriverResult<Vec<u8>> {
        Ok(self.document()?.raw().to_vec())
    }

    async fn go_back(&mut self) -> DriverResult<()> {
        let mut previous = self.history.pop().ok_or(DriverError::NoHistory)?;
        let generation = self.next_generation();
        previous.regenerate(generation);
        self.current = Some(previous);
        Ok(())
    }

    async fn close(&mut self) -> DriverResult<()> {
        tracing::debug!(pages = self.history.len() + 1, "Closing HTTP session");
        self.history.clear();
        self.current = None;
        Ok(())
    }
}
