//! Page driver trait and element handles
//!
//! The crawl core never touches a browser or an HTTP client directly; it
//! consumes this capability instead.

use crate::DriverResult;
use async_trait::async_trait;

/// Opaque reference to one element of the currently rendered page
///
/// Handles are only meaningful for the page they were resolved on. Any
/// navigation (including clicks that submit a form and history steps)
/// invalidates them, and using one afterwards fails with
/// [`crate::DriverError::StaleElement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    generation: u64,
    index: usize,
}

impl ElementHandle {
    pub fn new(generation: u64, index: usize) -> Self {
        Self { generation, index }
    }

    /// Page generation this handle was resolved against
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Position of the element in document order
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Blocking, fallible page capability consumed by the crawl core
///
/// Every operation is awaited in sequence by a single task; implementations
/// own one session, one active page, and its history.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Loads `url` as the current page
    async fn navigate(&mut self, url: &str) -> DriverResult<()>;

    /// URL of the current page, or `about:blank` before the first navigation
    fn current_url(&self) -> String;

    /// Text of the current page's `<title>`
    async fn title(&self) -> DriverResult<String>;

    /// First element matching `selector`; `None` when absent
    async fn query_one(&self, selector: &str) -> DriverResult<Option<ElementHandle>>;

    /// Every element matching `selector`, in document order
    async fn query_all(&self, selector: &str) -> DriverResult<Vec<ElementHandle>>;

    /// Descendants of `parent` matching `selector`, in document order
    async fn query_within(
        &self,
        parent: ElementHandle,
        selector: &str,
    ) -> DriverResult<Vec<ElementHandle>>;

    /// Concatenated text of the element and its descendants, untrimmed
    async fn text_content(&self, element: ElementHandle) -> DriverResult<String>;

    /// Text a reader would see on the current page, without script or style bodies
    async fn visible_text(&self) -> DriverResult<String>;

    async fn attribute(&self, element: ElementHandle, name: &str) -> DriverResult<Option<String>>;

    /// Activates the element the way a user click would
    async fn click(&mut self, element: ElementHandle) -> DriverResult<()>;

    /// Replaces the value of a text control
    async fn fill(&mut self, element: ElementHandle, text: &str) -> DriverResult<()>;

    async fn is_checked(&self, element: ElementHandle) -> DriverResult<bool>;

    /// Raw markup of the current page exactly as served
    async fn content(&self) -> DriverResult<Vec<u8>>;

    /// Steps back one entry in the session history
    async fn go_back(&mut self) -> DriverResult<()>;

    /// Releases the session; called exactly once on every crawl exit path
    async fn close(&mut self) -> DriverResult<()>;
}
