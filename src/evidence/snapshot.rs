//! Page evidence captured at the moment a record is produced

use crate::driver::PageDriver;

/// URL and raw markup of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    url: String,
    markup: Option<Vec<u8>>,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, markup: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            markup: Some(markup),
        }
    }

    /// A page whose markup could not be read
    pub fn unavailable(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            markup: None,
        }
    }

    /// Snapshots the driver's current page; never fails
    pub async fn capture<D: PageDriver + ?Sized>(driver: &D) -> Self {
        let url = driver.current_url();
        match driver.content().await {
            Ok(markup) => Self::new(url, markup),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Page markup unavailable");
                Self::unavailable(url)
            }
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn markup(&self) -> Option<&[u8]> {
        self.markup.as_deref()
    }
}
