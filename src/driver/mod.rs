//! Page driver module
//!
//! This module defines the capability the crawl core consumes to interact
//! with a rendered portal, plus the implementations shipped with the crate:
//! - `PageDriver`: navigation, selector queries, clicks, form filling, markup
//! - `Document`: one loaded page with its form-state overlay
//! - `HttpDriver`: a `reqwest` session driving server-rendered forms

mod document;
mod http;
#[cfg(test)]
pub(crate) mod scripted;
mod traits;

pub use document::{ClickAction, Document, FormMethod, FormSubmission};
pub use http::{build_http_client, HttpDriver};
pub use traits::{ElementHandle, PageDriver};
