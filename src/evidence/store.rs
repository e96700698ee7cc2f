//! Tiered, never-failing persistence
//!
//! `persist` escalates through three tiers:
//! 1. The record as indented JSON at its destination
//! 2. A markup capture of the live page plus an error-metadata record
//! 3. A full dump into the session log
//!
//! Every write creates a new file; nothing is ever overwritten.

use crate::evidence::naming::{sanitize, timestamp};
use crate::evidence::{OutputLayout, PageSnapshot};
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound on `_N` suffixes tried before giving up on a name
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Where a persisted record ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    /// The record itself, as structured JSON
    Structured(PathBuf),
    /// A raw markup capture standing in for the record
    Markup(PathBuf),
    /// Nothing could be written; the record was dumped into this log file
    LogOnly(PathBuf),
}

impl ArtifactLocation {
    pub fn path(&self) -> &Path {
        match self {
            Self::Structured(path) | Self::Markup(path) | Self::LogOnly(path) => path,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured(path) => write!(f, "{}", path.display()),
            Self::Markup(path) => write!(f, "{} (markup fallback)", path.display()),
            Self::LogOnly(path) => write!(f, "{} (log only)", path.display()),
        }
    }
}

/// Raw markup that is written verbatim instead of serialized
#[derive(Debug, Clone, Serialize)]
pub struct RawMarkup {
    #[serde(skip)]
    pub html_content: Vec<u8>,
    pub url: String,
    pub error_type: String,
}

/// Anything the store can persist
pub trait Persistable: Serialize + fmt::Debug {
    /// Markup sentinel; when present, it is written as-is
    fn raw_markup(&self) -> Option<&RawMarkup> {
        None
    }
}

impl Persistable for RawMarkup {
    fn raw_markup(&self) -> Option<&RawMarkup> {
        Some(self)
    }
}

#[derive(Debug, Error)]
enum EvidenceError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("write to {path} failed: {source}")]
    Write { path: PathBuf, source: io::Error },
}

impl EvidenceError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Serialize(_) => "serialization_error",
            Self::Write { .. } => "write_error",
        }
    }
}

/// Companion record describing a failed save or a crawl failure
#[derive(Debug, Serialize)]
struct ErrorMetadata<'a> {
    search_term: &'a str,
    error_message: String,
    timestamp: String,
    url: &'a str,
    error_type: &'a str,
    html_fallback_file: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<&'a str>,
}

/// Owns every write under the output root
pub struct EvidenceStore {
    layout: OutputLayout,
    filename_limit: usize,
}

impl EvidenceStore {
    /// Opens the store, creating the output layout under `root`
    pub fn open(root: impl Into<PathBuf>, filename_limit: usize) -> io::Result<Self> {
        Ok(Self::with_layout(OutputLayout::create(root)?, filename_limit))
    }

    pub fn with_layout(layout: OutputLayout, filename_limit: usize) -> Self {
        Self {
            layout,
            filename_limit,
        }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn filename_limit(&self) -> usize {
        self.filename_limit
    }

    /// Persists `record` at `destination` (relative to the output root)
    ///
    /// Never fails. When the structured write fails, the live page markup
    /// from `page` is captured with an error-metadata sibling and the
    /// capture's location is returned instead. When that fails too, the
    /// record is logged in full and the session log is returned.
    pub fn persist<T: Persistable + ?Sized>(
        &self,
        record: &T,
        destination: &str,
        page: &PageSnapshot,
    ) -> ArtifactLocation {
        if let Some(raw) = record.raw_markup() {
            let path = self
                .layout
                .html_fallback()
                .join(format!("{}.html", self.stem(destination)));
            return match write_new(&path, &raw.html_content) {
                Ok(written) => {
                    tracing::info!(path = %written.display(), "Markup saved");
                    ArtifactLocation::Markup(written)
                }
                Err(source) => self.demote(record, destination, page, EvidenceError::Write { path, source }),
            };
        }

        match self.write_structured(record, destination) {
            Ok(written) => {
                tracing::info!(path = %written.display(), "Record saved");
                ArtifactLocation::Structured(written)
            }
            Err(e) => self.demote(record, destination, page, e),
        }
    }

    fn write_structured<T: Persistable + ?Sized>(
        &self,
        record: &T,
        destination: &str,
    ) -> Result<PathBuf, EvidenceError> {
        let bytes = serde_json::to_vec_pretty(record)?;
        let path = self.layout.root().join(destination);
        write_new(&path, &bytes).map_err(|source| EvidenceError::Write { path, source })
    }

    /// Falls back to markup plus error metadata, then to the log
    fn demote<T: Persistable + ?Sized>(
        &self,
        record: &T,
        destination: &str,
        page: &PageSnapshot,
        error: EvidenceError,
    ) -> ArtifactLocation {
        let stem = self.stem(destination);
        tracing::error!(destination, error = %error, "Failed to save record; falling back to markup");

        let capture = self.capture_markup(page, &format!("save_fail_{}", stem), error.kind());

        let metadata = ErrorMetadata {
            search_term: "",
            error_message: error.to_string(),
            timestamp: timestamp(),
            url: page.url(),
            error_type: error.kind(),
            html_fallback_file: capture.as_deref(),
            destination: Some(destination),
        };
        let metadata_path = self
            .layout
            .errors()
            .join(format!("save_error_{}_{}.json", stem, timestamp()));
        if let Err(e) = self.write_json(&metadata_path, &metadata) {
            tracing::error!(error = %e, "Failed to save error metadata");
        }

        match capture {
            Some(path) => ArtifactLocation::Markup(path),
            None => {
                tracing::error!(
                    destination,
                    url = %page.url(),
                    record = ?record,
                    "Evidence could not be written; record kept in session log only"
                );
                ArtifactLocation::LogOnly(self.layout.log_file().to_path_buf())
            }
        }
    }

    /// Writes the page markup to `html_fallback/` behind a comment header
    ///
    /// # Arguments
    ///
    /// * `page` - The page to capture; unavailable markup leaves only the header
    /// * `prefix` - Free-text identifier, sanitized into the file name
    /// * `error_type` - Category recorded in the name and the header
    ///
    /// # Returns
    ///
    /// The written path, or `None` when the capture could not be written.
    pub fn capture_markup(
        &self,
        page: &PageSnapshot,
        prefix: &str,
        error_type: &str,
    ) -> Option<PathBuf> {
        let ts = timestamp();
        let name = format!(
            "{}_{}_{}.html",
            sanitize(prefix, self.filename_limit),
            error_type,
            ts
        );
        let path = self.layout.html_fallback().join(name);

        let mut content = format!(
            "<!-- Error Type: {} -->\n<!-- Timestamp: {} -->\n<!-- URL: {} -->\n",
            error_type,
            ts,
            page.url()
        )
        .into_bytes();
        match page.markup() {
            Some(markup) => content.extend_from_slice(markup),
            None => content.extend_from_slice(b"<!-- Markup unavailable -->\n"),
        }

        match write_new(&path, &content) {
            Ok(written) => {
                tracing::info!(path = %written.display(), "HTML fallback saved");
                Some(written)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to save HTML fallback");
                None
            }
        }
    }

    /// Records a row or term failure in `errors/`, with a markup capture when available
    pub fn record_error(
        &self,
        search_term: &str,
        message: &str,
        page: Option<&PageSnapshot>,
    ) -> Option<PathBuf> {
        let capture = page
            .filter(|p| p.markup().is_some())
            .and_then(|p| self.capture_markup(p, &format!("error_{}", search_term), "page_capture"));

        let ts = timestamp();
        let metadata = ErrorMetadata {
            search_term,
            error_message: message.to_string(),
            timestamp: ts.clone(),
            url: page.map(|p| p.url()).unwrap_or("about:blank"),
            error_type: "crawling_error",
            html_fallback_file: capture.as_deref(),
            destination: None,
        };
        let path = self.layout.errors().join(format!(
            "error_{}_{}.json",
            sanitize(search_term, self.filename_limit),
            ts
        ));

        match self.write_json(&path, &metadata) {
            Ok(written) => {
                tracing::error!(term = %search_term, path = %written.display(), "Error logged");
                Some(written)
            }
            Err(e) => {
                tracing::error!(term = %search_term, message, error = %e, "Failed to save error log");
                None
            }
        }
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<PathBuf, EvidenceError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        write_new(path, &bytes).map_err(|source| EvidenceError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn stem(&self, destination: &str) -> String {
        Path::new(destination)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| destination.to_string())
    }
}

/// Creates `path` exclusively, adding `_2`, `_3`, ... to the stem on collision
fn write_new(path: &Path, bytes: &[u8]) -> io::Result<PathBuf> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let candidate = if attempt == 1 {
            path.to_path_buf()
        } else {
            let name = match &extension {
                Some(ext) => format!("{}_{}.{}", stem, attempt, ext),
                None => format!("{}_{}", stem, attempt),
            };
            path.with_file_name(name)
        };

        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => {
                write_or_discard(file, &candidate, bytes)?;
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free name for {} at {}", stem, Utc::now()),
    ))
}

/// Writes `bytes` through `file`; a write that does not complete removes `path`
fn write_or_discard<W: Write>(mut file: W, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let written = file.write_all(bytes).and_then(|()| file.flush());
    if let Err(e) = written {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %cleanup, "Failed to remove partial artifact");
        }
        return Err(e);
    }
    Ok(())
}
