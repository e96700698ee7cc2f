//! Output directory layout

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the flat append-only session log inside the output root
pub const SESSION_LOG: &str = "crawler.log";

/// Directories and files a crawl writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    json: PathBuf,
    html_fallback: PathBuf,
    errors: PathBuf,
    log_file: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            json: root.join("json"),
            html_fallback: root.join("html_fallback"),
            errors: root.join("errors"),
            log_file: root.join(SESSION_LOG),
            root,
        }
    }

    /// Builds the layout and creates its directories
    pub fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let layout = Self::new(root);
        for dir in [&layout.json, &layout.html_fallback, &layout.errors] {
            fs::create_dir_all(dir)?;
        }
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn json(&self) -> &Path {
        &self.json
    }

    pub fn html_fallback(&self) -> &Path {
        &self.html_fallback
    }

    pub fn errors(&self) -> &Path {
        &self.errors
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}
