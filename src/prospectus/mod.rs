pub mod cleaner;
pub mod html;
pub mod keywords;
pub mod tables;
pub mod xbrl;

use crate::error::ExtractError;
use crate::models::Grid;
use anyhow::{Context, Result};
use scraper::Html;
use std::path::Path;
use tracing::debug;

/// A prospectus filing read from disk.
pub struct Prospectus {
    raw: String,
}

impl Prospectus {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ExtractError::MissingFiling(path.display().to_string()).into());
        }
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
        // EDGAR documents are mostly ASCII with the odd Latin-1 byte
        let raw = String::from_utf8_lossy(&bytes).into_owned();
        debug!("Read {} ({} bytes)", path.display(), raw.len());
        Ok(Self { raw })
    }

    pub fn from_html(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Comment-free document with lowercased markup, for table work.
    pub fn cleaned(&self) -> Html {
        Html::parse_document(&html::clean_html(&self.raw))
    }

    /// The document as filed. Inline XBRL attribute values are case-sensitive
    /// so facts are read from this rather than the cleaned form.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.raw)
    }

    pub fn tables(&self) -> Result<Vec<Grid>> {
        let grids = html::parse_tables(&self.cleaned())?;
        if grids.is_empty() {
            return Err(ExtractError::NoTables.into());
        }
        Ok(grids)
    }

    pub fn document_length(&self) -> usize {
        html::document_length(&self.raw)
    }
}
