//! Boundary with the PDF container layer.
//!
//! Parsing the container itself happens elsewhere; this module only describes
//! what that layer hands over: per-page text (each page individually
//! fallible), the flat metadata dictionary and the trailer markers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Text of a single page as produced by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageText {
    Extracted { text: String },
    Failed { reason: String },
}

impl PageText {
    pub fn extracted(text: impl Into<String>) -> Self {
        PageText::Extracted { text: text.into() }
    }
}

/// Structural markers read from the document trailer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailerInfo {
    /// A `/Prev` entry: the file carries incremental updates
    #[serde(default)]
    pub incremental_update: bool,
    /// A `/XRefStm` entry: hybrid cross-reference stream
    #[serde(default)]
    pub xref_stream: bool,
    /// The `/ID` array, as strings
    #[serde(default)]
    pub ids: Vec<String>,
}

/// What the pipeline consumes from a parsed container.
pub trait DocumentContainer {
    fn pages(&self) -> &[PageText];
    fn metadata(&self) -> &BTreeMap<String, String>;
    fn trailer(&self) -> &TrailerInfo;
}

/// Serializable container snapshot, the JSON exchange format written by an
/// external extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Path of the raw document, used for fingerprinting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    #[serde(default)]
    pub pages: Vec<PageText>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub trailer: TrailerInfo,
}

impl DocumentContainer for ExtractedDocument {
    fn pages(&self) -> &[PageText] {
        &self.pages
    }

    fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    fn trailer(&self) -> &TrailerInfo {
        &self.trailer
    }
}

/// Concatenated page text plus extraction diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledText {
    pub text: String,
    pub pages_total: usize,
    pub pages_failed: usize,
}

/// Join page texts in order; a failed page contributes nothing.
pub fn assemble_text(pages: &[PageText]) -> AssembledText {
    let mut out = AssembledText {
        pages_total: pages.len(),
        ..Default::default()
    };
    for (idx, page) in pages.iter().enumerate() {
        match page {
            PageText::Extracted { text } => out.text.push_str(text),
            PageText::Failed { reason } => {
                tracing::warn!(page = idx + 1, %reason, "Page text extraction failed, skipping");
                out.pages_failed += 1;
            }
        }
    }
    out
}

/// Case-insensitive metadata lookup accepting keys with or without the
/// leading `/` (`/Producer`, `Producer`, `producer`).
pub fn metadata_value<'a>(metadata: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    let wanted = key.trim_start_matches('/');
    metadata
        .iter()
        .find(|(k, _)| k.trim_start_matches('/').eq_ignore_ascii_case(wanted))
        .map(|(_, v)| v.as_str())
}
