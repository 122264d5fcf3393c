//! Shared test utilities for the anvil-journal test suite.
//!
//! Builders for article data, a canned localizer, and in-memory uploaders
//! that record or fail on demand.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut town = article("Town", "http://x/town");
//! town.sections = sections(&[("history", Some("History"), "Old.")]);
//! town.relations = relations(&[(
//!     "people",
//!     Some("People"),
//!     vec![item("1", Some("person"), "Ada")],
//! )]);
//! ```

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use crate::i18n::Catalog;
use crate::types::{
    Article, ImageRef, ItemSlot, Items, OrderedMap, RelationGroup, RelationItem, Section,
};
use crate::upload::{AssetUploader, UploadError, UploadResult};

// =========================================================================
// Article builders
// =========================================================================

/// Bare article with a title and source URL.
pub fn article(title: &str, url: &str) -> Article {
    Article {
        id: "1".to_string(),
        title: title.to_string(),
        url: url.to_string(),
        ..Article::default()
    }
}

/// Ordered sections from `(key, title, content)` triples.
pub fn sections(entries: &[(&str, Option<&str>, &str)]) -> OrderedMap<Section> {
    entries
        .iter()
        .map(|(key, title, content)| {
            (
                key.to_string(),
                Section {
                    title: title.map(str::to_string),
                    content_parsed: content.to_string(),
                },
            )
        })
        .collect()
}

/// Ordered relation groups from `(key, title, items)` triples.
pub fn relations(
    entries: &[(&str, Option<&str>, Vec<RelationItem>)],
) -> OrderedMap<RelationGroup> {
    entries
        .iter()
        .map(|(key, title, items)| {
            (
                key.to_string(),
                RelationGroup {
                    title: title.map(str::to_string),
                    items: Some(Items::Many(
                        items.iter().cloned().map(ItemSlot::Item).collect(),
                    )),
                },
            )
        })
        .collect()
}

pub fn item(id: &str, kind: Option<&str>, title: &str) -> RelationItem {
    RelationItem {
        id: id.to_string(),
        kind: kind.map(str::to_string),
        title: Some(title.to_string()),
    }
}

pub fn image_ref(url: &str) -> ImageRef {
    ImageRef {
        url: url.to_string(),
    }
}

/// Parse `fixtures/article.json`.
pub fn fixture_article() -> Article {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/article.json");
    let json = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_str(&json).unwrap()
}

// =========================================================================
// Localization
// =========================================================================

/// The built-in English catalog.
pub fn localizer() -> Catalog {
    Catalog::english()
}

pub fn catalog(pairs: &[(&str, &str)]) -> Catalog {
    Catalog::from_pairs(pairs.iter().copied())
}

// =========================================================================
// Uploaders
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpload {
    pub file_name: String,
    pub target: String,
    pub body: String,
}

/// Keeps every upload in memory.
#[derive(Default)]
pub struct RecordingUploader {
    uploads: Mutex<Vec<RecordedUpload>>,
}

impl RecordingUploader {
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetUploader for RecordingUploader {
    async fn upload(
        &self,
        file_name: &str,
        target: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResult, UploadError> {
        self.uploads.lock().unwrap().push(RecordedUpload {
            file_name: file_name.to_string(),
            target: target.to_string(),
            body: String::from_utf8(bytes).unwrap(),
        });
        Ok(UploadResult {
            path: format!("{target}/{file_name}"),
            message: None,
        })
    }
}

/// Rejects every upload.
pub struct FailingUploader;

#[async_trait]
impl AssetUploader for FailingUploader {
    async fn upload(&self, _: &str, target: &str, _: Vec<u8>) -> Result<UploadResult, UploadError> {
        Err(UploadError::InvalidTarget(target.to_string()))
    }
}

/// Succeeds after sleeping.
pub struct SlowUploader(pub Duration);

#[async_trait]
impl AssetUploader for SlowUploader {
    async fn upload(
        &self,
        file_name: &str,
        target: &str,
        _: Vec<u8>,
    ) -> Result<UploadResult, UploadError> {
        tokio::time::sleep(self.0).await;
        Ok(UploadResult {
            path: format!("{target}/{file_name}"),
            message: None,
        })
    }
}
