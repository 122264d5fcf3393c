//! Shared setup for the integration tests.

#![allow(dead_code)]

use anvil_journal::config::PipelineConfig;
use anvil_journal::i18n::Catalog;
use anvil_journal::upload::AssetUploader;
use anvil_journal::{Article, Transformer};
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use std::sync::Arc;

/// Parse `fixtures/article.json`.
pub fn fixture_article() -> Article {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/article.json");
    let json = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_str(&json).unwrap()
}

pub fn article_from(value: serde_json::Value) -> Article {
    serde_json::from_value(value).unwrap()
}

pub fn transformer(config: PipelineConfig, uploader: Arc<dyn AssetUploader>) -> Transformer {
    Transformer::new(config, Arc::new(Catalog::english()), uploader).unwrap()
}

/// `class` attribute of the first element matching `css`. Panics if none
/// matches.
pub fn class_attr(html: &str, css: &str) -> String {
    let tree = Html::parse_fragment(html);
    let selector = Selector::parse(css).unwrap();
    let element: ElementRef = tree
        .select(&selector)
        .next()
        .unwrap_or_else(|| panic!("no element matches {css:?} in {html}"));
    element.value().attr("class").unwrap_or_default().to_string()
}

/// Number of elements matching `css`.
pub fn count(html: &str, css: &str) -> usize {
    let tree = Html::parse_fragment(html);
    let selector = Selector::parse(css).unwrap();
    tree.select(&selector).count()
}
