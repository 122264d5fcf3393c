//! # Anvil Journal
//!
//! Turns World Anvil articles into self-contained HTML suitable for a
//! tabletop journal entry. The article arrives as structured JSON (root body,
//! keyed sections, keyed relation groups, optional portrait and cover) and
//! leaves as one HTML string plus the URL of its featured image.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Assemble   sections + relations  →  body, side panel, aside
//! 2. Compose    article + assembly    →  one fragment, images deferred
//! 3. Sanitize   fragment + stylesheet →  final HTML + featured image
//! ```
//!
//! The stages are plain functions over owned strings, so each can be tested
//! without the others. The only side effect of a run is re-hosting the display
//! stylesheet, which goes through the [`upload::AssetUploader`] trait.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`assemble`] | Stage 1: routes sections into body and side-panel zones, renders relation groups |
//! | [`compose`] | Stage 2: heading, source link, containers; defers every `src` |
//! | [`sanitize`] | Stage 3: paragraph breaks, absolute images, internal reference markers |
//! | [`stylesheet`] | Display stylesheet selector rewriting and re-hosting |
//! | [`pipeline`] | [`pipeline::Transformer`], chaining the stages for one article |
//! | [`source`] | Reading articles from disk or the article API |
//! | [`upload`] | Asset uploaders: HTTP endpoint or local directory |
//! | [`config`] | `anvil.toml` loading, merging and validation |
//! | [`i18n`] | Localized strings for the source link |
//! | [`types`] | The article model and the transform result |
//! | [`naming`] | Display titles derived from section and relation keys |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Deferred Images
//!
//! The compositor rewrites every `src=` to `data-src=` before the fragment is
//! parsed. The sanitizer then builds live `img` elements with absolute URLs.
//! No image is ever requested with a path relative to the journal host.
//!
//! ## Maud For Generated Markup
//!
//! Everything the pipeline writes itself (headings, containers, side-panel
//! blocks, reference markers) is produced with [Maud](https://maud.lambda.xyz/),
//! so titles and URLs are escaped. Article HTML from the source is trusted and
//! spliced in with `PreEscaped`.
//!
//! ## Detached Stylesheet Upload
//!
//! The `<link>` to the re-hosted stylesheet is returned before the upload
//! finishes. A failed upload is logged, never fatal. Setting
//! `stylesheet.await_upload_ms` waits for it instead and inlines the styles
//! when it does not succeed in time.

pub mod assemble;
pub mod compose;
pub mod config;
pub mod i18n;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod sanitize;
pub mod source;
pub mod stylesheet;
pub mod types;
pub mod upload;

pub use pipeline::{PipelineError, Transformer, import_article};
pub use types::{Article, TransformResult};

#[cfg(test)]
pub(crate) mod test_helpers;
