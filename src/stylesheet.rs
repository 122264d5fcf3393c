//! Display stylesheet rewriting and re-hosting.
//!
//! Article markup on the source site is styled by a user-authored stylesheet
//! scoped under `.user-css` / `.user-css-extended` wrappers. Those wrappers do
//! not exist in the journal, so the selectors are folded onto a single
//! reserved class instead:
//!
//! ```text
//! .user-css, .user-css-extended { color: red }   →   .world-anvil { color: red }
//! .user-css .user-css-extended p { margin: 0 }   →   .world-anvil p { margin: 0 }
//! .user-css-extended h1 { font-size: 2em }       →   .world-anvil h1 { font-size: 2em }
//! ```
//!
//! Only these selectors are touched; the rest of the CSS passes through as-is.
//!
//! The rewritten sheet is handed to an [`AssetUploader`]. By default the
//! upload is detached: the `<link>` to where the file will live is returned
//! straight away, and a failed upload only shows up later as a missing
//! stylesheet. With a timeout configured the upload is awaited instead and an
//! inline `<style>` block stands in when it fails.

use crate::config::StylesheetConfig;
use crate::upload::AssetUploader;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum StylesheetError {
    #[error("invalid class pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Selector rewriting for one user-class prefix.
#[derive(Debug, Clone)]
pub struct SelectorRewriter {
    standalone: Regex,
    stacked: Regex,
    any: Regex,
    replacement: String,
}

impl SelectorRewriter {
    pub fn new(user_class_prefix: &str, reserved_class: &str) -> Result<Self, StylesheetError> {
        let class = format!(r"\.{}[A-Za-z0-9_-]*", regex::escape(user_class_prefix));
        Ok(Self {
            // A user selector on its own in a selector list
            standalone: Regex::new(&format!(r"{class}\s*,\s*"))?,
            // Two user selectors chained (compound or descendant)
            stacked: Regex::new(&format!(r"{class}[\s*]*{class}"))?,
            any: Regex::new(&class)?,
            replacement: format!(".{reserved_class}"),
        })
    }

    pub fn from_config(config: &StylesheetConfig) -> Result<Self, StylesheetError> {
        Self::new(&config.user_class_prefix, &config.reserved_class)
    }

    pub fn rewrite(&self, css: &str) -> String {
        let css = self.standalone.replace_all(css, "");
        let css = self.stacked.replace_all(&css, self.replacement.as_str());
        self.any
            .replace_all(&css, self.replacement.as_str())
            .into_owned()
    }
}

/// The stylesheet reference to splice into the document, plus the detached
/// upload when there is one.
#[derive(Debug)]
pub struct Rehosted {
    pub snippet: String,
    pub upload: Option<JoinHandle<()>>,
}

/// `<link>` to the re-hosted file, relative to the host's web root.
pub fn link_snippet(config: &StylesheetConfig) -> String {
    let target = config.target.trim_matches('/');
    let href = if target.is_empty() {
        format!("/{}", config.file_name)
    } else {
        format!("/{}/{}", target, config.file_name)
    };
    format!(r#"<link href="{href}" rel="stylesheet">"#)
}

/// Rewrite `css` and hand it to `uploader`.
///
/// Must run inside a tokio runtime: the detached upload is spawned onto it.
pub async fn rehost(
    css: &str,
    config: &StylesheetConfig,
    uploader: Arc<dyn AssetUploader>,
) -> Result<Rehosted, StylesheetError> {
    let rewritten = SelectorRewriter::from_config(config)?.rewrite(css);
    let snippet = link_snippet(config);
    let file_name = config.file_name.clone();
    let target = config.target.clone();

    let Some(wait_ms) = config.await_upload_ms else {
        let handle = tokio::spawn(async move {
            match uploader
                .upload(&file_name, &target, rewritten.into_bytes())
                .await
            {
                Ok(result) => tracing::debug!(path = %result.path, "stylesheet uploaded"),
                Err(e) => tracing::warn!(error = %e, file = %file_name, "stylesheet upload failed"),
            }
        });
        return Ok(Rehosted {
            snippet,
            upload: Some(handle),
        });
    };

    let upload = uploader.upload(&file_name, &target, rewritten.clone().into_bytes());
    let snippet = match tokio::time::timeout(Duration::from_millis(wait_ms), upload).await {
        Ok(Ok(result)) => {
            tracing::debug!(path = %result.path, "stylesheet uploaded");
            snippet
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "stylesheet upload failed, inlining styles");
            inline_snippet(&rewritten)
        }
        Err(_) => {
            tracing::warn!(timeout_ms = wait_ms, "stylesheet upload timed out, inlining styles");
            inline_snippet(&rewritten)
        }
    };
    Ok(Rehosted {
        snippet,
        upload: None,
    })
}

fn inline_snippet(css: &str) -> String {
    // A literal "</style" would end the element early
    format!("<style>{}</style>", css.replace("</style", r"<\/style"))
}
