//! End-to-end article transformation.
//!
//! ```text
//! Article ─► assemble ─► compose ─► rehost stylesheet ─► sanitize ─► TransformResult
//! ```
//!
//! A [`Transformer`] owns everything that is fixed for a run (configuration,
//! localizer, uploader, the raw display stylesheet) and is reused across
//! articles. Each [`Transformer::transform`] call is independent; the only
//! thing that outlives it is a detached stylesheet upload, which
//! [`Transformer::flush`] waits for.

use crate::assemble::assemble;
use crate::compose::compose;
use crate::config::PipelineConfig;
use crate::i18n::Localize;
use crate::sanitize::{SanitizeError, Sanitizer};
use crate::source::{ArticleSource, SourceError};
use crate::stylesheet::{StylesheetError, rehost};
use crate::types::{Article, TransformResult};
use crate::upload::AssetUploader;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("stylesheet error: {0}")]
    Stylesheet(#[from] StylesheetError),
    #[error("sanitize error: {0}")]
    Sanitize(#[from] SanitizeError),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

pub struct Transformer {
    config: PipelineConfig,
    sanitizer: Sanitizer,
    localizer: Arc<dyn Localize>,
    uploader: Arc<dyn AssetUploader>,
    stylesheet: Option<String>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl Transformer {
    pub fn new(
        config: PipelineConfig,
        localizer: Arc<dyn Localize>,
        uploader: Arc<dyn AssetUploader>,
    ) -> Result<Self, PipelineError> {
        let sanitizer = Sanitizer::from_config(&config)?;
        Ok(Self {
            config,
            sanitizer,
            localizer,
            uploader,
            stylesheet: None,
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Raw display stylesheet to re-host with every article. Without one the
    /// output carries no stylesheet reference.
    pub fn with_stylesheet(mut self, css: impl Into<String>) -> Self {
        self.stylesheet = Some(css.into());
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[tracing::instrument(skip_all, fields(article = %article.id))]
    pub async fn transform(&self, article: &Article) -> Result<TransformResult, PipelineError> {
        let assembly = assemble(&article.sections, &article.relations);
        let composed = compose(
            article,
            &assembly,
            self.localizer.as_ref(),
            &self.config.links.label_key,
        );

        let snippet = match &self.stylesheet {
            Some(css) => {
                let rehosted =
                    rehost(css, &self.config.stylesheet, Arc::clone(&self.uploader)).await?;
                if let Some(upload) = rehosted.upload {
                    let mut pending = self.pending.lock().await;
                    pending.retain(|earlier| !earlier.is_finished());
                    pending.push(upload);
                }
                rehosted.snippet
            }
            None => String::new(),
        };

        let result = self.sanitizer.sanitize(composed, &snippet)?;
        tracing::debug!(
            html_bytes = result.html.len(),
            img = result.img.as_deref().unwrap_or("-"),
            "article transformed"
        );
        Ok(result)
    }

    /// Wait for detached uploads started so far.
    pub async fn flush(&self) {
        let uploads = std::mem::take(&mut *self.pending.lock().await);
        for upload in uploads {
            if let Err(e) = upload.await {
                tracing::warn!(error = %e, "stylesheet upload task failed");
            }
        }
    }
}

/// Fetch an article by id and transform it.
pub async fn import_article(
    source: &dyn ArticleSource,
    transformer: &Transformer,
    id: &str,
) -> Result<(Article, TransformResult), PipelineError> {
    let article = source.fetch_article(id).await?;
    let result = transformer.transform(&article).await?;
    Ok((article, result))
}
