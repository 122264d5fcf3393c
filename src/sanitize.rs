//! Content sanitizing and rewriting.
//!
//! Stage 3 of the pipeline. Parses the composed fragment into a detached
//! `scraper` tree (no document and no network access) and rewrites it in
//! place:
//!
//! 1. **Paragraph breaks**: `span.line-spacer` markers become a placeholder
//!    text node. Runs first; the placeholder is only turned into a real
//!    `</p><p>` boundary after serialization, where it can split the
//!    surrounding paragraph.
//! 2. **Images**: every deferred `img[data-src]` is replaced by a live `img`
//!    whose `src` is resolved against the image origin. Only `alt` and
//!    `title` carry over. The first image found becomes the featured image
//!    when the article has no portrait or cover.
//! 3. **Reference markers**: `span[data-article-id]` gets the internal-link
//!    classes; `a[data-article-id]` is demoted to a `span` with the same
//!    classes, `data-*` attributes and text, so references never navigate
//!    away from the journal.
//!
//! The stylesheet snippet is prepended to the serialized fragment.

use crate::compose::ComposedDocument;
use crate::config::PipelineConfig;
use crate::types::TransformResult;
use ego_tree::NodeId;
use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::node::{Element, Text};
use scraper::{Html, Node, Selector};
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

/// Stand-in for a paragraph break until after serialization.
pub const PARAGRAPH_BREAK: &str = "%p%";

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

static LINE_SPACER: LazyLock<Selector> = LazyLock::new(|| selector("span.line-spacer"));
static DEFERRED_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img[data-src]"));
static REFERENCE_SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span[data-article-id]"));
static REFERENCE_ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a[data-article-id]"));

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

#[derive(Error, Debug)]
pub enum SanitizeError {
    #[error("invalid image origin {origin:?}: {source}")]
    Origin {
        origin: String,
        source: url::ParseError,
    },
    #[error("cannot resolve image source {src:?}: {source}")]
    ImageUrl {
        src: String,
        source: url::ParseError,
    },
}

/// Rewrites composed fragments into final journal HTML.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    origin: Url,
    link_classes: Vec<String>,
}

impl Sanitizer {
    pub fn new(origin: &str, link_classes: Vec<String>) -> Result<Self, SanitizeError> {
        let origin = Url::parse(origin).map_err(|source| SanitizeError::Origin {
            origin: origin.to_string(),
            source,
        })?;
        Ok(Self {
            origin,
            link_classes,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, SanitizeError> {
        Self::new(&config.images.origin, config.links.classes.clone())
    }

    /// Rewrite `composed` and prepend `stylesheet`.
    pub fn sanitize(
        &self,
        composed: ComposedDocument,
        stylesheet: &str,
    ) -> Result<TransformResult, SanitizeError> {
        let mut fragment = Html::parse_fragment(&composed.content);

        let spacers = replace_line_spacers(&mut fragment);
        let first_image = self.activate_images(&mut fragment);
        let marked = self.mark_reference_spans(&mut fragment);
        let demoted = self.demote_reference_anchors(&mut fragment);

        tracing::debug!(spacers, marked, demoted, "sanitized fragment");

        let html = format!("{}{}", stylesheet, fragment.root_element().inner_html())
            .replace(PARAGRAPH_BREAK, "</p><p>");

        Ok(TransformResult {
            html,
            img: composed.image.or(first_image),
        })
    }

    /// Resolve an image path against the origin. Absolute URLs pass through.
    pub fn resolve_image(&self, src: &str) -> Result<String, SanitizeError> {
        self.origin
            .join(src.trim())
            .map(String::from)
            .map_err(|source| SanitizeError::ImageUrl {
                src: src.to_string(),
                source,
            })
    }

    /// Like [`Self::resolve_image`], but a source `Url::join` rejects is
    /// prefixed with the origin as-is.
    fn image_source(&self, src: &str) -> String {
        self.resolve_image(src).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "unresolvable image source, prefixing origin");
            format!(
                "{}/{}",
                self.origin.as_str().trim_end_matches('/'),
                src.trim().trim_start_matches('/')
            )
        })
    }

    /// Swap deferred images for live ones; returns the first resolved URL.
    fn activate_images(&self, fragment: &mut Html) -> Option<String> {
        let pending: Vec<_> = fragment
            .select(&DEFERRED_IMAGE)
            .map(|img| {
                let deferred = img.value();
                let src = self.image_source(deferred.attr("data-src").unwrap_or_default());
                let mut attrs = vec![attribute("src", &src)];
                for name in ["alt", "title"] {
                    if let Some(value) = deferred.attr(name) {
                        attrs.push(attribute(name, value));
                    }
                }
                (img.id(), src, Element::new(html_name("img"), attrs))
            })
            .collect();

        let first = pending.first().map(|(_, src, _)| src.clone());
        for (id, _, live) in pending {
            if let Some(mut node) = fragment.tree.get_mut(id) {
                *node.value() = Node::Element(live);
            }
        }
        first
    }

    fn mark_reference_spans(&self, fragment: &mut Html) -> usize {
        let pending: Vec<(NodeId, Element)> = fragment
            .select(&REFERENCE_SPAN)
            .map(|span| {
                let marked = rebuild(span.value(), "span", &self.link_classes, |_| true);
                (span.id(), marked)
            })
            .collect();

        let count = pending.len();
        for (id, marked) in pending {
            if let Some(mut node) = fragment.tree.get_mut(id) {
                *node.value() = Node::Element(marked);
            }
        }
        count
    }

    fn demote_reference_anchors(&self, fragment: &mut Html) -> usize {
        let pending: Vec<(NodeId, Element, String)> = fragment
            .select(&REFERENCE_ANCHOR)
            .map(|anchor| {
                let marker = rebuild(anchor.value(), "span", &self.link_classes, |name| {
                    name.starts_with("data-")
                });
                (anchor.id(), marker, anchor.text().collect())
            })
            .collect();

        let count = pending.len();
        for (id, marker, text) in pending {
            let children: Vec<NodeId> = match fragment.tree.get(id) {
                Some(node) => node.children().map(|child| child.id()).collect(),
                None => continue,
            };
            for child in children {
                if let Some(mut child) = fragment.tree.get_mut(child) {
                    child.detach();
                }
            }
            if let Some(mut node) = fragment.tree.get_mut(id) {
                *node.value() = Node::Element(marker);
                node.append(text_node(&text));
            }
        }
        count
    }
}

/// Replace each line spacer with the paragraph-break placeholder.
fn replace_line_spacers(fragment: &mut Html) -> usize {
    let ids: Vec<NodeId> = fragment.select(&LINE_SPACER).map(|el| el.id()).collect();
    for id in &ids {
        if let Some(mut node) = fragment.tree.get_mut(*id) {
            node.insert_before(text_node(PARAGRAPH_BREAK));
            node.detach();
        }
    }
    ids.len()
}

/// Copy of `element` renamed to `tag`, with `extra_classes` appended to its
/// class list and only the attributes accepted by `keep`.
fn rebuild(
    element: &Element,
    tag: &str,
    extra_classes: &[String],
    keep: impl Fn(&str) -> bool,
) -> Element {
    let mut classes: Vec<&str> = element
        .attr("class")
        .map(|c| c.split_whitespace().collect())
        .unwrap_or_default();
    for class in extra_classes {
        if !classes.contains(&class.as_str()) {
            classes.push(class.as_str());
        }
    }

    let mut attrs = vec![attribute("class", &classes.join(" "))];
    attrs.extend(
        element
            .attrs()
            .filter(|(name, _)| *name != "class" && keep(*name))
            .map(|(name, value)| attribute(name, value)),
    );
    Element::new(html_name(tag), attrs)
}

fn html_name(tag: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag))
}

fn attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
        value: StrTendril::from_slice(value),
    }
}

fn text_node(text: &str) -> Node {
    Node::Text(Text {
        text: StrTendril::from_slice(text),
    })
}
