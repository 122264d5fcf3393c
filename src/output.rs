//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output lists what the article is made of (sections, relation groups,
//! featured image) rather than the bytes that were written. File paths only
//! appear as the destination of a transform.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Town (#1)
//!     Source: https://www.worldanvil.com/w/x/a/town
//! Sections
//! 001 History
//! 002 Sidepanelcontent [side panel: main]
//! Relations
//! 001 People (2 references)
//! 002 Gallery (no references)
//! Image: https://www.worldanvil.com/uploads/portrait.png
//! ```
//!
//! ## Transform
//!
//! ```text
//! Town → dist/town.html
//!     Image: https://www.worldanvil.com/uploads/portrait.png
//!     Size: 2140 bytes
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::assemble::{Zone, qualifying_items};
use crate::compose::featured_image;
use crate::naming::display_title;
use crate::types::{Article, TransformResult};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Strip HTML tags from a string (simple angle-bracket stripping).
fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

fn reference_count(n: usize) -> String {
    match n {
        0 => "no references".to_string(),
        1 => "1 reference".to_string(),
        n => format!("{n} references"),
    }
}

// ============================================================================
// Check
// ============================================================================

/// Inventory of an article as the pipeline will see it.
pub fn format_article_summary(article: &Article) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!("{} (#{})", strip_html_tags(&article.title), article.id));
    if !article.url.is_empty() {
        lines.push(format!("{}Source: {}", indent(1), article.url));
    }

    if !article.sections.is_empty() {
        lines.push("Sections".to_string());
        for (pos, (key, section)) in article.sections.iter().enumerate() {
            let title = display_title(section.title.as_deref(), key);
            let header = format!("{} {}", format_index(pos + 1), strip_html_tags(&title));
            match Zone::classify(&title) {
                Zone::Body => lines.push(header),
                zone => lines.push(format!("{header} [side panel: {}]", zone.label())),
            }
        }
    }

    if !article.relations.is_empty() {
        lines.push("Relations".to_string());
        for (pos, (key, group)) in article.relations.iter().enumerate() {
            let title = display_title(group.title.as_deref(), key);
            lines.push(format!(
                "{} {} ({})",
                format_index(pos + 1),
                strip_html_tags(&title),
                reference_count(qualifying_items(group).len())
            ));
        }
    }

    if let Some(image) = featured_image(article) {
        lines.push(format!("Image: {image}"));
    }

    lines
}

pub fn print_article_summary(article: &Article) {
    for line in format_article_summary(article) {
        println!("{}", line);
    }
}

// ============================================================================
// Transform
// ============================================================================

/// Result of one transform: where it went and what it featured.
pub fn format_transform_output(
    article: &Article,
    result: &TransformResult,
    destination: &Path,
) -> Vec<String> {
    vec![
        format!(
            "{} → {}",
            strip_html_tags(&article.title),
            destination.display()
        ),
        format!(
            "{}Image: {}",
            indent(1),
            result.img.as_deref().unwrap_or("none")
        ),
        format!("{}Size: {} bytes", indent(1), result.html.len()),
    ]
}

pub fn print_transform_output(article: &Article, result: &TransformResult, destination: &Path) {
    for line in format_transform_output(article, result, destination) {
        println!("{}", line);
    }
}
