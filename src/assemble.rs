//! Section assembly.
//!
//! Stage 1 of the pipeline. Splits an article's keyed sections into the main
//! body and the three side-panel zones, and turns its relation groups into the
//! definition-list entries of the aside.
//!
//! ## Routing
//!
//! Sections are routed by their lower-cased display title:
//!
//! | Title                  | Destination                      |
//! |------------------------|----------------------------------|
//! | `sidebarcontenttop`    | side panel, top (`sidebar-top`)  |
//! | `sidepanelcontent`     | side panel, main (`sidebar-content`) |
//! | `sidebarcontentbottom` | side panel, bottom (`sidebar-bottom`) |
//! | anything else          | body, as `h2` + `p` + `hr`       |
//!
//! Both the body and each zone preserve the article's section order.
//!
//! ## Relations
//!
//! Each relation group becomes one `dt`/`dd` pair. Items pointing at
//! structural templates (`customarticletemplate`, `image`) or carrying no type
//! are not cross-references and are dropped; a group left empty emits nothing.
//! Survivors become inline reference markers which the sanitizer later styles
//! as internal links.

use crate::naming::display_title;
use crate::types::{OrderedMap, RelationGroup, RelationItem, Section};
use maud::{Markup, PreEscaped, html};

/// Item types that never count as cross-references.
pub const EXCLUDED_ITEM_TYPES: [&str; 2] = ["customarticletemplate", "image"];

/// Where a section ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Body,
    Top,
    Main,
    Bottom,
}

impl Zone {
    /// Route a display title to its zone.
    pub fn classify(title: &str) -> Zone {
        match title.to_lowercase().as_str() {
            "sidepanelcontent" => Zone::Main,
            "sidebarcontentbottom" => Zone::Bottom,
            "sidebarcontenttop" => Zone::Top,
            _ => Zone::Body,
        }
    }

    /// CSS class of the wrapper `div` for side-panel zones.
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            Zone::Body => None,
            Zone::Top => Some("sidebar-top"),
            Zone::Main => Some("sidebar-content"),
            Zone::Bottom => Some("sidebar-bottom"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Zone::Body => "body",
            Zone::Top => "top",
            Zone::Main => "main",
            Zone::Bottom => "bottom",
        }
    }
}

/// The three side-panel accumulators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidePanel {
    pub top: String,
    pub main: String,
    pub bottom: String,
}

impl SidePanel {
    pub fn is_empty(&self) -> bool {
        self.top.is_empty() && self.main.is_empty() && self.bottom.is_empty()
    }

    fn zone_mut(&mut self, zone: Zone) -> Option<&mut String> {
        match zone {
            Zone::Body => None,
            Zone::Top => Some(&mut self.top),
            Zone::Main => Some(&mut self.main),
            Zone::Bottom => Some(&mut self.bottom),
        }
    }
}

/// Output of the assembler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    pub body: String,
    pub side_panel: SidePanel,
    /// `dt`/`dd` pairs, without the enclosing `dl`
    pub aside: String,
}

/// Assemble sections and relation groups.
pub fn assemble(
    sections: &OrderedMap<Section>,
    relations: &OrderedMap<RelationGroup>,
) -> Assembly {
    let mut assembly = Assembly::default();

    for (key, section) in sections {
        let title = display_title(section.title.as_deref(), key);
        let zone = Zone::classify(&title);
        let content = PreEscaped(section.content_parsed.as_str());

        match (assembly.side_panel.zone_mut(zone), zone.css_class()) {
            (Some(buffer), Some(class)) => {
                let block = html! {
                    div class=(class) { (content) }
                    hr;
                };
                buffer.push_str(&block.into_string());
            }
            _ => {
                let block = html! {
                    h2 { (title) }
                    p { (content) }
                    hr;
                };
                assembly.body.push_str(&block.into_string());
            }
        }
    }

    for (key, group) in relations {
        let references = qualifying_items(group);
        if references.is_empty() {
            continue;
        }
        let title = display_title(group.title.as_deref(), key);
        let markers = references
            .into_iter()
            .map(|item| reference_marker(item).into_string())
            .collect::<Vec<_>>()
            .join(", ");
        let entry = html! {
            dt { (title) ":" }
            dd { (PreEscaped(markers)) }
        };
        assembly.aside.push_str(&entry.into_string());
    }

    tracing::debug!(
        sections = sections.len(),
        relations = relations.len(),
        body_bytes = assembly.body.len(),
        has_panel = !assembly.side_panel.is_empty(),
        "assembled sections"
    );
    assembly
}

/// Items of a group that are real cross-references, in source order.
pub fn qualifying_items(group: &RelationGroup) -> Vec<&RelationItem> {
    group
        .item_slots()
        .into_iter()
        .filter_map(|slot| slot.as_item())
        .filter(|item| is_reference(item))
        .collect()
}

fn is_reference(item: &RelationItem) -> bool {
    match item.kind.as_deref() {
        Some(kind) => !EXCLUDED_ITEM_TYPES.contains(&kind),
        None => false,
    }
}

/// Inline marker for one cross-reference.
fn reference_marker(item: &RelationItem) -> Markup {
    let title = item.title.as_deref().unwrap_or_default();
    let kind = item.kind.as_deref().unwrap_or_default();
    html! {
        span data-article-id=(item.id) data-template=(kind) data-title=(title) { (title) }
    }
}
