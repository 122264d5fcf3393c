//! Article model shared by all pipeline stages.
//!
//! These types mirror the JSON the article source hands out. The source is
//! loose about shapes (PHP-style empty arrays instead of empty objects,
//! numeric ids, single items instead of lists), so deserialization is lenient
//! wherever the pipeline can still make sense of the data. Anything else is
//! left to fail in serde.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Insertion-ordered map keyed by section or relation id.
pub type OrderedMap<T> = IndexMap<String, T>;

/// An article as delivered by the article source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Canonical URL of the article on the source site
    #[serde(default)]
    pub url: String,
    /// Root body, already rendered to HTML
    #[serde(default, rename = "content_parsed", alias = "content")]
    pub content: String,
    #[serde(default, deserialize_with = "ordered_map")]
    pub sections: OrderedMap<Section>,
    #[serde(default, deserialize_with = "ordered_map")]
    pub relations: OrderedMap<RelationGroup>,
    #[serde(default)]
    pub portrait: Option<ImageRef>,
    #[serde(default)]
    pub cover: Option<ImageRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "contentParsed")]
    pub content_parsed: String,
}

/// A named group of cross-references ("Related locations", "Rulers", ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationGroup {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub items: Option<Items>,
}

impl RelationGroup {
    /// Items normalized to a sequence. A lone item (or a stray scalar) becomes
    /// a one-element list; scalars carry no item and are skipped by callers.
    pub fn item_slots(&self) -> Vec<&ItemSlot> {
        match &self.items {
            None => Vec::new(),
            Some(Items::Many(slots)) => slots.iter().collect(),
            Some(Items::One(slot)) => vec![slot],
        }
    }
}

/// The `items` field of a relation group: one or many.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Many(Vec<ItemSlot>),
    One(ItemSlot),
}

/// A single entry of `items`. Objects become [`RelationItem`]s, anything else
/// is kept verbatim so it can be dropped by the filter rather than failing the
/// whole article.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemSlot {
    Item(RelationItem),
    Other(serde_json::Value),
}

impl ItemSlot {
    pub fn as_item(&self) -> Option<&RelationItem> {
        match self {
            ItemSlot::Item(item) => Some(item),
            ItemSlot::Other(_) => None,
        }
    }
}

/// A typed reference to another article.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationItem {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    /// Template of the referenced entity (`person`, `location`, `image`, ...)
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub url: String,
}

/// Final output of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformResult {
    pub html: String,
    /// Featured image, if the article has any image at all
    pub img: Option<String>,
}

/// Accepts an object, an array (keyed by position) or null.
fn ordered_map<'de, D, T>(deserializer: D) -> Result<OrderedMap<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Shape<T> {
        Map(IndexMap<String, T>),
        Seq(Vec<T>),
    }

    Ok(match Option::<Shape<T>>::deserialize(deserializer)? {
        None => IndexMap::new(),
        Some(Shape::Map(map)) => map,
        Some(Shape::Seq(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}
