use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;

/// Overpass element id. Numeric in practice, compared as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum ElementId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementId::Number(id) => write!(f, "{}", id),
            ElementId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ElementId {
    fn from(id: i64) -> Self {
        ElementId::Number(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A node as returned in the `elements` array of an Overpass JSON response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPoi {
    pub id: ElementId,
    pub lat: f64,
    pub lon: f64,
    // Kept in document order, it drives description lines and icon matching
    #[serde(default, deserialize_with = "tags_in_order")]
    pub tags: Vec<Tag>,
}

impl RawPoi {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }
}

/// A POI ready to be written as a GPX waypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedPoi {
    pub poi: RawPoi,
    pub name: String,
    pub desc: String,
    /// Empty when no tag matched a filter.
    pub icon: String,
}

fn tags_in_order<'de, D>(deserializer: D) -> Result<Vec<Tag>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TagsVisitor;

    impl<'de> Visitor<'de> for TagsVisitor {
        type Value = Vec<Tag>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of tag keys to string values")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut tags = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, String>()? {
                tags.push(Tag { key, value });
            }
            Ok(tags)
        }
    }

    deserializer.deserialize_map(TagsVisitor)
}
