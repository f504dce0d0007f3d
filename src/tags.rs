use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Match strings ("key" or "key=value") and the Locus icon each one maps to
const DEFAULT_TAG_ICONS: [(&str, &str); 22] = [
    ("natural=spring", "spring"),
    ("natural=hot_spring", "hot_spring"),
    ("natural=cave_entrance", "cave"),
    ("natural=waterfall", "waterfall"),
    ("natural=peak", "peak"),
    ("sport=climbing", "climbing"),
    ("drinking_water=yes", "drinking_water"),
    ("drinking_water=no", "drinking_water"),
    ("amenity=drinking_water", "drinking_water"),
    ("amenity=fountain", "fountain"),
    ("amenity=bbq", "bbq"),
    ("historic=ruins", "ruins"),
    ("historic=mine_shaft", "mine"),
    ("historic=mine", "mine"),
    ("historic=tomb", "cave"),
    ("historic=castle", "castle"),
    ("historic=archaeological_site", "archaeological_site"),
    ("tourism=viewpoint", "viewpoint"),
    ("tourism=picnic_site", "picnic_site"),
    ("man_made=adit", "mine"),
    ("man_made=mineshaft", "mine"),
    ("man_made=mine", "mine"),
];

/// Tag filters to query for, each with the icon label used for matching POI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagFilterSet {
    icons: BTreeMap<String, String>,
}

/// One `[key]` or `[key=value]` clause of a filter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagFilter<'a> {
    pub key: &'a str,
    pub value: Option<&'a str>,
}

impl TagFilterSet {
    /// The springs, caves, ruins and viewpoints table the tool ships with.
    pub fn defaults() -> Self {
        DEFAULT_TAG_ICONS.into_iter().collect()
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Icon for a tag pair, looked up by its `key=value` form.
    pub fn icon_for(&self, key: &str, value: &str) -> Option<&str> {
        self.icons
            .get(&format!("{}={}", key, value))
            .map(String::as_str)
    }

    pub fn match_strings(&self) -> impl Iterator<Item = &str> {
        self.icons.keys().map(String::as_str)
    }

    pub fn filters(&self) -> impl Iterator<Item = TagFilter<'_>> {
        self.match_strings().map(|s| match s.split_once('=') {
            Some((key, value)) => TagFilter {
                key,
                value: Some(value),
            },
            None => TagFilter {
                key: s,
                value: None,
            },
        })
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagFilterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            icons: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_shipped_table() {
        let tags = TagFilterSet::defaults();
        assert_eq!(tags.len(), 22);
        assert_eq!(tags.icon_for("historic", "tomb"), Some("cave"));
        assert_eq!(tags.icon_for("man_made", "adit"), Some("mine"));
    }

    #[test]
    fn icon_lookup_requires_exact_pair() {
        let tags: TagFilterSet = [("natural=spring", "spring")].into_iter().collect();
        assert_eq!(tags.icon_for("natural", "spring"), Some("spring"));
        assert_eq!(tags.icon_for("natural", "springs"), None);
        assert_eq!(tags.icon_for("natural=spring", ""), None);
    }

    #[test]
    fn filters_split_on_first_equals() {
        let tags: TagFilterSet = [("amenity", "any"), ("ref=a=b", "odd")]
            .into_iter()
            .collect();
        let filters: Vec<_> = tags.filters().collect();
        assert_eq!(
            filters,
            vec![
                TagFilter {
                    key: "amenity",
                    value: None
                },
                TagFilter {
                    key: "ref",
                    value: Some("a=b")
                },
            ]
        );
    }

    #[test]
    fn parses_json_object() {
        let tags = TagFilterSet::from_json_str(r#"{"tourism=viewpoint": "viewpoint"}"#)
            .expect("valid json");
        assert_eq!(tags.icon_for("tourism", "viewpoint"), Some("viewpoint"));
        assert!(TagFilterSet::from_json_str("[1, 2]").is_err());
    }
}
