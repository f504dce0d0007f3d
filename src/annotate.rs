use crate::poi::{AnnotatedPoi, ElementId, RawPoi};
use crate::tags::TagFilterSet;

use thiserror::Error;

/// Neither a `name` tag nor a tag matching a filter was found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("POI {id} has no name tag and no tag matching a filter")]
pub struct MissingNameError {
    pub id: ElementId,
}

// Function to derive name, description and icon from a node's tags.
// The first tag matching a filter sets the icon, and names the POI after
// that tag's value when there is no `name` tag.
pub fn annotate(poi: RawPoi, filters: &TagFilterSet) -> Result<AnnotatedPoi, MissingNameError> {
    let mut name_key: Option<&str> = poi.tag("name").map(|_| "name");
    let mut icon: Option<&str> = None;
    let mut desc = Vec::with_capacity(poi.tags.len());

    for tag in &poi.tags {
        desc.push(format!("{}: {}", tag.key, tag.value));

        if icon.is_none() {
            if let Some(found) = filters.icon_for(&tag.key, &tag.value) {
                icon = Some(found);
                name_key.get_or_insert(tag.key.as_str());
            }
        }
    }

    let name = match name_key.and_then(|key| poi.tag(key)) {
        Some(name) => name.to_string(),
        None => return Err(MissingNameError { id: poi.id.clone() }),
    };
    let icon = icon.unwrap_or_default().to_string();
    let desc = desc.join("\n");

    Ok(AnnotatedPoi {
        poi,
        name,
        desc,
        icon,
    })
}

/// Annotates every POI in order, stopping at the first one without a name.
pub fn annotate_all(
    pois: Vec<RawPoi>,
    filters: &TagFilterSet,
) -> Result<Vec<AnnotatedPoi>, MissingNameError> {
    pois.into_iter()
        .map(|poi| annotate(poi, filters))
        .collect()
}
