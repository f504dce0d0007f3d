use crate::bbox::BoundingBox;
use crate::poi::RawPoi;
use crate::tags::{TagFilter, TagFilterSet};

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

// Server-side timeout hint, in seconds
const QUERY_TIMEOUT_SECS: u32 = 25;

// Custom error type for better error messages
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP status {status}")]
    Http { url: String, status: StatusCode },
    #[error("response is not an Overpass JSON document with an `elements` array: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("could not read saved response {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<RawPoi>,
}

// Overpass QL string literal, quotes and backslashes escaped
fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn filter_clause(filter: TagFilter<'_>) -> String {
    match filter.value {
        Some(value) => format!("node[{}={}];", quote(filter.key), quote(value)),
        None => format!("node[{}];", quote(filter.key)),
    }
}

// Function to create the Overpass query string. Clauses inside the
// parentheses form a union, so a node matching any filter is returned.
pub fn create_overpass_query(bbox: &BoundingBox, tags: &TagFilterSet) -> String {
    let clauses: String = tags.filters().map(filter_clause).collect();
    format!(
        "[out:json][timeout:{}][bbox:{}];({});out;",
        QUERY_TIMEOUT_SECS, bbox, clauses
    )
}

/// Extracts the nodes under `elements` from an Overpass JSON response body.
pub fn parse_elements(body: &str) -> Result<Vec<RawPoi>, serde_json::Error> {
    let response: OverpassResponse = serde_json::from_str(body)?;
    Ok(response.elements)
}

/// Reads a previously saved Overpass response instead of querying the API.
pub fn load_elements(path: &Path) -> Result<Vec<RawPoi>, FetchError> {
    let body = std::fs::read_to_string(path).map_err(|source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_elements(&body)?)
}

pub struct OverpassClient {
    client: Client,
    url: String,
}

impl OverpassClient {
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        let url = url.into();
        // Waits as long as the server does; the query carries its own timeout
        let client = Client::builder()
            .timeout(None)
            .build()
            .map_err(|source| FetchError::Network {
                url: url.clone(),
                source,
            })?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    // Function to make request to Overpass API
    pub fn fetch(&self, query: &str) -> Result<Vec<RawPoi>, FetchError> {
        let network = |source: reqwest::Error| FetchError::Network {
            url: self.url.clone(),
            source,
        };

        let response = self
            .client
            .get(&self.url)
            .query(&[("data", query)])
            .send()
            .map_err(network)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Http {
                url: self.url.clone(),
                status,
            });
        }

        let body = response.text().map_err(network)?;
        Ok(parse_elements(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    fn sample_bbox() -> BoundingBox {
        BoundingBox::around(Point::new(-0.25, 40.017), 7.0).expect("valid input")
    }

    #[test]
    fn query_embeds_format_timeout_and_bbox() {
        let bbox = sample_bbox();
        let tags: TagFilterSet = [("natural=spring", "spring")].into_iter().collect();
        let query = create_overpass_query(&bbox, &tags);

        assert_eq!(
            query,
            format!(
                "[out:json][timeout:25][bbox:{}];(node[\"natural\"=\"spring\"];);out;",
                bbox
            )
        );
    }

    #[test]
    fn every_filter_becomes_its_own_clause() {
        let query = create_overpass_query(&sample_bbox(), &TagFilterSet::defaults());

        assert_eq!(query.matches("node[").count(), 22);
        assert!(query.contains("node[\"historic\"=\"castle\"];"));
        assert!(query.contains("node[\"tourism\"=\"picnic_site\"];"));
    }

    #[test]
    fn key_only_filter_and_quotes_are_escaped() {
        let tags: TagFilterSet = [("amenity", "x"), ("name=Ca\"n", "y")].into_iter().collect();
        let query = create_overpass_query(&sample_bbox(), &tags);

        assert!(query.contains("node[\"amenity\"];"));
        assert!(query.contains("node[\"name\"=\"Ca\\\"n\"];"));
    }

    #[test]
    fn parse_elements_reads_nodes() {
        let body = r#"{"version": 0.6, "elements": [
            {"type": "node", "id": 1, "lat": 40.0, "lon": -0.2, "tags": {"natural": "peak"}},
            {"type": "node", "id": 2, "lat": 40.1, "lon": -0.3}
        ]}"#;
        let pois = parse_elements(body).expect("valid body");

        assert_eq!(pois.len(), 2);
        assert_eq!(pois[0].tag("natural"), Some("peak"));
        assert!(pois[1].tags.is_empty());
    }

    #[test]
    fn parse_elements_requires_elements_field() {
        assert!(parse_elements(r#"{"remark": "runtime error"}"#).is_err());
        assert!(parse_elements("<html>busy</html>").is_err());
    }

    #[test]
    fn load_elements_reports_missing_file() {
        let err = load_elements(Path::new("/nonexistent/poi.json")).unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }
}
