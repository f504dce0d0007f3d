use crate::overpass::DEFAULT_ENDPOINT;
use crate::tags::TagFilterSet;

use clap::Parser;
use geo::Point;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_LAT: f64 = 40.017;
const DEFAULT_LON: f64 = -0.25;
const DEFAULT_RADIUS_KM: f64 = 7.0;

/// Everything a run needs. Paths are resolved against `data_dir`, the
/// process working directory is never changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// x = longitude, y = latitude
    pub center: Point<f64>,
    pub radius_km: f64,
    pub tags: TagFilterSet,
    /// Holds `poi.ids` and receives the GPX files.
    pub data_dir: PathBuf,
    pub endpoint: String,
    /// Saved Overpass response to use instead of downloading.
    pub input: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            center: Point::new(DEFAULT_LON, DEFAULT_LAT),
            radius_km: DEFAULT_RADIUS_KM,
            tags: TagFilterSet::defaults(),
            data_dir: PathBuf::from("."),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            input: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read tag file {path:?}: {source}")]
    TagFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("tag file {path:?} is not a JSON object of match string to icon: {source}")]
    TagFileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Command-line overrides for the built-in configuration.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "osm-poi-gpx",
    about = "Export new OpenStreetMap POI around a point as GPX waypoints",
    version
)]
pub struct Args {
    /// Latitude of the search centre, in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,
    /// Longitude of the search centre, in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,
    /// Search radius around the centre, in kilometres.
    #[arg(long = "radius-km", value_name = "km")]
    pub radius_km: Option<f64>,
    /// Directory holding poi.ids and the generated GPX files.
    #[arg(long = "data-dir", value_name = "path")]
    pub data_dir: Option<PathBuf>,
    /// Overpass interpreter URL.
    #[arg(long, value_name = "url")]
    pub endpoint: Option<String>,
    /// JSON object mapping "key=value" match strings to icon names.
    #[arg(long, value_name = "path")]
    pub tags: Option<PathBuf>,
    /// Saved Overpass JSON response to read instead of querying the API.
    #[arg(long, value_name = "path")]
    pub input: Option<PathBuf>,
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let defaults = Config::default();

        let tags = match args.tags {
            Some(path) => load_tag_file(path)?,
            None => defaults.tags,
        };

        Ok(Self {
            center: Point::new(
                args.lon.unwrap_or(defaults.center.x()),
                args.lat.unwrap_or(defaults.center.y()),
            ),
            radius_km: args.radius_km.unwrap_or(defaults.radius_km),
            tags,
            data_dir: args.data_dir.unwrap_or(defaults.data_dir),
            endpoint: args.endpoint.unwrap_or(defaults.endpoint),
            input: args.input,
        })
    }
}

fn load_tag_file(path: PathBuf) -> Result<TagFilterSet, ConfigError> {
    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(source) => return Err(ConfigError::TagFileRead { path, source }),
    };
    TagFilterSet::from_json_str(&json).map_err(|source| ConfigError::TagFileParse { path, source })
}
