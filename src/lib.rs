//! Export OpenStreetMap points of interest around a coordinate as GPX
//! waypoints, skipping the ones written by earlier runs.
//!
//! A run is one linear pass: query Overpass, drop POI whose ids are already
//! in `poi.ids`, derive a name, description and icon for the rest, write a
//! timestamp-named GPX file, then record the new ids.

pub mod annotate;
pub mod bbox;
pub mod config;
pub mod gpx;
pub mod overpass;
pub mod poi;
pub mod seen;
pub mod tags;

pub use annotate::{annotate, annotate_all, MissingNameError};
pub use bbox::{BoundingBox, DomainError};
pub use config::{Args, Config, ConfigError};
pub use gpx::{save_gpx, write_gpx, GpxError};
pub use overpass::{create_overpass_query, FetchError, OverpassClient};
pub use poi::{AnnotatedPoi, ElementId, RawPoi, Tag};
pub use seen::{DedupOutcome, SeenIdStore, SeenIds, StorageError};
pub use tags::TagFilterSet;

use std::path::PathBuf;
use thiserror::Error;

/// Failure of one pipeline stage, with the work done before it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid search area: {0}")]
    Domain(#[from] DomainError),
    #[error("downloaded 0 POI, fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("downloaded {downloaded} POI, filtering failed: {source}")]
    Filter {
        downloaded: usize,
        #[source]
        source: StorageError,
    },
    #[error("{pending} new POI, parsing failed: {source}")]
    Annotate {
        pending: usize,
        #[source]
        source: MissingNameError,
    },
    #[error("{parsed} POI parsed, saving failed: {source}")]
    Save {
        parsed: usize,
        #[source]
        source: GpxError,
    },
    #[error("{saved} POI saved to {output:?}, recording their ids failed: {source}")]
    Record {
        saved: usize,
        output: PathBuf,
        #[source]
        source: StorageError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub downloaded: usize,
    pub filtered_out: usize,
    pub saved: usize,
    pub output: PathBuf,
}

fn download(config: &Config) -> Result<Vec<RawPoi>, PipelineError> {
    if let Some(input) = &config.input {
        log::info!("Reading POI from {:?} ...", input);
        return Ok(overpass::load_elements(input)?);
    }

    let bbox = BoundingBox::around(config.center, config.radius_km)?;
    let query = create_overpass_query(&bbox, &config.tags);
    log::debug!("overpass query: {}", query);

    let client = OverpassClient::new(config.endpoint.as_str())?;
    log::info!("Downloading POI ...");
    Ok(client.fetch(&query)?)
}

/// Runs the whole export once.
///
/// The seen-id store is only rewritten after the GPX file has been saved, so
/// a failed run never marks POI as exported.
pub fn run(config: &Config) -> Result<RunSummary, PipelineError> {
    let pois = download(config)?;
    let downloaded = pois.len();
    log::info!("{} POI downloaded.", downloaded);

    let store = SeenIdStore::new(&config.data_dir);
    let mut seen = store.load().map_err(|source| PipelineError::Filter {
        downloaded,
        source,
    })?;
    let DedupOutcome { kept, found } = seen.filter(pois);
    log::info!("Filtered out {} POI", found);

    log::info!("Parsing POI ...");
    let pending = kept.len();
    let annotated = annotate_all(kept, &config.tags)
        .map_err(|source| PipelineError::Annotate { pending, source })?;

    log::info!("Saving POI ...");
    let output = save_gpx(&config.data_dir, &chrono::Local::now(), &annotated).map_err(
        |source| PipelineError::Save {
            parsed: annotated.len(),
            source,
        },
    )?;
    log::info!("{} POI saved.", annotated.len());

    store
        .persist(&seen)
        .map_err(|source| PipelineError::Record {
            saved: annotated.len(),
            output: output.clone(),
            source,
        })?;

    Ok(RunSummary {
        downloaded,
        filtered_out: found,
        saved: annotated.len(),
        output,
    })
}
