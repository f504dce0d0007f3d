//! Identifiers of POI exported by earlier runs, kept in a comma-separated
//! `poi.ids` file inside the data directory.
//!
//! The read-modify-write cycle assumes a single running instance: two
//! overlapping runs race on the file and the last writer wins.

use crate::poi::RawPoi;

use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

pub const SEEN_IDS_FILE: &str = "poi.ids";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not read seen-id store {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not write seen-id store {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Set of seen ids that remembers insertion order for stable output.
#[derive(Debug, Clone, Default)]
pub struct SeenIds {
    order: Vec<String>,
    index: HashSet<String>,
}

/// POI that were not seen before, and how many were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupOutcome {
    pub kept: Vec<RawPoi>,
    pub found: usize,
}

impl SeenIds {
    /// Parses the stored form. Empty entries and repeated ids are dropped.
    pub fn parse(text: &str) -> Self {
        let mut ids = Self::default();
        for id in text.split(',').map(str::trim).filter(|id| !id.is_empty()) {
            ids.insert(id.to_string());
        }
        ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Returns `false` if the id was already present.
    pub fn insert(&mut self, id: String) -> bool {
        if self.index.contains(&id) {
            return false;
        }
        self.index.insert(id.clone());
        self.order.push(id);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn to_stored(&self) -> String {
        self.order.join(",")
    }

    /// Drops every POI whose id is already known and records the ids of the
    /// rest. A repeat within `pois` counts as seen too.
    pub fn filter(&mut self, pois: Vec<RawPoi>) -> DedupOutcome {
        let mut found = 0;
        let mut kept = Vec::with_capacity(pois.len());

        for poi in pois {
            if self.insert(poi.id.to_string()) {
                kept.push(poi);
            } else {
                found += 1;
            }
        }

        DedupOutcome { kept, found }
    }
}

impl PartialEq for SeenIds {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

#[derive(Debug, Clone)]
pub struct SeenIdStore {
    path: PathBuf,
}

impl SeenIdStore {
    /// Store at `poi.ids` inside `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self::at(data_dir.join(SEEN_IDS_FILE))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty set.
    pub fn load(&self) -> Result<SeenIds, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(SeenIds::parse(&text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(SeenIds::default()),
            Err(source) => Err(StorageError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Replaces the file in one step: the ids go to a temporary file in the
    /// same directory, which is then renamed over the store.
    pub fn persist(&self, ids: &SeenIds) -> Result<(), StorageError> {
        let write_err = |source: io::Error| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(ids.to_stored().as_bytes())
            .map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|err| write_err(err.error))?;
        Ok(())
    }

    /// Loads the store, filters `pois` against it and writes the grown set
    /// back.
    pub fn deduplicate(&self, pois: Vec<RawPoi>) -> Result<DedupOutcome, StorageError> {
        let mut ids = self.load()?;
        let outcome = ids.filter(pois);
        self.persist(&ids)?;
        log::debug!("{} ids recorded in {:?}", ids.len(), self.path);
        Ok(outcome)
    }
}
