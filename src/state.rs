//! The last-known-good store: one durable float.
//!
//! Read before validation, conditionally overwritten after a successful
//! one. Deliberately a separate file with its own load/save contract,
//! independent of the calibration store — only the validation path ever
//! writes here.

use crate::error::{ReaderError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
struct LastKnownGood {
    value: f64,
}

/// File-backed single-value store.
#[derive(Clone, Debug)]
pub struct LastKnownGoodStore {
    path: PathBuf,
}

impl LastKnownGoodStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the stored value. A missing file means no reading has ever been
    /// accepted; that is `None`, not an error.
    pub fn load(&self) -> Result<Option<f64>> {
        if !self.path.exists() {
            debug!("no last-known-good value at {}", self.path.display());
            return Ok(None);
        }
        let data =
            fs::read_to_string(&self.path).map_err(|e| ReaderError::io(&self.path, e))?;
        let record: LastKnownGood =
            serde_json::from_str(&data).map_err(|e| ReaderError::json(&self.path, e))?;
        debug!("last known good reading: {:.2}", record.value);
        Ok(Some(record.value))
    }

    /// Overwrite the stored value. Called only after an accepted reading.
    pub fn save(&self, value: f64) -> Result<()> {
        crate::io::write_json(&self.path, &LastKnownGood { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastKnownGoodStore::new(dir.path().join("last.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastKnownGoodStore::new(dir.path().join("last.json"));
        store.save(745.23).unwrap();
        assert_eq!(store.load().unwrap(), Some(745.23));
        store.save(745.25).unwrap();
        assert_eq!(store.load().unwrap(), Some(745.25));
    }
}
