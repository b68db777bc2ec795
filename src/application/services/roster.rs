//! Roster loading service
//!
//! Reads a roster file, parses it into units and indexes them by name.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{NameOrder, Roster, RosterFile, Unit};
use crate::infrastructure::traits::FileSystem;

/// Result of loading a roster file.
#[derive(Debug)]
pub struct LoadReport {
    pub path: PathBuf,
    pub roster: Roster,
    /// Names rejected because an earlier unit already used them, in file order
    pub duplicates: Vec<String>,
}

/// Service for building the roster index from a file.
pub struct RosterService {
    fs: Arc<dyn FileSystem>,
}

impl RosterService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load and index a roster file.
    ///
    /// Malformed blocks abort the load; duplicate names are skipped with a warning
    /// and reported in [`LoadReport::duplicates`].
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path, order: NameOrder) -> ApplicationResult<LoadReport> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read roster", path)?;

        let file = RosterFile::parse(&content, path.to_path_buf()).map_err(|source| {
            ApplicationError::RosterParse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!("parsed {} unit(s) from {}", file.units.len(), path.display());

        let mut roster = Roster::with_order(order);
        let mut duplicates = Vec::new();
        for unit in file.units {
            if let Err(rejected) = roster.insert(unit) {
                warn!("skipping duplicate unit: {}", rejected.unit().name());
                duplicates.push(rejected.into_inner().name().to_string());
            }
        }

        Ok(LoadReport {
            path: file.path,
            roster,
            duplicates,
        })
    }

    /// Look up a unit, turning "not found" into an error for user-facing commands.
    pub fn find<'r>(roster: &'r Roster, name: &str) -> ApplicationResult<&'r Unit> {
        roster
            .lookup(name.trim())
            .ok_or_else(|| ApplicationError::UnitNotFound(name.trim().to_string()))
    }
}
