//! In-memory collection of project records, flushed once per run.

use std::path::Path;

use voz_civica_project_models::ProjectRecord;

use crate::ScrapeError;

/// Accumulates project records in append order.
///
/// No deduplication happens: processing the same project twice yields two
/// entries.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    records: Vec<ProjectRecord>,
}

impl ResultAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Appends a record.
    pub fn add(&mut self, record: ProjectRecord) {
        self.records.push(record);
    }

    /// Records collected so far.
    #[must_use]
    pub fn records(&self) -> &[ProjectRecord] {
        &self.records
    }

    /// Number of records collected.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record has been added yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serializes the records as a pretty-printed JSON array.
    ///
    /// Non-ASCII text is written as UTF-8, not `\u` escapes.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ScrapeError> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Writes the JSON array to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ScrapeError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ScrapeError::io(parent, e))?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| ScrapeError::io(path, e))?;

        log::info!("Saved {} project(s) to {}", self.len(), path.display());
        Ok(())
    }
}
