//! Persistence layer for tariff timelines
//!
//! This module handles saving and loading the two timelines across restarts
//! through a uniform repository seam, so the backing format stays an
//! implementation detail of the chosen store.

use crate::error::Result;
use crate::logging::{StructuredLogger, get_logger};
use crate::model::FlowDirection;
use crate::timeline::Timeline;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The persisted state: two independent ordered period collections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineDocument {
    /// Import timeline
    pub import_timeline: Timeline,

    /// Export timeline
    pub export_timeline: Timeline,
}

impl Default for TimelineDocument {
    fn default() -> Self {
        Self {
            import_timeline: Timeline::new(FlowDirection::Import),
            export_timeline: Timeline::new(FlowDirection::Export),
        }
    }
}

/// Repository seam for timeline persistence.
///
/// Any backing store honoring the document layout is acceptable; the
/// engine only ever talks to this trait.
pub trait TimelineStore: Send + Sync {
    /// Load the persisted timelines, or defaults when nothing is stored yet
    fn load(&self) -> Result<TimelineDocument>;

    /// Persist the timelines
    fn save(&self, document: &TimelineDocument) -> Result<()>;
}

/// JSON file store holding both timelines in one document
pub struct JsonFileStore {
    file_path: String,
    logger: StructuredLogger,
}

impl JsonFileStore {
    /// Create a store backed by the given file path
    pub fn new(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            logger: get_logger("store"),
        }
    }
}

impl TimelineStore for JsonFileStore {
    fn load(&self) -> Result<TimelineDocument> {
        let path = Path::new(&self.file_path);

        if !path.exists() {
            self.logger
                .info("No timeline document found, starting with empty timelines");
            return Ok(TimelineDocument::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let document: TimelineDocument = serde_json::from_str(&contents)?;
        self.logger.info(&format!(
            "Loaded timelines from disk - import periods: {}, export periods: {}",
            document.import_timeline.len(),
            document.export_timeline.len()
        ));

        Ok(document)
    }

    fn save(&self, document: &TimelineDocument) -> Result<()> {
        let contents = serde_json::to_string_pretty(document)?;
        std::fs::write(&self.file_path, contents)?;
        self.logger.debug("Saved timelines to disk");

        Ok(())
    }
}
