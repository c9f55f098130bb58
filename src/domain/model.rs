use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::project::{ProjectDocument, SegmentRef};

/// A timed, labeled cue recovered from one sidecar packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerEvent {
    pub time_offset_micros: u64,
    pub title: String,
    pub color: String,
}

/// One `KlvPacket` entry as read from the sidecar, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlvPacket {
    pub status: String,
    /// `None` when the attribute is missing or not an integer.
    pub frame_count: Option<i64>,
    pub length_value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SidecarFile {
    pub name: String,
    pub fps: f64,
    pub packets: Vec<KlvPacket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub signature_hex: String,
    pub color: String,
    pub title: String,
}

/// Everything the extractor needs to turn packets into markers.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSettings {
    pub default_color: String,
    pub fallback_title: String,
    pub default_fps: f64,
    pub rules: Vec<ClassificationRule>,
}

pub const DEFAULT_COLOR: &str = "#00c1cd";
pub const DEFAULT_FALLBACK_TITLE: &str = "Shot Mark";
pub const DEFAULT_FPS: f64 = 50.0;
pub const DEFAULT_PREFIX_LENGTH: usize = 5;

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            default_color: DEFAULT_COLOR.to_string(),
            fallback_title: DEFAULT_FALLBACK_TITLE.to_string(),
            default_fps: DEFAULT_FPS,
            rules: Vec::new(),
        }
    }
}

/// A sidecar discovered in the source folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarInput {
    pub file_name: String,
    pub path: PathBuf,
}

/// Output of the extract phase.
#[derive(Debug, Clone)]
pub struct ExtractedBatch {
    pub project: ProjectDocument,
    pub sidecars: Vec<SidecarInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipReport {
    pub file_name: String,
    pub prefix: String,
    pub markers: usize,
    pub segments: Vec<SegmentRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    pub files_scanned: usize,
    pub files_unmatched: usize,
    pub files_without_markers: usize,
    pub clips: Vec<ClipReport>,
    pub total_markers: usize,
}

impl ConversionReport {
    pub fn has_changes(&self) -> bool {
        self.total_markers > 0
    }
}

/// Output of the transform phase: the mutated project plus what happened.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub project: ProjectDocument,
    pub report: ConversionReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub report: ConversionReport,
    /// Where the project was written, `None` when nothing changed.
    pub persisted_to: Option<String>,
}
