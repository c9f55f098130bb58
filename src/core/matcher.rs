use crate::domain::model::DEFAULT_PREFIX_LENGTH;
use crate::domain::project::{ProjectDocument, SegmentRef};
use std::path::Path;

/// Finds the timeline segments a sidecar belongs to by comparing the
/// camera's file-name prefix (e.g. `C0012`) with each video material's name
/// and path basename.
#[derive(Debug, Clone, Copy)]
pub struct ClipMatcher {
    prefix_length: usize,
}

impl Default for ClipMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX_LENGTH)
    }
}

impl ClipMatcher {
    pub fn new(prefix_length: usize) -> Self {
        Self { prefix_length }
    }

    /// First `prefix_length` characters of the file stem.
    pub fn matching_key(&self, sidecar_file_name: &str) -> String {
        let stem = Path::new(sidecar_file_name)
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        stem.chars().take(self.prefix_length).collect()
    }

    pub fn find_segments(&self, sidecar_file_name: &str, project: &ProjectDocument) -> Vec<SegmentRef> {
        let key = self.matching_key(sidecar_file_name);
        if key.is_empty() {
            return Vec::new();
        }

        project
            .video_segments()
            .filter(|(_, segment)| {
                segment
                    .material_id()
                    .and_then(|id| project.video_material(id))
                    .is_some_and(|material| {
                        material.material_name().contains(&key)
                            || material.path_basename().contains(&key)
                    })
            })
            .map(|(at, _)| at)
            .collect()
    }
}
