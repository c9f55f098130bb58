use crate::domain::model::MarkerEvent;
use crate::domain::ports::IdGenerator;
use crate::domain::project::{MarkerCollection, MarkerItem, ProjectDocument, SegmentRef, TimeRange};
use crate::utils::error::Result;

/// Attaches marker collections to segments.
///
/// Every call creates a brand-new collection; nothing is compared with marks
/// already present, so running twice over the same project stacks duplicates.
pub struct InjectionEngine<'a, G: IdGenerator + ?Sized> {
    ids: &'a G,
}

impl<'a, G: IdGenerator + ?Sized> InjectionEngine<'a, G> {
    pub fn new(ids: &'a G) -> Self {
        Self { ids }
    }

    /// Returns the id of the new collection; the number of injected markers
    /// is `markers.len()`.
    pub fn inject(
        &self,
        project: &mut ProjectDocument,
        at: SegmentRef,
        markers: &[MarkerEvent],
    ) -> Result<String> {
        let collection = MarkerCollection {
            id: self.ids.next_id(),
            mark_items: markers
                .iter()
                .map(|marker| MarkerItem {
                    id: self.ids.next_id(),
                    time_range: TimeRange {
                        start: marker.time_offset_micros,
                        duration: 0,
                    },
                    color: marker.color.clone(),
                    title: marker.title.clone(),
                })
                .collect(),
        };
        let id = collection.id.clone();

        project.attach_marker_collection(at, collection)?;
        tracing::debug!(
            "Attached collection {} ({} marks) to track {} segment {}",
            id,
            markers.len(),
            at.track,
            at.segment
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::SequentialIds;
    use serde_json::json;

    fn project() -> ProjectDocument {
        ProjectDocument::from_value(json!({
            "tracks": [{"type": "video", "segments": [{"material_id": "V1"}]}],
            "materials": {
                "videos": [{"id": "V1", "material_name": "C0012.MP4", "path": ""}],
                "time_marks": [{"id": "OLD", "mark_items": []}]
            }
        }))
        .unwrap()
    }

    fn markers() -> Vec<MarkerEvent> {
        vec![
            MarkerEvent {
                time_offset_micros: 5_000_000,
                title: "ShotMark1".to_string(),
                color: "#00c1cd".to_string(),
            },
            MarkerEvent {
                time_offset_micros: 7_500_000,
                title: "ShotMark2".to_string(),
                color: "#ff0000".to_string(),
            },
        ]
    }

    const AT: SegmentRef = SegmentRef {
        track: 0,
        segment: 0,
    };

    #[test]
    fn test_inject_builds_collection_with_fresh_ids() {
        let ids = SequentialIds::new("T");
        let mut doc = project();

        let id = InjectionEngine::new(&ids).inject(&mut doc, AT, &markers()).unwrap();

        assert_eq!(id, "T-1");
        assert_eq!(doc.time_marks().len(), 2);
        let items = &doc.time_mark("T-1").unwrap()["mark_items"];
        assert_eq!(items.as_array().unwrap().len(), 2);
        assert_eq!(items[0]["id"], "T-2");
        assert_eq!(items[1]["id"], "T-3");
        assert_eq!(items[1]["time_range"], json!({"start": 7_500_000, "duration": 0}));
        assert_eq!(items[1]["color"], "#ff0000");
        assert_eq!(doc.segment(AT).unwrap().extra_material_refs(), ["T-1"]);
    }

    #[test]
    fn test_repeated_injection_accumulates_duplicates() {
        let ids = SequentialIds::new("T");
        let engine = InjectionEngine::new(&ids);
        let mut doc = project();

        engine.inject(&mut doc, AT, &markers()).unwrap();
        engine.inject(&mut doc, AT, &markers()).unwrap();

        // one pre-existing collection plus one per run
        let marks = doc.time_marks();
        assert_eq!(marks.len(), 3);
        assert_eq!(doc.segment(AT).unwrap().extra_material_refs().len(), 2);
        assert_eq!(
            marks[1]["mark_items"].as_array().unwrap().len(),
            marks[2]["mark_items"].as_array().unwrap().len()
        );
        assert_ne!(marks[1]["id"], marks[2]["id"]);
    }

    #[test]
    fn test_serialized_mark_item_shape() {
        let ids = SequentialIds::new("T");
        let mut doc = project();
        InjectionEngine::new(&ids).inject(&mut doc, AT, &markers()[..1]).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&doc.to_json_bytes().unwrap()).unwrap();
        assert_eq!(
            value["materials"]["time_marks"][1],
            json!({
                "id": "T-1",
                "mark_items": [{
                    "id": "T-2",
                    "time_range": {"start": 5_000_000, "duration": 0},
                    "color": "#00c1cd",
                    "title": "ShotMark1"
                }]
            })
        );
    }

    #[test]
    fn test_existing_mark_item_without_color_is_kept() {
        let ids = SequentialIds::new("T");
        let mut doc = ProjectDocument::from_json_slice(
            br#"{"tracks":[{"type":"video","segments":[{"material_id":"V1"}]}],"materials":{"videos":[{"id":"V1"}],"time_marks":[{"id":"OLD","mark_items":[{"id":"I1","time_range":{"start":0,"duration":0},"title":"legacy"}]}]}}"#,
        )
        .unwrap();

        InjectionEngine::new(&ids).inject(&mut doc, AT, &markers()).unwrap();

        let old = doc.time_mark("OLD").unwrap();
        assert_eq!(
            old,
            &json!({"id": "OLD", "mark_items": [
                {"id": "I1", "time_range": {"start": 0, "duration": 0}, "title": "legacy"}
            ]})
        );
        assert!(old["mark_items"][0].get("color").is_none());
    }

    #[test]
    fn test_segment_without_material_id_gets_no_empty_fields() {
        let ids = SequentialIds::new("T");
        let mut doc = ProjectDocument::from_value(json!({
            "tracks": [{"type": "video", "segments": [{"id": "S"}]}],
            "materials": {"videos": [{"id": "V1"}]}
        }))
        .unwrap();

        InjectionEngine::new(&ids).inject(&mut doc, AT, &markers()).unwrap();

        let written = String::from_utf8(doc.to_json_bytes().unwrap()).unwrap();
        assert!(!written.contains("\"\""), "empty string written: {}", written);
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(
            value["tracks"][0]["segments"][0],
            json!({"id": "S", "extra_material_refs": ["T-1"]})
        );
        assert_eq!(value["materials"]["videos"][0], json!({"id": "V1"}));
    }
}
