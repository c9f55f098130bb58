//! The editor's project document (`draft_content.json`).
//!
//! The document keeps the parsed JSON tree as-is and hands out typed,
//! read-only views of the parts the conversion reads. The only write path is
//! [`ProjectDocument::attach_marker_collection`], which touches
//! `materials.time_marks` and one segment's `extra_material_refs`. Everything
//! else, including key order and fields this tool knows nothing about, is
//! written back exactly as it was read.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::error::{EtlError, Result};

pub const VIDEO_TRACK: &str = "video";

const TRACKS: &str = "tracks";
const SEGMENTS: &str = "segments";
const MATERIALS: &str = "materials";
const VIDEOS: &str = "videos";
const TIME_MARKS: &str = "time_marks";
const EXTRA_MATERIAL_REFS: &str = "extra_material_refs";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectDocument {
    root: Map<String, Value>,
}

/// Position of a segment inside the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SegmentRef {
    pub track: usize,
    pub segment: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Segment<'a>(&'a Map<String, Value>);

impl<'a> Segment<'a> {
    pub fn material_id(&self) -> Option<&'a str> {
        self.0.get("material_id").and_then(Value::as_str)
    }

    pub fn has_extra_material_refs(&self) -> bool {
        self.0.get(EXTRA_MATERIAL_REFS).is_some_and(|refs| !refs.is_null())
    }

    /// String entries of `extra_material_refs`, in order.
    pub fn extra_material_refs(&self) -> Vec<&'a str> {
        self.0
            .get(EXTRA_MATERIAL_REFS)
            .and_then(Value::as_array)
            .map(|refs| refs.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Material<'a>(&'a Map<String, Value>);

impl<'a> Material<'a> {
    pub fn id(&self) -> Option<&'a str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn material_name(&self) -> &'a str {
        self.0
            .get("material_name")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn path(&self) -> &'a str {
        self.0.get("path").and_then(Value::as_str).unwrap_or("")
    }

    /// Last component of `path`, accepting both `/` and `\` separators since
    /// projects are often created on Windows.
    pub fn path_basename(&self) -> &'a str {
        self.path().rsplit(['/', '\\']).next().unwrap_or("")
    }
}

/// A marker collection created by this tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerCollection {
    pub id: String,
    pub mark_items: Vec<MarkerItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerItem {
    pub id: String,
    pub time_range: TimeRange,
    pub color: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: u64,
    pub duration: u64,
}

impl ProjectDocument {
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(EtlError::project(format!(
                "project root must be a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_json_slice(data: &[u8]) -> Result<Self> {
        Self::from_value(serde_json::from_slice(data)?)
    }

    pub fn as_json(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Pretty JSON with 4-space indentation, the layout the editor writes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.root.serialize(&mut serializer)?;
        Ok(out)
    }

    fn tracks(&self) -> &[Value] {
        self.root
            .get(TRACKS)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn materials(&self) -> Option<&Map<String, Value>> {
        self.root.get(MATERIALS).and_then(Value::as_object)
    }

    pub fn track_count(&self) -> usize {
        self.tracks().len()
    }

    /// Segments of video tracks only, in track then timeline order.
    pub fn video_segments(&self) -> impl Iterator<Item = (SegmentRef, Segment<'_>)> + '_ {
        self.tracks()
            .iter()
            .enumerate()
            .filter(|(_, track)| track.get("type").and_then(Value::as_str) == Some(VIDEO_TRACK))
            .flat_map(|(t, track)| {
                track
                    .get(SEGMENTS)
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or(&[])
                    .iter()
                    .enumerate()
                    .filter_map(move |(s, segment)| {
                        let at = SegmentRef {
                            track: t,
                            segment: s,
                        };
                        segment.as_object().map(|segment| (at, Segment(segment)))
                    })
            })
    }

    /// Entries of `materials.videos`; entries that are not objects are ignored.
    pub fn video_materials(&self) -> impl Iterator<Item = Material<'_>> + '_ {
        self.materials()
            .and_then(|m| m.get(VIDEOS))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .filter_map(Value::as_object)
            .map(Material)
    }

    pub fn video_material(&self, id: &str) -> Option<Material<'_>> {
        self.video_materials().find(|m| m.id() == Some(id))
    }

    pub fn segment(&self, at: SegmentRef) -> Option<Segment<'_>> {
        self.tracks()
            .get(at.track)?
            .get(SEGMENTS)?
            .as_array()?
            .get(at.segment)?
            .as_object()
            .map(Segment)
    }

    fn segment_mut(&mut self, at: SegmentRef) -> Option<&mut Map<String, Value>> {
        self.root
            .get_mut(TRACKS)?
            .as_array_mut()?
            .get_mut(at.track)?
            .get_mut(SEGMENTS)?
            .as_array_mut()?
            .get_mut(at.segment)?
            .as_object_mut()
    }

    /// Collections in `materials.time_marks`, left exactly as stored.
    pub fn time_marks(&self) -> &[Value] {
        self.materials()
            .and_then(|m| m.get(TIME_MARKS))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn time_mark(&self, id: &str) -> Option<&Value> {
        self.time_marks()
            .iter()
            .find(|c| c.get("id").and_then(Value::as_str) == Some(id))
    }

    /// Adds `collection` to `materials.time_marks` and references it from the
    /// segment at `at`. Missing or null lists are created. Every shape check
    /// runs before the first write, so an error leaves the document unchanged.
    pub fn attach_marker_collection(
        &mut self,
        at: SegmentRef,
        collection: MarkerCollection,
    ) -> Result<()> {
        let segment = self.segment(at).ok_or_else(|| {
            EtlError::project(format!("no segment {} on track {}", at.segment, at.track))
        })?;
        expect_list_or_absent(segment.0.get(EXTRA_MATERIAL_REFS), EXTRA_MATERIAL_REFS)?;
        match self.root.get(MATERIALS) {
            None => {}
            Some(Value::Object(materials)) => {
                expect_list_or_absent(materials.get(TIME_MARKS), "materials.time_marks")?
            }
            Some(other) => {
                return Err(EtlError::project(format!(
                    "materials must be an object, found {}",
                    json_kind(other)
                )))
            }
        }

        let id = collection.id.clone();
        let collection = serde_json::to_value(collection)?;

        let materials = self
            .root
            .entry(MATERIALS)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(materials) = materials.as_object_mut() {
            push_to_list(materials, TIME_MARKS, collection);
        }
        if let Some(segment) = self.segment_mut(at) {
            push_to_list(segment, EXTRA_MATERIAL_REFS, Value::String(id));
        }
        Ok(())
    }
}

fn expect_list_or_absent(value: Option<&Value>, field: &str) -> Result<()> {
    match value {
        None | Some(Value::Null) | Some(Value::Array(_)) => Ok(()),
        Some(other) => Err(EtlError::project(format!(
            "{} must be a list, found {}",
            field,
            json_kind(other)
        ))),
    }
}

/// Appends to `map[key]`, turning an absent or null entry into a list in place.
fn push_to_list(map: &mut Map<String, Value>, key: &str, item: Value) {
    let slot = map.entry(key).or_insert(Value::Null);
    if slot.is_null() {
        *slot = Value::Array(Vec::new());
    }
    if let Some(list) = slot.as_array_mut() {
        list.push(item);
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
