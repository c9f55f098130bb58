use crate::domain::model::{KlvPacket, MarkerEvent, MarkerSettings, SidecarFile};
use crate::utils::error::{EtlError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

const SPOT_STATUS: &str = "spot";

/// Attributes that may carry the frame rate on `VideoFrame`, most specific first.
const FPS_ATTRIBUTES: [&str; 3] = ["videoInPointsPerSecond", "captureFps", "formatFps"];

/// Turns camera sidecar XML into ordered marker events.
#[derive(Debug, Clone)]
pub struct MarkerExtractor {
    settings: MarkerSettings,
    signatures: Vec<String>,
}

impl MarkerExtractor {
    pub fn new(settings: MarkerSettings) -> Self {
        let signatures = settings
            .rules
            .iter()
            .map(|rule| rule.signature_hex.to_ascii_uppercase())
            .collect();
        Self {
            settings,
            signatures,
        }
    }

    pub fn settings(&self) -> &MarkerSettings {
        &self.settings
    }

    /// Reads and extracts one sidecar. Any failure is logged and yields no markers.
    pub fn extract_file(&self, path: &Path) -> Vec<MarkerEvent> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match std::fs::read_to_string(path) {
            Ok(xml) => self.extract_str(&name, &xml),
            Err(e) => {
                tracing::warn!("⚠️ Could not read {}: {}", name, e);
                Vec::new()
            }
        }
    }

    pub fn extract_str(&self, name: &str, xml: &str) -> Vec<MarkerEvent> {
        match self.parse_sidecar(name, xml) {
            Ok(sidecar) => self.markers_from(&sidecar),
            Err(e) => {
                tracing::warn!("⚠️ Error parsing {}: {}", name, e);
                Vec::new()
            }
        }
    }

    /// Parses the frame rate and the raw packet table. Elements are matched
    /// by local name so any namespace version of the format is accepted.
    pub fn parse_sidecar(&self, name: &str, xml: &str) -> Result<SidecarFile> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<String> = Vec::new();
        let mut saw_root = false;
        let mut saw_packet_table = false;
        let mut fps: Option<f64> = None;
        let mut packets = Vec::new();

        loop {
            let (element, is_empty) = match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) => (e, false),
                Ok(Event::Empty(e)) => (e, true),
                Ok(Event::End(_)) => {
                    stack.pop();
                    continue;
                }
                Ok(_) => continue,
                Err(e) => {
                    return Err(EtlError::malformed_sidecar(
                        name,
                        format!("invalid XML at byte {}: {}", reader.error_position(), e),
                    ))
                }
            };

            saw_root = true;
            let local = local_name(&element);
            let parent = stack.last().map(String::as_str);

            match (parent, local.as_str()) {
                (Some("VideoFormat"), "VideoFrame") if fps.is_none() => {
                    fps = FPS_ATTRIBUTES
                        .iter()
                        .find_map(|key| attribute(&element, key))
                        .and_then(|raw| {
                            let parsed = parse_frame_rate(&raw);
                            if parsed.is_none() {
                                tracing::debug!("{}: unusable frame rate '{}'", name, raw);
                            }
                            parsed
                        });
                }
                (_, "KlvPacketTable") => saw_packet_table = true,
                (Some("KlvPacketTable"), "KlvPacket") => {
                    packets.push(KlvPacket {
                        status: attribute(&element, "status").unwrap_or_default(),
                        frame_count: attribute(&element, "frameCount")
                            .and_then(|v| v.trim().parse::<i64>().ok()),
                        length_value: attribute(&element, "lengthValue").unwrap_or_default(),
                    });
                }
                _ => {}
            }

            if !is_empty {
                stack.push(local);
            }
        }

        if !saw_root {
            return Err(EtlError::malformed_sidecar(name, "document has no root element"));
        }
        if !stack.is_empty() {
            return Err(EtlError::malformed_sidecar(
                name,
                format!("unexpected end of document inside <{}>", stack.join("/")),
            ));
        }
        if !saw_packet_table {
            return Err(EtlError::malformed_sidecar(name, "no KlvPacketTable element"));
        }

        let fps = fps.unwrap_or(self.settings.default_fps);
        tracing::debug!("{}: {} fps, {} packets", name, fps, packets.len());

        Ok(SidecarFile {
            name: name.to_string(),
            fps,
            packets,
        })
    }

    /// Spot packets with a positive frame count, in document order.
    pub fn markers_from(&self, sidecar: &SidecarFile) -> Vec<MarkerEvent> {
        sidecar
            .packets
            .iter()
            .filter(|packet| packet.status == SPOT_STATUS)
            .filter_map(|packet| match packet.frame_count {
                Some(frames) if frames > 0 => Some((frames as u64, packet)),
                Some(_) => None,
                None => {
                    tracing::debug!("{}: spot packet without usable frameCount", sidecar.name);
                    None
                }
            })
            .map(|(frames, packet)| {
                let (title, color) = self.classify(&packet.length_value);
                MarkerEvent {
                    time_offset_micros: frames_to_micros(frames, sidecar.fps),
                    title,
                    color,
                }
            })
            .collect()
    }

    /// First matching rule wins; otherwise the payload text, otherwise the
    /// generic title. Returns `(title, color)`.
    pub fn classify(&self, payload_hex: &str) -> (String, String) {
        let payload = payload_hex.to_ascii_uppercase();

        if let Some(rule) = self
            .signatures
            .iter()
            .position(|signature| payload.contains(signature.as_str()))
            .map(|i| &self.settings.rules[i])
        {
            return (rule.title.clone(), rule.color.clone());
        }

        let title = decode_hex(payload_hex)
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .map(|text| text.trim_end_matches('\0').trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| self.settings.fallback_title.clone());

        (title, self.settings.default_color.clone())
    }
}

pub fn frames_to_micros(frame_count: u64, fps: f64) -> u64 {
    (frame_count as f64 * 1_000_000.0 / fps).round() as u64
}

/// `"50p"`, `"25i"`, `"24"`, `"29.97p"`. Only positive finite rates are usable.
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let number = raw
        .strip_suffix(['p', 'P', 'i', 'I'])
        .unwrap_or(raw);
    number
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|fps| fps.is_finite() && *fps > 0.0)
}

pub fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim().as_bytes();
    if hex.len() % 2 != 0 {
        return None;
    }
    hex.chunks(2)
        .map(|pair| {
            let high = (pair[0] as char).to_digit(16)?;
            let low = (pair[1] as char).to_digit(16)?;
            Some((high * 16 + low) as u8)
        })
        .collect()
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).into_owned()
}

fn attribute(element: &BytesStart<'_>, key: &str) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key.as_bytes())
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ClassificationRule;

    const NS: &str = "urn:schemas-professionalDisc:nonRealTimeMeta:ver.2.20";

    fn sidecar(fps: Option<&str>, packets: &str) -> String {
        let format = fps
            .map(|f| {
                format!(
                    r#"<VideoFormat><VideoFrame videoCodec="AVC_3840_2160_HP@L51" videoInPointsPerSecond="{}"/></VideoFormat>"#,
                    f
                )
            })
            .unwrap_or_default();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<NonRealTimeMeta xmlns="{}" lastUpdate="2024-05-01T10:00:00+02:00">
  <Duration value="1500"/>
  {}
  <KlvPacketTable>
    {}
  </KlvPacketTable>
</NonRealTimeMeta>"#,
            NS, format, packets
        )
    }

    fn rule(signature: &str, color: &str, title: &str) -> ClassificationRule {
        ClassificationRule {
            signature_hex: signature.to_string(),
            color: color.to_string(),
            title: title.to_string(),
        }
    }

    fn extractor(rules: Vec<ClassificationRule>) -> MarkerExtractor {
        MarkerExtractor::new(MarkerSettings {
            rules,
            ..MarkerSettings::default()
        })
    }

    #[test]
    fn test_shot_mark_example() {
        let xml = sidecar(
            Some("25p"),
            r#"<KlvPacket key="060E2B34" frameCount="125" lengthValue="53686F744D61726B31" status="spot"/>"#,
        );
        let ex = extractor(vec![rule("53686F744D61726B31", "#00c1cd", "ShotMark1")]);

        let markers = ex.extract_str("C0012.xml", &xml);

        assert_eq!(
            markers,
            vec![MarkerEvent {
                time_offset_micros: 5_000_000,
                title: "ShotMark1".to_string(),
                color: "#00c1cd".to_string(),
            }]
        );
    }

    #[test]
    fn test_non_spot_and_non_positive_packets_are_skipped() {
        let xml = sidecar(
            Some("50p"),
            r#"<KlvPacket frameCount="10" lengthValue="41" status="start"/>
               <KlvPacket frameCount="0" lengthValue="42" status="spot"/>
               <KlvPacket frameCount="-5" lengthValue="43" status="spot"/>
               <KlvPacket frameCount="abc" lengthValue="44" status="spot"/>
               <KlvPacket lengthValue="45" status="spot"/>
               <KlvPacket frameCount="50" lengthValue="46" status="spot"/>"#,
        );
        let markers = extractor(vec![]).extract_str("C0001.xml", &xml);

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].title, "F");
        assert_eq!(markers[0].time_offset_micros, 1_000_000);
    }

    #[test]
    fn test_first_configured_rule_wins() {
        let ex = extractor(vec![
            rule("4D61726B32", "#ff0000", "Mark2"),
            rule("53686F74", "#00ff00", "Shot"),
        ]);
        // "ShotMark2" matches both signatures
        let (title, color) = ex.classify("53686F744D61726B32");
        assert_eq!((title.as_str(), color.as_str()), ("Mark2", "#ff0000"));

        let (title, _) = ex.classify("53686F744D61726B31");
        assert_eq!(title, "Shot");
    }

    #[test]
    fn test_signature_match_ignores_hex_case() {
        let ex = extractor(vec![rule("4d61726b", "#123456", "Mark")]);
        assert_eq!(ex.classify("00004D61726B00").0, "Mark");
    }

    #[test]
    fn test_fallback_titles() {
        let ex = extractor(vec![]);
        assert_eq!(ex.classify("48656C6C6F").0, "Hello");
        assert_eq!(ex.classify("48690000").0, "Hi");
        // invalid UTF-8
        assert_eq!(ex.classify("FFFE").0, "Shot Mark");
        // not hex at all
        assert_eq!(ex.classify("XYZ").0, "Shot Mark");
        assert_eq!(ex.classify("").0, "Shot Mark");
        assert_eq!(ex.classify("FFFE").1, "#00c1cd");
    }

    #[test]
    fn test_frame_rate_detection() {
        let ex = extractor(vec![]);
        let packet = r#"<KlvPacket frameCount="100" lengthValue="41" status="spot"/>"#;

        let cases = [
            (Some("25i"), 4_000_000),
            (Some("24"), 4_166_667),
            (Some("fast"), 2_000_000),
            (Some("0p"), 2_000_000),
            (None, 2_000_000),
        ];
        for (fps, expected) in cases {
            let markers = ex.extract_str("C0001.xml", &sidecar(fps, packet));
            assert_eq!(markers[0].time_offset_micros, expected, "fps {:?}", fps);
        }
    }

    #[test]
    fn test_default_fps_comes_from_settings() {
        let ex = MarkerExtractor::new(MarkerSettings {
            default_fps: 25.0,
            ..MarkerSettings::default()
        });
        let xml = sidecar(None, r#"<KlvPacket frameCount="25" lengthValue="41" status="spot"/>"#);
        assert_eq!(ex.extract_str("C0001.xml", &xml)[0].time_offset_micros, 1_000_000);
    }

    #[test]
    fn test_capture_fps_attribute_is_recognised() {
        let xml = format!(
            r#"<NonRealTimeMeta xmlns="{}">
  <VideoFormat><VideoFrame captureFps="100p" formatFps="50p"/></VideoFormat>
  <KlvPacketTable><KlvPacket frameCount="100" lengthValue="41" status="spot"/></KlvPacketTable>
</NonRealTimeMeta>"#,
            NS
        );
        let parsed = extractor(vec![]).parse_sidecar("C0001.xml", &xml).unwrap();
        assert_eq!(parsed.fps, 100.0);
    }

    #[test]
    fn test_prefixed_namespace_is_accepted() {
        let xml = r#"<nrt:NonRealTimeMeta xmlns:nrt="urn:x">
  <nrt:VideoFormat><nrt:VideoFrame videoInPointsPerSecond="25p"/></nrt:VideoFormat>
  <nrt:KlvPacketTable><nrt:KlvPacket frameCount="25" lengthValue="41" status="spot"/></nrt:KlvPacketTable>
</nrt:NonRealTimeMeta>"#;
        let markers = extractor(vec![]).extract_str("C0001.xml", xml);
        assert_eq!(markers[0].time_offset_micros, 1_000_000);
    }

    #[test]
    fn test_document_order_is_kept() {
        let xml = sidecar(
            Some("50p"),
            r#"<KlvPacket frameCount="300" lengthValue="42" status="spot"/>
               <KlvPacket frameCount="100" lengthValue="41" status="spot"/>"#,
        );
        let titles: Vec<String> = extractor(vec![])
            .extract_str("C0001.xml", &xml)
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[test]
    fn test_malformed_documents_yield_no_markers() {
        let ex = extractor(vec![]);
        assert!(ex.extract_str("empty.xml", "").is_empty());
        assert!(ex
            .extract_str("broken.xml", "<NonRealTimeMeta><KlvPacketTable></Oops>")
            .is_empty());
        assert!(ex
            .extract_str("cut.xml", "<NonRealTimeMeta><KlvPacketTable>")
            .is_empty());

        let err = ex
            .parse_sidecar("no-table.xml", "<NonRealTimeMeta/>")
            .unwrap_err();
        assert!(matches!(err, EtlError::MalformedSidecar { .. }));

        // reader errors carry the file name like every other sidecar failure
        let err = ex
            .parse_sidecar("broken.xml", "<NonRealTimeMeta><KlvPacketTable></Oops>")
            .unwrap_err();
        assert!(matches!(err, EtlError::MalformedSidecar { ref file, .. } if file == "broken.xml"));
        assert_eq!(err.severity(), crate::utils::error::ErrorSeverity::Low);
    }

    #[test]
    fn test_extract_file_reads_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("C0007.XML");
        std::fs::write(
            &path,
            sidecar(Some("50p"), r#"<KlvPacket frameCount="50" lengthValue="41" status="spot"/>"#),
        )
        .unwrap();

        let ex = extractor(vec![]);
        assert_eq!(ex.extract_file(&path).len(), 1);
        assert!(ex.extract_file(&dir.path().join("missing.xml")).is_empty());
    }

    #[test]
    fn test_frames_to_micros_rounds_and_is_monotonic() {
        assert_eq!(frames_to_micros(1, 30.0), 33_333);
        assert_eq!(frames_to_micros(2, 30.0), 66_667);
        assert_eq!(frames_to_micros(1001, 29.97), 33_400_067);

        let mut last = 0;
        for frames in 1..2_000 {
            let t = frames_to_micros(frames, 23.976);
            assert!(t > last);
            last = t;
        }
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("50p"), Some(50.0));
        assert_eq!(parse_frame_rate(" 29.97P "), Some(29.97));
        assert_eq!(parse_frame_rate("25i"), Some(25.0));
        assert_eq!(parse_frame_rate("24"), Some(24.0));
        assert_eq!(parse_frame_rate("p"), None);
        assert_eq!(parse_frame_rate("-25p"), None);
        assert_eq!(parse_frame_rate("inf"), None);
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("4a6B"), Some(vec![0x4a, 0x6b]));
        assert_eq!(decode_hex("4"), None);
        assert_eq!(decode_hex("zz"), None);
    }
}
