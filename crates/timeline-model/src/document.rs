//! Timeline document parsing.
//!
//! The editor exports its state as JSON with a `trackItemsMap` object keyed
//! by item id. JSON objects carry encounter order, and tie-breaking in the
//! EDL builder depends on it, so the map is parsed into an ordered vector
//! rather than a hash map.

use std::collections::HashSet;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::item::{
    ItemKind, ShadowStyle, TextAnimation, TextDetails, TimeWindow, TrackItem, Transform,
};

/// Output canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// A parsed, fully-defaulted timeline document.
///
/// Read-only to the export pipeline: the editor owns the live document and
/// a fresh parse is taken per export attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineDocument {
    /// Project identifier.
    pub id: String,

    /// Output canvas size.
    pub size: CanvasSize,

    /// Total timeline duration in milliseconds.
    pub duration_ms: u64,

    /// Frame rate; 30 when the editor left it unspecified.
    pub fps: u32,

    /// Track items in document encounter order.
    pub items: Vec<TrackItem>,
}

impl TimelineDocument {
    /// Parse a timeline document from editor JSON.
    ///
    /// Structural problems (malformed JSON, wrongly-typed fields, duplicate
    /// item ids) fail; missing optional fields resolve to their documented
    /// defaults here and nowhere else.
    pub fn parse(json: &str) -> Result<Self, TimelineError> {
        let raw: RawDocument = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Items that reference playable media bytes (video and audio).
    pub fn media_items(&self) -> impl Iterator<Item = &TrackItem> {
        self.items.iter().filter(|item| item.kind.is_media())
    }

    fn from_raw(raw: RawDocument) -> Result<Self, TimelineError> {
        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(raw.track_items_map.len());
        for (id, raw_item) in raw.track_items_map {
            if !seen.insert(id.clone()) {
                return Err(TimelineError::DuplicateItemId { id });
            }
            items.push(raw_item.into_item(id));
        }

        Ok(Self {
            id: raw.id.unwrap_or_else(|| "untitled".to_string()),
            size: raw.size.unwrap_or_default(),
            duration_ms: to_ms(raw.duration),
            fps: raw
                .fps
                .filter(|fps| fps.is_finite() && *fps > 0.0)
                .map(|fps| fps.round() as u32)
                .unwrap_or(30),
            items,
        })
    }
}

/// Errors from timeline document parsing.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("Invalid timeline JSON: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    #[error("Duplicate track item id: {id}")]
    DuplicateItemId { id: String },
}

// ---------------------------------------------------------------------------
// Raw (wire) types. Everything optional; defaults applied in `into_item`.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    id: Option<String>,
    size: Option<CanvasSize>,
    duration: Option<f64>,
    fps: Option<f64>,
    #[serde(default, deserialize_with = "ordered_item_map")]
    track_items_map: Vec<(String, RawItem)>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    #[serde(rename = "type")]
    kind: Option<ItemKind>,
    name: Option<String>,
    display: Option<RawWindow>,
    trim: Option<RawWindow>,
    playback_rate: Option<f64>,
    #[serde(default)]
    details: RawDetails,
}

#[derive(Debug, Default, Deserialize)]
struct RawWindow {
    from: Option<f64>,
    to: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDetails {
    src: Option<String>,
    volume: Option<f64>,
    opacity: Option<f64>,
    transform: Option<Transform>,
    text: Option<String>,
    width: Option<f64>,
    font_size: Option<f64>,
    font_family: Option<String>,
    color: Option<String>,
    text_align: Option<String>,
    border_width: Option<f64>,
    border_color: Option<String>,
    box_shadow: Option<RawShadow>,
    animation: Option<RawAnimation>,
}

#[derive(Debug, Deserialize)]
struct RawShadow {
    color: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    blur: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawAnimation {
    kind: Option<String>,
    duration: Option<f64>,
}

impl RawItem {
    fn into_item(self, id: String) -> TrackItem {
        let kind = self.kind.unwrap_or(ItemKind::Other);

        let display = match &self.display {
            Some(window) => {
                let from_ms = to_ms(window.from);
                // End clamped to start; a reversed window has zero length.
                let to_ms = to_ms(window.to).max(from_ms);
                TimeWindow::new(from_ms, to_ms)
            }
            None => TimeWindow::default(),
        };

        let trim = match &self.trim {
            Some(window) => TimeWindow::new(
                to_ms(window.from),
                window.to.map_or(display.duration_ms(), |to| to_ms(Some(to))),
            ),
            None => TimeWindow::new(0, display.duration_ms()),
        };

        let text = if kind == ItemKind::Text {
            let defaults = TextDetails::default();
            Some(TextDetails {
                text: self.details.text.clone().unwrap_or_default(),
                box_width: positive_or(self.details.width, defaults.box_width),
                font_size: positive_or(self.details.font_size, defaults.font_size),
                font_family: self
                    .details
                    .font_family
                    .clone()
                    .unwrap_or(defaults.font_family),
                color: self.details.color.clone().unwrap_or(defaults.color),
                align: self.details.text_align.clone().unwrap_or(defaults.align),
                border_width: self.details.border_width.unwrap_or(defaults.border_width),
                border_color: self
                    .details
                    .border_color
                    .clone()
                    .unwrap_or(defaults.border_color),
                shadow: self.details.box_shadow.as_ref().map_or_else(
                    ShadowStyle::default,
                    |shadow| ShadowStyle {
                        color: shadow.color.clone().unwrap_or_else(|| {
                            ShadowStyle::default().color
                        }),
                        x: shadow.x.unwrap_or(0.0),
                        y: shadow.y.unwrap_or(0.0),
                        blur: shadow.blur.unwrap_or(0.0),
                    },
                ),
                animation: self.details.animation.as_ref().map(|anim| TextAnimation {
                    kind: anim.kind.clone().unwrap_or_else(|| "none".to_string()),
                    duration_ms: to_ms(anim.duration),
                }),
            })
        } else {
            None
        };

        TrackItem {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            kind,
            display,
            trim,
            playback_rate: self
                .playback_rate
                .filter(|rate| rate.is_finite() && *rate > 0.0)
                .unwrap_or(1.0),
            volume: percent_or(self.details.volume, 100),
            opacity: percent_or(self.details.opacity, 100),
            source_url: self.details.src.unwrap_or_default(),
            transform: self.details.transform.unwrap_or_default(),
            text,
        }
    }
}

/// Millisecond conversion: non-finite and negative values collapse to 0.
fn to_ms(value: Option<f64>) -> u64 {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.round() as u64)
        .unwrap_or(0)
}

/// Percent field clamped into 0..=100.
fn percent_or(value: Option<f64>, default: u32) -> u32 {
    value
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, 100.0) as u32)
        .unwrap_or(default)
}

fn positive_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(default)
}

/// Deserialize a JSON object into key order-preserving pairs.
fn ordered_item_map<'de, D>(deserializer: D) -> Result<Vec<(String, RawItem)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedMapVisitor;

    impl<'de> Visitor<'de> for OrderedMapVisitor {
        type Value = Vec<(String, RawItem)>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a map of item id to track item")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some(entry) = access.next_entry::<String, RawItem>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedMapVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_doc(items: &str) -> String {
        format!(
            r#"{{
                "id": "proj-1",
                "size": {{"width": 1080, "height": 1920}},
                "duration": 30000,
                "trackItemsMap": {items}
            }}"#
        )
    }

    #[test]
    fn test_parse_applies_documented_defaults() {
        let json = minimal_doc(r#"{"a": {"type": "video"}}"#);
        let doc = TimelineDocument::parse(&json).unwrap();

        assert_eq!(doc.fps, 30);
        let item = &doc.items[0];
        assert_eq!(item.name, "a");
        assert_eq!(item.display, TimeWindow::new(0, 0));
        assert_eq!(item.trim, TimeWindow::new(0, 0));
        assert_eq!(item.playback_rate, 1.0);
        assert_eq!(item.volume, 100);
        assert_eq!(item.opacity, 100);
        assert_eq!(item.source_url, "");
    }

    #[test]
    fn test_parse_preserves_encounter_order() {
        let json = minimal_doc(
            r#"{
                "z-last-id": {"type": "video", "display": {"from": 0, "to": 100}},
                "a-first-id": {"type": "video", "display": {"from": 0, "to": 100}}
            }"#,
        );
        let doc = TimelineDocument::parse(&json).unwrap();
        let ids: Vec<_> = doc.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["z-last-id", "a-first-id"]);
    }

    #[test]
    fn test_parse_rejects_duplicate_ids() {
        // serde_json's default map type would silently keep the last entry;
        // the ordered visitor keeps both so the duplicate is detectable.
        let json = minimal_doc(r#"{"dup": {"type": "video"}, "dup": {"type": "audio"}}"#);
        let err = TimelineDocument::parse(&json).unwrap_err();
        assert!(matches!(err, TimelineError::DuplicateItemId { ref id } if id == "dup"));
    }

    #[test]
    fn test_trim_defaults_to_full_display_duration() {
        let json = minimal_doc(
            r#"{"a": {"type": "video", "display": {"from": 1000, "to": 6000}}}"#,
        );
        let doc = TimelineDocument::parse(&json).unwrap();
        assert_eq!(doc.items[0].trim, TimeWindow::new(0, 5000));
    }

    #[test]
    fn test_partial_trim_fills_missing_bound() {
        let json = minimal_doc(
            r#"{"a": {
                "type": "video",
                "display": {"from": 0, "to": 5000},
                "trim": {"from": 1000}
            }}"#,
        );
        let doc = TimelineDocument::parse(&json).unwrap();
        assert_eq!(doc.items[0].trim, TimeWindow::new(1000, 5000));
    }

    #[test]
    fn test_invalid_playback_rate_defaults_to_one() {
        for rate in ["0", "-2.5"] {
            let json = minimal_doc(&format!(
                r#"{{"a": {{"type": "video", "playbackRate": {rate}}}}}"#
            ));
            let doc = TimelineDocument::parse(&json).unwrap();
            assert_eq!(doc.items[0].playback_rate, 1.0);
        }
    }

    #[test]
    fn test_volume_clamped_to_percent_range() {
        let json = minimal_doc(
            r#"{"a": {"type": "audio", "details": {"volume": 250}}}"#,
        );
        let doc = TimelineDocument::parse(&json).unwrap();
        assert_eq!(doc.items[0].volume, 100);
    }

    #[test]
    fn test_reversed_display_window_clamps_to_start() {
        let json = minimal_doc(
            r#"{"a": {"type": "video", "display": {"from": 5000, "to": 2000}}}"#,
        );
        let doc = TimelineDocument::parse(&json).unwrap();
        assert_eq!(doc.items[0].display, TimeWindow::new(5000, 5000));
    }

    #[test]
    fn test_text_item_styling_defaults() {
        let json = minimal_doc(r#"{"t": {"type": "text", "details": {"text": "Hello"}}}"#);
        let doc = TimelineDocument::parse(&json).unwrap();
        let text = doc.items[0].text.as_ref().unwrap();
        assert_eq!(text.text, "Hello");
        assert_eq!(text.box_width, 600.0);
        assert_eq!(text.font_size, 48.0);
        assert_eq!(text.align, "center");
        assert!(text.animation.is_none());
    }

    #[test]
    fn test_non_text_item_has_no_text_details() {
        let json = minimal_doc(r#"{"v": {"type": "video", "details": {"text": "nope"}}}"#);
        let doc = TimelineDocument::parse(&json).unwrap();
        assert!(doc.items[0].text.is_none());
    }

    #[test]
    fn test_unknown_kinds_are_carried_but_not_media() {
        let json = minimal_doc(
            r#"{
                "v": {"type": "video"},
                "s": {"type": "sticker"},
                "i": {"type": "image"}
            }"#,
        );
        let doc = TimelineDocument::parse(&json).unwrap();
        assert_eq!(doc.items.len(), 3);
        assert_eq!(doc.media_items().count(), 1);
    }

    #[test]
    fn test_missing_track_items_map_parses_empty() {
        let doc = TimelineDocument::parse(r#"{"id": "empty"}"#).unwrap();
        assert!(doc.items.is_empty());
        assert_eq!(doc.size, CanvasSize::default());
    }
}
