//! Track item types.
//!
//! A track item is one editable element on the timeline. Items arrive from
//! the editor with most fields optional; the parser in [`crate::document`]
//! resolves every default before an item becomes a [`TrackItem`], so all
//! fields here are fully populated.

use serde::{Deserialize, Serialize};

/// Kind tag for a track item. The export pipeline inspects video, audio,
/// and text items; everything else is carried but ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Video,
    Audio,
    Text,
    Image,
    #[serde(other)]
    Other,
}

impl ItemKind {
    /// Whether this kind carries playable media bytes (video or audio).
    pub fn is_media(self) -> bool {
        matches!(self, ItemKind::Video | ItemKind::Audio)
    }
}

/// A half-open window on the timeline or within the source, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TimeWindow {
    pub from_ms: u64,
    pub to_ms: u64,
}

impl TimeWindow {
    pub fn new(from_ms: u64, to_ms: u64) -> Self {
        Self { from_ms, to_ms }
    }

    /// Window length in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.to_ms.saturating_sub(self.from_ms)
    }
}

/// Offset relative to the canvas center, in pixels. Used by text items.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
}

/// Drop-shadow styling for text items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowStyle {
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub blur: f64,
}

impl Default for ShadowStyle {
    fn default() -> Self {
        Self {
            color: "transparent".to_string(),
            x: 0.0,
            y: 0.0,
            blur: 0.0,
        }
    }
}

/// Entrance/exit animation descriptor for text items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnimation {
    pub kind: String,
    pub duration_ms: u64,
}

/// Styling and content carried only by text items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDetails {
    /// Literal text to render.
    pub text: String,

    /// Layout box width in pixels.
    pub box_width: f64,

    /// Font size in pixels.
    pub font_size: f64,

    pub font_family: String,
    pub color: String,
    pub align: String,

    pub border_width: f64,
    pub border_color: String,
    pub shadow: ShadowStyle,

    /// Optional animation (kind + duration).
    pub animation: Option<TextAnimation>,
}

impl Default for TextDetails {
    fn default() -> Self {
        Self {
            text: String::new(),
            box_width: 600.0,
            font_size: 48.0,
            font_family: "Arial".to_string(),
            color: "#ffffff".to_string(),
            align: "center".to_string(),
            border_width: 0.0,
            border_color: "#000000".to_string(),
            shadow: ShadowStyle::default(),
            animation: None,
        }
    }
}

/// A single, fully-populated timeline element.
///
/// Invariants established by the parser:
/// - `display.from_ms <= display.to_ms`
/// - `playback_rate > 0`
/// - `volume` and `opacity` are within `0..=100`
/// - `trim` falls back to `(0, display duration)` when the editor omitted it
#[derive(Debug, Clone, PartialEq)]
pub struct TrackItem {
    /// Unique id within the document.
    pub id: String,

    pub kind: ItemKind,

    /// Human-readable name; falls back to the item id.
    pub name: String,

    /// Placement on the timeline.
    pub display: TimeWindow,

    /// Source-relative in/out points.
    pub trim: TimeWindow,

    /// Playback-rate multiplier, strictly positive.
    pub playback_rate: f64,

    /// Per-item volume, 0-100.
    pub volume: u32,

    /// Per-item opacity, 0-100. Only meaningful for video items.
    pub opacity: u32,

    /// Source reference: a `blob:` URI or an absolute http(s) URL.
    /// Empty for items without media (e.g. text).
    pub source_url: String,

    /// Offset from canvas center. Only meaningful for text items.
    pub transform: Transform,

    /// Populated for text items only.
    pub text: Option<TextDetails>,
}
