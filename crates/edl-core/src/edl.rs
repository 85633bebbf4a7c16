//! Edit Decision List value types.
//!
//! Wire names are camelCase: the EDL is serialized as-is for JSON exports
//! and its segment fields feed the render service's edits payload, so the
//! names here are a fixed contract, not a style choice. All time fields are
//! integer milliseconds and survive a JSON round-trip losslessly.

use clipflow_timeline_model::{CanvasSize, ShadowStyle, TextAnimation};
use serde::{Deserialize, Serialize};

use crate::quality::Quality;

/// EDL schema version tag.
pub const EDL_VERSION: &str = "2.0";

/// The derived, time-ordered description of one export attempt.
///
/// Immutable once built. Each segment sequence is sorted ascending by start
/// time; ties keep the timeline document's encounter order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDecisionList {
    pub version: String,
    pub project_id: String,

    /// Generation timestamp, RFC 3339.
    pub exported_at: String,

    pub size: CanvasSize,

    /// Total timeline duration in milliseconds.
    pub duration: u64,

    pub fps: u32,
    pub quality: Quality,

    pub video_segments: Vec<VideoSegment>,
    pub audio_segments: Vec<AudioSegment>,
    pub text_segments: Vec<TextSegment>,
}

impl EditDecisionList {
    /// Video and audio segments in EDL order, the set that needs media
    /// bytes fetched for rendering.
    pub fn media_segments(&self) -> Vec<MediaSegmentRef<'_>> {
        self.video_segments
            .iter()
            .map(MediaSegmentRef::Video)
            .chain(self.audio_segments.iter().map(MediaSegmentRef::Audio))
            .collect()
    }
}

/// A video clip projected into EDL form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSegment {
    pub id: String,
    pub name: String,

    pub start_time: u64,
    pub end_time: u64,

    /// Always `end_time - start_time`, recomputed at build time.
    pub duration: u64,

    pub trim_from: u64,
    pub trim_to: u64,

    pub speed: f64,
    pub volume: u32,
    pub opacity: u32,

    pub source_url: String,
}

/// An audio clip projected into EDL form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSegment {
    pub id: String,
    pub name: String,

    pub start_time: u64,
    pub end_time: u64,
    pub duration: u64,

    pub trim_from: u64,
    pub trim_to: u64,

    pub speed: f64,
    pub volume: u32,

    pub source_url: String,
}

/// A text overlay projected into EDL form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSegment {
    pub id: String,
    pub name: String,

    pub start_time: u64,
    pub end_time: u64,
    pub duration: u64,

    pub text: String,

    /// Top-left pixel position derived from the item's center-relative
    /// transform. See [`crate::builder`] for the derivation.
    pub position: PixelPosition,

    pub box_width: f64,
    pub font_size: f64,
    pub font_family: String,
    pub color: String,
    pub align: String,

    pub border_width: f64,
    pub border_color: String,
    pub shadow: ShadowStyle,

    pub animation: Option<TextAnimation>,
}

/// Absolute pixel position on the output canvas (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPosition {
    pub x: f64,
    pub y: f64,
}

/// Borrowed view over either media segment kind, used when fetching and
/// packaging bytes.
#[derive(Debug, Clone, Copy)]
pub enum MediaSegmentRef<'a> {
    Video(&'a VideoSegment),
    Audio(&'a AudioSegment),
}

impl MediaSegmentRef<'_> {
    pub fn id(&self) -> &str {
        match self {
            MediaSegmentRef::Video(segment) => &segment.id,
            MediaSegmentRef::Audio(segment) => &segment.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MediaSegmentRef::Video(segment) => &segment.name,
            MediaSegmentRef::Audio(segment) => &segment.name,
        }
    }

    pub fn source_url(&self) -> &str {
        match self {
            MediaSegmentRef::Video(segment) => &segment.source_url,
            MediaSegmentRef::Audio(segment) => &segment.source_url,
        }
    }

    /// File extension used when attaching this segment's bytes to the
    /// render request.
    pub fn file_extension(&self) -> &'static str {
        match self {
            MediaSegmentRef::Video(_) => "mp4",
            MediaSegmentRef::Audio(_) => "mp3",
        }
    }

    /// Part filename on the render request: `{segmentId}.{ext}`.
    pub fn filename(&self) -> String {
        format!("{}.{}", self.id(), self.file_extension())
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            MediaSegmentRef::Video(_) => "video",
            MediaSegmentRef::Audio(_) => "audio",
        }
    }
}
