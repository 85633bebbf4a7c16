//! Render service edits payload.
//!
//! The render service takes one JSON part named `edits` describing every
//! video/audio segment plus the output settings. Unlike the EDL, the wire
//! payload uses seconds for all time fields and bakes in the resolved
//! quality preset and fixed codec choices.

use clipflow_edl_core::EditDecisionList;
use serde::{Deserialize, Serialize};

const OUTPUT_FORMAT: &str = "mp4";
const VIDEO_CODEC: &str = "libx264";
const AUDIO_CODEC: &str = "aac";
const AUDIO_BITRATE: &str = "192k";

/// The `edits` multipart part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditInstructions {
    pub video_segments: Vec<VideoEdit>,
    pub audio_segments: Vec<AudioEdit>,
    pub settings: RenderSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEdit {
    pub id: String,
    pub filename: String,

    /// Seconds.
    pub start_time: f64,
    pub end_time: f64,
    pub trim_from: f64,
    pub trim_to: f64,

    pub speed: f64,
    pub volume: u32,
    pub opacity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioEdit {
    pub id: String,
    pub filename: String,

    /// Seconds.
    pub start_time: f64,
    pub end_time: f64,
    pub trim_from: f64,
    pub trim_to: f64,

    pub volume: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSettings {
    pub output_format: String,
    pub width: u32,
    pub height: u32,
    pub bitrate: String,
    pub crf: u8,
    pub fps: u32,
    pub codec: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl EditInstructions {
    /// Project an EDL into the render service's wire shape.
    pub fn from_edl(edl: &EditDecisionList) -> Self {
        let preset = edl.quality.preset();
        Self {
            video_segments: edl
                .video_segments
                .iter()
                .map(|segment| VideoEdit {
                    id: segment.id.clone(),
                    filename: format!("{}.mp4", segment.id),
                    start_time: secs(segment.start_time),
                    end_time: secs(segment.end_time),
                    trim_from: secs(segment.trim_from),
                    trim_to: secs(segment.trim_to),
                    speed: segment.speed,
                    volume: segment.volume,
                    opacity: segment.opacity,
                })
                .collect(),
            audio_segments: edl
                .audio_segments
                .iter()
                .map(|segment| AudioEdit {
                    id: segment.id.clone(),
                    filename: format!("{}.mp3", segment.id),
                    start_time: secs(segment.start_time),
                    end_time: secs(segment.end_time),
                    trim_from: secs(segment.trim_from),
                    trim_to: secs(segment.trim_to),
                    volume: segment.volume,
                })
                .collect(),
            settings: RenderSettings {
                output_format: OUTPUT_FORMAT.to_string(),
                width: preset.width,
                height: preset.height,
                bitrate: preset.bitrate.to_string(),
                crf: preset.crf,
                fps: edl.fps,
                codec: VIDEO_CODEC.to_string(),
                audio_codec: AUDIO_CODEC.to_string(),
                audio_bitrate: AUDIO_BITRATE.to_string(),
            },
        }
    }
}

fn secs(ms: u64) -> f64 {
    ms as f64 / 1000.0
}
