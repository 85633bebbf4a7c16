//! Output quality presets.

use std::fmt;
use std::str::FromStr;

use clipflow_common::ClipflowError;
use serde::{Deserialize, Serialize};

/// Named output quality. Unknown labels fail parsing; exports never fall
/// back to a preset silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "1080p")]
    FullHd1080,
    #[serde(rename = "4k")]
    Uhd4k,
}

/// Resolution, bitrate, and compression bundle for one quality label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityPreset {
    pub width: u32,
    pub height: u32,

    /// Target bitrate in encoder notation (e.g. "8M").
    pub bitrate: &'static str,

    /// Constant-rate-factor; lower is higher quality.
    pub crf: u8,
}

impl Quality {
    /// Static preset lookup.
    pub fn preset(self) -> QualityPreset {
        match self {
            Quality::Hd720 => QualityPreset {
                width: 1280,
                height: 720,
                bitrate: "3M",
                crf: 23,
            },
            Quality::FullHd1080 => QualityPreset {
                width: 1920,
                height: 1080,
                bitrate: "8M",
                crf: 20,
            },
            Quality::Uhd4k => QualityPreset {
                width: 3840,
                height: 2160,
                bitrate: "25M",
                crf: 18,
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quality::Hd720 => "720p",
            Quality::FullHd1080 => "1080p",
            Quality::Uhd4k => "4k",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Quality {
    type Err = ClipflowError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "720p" => Ok(Quality::Hd720),
            "1080p" => Ok(Quality::FullHd1080),
            "4k" => Ok(Quality::Uhd4k),
            other => Err(ClipflowError::export(format!(
                "Unknown quality: {other}. Use: 720p, 1080p, 4k"
            ))),
        }
    }
}
