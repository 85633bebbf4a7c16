//! Show timeline and EDL information.

use std::path::PathBuf;

use clipflow_edl_core::{build, Quality};
use clipflow_timeline_model::TimelineDocument;

pub fn run(path: PathBuf, quality: String) -> anyhow::Result<()> {
    let quality: Quality = quality.parse()?;

    let json = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read timeline: {e}"))?;
    let doc = TimelineDocument::parse(&json)
        .map_err(|e| anyhow::anyhow!("Failed to parse timeline: {e}"))?;

    println!("Timeline: {}", doc.id);
    println!("  Canvas: {}x{}", doc.size.width, doc.size.height);
    println!("  Duration: {}ms @ {}fps", doc.duration_ms, doc.fps);
    println!("  Items: {}", doc.items.len());
    println!();

    let edl = build(&doc, quality);
    let preset = quality.preset();

    println!("EDL (version {}):", edl.version);
    println!(
        "  Quality: {} ({}x{}, bitrate {}, crf {})",
        quality, preset.width, preset.height, preset.bitrate, preset.crf
    );
    println!("  Duration: {}ms", edl.duration);
    println!();

    println!("Video segments: {}", edl.video_segments.len());
    for segment in &edl.video_segments {
        println!(
            "  {} [{}..{}ms] speed {} ({})",
            segment.name, segment.start_time, segment.end_time, segment.speed, segment.source_url
        );
    }
    println!("Audio segments: {}", edl.audio_segments.len());
    for segment in &edl.audio_segments {
        println!(
            "  {} [{}..{}ms] volume {} ({})",
            segment.name, segment.start_time, segment.end_time, segment.volume, segment.source_url
        );
    }
    println!("Text segments: {}", edl.text_segments.len());
    for segment in &edl.text_segments {
        println!(
            "  {} [{}..{}ms] at ({}, {}): {:?}",
            segment.name,
            segment.start_time,
            segment.end_time,
            segment.position.x,
            segment.position.y,
            segment.text
        );
    }

    Ok(())
}
