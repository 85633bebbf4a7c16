//! Validate a timeline document.

use std::path::PathBuf;

use clipflow_export_pipeline::fetch::SourceRoute;
use clipflow_timeline_model::TimelineDocument;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating timeline at: {}", path.display());

    let json = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read timeline: {e}"))?;
    let doc = TimelineDocument::parse(&json)
        .map_err(|e| anyhow::anyhow!("Failed to parse timeline: {e}"))?;

    println!("  Project: {}", doc.id);
    println!("  Canvas: {}x{}", doc.size.width, doc.size.height);
    println!("  Duration: {}ms @ {}fps", doc.duration_ms, doc.fps);
    println!("  Items: {}", doc.items.len());

    let mut issues = Vec::new();
    for item in doc.media_items() {
        if item.source_url.is_empty() {
            issues.push(format!("media item '{}' has no source", item.name));
        } else if SourceRoute::classify(&item.source_url) == SourceRoute::Unsupported {
            issues.push(format!(
                "media item '{}' has an unsupported source: {}",
                item.name, item.source_url
            ));
        }
        if item.display.duration_ms() == 0 {
            issues.push(format!("media item '{}' has zero duration", item.name));
        }
    }

    if issues.is_empty() {
        println!("\nTimeline is valid.");
    } else {
        println!("\nValidation issues:");
        for issue in &issues {
            println!("  - {issue}");
        }
        println!(
            "\n{} issue(s) found. Export may produce an incomplete video.",
            issues.len()
        );
    }

    Ok(())
}
