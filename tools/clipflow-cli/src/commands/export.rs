//! Export a timeline document to video or EDL JSON.

use std::path::PathBuf;
use std::time::Duration;

use clipflow_common::config::AppConfig;
use clipflow_edl_core::Quality;
use clipflow_export_pipeline::{
    BlobStore, ExportOrchestrator, ExportRequest, ExportType, HttpMediaSource, HttpRenderService,
};
use clipflow_timeline_model::TimelineDocument;

pub async fn run(
    path: PathBuf,
    output: Option<PathBuf>,
    export_type: Option<String>,
    quality: Option<String>,
    render_url: Option<String>,
    proxy_url: Option<String>,
    media_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!("Exporting timeline at: {}", path.display());

    let config = AppConfig::load();
    let export_type: ExportType = export_type
        .unwrap_or_else(|| config.export.export_type.clone())
        .parse()?;
    let quality: Quality = quality
        .unwrap_or_else(|| config.export.quality.clone())
        .parse()?;
    let timeout = Duration::from_secs(config.export.request_timeout_secs);

    let json = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read timeline: {e}"))?;
    let doc = TimelineDocument::parse(&json)
        .map_err(|e| anyhow::anyhow!("Failed to parse timeline: {e}"))?;

    println!("  Project: {}", doc.id);
    println!("  Quality: {quality}");

    let blobs = BlobStore::new();
    if let Some(dir) = media_dir {
        let mut registered = 0usize;
        for entry in std::fs::read_dir(&dir)
            .map_err(|e| anyhow::anyhow!("Failed to read media dir: {e}"))?
        {
            let file = entry?.path();
            if !file.is_file() {
                continue;
            }
            let Some(stem) = file.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            blobs.insert(stem, std::fs::read(&file)?);
            registered += 1;
        }
        println!("  Registered {registered} local media file(s)");
    }

    let fetcher = HttpMediaSource::new(proxy_url.unwrap_or(config.media_proxy_url), blobs, timeout)?;
    let renderer = HttpRenderService::new(render_url.unwrap_or(config.render_url), timeout)?;
    let orchestrator = ExportOrchestrator::new(fetcher, renderer);

    let mut updates = orchestrator.subscribe();
    let progress_task = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            print!("\r  {:>3}% {}        ", state.progress, state.status_message);
        }
    });

    let result = orchestrator
        .start_export(ExportRequest {
            payload: Some(doc),
            export_type,
            quality,
        })
        .await;

    // Dropping the orchestrator closes the watch channel and ends the
    // progress task.
    drop(orchestrator);
    let _ = progress_task.await;

    match result {
        Ok(artifact) => {
            let output_path = output
                .unwrap_or_else(|| PathBuf::from(format!("export.{}", artifact.kind.extension())));
            std::fs::write(&output_path, artifact.data.as_ref())
                .map_err(|e| anyhow::anyhow!("Failed to write output: {e}"))?;
            println!(
                "\nExport complete: {} ({} bytes)",
                output_path.display(),
                artifact.data.len()
            );
        }
        Err(e) => {
            println!("\nExport failed: {e}");
        }
    }

    Ok(())
}
