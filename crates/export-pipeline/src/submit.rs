//! Render submission.
//!
//! Packages fetched media bytes and the edits payload into one multipart
//! request and hands it to the remote render service. Segments whose bytes
//! could not be fetched are simply absent from the file set; they remain in
//! the EDL metadata.

use std::future::Future;
use std::time::Duration;

use clipflow_common::{ClipflowError, ClipflowResult};

use crate::payload::EditInstructions;

/// Fatal submission failure. The orchestrator surfaces the server's own
/// message verbatim.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Render failed: {message}")]
    Http { status: u16, message: String },

    #[error("Render service unreachable: {message}")]
    Network { message: String },

    #[error("Failed to encode edits payload: {source}")]
    Encode {
        #[from]
        source: serde_json::Error,
    },
}

/// One fetched media blob attached to the render request.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub segment_id: String,

    /// Part filename: `{segmentId}.{mp4|mp3}`.
    pub filename: String,

    pub bytes: Vec<u8>,
}

/// The rendered output returned by the service.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Seam to the remote render service.
pub trait RenderService: Send + Sync {
    fn submit(
        &self,
        files: Vec<MediaFile>,
        edits: EditInstructions,
    ) -> impl Future<Output = Result<RenderedArtifact, RenderError>> + Send;
}

/// Production render service client.
#[derive(Debug, Clone)]
pub struct HttpRenderService {
    client: reqwest::Client,
    render_url: String,
}

impl HttpRenderService {
    /// `base_url` is the service root; the render endpoint lives at
    /// `/api/video/render` beneath it.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> ClipflowResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ClipflowError::config(format!("Failed to build HTTP client: {e}")))?;
        let base_url = base_url.into();
        Ok(Self {
            client,
            render_url: format!("{}/api/video/render", base_url.trim_end_matches('/')),
        })
    }

    fn build_form(
        files: Vec<MediaFile>,
        edits: &EditInstructions,
    ) -> Result<reqwest::multipart::Form, RenderError> {
        let mut form = reqwest::multipart::Form::new();
        for file in files {
            let mime = if file.filename.ends_with(".mp3") {
                "audio/mpeg"
            } else {
                "video/mp4"
            };
            let part = reqwest::multipart::Part::bytes(file.bytes)
                .file_name(file.filename)
                .mime_str(mime)
                .map_err(|err| RenderError::Network {
                    message: err.to_string(),
                })?;
            form = form.part("files", part);
        }
        Ok(form.text("edits", serde_json::to_string(edits)?))
    }
}

impl RenderService for HttpRenderService {
    fn submit(
        &self,
        files: Vec<MediaFile>,
        edits: EditInstructions,
    ) -> impl Future<Output = Result<RenderedArtifact, RenderError>> + Send {
        async move {
            let file_count = files.len();
            let form = Self::build_form(files, &edits)?;

            tracing::info!(
                url = %self.render_url,
                files = file_count,
                video_segments = edits.video_segments.len(),
                audio_segments = edits.audio_segments.len(),
                "Submitting render request"
            );

            let response = self
                .client
                .post(&self.render_url)
                .multipart(form)
                .send()
                .await
                .map_err(|err| RenderError::Network {
                    message: err.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                tracing::error!(status = status.as_u16(), message = %message, "Render rejected");
                return Err(RenderError::Http {
                    status: status.as_u16(),
                    message,
                });
            }

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("video/mp4")
                .to_string();

            let bytes = response
                .bytes()
                .await
                .map_err(|err| RenderError::Network {
                    message: err.to_string(),
                })?;

            tracing::info!(bytes = bytes.len(), content_type = %content_type, "Render complete");
            Ok(RenderedArtifact {
                bytes: bytes.to_vec(),
                content_type,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_endpoint_joins_base_url() {
        let service =
            HttpRenderService::new("https://render.example.com/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            service.render_url,
            "https://render.example.com/api/video/render"
        );
    }

    #[test]
    fn test_http_error_displays_server_message() {
        let err = RenderError::Http {
            status: 500,
            message: "disk full".to_string(),
        };
        assert_eq!(err.to_string(), "Render failed: disk full");
    }
}
