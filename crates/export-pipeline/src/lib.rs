//! ClipFlow Export Pipeline
//!
//! Drives a timeline export end to end: build the EDL, resolve segment
//! media, package a render request, and collect the rendered artifact.
//!
//! # Pipeline Architecture
//!
//! ```text
//! timeline.json ──► EDL Builder ──► Edit Decision List
//!                                        │
//!                     blob store ◄───────┤ blob: sources
//!                     media proxy ◄──────┤ http(s) sources
//!                                        ▼
//!                                  fetched bytes
//!                                        │
//!                                        ▼
//!                          multipart {files..., edits}
//!                                        │
//!                                        ▼
//!                              remote render service
//!                                        │
//!                                        ▼
//!                               rendered artifact
//! ```
//!
//! The orchestrator runs this as one sequential state machine per attempt;
//! only media downloads fan out internally (bounded, order-preserving).

pub mod blob;
pub mod fetch;
pub mod orchestrator;
pub mod payload;
pub mod submit;

pub use blob::BlobStore;
pub use fetch::{FetchError, HttpMediaSource, MediaSource};
pub use orchestrator::*;
pub use payload::EditInstructions;
pub use submit::{HttpRenderService, MediaFile, RenderError, RenderService, RenderedArtifact};
