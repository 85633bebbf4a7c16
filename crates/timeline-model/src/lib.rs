//! ClipFlow Timeline Model
//!
//! Defines the read-only data contracts for editor timeline documents:
//! - **Document:** The externally-owned mapping of item id to track item
//! - **Items:** Fully-populated track items (video, audio, text, image)
//!
//! The editor UI owns and mutates the timeline; this crate only parses it.
//! Parsing is strict: every missing or malformed optional field is mapped to
//! its documented default exactly once at this boundary, so downstream code
//! never re-defaults. All times are integer milliseconds.

pub mod document;
pub mod item;

pub use document::*;
pub use item::*;
