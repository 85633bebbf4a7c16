//! ClipFlow EDL Core
//!
//! Converts a parsed timeline document into an Edit Decision List: the
//! derived, time-ordered description of which media segments play when,
//! used to drive rendering.
//!
//! This crate is pure computation: no I/O, no clocks beyond the export
//! timestamp. The EDL is immutable once built; a re-export builds a fresh
//! one from the current timeline state.

pub mod builder;
pub mod edl;
pub mod quality;

pub use builder::build;
pub use edl::*;
pub use quality::{Quality, QualityPreset};
