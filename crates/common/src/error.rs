//! Error types shared across ClipFlow crates.
//!
//! Pipeline crates define their own focused error enums (`TimelineError`,
//! `FetchError`, `RenderError`, `ExportError`); this type is the coarse
//! classification used at construction seams and API boundaries.

/// Top-level error type for ClipFlow operations.
#[derive(Debug, thiserror::Error)]
pub enum ClipflowError {
    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using ClipflowError.
pub type ClipflowResult<T> = Result<T, ClipflowError>;

impl ClipflowError {
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
