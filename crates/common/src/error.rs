//! Error types shared across Slidecast crates.

use std::path::PathBuf;

/// Top-level error type for Slidecast operations.
#[derive(Debug, thiserror::Error)]
pub enum SlidecastError {
    /// Rejected before any rendering work starts.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Input file not readable: {path}")]
    UnreadableInput { path: PathBuf },

    /// The external renderer failed after work was attempted.
    #[error("Render error: {message}")]
    Render { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using SlidecastError.
pub type SlidecastResult<T> = Result<T, SlidecastError>;

/// Coarse classification of a [`SlidecastError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Render,
    Io,
}

impl SlidecastError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn unreadable(path: impl Into<PathBuf>) -> Self {
        Self::UnreadableInput { path: path.into() }
    }

    /// Unreadable files count as invalid input; they are detected up front.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } | Self::UnreadableInput { .. } => ErrorKind::InvalidInput,
            Self::Render { .. } => ErrorKind::Render,
            Self::Io(_) | Self::Json(_) => ErrorKind::Io,
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        self.kind() == ErrorKind::InvalidInput
    }

    pub fn is_render(&self) -> bool {
        self.kind() == ErrorKind::Render
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_counts_as_invalid_input() {
        let err = SlidecastError::unreadable("/missing/img1.jpg");
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("/missing/img1.jpg"));
    }

    #[test]
    fn test_render_kind() {
        let err = SlidecastError::render("libx264 not available");
        assert_eq!(err.kind(), ErrorKind::Render);
        assert_eq!(err.to_string(), "Render error: libx264 not available");
    }
}
