//! Resolution error types

use thiserror::Error;

use crate::icon::Ownership;

/// Errors raised while resolving an entry to an icon
#[derive(Error, Debug)]
pub enum IconError {
    // ===== Recoverable during extraction (log, continue without icon) =====
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Path too long: {0}")]
    PathTooLong(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    // ===== Defects (propagate to the caller) =====
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Shell API error: {0}")]
    ShellApi(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Refused to release a {0:?} icon handle")]
    ReleaseRefused(Ownership),
}

impl IconError {
    /// Is this one of the enumerated extraction failures that resolution
    /// survives? Anything else is treated as a defect and propagated.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IconError::AccessDenied(_)
                | IconError::InvalidPath(_)
                | IconError::InvalidArgument(_)
                | IconError::PathTooLong(_)
                | IconError::Unsupported(_)
        )
    }

    /// Classify an I/O error from the OS layer, mapping the known
    /// recoverable kinds onto their taxonomy variants.
    pub fn classify_io(err: std::io::Error, path: &str) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::PermissionDenied => IconError::AccessDenied(path.to_string()),
            ErrorKind::InvalidInput => IconError::InvalidPath(path.to_string()),
            ErrorKind::Unsupported => IconError::Unsupported(path.to_string()),
            _ => IconError::Io(err),
        }
    }
}

impl From<image::ImageError> for IconError {
    fn from(e: image::ImageError) -> Self {
        IconError::Image(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IconError>;
