//! Error types for pack import and mesh reconstruction.

use thiserror::Error;

/// Result type alias using ImportError.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Main error type for ChatAvatar import operations.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Failed to read or parse a ZIP archive.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to decode an embedded base64 buffer.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive is not a container, or holds no complete variant.
    #[error("Invalid ChatAvatar archive: {0}")]
    InvalidArchive(String),

    /// Malformed interchange document (accessor bounds, cardinality, component counts).
    #[error("Format error: {0}")]
    Format(String),

    /// Input geometry contradicts itself (duplicate-index mismatch, dangling vertex,
    /// malformed polygon grouping).
    #[error("Geometry integrity error: {0}")]
    GeometryIntegrity(String),

    /// A polygon id is referenced by a triangle count that cannot be folded.
    #[error("Unsupported topology: polygon {face_id} is referenced by {triangles} triangles")]
    UnsupportedTopology { face_id: usize, triangles: usize },

    /// The requested variant or additional element is not available in the pack.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Failed to export the scene document.
    #[error("Export error: {0}")]
    Export(String),
}

impl ImportError {
    /// Returns `true` for errors caused by malformed geometry in the input data.
    pub fn is_geometry_error(&self) -> bool {
        matches!(
            self,
            ImportError::GeometryIntegrity(_) | ImportError::UnsupportedTopology { .. }
        )
    }
}
