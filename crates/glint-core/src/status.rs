//! Error types shared by every stage of the loader.
//!
//! Every fatal failure is a [`GltfError`]. Each variant belongs to one of
//! three classes reported by [`GltfError::kind`]: malformed input
//! ([`ErrorKind::Format`]), a missing host collaborator
//! ([`ErrorKind::Configuration`]) or a failed byte fetch ([`ErrorKind::Io`]).
//! Non-fatal reference problems never surface here; they are logged as
//! warnings and the load continues.
//!
//! The error is `Clone` because one in-flight resolution result is handed to
//! every waiter of a shared entity.

use thiserror::Error;

/// Coarse classification of a [`GltfError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input bytes or document are malformed or unsupported.
    Format,
    /// The host did not supply a collaborator the document requires.
    Configuration,
    /// An external resource could not be fetched.
    Io,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GltfError {
    #[error("Invalid GLB header: {0}")]
    InvalidHeader(String),
    #[error("Unsupported GLB container version {0}, expected 2 or later")]
    UnsupportedContainerVersion(u32),
    #[error("GLB container has no JSON chunk")]
    MissingJsonChunk,
    #[error("GLB chunk at byte {offset} declares {length} bytes but only {available} remain")]
    TruncatedChunk {
        offset: usize,
        length: usize,
        available: usize,
    },
    #[error("Document text is not valid UTF-8: {0}")]
    InvalidText(String),
    #[error("JSON parse error: {0}")]
    Json(String),
    #[error("Unsupported asset version \"{0}\", glTF 2.0 or later is required")]
    UnsupportedAssetVersion(String),
    #[error("{kind} index {index} out of bounds ({count} defined)")]
    InvalidIndex {
        kind: &'static str,
        index: usize,
        count: usize,
    },
    #[error("Invalid {kind} {index}: {reason}")]
    InvalidDefinition {
        kind: &'static str,
        index: usize,
        reason: String,
    },
    #[error("Unsupported component type {0}")]
    UnsupportedComponentType(u32),
    #[error("Unsupported accessor type \"{0}\"")]
    UnsupportedElementType(String),
    #[error("Accessor {accessor} reads bytes {start}..{end} of a {available} byte view")]
    AccessorOutOfBounds {
        accessor: usize,
        start: usize,
        end: usize,
        available: usize,
    },
    #[error("Unsupported item size {0} in sparse accessor")]
    SparseItemSize(usize),
    #[error("Primitive mode unsupported: {0}")]
    UnsupportedPrimitiveMode(u32),
    #[error("Unexpected light type \"{0}\"")]
    UnsupportedLightType(String),
    #[error("{0} buffer type is not supported")]
    UnsupportedBufferType(String),
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(String),
    #[error("Failed to load \"{uri}\": {reason}")]
    Fetch { uri: String, reason: String },
    #[error("Texture decode error: {0}")]
    TextureDecode(String),
    #[error("Draco decode error: {0}")]
    DracoDecode(String),
    #[error("Expected {expected} dependency, resolved {found}")]
    DependencyMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl GltfError {
    /// Classifies the error into the fatal taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GltfError::MissingCollaborator(_) => ErrorKind::Configuration,
            GltfError::Fetch { .. } => ErrorKind::Io,
            _ => ErrorKind::Format,
        }
    }

    pub fn invalid_index(kind: &'static str, index: usize, count: usize) -> Self {
        GltfError::InvalidIndex { kind, index, count }
    }

    pub fn invalid_definition(kind: &'static str, index: usize, reason: impl Into<String>) -> Self {
        GltfError::InvalidDefinition {
            kind,
            index,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for GltfError {
    fn from(err: serde_json::Error) -> Self {
        GltfError::Json(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GltfError>;

/// Looks up `items[index]`, failing with [`GltfError::InvalidIndex`] when the
/// reference does not resolve.
pub fn resolve<'a, T>(items: &'a [T], index: usize, kind: &'static str) -> Result<&'a T> {
    items
        .get(index)
        .ok_or_else(|| GltfError::invalid_index(kind, index, items.len()))
}
