//! types.rs
//! Error taxonomy shared by transforms, the identity registry and the manager.
//!
//! - `ProcessingError`: a transform could not process its input.
//! - `ConfigurationError`: a transform type lacks exactly one unique identifier.
//! - `ConstructionError`: the legacy singleton path could not build an instance.
//! - `TransformError`: unified error with `From` impls so `?` works across layers.

use std::io;

use thiserror::Error;

use crate::transform::TransformId;

/// Raised by `forward_process`/`reverse_process`.
///
/// On any of these the output stream holds undefined bytes; callers must discard it.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Underlying read or write failed.
    #[error("{transform}: I/O error: {source}")]
    Io {
        transform: &'static str,
        #[source]
        source: io::Error,
    },

    /// Input ended before the transform's framing was complete.
    #[error("{transform}: truncated input")]
    Truncated { transform: &'static str },

    /// Input is structurally invalid for this transform.
    #[error("{transform}: malformed input: {msg}")]
    Malformed { transform: &'static str, msg: String },

    /// AEAD tag mismatch (wrong key or tampered data).
    #[error("{transform}: authentication failed")]
    Authentication { transform: &'static str },

    /// An option value is missing or cannot be parsed.
    #[error("{transform}: invalid option `{key}`: {msg}")]
    InvalidOption {
        transform: &'static str,
        key: String,
        msg: String,
    },

    /// Codec library reported a failure that is not plain I/O.
    #[error("{transform}: codec failure: {msg}")]
    Codec { transform: &'static str, msg: String },
}

impl ProcessingError {
    /// Map an `io::Error` raised while running `transform`.
    ///
    /// `UnexpectedEof` is reported as truncation and `InvalidData`/`InvalidInput`
    /// as malformed input; decoders surface bad input that way.
    pub fn from_io(transform: &'static str, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::UnexpectedEof => ProcessingError::Truncated { transform },
            io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => ProcessingError::Malformed {
                transform,
                msg: source.to_string(),
            },
            _ => ProcessingError::Io { transform, source },
        }
    }

    pub fn transform(&self) -> &'static str {
        match self {
            ProcessingError::Io { transform, .. }
            | ProcessingError::Truncated { transform }
            | ProcessingError::Malformed { transform, .. }
            | ProcessingError::Authentication { transform }
            | ProcessingError::InvalidOption { transform, .. }
            | ProcessingError::Codec { transform, .. } => transform,
        }
    }
}

/// Raised when identity metadata for a transform type is unusable.
///
/// This is a deployment bug, not a transient condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("transform type must declare exactly one unique identifier: {type_name} declares none")]
    MissingIdentifier { type_name: &'static str },

    #[error("transform type must declare exactly one unique identifier: {type_name} declares {}", fmt_ids(.found))]
    DuplicateIdentifier {
        type_name: &'static str,
        found: Vec<TransformId>,
    },

    #[error("transform identifier {id} of {type_name} is already bound to {owner}")]
    IdentifierCollision {
        id: TransformId,
        type_name: &'static str,
        owner: &'static str,
    },

    #[error("no transform registered under identifier {id}")]
    UnknownIdentifier { id: TransformId },
}

fn fmt_ids(ids: &[TransformId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Raised by the legacy singleton acquisition helper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("no zero-argument factory registered for {type_name}")]
    NoFactory { type_name: &'static str },

    #[error("registered instance is not a {type_name}")]
    TypeMismatch { type_name: &'static str },
}

/// Unified transform error.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("processing error: {0}")]
    Processing(#[from] ProcessingError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("construction error: {0}")]
    Construction(#[from] ConstructionError),
}
