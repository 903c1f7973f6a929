//! transform/mod.rs
//! The stream transform contract.
//!
//! A transform converts a byte stream "forward" into wire/storage bytes and
//! reverses that conversion exactly. Composing code only sees this trait; the
//! wire name of each transform comes from the identity registry.

pub mod options;
pub mod types;

pub use options::*;
pub use types::*;

use std::any::Any;
use std::io::{Read, Write};

use crate::identity;
use crate::types::{ConfigurationError, ProcessingError};

/// Bidirectional, lossless stream transform.
///
/// Contract:
/// - `forward_process` reads `input` to EOF without knowing its length in
///   advance, writes the result to `output` and returns the bytes written.
/// - `reverse_process` is the exact inverse for the same `options`:
///   `reverse(forward(x, o), o) == x` byte for byte. Lossy transforms must not
///   implement this trait.
/// - Neither method closes a stream; stream lifetime belongs to the caller.
/// - On error, `output` holds undefined bytes and must be discarded.
///
/// Implementations are expected to be stateless so one shared instance can
/// serve concurrent calls.
pub trait StreamTransform: Any + Send + Sync {
    fn forward_process(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        options: &TransformOptions,
    ) -> Result<u64, ProcessingError>;

    fn reverse_process(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        options: &TransformOptions,
    ) -> Result<u64, ProcessingError>;

    /// Concrete type of this instance, also through `dyn StreamTransform`.
    fn transform_type(&self) -> TransformType {
        TransformType::of::<Self>()
    }

    /// Wire identifier, resolved through the process-wide registry.
    fn identifier(&self) -> Result<TransformId, ConfigurationError> {
        identity::global().identifier_for(self.transform_type())
    }

    /// Whether output must only be trusted inside a trusted context.
    fn is_security_critical(&self) -> bool {
        identity::global().is_security_critical_for(self.transform_type())
    }
}

impl std::fmt::Debug for dyn StreamTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StreamTransform")
            .field(&self.transform_type())
            .finish()
    }
}

/// Run `forward_process` over an in-memory buffer.
pub fn forward_bytes<T: StreamTransform + ?Sized>(
    transform: &T,
    input: &[u8],
    options: &TransformOptions,
) -> Result<Vec<u8>, ProcessingError> {
    let mut src = input;
    let mut out = Vec::new();
    transform.forward_process(&mut src, &mut out, options)?;
    Ok(out)
}

/// Run `reverse_process` over an in-memory buffer.
pub fn reverse_bytes<T: StreamTransform + ?Sized>(
    transform: &T,
    input: &[u8],
    options: &TransformOptions,
) -> Result<Vec<u8>, ProcessingError> {
    let mut src = input;
    let mut out = Vec::new();
    transform.reverse_process(&mut src, &mut out, options)?;
    Ok(out)
}

/// View a shared transform as its concrete type.
pub fn downcast_ref<T: StreamTransform>(transform: &dyn StreamTransform) -> Option<&T> {
    let any: &dyn Any = transform;
    any.downcast_ref::<T>()
}
