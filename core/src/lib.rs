//! transform-core
//!
//! Pluggable, bidirectional stream transforms (compression, encryption) and
//! the registry that binds each transform type to a unique one-byte wire
//! identifier and a security-critical flag.
//! Pure Rust, synchronous, no async runtime.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

// Contract and identity
pub mod transform;
pub mod identity;

// Instances and built-ins
pub mod manager;
pub mod codecs;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::identity::{IdentityRegistry, MetadataSource, MetadataTable};
    pub use crate::manager::{FactoryTable, InstanceManager, TransformManager};
    pub use crate::transform::{
        forward_bytes, reverse_bytes, StreamTransform, TransformId, TransformOptions, TransformType,
    };
    pub use crate::types::{ConfigurationError, ConstructionError, ProcessingError, TransformError};
}
