//! identity/mod.rs
//! Transform identity: unique wire identifiers and security classification.
//!
//! Process-wide state:
//! - `metadata_table()` holds the declared bindings; empty at startup.
//! - `global()` caches resolutions against that table for the process lifetime.
//!   There is no teardown.

pub mod metadata;
pub mod registry;

pub use metadata::*;
pub use registry::*;

use std::sync::{Arc, OnceLock};

static METADATA: OnceLock<Arc<MetadataTable>> = OnceLock::new();
static REGISTRY: OnceLock<Arc<IdentityRegistry>> = OnceLock::new();

fn shared_table() -> &'static Arc<MetadataTable> {
    METADATA.get_or_init(|| Arc::new(MetadataTable::new()))
}

/// Process-wide binding table backing `global()`.
pub fn metadata_table() -> &'static MetadataTable {
    shared_table()
}

fn shared_registry() -> &'static Arc<IdentityRegistry> {
    REGISTRY.get_or_init(|| Arc::new(IdentityRegistry::new(shared_table().clone())))
}

/// Process-wide identity registry.
pub fn global() -> &'static IdentityRegistry {
    shared_registry()
}

/// Shared handle to `global()`, for owners such as the transform manager.
pub fn global_handle() -> Arc<IdentityRegistry> {
    shared_registry().clone()
}
