//! identity/metadata.rs
//! Metadata sources: where a transform type's identifier and security flag come from.
//!
//! Bindings are declared explicitly at startup (or in a static init routine)
//! instead of being discovered by introspection. The registry queries a source
//! at most once per type and field, then serves from its own cache.

use std::collections::HashMap;
use std::sync::PoisonError;

use crossbeam::sync::ShardedLock;

use crate::transform::{TransformId, TransformType};

/// Supplies raw identity bindings for a transform type.
///
/// Sources report what is declared, including zero or several identifier
/// bindings; cardinality is enforced by the registry.
pub trait MetadataSource: Send + Sync {
    fn identifier_bindings(&self, ty: &TransformType) -> Vec<TransformId>;

    fn security_bindings(&self, ty: &TransformType) -> Vec<bool>;
}

#[derive(Default, Debug, Clone)]
struct Bindings {
    identifiers: Vec<TransformId>,
    security: Vec<bool>,
}

/// Registration table of identity bindings.
///
/// Every declaration is recorded, so declaring two identifiers for one type
/// is kept and later rejected by the registry rather than silently replaced.
#[derive(Default)]
pub struct MetadataTable {
    bindings: ShardedLock<HashMap<TransformType, Bindings>>,
}

impl MetadataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_identifier<T: ?Sized + 'static>(&self, id: impl Into<TransformId>) -> &Self {
        self.declare_identifier_for(TransformType::of::<T>(), id.into())
    }

    pub fn declare_security_critical<T: ?Sized + 'static>(&self, critical: bool) -> &Self {
        self.declare_security_for(TransformType::of::<T>(), critical)
    }

    /// Declare both bindings for `T` in one call.
    pub fn declare<T: ?Sized + 'static>(&self, id: impl Into<TransformId>, critical: bool) -> &Self {
        self.declare_identifier::<T>(id).declare_security_critical::<T>(critical)
    }

    pub fn declare_identifier_for(&self, ty: TransformType, id: TransformId) -> &Self {
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(ty)
            .or_default()
            .identifiers
            .push(id);
        self
    }

    pub fn declare_security_for(&self, ty: TransformType, critical: bool) -> &Self {
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(ty)
            .or_default()
            .security
            .push(critical);
        self
    }

    /// Whether any binding at all exists for `ty`.
    pub fn contains(&self, ty: &TransformType) -> bool {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(ty)
    }
}

impl MetadataSource for MetadataTable {
    fn identifier_bindings(&self, ty: &TransformType) -> Vec<TransformId> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(ty)
            .map(|b| b.identifiers.clone())
            .unwrap_or_default()
    }

    fn security_bindings(&self, ty: &TransformType) -> Vec<bool> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(ty)
            .map(|b| b.security.clone())
            .unwrap_or_default()
    }
}
