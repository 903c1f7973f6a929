//! identity/registry.rs
//! Lazily populated, process-lifetime cache of transform identity metadata.
//!
//! Design:
//! - Two maps keyed by the same type universe (identifier, security flag),
//!   populated independently, plus an identifier -> owner index that enforces
//!   uniqueness across types.
//! - One `ShardedLock` shields all three. Hits take the shared side; a miss
//!   takes the exclusive side, re-checks, and only then queries the source, so
//!   racing first accesses resolve exactly once.
//! - Entries are inserted once and never evicted. Failures are never cached.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use crossbeam::sync::{ShardedLock, ShardedLockReadGuard, ShardedLockWriteGuard};
use tracing::{debug, warn};

use crate::identity::metadata::MetadataSource;
use crate::transform::{TransformId, TransformType};
use crate::types::ConfigurationError;

#[derive(Default)]
struct IdentityCache {
    identifiers: HashMap<TypeId, TransformId>,
    owners: HashMap<TransformId, TransformType>,
    security: HashMap<TypeId, bool>,
}

pub struct IdentityRegistry {
    source: Arc<dyn MetadataSource>,
    cache: ShardedLock<IdentityCache>,
}

impl IdentityRegistry {
    /// Empty registry resolving against `source`.
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            cache: ShardedLock::new(IdentityCache::default()),
        }
    }

    /// Unique wire identifier of `ty`.
    ///
    /// # Errors
    /// - `MissingIdentifier` / `DuplicateIdentifier` unless exactly one binding is declared.
    /// - `IdentifierCollision` if the binding is already owned by another type.
    ///
    /// Nothing is cached on error; the next call resolves again.
    pub fn identifier_for(&self, ty: TransformType) -> Result<TransformId, ConfigurationError> {
        if let Some(id) = self.read().identifiers.get(&ty.type_id()) {
            return Ok(*id);
        }

        let mut cache = self.write();
        // Another caller may have resolved while we waited.
        if let Some(id) = cache.identifiers.get(&ty.type_id()) {
            return Ok(*id);
        }

        let id = match self.source.identifier_bindings(&ty).as_slice() {
            [id] => *id,
            [] => {
                let err = ConfigurationError::MissingIdentifier { type_name: ty.name() };
                warn!(transform = ty.name(), error = %err, "identifier resolution failed");
                return Err(err);
            }
            many => {
                let err = ConfigurationError::DuplicateIdentifier {
                    type_name: ty.name(),
                    found: many.to_vec(),
                };
                warn!(transform = ty.name(), error = %err, "identifier resolution failed");
                return Err(err);
            }
        };

        if let Some(owner) = cache.owners.get(&id) {
            let err = ConfigurationError::IdentifierCollision {
                id,
                type_name: ty.name(),
                owner: owner.name(),
            };
            warn!(transform = ty.name(), error = %err, "identifier resolution failed");
            return Err(err);
        }

        cache.identifiers.insert(ty.type_id(), id);
        cache.owners.insert(id, ty);
        debug!(transform = ty.name(), id = %id, "transform identifier cached");
        Ok(id)
    }

    /// Security-critical flag of `ty`; `false` when nothing is declared.
    ///
    /// An explicit `false` binding and no binding are indistinguishable.
    /// With several bindings the first declared one wins.
    pub fn is_security_critical_for(&self, ty: TransformType) -> bool {
        if let Some(critical) = self.read().security.get(&ty.type_id()) {
            return *critical;
        }

        let mut cache = self.write();
        if let Some(critical) = cache.security.get(&ty.type_id()) {
            return *critical;
        }

        let critical = self
            .source
            .security_bindings(&ty)
            .first()
            .copied()
            .unwrap_or(false);
        cache.security.insert(ty.type_id(), critical);
        debug!(transform = ty.name(), critical, "transform security flag cached");
        critical
    }

    pub fn identifier_of<T: ?Sized + 'static>(&self) -> Result<TransformId, ConfigurationError> {
        self.identifier_for(TransformType::of::<T>())
    }

    pub fn is_security_critical_of<T: ?Sized + 'static>(&self) -> bool {
        self.is_security_critical_for(TransformType::of::<T>())
    }

    /// Type currently owning `id`, if it has been resolved.
    pub fn owner_of(&self, id: TransformId) -> Option<TransformType> {
        self.read().owners.get(&id).copied()
    }

    /// Number of cached `(identifier, security)` entries.
    pub fn cached_len(&self) -> (usize, usize) {
        let cache = self.read();
        (cache.identifiers.len(), cache.security.len())
    }

    // Entries are insert-once, so a panic elsewhere cannot leave a half-written
    // value behind; poisoning is ignored.
    fn read(&self) -> ShardedLockReadGuard<'_, IdentityCache> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> ShardedLockWriteGuard<'_, IdentityCache> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}
