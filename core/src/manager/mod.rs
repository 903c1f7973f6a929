//! manager/mod.rs
//! Shared transform instances, indexed by concrete type and by wire identifier.
//!
//! A receiver rebuilds a chain from header identifiers with `by_identifier`;
//! a sender holding a type asks `get_instance`. Each transform type has at
//! most one registered instance per manager.

pub mod singleton;

pub use singleton::*;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use crossbeam::sync::ShardedLock;
use tracing::debug;

use crate::codecs;
use crate::identity::{self, IdentityRegistry};
use crate::transform::{StreamTransform, TransformId, TransformType};
use crate::types::ConfigurationError;

/// Looks up and registers shared transform instances.
pub trait InstanceManager: Send + Sync {
    fn get_instance(&self, ty: &TransformType) -> Option<Arc<dyn StreamTransform>>;

    /// Register `instance` under its type and identifier.
    ///
    /// Returns the instance that ends up registered: when the type already has
    /// one, the existing instance wins and is returned.
    fn register_instance(
        &self,
        instance: Arc<dyn StreamTransform>,
    ) -> Result<Arc<dyn StreamTransform>, ConfigurationError>;
}

#[derive(Default)]
struct Instances {
    by_type: HashMap<TransformType, Arc<dyn StreamTransform>>,
    by_id: HashMap<TransformId, Arc<dyn StreamTransform>>,
}

pub struct TransformManager {
    registry: Arc<IdentityRegistry>,
    instances: ShardedLock<Instances>,
}

impl TransformManager {
    /// Empty manager resolving identifiers through `registry`.
    pub fn new(registry: Arc<IdentityRegistry>) -> Self {
        Self {
            registry,
            instances: ShardedLock::new(Instances::default()),
        }
    }

    /// Manager bound to the process-wide registry with every built-in registered.
    pub fn with_builtins() -> Result<Self, ConfigurationError> {
        codecs::install_builtin_metadata();
        let manager = Self::new(identity::global_handle());
        for instance in codecs::builtin_instances() {
            manager.register_instance(instance)?;
        }
        Ok(manager)
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Instance registered under the wire identifier `id`.
    pub fn by_identifier(&self, id: TransformId) -> Result<Arc<dyn StreamTransform>, ConfigurationError> {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .get(&id)
            .cloned()
            .ok_or(ConfigurationError::UnknownIdentifier { id })
    }

    /// Registered identifiers, ascending.
    pub fn identifiers(&self) -> Vec<TransformId> {
        let mut ids: Vec<TransformId> = self
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_id
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_type
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InstanceManager for TransformManager {
    fn get_instance(&self, ty: &TransformType) -> Option<Arc<dyn StreamTransform>> {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_type
            .get(ty)
            .cloned()
    }

    fn register_instance(
        &self,
        instance: Arc<dyn StreamTransform>,
    ) -> Result<Arc<dyn StreamTransform>, ConfigurationError> {
        let ty = instance.transform_type();
        // Resolve before locking; an unidentified type is never registered.
        let id = self.registry.identifier_for(ty)?;

        let mut instances = self.instances.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = instances.by_type.get(&ty) {
            return Ok(existing.clone());
        }
        instances.by_type.insert(ty, instance.clone());
        instances.by_id.insert(id, instance.clone());
        debug!(transform = ty.name(), id = %id, "transform instance registered");
        Ok(instance)
    }
}
