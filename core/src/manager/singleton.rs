//! manager/singleton.rs
//! Legacy "get or create" path for transforms meant to exist once per process.
//!
//! Callers that predate explicit manager registration ask for a transform by
//! type and expect it to appear. Construction goes through a zero-argument
//! factory that the transform type registers up front; nothing is discovered
//! at runtime. New code should register instances with the manager directly.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use crossbeam::sync::ShardedLock;
use tracing::debug;

use crate::manager::InstanceManager;
use crate::transform::{StreamTransform, TransformType};
use crate::types::{ConstructionError, TransformError};

/// Zero-argument constructor of a shared transform instance.
pub type TransformFactory = fn() -> Arc<dyn StreamTransform>;

fn construct_default<T: StreamTransform + Default>() -> Arc<dyn StreamTransform> {
    Arc::new(T::default())
}

/// Zero-argument factories, keyed by transform type.
#[derive(Default)]
pub struct FactoryTable {
    factories: ShardedLock<HashMap<TransformType, TransformFactory>>,
}

impl FactoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T::default` as the factory for `T`.
    pub fn register<T: StreamTransform + Default>(&self) -> &Self {
        self.register_with(TransformType::of::<T>(), construct_default::<T>)
    }

    /// Register an explicit factory for `ty`. A later registration replaces an earlier one.
    pub fn register_with(&self, ty: TransformType, factory: TransformFactory) -> &Self {
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ty, factory);
        self
    }

    pub fn get(&self, ty: &TransformType) -> Option<TransformFactory> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(ty)
            .copied()
    }
}

/// Return the shared `T` held by `manager`, constructing and registering it on demand.
///
/// # Errors
/// - `ConstructionError::NoFactory` when `T` is absent and has no factory.
/// - `ConstructionError::TypeMismatch` when the factory builds something other than `T`.
/// - `ConfigurationError` when the new instance cannot be registered (no unique identifier).
///
/// Two racing callers may both construct; the manager keeps the first
/// registration and both receive it.
#[deprecated(note = "register transforms with the manager explicitly and use `get_instance`")]
pub fn acquire_singleton<T: StreamTransform>(
    manager: &dyn InstanceManager,
    factories: &FactoryTable,
) -> Result<Arc<dyn StreamTransform>, TransformError> {
    let ty = TransformType::of::<T>();
    if let Some(existing) = manager.get_instance(&ty) {
        return Ok(existing);
    }

    let factory = factories
        .get(&ty)
        .ok_or(ConstructionError::NoFactory { type_name: ty.name() })?;
    let instance = factory();
    if instance.transform_type() != ty {
        return Err(ConstructionError::TypeMismatch { type_name: ty.name() }.into());
    }

    debug!(transform = ty.name(), "constructed singleton transform");
    Ok(manager.register_instance(instance)?)
}
