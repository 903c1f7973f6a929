//! transform/types.rs
//! Identity value types: transform identifiers and runtime type descriptors.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use num_enum::TryFromPrimitive;

use crate::constants::transform_ids;
use crate::utils::enum_name_or_hex;

/// Named built-in identifiers, used for diagnostics only.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
pub enum BuiltinTransform {
    Passthrough      = transform_ids::PASSTHROUGH,
    Deflate          = transform_ids::DEFLATE,
    Zstd             = transform_ids::ZSTD,
    Lz4              = transform_ids::LZ4,
    Aes256Gcm        = transform_ids::AES256_GCM,
    Chacha20Poly1305 = transform_ids::CHACHA20_POLY1305,
}

/// One-byte wire tag naming a transform type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransformId(pub u8);

impl TransformId {
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl From<u8> for TransformId {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl From<BuiltinTransform> for TransformId {
    fn from(b: BuiltinTransform) -> Self {
        Self(b as u8)
    }
}

impl fmt::Display for TransformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&enum_name_or_hex::<BuiltinTransform>(self.0))
    }
}

/// Runtime descriptor of a concrete transform type. Cache key only.
///
/// Equality and hashing use the `TypeId`; the name is carried for messages.
#[derive(Copy, Clone, Debug)]
pub struct TransformType {
    type_id: TypeId,
    name: &'static str,
}

impl TransformType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TransformType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TransformType {}

impl Hash for TransformType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Display for TransformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
