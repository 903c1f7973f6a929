//! codecs/mod.rs
//! Built-in stream transforms and their identity declarations.
//!
//! - Compression: passthrough, deflate, zstd, lz4. Not security critical.
//! - Encryption: AES-256-GCM, ChaCha20-Poly1305. Security critical.
//!
//! Identifiers are the stable values in `constants::transform_ids`.

pub mod aead;
pub mod deflate;
pub mod lz4;
pub mod passthrough;
pub mod zstd;

pub use self::aead::{Aes256GcmTransform, ChaCha20Poly1305Transform, FrameFlags};
pub use self::deflate::DeflateTransform;
pub use self::lz4::Lz4Transform;
pub use self::passthrough::PassthroughTransform;
pub use self::zstd::ZstdTransform;

use std::sync::{Arc, Once};

use crate::constants::transform_ids;
use crate::identity::{self, MetadataTable};
use crate::manager::FactoryTable;
use crate::transform::StreamTransform;

/// Declare identifier and security bindings of every built-in in `table`.
///
/// Declarations accumulate, so calling this twice on one table makes every
/// built-in's identifier ambiguous. Use `install_builtin_metadata` for the
/// process-wide table.
pub fn declare_builtin_metadata(table: &MetadataTable) {
    table
        .declare::<PassthroughTransform>(transform_ids::PASSTHROUGH, false)
        .declare::<DeflateTransform>(transform_ids::DEFLATE, false)
        .declare::<ZstdTransform>(transform_ids::ZSTD, false)
        .declare::<Lz4Transform>(transform_ids::LZ4, false)
        .declare::<Aes256GcmTransform>(transform_ids::AES256_GCM, true)
        .declare::<ChaCha20Poly1305Transform>(transform_ids::CHACHA20_POLY1305, true);
}

/// Declare the built-ins in the process-wide metadata table, once.
pub fn install_builtin_metadata() {
    static INSTALLED: Once = Once::new();
    INSTALLED.call_once(|| declare_builtin_metadata(identity::metadata_table()));
}

/// Register zero-argument factories for every built-in.
pub fn register_builtin_factories(factories: &FactoryTable) {
    factories
        .register::<PassthroughTransform>()
        .register::<DeflateTransform>()
        .register::<ZstdTransform>()
        .register::<Lz4Transform>()
        .register::<Aes256GcmTransform>()
        .register::<ChaCha20Poly1305Transform>();
}

/// One fresh instance of each built-in.
pub fn builtin_instances() -> Vec<Arc<dyn StreamTransform>> {
    vec![
        Arc::new(PassthroughTransform),
        Arc::new(DeflateTransform),
        Arc::new(ZstdTransform),
        Arc::new(Lz4Transform),
        Arc::new(Aes256GcmTransform),
        Arc::new(ChaCha20Poly1305Transform),
    ]
}
