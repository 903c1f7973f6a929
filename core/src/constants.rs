/// Stable transform identifiers (u8) for message headers and wire format.
pub mod transform_ids {
    pub const PASSTHROUGH: u8       = 0x00;
    pub const DEFLATE: u8           = 0x01;
    pub const ZSTD: u8              = 0x02;
    pub const LZ4: u8               = 0x03;
    pub const AES256_GCM: u8        = 0x10;
    pub const CHACHA20_POLY1305: u8 = 0x11;
}

/// Option keys understood by the built-in transforms.
pub mod option_keys {
    /// Compression level (deflate 0..=9, zstd 1..=22).
    pub const LEVEL: &str      = "level";
    /// AEAD master key, hex encoded (64 chars).
    pub const KEY: &str        = "key";
    /// AEAD plaintext bytes per frame.
    pub const CHUNK_SIZE: &str = "chunk_size";
}

/// Default compression levels (balanced).
pub const DEFAULT_LEVEL_DEFLATE: u32 = 6;
pub const DEFAULT_LEVEL_ZSTD: i32 = 3;

/// Default AEAD frame size when `chunk_size` is absent.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024; // 64 KiB
/// Smallest accepted AEAD frame size.
pub const MIN_CHUNK_SIZE: usize = 1024;
/// Max chunk size sanity bound (32 MiB).
pub const MAX_CHUNK_SIZE: usize = 32 * 1024 * 1024;

/// Per-stream salt length for AEAD key derivation.
pub const SALT_LEN: usize = 16;
/// Master and session key length.
pub const KEY_LEN_32: usize = 32;
/// Standard 12-byte nonce length for AES-GCM and ChaCha20-Poly1305.
pub const NONCE_LEN_12: usize = 12;
/// Fixed AEAD tag length (bytes).
pub const TAG_LEN: usize = 16;

/// HKDF info prefix; the transform id is appended.
pub const AEAD_KDF_INFO: &[u8] = b"transform-core aead v1";
