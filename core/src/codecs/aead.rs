//! codecs/aead.rs
//! Chunked AEAD transforms: AES-256-GCM and ChaCha20-Poly1305.
//!
//! Wire format:
//! ```text
//! salt[16] || frame* ; frame = flags:u8 || ct_len:u32 LE || ciphertext+tag
//! ```
//! - Session key: HKDF-SHA256(salt, master_key, AEAD_KDF_INFO || id).
//! - Nonce: salt[0..12] with bytes 4..12 XORed by the LE frame index.
//! - AAD: id || flags || frame_index (u64 LE). Binding flags and index
//!   rejects reordered frames and forged end markers.
//! - Exactly one frame carries `FINAL`; an input ending without it is truncated.
//!
//! The master key comes from the `key` option (64 hex chars).

use std::io::{Read, Write};

use aes_gcm::aead::{self, Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key as AesKey, Nonce as AesNonce};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chacha20poly1305::{ChaCha20Poly1305, Key as ChaKey, Nonce as ChaNonce};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use tracing::trace;

use crate::constants::{
    option_keys, transform_ids, AEAD_KDF_INFO, DEFAULT_CHUNK_SIZE, KEY_LEN_32, MAX_CHUNK_SIZE,
    MIN_CHUNK_SIZE, NONCE_LEN_12, SALT_LEN, TAG_LEN,
};
use crate::transform::{StreamTransform, TransformOptions};
use crate::types::ProcessingError;
use crate::utils::{read_full, CountingWriter};

bitflags::bitflags! {
    /// Per-frame flags, authenticated through the AAD.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FrameFlags: u8 {
        /// Last frame of the stream
        const FINAL = 0b0000_0001;
    }
}

/// Cipher suite shared by both AEAD transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suite {
    Aes256Gcm,
    ChaCha20Poly1305,
}

impl Suite {
    fn name(self) -> &'static str {
        match self {
            Suite::Aes256Gcm => "aes256-gcm",
            Suite::ChaCha20Poly1305 => "chacha20-poly1305",
        }
    }

    fn id(self) -> u8 {
        match self {
            Suite::Aes256Gcm => transform_ids::AES256_GCM,
            Suite::ChaCha20Poly1305 => transform_ids::CHACHA20_POLY1305,
        }
    }
}

enum Cipher {
    AesGcm(Aes256Gcm),
    ChaCha(ChaCha20Poly1305),
}

impl Cipher {
    fn new(suite: Suite, session_key: &[u8; KEY_LEN_32]) -> Self {
        match suite {
            Suite::Aes256Gcm => Cipher::AesGcm(Aes256Gcm::new(AesKey::<Aes256Gcm>::from_slice(session_key))),
            Suite::ChaCha20Poly1305 => Cipher::ChaCha(ChaCha20Poly1305::new(ChaKey::from_slice(session_key))),
        }
    }

    fn seal(&self, nonce: &[u8; NONCE_LEN_12], aad: &[u8], msg: &[u8]) -> Result<Vec<u8>, aead::Error> {
        let payload = Payload { msg, aad };
        match self {
            Cipher::AesGcm(c) => c.encrypt(AesNonce::from_slice(nonce), payload),
            Cipher::ChaCha(c) => c.encrypt(ChaNonce::from_slice(nonce), payload),
        }
    }

    fn open(&self, nonce: &[u8; NONCE_LEN_12], aad: &[u8], msg: &[u8]) -> Result<Vec<u8>, aead::Error> {
        let payload = Payload { msg, aad };
        match self {
            Cipher::AesGcm(c) => c.decrypt(AesNonce::from_slice(nonce), payload),
            Cipher::ChaCha(c) => c.decrypt(ChaNonce::from_slice(nonce), payload),
        }
    }
}

/// Per-call settings parsed from the options map.
struct Params {
    master_key: [u8; KEY_LEN_32],
    chunk_size: usize,
}

impl Params {
    fn from_options(suite: Suite, options: &TransformOptions) -> Result<Self, ProcessingError> {
        let invalid = |key: &str, msg: String| ProcessingError::InvalidOption {
            transform: suite.name(),
            key: key.to_string(),
            msg,
        };

        let raw = options
            .get(option_keys::KEY)
            .ok_or_else(|| invalid(option_keys::KEY, "required".into()))?;
        let bytes = hex::decode(raw.trim()).map_err(|e| invalid(option_keys::KEY, e.to_string()))?;
        let master_key: [u8; KEY_LEN_32] = bytes.as_slice().try_into().map_err(|_| {
            invalid(
                option_keys::KEY,
                format!("expected {} bytes, got {}", KEY_LEN_32, bytes.len()),
            )
        })?;

        let chunk_size = options
            .get_parsed::<usize>(suite.name(), option_keys::CHUNK_SIZE)?
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&chunk_size) {
            return Err(invalid(
                option_keys::CHUNK_SIZE,
                format!("{} not in {}..={}", chunk_size, MIN_CHUNK_SIZE, MAX_CHUNK_SIZE),
            ));
        }

        Ok(Self { master_key, chunk_size })
    }
}

/// HKDF-SHA256 session key bound to the stream salt and transform id.
fn derive_session_key(suite: Suite, master_key: &[u8], salt: &[u8; SALT_LEN]) -> [u8; KEY_LEN_32] {
    let mut info = Vec::with_capacity(AEAD_KDF_INFO.len() + 1);
    info.extend_from_slice(AEAD_KDF_INFO);
    info.push(suite.id());

    let hk = Hkdf::<Sha256>::new(Some(salt), master_key);
    let mut key = [0u8; KEY_LEN_32];
    // 32 bytes is far below the HKDF-SHA256 output limit.
    hk.expand(&info, &mut key)
        .unwrap_or_else(|_| unreachable!("HKDF-SHA256 can expand 32 bytes"));
    key
}

/// TLS-style nonce: salt prefix, low 8 bytes XORed with the frame index.
fn derive_nonce(salt: &[u8; SALT_LEN], frame_index: u64) -> [u8; NONCE_LEN_12] {
    let mut nonce = [0u8; NONCE_LEN_12];
    nonce.copy_from_slice(&salt[..NONCE_LEN_12]);
    for (n, c) in nonce[4..].iter_mut().zip(frame_index.to_le_bytes()) {
        *n ^= c;
    }
    nonce
}

fn build_aad(suite: Suite, flags: FrameFlags, frame_index: u64) -> [u8; 10] {
    let mut aad = [0u8; 10];
    aad[0] = suite.id();
    aad[1] = flags.bits();
    aad[2..].copy_from_slice(&frame_index.to_le_bytes());
    aad
}

fn fresh_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    let mut rng = rand::thread_rng();
    // An all-zero salt is reserved as invalid.
    while salt.iter().all(|&b| b == 0) {
        rng.fill_bytes(&mut salt);
    }
    salt
}

fn seal_stream(
    suite: Suite,
    input: &mut dyn Read,
    output: &mut dyn Write,
    options: &TransformOptions,
) -> Result<u64, ProcessingError> {
    let name = suite.name();
    let io_err = |e| ProcessingError::from_io(name, e);
    let params = Params::from_options(suite, options)?;

    let salt = fresh_salt();
    let cipher = Cipher::new(suite, &derive_session_key(suite, &params.master_key, &salt));
    let mut out = CountingWriter::new(output);
    out.write_all(&salt).map_err(io_err)?;

    // One chunk of lookahead decides which frame is final.
    let mut current = vec![0u8; params.chunk_size];
    let mut next = vec![0u8; params.chunk_size];
    let mut len = read_full(input, &mut current).map_err(io_err)?;
    let mut frame_index = 0u64;

    loop {
        let next_len = if len == params.chunk_size {
            read_full(input, &mut next).map_err(io_err)?
        } else {
            0
        };
        let flags = if next_len == 0 { FrameFlags::FINAL } else { FrameFlags::empty() };

        let nonce = derive_nonce(&salt, frame_index);
        let aad = build_aad(suite, flags, frame_index);
        let ct = cipher
            .seal(&nonce, &aad, &current[..len])
            .map_err(|_| ProcessingError::Codec { transform: name, msg: "seal failed".into() })?;

        out.write_u8(flags.bits()).map_err(io_err)?;
        out.write_u32::<LittleEndian>(ct.len() as u32).map_err(io_err)?;
        out.write_all(&ct).map_err(io_err)?;

        if flags.contains(FrameFlags::FINAL) {
            break;
        }
        std::mem::swap(&mut current, &mut next);
        len = next_len;
        frame_index += 1;
    }

    let written = out.written();
    trace!(transform = name, written, frames = frame_index + 1, "forward done");
    Ok(written)
}

fn open_stream(
    suite: Suite,
    input: &mut dyn Read,
    output: &mut dyn Write,
    options: &TransformOptions,
) -> Result<u64, ProcessingError> {
    let name = suite.name();
    let io_err = |e| ProcessingError::from_io(name, e);
    let malformed = |msg: String| ProcessingError::Malformed { transform: name, msg };
    let params = Params::from_options(suite, options)?;

    let mut salt = [0u8; SALT_LEN];
    input.read_exact(&mut salt).map_err(io_err)?;
    if salt.iter().all(|&b| b == 0) {
        return Err(malformed("all-zero salt".into()));
    }
    let cipher = Cipher::new(suite, &derive_session_key(suite, &params.master_key, &salt));
    let max_ct = params.chunk_size + TAG_LEN;

    let mut out = CountingWriter::new(output);
    let mut frame_index = 0u64;
    loop {
        let raw_flags = input.read_u8().map_err(io_err)?;
        let flags = FrameFlags::from_bits(raw_flags)
            .ok_or_else(|| malformed(format!("unknown frame flags 0x{:02x}", raw_flags)))?;
        let ct_len = input.read_u32::<LittleEndian>().map_err(io_err)? as usize;
        if !(TAG_LEN..=max_ct).contains(&ct_len) {
            return Err(malformed(format!("frame length {} not in {}..={}", ct_len, TAG_LEN, max_ct)));
        }

        let mut ct = vec![0u8; ct_len];
        input.read_exact(&mut ct).map_err(io_err)?;

        let nonce = derive_nonce(&salt, frame_index);
        let aad = build_aad(suite, flags, frame_index);
        let pt = cipher
            .open(&nonce, &aad, &ct)
            .map_err(|_| ProcessingError::Authentication { transform: name })?;
        out.write_all(&pt).map_err(io_err)?;

        if flags.contains(FrameFlags::FINAL) {
            break;
        }
        frame_index = frame_index
            .checked_add(1)
            .ok_or_else(|| malformed("frame index overflow".into()))?;
    }

    let mut probe = [0u8; 1];
    if read_full(input, &mut probe).map_err(io_err)? != 0 {
        return Err(malformed("trailing bytes after final frame".into()));
    }

    let written = out.written();
    trace!(transform = name, written, frames = frame_index + 1, "reverse done");
    Ok(written)
}

/// AES-256-GCM stream encryption. Security critical.
#[derive(Debug, Default, Clone, Copy)]
pub struct Aes256GcmTransform;

impl StreamTransform for Aes256GcmTransform {
    fn forward_process(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        options: &TransformOptions,
    ) -> Result<u64, ProcessingError> {
        seal_stream(Suite::Aes256Gcm, input, output, options)
    }

    fn reverse_process(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        options: &TransformOptions,
    ) -> Result<u64, ProcessingError> {
        open_stream(Suite::Aes256Gcm, input, output, options)
    }
}

/// ChaCha20-Poly1305 stream encryption. Security critical.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChaCha20Poly1305Transform;

impl StreamTransform for ChaCha20Poly1305Transform {
    fn forward_process(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        options: &TransformOptions,
    ) -> Result<u64, ProcessingError> {
        seal_stream(Suite::ChaCha20Poly1305, input, output, options)
    }

    fn reverse_process(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        options: &TransformOptions,
    ) -> Result<u64, ProcessingError> {
        open_stream(Suite::ChaCha20Poly1305, input, output, options)
    }
}
