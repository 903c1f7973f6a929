//! codecs/zstd.rs
//! Zstd streaming transform.
//!
//! Design notes:
//! - Forward writes one zstd frame (with content checksum) for the whole input.
//! - Reverse accepts one or more concatenated frames; an incomplete frame at
//!   EOF is reported by the decoder as `UnexpectedEof`, mapped to truncation.

use std::io::{Read, Write};

use tracing::trace;

use crate::constants::{option_keys, DEFAULT_LEVEL_ZSTD};
use crate::transform::{StreamTransform, TransformOptions};
use crate::types::ProcessingError;
use crate::utils::CountingWriter;

const NAME: &str = "zstd";

#[derive(Debug, Default, Clone, Copy)]
pub struct ZstdTransform;

fn level(options: &TransformOptions) -> Result<i32, ProcessingError> {
    let level: i32 = options.level_or(NAME, DEFAULT_LEVEL_ZSTD)?;
    let range = zstd::compression_level_range();
    if !range.contains(&level) {
        return Err(ProcessingError::InvalidOption {
            transform: NAME,
            key: option_keys::LEVEL.into(),
            msg: format!("{} not in {}..={}", level, range.start(), range.end()),
        });
    }
    Ok(level)
}

impl StreamTransform for ZstdTransform {
    fn forward_process(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        options: &TransformOptions,
    ) -> Result<u64, ProcessingError> {
        let mut out = CountingWriter::new(output);
        let mut enc = zstd::stream::Encoder::new(&mut out, level(options)?)
            .map_err(|e| ProcessingError::Codec { transform: NAME, msg: e.to_string() })?;
        enc.include_checksum(true)
            .map_err(|e| ProcessingError::Codec { transform: NAME, msg: e.to_string() })?;
        std::io::copy(input, &mut enc).map_err(|e| ProcessingError::from_io(NAME, e))?;
        enc.finish().map_err(|e| ProcessingError::from_io(NAME, e))?;

        let written = out.written();
        trace!(transform = NAME, written, "forward done");
        Ok(written)
    }

    fn reverse_process(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        _options: &TransformOptions,
    ) -> Result<u64, ProcessingError> {
        let mut out = CountingWriter::new(output);
        zstd::stream::copy_decode(input, &mut out).map_err(|e| ProcessingError::from_io(NAME, e))?;

        let written = out.written();
        trace!(transform = NAME, written, "reverse done");
        Ok(written)
    }
}
