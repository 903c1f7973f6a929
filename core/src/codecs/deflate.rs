//! codecs/deflate.rs
//! Deflate (zlib wrapper) via flate2.
//!
//! Forward streams through `ZlibEncoder`. Reverse drives the raw inflater so
//! it can tell a complete zlib stream from a truncated one: input that ends
//! before the stream-end marker fails, as do bytes after it.

use std::io::{self, Read, Write};

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use tracing::trace;

use crate::constants::{option_keys, DEFAULT_LEVEL_DEFLATE};
use crate::transform::{StreamTransform, TransformOptions};
use crate::types::ProcessingError;
use crate::utils::CountingWriter;

const NAME: &str = "deflate";
const IO_BUF: usize = 32 * 1024;

#[derive(Debug, Default, Clone, Copy)]
pub struct DeflateTransform;

fn level(options: &TransformOptions) -> Result<Compression, ProcessingError> {
    let level: u32 = options.level_or(NAME, DEFAULT_LEVEL_DEFLATE)?;
    if level > 9 {
        return Err(ProcessingError::InvalidOption {
            transform: NAME,
            key: option_keys::LEVEL.into(),
            msg: format!("{} not in 0..=9", level),
        });
    }
    Ok(Compression::new(level))
}

fn io_err(e: io::Error) -> ProcessingError {
    ProcessingError::from_io(NAME, e)
}

fn malformed(msg: impl Into<String>) -> ProcessingError {
    ProcessingError::Malformed { transform: NAME, msg: msg.into() }
}

/// Feed `chunk` to the inflater until it is consumed, writing all output.
/// Returns whether the zlib stream ended.
fn inflate_chunk(
    inflater: &mut Decompress,
    mut chunk: &[u8],
    scratch: &mut Vec<u8>,
    out: &mut CountingWriter<&mut dyn Write>,
) -> Result<bool, ProcessingError> {
    while !chunk.is_empty() {
        scratch.clear();
        let before = inflater.total_in();
        let status = inflater
            .decompress_vec(chunk, scratch, FlushDecompress::None)
            .map_err(|e| malformed(e.to_string()))?;
        let consumed = (inflater.total_in() - before) as usize;
        chunk = &chunk[consumed..];
        out.write_all(&scratch[..]).map_err(io_err)?;

        if status == Status::StreamEnd {
            if !chunk.is_empty() {
                return Err(malformed("trailing bytes after zlib stream"));
            }
            return Ok(true);
        }
        if consumed == 0 && scratch.is_empty() {
            return Err(malformed("inflater made no progress"));
        }
    }
    Ok(false)
}

impl StreamTransform for DeflateTransform {
    fn forward_process(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        options: &TransformOptions,
    ) -> Result<u64, ProcessingError> {
        let mut enc = ZlibEncoder::new(CountingWriter::new(output), level(options)?);
        io::copy(input, &mut enc).map_err(io_err)?;
        let written = enc.finish().map_err(io_err)?.written();
        trace!(transform = NAME, written, "forward done");
        Ok(written)
    }

    fn reverse_process(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        _options: &TransformOptions,
    ) -> Result<u64, ProcessingError> {
        let mut inflater = Decompress::new(true);
        let mut inbuf = vec![0u8; IO_BUF];
        let mut scratch = Vec::with_capacity(IO_BUF * 4);
        let mut out = CountingWriter::new(output);
        let mut finished = false;

        loop {
            let n = match input.read(&mut inbuf) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_err(e)),
            };
            if n == 0 {
                break;
            }
            if finished {
                return Err(malformed("trailing bytes after zlib stream"));
            }
            finished = inflate_chunk(&mut inflater, &inbuf[..n], &mut scratch, &mut out)?;
        }

        // Drain output still held by the inflater; no stream end means truncation.
        while !finished {
            scratch.clear();
            let status = inflater
                .decompress_vec(&[], &mut scratch, FlushDecompress::Finish)
                .map_err(|e| malformed(e.to_string()))?;
            out.write_all(&scratch).map_err(io_err)?;
            match status {
                Status::StreamEnd => finished = true,
                _ if scratch.is_empty() => return Err(ProcessingError::Truncated { transform: NAME }),
                _ => {}
            }
        }

        let written = out.written();
        trace!(transform = NAME, written, "reverse done");
        Ok(written)
    }
}
