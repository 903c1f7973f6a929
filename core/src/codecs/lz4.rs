//! codecs/lz4.rs
//! LZ4 frame-format transform (lz4_flex, pure Rust).
//! No level or dictionary support: the frame encoder has a single mode.
//!
//! The frame decoder treats EOF at a block or frame boundary as a clean end,
//! so reverse runs the input through `FrameTracker`, which follows the frame
//! layout byte by byte and only accepts input that ends after a complete frame.

use std::io::{self, Read, Write};

use byteorder::{ByteOrder, LittleEndian};
use lz4_flex::frame::{FrameDecoder, FrameEncoder};
use tracing::trace;

use crate::transform::{StreamTransform, TransformOptions};
use crate::types::ProcessingError;
use crate::utils::CountingWriter;

const NAME: &str = "lz4";

const LZ4_MAGIC: u32 = 0x184D_2204;
const SKIPPABLE_MAGIC: u32 = 0x184D_2A50;
const SKIPPABLE_MASK: u32 = 0xFFFF_FFF0;

// FLG bits
const FLG_DICT_ID: u8 = 0x01;
const FLG_CONTENT_CHECKSUM: u8 = 0x04;
const FLG_CONTENT_SIZE: u8 = 0x08;
const FLG_BLOCK_CHECKSUM: u8 = 0x10;

const BLOCK_UNCOMPRESSED: u32 = 0x8000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Magic,
    Descriptor,
    DescriptorTail,
    BlockSize,
    BlockBody,
    ContentChecksum,
    SkippableSize,
    SkippableBody,
    /// Unknown magic; the decoder reports the error.
    Invalid,
}

impl Stage {
    fn collects(self) -> bool {
        matches!(self, Stage::Magic | Stage::Descriptor | Stage::BlockSize | Stage::SkippableSize)
    }
}

/// Reader adapter tracking LZ4 frame structure of the bytes passing through.
pub(crate) struct FrameTracker<R> {
    inner: R,
    stage: Stage,
    want: usize,
    field: Vec<u8>,
    flags: u8,
    frames: u64,
}

impl<R: Read> FrameTracker<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            stage: Stage::Magic,
            want: 4,
            field: Vec::with_capacity(4),
            flags: 0,
            frames: 0,
        }
    }

    /// At least one LZ4 frame ended and no later frame was started.
    pub(crate) fn is_complete(&self) -> bool {
        self.stage == Stage::Magic && self.field.is_empty() && self.frames > 0
    }

    fn track(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            if self.stage == Stage::Invalid {
                return;
            }
            let n = self.want.min(bytes.len());
            if self.stage.collects() {
                self.field.extend_from_slice(&bytes[..n]);
            }
            bytes = &bytes[n..];
            self.want -= n;
            if self.want == 0 {
                self.finish_stage();
            }
        }
    }

    fn enter(&mut self, stage: Stage, want: usize) {
        self.stage = stage;
        self.want = want;
        if want == 0 {
            self.finish_stage();
        }
    }

    fn finish_stage(&mut self) {
        let field = std::mem::take(&mut self.field);
        match self.stage {
            Stage::Magic => {
                let magic = LittleEndian::read_u32(&field);
                if magic == LZ4_MAGIC {
                    self.enter(Stage::Descriptor, 2);
                } else if magic & SKIPPABLE_MASK == SKIPPABLE_MAGIC {
                    self.enter(Stage::SkippableSize, 4);
                } else {
                    self.enter(Stage::Invalid, usize::MAX);
                }
            }
            Stage::Descriptor => {
                self.flags = field[0];
                let mut tail = 1; // header checksum
                if self.flags & FLG_CONTENT_SIZE != 0 {
                    tail += 8;
                }
                if self.flags & FLG_DICT_ID != 0 {
                    tail += 4;
                }
                self.enter(Stage::DescriptorTail, tail);
            }
            Stage::DescriptorTail | Stage::BlockBody => self.enter(Stage::BlockSize, 4),
            Stage::BlockSize => {
                let size = LittleEndian::read_u32(&field);
                if size == 0 {
                    if self.flags & FLG_CONTENT_CHECKSUM != 0 {
                        self.enter(Stage::ContentChecksum, 4);
                    } else {
                        self.end_frame();
                    }
                } else {
                    let mut body = (size & !BLOCK_UNCOMPRESSED) as usize;
                    if self.flags & FLG_BLOCK_CHECKSUM != 0 {
                        body += 4;
                    }
                    self.enter(Stage::BlockBody, body);
                }
            }
            Stage::ContentChecksum => self.end_frame(),
            Stage::SkippableSize => {
                let size = LittleEndian::read_u32(&field) as usize;
                self.enter(Stage::SkippableBody, size);
            }
            Stage::SkippableBody => self.enter(Stage::Magic, 4),
            Stage::Invalid => {}
        }
    }

    fn end_frame(&mut self) {
        self.frames += 1;
        self.enter(Stage::Magic, 4);
    }
}

impl<R: Read> Read for FrameTracker<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.track(&buf[..n]);
        Ok(n)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Lz4Transform;

impl StreamTransform for Lz4Transform {
    fn forward_process(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        _options: &TransformOptions,
    ) -> Result<u64, ProcessingError> {
        let mut enc = FrameEncoder::new(CountingWriter::new(output));
        io::copy(input, &mut enc).map_err(|e| ProcessingError::from_io(NAME, e))?;
        let written = enc
            .finish()
            .map_err(|e| ProcessingError::Codec { transform: NAME, msg: e.to_string() })?
            .written();
        trace!(transform = NAME, written, "forward done");
        Ok(written)
    }

    fn reverse_process(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        _options: &TransformOptions,
    ) -> Result<u64, ProcessingError> {
        let mut tracker = FrameTracker::new(input);
        let mut out = CountingWriter::new(output);
        io::copy(&mut FrameDecoder::new(&mut tracker), &mut out)
            .map_err(|e| ProcessingError::from_io(NAME, e))?;
        if !tracker.is_complete() {
            return Err(ProcessingError::Truncated { transform: NAME });
        }

        let written = out.written();
        trace!(transform = NAME, written, "reverse done");
        Ok(written)
    }
}
