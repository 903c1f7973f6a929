//! codecs/passthrough.rs
//! Identity transform: output equals input in both directions.

use std::io::{self, Read, Write};

use tracing::trace;

use crate::transform::{StreamTransform, TransformOptions};
use crate::types::ProcessingError;

const NAME: &str = "passthrough";

#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughTransform;

impl PassthroughTransform {
    fn copy(input: &mut dyn Read, output: &mut dyn Write) -> Result<u64, ProcessingError> {
        io::copy(input, output).map_err(|e| ProcessingError::from_io(NAME, e))
    }
}

impl StreamTransform for PassthroughTransform {
    fn forward_process(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        _options: &TransformOptions,
    ) -> Result<u64, ProcessingError> {
        let written = Self::copy(input, output)?;
        trace!(transform = NAME, written, "forward done");
        Ok(written)
    }

    fn reverse_process(
        &self,
        input: &mut dyn Read,
        output: &mut dyn Write,
        _options: &TransformOptions,
    ) -> Result<u64, ProcessingError> {
        let written = Self::copy(input, output)?;
        trace!(transform = NAME, written, "reverse done");
        Ok(written)
    }
}
