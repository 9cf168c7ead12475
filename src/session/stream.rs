//! Stream consumer: incremental decoding of a chunked text body.

use futures::stream::BoxStream;
use futures::StreamExt;

use crate::error::ParlanceError;
use crate::provider::ByteStream;

/// Incremental UTF-8 decoder.
///
/// A multi-byte sequence split across chunk boundaries is held back until
/// the rest arrives. Invalid bytes decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, appending complete characters to `out`.
    pub fn decode_into(&mut self, chunk: &[u8], out: &mut String) {
        self.pending.extend_from_slice(chunk);
        let mut consumed = 0;

        loop {
            let rest = &self.pending[consumed..];
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    consumed = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    // `valid_up_to` marks the end of a valid prefix.
                    out.push_str(std::str::from_utf8(&rest[..valid_up_to]).unwrap_or_default());
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            consumed += valid_up_to + bad;
                        }
                        None => {
                            consumed += valid_up_to;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
    }

    /// Flush bytes still held back at end of stream.
    pub fn finish_into(&mut self, out: &mut String) {
        if !self.pending.is_empty() {
            out.push_str(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
    }
}

/// Turn a byte stream into a stream of accumulated output.
///
/// Every item is the full text received so far, never just the latest chunk,
/// so consecutive items grow monotonically. One item is yielded per body
/// chunk; bytes held back at end of stream are flushed into a final item.
/// The stream ends after the first transport error.
pub fn accumulated_output(bytes: ByteStream) -> BoxStream<'static, Result<String, ParlanceError>> {
    let stream = async_stream::stream! {
        let mut bytes = bytes;
        let mut decoder = Utf8Decoder::new();
        let mut output = String::new();
        let mut failed = false;

        while let Some(chunk_result) = bytes.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    failed = true;
                    yield Err(e);
                    break;
                }
            };

            decoder.decode_into(&chunk, &mut output);
            yield Ok(output.clone());
        }

        if !failed {
            let before = output.len();
            decoder.finish_into(&mut output);
            if output.len() != before {
                yield Ok(output);
            }
        }
    };

    Box::pin(stream)
}
