//! Incremental parsing of streamed replies.
//!
//! The streaming endpoint answers with `text/plain`: a JSON metadata object,
//! then raw answer text, then an optional footer introduced by
//! [`END_MARKER`] and followed by a JSON object.  Chunk boundaries carry no
//! meaning, so every piece of the format may arrive split across chunks.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};
use crate::types::{StreamEnd, StreamEvent, StreamMetadata};

/// Separator between answer text and the footer JSON.
pub const END_MARKER: &str = "\n\n__METADATA_END__:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Metadata,
    Body,
    Footer,
    Done,
}

struct Parser {
    phase: Phase,
    pending: Vec<u8>,
    buffer: String,
}

impl Parser {
    fn new() -> Self {
        Self {
            phase: Phase::Metadata,
            pending: Vec::new(),
            buffer: String::new(),
        }
    }

    /// Moves the longest valid UTF-8 prefix of `pending` into `buffer`.
    fn push(&mut self, bytes: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(bytes);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(s) => s.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                return Err(Error::encoding(
                    format!("Invalid UTF-8 in stream: {e}"),
                    Some(Box::new(e)),
                ));
            }
        };
        let rest = self.pending.split_off(valid);
        let decoded = std::mem::replace(&mut self.pending, rest);
        let text = String::from_utf8(decoded).map_err(|e| {
            Error::encoding(format!("Invalid UTF-8 in stream: {e}"), Some(Box::new(e)))
        })?;
        self.buffer.push_str(&text);
        Ok(())
    }

    /// Returns the next complete event in the buffer, if there is one.
    fn extract(&mut self) -> Option<Result<StreamEvent>> {
        loop {
            match self.phase {
                Phase::Metadata => {
                    let parsed = {
                        let mut values = serde_json::Deserializer::from_str(&self.buffer)
                            .into_iter::<StreamMetadata>();
                        match values.next()? {
                            Ok(meta) => Ok((meta, values.byte_offset())),
                            Err(e) => Err(e),
                        }
                    };
                    return match parsed {
                        Ok((meta, offset)) => {
                            self.buffer.drain(..offset);
                            self.phase = Phase::Body;
                            Some(Ok(StreamEvent::Metadata(meta)))
                        }
                        Err(e) if e.is_eof() => None,
                        Err(e) => {
                            self.phase = Phase::Done;
                            Some(Err(Error::serialization(
                                format!("Malformed stream metadata: {e}"),
                                Some(Box::new(e)),
                            )))
                        }
                    };
                }
                Phase::Body => {
                    if let Some(pos) = self.buffer.find(END_MARKER) {
                        let token: String = self.buffer.drain(..pos).collect();
                        self.buffer.drain(..END_MARKER.len());
                        self.phase = Phase::Footer;
                        if token.is_empty() {
                            continue;
                        }
                        return Some(Ok(StreamEvent::Token(token)));
                    }
                    let held = marker_prefix_len(&self.buffer);
                    let ready = self.buffer.len() - held;
                    if ready == 0 {
                        return None;
                    }
                    let token: String = self.buffer.drain(..ready).collect();
                    return Some(Ok(StreamEvent::Token(token)));
                }
                Phase::Footer | Phase::Done => return None,
            }
        }
    }

    /// Drains whatever is left once the byte stream has ended.
    fn finish(&mut self) -> Option<Result<StreamEvent>> {
        let phase = std::mem::replace(&mut self.phase, Phase::Done);
        if phase != Phase::Done && !self.pending.is_empty() {
            return Some(Err(Error::encoding(
                "stream ended inside a UTF-8 sequence",
                None,
            )));
        }
        match phase {
            Phase::Metadata => Some(Err(Error::streaming(
                "stream ended before metadata was complete",
                None,
            ))),
            Phase::Body => {
                let token = std::mem::take(&mut self.buffer);
                (!token.is_empty()).then_some(Ok(StreamEvent::Token(token)))
            }
            Phase::Footer => {
                let footer = std::mem::take(&mut self.buffer);
                // The answer is complete by now; a bad footer only loses the request id.
                let end = serde_json::from_str::<StreamEnd>(footer.trim()).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "ignoring malformed stream footer");
                    StreamEnd::default()
                });
                Some(Ok(StreamEvent::End(end)))
            }
            Phase::Done => None,
        }
    }
}

/// Length of the longest suffix of `buffer` that could begin [`END_MARKER`].
fn marker_prefix_len(buffer: &str) -> usize {
    let max = END_MARKER.len().saturating_sub(1).min(buffer.len());
    (1..=max)
        .rev()
        .find(|&n| {
            buffer.is_char_boundary(buffer.len() - n)
                && END_MARKER.starts_with(&buffer[buffer.len() - n..])
        })
        .unwrap_or(0)
}

/// Process a stream of bytes into a stream of reply events.
///
/// The first event is always [`StreamEvent::Metadata`]; text arrives as one
/// or more [`StreamEvent::Token`]s; [`StreamEvent::End`] is last when the
/// service sent a footer.  The stream stops after the first error.
pub fn process_stream<S>(byte_stream: S) -> impl Stream<Item = Result<StreamEvent>> + Send
where
    S: Stream<Item = Result<Bytes>> + Unpin + Send + 'static,
{
    stream::unfold(
        (byte_stream, Parser::new(), false),
        move |(mut byte_stream, mut parser, mut ended)| async move {
            loop {
                if let Some(event) = parser.extract() {
                    if event.is_err() {
                        parser.phase = Phase::Done;
                    }
                    return Some((event, (byte_stream, parser, ended)));
                }
                if ended {
                    let event = parser.finish()?;
                    return Some((event, (byte_stream, parser, ended)));
                }
                match byte_stream.next().await {
                    Some(Ok(bytes)) => {
                        if let Err(e) = parser.push(&bytes) {
                            parser.phase = Phase::Done;
                            return Some((Err(e), (byte_stream, parser, true)));
                        }
                    }
                    Some(Err(e)) => {
                        parser.phase = Phase::Done;
                        return Some((Err(e), (byte_stream, parser, true)));
                    }
                    None => ended = true,
                }
            }
        },
    )
}
