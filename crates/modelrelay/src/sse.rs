//! SSE stream consumption: line framing and delta accumulation.
//!
//! Provider streams arrive as arbitrary byte chunks that do not respect
//! line or UTF-8 boundaries.  [`drain_sse_stream`] reassembles complete
//! lines through a carry buffer, feeds them to a [`DeltaAccumulator`], and
//! invokes the caller's delta callback in exact arrival order.  A
//! malformed chunk payload is logged and skipped; only transport-level
//! failures abort the stream.

use std::pin::pin;

use futures::{Stream, StreamExt};
use tracing::{trace, warn};

use crate::adapter::ProviderAdapter;
use crate::error::{RelayError, Result};
use crate::types::TokenUsage;

/// Accumulates text deltas from SSE lines for one provider stream.
///
/// Feed it complete lines (no trailing newline).  Terminal state is
/// sticky: after `data: [DONE]` every further line is ignored.
#[derive(Debug)]
pub struct DeltaAccumulator {
    adapter: ProviderAdapter,
    text: String,
    usage: Option<TokenUsage>,
    done: bool,
}

impl DeltaAccumulator {
    pub fn new(adapter: ProviderAdapter) -> Self {
        Self {
            adapter,
            text: String::new(),
            usage: None,
            done: false,
        }
    }

    /// Process one SSE line, returning the text delta it carried, if any.
    ///
    /// Blank lines, `:` comments, and non-`data:` fields are ignored.
    /// `data: [DONE]` flips the accumulator into its terminal state.  A
    /// `data:` payload that is not valid JSON is logged at warn and
    /// skipped; it contributes nothing to the accumulated text.
    pub fn feed_line(&mut self, line: &str) -> Option<String> {
        if self.done || line.is_empty() {
            return None;
        }
        let Some(payload) = line.strip_prefix("data:") else {
            trace!(line, "ignoring non-data SSE line");
            return None;
        };
        let payload = payload.trim();
        if payload == "[DONE]" {
            self.done = true;
            return None;
        }
        match self.adapter.parse_stream_payload(payload) {
            Ok(delta) => {
                if let Some(usage) = delta.usage {
                    self.usage = Some(usage);
                }
                if let Some(text) = delta.text {
                    self.text.push_str(&text);
                    return Some(text);
                }
                None
            }
            Err(err) => {
                warn!(%err, payload, "skipping malformed stream chunk");
                None
            }
        }
    }

    /// Whether `data: [DONE]` has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The accumulated full text and last reported usage.
    pub fn into_parts(self) -> (String, Option<TokenUsage>) {
        (self.text, self.usage)
    }
}

/// Consume a byte stream of SSE frames to completion.
///
/// `on_delta` fires once per text delta, in arrival order.  Returns the
/// accumulated full text and the last usage report once the stream ends
/// (or as soon as `data: [DONE]` arrives; remaining bytes are not read).
/// A transport error or invalid UTF-8 aborts with `Transport`; no deltas
/// are delivered after the return.
pub async fn drain_sse_stream<S, B, E>(
    stream: S,
    adapter: ProviderAdapter,
    mut on_delta: impl FnMut(&str),
) -> Result<(String, Option<TokenUsage>)>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut stream = pin!(stream);
    let mut accumulator = DeltaAccumulator::new(adapter);
    let mut carry: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| RelayError::Transport {
            reason: err.to_string(),
        })?;
        carry.extend_from_slice(chunk.as_ref());

        // Chunk boundaries fall anywhere, including inside a multi-byte
        // character; only complete lines are decoded.
        while let Some(newline) = carry.iter().position(|&b| b == b'\n') {
            let emitted = {
                let line = line_str(&carry[..newline])?;
                accumulator.feed_line(line.trim_end_matches('\r'))
            };
            carry.drain(..=newline);
            if let Some(delta) = emitted {
                on_delta(&delta);
            }
            if accumulator.is_done() {
                return Ok(accumulator.into_parts());
            }
        }
    }

    // A final line without a trailing newline still counts.
    if !carry.is_empty() {
        let emitted = {
            let line = line_str(&carry)?;
            accumulator.feed_line(line.trim_end_matches('\r'))
        };
        if let Some(delta) = emitted {
            on_delta(&delta);
        }
    }

    Ok(accumulator.into_parts())
}

fn line_str(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|err| RelayError::Transport {
        reason: format!("invalid utf-8 in stream: {err}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProviderKind;

    fn openai_adapter() -> ProviderAdapter {
        ProviderAdapter::new(ProviderKind::OpenAiCompatible)
    }

    fn ok_chunk(bytes: &[u8]) -> std::result::Result<Vec<u8>, String> {
        Ok(bytes.to_vec())
    }

    #[test]
    fn feed_line_ignores_housekeeping() {
        let mut acc = DeltaAccumulator::new(openai_adapter());
        assert!(acc.feed_line("").is_none());
        assert!(acc.feed_line(": keep-alive").is_none());
        assert!(acc.feed_line("event: message").is_none());
        assert!(acc.feed_line("id: 42").is_none());
        assert!(!acc.is_done());
    }

    #[test]
    fn feed_line_accumulates_and_terminates() {
        let mut acc = DeltaAccumulator::new(openai_adapter());
        assert_eq!(
            acc.feed_line(r#"data: {"choices":[{"delta":{"content":"He"}}]}"#)
                .as_deref(),
            Some("He")
        );
        // No space after the colon is accepted too.
        assert_eq!(
            acc.feed_line(r#"data:{"choices":[{"delta":{"content":"llo"}}]}"#)
                .as_deref(),
            Some("llo")
        );
        assert!(acc.feed_line("data: [DONE]").is_none());
        assert!(acc.is_done());

        // Terminal state is sticky.
        assert!(
            acc.feed_line(r#"data: {"choices":[{"delta":{"content":"late"}}]}"#)
                .is_none()
        );
        let (text, usage) = acc.into_parts();
        assert_eq!(text, "Hello");
        assert!(usage.is_none());
    }

    #[test]
    fn feed_line_skips_malformed_payload() {
        let mut acc = DeltaAccumulator::new(openai_adapter());
        acc.feed_line(r#"data: {"choices":[{"delta":{"content":"a"}}]}"#);
        assert!(acc.feed_line("data: {this is not json").is_none());
        acc.feed_line(r#"data: {"choices":[{"delta":{"content":"b"}}]}"#);
        let (text, _) = acc.into_parts();
        assert_eq!(text, "ab");
    }

    #[tokio::test]
    async fn drains_interleaved_frames_to_full_text() {
        let frames = concat!(
            ": keep-alive\n",
            "\n",
            "event: message\n",
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n",
            "data: {broken\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n",
            "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":3,\"completion_tokens\":2}}\n",
            "data: [DONE]\n",
        );
        let stream = futures::stream::iter(vec![ok_chunk(frames.as_bytes())]);

        let mut deltas = Vec::new();
        let (text, usage) = drain_sse_stream(stream, openai_adapter(), |d| {
            deltas.push(d.to_string());
        })
        .await
        .unwrap();

        assert_eq!(deltas, vec!["He", "llo"]);
        assert_eq!(text, "Hello");
        assert_eq!(usage.unwrap().output_tokens, 2);
    }

    #[tokio::test]
    async fn reassembles_frame_split_across_chunks() {
        // The boundary falls inside the two-byte encoding of 'é'.
        let frame = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo\"}}]}\n".as_bytes();
        let split = frame.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let stream = futures::stream::iter(vec![
            ok_chunk(&frame[..split]),
            ok_chunk(&frame[split..]),
            ok_chunk(b"data: [DONE]\n"),
        ]);

        let mut deltas = Vec::new();
        let (text, _) = drain_sse_stream(stream, openai_adapter(), |d| {
            deltas.push(d.to_string());
        })
        .await
        .unwrap();

        assert_eq!(deltas, vec!["héllo"]);
        assert_eq!(text, "héllo");
    }

    #[tokio::test]
    async fn done_stops_reading_the_transport() {
        // The error after [DONE] must never be polled.
        let stream = futures::stream::iter(vec![
            ok_chunk(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\ndata: [DONE]\n"),
            Err("connection reset by peer".to_string()),
        ]);

        let mut deltas = Vec::new();
        let (text, _) = drain_sse_stream(stream, openai_adapter(), |d| {
            deltas.push(d.to_string());
        })
        .await
        .unwrap();

        assert_eq!(deltas, vec!["Hi"]);
        assert_eq!(text, "Hi");
    }

    #[tokio::test]
    async fn transport_error_mid_stream_aborts_after_delivered_deltas() {
        let stream = futures::stream::iter(vec![
            ok_chunk(b"data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n"),
            Err("connection reset by peer".to_string()),
            ok_chunk(b"data: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n"),
        ]);

        let mut deltas = Vec::new();
        let err = drain_sse_stream(stream, openai_adapter(), |d| {
            deltas.push(d.to_string());
        })
        .await
        .unwrap_err();

        assert!(matches!(err, RelayError::Transport { .. }));
        // Everything delivered before the failure stays delivered; nothing
        // arrives after it.
        assert_eq!(deltas, vec!["He"]);
    }

    #[tokio::test]
    async fn trailing_line_without_newline_is_processed() {
        // Gemini streams end with the transport, no [DONE] sentinel.
        let adapter = ProviderAdapter::new(ProviderKind::Gemini);
        let stream = futures::stream::iter(vec![
            ok_chunk(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"He\"}]}}]}\r\n"),
            ok_chunk(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"llo\"}]}}]}"),
        ]);

        let mut deltas = Vec::new();
        let (text, _) = drain_sse_stream(stream, adapter, |d| {
            deltas.push(d.to_string());
        })
        .await
        .unwrap();

        assert_eq!(deltas, vec!["He", "llo"]);
        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn invalid_utf8_is_a_transport_error() {
        let stream = futures::stream::iter(vec![ok_chunk(b"data: \xff\xfe\n")]);
        let err = drain_sse_stream(stream, openai_adapter(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Transport { .. }));
    }
}
