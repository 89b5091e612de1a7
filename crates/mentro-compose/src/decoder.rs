//! Incremental decoder for the post creation progress stream.
//!
//! The backend answers a post submission with newline-delimited records of the
//! form `data: <json>`. Two shapes are meaningful:
//!
//! - `{"fileName": "...", "progress": 42}` updates one file's progress.
//! - `{"type": "complete", "post": {...}}` carries the created post and ends the stream.
//!
//! Chunks may split a record anywhere, including inside a multi-byte character, so
//! bytes are buffered until a full line is available and only then decoded. A line
//! that fails to parse is logged and skipped; it never aborts the stream.

use mentro_core::models::Post;
use serde_json::Value;

const DATA_PREFIX: &str = "data: ";
const COMPLETE_TYPE: &str = "complete";
/// Longest line kept in memory while waiting for its newline.
pub const DEFAULT_MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Decoder state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// No partial line buffered.
    AwaitingChunk,
    /// A partial line is buffered, waiting for its newline.
    BufferingLine,
    /// A complete line is being decoded.
    EmitEvent,
    /// Completion was seen or the stream ended. Further input is ignored.
    StreamClosed,
}

/// Event decoded from one stream record.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Progress { file_name: String, progress: u8 },
    Complete(Box<Post>),
}

/// How the stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Completed,
    WithoutCompletion,
}

#[derive(Debug)]
pub struct ProgressEventDecoder {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to hold no newline.
    scanned: usize,
    max_line_bytes: usize,
    /// Dropping the rest of an oversized line up to its newline.
    discarding: bool,
    state: DecoderState,
    completed: bool,
}

impl ProgressEventDecoder {
    pub fn new() -> Self {
        Self::with_max_line_bytes(DEFAULT_MAX_LINE_BYTES)
    }

    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            max_line_bytes,
            discarding: false,
            state: DecoderState::AwaitingChunk,
            completed: false,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == DecoderState::StreamClosed
    }

    /// Feed the next chunk and return the events of every line it completed.
    ///
    /// After a completion event the decoder closes: the rest of the chunk and any
    /// later chunk are discarded. A line longer than the configured maximum is
    /// dropped with a warning.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        if self.is_closed() {
            tracing::trace!(bytes = chunk.len(), "Ignoring bytes after stream close");
            return events;
        }

        self.buffer.extend_from_slice(chunk);
        self.state = DecoderState::BufferingLine;

        while let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            let newline = self.scanned + offset;
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            self.scanned = 0;
            if self.discarding {
                self.discarding = false;
                continue;
            }
            self.state = DecoderState::EmitEvent;

            if let Some(event) = decode_line(&line[..line.len() - 1]) {
                let terminal = matches!(event, ProgressEvent::Complete(_));
                events.push(event);
                if terminal {
                    self.close(true);
                    return events;
                }
            }
        }
        self.scanned = self.buffer.len();

        if self.buffer.len() > self.max_line_bytes {
            tracing::warn!(
                bytes = self.buffer.len(),
                limit = self.max_line_bytes,
                "Dropping oversized progress line"
            );
            self.buffer.clear();
            self.scanned = 0;
            self.discarding = true;
        }

        self.state = if self.buffer.is_empty() {
            DecoderState::AwaitingChunk
        } else {
            DecoderState::BufferingLine
        };
        events
    }

    /// Signal the end of the underlying stream.
    ///
    /// A final record without a trailing newline is still decoded.
    pub fn finish(&mut self) -> (Vec<ProgressEvent>, StreamEnd) {
        let mut events = Vec::new();
        if !self.is_closed() && !self.discarding && !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            if let Some(event) = decode_line(&line) {
                self.completed = matches!(event, ProgressEvent::Complete(_));
                events.push(event);
            }
        }
        let completed = self.completed;
        self.close(completed);

        let end = if self.completed {
            StreamEnd::Completed
        } else {
            StreamEnd::WithoutCompletion
        };
        (events, end)
    }

    fn close(&mut self, completed: bool) {
        self.buffer.clear();
        self.scanned = 0;
        self.discarding = false;
        self.completed = completed;
        self.state = DecoderState::StreamClosed;
    }
}

impl Default for ProgressEventDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode one line without its trailing newline. `None` for lines that carry no event.
///
/// Any object with `"type": "complete"` and a `post` is a completion, whatever the
/// shape of the post. Everything else needs `fileName` and a numeric `progress`.
fn decode_line(line: &[u8]) -> Option<ProgressEvent> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let text = match std::str::from_utf8(line) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %err, "Skipping progress line with invalid UTF-8");
            return None;
        }
    };

    let payload = text.strip_prefix(DATA_PREFIX)?;

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, line = %payload, "Skipping malformed progress line");
            return None;
        }
    };
    let Some(record) = value.as_object() else {
        tracing::warn!(line = %payload, "Skipping progress line that is not an object");
        return None;
    };

    let kind = record.get("type").and_then(Value::as_str);
    if kind == Some(COMPLETE_TYPE) {
        if let Some(post) = record.get("post").filter(|p| !p.is_null()) {
            return Some(ProgressEvent::Complete(Box::new(Post::from_wire(post))));
        }
    }

    let file_name = record.get("fileName").and_then(Value::as_str);
    let progress = record.get("progress").and_then(Value::as_f64);
    match (file_name, progress) {
        (Some(file_name), Some(progress)) => Some(ProgressEvent::Progress {
            file_name: file_name.to_string(),
            progress: progress.round().clamp(0.0, 100.0) as u8,
        }),
        _ => {
            tracing::warn!(event_type = ?kind, line = %payload, "Skipping unrecognized progress line");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE_LINE: &str =
        "data: {\"type\":\"complete\",\"post\":{\"id\":\"p1\",\"author\":{\"name\":\"Ada\"}}}\n";

    fn progress(file_name: &str, progress: u8) -> ProgressEvent {
        ProgressEvent::Progress {
            file_name: file_name.to_string(),
            progress,
        }
    }

    #[test]
    fn test_single_progress_line() {
        let mut decoder = ProgressEventDecoder::new();
        let events = decoder.feed(b"data: {\"fileName\":\"x.png\",\"progress\":50}\n");
        assert_eq!(events, vec![progress("x.png", 50)]);
        assert_eq!(decoder.state(), DecoderState::AwaitingChunk);
    }

    #[test]
    fn test_line_split_across_chunks_at_every_offset() {
        let line = b"data: {\"fileName\":\"x.png\",\"progress\":50}\n";
        for split in 1..line.len() {
            let mut decoder = ProgressEventDecoder::new();
            let mut events = decoder.feed(&line[..split]);
            assert!(events.is_empty(), "split at {} emitted early", split);
            assert_eq!(decoder.state(), DecoderState::BufferingLine);
            events.extend(decoder.feed(&line[split..]));
            assert_eq!(events, vec![progress("x.png", 50)], "split at {}", split);
        }
    }

    #[test]
    fn test_multibyte_file_name_split_mid_character() {
        let line = "data: {\"fileName\":\"café.png\",\"progress\":7}\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let mut decoder = ProgressEventDecoder::new();
        assert!(decoder.feed(&line[..split]).is_empty());
        assert_eq!(decoder.feed(&line[split..]), vec![progress("café.png", 7)]);
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let mut decoder = ProgressEventDecoder::new();
        let events = decoder.feed(b"data: not-json\ndata: {\"fileName\":\"y\",\"progress\":10}\n");
        assert_eq!(events, vec![progress("y", 10)]);
    }

    #[test]
    fn test_lines_without_prefix_are_ignored() {
        let mut decoder = ProgressEventDecoder::new();
        let events = decoder.feed(b"\n: keep-alive\nevent: progress\r\ndata: {\"fileName\":\"a\",\"progress\":1}\r\n");
        assert_eq!(events, vec![progress("a", 1)]);
    }

    #[test]
    fn test_unrecognized_objects_are_skipped() {
        let mut decoder = ProgressEventDecoder::new();
        let events = decoder.feed(
            b"data: {\"type\":\"heartbeat\",\"post\":{\"id\":\"x\",\"author\":{}}}\ndata: {\"status\":\"ok\"}\ndata: [1,2]\n",
        );
        assert!(events.is_empty());
        assert!(!decoder.is_closed());
    }

    #[test]
    fn test_progress_is_rounded_and_clamped() {
        let mut decoder = ProgressEventDecoder::new();
        let events = decoder.feed(
            b"data: {\"fileName\":\"a\",\"progress\":33.6}\ndata: {\"fileName\":\"a\",\"progress\":140}\ndata: {\"fileName\":\"a\",\"progress\":-5}\n",
        );
        assert_eq!(
            events,
            vec![progress("a", 34), progress("a", 100), progress("a", 0)]
        );
    }

    #[test]
    fn test_completion_closes_and_ignores_trailing_bytes() {
        let mut decoder = ProgressEventDecoder::new();
        let input = format!(
            "data: {{\"fileName\":\"a\",\"progress\":100}}\n{}data: {{\"fileName\":\"a\",\"progress\":5}}\n",
            COMPLETE_LINE
        );
        let events = decoder.feed(input.as_bytes());
        assert_eq!(events.len(), 2);
        match &events[1] {
            ProgressEvent::Complete(post) => assert_eq!(post.id, "p1"),
            other => panic!("expected completion, got {:?}", other),
        }
        assert!(decoder.is_closed());
        assert!(decoder.feed(b"data: {\"fileName\":\"a\",\"progress\":9}\n").is_empty());
        assert_eq!(decoder.finish().1, StreamEnd::Completed);
    }

    #[test]
    fn test_finish_without_completion() {
        let mut decoder = ProgressEventDecoder::new();
        decoder.feed(b"data: {\"fileName\":\"a\",\"progress\":60}\ndata: {\"fileNa");
        let (events, end) = decoder.finish();
        assert!(events.is_empty());
        assert_eq!(end, StreamEnd::WithoutCompletion);
        assert_eq!(decoder.state(), DecoderState::StreamClosed);
    }

    #[test]
    fn test_finish_decodes_unterminated_completion() {
        let mut decoder = ProgressEventDecoder::new();
        decoder.feed(COMPLETE_LINE.trim_end().as_bytes());
        let (events, end) = decoder.finish();
        assert_eq!(events.len(), 1);
        assert_eq!(end, StreamEnd::Completed);
    }

    #[test]
    fn test_completion_with_loose_post_shape_is_terminal() {
        let mut decoder = ProgressEventDecoder::new();
        let events = decoder.feed(
            b"data: {\"type\":\"complete\",\"post\":{\"id\":42,\"author\":{\"name\":\"A\"},\"timestamp\":1729244400000}}\ndata: {\"fileName\":\"a\",\"progress\":5}\n",
        );
        assert_eq!(events.len(), 1);
        match &events[0] {
            ProgressEvent::Complete(post) => {
                assert_eq!(post.id, "42");
                assert!(post.timestamp_utc().is_some());
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert!(decoder.is_closed());
        assert_eq!(decoder.finish().1, StreamEnd::Completed);
    }

    #[test]
    fn test_completion_without_author_or_with_opaque_post() {
        let mut decoder = ProgressEventDecoder::new();
        let events = decoder.feed(b"data: {\"type\":\"complete\",\"post\":{\"id\":\"p1\",\"content\":\"hi\"}}\n");
        assert!(matches!(&events[..], [ProgressEvent::Complete(post)] if post.id == "p1" && post.content == "hi"));

        let mut decoder = ProgressEventDecoder::new();
        let events = decoder.feed(b"data: {\"type\":\"complete\",\"post\":\"created\"}\n");
        assert_eq!(events.len(), 1);
        assert!(decoder.is_closed());
    }

    #[test]
    fn test_completion_without_post_is_skipped() {
        let mut decoder = ProgressEventDecoder::new();
        let events = decoder.feed(b"data: {\"type\":\"complete\"}\ndata: {\"type\":\"complete\",\"post\":null}\n");
        assert!(events.is_empty());
        assert!(!decoder.is_closed());
    }

    #[test]
    fn test_oversized_line_is_dropped() {
        let mut decoder = ProgressEventDecoder::with_max_line_bytes(64);
        let long = format!("data: {}", "x".repeat(100));
        assert!(decoder.feed(long.as_bytes()).is_empty());
        assert!(decoder.buffer.is_empty());
        assert!(decoder.feed(b"yyyy").is_empty());

        let events = decoder.feed(b"zz\ndata: {\"fileName\":\"a\",\"progress\":1}\n");
        assert_eq!(events, vec![progress("a", 1)]);
        assert_eq!(decoder.state(), DecoderState::AwaitingChunk);
    }

    #[test]
    fn test_partial_line_is_not_rescanned() {
        let mut decoder = ProgressEventDecoder::new();
        decoder.feed(b"data: {\"fileName\":");
        assert_eq!(decoder.scanned, decoder.buffer.len());
        let events = decoder.feed(b"\"a\",\"progress\":2}\n");
        assert_eq!(events, vec![progress("a", 2)]);
        assert_eq!(decoder.scanned, 0);
    }
}
