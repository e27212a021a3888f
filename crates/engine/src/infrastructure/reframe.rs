//! Stream reframing.
//!
//! The two upstream flavors stream with different framings: the v1 API
//! sends SSE `data: <json>` lines ending with `data: [DONE]`, the native
//! API sends bare newline-delimited JSON objects with a `done` boolean.
//! The [`Reframer`] consumes raw byte chunks from either and yields one
//! unified event sequence: content deltas, one synthetic stop, one done
//! marker.
//!
//! Network reads do not respect line boundaries, so incomplete lines are
//! buffered across chunks and decoded only once their newline arrives.
//! A line that still fails to parse after that is skipped, never fatal.

use serde_json::Value;

use crate::config::UpstreamFlavor;

/// One unified event decoded from the upstream stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ReframeEvent {
    /// Incremental content.
    Delta(String),
    /// The synthetic completion frame (empty delta, finish_reason stop).
    Stop,
    /// The literal terminal marker.
    Done,
}

/// Per-connection decoder state for one upstream stream.
#[derive(Debug)]
pub struct Reframer {
    flavor: UpstreamFlavor,
    buffer: String,
    finished: bool,
}

impl Reframer {
    pub fn new(flavor: UpstreamFlavor) -> Self {
        Self {
            flavor,
            buffer: String::new(),
            finished: false,
        }
    }

    /// True once the done marker has been emitted. Any further input is
    /// discarded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed one network read; returns the events decoded from the lines
    /// it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<ReframeEvent> {
        if self.finished {
            return Vec::new();
        }
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            self.decode_line(line.trim(), &mut events);
            if self.finished {
                break;
            }
        }
        events
    }

    /// Flush at end of stream: decode a trailing line that never received
    /// its newline, so the final fragment of an abruptly closed upstream
    /// is not lost.
    pub fn finish(&mut self) -> Vec<ReframeEvent> {
        if self.finished {
            return Vec::new();
        }
        let rest = std::mem::take(&mut self.buffer);
        let mut events = Vec::new();
        let line = rest.trim();
        if !line.is_empty() {
            self.decode_line(line, &mut events);
        }
        events
    }

    fn decode_line(&mut self, line: &str, events: &mut Vec<ReframeEvent>) {
        if self.finished || line.is_empty() {
            return;
        }
        match self.flavor {
            UpstreamFlavor::V1 => self.decode_v1_line(line, events),
            UpstreamFlavor::Native => self.decode_native_line(line, events),
        }
    }

    /// v1 framing: only `data:` lines matter; `event:` lines and comments
    /// are ignored.
    fn decode_v1_line(&mut self, line: &str, events: &mut Vec<ReframeEvent>) {
        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.trim();

        if data == "[DONE]" {
            events.push(ReframeEvent::Stop);
            events.push(ReframeEvent::Done);
            self.finished = true;
            return;
        }

        let Ok(value) = serde_json::from_str::<Value>(data) else {
            return;
        };
        let choice = value.get("choices").and_then(|choices| choices.get(0));
        // Some v1 servers put streamed content on `message` instead of
        // `delta`; accept both.
        let text = choice
            .and_then(|c| c.pointer("/delta/content"))
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .or_else(|| {
                choice
                    .and_then(|c| c.pointer("/message/content"))
                    .and_then(Value::as_str)
                    .filter(|text| !text.is_empty())
            });
        if let Some(text) = text {
            events.push(ReframeEvent::Delta(text.to_string()));
        }
    }

    /// Native framing: one JSON object per line, `done` marks completion.
    fn decode_native_line(&mut self, line: &str, events: &mut Vec<ReframeEvent>) {
        let Ok(value) = serde_json::from_str::<Value>(line) else {
            return;
        };

        if let Some(content) = value
            .pointer("/message/content")
            .and_then(Value::as_str)
            .filter(|content| !content.is_empty())
        {
            events.push(ReframeEvent::Delta(content.to_string()));
        }

        if value.get("done").and_then(Value::as_bool) == Some(true) {
            events.push(ReframeEvent::Stop);
            events.push(ReframeEvent::Done);
            self.finished = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deltas(events: &[ReframeEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|event| match event {
                ReframeEvent::Delta(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn count(events: &[ReframeEvent], needle: &ReframeEvent) -> usize {
        events.iter().filter(|event| *event == needle).count()
    }

    #[test]
    fn test_native_stream_ends_with_one_stop_and_one_done() {
        let mut reframer = Reframer::new(UpstreamFlavor::Native);
        let mut events = Vec::new();
        events.extend(reframer.push(b"{\"message\":{\"content\":\"Once\"},\"done\":false}\n"));
        events.extend(reframer.push(b"{\"message\":{\"content\":\" upon\"},\"done\":false}\n"));
        events.extend(reframer.push(b"{\"message\":{\"content\":\"\"},\"done\":true}\n"));

        assert_eq!(deltas(&events), vec!["Once", " upon"]);
        assert_eq!(count(&events, &ReframeEvent::Stop), 1);
        assert_eq!(count(&events, &ReframeEvent::Done), 1);
        assert_eq!(
            events.last(),
            Some(&ReframeEvent::Done),
            "done marker must be last"
        );
    }

    #[test]
    fn test_input_after_done_is_discarded() {
        let mut reframer = Reframer::new(UpstreamFlavor::Native);
        reframer.push(b"{\"done\":true}\n");
        assert!(reframer.is_finished());

        let extra = reframer.push(b"{\"message\":{\"content\":\"late\"},\"done\":false}\n");
        assert!(extra.is_empty());
        assert!(reframer.finish().is_empty());
    }

    #[test]
    fn test_line_split_across_chunks_is_buffered_not_dropped() {
        let mut reframer = Reframer::new(UpstreamFlavor::Native);
        let first = reframer.push(b"{\"message\":{\"content\":\"hel");
        assert!(first.is_empty(), "incomplete line must wait for its newline");

        let second = reframer.push(b"lo\"},\"done\":false}\n");
        assert_eq!(deltas(&second), vec!["hello"]);
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut reframer = Reframer::new(UpstreamFlavor::Native);
        let events = reframer.push(
            b"{\"message\":{\"content\":\"a\"},\"done\":false}\n{\"message\":{\"content\":\"b\"},\"done\":false}\n",
        );
        assert_eq!(deltas(&events), vec!["a", "b"]);
    }

    #[test]
    fn test_v1_delta_lines_and_done_marker() {
        let mut reframer = Reframer::new(UpstreamFlavor::V1);
        let mut events = Vec::new();
        events.extend(reframer.push(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"},\"finish_reason\":null}]}\n\n",
        ));
        events.extend(
            reframer.push(b"data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n"),
        );
        events.extend(reframer.push(b"data: [DONE]\n\n"));

        assert_eq!(deltas(&events), vec!["Hi"]);
        assert_eq!(count(&events, &ReframeEvent::Stop), 1);
        assert_eq!(count(&events, &ReframeEvent::Done), 1);
    }

    #[test]
    fn test_v1_message_content_fallback() {
        let mut reframer = Reframer::new(UpstreamFlavor::V1);
        let events = reframer
            .push(b"data: {\"choices\":[{\"message\":{\"content\":\"whole\"}}]}\n");
        assert_eq!(deltas(&events), vec!["whole"]);
    }

    #[test]
    fn test_v1_non_data_lines_are_ignored() {
        let mut reframer = Reframer::new(UpstreamFlavor::V1);
        let events = reframer.push(b"event: ping\n: comment\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn test_unparseable_line_is_skipped_not_fatal() {
        let mut reframer = Reframer::new(UpstreamFlavor::Native);
        let mut events = Vec::new();
        events.extend(reframer.push(b"garbage that is not json\n"));
        events.extend(reframer.push(b"{\"message\":{\"content\":\"ok\"},\"done\":true}\n"));

        assert_eq!(deltas(&events), vec!["ok"]);
        assert_eq!(count(&events, &ReframeEvent::Done), 1);
    }

    #[test]
    fn test_finish_flushes_trailing_line_without_newline() {
        let mut reframer = Reframer::new(UpstreamFlavor::Native);
        let pushed = reframer.push(b"{\"message\":{\"content\":\"tail\"},\"done\":false}");
        assert!(pushed.is_empty());

        let flushed = reframer.finish();
        assert_eq!(deltas(&flushed), vec!["tail"]);
    }

    #[test]
    fn test_crlf_lines_are_tolerated() {
        let mut reframer = Reframer::new(UpstreamFlavor::V1);
        let events =
            reframer.push(b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\r\n");
        assert_eq!(deltas(&events), vec!["x"]);
    }
}
