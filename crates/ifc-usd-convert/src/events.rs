// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Progress and diagnostic events
//!
//! Events serialize as one JSON object with a `type` tag, e.g.
//! `{"type":"progress","percentage":40,"message":"Processing elements..."}`.

use serde::{Deserialize, Serialize};
use std::io::Write;

/// Discrete event on the progress stream
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent {
    Progress { percentage: u8, message: String },
    Warning { message: String },
    Error { message: String },
    Success { output: String },
}

impl ProgressEvent {
    pub fn progress(percentage: u8, message: impl Into<String>) -> Self {
        ProgressEvent::Progress {
            percentage: percentage.min(100),
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        ProgressEvent::Warning {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ProgressEvent::Error {
            message: message.into(),
        }
    }

    pub fn success(output: impl Into<String>) -> Self {
        ProgressEvent::Success {
            output: output.into(),
        }
    }

    /// Single-line JSON form
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Consumer of progress events
pub trait ProgressSink {
    fn emit(&mut self, event: ProgressEvent);

    fn progress(&mut self, percentage: u8, message: &str) {
        self.emit(ProgressEvent::progress(percentage, message));
    }

    fn warning(&mut self, message: &str) {
        self.emit(ProgressEvent::warning(message));
    }
}

/// Collects events in memory
impl ProgressSink for Vec<ProgressEvent> {
    fn emit(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}

/// Discards every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&mut self, _event: ProgressEvent) {}
}

/// Writes each event as a JSON line and flushes it immediately
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ProgressSink for JsonLinesSink<W> {
    fn emit(&mut self, event: ProgressEvent) {
        let line = event.to_json();
        if let Err(e) = writeln!(self.writer, "{}", line).and_then(|_| self.writer.flush()) {
            log::warn!("Failed to write progress event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        assert_eq!(
            ProgressEvent::progress(40, "Processing elements...").to_json(),
            r#"{"type":"progress","percentage":40,"message":"Processing elements..."}"#
        );
        assert_eq!(
            ProgressEvent::success("out.usda").to_json(),
            r#"{"type":"success","output":"out.usda"}"#
        );
        assert_eq!(
            ProgressEvent::error("Error opening IFC: x").to_json(),
            r#"{"type":"error","message":"Error opening IFC: x"}"#
        );
    }

    #[test]
    fn test_events_parse_back() {
        let event: ProgressEvent =
            serde_json::from_str(r#"{"type":"warning","message":"skipped"}"#).unwrap();
        assert_eq!(event, ProgressEvent::warning("skipped"));
    }

    #[test]
    fn test_json_lines_sink() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.progress(0, "Starting conversion...");
        sink.warning("no geometry");

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(r#""percentage":0"#));
        assert!(lines[1].starts_with(r#"{"type":"warning""#));
    }

    #[test]
    fn test_percentage_is_capped() {
        assert_eq!(
            ProgressEvent::progress(120, "done"),
            ProgressEvent::Progress {
                percentage: 100,
                message: "done".into()
            }
        );
    }
}
