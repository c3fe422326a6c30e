//! Newline-delimited JSON progress streams (pull and create).
//!
//! Each line is decoded on its own. A line that is not valid JSON is logged and
//! skipped; it never aborts the stream.

use futures_util::{Stream, StreamExt};
use serde::Deserialize;

use crate::error::{Error, Result};

/// A single stream line could not be decoded.
#[derive(Debug, thiserror::Error)]
#[error("malformed stream line {line:?}: {source}")]
pub struct StreamParseError {
    line: String,
    #[source]
    source: serde_json::Error,
}

/// One decoded progress line.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProgressLine {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub completed: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProgressLine {
    pub fn parse(line: &str) -> std::result::Result<Self, StreamParseError> {
        serde_json::from_str(line).map_err(|source| StreamParseError {
            line: line.to_string(),
            source,
        })
    }

    /// `round(completed / total * 100)`, when both counters are present.
    pub fn percent(&self) -> Option<u8> {
        match (self.completed, self.total) {
            (Some(completed), Some(total)) if total > 0.0 && completed.is_finite() => {
                Some((completed / total * 100.0).round().clamp(0.0, 100.0) as u8)
            }
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// Turns progress lines into a non-decreasing sequence of percentages.
///
/// The server restarts its counters for every layer it downloads; values below
/// the last delivered one are dropped.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: Option<u8>,
}

impl ProgressTracker {
    pub fn observe(&mut self, line: &ProgressLine) -> Option<u8> {
        if line.is_success() {
            self.last = Some(100);
            return Some(100);
        }

        let percent = line.percent()?;
        if self.last.map_or(true, |last| percent >= last) {
            self.last = Some(percent);
            Some(percent)
        } else {
            None
        }
    }
}

/// Splits a byte stream into lines, holding back any incomplete trailing line.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(line) = decode_line(&raw) {
                lines.push(line);
            }
        }
        lines
    }

    /// The unterminated remainder, if any.
    pub fn finish(self) -> Option<String> {
        decode_line(&self.pending)
    }
}

fn decode_line(raw: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(raw).trim().to_string();
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

/// Feed every decodable line of `body` to `on_line`, in arrival order.
///
/// Fails with `Network` if the stream breaks or carries no bytes at all, and
/// with `Remote` if a line reports an `error`.
pub(crate) async fn read_progress<S, B, E, F>(body: S, mut on_line: F) -> Result<()>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    F: FnMut(ProgressLine),
{
    let mut body = std::pin::pin!(body);
    let mut buffer = LineBuffer::default();
    let mut received = false;

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| Error::Network(format!("stream interrupted: {}", e)))?;
        let bytes = chunk.as_ref();
        received |= !bytes.is_empty();

        for line in buffer.push(bytes) {
            dispatch(&line, &mut on_line)?;
        }
    }

    if let Some(line) = buffer.finish() {
        dispatch(&line, &mut on_line)?;
    }

    if !received {
        return Err(Error::Network("response body was empty".to_string()));
    }
    Ok(())
}

fn dispatch<F: FnMut(ProgressLine)>(line: &str, on_line: &mut F) -> Result<()> {
    match ProgressLine::parse(line) {
        Ok(progress) => {
            if let Some(message) = &progress.error {
                return Err(Error::Remote(message.clone()));
            }
            on_line(progress);
            Ok(())
        }
        Err(e) => {
            tracing::warn!("Skipping {}", e);
            Ok(())
        }
    }
}
