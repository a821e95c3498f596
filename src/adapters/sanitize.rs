//! Log sanitization for subject identifiers and other PII.
//!
//! Predictions and population scoring log subject IDs as structured fields
//! (`subject_id=P001`). The writer below rewrites every formatted log line
//! before it reaches the sink, replacing:
//! - `subject_id` / `subject` fields and bare program codes (`P0012`, `C0456`)
//! - UUIDs
//! - 16-digit national identity numbers
//! - Email addresses and phone numbers
//!
//! # Performance
//!
//! Input is capped per call (see `HEALTHTWIN_SANITIZE_MAX_BYTES`) so a huge
//! log line cannot stall the logging thread.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PII_PATTERNS: OnceLock<PiiPatterns> = OnceLock::new();

/// Defaults to 16 KiB; can be overridden via `HEALTHTWIN_SANITIZE_MAX_BYTES`.
const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct PiiPattern {
    regex: Regex,
    replacement: &'static str,
}

struct PiiPatterns {
    set: RegexSet,
    patterns: Vec<PiiPattern>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("HEALTHTWIN_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn get_patterns() -> &'static PiiPatterns {
    PII_PATTERNS.get_or_init(|| {
        // Applied in order; field patterns run before bare codes.
        let rules: Vec<(&'static str, &'static str)> = vec![
            (
                r#"(?i)\b(subject(?:_id)?)\s*[=:]\s*"?[A-Za-z0-9_.-]+"?"#,
                "${1}=[REDACTED-ID]",
            ),
            (r"\b[PC]\d{3,}\b", "[REDACTED-ID]"),
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            (r"\b\d{16}\b", "[REDACTED-NATIONAL-ID]"),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            (r"\+\d{1,3}[-.\s]?\d{2,4}[-.\s]?\d{3,4}[-.\s]?\d{3,4}\b", "[REDACTED-PHONE]"),
            (r"\b0\d{2,3}[-.\s]\d{3,4}[-.\s]\d{3,4}\b", "[REDACTED-PHONE]"),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let patterns = rules
            .into_iter()
            .map(|(pattern, replacement)| PiiPattern {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        PiiPatterns { set, patterns }
    })
}

/// Sanitize a string by replacing PII patterns.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let pattern = &patterns.patterns[idx];
        result = pattern
            .regex
            .replace_all(&result, pattern.replacement)
            .into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// A `tracing_subscriber` writer wrapper that sanitizes formatted log output
/// before it is written to the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
///
/// Each complete line is sanitized without its newline, so a truncated line
/// still ends with one.
pub struct SanitizingWriter<W> {
    inner: W,
    pending: Vec<u8>,
    max_bytes: usize,
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn new(inner: W, max_bytes: usize) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            max_bytes,
        }
    }

    fn emit(&mut self, line: &[u8]) -> std::io::Result<()> {
        let sanitized = sanitize_with_limit(&String::from_utf8_lossy(line), self.max_bytes);
        self.inner.write_all(sanitized.as_bytes())?;
        self.inner.write_all(b"\n")
    }

    fn emit_complete_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            self.emit(&line)?;
        }
        Ok(())
    }

    fn emit_pending(&mut self) -> std::io::Result<()> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.emit(&line)?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.emit_complete_lines()?;

        // Unterminated output is cut into lines past twice the limit.
        if self.pending.len() > self.max_bytes.saturating_mul(2) {
            self.emit_pending()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.emit_complete_lines()?;
        self.emit_pending()?;
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer(), max_sanitize_bytes())
    }
}
