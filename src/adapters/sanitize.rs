//! Log sanitization for user identifiers and credentials.
//!
//! Scoring requests carry a user identifier and arrive over HTTP, where
//! headers and bodies may contain contact details or bearer tokens. All
//! formatted log output goes through [`SanitizingMakeWriter`], which
//! rewrites each line before it reaches the sink:
//! - `user_id=...` structured fields
//! - email addresses and phone numbers
//! - bearer tokens, JWTs and `key=value` style secrets
//!
//! Input is capped at `PULSEWATCH_SANITIZE_MAX_BYTES` (16 KiB by default)
//! per line.

use std::io::Write;
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_MAX_BYTES: usize = 16 * 1024;

const MAX_BYTES_ENV: &str = "PULSEWATCH_SANITIZE_MAX_BYTES";

/// Pattern / replacement pairs, applied in order.
const RULES: [(&str, &str); 6] = [
    (
        r#"\buser_id=(?:"[^"]*"|\S+)"#,
        "user_id=[REDACTED-USER]",
    ),
    (
        r"(?i)\bbearer\s+[A-Za-z0-9._~+/-]+=*",
        "Bearer [REDACTED-TOKEN]",
    ),
    (
        r"\beyJ[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}\b",
        "[REDACTED-JWT]",
    ),
    (
        r"(?i)\b(?:api[_-]?key|token|secret|password)\b\s*[:=]\s*\S{8,}",
        "[REDACTED-SECRET]",
    ),
    (
        r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (
        r"\b(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s][0-9]{3}[-.\s][0-9]{4}\b",
        "[REDACTED-PHONE]",
    ),
];

struct Redactor {
    any: RegexSet,
    rules: Vec<(Regex, &'static str)>,
}

impl Redactor {
    fn get() -> &'static Redactor {
        static REDACTOR: OnceLock<Redactor> = OnceLock::new();
        REDACTOR.get_or_init(|| Redactor {
            any: RegexSet::new(RULES.iter().map(|(p, _)| *p)).expect("Valid redaction patterns"),
            rules: RULES
                .iter()
                .map(|(p, r)| (Regex::new(p).expect("Valid redaction pattern"), *r))
                .collect(),
        })
    }

    fn redact(&self, input: &str) -> String {
        let hits = self.any.matches(input);
        if !hits.matched_any() {
            return input.to_string();
        }

        let mut out = input.to_string();
        for idx in hits.iter() {
            let (regex, replacement) = &self.rules[idx];
            out = regex.replace_all(&out, *replacement).into_owned();
        }
        out
    }
}

fn max_bytes() -> usize {
    std::env::var(MAX_BYTES_ENV)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_MAX_BYTES)
}

/// Longest prefix of `input` no larger than `limit` bytes that ends on a char boundary.
fn clip(input: &str, limit: usize) -> (&str, bool) {
    if input.len() <= limit {
        return (input, false);
    }
    let mut end = limit;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact user identifiers, contact details and credentials from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_bytes())
}

fn sanitize_with_limit(input: &str, limit: usize) -> String {
    // The line terminator survives clipping so the next line starts fresh.
    let body = input.trim_end_matches(['\r', '\n']);
    let terminator = &input[body.len()..];

    let (head, clipped) = clip(body, limit);
    let mut out = Redactor::get().redact(head);
    if clipped {
        out.push_str(" [TRUNCATED]");
    }
    out.push_str(terminator);
    out
}

/// `MakeWriter` that sanitizes each formatted log line before passing it on.
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

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            pending: Vec::new(),
        }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
///
/// Unterminated output is sanitized and written on flush or drop.
pub struct SanitizingWriter<W: Write> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> SanitizingWriter<W> {
    fn emit(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.inner.write_all(sanitize(&text).as_bytes())
    }

    fn drain_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&line)?;
        }
        Ok(())
    }
}

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.drain_lines()?;

        // A single line with no newline must not grow without bound.
        if self.pending.len() > max_bytes().saturating_mul(2) {
            let line = std::mem::take(&mut self.pending);
            self.emit(&line)?;
            self.inner.write_all(b"\n")?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.drain_lines()?;
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.emit(&rest)?;
        }
        self.inner.flush()
    }
}

impl<W: Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
