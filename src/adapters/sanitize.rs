//! Log redaction for protected health information.
//!
//! Service URLs may carry credentials and free-text errors may echo patient
//! identifiers. Everything the subscriber formats is passed through
//! [`redact`] one line at a time before reaching the sink:
//! - Medical record numbers
//! - UUIDs
//! - Email addresses and phone numbers
//! - URL userinfo and `token=`/`key=` style query secrets
//!
//! Input longer than `NEORISK_SANITIZE_MAX_BYTES` (default 16 KiB) is truncated
//! before matching.

use std::io::Write;
use std::sync::OnceLock;

use regex::{Regex, RegexSet};
use tracing_subscriber::fmt::MakeWriter;

const DEFAULT_MAX_BYTES: usize = 16 * 1024;

const MAX_BYTES_ENV: &str = "NEORISK_SANITIZE_MAX_BYTES";

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

struct Rules {
    any: RegexSet,
    rules: Vec<Rule>,
}

static RULES: OnceLock<Rules> = OnceLock::new();

// Order matters: URL secrets before emails.
const PATTERNS: [(&str, &str); 6] = [
    (r"(?i)\bMRN[:#\s]?\s*\d{5,10}\b", "[REDACTED-MRN]"),
    (
        r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
        "[REDACTED-UUID]",
    ),
    (r"(?i)(https?://)[^/\s:@]+:[^/\s@]+@", "${1}[REDACTED-USERINFO]@"),
    (
        r"(?i)\b(token|api[_-]?key|key|secret|password)=[^&\s]+",
        "${1}=[REDACTED-SECRET]",
    ),
    (
        r"(?i)\b[a-z0-9][a-z0-9._%+-]{0,62}@(?:[a-z0-9-]{1,63}\.)+[a-z]{2,}\b",
        "[REDACTED-EMAIL]",
    ),
    (
        r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b",
        "[REDACTED-PHONE]",
    ),
];

fn rules() -> &'static Rules {
    RULES.get_or_init(|| {
        let any = RegexSet::new(PATTERNS.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = PATTERNS
            .iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();
        Rules { any, rules }
    })
}

fn max_bytes() -> usize {
    std::env::var(MAX_BYTES_ENV)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_MAX_BYTES)
}

fn truncate_at_char_boundary(input: &str, limit: usize) -> (&str, bool) {
    if input.len() <= limit {
        return (input, false);
    }
    let mut end = limit;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Replace PHI patterns in `input`.
#[must_use]
pub fn redact(input: &str) -> String {
    redact_with_limit(input, max_bytes())
}

fn redact_with_limit(input: &str, limit: usize) -> String {
    let rules = rules();
    let (prefix, truncated) = truncate_at_char_boundary(input, limit);

    let mut out = if rules.any.is_match(prefix) {
        let mut text = prefix.to_string();
        for rule in &rules.rules {
            text = rule.regex.replace_all(&text, rule.replacement).into_owned();
        }
        text
    } else {
        prefix.to_string()
    };

    if truncated {
        out.push_str(" [TRUNCATED]");
    }
    out
}

/// Whether `input` contains anything [`redact`] would replace.
#[must_use]
pub fn contains_phi(input: &str) -> bool {
    let (prefix, _) = truncate_at_char_boundary(input, max_bytes());
    rules().any.is_match(prefix)
}

/// `MakeWriter` wrapper that redacts each formatted log line.
#[derive(Debug, Clone)]
pub struct RedactingMakeWriter<M> {
    inner: M,
}

impl<M> RedactingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
            pending: Vec::new(),
        }
    }
}

/// Line-buffering writer produced by [`RedactingMakeWriter`].
pub struct RedactingWriter<W: Write> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> RedactingWriter<W> {
    fn write_complete_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.inner
                .write_all(redact(&String::from_utf8_lossy(&line)).as_bytes())?;
        }
        Ok(())
    }

    fn write_remainder(&mut self) -> std::io::Result<()> {
        if !self.pending.is_empty() {
            let rest = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            self.inner.write_all(redact(&rest).as_bytes())?;
        }
        Ok(())
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.write_complete_lines()?;

        // A line with no newline must not grow without bound.
        if self.pending.len() > max_bytes().saturating_mul(2) {
            self.write_remainder()?;
            self.inner.write_all(b"\n")?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.write_complete_lines()?;
        self.write_remainder()?;
        self.inner.flush()
    }
}

impl<W: Write> Drop for RedactingWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
