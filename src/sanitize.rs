//! Removal of known-benign diagnostics from captured error output.
//!
//! Some tools write a constant warning to stderr on every invocation, whether
//! or not anything went wrong. apt is the motivating case: every call made
//! from a script prints a warning that its CLI is not stable. A
//! [`Sanitizer`] strips every occurrence of such patterns so that whatever
//! remains is a genuine error, or nothing at all.
//!
//! Stripping is a precise filter: bytes that are not part of an exact match
//! are never touched.
use std::borrow::Cow;

use serde::Deserialize;

/// The warning apt prints to stderr whenever it is invoked from a script.
pub const APT_CLI_WARNING: &[u8] =
    b"\nWARNING: apt does not have a stable CLI interface. Use with caution in scripts.\n\n";

/// A byte pattern known in advance to be benign.
#[derive(Debug, Clone)]
pub enum DiagnosticPattern {
    /// Exact byte sequence.
    Literal(Cow<'static, [u8]>),
    /// Regular expression over raw bytes.
    Regex(regex::bytes::Regex),
}

impl DiagnosticPattern {
    /// A literal pattern borrowed from static data.
    #[must_use]
    pub const fn literal(bytes: &'static [u8]) -> Self {
        Self::Literal(Cow::Borrowed(bytes))
    }

    /// Compile a regular-expression pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        regex::bytes::Regex::new(pattern).map(Self::Regex)
    }
}

/// Remove every occurrence of `pattern` from `input`.
///
/// Removal continues on the result until no occurrence remains, so
/// back-to-back repetitions and matches formed by a removal are also
/// stripped. Literals are removed first occurrence first; regex matches are
/// removed a whole scan at a time. Every round removes at least one byte,
/// bounding the loop by `input.len()`.
///
/// Running `strip` on its own output is a no-op, and input without a match
/// is returned unchanged.
#[must_use]
pub fn strip(pattern: &DiagnosticPattern, input: &[u8]) -> Vec<u8> {
    match pattern {
        DiagnosticPattern::Literal(needle) => strip_literal(needle, input),
        DiagnosticPattern::Regex(re) => strip_regex(re, input),
    }
}

/// Byte range of the first occurrence of `needle` at or after `from`.
fn find_literal(needle: &[u8], haystack: &[u8], from: usize) -> Option<(usize, usize)> {
    let tail = haystack.get(from..)?;
    if needle.is_empty() || needle.len() > tail.len() {
        return None;
    }
    tail.windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| (from + pos, from + pos + needle.len()))
}

fn strip_literal(needle: &[u8], input: &[u8]) -> Vec<u8> {
    let mut buf = input.to_vec();
    let mut from = 0;
    while let Some((start, end)) = find_literal(needle, &buf, from) {
        buf.drain(start..end);
        // Nothing before `start` matched, so only an occurrence straddling
        // the join can be new.
        from = start.saturating_sub(needle.len().saturating_sub(1));
    }
    buf
}

/// Remove all non-empty regex matches in linear passes until none is left.
///
/// A match can depend on context on either side, so there is no safe resume
/// point after a removal. Each pass removes every match in one scan instead,
/// which keeps long runs of repeated matches linear.
fn strip_regex(re: &regex::bytes::Regex, input: &[u8]) -> Vec<u8> {
    let mut buf = input.to_vec();
    loop {
        let mut out = Vec::with_capacity(buf.len());
        let mut last = 0;
        for m in re.find_iter(&buf).filter(|m| !m.is_empty()) {
            out.extend_from_slice(buf.get(last..m.start()).unwrap_or_default());
            last = m.end();
        }
        if last == 0 {
            return buf;
        }
        out.extend_from_slice(buf.get(last..).unwrap_or_default());
        buf = out;
    }
}

/// Strip `pattern` from `input`, returning `None` if nothing remains.
///
/// `None` means "no real error".
#[must_use]
pub fn sanitize(pattern: &DiagnosticPattern, input: &[u8]) -> Option<Vec<u8>> {
    let residual = strip(pattern, input);
    (!residual.is_empty()).then_some(residual)
}

/// Named, built-in benign diagnostics that configuration can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BenignNoise {
    /// apt's "does not have a stable CLI interface" warning.
    AptCliWarning,
}

impl BenignNoise {
    /// The pattern matching this diagnostic.
    #[must_use]
    pub const fn pattern(self) -> DiagnosticPattern {
        match self {
            Self::AptCliWarning => DiagnosticPattern::literal(APT_CLI_WARNING),
        }
    }
}

impl std::str::FromStr for BenignNoise {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apt-cli-warning" => Ok(Self::AptCliWarning),
            other => Err(format!("unknown benign diagnostic '{other}'")),
        }
    }
}

/// An ordered set of benign patterns applied together.
#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    patterns: Vec<DiagnosticPattern>,
}

impl Sanitizer {
    /// A sanitizer for the given patterns.
    #[must_use]
    pub const fn new(patterns: Vec<DiagnosticPattern>) -> Self {
        Self { patterns }
    }

    /// The sanitizer used for apt invocations.
    #[must_use]
    pub fn apt() -> Self {
        Self::new(vec![BenignNoise::AptCliWarning.pattern()])
    }

    /// Build a sanitizer from named built-in diagnostics.
    #[must_use]
    pub fn from_noise(noise: &[BenignNoise]) -> Self {
        Self::new(noise.iter().map(|n| n.pattern()).collect())
    }

    /// Whether the sanitizer has no patterns (and is therefore a no-op).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Strip every pattern until none of them matches any more.
    ///
    /// Removing one pattern can expose an occurrence of another, so patterns
    /// are re-applied until a full round changes nothing.
    #[must_use]
    pub fn strip(&self, input: &[u8]) -> Vec<u8> {
        let mut buf = input.to_vec();
        loop {
            let before = buf.len();
            for pattern in &self.patterns {
                buf = strip(pattern, &buf);
            }
            if buf.len() == before {
                return buf;
            }
        }
    }

    /// Strip all patterns, returning `None` if nothing remains.
    #[must_use]
    pub fn sanitize(&self, input: &[u8]) -> Option<Vec<u8>> {
        let residual = self.strip(input);
        (!residual.is_empty()).then_some(residual)
    }
}
