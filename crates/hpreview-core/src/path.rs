//! The dot-path grammar shared by noise stripping, change extraction and the
//! regex-based risk classifiers.
//!
//! A path is a sequence of segments: a map key (`identifier`) or a sequence
//! index (`[i]`), written as `a.b[3].c`. Inside a noise-pattern segment a
//! literal dot is written `\.` so that `metadata.annotations.meta\.helm\.sh/*`
//! names one annotation key (`meta.helm.sh/*`), not three more path levels.

/// One step into a [`serde_json::Value`] tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Render a segment sequence as the dotted/bracketed form used in
/// `FieldChange::path` (`a.b[3].c`).
pub fn format_path(segments: &[Segment]) -> String {
    let mut out = String::new();
    for seg in segments {
        match seg {
            Segment::Key(k) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(k);
            }
            Segment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
        }
    }
    out
}

/// A noise-pattern's last segment, after un-escaping `\.`.
enum LastSegment {
    Exact(String),
    /// Prefix before a trailing `*`.
    Prefix(String),
}

/// A parsed noise pattern: a path of plain map-key segments, the last of
/// which may be an exact literal or a wildcarded prefix.
pub struct NoisePattern {
    prefix_keys: Vec<String>,
    last: LastSegment,
}

impl NoisePattern {
    /// Parse a noise-pattern string (e.g. `metadata.annotations.meta\.helm\.sh/*`).
    ///
    /// Splits on unescaped `.`; `\.` inside a segment is unescaped to a
    /// literal `.` in that segment's text. A trailing unescaped `*` on the
    /// final segment marks it as a prefix match.
    pub fn parse(pattern: &str) -> Self {
        let raw_segments = split_unescaped_dots(pattern);
        let mut segments: Vec<String> = raw_segments.iter().map(|s| unescape(s)).collect();
        let last_raw = segments.pop().unwrap_or_default();
        let last = if let Some(prefix) = last_raw.strip_suffix('*') {
            LastSegment::Prefix(prefix.to_string())
        } else {
            LastSegment::Exact(last_raw)
        };
        Self {
            prefix_keys: segments,
            last,
        }
    }

    pub fn prefix_keys(&self) -> &[String] {
        &self.prefix_keys
    }

    /// Does `key` (the last map key encountered while walking the pattern's
    /// navigation prefix) satisfy this pattern's final segment?
    pub fn matches_last(&self, key: &str) -> bool {
        match &self.last {
            LastSegment::Exact(s) => s == key,
            LastSegment::Prefix(p) => key.starts_with(p.as_str()),
        }
    }

    /// True when the final segment has no nested keys of its own to
    /// navigate into, i.e. this pattern names a single map entry to drop.
    pub fn is_leaf_removal(&self) -> bool {
        true
    }
}

fn split_unescaped_dots(s: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                current.push('\\');
                current.push(next);
                chars.next();
                continue;
            }
        }
        if c == '.' {
            segments.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    segments.push(current);
    segments
}

fn unescape(segment: &str) -> String {
    segment.replace("\\.", ".")
}
