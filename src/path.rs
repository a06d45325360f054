//! Dotted / bracket path access over `serde_json::Value`.
//!
//! Paths look like `user.profile.name`, `items[0].id` or `meta['x.y']`.
//! Bare segments are always map keys (`"007"` stays `"007"`); on a sequence a
//! bare segment in canonical decimal form (`items.0`) reads that position.
//! Only bracketed numbers (`[2]`) are true indices and may create arrays.

use std::borrow::Cow;
use std::fmt::Write;

use serde_json::{Map, Value};
use tracing::debug;

use crate::parser::{ParseError, Parser};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    fn bracketed(raw: &str) -> Segment {
        match index_of(raw) {
            Some(i) => Segment::Index(i),
            None => Segment::Key(raw.to_string()),
        }
    }

    fn to_key(&self) -> String {
        match self {
            Segment::Key(k) => k.clone(),
            Segment::Index(i) => i.to_string(),
        }
    }
}

/// `Some(i)` only when `raw` is exactly `i` written in decimal (no sign,
/// no leading zeros).
fn index_of(raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok().filter(|i| i.to_string() == raw)
}

/// `key` as a single path segment, bracket-quoted when it would otherwise be
/// split or read as a wildcard.
pub fn quote_key(key: &str) -> Cow<'_, str> {
    let plain = !key.is_empty()
        && !key.chars().any(|c| matches!(c, '.' | '[' | ']' | '\'' | '"' | '*'));
    if plain {
        return Cow::Borrowed(key);
    }
    let escaped = key.replace('\\', "\\\\").replace('\'', "\\'");
    Cow::Owned(format!("['{escaped}']"))
}

/// Inverse of `parse_path`.
pub fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Index(i) => {
                let _ = write!(out, "[{i}]");
            }
            Segment::Key(k) => {
                let key = quote_key(k);
                if !out.is_empty() && !key.starts_with('[') {
                    out.push('.');
                }
                out.push_str(&key);
            }
        }
    }
    out
}

/// Tokenize a path. Empty segments (`a..b`, leading dots) are skipped.
pub fn parse_path(path: &str) -> Result<Vec<Segment>, ParseError> {
    let mut p = Parser::new(path);
    let mut segments = Vec::new();
    while !p.eof() {
        if p.consume_char('.') {
            continue;
        }
        if p.consume_char('[') {
            p.skip_ws();
            if p.peek_char() == Some('\'') || p.peek_char() == Some('"') {
                let key = p.parse_quoted_string()?;
                p.skip_ws();
                p.expect(']')?;
                segments.push(Segment::Key(key));
                continue;
            }
            let inner = p.capture_until(']')?.trim();
            p.expect(']')?;
            if !inner.is_empty() {
                segments.push(Segment::bracketed(inner));
            }
            continue;
        }
        let raw = p.parse_segment();
        if !raw.is_empty() {
            segments.push(Segment::Key(raw.to_string()));
        }
    }
    Ok(segments)
}

/// Resolve `path` against `root`.
///
/// Returns `None` when any segment misses, when an intermediate value is null,
/// or when the path names nothing but the root itself (e.g. `"."`). An empty
/// path resolves to `root`. A null leaf is returned as `Some(Value::Null)`.
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.trim().is_empty() {
        return Some(root);
    }
    let segments = match parse_path(path) {
        Ok(segments) => segments,
        Err(err) => {
            debug!(path, %err, "unreadable path treated as a miss");
            return None;
        }
    };
    let found = get_segments(root, &segments)?;
    if std::ptr::eq(found, root) {
        return None;
    }
    Some(found)
}

/// `get` with a fallback for misses.
pub fn get_or<'a>(root: &'a Value, path: &str, default: &'a Value) -> &'a Value {
    get(root, path).unwrap_or(default)
}

pub fn get_segments<'a>(root: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |current, segment| step(current, segment))
}

fn step<'a>(current: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match (current, segment) {
        (Value::Object(map), Segment::Key(k)) => map.get(k),
        (Value::Object(map), Segment::Index(i)) => map.get(&i.to_string()),
        (Value::Array(items), Segment::Index(i)) => items.get(*i),
        (Value::Array(items), Segment::Key(k)) => index_of(k).and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Write `value` at `path`, creating intermediate objects (arrays only for
/// bracketed indices) and replacing scalars that are in the way. A segment
/// with no slot (a key into a sequence, an index past `usize::MAX`) leaves
/// the value untouched.
pub fn set(root: &mut Value, path: &str, value: Value) {
    match parse_path(path) {
        Ok(segments) => set_segments(root, &segments, value),
        Err(err) => debug!(path, %err, "unreadable path, nothing written"),
    }
}

pub fn set_segments(root: &mut Value, segments: &[Segment], value: Value) {
    let mut current = root;
    for segment in segments {
        current = match slot(current, segment) {
            Some(next) => next,
            None => {
                debug!(?segment, "no slot for segment, nothing written");
                return;
            }
        };
    }
    *current = value;
}

fn slot<'v>(current: &'v mut Value, segment: &Segment) -> Option<&'v mut Value> {
    match (current, segment) {
        (Value::Object(map), segment) => Some(map.entry(segment.to_key()).or_insert(Value::Null)),
        (Value::Array(items), Segment::Index(i)) => {
            let len = i.checked_add(1)?;
            if items.len() < len {
                items.resize(len, Value::Null);
            }
            items.get_mut(*i)
        }
        // existing positions only; a bare key never grows a sequence
        (Value::Array(items), Segment::Key(k)) => index_of(k).and_then(|i| items.get_mut(i)),
        (other, segment) => {
            *other = match segment {
                Segment::Index(_) => Value::Array(Vec::new()),
                Segment::Key(_) => Value::Object(Map::new()),
            };
            slot(other, segment)
        }
    }
}
