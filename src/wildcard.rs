//! Wildcard expansion against the runtime shape of a node.
//!
//! `expand` turns one level of a field list into concrete fields for one node.
//! Nested lists are expanded later, per child, when the projector descends
//! into them, so siblings of different shapes expand independently.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use serde_json::Value;
use tracing::debug;

use crate::field::{has_wildcard, Field, FieldSpec, WILDCARD};
use crate::path;

/// A wildcard-free field for one node.
#[derive(Debug, Clone)]
pub struct ExpandedField<'s> {
    /// Concrete source key (no `*` left, unless expansion degraded).
    pub key: String,
    /// Configuration to apply; `None` for a verbatim copy.
    pub field: Option<&'s Field>,
}

impl<'s> ExpandedField<'s> {
    fn from_spec(spec: &'s FieldSpec) -> Self {
        ExpandedField {
            key: spec.key().to_string(),
            field: spec.descriptor(),
        }
    }

    /// Key the value is written under, before key formatting.
    pub fn output_key(&self) -> &str {
        match self.field {
            Some(field) => field.new_key.as_deref().unwrap_or(&self.key),
            None => &self.key,
        }
    }
}

enum Slot<'s> {
    Explicit(&'s FieldSpec),
    Enumerated(&'s FieldSpec, Vec<String>),
}

/// Expand `fields` against `node`.
///
/// An explicit field whose key is also produced by a wildcard replaces the
/// wildcard's entry at the wildcard's position and is emitted once; explicit
/// fields no wildcard reaches keep their declared position.
pub fn expand<'s>(fields: &'s [FieldSpec], node: &Value) -> Vec<ExpandedField<'s>> {
    let slots: Vec<Slot<'s>> = fields
        .iter()
        .map(|spec| {
            if has_wildcard(spec.key()) {
                let omit = spec.descriptor().map(|f| f.omit.as_slice()).unwrap_or(&[]);
                Slot::Enumerated(spec, enumerate(spec.key(), node, omit))
            } else {
                Slot::Explicit(spec)
            }
        })
        .collect();

    let mut explicit: HashMap<&str, usize> = HashMap::new();
    for (idx, slot) in slots.iter().enumerate() {
        if let Slot::Explicit(spec) = slot {
            explicit.entry(spec.key()).or_insert(idx);
        }
    }

    let claimed: HashSet<usize> = slots
        .iter()
        .filter_map(|slot| match slot {
            Slot::Enumerated(_, keys) => Some(keys),
            Slot::Explicit(_) => None,
        })
        .flatten()
        .filter_map(|key| explicit.get(key.as_str()).copied())
        .collect();

    let mut emitted_explicit: HashSet<usize> = HashSet::new();
    let mut emitted_keys: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for (idx, slot) in slots.iter().enumerate() {
        match *slot {
            Slot::Explicit(spec) => {
                if !claimed.contains(&idx) {
                    out.push(ExpandedField::from_spec(spec));
                }
            }
            Slot::Enumerated(spec, ref keys) => {
                for key in keys {
                    if let Some(&owner) = explicit.get(key.as_str()) {
                        if emitted_explicit.insert(owner) {
                            if let Slot::Explicit(owner_spec) = slots[owner] {
                                out.push(ExpandedField::from_spec(owner_spec));
                            }
                        }
                        continue;
                    }
                    if emitted_keys.insert(key.clone()) {
                        out.push(ExpandedField {
                            key: key.clone(),
                            field: spec.descriptor(),
                        });
                    }
                }
            }
        }
    }
    out
}

/// Concrete keys for a wildcard key at `node`. Degrades to the literal key
/// when the value before the first wildcard cannot be enumerated.
fn enumerate(key: &str, node: &Value, omit: &[String]) -> Vec<String> {
    let segments: Vec<&str> = key.split('.').collect();
    let Some(star) = segments.iter().position(|s| *s == WILDCARD) else {
        return vec![key.to_string()];
    };
    let prefix = segments[..star].join(".");
    let rest = segments[star + 1..].join(".");

    let base = if prefix.is_empty() {
        Some(node)
    } else {
        path::get(node, &prefix)
    };
    let found: Vec<String> = match base {
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        Some(Value::Array(items)) if prefix.is_empty() => (0..items.len()).map(|i| i.to_string()).collect(),
        _ => {
            debug!(key, "wildcard source is not a map; keeping the key as written");
            return vec![key.to_string()];
        }
    };

    found
        .into_iter()
        .filter_map(|segment| {
            let quoted = path::quote_key(&segment);
            let concrete = [prefix.as_str(), quoted.as_ref(), rest.as_str()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .join(".");
            let omitted = omit.iter().any(|o| *o == segment || *o == concrete);
            (!omitted).then_some(concrete)
        })
        .flat_map(|concrete| {
            if has_wildcard(&concrete) {
                enumerate(&concrete, node, omit)
            } else {
                vec![concrete]
            }
        })
        .collect()
}
