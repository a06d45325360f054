//! Recursive walk of a field list over a node.

use serde_json::{Map, Value};

use crate::context::{Context, TransformOptions};
use crate::field::{Field, FieldSpec, Filter};
use crate::functions::MappingArgs;
use crate::{invoker, path, wildcard};

static NULL: Value = Value::Null;

/// Null, `{}` and `[]` count as empty.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn is_missing_or_empty(value: Option<&Value>) -> bool {
    value.map_or(true, is_empty)
}

/// State for one projection pass. Holds read-only references only.
pub(crate) struct Projector<'r> {
    root: &'r Value,
    context: &'r Context,
    options: &'r TransformOptions,
}

impl<'r> Projector<'r> {
    pub(crate) fn new(root: &'r Value, context: &'r Context, options: &'r TransformOptions) -> Self {
        Self { root, context, options }
    }

    pub(crate) fn project(&self, fields: &[FieldSpec], node: &Value, parent: Option<&Value>) -> Value {
        if is_empty(node) {
            return Value::Null;
        }
        let mut output = Value::Object(Map::new());
        for expanded in wildcard::expand(fields, node) {
            let out_key = self.options.format_key(expanded.output_key());
            let Some(field) = expanded.field else {
                if let Some(value) = path::get(node, &expanded.key) {
                    path::set(&mut output, &out_key, value.clone());
                }
                continue;
            };
            let result = if field.is_passthrough() {
                self.copy(field, path::get(node, &expanded.key))
            } else {
                self.compute(field, &expanded.key, node, parent, &output)
            };
            place(&mut output, field, &out_key, result);
        }
        output
    }

    fn copy(&self, field: &Field, value: Option<&Value>) -> Option<Value> {
        match (&field.default, value) {
            (Some(default), v) if is_missing_or_empty(v) => Some(default.resolve(self.context)),
            (_, v) => v.cloned(),
        }
    }

    fn compute(
        &self,
        field: &Field,
        key: &str,
        node: &Value,
        parent: Option<&Value>,
        output: &Value,
    ) -> Option<Value> {
        let source = match &field.path {
            Some(p) => path::get(self.root, p),
            None => path::get(node, key),
        };
        let scoped = field
            .scope
            .as_deref()
            .map(|scope| path::get(self.root, scope));
        // scope redirects what the mapping and nested fields read, nothing else
        let nested_source = match (&field.fields, scoped) {
            (Some(_), Some(scoped)) => scoped,
            _ => source,
        };

        if is_missing_or_empty(nested_source) && field.mapping.is_none() {
            return field.default.as_ref().map(|d| d.resolve(self.context));
        }

        let mapped = field.mapping.as_deref().and_then(|mapping| {
            let args = MappingArgs {
                model: scoped.map_or(node, |s| s.unwrap_or(&NULL)),
                value: source,
                key,
                output,
                parent,
                root: self.root,
                context: self.context,
            };
            invoker::invoke(mapping, &args)
        });

        match (&field.fields, &field.mapping) {
            (Some(nested), _) => {
                let nested = nested.resolve(self.context);
                let filter = field.filter.as_ref();
                match mapped.filter(|v| !v.is_null()) {
                    // nested parent: the enclosing parent with the result under `key`
                    Some(result) => {
                        let mut merged = parent.and_then(Value::as_object).cloned().unwrap_or_default();
                        merged.insert(key.to_string(), result);
                        let merged = Value::Object(merged);
                        let recursive = merged.get(key).unwrap_or(&NULL);
                        Some(self.project_source(&nested, recursive, filter, &merged))
                    }
                    None => Some(self.project_source(&nested, nested_source?, filter, node)),
                }
            }
            (None, Some(_)) => mapped,
            (None, None) => source.map(|v| filtered(v, field.filter.as_ref())),
        }
    }

    /// Sequences are filtered and projected element by element, in order.
    fn project_source(
        &self,
        nested: &[FieldSpec],
        source: &Value,
        filter: Option<&Filter>,
        node: &Value,
    ) -> Value {
        match source {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .filter(|item| filter.map_or(true, |f| f.accepts(item)))
                    .map(|item| self.project(nested, item, Some(node)))
                    .collect(),
            ),
            other => self.project(nested, other, Some(node)),
        }
    }
}

fn filtered(value: &Value, filter: Option<&Filter>) -> Value {
    match (value, filter) {
        (Value::Array(items), Some(filter)) => {
            Value::Array(items.iter().filter(|item| filter.accepts(item)).cloned().collect())
        }
        _ => value.clone(),
    }
}

/// `None` leaves the key out; `Some(Null)` writes an explicit null.
fn place(output: &mut Value, field: &Field, out_key: &str, result: Option<Value>) {
    match result {
        None => {}
        Some(Value::Object(entries)) if field.merge => {
            if let Value::Object(out) = output {
                out.extend(entries);
            }
        }
        Some(value) => path::set(output, out_key, value),
    }
}
