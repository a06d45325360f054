use std::borrow::Cow;

use serde_json::{Map, Value};
use tracing::debug;

use crate::context::{Context, TransformOptions};
use crate::errors::Result;
use crate::field::{has_wildcard, resolve_fields, validate_fields, FieldSpec};
use crate::path;
use crate::projector::Projector;

/// =========================
/// Public API (projection)
/// =========================

/// Result of one `transform` call.
#[derive(Debug)]
pub struct Transformed<'a> {
    pub value: Value,
    fields: Cow<'a, [FieldSpec]>,
    context: &'a Context,
    options: &'a TransformOptions,
}

impl Transformed<'_> {
    /// Placeholder with the same shape as a projection of these fields, every
    /// leaf set to its default or null. Useful before any data has arrived.
    pub fn empty(&self) -> Value {
        empty_value(&self.fields, self.context, self.options)
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

/// Project `model` through `fields`.
///
/// Dynamic field lists are computed from `context` first, then the whole
/// field tree is validated; an invalid field aborts the call before any
/// projection work. A sequence `model` is projected element by element, each
/// element acting as its own root.
pub fn transform<'a>(
    model: &Value,
    fields: &'a [FieldSpec],
    context: &'a Context,
    options: &'a TransformOptions,
) -> Result<Transformed<'a>> {
    let fields = resolve_fields(fields, context);
    validate_fields(&fields)?;
    let value = project_model(model, &fields, context, options);
    Ok(Transformed { value, fields, context, options })
}

/// What the request layer does with a parsed response body: apply the
/// `scope` pre-extraction, then project (arrays element by element). Without
/// fields the scoped body is returned untouched.
pub fn transform_response(
    response: &Value,
    fields: Option<&[FieldSpec]>,
    context: &Context,
    options: &TransformOptions,
) -> Result<Value> {
    let fields = fields.map(|fields| resolve_fields(fields, context));
    if let Some(fields) = &fields {
        validate_fields(fields)?;
    }
    Ok(project_response(response, fields.as_deref(), context, options))
}

pub(crate) fn project_response(
    response: &Value,
    fields: Option<&[FieldSpec]>,
    context: &Context,
    options: &TransformOptions,
) -> Value {
    let missing = Value::Null;
    let body = match options.scope.as_deref() {
        Some(scope) => path::get(response, scope).unwrap_or(&missing),
        None => response,
    };
    match fields {
        Some(fields) => project_model(body, fields, context, options),
        None => body.clone(),
    }
}

pub(crate) fn project_model(
    model: &Value,
    fields: &[FieldSpec],
    context: &Context,
    options: &TransformOptions,
) -> Value {
    debug!(fields = fields.len(), "projecting model");
    match model {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| Projector::new(item, context, options).project(fields, item, None))
                .collect(),
        ),
        other => Projector::new(other, context, options).project(fields, other, None),
    }
}

/// Wildcard fields are skipped: without data there is nothing to enumerate.
pub(crate) fn empty_value(fields: &[FieldSpec], context: &Context, options: &TransformOptions) -> Value {
    let mut out = Value::Object(Map::new());
    for spec in fields.iter().filter(|spec| !has_wildcard(spec.key())) {
        let key = options.format_key(spec.output_key());
        let Some(field) = spec.descriptor() else {
            path::set(&mut out, &key, Value::Null);
            continue;
        };
        let placeholder = match (field.nested(), &field.default) {
            (_, Some(default)) => default.resolve(context),
            (Some(nested), None) => empty_value(&nested.resolve(context), context, options),
            (None, None) => Value::Null,
        };
        match placeholder {
            Value::Object(entries) if field.merge => {
                if let Value::Object(map) = &mut out {
                    map.extend(entries);
                }
            }
            value => path::set(&mut out, &key, value),
        }
    }
    out
}
