//! Field specifications: what to keep, rename, recompute or nest.
//!
//! A field is either a plain key (`"name"`, `"data.*.name"`) or a [`Field`]
//! descriptor built with the chained setters below. Field trees are pure
//! descriptions and can be reused across any number of `transform` calls.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::context::Context;
use crate::errors::{Result, TransformError};
use crate::filter::{self, FilterExpr};
use crate::functions::{Mapping, MappingArgs, MappingResult, Registry};
use crate::path;

pub const WILDCARD: &str = "*";

#[derive(Clone, Debug)]
pub enum FieldSpec {
    Key(String),
    Field(Box<Field>),
}

impl FieldSpec {
    /// The source key (may contain wildcard segments).
    pub fn key(&self) -> &str {
        match self {
            FieldSpec::Key(key) => key,
            FieldSpec::Field(field) => &field.key,
        }
    }

    /// Key the field is written under, before key formatting.
    pub fn output_key(&self) -> &str {
        match self {
            FieldSpec::Key(key) => key,
            FieldSpec::Field(field) => field.output_key(),
        }
    }

    pub fn descriptor(&self) -> Option<&Field> {
        match self {
            FieldSpec::Key(_) => None,
            FieldSpec::Field(field) => Some(field),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            FieldSpec::Key(key) => check_key(key),
            FieldSpec::Field(field) => field.validate(),
        }
    }

    fn is_dynamic(&self) -> bool {
        self.descriptor()
            .and_then(|field| field.fields.as_ref())
            .is_some_and(Fields::is_dynamic)
    }
}

impl From<&str> for FieldSpec {
    fn from(key: &str) -> Self {
        FieldSpec::Key(key.to_string())
    }
}

impl From<String> for FieldSpec {
    fn from(key: String) -> Self {
        FieldSpec::Key(key)
    }
}

impl From<Field> for FieldSpec {
    fn from(field: Field) -> Self {
        FieldSpec::Field(Box::new(field))
    }
}

/// Validate a whole field list, nested lists included. Dynamic lists are
/// checked once [`resolve_fields`] has computed them.
pub fn validate_fields(fields: &[FieldSpec]) -> Result<()> {
    fields.iter().try_for_each(FieldSpec::validate)
}

/// Replace every dynamic nested list with the list it computes for `context`.
/// Borrows `fields` untouched when the tree has nothing dynamic in it.
pub fn resolve_fields<'f>(fields: &'f [FieldSpec], context: &Context) -> Cow<'f, [FieldSpec]> {
    if !fields.iter().any(FieldSpec::is_dynamic) {
        return Cow::Borrowed(fields);
    }
    Cow::Owned(
        fields
            .iter()
            .map(|spec| match spec {
                FieldSpec::Key(_) => spec.clone(),
                FieldSpec::Field(original) => {
                    let mut field = original.as_ref().clone();
                    if let Some(nested) = &original.fields {
                        let list = nested.resolve(context);
                        field.fields = Some(Fields::Static(resolve_fields(&list, context).into_owned()));
                    }
                    FieldSpec::from(field)
                }
            })
            .collect(),
    )
}

/// A nested field list: fixed, or computed from the context on every call.
#[derive(Clone)]
pub enum Fields {
    Static(Vec<FieldSpec>),
    Dynamic(Arc<dyn Fn(&Context) -> Vec<FieldSpec> + Send + Sync>),
}

impl Fields {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Vec<FieldSpec> + Send + Sync + 'static,
    {
        Fields::Dynamic(Arc::new(f))
    }

    pub fn resolve(&self, context: &Context) -> Cow<'_, [FieldSpec]> {
        match self {
            Fields::Static(fields) => Cow::Borrowed(fields),
            Fields::Dynamic(f) => Cow::Owned(f(context)),
        }
    }

    /// Resolve the whole tree and validate whatever was computed.
    pub fn resolve_all(&self, context: &Context) -> Result<Cow<'_, [FieldSpec]>> {
        let fields = match self.resolve(context) {
            Cow::Borrowed(fields) => resolve_fields(fields, context),
            Cow::Owned(fields) => Cow::Owned(resolve_fields(&fields, context).into_owned()),
        };
        if let Cow::Owned(fields) = &fields {
            validate_fields(fields)?;
        }
        Ok(fields)
    }

    fn is_dynamic(&self) -> bool {
        match self {
            Fields::Static(fields) => fields.iter().any(FieldSpec::is_dynamic),
            Fields::Dynamic(_) => true,
        }
    }
}

impl From<Vec<FieldSpec>> for Fields {
    fn from(fields: Vec<FieldSpec>) -> Self {
        Fields::Static(fields)
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fields::Static(fields) => f.debug_tuple("Static").field(fields).finish(),
            Fields::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

pub(crate) fn has_wildcard(key: &str) -> bool {
    key.split('.').any(|segment| segment == WILDCARD)
}

/// Fallback for an empty source: a literal or a value computed from the context.
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    Computed(Arc<dyn Fn(&Context) -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn resolve(&self, context: &Context) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Computed(f) => f(context),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Predicate applied to each element of a sequence source.
#[derive(Clone)]
pub enum Filter {
    Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>),
    Expr(FilterExpr),
}

impl Filter {
    pub fn accepts(&self, item: &Value) -> bool {
        match self {
            Filter::Predicate(f) => f(item),
            Filter::Expr(expr) => filter::eval_filter(expr, item),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Predicate(_) => f.write_str("Predicate(..)"),
            Filter::Expr(expr) => f.debug_tuple("Expr").field(expr).finish(),
        }
    }
}

#[derive(Clone)]
pub struct Field {
    pub(crate) key: String,
    pub(crate) new_key: Option<String>,
    pub(crate) path: Option<String>,
    pub(crate) scope: Option<String>,
    pub(crate) fields: Option<Fields>,
    pub(crate) mapping: Option<Arc<dyn Mapping>>,
    pub(crate) filter: Option<Filter>,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) merge: bool,
    pub(crate) omit: Vec<String>,
}

impl Field {
    pub fn new(key: impl Into<String>) -> Self {
        Field {
            key: key.into(),
            new_key: None,
            path: None,
            scope: None,
            fields: None,
            mapping: None,
            filter: None,
            default: None,
            merge: false,
            omit: Vec::new(),
        }
    }

    pub fn rename(mut self, new_key: impl Into<String>) -> Self {
        self.new_key = Some(new_key.into());
        self
    }

    /// Read the value from an absolute path of the root instead of `key`.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Redirect what the mapping and nested fields see to an absolute path of
    /// the root. Output placement still follows `key` / `rename`.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FieldSpec>,
    {
        self.fields = Some(Fields::Static(fields.into_iter().map(Into::into).collect()));
        self
    }

    /// Nested fields computed from the context each time the tree is applied.
    pub fn fields_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> Vec<FieldSpec> + Send + Sync + 'static,
    {
        self.fields = Some(Fields::from_fn(f));
        self
    }

    pub fn mapping<F>(mut self, mapping: F) -> Self
    where
        F: Fn(&MappingArgs<'_>) -> MappingResult + Send + Sync + 'static,
    {
        self.mapping = Some(Arc::new(mapping));
        self
    }

    pub fn mapping_with(mut self, mapping: Arc<dyn Mapping>) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Filter::Predicate(Arc::new(predicate)));
        self
    }

    pub fn filter_expr(mut self, expr: FilterExpr) -> Self {
        self.filter = Some(Filter::Expr(expr));
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Context) -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Computed(Arc::new(f)));
        self
    }

    pub fn merge(mut self) -> Self {
        self.merge = true;
        self
    }

    /// Keys dropped from wildcard enumeration. Explicit fields are never omitted.
    pub fn omit<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.omit = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn output_key(&self) -> &str {
        self.new_key.as_deref().unwrap_or(&self.key)
    }

    pub fn nested(&self) -> Option<&Fields> {
        self.fields.as_ref()
    }

    /// Plain copy of `node[key]`: nothing but a rename, default, omit list or
    /// a `scope` that no mapping or nested list would read.
    pub(crate) fn is_passthrough(&self) -> bool {
        self.mapping.is_none()
            && self.fields.is_none()
            && self.path.is_none()
            && self.filter.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        check_key(&self.key)?;
        if self.path.is_some() && self.scope.is_some() {
            return Err(TransformError::invalid_field(
                &self.key,
                "`scope` and `path` cannot be used together",
            ));
        }
        for (name, value) in [("newKey", &self.new_key), ("path", &self.path), ("scope", &self.scope)] {
            let Some(value) = value else { continue };
            if value.contains(WILDCARD) {
                return Err(TransformError::invalid_field(
                    &self.key,
                    format!("wildcards are only allowed in `key`, found one in `{name}`"),
                ));
            }
            if name != "newKey" {
                path::parse_path(value).map_err(|err| {
                    TransformError::invalid_field(&self.key, format!("bad `{name}`: {err}"))
                })?;
            }
        }
        if self.new_key.is_some() && has_wildcard(&self.key) {
            return Err(TransformError::invalid_field(
                &self.key,
                "a wildcard key cannot be renamed",
            ));
        }
        if let Some(Fields::Static(fields)) = &self.fields {
            validate_fields(fields)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("key", &self.key)
            .field("new_key", &self.new_key)
            .field("path", &self.path)
            .field("scope", &self.scope)
            .field("fields", &self.fields)
            .field("mapping", &self.mapping.as_ref().map(|_| ".."))
            .field("filter", &self.filter)
            .field("default", &self.default)
            .field("merge", &self.merge)
            .field("omit", &self.omit)
            .finish()
    }
}

fn check_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(TransformError::invalid_field(key, "key cannot be empty"));
    }
    if let Some(bad) = key
        .split('.')
        .find(|segment| segment.contains(WILDCARD) && *segment != WILDCARD)
    {
        return Err(TransformError::invalid_field(
            key,
            format!("malformed wildcard segment `{bad}`; a wildcard must be a whole segment"),
        ));
    }
    Ok(())
}

// Wire form of a field list, as found in JSON spec files.

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFieldSpec {
    Key(String),
    Field(RawField),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawField {
    key: String,
    new_key: Option<String>,
    path: Option<String>,
    scope: Option<String>,
    fields: Option<Vec<RawFieldSpec>>,
    mapping: Option<String>,
    filter: Option<String>,
    default: Option<Value>,
    #[serde(default)]
    merge: bool,
    #[serde(default)]
    omit: Vec<String>,
}

/// Parse a JSON field list. `mapping` names are looked up in `registry`,
/// `filter` strings are parsed as filter expressions.
pub fn parse_fields(value: &Value, registry: &Registry) -> Result<Vec<FieldSpec>> {
    let raw = Vec::<RawFieldSpec>::deserialize(value)
        .map_err(|err| TransformError::InvalidSpec(err.to_string()))?;
    let fields = convert(raw, registry)?;
    validate_fields(&fields)?;
    Ok(fields)
}

pub fn parse_fields_str(input: &str, registry: &Registry) -> Result<Vec<FieldSpec>> {
    let value: Value = serde_json::from_str(input)?;
    parse_fields(&value, registry)
}

fn convert(raw: Vec<RawFieldSpec>, registry: &Registry) -> Result<Vec<FieldSpec>> {
    raw.into_iter()
        .map(|spec| match spec {
            RawFieldSpec::Key(key) => Ok(FieldSpec::Key(key)),
            RawFieldSpec::Field(raw) => convert_field(raw, registry).map(FieldSpec::from),
        })
        .collect()
}

fn convert_field(raw: RawField, registry: &Registry) -> Result<Field> {
    let mut field = Field::new(raw.key);
    field.new_key = raw.new_key;
    field.path = raw.path;
    field.scope = raw.scope;
    field.merge = raw.merge;
    field.omit = raw.omit;
    field.default = raw.default.map(DefaultValue::Literal);
    if let Some(name) = raw.mapping {
        let mapping = registry.get(&name).ok_or_else(|| {
            TransformError::invalid_field(&field.key, format!("unknown mapping `{name}`"))
        })?;
        field.mapping = Some(mapping);
    }
    if let Some(expr) = raw.filter {
        let parsed = filter::parse_filter(&expr).map_err(|err| {
            TransformError::invalid_field(&field.key, format!("bad filter `{expr}`: {err}"))
        })?;
        field.filter = Some(Filter::Expr(parsed));
    }
    if let Some(nested) = raw.fields {
        field.fields = Some(Fields::Static(convert(nested, registry)?));
    }
    Ok(field)
}
