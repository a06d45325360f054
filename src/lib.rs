pub mod errors;
pub mod context;
pub mod engine;     // transform / transform_response entry points
pub mod field;
pub mod functions;  // mapping trait + named mapping registry
pub mod filter;
pub mod path;
pub mod wildcard;
mod comparison;
mod invoker;
mod parser;
mod projector;

use serde_json::Value;
use errors::Result;
use context::{Context, TransformOptions};
use field::FieldSpec;
use functions::Registry;

/// A field list bundled with its context and options, ready to be applied to
/// any number of inputs.
#[derive(Debug, Clone)]
pub struct Transformer {
    fields: Fields,
    context: Context,
    options: TransformOptions,
}

impl Transformer {
    /// Validates a fixed field tree once, up front.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self> {
        field::validate_fields(&fields)?;
        Ok(Self::with_fields(Fields::Static(fields)))
    }

    /// The top-level list is computed from the context on every call and
    /// validated then.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Vec<FieldSpec> + Send + Sync + 'static,
    {
        Self::with_fields(Fields::from_fn(f))
    }

    /// Build from a JSON field list, resolving mapping names in `registry`.
    pub fn from_spec(spec: &Value, registry: &Registry) -> Result<Self> {
        Self::new(field::parse_fields(spec, registry)?)
    }

    fn with_fields(fields: Fields) -> Self {
        Self { fields, context: Context::default(), options: TransformOptions::default() }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn with_options(mut self, options: TransformOptions) -> Self {
        self.options = options;
        self
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn apply(&self, model: &Value) -> Result<Value> {
        let fields = self.fields.resolve_all(&self.context)?;
        Ok(engine::project_model(model, &fields, &self.context, &self.options))
    }

    /// Like `apply`, with `context` layered over the transformer's own.
    pub fn apply_with(&self, model: &Value, context: &Context) -> Result<Value> {
        let merged = self.context.merged(context);
        let fields = self.fields.resolve_all(&merged)?;
        Ok(engine::project_model(model, &fields, &merged, &self.options))
    }

    /// Scope pre-extraction, then projection.
    pub fn apply_response(&self, response: &Value) -> Result<Value> {
        let fields = self.fields.resolve_all(&self.context)?;
        Ok(engine::project_response(response, Some(&*fields), &self.context, &self.options))
    }

    pub fn empty(&self) -> Result<Value> {
        let fields = self.fields.resolve_all(&self.context)?;
        Ok(engine::empty_value(&fields, &self.context, &self.options))
    }
}

/// Convenience: project with an empty context and default options.
pub fn project(model: &Value, fields: &[FieldSpec]) -> Result<Value> {
    let context = Context::default();
    let options = TransformOptions::default();
    engine::transform(model, fields, &context, &options).map(engine::Transformed::into_value)
}

/// Re-export the most-used items for callers building field lists in code.
pub use context::KeyFormat;
pub use engine::{transform, transform_response, Transformed};
pub use errors::{MappingError, TransformError};
pub use field::{Field, Fields, parse_fields};
pub use functions::{Mapping, MappingArgs, MappingResult};
