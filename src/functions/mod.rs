use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::context::Context;
use crate::errors::MappingError;
use crate::path;

/// Everything a mapping can see while computing one field.
#[derive(Clone, Copy, Debug)]
pub struct MappingArgs<'a> {
    /// The node that owns the field, or the scope value when the field is scoped.
    pub model: &'a Value,
    /// The field's resolved source (`node[key]`, or the `path` / `scope` value).
    pub value: Option<&'a Value>,
    /// The field key as written in the field list (after wildcard expansion).
    pub key: &'a str,
    /// Output built so far for the current node.
    pub output: &'a Value,
    /// The node one level up, when there is one.
    pub parent: Option<&'a Value>,
    /// The value handed to `transform`.
    pub root: &'a Value,
    pub context: &'a Context,
}

impl<'a> MappingArgs<'a> {
    /// Shorthand for `path::get(self.model, path)`.
    pub fn get(&self, path: &str) -> Option<&'a Value> {
        path::get(self.model, path)
    }
}

/// `Ok(None)` means "no value": the field is left out of the output.
pub type MappingResult = std::result::Result<Option<Value>, MappingError>;

/// A per-field compute function.
pub trait Mapping: Send + Sync {
    fn map(&self, args: &MappingArgs<'_>) -> MappingResult;
}

impl<F> Mapping for F
where
    F: Fn(&MappingArgs<'_>) -> MappingResult + Send + Sync,
{
    fn map(&self, args: &MappingArgs<'_>) -> MappingResult {
        self(args)
    }
}

/// Named mappings that declarative spec files can refer to.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<String, Arc<dyn Mapping>>>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    pub fn with_builtins() -> Self {
        let mut map: HashMap<String, Arc<dyn Mapping>> = HashMap::new();
        map.insert("lower".into(), Arc::new(builtins::Lower));
        map.insert("upper".into(), Arc::new(builtins::Upper));
        map.insert("first".into(), Arc::new(builtins::First));
        map.insert("unique".into(), Arc::new(builtins::Unique));
        map.insert("length".into(), Arc::new(builtins::Length));
        map.insert("to_string".into(), Arc::new(builtins::ToText));
        Self { inner: Arc::new(map) }
    }

    pub fn register<M: Mapping + 'static>(&mut self, name: impl Into<String>, mapping: M) {
        let mut_map = Arc::make_mut(&mut self.inner);
        mut_map.insert(name.into(), Arc::new(mapping));
    }

    /// Register a closure; its signature is inferred from the bound.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, mapping: F)
    where
        F: Fn(&MappingArgs<'_>) -> MappingResult + Send + Sync + 'static,
    {
        self.register(name, mapping);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Mapping>> {
        self.inner.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("mappings", &names).finish()
    }
}

/// Built-ins read the field's resolved source value.
pub mod builtins {
    use super::*;
    use itertools::Itertools;

    pub struct Lower;
    impl Mapping for Lower {
        fn map(&self, args: &MappingArgs<'_>) -> MappingResult {
            Ok(args.value.map(|v| match v {
                Value::String(t) => Value::String(t.to_lowercase()),
                other => other.clone(),
            }))
        }
    }

    pub struct Upper;
    impl Mapping for Upper {
        fn map(&self, args: &MappingArgs<'_>) -> MappingResult {
            Ok(args.value.map(|v| match v {
                Value::String(t) => Value::String(t.to_uppercase()),
                other => other.clone(),
            }))
        }
    }

    pub struct First;
    impl Mapping for First {
        fn map(&self, args: &MappingArgs<'_>) -> MappingResult {
            Ok(match args.value {
                Some(Value::Array(items)) => items.first().cloned(),
                other => other.cloned(),
            })
        }
    }

    pub struct Unique;
    impl Mapping for Unique {
        fn map(&self, args: &MappingArgs<'_>) -> MappingResult {
            Ok(match args.value {
                Some(Value::Array(items)) => Some(Value::Array(
                    items
                        .iter()
                        .unique_by(|x| serde_json::to_string(x).unwrap_or_default())
                        .cloned()
                        .collect(),
                )),
                other => other.cloned(),
            })
        }
    }

    pub struct Length;
    impl Mapping for Length {
        fn map(&self, args: &MappingArgs<'_>) -> MappingResult {
            match args.value {
                None | Some(Value::Null) => Ok(None),
                Some(Value::Array(a)) => Ok(Some(Value::from(a.len()))),
                Some(Value::Object(m)) => Ok(Some(Value::from(m.len()))),
                Some(Value::String(s)) => Ok(Some(Value::from(s.chars().count()))),
                Some(other) => Err(MappingError::new(format!(
                    "length expects a string, array or object, got {other}"
                ))),
            }
        }
    }

    pub struct ToText;
    impl Mapping for ToText {
        fn map(&self, args: &MappingArgs<'_>) -> MappingResult {
            Ok(match args.value {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(Value::String(s.clone())),
                Some(other) => Some(Value::String(other.to_string())),
            })
        }
    }
}
