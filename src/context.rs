use heck::ToLowerCamelCase;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path::{self, Segment};

/// Caller-owned values handed unchanged to every mapping and default function
/// during one projection. The engine never looks inside.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(Map<String, Value>);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Layer `call_site` over `self`; entries from `call_site` win.
    pub fn merged(&self, call_site: &Context) -> Context {
        let mut out = self.0.clone();
        for (k, v) in &call_site.0 {
            out.insert(k.clone(), v.clone());
        }
        Context(out)
    }
}

impl From<Map<String, Value>> for Context {
    fn from(map: Map<String, Value>) -> Self {
        Context(map)
    }
}

/// Output key casing applied to every written key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyFormat {
    CamelCase,
}

impl KeyFormat {
    /// Formats each path segment on its own so nesting is preserved.
    pub fn apply(self, key: &str) -> String {
        let Ok(segments) = path::parse_path(key) else {
            return key.to_string();
        };
        let formatted: Vec<Segment> = segments
            .into_iter()
            .map(|segment| match (self, segment) {
                (KeyFormat::CamelCase, Segment::Key(k)) => Segment::Key(k.to_lower_camel_case()),
                (_, index) => index,
            })
            .collect();
        path::render(&formatted)
    }
}

/// Per-call knobs. Anything left unset falls back to the defaults below;
/// values supplied at the call site always win.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Pre-extraction path applied to a raw response before projecting it.
    pub scope: Option<String>,
    /// Casing for output keys.
    pub format: Option<KeyFormat>,
}

impl TransformOptions {
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_format(mut self, format: KeyFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Layer `call_site` over `self`; set fields in `call_site` win.
    pub fn merged(&self, call_site: &TransformOptions) -> TransformOptions {
        TransformOptions {
            scope: call_site.scope.clone().or_else(|| self.scope.clone()),
            format: call_site.format.or(self.format),
        }
    }

    pub(crate) fn format_key(&self, key: &str) -> String {
        match self.format {
            Some(format) => format.apply(key),
            None => key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn call_site_context_wins() {
        let client = Context::new().with("lang", "en").with("tenant", "acme");
        let call = Context::new().with("lang", "fr");
        let merged = client.merged(&call);
        assert_eq!(merged.get("lang"), Some(&json!("fr")));
        assert_eq!(merged.get("tenant"), Some(&json!("acme")));
    }

    #[test]
    fn camel_case_keeps_dotted_nesting() {
        assert_eq!(KeyFormat::CamelCase.apply("user_info.first_name"), "userInfo.firstName");
        assert_eq!(KeyFormat::CamelCase.apply("created-at"), "createdAt");
        assert_eq!(KeyFormat::CamelCase.apply("data['a.b'].first_name"), "data.aB.firstName");
    }

    #[test]
    fn options_merge_prefers_call_site() {
        let base = TransformOptions::default().with_scope("data").with_format(KeyFormat::CamelCase);
        let call = TransformOptions::default().with_scope("items");
        let merged = base.merged(&call);
        assert_eq!(merged.scope.as_deref(), Some("items"));
        assert_eq!(merged.format, Some(KeyFormat::CamelCase));
    }
}
