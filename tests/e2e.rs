use json_field_projection as jfp;
use jfp::context::{Context, KeyFormat, TransformOptions};
use jfp::field::FieldSpec;
use jfp::{Field, MappingError};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn project(model: Value, fields: Vec<FieldSpec>) -> Value {
    jfp::project(&model, &fields).unwrap()
}

fn replace_domain(args: &jfp::MappingArgs<'_>) -> jfp::MappingResult {
    let email = args
        .get("email")
        .and_then(Value::as_str)
        .ok_or_else(|| MappingError::new("email missing"))?;
    Ok(Some(json!(email.replace("@example.com", "@gmail.com"))))
}

#[test]
fn test_example_rename() {
    let out = project(
        json!({"name": "John Doe", "age": 30}),
        vec!["name".into(), Field::new("age").rename("years").into()],
    );
    assert_eq!(out, json!({"name": "John Doe", "years": 30}));
}

#[test]
fn test_example_nested_objects() {
    let fields = vec![Field::new("user")
        .fields([
            FieldSpec::from("name"),
            Field::new("details")
                .fields([FieldSpec::from("age"), Field::new("city").rename("location").into()])
                .into(),
        ])
        .into()];
    let out = project(
        json!({"user": {"name": "Jane Doe", "details": {"age": 25, "city": "New York"}}}),
        fields,
    );
    assert_eq!(
        out,
        json!({"user": {"name": "Jane Doe", "details": {"age": 25, "location": "New York"}}})
    );
}

#[test]
fn test_example_nested_rename_over_arrays() {
    let fields = vec![Field::new("users")
        .fields([FieldSpec::from("id"), Field::new("name").rename("fullName").into()])
        .into()];
    let out = project(
        json!({"users": [{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]}),
        fields,
    );
    assert_eq!(
        out,
        json!({"users": [{"id": 1, "fullName": "Alice"}, {"id": 2, "fullName": "Bob"}]})
    );
}

#[test]
fn test_example_trailing_wildcard_with_nested_fields() {
    let input = json!({"data": {
        "user1": {"name": "Alice", "age": 30, "sexe": "F"},
        "user2": {"name": "Bob", "age": 25, "sexe": "M"}
    }});
    let expected = json!({"data": {"user1": {"name": "Alice"}, "user2": {"name": "Bob"}}});

    let out = project(input.clone(), vec![Field::new("data.*").fields(["name"]).into()]);
    assert_eq!(out, expected);

    let out = project(
        input,
        vec![Field::new("data.*")
            .fields([Field::new("*").omit(["age", "sexe"])])
            .into()],
    );
    assert_eq!(out, expected);
}

#[test]
fn test_example_interior_wildcard_equivalence() {
    let out = project(
        json!({"data": {"user1": {"name": "Alice", "age": 30}, "user2": {"name": "Bob", "age": 25}}}),
        vec!["data.*.name".into()],
    );
    assert_eq!(out, json!({"data": {"user1": {"name": "Alice"}, "user2": {"name": "Bob"}}}));
}

#[test]
fn test_example_omit_on_root_wildcard() {
    let out = project(
        json!({"name": "John Doe", "email": "j@x.com", "password": "s"}),
        vec![Field::new("*").omit(["password"]).into()],
    );
    assert_eq!(out, json!({"name": "John Doe", "email": "j@x.com"}));
    assert!(out.get("password").is_none());
}

#[test]
fn test_example_wildcard_with_rename_and_mapping() {
    let fields = vec![Field::new("test.*.subField")
        .fields([
            Field::new("name").rename("fullName"),
            Field::new("age").mapping(|args| {
                let doubled: Vec<Value> = args
                    .value
                    .and_then(Value::as_array)
                    .ok_or_else(|| MappingError::new("age is not a list"))?
                    .iter()
                    .map(|a| json!(a.as_i64().unwrap_or(0) * 2))
                    .collect();
                Ok(Some(Value::Array(doubled)))
            }),
        ])
        .into()];
    let out = project(
        json!({"test": {
            "a": {"subField": {"name": "Sub 1", "age": [10, 20]}},
            "b": {"subField": {"name": "Sub 2", "age": [20, 30]}}
        }}),
        fields,
    );
    assert_eq!(
        out,
        json!({"test": {
            "a": {"subField": {"fullName": "Sub 1", "age": [20, 40]}},
            "b": {"subField": {"fullName": "Sub 2", "age": [40, 60]}}
        }})
    );
}

#[test]
fn test_example_scope_with_nested_fields() {
    let fields = vec![Field::new("userInfo")
        .scope("user.profile")
        .fields([
            FieldSpec::from("name"),
            Field::new("location")
                .fields(["city", "country"])
                .scope("user.profile.address")
                .into(),
        ])
        .into()];
    let out = project(
        json!({"user": {"profile": {"name": "Jane Doe", "address": {"city": "New York", "country": "USA"}}}}),
        fields,
    );
    assert_eq!(
        out,
        json!({"userInfo": {"name": "Jane Doe", "location": {"city": "New York", "country": "USA"}}})
    );
}

#[test]
fn test_example_scope_with_mapping() {
    let fields = vec![Field::new("staff")
        .scope("company.employees")
        .fields([
            FieldSpec::from("name"),
            Field::new("position")
                .mapping(|args| {
                    Ok(args
                        .get("role")
                        .and_then(Value::as_str)
                        .map(|role| json!(role.to_uppercase())))
                })
                .into(),
        ])
        .into()];
    let out = project(
        json!({"company": {"employees": [
            {"name": "Alice", "role": "developer"},
            {"name": "Bob", "role": "designer"}
        ]}}),
        fields,
    );
    assert_eq!(
        out,
        json!({"staff": [
            {"name": "Alice", "position": "DEVELOPER"},
            {"name": "Bob", "position": "DESIGNER"}
        ]})
    );
}

#[test]
fn test_example_path_with_fields() {
    let out = project(
        json!({"data": {"users": [{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]}}),
        vec![Field::new("users").path("data.users").fields(["id", "name"]).into()],
    );
    assert_eq!(out, json!({"users": [{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]}));
}

#[test]
fn test_example_path_with_default() {
    let fields = || -> Vec<FieldSpec> {
        vec![
            Field::new("theme").path("settings.theme").into(),
            Field::new("language").path("settings.language").default("en").into(),
        ]
    };
    assert_eq!(
        project(json!({"settings": {"theme": "dark"}}), fields()),
        json!({"theme": "dark", "language": "en"})
    );
    assert_eq!(
        project(json!({"settings": {"language": "fr"}}), fields()),
        json!({"language": "fr"})
    );
}

#[test]
fn test_example_wildcard_with_explicit_override() {
    let out = project(
        json!({"firstName": "John", "lastName": "Doe", "email": "john@example.com"}),
        vec!["*".into(), Field::new("email").mapping(replace_domain).into()],
    );
    assert_eq!(
        out,
        json!({"firstName": "John", "lastName": "Doe", "email": "john@gmail.com"})
    );
}

#[test]
fn test_example_wildcard_override_inside_array() {
    let fields = vec![Field::new("users")
        .fields([FieldSpec::from("*"), Field::new("email").mapping(replace_domain).into()])
        .into()];
    let out = project(
        json!({"users": [
            {"firstName": "John", "lastName": "Doe", "email": "john@example.com"},
            {"firstName": "Jane", "lastName": "Doe", "email": "jane@example.com"}
        ]}),
        fields,
    );
    assert_eq!(
        out,
        json!({"users": [
            {"firstName": "John", "lastName": "Doe", "email": "john@gmail.com"},
            {"firstName": "Jane", "lastName": "Doe", "email": "jane@gmail.com"}
        ]})
    );
}

#[test]
fn test_example_root_array_with_wildcard() {
    let out = project(
        json!([
            {"firstName": "John", "lastName": "Doe", "email": "john@example.com"},
            {"firstName": "Jane", "lastName": "Doe", "email": "jane@example.com"}
        ]),
        vec!["*".into(), Field::new("email").mapping(replace_domain).into()],
    );
    assert_eq!(
        out,
        json!([
            {"firstName": "John", "lastName": "Doe", "email": "john@gmail.com"},
            {"firstName": "Jane", "lastName": "Doe", "email": "jane@gmail.com"}
        ])
    );
}

#[test]
fn test_example_merge_hoists_into_parent() {
    let fields = vec![Field::new("team")
        .fields([
            FieldSpec::from("name"),
            Field::new("staff")
                .merge()
                .mapping(|_| Ok(Some(json!({"role": "ADMIN"}))))
                .into(),
        ])
        .into()];
    let out = project(json!({"team": {"name": "core", "staff": ["a"]}}), fields);
    assert_eq!(out, json!({"team": {"name": "core", "role": "ADMIN"}}));
}

#[test]
fn test_example_mapping_isolation() {
    let fields = vec![
        "bar".into(),
        "baz".into(),
        Field::new("foo")
            .mapping(|_| Err(MappingError::new("exploded")))
            .into(),
        Field::new("qux").mapping(|_| panic!("unexpected")).into(),
    ];
    let out = project(json!({"bar": 1, "baz": "two", "foo": 3, "qux": 4}), fields);
    assert_eq!(out, json!({"bar": 1, "baz": "two"}));
}

#[test]
fn test_example_context_and_camel_case() {
    let fields: Vec<FieldSpec> = vec![
        "first_name".into(),
        Field::new("greeting")
            .mapping(|args| {
                let lang = args.context.get("lang").and_then(Value::as_str).unwrap_or("en");
                Ok(Some(json!(if lang == "fr" { "bonjour" } else { "hello" })))
            })
            .into(),
    ];
    let context = Context::new().with("lang", "fr");
    let options = TransformOptions::default().with_format(KeyFormat::CamelCase);
    let out = jfp::transform(&json!({"first_name": "Ana"}), &fields, &context, &options).unwrap();
    assert_eq!(out.value, json!({"firstName": "Ana", "greeting": "bonjour"}));
    assert_eq!(out.empty(), json!({"firstName": null, "greeting": null}));
}

#[test]
fn test_example_transformer_reuse() {
    let transformer = jfp::Transformer::new(vec![
        "id".into(),
        Field::new("tier").default_with(|ctx| ctx.get("tier").cloned().unwrap_or(json!("free"))).into(),
    ])
    .unwrap()
    .with_context(Context::new().with("tier", "basic"));

    assert_eq!(transformer.apply(&json!({"id": 1})).unwrap(), json!({"id": 1, "tier": "basic"}));
    assert_eq!(
        transformer
            .apply_with(&json!({"id": 2}), &Context::new().with("tier", "pro"))
            .unwrap(),
        json!({"id": 2, "tier": "pro"})
    );
    assert_eq!(
        transformer.apply(&json!({"id": 3, "tier": "gold"})).unwrap(),
        json!({"id": 3, "tier": "gold"})
    );
}

#[test]
fn test_example_wildcard_over_numeric_keys() {
    let out = project(
        json!({"data": {"1": {"name": "A", "x": 0}, "3": {"name": "B"}}}),
        vec!["data.*.name".into()],
    );
    assert_eq!(out, json!({"data": {"1": {"name": "A"}, "3": {"name": "B"}}}));

    let out = project(
        json!({"data": {"18446744073709551615": {"name": "A"}, "100000000000": {"name": "B"}}}),
        vec!["data.*.name".into()],
    );
    assert_eq!(
        out,
        json!({"data": {"18446744073709551615": {"name": "A"}, "100000000000": {"name": "B"}}})
    );
}

#[test]
fn test_example_leading_zero_key() {
    let out = project(json!({"007": "bond", "x": 1}), vec!["007".into(), "x".into()]);
    assert_eq!(out, json!({"007": "bond", "x": 1}));

    let out = project(
        json!({"agents": {"007": {"name": "bond"}}}),
        vec![Field::new("agent").path("agents.007.name").into()],
    );
    assert_eq!(out, json!({"agent": "bond"}));
}

#[test]
fn test_example_scope_without_mapping_or_fields() {
    let out = project(
        json!({"theme": "light", "settings": {"theme": "dark"}}),
        vec![Field::new("theme").scope("settings").into()],
    );
    assert_eq!(out, json!({"theme": "light"}));
}

#[test]
fn test_example_dynamic_fields() {
    let fields: Vec<FieldSpec> = vec![Field::new("user")
        .fields_with(|ctx| match ctx.get("view").and_then(Value::as_str) {
            Some("full") => vec!["name".into(), "email".into()],
            _ => vec!["name".into()],
        })
        .into()];
    let model = json!({"user": {"name": "Ada", "email": "ada@x.io"}});
    let options = TransformOptions::default();

    let empty_ctx = Context::new();
    let brief = jfp::transform(&model, &fields, &empty_ctx, &options).unwrap();
    assert_eq!(brief.value, json!({"user": {"name": "Ada"}}));

    let full_ctx = Context::new().with("view", "full");
    let full = jfp::transform(&model, &fields, &full_ctx, &options).unwrap();
    assert_eq!(full.value, json!({"user": {"name": "Ada", "email": "ada@x.io"}}));
    assert_eq!(full.empty(), json!({"user": {"name": null, "email": null}}));
}

#[test]
fn test_example_dynamic_top_level_fields_are_validated_per_call() {
    let transformer = jfp::Transformer::from_fn(|ctx| {
        let key = ctx.get("key").and_then(Value::as_str).unwrap_or("id").to_string();
        vec![FieldSpec::from(key)]
    });
    let model = json!({"id": 1, "name": "Ada"});

    assert_eq!(transformer.apply(&model).unwrap(), json!({"id": 1}));
    assert_eq!(
        transformer.apply_with(&model, &Context::new().with("key", "name")).unwrap(),
        json!({"name": "Ada"})
    );
    assert!(matches!(
        transformer.apply_with(&model, &Context::new().with("key", "na*")),
        Err(jfp::TransformError::InvalidField { .. })
    ));
}
