use clap::Parser;
use serde_json::Value;
use tracing::Level;

use json_field_projection::context::{Context, KeyFormat, TransformOptions};
use json_field_projection::functions::Registry;
use json_field_projection::Transformer;

/// Project a JSON document through a declarative field list.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON document, inline or `@path/to/file.json`.
    json: String,
    /// Field list as JSON, inline or `@path/to/fields.json`.
    fields: String,
    /// Context object handed to mappings and defaults (inline JSON or `@file`).
    #[arg(long)]
    context: Option<String>,
    /// Path extracted from the document before projecting it.
    #[arg(long)]
    scope: Option<String>,
    /// Write output keys in lowerCamelCase.
    #[arg(long)]
    camel_case: bool,
    /// Print the empty placeholder instead of projecting.
    #[arg(long)]
    empty: bool,
    /// Log wildcard and mapping diagnostics to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    // Parse CLI arguments.
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    if let Err(message) = run(&args) {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    let data = read_json(&args.json, "document")?;
    let spec = read_json(&args.fields, "field list")?;

    let context = match args.context.as_deref() {
        Some(raw) => match read_json(raw, "context")? {
            Value::Object(map) => Context::from(map),
            _ => return Err("context must be a JSON object".to_string()),
        },
        None => Context::default(),
    };

    let mut options = TransformOptions::default();
    options.scope = args.scope.clone();
    if args.camel_case {
        options.format = Some(KeyFormat::CamelCase);
    }

    let transformer = Transformer::from_spec(&spec, &Registry::with_builtins())
        .map_err(|e| e.to_string())?
        .with_context(context)
        .with_options(options);

    let out = if args.empty {
        transformer.empty()
    } else {
        transformer.apply_response(&data)
    }
    .map_err(|e| e.to_string())?;

    let text = serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

/// Inline JSON, or the contents of a file when prefixed with `@`.
fn read_json(raw: &str, what: &str) -> Result<Value, String> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {what} from {path}: {e}"))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON in {what}: {e}"))
}
