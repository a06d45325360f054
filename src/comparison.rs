use std::cmp::Ordering;

use serde_json::Value;

/// Loose ordering used by filter expressions.
///
/// Numbers compare numerically (numeric strings are coerced when the other side
/// is a number); everything else of mismatched type falls back to comparing
/// the JSON text.
pub fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::String(sa), Value::String(sb)) => sa.cmp(sb),
        (Value::Bool(ba), Value::Bool(bb)) => ba.cmp(bb),
        (Value::Number(na), Value::Number(nb)) => match (na.as_f64(), nb.as_f64()) {
            (Some(da), Some(db)) => cmp_f64(da, db),
            _ => na.to_string().cmp(&nb.to_string()),
        },
        (Value::Number(na), Value::String(sb)) => match (na.as_f64(), sb.trim().parse::<f64>()) {
            (Some(da), Ok(db)) => cmp_f64(da, db),
            _ => a.to_string().cmp(&b.to_string()),
        },
        (Value::String(sa), Value::Number(nb)) => match (sa.trim().parse::<f64>(), nb.as_f64()) {
            (Ok(da), Some(db)) => cmp_f64(da, db),
            _ => a.to_string().cmp(&b.to_string()),
        },
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    if (a - b).abs() < f64::EPSILON {
        Ordering::Equal
    } else if a < b {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}
