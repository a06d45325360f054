//! Call boundary for user mappings.
//!
//! One call per field per pass. A mapping that returns an error, or panics, is
//! logged and treated as "no value"; the rest of the projection carries on.
//! Mappings are synchronous: whatever they return is used as is.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::warn;

use crate::functions::{Mapping, MappingArgs};

pub(crate) fn invoke(mapping: &dyn Mapping, args: &MappingArgs<'_>) -> Option<Value> {
    match panic::catch_unwind(AssertUnwindSafe(|| mapping.map(args))) {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            warn!(field = args.key, error = %err, "mapping failed, field skipped");
            None
        }
        Err(payload) => {
            warn!(
                field = args.key,
                panic = %panic_message(payload.as_ref()),
                "mapping panicked, field skipped"
            );
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
