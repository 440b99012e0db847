//! Coercing list values, item by item.

use serde_json::Value;

use super::field::resolve_value;
use crate::context::{ContextExt, ContextField};
use crate::error::{ServerError, ValueError, ValueResult};
use crate::query_path::QueryPath;
use crate::registry::MetaTypeName;

/// Coerce a resolved list under the item type `item_ty`.
///
/// Items are coerced in order with indexed child paths. A propagation out of
/// an item is caught here when the item type is nullable: that slot becomes
/// null, the error is recorded once and the remaining items continue. With a
/// non-null item type the propagation moves on to the list's own position.
pub(crate) fn resolve_list(
    ctx: &ContextField<'_>,
    path: &QueryPath,
    item_ty: &str,
    value: Value,
) -> ValueResult<Value> {
    let Value::Array(items) = value else {
        return Err(ValueError::propagate(ServerError {
            message: format!("Encountered a {} where we expected a list", json_kind_str(&value)),
            locations: vec![ctx.item.pos],
            path: path.iter().cloned().collect(),
        }));
    };

    let item_non_null = MetaTypeName::create(item_ty).is_non_null();
    let mut children = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let item_path = path.child(idx);
        match resolve_value(ctx, &item_path, item_ty, item, false) {
            Ok(value) => children.push(value),
            Err(ValueError::Propagate { error, recorded }) if !item_non_null => {
                if !recorded {
                    ctx.add_error(error);
                }
                children.push(Value::Null);
            }
            Err(other) => return Err(other),
        }
    }
    Ok(Value::Array(children))
}

fn json_kind_str(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
