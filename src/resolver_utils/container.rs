//! Flattening selection sets and resolving object values.

use async_graphql_parser::types::{Field, Selection, SelectionSet};
use async_graphql_parser::Positioned;
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde_json::Value;

use super::{field::resolve_field, introspection, typecast};
use crate::context::{ContextExt, ContextSelectionSet};
use crate::deferred::DeferredWorkload;
use crate::directives::{is_deferred, should_skip};
use crate::error::{ServerError, ValueError, ValueResult};

/// One entry of a flattened selection set.
pub(crate) struct CollectedField<'a> {
    /// The first field node seen under this response key.
    pub field: &'a Positioned<Field>,
    /// Child selection sets, in merge order. Empty for leaf fields; more
    /// than one when co-named fields were merged.
    pub selections: Vec<&'a Positioned<SelectionSet>>,
}

/// Flatten the frame's selection sets into an ordered mapping of response
/// key to merged field node.
///
/// Selections are visited in source order: skipped nodes are dropped,
/// fragments are expanded when their type condition applies to `value`, and
/// a response key seen again merges its child selections into the existing
/// entry. First-seen key order is preserved.
pub(crate) fn collect_fields<'a>(
    ctx: &ContextSelectionSet<'a>,
    value: &Value,
) -> ValueResult<IndexMap<&'a str, CollectedField<'a>>> {
    let mut fields = IndexMap::new();
    for selection_set in ctx.selection_sets.iter().copied() {
        collect_into(ctx, value, selection_set, &mut fields)?;
    }
    Ok(fields)
}

fn collect_into<'a>(
    ctx: &ContextSelectionSet<'a>,
    value: &Value,
    selection_set: &'a Positioned<SelectionSet>,
    fields: &mut IndexMap<&'a str, CollectedField<'a>>,
) -> ValueResult<()> {
    for selection in &selection_set.node.items {
        match &selection.node {
            Selection::Field(field) => {
                if should_skip(ctx, &field.node.directives)? {
                    continue;
                }
                let key = field.node.response_key().node.as_str();
                let child_selections = &field.node.selection_set;
                match fields.entry(key) {
                    Entry::Occupied(mut entry) => {
                        // Leaf re-occurrences change nothing; merged child
                        // lists materialize on the second hit.
                        if !child_selections.node.items.is_empty() {
                            entry.get_mut().selections.push(child_selections);
                        }
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(CollectedField {
                            field,
                            selections: if child_selections.node.items.is_empty() {
                                Vec::new()
                            } else {
                                vec![child_selections]
                            },
                        });
                    }
                }
            }
            Selection::InlineFragment(fragment) => {
                if should_skip(ctx, &fragment.node.directives)? {
                    continue;
                }
                let condition = fragment
                    .node
                    .type_condition
                    .as_ref()
                    .map(|condition| condition.node.on.node.as_str());
                if applies(ctx, value, condition)? {
                    collect_into(ctx, value, &fragment.node.selection_set, fields)?;
                }
            }
            Selection::FragmentSpread(spread) => {
                if should_skip(ctx, &spread.node.directives)? {
                    continue;
                }
                let name = spread.node.fragment_name.node.as_str();
                let Some(fragment) = ctx.get_fragment(name) else {
                    return Err(ValueError::Fatal(ServerError::new(
                        format!("Unknown fragment `{name}`"),
                        Some(spread.pos),
                    )));
                };
                let condition = fragment.node.type_condition.node.on.node.as_str();
                if applies(ctx, value, Some(condition))? {
                    collect_into(ctx, value, &fragment.node.selection_set, fields)?;
                }
            }
        }
    }
    Ok(())
}

/// Whether a fragment's type condition applies to the runtime value at this
/// frame. No condition always applies.
fn applies(ctx: &ContextSelectionSet<'_>, value: &Value, condition: Option<&str>) -> ValueResult<bool> {
    let Some(condition) = condition else {
        return Ok(true);
    };
    let Some(inner) = ctx.registry().lookup_type(condition) else {
        return Err(ValueError::Fatal(ServerError::new(
            format!("Unknown type `{condition}` in a fragment condition"),
            None,
        )));
    };
    Ok(typecast::resolve(ctx.registry(), value, inner, ctx.ty).is_some())
}

/// Resolve the object `value` under this frame's selection sets.
///
/// Fields resolve in flattened source order. Fields carrying `@defer` are
/// parked on the workload queue instead of resolving, when the query has
/// one; their keys are left out of this object and arrive later as patches.
/// A propagation out of a nullable field is caught here: the field becomes
/// null, the error is recorded once and sibling fields continue.
pub(crate) fn resolve_container(ctx: &ContextSelectionSet<'_>, value: &Value) -> ValueResult<Value> {
    let fields = collect_fields(ctx, value)?;
    let mut object = serde_json::Map::with_capacity(fields.len());

    for (response_key, collected) in fields {
        let field_name = collected.field.node.name.node.as_str();

        // Synthetic fields resolve inline and are never parked.
        if field_name == "__typename" {
            object.insert(response_key.to_string(), Value::String(ctx.ty.name().to_string()));
            continue;
        }
        if ctx.ty.name() == ctx.registry().query_type {
            if field_name == "__schema" {
                object.insert(
                    response_key.to_string(),
                    introspection::resolve_schema(ctx, collected.field)?,
                );
                continue;
            }
            if field_name == "__type" {
                object.insert(
                    response_key.to_string(),
                    introspection::resolve_type_by_name(ctx, collected.field)?,
                );
                continue;
            }
        }

        let Some(field) = ctx.ty.field(field_name) else {
            return Err(ValueError::Fatal(ServerError::new(
                format!("Could not find a field named `{}` on `{}`", field_name, ctx.ty.name()),
                Some(collected.field.node.name.pos),
            )));
        };
        let field_ctx = ctx.with_field(collected.field, field, collected.selections);

        if is_deferred(&collected.field.node.directives) {
            if let Some(workloads) = ctx.deferred_workloads() {
                let workload = DeferredWorkload::new(
                    merged_field(&field_ctx.selection_sets, collected.field),
                    field_ctx.path.clone(),
                    ctx.ty.name().to_string(),
                    value.clone(),
                );
                workloads.send(workload).map_err(|error| {
                    ValueError::Fatal(error.into_server_error(collected.field.pos))
                })?;
                // Absent keys read as null until the patch lands.
                continue;
            }
        }

        match resolve_field(&field_ctx, value) {
            Ok(resolved) => {
                object.insert(response_key.to_string(), resolved);
            }
            Err(ValueError::Propagate { error, recorded }) if field.ty.is_nullable() => {
                if !recorded {
                    ctx.add_error(error);
                }
                object.insert(response_key.to_string(), Value::Null);
            }
            Err(other) => return Err(other),
        }
    }

    Ok(Value::Object(object))
}

/// An owned field node for parking: the original node with the merged child
/// selection sets concatenated back into one.
fn merged_field(selections: &[&Positioned<SelectionSet>], field: &Positioned<Field>) -> Positioned<Field> {
    let mut field = field.clone();
    if selections.len() > 1 {
        field.node.selection_set.node.items = selections
            .iter()
            .flat_map(|set| set.node.items.iter().cloned())
            .collect();
    }
    field
}
