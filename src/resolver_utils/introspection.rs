//! Synchronous introspection: `__schema` and `__type` resolved by walking
//! the registry under the guidance of the query's selection sets.

use async_graphql_parser::types::{Field, Selection, SelectionSet};
use async_graphql_parser::Positioned;
use async_graphql_value::ConstValue;
use serde_json::{json, Map, Value};

use crate::context::{ContextExt, ContextSelectionSet};
use crate::directives::{should_skip, DirectiveDefinition};
use crate::error::{ServerError, ValueError, ValueResult};
use crate::registry::{MetaField, MetaInputValue, MetaType, MetaTypeName};

/// Resolve the `__schema` field.
pub(crate) fn resolve_schema(
    ctx: &ContextSelectionSet<'_>,
    field: &Positioned<Field>,
) -> ValueResult<Value> {
    let mut object = Map::new();
    for selected in introspection_fields(ctx, &field.node.selection_set)? {
        let value = match selected.node.name.node.as_str() {
            "description" => Value::Null,
            "types" => Value::Array(
                ctx.registry()
                    .types
                    .values()
                    .map(|ty| type_value(ctx, ty, &selected.node.selection_set))
                    .collect::<ValueResult<_>>()?,
            ),
            "queryType" => named_type_value(ctx, &ctx.registry().query_type, selected)?,
            "mutationType" => match &ctx.registry().mutation_type {
                Some(name) => named_type_value(ctx, name, selected)?,
                None => Value::Null,
            },
            "subscriptionType" => Value::Null,
            "directives" => Value::Array(
                ctx.registry()
                    .directives
                    .values()
                    .map(|directive| directive_value(ctx, directive, &selected.node.selection_set))
                    .collect::<ValueResult<_>>()?,
            ),
            "__typename" => json!("__Schema"),
            _ => Value::Null,
        };
        insert(&mut object, selected, value);
    }
    Ok(Value::Object(object))
}

/// Resolve the `__type(name:)` field.
pub(crate) fn resolve_type_by_name(
    ctx: &ContextSelectionSet<'_>,
    field: &Positioned<Field>,
) -> ValueResult<Value> {
    let Some(argument) = field.node.get_argument("name") else {
        return Ok(Value::Null);
    };
    let name = ctx
        .resolve_input_value(argument.clone())
        .map_err(ValueError::Fatal)?;
    let ConstValue::String(name) = name else {
        return Ok(Value::Null);
    };
    match ctx.registry().lookup_type(&name) {
        Some(ty) => type_value(ctx, ty, &field.node.selection_set),
        None => Ok(Value::Null),
    }
}

fn named_type_value(
    ctx: &ContextSelectionSet<'_>,
    name: &str,
    selected: &Positioned<Field>,
) -> ValueResult<Value> {
    match ctx.registry().lookup_type(name) {
        Some(ty) => type_value(ctx, ty, &selected.node.selection_set),
        None => Ok(Value::Null),
    }
}

fn type_value(
    ctx: &ContextSelectionSet<'_>,
    ty: &MetaType,
    selection_set: &Positioned<SelectionSet>,
) -> ValueResult<Value> {
    let mut object = Map::new();
    for selected in introspection_fields(ctx, selection_set)? {
        let value = match selected.node.name.node.as_str() {
            "kind" => json!(ty.kind()),
            "name" => json!(ty.name()),
            "description" => opt_string(ty.description()),
            "fields" => match ty.fields() {
                Some(fields) => Value::Array(
                    fields
                        .values()
                        .map(|field| field_value(ctx, field, &selected.node.selection_set))
                        .collect::<ValueResult<_>>()?,
                ),
                None => Value::Null,
            },
            "interfaces" => match ty {
                MetaType::Object(object_type) => Value::Array(
                    object_type
                        .implements
                        .iter()
                        .filter_map(|name| ctx.registry().lookup_type(name))
                        .map(|interface| type_value(ctx, interface, &selected.node.selection_set))
                        .collect::<ValueResult<_>>()?,
                ),
                _ => Value::Null,
            },
            "possibleTypes" => match ty.possible_types() {
                Some(possible) => Value::Array(
                    possible
                        .iter()
                        .filter_map(|name| ctx.registry().lookup_type(name))
                        .map(|member| type_value(ctx, member, &selected.node.selection_set))
                        .collect::<ValueResult<_>>()?,
                ),
                None => Value::Null,
            },
            "enumValues" => match ty {
                MetaType::Enum(enum_type) => Value::Array(
                    enum_type
                        .values
                        .values()
                        .map(|value| enum_value(ctx, value, &selected.node.selection_set))
                        .collect::<ValueResult<_>>()?,
                ),
                _ => Value::Null,
            },
            "inputFields" => Value::Null,
            "ofType" => Value::Null,
            "__typename" => json!("__Type"),
            _ => Value::Null,
        };
        insert(&mut object, selected, value);
    }
    Ok(Value::Object(object))
}

fn field_value(
    ctx: &ContextSelectionSet<'_>,
    field: &MetaField,
    selection_set: &Positioned<SelectionSet>,
) -> ValueResult<Value> {
    let mut object = Map::new();
    for selected in introspection_fields(ctx, selection_set)? {
        let value = match selected.node.name.node.as_str() {
            "name" => json!(field.name),
            "description" => opt_string(field.description.as_deref()),
            "args" => Value::Array(
                field
                    .args
                    .values()
                    .map(|arg| input_value(ctx, arg, &selected.node.selection_set))
                    .collect::<ValueResult<_>>()?,
            ),
            "type" => type_ref_value(ctx, field.ty.as_str(), &selected.node.selection_set)?,
            "isDeprecated" => json!(false),
            "deprecationReason" => Value::Null,
            "__typename" => json!("__Field"),
            _ => Value::Null,
        };
        insert(&mut object, selected, value);
    }
    Ok(Value::Object(object))
}

fn input_value(
    ctx: &ContextSelectionSet<'_>,
    input: &MetaInputValue,
    selection_set: &Positioned<SelectionSet>,
) -> ValueResult<Value> {
    let mut object = Map::new();
    for selected in introspection_fields(ctx, selection_set)? {
        let value = match selected.node.name.node.as_str() {
            "name" => json!(input.name),
            "description" => opt_string(input.description.as_deref()),
            "type" => type_ref_value(ctx, input.ty.as_str(), &selected.node.selection_set)?,
            "defaultValue" => match &input.default_value {
                Some(default) => json!(default.to_string()),
                None => Value::Null,
            },
            "__typename" => json!("__InputValue"),
            _ => Value::Null,
        };
        insert(&mut object, selected, value);
    }
    Ok(Value::Object(object))
}

fn enum_value(
    ctx: &ContextSelectionSet<'_>,
    value: &crate::registry::MetaEnumValue,
    selection_set: &Positioned<SelectionSet>,
) -> ValueResult<Value> {
    let mut object = Map::new();
    for selected in introspection_fields(ctx, selection_set)? {
        let resolved = match selected.node.name.node.as_str() {
            "name" => json!(value.name),
            "description" => opt_string(value.description.as_deref()),
            "isDeprecated" => json!(false),
            "deprecationReason" => Value::Null,
            "__typename" => json!("__EnumValue"),
            _ => Value::Null,
        };
        insert(&mut object, selected, resolved);
    }
    Ok(Value::Object(object))
}

fn directive_value(
    ctx: &ContextSelectionSet<'_>,
    directive: &DirectiveDefinition,
    selection_set: &Positioned<SelectionSet>,
) -> ValueResult<Value> {
    let mut object = Map::new();
    for selected in introspection_fields(ctx, selection_set)? {
        let value = match selected.node.name.node.as_str() {
            "name" => json!(directive.name),
            "description" => opt_string(directive.description.as_deref()),
            "locations" => Value::Array(
                directive
                    .locations
                    .iter()
                    .map(|location| json!(location.as_str()))
                    .collect(),
            ),
            "args" => Value::Array(
                directive
                    .args
                    .values()
                    .map(|arg| input_value(ctx, arg, &selected.node.selection_set))
                    .collect::<ValueResult<_>>()?,
            ),
            "isRepeatable" => json!(false),
            "__typename" => json!("__Directive"),
            _ => Value::Null,
        };
        insert(&mut object, selected, value);
    }
    Ok(Value::Object(object))
}

/// A type reference, peeling list and non-null wrappers into `ofType`
/// chains.
fn type_ref_value(
    ctx: &ContextSelectionSet<'_>,
    ty: &str,
    selection_set: &Positioned<SelectionSet>,
) -> ValueResult<Value> {
    let (kind, inner) = match MetaTypeName::create(ty) {
        MetaTypeName::NonNull(inner) => ("NON_NULL", inner),
        MetaTypeName::List(inner) => ("LIST", inner),
        MetaTypeName::Named(name) => {
            return match ctx.registry().lookup_type(name) {
                Some(ty) => type_value(ctx, ty, selection_set),
                None => Ok(json!({ "name": name, "__typename": "__Type" })),
            };
        }
    };

    let mut object = Map::new();
    for selected in introspection_fields(ctx, selection_set)? {
        let value = match selected.node.name.node.as_str() {
            "kind" => json!(kind),
            "name" => Value::Null,
            "ofType" => type_ref_value(ctx, inner, &selected.node.selection_set)?,
            "__typename" => json!("__Type"),
            _ => Value::Null,
        };
        insert(&mut object, selected, value);
    }
    Ok(Value::Object(object))
}

/// Flatten an introspection selection set into its field nodes, expanding
/// fragments unconditionally and honoring `@skip` / `@include`.
fn introspection_fields<'a>(
    ctx: &ContextSelectionSet<'a>,
    selection_set: &'a Positioned<SelectionSet>,
) -> ValueResult<Vec<&'a Positioned<Field>>> {
    let mut fields = Vec::with_capacity(selection_set.node.items.len());
    for selection in &selection_set.node.items {
        match &selection.node {
            Selection::Field(field) => {
                if !should_skip(ctx, &field.node.directives)? {
                    fields.push(field);
                }
            }
            Selection::InlineFragment(fragment) => {
                if !should_skip(ctx, &fragment.node.directives)? {
                    fields.extend(introspection_fields(ctx, &fragment.node.selection_set)?);
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
                fields.extend(introspection_fields(ctx, &fragment.node.selection_set)?);
            }
        }
    }
    Ok(fields)
}

fn insert(object: &mut Map<String, Value>, field: &Positioned<Field>, value: Value) {
    object.insert(field.node.response_key().node.to_string(), value);
}

fn opt_string(value: Option<&str>) -> Value {
    match value {
        Some(value) => json!(value),
        None => Value::Null,
    }
}
