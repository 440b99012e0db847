//! Materializing AST arguments against their definitions.

use std::borrow::{Borrow, Cow};

use async_graphql_parser::{Pos, Positioned};
use async_graphql_value::{ConstValue, Name, Value as InputValue};
use indexmap::IndexMap;

use crate::context::ContextExt;
use crate::error::{Error, ServerResult};
use crate::registry::{EnumType, MetaInputValue, MetaType, MetaTypeName, Registry, ResolverArguments};

/// Coerce a field's or directive's AST arguments into the value map its
/// resolver receives.
///
/// Definitions drive the walk: defaults are applied, variables substituted,
/// non-null types checked, single values coerced into lists. Provided
/// arguments without a definition are dropped; validation happens upstream.
pub(crate) fn from_arguments<'a>(
    ctx: &impl ContextExt<'a>,
    error_pos: Pos,
    arguments: &[(Positioned<Name>, Positioned<InputValue>)],
    definitions: &IndexMap<String, MetaInputValue>,
) -> ServerResult<ResolverArguments> {
    let mut coerced = IndexMap::with_capacity(definitions.len());
    for definition in definitions.values() {
        let provided = arguments
            .iter()
            .find(|(name, _)| name.node.as_str() == definition.name)
            .map(|(_, value)| ctx.resolve_input_value(value.clone()))
            .transpose()?;

        let rctx = ResolveContext {
            registry: ctx.registry(),
            path: PathNode::new(&definition.name),
            ty: Cow::Borrowed(definition.ty.as_str()),
            allow_list_coercion: true,
            default_value: definition.default_value.as_ref(),
        };
        if let Some(value) = resolve_maybe_absent_input(rctx, provided)
            .map_err(|err| err.into_server_error(error_pos))?
        {
            coerced.insert(Name::new(&definition.name), value);
        }
    }
    Ok(coerced)
}

#[derive(Clone, Copy)]
struct PathNode<'a> {
    name: &'a str,
    previous: Option<&'a PathNode<'a>>,
}

impl<'a> PathNode<'a> {
    fn new(name: &'a str) -> PathNode<'a> {
        PathNode { name, previous: None }
    }

    fn with(&'a self, name: &'a str) -> PathNode<'a> {
        PathNode {
            name,
            previous: Some(self),
        }
    }

    fn to_vec(&self) -> Vec<String> {
        let mut previous = self.previous.map(PathNode::to_vec).unwrap_or_default();
        previous.push(self.name.to_string());
        previous
    }
}

#[derive(Clone)]
struct ResolveContext<'a> {
    registry: &'a Registry,
    path: PathNode<'a>,
    /// Expected GraphQL input type.
    ty: Cow<'a, str>,
    /// Whether a single value may still be coerced into a one-element list
    /// at this point.
    allow_list_coercion: bool,
    default_value: Option<&'a ConstValue>,
}

impl<'a> ResolveContext<'a> {
    fn input_error(&self, expected: &str) -> Error {
        Error::new(format!("{expected} for {}", self.path.to_vec().join(".")))
    }
}

fn resolve_maybe_absent_input(
    rctx: ResolveContext<'_>,
    value: Option<ConstValue>,
) -> Result<Option<ConstValue>, Error> {
    match value.or_else(|| rctx.default_value.cloned()) {
        Some(value) => resolve_present_input(rctx, value).map(Some),
        None => matches!(MetaTypeName::create(rctx.ty.borrow()), MetaTypeName::NonNull(_))
            .then_some(Err(rctx.input_error("Unexpected null value")))
            .transpose(),
    }
}

fn resolve_present_input(rctx: ResolveContext<'_>, value: ConstValue) -> Result<ConstValue, Error> {
    match MetaTypeName::create(rctx.ty.borrow()) {
        MetaTypeName::NonNull(type_name) => {
            if matches!(value, ConstValue::Null) {
                return Err(rctx.input_error("Unexpected null value"));
            }
            resolve_present_input(
                ResolveContext {
                    ty: Cow::Borrowed(type_name),
                    ..rctx
                },
                value,
            )
        }
        MetaTypeName::List(type_name) => {
            if matches!(value, ConstValue::Null) {
                return Ok(value);
            }
            if let ConstValue::List(list) = value {
                let rctx = ResolveContext {
                    ty: Cow::Borrowed(type_name),
                    allow_list_coercion: list.len() <= 1,
                    default_value: None,
                    ..rctx
                };
                let mut items = Vec::with_capacity(list.len());
                for (idx, element) in list.into_iter().enumerate() {
                    let path = idx.to_string();
                    let rctx = ResolveContext {
                        path: rctx.path.with(&path),
                        ..rctx.clone()
                    };
                    items.push(resolve_present_input(rctx, element)?);
                }
                Ok(ConstValue::List(items))
            } else if rctx.allow_list_coercion {
                Ok(ConstValue::List(vec![resolve_present_input(
                    ResolveContext {
                        ty: Cow::Borrowed(type_name),
                        allow_list_coercion: true,
                        default_value: None,
                        ..rctx
                    },
                    value,
                )?]))
            } else {
                Err(rctx.input_error("Expected a List"))
            }
        }
        MetaTypeName::Named(type_name) => {
            if matches!(value, ConstValue::Null) {
                return Ok(value);
            }
            match rctx.registry.lookup_type(type_name) {
                Some(MetaType::Enum(enum_type)) => resolve_input_enum(rctx, value, enum_type),
                Some(MetaType::Scalar(_)) => Ok(value),
                Some(_) => Err(rctx.input_error(&format!("`{type_name}` is not an input type"))),
                None => Err(rctx.input_error(&format!("Unknown type `{type_name}`"))),
            }
        }
    }
}

fn resolve_input_enum(
    rctx: ResolveContext<'_>,
    value: ConstValue,
    ty: &EnumType,
) -> Result<ConstValue, Error> {
    let name = match &value {
        ConstValue::Enum(name) => name.as_str(),
        ConstValue::String(string) => string.as_str(),
        _ => return Err(rctx.input_error("Expected an enum value")),
    };
    if !ty.contains(name) {
        return Err(rctx.input_error(&format!("Unknown enum value `{name}`")));
    }
    Ok(ConstValue::Enum(Name::new(name)))
}
