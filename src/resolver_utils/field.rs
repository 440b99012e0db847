//! Resolving one field: run the middleware chain, capture execution errors,
//! then coerce the resolved value under the field's type.

use serde_json::Value;

use super::{list::resolve_list, resolve_container, typecast};
use crate::context::{ContextExt, ContextField};
use crate::error::{ResolverError, ServerError, ValueError, ValueResult};
use crate::middleware::NextResolver;
use crate::query_path::QueryPath;
use crate::registry::{MetaType, MetaTypeName, ResolverContext};
use crate::resolver_utils::from_arguments;

/// Resolve the field inside `ctx` against `parent_value`.
///
/// Execution errors from the chain are captured here: they are recorded on
/// the query and the field takes the value null, which the type check below
/// then treats as already covered. Anything else unwinds.
pub(crate) fn resolve_field(ctx: &ContextField<'_>, parent_value: &Value) -> ValueResult<Value> {
    let args = match from_arguments(ctx, ctx.item.pos, &ctx.item.node.arguments, &ctx.field.args) {
        Ok(args) => args,
        Err(error) => return errored_null(ctx, error),
    };

    let resolver_ctx = ResolverContext {
        parent_value,
        args: &args,
        field: ctx.item,
        parent_type: ctx.parent_type.name(),
        path: &ctx.path,
        request_data: ctx.query_env.ctx_data.as_ref(),
        schema_data: &ctx.schema_env.data,
    };
    let chain = NextResolver {
        chain: &ctx.schema_env.middlewares,
        field: ctx.field,
    };

    match chain.run(&resolver_ctx) {
        Ok(value) => resolve_value(ctx, &ctx.path, ctx.field.ty.as_str(), value, false),
        Err(ResolverError::Execution(error)) => errored_null(ctx, error.into_server_error(ctx.item.pos)),
        Err(ResolverError::Fatal(error)) => Err(ValueError::Fatal(
            ctx.set_error_path(error.into_server_error(ctx.item.pos)),
        )),
    }
}

/// A captured execution error: attach the field's path, record it, then
/// coerce null with the error already covered so a non-null field type does
/// not record it twice.
fn errored_null(ctx: &ContextField<'_>, error: ServerError) -> ValueResult<Value> {
    ctx.add_error(ctx.set_error_path(error));
    resolve_value(ctx, &ctx.path, ctx.field.ty.as_str(), Value::Null, true)
}

/// Coerce `value` under the type string `ty` at `path`.
///
/// `covered` marks a null that stands in for an already-recorded execution
/// error; the propagation it may raise is then not recorded again.
pub(crate) fn resolve_value(
    ctx: &ContextField<'_>,
    path: &QueryPath,
    ty: &str,
    value: Value,
    covered: bool,
) -> ValueResult<Value> {
    let type_name = MetaTypeName::create(ty);

    if value.is_null() {
        return match type_name {
            MetaTypeName::NonNull(_) => Err(ValueError::Propagate {
                error: invalid_null(ctx, path),
                recorded: covered,
            }),
            _ => Ok(Value::Null),
        };
    }

    match type_name {
        MetaTypeName::NonNull(inner) => resolve_value(ctx, path, inner, value, covered),
        MetaTypeName::List(inner) => resolve_list(ctx, path, inner, value),
        MetaTypeName::Named(name) => {
            let ty = ctx
                .registry()
                .lookup_type(name)
                .ok_or_else(|| fatal(ctx, path, format!("Unknown type `{name}`")))?;
            match ty {
                MetaType::Scalar(scalar) => {
                    if scalar.coerce_result(&value) {
                        Ok(value)
                    } else {
                        Err(ValueError::propagate(positioned(
                            ctx,
                            path,
                            format!("Invalid value for the scalar `{name}`"),
                        )))
                    }
                }
                MetaType::Enum(enum_type) => enum_type.coerce_result(&value).ok_or_else(|| {
                    ValueError::propagate(positioned(
                        ctx,
                        path,
                        format!("Invalid value for the enum `{name}`"),
                    ))
                }),
                MetaType::Object(_) => resolve_container(&ctx.with_selections(path.clone(), ty), &value),
                MetaType::Interface(_) | MetaType::Union(_) => {
                    let concrete = typecast::runtime_type(ctx.registry(), ty, &value)
                        .filter(|concrete| concrete.is_object())
                        .ok_or_else(|| {
                            fatal(ctx, path, format!("Failed to resolve the concrete type of `{name}`"))
                        })?;
                    resolve_container(&ctx.with_selections(path.clone(), concrete), &value)
                }
            }
        }
    }
}

fn invalid_null(ctx: &ContextField<'_>, path: &QueryPath) -> ServerError {
    tracing::warn!(
        path = %path,
        field = %ctx.item.node.name.node,
        "null resolved at a non-null position"
    );
    positioned(
        ctx,
        path,
        format!(
            "An error occurred while fetching `{}`, a non-nullable value was expected but no value was found.",
            ctx.item.node.name.node
        ),
    )
}

fn positioned(ctx: &ContextField<'_>, path: &QueryPath, message: String) -> ServerError {
    ServerError {
        message,
        locations: vec![ctx.item.pos],
        path: path.iter().cloned().collect(),
    }
}

fn fatal(ctx: &ContextField<'_>, path: &QueryPath, message: String) -> ValueError {
    ValueError::Fatal(positioned(ctx, path, message))
}
