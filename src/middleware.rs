//! The middleware chain wrapped around every field resolution.

use serde_json::Value;

use crate::error::ResolverError;
use crate::registry::{MetaField, ResolverContext};

/// A step wrapped around every field resolution.
///
/// A middleware either calls `next.run(ctx)` to continue the chain or
/// short-circuits with its own value or error. The terminal step — the
/// field's resolver, or a property lookup on the parent value — is injected
/// by the engine.
pub trait Middleware: Send + Sync + 'static {
    fn resolve(&self, ctx: &ResolverContext<'_>, next: NextResolver<'_>) -> Result<Value, ResolverError>;
}

impl<F> Middleware for F
where
    F: Fn(&ResolverContext<'_>, NextResolver<'_>) -> Result<Value, ResolverError> + Send + Sync + 'static,
{
    fn resolve(&self, ctx: &ResolverContext<'_>, next: NextResolver<'_>) -> Result<Value, ResolverError> {
        self(ctx, next)
    }
}

/// The remainder of the middleware chain, ending at the field's resolver.
pub struct NextResolver<'a> {
    pub(crate) chain: &'a [Box<dyn Middleware>],
    pub(crate) field: &'a MetaField,
}

impl NextResolver<'_> {
    /// Run the rest of the chain.
    pub fn run(self, ctx: &ResolverContext<'_>) -> Result<Value, ResolverError> {
        match self.chain.split_first() {
            Some((head, rest)) => head.resolve(
                ctx,
                NextResolver {
                    chain: rest,
                    field: self.field,
                },
            ),
            None => terminal(ctx, self.field),
        }
    }
}

/// The terminal step of every chain: invoke the field's resolver, or fall
/// back to reading the field's name off the parent value.
fn terminal(ctx: &ResolverContext<'_>, field: &MetaField) -> Result<Value, ResolverError> {
    match &field.resolver {
        Some(resolver) => resolver.resolve(ctx),
        None => Ok(ctx
            .parent_value
            .get(field.name.as_str())
            .cloned()
            .unwrap_or(Value::Null)),
    }
}
