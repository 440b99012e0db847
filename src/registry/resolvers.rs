//! User-supplied resolution hooks.

use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use async_graphql_parser::types::Field;
use async_graphql_parser::Positioned;
use async_graphql_value::{ConstValue, Name};
use indexmap::IndexMap;
use serde_json::Value;

use crate::context::Data;
use crate::error::ResolverError;
use crate::query_path::QueryPath;

/// The coerced arguments of one field invocation.
pub type ResolverArguments = IndexMap<Name, ConstValue>;

/// Everything a resolver (or middleware) can see about the field it is
/// resolving.
pub struct ResolverContext<'a> {
    /// The JSON value produced by the parent resolver.
    pub parent_value: &'a Value,
    /// Arguments, coerced against the field definition.
    pub args: &'a ResolverArguments,
    /// The AST node being resolved. Scoped to this invocation.
    pub field: &'a Positioned<Field>,
    /// Name of the concrete object type the field was selected on.
    pub parent_type: &'a str,
    /// Response path of the field.
    pub path: &'a QueryPath,
    pub(crate) request_data: &'a Data,
    pub(crate) schema_data: &'a Data,
}

impl<'a> ResolverContext<'a> {
    /// An argument by name, if it was provided or has a default.
    pub fn arg(&self, name: &str) -> Option<&'a ConstValue> {
        self.args.get(name)
    }

    /// Data attached to the request or, failing that, the schema.
    pub fn data<D: Any + Send + Sync>(&self) -> Option<&'a D> {
        self.request_data.get::<D>().or_else(|| self.schema_data.get::<D>())
    }
}

impl Debug for ResolverContext<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverContext")
            .field("parent_type", &self.parent_type)
            .field("path", &self.path)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// A field resolver: maps the parent value and the coerced arguments to a
/// JSON value, or signals a failure.
///
/// Fields without a resolver fall back to a property lookup on the parent
/// value under the field's name.
#[derive(Clone)]
pub struct Resolver(Arc<ResolverFn>);

type ResolverFn = dyn Fn(&ResolverContext<'_>) -> Result<Value, ResolverError> + Send + Sync;

impl Resolver {
    pub fn new(
        f: impl Fn(&ResolverContext<'_>) -> Result<Value, ResolverError> + Send + Sync + 'static,
    ) -> Self {
        Resolver(Arc::new(f))
    }

    /// A resolver that always produces the same value.
    pub fn constant(value: Value) -> Self {
        Resolver::new(move |_| Ok(value.clone()))
    }

    pub(crate) fn resolve(&self, ctx: &ResolverContext<'_>) -> Result<Value, ResolverError> {
        (self.0)(ctx)
    }
}

impl Debug for Resolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver")
    }
}

/// Picks the concrete object type name for a value sitting at an interface
/// or union position.
///
/// When a type has no registered resolver, the value's `"__typename"`
/// property decides.
#[derive(Clone)]
pub struct TypeResolver(Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>);

impl TypeResolver {
    pub fn new(f: impl Fn(&Value) -> Option<String> + Send + Sync + 'static) -> Self {
        TypeResolver(Arc::new(f))
    }

    pub(crate) fn resolve(&self, value: &Value) -> Option<String> {
        (self.0)(value)
    }
}

impl Debug for TypeResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("TypeResolver")
    }
}
