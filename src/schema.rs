//! The schema: a compiled registry plus middlewares, and the two execution
//! strategies that run queries against it.

use std::any::Any;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use async_graphql_parser::types::{DocumentOperations, Field, OperationType, SelectionSet};
use async_graphql_parser::{parse_query, Positioned};
use async_graphql_value::Name;
use serde_json::Value;

use crate::context::{ContextField, ContextSelectionSet, Data, QueryEnv, QueryEnvInner};
use crate::deferred::{workload_channel, DeferredWorkload, DeferredWorkloadSender};
use crate::error::{ServerError, ValueError};
use crate::middleware::Middleware;
use crate::query_path::{PathSegment, QueryPath};
use crate::registry::{Registry, SchemaError};
use crate::request::Request;
use crate::resolver_utils::{resolve_container, resolve_field};
use crate::response::{PatchSender, Response, ResponsePatch};

#[doc(hidden)]
pub struct SchemaEnvInner {
    pub registry: Registry,
    pub data: Data,
    pub middlewares: Vec<Box<dyn Middleware>>,
}

/// Context scoped to a schema, shared by every query it executes.
#[derive(Clone)]
pub struct SchemaEnv(Arc<SchemaEnvInner>);

impl Deref for SchemaEnv {
    type Target = SchemaEnvInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Schema builder.
pub struct SchemaBuilder {
    registry: Registry,
    data: Data,
    middlewares: Vec<Box<dyn Middleware>>,
}

impl SchemaBuilder {
    /// Attach data that can be accessed from every resolver.
    #[must_use]
    pub fn data<D: Any + Send + Sync>(mut self, data: D) -> Self {
        self.data.insert(data);
        self
    }

    /// Append a middleware to the chain. Middlewares run in the order they
    /// were added, the first one outermost.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    pub fn finish(self) -> Result<Schema, SchemaError> {
        self.registry.validate()?;
        Ok(Schema(SchemaEnv(Arc::new(SchemaEnvInner {
            registry: self.registry,
            data: self.data,
            middlewares: self.middlewares,
        }))))
    }
}

/// A compiled GraphQL schema. Cheap to clone and share.
#[derive(Clone)]
pub struct Schema(SchemaEnv);

impl Schema {
    pub fn build(registry: Registry) -> SchemaBuilder {
        SchemaBuilder {
            registry,
            data: Data::default(),
            middlewares: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.0.registry
    }

    /// Execute a request serially and return the complete response.
    ///
    /// `@defer` is semantically ignored here: with no way to deliver
    /// patches, deferred fields resolve inline.
    pub fn execute(&self, request: impl Into<Request>) -> Response {
        let env = match self.prepare(request.into(), None) {
            Ok(env) => env,
            Err(error) => return Response::from_errors(vec![error]),
        };
        match self.resolve_root(&env) {
            Ok(data) => Response {
                data,
                errors: env.take_errors(),
            },
            Err(fatal) => {
                let mut errors = env.take_errors();
                errors.push(fatal);
                Response::from_errors(errors)
            }
        }
    }

    /// Execute a request with incremental delivery.
    ///
    /// The initial response goes to the collector as a patch at the empty
    /// path, with fields parked by `@defer` left out. Parked frames are then
    /// drained in the order they were parked — parents before the defers
    /// they spawn — each producing a patch under `"data"` for its value (no
    /// patch when it resolves to null) followed by one patch per error under
    /// `"errors"`, with indices assigned monotonically across the whole
    /// query.
    ///
    /// A fatal error aborts everything: `Err` is returned and no further
    /// patches are emitted. When the initial phase is the one that fails,
    /// the collector sees no patches at all.
    pub fn execute_incremental(
        &self,
        request: impl Into<Request>,
        patches: &PatchSender,
    ) -> Result<(), ServerError> {
        let (sender, mut workloads) = workload_channel();
        let env = self.prepare(request.into(), Some(sender))?;

        let data = self.resolve_root(&env)?;
        let initial = Response {
            data,
            errors: env.take_errors(),
        };
        let mut error_idx = initial.errors.len();
        send_patch(patches, ResponsePatch::new(Vec::new(), to_json(&initial)?))?;

        while let Some(workload) = workloads.receive() {
            let resolved = self.resolve_workload(&env, &workload)?;
            if let Some(value) = resolved {
                let mut path = vec![PathSegment::from("data")];
                path.extend(workload.path.iter().cloned());
                send_patch(patches, ResponsePatch::new(path, value))?;
            }
            for error in env.take_errors() {
                send_patch(
                    patches,
                    ResponsePatch::new(vec!["errors".into(), error_idx.into()], to_json(&error)?),
                )?;
                error_idx += 1;
            }
        }
        Ok(())
    }

    /// Parse the request and pick the operation to run.
    fn prepare(
        &self,
        request: Request,
        deferred_workloads: Option<DeferredWorkloadSender>,
    ) -> Result<QueryEnv, ServerError> {
        let document =
            parse_query(&request.query).map_err(|error| ServerError::new(error.to_string(), None))?;

        let operation = match (document.operations, request.operation_name.as_deref()) {
            (DocumentOperations::Single(operation), _) => operation,
            (DocumentOperations::Multiple(mut operations), Some(name)) => operations
                .remove(&Name::new(name))
                .ok_or_else(|| ServerError::new(format!("Unknown operation named `{name}`"), None))?,
            (DocumentOperations::Multiple(operations), None) => {
                let mut operations = operations.into_iter();
                match (operations.next(), operations.next()) {
                    (Some((_, operation)), None) => operation,
                    _ => return Err(ServerError::new("Operation name required in request", None)),
                }
            }
        };

        if operation.node.ty == OperationType::Subscription {
            return Err(ServerError::new(
                "Subscriptions are not supported by this executor",
                None,
            ));
        }
        tracing::debug!(operation_type = %operation.node.ty, "executing operation");

        Ok(QueryEnv::new(QueryEnvInner {
            operation,
            fragments: document.fragments,
            variables: request.variables,
            root_value: request.root_value,
            ctx_data: Arc::new(request.data),
            errors: Mutex::new(Vec::new()),
            deferred_workloads,
        }))
    }

    /// Resolve the operation's selection set against the root value.
    fn resolve_root(&self, env: &QueryEnv) -> Result<Value, ServerError> {
        let registry = &self.0.registry;
        let root_name = match env.operation.node.ty {
            OperationType::Query => registry.query_type.as_str(),
            OperationType::Mutation => registry.mutation_type.as_deref().ok_or_else(|| {
                ServerError::new("Mutations are not supported by this schema", None)
            })?,
            OperationType::Subscription => {
                return Err(ServerError::new(
                    "Subscriptions are not supported by this executor",
                    None,
                ))
            }
        };
        let root_type = registry
            .lookup_type(root_name)
            .ok_or_else(|| ServerError::new(format!("Unknown root type `{root_name}`"), None))?;

        let ctx = ContextSelectionSet {
            path: QueryPath::empty(),
            ty: root_type,
            selection_sets: vec![&env.operation.node.selection_set],
            schema_env: &self.0,
            query_env: env,
        };
        match resolve_container(&ctx, &env.root_value) {
            Ok(value) => Ok(value),
            Err(ValueError::Propagate { error, recorded }) => {
                // Bubbled past the root: the data itself becomes null.
                if !recorded {
                    env.errors.lock().unwrap().push(error);
                }
                Ok(Value::Null)
            }
            Err(ValueError::Fatal(error)) => Err(error),
        }
    }

    /// Resolve one parked frame. Returns the value to patch in, or `None`
    /// when the frame resolved to null — absent keys already read as null.
    fn resolve_workload(
        &self,
        env: &QueryEnv,
        workload: &DeferredWorkload,
    ) -> Result<Option<Value>, ServerError> {
        let registry = &self.0.registry;
        let parent_type = registry.lookup_type(&workload.parent_type).ok_or_else(|| {
            ServerError::new(format!("Unknown type `{}`", workload.parent_type), None)
        })?;
        let field_name = workload.field.node.name.node.as_str();
        let field = parent_type.field(field_name).ok_or_else(|| {
            ServerError::new(
                format!("Could not find a field named `{field_name}` on `{}`", workload.parent_type),
                Some(workload.field.node.name.pos),
            )
        })?;

        let ctx = ContextField {
            path: workload.path.clone(),
            item: &workload.field,
            field,
            parent_type,
            selection_sets: child_selections(&workload.field),
            schema_env: &self.0,
            query_env: env,
        };
        match resolve_field(&ctx, &workload.parent_value) {
            Ok(Value::Null) => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(ValueError::Propagate { error, recorded }) => {
                // Recorded on the phase it occurred in; patches already
                // emitted are never amended.
                if !recorded {
                    env.errors.lock().unwrap().push(error);
                }
                Ok(None)
            }
            Err(ValueError::Fatal(error)) => Err(error),
        }
    }
}

fn child_selections(field: &Positioned<Field>) -> Vec<&Positioned<SelectionSet>> {
    if field.node.selection_set.node.items.is_empty() {
        Vec::new()
    } else {
        vec![&field.node.selection_set]
    }
}

fn send_patch(patches: &PatchSender, patch: ResponsePatch) -> Result<(), ServerError> {
    patches
        .send(patch)
        .map_err(|error| ServerError::new(error.message, None))
}

fn to_json(value: &impl serde::Serialize) -> Result<Value, ServerError> {
    serde_json::to_value(value).map_err(|error| ServerError::new(error.to_string(), None))
}
