//! Per-query context: the environments shared by every frame of a traversal
//! and the frames themselves.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use async_graphql_parser::types::{Field, FragmentDefinition, OperationDefinition, SelectionSet};
use async_graphql_parser::{Pos, Positioned};
use async_graphql_value::{ConstValue, Name, Value as InputValue, Variables};
use fnv::FnvHashMap;

use crate::deferred::DeferredWorkloadSender;
use crate::error::{ServerError, ServerResult};
use crate::query_path::QueryPath;
use crate::registry::{MetaField, MetaType, Registry};
use crate::schema::SchemaEnv;

/// Schema/request data.
///
/// This is a type map, allowing you to store anything inside it and read it
/// back from resolvers.
#[derive(Default)]
pub struct Data(FnvHashMap<TypeId, Box<dyn Any + Send + Sync>>);

impl Data {
    /// Insert data.
    pub fn insert<D: Any + Send + Sync>(&mut self, data: D) {
        self.0.insert(TypeId::of::<D>(), Box::new(data));
    }

    pub fn get<D: Any + Send + Sync>(&self) -> Option<&D> {
        self.0.get(&TypeId::of::<D>()).and_then(|data| data.downcast_ref())
    }
}

impl Debug for Data {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Data").finish()
    }
}

#[doc(hidden)]
pub struct QueryEnvInner {
    pub operation: Positioned<OperationDefinition>,
    pub fragments: HashMap<Name, Positioned<FragmentDefinition>>,
    pub variables: Variables,
    /// The value the root type's resolvers see as their parent.
    pub root_value: serde_json::Value,
    pub ctx_data: Arc<Data>,
    /// Errors recorded so far, in the order they were produced. Deferred
    /// phases note the buffer length before resolving and drain only what
    /// they appended, so error indices stay monotonic across the query.
    pub errors: Mutex<Vec<ServerError>>,
    /// A sender for workloads parked by `@defer`.
    ///
    /// `None` when the caller's transport cannot deliver incremental
    /// payloads; nothing is parked then and deferred fields resolve inline.
    pub deferred_workloads: Option<DeferredWorkloadSender>,
}

/// Context scoped to a whole query. Immutable during a phase apart from the
/// error buffer and the workload queue.
#[derive(Clone)]
pub struct QueryEnv(Arc<QueryEnvInner>);

impl Deref for QueryEnv {
    type Target = QueryEnvInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl QueryEnv {
    pub fn new(inner: QueryEnvInner) -> QueryEnv {
        QueryEnv(Arc::new(inner))
    }

    pub(crate) fn take_errors(&self) -> Vec<ServerError> {
        std::mem::take(&mut *self.errors.lock().unwrap())
    }
}

/// A frame over the selection sets applied to one concrete object type.
#[derive(Clone)]
pub struct ContextSelectionSet<'a> {
    /// The current response path.
    pub path: QueryPath,
    /// The concrete object type the selections apply to. Never an interface
    /// or union; abstract types are resolved before descending.
    pub ty: &'a MetaType,
    /// The selection sets merged into this frame. More than one only when
    /// co-named fields were merged.
    pub selection_sets: Vec<&'a Positioned<SelectionSet>>,
    pub schema_env: &'a SchemaEnv,
    pub query_env: &'a QueryEnv,
}

impl<'a> ContextSelectionSet<'a> {
    /// Descend into one collected field. The child path extends this frame's
    /// path by the field's response key.
    pub(crate) fn with_field(
        &self,
        item: &'a Positioned<Field>,
        field: &'a MetaField,
        selection_sets: Vec<&'a Positioned<SelectionSet>>,
    ) -> ContextField<'a> {
        ContextField {
            path: self.path.child(item.node.response_key().node.as_str()),
            item,
            field,
            parent_type: self.ty,
            selection_sets,
            schema_env: self.schema_env,
            query_env: self.query_env,
        }
    }
}

/// A frame over a single field of an object.
#[derive(Clone)]
pub struct ContextField<'a> {
    /// The response path, including this field's response key.
    pub path: QueryPath,
    /// The field node being resolved.
    pub item: &'a Positioned<Field>,
    /// The field's definition in the registry.
    pub field: &'a MetaField,
    /// The concrete object type the field was selected on.
    pub parent_type: &'a MetaType,
    /// Child selection sets (merged) for object-typed fields.
    pub selection_sets: Vec<&'a Positioned<SelectionSet>>,
    pub schema_env: &'a SchemaEnv,
    pub query_env: &'a QueryEnv,
}

impl<'a> ContextField<'a> {
    /// Descend into the object value of this field at `path`.
    pub(crate) fn with_selections(&self, path: QueryPath, ty: &'a MetaType) -> ContextSelectionSet<'a> {
        ContextSelectionSet {
            path,
            ty,
            selection_sets: self.selection_sets.clone(),
            schema_env: self.schema_env,
            query_env: self.query_env,
        }
    }
}

/// Shared behaviour of the traversal frames.
pub trait ContextExt<'a> {
    fn path(&self) -> &QueryPath;
    fn schema_env(&self) -> &'a SchemaEnv;
    fn query_env(&self) -> &'a QueryEnv;

    fn registry(&self) -> &'a Registry {
        &self.schema_env().registry
    }

    /// Find a fragment definition by name.
    fn get_fragment(&self, name: &str) -> Option<&'a Positioned<FragmentDefinition>> {
        self.query_env().fragments.get(name)
    }

    fn deferred_workloads(&self) -> Option<&'a DeferredWorkloadSender> {
        self.query_env().deferred_workloads.as_ref()
    }

    /// Record a field error on the query.
    fn add_error(&self, error: ServerError) {
        self.query_env().errors.lock().unwrap().push(error);
    }

    /// Attach the current path to an error that does not carry one yet.
    fn set_error_path(&self, error: ServerError) -> ServerError {
        if !error.path.is_empty() {
            return error;
        }
        ServerError {
            path: self.path().iter().cloned().collect(),
            ..error
        }
    }

    /// The value of a variable, falling back to its declared default.
    fn var_value(&self, name: &str, pos: Pos) -> ServerResult<ConstValue> {
        self.query_env()
            .operation
            .node
            .variable_definitions
            .iter()
            .find(|def| def.node.name.node.as_str() == name)
            .and_then(|def| {
                self.query_env()
                    .variables
                    .get(&def.node.name.node)
                    .or_else(|| def.node.default_value())
            })
            .cloned()
            .ok_or_else(|| ServerError::new(format!("Variable {name} is not defined."), Some(pos)))
    }

    /// Materialize an input literal, substituting variables.
    fn resolve_input_value(&self, value: Positioned<InputValue>) -> ServerResult<ConstValue> {
        let pos = value.pos;
        value.node.into_const_with(|name| self.var_value(&name, pos))
    }
}

impl<'a> ContextExt<'a> for ContextSelectionSet<'a> {
    fn path(&self) -> &QueryPath {
        &self.path
    }

    fn schema_env(&self) -> &'a SchemaEnv {
        self.schema_env
    }

    fn query_env(&self) -> &'a QueryEnv {
        self.query_env
    }
}

impl<'a> ContextExt<'a> for ContextField<'a> {
    fn path(&self) -> &QueryPath {
        &self.path
    }

    fn schema_env(&self) -> &'a SchemaEnv {
        self.schema_env
    }

    fn query_env(&self) -> &'a QueryEnv {
        self.query_env
    }
}
