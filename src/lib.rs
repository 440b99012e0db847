//! A GraphQL execution engine with incremental (`@defer`) delivery.
//!
//! The engine traverses a parsed operation against a typed [`Registry`] and
//! a root value, producing a JSON result tree. Fields annotated `@defer`
//! are excluded from the initial response and delivered afterwards as
//! [`ResponsePatch`]es — path plus value — over a [`patch_channel`], so
//! large or slow portions of a response can arrive incrementally.
//!
//! Two strategies share one resolution core. [`Schema::execute`] runs a
//! query to completion and returns the whole tree; with no way to deliver
//! patches, `@defer` is ignored. [`Schema::execute_incremental`] emits the
//! initial tree as a patch at the empty path and then drains deferred
//! frames in the order they were parked.
//!
//! ```
//! use serde_json::json;
//! use trickle::{
//!     ConstValue, MetaField, MetaInputValue, ObjectType, Registry, Request, Resolver,
//!     ScalarType, Schema,
//! };
//!
//! let mut registry = Registry::new("Query");
//! registry.insert_type(ScalarType::new("String"));
//! registry.insert_type(ObjectType::new(
//!     "Query",
//!     [MetaField::new("greeting", "String!")
//!         .with_argument(MetaInputValue::new("name", "String!"))
//!         .with_resolver(Resolver::new(|ctx| {
//!             let name = match ctx.arg("name") {
//!                 Some(ConstValue::String(name)) => name.as_str(),
//!                 _ => "stranger",
//!             };
//!             Ok(json!(format!("Hello, {name}!")))
//!         }))],
//! ));
//! let schema = Schema::build(registry).finish().unwrap();
//!
//! let response = schema.execute(Request::new(r#"{ greeting(name: "Brie") }"#));
//! assert_eq!(response.data, json!({ "greeting": "Hello, Brie!" }));
//! ```
//!
//! Parsing is delegated to `async-graphql-parser`; validation is assumed to
//! have happened upstream.

mod context;
mod deferred;
mod directives;
mod error;
mod middleware;
mod query_path;
mod registry;
mod request;
mod resolver_utils;
mod response;
mod schema;

pub use async_graphql_parser::{Pos, Positioned};
pub use async_graphql_value::{ConstValue, Name, Variables};

pub use context::{ContextExt, ContextField, ContextSelectionSet, Data, QueryEnv};
#[doc(hidden)]
pub use context::QueryEnvInner;
pub use deferred::DeferredWorkloadSender;
pub use directives::{DirectiveDefinition, DirectiveLocation, IncludeFn};
pub use error::{Error, ResolverError, Result, ServerError, ServerResult};
pub use middleware::{Middleware, NextResolver};
pub use query_path::{PathSegment, QueryPath};
pub use registry::{
    EnumType, InterfaceType, MetaEnumValue, MetaField, MetaFieldType, MetaInputValue, MetaType,
    MetaTypeName, ObjectType, Registry, Resolver, ResolverArguments, ResolverContext, ScalarType,
    SchemaError, TypeResolver, UnionType,
};
pub use request::Request;
pub use response::{patch_channel, PatchReceiver, PatchSender, Response, ResponsePatch};
pub use schema::{Schema, SchemaBuilder, SchemaEnv};
#[doc(hidden)]
pub use schema::SchemaEnvInner;
