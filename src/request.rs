//! The front door of a query execution.

use std::fmt::{self, Debug, Formatter};

use async_graphql_value::Variables;
use serde::{Deserialize, Serialize};

use crate::context::Data;

/// A GraphQL request: the query source plus everything execution needs.
///
/// This can be deserialized from the usual request structure; the names are
/// all in `camelCase` (e.g. `operationName`).
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// The query source of the request.
    #[serde(default)]
    pub query: String,

    /// The operation to execute, when the document holds more than one.
    #[serde(default)]
    pub operation_name: Option<String>,

    /// The variables of the request.
    #[serde(default)]
    pub variables: Variables,

    /// The value the root type's resolvers receive as their parent.
    #[serde(default)]
    pub root_value: serde_json::Value,

    /// Data readable from resolvers through `ResolverContext::data`.
    ///
    /// **This data is only valid for this request.**
    #[serde(skip)]
    pub data: Data,
}

impl Request {
    /// Create a request object with query source.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            operation_name: None,
            variables: Variables::default(),
            root_value: serde_json::Value::Null,
            data: Data::default(),
        }
    }

    /// Specify the operation name of the request.
    #[must_use]
    pub fn with_operation_name<T: Into<String>>(self, name: T) -> Self {
        Self {
            operation_name: Some(name.into()),
            ..self
        }
    }

    /// Specify the variables.
    #[must_use]
    pub fn variables(self, variables: Variables) -> Self {
        Self { variables, ..self }
    }

    /// Specify the root value.
    #[must_use]
    pub fn root_value(self, root_value: serde_json::Value) -> Self {
        Self { root_value, ..self }
    }

    /// Insert data that can be accessed from resolvers.
    #[must_use]
    pub fn data<D: std::any::Any + Send + Sync>(mut self, data: D) -> Self {
        self.data.insert(data);
        self
    }
}

impl<T: Into<String>> From<T> for Request {
    fn from(query: T) -> Self {
        Request::new(query)
    }
}

impl Debug for Request {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("query", &self.query)
            .field("operation_name", &self.operation_name)
            .field("variables", &self.variables)
            .field("root_value", &self.root_value)
            .finish_non_exhaustive()
    }
}
