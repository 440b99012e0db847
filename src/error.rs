use std::fmt::{self, Debug, Display, Formatter};

use async_graphql_parser::Pos;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::query_path::PathSegment;

/// An error raised by a resolver or middleware.
///
/// This is the message-only form errors take while a field is being resolved.
/// Once captured by the executor it is positioned and turned into a
/// [`ServerError`] for the response.
#[derive(Clone, PartialEq, Eq)]
pub struct Error {
    /// The error message.
    pub message: String,
}

impl Error {
    /// Create an error from the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Convert the error to a server error at the given position.
    #[must_use]
    pub fn into_server_error(self, pos: Pos) -> ServerError {
        ServerError {
            message: self.message,
            locations: vec![pos],
            path: Vec::new(),
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error").field("message", &self.message).finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::new(value.to_string())
    }
}

/// The failure modes a resolver or middleware can signal instead of a value.
#[derive(Clone, Debug)]
pub enum ResolverError {
    /// A user-visible field error.
    ///
    /// Recorded under `"errors"` in the response; the field takes the value
    /// null and resolution continues with sibling fields.
    Execution(Error),
    /// An unrecoverable condition.
    ///
    /// Aborts the whole operation. On incremental delivery no further
    /// patches are emitted once a fatal error is raised.
    Fatal(Error),
}

impl ResolverError {
    /// Shorthand for a user-visible field error.
    pub fn execution(message: impl Into<String>) -> Self {
        ResolverError::Execution(Error::new(message))
    }

    /// Shorthand for an operation-aborting error.
    pub fn fatal(message: impl Into<String>) -> Self {
        ResolverError::Fatal(Error::new(message))
    }
}

impl From<Error> for ResolverError {
    fn from(error: Error) -> Self {
        ResolverError::Execution(error)
    }
}

/// An error shaped for the `"errors"` list of a response.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ServerError {
    /// An explanatory message of the error.
    pub message: String,
    /// Where the error occurred in the query.
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "serialize_locations")]
    pub locations: Vec<Pos>,
    /// If the error occurred in a resolver, the response path to the error.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

impl ServerError {
    /// Create a new server error with the message.
    pub fn new(message: impl Into<String>, pos: Option<Pos>) -> Self {
        Self {
            message: message.into(),
            locations: pos.map(|pos| vec![pos]).unwrap_or_default(),
            path: Vec::new(),
        }
    }
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ServerError {}

fn serialize_locations<S>(locations: &[Pos], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    #[derive(Serialize)]
    struct Location {
        line: usize,
        column: usize,
    }

    let mut seq = serializer.serialize_seq(Some(locations.len()))?;
    for pos in locations {
        seq.serialize_element(&Location {
            line: pos.line,
            column: pos.column,
        })?;
    }
    seq.end()
}

/// Alias for `Result<T, ServerError>`.
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// An alias for `Result<T, Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The non-local outcome of coercing one position of the response.
///
/// Sits between the user-facing errors and the traversal: a `Propagate`
/// unwinds until the nearest nullable enclosing position catches it, nulls
/// itself out and records the error once; a `Fatal` unwinds to the operation
/// boundary.
#[derive(Debug)]
pub(crate) enum ValueError {
    /// Nulls the nearest nullable enclosing position.
    ///
    /// `recorded` is set when a captured execution error already covers this
    /// propagation, so the catch site does not record it a second time.
    Propagate { error: ServerError, recorded: bool },
    /// Aborts the operation.
    Fatal(ServerError),
}

impl ValueError {
    pub(crate) fn propagate(error: ServerError) -> Self {
        ValueError::Propagate {
            error,
            recorded: false,
        }
    }
}

pub(crate) type ValueResult<T> = std::result::Result<T, ValueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_serialization_skips_empty_fields() {
        let error = ServerError::new("boom", None);
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({ "message": "boom" })
        );

        let error = ServerError::new("boom", Some(Pos { line: 1, column: 3 }));
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({ "message": "boom", "locations": [{ "line": 1, "column": 3 }] })
        );
    }
}
