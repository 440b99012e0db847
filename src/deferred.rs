//! Frames parked by `@defer`, waiting to be drained after the initial
//! response.

use async_graphql_parser::types::Field;
use async_graphql_parser::Positioned;
use futures_channel::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::error::Error;
use crate::query_path::QueryPath;

/// An owned snapshot of a field frame whose resolution was deferred.
pub(crate) struct DeferredWorkload {
    /// The field node, with co-named selections already merged.
    pub field: Positioned<Field>,
    /// The response path of the field, including its response key.
    pub path: QueryPath,
    /// Name of the concrete object type the field was selected on.
    pub parent_type: String,
    /// Snapshot of the parent resolver's value.
    pub parent_value: serde_json::Value,
}

impl DeferredWorkload {
    pub fn new(
        field: Positioned<Field>,
        path: QueryPath,
        parent_type: String,
        parent_value: serde_json::Value,
    ) -> Self {
        DeferredWorkload {
            field,
            path,
            parent_type,
            parent_value,
        }
    }
}

/// The parking side of the workload queue. Present on the query env only
/// when the caller can receive incremental payloads.
#[derive(Clone)]
pub struct DeferredWorkloadSender(UnboundedSender<DeferredWorkload>);

impl DeferredWorkloadSender {
    pub(crate) fn send(&self, workload: DeferredWorkload) -> Result<(), Error> {
        self.0
            .unbounded_send(workload)
            .map_err(|error| Error::new(error.to_string()))
    }
}

/// The draining side of the workload queue, owned by the execution strategy.
pub(crate) struct DeferredWorkloadReceiver(UnboundedReceiver<DeferredWorkload>);

impl DeferredWorkloadReceiver {
    /// The next parked workload, in the order they were parked. Workloads
    /// spawned while draining queue up behind the current round.
    pub fn receive(&mut self) -> Option<DeferredWorkload> {
        self.0.try_next().ok().flatten()
    }
}

pub(crate) fn workload_channel() -> (DeferredWorkloadSender, DeferredWorkloadReceiver) {
    let (sender, receiver) = futures_channel::mpsc::unbounded();
    (DeferredWorkloadSender(sender), DeferredWorkloadReceiver(receiver))
}
