//! Response types and the patch channel used for incremental delivery.

use futures_channel::mpsc::{UnboundedReceiver, UnboundedSender};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, ServerError};
use crate::query_path::PathSegment;

/// A complete GraphQL response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// The response data.
    pub data: Value,
    /// Errors recorded while resolving, in the order they were produced.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ServerError>,
}

impl Response {
    pub fn new(data: Value) -> Self {
        Response {
            data,
            errors: Vec::new(),
        }
    }

    /// A response that failed before or while resolving: null data plus the
    /// errors that got it there.
    pub fn from_errors(errors: Vec<ServerError>) -> Self {
        Response {
            data: Value::Null,
            errors,
        }
    }
}

/// One incremental update to a response tree: the value to place at a path.
///
/// The first patch of a query is always the initial response at the empty
/// path; later patches address positions under `"data"` or append entries
/// under `"errors"`. Patches are never retracted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsePatch {
    pub path: Vec<PathSegment>,
    pub value: Value,
}

impl ResponsePatch {
    pub fn new(path: Vec<PathSegment>, value: Value) -> Self {
        ResponsePatch { path, value }
    }

    /// Fold this patch into a response tree, creating intermediate objects
    /// and list slots as needed. Reassembling every patch of a query in
    /// order yields the tree the serial strategy would have produced.
    pub fn apply_to(&self, target: &mut Value) {
        let mut slot = target;
        for segment in &self.path {
            match segment {
                PathSegment::Field(key) => {
                    if !matches!(slot, Value::Object(_)) {
                        *slot = Value::Object(Default::default());
                    }
                    let Value::Object(object) = slot else { unreachable!() };
                    slot = object.entry(key.clone()).or_insert(Value::Null);
                }
                PathSegment::Index(index) => {
                    if !matches!(slot, Value::Array(_)) {
                        *slot = Value::Array(Vec::new());
                    }
                    let Value::Array(items) = slot else { unreachable!() };
                    if items.len() <= *index {
                        items.resize(*index + 1, Value::Null);
                    }
                    slot = &mut items[*index];
                }
            }
        }
        *slot = self.value.clone();
    }
}

/// The emitting side of the patch channel. This is the collector handed to
/// [`Schema::execute_incremental`](crate::Schema::execute_incremental).
#[derive(Clone)]
pub struct PatchSender(UnboundedSender<ResponsePatch>);

impl PatchSender {
    pub fn send(&self, patch: ResponsePatch) -> Result<(), Error> {
        self.0
            .unbounded_send(patch)
            .map_err(|error| Error::new(error.to_string()))
    }
}

/// The receiving side of the patch channel.
pub struct PatchReceiver(UnboundedReceiver<ResponsePatch>);

impl PatchReceiver {
    /// The next patch, if one has been emitted.
    pub fn receive(&mut self) -> Option<ResponsePatch> {
        self.0.try_next().ok().flatten()
    }

    /// Every patch emitted so far, in order.
    pub fn drain(&mut self) -> Vec<ResponsePatch> {
        std::iter::from_fn(|| self.receive()).collect()
    }
}

/// Build the patch channel connecting the deferred strategy to a consumer.
pub fn patch_channel() -> (PatchSender, PatchReceiver) {
    let (sender, receiver) = futures_channel::mpsc::unbounded();
    (PatchSender(sender), PatchReceiver(receiver))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn apply_creates_intermediate_containers() {
        let mut tree = Value::Null;
        ResponsePatch::new(vec![], json!({"data": {}})).apply_to(&mut tree);
        ResponsePatch::new(
            vec!["data".into(), "cheeses".into(), 1.into(), "flavor".into()],
            json!("Gouda"),
        )
        .apply_to(&mut tree);

        assert_eq!(
            tree,
            json!({ "data": { "cheeses": [null, { "flavor": "Gouda" }] } })
        );
    }

    #[test]
    fn apply_overwrites_existing_values() {
        let mut tree = json!({ "data": { "cheese": null } });
        ResponsePatch::new(vec!["data".into(), "cheese".into()], json!({ "id": 1 })).apply_to(&mut tree);
        assert_eq!(tree, json!({ "data": { "cheese": { "id": 1 } } }));
    }

    #[test]
    fn channel_preserves_order() {
        let (sender, mut receiver) = patch_channel();
        sender.send(ResponsePatch::new(vec![], json!(1))).unwrap();
        sender.send(ResponsePatch::new(vec![], json!(2))).unwrap();
        let drained = receiver.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].value, json!(1));
        assert_eq!(drained[1].value, json!(2));
    }
}
