//! Incremental delivery: `@defer` splits responses into an initial tree
//! plus patches.

mod fixture;

use pretty_assertions::assert_eq;
use serde_json::json;
use trickle::{patch_channel, PathSegment, Request, ResponsePatch};

fn path(segments: &[&str]) -> Vec<PathSegment> {
    segments.iter().map(|segment| PathSegment::from(*segment)).collect()
}

#[test]
fn deferred_fields_leave_the_initial_response_and_arrive_as_patches() {
    let patches = fixture::execute_patches(
        "{ cheese(id: 1) { id flavor origin @defer cheeseSource: source @defer } }",
    )
    .unwrap();

    assert_eq!(
        patches,
        vec![
            ResponsePatch::new(
                vec![],
                json!({ "data": { "cheese": { "id": 1, "flavor": "Brie" } } }),
            ),
            ResponsePatch::new(path(&["data", "cheese", "origin"]), json!("France")),
            ResponsePatch::new(path(&["data", "cheese", "cheeseSource"]), json!("COW")),
        ]
    );
}

#[test]
fn nested_defers_drain_parents_before_their_children() {
    let patches =
        fixture::execute_patches("{ cheese(id: 1) @defer { id flavor origin @defer } }").unwrap();

    assert_eq!(
        patches,
        vec![
            ResponsePatch::new(vec![], json!({ "data": {} })),
            ResponsePatch::new(
                path(&["data", "cheese"]),
                json!({ "id": 1, "flavor": "Brie" }),
            ),
            ResponsePatch::new(path(&["data", "cheese", "origin"]), json!("France")),
        ]
    );
}

#[test]
fn deferred_lists_patch_element_by_element() {
    let patches = fixture::execute_patches(
        r#"
        {
            cheeses @defer {
                id
                chzFlav: flavor @defer
                similarCheese(source: COW) {
                    id
                    flavor @defer
                }
            }
        }
        "#,
    )
    .unwrap();

    let mut expected = vec![
        ResponsePatch::new(vec![], json!({ "data": {} })),
        ResponsePatch::new(
            path(&["data", "cheeses"]),
            json!([
                { "id": 1, "similarCheese": { "id": 1 } },
                { "id": 2, "similarCheese": { "id": 1 } },
                { "id": 3, "similarCheese": { "id": 1 } },
            ]),
        ),
    ];
    for (idx, flavor) in ["Brie", "Gouda", "Manchego"].into_iter().enumerate() {
        expected.push(ResponsePatch::new(
            vec!["data".into(), "cheeses".into(), idx.into(), "chzFlav".into()],
            json!(flavor),
        ));
        expected.push(ResponsePatch::new(
            vec![
                "data".into(),
                "cheeses".into(),
                idx.into(),
                "similarCheese".into(),
                "flavor".into(),
            ],
            json!("Brie"),
        ));
    }

    assert_eq!(patches.len(), 8);
    assert_eq!(patches, expected);
}

#[test]
fn handled_errors_patch_the_errors_list_with_monotonic_indices() {
    let patches = fixture::execute_patches(
        "{ error1: executionError error2: executionError @defer error3: executionError @defer }",
    )
    .unwrap();

    assert_eq!(patches.len(), 3);

    assert_eq!(patches[0].path, vec![]);
    assert_eq!(patches[0].value["data"], json!({ "error1": null }));
    let initial_errors = patches[0].value["errors"].as_array().unwrap();
    assert_eq!(initial_errors.len(), 1);
    assert_eq!(initial_errors[0]["message"], json!("There was an execution error"));
    assert!(initial_errors[0]["locations"].is_array());

    for (patch, idx) in patches[1..].iter().zip([1usize, 2]) {
        assert_eq!(patch.path, vec!["errors".into(), idx.into()]);
        assert_eq!(patch.value["message"], json!("There was an execution error"));
        assert!(patch.value["locations"].is_array());
    }
}

#[test]
fn a_fatal_error_emits_no_patches_at_all() {
    let result = fixture::execute_patches("{ error cheese(id: 1) @defer { id } }");

    let error = result.unwrap_err();
    assert_eq!(error.message, "This error was raised on purpose");
}

#[test]
fn a_deferred_field_resolving_to_null_needs_no_patch() {
    let patches = fixture::execute_patches("{ cheese(id: 99) @defer { id } }").unwrap();
    assert_eq!(
        patches,
        vec![ResponsePatch::new(vec![], json!({ "data": {} }))]
    );
}

#[test]
fn without_a_collector_deferred_fields_resolve_inline() {
    let response = fixture::execute("{ cheese(id: 1) { id flavor origin @defer } }");
    assert!(response.errors.is_empty());
    assert_eq!(
        response.data,
        json!({ "cheese": { "id": 1, "flavor": "Brie", "origin": "France" } })
    );
}

#[test]
fn reassembled_patches_equal_the_serial_result() {
    let query = r#"
        {
            cheeses @defer {
                id
                flavor @defer
                similarCheese(source: [COW, SHEEP]) { id origin @defer }
            }
            favoriteEdible { origin }
            cheese(id: 3) { source }
        }
    "#;

    let serial = fixture::execute(query);
    assert!(serial.errors.is_empty());

    let patches = fixture::execute_patches(query).unwrap();
    assert_eq!(
        fixture::reassemble(&patches),
        json!({ "data": serial.data })
    );
}

#[test]
fn queries_without_defer_produce_a_single_equivalent_patch() {
    let query = "{ cheese(id: 2) { id flavor origin } }";

    let serial = fixture::execute(query);
    let patches = fixture::execute_patches(query).unwrap();

    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].path, vec![]);
    assert_eq!(patches[0].value, json!({ "data": serial.data }));
}

#[test]
fn a_parse_error_reaches_the_caller_before_any_patch() {
    let (sender, mut receiver) = patch_channel();
    let result = fixture::schema().execute_incremental(Request::new("{ cheese(id: "), &sender);

    assert!(result.is_err());
    assert!(receiver.drain().is_empty());
}
