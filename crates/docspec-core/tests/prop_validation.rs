//! Property-based tests for the mapper and the validation flow
//!
//! These tests verify structural invariants that should hold for any data
//! walked against a spec.

use docspec_core::{Schema, SchemaMapper, SchemaOptions, SpecNode, TypeRegistry, Value};
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;

/// Strategy for generating scalar JSON leaves
fn leaf_strategy() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        (-1000i64..1000).prop_map(serde_json::Value::from),
        "[a-z0-9 ]{0,8}".prop_map(serde_json::Value::from),
    ]
}

/// Strategy for generating nested JSON documents
fn json_strategy() -> impl Strategy<Value = serde_json::Value> {
    leaf_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::from),
            prop::collection::btree_map("[a-e]{1,3}", inner, 0..4)
                .prop_map(|map| serde_json::Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Strategy for generating documents shaped loosely like `test_spec`
fn document_strategy() -> impl Strategy<Value = serde_json::Value> {
    (
        proptest::option::of(json_strategy()),
        proptest::option::of(json_strategy()),
        proptest::option::of(json_strategy()),
        proptest::option::of(json_strategy()),
    )
        .prop_map(|(name, tags, address, extra)| {
            let mut document = serde_json::Map::new();
            for (key, value) in [("name", name), ("tags", tags), ("address", address), ("extra", extra)] {
                if let Some(value) = value {
                    document.insert(key.to_string(), value);
                }
            }
            serde_json::Value::Object(document)
        })
}

fn test_spec() -> serde_json::Value {
    json!({
        "name": {"$type": "String", "$validate": {"required": true, "notEmpty": true}},
        "tags": ["String"],
        "address": {"city": "String", "rooms": [{"size": "Number"}], "*": "Mixed"},
        "age": {"$type": "Number", "$filter": {"defaultValue": 1}}
    })
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

proptest! {
    #[test]
    fn prop_spec_is_immutable(documents in prop::collection::vec(document_strategy(), 1..4)) {
        let schema = Schema::from_json(&test_spec(), SchemaOptions::default().with_strict(true)).unwrap();
        let before = schema.spec().unwrap().clone();

        for document in documents {
            let mut data = Value::from(document);
            let result = block_on(schema.validate(&mut data));
            prop_assert!(result.is_ok());
            prop_assert_eq!(schema.spec().unwrap(), &before);
        }
    }

    #[test]
    fn prop_visited_paths_are_unique(document in document_strategy()) {
        let spec = SpecNode::from_json(&test_spec()).unwrap();
        let registry = TypeRegistry::standard();
        let mapper = SchemaMapper::new(&spec, &registry);

        let mut data = Value::from(document);
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        mapper
            .map(&mut data, |visit| {
                if !seen.insert(visit.path.to_string()) {
                    duplicates.push(visit.path.to_string());
                }
                Ok(())
            })
            .unwrap();

        prop_assert!(duplicates.is_empty(), "duplicate paths: {:?}", duplicates);
    }

    #[test]
    fn prop_validity_matches_errors(document in document_strategy()) {
        let schema = Schema::from_json(&test_spec(), SchemaOptions::default()).unwrap();
        let mut data = Value::from(document);

        let result = block_on(schema.validate(&mut data)).unwrap();
        prop_assert_eq!(result.is_valid, result.errors.is_empty());
        // Defaults are always applied to the written-back document
        prop_assert!(data.as_object().is_some_and(|object| object.contains_key("age")));
    }

    #[test]
    fn prop_revalidation_is_stable(document in document_strategy()) {
        let schema = Schema::from_json(&test_spec(), SchemaOptions::default()).unwrap();
        let mut data = Value::from(document);

        let first = block_on(schema.validate(&mut data)).unwrap();
        let once = data.clone();
        let second = block_on(schema.validate(&mut data)).unwrap();

        prop_assert_eq!(first.is_valid, second.is_valid);
        prop_assert_eq!(format!("{:?}", once), format!("{:?}", data));
    }
}
