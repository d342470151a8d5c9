//! Fuzzing target for spec parsing and document walking
//!
//! Any JSON input is tried both as a spec and as a document walked against a
//! fixed spec. Neither may panic.

#![no_main]

use docspec_core::{SchemaMapper, SpecNode, TypeRegistry, Value};
use libfuzzer_sys::fuzz_target;
use serde_json::json;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let registry = TypeRegistry::standard();

    if let Ok(spec) = SpecNode::from_json(&json) {
        let mapper = SchemaMapper::new(&spec, &registry);
        let mut document = Value::from(json!({"a": {"b": [1, 2]}, "c": "x"}));
        let _ = mapper.map(&mut document, |_| Ok(()));
    }

    let fixed = json!({"a": {"b": ["Number"], "*": "Mixed"}, "c": "String", "d": [{"e": "Date"}]});
    if let Ok(spec) = SpecNode::from_json(&fixed) {
        let mapper = SchemaMapper::new(&spec, &registry);
        let mut document = Value::from(json.clone());
        let _ = mapper.map(&mut document, |_| Ok(()));
        let mut paths = Value::from(json);
        let _ = mapper.map_paths(&mut paths, |_| Ok(()));
    }
});
