//! Fuzzing target for dot path parsing and access
//!
//! Arbitrary paths must either parse or return an error, and applying a
//! parsed path to a document must never panic.

#![no_main]

use docspec_core::accessor::{parse_path, ObjectPathAccessor};
use docspec_core::Value;
use libfuzzer_sys::fuzz_target;
use serde_json::json;

fuzz_target!(|data: &[u8]| {
    let path = String::from_utf8_lossy(data);
    if parse_path(&path).is_err() {
        return;
    }

    let accessor = ObjectPathAccessor::new();
    let mut document = Value::from(json!({
        "a": {"b": [1, {"c": "x"}]},
        "list": [[], {}],
        "scalar": 5
    }));
    let _ = accessor.get_path(&path, &document);
    let _ = accessor.set_path(&path, Value::from("fuzz"), &mut document);
    let _ = accessor.unset_path(&path, &mut document);
});
