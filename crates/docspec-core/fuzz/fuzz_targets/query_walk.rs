//! Fuzzing target for query traversal
//!
//! Arbitrary JSON queries are walked with a visitor that rewrites every
//! operand, which must never panic.

#![no_main]

use docspec_core::mapper::walk_query;
use docspec_core::Value;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    let mut query = Value::from(json);
    let _ = walk_query(&mut query, |mut visit| {
        if visit.slot.get().is_some_and(Value::is_array) {
            visit.slot.remove();
        } else {
            visit.slot.set(Value::Null);
        }
        Ok(())
    });
});
