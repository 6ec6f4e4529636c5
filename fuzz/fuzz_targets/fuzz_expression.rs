#![no_main]

use libfuzzer_sys::fuzz_target;
use querylite::{Engine, MemoryFetcher, Table, Value};

fuzz_target!(|data: &[u8]| {
    let Ok(expr) = std::str::from_utf8(data) else {
        return;
    };
    if expr.len() > 2_000 {
        return;
    }

    let Ok(table) = Table::from_rows(
        ["a", "b", "s"],
        vec![
            vec![Value::Integer(1), Value::Float(2.5), Value::from("x")],
            vec![Value::Integer(-7), Value::Null, Value::from("y%z")],
        ],
    ) else {
        return;
    };
    let engine = Engine::new(MemoryFetcher::new().with_table("t", table));

    // Evaluation may fail but must never panic
    let _ = engine.query(&format!("select {} from t", expr));
    let _ = engine.query(&format!("select a from t where {}", expr));
});
