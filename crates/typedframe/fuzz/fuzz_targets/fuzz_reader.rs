//! Fuzz target for the CSV reader and conversion.
//!
//! Malformed input must surface as an error, never a panic, whether it
//! fails in the reader or while coercing the loaded text.

#![no_main]

use libfuzzer_sys::fuzz_target;
use typedframe::input::CsvReader;
use typedframe::{ExpectedType, TableBackend, TableType, Validator};

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let Ok(df) = CsvReader::new().read_bytes(data) else {
        return;
    };

    let Ok(table) = TableType::builder("Fuzzed")
        .optional("column_1", ExpectedType::Int64)
        .optional("a", ExpectedType::Float64)
        .optional("b", ExpectedType::categorical(["x", "y"]))
        .optional("c", ExpectedType::DateTimeUtc)
        .build()
    else {
        return;
    };

    let validator: Validator<TableBackend> = Validator::default();
    let _ = validator.convert(&table, &df, true);
});
