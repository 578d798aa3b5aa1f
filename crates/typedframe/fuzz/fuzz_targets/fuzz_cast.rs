//! Fuzz target for text casts.
//!
//! Every declared type is tried against the fuzzed text; date parsing and
//! numeric range checks must never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use typedframe::ExpectedType;
use typedframe::frame::{Column, cast};

const TARGETS: &[ExpectedType] = &[
    ExpectedType::Int8,
    ExpectedType::UInt64,
    ExpectedType::Float32,
    ExpectedType::Boolean,
    ExpectedType::Date,
    ExpectedType::DateTime,
    ExpectedType::DateTimeUtc,
    ExpectedType::List,
];

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    if let Ok(content) = std::str::from_utf8(data) {
        let column = Column::text(&[Some(content), None]);
        for target in TARGETS {
            let _ = cast(&column, target);
        }
    }
});
