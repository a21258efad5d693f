// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for the test source parser
//!
//! Arbitrary text must produce either a test set or a `SourceError`,
//! never a panic.

#![no_main]

use chrono::Utc;
use libfuzzer_sys::fuzz_target;

use lookout_source::{Parser, SourceFile, has_test_function};

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let _ = has_test_function(content);

        let file = SourceFile {
            name: "fuzz_test.go".to_string(),
            mod_time: Utc::now(),
            content: content.to_string(),
        };
        let _ = Parser::default().parse(&[file]);
    }
});
