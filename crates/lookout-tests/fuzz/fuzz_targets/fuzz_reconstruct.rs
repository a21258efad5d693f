// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for result reconstruction
//!
//! Any output must reconstruct into results, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;

use lookout_tests::{Reconstructor, reconstruct};

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        let results = reconstruct(raw);
        let _ = (results.len(), results.len_failed(), results.has_err());

        let mut reconstructor = Reconstructor::new();
        for line in raw.lines() {
            let _ = reconstructor.process_line(line);
        }
        let _ = reconstructor.finish();
    }
});
