// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

use criterion::{Criterion, criterion_group, criterion_main};
use lookout_tests::reconstruct;

fn event(action: &str, test: &str, output: Option<&str>) -> String {
    let output = output.map_or_else(String::new, |o| format!(r#","Output":"{o}""#));
    format!(
        r#"{{"Time":"2026-01-17T10:00:00.123456+01:00","Action":"{action}","Package":"example.com/bench","Test":"{test}"{output}}}"#
    )
}

fn suite_stream(suites: usize, members: usize) -> String {
    let mut lines = Vec::new();
    for s in 0..suites {
        let suite = format!("TestSuite{s}");
        lines.push(event("run", &suite, None));
        for m in 0..members {
            let path = format!("{suite}/Member_{m}");
            lines.push(event("run", &path, None));
            lines.push(event("output", &path, Some("=== RUN   x\\n")));
            lines.push(event("output", &path, Some("    x_test.go:12: checking\\n")));
            lines.push(event(if m % 7 == 0 { "fail" } else { "pass" }, &path, None));
        }
    }
    lines.join("\n")
}

fn reconstruct_benchmark(c: &mut Criterion) {
    let raw = suite_stream(20, 25);

    c.bench_function("reconstruct_500_members", |b| {
        b.iter(|| std::hint::black_box(reconstruct(&raw)))
    });
}

criterion_group!(benches, reconstruct_benchmark);
criterion_main!(benches);
