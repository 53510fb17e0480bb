//! Integration tests for the order-preserving worker pool
//!
//! The pool must emit results in input order for any worker count, whether
//! workers are fast, slow or uneven.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;
use std::time::Duration;

use scrubstream_core::nlp::ModelSet;
use scrubstream_core::scrubbing::Masker;
use scrubstream_core::{
    FormatOptions, Policy, SchemaContext, Scrubber, ScrubberOptions, StatementScrubber, run_pool,
};

fn numbered_input(lines: usize) -> String {
    (0..lines).map(|i| format!("line {}\n", i)).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pool_preserves_order_for_any_worker_count() {
    let input = numbered_input(103);

    for workers in [1, 2, 3, 7, 16, 200] {
        let mut out = Vec::new();
        let count = run_pool(input.as_bytes(), &mut out, workers, |index| {
            move |number: u64, line: &str| {
                // uneven workers finish out of order
                std::thread::sleep(Duration::from_micros(((index * 37 + number as usize) % 5) as u64 * 100));
                line.to_uppercase()
            }
        })
        .await
        .unwrap();

        assert_eq!(count, 103, "workers={}", workers);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            input.to_uppercase(),
            "workers={}",
            workers
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pool_scrubs_dump_in_order() {
    let scrubber = Scrubber::new(
        Arc::new(Policy::default()),
        Arc::new(ModelSet::new()),
        ScrubberOptions::default(),
    )
    .unwrap();
    let context = Arc::new(SchemaContext::from_sql(
        "CREATE TABLE users (id INT, email VARCHAR(255));",
    ));

    let mut dump = String::from("-- header\n");
    for i in 0..50 {
        dump.push_str(&format!("INSERT INTO users VALUES ({},'user{}@example.com');\n", i, i));
    }
    dump.push_str("INSERT INTO users VALUES (1,'a'),(2);\n");
    dump.push_str("-- footer");

    let mut out = Vec::new();
    let count = run_pool(dump.as_bytes(), &mut out, 4, |_| {
        StatementScrubber::new(scrubber.clone(), context.clone(), FormatOptions::default())
    })
    .await
    .unwrap();
    assert_eq!(count, 53);

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    // the ragged INSERT is dropped
    assert_eq!(lines.len(), 52);
    assert_eq!(lines[0], "-- header");
    assert_eq!(lines[51], "-- footer");

    let masker = Masker::new("");
    for (i, line) in lines[1..51].iter().enumerate() {
        let expected = format!(
            "INSERT INTO users VALUES ({}, '{}');",
            i,
            masker.mask(&format!("user{}@example.com", i))
        );
        assert_eq!(*line, expected);
    }
}
