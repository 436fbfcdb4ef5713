//! Fuzz target for the category filter.
//!
//! The first line of the input is a space-separated keep-set, the rest is
//! parsed as a COCO document. Any document that parses must filter without
//! panicking, and a successful filter must itself be a valid document.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_filter

#![no_main]

use cocoprep::coco::{from_coco_slice, validate_document};
use cocoprep::filter::filter_document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let split = data.iter().position(|b| *b == b'\n').unwrap_or(data.len());
    let (head, body) = data.split_at(split);
    let names: Vec<String> = String::from_utf8_lossy(head)
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let Ok(doc) = from_coco_slice(body) else {
        return;
    };
    if let Ok(filtered) = filter_document(&doc, &names) {
        assert!(validate_document(&filtered).is_ok());
    }
});
