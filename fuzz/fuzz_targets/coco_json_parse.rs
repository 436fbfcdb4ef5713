//! Fuzz target for COCO JSON parsing and validation.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_json_parse

#![no_main]

use cocoprep::coco::from_coco_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 10MB is generous for an annotation export.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_coco_slice(data);
});
