//! Fuzz target for scene JSON parsing and conversion.
//!
//! Conversion builds camera matrices and skinning data, so it runs on every
//! input that parses. Invalid cameras must come back as errors, not panics.
//!
//! Run with:
//!   cargo +nightly fuzz run scene_json_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use obblabel::scene::fuzz_parse_scene;

fuzz_target!(|data: &[u8]| {
    // 10MB is generous for a single frame.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = fuzz_parse_scene(text);
});
