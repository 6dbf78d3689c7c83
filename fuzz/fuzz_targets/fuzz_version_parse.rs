//! Fuzz target for version string parsing.
//!
//! Tests that version parsing handles arbitrary input without panicking.

#![no_main]

use cs_common::Version;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Parsing should never panic, only return an error
        let _ = Version::parse(text);
    }
});
