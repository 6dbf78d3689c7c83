//! Fuzz target for tolerant configuration extraction.
//!
//! The extractor accepts arbitrary text by design (fields default instead of
//! failing), so the only acceptable failure mode is a default-filled
//! snapshot, never a panic.

#![no_main]

use cs_config::ConfigSnapshot;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let snapshot = ConfigSnapshot::extract(text);
        // Re-emission of whatever was extracted must also never panic
        let _ = snapshot.to_json();
    }
});
