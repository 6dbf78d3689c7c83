//! Fuzz target for update manifest parsing.
//!
//! Manifests are fetched from a remote location by clients, so parsing and
//! validation must handle arbitrary input without panicking.

#![no_main]

use cs_manifest::UpdateManifest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(manifest) = UpdateManifest::from_json(text) {
            let _ = manifest.validate();
        }
    }
});
