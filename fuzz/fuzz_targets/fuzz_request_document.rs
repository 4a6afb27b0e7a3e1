//! Fuzz target for request context parsing.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_request_document
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = arbiter_repo::fuzz::parse_context(text);
    }
});
