//! Fuzz target for end-to-end evaluation.
//!
//! Any pair of documents that parses must evaluate without panicking; fatal
//! engine errors surface as an Indeterminate result instead.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_evaluate
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    policy: String,
    request: String,
}

fuzz_target!(|input: Input| {
    let Ok(policy) = arbiter_repo::parse_policy_document(&input.policy) else {
        return;
    };
    let Ok(request) = arbiter_repo::parse_context_document(&input.request) else {
        return;
    };
    let response = arbiter_domain::Engine::new().evaluate(&policy, &request);
    assert!(!response.results.is_empty());
});
