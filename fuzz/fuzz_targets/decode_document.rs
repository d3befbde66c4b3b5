// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for whole-file decoding across all three versions.
//!
//! Any byte soup must either decode into a well-formed tree or return an
//! error. A decoded tree must re-encode at the same version, and that
//! re-encoding must decode back to an equal tree.

#![no_main]

use fluxion::{from_bytes, to_bytes, Tolerance, WriteOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Deep nesting is legal input; keep the recursion within stack budget.
    if data.len() > 1 << 14 {
        return;
    }
    if let Ok(doc) = from_bytes(data) {
        let mut options = WriteOptions::with_version(doc.version());
        options.optimize = false;
        let reencoded = to_bytes(&doc, &options).expect("decoded tree must re-encode");
        let redecoded = from_bytes(&reencoded).expect("re-encoded tree must decode");
        assert!(
            doc.content_eq(&redecoded, &Tolerance::default()),
            "re-encode roundtrip diverged"
        );
    }
});
