// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for the file preamble.
//!
//! The header is the gate everything else hides behind: bad magic, future
//! versions and unknown encodings must all fail cleanly.

#![no_main]

use fluxion::codec::header::read_header;
use fluxion::codec::SliceReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut r = SliceReader::new(data);
    if let Ok((version, encoding)) = read_header(&mut r) {
        // A successful parse implies valid magic and known ids.
        assert_eq!(&data[..3], &[0x46, 0x4C, 0x58]);
        assert!(matches!(version.as_byte(), 1..=3));
        assert!(matches!(encoding.as_byte(), 0..=2));
    }
});
