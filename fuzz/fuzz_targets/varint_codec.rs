// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fuzz target for varint (LEB128) encoding/decoding.
//!
//! Varints carry every length, count, index and offset in the format. If
//! roundtrip fails or decode panics on malformed input, everything built on
//! top breaks.

#![no_main]

use fluxion::codec::{decode_varint, encode_varint, SliceReader, MAX_VARINT_BYTES};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Property 1: decoding garbage returns Ok or Err, never panics.
    let mut r = SliceReader::new(data);
    if let Ok(value) = decode_varint(&mut r) {
        let consumed = r.position();
        assert!(consumed <= MAX_VARINT_BYTES);
        assert!(consumed <= data.len());

        // Property 2: re-encoding a decoded value roundtrips exactly and
        // the canonical form is fully consumed.
        let mut reencoded = Vec::new();
        encode_varint(value, &mut reencoded);
        let mut r2 = SliceReader::new(&reencoded);
        let redecoded = decode_varint(&mut r2).expect("canonical varint must decode");
        assert_eq!(value, redecoded);
        assert_eq!(r2.position(), reencoded.len());
    }
});
