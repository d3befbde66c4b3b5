// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Varint codec properties.
//!
//! - Encoding is reversible for all u64 values
//! - Encoded size stays within MAX_VARINT_BYTES
//! - Continuation bits are set on all bytes but the last

use fluxion::codec::{decode_varint, encode_varint, SliceReader, MAX_VARINT_BYTES};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Property: varint encoding is reversible and consumes exactly what it
    /// wrote.
    #[test]
    fn prop_varint_roundtrip(value: u64) {
        let mut buf = Vec::new();
        encode_varint(value, &mut buf);
        let mut r = SliceReader::new(&buf);
        let decoded = decode_varint(&mut r).unwrap();
        prop_assert_eq!(value, decoded);
        prop_assert_eq!(r.position(), buf.len());
    }

    /// Property: a u64 varint never exceeds 10 bytes.
    #[test]
    fn prop_varint_size_bound(value: u64) {
        let mut buf = Vec::new();
        encode_varint(value, &mut buf);
        prop_assert!(buf.len() <= MAX_VARINT_BYTES);
    }

    /// Property: every byte but the last carries the continuation bit.
    /// This catches mutations like `| 0x80` → `^ 0x80`.
    #[test]
    fn prop_varint_continuation_bit(value in 128u64..u64::MAX) {
        let mut buf = Vec::new();
        encode_varint(value, &mut buf);
        prop_assert!(buf.len() > 1);
        for (i, &byte) in buf.iter().enumerate() {
            if i < buf.len() - 1 {
                prop_assert!(byte & 0x80 != 0, "byte {} lost its continuation bit", i);
            } else {
                prop_assert!(byte & 0x80 == 0, "last byte kept a continuation bit");
            }
        }
    }

    /// Property: decoding arbitrary bytes never panics, and any successful
    /// decode re-encodes to a decodable value.
    #[test]
    fn prop_varint_decode_is_total(bytes in prop::collection::vec(any::<u8>(), 0..16)) {
        let mut r = SliceReader::new(&bytes);
        if let Ok(value) = decode_varint(&mut r) {
            let mut reencoded = Vec::new();
            encode_varint(value, &mut reencoded);
            let mut r2 = SliceReader::new(&reencoded);
            prop_assert_eq!(decode_varint(&mut r2).unwrap(), value);
        }
    }
}
