// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Codec round-trip properties over randomly generated trees.
//!
//! Floats are drawn from a coarse grid (multiples of 0.25) so that distinct
//! generated values sit far outside the default tolerance; the v3 dedup can
//! then only unify values that are exactly equal, and deep equality after a
//! round-trip is a strict check rather than an epsilon chain.

use fluxion::{
    from_bytes, to_bytes, Attribute, Document, FormatVersion, NodeId, StringEncoding, Tolerance,
    Value, WriteOptions, MAGIC,
};
use proptest::prelude::*;

// ============================================================================
// TREE GENERATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct TreeSpec {
    name: Option<String>,
    value: Value,
    attrs: Vec<(Option<String>, Value)>,
    children: Vec<TreeSpec>,
}

fn arb_name() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        2 => Just(None),
        5 => "[A-Za-z][A-Za-z0-9_]{0,7}".prop_map(Some),
    ]
}

fn arb_string() -> impl Strategy<Value = String> {
    prop_oneof![
        5 => "[ -~]{0,12}",
        1 => prop::sample::select(vec![
            String::new(),
            "héllo wörld".to_string(),
            "Żółw 🐢".to_string(),
            "日本語".to_string(),
        ]),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<u8>().prop_map(Value::U8),
        any::<i8>().prop_map(Value::I8),
        any::<u16>().prop_map(Value::Char),
        any::<i16>().prop_map(Value::I16),
        any::<u16>().prop_map(Value::U16),
        any::<i32>().prop_map(Value::I32),
        any::<u32>().prop_map(Value::U32),
        any::<i64>().prop_map(Value::I64),
        any::<u64>().prop_map(Value::U64),
        (-4_000_000i32..4_000_000).prop_map(|n| Value::F32(n as f32 * 0.25)),
        (-4_000_000i64..4_000_000).prop_map(|n| Value::F64(n as f64 * 0.25)),
        arb_string().prop_map(Value::Str),
        prop::collection::vec(any::<u8>(), 0..24).prop_map(Value::Bytes),
    ]
}

fn arb_attr() -> impl Strategy<Value = (Option<String>, Value)> {
    (arb_name(), arb_value())
}

pub fn arb_tree() -> impl Strategy<Value = TreeSpec> {
    let leaf = (arb_name(), arb_value(), prop::collection::vec(arb_attr(), 0..3)).prop_map(
        |(name, value, attrs)| TreeSpec {
            name,
            value,
            attrs,
            children: Vec::new(),
        },
    );
    leaf.prop_recursive(4, 48, 4, |inner| {
        (
            arb_name(),
            arb_value(),
            prop::collection::vec(arb_attr(), 0..3),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(name, value, attrs, children)| TreeSpec {
                name,
                value,
                attrs,
                children,
            })
    })
}

fn fill_node(doc: &mut Document, id: NodeId, spec: &TreeSpec) {
    doc.set_name(id, spec.name.as_deref());
    doc.set_value(id, spec.value.clone());
    for (name, value) in &spec.attrs {
        doc.push_attribute(id, Attribute::new(name.as_deref(), value.clone()));
    }
    for child_spec in &spec.children {
        let child = doc.create_node(None, Value::Null);
        fill_node(doc, child, child_spec);
        doc.add_child(id, child).unwrap();
    }
}

pub fn build_doc(spec: &TreeSpec) -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    fill_node(&mut doc, root, spec);
    doc
}

// ============================================================================
// ROUND-TRIP PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(192))]

    /// Property: every tree round-trips at every version.
    #[test]
    fn prop_roundtrip_all_versions(spec in arb_tree()) {
        let doc = build_doc(&spec);
        for version in [FormatVersion::V1, FormatVersion::V2, FormatVersion::V3] {
            let bytes = to_bytes(&doc, &WriteOptions::with_version(version)).unwrap();
            let decoded = from_bytes(&bytes).unwrap();
            prop_assert!(
                doc.content_eq(&decoded, &Tolerance::default()),
                "round-trip diverged at {:?}",
                version
            );
        }
    }

    /// Property: the first four bytes are always `F`,`L`,`X`,version.
    #[test]
    fn prop_magic_stability(spec in arb_tree()) {
        let doc = build_doc(&spec);
        for version in [FormatVersion::V1, FormatVersion::V2, FormatVersion::V3] {
            let bytes = to_bytes(&doc, &WriteOptions::with_version(version)).unwrap();
            prop_assert_eq!(&bytes[..3], &MAGIC[..]);
            prop_assert_eq!(bytes[3], version.as_byte());
        }
    }

    /// Property: the v2 pool estimator always matches emission. The writer
    /// fails with `EstimationMismatch` when it doesn't, so a clean encode IS
    /// the property.
    #[test]
    fn prop_v2_pool_estimation_holds(spec in arb_tree()) {
        let doc = build_doc(&spec);
        prop_assert!(to_bytes(&doc, &WriteOptions::with_version(FormatVersion::V2)).is_ok());
    }

    /// Property: the v3 reference optimization never changes what a reader
    /// reconstructs, and never grows the file.
    #[test]
    fn prop_v3_optimize_is_sound(spec in arb_tree()) {
        let doc = build_doc(&spec);
        let mut with = WriteOptions::with_version(FormatVersion::V3);
        with.optimize = true;
        let mut without = WriteOptions::with_version(FormatVersion::V3);
        without.optimize = false;

        let optimized = to_bytes(&doc, &with).unwrap();
        let plain = to_bytes(&doc, &without).unwrap();
        prop_assert!(optimized.len() <= plain.len());

        let tol = Tolerance::default();
        prop_assert!(doc.content_eq(&from_bytes(&optimized).unwrap(), &tol));
        prop_assert!(doc.content_eq(&from_bytes(&plain).unwrap(), &tol));
    }

    /// Property: v1 and v2 round-trip under every string encoding.
    #[test]
    fn prop_alternate_encodings_roundtrip(spec in arb_tree()) {
        let doc = build_doc(&spec);
        for version in [FormatVersion::V1, FormatVersion::V2] {
            for encoding in [StringEncoding::Utf16Le, StringEncoding::Utf32Le] {
                let mut options = WriteOptions::with_version(version);
                options.encoding = encoding;
                let bytes = to_bytes(&doc, &options).unwrap();
                let decoded = from_bytes(&bytes).unwrap();
                prop_assert!(
                    doc.content_eq(&decoded, &Tolerance::default()),
                    "diverged at {:?}/{:?}",
                    version,
                    encoding
                );
            }
        }
    }

    /// Property: decoding arbitrary garbage never panics.
    #[test]
    fn prop_decode_is_total(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = from_bytes(&bytes);
    }
}
