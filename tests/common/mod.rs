// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Shared test fixtures.

#![allow(dead_code)]

use fluxion::{Attribute, Document, Value};

/// The two-level tree from the format documentation: a named root with one
/// "User" child holding a nested "User", both attributed.
pub fn two_level_doc() -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    doc.set_name(root, Some("MyRootNode"));
    let user = doc.create_node(Some("User"), Value::from("mike"));
    doc.push_attribute(user, Attribute::named("Age", Value::I32(35)));
    doc.add_child(root, user).unwrap();
    let inner = doc.create_node(Some("User"), Value::from("jeremy"));
    doc.push_attribute(inner, Attribute::named("Age", Value::I32(10)));
    doc.add_child(user, inner).unwrap();
    doc
}

/// A flat document with `n` identical "User"/"mike" children.
pub fn user_list_doc(n: usize) -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    for _ in 0..n {
        let child = doc.create_node(Some("User"), Value::from("mike"));
        doc.add_child(root, child).unwrap();
    }
    doc
}

/// One node per value variant, as children of an unnamed root. i8 appears
/// several times: distinct raw-byte values must stay distinct through the
/// v2/v3 pools.
pub fn all_variants_doc() -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    let values = vec![
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::U8(255),
        Value::I8(-128),
        Value::I8(5),
        Value::I8(-80),
        Value::I8(0),
        Value::Char(0x2764),
        Value::I16(-12345),
        Value::U16(54321),
        Value::I32(-1_000_000),
        Value::U32(3_000_000_000),
        Value::I64(i64::MIN),
        Value::U64(u64::MAX),
        Value::F32(1.25),
        Value::F64(-9.875),
        Value::Str("text value".into()),
        Value::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]),
    ];
    for value in values {
        let child = doc.create_node(Some("v"), value);
        doc.add_child(root, child).unwrap();
    }
    doc
}
