// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Version 2: pooled values behind byte offsets, seeking reader.
//!
//! All strings and data-bearing values live once in a shared pool at the
//! start of the body; the tree is a stream of (tag, offset) records pointing
//! into it. Repeated names and values collapse to one entry.
//!
//! The writer runs two passes. Analysis interns every poolable value and
//! name; estimation sums the exact entry sizes to predict where the tree
//! region starts, writes that position up front, then emits the pool. If
//! emission lands anywhere other than the predicted start, the writer stops
//! with `EstimationMismatch` rather than produce a file whose offsets lie.
//!
//! ```text
//! varint treeStart            absolute position of the first tree record
//! pool entries                varint magnitudes, LE floats, len-prefixed text
//! node records:
//!   tag = valueType | hasName<<4 | noChildren<<5 | noAttrs<<6 | unique<<7
//!   [varint childCount] [varint nameOffset] [varint valueOffset]
//!   [varint attrCount ++ attribute records]
//!   child records, recursively
//! ```
//!
//! The unique-flag encodes "canonical empty/zero, nothing pooled" — except
//! on the sign-magnitude integer types, where an offset always follows and
//! the flag is the sign of the pooled magnitude.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::codec::header::{FormatVersion, StringEncoding};
use crate::codec::reader::SliceReader;
use crate::codec::scalar::{pooled_payload, read_pooled};
use crate::codec::varint::{decode_varint_u32, decode_varint_usize, encode_varint, varint_len};
use crate::document::{Attribute, Document, NodeId};
use crate::error::{FluxionError, Result};
use crate::value::Value;

const HAS_NAME: u8 = 1 << 4;
const NO_CHILDREN: u8 = 1 << 5;
const NO_ATTRS: u8 = 1 << 6;
const UNIQUE: u8 = 1 << 7;

// ============================================================================
// ANALYSIS: THE VALUE POOL
// ============================================================================

#[derive(Debug, Default)]
struct Pool {
    /// Entry payloads in insertion order; offsets filled in at emission.
    payloads: Vec<Vec<u8>>,
    offsets: Vec<u64>,
    by_string: HashMap<String, usize>,
    by_digest: HashMap<[u8; 32], usize>,
    /// Numeric scalars keyed per type: (type id, magnitude or bit pattern).
    by_scalar: HashMap<(u8, u64), usize>,
}

impl Pool {
    fn push(&mut self, payload: Vec<u8>) -> usize {
        self.payloads.push(payload);
        self.payloads.len() - 1
    }

    fn intern_string(&mut self, s: &str, encoding: StringEncoding) {
        if s.is_empty() || self.by_string.contains_key(s) {
            return;
        }
        let payload = pooled_payload(&Value::Str(s.to_string()), encoding);
        let entry = self.push(payload);
        self.by_string.insert(s.to_string(), entry);
    }

    fn intern_value(&mut self, value: &Value, encoding: StringEncoding) {
        match value {
            Value::Null | Value::Bool(_) => {}
            Value::Str(s) => self.intern_string(s, encoding),
            Value::Bytes(b) => {
                if b.is_empty() {
                    return;
                }
                let digest: [u8; 32] = Sha256::digest(b).into();
                if !self.by_digest.contains_key(&digest) {
                    let payload = pooled_payload(value, encoding);
                    let entry = self.push(payload);
                    self.by_digest.insert(digest, entry);
                }
            }
            _ => {
                // Sign-magnitude integers pool even at zero: the offset is
                // always emitted for them and the flag bit carries the sign.
                if value.is_empty_or_zero() && !value.is_signed_int() {
                    return;
                }
                let key = scalar_key(value);
                if !self.by_scalar.contains_key(&key) {
                    let payload = pooled_payload(value, encoding);
                    let entry = self.push(payload);
                    self.by_scalar.insert(key, entry);
                }
            }
        }
    }

    fn string_offset(&self, s: &str) -> Result<u64> {
        self.by_string
            .get(s)
            .map(|&e| self.offsets[e])
            .ok_or(FluxionError::AnalyzedDataMissing)
    }

    fn value_offset(&self, value: &Value) -> Result<u64> {
        let entry = match value {
            Value::Str(s) => self.by_string.get(s.as_str()).copied(),
            Value::Bytes(b) => {
                let digest: [u8; 32] = Sha256::digest(b).into();
                self.by_digest.get(&digest).copied()
            }
            _ => self.by_scalar.get(&scalar_key(value)).copied(),
        };
        entry
            .map(|e| self.offsets[e])
            .ok_or(FluxionError::AnalyzedDataMissing)
    }
}

fn scalar_key(value: &Value) -> (u8, u64) {
    let bits = match value {
        Value::F32(v) => u64::from(v.to_bits()),
        Value::F64(v) => v.to_bits(),
        // i8 travels as its raw byte, which already carries the sign.
        Value::I8(v) => u64::from(*v as u8),
        _ => value.magnitude(),
    };
    // Sign-magnitude pairs share an entry, so the key ignores the sign.
    (value.type_id(), bits)
}

fn analyze(doc: &Document, id: NodeId, encoding: StringEncoding, pool: &mut Pool) {
    let node = doc.node(id);
    if let Some(name) = node.name() {
        pool.intern_string(name, encoding);
    }
    pool.intern_value(node.value(), encoding);
    for attr in node.attributes() {
        if let Some(name) = attr.name() {
            pool.intern_string(name, encoding);
        }
        pool.intern_value(attr.value(), encoding);
    }
    for &child in node.children() {
        analyze(doc, child, encoding, pool);
    }
}

// ============================================================================
// WRITER
// ============================================================================

/// Flag bits and offset requirement for a value under the v2 rules.
fn value_flags(value: &Value) -> (bool, bool) {
    if value.is_signed_int() {
        (value.is_negative(), true)
    } else if !value.has_payload() {
        (false, false)
    } else if value.is_empty_or_zero() {
        (true, false)
    } else {
        (false, true)
    }
}

pub fn encode(doc: &Document, encoding: StringEncoding, buf: &mut Vec<u8>) -> Result<()> {
    let mut pool = Pool::default();
    analyze(doc, doc.root(), encoding, &mut pool);

    let pool_size: u64 = pool.payloads.iter().map(|p| p.len() as u64).sum();
    let base = buf.len() as u64;

    // treeStart counts its own varint, so its width feeds back into the
    // value. Iterate to the fixed point; widths only grow, so it settles.
    let mut tree_start = base + 1 + pool_size;
    loop {
        let candidate = base + varint_len(tree_start) as u64 + pool_size;
        if candidate == tree_start {
            break;
        }
        tree_start = candidate;
    }
    encode_varint(tree_start, buf);

    pool.offsets = Vec::with_capacity(pool.payloads.len());
    for payload in &pool.payloads {
        pool.offsets.push(buf.len() as u64);
        buf.extend_from_slice(payload);
    }
    if buf.len() as u64 != tree_start {
        return Err(FluxionError::EstimationMismatch {
            expected: tree_start,
            actual: buf.len() as u64,
        });
    }

    write_node(doc, doc.root(), &pool, buf)
}

fn write_node(doc: &Document, id: NodeId, pool: &Pool, buf: &mut Vec<u8>) -> Result<()> {
    let node = doc.node(id);
    let value = node.value();
    let (unique, has_data) = value_flags(value);

    let mut tag = value.type_id();
    if node.name().is_some() {
        tag |= HAS_NAME;
    }
    if node.children().is_empty() {
        tag |= NO_CHILDREN;
    }
    if node.attributes().is_empty() {
        tag |= NO_ATTRS;
    }
    if unique {
        tag |= UNIQUE;
    }
    buf.push(tag);

    if !node.children().is_empty() {
        encode_varint(node.child_count() as u64, buf);
    }
    if let Some(name) = node.name() {
        encode_varint(pool.string_offset(name)?, buf);
    }
    if has_data {
        encode_varint(pool.value_offset(value)?, buf);
    }
    if !node.attributes().is_empty() {
        encode_varint(node.attribute_count() as u64, buf);
        for attr in node.attributes() {
            write_attribute(attr, pool, buf)?;
        }
    }
    for &child in node.children() {
        write_node(doc, child, pool, buf)?;
    }
    Ok(())
}

fn write_attribute(attr: &Attribute, pool: &Pool, buf: &mut Vec<u8>) -> Result<()> {
    let value = attr.value();
    let (unique, has_data) = value_flags(value);

    // The flag is computed from the attribute's own value type.
    let mut tag = value.type_id();
    if attr.name().is_some() {
        tag |= HAS_NAME;
    }
    if unique {
        tag |= UNIQUE;
    }
    buf.push(tag);

    if let Some(name) = attr.name() {
        encode_varint(pool.string_offset(name)?, buf);
    }
    if has_data {
        encode_varint(pool.value_offset(value)?, buf);
    }
    Ok(())
}

// ============================================================================
// READER
// ============================================================================

pub fn decode(r: &mut SliceReader<'_>, encoding: StringEncoding) -> Result<Document> {
    let tree_start = decode_varint_usize(r)?;
    r.seek(tree_start);
    let mut doc = Document::empty(FormatVersion::V2);
    let root = read_node(&mut doc, r, encoding)?;
    doc.set_root(root);
    Ok(doc)
}

/// Decode a pool entry at `offset`, restoring the cursor afterwards.
fn read_pooled_at(
    r: &mut SliceReader<'_>,
    offset: usize,
    type_id: u8,
    negative: bool,
    encoding: StringEncoding,
) -> Result<Value> {
    let saved = r.position();
    r.seek(offset);
    let value = read_pooled(r, type_id, negative, encoding)?;
    r.seek(saved);
    Ok(value)
}

fn read_name_at(r: &mut SliceReader<'_>, encoding: StringEncoding) -> Result<String> {
    let offset = decode_varint_usize(r)?;
    match read_pooled_at(r, offset, 14, false, encoding)? {
        Value::Str(s) => Ok(s),
        _ => unreachable!("type 14 decodes to a string"),
    }
}

fn read_value(
    r: &mut SliceReader<'_>,
    type_id: u8,
    unique: bool,
    encoding: StringEncoding,
) -> Result<Value> {
    if Value::type_is_signed_int(type_id) {
        // Always pooled; the flag is the sign of the magnitude.
        let offset = decode_varint_usize(r)?;
        return read_pooled_at(r, offset, type_id, unique, encoding);
    }
    if unique || type_id < 3 {
        return Value::canonical_empty(type_id);
    }
    let offset = decode_varint_usize(r)?;
    read_pooled_at(r, offset, type_id, false, encoding)
}

fn read_node(
    doc: &mut Document,
    r: &mut SliceReader<'_>,
    encoding: StringEncoding,
) -> Result<NodeId> {
    let tag = r.read_u8()?;
    let type_id = tag & 0x0F;
    let unique = tag & UNIQUE != 0;

    let child_count = if tag & NO_CHILDREN == 0 {
        decode_varint_u32(r)?
    } else {
        0
    };
    let name = if tag & HAS_NAME != 0 {
        Some(read_name_at(r, encoding)?)
    } else {
        None
    };
    let value = read_value(r, type_id, unique, encoding)?;
    let id = doc.create_node(name.as_deref(), value);

    if tag & NO_ATTRS == 0 {
        let attr_count = decode_varint_u32(r)?;
        for _ in 0..attr_count {
            let attr = read_attribute(r, encoding)?;
            doc.push_attribute(id, attr);
        }
    }
    for _ in 0..child_count {
        let child = read_node(doc, r, encoding)?;
        doc.add_child(id, child)?;
    }
    Ok(id)
}

fn read_attribute(r: &mut SliceReader<'_>, encoding: StringEncoding) -> Result<Attribute> {
    let tag = r.read_u8()?;
    let type_id = tag & 0x0F;
    let unique = tag & UNIQUE != 0;
    let name = if tag & HAS_NAME != 0 {
        Some(read_name_at(r, encoding)?)
    } else {
        None
    };
    let value = read_value(r, type_id, unique, encoding)?;
    Ok(Attribute::new(name.as_deref(), value))
}
