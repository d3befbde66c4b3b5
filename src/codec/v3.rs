// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Version 3: flat item table with reference compression.
//!
//! Every node and attribute becomes one item in a single array, children and
//! attributes are lists of earlier item indices, and an item that repeats an
//! earlier subtree shrinks to a reference record. Identical consecutive
//! references collapse further into one record with a repeat count. Text is
//! always UTF-8; the header drops the encoding byte.
//!
//! ```text
//! varint itemCount            total nodes + attributes
//! varint dataCount            unique value pool size
//! data entries                typeByte ++ pooled payload (sign in bit 7)
//! item records                see the tag bitfield below
//! varint rootItemIndex
//! ```
//!
//! Item tag: bit 0 isReference, bit 1 isAttribute, bit 2 hasName,
//! bit 3 hasValue; nodes use bit 4 hasChildren, bit 5 copyChildren,
//! bit 6 hasAttributes, bit 7 copyAttributes, while attributes carry their
//! value type id in bits 4..7.
//!
//! The writer runs three passes: count (sizes the table), flatten
//! (post-order, pools names and values), optimize (marks reference items by
//! tolerance-aware deep equality; gated by the `optimize` option).

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::codec::header::{FormatVersion, StringEncoding};
use crate::codec::reader::SliceReader;
use crate::codec::scalar::{pooled_payload, read_pooled};
use crate::codec::varint::{decode_varint_usize, encode_varint};
use crate::document::{Attribute, CloneSpec, Document, NodeId};
use crate::error::{FluxionError, Result};
use crate::value::{Tolerance, Value};

const IS_REFERENCE: u8 = 1 << 0;
const IS_ATTRIBUTE: u8 = 1 << 1;
const HAS_NAME: u8 = 1 << 2;
const HAS_VALUE: u8 = 1 << 3;
const HAS_CHILDREN: u8 = 1 << 4;
const COPY_CHILDREN: u8 = 1 << 5;
const HAS_ATTRIBUTES: u8 = 1 << 6;
const COPY_ATTRIBUTES: u8 = 1 << 7;

/// Sign bit on a data pool entry's type byte (sign-magnitude integers only).
const SIGN: u8 = 0x80;

/// Child/attribute id list encodings.
const LIST_EXPLICIT: u8 = 0;
const LIST_RANGE: u8 = 1;

// ============================================================================
// WRITER: DATA POOL
// ============================================================================

#[derive(Debug, Default)]
struct DataPool {
    /// (type byte incl. sign, payload), in insertion order.
    entries: Vec<(u8, Vec<u8>)>,
    by_string: HashMap<String, u32>,
    by_digest: HashMap<[u8; 32], u32>,
    by_scalar: HashMap<(u8, u64), u32>,
    /// Floats dedup by tolerance, so they need a scan, not a hash.
    floats: Vec<(u8, f64, u32)>,
}

impl DataPool {
    fn push(&mut self, type_byte: u8, payload: Vec<u8>) -> u32 {
        self.entries.push((type_byte, payload));
        (self.entries.len() - 1) as u32
    }

    fn intern_string(&mut self, s: &str) -> u32 {
        if let Some(&id) = self.by_string.get(s) {
            return id;
        }
        let payload = pooled_payload(&Value::Str(s.to_string()), StringEncoding::Utf8);
        let id = self.push(14, payload);
        self.by_string.insert(s.to_string(), id);
        id
    }

    /// Intern any non-null value, returning its pool index. Equal values
    /// share an entry; floats compare within the write tolerance so the
    /// dedup matches what a reader reconstructs.
    fn intern_value(&mut self, value: &Value, tolerance: &Tolerance) -> u32 {
        debug_assert!(!matches!(value, Value::Null));
        match value {
            Value::Str(s) => self.intern_string(s),
            Value::Bytes(b) => {
                let digest: [u8; 32] = Sha256::digest(b).into();
                if let Some(&id) = self.by_digest.get(&digest) {
                    return id;
                }
                let payload = pooled_payload(value, StringEncoding::Utf8);
                let id = self.push(15, payload);
                self.by_digest.insert(digest, id);
                id
            }
            Value::F32(v) => {
                if let Some(&(_, _, id)) = self
                    .floats
                    .iter()
                    .find(|(t, x, _)| *t == 12 && (*x - f64::from(*v)).abs() <= f64::from(tolerance.f32_epsilon))
                {
                    return id;
                }
                let payload = pooled_payload(value, StringEncoding::Utf8);
                let id = self.push(12, payload);
                self.floats.push((12, f64::from(*v), id));
                id
            }
            Value::F64(v) => {
                if let Some(&(_, _, id)) = self
                    .floats
                    .iter()
                    .find(|(t, x, _)| *t == 13 && (*x - *v).abs() <= tolerance.f64_epsilon)
                {
                    return id;
                }
                let payload = pooled_payload(value, StringEncoding::Utf8);
                let id = self.push(13, payload);
                self.floats.push((13, *v, id));
                id
            }
            _ => {
                let mut type_byte = value.type_id();
                if value.is_negative() {
                    type_byte |= SIGN;
                }
                // i8 keys on its raw byte (the sign lives in the payload,
                // not the type byte); the rest key on their magnitude.
                let bits = match value {
                    Value::I8(v) => u64::from(*v as u8),
                    _ => value.magnitude(),
                };
                let key = (type_byte, bits);
                if let Some(&id) = self.by_scalar.get(&key) {
                    return id;
                }
                let payload = pooled_payload(value, StringEncoding::Utf8);
                let id = self.push(type_byte, payload);
                self.by_scalar.insert(key, id);
                id
            }
        }
    }
}

// ============================================================================
// WRITER: FLATTENED ITEMS
// ============================================================================

/// Where a flat item came from, for structural equality during optimize.
#[derive(Debug, Clone, Copy)]
enum Source {
    Node(NodeId),
    Attr(NodeId, usize),
}

#[derive(Debug)]
struct FlatItem {
    source: Source,
    is_attr: bool,
    name_id: Option<u32>,
    /// (base type id, data pool index) for non-null values.
    value: Option<(u8, u32)>,
    children: Vec<u32>,
    attributes: Vec<u32>,
    /// Set by the optimize pass; a marked item inherits everything from its
    /// target and emits as a reference record.
    reference: Option<RefMark>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RefMark {
    target: u32,
    copy_children: bool,
    copy_attributes: bool,
}

fn count_items(doc: &Document, id: NodeId) -> usize {
    let node = doc.node(id);
    let mut total = 1 + node.attribute_count();
    for &child in node.children() {
        total += count_items(doc, child);
    }
    total
}

/// Post-order flatten: children first, then the node's attributes, then the
/// node itself, so every index an item mentions is already in the table.
fn flatten(
    doc: &Document,
    id: NodeId,
    pool: &mut DataPool,
    items: &mut Vec<FlatItem>,
    tolerance: &Tolerance,
) -> u32 {
    let node = doc.node(id);

    let children: Vec<u32> = node
        .children()
        .iter()
        .map(|&child| flatten(doc, child, pool, items, tolerance))
        .collect();

    let mut attributes = Vec::with_capacity(node.attribute_count());
    for (index, attr) in node.attributes().iter().enumerate() {
        let name_id = attr.name().map(|n| pool.intern_string(n));
        let value = match attr.value() {
            Value::Null => None,
            v => Some((v.type_id(), pool.intern_value(v, tolerance))),
        };
        items.push(FlatItem {
            source: Source::Attr(id, index),
            is_attr: true,
            name_id,
            value,
            children: Vec::new(),
            attributes: Vec::new(),
            reference: None,
        });
        attributes.push((items.len() - 1) as u32);
    }

    let name_id = node.name().map(|n| pool.intern_string(n));
    let value = match node.value() {
        Value::Null => None,
        v => Some((v.type_id(), pool.intern_value(v, tolerance))),
    };
    items.push(FlatItem {
        source: Source::Node(id),
        is_attr: false,
        name_id,
        value,
        children,
        attributes,
        reference: None,
    });
    (items.len() - 1) as u32
}

fn sources_equal(doc: &Document, a: Source, b: Source, tolerance: &Tolerance) -> bool {
    match (a, b) {
        (Source::Node(x), Source::Node(y)) => doc.deep_eq(x, y, tolerance),
        (Source::Attr(nx, ix), Source::Attr(ny, iy)) => {
            let ax = &doc.node(nx).attributes()[ix];
            let ay = &doc.node(ny).attributes()[iy];
            ax.approx_eq(ay, tolerance)
        }
        _ => false,
    }
}

/// Mark repeated subtrees as references to their first occurrence.
///
/// Matches resolve through earlier marks to the underlying item, which keeps
/// runs of identical repeats pointing at one target so the emitter can
/// collapse them into a single counted record.
fn optimize(doc: &Document, items: &mut [FlatItem], tolerance: &Tolerance) {
    for i in 1..items.len() {
        let mut found: Option<u32> = None;
        for j in (0..i).rev() {
            if items[j].is_attr != items[i].is_attr {
                continue;
            }
            if sources_equal(doc, items[i].source, items[j].source, tolerance) {
                let mut target = j as u32;
                if let Some(mark) = items[j].reference {
                    target = mark.target;
                }
                found = Some(target);
                break;
            }
        }
        if let Some(target) = found {
            items[i].reference = Some(RefMark {
                target,
                copy_children: !items[i].children.is_empty(),
                copy_attributes: !items[i].attributes.is_empty(),
            });
        }
    }
}

// ============================================================================
// WRITER: EMISSION
// ============================================================================

fn write_id_list(ids: &[u32], buf: &mut Vec<u8>) {
    let consecutive = ids.windows(2).all(|w| w[1] == w[0] + 1);
    if consecutive && !ids.is_empty() {
        buf.push(LIST_RANGE);
        encode_varint(u64::from(ids[0]), buf);
        encode_varint(u64::from(ids[ids.len() - 1]) + 1, buf);
    } else {
        buf.push(LIST_EXPLICIT);
        encode_varint(ids.len() as u64, buf);
        for &id in ids {
            encode_varint(u64::from(id), buf);
        }
    }
}

pub fn encode(
    doc: &Document,
    tolerance: &Tolerance,
    run_optimize: bool,
    buf: &mut Vec<u8>,
) -> Result<()> {
    let mut pool = DataPool::default();
    let mut items = Vec::with_capacity(count_items(doc, doc.root()));
    let root_index = flatten(doc, doc.root(), &mut pool, &mut items, tolerance);
    if run_optimize {
        optimize(doc, &mut items, tolerance);
    }

    encode_varint(items.len() as u64, buf);
    encode_varint(pool.entries.len() as u64, buf);
    for (type_byte, payload) in &pool.entries {
        buf.push(*type_byte);
        buf.extend_from_slice(payload);
    }

    let mut i = 0;
    while i < items.len() {
        let item = &items[i];
        if let Some(mark) = item.reference {
            // Identical consecutive references collapse into one counted run.
            let mut count = 1usize;
            while i + count < items.len()
                && items[i + count].is_attr == item.is_attr
                && items[i + count].reference == Some(mark)
            {
                count += 1;
            }
            let mut tag = IS_REFERENCE;
            if item.is_attr {
                tag |= IS_ATTRIBUTE;
            } else {
                if mark.copy_children {
                    tag |= COPY_CHILDREN;
                }
                if mark.copy_attributes {
                    tag |= COPY_ATTRIBUTES;
                }
            }
            buf.push(tag);
            encode_varint(u64::from(mark.target), buf);
            encode_varint(count as u64, buf);
            i += count;
        } else {
            write_item(item, buf);
            i += 1;
        }
    }

    encode_varint(u64::from(root_index), buf);
    Ok(())
}

fn write_item(item: &FlatItem, buf: &mut Vec<u8>) {
    let mut tag = 0u8;
    if item.is_attr {
        tag |= IS_ATTRIBUTE;
    }
    if item.name_id.is_some() {
        tag |= HAS_NAME;
    }
    if let Some((type_id, _)) = item.value {
        tag |= HAS_VALUE;
        if item.is_attr {
            tag |= type_id << 4;
        }
    }
    if !item.is_attr {
        if !item.children.is_empty() {
            tag |= HAS_CHILDREN;
        }
        if !item.attributes.is_empty() {
            tag |= HAS_ATTRIBUTES;
        }
    }
    buf.push(tag);

    if let Some(name_id) = item.name_id {
        encode_varint(u64::from(name_id), buf);
    }
    if let Some((type_id, data_id)) = item.value {
        if !item.is_attr {
            buf.push(type_id);
        }
        encode_varint(u64::from(data_id), buf);
    }
    if !item.is_attr {
        if !item.children.is_empty() {
            write_id_list(&item.children, buf);
        }
        if !item.attributes.is_empty() {
            write_id_list(&item.attributes, buf);
        }
    }
}

// ============================================================================
// READER
// ============================================================================

/// A materialized item slot. A counted reference run stores the same node id
/// (or attribute value) in several consecutive slots.
#[derive(Debug, Clone)]
enum Slot {
    Node(NodeId),
    Attr(Attribute),
}

pub fn decode(r: &mut SliceReader<'_>) -> Result<Document> {
    let mut doc = Document::empty(FormatVersion::V3);

    let item_count = decode_varint_usize(r)?;
    let data_count = decode_varint_usize(r)?;

    let mut pool: Vec<(u8, Value)> = Vec::with_capacity(data_count.min(1 << 16));
    for _ in 0..data_count {
        let type_byte = r.read_u8()?;
        let base = type_byte & 0x7F;
        let negative = type_byte & SIGN != 0;
        if base > 15 || (negative && !Value::type_is_signed_int(base)) {
            return Err(FluxionError::UnknownValueType(type_byte));
        }
        let value = read_pooled(r, base, negative, StringEncoding::Utf8)?;
        pool.push((base, value));
    }

    let mut slots: Vec<Slot> = Vec::with_capacity(item_count.min(1 << 16));
    while slots.len() < item_count {
        read_item(&mut doc, r, &pool, &mut slots, item_count)?;
    }

    let root_index = decode_varint_usize(r)?;
    match slots.get(root_index) {
        Some(Slot::Node(id)) => {
            doc.set_root(*id);
            Ok(doc)
        }
        _ => Err(FluxionError::UnexpectedItemType {
            index: root_index as u64,
            wanted: "node",
        }),
    }
}

fn pool_entry<'p>(pool: &'p [(u8, Value)], id: usize) -> Result<&'p (u8, Value)> {
    pool.get(id).ok_or(FluxionError::AnalyzedDataMissing)
}

fn pool_string(pool: &[(u8, Value)], id: usize) -> Result<String> {
    let (base, value) = pool_entry(pool, id)?;
    match value {
        Value::Str(s) => Ok(s.clone()),
        _ => Err(FluxionError::ValueTypeMismatch {
            expected: 14,
            actual: *base,
        }),
    }
}

fn pool_value(pool: &[(u8, Value)], id: usize, declared: u8) -> Result<Value> {
    let (base, value) = pool_entry(pool, id)?;
    if *base != declared {
        return Err(FluxionError::ValueTypeMismatch {
            expected: declared,
            actual: *base,
        });
    }
    Ok(value.clone())
}

/// Read a child/attribute id list. `bound` is the current item index; every
/// id must point at an earlier, already materialized item.
fn read_id_list(r: &mut SliceReader<'_>, bound: usize) -> Result<Vec<usize>> {
    match r.read_u8()? {
        LIST_EXPLICIT => {
            let count = decode_varint_usize(r)?;
            let mut ids = Vec::with_capacity(count.min(1 << 16));
            for _ in 0..count {
                ids.push(decode_varint_usize(r)?);
            }
            Ok(ids)
        }
        LIST_RANGE => {
            let min = decode_varint_usize(r)?;
            let max = decode_varint_usize(r)?;
            if max > bound {
                return Err(FluxionError::UnexpectedItemType {
                    index: max as u64,
                    wanted: "earlier item",
                });
            }
            Ok((min..max).collect())
        }
        other => Err(FluxionError::DisorientedRead(other)),
    }
}

fn slot_node(slots: &[Slot], id: usize) -> Result<NodeId> {
    match slots.get(id) {
        Some(Slot::Node(node)) => Ok(*node),
        _ => Err(FluxionError::UnexpectedItemType {
            index: id as u64,
            wanted: "node",
        }),
    }
}

fn slot_attr<'s>(slots: &'s [Slot], id: usize) -> Result<&'s Attribute> {
    match slots.get(id) {
        Some(Slot::Attr(attr)) => Ok(attr),
        _ => Err(FluxionError::UnexpectedItemType {
            index: id as u64,
            wanted: "attribute",
        }),
    }
}

fn read_item(
    doc: &mut Document,
    r: &mut SliceReader<'_>,
    pool: &[(u8, Value)],
    slots: &mut Vec<Slot>,
    item_count: usize,
) -> Result<()> {
    let index = slots.len();
    let tag = r.read_u8()?;
    let is_reference = tag & IS_REFERENCE != 0;
    let is_attr = tag & IS_ATTRIBUTE != 0;
    let has_name = tag & HAS_NAME != 0;
    let has_value = tag & HAS_VALUE != 0;

    let (target, count) = if is_reference {
        let target = decode_varint_usize(r)?;
        let count = decode_varint_usize(r)?;
        if count == 0 {
            return Err(FluxionError::DisorientedRead(0));
        }
        if target >= index {
            return Err(FluxionError::UnexpectedItemType {
                index: target as u64,
                wanted: "earlier item",
            });
        }
        (Some(target), count)
    } else {
        (None, 1)
    };
    if index + count > item_count {
        return Err(FluxionError::UnexpectedItemType {
            index: (index + count) as u64,
            wanted: "item slot within the declared table",
        });
    }

    let name = if has_name {
        Some(pool_string(pool, decode_varint_usize(r)?)?)
    } else {
        None
    };

    if is_attr {
        let mut attr = match target {
            Some(t) => slot_attr(slots, t)?.clone(),
            None => Attribute::unnamed(Value::Null),
        };
        if let Some(name) = name {
            attr.set_name(Some(&name));
        }
        if has_value {
            let declared = tag >> 4;
            let data_id = decode_varint_usize(r)?;
            attr.set_value(pool_value(pool, data_id, declared)?);
        }
        for _ in 0..count {
            slots.push(Slot::Attr(attr.clone()));
        }
        return Ok(());
    }

    let has_children = tag & HAS_CHILDREN != 0;
    let copy_children = tag & COPY_CHILDREN != 0;
    let has_attrs = tag & HAS_ATTRIBUTES != 0;
    let copy_attrs = tag & COPY_ATTRIBUTES != 0;

    let node = match target {
        Some(t) => {
            let referent = slot_node(slots, t)?;
            doc.clone_node(
                referent,
                &CloneSpec {
                    name: !has_name,
                    value: !has_value,
                    attributes: copy_attrs,
                    children: copy_children,
                },
            )
        }
        None => doc.create_node(None, Value::Null),
    };
    if let Some(name) = name {
        doc.set_name(node, Some(&name));
    }
    if has_value {
        let declared = r.read_u8()?;
        let data_id = decode_varint_usize(r)?;
        doc.set_value(node, pool_value(pool, data_id, declared)?);
    }
    if has_children {
        for id in read_id_list(r, index)? {
            let mut child = slot_node(slots, id)?;
            // A slot already attached elsewhere attaches as a deep copy;
            // item slots may share one materialized instance.
            if doc.parent(child).is_some() {
                child = doc.clone_node(child, &CloneSpec::all());
            }
            doc.add_child(node, child)?;
        }
    }
    if has_attrs {
        for id in read_id_list(r, index)? {
            let attr = slot_attr(slots, id)?.clone();
            doc.push_attribute(node, attr);
        }
    }
    for _ in 0..count {
        slots.push(Slot::Node(node));
    }
    Ok(())
}
