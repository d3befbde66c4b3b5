// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Version 1: streaming prefix-order codec.
//!
//! One pass, no seeking, no pooling. Each node is a tag byte followed by its
//! optional fields, its attributes, then its children, recursively:
//!
//! ```text
//! tag  = valueType | hasName<<4 | noChildren<<5 | noAttrs<<6
//! [varint childCount]      when the node has children
//! [varint nameLen ++ name] when named
//! value payload            fixed-width integers, see the type table
//! [varint attrCount ++ attribute records]
//! child records, recursively
//!
//! attribute tag = valueType | hasName<<4
//! ```
//!
//! The reader consumes strictly left to right; a short read anywhere is
//! `EndOfStream`.

use crate::codec::header::StringEncoding;
use crate::codec::reader::SliceReader;
use crate::codec::scalar::{read_value_v1, write_value_v1};
use crate::codec::varint::{decode_varint_u32, decode_varint_usize, encode_varint};
use crate::document::{Attribute, Document, NodeId};
use crate::error::Result;

const HAS_NAME: u8 = 1 << 4;
const NO_CHILDREN: u8 = 1 << 5;
const NO_ATTRS: u8 = 1 << 6;

pub fn encode(doc: &Document, encoding: StringEncoding, buf: &mut Vec<u8>) -> Result<()> {
    write_node(doc, doc.root(), encoding, buf);
    Ok(())
}

pub fn decode(r: &mut SliceReader<'_>, encoding: StringEncoding) -> Result<Document> {
    let mut doc = Document::empty(crate::codec::header::FormatVersion::V1);
    let root = read_node(&mut doc, r, encoding)?;
    doc.set_root(root);
    Ok(doc)
}

fn write_name(name: &str, encoding: StringEncoding, buf: &mut Vec<u8>) {
    let bytes = encoding.encode(name);
    encode_varint(bytes.len() as u64, buf);
    buf.extend_from_slice(&bytes);
}

fn write_node(doc: &Document, id: NodeId, encoding: StringEncoding, buf: &mut Vec<u8>) {
    let node = doc.node(id);
    let mut tag = node.value().type_id();
    if node.name().is_some() {
        tag |= HAS_NAME;
    }
    if node.children().is_empty() {
        tag |= NO_CHILDREN;
    }
    if node.attributes().is_empty() {
        tag |= NO_ATTRS;
    }
    buf.push(tag);

    if !node.children().is_empty() {
        encode_varint(node.child_count() as u64, buf);
    }
    if let Some(name) = node.name() {
        write_name(name, encoding, buf);
    }
    write_value_v1(node.value(), encoding, buf);

    if !node.attributes().is_empty() {
        encode_varint(node.attribute_count() as u64, buf);
        for attr in node.attributes() {
            write_attribute(attr, encoding, buf);
        }
    }
    for &child in node.children() {
        write_node(doc, child, encoding, buf);
    }
}

fn write_attribute(attr: &Attribute, encoding: StringEncoding, buf: &mut Vec<u8>) {
    let mut tag = attr.value().type_id();
    if attr.name().is_some() {
        tag |= HAS_NAME;
    }
    buf.push(tag);
    if let Some(name) = attr.name() {
        write_name(name, encoding, buf);
    }
    write_value_v1(attr.value(), encoding, buf);
}

fn read_name(r: &mut SliceReader<'_>, encoding: StringEncoding) -> Result<String> {
    let len = decode_varint_usize(r)?;
    Ok(encoding.decode(r.read_exact(len)?))
}

fn read_node(
    doc: &mut Document,
    r: &mut SliceReader<'_>,
    encoding: StringEncoding,
) -> Result<NodeId> {
    let tag = r.read_u8()?;
    let type_id = tag & 0x0F;

    let child_count = if tag & NO_CHILDREN == 0 {
        decode_varint_u32(r)?
    } else {
        0
    };
    let name = if tag & HAS_NAME != 0 {
        Some(read_name(r, encoding)?)
    } else {
        None
    };
    let value = read_value_v1(r, type_id, encoding)?;
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
    let name = if tag & HAS_NAME != 0 {
        Some(read_name(r, encoding)?)
    } else {
        None
    };
    let value = read_value_v1(r, type_id, encoding)?;
    Ok(Attribute::new(name.as_deref(), value))
}
