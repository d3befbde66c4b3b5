// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! JSON bridge: export a document as `serde_json::Value` and import the
//! same shape back.
//!
//! The mapping is structural, not typed: JSON has one number type and no
//! byte arrays, so integer widths collapse on export (and come back as the
//! narrowest of i64/u64/f64), chars come back as u16 numbers would, and
//! byte values export as base64 strings that re-import as strings. Use the
//! binary format when types must survive; this exists for interop and for
//! eyeballing documents.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Map, Number};

use crate::document::{Attribute, Document, NodeId};
use crate::error::Result;
use crate::value::Value;

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => json!(b),
        Value::U8(v) => json!(v),
        Value::I8(v) => json!(v),
        Value::Char(v) => json!(v),
        Value::I16(v) => json!(v),
        Value::U16(v) => json!(v),
        Value::I32(v) => json!(v),
        Value::U32(v) => json!(v),
        Value::I64(v) => json!(v),
        Value::U64(v) => json!(v),
        Value::F32(v) => Number::from_f64(f64::from(*v))
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::F64(v) => Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Str(s) => json!(s),
        Value::Bytes(b) => json!(BASE64.encode(b)),
    }
}

fn json_to_value(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Value::I64(v)
            } else if let Some(v) = n.as_u64() {
                Value::U64(v)
            } else {
                Value::F64(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Value::Str(s.clone()),
        // Containers have no scalar counterpart; they only appear under the
        // "children"/"attributes" keys, anything else flattens to null.
        _ => Value::Null,
    }
}

fn node_to_json(doc: &Document, id: NodeId) -> serde_json::Value {
    let node = doc.node(id);
    let mut map = Map::new();
    if let Some(name) = node.name() {
        map.insert("name".into(), json!(name));
    }
    if node.value() != &Value::Null {
        map.insert("value".into(), value_to_json(node.value()));
    }
    if !node.attributes().is_empty() {
        let attrs: Vec<serde_json::Value> = node
            .attributes()
            .iter()
            .map(|attr| {
                let mut entry = Map::new();
                if let Some(name) = attr.name() {
                    entry.insert("name".into(), json!(name));
                }
                entry.insert("value".into(), value_to_json(attr.value()));
                serde_json::Value::Object(entry)
            })
            .collect();
        map.insert("attributes".into(), json!(attrs));
    }
    if !node.children().is_empty() {
        let children: Vec<serde_json::Value> = node
            .children()
            .iter()
            .map(|&child| node_to_json(doc, child))
            .collect();
        map.insert("children".into(), json!(children));
    }
    serde_json::Value::Object(map)
}

/// Export a document as a JSON object tree.
pub fn to_json(doc: &Document) -> serde_json::Value {
    node_to_json(doc, doc.root())
}

fn node_from_json(doc: &mut Document, value: &serde_json::Value) -> Result<NodeId> {
    let obj = match value {
        serde_json::Value::Object(obj) => obj,
        // A bare scalar becomes an unnamed node carrying it.
        other => {
            let id = doc.create_node(None, json_to_value(other));
            return Ok(id);
        }
    };
    let name = obj.get("name").and_then(|n| n.as_str());
    let node_value = obj.get("value").map(json_to_value).unwrap_or(Value::Null);
    let id = doc.create_node(name, node_value);

    if let Some(serde_json::Value::Array(attrs)) = obj.get("attributes") {
        for attr in attrs {
            let name = attr.get("name").and_then(|n| n.as_str());
            let value = attr.get("value").map(json_to_value).unwrap_or(Value::Null);
            doc.push_attribute(id, Attribute::new(name, value));
        }
    }
    if let Some(serde_json::Value::Array(children)) = obj.get("children") {
        for child in children {
            let child_id = node_from_json(doc, child)?;
            doc.add_child(id, child_id)?;
        }
    }
    Ok(id)
}

/// Import the shape produced by [`to_json`] back into a document.
pub fn from_json(value: &serde_json::Value) -> Result<Document> {
    let mut doc = Document::empty(crate::codec::header::FormatVersion::CURRENT);
    let root = node_from_json(&mut doc, value)?;
    doc.set_root(root);
    Ok(doc)
}
