// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Fluxion: a compact binary serialization format for hierarchical, named,
//! attributed, dynamically-typed tree data — a binary alternative to
//! XML/JSON/YAML.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │  value.rs   │────▶│ document.rs  │────▶│  codec/          │
//! │ (Value, 16  │     │ (arena tree, │     │  v1: streaming   │
//! │  variants)  │     │  NodeId)     │     │  v2: value pool  │
//! └─────────────┘     └──────────────┘     │  v3: item table  │
//!                                          └──────────────────┘
//! ```
//!
//! Three wire versions read and write the same tree model. v1 streams the
//! tree in prefix order with inline values. v2 dedups strings and values
//! into a pool and refers to them by byte offset, which needs a seeking
//! reader. v3 flattens every node and attribute into one item table and
//! compresses repeated subtrees into reference items.
//!
//! # Usage
//!
//! ```
//! use fluxion::{Attribute, Document, Value, WriteOptions};
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! doc.set_name(root, Some("MyRootNode"));
//! let user = doc.create_node(Some("User"), Value::from("mike"));
//! doc.push_attribute(user, Attribute::named("Age", Value::I32(35)));
//! doc.add_child(root, user).unwrap();
//!
//! let bytes = fluxion::to_bytes(&doc, &WriteOptions::default()).unwrap();
//! let decoded = fluxion::from_bytes(&bytes).unwrap();
//! assert!(doc.content_eq(&decoded, &Default::default()));
//! ```
//!
//! Trees are single-threaded under mutation; a finished document is freely
//! shareable read-only. Layer compression or encryption on the byte stream
//! yourself, the format does neither.

pub mod codec;
pub mod document;
pub mod error;
pub mod json;
pub mod value;

pub use codec::{
    from_bytes, from_reader, read_file, to_bytes, to_writer, write_file, FormatVersion,
    StringEncoding, WriteOptions, CURRENT_VERSION, MAGIC,
};
pub use document::{Attribute, CloneSpec, Document, Node, NodeId};
pub use error::{FluxionError, Result};
pub use json::{from_json, to_json};
pub use value::{Tolerance, Value, DEFAULT_F32_EPSILON, DEFAULT_F64_EPSILON};
