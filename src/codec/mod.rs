// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Binary format for Fluxion documents.
//!
//! Three format versions share one preamble and one tree model, and differ
//! only in how the body lays the tree out:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ PREAMBLE                                                     │
//! │   magic:    [u8; 3] = "FLX"                                  │
//! │   version:  u8      = 1 | 2 | 3                              │
//! │   encoding: u8      = 0 UTF-8 | 1 UTF-16LE | 2 UTF-32LE     │
//! │             (v1 and v2 only; v3 is always UTF-8)             │
//! ├──────────────────────────────────────────────────────────────┤
//! │ v1: node records in prefix order, values inline              │
//! │ v2: varint treeStart ++ value pool ++ offset-based records   │
//! │ v3: item/data counts ++ data pool ++ flat item table         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Readers accept any version up to the current one and fail on anything
//! newer. Writers emit the version picked in [`WriteOptions`]. Encoding is
//! all-or-nothing: a failed decode returns an error and no partial tree.

pub mod header;
pub mod reader;
pub mod scalar;
pub mod v1;
pub mod v2;
pub mod v3;
pub mod varint;

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::document::Document;
use crate::error::Result;
use crate::value::Tolerance;

pub use header::{FormatVersion, StringEncoding, MAGIC};
pub use reader::SliceReader;
pub use varint::{decode_varint, encode_varint, MAX_VARINT_BYTES};

/// The version emitted when the caller does not pick one.
pub const CURRENT_VERSION: FormatVersion = FormatVersion::CURRENT;

/// Write-side configuration.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Format version to emit. Defaults to the current version.
    pub version: FormatVersion,
    /// Text encoding for names and string values. Only v1 and v2 honor it;
    /// v3 is always UTF-8.
    pub encoding: StringEncoding,
    /// Float tolerances for content equality during the v3 dedup pass.
    pub tolerance: Tolerance,
    /// Whether v3 runs its reference/dedup pass. Ignored by v1 and v2.
    pub optimize: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            version: FormatVersion::CURRENT,
            encoding: StringEncoding::Utf8,
            tolerance: Tolerance::default(),
            optimize: true,
        }
    }
}

impl WriteOptions {
    pub fn with_version(version: FormatVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }
}

/// Encode a document to bytes.
pub fn to_bytes(doc: &Document, options: &WriteOptions) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    header::write_header(options.version, options.encoding, &mut buf);
    match options.version {
        FormatVersion::V1 => v1::encode(doc, options.encoding, &mut buf)?,
        FormatVersion::V2 => v2::encode(doc, options.encoding, &mut buf)?,
        FormatVersion::V3 => v3::encode(doc, &options.tolerance, options.optimize, &mut buf)?,
    }
    Ok(buf)
}

/// Decode a document from bytes. The document's version field reports the
/// version of the file that was read.
pub fn from_bytes(bytes: &[u8]) -> Result<Document> {
    let mut r = SliceReader::new(bytes);
    let (version, encoding) = header::read_header(&mut r)?;
    match version {
        FormatVersion::V1 => v1::decode(&mut r, encoding),
        FormatVersion::V2 => v2::decode(&mut r, encoding),
        FormatVersion::V3 => v3::decode(&mut r),
    }
}

/// Encode into any writer.
pub fn to_writer<W: Write>(doc: &Document, options: &WriteOptions, w: &mut W) -> Result<()> {
    let bytes = to_bytes(doc, options)?;
    w.write_all(&bytes)?;
    Ok(())
}

/// Read a whole stream and decode it. The format needs seeking for v2, so
/// the stream is buffered fully before decode.
pub fn from_reader<R: Read>(r: &mut R) -> Result<Document> {
    let mut bytes = Vec::new();
    r.read_to_end(&mut bytes)?;
    from_bytes(&bytes)
}

/// Write a document to a file. The handle closes on every exit path.
pub fn write_file<P: AsRef<Path>>(path: P, doc: &Document, options: &WriteOptions) -> Result<()> {
    let bytes = to_bytes(doc, options)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Read a document from a file. The handle closes on every exit path.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let bytes = fs::read(path)?;
    from_bytes(&bytes)
}
