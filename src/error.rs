// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the Fluxion codec.
//!
//! Every failure mode gets its own variant. All of them are fatal to the
//! current read or write: no partial tree is ever returned, the caller
//! recovers by discarding whatever was under construction.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FluxionError>;

/// Errors raised by the tree model and the three codecs.
#[derive(Debug, Error)]
pub enum FluxionError {
    /// The stream does not start with the `FLX` magic bytes.
    #[error("invalid header: expected FLX magic")]
    InvalidHeader,

    /// The stream ended short of an expected field.
    #[error("unexpected end of stream")]
    EndOfStream,

    /// The version byte names a format this library does not speak.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    /// The encoding byte is not one of UTF-8, UTF-16LE, UTF-32LE.
    #[error("unknown string encoding id {0}")]
    UnknownEncoding(u8),

    /// A value type id outside 0..=15.
    #[error("unknown value type id {0}")]
    UnknownValueType(u8),

    /// A v3 item declared one value type but the data pool entry stores another.
    #[error("value type mismatch: declared {expected}, pool entry is {actual}")]
    ValueTypeMismatch { expected: u8, actual: u8 },

    /// Attaching a node would create a cycle or re-parent the root.
    #[error("invalid parent: attachment would create a cycle")]
    InvalidParent,

    /// Writer invariant violation: a value was not collected by the analysis pass.
    #[error("analyzed data missing: value not found in the pool")]
    AnalyzedDataMissing,

    /// The v2 pool size prediction did not match what was emitted.
    #[error("pool size estimation mismatch: expected {expected}, emitted {actual}")]
    EstimationMismatch { expected: u64, actual: u64 },

    /// A v3 item control byte outside the defined set.
    #[error("disoriented read: control byte {0:#04x} not in defined set")]
    DisorientedRead(u8),

    /// A v3 item reference landed on the wrong kind of item.
    #[error("unexpected item type at index {index}: wanted {wanted}")]
    UnexpectedItemType { index: u64, wanted: &'static str },

    /// A varint encoding that would overflow its target width.
    #[error("varint overflows target width")]
    VarintOverflow,

    /// Underlying I/O failure from the file-path or reader/writer entry points.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
