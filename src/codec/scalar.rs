// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Scalar payload codec for the sixteen value variants.
//!
//! v1 stores integers at their fixed little-endian width. v2 and v3 store
//! integer payloads as unsigned varints (magnitudes for the sign-magnitude
//! types), which is also the shape of every pool entry. Floats stay fixed
//! width in all versions; strings and byte arrays are length-prefixed.
//!
//! None of these functions touch tag bytes. Tags belong to the per-version
//! codecs; this module only moves payloads.

use crate::codec::header::StringEncoding;
use crate::codec::reader::SliceReader;
use crate::codec::varint::{decode_varint, decode_varint_usize, encode_varint, varint_len};
use crate::error::{FluxionError, Result};
use crate::value::Value;

/// Write a value's v1 payload (fixed-width integers).
pub fn write_value_v1(value: &Value, encoding: StringEncoding, buf: &mut Vec<u8>) {
    match value {
        Value::Null | Value::Bool(_) => {}
        Value::U8(v) => buf.push(*v),
        Value::I8(v) => buf.push(*v as u8),
        Value::Char(v) | Value::U16(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::I16(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::I32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::U32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::I64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::U64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::F32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::F64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Str(s) => {
            let bytes = encoding.encode(s);
            encode_varint(bytes.len() as u64, buf);
            buf.extend_from_slice(&bytes);
        }
        Value::Bytes(b) => {
            encode_varint(b.len() as u64, buf);
            buf.extend_from_slice(b);
        }
    }
}

/// Read a value's v1 payload for the given type id.
pub fn read_value_v1(
    r: &mut SliceReader<'_>,
    type_id: u8,
    encoding: StringEncoding,
) -> Result<Value> {
    Ok(match type_id {
        0 => Value::Null,
        1 => Value::Bool(true),
        2 => Value::Bool(false),
        3 => Value::U8(r.read_u8()?),
        4 => Value::I8(r.read_u8()? as i8),
        5 => Value::Char(read_u16_le(r)?),
        6 => Value::I16(read_u16_le(r)? as i16),
        7 => Value::U16(read_u16_le(r)?),
        8 => Value::I32(read_u32_le(r)? as i32),
        9 => Value::U32(read_u32_le(r)?),
        10 => Value::I64(read_u64_le(r)? as i64),
        11 => Value::U64(read_u64_le(r)?),
        12 => Value::F32(f32::from_le_bytes(read_array::<4>(r)?)),
        13 => Value::F64(f64::from_le_bytes(read_array::<8>(r)?)),
        14 => {
            let len = decode_varint_usize(r)?;
            Value::Str(encoding.decode(r.read_exact(len)?))
        }
        15 => {
            let len = decode_varint_usize(r)?;
            Value::Bytes(r.read_exact(len)?.to_vec())
        }
        other => return Err(FluxionError::UnknownValueType(other)),
    })
}

/// Build the pooled (v2/v3) payload for a data-bearing value.
///
/// Sign-magnitude types contribute their magnitude only; the sign travels
/// in the referencing tag (v2) or the pool entry's type byte (v3). Null and
/// the booleans have no payload and yield an empty buffer.
pub fn pooled_payload(value: &Value, encoding: StringEncoding) -> Vec<u8> {
    let mut buf = Vec::new();
    match value {
        Value::Null | Value::Bool(_) => {}
        Value::U8(v) => buf.push(*v),
        Value::I8(v) => buf.push(*v as u8),
        Value::Char(_)
        | Value::U16(_)
        | Value::U32(_)
        | Value::U64(_)
        | Value::I16(_)
        | Value::I32(_)
        | Value::I64(_) => encode_varint(value.magnitude(), &mut buf),
        Value::F32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::F64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Str(s) => {
            let bytes = encoding.encode(s);
            encode_varint(bytes.len() as u64, &mut buf);
            buf.extend_from_slice(&bytes);
        }
        Value::Bytes(b) => {
            encode_varint(b.len() as u64, &mut buf);
            buf.extend_from_slice(b);
        }
    }
    buf
}

/// Size of the pooled payload without building it. The v2 estimator runs on
/// this and the emitter must match it byte for byte.
pub fn pooled_size(value: &Value, encoding: StringEncoding) -> usize {
    match value {
        Value::Null | Value::Bool(_) => 0,
        Value::U8(_) | Value::I8(_) => 1,
        Value::Char(_)
        | Value::U16(_)
        | Value::U32(_)
        | Value::U64(_)
        | Value::I16(_)
        | Value::I32(_)
        | Value::I64(_) => varint_len(value.magnitude()),
        Value::F32(_) => 4,
        Value::F64(_) => 8,
        Value::Str(s) => {
            let len = encoding.encode(s).len();
            varint_len(len as u64) + len
        }
        Value::Bytes(b) => varint_len(b.len() as u64) + b.len(),
    }
}

/// Read a pooled payload at the reader's current position.
///
/// `negative` only applies to the sign-magnitude types and comes from the
/// v2 unique-flag or the v3 pool entry's sign bit.
pub fn read_pooled(
    r: &mut SliceReader<'_>,
    type_id: u8,
    negative: bool,
    encoding: StringEncoding,
) -> Result<Value> {
    Ok(match type_id {
        0 => Value::Null,
        1 => Value::Bool(true),
        2 => Value::Bool(false),
        3 => Value::U8(r.read_u8()?),
        4 => Value::I8(r.read_u8()? as i8),
        5 => Value::Char(decode_varint(r)? as u16),
        6 | 8 | 10 => {
            let magnitude = decode_varint(r)?;
            Value::from_magnitude(type_id, magnitude, negative)?
        }
        7 => Value::U16(decode_varint(r)? as u16),
        9 => Value::U32(decode_varint(r)? as u32),
        11 => Value::U64(decode_varint(r)?),
        12 => Value::F32(f32::from_le_bytes(read_array::<4>(r)?)),
        13 => Value::F64(f64::from_le_bytes(read_array::<8>(r)?)),
        14 => {
            let len = decode_varint_usize(r)?;
            Value::Str(encoding.decode(r.read_exact(len)?))
        }
        15 => {
            let len = decode_varint_usize(r)?;
            Value::Bytes(r.read_exact(len)?.to_vec())
        }
        other => return Err(FluxionError::UnknownValueType(other)),
    })
}

fn read_array<const N: usize>(r: &mut SliceReader<'_>) -> Result<[u8; N]> {
    let slice = r.read_exact(N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    Ok(out)
}

fn read_u16_le(r: &mut SliceReader<'_>) -> Result<u16> {
    Ok(u16::from_le_bytes(read_array::<2>(r)?))
}

fn read_u32_le(r: &mut SliceReader<'_>) -> Result<u32> {
    Ok(u32::from_le_bytes(read_array::<4>(r)?))
}

fn read_u64_le(r: &mut SliceReader<'_>) -> Result<u64> {
    Ok(u64::from_le_bytes(read_array::<8>(r)?))
}
