// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! File preamble: `FLX` magic, version byte, and (v1/v2) the string
//! encoding id.
//!
//! Version 3 fixed the text encoding at UTF-8 and dropped the encoding byte,
//! so the preamble is 5 bytes for v1/v2 and 4 bytes for v3. Readers accept
//! any version up to [`FormatVersion::CURRENT`] and reject the rest, which
//! is what keeps old libraries honest about files from the future.

use crate::codec::reader::SliceReader;
use crate::error::{FluxionError, Result};

/// Magic bytes: "FLX" in ASCII.
pub const MAGIC: [u8; 3] = [0x46, 0x4C, 0x58];

/// On-wire format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// Streaming prefix-order encoding.
    V1,
    /// Pooled values behind byte offsets, seeking reader.
    V2,
    /// Flat item table with reference compression.
    V3,
}

impl FormatVersion {
    /// The version writers emit when the caller does not pick one.
    pub const CURRENT: FormatVersion = FormatVersion::V3;

    pub fn as_byte(self) -> u8 {
        match self {
            FormatVersion::V1 => 1,
            FormatVersion::V2 => 2,
            FormatVersion::V3 => 3,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            1 => Ok(FormatVersion::V1),
            2 => Ok(FormatVersion::V2),
            3 => Ok(FormatVersion::V3),
            other => Err(FluxionError::UnsupportedVersion(other)),
        }
    }

    /// v1 and v2 carry an encoding byte after the version; v3 does not.
    pub fn has_encoding_byte(self) -> bool {
        !matches!(self, FormatVersion::V3)
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// Text encoding for names and string values (v1/v2 selectable, v3 UTF-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringEncoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf32Le,
}

impl StringEncoding {
    pub fn as_byte(self) -> u8 {
        match self {
            StringEncoding::Utf8 => 0,
            StringEncoding::Utf16Le => 1,
            StringEncoding::Utf32Le => 2,
        }
    }

    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(StringEncoding::Utf8),
            1 => Ok(StringEncoding::Utf16Le),
            2 => Ok(StringEncoding::Utf32Le),
            other => Err(FluxionError::UnknownEncoding(other)),
        }
    }

    /// Encode a string to bytes in this encoding.
    pub fn encode(self, s: &str) -> Vec<u8> {
        match self {
            StringEncoding::Utf8 => s.as_bytes().to_vec(),
            StringEncoding::Utf16Le => s
                .encode_utf16()
                .flat_map(|unit| unit.to_le_bytes())
                .collect(),
            StringEncoding::Utf32Le => s
                .chars()
                .flat_map(|c| (c as u32).to_le_bytes())
                .collect(),
        }
    }

    /// Decode bytes in this encoding. Invalid sequences decode lossily to
    /// replacement characters; the format has no error for bad text.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            StringEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            StringEncoding::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            StringEncoding::Utf32Le => bytes
                .chunks_exact(4)
                .map(|quad| {
                    let code = u32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]]);
                    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
                })
                .collect(),
        }
    }
}

/// Write the preamble for the given version.
pub fn write_header(version: FormatVersion, encoding: StringEncoding, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&MAGIC);
    buf.push(version.as_byte());
    if version.has_encoding_byte() {
        buf.push(encoding.as_byte());
    }
}

/// Read and validate the preamble. Returns the version and the effective
/// text encoding (always UTF-8 for v3).
pub fn read_header(r: &mut SliceReader<'_>) -> Result<(FormatVersion, StringEncoding)> {
    let magic = r.read_exact(3)?;
    if magic != MAGIC {
        return Err(FluxionError::InvalidHeader);
    }
    let version = FormatVersion::from_byte(r.read_u8()?)?;
    let encoding = if version.has_encoding_byte() {
        StringEncoding::from_byte(r.read_u8()?)?
    } else {
        StringEncoding::Utf8
    };
    Ok((version, encoding))
}
