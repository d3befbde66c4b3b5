// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Positioned byte source over a fully-loaded buffer.
//!
//! The v1 and v3 decoders only ever move forward; v2 seeks into its data
//! pool and back for every reference. Both run over the same reader: an
//! absolute-position cursor on a byte slice. Short reads surface as
//! `EndOfStream` at the exact field that ran dry.

use crate::error::{FluxionError, Result};

#[derive(Debug)]
pub struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current absolute position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Jump to an absolute position. A position past the end is allowed;
    /// the next read reports `EndOfStream`.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or(FluxionError::EndOfStream)?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(FluxionError::EndOfStream)?;
        let slice = self.data.get(self.pos..end).ok_or(FluxionError::EndOfStream)?;
        self.pos = end;
        Ok(slice)
    }
}
