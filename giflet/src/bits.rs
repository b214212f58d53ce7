// bits.rs
//
// Copyright (c) 2026  Douglas Lau
//
//! Bit-level reader for LZW codes
use crate::error::{Error, Result};

/// Maximum code width for GIF LZW
pub const MAX_CODE_BITS: u8 = 12;

/// LSB-first bit reader over a byte slice
///
/// Codes are packed starting at the least significant bit of each byte, as
/// GIF requires.
#[derive(Debug)]
pub struct BitReader<'a> {
    /// Input bytes
    bytes: &'a [u8],
    /// Byte cursor
    pos: usize,
    /// Bit accumulator
    acc: u32,
    /// Number of valid bits in accumulator
    n_bits: u8,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader
    pub fn new(bytes: &'a [u8]) -> Self {
        BitReader {
            bytes,
            pos: 0,
            acc: 0,
            n_bits: 0,
        }
    }

    /// Number of bits not yet consumed
    pub fn remaining_bits(&self) -> usize {
        (self.bytes.len() - self.pos) * 8 + usize::from(self.n_bits)
    }

    /// Read the next code of `width` bits
    pub fn next_code(&mut self, width: u8) -> Result<u16> {
        debug_assert!(width > 0 && width <= MAX_CODE_BITS);
        while self.n_bits < width {
            let byte = *self.bytes.get(self.pos).ok_or(Error::BitstreamExhausted)?;
            self.acc |= u32::from(byte) << self.n_bits;
            self.n_bits += 8;
            self.pos += 1;
        }
        let code = (self.acc & ((1 << width) - 1)) as u16;
        self.acc >>= width;
        self.n_bits -= width;
        Ok(code)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lsb_first() {
        let buffer = &[
            0b1000_0100,
            0b1000_1111,
            0b1010_1001,
        ];
        let mut reader = BitReader::new(buffer);
        assert_eq!(reader.next_code(3), Ok(0b100));
        assert_eq!(reader.next_code(3), Ok(0b000));
        assert_eq!(reader.next_code(3), Ok(0b110));
        assert_eq!(reader.next_code(3), Ok(0b111));
        assert_eq!(reader.next_code(3), Ok(0b000));
        assert_eq!(reader.next_code(3), Ok(0b011));
        assert_eq!(reader.next_code(3), Ok(0b010));
        assert_eq!(reader.next_code(3), Ok(0b101));
        assert_eq!(reader.remaining_bits(), 0);
    }

    #[test]
    fn width_changes() {
        let buffer = &[0xAB, 0xCD, 0xEF];
        let mut reader = BitReader::new(buffer);
        assert_eq!(reader.next_code(4), Ok(0xB));
        assert_eq!(reader.next_code(12), Ok(0xCDA));
        assert_eq!(reader.next_code(8), Ok(0xEF));
        assert_eq!(reader.next_code(3), Err(Error::BitstreamExhausted));
    }

    #[test]
    fn exhausted() {
        let mut reader = BitReader::new(&[0xFF]);
        assert_eq!(reader.next_code(5), Ok(0x1F));
        assert_eq!(reader.next_code(5), Err(Error::BitstreamExhausted));
        let mut reader = BitReader::new(&[0x01, 0x00]);
        assert_eq!(reader.next_code(9), Ok(1));
        assert_eq!(reader.remaining_bits(), 7);
    }
}
