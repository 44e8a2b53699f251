use bitvec::prelude::*;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The order of bits within each packed item.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    /// The first bit in the stream is the most significant bit of the item.
    #[default]
    MsbFirst,
    /// The first bit in the stream is the least significant bit of the item.
    /// This is the layout written by the engine's serializer.
    LsbFirst,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BitReadError {
    #[error("Failed to read enough bits from reader.")]
    NotEnoughBits,
}

enum Bits<'a> {
    Msb(&'a BitSlice<u8, Msb0>),
    Lsb(&'a BitSlice<u8, Lsb0>),
}

pub struct BitReader<'a> {
    bits: Bits<'a>,
    index: usize,
}

impl<'a> BitReader<'a> {
    pub fn from_slice(bytes: &'a [u8], order: BitOrder) -> Self {
        let bits = match order {
            BitOrder::MsbFirst => Bits::Msb(bytes.view_bits::<Msb0>()),
            BitOrder::LsbFirst => Bits::Lsb(bytes.view_bits::<Lsb0>()),
        };
        Self { bits, index: 0 }
    }

    /// Moves the reader to an absolute bit position.
    pub fn seek_bits(&mut self, index: usize) {
        self.index = index;
    }

    /// Reads `bit_count` bits as an unsigned integer.
    /// `bit_count` must be at most 32.
    pub fn read_u32(&mut self, bit_count: usize) -> Result<u32, BitReadError> {
        // bitvec can't load zero bits.
        if bit_count == 0 {
            return Ok(0);
        }

        let range = self.index..self.index + bit_count;
        let value: u32 = match self.bits {
            Bits::Msb(bits) => bits
                .get(range)
                .ok_or(BitReadError::NotEnoughBits)?
                .load_be(),
            Bits::Lsb(bits) => bits
                .get(range)
                .ok_or(BitReadError::NotEnoughBits)?
                .load_le(),
        };
        self.index += bit_count;

        Ok(value)
    }
}

enum BitBuffer {
    Msb(BitVec<u8, Msb0>),
    Lsb(BitVec<u8, Lsb0>),
}

// Assume preallocated sizes for writing bits.
pub struct BitWriter {
    bits: BitBuffer,
    index: usize,
}

impl BitWriter {
    /// Creates a zeroed buffer with room for `bit_count` bits.
    pub fn with_len(bit_count: usize, order: BitOrder) -> Self {
        let bits = match order {
            BitOrder::MsbFirst => BitBuffer::Msb(BitVec::repeat(false, bit_count)),
            BitOrder::LsbFirst => BitBuffer::Lsb(BitVec::repeat(false, bit_count)),
        };
        Self { bits, index: 0 }
    }

    /// Writes the lowest `bit_count` bits of `value`.
    /// `bit_count` must be at most 32 and fit in the remaining buffer.
    pub fn write(&mut self, value: u32, bit_count: usize) {
        if bit_count == 0 {
            return;
        }

        let range = self.index..self.index + bit_count;
        match &mut self.bits {
            BitBuffer::Msb(bits) => bits[range].store_be(value),
            BitBuffer::Lsb(bits) => bits[range].store_le(value),
        }
        self.index += bit_count;
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self.bits {
            BitBuffer::Msb(bits) => bits.into_vec(),
            BitBuffer::Lsb(bits) => bits.into_vec(),
        }
    }
}
