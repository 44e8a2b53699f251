//! The bit packed storage used for every channel of a [CompressedMesh](crate::CompressedMesh).
//!
//! Each [PackedBitVector] stores `item_count` raw integers of `bit_width` bits packed
//! back to back with no padding. Float channels map each raw integer `r` back to a float using
//! `start + (r / (2^bit_width - 1)) * range`.
//!
//! All reads go through a [BitVectorView], a borrowed and immutable view of the buffer.
//! Views can reinterpret the same bytes with a different item count and bit width
//! without modifying the underlying vector.
use std::num::NonZeroU8;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bitutils::{BitOrder, BitReadError, BitReader, BitWriter};

/// The largest supported bit width for a single item.
pub const MAX_BIT_WIDTH: u8 = 32;

/// The most items that can be unpacked at once from a vector with a bit width of 0.
/// These items take up no space in the buffer, so the item count isn't limited by the data.
pub const MAX_ZERO_WIDTH_ITEMS: usize = 1 << 24;

/// Errors while unpacking the items of a [PackedBitVector] or [BitVectorView].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnpackError {
    /// The requested items extend past the end of the vector.
    #[error(
        "Unpacking {count} items at offset {start} exceeds the item count of {item_count}."
    )]
    OutOfBounds {
        start: usize,
        count: usize,
        item_count: usize,
    },

    /// The buffer is too small for the requested items.
    #[error("Expected at least {expected} bits of data but found {actual}.")]
    NotEnoughBits { expected: usize, actual: usize },

    /// Items wider than [MAX_BIT_WIDTH] bits can't be represented.
    #[error("A bit width of {0} exceeds the maximum of 32 bits.")]
    UnsupportedBitWidth(u8),

    /// Items with a bit width of 0 exceed [MAX_ZERO_WIDTH_ITEMS].
    #[error("Unpacking {count} items with a bit width of 0 exceeds the maximum of {max} items.")]
    TooManyZeroWidthItems { count: usize, max: usize },

    #[error(transparent)]
    BitRead(#[from] BitReadError),
}

/// A quantized sequence of fixed width integers.
///
/// Integer channels such as bone indices leave `range` and `start` as `0.0`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackedBitVector {
    /// The number of scalar items and not the number of vertices.
    pub item_count: u32,
    pub bit_width: u8,
    pub range: f32,
    pub start: f32,
    pub data: Vec<u8>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bit_order: BitOrder,
}

impl PackedBitVector {
    /// Creates an integer vector from already packed `data`.
    pub fn new(item_count: u32, bit_width: u8, data: Vec<u8>) -> Self {
        Self {
            item_count,
            bit_width,
            range: 0.0,
            start: 0.0,
            data,
            bit_order: BitOrder::default(),
        }
    }

    /// Creates a float vector from already packed `data`.
    pub fn new_float(item_count: u32, bit_width: u8, range: f32, start: f32, data: Vec<u8>) -> Self {
        Self {
            item_count,
            bit_width,
            range,
            start,
            data,
            bit_order: BitOrder::default(),
        }
    }

    /// Sets the order used to interpret the bits of each item.
    pub fn with_bit_order(mut self, bit_order: BitOrder) -> Self {
        self.bit_order = bit_order;
        self
    }

    /// Returns `true` if the vector stores no items.
    /// Channels with no items are considered absent.
    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    /// A borrowed view of all the items.
    pub fn view(&self) -> BitVectorView<'_> {
        BitVectorView {
            data: &self.data,
            item_count: self.item_count as usize,
            bit_width: self.bit_width,
            range: self.range,
            start: self.start,
            bit_order: self.bit_order,
        }
    }

    /// Unpacks every item as an unsigned integer.
    pub fn unpack_uints(&self) -> Result<Vec<u32>, UnpackError> {
        self.view().unpack_uints()
    }

    /// Unpacks every item with the bit pattern reinterpreted as [i32].
    pub fn unpack_ints(&self) -> Result<Vec<i32>, UnpackError> {
        self.view().unpack_ints()
    }

    /// Unpacks and dequantizes `value_count` values of `components_per_value` items
    /// starting from the item at `start_item_offset`.
    pub fn unpack_floats(
        &self,
        components_per_value: usize,
        start_item_offset: usize,
        value_count: usize,
    ) -> Result<Vec<f32>, UnpackError> {
        self.view()
            .unpack_floats(components_per_value, start_item_offset, value_count)
    }

    /// Unpacks and dequantizes every item.
    pub fn unpack_all_floats(&self) -> Result<Vec<f32>, UnpackError> {
        self.view().unpack_all_floats()
    }

    /// Packs `values` using the fewest bits needed to store the largest value.
    /**
    ```rust
    # use cmesh_lib::PackedBitVector;
    let packed = PackedBitVector::pack_uints(&[1, 5, 3]);
    assert_eq!(3, packed.bit_width);
    assert_eq!(vec![1, 5, 3], packed.unpack_uints().unwrap());
    ```
    */
    pub fn pack_uints(values: &[u32]) -> Self {
        let max = values.iter().copied().max().unwrap_or(0);
        let bit_width = (u32::BITS - max.leading_zeros()) as u8;

        let mut writer = BitWriter::with_len(values.len() * bit_width as usize, BitOrder::default());
        for value in values {
            writer.write(*value, bit_width as usize);
        }

        Self::new(values.len() as u32, bit_width, writer.into_bytes())
    }

    /// Quantizes `values` to `bit_width` bits over the range of the smallest and largest value.
    /// Bit widths above [MAX_BIT_WIDTH] are clamped.
    pub fn pack_floats(values: &[f32], bit_width: u8) -> Self {
        let min = values.iter().copied().reduce(f32::min).unwrap_or(0.0);
        let max = values.iter().copied().reduce(f32::max).unwrap_or(0.0);
        Self::pack_floats_in_range(values, bit_width, min, max - min)
    }

    /// Quantizes `values` to `bit_width` bits over the range `start..=start + range`.
    /// Values outside the range are clamped.
    pub fn pack_floats_in_range(values: &[f32], bit_width: u8, start: f32, range: f32) -> Self {
        let bit_width = bit_width.min(MAX_BIT_WIDTH);

        let mut writer = BitWriter::with_len(values.len() * bit_width as usize, BitOrder::default());
        if let Some(bit_count) = NonZeroU8::new(bit_width) {
            for value in values {
                writer.write(quantize(*value, start, range, bit_count), bit_width as usize);
            }
        }

        Self::new_float(
            values.len() as u32,
            bit_width,
            range,
            start,
            writer.into_bytes(),
        )
    }
}

/// A borrowed and read only view of packed items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitVectorView<'a> {
    data: &'a [u8],
    item_count: usize,
    bit_width: u8,
    range: f32,
    start: f32,
    bit_order: BitOrder,
}

impl<'a> BitVectorView<'a> {
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn bit_width(&self) -> u8 {
        self.bit_width
    }

    /// Views the same bytes as `item_count` items of `bit_width` bits each.
    /// The source vector is left unchanged.
    /**
    ```rust
    # use cmesh_lib::PackedBitVector;
    // A single 32 bit item viewed as four 8 bit items.
    let packed = PackedBitVector::new(1, 32, vec![1, 2, 3, 4]);
    let bytes = packed.view().reinterpret(4, 8);
    assert_eq!(vec![1, 2, 3, 4], bytes.unpack_uints().unwrap());
    assert_eq!(1, packed.item_count);
    assert_eq!(32, packed.bit_width);
    ```
    */
    pub fn reinterpret(self, item_count: usize, bit_width: u8) -> Self {
        Self {
            item_count,
            bit_width,
            ..self
        }
    }

    pub fn unpack_uints(&self) -> Result<Vec<u32>, UnpackError> {
        self.unpack_range(0, self.item_count)
    }

    pub fn unpack_ints(&self) -> Result<Vec<i32>, UnpackError> {
        // Preserve the bit pattern for widths of 32 bits.
        Ok(self
            .unpack_uints()?
            .into_iter()
            .map(|v| v as i32)
            .collect())
    }

    pub fn unpack_floats(
        &self,
        components_per_value: usize,
        start_item_offset: usize,
        value_count: usize,
    ) -> Result<Vec<f32>, UnpackError> {
        let count = components_per_value
            .checked_mul(value_count)
            .ok_or(UnpackError::OutOfBounds {
                start: start_item_offset,
                count: usize::MAX,
                item_count: self.item_count,
            })?;

        let values = self.unpack_range(start_item_offset, count)?;
        Ok(values.into_iter().map(|v| self.dequantize(v)).collect())
    }

    pub fn unpack_all_floats(&self) -> Result<Vec<f32>, UnpackError> {
        self.unpack_floats(1, 0, self.item_count)
    }

    fn unpack_range(&self, start: usize, count: usize) -> Result<Vec<u32>, UnpackError> {
        if self.bit_width > MAX_BIT_WIDTH {
            return Err(UnpackError::UnsupportedBitWidth(self.bit_width));
        }

        let end = start
            .checked_add(count)
            .filter(|end| *end <= self.item_count)
            .ok_or(UnpackError::OutOfBounds {
                start,
                count,
                item_count: self.item_count,
            })?;

        let bit_width = self.bit_width as usize;
        if bit_width == 0 && count > MAX_ZERO_WIDTH_ITEMS {
            return Err(UnpackError::TooManyZeroWidthItems {
                count,
                max: MAX_ZERO_WIDTH_ITEMS,
            });
        }

        let expected = end * bit_width;
        let actual = self.data.len() * 8;
        if expected > actual {
            return Err(UnpackError::NotEnoughBits { expected, actual });
        }

        let mut reader = BitReader::from_slice(self.data, self.bit_order);
        reader.seek_bits(start * bit_width);

        (0..count)
            .map(|_| reader.read_u32(bit_width).map_err(Into::into))
            .collect()
    }

    fn dequantize(&self, value: u32) -> f32 {
        match NonZeroU8::new(self.bit_width) {
            Some(bit_count) => {
                let scale = bit_mask(bit_count) as f32;
                self.start + (value as f32 / scale) * self.range
            }
            // All items are zero, so every value is the start of the range.
            None => self.start,
        }
    }
}

fn bit_mask(bit_count: NonZeroU8) -> u64 {
    // Get a mask of bit_count many bits set to 1.
    (1u64 << bit_count.get()) - 1u64
}

fn quantize(value: f32, start: f32, range: f32, bit_count: NonZeroU8) -> u32 {
    // The inverse operation of dequantization.
    if range == 0.0 {
        return 0;
    }

    let scale = bit_mask(bit_count) as f64;
    let ratio = ((value - start) / range).clamp(0.0, 1.0) as f64;
    (ratio * scale).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hexlit::hex;

    #[test]
    fn unpack_uints_msb_first() {
        // 4 bit items 1, 2, 15, 0.
        let packed = PackedBitVector::new(4, 4, hex!(12f0).to_vec());
        assert_eq!(vec![1, 2, 15, 0], packed.unpack_uints().unwrap());
    }

    #[test]
    fn unpack_uints_lsb_first() {
        let packed =
            PackedBitVector::new(4, 4, hex!(21 0f).to_vec()).with_bit_order(BitOrder::LsbFirst);
        assert_eq!(vec![1, 2, 15, 0], packed.unpack_uints().unwrap());
    }

    #[test]
    fn unpack_uints_odd_width() {
        // 5 bit items 31, 0, 17 packed as 11111 00000 10001 0.
        let packed = PackedBitVector::new(3, 5, vec![0b1111_1000, 0b0010_0010]);
        assert_eq!(vec![31, 0, 17], packed.unpack_uints().unwrap());
    }

    #[test]
    fn unpack_uints_32_bit() {
        let packed = PackedBitVector::new(1, 32, hex!(ffffffff).to_vec());
        assert_eq!(vec![u32::MAX], packed.unpack_uints().unwrap());
        assert_eq!(vec![-1], packed.unpack_ints().unwrap());
    }

    #[test]
    fn unpack_uints_zero_width() {
        let packed = PackedBitVector::new(3, 0, Vec::new());
        assert_eq!(vec![0, 0, 0], packed.unpack_uints().unwrap());
    }

    #[test]
    fn unpack_uints_zero_width_item_limit() {
        let packed = PackedBitVector::new(u32::MAX, 0, Vec::new());
        assert_eq!(
            Err(UnpackError::TooManyZeroWidthItems {
                count: u32::MAX as usize,
                max: MAX_ZERO_WIDTH_ITEMS
            }),
            packed.unpack_uints()
        );

        // Smaller ranges of the same vector can still be read.
        assert_eq!(vec![0.0; 3], packed.unpack_floats(3, 1000, 1).unwrap());
    }

    #[test]
    fn unpack_uints_empty() {
        let packed = PackedBitVector::default();
        assert!(packed.is_empty());
        assert!(packed.unpack_uints().unwrap().is_empty());
    }

    #[test]
    fn unpack_uints_not_enough_bits() {
        let packed = PackedBitVector::new(3, 8, vec![1, 2]);
        assert_eq!(
            Err(UnpackError::NotEnoughBits {
                expected: 24,
                actual: 16
            }),
            packed.unpack_uints()
        );
    }

    #[test]
    fn unpack_uints_unsupported_width() {
        let packed = PackedBitVector::new(1, 33, vec![0; 5]);
        assert_eq!(
            Err(UnpackError::UnsupportedBitWidth(33)),
            packed.unpack_uints()
        );
    }

    #[test]
    fn unpack_floats_dequantize() {
        // 8 bit items over the range -1.0 to 1.0.
        let packed = PackedBitVector::new_float(3, 8, 2.0, -1.0, vec![0, 255, 0x80]);
        let values = packed.unpack_all_floats().unwrap();
        assert_relative_eq!(-1.0, values[0]);
        assert_relative_eq!(1.0, values[1]);
        assert_relative_eq!(-1.0 + 2.0 * 128.0 / 255.0, values[2]);
    }

    #[test]
    fn unpack_floats_offset() {
        let packed = PackedBitVector::new_float(6, 8, 255.0, 0.0, vec![0, 1, 2, 3, 4, 5]);
        let values = packed.unpack_floats(2, 2, 2).unwrap();
        assert_eq!(4, values.len());
        for (expected, actual) in [2.0f32, 3.0, 4.0, 5.0].iter().zip(values) {
            assert_relative_eq!(*expected, actual, epsilon = 1e-5);
        }
    }

    #[test]
    fn unpack_floats_out_of_bounds() {
        let packed = PackedBitVector::new_float(4, 8, 1.0, 0.0, vec![0; 4]);
        assert_eq!(
            Err(UnpackError::OutOfBounds {
                start: 2,
                count: 4,
                item_count: 4
            }),
            packed.unpack_floats(2, 2, 2)
        );
    }

    #[test]
    fn unpack_floats_zero_width() {
        let packed = PackedBitVector::new_float(2, 0, 5.0, 0.25, Vec::new());
        assert_eq!(vec![0.25, 0.25], packed.unpack_all_floats().unwrap());
    }

    #[test]
    fn reinterpret_does_not_modify_source() {
        let packed = PackedBitVector::new(2, 16, hex!(ff80 00ff).to_vec());
        let view = packed.view().reinterpret(4, 8);

        assert_eq!(vec![255, 128, 0, 255], view.unpack_uints().unwrap());
        assert_eq!(vec![0xff80, 0x00ff], packed.unpack_uints().unwrap());
        assert_eq!(2, packed.view().item_count());
        assert_eq!(16, packed.view().bit_width());
    }

    #[test]
    fn pack_uints_bit_width() {
        let packed = PackedBitVector::pack_uints(&[31, 7, 0]);
        assert_eq!(5, packed.bit_width);
        assert_eq!(3, packed.item_count);
        assert_eq!(vec![31, 7, 0], packed.unpack_uints().unwrap());
    }

    #[test]
    fn pack_uints_zeros() {
        let packed = PackedBitVector::pack_uints(&[0, 0]);
        assert_eq!(0, packed.bit_width);
        assert_eq!(vec![0, 0], packed.unpack_uints().unwrap());
    }

    #[test]
    fn pack_floats_range() {
        let packed = PackedBitVector::pack_floats(&[-2.0, 0.5, 3.0], 16);
        assert_eq!(-2.0, packed.start);
        assert_eq!(5.0, packed.range);

        let values = packed.unpack_all_floats().unwrap();
        assert_relative_eq!(-2.0, values[0]);
        assert_relative_eq!(0.5, values[1], epsilon = 5.0 / 65535.0);
        assert_relative_eq!(3.0, values[2]);
    }

    #[test]
    fn pack_floats_constant() {
        let packed = PackedBitVector::pack_floats(&[1.5, 1.5], 8);
        assert_eq!(vec![1.5, 1.5], packed.unpack_all_floats().unwrap());
    }
}
