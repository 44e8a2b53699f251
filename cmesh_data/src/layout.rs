//! Version dependent channel presence and layout.
//!
//! The [FormatVersion] decides which optional fields of a [CompressedMesh] are serialized.
//! A field that is serialized may still be empty, so presence also depends on the item count.
use cmesh_lib::{CompressedMesh, FormatVersion, PackedBitVector};
use modular_bitfield::prelude::*;

use crate::DecodeError;

pub const MAX_UV_CHANNELS: usize = 8;

const UV_INFO_BITS_PER_CHANNEL: usize = 4;

/// The optional fields that are serialized for a [FormatVersion].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    pub has_bind_poses: bool,
    pub has_float_colors: bool,
    pub has_colors: bool,
    pub has_uv_info: bool,
}

/// The packed data used for vertex colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorSource<'a> {
    /// 4 dequantized items per color.
    Float(&'a PackedBitVector),
    /// A single item per color storing all 4 channels.
    Byte(&'a PackedBitVector),
    None,
}

/// The arrangement of texture coordinate channels in the UV stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvLayout {
    /// A 2 component channel 0 optionally followed by a 2 component channel 1.
    Legacy,
    /// Channels and dimensions described by a UV info bitfield.
    Descriptor(UvInfo),
}

impl ChannelLayout {
    pub fn new(version: FormatVersion) -> Self {
        Self {
            has_bind_poses: version.has_bind_poses(),
            has_float_colors: version.has_float_colors(),
            has_colors: version.has_colors(),
            has_uv_info: version.has_uv_info(),
        }
    }

    /// The bind poses if the version serializes them.
    /// The returned vector may still be empty.
    pub fn bind_poses<'a>(&self, mesh: &'a CompressedMesh) -> Option<&'a PackedBitVector> {
        self.has_bind_poses
            .then(|| mesh.bind_poses.as_ref())
            .flatten()
    }

    /// Selects the non empty color channel for this version.
    /// Float colors take priority over byte colors.
    pub fn color_source<'a>(&self, mesh: &'a CompressedMesh) -> ColorSource<'a> {
        let present = |enabled: bool, v: &'a Option<PackedBitVector>| {
            v.as_ref().filter(|v| enabled && !v.is_empty())
        };

        if let Some(float_colors) = present(self.has_float_colors, &mesh.float_colors) {
            ColorSource::Float(float_colors)
        } else if let Some(colors) = present(self.has_colors, &mesh.colors) {
            ColorSource::Byte(colors)
        } else {
            ColorSource::None
        }
    }

    /// Selects the texture coordinate layout.
    /// Missing or zero UV info uses the legacy layout.
    pub fn uv_layout(&self, mesh: &CompressedMesh) -> UvLayout {
        match mesh.uv_info.filter(|info| self.has_uv_info && *info != 0) {
            Some(info) => UvLayout::Descriptor(UvInfo(info)),
            None => UvLayout::Legacy,
        }
    }
}

/// A bitfield with 4 bits for each of the 8 texture coordinate channels.
/// Channel 0 uses the lowest 4 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UvInfo(pub u32);

impl UvInfo {
    /// The 4 bit description for the channel at `index`.
    pub fn channel(&self, index: usize) -> Result<UvChannelInfo, DecodeError> {
        if index >= MAX_UV_CHANNELS {
            return Err(DecodeError::UnsupportedUvChannel(index));
        }

        // Two channels per byte with the even channel in the low bits.
        let byte = self.0.to_le_bytes()[index / 2];
        let bits = (byte >> ((index % 2) * UV_INFO_BITS_PER_CHANNEL)) & 0xF;
        Ok(UvChannelInfo::from_bytes([bits]))
    }

    /// The index and description of each existing channel in ascending order.
    pub fn existing_channels(&self) -> impl Iterator<Item = (usize, UvChannelInfo)> + '_ {
        (0..MAX_UV_CHANNELS)
            .filter_map(move |i| self.channel(i).ok().map(|c| (i, c)))
            .filter(|(_, c)| c.exists())
    }
}

/// The 4 bit description of a single UV channel.
/// The upper 4 bits are always zero.
#[bitfield(bits = 8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UvChannelInfo {
    pub dimension_minus_one: B2,
    pub exists: bool,
    #[skip]
    __: B5,
}

impl UvChannelInfo {
    /// The number of components from 1 to 4.
    pub fn dimension(&self) -> usize {
        1 + self.dimension_minus_one() as usize
    }
}
