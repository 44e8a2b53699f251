//! Decoding of texture coordinate channels from the shared UV stream.
use cmesh_lib::PackedBitVector;
use log::trace;

use crate::layout::{UvLayout, MAX_UV_CHANNELS};
use crate::mesh_geometry::VectorData;
use crate::{Channel, DecodeError};

const LEGACY_DIMENSION: usize = 2;

/// Decodes up to [MAX_UV_CHANNELS] texture coordinate channels with `vertex_count` values each.
/// The index in the returned array is the index of the UV channel.
///
/// For the legacy layout, channel 1 is only present if the stream has enough items for two channels.
/// For the descriptor layout, existing channels are stored one after another in ascending order.
pub fn decode_uvs(
    uv: &PackedBitVector,
    layout: &UvLayout,
    vertex_count: usize,
) -> Result<[Option<VectorData>; MAX_UV_CHANNELS], DecodeError> {
    let mut channels: [Option<VectorData>; MAX_UV_CHANNELS] = Default::default();

    match layout {
        UvLayout::Legacy => {
            let channel_items = LEGACY_DIMENSION * vertex_count;
            let channel_count = if uv.item_count as usize >= channel_items * 2 {
                2
            } else {
                1
            };

            for (i, channel) in channels.iter_mut().take(channel_count).enumerate() {
                *channel = Some(unpack_channel(
                    uv,
                    LEGACY_DIMENSION,
                    i * channel_items,
                    vertex_count,
                )?);
            }
        }
        UvLayout::Descriptor(info) => {
            let mut offset = 0;
            for (i, channel_info) in info.existing_channels() {
                let dimension = channel_info.dimension();
                trace!(
                    "UV channel {} with {} components at item {}",
                    i,
                    dimension,
                    offset
                );

                let channel = channels
                    .get_mut(i)
                    .ok_or(DecodeError::UnsupportedUvChannel(i))?;
                *channel = Some(unpack_channel(uv, dimension, offset, vertex_count)?);

                offset += dimension * vertex_count;
            }
        }
    }

    Ok(channels)
}

fn unpack_channel(
    uv: &PackedBitVector,
    dimension: usize,
    offset: usize,
    vertex_count: usize,
) -> Result<VectorData, DecodeError> {
    let values = uv
        .unpack_floats(dimension, offset, vertex_count)
        .map_err(DecodeError::unpack(Channel::Uv))?;
    Ok(VectorData::from_components(dimension, &values))
}
