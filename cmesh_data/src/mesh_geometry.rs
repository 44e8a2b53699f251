//! The decoded vertex data for a [CompressedMesh].
//!
//! Channels are decoded independently, so the absence of one channel doesn't affect the others.
//! Per vertex channels like UVs use the vertex count of the positions,
//! which is the position item count divided by 3.
use std::error::Error;
use std::path::Path;

use cmesh_lib::{CompressedMesh, FormatVersion, PackedBitVector};
use log::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{
    decode_bind_poses, decode_colors, decode_normals, decode_tangents, decode_triangles,
    decode_vertices,
};
use crate::layout::{ChannelLayout, ColorSource, MAX_UV_CHANNELS};
use crate::skin::{decode_skin_weights, BoneWeights4};
use crate::uv::decode_uvs;
use crate::{Channel, DecodeError};

mod vector_data;
pub use vector_data::VectorData;

/// The uncompressed vertex data for a single mesh.
///
/// Channels are `None` if their packed data is empty.
/// Decoded channels always contain the complete data for the channel.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshGeometry {
    pub vertices: Option<Vec<[f32; 3]>>,
    /// Unit length normals.
    pub normals: Option<Vec<[f32; 3]>>,
    /// Unit length tangents with the bitangent sign of `1.0` or `-1.0` in the W component.
    pub tangents: Option<Vec<[f32; 4]>>,
    /// RGBA colors from either the float or byte color channel.
    pub colors: Option<Vec<[f32; 4]>>,
    pub skin_weights: Option<Vec<BoneWeights4>>,
    /// Texture coordinate channels indexed by UV channel.
    pub uvs: [Option<VectorData>; MAX_UV_CHANNELS],
    /// Row-major 4x4 matrices.
    /// This is empty for versions that store bind poses outside the compressed mesh.
    pub bind_poses: Vec<[[f32; 4]; 4]>,
    /// The vertex indices for the triangle list.
    pub indices: Option<Vec<u32>>,
}

impl MeshGeometry {
    /// Decodes all the channels of `mesh` using the layout for `version`.
    /// See [decode].
    pub fn decode(mesh: &CompressedMesh, version: FormatVersion) -> Result<Self, DecodeError> {
        decode(mesh, version)
    }

    /// Tries to read and decode the record from `path` using the field layout for `version`.
    pub fn from_file<P: AsRef<Path>>(path: P, version: FormatVersion) -> Result<Self, Box<dyn Error>> {
        let mesh = CompressedMesh::from_file(path, version)?;
        Ok(decode(&mesh, version)?)
    }

    /// The number of vertices based on the positions.
    pub fn vertex_count(&self) -> usize {
        self.vertices.as_ref().map(Vec::len).unwrap_or_default()
    }
}

impl TryFrom<(&CompressedMesh, FormatVersion)> for MeshGeometry {
    type Error = DecodeError;

    fn try_from((mesh, version): (&CompressedMesh, FormatVersion)) -> Result<Self, Self::Error> {
        decode(mesh, version)
    }
}

/// Decodes all the channels of `mesh` using the layout for `version`.
///
/// Decoding stops at the first invalid channel, and no partially decoded data is returned.
/**
```rust
use cmesh_data::prelude::*;

let mesh = CompressedMesh {
    vertices: PackedBitVector::pack_floats(&[0.0, 1.0, 2.0], 16),
    triangles: PackedBitVector::pack_uints(&[0, 0, 0]),
    ..Default::default()
};

let geometry = decode(&mesh, FormatVersion::new(2019, 4, 3)).unwrap();
assert_eq!(1, geometry.vertex_count());
assert_eq!(Some(vec![0, 0, 0]), geometry.indices);
assert_eq!(None, geometry.normals);
```
 */
pub fn decode(mesh: &CompressedMesh, version: FormatVersion) -> Result<MeshGeometry, DecodeError> {
    let layout = ChannelLayout::new(version);
    let vertex_count = mesh.vertices.item_count as usize / 3;
    debug!(
        "Decoding compressed mesh for version {} with {} vertices",
        version, vertex_count
    );

    let vertices = decode_channel(&mesh.vertices, Channel::Vertices, || decode_vertices(mesh))?;
    let normals = decode_channel(&mesh.normals, Channel::Normals, || decode_normals(mesh))?;
    let tangents = decode_channel(&mesh.tangents, Channel::Tangents, || decode_tangents(mesh))?;
    let skin_weights =
        decode_channel(&mesh.weights, Channel::Weights, || decode_skin_weights(mesh))?;
    let indices = decode_channel(&mesh.triangles, Channel::Triangles, || {
        decode_triangles(mesh)
    })?;

    let colors = match layout.color_source(mesh) {
        ColorSource::None => None,
        source => {
            debug!("Decoding colors from {:?}", source_channel(&source));
            Some(decode_colors(mesh, &layout)?)
        }
    };

    let uvs = if mesh.uv.is_empty() {
        Default::default()
    } else {
        let uv_layout = layout.uv_layout(mesh);
        debug!("Decoding UVs with layout {:?}", uv_layout);
        decode_uvs(&mesh.uv, &uv_layout, vertex_count)?
    };

    let bind_poses = decode_bind_poses(mesh, &layout)?;

    Ok(MeshGeometry {
        vertices,
        normals,
        tangents,
        colors,
        skin_weights,
        uvs,
        bind_poses,
        indices,
    })
}

fn decode_channel<T, F>(
    vector: &PackedBitVector,
    channel: Channel,
    decode: F,
) -> Result<Option<Vec<T>>, DecodeError>
where
    F: FnOnce() -> Result<Vec<T>, DecodeError>,
{
    if vector.is_empty() {
        return Ok(None);
    }

    let values = decode()?;
    trace!(
        "Decoded {} values for {} from {} items of {} bits",
        values.len(),
        channel,
        vector.item_count,
        vector.bit_width
    );
    Ok(Some(values))
}

fn source_channel(source: &ColorSource) -> Option<Channel> {
    match source {
        ColorSource::Float(_) => Some(Channel::FloatColors),
        ColorSource::Byte(_) => Some(Channel::Colors),
        ColorSource::None => None,
    }
}
