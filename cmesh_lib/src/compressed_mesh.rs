//! The [CompressedMesh] record stores every vertex attribute of a mesh as a separate [PackedBitVector].
//!
//! Some fields are only serialized for certain versions.
//! See [FormatVersion] for the version gating rules.
use std::fs;
use std::path::Path;

use binread::io::{Cursor, Read, Seek};
use binread::{BinRead, BinReaderExt};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{BitOrder, FormatVersion, PackedBitVector};

/// The bit packed channels for a single mesh.
///
/// Optional fields are `None` if the field isn't serialized for the version.
/// Empty vectors with an `item_count` of 0 represent absent channels.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompressedMesh {
    /// XYZ positions with 3 items per vertex.
    pub vertices: PackedBitVector,
    /// All texture coordinate channels packed one after another.
    pub uv: PackedBitVector,
    /// Row-major 4x4 matrices with 16 items per matrix.
    pub bind_poses: Option<PackedBitVector>,
    /// The XY components with 2 items per normal.
    pub normals: PackedBitVector,
    /// The XY components with 2 items per tangent.
    pub tangents: PackedBitVector,
    /// Quantized weights in the range 0 to 31.
    pub weights: PackedBitVector,
    /// One sign for the Z component of each normal.
    pub normal_signs: PackedBitVector,
    /// Two signs for each tangent for the Z component and the W component.
    pub tangent_signs: PackedBitVector,
    /// RGBA colors with 4 items per color.
    pub float_colors: Option<PackedBitVector>,
    pub bone_indices: PackedBitVector,
    /// The vertex indices for the triangle list.
    pub triangles: PackedBitVector,
    /// RGBA colors with a single item per color storing all 4 channels.
    pub colors: Option<PackedBitVector>,
    /// 4 bits per texture coordinate channel describing the channel's dimension and presence.
    pub uv_info: Option<u32>,
}

/// Errors while reading a [CompressedMesh] from binary data.
#[derive(Debug, Error)]
pub enum ReadRecordError {
    #[error(transparent)]
    BinRead(#[from] binread::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CompressedMesh {
    /// Returns `true` if the mesh has vertex positions.
    pub fn is_set(&self) -> bool {
        !self.vertices.is_empty()
    }

    /// Tries to read the record from `path` using the field layout for `version`.
    /// The entire file is buffered for performance.
    pub fn from_file<P: AsRef<Path>>(path: P, version: FormatVersion) -> Result<Self, ReadRecordError> {
        let mut reader = Cursor::new(fs::read(path)?);
        Self::read(&mut reader, version)
    }

    /// Tries to read the record from `reader` using the field layout for `version`.
    /// Alignment is relative to the start of `reader`.
    /// For best performance when opening from a file, use [CompressedMesh::from_file] instead.
    pub fn read<R: Read + Seek>(reader: &mut R, version: FormatVersion) -> Result<Self, ReadRecordError> {
        let vertices = reader.read_le::<PackedFloatVector>()?.into();
        let uv = reader.read_le::<PackedFloatVector>()?.into();
        let bind_poses = if version.has_bind_poses() {
            Some(reader.read_le::<PackedFloatVector>()?.into())
        } else {
            None
        };
        let normals = reader.read_le::<PackedFloatVector>()?.into();
        let tangents = reader.read_le::<PackedFloatVector>()?.into();
        let weights = reader.read_le::<PackedIntVector>()?.into();
        let normal_signs = reader.read_le::<PackedIntVector>()?.into();
        let tangent_signs = reader.read_le::<PackedIntVector>()?.into();
        let float_colors = if version.has_float_colors() {
            Some(reader.read_le::<PackedFloatVector>()?.into())
        } else {
            None
        };
        let bone_indices = reader.read_le::<PackedIntVector>()?.into();
        let triangles = reader.read_le::<PackedIntVector>()?.into();
        let colors = if version.has_colors() {
            Some(reader.read_le::<PackedIntVector>()?.into())
        } else {
            None
        };
        let uv_info = if version.has_uv_info() {
            Some(reader.read_le::<u32>()?)
        } else {
            None
        };

        Ok(Self {
            vertices,
            uv,
            bind_poses,
            normals,
            tangents,
            weights,
            normal_signs,
            tangent_signs,
            float_colors,
            bone_indices,
            triangles,
            colors,
            uv_info,
        })
    }
}

// The serialized layouts only differ by the dequantization range.
#[derive(BinRead, Debug)]
struct PackedFloatVector {
    num_items: u32,
    range: f32,
    start: f32,
    data_len: u32,
    #[br(count = data_len as usize, align_after = 4)]
    data: Vec<u8>,
    #[br(align_after = 4)]
    bit_size: u8,
}

#[derive(BinRead, Debug)]
struct PackedIntVector {
    num_items: u32,
    data_len: u32,
    #[br(count = data_len as usize, align_after = 4)]
    data: Vec<u8>,
    #[br(align_after = 4)]
    bit_size: u8,
}

impl From<PackedFloatVector> for PackedBitVector {
    fn from(v: PackedFloatVector) -> Self {
        PackedBitVector::new_float(v.num_items, v.bit_size, v.range, v.start, v.data)
            .with_bit_order(BitOrder::LsbFirst)
    }
}

impl From<PackedIntVector> for PackedBitVector {
    fn from(v: PackedIntVector) -> Self {
        PackedBitVector::new(v.num_items, v.bit_size, v.data).with_bit_order(BitOrder::LsbFirst)
    }
}
