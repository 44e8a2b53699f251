//! # cmesh_data
//!
//! cmesh_data decodes the bit packed channels of a [CompressedMesh](cmesh_lib::CompressedMesh)
//! into plain vertex data built on cmesh_lib.
//!
//! ## Features
//! - Dequantization of positions, colors, bind poses, and texture coordinates
//! - Reconstruction of normal and tangent Z components from the stored XY components and sign bits
//! - Decoding of the variable length skin weight stream into 4 influences per vertex
//! - Version dependent selection of texture coordinate and color layouts
//! - Errors for invalid data such as channels with mismatched lengths
//!
//! ## Getting Started
//! The easiest way to access important items like [MeshGeometry](crate::mesh_geometry::MeshGeometry) is to import the [prelude].
/*!
```no_run
use cmesh_data::prelude::*;

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let version: FormatVersion = "2019.4.3f1".parse()?;
let mesh = CompressedMesh::from_file("mesh.cmesh", version)?;

let geometry = MeshGeometry::decode(&mesh, version)?;
if let Some(normals) = &geometry.normals {
    println!("{:?}", normals[0]);
}
# Ok(())
# }
```
 */
//!
//! ## Decoding Differences
//! Quantized values are not stored exactly, so decoded values only match the original
//! values up to the precision of each channel's bit width.
//! Normals and tangents are renormalized if quantization errors push the stored components outside the unit circle.
use std::fmt;

use cmesh_lib::UnpackError;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod geometry;
pub mod layout;
pub mod mesh_geometry;
pub mod skin;
pub mod uv;

pub use cmesh_lib;
pub use mesh_geometry::decode;

/// Common imports for top level types and important functions.
pub mod prelude {
    pub use crate::mesh_geometry::{decode, MeshGeometry, VectorData};
    pub use crate::skin::BoneWeights4;
    pub use crate::DecodeError;
    pub use cmesh_lib::{CompressedMesh, FormatVersion, PackedBitVector};
}

/// A named packed channel of a [CompressedMesh](cmesh_lib::CompressedMesh).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Vertices,
    Uv,
    BindPoses,
    Normals,
    NormalSigns,
    Tangents,
    TangentSigns,
    Weights,
    BoneIndices,
    FloatColors,
    Colors,
    Triangles,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Vertices => "vertices",
            Channel::Uv => "uv",
            Channel::BindPoses => "bind poses",
            Channel::Normals => "normals",
            Channel::NormalSigns => "normal signs",
            Channel::Tangents => "tangents",
            Channel::TangentSigns => "tangent signs",
            Channel::Weights => "weights",
            Channel::BoneIndices => "bone indices",
            Channel::FloatColors => "float colors",
            Channel::Colors => "colors",
            Channel::Triangles => "triangles",
        };
        write!(f, "{}", name)
    }
}

/// Errors while decoding a [CompressedMesh](cmesh_lib::CompressedMesh).
/// Decoding stops at the first error, so no partially decoded data is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The packed data for the channel is inconsistent with its item count or bit width.
    #[error("Failed to unpack the {channel} channel.")]
    Unpack {
        channel: Channel,
        #[source]
        source: UnpackError,
    },

    /// The sign channel has fewer values than the normals or tangents it belongs to.
    #[error("Expected at least {expected} values for {channel} but found {actual}.")]
    MissingSigns {
        channel: Channel,
        expected: usize,
        actual: usize,
    },

    /// The bone indices ended before every weight was assigned an index.
    #[error("Expected at least {expected} bone indices but found {actual}.")]
    MissingBoneIndices { expected: usize, actual: usize },

    /// The weight stream ended before the weights for a vertex were complete.
    #[error("The weights for vertex {vertex} are incomplete.")]
    IncompleteSkinWeights { vertex: usize },

    /// The texture coordinate channel index is outside the supported range of 0 to 7.
    #[error("UV channel {0} exceeds the maximum of 8 channels.")]
    UnsupportedUvChannel(usize),
}

impl DecodeError {
    pub(crate) fn unpack(channel: Channel) -> impl FnOnce(UnpackError) -> Self {
        move |source| Self::Unpack { channel, source }
    }
}

/// Groups a flat list of components into fixed size vectors.
/// Any trailing components that don't form a complete vector are ignored.
pub(crate) fn to_arrays<const N: usize>(values: &[f32]) -> Vec<[f32; N]> {
    values
        .chunks_exact(N)
        .map(|c| std::array::from_fn(|i| c[i]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_arrays_ignores_remainder() {
        assert_eq!(
            vec![[1.0, 2.0], [3.0, 4.0]],
            to_arrays::<2>(&[1.0, 2.0, 3.0, 4.0, 5.0])
        );
    }

    #[test]
    fn channel_display() {
        assert_eq!("normal signs", Channel::NormalSigns.to_string());
    }

    #[test]
    fn error_display() {
        let error = DecodeError::Unpack {
            channel: Channel::Normals,
            source: UnpackError::UnsupportedBitWidth(40),
        };
        assert_eq!("Failed to unpack the normals channel.", error.to_string());
    }
}
