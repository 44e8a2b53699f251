//! Reconstruction of positions, normals, tangents, colors, bind poses, and triangle indices.
//!
//! Each function decodes a single channel and returns an error if the packed data
//! is inconsistent with its declared item count.
//! Absent channels decode to empty lists.
use cmesh_lib::{CompressedMesh, PackedBitVector, UnpackError, MAX_BIT_WIDTH};
use glam::Vec3;
use itertools::Itertools;

use crate::layout::{ChannelLayout, ColorSource};
use crate::{to_arrays, Channel, DecodeError};

const BYTE_COLOR_COMPONENTS: usize = 4;

/// Decodes the XYZ position for each vertex.
pub fn decode_vertices(mesh: &CompressedMesh) -> Result<Vec<[f32; 3]>, DecodeError> {
    unpack_vectors::<3>(&mesh.vertices, Channel::Vertices)
}

/// Decodes the row-major 4x4 bind pose matrices.
/// Versions without bind poses decode to an empty list.
pub fn decode_bind_poses(
    mesh: &CompressedMesh,
    layout: &ChannelLayout,
) -> Result<Vec<[[f32; 4]; 4]>, DecodeError> {
    match layout.bind_poses(mesh) {
        Some(bind_poses) => Ok(unpack_vectors::<16>(bind_poses, Channel::BindPoses)?
            .into_iter()
            .map(|m| {
                [
                    [m[0], m[1], m[2], m[3]],
                    [m[4], m[5], m[6], m[7]],
                    [m[8], m[9], m[10], m[11]],
                    [m[12], m[13], m[14], m[15]],
                ]
            })
            .collect()),
        None => Ok(Vec::new()),
    }
}

/// Calculates the Z component of a unit vector from its X and Y components.
/// The Z component is negative if `negative_z` is `true`.
///
/// Quantization can push the stored components slightly outside the unit circle.
/// The vector `(x, y, 0)` is normalized instead in this case.
/**
```rust
# use cmesh_data::geometry::reconstruct_unit_vector;
assert_eq!([0.0, 0.0, 1.0], reconstruct_unit_vector(0.0, 0.0, false));
assert_eq!([0.0, 0.0, -1.0], reconstruct_unit_vector(0.0, 0.0, true));
assert_eq!([1.0, 0.0, 0.0], reconstruct_unit_vector(2.0, 0.0, false));
```
*/
pub fn reconstruct_unit_vector(x: f32, y: f32, negative_z: bool) -> [f32; 3] {
    let z_sqr = 1.0 - x * x - y * y;
    let v = if z_sqr >= 0.0 {
        Vec3::new(x, y, z_sqr.sqrt())
    } else {
        Vec3::new(x, y, 0.0).normalize()
    };

    if negative_z {
        [v.x, v.y, -v.z]
    } else {
        v.to_array()
    }
}

/// Decodes the unit length normal for each vertex.
/// A normal sign of 0 indicates a negative Z component.
pub fn decode_normals(mesh: &CompressedMesh) -> Result<Vec<[f32; 3]>, DecodeError> {
    let count = mesh.normals.item_count as usize / 2;
    let xy = mesh
        .normals
        .unpack_floats(2, 0, count)
        .map_err(DecodeError::unpack(Channel::Normals))?;

    let signs = unpack_signs(&mesh.normal_signs, Channel::NormalSigns, count)?;

    Ok(xy
        .into_iter()
        .tuples::<(f32, f32)>()
        .zip(signs)
        .map(|((x, y), sign)| reconstruct_unit_vector(x, y, sign == 0))
        .collect())
}

/// Decodes the tangent for each vertex with the bitangent sign stored in the W component.
///
/// Each tangent uses two signs.
/// The first sign is 0 for a negative Z component.
/// The second sign is positive for a W component of `1.0` and `-1.0` otherwise.
pub fn decode_tangents(mesh: &CompressedMesh) -> Result<Vec<[f32; 4]>, DecodeError> {
    let count = mesh.tangents.item_count as usize / 2;
    let xy = mesh
        .tangents
        .unpack_floats(2, 0, count)
        .map_err(DecodeError::unpack(Channel::Tangents))?;

    let signs = unpack_signs(&mesh.tangent_signs, Channel::TangentSigns, count * 2)?;

    Ok(xy
        .into_iter()
        .tuples::<(f32, f32)>()
        .zip(signs.into_iter().tuples::<(i32, i32)>())
        .map(|((x, y), (z_sign, w_sign))| {
            let [x, y, z] = reconstruct_unit_vector(x, y, z_sign == 0);
            let w = if w_sign > 0 { 1.0 } else { -1.0 };
            [x, y, z, w]
        })
        .collect())
}

/// Decodes RGBA vertex colors in the range 0.0 to 1.0 for byte colors.
/// Meshes without colors for the version decode to an empty list.
///
/// Byte colors store all 4 channels in a single item.
/// Each channel uses a quarter of the bit width and is truncated to 8 bits.
pub fn decode_colors(
    mesh: &CompressedMesh,
    layout: &ChannelLayout,
) -> Result<Vec<[f32; 4]>, DecodeError> {
    match layout.color_source(mesh) {
        ColorSource::Float(colors) => unpack_vectors::<4>(colors, Channel::FloatColors),
        ColorSource::Byte(colors) => {
            // Check the packed width before it is split into components.
            if colors.bit_width > MAX_BIT_WIDTH {
                return Err(DecodeError::Unpack {
                    channel: Channel::Colors,
                    source: UnpackError::UnsupportedBitWidth(colors.bit_width),
                });
            }

            let view = colors.view();
            let components = view
                .reinterpret(
                    view.item_count() * BYTE_COLOR_COMPONENTS,
                    view.bit_width() / BYTE_COLOR_COMPONENTS as u8,
                )
                .unpack_uints()
                .map_err(DecodeError::unpack(Channel::Colors))?
                .into_iter()
                .map(|c| c as u8 as f32 / 255.0)
                .collect_vec();

            Ok(to_arrays(&components))
        }
        ColorSource::None => Ok(Vec::new()),
    }
}

/// Decodes the vertex indices for the triangle list.
pub fn decode_triangles(mesh: &CompressedMesh) -> Result<Vec<u32>, DecodeError> {
    mesh.triangles
        .unpack_uints()
        .map_err(DecodeError::unpack(Channel::Triangles))
}

fn unpack_vectors<const N: usize>(
    vector: &PackedBitVector,
    channel: Channel,
) -> Result<Vec<[f32; N]>, DecodeError> {
    let count = vector.item_count as usize / N;
    let values = vector
        .unpack_floats(N, 0, count)
        .map_err(DecodeError::unpack(channel))?;
    Ok(to_arrays(&values))
}

fn unpack_signs(
    signs: &PackedBitVector,
    channel: Channel,
    expected: usize,
) -> Result<Vec<i32>, DecodeError> {
    let signs = signs.unpack_ints().map_err(DecodeError::unpack(channel))?;
    if signs.len() < expected {
        return Err(DecodeError::MissingSigns {
            channel,
            expected,
            actual: signs.len(),
        });
    }
    Ok(signs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cmesh_lib::{BitOrder, FormatVersion};
    use hexlit::hex;

    fn length(v: &[f32]) -> f32 {
        v.iter().map(|c| c * c).sum::<f32>().sqrt()
    }

    #[test]
    fn unit_vector_zero_z_negative_sign() {
        let [x, y, z] = reconstruct_unit_vector(0.6, 0.8, true);
        assert_relative_eq!(0.6, x, epsilon = 1e-6);
        assert_relative_eq!(0.8, y, epsilon = 1e-6);
        assert_relative_eq!(0.0, z, epsilon = 1e-3);
        assert!(z.is_sign_negative());
        assert_relative_eq!(1.0, length(&[x, y, z]), epsilon = 1e-6);
    }

    #[test]
    fn unit_vector_positive_z() {
        let [x, y, z] = reconstruct_unit_vector(0.0, 0.6, false);
        assert_eq!(0.0, x);
        assert_eq!(0.6, y);
        assert_relative_eq!(0.8, z, epsilon = 1e-6);
    }

    #[test]
    fn unit_vector_outside_unit_circle() {
        let [x, y, z] = reconstruct_unit_vector(0.8, 0.8, false);
        assert_relative_eq!(std::f32::consts::FRAC_1_SQRT_2, x, epsilon = 1e-6);
        assert_relative_eq!(std::f32::consts::FRAC_1_SQRT_2, y, epsilon = 1e-6);
        assert_eq!(0.0, z);
    }

    #[test]
    fn decode_vertices_three_components() {
        let mesh = CompressedMesh {
            vertices: PackedBitVector::pack_floats(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 16),
            ..Default::default()
        };
        let vertices = decode_vertices(&mesh).unwrap();
        assert_eq!(2, vertices.len());
        for (expected, actual) in [0.0f32, 1.0, 2.0, 3.0, 4.0, 5.0]
            .iter()
            .zip(vertices.iter().flatten())
        {
            assert_relative_eq!(*expected, *actual, epsilon = 1e-3);
        }
    }

    #[test]
    fn decode_vertices_not_enough_bits() {
        let mesh = CompressedMesh {
            vertices: PackedBitVector::new_float(3, 8, 1.0, 0.0, vec![0, 0]),
            ..Default::default()
        };
        assert_eq!(
            Err(DecodeError::Unpack {
                channel: Channel::Vertices,
                source: UnpackError::NotEnoughBits {
                    expected: 24,
                    actual: 16
                }
            }),
            decode_vertices(&mesh)
        );
    }

    #[test]
    fn decode_normals_unit_length() {
        // Quantization error pushes some values slightly outside the unit circle.
        let xy = [0.6, 0.8, -0.6, 0.8, 0.0, 0.0, 0.5, -0.5, 1.0, 0.0];
        let mesh = CompressedMesh {
            normals: PackedBitVector::pack_floats_in_range(&xy, 8, -1.0, 2.0),
            normal_signs: PackedBitVector::pack_uints(&[0, 1, 0, 1, 1]),
            ..Default::default()
        };

        let normals = decode_normals(&mesh).unwrap();
        assert_eq!(5, normals.len());
        for n in &normals {
            assert!(n[0].abs() <= 1.0 && n[1].abs() <= 1.0);
            assert_relative_eq!(1.0, length(n), epsilon = 1e-5);
        }

        assert!(normals[2][2] < 0.0);
        assert!(normals[3][2] > 0.0);
    }

    #[test]
    fn decode_normals_missing_signs() {
        let mesh = CompressedMesh {
            normals: PackedBitVector::pack_floats(&[0.0, 0.0, 0.5, 0.5], 8),
            normal_signs: PackedBitVector::pack_uints(&[1]),
            ..Default::default()
        };
        assert_eq!(
            Err(DecodeError::MissingSigns {
                channel: Channel::NormalSigns,
                expected: 2,
                actual: 1
            }),
            decode_normals(&mesh)
        );
    }

    #[test]
    fn decode_tangents_handedness() {
        let mesh = CompressedMesh {
            tangents: PackedBitVector::pack_floats_in_range(&[0.0, 0.0, 1.0, 0.0], 8, -1.0, 2.0),
            tangent_signs: PackedBitVector::pack_uints(&[0, 1, 1, 0]),
            ..Default::default()
        };

        let tangents = decode_tangents(&mesh).unwrap();
        assert_eq!(2, tangents.len());

        assert_relative_eq!(-1.0, tangents[0][2], epsilon = 1e-2);
        assert_eq!(1.0, tangents[0][3]);

        assert_eq!(-1.0, tangents[1][3]);
        for t in &tangents {
            assert_relative_eq!(1.0, length(&t[..3]), epsilon = 1e-5);
        }
    }

    #[test]
    fn decode_tangents_missing_signs() {
        let mesh = CompressedMesh {
            tangents: PackedBitVector::pack_floats(&[0.0, 0.0, 0.5, 0.5], 8),
            tangent_signs: PackedBitVector::pack_uints(&[1, 1, 1]),
            ..Default::default()
        };
        assert_eq!(
            Err(DecodeError::MissingSigns {
                channel: Channel::TangentSigns,
                expected: 4,
                actual: 3
            }),
            decode_tangents(&mesh)
        );
    }

    #[test]
    fn decode_byte_colors() {
        let colors = PackedBitVector::new(1, 32, hex!(ff8000ff).to_vec());
        let mesh = CompressedMesh {
            colors: Some(colors.clone()),
            ..Default::default()
        };
        let layout = ChannelLayout::new(FormatVersion::new(4, 7, 2));

        let decoded = decode_colors(&mesh, &layout).unwrap();
        assert_eq!(1, decoded.len());
        assert_eq!(1.0, decoded[0][0]);
        assert_relative_eq!(0.502, decoded[0][1], epsilon = 1e-3);
        assert_eq!(0.0, decoded[0][2]);
        assert_eq!(1.0, decoded[0][3]);

        // The source is left unchanged.
        assert_eq!(Some(colors), mesh.colors);
    }

    #[test]
    fn decode_byte_colors_lsb_first() {
        let mesh = CompressedMesh {
            colors: Some(
                PackedBitVector::new(2, 32, hex!(ff8000ff 00000000).to_vec())
                    .with_bit_order(BitOrder::LsbFirst),
            ),
            ..Default::default()
        };
        let layout = ChannelLayout::new(FormatVersion::new(4, 7, 2));

        let decoded = decode_colors(&mesh, &layout).unwrap();
        assert_eq!(2, decoded.len());
        assert_eq!(1.0, decoded[0][0]);
        assert_eq!(0.0, decoded[0][2]);
        assert_eq!([0.0; 4], decoded[1]);
    }

    #[test]
    fn decode_byte_colors_unsupported_width() {
        let mesh = CompressedMesh {
            colors: Some(PackedBitVector::new(1, 33, vec![0xff; 5])),
            ..Default::default()
        };
        let layout = ChannelLayout::new(FormatVersion::new(4, 7, 2));

        assert_eq!(
            Err(DecodeError::Unpack {
                channel: Channel::Colors,
                source: UnpackError::UnsupportedBitWidth(33)
            }),
            decode_colors(&mesh, &layout)
        );
    }

    #[test]
    fn decode_float_colors() {
        let mesh = CompressedMesh {
            float_colors: Some(PackedBitVector::pack_floats(&[0.0, 0.5, 1.0, 1.0], 8)),
            ..Default::default()
        };
        let layout = ChannelLayout::new(FormatVersion::new(2019, 4, 3));

        let decoded = decode_colors(&mesh, &layout).unwrap();
        assert_eq!(1, decoded.len());
        assert_relative_eq!(0.5, decoded[0][1], epsilon = 1e-2);
        assert_eq!(1.0, decoded[0][3]);
    }

    #[test]
    fn decode_colors_absent() {
        let layout = ChannelLayout::new(FormatVersion::new(2019, 4, 3));
        assert!(decode_colors(&CompressedMesh::default(), &layout)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn decode_bind_poses_row_major() {
        let values: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let mesh = CompressedMesh {
            bind_poses: Some(PackedBitVector::pack_floats(&values, 16)),
            ..Default::default()
        };

        let layout = ChannelLayout::new(FormatVersion::new(4, 7, 2));
        let bind_poses = decode_bind_poses(&mesh, &layout).unwrap();
        assert_eq!(1, bind_poses.len());
        assert_relative_eq!(4.0, bind_poses[0][1][0], epsilon = 1e-3);
        assert_relative_eq!(11.0, bind_poses[0][2][3], epsilon = 1e-3);

        let layout = ChannelLayout::new(FormatVersion::new(2019, 4, 3));
        assert!(decode_bind_poses(&mesh, &layout).unwrap().is_empty());
    }

    #[test]
    fn decode_triangle_indices() {
        let mesh = CompressedMesh {
            triangles: PackedBitVector::pack_uints(&[0, 1, 2, 2, 1, 3]),
            ..Default::default()
        };
        assert_eq!(vec![0, 1, 2, 2, 1, 3], decode_triangles(&mesh).unwrap());
    }
}
