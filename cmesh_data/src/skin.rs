//! Decoding of the variable length skin weight stream.
//!
//! Weights are quantized to integers from 0 to 31 and stored without any per vertex length.
//! The weights for a vertex end once their sum reaches 31 or after the third weight.
//! After the third weight, the fourth weight is inferred from the remaining sum.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use cmesh_lib::CompressedMesh;

use crate::{Channel, DecodeError};

const INFLUENCES_PER_VERTEX: usize = 4;
const WEIGHT_SUM: u32 = 31;

/// Up to 4 bone influences for a single vertex.
///
/// Unused influences have an index and weight of 0.
/// The weights sum to 1.0 up to the quantization error of 1/31.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoneWeights4 {
    pub bone_indices: [u32; 4],
    pub weights: [f32; 4],
}

/// Decodes the bone influences for each vertex from the weights and bone indices channels.
pub fn decode_skin_weights(mesh: &CompressedMesh) -> Result<Vec<BoneWeights4>, DecodeError> {
    let weights = mesh
        .weights
        .unpack_uints()
        .map_err(DecodeError::unpack(Channel::Weights))?;
    let bone_indices = mesh
        .bone_indices
        .unpack_uints()
        .map_err(DecodeError::unpack(Channel::BoneIndices))?;

    decode_weights(&weights, &bone_indices)
}

/// Assigns a bone index to each quantized weight.
/// Zero filled influences don't consume a bone index.
/**
```rust
# use cmesh_data::skin::decode_weights;
let influences = decode_weights(&[10, 21], &[3, 9]).unwrap();
assert_eq!(1, influences.len());
assert_eq!([3, 9, 0, 0], influences[0].bone_indices);
assert_eq!([10.0 / 31.0, 21.0 / 31.0, 0.0, 0.0], influences[0].weights);
```
 */
pub fn decode_weights(
    weights: &[u32],
    bone_indices: &[u32],
) -> Result<Vec<BoneWeights4>, DecodeError> {
    let mut bone_indices = BoneIndexReader::new(bone_indices);

    let mut influences = Vec::new();
    let mut current = BoneWeights4::default();
    let mut j = 0;
    let mut sum = 0u32;

    for weight in weights {
        current.weights[j] = *weight as f32 / WEIGHT_SUM as f32;
        current.bone_indices[j] = bone_indices.next()?;
        j += 1;
        sum = sum.saturating_add(*weight);

        if sum >= WEIGHT_SUM {
            // The remaining influences are already zero.
            influences.push(current);
        } else if j == INFLUENCES_PER_VERTEX - 1 {
            current.weights[j] = (WEIGHT_SUM - sum) as f32 / WEIGHT_SUM as f32;
            current.bone_indices[j] = bone_indices.next()?;
            influences.push(current);
        } else {
            continue;
        }

        current = BoneWeights4::default();
        j = 0;
        sum = 0;
    }

    if j > 0 {
        return Err(DecodeError::IncompleteSkinWeights {
            vertex: influences.len(),
        });
    }

    Ok(influences)
}

struct BoneIndexReader<'a> {
    indices: &'a [u32],
    position: usize,
}

impl<'a> BoneIndexReader<'a> {
    fn new(indices: &'a [u32]) -> Self {
        Self {
            indices,
            position: 0,
        }
    }

    fn next(&mut self) -> Result<u32, DecodeError> {
        let index = self
            .indices
            .get(self.position)
            .copied()
            .ok_or(DecodeError::MissingBoneIndices {
                expected: self.position + 1,
                actual: self.indices.len(),
            })?;
        self.position += 1;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cmesh_lib::PackedBitVector;

    #[test]
    fn single_full_weight() {
        assert_eq!(
            vec![BoneWeights4 {
                bone_indices: [7, 0, 0, 0],
                weights: [1.0, 0.0, 0.0, 0.0]
            }],
            decode_weights(&[31], &[7]).unwrap()
        );
    }

    #[test]
    fn two_weights() {
        assert_eq!(
            vec![BoneWeights4 {
                bone_indices: [3, 9, 0, 0],
                weights: [10.0 / 31.0, 21.0 / 31.0, 0.0, 0.0]
            }],
            decode_weights(&[10, 21], &[3, 9]).unwrap()
        );
    }

    #[test]
    fn inferred_fourth_weight() {
        let influences = decode_weights(&[10, 5, 6], &[1, 2, 3, 4]).unwrap();
        assert_eq!(1, influences.len());
        assert_eq!([1, 2, 3, 4], influences[0].bone_indices);
        assert_eq!(10.0 / 31.0, influences[0].weights[3]);
    }

    #[test]
    fn multiple_vertices() {
        let weights = [31, 15, 16, 1, 1, 1, 20, 11];
        let indices = [0, 1, 2, 3, 4, 5, 6, 7, 8];
        let influences = decode_weights(&weights, &indices).unwrap();

        assert_eq!(
            vec![[0, 0, 0, 0], [1, 2, 0, 0], [3, 4, 5, 6], [7, 8, 0, 0]],
            influences.iter().map(|i| i.bone_indices).collect::<Vec<_>>()
        );

        for influence in &influences {
            let sum: f32 = influence.weights.iter().sum();
            assert_relative_eq!(1.0, sum, epsilon = 1.0 / 31.0);
        }
    }

    #[test]
    fn zero_filled_influences() {
        let influences = decode_weights(&[15, 16], &[5, 6]).unwrap();
        assert_eq!(0, influences[0].bone_indices[2]);
        assert_eq!(0, influences[0].bone_indices[3]);
        assert_eq!(0.0, influences[0].weights[2]);
        assert_eq!(0.0, influences[0].weights[3]);
    }

    #[test]
    fn empty_weights() {
        assert!(decode_weights(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn missing_bone_index() {
        assert_eq!(
            Err(DecodeError::MissingBoneIndices {
                expected: 2,
                actual: 1
            }),
            decode_weights(&[10, 21], &[3])
        );
    }

    #[test]
    fn missing_inferred_bone_index() {
        assert_eq!(
            Err(DecodeError::MissingBoneIndices {
                expected: 4,
                actual: 3
            }),
            decode_weights(&[1, 1, 1], &[0, 1, 2])
        );
    }

    #[test]
    fn incomplete_weights() {
        assert_eq!(
            Err(DecodeError::IncompleteSkinWeights { vertex: 1 }),
            decode_weights(&[31, 10], &[0, 1])
        );
    }

    #[test]
    fn decode_mesh_skin_weights() {
        let mesh = CompressedMesh {
            weights: PackedBitVector::pack_uints(&[31, 10, 21]),
            bone_indices: PackedBitVector::pack_uints(&[2, 0, 1]),
            ..Default::default()
        };

        let influences = decode_skin_weights(&mesh).unwrap();
        assert_eq!(2, influences.len());
        assert_eq!([2, 0, 0, 0], influences[0].bone_indices);
        assert_eq!([0, 1, 0, 0], influences[1].bone_indices);
    }
}
