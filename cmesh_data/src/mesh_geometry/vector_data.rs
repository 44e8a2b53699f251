#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::to_arrays;

/// The data for a texture coordinate channel with 1 to 4 components per vertex.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum VectorData {
    Vector1(Vec<f32>),
    Vector2(Vec<[f32; 2]>),
    Vector3(Vec<[f32; 3]>),
    Vector4(Vec<[f32; 4]>),
}

impl VectorData {
    /// Groups a flat list of components into vectors with `dimension` components.
    /// Dimensions above 4 are treated as 4.
    pub(crate) fn from_components(dimension: usize, values: &[f32]) -> Self {
        match dimension {
            0 | 1 => VectorData::Vector1(values.to_vec()),
            2 => VectorData::Vector2(to_arrays(values)),
            3 => VectorData::Vector3(to_arrays(values)),
            _ => VectorData::Vector4(to_arrays(values)),
        }
    }

    /// The number of vectors.
    /**
    ```rust
    # use cmesh_data::mesh_geometry::VectorData;
    let data = VectorData::Vector2(vec![[0f32, 1f32], [0f32, 1f32], [0f32, 1f32]]);
    assert_eq!(3, data.len());
    ```
    */
    pub fn len(&self) -> usize {
        match self {
            VectorData::Vector1(v) => v.len(),
            VectorData::Vector2(v) => v.len(),
            VectorData::Vector3(v) => v.len(),
            VectorData::Vector4(v) => v.len(),
        }
    }

    /// Returns `true` if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of components for each vector.
    pub fn dimension(&self) -> usize {
        match self {
            VectorData::Vector1(_) => 1,
            VectorData::Vector2(_) => 2,
            VectorData::Vector3(_) => 3,
            VectorData::Vector4(_) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_components_dimensions() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0];

        assert_eq!(12, VectorData::from_components(1, &values).len());
        assert_eq!(
            VectorData::Vector2(vec![
                [0.0, 1.0],
                [2.0, 3.0],
                [4.0, 5.0],
                [6.0, 7.0],
                [8.0, 9.0],
                [10.0, 11.0]
            ]),
            VectorData::from_components(2, &values)
        );
        assert_eq!(4, VectorData::from_components(3, &values).len());
        assert_eq!(3, VectorData::from_components(4, &values).len());
        assert_eq!(4, VectorData::from_components(4, &values).dimension());
    }

    #[test]
    fn empty_data() {
        let data = VectorData::from_components(3, &[]);
        assert!(data.is_empty());
        assert_eq!(3, data.dimension());
    }
}
