//! # cmesh_lib
//!
//! cmesh_lib is a library for reading the bit packed compressed mesh records stored in a game engine's serialized assets.
//! Every vertex attribute of a [CompressedMesh] is quantized to a small number of bits and stored in its own [PackedBitVector].
//!
//! The types in this crate represent the record as it is stored.
//! Reconstructing normals, skin weights, and texture coordinates from the packed data is handled by
//! [cmesh_data](https://crates.io/crates/cmesh_data).
//!
//! ## Reading
//! The serialized layout of the record changes with the engine version,
//! so reading always requires a [FormatVersion].
/*!
```no_run
use cmesh_lib::{CompressedMesh, FormatVersion};

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let version: FormatVersion = "2019.4.3f1".parse()?;
let mesh = CompressedMesh::from_file("mesh.cmesh", version)?;
let positions = mesh.vertices.unpack_all_floats()?;
# Ok(())
# }
```
 */
//!
//! ## Bit Order
//! Records read from binary data use [BitOrder::LsbFirst] to match the serializer.
//! Vectors created in memory with [PackedBitVector::new] or the packing functions default to [BitOrder::MsbFirst].
mod bitutils;
mod compressed_mesh;
mod packed;
mod version;

pub use bitutils::{BitOrder, BitReadError};
pub use compressed_mesh::{CompressedMesh, ReadRecordError};
pub use packed::{BitVectorView, PackedBitVector, UnpackError, MAX_BIT_WIDTH, MAX_ZERO_WIDTH_ITEMS};
pub use version::{FormatVersion, ParseVersionError};
