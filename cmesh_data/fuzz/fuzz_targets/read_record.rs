#![no_main]
use cmesh_lib::{CompressedMesh, FormatVersion};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

// Cover the layouts with and without byte colors and UV info.
const VERSIONS: [FormatVersion; 3] = [
    FormatVersion::new(3, 4, 0),
    FormatVersion::new(4, 7, 2),
    FormatVersion::new(2019, 4, 3),
];

fuzz_target!(|data: &[u8]| {
    for version in VERSIONS {
        if let Ok(mesh) = CompressedMesh::read(&mut Cursor::new(data), version) {
            let _ = cmesh_data::decode(&mesh, version);
        }
    }
});
