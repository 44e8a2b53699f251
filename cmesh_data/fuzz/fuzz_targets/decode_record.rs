#![no_main]
use cmesh_lib::{CompressedMesh, FormatVersion};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (CompressedMesh, FormatVersion)| {
    let (mesh, version) = input;
    let _ = cmesh_data::decode(&mesh, version);
});
