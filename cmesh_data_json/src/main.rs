use cmesh_data::prelude::*;
use log::{error, info};
use serde::Serialize;
use std::env;
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

fn read_mesh(input: &Path, version: FormatVersion) -> Result<CompressedMesh, Box<dyn Error>> {
    match input.extension().and_then(|e| e.to_str()) {
        // Allow decoding records that were edited or created by hand.
        Some("json") => {
            let json = std::fs::read_to_string(input)?;
            Ok(serde_json::from_str(&json)?)
        }
        _ => Ok(CompressedMesh::from_file(input, version)?),
    }
}

fn write_json<T: Serialize, P: AsRef<Path>>(data: &T, output: P) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(data)?;
    let mut output_file = std::fs::File::create(output)?;
    output_file.write_all(json.as_bytes())?;
    Ok(())
}

fn decode_and_write_json(
    input: &Path,
    output: &Path,
    version: FormatVersion,
) -> Result<(), Box<dyn Error>> {
    let parse_start_time = Instant::now();
    let mesh = read_mesh(input, version)?;
    info!("Parse: {:?}", parse_start_time.elapsed());

    let decode_start_time = Instant::now();
    let geometry = decode(&mesh, version)?;
    info!("Decode: {:?}", decode_start_time.elapsed());

    write_json(&geometry, output)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage:");
        eprintln!("\tcmesh_data_json <record> <version>");
        eprintln!("\tcmesh_data_json <record> <version> <json output>");
        return;
    }

    let input = &args[1];
    let version: FormatVersion = match args[2].parse() {
        Ok(version) => version,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };

    // Modify the input if no output is specified to allow dragging a file onto the executable.
    let output_path = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(input.to_string() + ".json"));

    if let Err(e) = decode_and_write_json(Path::new(input), &output_path, version) {
        error!("Failed to decode {:?}: {}", input, e);
    }
}
