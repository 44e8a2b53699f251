use clap::Parser;
use cmesh_data::prelude::*;
use log::{error, info, warn};
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Test reading and decoding for all compressed mesh records recursively in a folder.
#[derive(Parser)]
#[command(author, about)]
struct Cli {
    /// The root folder of the record dump
    root_folder: String,

    /// The engine version that wrote the records like 2019.4.3f1
    #[arg(short, long)]
    version: FormatVersion,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let folder = Path::new(&cli.root_folder);
    let start = std::time::Instant::now();

    let total = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    let walker = match globwalk::GlobWalkerBuilder::from_patterns(folder, &["*.cmesh"]).build() {
        Ok(walker) => walker,
        Err(e) => {
            error!("Failed to search {:?}: {}", folder, e);
            return;
        }
    };

    walker
        .filter_map(|p| p.ok())
        .par_bridge()
        .for_each(|path| {
            total.fetch_add(1, Ordering::Relaxed);
            if !check_decode(path.path(), cli.version) {
                failed.fetch_add(1, Ordering::Relaxed);
            }
        });

    info!(
        "Decoded {} of {} records",
        total.load(Ordering::Relaxed) - failed.load(Ordering::Relaxed),
        total.load(Ordering::Relaxed)
    );
    println!("Finished in {:?}", start.elapsed());
}

fn check_decode(path: &Path, version: FormatVersion) -> bool {
    let mesh = match CompressedMesh::from_file(path, version) {
        Ok(mesh) => mesh,
        Err(e) => {
            warn!("Error reading {path:?}: {e}");
            return false;
        }
    };

    match decode(&mesh, version) {
        Ok(geometry) => {
            if let Some(indices) = &geometry.indices {
                // Indices past the end of the vertices indicate misaligned channels.
                let vertex_count = geometry.vertex_count();
                if indices.iter().any(|i| *i as usize >= vertex_count) {
                    warn!("Vertex index out of range for {path:?}");
                }
            }
            true
        }
        Err(e) => {
            warn!("Error decoding {path:?}: {e}");
            false
        }
    }
}
