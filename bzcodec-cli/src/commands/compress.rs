//! Compress command implementation.

use super::check_output;
use crate::utils::{compressed_path, create_progress_bar, format_size, has_compressed_suffix};
use bzcodec::{BlockSize, Compressor};
use log::{info, warn};
use std::fs;
use std::path::PathBuf;

pub fn cmd_compress(
    files: &[PathBuf],
    level: u8,
    keep: bool,
    force: bool,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let compressor = Compressor::new(BlockSize::new(level)?);
    let pb = create_progress_bar(files.len() as u64, progress && files.len() > 1);

    for input in files {
        pb.set_message(input.display().to_string());

        if has_compressed_suffix(input) && !force {
            warn!("{} already has a bzip2 suffix, skipping", input.display());
            pb.inc(1);
            continue;
        }

        let output = compressed_path(input);
        check_output(&output, force)?;

        let data = fs::read(input)?;
        let compressed = compressor.compress(&data)?;
        fs::write(&output, &compressed)?;

        info!(
            "{}: {} -> {} ({:.3}:1)",
            input.display(),
            format_size(data.len() as u64),
            format_size(compressed.len() as u64),
            data.len() as f64 / compressed.len() as f64
        );

        if !keep {
            fs::remove_file(input)?;
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(())
}
