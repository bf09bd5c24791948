//! Decompress command implementation.

use super::check_output;
use crate::utils::{create_progress_bar, decompressed_path, format_size, has_compressed_suffix};
use bzcodec::Decompressor;
use log::{info, warn};
use std::fs;
use std::path::PathBuf;

pub fn cmd_decompress(
    files: &[PathBuf],
    keep: bool,
    force: bool,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let decompressor = Decompressor::unbounded().concatenated(true);
    let pb = create_progress_bar(files.len() as u64, progress && files.len() > 1);

    for input in files {
        pb.set_message(input.display().to_string());

        let output = decompressed_path(input);
        if !has_compressed_suffix(input) {
            warn!(
                "{}: unknown suffix, writing to {}",
                input.display(),
                output.display()
            );
        }
        check_output(&output, force)?;

        let data = fs::read(input)?;
        let decompressed = decompressor.decompress(&data)?;
        fs::write(&output, &decompressed)?;

        info!(
            "{}: {} -> {}",
            input.display(),
            format_size(data.len() as u64),
            format_size(decompressed.len() as u64)
        );

        if !keep {
            fs::remove_file(input)?;
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(())
}
