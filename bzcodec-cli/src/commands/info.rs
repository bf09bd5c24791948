//! Info command implementation.

use crate::utils::format_size;
use bzcodec::{BlockInfo, StreamInfo, inspect};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// JSON serializable block summary.
#[derive(Debug, Serialize)]
struct BlockJson {
    index: usize,
    crc: String,
    orig_ptr: u32,
    bwt_len: usize,
    decoded_len: usize,
    bit_offset: u64,
}

impl BlockJson {
    fn from_block(index: usize, block: &BlockInfo) -> Self {
        Self {
            index,
            crc: format!("{:08x}", block.crc),
            orig_ptr: block.orig_ptr,
            bwt_len: block.bwt_len,
            decoded_len: block.decoded_len,
            bit_offset: block.bit_offset,
        }
    }
}

/// JSON output for a stream.
#[derive(Debug, Serialize)]
struct StreamJson {
    file: String,
    block_size: u8,
    compressed_size: usize,
    decompressed_size: u64,
    ratio: f64,
    combined_crc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trailing_bytes: Option<usize>,
    blocks: Vec<BlockJson>,
}

impl StreamJson {
    fn new(path: &Path, info: &StreamInfo, file_len: usize) -> Self {
        let trailing = file_len - info.compressed_len;
        Self {
            file: path.display().to_string(),
            block_size: info.block_size.level(),
            compressed_size: info.compressed_len,
            decompressed_size: info.decompressed_len(),
            ratio: info.ratio(),
            combined_crc: format!("{:08x}", info.combined_crc),
            trailing_bytes: (trailing > 0).then_some(trailing),
            blocks: info
                .blocks
                .iter()
                .enumerate()
                .map(|(i, b)| BlockJson::from_block(i, b))
                .collect(),
        }
    }
}

pub fn cmd_info(file: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(file)?;
    let info = inspect(&data)?;
    let summary = StreamJson::new(file, &info, data.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Stream Information");
    println!("==================");
    println!("File: {}", summary.file);
    println!(
        "Block size: {} ({} bytes max)",
        info.block_size,
        info.block_size.max_block_len()
    );
    println!("Compressed size: {}", format_size(summary.compressed_size as u64));
    println!("Decompressed size: {}", format_size(summary.decompressed_size));
    if summary.decompressed_size > 0 {
        println!("Ratio: {:.3}:1", summary.ratio);
    }
    println!("Combined CRC: {}", summary.combined_crc);
    if let Some(trailing) = summary.trailing_bytes {
        println!("Trailing bytes: {}", trailing);
    }

    if !summary.blocks.is_empty() {
        println!();
        println!(
            "{:>5} {:>8} {:>8} {:>10} {:>10} {:>12}",
            "Block", "CRC", "Origin", "BWT len", "Size", "Bit offset"
        );
        println!("{}", "-".repeat(58));
        for block in &summary.blocks {
            println!(
                "{:>5} {:>8} {:>8} {:>10} {:>10} {:>12}",
                block.index,
                block.crc,
                block.orig_ptr,
                block.bwt_len,
                block.decoded_len,
                block.bit_offset
            );
        }
    }

    Ok(())
}
