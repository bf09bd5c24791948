//! Utility functions for the CLI.

use bzcodec::{BzError, ErrorKind};
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;
use std::path::{Path, PathBuf};

/// Suffixes recognised on compressed files, with the suffix their output gets.
const SUFFIXES: &[(&str, &str)] = &[(".bz2", ""), (".bz", ""), (".tbz2", ".tar"), (".tbz", ".tar")];

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    match ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        Ok(style) => pb.set_style(style.progress_chars("█▓▒░ ")),
        Err(_) => pb.set_style(ProgressStyle::default_bar()),
    }
    pb
}

/// Output path for compressing `input`.
pub fn compressed_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".bz2");
    PathBuf::from(name)
}

/// Output path for decompressing `input`.
///
/// Known suffixes are replaced; anything else gets `.out` appended.
pub fn decompressed_path(input: &Path) -> PathBuf {
    let name = input.to_string_lossy();
    for (suffix, replacement) in SUFFIXES {
        if let Some(stem) = name.strip_suffix(suffix) {
            if !stem.is_empty() && !stem.ends_with(std::path::MAIN_SEPARATOR) {
                return PathBuf::from(format!("{}{}", stem, replacement));
            }
        }
    }
    let mut name = input.as_os_str().to_os_string();
    name.push(".out");
    PathBuf::from(name)
}

/// Whether `path` already carries a compressed-file suffix.
pub fn has_compressed_suffix(path: &Path) -> bool {
    let name = path.to_string_lossy();
    SUFFIXES.iter().any(|(suffix, _)| name.ends_with(suffix))
}

/// Process exit code for an error: 1 parameter or I/O, 2 format, 3 integrity.
pub fn exit_code(err: &(dyn Error + 'static)) -> i32 {
    match err.downcast_ref::<BzError>().map(BzError::kind) {
        Some(ErrorKind::Format) => 2,
        Some(ErrorKind::Integrity) => 3,
        Some(ErrorKind::Parameter) | None => 1,
    }
}

/// Format a byte count for humans.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bzcodec::ChecksumScope;

    #[test]
    fn test_output_paths() {
        assert_eq!(compressed_path(Path::new("a.txt")), PathBuf::from("a.txt.bz2"));
        assert_eq!(decompressed_path(Path::new("a.txt.bz2")), PathBuf::from("a.txt"));
        assert_eq!(decompressed_path(Path::new("a.bz")), PathBuf::from("a"));
        assert_eq!(decompressed_path(Path::new("src.tbz2")), PathBuf::from("src.tar"));
        assert_eq!(decompressed_path(Path::new("blob")), PathBuf::from("blob.out"));
        assert_eq!(decompressed_path(Path::new(".bz2")), PathBuf::from(".bz2.out"));
    }

    #[test]
    fn test_suffix_detection() {
        assert!(has_compressed_suffix(Path::new("x.bz2")));
        assert!(has_compressed_suffix(Path::new("x.tbz")));
        assert!(!has_compressed_suffix(Path::new("x.gz")));
    }

    #[test]
    fn test_exit_codes() {
        let format: Box<dyn Error> = Box::new(BzError::format("bad"));
        assert_eq!(exit_code(format.as_ref()), 2);

        let integrity: Box<dyn Error> =
            Box::new(BzError::crc_mismatch(ChecksumScope::Stream, 1, 2));
        assert_eq!(exit_code(integrity.as_ref()), 3);

        let io: Box<dyn Error> = Box::new(std::io::Error::other("disk"));
        assert_eq!(exit_code(io.as_ref()), 1);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
    }
}
