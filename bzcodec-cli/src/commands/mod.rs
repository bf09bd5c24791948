//! Command implementations for the bzcodec CLI.

pub mod compress;
pub mod decompress;
pub mod info;

pub use compress::cmd_compress;
pub use decompress::cmd_decompress;
pub use info::cmd_info;
pub use test::cmd_test;

use std::io;
use std::path::Path;

/// Refuse to clobber an existing file unless forced.
fn check_output(output: &Path, force: bool) -> io::Result<()> {
    if !force && output.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists (use --force)", output.display()),
        ));
    }
    Ok(())
}
