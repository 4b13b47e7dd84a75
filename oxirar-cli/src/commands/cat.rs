//! Cat command implementation.

use oxirar_archive::RarArchive;
use oxirar_core::Password;
use std::io::{self, Write};
use std::path::Path;

pub fn cmd_cat(
    archive: &Path,
    entry: &str,
    password: Option<Password>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rar = match password {
        Some(pw) => RarArchive::with_password(archive, pw),
        None => RarArchive::new(archive),
    };

    let mut out = io::stdout().lock();
    rar.extract_buffered(entry, |chunk, _| out.write_all(chunk))?;
    out.flush()?;
    Ok(())
}
