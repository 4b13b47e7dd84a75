//! Info command implementation.

use crate::utils::format_size;
use oxirar_archive::RarArchive;
use oxirar_core::Password;
use std::path::Path;

pub fn cmd_info(
    archive: &Path,
    password: Option<Password>,
) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = std::fs::metadata(archive)?;
    let has_password = password.is_some();
    let rar = match password {
        Some(pw) => RarArchive::with_password(archive, pw),
        None => RarArchive::new(archive),
    };
    let info = rar.info()?;

    println!("Archive Information");
    println!("===================");
    println!("File: {}", archive.display());
    println!("Size: {} ({} bytes)", format_size(metadata.len()), metadata.len());
    println!("Attributes: {}", info);
    if info.is_volume() {
        println!(
            "Volume: {}",
            if info.is_first_volume() { "first" } else { "continuation" }
        );
    }
    println!(
        "Password protected: {}",
        if rar.is_password_protected()? { "yes" } else { "no" }
    );

    if info.has_encrypted_headers() && !has_password {
        println!();
        println!("Contents: hidden (headers are encrypted, supply a password)");
        return Ok(());
    }

    let entries = rar.list_entries()?;
    let files: Vec<_> = entries.iter().filter(|e| e.is_file()).collect();
    let total_size: u64 = files.iter().map(|e| e.size).sum();
    let total_packed: u64 = files.iter().map(|e| e.compressed_size).sum();

    println!();
    println!("Contents:");
    println!("  Files: {}", files.len());
    println!(
        "  Directories: {}",
        entries.iter().filter(|e| e.is_dir()).count()
    );
    println!(
        "  Encrypted entries: {}",
        entries.iter().filter(|e| e.is_encrypted()).count()
    );
    println!("  Total size: {} bytes", total_size);
    println!("  Packed size: {} bytes", total_packed);
    if total_size > 0 {
        println!(
            "  Compression ratio: {:.1}%",
            (1.0 - total_packed as f64 / total_size as f64) * 100.0
        );
    }

    if let Some(comment) = info.comment.as_deref().filter(|c| !c.is_empty()) {
        println!();
        println!("Comment:");
        for line in comment.lines() {
            println!("  {}", line);
        }
    }
    Ok(())
}
