//! Utility functions for the CLI.

use dialoguer::Password as PasswordPrompt;
use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use oxirar_core::{Entry, Password};
use std::time::{SystemTime, UNIX_EPOCH};

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    pb.set_style(style);
    pb
}

/// Check if a filename matches the filter patterns.
/// - If include patterns are specified, the name must match at least one
/// - If exclude patterns are specified, the name must not match any
pub fn matches_filters(name: &str, include: &[String], exclude: &[String]) -> bool {
    let matches = |pattern: &String| Pattern::new(pattern).is_ok_and(|p| p.matches(name));

    if exclude.iter().any(matches) {
        return false;
    }
    include.is_empty() || include.iter().any(matches)
}

/// Filter entries based on include/exclude patterns.
pub fn filter_entries(entries: &[Entry], include: &[String], exclude: &[String]) -> Vec<Entry> {
    entries
        .iter()
        .filter(|e| matches_filters(&e.name, include, exclude))
        .cloned()
        .collect()
}

/// Resolve the password from the command line, the environment or a prompt.
pub fn resolve_password(
    given: Option<String>,
    ask: bool,
) -> Result<Option<Password>, Box<dyn std::error::Error>> {
    if ask {
        let pw = PasswordPrompt::new()
            .with_prompt("Archive password")
            .allow_empty_password(true)
            .interact()?;
        return Ok(Some(Password::new(pw)));
    }
    Ok(given.map(Password::new))
}

/// Format a byte count for humans.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Seconds since the Unix epoch, if representable.
pub fn unix_seconds(time: SystemTime) -> Option<i64> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_secs()).ok())
}

/// Format a timestamp as `YYYY-MM-DD HH:MM` (UTC).
pub fn format_time(time: Option<SystemTime>) -> String {
    let Some(secs) = time.and_then(unix_seconds) else {
        return "-".repeat(16);
    };
    let days = secs.div_euclid(86_400);
    let rem = secs.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}",
        year,
        month,
        day,
        rem / 3600,
        (rem % 3600) / 60
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian date.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Print entries in a formatted table.
pub fn print_entries(entries: &[Entry], verbose: bool) {
    if !verbose {
        for entry in entries {
            println!("{}", entry.name);
        }
        return;
    }

    println!(
        "{:>10} {:>10} {:>6} {:>8} {:>16} {:>8}  Name",
        "Size", "Packed", "Ratio", "Method", "Modified", "CRC32"
    );
    println!("{}", "-".repeat(78));

    let mut total_size = 0u64;
    let mut total_packed = 0u64;
    let mut files = 0usize;

    for entry in entries {
        let ratio = if entry.size > 0 {
            format!("{:.1}%", entry.space_savings())
        } else {
            "-".to_string()
        };
        let prefix = match (entry.is_dir(), entry.is_encrypted()) {
            (true, _) => "d ",
            (false, true) => "* ",
            (false, false) => "  ",
        };

        println!(
            "{:>10} {:>10} {:>6} {:>8} {:>16} {:08X}  {}{}",
            entry.size,
            entry.compressed_size,
            ratio,
            entry.method.name(),
            format_time(entry.modified),
            entry.crc32,
            prefix,
            entry.name
        );

        if entry.is_file() {
            files += 1;
            total_size += entry.size;
            total_packed += entry.compressed_size;
        }
    }

    println!("{}", "-".repeat(78));
    let total_ratio = if total_size > 0 {
        (1.0 - total_packed as f64 / total_size as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "{:>10} {:>10} {:>5.1}%  {} files",
        total_size, total_packed, total_ratio, files
    );
}
