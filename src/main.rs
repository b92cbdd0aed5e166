//! Main entry point for the sunzip CLI application.
//!
//! This binary extracts, lists or tests ZIP archives read front to back from
//! a local file, standard input, or an HTTP response body.

use anyhow::Result;
use clap::Parser;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use sunzip::io::Source;
use sunzip::zip::{EntryReader, LocalFileHeader, ZipStreamReader};
use sunzip::{Cli, ZipError};

/// Application entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.debug {
        StderrLogger::install();
    }

    if cli.is_http_url() && !cli.is_quiet() {
        eprintln!("Streaming {}", cli.file);
    }
    let source = Source::open(&cli.file)?;
    let mut archive = ZipStreamReader::new(source);

    if cli.list || cli.verbose {
        list_files(&mut archive, cli.verbose)?;
    } else if cli.test {
        test_files(&mut archive, &cli)?;
    } else {
        extract_files(&mut archive, &cli)?;
    }

    // Display network transfer statistics for HTTP sources
    let (_, source) = archive.into_remaining().into_inner();
    if !cli.is_quiet() {
        if let Some(transferred) = source.transferred_bytes() {
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
    }

    Ok(())
}

/// Run `f` on every entry, following concatenated archives until two ends
/// of archive are reported back to back.
///
/// Entries with an unsupported compression method are reported and skipped.
fn for_each_entry<R: Read>(
    archive: &mut ZipStreamReader<R>,
    mut f: impl FnMut(EntryReader<'_, R>) -> Result<()>,
) -> Result<()> {
    let mut at_end = false;
    loop {
        match archive.advance() {
            Ok(Some(header)) => {
                at_end = false;
                if header.is_encrypted() {
                    eprintln!("warning: {} is encrypted and will fail its CRC check", header.file_name());
                }
                if let Some(entry) = archive.entry() {
                    f(entry)?;
                }
            }
            Ok(None) if at_end => return Ok(()),
            Ok(None) => at_end = true,
            Err(ZipError::UnsupportedMethod(method)) => {
                eprintln!("Skipping entry: unsupported compression method {}", method);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// List files in the archive.
///
/// The verbose table needs sizes and CRCs that streamed entries only reveal
/// after their data, so every entry is read through before its row is printed.
fn list_files<R: Read>(archive: &mut ZipStreamReader<R>, verbose: bool) -> Result<()> {
    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  {:>8}  Name",
            "Length", "Size", "Cmpr", "Date", "Time", "CRC-32"
        );
        println!("{}", "-".repeat(80));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for_each_entry(archive, |mut entry| {
        if !verbose {
            println!("{}", entry.header().file_name());
            return Ok(());
        }

        io::copy(&mut entry, &mut io::sink())?;
        let header = entry.header();
        let (year, month, day) = header.mod_date();
        let (hour, minute, _second) = header.mod_time();

        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {:08x}  {}",
            header.uncompressed_size,
            header.compressed_size,
            ratio(header.compressed_size.into(), header.uncompressed_size.into()),
            year,
            month,
            day,
            hour,
            minute,
            header.crc32,
            header.file_name()
        );

        if !header.is_directory() {
            total_uncompressed += u64::from(header.uncompressed_size);
            total_compressed += u64::from(header.compressed_size);
            file_count += 1;
        }
        Ok(())
    })?;

    if verbose {
        println!("{}", "-".repeat(80));
        println!(
            "{:>10}  {:>10}  {}  {:>31}  {} files",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
    }

    Ok(())
}

/// Decompress every selected entry and check its CRC.
fn test_files<R: Read>(archive: &mut ZipStreamReader<R>, cli: &Cli) -> Result<()> {
    let mut failures = 0usize;
    let mut tested = 0usize;

    for_each_entry(archive, |mut entry| {
        let name = entry.header().file_name().into_owned();
        if !cli.selects(&name) {
            return Ok(());
        }

        tested += 1;
        match io::copy(&mut entry, &mut io::sink()) {
            Ok(_) => {
                if !cli.is_quiet() {
                    println!("    testing: {:<40} OK", name);
                }
            }
            Err(e) => match ZipError::from(e) {
                ZipError::ChecksumMismatch { expected, actual } => {
                    failures += 1;
                    println!(
                        "    testing: {:<40} bad CRC {:08x}  (should be {:08x})",
                        name, actual, expected
                    );
                }
                other => return Err(other.into()),
            },
        }
        Ok(())
    })?;

    if failures > 0 {
        anyhow::bail!("{} of {} files failed the CRC check", failures, tested);
    }
    if !cli.is_very_quiet() {
        println!("No errors detected in {} tested files", tested);
    }
    Ok(())
}

/// Extract selected entries as they stream past.
///
/// Handles various extraction options:
/// - Pipe mode (`-p`): Write to stdout instead of file
/// - Custom output directory (`-d`): Extract to specified directory
/// - Junk paths (`-j`): Ignore directory structure in archive
/// - Overwrite control (`-n`, `-o`): Handle existing files
fn extract_files<R: Read>(archive: &mut ZipStreamReader<R>, cli: &Cli) -> Result<()> {
    // With a single named member there is no ambiguity about what was piped.
    let show_filename = cli.files.len() != 1;
    let stdout = io::stdout();

    for_each_entry(archive, |mut entry| {
        let header = entry.header().clone();
        let name = header.file_name().into_owned();
        if !cli.selects(&name) {
            return Ok(());
        }

        if cli.pipe {
            if header.is_directory() {
                return Ok(());
            }
            let mut out = stdout.lock();
            if show_filename {
                writeln!(out, "--- {} ---", name)?;
            }
            io::copy(&mut entry, &mut out)?;
            return Ok(());
        }

        let Some(output_path) = destination(&header, cli) else {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (unsafe path)", name);
            }
            return Ok(());
        };

        if header.is_directory() {
            if !cli.junk_paths {
                fs::create_dir_all(&output_path)?;
            }
            return Ok(());
        }

        // Handle existing files based on overwrite options
        if output_path.exists() {
            if cli.never_overwrite {
                if !cli.is_quiet() {
                    eprintln!("Skipping: {} (file exists)", name);
                }
                return Ok(());
            }
            if !cli.overwrite {
                if !cli.is_quiet() {
                    eprintln!("Skipping: {} (use -o to overwrite)", name);
                }
                return Ok(());
            }
        }

        if !cli.is_quiet() {
            println!("  extracting: {}", name);
        }

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = fs::File::create(&output_path)?;
        if let Err(e) = io::copy(&mut entry, &mut file) {
            // Do not leave a partial or corrupt file behind.
            drop(file);
            let _ = fs::remove_file(&output_path);
            return Err(ZipError::from(e).into());
        }
        Ok(())
    })
}

/// Determine where an entry is written, based on `-d` and `-j`.
///
/// Absolute paths and `..` components are refused so an archive cannot
/// write outside the destination.
///
/// # Arguments
///
/// * `header` - Local header of the entry being extracted
/// * `cli` - Parsed command line, for the output directory and junk paths flag
///
/// # Returns
///
/// The output path, or `None` when the entry name is unsafe or empty.
fn destination(header: &LocalFileHeader, cli: &Cli) -> Option<PathBuf> {
    let name = header.file_name();
    let mut relative = PathBuf::new();
    for component in Path::new(name.as_ref()).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if cli.junk_paths && !header.is_directory() {
        relative = PathBuf::from(relative.file_name()?);
    }
    if relative.as_os_str().is_empty() {
        return None;
    }

    Some(match &cli.extract_dir {
        Some(dir) => PathBuf::from(dir).join(relative),
        None => relative,
    })
}

/// Compression ratio as percentage saved.
///
/// # Arguments
///
/// * `compressed` - Compressed size in bytes
/// * `uncompressed` - Original size in bytes
///
/// # Returns
///
/// A right-aligned percentage, `  0%` when nothing was saved.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
///
/// # Arguments
///
/// * `size` - The size in bytes to format
///
/// # Returns
///
/// A formatted string with the size and appropriate unit.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// Minimal `log` backend for `--debug`: every record goes to stderr.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl StderrLogger {
    fn install() {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    }
}

impl log::Log for StderrLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use sunzip::zip::CompressionMethod;

    fn header(name: &str) -> LocalFileHeader {
        LocalFileHeader {
            version_needed: 20,
            flags: 0,
            compression_method: CompressionMethod::Stored,
            last_mod_time: 0,
            last_mod_date: 0,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            name: name.as_bytes().to_vec(),
            extra: Vec::new(),
        }
    }

    #[test]
    fn sizes_pick_a_unit() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn ratio_is_percentage_saved() {
        assert_eq!(ratio(25, 100), "  75%");
        assert_eq!(ratio(10, 0), "  0%");
    }

    #[test]
    fn destination_honours_dir_and_junk_paths() {
        let cli = Cli::parse_from(["sunzip", "-d", "out", "a.zip"]);
        assert_eq!(destination(&header("a/b.txt"), &cli), Some(PathBuf::from("out/a/b.txt")));

        let cli = Cli::parse_from(["sunzip", "-j", "a.zip"]);
        assert_eq!(destination(&header("a/b.txt"), &cli), Some(PathBuf::from("b.txt")));
    }

    #[test]
    fn destination_refuses_escaping_names() {
        let cli = Cli::parse_from(["sunzip", "a.zip"]);
        assert_eq!(destination(&header("../evil"), &cli), None);
        assert_eq!(destination(&header("/etc/passwd"), &cli), None);
        assert_eq!(destination(&header("./"), &cli), None);
    }
}
