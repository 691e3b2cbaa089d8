// src/download/archive.rs
// =============================================================================
// This module packs a staged directory of downloaded images into a single
// zip archive.
//
// The zip crate's writer is synchronous, so handlers must call this through
// tokio's spawn_blocking rather than on the async runtime threads.
// =============================================================================

use std::fs::File;
use std::io::{self, Read, Seek, Write};
use std::path::Path;

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

// Zips every file under `src_dir` into `zip_path`
//
// Archive entry names are relative to `src_dir`, so unpacking reproduces
// the staged layout without leading path noise.
//
// Parameters:
//   src_dir: directory whose contents are archived (recursively)
//   zip_path: destination archive file, created or truncated
pub fn zip_directory(src_dir: &Path, zip_path: &Path) -> Result<()> {
    let file = File::create(zip_path)
        .with_context(|| format!("failed to create archive {}", zip_path.display()))?;

    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    add_dir_entries(&mut zip, src_dir, src_dir, options)
        .with_context(|| format!("failed to archive {}", src_dir.display()))?;

    zip.finish().context("failed to finalize archive")?;
    Ok(())
}

fn add_dir_entries<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    base: &Path,
    dir: &Path,
    options: SimpleFileOptions,
) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = path
            .strip_prefix(base)
            .unwrap_or(&path)
            .to_string_lossy()
            .into_owned();

        if path.is_dir() {
            add_dir_entries(zip, base, &path, options)?;
        } else {
            zip.start_file(name, options).map_err(io::Error::other)?;
            let mut f = File::open(&path)?;
            copy_into(&mut f, zip)?;
        }
    }
    Ok(())
}

fn copy_into<W: Write + Seek>(src: &mut File, zip: &mut ZipWriter<W>) -> io::Result<()> {
    let mut buf = [0u8; 8192];
    loop {
        let n = src.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        zip.write_all(&buf[..n])?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;
    use zip::ZipArchive;

    #[test]
    fn test_zip_contains_all_staged_files() {
        let staging = TempDir::new().unwrap();
        std::fs::write(staging.path().join("one.png"), b"first").unwrap();
        std::fs::write(staging.path().join("two.png"), b"second").unwrap();

        let out = TempDir::new().unwrap();
        let zip_path = out.path().join("bundle.zip");
        zip_directory(staging.path(), &zip_path).unwrap();

        let mut archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);

        let mut contents = String::new();
        archive
            .by_name("one.png")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "first");
    }

    #[test]
    fn test_zip_of_empty_directory_is_valid() {
        let staging = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let zip_path = out.path().join("empty.zip");
        zip_directory(staging.path(), &zip_path).unwrap();

        let archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
