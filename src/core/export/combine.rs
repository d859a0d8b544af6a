//! Combining partition files into one gzip file
//!
//! Gzip allows members to be concatenated: decompressing `a.gz ++ b.gz` yields
//! `a ++ b`. Partition files are therefore appended byte for byte without
//! recompressing anything.

use crate::domain::{DumpError, ExportJob, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Chunk size for appending partition files
pub const COPY_CHUNK_SIZE: usize = 1024 * 1024;

/// Whether a finished job qualifies for combination
///
/// Requires every partition to have succeeded and at least one document.
pub fn should_combine(job: &ExportJob) -> bool {
    job.failed_partitions().is_empty() && job.exported() > 0
}

/// Combine a finished job's partition files into `<root>/<index>.ndjson.gz`
///
/// Returns `Ok(None)` without touching the filesystem when the job does not
/// qualify. Partition files are left in place.
///
/// # Errors
///
/// Returns an export error if a partition file is missing or unreadable, or
/// the combined file cannot be written. A partially written combined file is
/// removed.
pub fn combine(job: &ExportJob) -> Result<Option<PathBuf>> {
    if !should_combine(job) {
        return Ok(None);
    }

    let target = job.combined_path();
    if let Err(e) = concatenate(&job.partition_paths(), &target) {
        let _ = fs::remove_file(&target);
        return Err(e);
    }

    Ok(Some(target))
}

/// Concatenate `parts` in order into `target`, returning the bytes written
///
/// The first part is copied with `fs::copy`, which keeps its permissions, and
/// its modification time is carried over; the rest are appended in
/// [`COPY_CHUNK_SIZE`] chunks.
pub fn concatenate(parts: &[PathBuf], target: &Path) -> Result<u64> {
    let (first, rest) = parts
        .split_first()
        .ok_or_else(|| DumpError::Export("no partition files to combine".to_string()))?;

    let mut total = fs::copy(first, target).map_err(|e| {
        DumpError::Export(format!(
            "Failed to copy {} to {}: {}",
            first.display(),
            target.display(),
            e
        ))
    })?;

    let mut output = OpenOptions::new().append(true).open(target).map_err(|e| {
        DumpError::Export(format!("Failed to open {}: {}", target.display(), e))
    })?;

    let modified = fs::metadata(first)?.modified()?;
    output.set_modified(modified)?;

    let mut buffer = vec![0u8; COPY_CHUNK_SIZE];
    for part in rest {
        let mut input = File::open(part)
            .map_err(|e| DumpError::Export(format!("Failed to open {}: {}", part.display(), e)))?;

        loop {
            let read = input.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            output.write_all(&buffer[..read])?;
            total += read as u64;
        }
    }

    output.flush()?;
    Ok(total)
}
