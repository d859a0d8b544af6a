//! Streaming gzip writer for partition files
//!
//! Each partition file is a single gzip member holding newline-delimited JSON.
//! Members can be concatenated byte for byte, which is what
//! [`combine`](super::combine) relies on.

use crate::domain::{DumpError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Incremental NDJSON writer compressing into one gzip member
///
/// Dropping the writer without calling [`finish`](Self::finish) still writes
/// the gzip trailer on a best-effort basis, so a partition that failed halfway
/// leaves a readable, truncated file behind.
pub struct PartitionWriter {
    path: PathBuf,
    encoder: Option<GzEncoder<BufWriter<File>>>,
    documents: u64,
    line: Vec<u8>,
}

impl PartitionWriter {
    /// Create (or truncate) the file at `path`
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|e| {
            DumpError::Export(format!("Failed to create {}: {}", path.display(), e))
        })?;

        Ok(Self {
            path,
            encoder: Some(GzEncoder::new(
                BufWriter::with_capacity(WRITE_BUFFER_SIZE, file),
                Compression::default(),
            )),
            documents: 0,
            line: Vec::with_capacity(4096),
        })
    }

    /// Append one document as a single JSON line
    pub fn write_document(&mut self, document: &Value) -> Result<()> {
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| DumpError::Export("writer already finished".to_string()))?;

        self.line.clear();
        serde_json::to_writer(&mut self.line, document)?;
        self.line.push(b'\n');
        encoder.write_all(&self.line)?;

        self.documents += 1;
        Ok(())
    }

    /// Documents written so far
    pub fn documents(&self) -> u64 {
        self.documents
    }

    /// Write the gzip trailer and flush the file
    ///
    /// Returns the number of documents written.
    pub fn finish(mut self) -> Result<u64> {
        if let Some(encoder) = self.encoder.take() {
            let mut buffered = encoder.finish()?;
            buffered.flush()?;
        }
        Ok(self.documents)
    }
}

impl Drop for PartitionWriter {
    fn drop(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            match encoder.finish() {
                Ok(mut buffered) => {
                    if let Err(e) = buffered.flush() {
                        tracing::warn!(path = %self.path.display(), error = %e, "Failed to flush partition file");
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "Failed to finalize partition file");
                }
            }
        }
    }
}
