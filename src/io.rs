//! Bounded input reading for assembly dumps.
//!
//! Inputs are read through a [`BoundedReader`] so an oversized file cannot
//! exhaust memory, then checked to be text: binaries must go through a
//! disassembler first.

use crate::config::IOConfig;
use crate::error::{AsmIrError, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, warn};

/// A bounded reader that limits the amount of data read.
pub struct BoundedReader<R> {
    inner: R,
    bytes_read: u64,
    limit: u64,
}

impl<R: Read> BoundedReader<R> {
    pub fn new(reader: R, limit: u64) -> Self {
        Self {
            inner: reader,
            bytes_read: 0,
            limit,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl<R: Read> Read for BoundedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.bytes_read >= self.limit {
            return Ok(0); // EOF
        }

        let remaining = self.limit - self.bytes_read;
        let max_to_read = std::cmp::min(buf.len() as u64, remaining) as usize;
        let n = self.inner.read(&mut buf[..max_to_read])?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

/// A loaded, validated assembly listing.
#[derive(Debug, Clone)]
pub struct SourceText {
    pub text: String,
    /// Lowercase hex SHA-256 of the raw bytes
    pub sha256: String,
    pub size: u64,
}

/// Check that `data` looks like a text listing and decode it.
pub fn decode_text(data: Vec<u8>, sniff_size: usize) -> Result<String> {
    let sniff = &data[..data.len().min(sniff_size)];
    if sniff.contains(&0u8) {
        return Err(AsmIrError::InvalidInput(
            "input looks binary (NUL bytes); disassemble it to text first".to_string(),
        ));
    }
    String::from_utf8(data).map_err(|e| {
        AsmIrError::InvalidInput(format!(
            "input is not valid UTF-8 (first bad byte at offset {})",
            e.utf8_error().valid_up_to()
        ))
    })
}

/// Read an assembly listing from `path` within the configured limits.
pub fn read_source<P: AsRef<Path>>(path: P, config: &IOConfig) -> Result<SourceText> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    if size > config.max_file_size {
        warn!(path = %path.display(), size, limit = config.max_file_size, "input too large");
        return Err(AsmIrError::ResourceExhausted {
            resource: "input bytes".to_string(),
            used: size,
            limit: config.max_file_size,
        });
    }

    // One byte past the limit detects files that grew after the metadata check.
    let mut reader = BoundedReader::new(file, config.max_file_size.saturating_add(1));
    let mut data = Vec::with_capacity(size as usize);
    reader.read_to_end(&mut data)?;
    if reader.bytes_read() > config.max_file_size {
        return Err(AsmIrError::ResourceExhausted {
            resource: "input bytes".to_string(),
            used: reader.bytes_read(),
            limit: config.max_file_size,
        });
    }

    let sha256 = hex::encode(Sha256::digest(&data));
    let size = data.len() as u64;
    let text = decode_text(data, config.binary_sniff_size)?;
    debug!(path = %path.display(), size, %sha256, "input loaded");
    Ok(SourceText { text, sha256, size })
}
