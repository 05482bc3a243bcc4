//! Scratch file for the uploaded document
//!
//! PDFium opens documents by path, so the request body is written to a
//! uniquely named file first. The file is removed when the [`ScratchFile`]
//! is dropped, on success and on every failure path.

use crate::error::{Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Uploaded bytes persisted under a scratch directory
#[derive(Debug)]
pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    /// Create a scratch file in `dir`, write `data` and sync it to disk.
    pub fn write(dir: &Path, data: &[u8]) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".pdf")
            .tempfile_in(dir)
            .map_err(Error::ScratchCreate)?;

        file.write_all(data).map_err(Error::ScratchWrite)?;
        file.as_file().sync_all().map_err(Error::ScratchWrite)?;

        tracing::debug!(
            path = %file.path().display(),
            bytes = data.len(),
            "Wrote scratch file"
        );

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
