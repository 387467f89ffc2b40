pub mod keys;

use image::{ImageFormat, RgbImage};
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use keys::frame_file_name;

/// Encodes a raster and writes it to a path.
pub trait FrameWriter {
    fn write(&self, path: &Path, image: &RgbImage) -> Result<(), StorageError>;
}

/// Lossless PNG output through the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct PngWriter;

impl FrameWriter for PngWriter {
    fn write(&self, path: &Path, image: &RgbImage) -> Result<(), StorageError> {
        let write_err = |reason: String| StorageError::Write {
            path: path.to_path_buf(),
            reason,
        };
        // Encode fully before touching the file system.
        let mut encoded = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .map_err(|e| write_err(e.to_string()))?;
        std::fs::write(path, &encoded).map_err(|e| write_err(e.to_string()))
    }
}

/// Numbered frame files in a single output directory.
///
/// Names run `01.png`, `02.png`, ... and a name that already exists on disk
/// is skipped, so files from an earlier run are never overwritten. The
/// counter only lives as long as the process.
pub struct FrameStore<W = PngWriter> {
    dir: PathBuf,
    next_index: u32,
    writer: W,
}

impl FrameStore<PngWriter> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_writer(dir, PngWriter)
    }
}

impl<W: FrameWriter> FrameStore<W> {
    pub fn with_writer(dir: impl Into<PathBuf>, writer: W) -> Self {
        Self {
            dir: dir.into(),
            next_index: 1,
            writer,
        }
    }

    /// The number the next save will try first.
    #[cfg(test)]
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Persist `image` under the first free number and return its path.
    ///
    /// Walks past existing files one number at a time, which is linear in
    /// the length of a pre-existing run of numbered files. A failed write
    /// removes whatever the writer left at the path and keeps the counter on
    /// the failed number, so successful saves never leave gaps.
    pub fn save(&mut self, image: &RgbImage) -> Result<PathBuf, StorageError> {
        let path = loop {
            let candidate = self.dir.join(frame_file_name(self.next_index));
            let taken = candidate.try_exists().map_err(|e| StorageError::Probe {
                path: candidate.clone(),
                source: e,
            })?;
            if !taken {
                break candidate;
            }
            debug!(path = %candidate.display(), "frame file exists, trying next number");
            self.next_index += 1;
        };

        if let Err(e) = self.writer.write(&path, image) {
            discard_partial(&path);
            return Err(e);
        }
        self.next_index += 1;
        Ok(path)
    }
}

/// Remove a file left behind by a failed write. The path was free before the
/// write, so anything there now is ours.
fn discard_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed partially written frame"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "failed to remove partially written frame"
        ),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to check whether {} exists: {source}", path.display())]
    Probe {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write frame to {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}
