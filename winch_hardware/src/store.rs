//! File-backed position store: one fixed-size record in a single file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use winch_traits::PositionStore;

use crate::error::HwError;

/// Write via a temp file and rename so a power cut mid-write never leaves a
/// half-written record behind; the old record survives until the rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}

/// Position store holding one record of `record_len` bytes at `path`.
///
/// A missing file reads as empty bytes — that is uninitialized storage, not
/// an I/O failure, and the core treats it as "no prior state".
#[derive(Debug)]
pub struct FilePositionStore {
    path: PathBuf,
    record_len: usize,
}

impl FilePositionStore {
    pub fn new(path: impl Into<PathBuf>, record_len: usize) -> Self {
        Self {
            path: path.into(),
            record_len,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PositionStore for FilePositionStore {
    fn read(&mut self) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(Box::new(HwError::Io(e))),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if bytes.len() != self.record_len {
            return Err(Box::new(HwError::RecordSize {
                expected: self.record_len,
                got: bytes.len(),
            }));
        }
        write_atomic(&self.path, bytes).map_err(HwError::Io)?;
        tracing::debug!(path = %self.path.display(), len = bytes.len(), "record written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FilePositionStore::new(dir.path().join("position.bin"), 14);
        assert_eq!(store.read().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FilePositionStore::new(dir.path().join("position.bin"), 4);
        store.write(&[1, 2, 3, 4]).unwrap();
        assert_eq!(store.read().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn rejects_wrong_record_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FilePositionStore::new(dir.path().join("position.bin"), 4);
        assert!(store.write(&[1, 2]).is_err());
        // Nothing must have been written.
        assert_eq!(store.read().unwrap(), Vec::<u8>::new());
    }
}
