//! `std::fs` backed file handle.
//!
//! A single `std::fs::File` sits behind a mutex; each positional call
//! seeks and transfers while holding it, so one handle is safe to share
//! between the window pool and its store.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::error::{IoError, IoResult};
use super::handle::FileHandle;
use super::mode::OpenMode;

/// A store file opened through `std::fs`.
pub struct StandardFile {
    file: Mutex<File>,
    path: PathBuf,
    mode: OpenMode,
}

impl StandardFile {
    /// Opens `path` in the given mode.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> IoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = mode
            .to_std()
            .open(&path)
            .map_err(|e| IoError::on_open(e, &path))?;

        Ok(Self {
            file: Mutex::new(file),
            path,
            mode,
        })
    }

    /// Returns the mode the file was opened with.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    fn writable(&self, operation: &'static str) -> IoResult<()> {
        if self.mode.is_writable() {
            Ok(())
        } else {
            Err(IoError::ReadOnly {
                operation,
                path: self.path.clone(),
            })
        }
    }
}

impl FileHandle for StandardFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn size(&self) -> IoResult<u64> {
        Ok(self.file.lock().metadata()?.len())
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> IoResult<usize> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        Ok(file.read(buf)?)
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> IoResult<usize> {
        self.writable("write")?;
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        Ok(file.write(buf)?)
    }

    fn sync(&self) -> IoResult<()> {
        Ok(self.file.lock().sync_all()?)
    }

    fn set_len(&self, size: u64) -> IoResult<()> {
        self.writable("set_len")?;
        Ok(self.file.lock().set_len(size)?)
    }
}

impl std::fmt::Debug for StandardFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardFile")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_file(name: &str) -> (tempfile::TempDir, StandardFile) {
        let dir = tempdir().unwrap();
        let file = StandardFile::open(dir.path().join(name), OpenMode::CreateNew).unwrap();
        (dir, file)
    }

    #[test]
    fn test_create_then_reopen() {
        let (dir, file) = new_file("nodes.db");
        assert_eq!(file.size().unwrap(), 0);
        assert_eq!(file.mode(), OpenMode::CreateNew);
        drop(file);

        let path = dir.path().join("nodes.db");
        let err = StandardFile::open(&path, OpenMode::CreateNew).unwrap_err();
        assert!(matches!(err, IoError::AlreadyExists { .. }));
        StandardFile::open(&path, OpenMode::ReadWrite).unwrap();

        let err = StandardFile::open(dir.path().join("none.db"), OpenMode::Read).unwrap_err();
        assert!(matches!(err, IoError::NotFound { .. }));
    }

    #[test]
    fn test_records_at_offsets() {
        let (_dir, file) = new_file("records.db");

        file.write_all_at(&[1, 0, 0, 0, 7, 0, 0, 0, 9], 9 * 4).unwrap();
        assert_eq!(file.size().unwrap(), 9 * 5);

        let mut record = [0u8; 9];
        file.read_exact_at(&mut record, 9 * 4).unwrap();
        assert_eq!(record, [1, 0, 0, 0, 7, 0, 0, 0, 9]);

        // the gap before it reads back as zeroes
        file.read_exact_at(&mut record, 9).unwrap();
        assert_eq!(record, [0; 9]);
    }

    #[test]
    fn test_read_past_eof() {
        let (_dir, file) = new_file("short.db");
        file.write_all_at(b"abc", 0).unwrap();

        let mut buf = [0xFFu8; 6];
        let err = file.read_exact_at(&mut buf, 1).unwrap_err();
        assert!(matches!(
            err,
            IoError::ShortIo {
                offset: 1,
                expected: 6,
                actual: 2,
                ..
            }
        ));

        assert_eq!(file.read_up_to_at(&mut buf, 1).unwrap(), 2);
        assert_eq!(&buf, b"bc\0\0\0\0");
        assert_eq!(file.read_up_to_at(&mut buf, 100).unwrap(), 0);
        assert_eq!(buf, [0; 6]);
    }

    #[test]
    fn test_set_len_and_sync() {
        let (_dir, file) = new_file("len.db");

        file.set_len(1024).unwrap();
        assert_eq!(file.size().unwrap(), 1024);
        file.set_len(9).unwrap();
        file.sync().unwrap();
        assert_eq!(file.size().unwrap(), 9);
    }

    #[test]
    fn test_read_only_handle() {
        let (dir, file) = new_file("ro.db");
        file.write_all_at(b"x", 0).unwrap();
        drop(file);

        let file = StandardFile::open(dir.path().join("ro.db"), OpenMode::Read).unwrap();
        assert!(matches!(
            file.write_at(b"y", 0),
            Err(IoError::ReadOnly {
                operation: "write",
                ..
            })
        ));
        assert!(file.set_len(0).is_err());

        let mut buf = [0u8; 1];
        file.read_exact_at(&mut buf, 0).unwrap();
        assert_eq!(&buf, b"x");
    }
}
