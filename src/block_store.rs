use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::block_id::BlockId;

/// The block-oriented file store this crate's core reads from and writes to.
///
/// Read and write are synchronous and total: they either succeed or
/// raise an I/O failure the core treats as fatal to the current
/// operation. This trait and its file-backed implementation exist so
/// the crate is independently testable without a real storage engine
/// attached.
pub trait BlockStore: Send + Sync {
    fn block_size(&self) -> usize;
    fn read(&self, block: &BlockId, into: &mut [u8]) -> std::io::Result<()>;
    fn write(&self, block: &BlockId, from: &[u8]) -> std::io::Result<()>;
}

/// A directory of fixed-size block files, one file per [`BlockId::file_name`],
/// blocks addressed by byte offset `block_number * block_size`.
///
/// Mirrors the SimpleDB-style `FileMgr` adapters this crate is modeled
/// on: a single growable file per logical file name, rather than one
/// file per page id.
pub struct FileBlockStore {
    root: PathBuf,
    block_size: usize,
    // one OS file handle kept open per logical file, guarded for
    // concurrent access from multiple pool threads.
    open_files: Mutex<HashMap<String, std::fs::File>>,
}

impl FileBlockStore {
    pub fn new(root: impl Into<PathBuf>, block_size: usize) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            block_size,
            open_files: Mutex::new(HashMap::new()),
        })
    }

    fn with_file<T>(
        &self,
        file_name: &str,
        f: impl FnOnce(&mut std::fs::File) -> std::io::Result<T>,
    ) -> std::io::Result<T> {
        let mut open_files = self.open_files.lock().unwrap();
        if !open_files.contains_key(file_name) {
            let path = Path::join(&self.root, file_name);
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(path)?;
            open_files.insert(file_name.to_string(), file);
        }
        f(open_files.get_mut(file_name).unwrap())
    }
}

impl BlockStore for FileBlockStore {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn read(&self, block: &BlockId, into: &mut [u8]) -> std::io::Result<()> {
        assert_eq!(into.len(), self.block_size);
        let offset = block.block_number() * self.block_size as u64;
        self.with_file(block.file_name(), |file| {
            let len = file.metadata()?.len();
            if offset >= len {
                // never-written block reads as all zeros, matching a
                // freshly allocated on-disk block.
                into.fill(0);
                return Ok(());
            }
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(into)
        })
    }

    fn write(&self, block: &BlockId, from: &[u8]) -> std::io::Result<()> {
        assert_eq!(from.len(), self.block_size);
        let offset = block.block_number() * self.block_size as u64;
        self.with_file(block.file_name(), |file| {
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(from)
        })
    }
}

#[cfg(test)]
pub(crate) fn test_root() -> PathBuf {
    use uuid::Uuid;
    std::env::temp_dir().join(format!("bufferpool-test-{}", Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let root = test_root();
        let store = FileBlockStore::new(&root, 64).unwrap();
        let block = BlockId::new("testfile", 2);

        let mut data = [0u8; 64];
        data[0] = 7;
        data[63] = 9;
        store.write(&block, &data).unwrap();

        let mut into = [0u8; 64];
        store.read(&block, &mut into).unwrap();
        assert_eq!(data, into);

        std::fs::remove_dir_all(root).ok();
    }

    #[test]
    fn unwritten_block_reads_as_zeros() {
        let root = test_root();
        let store = FileBlockStore::new(&root, 32).unwrap();
        let block = BlockId::new("testfile", 5);

        let mut into = [0xFFu8; 32];
        store.read(&block, &mut into).unwrap();
        assert_eq!(into, [0u8; 32]);

        std::fs::remove_dir_all(root).ok();
    }
}
