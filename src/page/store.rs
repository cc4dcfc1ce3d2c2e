//! Page Store
//!
//! Filesystem access for page files. Every append is flushed and fsynced
//! before it is reported as written.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{MidError, Result};
use crate::record::{self, Record, RECORD_SIZE};

use super::{PAGE_EXTENSION, PAGE_SIZE};

/// Owns the page directory and the page-sized scratch buffer
pub struct PageStore {
    /// Directory holding the page files
    dir: PathBuf,
    /// Pages are addressed `[0, max_pages)`
    max_pages: u32,
    /// Reused by whole-page reads, holds nothing between calls
    scratch: Box<[u8; PAGE_SIZE]>,
}

impl PageStore {
    /// Open the page directory, creating it if needed
    pub fn open(dir: &Path, max_pages: u32) -> Result<Self> {
        fs::create_dir_all(dir)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            max_pages,
            scratch: Box::new([0u8; PAGE_SIZE]),
        })
    }

    /// Append one encoded record, returning its byte offset
    ///
    /// Returns `LogFileFull` without writing when the record would not fit;
    /// the caller treats that as a signal to rotate.
    pub fn append(&mut self, page: u16, bytes: &[u8; RECORD_SIZE]) -> Result<u16> {
        let path = self.page_path(page);
        let created = !path.exists();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| MidError::Open { page, source })?;

        let size = file
            .seek(SeekFrom::End(0))
            .map_err(|source| MidError::Tell { page, source })?;

        if size as usize + RECORD_SIZE > PAGE_SIZE {
            return Err(MidError::LogFileFull);
        }

        if size as usize % RECORD_SIZE != 0 {
            return Err(MidError::Corrupt(format!(
                "page {:#x} length {} is not a multiple of {}",
                page, size, RECORD_SIZE
            )));
        }

        file.write_all(bytes)
            .map_err(|source| MidError::Write { page, source })?;
        file.flush()
            .map_err(|source| MidError::Flush { page, source })?;
        file.sync_all()
            .map_err(|source| MidError::Sync { page, source })?;

        if created {
            debug!(page, "created page");
            self.sync_dir(page)?;
        }

        trace!(page, offset = size, "appended record");
        Ok(size as u16)
    }

    /// Read the encoded record at `offset`
    pub fn read_at(&self, page: u16, offset: u16) -> Result<[u8; RECORD_SIZE]> {
        let path = self.page_path(page);

        let size = fs::metadata(&path)
            .map_err(|source| MidError::Stat { page, source })?
            .len();

        if offset as usize % RECORD_SIZE != 0 || offset as u64 + RECORD_SIZE as u64 > size {
            return Err(MidError::Eof { page, offset });
        }

        let mut file = File::open(&path).map_err(|source| MidError::Open { page, source })?;
        file.seek(SeekFrom::Start(offset as u64))
            .map_err(|source| MidError::Seek { page, source })?;

        let mut buf = [0u8; RECORD_SIZE];
        file.read_exact(&mut buf)
            .map_err(|source| MidError::Read { page, source })?;

        Ok(buf)
    }

    /// Read and decode the record at `offset`
    pub fn read_record(&self, page: u16, offset: u16) -> Result<Record> {
        let bytes = self.read_at(page, offset)?;
        record::decode(&bytes)
    }

    /// Load a whole page into the scratch buffer
    pub fn read_whole(&mut self, page: u16) -> Result<&[u8]> {
        let path = self.page_path(page);

        let size = fs::metadata(&path)
            .map_err(|source| MidError::Stat { page, source })?
            .len() as usize;

        if size % RECORD_SIZE != 0 || size > PAGE_SIZE {
            return Err(MidError::Corrupt(format!(
                "page {:#x} has invalid length {}",
                page, size
            )));
        }

        let mut file = File::open(&path).map_err(|source| MidError::Open { page, source })?;
        file.read_exact(&mut self.scratch[..size])
            .map_err(|source| MidError::Read { page, source })?;

        Ok(&self.scratch[..size])
    }

    /// Decode every record of a page in file order
    pub fn read_records(&mut self, page: u16) -> Result<Vec<Record>> {
        let data = self.read_whole(page)?;
        data.chunks_exact(RECORD_SIZE).map(record::decode).collect()
    }

    /// Current length of a page in bytes
    pub fn page_len(&self, page: u16) -> Result<u64> {
        fs::metadata(self.page_path(page))
            .map(|m| m.len())
            .map_err(|source| MidError::Stat { page, source })
    }

    /// Delete a page file
    pub fn delete(&self, page: u16) -> Result<()> {
        fs::remove_file(self.page_path(page))
            .map_err(|source| MidError::Erase { page, source })?;
        self.sync_dir(page)?;
        debug!(page, "deleted page");
        Ok(())
    }

    /// Check whether a page file exists
    pub fn exists(&self, page: u16) -> bool {
        self.page_path(page).is_file()
    }

    /// All existing page ids in `[0, max_pages)`, ascending
    pub fn existing_pages(&self) -> Vec<u16> {
        (0..self.max_pages)
            .map(|id| id as u16)
            .filter(|&id| self.exists(id))
            .collect()
    }

    /// Get the directory holding the pages
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// File path of a page: lowercase hex id plus extension
    pub fn page_path(&self, page: u16) -> PathBuf {
        self.dir.join(format!("{:x}.{}", page, PAGE_EXTENSION))
    }

    /// Persist directory entries after a page is created or removed
    #[cfg(unix)]
    fn sync_dir(&self, page: u16) -> Result<()> {
        File::open(&self.dir)
            .and_then(|dir| dir.sync_all())
            .map_err(|source| MidError::Sync { page, source })
    }

    #[cfg(not(unix))]
    fn sync_dir(&self, _page: u16) -> Result<()> {
        Ok(())
    }
}
