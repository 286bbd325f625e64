use log::{error, trace, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicI32, Ordering};

use crate::common::config::{PageId, DB_PAGE_SIZE};

/// Reads and writes page-sized blocks addressed by page id. Both operations
/// are synchronous and report success as a boolean; the disk scheduler turns
/// that into the completion value of the caller's promise.
pub trait DiskManager: Send + Sync {
    fn read_page(&self, page_id: PageId, page_data: &mut [u8; DB_PAGE_SIZE]) -> bool;
    fn write_page(&self, page_id: PageId, page_data: &[u8; DB_PAGE_SIZE]) -> bool;
}

/// File-backed disk manager. Pages live at offset `page_id * DB_PAGE_SIZE`.
pub struct FileDiskManager {
    file_name: String,
    db_io: Mutex<File>,
    num_writes: AtomicI32,
}

impl FileDiskManager {
    pub fn new(db_file: &str) -> Self {
        let db_io = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(db_file)
            .unwrap_or_else(|e| panic!("cannot open db file {}: {}", db_file, e));

        Self {
            file_name: db_file.to_string(),
            db_io: Mutex::new(db_io),
            num_writes: AtomicI32::new(0),
        }
    }

    pub fn get_file_name(&self) -> &str {
        &self.file_name
    }

    pub fn get_num_writes(&self) -> i32 {
        self.num_writes.load(Ordering::SeqCst)
    }
}

impl DiskManager for FileDiskManager {
    fn write_page(&self, page_id: PageId, page_data: &[u8; DB_PAGE_SIZE]) -> bool {
        let offset = page_id * DB_PAGE_SIZE as u64;
        trace!("writing page {} at offset {}", page_id, offset);

        let mut db_io = self.db_io.lock();
        let result = db_io
            .seek(SeekFrom::Start(offset))
            .and_then(|_| db_io.write_all(page_data))
            .and_then(|_| db_io.flush());
        match result {
            Ok(()) => {
                self.num_writes.fetch_add(1, Ordering::SeqCst);
                true
            }
            Err(e) => {
                error!("failed to write page {}: {}", page_id, e);
                false
            }
        }
    }

    fn read_page(&self, page_id: PageId, page_data: &mut [u8; DB_PAGE_SIZE]) -> bool {
        let offset = page_id * DB_PAGE_SIZE as u64;
        let mut db_io = self.db_io.lock();
        if let Err(e) = db_io.seek(SeekFrom::Start(offset)) {
            error!("failed to seek to page {}: {}", page_id, e);
            return false;
        }

        match db_io.read_exact(page_data) {
            Ok(()) => true,
            Err(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // A page that was never written reads as zeroes.
                let end = db_io.stream_position().unwrap_or(offset);
                let bytes_read = (end - offset) as usize;
                page_data[bytes_read..].fill(0);
                warn!("read past EOF for page {}, zero-filled tail", page_id);
                true
            }
            Err(e) => {
                error!("failed to read page {}: {}", page_id, e);
                false
            }
        }
    }
}

/// In-memory disk manager for tests.
pub struct MemoryDiskManager {
    pages: Mutex<HashMap<PageId, Box<[u8; DB_PAGE_SIZE]>>>,
}

impl MemoryDiskManager {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryDiskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskManager for MemoryDiskManager {
    fn write_page(&self, page_id: PageId, page_data: &[u8; DB_PAGE_SIZE]) -> bool {
        let mut pages = self.pages.lock();
        pages.insert(page_id, Box::new(*page_data));
        true
    }

    fn read_page(&self, page_id: PageId, page_data: &mut [u8; DB_PAGE_SIZE]) -> bool {
        let pages = self.pages.lock();
        match pages.get(&page_id) {
            Some(data) => page_data.copy_from_slice(&data[..]),
            None => page_data.fill(0),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let dm = FileDiskManager::new(db_path.to_str().unwrap());

        let mut buf = [0u8; DB_PAGE_SIZE];
        buf[0] = 0xAB;
        buf[DB_PAGE_SIZE - 1] = 0xCD;
        assert!(dm.write_page(3, &buf));

        let mut out = [0u8; DB_PAGE_SIZE];
        assert!(dm.read_page(3, &mut out));
        assert_eq!(out[0], 0xAB);
        assert_eq!(out[DB_PAGE_SIZE - 1], 0xCD);
        assert_eq!(dm.get_num_writes(), 1);
    }

    #[test]
    fn test_read_unwritten_page_is_zeroed() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let dm = FileDiskManager::new(db_path.to_str().unwrap());

        let mut out = [0xFFu8; DB_PAGE_SIZE];
        assert!(dm.read_page(17, &mut out));
        assert!(out.iter().all(|&b| b == 0));
    }
}
