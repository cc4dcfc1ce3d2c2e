//! Page Module
//!
//! Rotating page files holding packed records.
//!
//! ## Responsibilities
//! - One file per page, named by lowercase hex id (`a3.ms`)
//! - Append one record at a time, flushed and fsynced before returning
//! - Point reads and whole-page reads for replay and purge
//! - Page deletion for purge
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Record 0   (32 bytes)                   │
//! ├─────────────────────────────────────────┤
//! │ Record 1   (32 bytes)                   │
//! ├─────────────────────────────────────────┤
//! │ ...        (at most 128 records)        │
//! └─────────────────────────────────────────┘
//! ```
//! No header or footer; length is always a multiple of 32 and at most 4096.

mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::RECORD_SIZE;

pub use store::PageStore;

/// Capacity of one page file in bytes
pub const PAGE_SIZE: usize = 4096;

/// Records that fit in one page
pub const RECORDS_PER_PAGE: usize = PAGE_SIZE / RECORD_SIZE;

/// File extension of page files
pub(crate) const PAGE_EXTENSION: &str = "ms";

/// Location of a record in the log
///
/// Only valid while its page exists; purging the page leaves it dangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub page: u16,
    /// Byte offset within the page, a multiple of the record size
    pub offset: u16,
}

impl Position {
    pub fn new(page: u16, offset: u16) -> Self {
        Self { page, offset }
    }

    /// Index of the record within its page
    pub fn slot(&self) -> usize {
        self.offset as usize / RECORD_SIZE
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}:{}", self.page, self.offset)
    }
}
