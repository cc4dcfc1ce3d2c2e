//! Error types for the MID long-term storage
//!
//! Provides a unified error type for all operations. Errors fall into four
//! classes: filesystem, integrity, protocol/state and capacity.

use std::io;

use thiserror::Error;

/// Result type alias using MidError
pub type Result<T> = std::result::Result<T, MidError>;

/// Unified error type for MID storage operations
#[derive(Debug, Error)]
pub enum MidError {
    // -------------------------------------------------------------------------
    // Filesystem Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to open page {page:#x}: {source}")]
    Open { page: u16, source: io::Error },

    #[error("Failed to determine length of page {page:#x}: {source}")]
    Tell { page: u16, source: io::Error },

    #[error("Failed to write page {page:#x}: {source}")]
    Write { page: u16, source: io::Error },

    #[error("Failed to seek in page {page:#x}: {source}")]
    Seek { page: u16, source: io::Error },

    #[error("Failed to read page {page:#x}: {source}")]
    Read { page: u16, source: io::Error },

    #[error("Failed to flush page {page:#x}: {source}")]
    Flush { page: u16, source: io::Error },

    #[error("Failed to sync page {page:#x}: {source}")]
    Sync { page: u16, source: io::Error },

    #[error("Failed to stat page {page:#x}: {source}")]
    Stat { page: u16, source: io::Error },

    #[error("Failed to erase page {page:#x}: {source}")]
    Erase { page: u16, source: io::Error },

    // -------------------------------------------------------------------------
    // Integrity Errors
    // -------------------------------------------------------------------------
    #[error("Bad record CRC: stored {stored:#010x}, computed {computed:#010x}")]
    BadCrc { stored: u32, computed: u32 },

    #[error("Corrupt data: {0}")]
    Corrupt(String),

    #[error("Record out of order: expected #{expected}, found #{found}")]
    MsgOutOfOrder { expected: u32, found: u32 },

    // -------------------------------------------------------------------------
    // Protocol / State Errors
    // -------------------------------------------------------------------------
    #[error("Session already open")]
    SessionAlreadyOpen,

    #[error("Session not open")]
    SessionNotOpen,

    #[error("Bad argument: {0}")]
    BadArg(String),

    #[error("Failed to parse version: {0}")]
    ParseVersion(String),

    // -------------------------------------------------------------------------
    // Capacity Errors
    // -------------------------------------------------------------------------
    #[error("Log file full")]
    LogFileFull,

    // -------------------------------------------------------------------------
    // Query Errors
    // -------------------------------------------------------------------------
    #[error("End of log at page {page:#x} offset {offset}")]
    Eof { page: u16, offset: u16 },

    #[error("No session starts at page {page:#x} offset {offset}")]
    NotSessionStart { page: u16, offset: u16 },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MidError {
    /// True for errors that mean the stored log cannot be trusted
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            MidError::BadCrc { .. } | MidError::Corrupt(_) | MidError::MsgOutOfOrder { .. }
        )
    }

    /// True when the log is full and the oldest page is too young to purge
    pub fn is_capacity(&self) -> bool {
        matches!(self, MidError::LogFileFull)
    }

    /// True for validation errors raised before touching the disk
    pub fn is_state(&self) -> bool {
        matches!(
            self,
            MidError::SessionAlreadyOpen
                | MidError::SessionNotOpen
                | MidError::BadArg(_)
                | MidError::ParseVersion(_)
        )
    }
}
