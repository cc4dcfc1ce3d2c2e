//! # midlts
//!
//! MID long-term storage for EV charging stations: a log-structured store
//! for legally relevant metering data with:
//! - Fixed 32-byte CRC-protected records
//! - Rotating single-file pages, every append fsynced
//! - Crash recovery by full replay with sequence checks
//! - In-memory reconstruction of the open charging session
//! - Age-based purge of the oldest page when the log is full
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Charging session / OCPP logic               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ add_open / add_tariff / add_close / ...
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                         MidLog                              │
//! │        (sequencing, rotation, purge, replay, query)         │
//! └──────┬──────────────────────┬───────────────────────┬───────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//!   ┌──────────┐         ┌─────────────┐        ┌───────────────┐
//!   │  Codec   │         │  PageStore  │        │ ActiveSession │
//!   │ (32 B)   │         │ (N × 4 KiB) │        │    (RAM)      │
//!   └──────────┘         └─────────────┘        └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod config;
pub mod error;

pub mod engine;
pub mod page;
pub mod record;
pub mod session;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use engine::{Appended, LogStats, MidLog};
pub use error::{MidError, Result};
pub use page::Position;
pub use record::{
    Auth, AuthSource, AuthType, FwVersion, LrVersion, MeterFlags, MeterValue, Payload, Record,
    RecordKind, SessionId,
};
pub use session::ActiveSession;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of midlts
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
