//! Engine Module
//!
//! The MID log engine that coordinates the page store, the codec and the
//! active session.
//!
//! ## Responsibilities
//! - Rebuild all counters and the open session by replay at startup
//! - Sequence, encode and append records, rotating pages when full
//! - Purge the oldest page when the log is full and retention allows it
//! - Point lookups and forward session scans
//!
//! ## Concurrency Model
//!
//! None inside the engine. Every operation takes `&self` or `&mut self` and
//! performs blocking filesystem calls; callers sharing a `MidLog` between
//! tasks must serialize access themselves.
//!
//! ## Failure Model
//!
//! Every successful append is on disk when it returns. A failed append may
//! leave partial page growth behind, so after any error the caller should
//! re-open the log (which replays it) instead of retrying blindly.

mod append;
mod purge;
mod query;
mod replay;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{MidError, Result};
use crate::page::{PageStore, Position};
use crate::record::{FwVersion, LrVersion, MeterValue, Payload, Record};
use crate::session::ActiveSession;

/// A record as committed to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appended {
    pub record: Record,
    pub position: Position,
}

/// Record counters rebuilt by replay and maintained by appends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStats {
    pub records: u64,
    pub starts: u64,
    pub ends: u64,
    pub tariffs: u64,
}

impl LogStats {
    fn count(&mut self, record: &Record) {
        self.records += 1;
        if let Some(mv) = record.meter_value() {
            if mv.is_start() {
                self.starts += 1;
            } else if mv.is_end() {
                self.ends += 1;
            } else if mv.is_tariff() {
                self.tariffs += 1;
            }
        }
    }
}

/// The MID long-term storage engine
///
/// Owns the page directory exclusively. Built by replay in [`MidLog::init`];
/// no append is accepted before replay has finished.
pub struct MidLog<C: Clock = SystemClock> {
    /// Engine configuration
    config: Config,

    /// Page files on disk
    store: PageStore,

    /// Source of reading timestamps
    clock: C,

    /// Versions stamped on every meter value
    fw_version: FwVersion,
    lr_version: LrVersion,

    /// Session state machine: Closed / Open
    session_open: bool,

    /// Most recent meter value written or replayed
    latest_meter_value: Option<MeterValue>,

    /// The one writable page
    current_page: u16,

    /// Sequence id of the next record
    next_sequence_id: u32,

    /// Caller-set watermark of data not yet externalized
    min_purgeable: Option<Position>,

    /// RAM view of the open session
    active_session: ActiveSession,

    stats: LogStats,
}

impl MidLog<SystemClock> {
    /// Open the log with the system clock
    pub fn open(config: Config, fw_version: FwVersion, lr_version: LrVersion) -> Result<Self> {
        Self::init(config, fw_version, lr_version, SystemClock)
    }
}

impl<C: Clock> MidLog<C> {
    /// Open or create the log and replay it
    ///
    /// On startup:
    /// 1. Validate config and create the data directory
    /// 2. Replay every existing page in sequence order
    /// 3. Ready to accept appends
    pub fn init(config: Config, fw_version: FwVersion, lr_version: LrVersion, clock: C) -> Result<Self> {
        config.validate()?;

        let store = PageStore::open(&config.data_dir, config.max_pages)?;

        let mut log = Self {
            config,
            store,
            clock,
            fw_version,
            lr_version,
            session_open: false,
            latest_meter_value: None,
            current_page: 0,
            next_sequence_id: 0,
            min_purgeable: None,
            active_session: ActiveSession::new(),
            stats: LogStats::default(),
        };

        log.replay()?;

        Ok(log)
    }

    /// Record the oldest position not yet externalized
    ///
    /// Advisory: the purge policy only checks age, and logs a warning when
    /// it deletes the page holding this position.
    pub fn set_purge_limit(&mut self, position: Position) -> Result<()> {
        if position.page as u32 >= self.config.max_pages {
            return Err(MidError::BadArg(format!(
                "purge limit page {:#x} outside {} pages",
                position.page, self.config.max_pages
            )));
        }
        self.min_purgeable = Some(position);
        Ok(())
    }

    /// Release the log
    ///
    /// Every append is already durable; this only wipes the in-memory
    /// session.
    pub fn shutdown(mut self) -> Result<()> {
        info!(
            page = self.current_page,
            next_seq = self.next_sequence_id,
            open = self.session_open,
            records = self.stats.records,
            "MID log shutdown"
        );
        self.active_session.reset();
        Ok(())
    }

    /// Apply a committed record to the in-memory state
    ///
    /// Shared by append and replay so both build identical state.
    fn apply_committed(&mut self, record: &Record, position: Position) {
        self.stats.count(record);

        match &record.payload {
            Payload::MeterValue(mv) => {
                self.latest_meter_value = Some(*mv);

                if mv.is_start() {
                    self.active_session.reset();
                    self.active_session.set_anchor(position);
                    self.active_session.push(*mv);
                    self.session_open = true;
                } else if mv.is_end() {
                    if self.session_open {
                        self.active_session.push(*mv);
                    }
                    self.session_open = false;
                } else if self.session_open {
                    self.active_session.push(*mv);
                }
            }
            Payload::Identity(id) => {
                if self.session_open {
                    self.active_session.set_id(*id);
                }
            }
            Payload::Auth(auth) => {
                if self.session_open {
                    self.active_session.set_auth(*auth);
                }
            }
        }
    }

    /// Next page in rotation order
    fn next_page(&self, page: u16) -> u16 {
        ((page as u32 + 1) % self.config.max_pages) as u16
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn is_session_open(&self) -> bool {
        self.session_open
    }

    pub fn active_session(&self) -> &ActiveSession {
        &self.active_session
    }

    pub fn latest_meter_value(&self) -> Option<&MeterValue> {
        self.latest_meter_value.as_ref()
    }

    pub fn current_page(&self) -> u16 {
        self.current_page
    }

    pub fn next_sequence_id(&self) -> u32 {
        self.next_sequence_id
    }

    pub fn purge_limit(&self) -> Option<Position> {
        self.min_purgeable
    }

    pub fn stats(&self) -> LogStats {
        self.stats
    }

    pub fn fw_version(&self) -> FwVersion {
        self.fw_version
    }

    pub fn lr_version(&self) -> LrVersion {
        self.lr_version
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the clock stamping new readings
    pub fn clock(&self) -> &C {
        &self.clock
    }
}
