//! Active session
//!
//! Materialized view of one session: identity, auth, versions and the
//! ordered meter readings. Reset wipes the previous contents before reuse
//! so no customer data from an earlier session lingers in memory.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::page::Position;
use crate::record::{Auth, FwVersion, LrVersion, MeterValue, Payload, Record, SessionId};

/// Capacity of the readings buffer before the first growth
pub const INITIAL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    id: Option<SessionId>,
    auth: Option<Auth>,
    fw_version: Option<FwVersion>,
    lr_version: Option<LrVersion>,
    events: Vec<MeterValue>,
    /// Position of the Start record
    anchor: Option<Position>,
}

impl Default for ActiveSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.reset();
    }
}

impl ActiveSession {
    pub fn new() -> Self {
        Self {
            id: None,
            auth: None,
            fw_version: None,
            lr_version: None,
            events: Vec::with_capacity(INITIAL_CAPACITY),
            anchor: None,
        }
    }

    /// Clear all fields, wiping stored readings and tags
    ///
    /// Volatile zeroing covers the whole readings buffer including spare
    /// capacity, which is kept for the next session.
    pub fn reset(&mut self) {
        self.id.zeroize();
        self.auth.zeroize();
        self.fw_version = None;
        self.lr_version = None;
        self.events.zeroize();
        self.anchor = None;
    }

    /// Append a reading; the first reading fixes the session's versions
    pub fn push(&mut self, value: MeterValue) {
        if self.events.len() == self.events.capacity() {
            self.grow();
        }

        if self.fw_version.is_none() {
            self.fw_version = Some(value.fw_version);
            self.lr_version = Some(value.lr_version);
        }

        self.events.push(value);
    }

    /// Double the readings buffer, wiping the old allocation
    fn grow(&mut self) {
        let capacity = (self.events.capacity() * 2).max(INITIAL_CAPACITY);
        let mut grown = Vec::with_capacity(capacity);
        grown.extend_from_slice(&self.events);

        let mut old = std::mem::replace(&mut self.events, grown);
        old.zeroize();
    }

    /// Last write wins
    pub fn set_id(&mut self, id: SessionId) {
        self.id = Some(id);
    }

    /// Last write wins
    pub fn set_auth(&mut self, auth: Auth) {
        self.auth = Some(auth);
    }

    pub fn set_anchor(&mut self, position: Position) {
        self.anchor = Some(position);
    }

    /// Fold one record into the session
    ///
    /// A Start reading resets the session first. Returns true when the
    /// record was an End reading.
    pub fn apply(&mut self, record: &Record, position: Position) -> bool {
        match &record.payload {
            Payload::Identity(id) => {
                self.set_id(*id);
                false
            }
            Payload::Auth(auth) => {
                self.set_auth(*auth);
                false
            }
            Payload::MeterValue(mv) => {
                if mv.is_start() {
                    self.reset();
                    self.set_anchor(position);
                }
                self.push(*mv);
                mv.is_end()
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> Option<&SessionId> {
        self.id.as_ref()
    }

    pub fn auth(&self) -> Option<&Auth> {
        self.auth.as_ref()
    }

    pub fn fw_version(&self) -> Option<FwVersion> {
        self.fw_version
    }

    pub fn lr_version(&self) -> Option<LrVersion> {
        self.lr_version
    }

    /// Readings in append order
    pub fn events(&self) -> &[MeterValue] {
        &self.events
    }

    pub fn anchor(&self) -> Option<Position> {
        self.anchor
    }

    pub fn capacity(&self) -> usize {
        self.events.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.id.is_none() && self.auth.is_none()
    }

    /// True once the last reading carries the End flag
    pub fn is_complete(&self) -> bool {
        self.events.last().map(|mv| mv.is_end()).unwrap_or(false)
    }
}
