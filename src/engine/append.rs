//! Append path
//!
//! Session state checks, record sequencing and the write-with-rotation
//! algorithm:
//! 1. Append to the current page
//! 2. If full, append to the next page in rotation order
//! 3. If that page is full too (the log has wrapped), try to purge it and
//!    append once more
//! 4. Any other error propagates without retry

use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{MidError, Result};
use crate::page::Position;
use crate::record::{
    self, Auth, AuthSource, AuthType, MeterFlags, MeterValue, Payload, Record, SessionId,
    MAX_TIME_MS, RECORD_SIZE,
};

use super::{Appended, MidLog};

/// Bits the engine sets itself; stripped from caller-supplied flags
const READING_KIND: MeterFlags = MeterFlags::START
    .union(MeterFlags::TARIFF)
    .union(MeterFlags::END);

impl<C: Clock> MidLog<C> {
    /// Open a session with a Start reading
    pub fn add_open(&mut self, flags: MeterFlags, meter: u32) -> Result<Appended> {
        if self.session_open {
            return Err(MidError::SessionAlreadyOpen);
        }
        let mv = self.meter_value(flags, MeterFlags::START, meter)?;
        self.append(Payload::MeterValue(mv))
    }

    /// Log a tariff-change reading, inside or outside a session
    pub fn add_tariff(&mut self, flags: MeterFlags, meter: u32) -> Result<Appended> {
        let mv = self.meter_value(flags, MeterFlags::TARIFF, meter)?;
        self.append(Payload::MeterValue(mv))
    }

    /// Close the open session with an End reading
    pub fn add_close(&mut self, flags: MeterFlags, meter: u32) -> Result<Appended> {
        if !self.session_open {
            return Err(MidError::SessionNotOpen);
        }
        let mv = self.meter_value(flags, MeterFlags::END, meter)?;
        self.append(Payload::MeterValue(mv))
    }

    /// Attach the session identity
    pub fn add_id(&mut self, id: impl Into<SessionId>) -> Result<Appended> {
        if !self.session_open {
            return Err(MidError::SessionNotOpen);
        }
        self.append(Payload::Identity(id.into()))
    }

    /// Attach the customer authorization, tag at most 20 bytes
    pub fn add_auth(&mut self, source: AuthSource, kind: AuthType, data: &[u8]) -> Result<Appended> {
        let auth = Auth::new(source, kind, data)?;
        if !self.session_open {
            return Err(MidError::SessionNotOpen);
        }
        self.append(Payload::Auth(auth))
    }

    /// Stamp a reading with the current time and the engine versions
    fn meter_value(&self, flags: MeterFlags, kind: MeterFlags, meter: u32) -> Result<MeterValue> {
        let time_ms = self.clock.now_ms();
        if time_ms > MAX_TIME_MS {
            return Err(MidError::BadArg(format!(
                "timestamp {} does not fit 48 bits",
                time_ms
            )));
        }

        let informational = MeterFlags::from_bits(flags.bits() & !READING_KIND.bits());

        Ok(MeterValue {
            lr_version: self.lr_version,
            fw_version: self.fw_version,
            time_ms,
            flags: informational | kind,
            meter,
        })
    }

    /// Sequence, write and apply one record
    fn append(&mut self, payload: Payload) -> Result<Appended> {
        let record = Record::new(self.next_sequence_id, payload);
        let bytes = record::encode(&record);

        let position = self.write_with_rotation(&bytes)?;

        if self.config.trace_records {
            debug!(%position, "write {}", record);
        }

        self.apply_committed(&record, position);
        self.next_sequence_id = self.next_sequence_id.wrapping_add(1);

        Ok(Appended { record, position })
    }

    fn write_with_rotation(&mut self, bytes: &[u8; RECORD_SIZE]) -> Result<Position> {
        // Step 1: current page
        let page = self.current_page;
        match self.store.append(page, bytes) {
            Err(MidError::LogFileFull) => {}
            other => return other.map(|offset| Position::new(page, offset)),
        }

        // Step 2: next page in rotation order
        let next = self.next_page(page);
        match self.store.append(next, bytes) {
            Err(MidError::LogFileFull) => {}
            Ok(offset) => {
                info!(from = page, to = next, "rotated to next page");
                self.current_page = next;
                return Ok(Position::new(next, offset));
            }
            Err(e) => return Err(e),
        }

        // Step 3: wrapped around, the next page is the oldest
        if !self.try_purge(next)? {
            return Err(MidError::LogFileFull);
        }

        let offset = self.store.append(next, bytes)?;
        info!(from = page, to = next, "rotated to purged page");
        self.current_page = next;
        Ok(Position::new(next, offset))
    }
}
