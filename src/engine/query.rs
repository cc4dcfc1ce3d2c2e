//! Read path
//!
//! Point lookups and forward session scans. Both trust the CRC only and do
//! not check sequence continuity, so a scan may start at any Start reading
//! still on disk.

use crate::clock::Clock;
use crate::error::{MidError, Result};
use crate::page::Position;
use crate::record::{Record, RECORD_SIZE};
use crate::session::ActiveSession;

use super::MidLog;

impl<C: Clock> MidLog<C> {
    /// Read the record at a position
    pub fn read_record(&self, position: Position) -> Result<Record> {
        self.store.read_record(position.page, position.offset)
    }

    /// Rebuild a session starting at `position`
    ///
    /// The record at `position` must be a Start reading, otherwise
    /// `NotSessionStart`. Scans forward across page boundaries until an End
    /// reading. Returns `Eof` if the scan runs past the current page without
    /// finding one.
    pub fn read_session(&self, position: Position) -> Result<ActiveSession> {
        let first = self.store.read_record(position.page, position.offset)?;
        if !first.meter_value().is_some_and(|mv| mv.is_start()) {
            return Err(MidError::NotSessionStart {
                page: position.page,
                offset: position.offset,
            });
        }

        let mut session = ActiveSession::new();
        session.apply(&first, position);
        let mut pos = Position::new(position.page, position.offset + RECORD_SIZE as u16);

        loop {
            let len = self.store.page_len(pos.page)?;
            if pos.offset as u64 + RECORD_SIZE as u64 > len {
                if pos.page == self.current_page {
                    return Err(MidError::Eof {
                        page: pos.page,
                        offset: pos.offset,
                    });
                }
                pos = Position::new(self.next_page(pos.page), 0);
                continue;
            }

            let record = self.store.read_record(pos.page, pos.offset)?;
            if session.apply(&record, pos) {
                return Ok(session);
            }

            pos.offset += RECORD_SIZE as u16;
        }
    }
}
