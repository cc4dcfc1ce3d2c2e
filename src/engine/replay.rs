//! Startup replay
//!
//! Rebuilds counters and the open session from the pages on disk:
//! 1. Read the first sequence id of every existing page
//! 2. Oldest page = smallest first id, newest = largest
//! 3. Walk pages oldest → newest in rotation order, records in file order
//! 4. Every record must continue the sequence exactly
//! 5. Apply each record as the append path would
//!
//! Any CRC failure or sequence gap aborts replay. Nothing is repaired or
//! truncated.

use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{MidError, Result};
use crate::page::Position;
use crate::record::{Payload, Record, RECORD_SIZE};

use super::MidLog;

/// Per-replay bookkeeping
struct ReplayCursor {
    /// Sequence id the next record must carry, unknown before the first
    expected: Option<u32>,
    /// One End may lack its Start (purged with an older page); cleared
    /// once such an End has been accepted
    allow_orphan_end: bool,
    pages: usize,
}

impl<C: Clock> MidLog<C> {
    pub(super) fn replay(&mut self) -> Result<()> {
        // Step 1: first sequence id of every non-empty page
        let mut firsts: Vec<(u16, u32)> = Vec::new();
        for page in self.store.existing_pages() {
            if self.store.page_len(page)? == 0 {
                debug!(page, "skipping empty page");
                continue;
            }
            let first = self.store.read_record(page, 0)?;
            firsts.push((page, first.sequence_id));
        }

        // Step 2: oldest and newest page
        let oldest = firsts.iter().min_by_key(|(_, seq)| *seq).map(|&(page, _)| page);
        let newest = firsts.iter().max_by_key(|(_, seq)| *seq).map(|&(page, _)| page);

        let (min_page, max_page) = match (oldest, newest) {
            (Some(min), Some(max)) => (min, max),
            _ => {
                info!(dir = %self.store.dir().display(), "MID log empty, starting fresh");
                return Ok(());
            }
        };

        // Step 3: rotation order from oldest to newest
        let max_pages = self.config.max_pages;
        let span = (max_page as u32 + max_pages - min_page as u32) % max_pages;

        let mut cursor = ReplayCursor {
            expected: None,
            allow_orphan_end: true,
            pages: 0,
        };

        for step in 0..=span {
            let page = ((min_page as u32 + step) % max_pages) as u16;
            if !self.store.exists(page) {
                // A missing page surfaces as a sequence gap on the next one
                continue;
            }

            debug!(page, "replaying page");
            let records = self.store.read_records(page)?;
            for (slot, record) in records.iter().enumerate() {
                let position = Position::new(page, (slot * RECORD_SIZE) as u16);
                self.replay_record(&mut cursor, record, position)?;
            }
            cursor.pages += 1;
        }

        self.next_sequence_id = cursor.expected.unwrap_or(0);
        self.current_page = max_page;

        // A closed session lives on disk only
        if !self.session_open {
            self.active_session.reset();
        }

        info!(
            pages = cursor.pages,
            current_page = self.current_page,
            next_seq = self.next_sequence_id,
            open = self.session_open,
            "MID log restored"
        );
        info!(
            records = self.stats.records,
            starts = self.stats.starts,
            ends = self.stats.ends,
            tariffs = self.stats.tariffs,
            "MID log totals"
        );

        Ok(())
    }

    fn replay_record(
        &mut self,
        cursor: &mut ReplayCursor,
        record: &Record,
        position: Position,
    ) -> Result<()> {
        if self.config.trace_records {
            debug!(%position, "replay {}", record);
        }

        // Step 4: sequence continuity, seeded by the very first record
        if let Some(expected) = cursor.expected {
            if record.sequence_id != expected {
                return Err(MidError::MsgOutOfOrder {
                    expected,
                    found: record.sequence_id,
                });
            }
        }
        cursor.expected = Some(record.sequence_id.wrapping_add(1));

        // Step 5: session state checks
        match &record.payload {
            Payload::MeterValue(mv) if mv.is_start() => {
                if self.session_open {
                    return Err(MidError::SessionAlreadyOpen);
                }
            }
            Payload::MeterValue(mv) if mv.is_end() && !self.session_open => {
                if !cursor.allow_orphan_end {
                    return Err(MidError::SessionNotOpen);
                }
                debug!(seq = record.sequence_id, %position, "End without Start accepted");
                cursor.allow_orphan_end = false;
            }
            Payload::Identity(_) | Payload::Auth(_) if !self.session_open => {
                debug!(seq = record.sequence_id, %position, "annotation outside an open session");
            }
            _ => {}
        }

        self.apply_committed(record, position);
        Ok(())
    }
}
