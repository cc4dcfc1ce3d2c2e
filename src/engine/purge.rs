//! Retention policy
//!
//! Only the oldest page in rotation order is ever considered, and only when
//! an append finds the whole log full. The page is deleted when its newest
//! meter reading is older than `Config::max_age`, or when it holds no meter
//! readings at all.

use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::Result;
use crate::record::{MeterValue, Record};

use super::MidLog;

impl<C: Clock> MidLog<C> {
    /// Most recent meter value stored in a page, by timestamp
    ///
    /// Picks the greatest `time_ms`, not the last reading in file order, so a
    /// clock stepped backwards cannot make a page look older than it is.
    pub fn latest_in_page(&mut self, page: u16) -> Result<Option<MeterValue>> {
        let records = self.store.read_records(page)?;
        Ok(records
            .iter()
            .filter_map(Record::meter_value)
            .max_by_key(|mv| mv.time_ms)
            .copied())
    }

    /// Delete `page` if retention allows, returning whether it was deleted
    pub(super) fn try_purge(&mut self, page: u16) -> Result<bool> {
        let now = self.clock.now_ms();
        let max_age = self.config.max_age_ms();

        match self.latest_in_page(page)? {
            None => {
                info!(page, "purging page without meter values");
            }
            Some(latest) => {
                let age = now.saturating_sub(latest.time_ms);
                if age <= max_age {
                    warn!(
                        page,
                        age_ms = age,
                        max_age_ms = max_age,
                        "log full, oldest page too young to purge"
                    );
                    return Ok(false);
                }
                info!(page, age_ms = age, "purging expired page");
            }
        }

        if let Some(limit) = self.min_purgeable {
            if limit.page == page {
                warn!(page, %limit, "purging page holding the purge limit");
            }
        }

        self.store.delete(page)?;
        Ok(true)
    }
}
