//! Firmware and legal-relevant versions
//!
//! Every meter value carries both versions so a reading can always be tied
//! to the software that produced it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MidError, Result};

/// Largest value of one firmware version field (10 bits)
pub const FW_FIELD_MAX: u16 = 0x3FF;

/// Application firmware version, four 10-bit fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FwVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub build: u16,
}

/// Legal-relevant (metrology) software version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LrVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl FwVersion {
    pub fn new(major: u16, minor: u16, patch: u16, build: u16) -> Result<Self> {
        for field in [major, minor, patch, build] {
            if field > FW_FIELD_MAX {
                return Err(MidError::BadArg(format!(
                    "firmware version field {} exceeds {}",
                    field, FW_FIELD_MAX
                )));
            }
        }
        Ok(Self {
            major,
            minor,
            patch,
            build,
        })
    }

    /// Pack into the low 40 bits, `major` in the lowest field
    pub(crate) fn pack(&self) -> u64 {
        let mask = FW_FIELD_MAX as u64;
        (self.major as u64 & mask)
            | (self.minor as u64 & mask) << 10
            | (self.patch as u64 & mask) << 20
            | (self.build as u64 & mask) << 30
    }

    pub(crate) fn unpack(bits: u64) -> Self {
        let mask = FW_FIELD_MAX as u64;
        Self {
            major: (bits & mask) as u16,
            minor: (bits >> 10 & mask) as u16,
            patch: (bits >> 20 & mask) as u16,
            build: (bits >> 30 & mask) as u16,
        }
    }
}

impl LrVersion {
    pub fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for FwVersion {
    type Err = MidError;

    /// Parses `"2.0.4.201"`
    fn from_str(s: &str) -> Result<Self> {
        let fields = parse_fields(s, 4)?;
        let mut out = [0u16; 4];
        for (slot, value) in out.iter_mut().zip(fields) {
            if value > FW_FIELD_MAX as u32 {
                return Err(MidError::ParseVersion(format!(
                    "{:?}: field {} exceeds {}",
                    s, value, FW_FIELD_MAX
                )));
            }
            *slot = value as u16;
        }
        Ok(Self {
            major: out[0],
            minor: out[1],
            patch: out[2],
            build: out[3],
        })
    }
}

impl FromStr for LrVersion {
    type Err = MidError;

    /// Parses `"v1.2.3"` or `"1.2.3"`
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.strip_prefix('v').unwrap_or(s);
        let fields = parse_fields(trimmed, 3)?;
        let mut out = [0u8; 3];
        for (slot, value) in out.iter_mut().zip(fields) {
            *slot = u8::try_from(value).map_err(|_| {
                MidError::ParseVersion(format!("{:?}: field {} exceeds 255", s, value))
            })?;
        }
        Ok(Self::new(out[0], out[1], out[2]))
    }
}

fn parse_fields(s: &str, count: usize) -> Result<Vec<u32>> {
    let fields = s
        .split('.')
        .map(|part| {
            part.parse::<u32>()
                .map_err(|e| MidError::ParseVersion(format!("{:?}: {}", s, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    if fields.len() != count {
        return Err(MidError::ParseVersion(format!(
            "{:?}: expected {} fields, got {}",
            s,
            count,
            fields.len()
        )));
    }
    Ok(fields)
}

impl fmt::Display for FwVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.patch, self.build)
    }
}

impl fmt::Display for LrVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
