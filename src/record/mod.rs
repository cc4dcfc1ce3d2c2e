//! Record Module
//!
//! Fixed-size, CRC-protected log records.
//!
//! ## Responsibilities
//! - Typed representation of the three record kinds
//! - Fixed 32-byte little-endian encoding
//! - CRC32 integrity check with the all-ones sentinel convention
//!
//! ## Wire Format
//! ```text
//! ┌──────────┬──────────────┬──────────┬──────────────────────────┐
//! │ Kind (1) │ Sequence (4) │ CRC (4)  │ Payload (23)             │
//! └──────────┴──────────────┴──────────┴──────────────────────────┘
//!
//! Identity:   uuid (16) | zero padding (7)
//! Auth:       source (1) | type (1) | length (1) | tag (20)
//! MeterValue: lr (3) | fw (5, 4×10 bits) | time ms (6) | flags (2)
//!             | meter Wh (4) | zero padding (3)
//! ```

mod codec;
mod format;
mod version;

use serde::{Deserialize, Serialize};
use zeroize::DefaultIsZeroes;

use crate::error::{MidError, Result};

pub use codec::{checksum, decode, encode, CRC_SENTINEL, RECORD_SIZE};
pub use version::{FwVersion, LrVersion};

/// Largest auth tag that fits a record
pub const AUTH_TAG_SIZE: usize = 20;

/// Largest timestamp representable in the 48-bit time field
pub const MAX_TIME_MS: u64 = (1 << 48) - 1;

// =============================================================================
// Record
// =============================================================================

/// One immutable log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Global sequence number, +1 per record across all pages
    pub sequence_id: u32,
    /// CRC32 of the encoded record with this field held at [`CRC_SENTINEL`]
    pub crc: u32,
    pub payload: Payload,
}

/// Record payload, tagged by kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    Identity(SessionId),
    Auth(Auth),
    MeterValue(MeterValue),
}

/// Kind byte stored at offset 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RecordKind {
    Identity = 0,
    Auth = 1,
    MeterValue = 2,
}

impl Record {
    /// Build a record and compute its CRC
    pub fn new(sequence_id: u32, payload: Payload) -> Self {
        let mut record = Self {
            sequence_id,
            crc: CRC_SENTINEL,
            payload,
        };
        record.crc = codec::compute_crc(&record);
        record
    }

    pub fn kind(&self) -> RecordKind {
        match self.payload {
            Payload::Identity(_) => RecordKind::Identity,
            Payload::Auth(_) => RecordKind::Auth,
            Payload::MeterValue(_) => RecordKind::MeterValue,
        }
    }

    pub fn meter_value(&self) -> Option<&MeterValue> {
        match &self.payload {
            Payload::MeterValue(mv) => Some(mv),
            _ => None,
        }
    }
}

impl TryFrom<u8> for RecordKind {
    type Error = MidError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(RecordKind::Identity),
            1 => Ok(RecordKind::Auth),
            2 => Ok(RecordKind::MeterValue),
            other => Err(MidError::Corrupt(format!("unknown record kind {}", other))),
        }
    }
}

// =============================================================================
// Identity
// =============================================================================

/// Opaque 16-byte session UUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct SessionId(pub [u8; 16]);

impl SessionId {
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

// Default is all zeroes
impl DefaultIsZeroes for SessionId {}

impl From<[u8; 16]> for SessionId {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Where an authorization came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum AuthSource {
    #[default]
    Unknown = 0,
    Rfid = 1,
    Ble = 2,
    Cloud = 3,
    Iso15118 = 4,
}

/// How the auth tag should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum AuthType {
    #[default]
    Unknown = 0,
    Rfid = 1,
    Uuid = 2,
    Emaid = 3,
    Evccid = 4,
    String = 5,
}

impl TryFrom<u8> for AuthSource {
    type Error = MidError;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => AuthSource::Unknown,
            1 => AuthSource::Rfid,
            2 => AuthSource::Ble,
            3 => AuthSource::Cloud,
            4 => AuthSource::Iso15118,
            other => return Err(MidError::Corrupt(format!("unknown auth source {}", other))),
        })
    }
}

impl TryFrom<u8> for AuthType {
    type Error = MidError;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => AuthType::Unknown,
            1 => AuthType::Rfid,
            2 => AuthType::Uuid,
            3 => AuthType::Emaid,
            4 => AuthType::Evccid,
            5 => AuthType::String,
            other => return Err(MidError::Corrupt(format!("unknown auth type {}", other))),
        })
    }
}

/// Customer authorization attached to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Auth {
    pub source: AuthSource,
    pub kind: AuthType,
    length: u8,
    tag: [u8; AUTH_TAG_SIZE],
}

impl DefaultIsZeroes for Auth {}

impl Auth {
    /// Build an auth entry, rejecting tags longer than [`AUTH_TAG_SIZE`]
    pub fn new(source: AuthSource, kind: AuthType, data: &[u8]) -> Result<Self> {
        if data.len() > AUTH_TAG_SIZE {
            return Err(MidError::BadArg(format!(
                "auth tag is {} bytes, max {}",
                data.len(),
                AUTH_TAG_SIZE
            )));
        }
        let mut tag = [0u8; AUTH_TAG_SIZE];
        tag[..data.len()].copy_from_slice(data);
        Ok(Self {
            source,
            kind,
            length: data.len() as u8,
            tag,
        })
    }

    /// The meaningful bytes of the tag
    pub fn tag(&self) -> &[u8] {
        &self.tag[..self.length as usize]
    }

    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub(crate) fn raw_tag(&self) -> &[u8; AUTH_TAG_SIZE] {
        &self.tag
    }

    pub(crate) fn from_raw(
        source: AuthSource,
        kind: AuthType,
        length: u8,
        tag: [u8; AUTH_TAG_SIZE],
    ) -> Result<Self> {
        if length as usize > AUTH_TAG_SIZE {
            return Err(MidError::Corrupt(format!("auth length {} exceeds tag", length)));
        }
        Ok(Self {
            source,
            kind,
            length,
            tag,
        })
    }
}

// =============================================================================
// Meter Value
// =============================================================================

/// Reading-kind and quality bits of a meter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct MeterFlags(u16);

impl MeterFlags {
    pub const NONE: Self = Self(0x0);
    pub const START: Self = Self(0x1);
    pub const TARIFF: Self = Self(0x2);
    pub const END: Self = Self(0x4);
    pub const TIME_UNKNOWN: Self = Self(0x8);
    pub const TIME_INFORMATIVE: Self = Self(0x10);
    pub const TIME_SYNCHRONIZED: Self = Self(0x20);
    pub const TIME_RELATIVE: Self = Self(0x40);
    pub const METER_ERROR: Self = Self(0x80);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr for MeterFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for MeterFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A legally relevant energy reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MeterValue {
    pub lr_version: LrVersion,
    pub fw_version: FwVersion,
    /// Milliseconds since the UNIX epoch, 48 bits on disk
    pub time_ms: u64,
    pub flags: MeterFlags,
    /// Meter reading in Wh
    pub meter: u32,
}

impl DefaultIsZeroes for MeterValue {}

impl MeterValue {
    pub fn is_start(&self) -> bool {
        self.flags.contains(MeterFlags::START)
    }

    pub fn is_tariff(&self) -> bool {
        self.flags.contains(MeterFlags::TARIFF)
    }

    pub fn is_end(&self) -> bool {
        self.flags.contains(MeterFlags::END)
    }
}
