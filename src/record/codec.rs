//! Record codec
//!
//! Encodes records into their fixed 32-byte layout and decodes them back,
//! verifying the CRC on the way in.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{MidError, Result};

use super::{
    Auth, AuthSource, AuthType, FwVersion, LrVersion, MeterFlags, MeterValue, Payload, Record,
    RecordKind, SessionId, AUTH_TAG_SIZE, MAX_TIME_MS,
};

/// Size of every encoded record
pub const RECORD_SIZE: usize = 32;

/// Value held in the CRC slot while the checksum is computed
pub const CRC_SENTINEL: u32 = 0xFFFF_FFFF;

/// Byte range of the CRC field
const CRC_RANGE: std::ops::Range<usize> = 5..9;

/// Encode a record, computing and embedding its CRC
pub fn encode(record: &Record) -> [u8; RECORD_SIZE] {
    let mut out = layout(record);
    let crc = checksum(&out);
    out[CRC_RANGE].copy_from_slice(&crc.to_le_bytes());
    out
}

/// Decode a record, failing with `BadCrc` if the stored checksum mismatches
pub fn decode(bytes: &[u8]) -> Result<Record> {
    let raw: [u8; RECORD_SIZE] = bytes.try_into().map_err(|_| {
        MidError::Corrupt(format!(
            "record is {} bytes, expected {}",
            bytes.len(),
            RECORD_SIZE
        ))
    })?;

    let stored = u32::from_le_bytes([raw[5], raw[6], raw[7], raw[8]]);
    let mut sentinel = raw;
    sentinel[CRC_RANGE].copy_from_slice(&CRC_SENTINEL.to_le_bytes());
    let computed = checksum(&sentinel);
    if stored != computed {
        return Err(MidError::BadCrc { stored, computed });
    }

    let mut buf = &raw[..];
    let kind = RecordKind::try_from(buf.get_u8())?;
    let sequence_id = buf.get_u32_le();
    let _crc = buf.get_u32_le();

    let payload = match kind {
        RecordKind::Identity => {
            let mut uuid = [0u8; 16];
            buf.copy_to_slice(&mut uuid);
            Payload::Identity(SessionId(uuid))
        }
        RecordKind::Auth => {
            let source = AuthSource::try_from(buf.get_u8())?;
            let auth_type = AuthType::try_from(buf.get_u8())?;
            let length = buf.get_u8();
            let mut tag = [0u8; AUTH_TAG_SIZE];
            buf.copy_to_slice(&mut tag);
            Payload::Auth(Auth::from_raw(source, auth_type, length, tag)?)
        }
        RecordKind::MeterValue => {
            let lr_version = LrVersion::new(buf.get_u8(), buf.get_u8(), buf.get_u8());
            let fw_version = FwVersion::unpack(buf.get_uint_le(5));
            let time_ms = buf.get_uint_le(6);
            let flags = MeterFlags::from_bits(buf.get_u16_le());
            let meter = buf.get_u32_le();
            Payload::MeterValue(MeterValue {
                lr_version,
                fw_version,
                time_ms,
                flags,
                meter,
            })
        }
    };

    Ok(Record {
        sequence_id,
        crc: stored,
        payload,
    })
}

/// CRC32 over an encoded record
pub fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// CRC a record would carry once encoded
pub(super) fn compute_crc(record: &Record) -> u32 {
    checksum(&layout(record))
}

/// Lay out all fields with the CRC slot holding the sentinel
fn layout(record: &Record) -> [u8; RECORD_SIZE] {
    let mut buf = BytesMut::with_capacity(RECORD_SIZE);
    buf.put_u8(record.kind() as u8);
    buf.put_u32_le(record.sequence_id);
    buf.put_u32_le(CRC_SENTINEL);

    match &record.payload {
        Payload::Identity(id) => {
            buf.put_slice(id.as_bytes());
        }
        Payload::Auth(auth) => {
            buf.put_u8(auth.source as u8);
            buf.put_u8(auth.kind as u8);
            buf.put_u8(auth.len() as u8);
            buf.put_slice(auth.raw_tag());
        }
        Payload::MeterValue(mv) => {
            buf.put_u8(mv.lr_version.major);
            buf.put_u8(mv.lr_version.minor);
            buf.put_u8(mv.lr_version.patch);
            buf.put_uint_le(mv.fw_version.pack(), 5);
            buf.put_uint_le(mv.time_ms & MAX_TIME_MS, 6);
            buf.put_u16_le(mv.flags.bits());
            buf.put_u32_le(mv.meter);
        }
    }

    // Zero padding up to the fixed size
    buf.resize(RECORD_SIZE, 0);

    let mut out = [0u8; RECORD_SIZE];
    out.copy_from_slice(&buf);
    out
}
