//! Tests for the record codec
//!
//! These tests verify:
//! - Encode → decode returns the same record for every kind
//! - A single flipped byte is rejected with BadCrc
//! - Auth tag length limits
//! - Fixed 32-byte size

use midlts::record::{
    decode, encode, Auth, AuthSource, AuthType, FwVersion, LrVersion, MeterFlags, MeterValue,
    Payload, Record, RecordKind, SessionId, AUTH_TAG_SIZE, RECORD_SIZE,
};
use midlts::MidError;

// =============================================================================
// Helper Functions
// =============================================================================

fn identity_record() -> Record {
    let mut uuid = [0u8; 16];
    for (i, b) in uuid.iter_mut().enumerate() {
        *b = i as u8 * 17;
    }
    Record::new(1, Payload::Identity(SessionId(uuid)))
}

fn auth_record() -> Record {
    let auth = Auth::new(AuthSource::Iso15118, AuthType::Emaid, b"DE*ABC*E123456*7").unwrap();
    Record::new(2, Payload::Auth(auth))
}

fn meter_record() -> Record {
    Record::new(
        u32::MAX - 1,
        Payload::MeterValue(MeterValue {
            lr_version: LrVersion::new(1, 2, 3),
            fw_version: FwVersion::new(1023, 0, 4, 201).unwrap(),
            time_ms: (1 << 48) - 1,
            flags: MeterFlags::END | MeterFlags::TIME_INFORMATIVE | MeterFlags::METER_ERROR,
            meter: u32::MAX,
        }),
    )
}

fn all_kinds() -> Vec<Record> {
    vec![identity_record(), auth_record(), meter_record()]
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_roundtrip_every_kind() {
    for record in all_kinds() {
        let bytes = encode(&record);
        assert_eq!(bytes.len(), RECORD_SIZE);

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.crc, record.crc);
    }
}

#[test]
fn test_kind_byte_matches_payload() {
    assert_eq!(encode(&identity_record())[0], RecordKind::Identity as u8);
    assert_eq!(encode(&auth_record())[0], RecordKind::Auth as u8);
    assert_eq!(encode(&meter_record())[0], RecordKind::MeterValue as u8);
}

#[test]
fn test_encoding_is_deterministic() {
    let a = encode(&meter_record());
    let b = encode(&meter_record());
    assert_eq!(a, b);
}

#[test]
fn test_empty_auth_tag_roundtrip() {
    let auth = Auth::new(AuthSource::Unknown, AuthType::Unknown, &[]).unwrap();
    let record = Record::new(0, Payload::Auth(auth));

    let decoded = decode(&encode(&record)).unwrap();
    match decoded.payload {
        Payload::Auth(a) => {
            assert!(a.is_empty());
            assert_eq!(a.tag(), &[] as &[u8]);
        }
        _ => panic!("Expected auth payload"),
    }
}

#[test]
fn test_full_auth_tag_roundtrip() {
    let tag = [0xA5u8; AUTH_TAG_SIZE];
    let auth = Auth::new(AuthSource::Cloud, AuthType::String, &tag).unwrap();
    let record = Record::new(9, Payload::Auth(auth));

    let decoded = decode(&encode(&record)).unwrap();
    match decoded.payload {
        Payload::Auth(a) => assert_eq!(a.tag(), &tag),
        _ => panic!("Expected auth payload"),
    }
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_flipped_byte_is_bad_crc_for_every_kind() {
    for record in all_kinds() {
        let clean = encode(&record);
        for i in 0..RECORD_SIZE {
            let mut bytes = clean;
            bytes[i] ^= 0x01;
            let err = decode(&bytes).unwrap_err();
            assert!(
                matches!(err, MidError::BadCrc { .. }),
                "kind {:?} byte {} gave {:?}",
                record.kind(),
                i,
                err
            );
        }
    }
}

#[test]
fn test_zeroed_record_is_rejected() {
    let err = decode(&[0u8; RECORD_SIZE]).unwrap_err();
    assert!(matches!(err, MidError::BadCrc { .. }));
}

#[test]
fn test_erased_flash_pattern_is_rejected() {
    let err = decode(&[0xFFu8; RECORD_SIZE]).unwrap_err();
    assert!(err.is_integrity());
}

// =============================================================================
// Argument Validation Tests
// =============================================================================

#[test]
fn test_auth_tag_too_long() {
    let err = Auth::new(AuthSource::Rfid, AuthType::Rfid, &[0u8; AUTH_TAG_SIZE + 1]).unwrap_err();
    assert!(matches!(err, MidError::BadArg(_)));
}

#[test]
fn test_fw_version_field_limit() {
    assert!(FwVersion::new(1024, 0, 0, 0).is_err());
    assert!(FwVersion::new(1023, 1023, 1023, 1023).is_ok());
}
