//! Tests for point lookups and session scans

use std::path::Path;

use midlts::page::RECORDS_PER_PAGE;
use midlts::{
    AuthSource, AuthType, Config, FwVersion, LrVersion, ManualClock, MeterFlags, MidError,
    MidLog, Payload, Position, SessionId,
};
use tempfile::TempDir;

const T0: u64 = 1_700_000_000_000;

fn open_log(dir: &Path, clock: &ManualClock) -> MidLog<ManualClock> {
    let config = Config::builder().data_dir(dir).max_pages(4).build();
    MidLog::init(
        config,
        FwVersion::new(3, 1, 0, 12).unwrap(),
        LrVersion::new(1, 0, 0),
        clock.clone(),
    )
    .unwrap()
}

// =============================================================================
// Point Lookups
// =============================================================================

#[test]
fn test_read_record_by_position() {
    let temp = TempDir::new().unwrap();
    let clock = ManualClock::new(T0);
    let mut log = open_log(temp.path(), &clock);

    let open = log.add_open(MeterFlags::TIME_SYNCHRONIZED, 42).unwrap();
    let id = log.add_id([0xab; 16]).unwrap();

    let record = log.read_record(open.position).unwrap();
    assert_eq!(record, open.record);
    assert!(record.meter_value().unwrap().is_start());

    let record = log.read_record(id.position).unwrap();
    assert_eq!(record.payload, Payload::Identity(SessionId([0xab; 16])));
    assert_eq!(record.sequence_id, 1);
}

#[test]
fn test_read_record_past_end_is_eof() {
    let temp = TempDir::new().unwrap();
    let clock = ManualClock::new(T0);
    let mut log = open_log(temp.path(), &clock);
    log.add_tariff(MeterFlags::NONE, 1).unwrap();

    let err = log.read_record(Position::new(0, 32)).unwrap_err();
    assert!(matches!(err, MidError::Eof { page: 0, offset: 32 }));
}

#[test]
fn test_read_record_on_missing_page() {
    let temp = TempDir::new().unwrap();
    let clock = ManualClock::new(T0);
    let log = open_log(temp.path(), &clock);

    let err = log.read_record(Position::new(2, 0)).unwrap_err();
    assert!(matches!(err, MidError::Stat { page: 2, .. }));
}

// =============================================================================
// Session Scans
// =============================================================================

#[test]
fn test_read_session_across_page_boundary() {
    let temp = TempDir::new().unwrap();
    let clock = ManualClock::new(T0);
    let mut log = open_log(temp.path(), &clock);

    for i in 0..RECORDS_PER_PAGE - 2 {
        log.add_tariff(MeterFlags::NONE, i as u32).unwrap();
    }
    let open = log.add_open(MeterFlags::NONE, 1_000).unwrap();
    log.add_id([0x11; 16]).unwrap();
    let auth = log
        .add_auth(AuthSource::Iso15118, AuthType::Evccid, b"00:11:22:33:44:55")
        .unwrap();
    clock.advance(60_000);
    log.add_tariff(MeterFlags::NONE, 1_500).unwrap();
    clock.advance(60_000);
    log.add_close(MeterFlags::NONE, 2_000).unwrap();

    assert_eq!(open.position, Position::new(0, 4032));
    assert_eq!(auth.position, Position::new(1, 0));

    let session = log.read_session(open.position).unwrap();
    assert!(session.is_complete());
    assert_eq!(session.anchor(), Some(open.position));
    assert_eq!(session.id(), Some(&SessionId([0x11; 16])));
    assert_eq!(session.auth().unwrap().source, AuthSource::Iso15118);
    assert_eq!(session.fw_version(), Some(FwVersion::new(3, 1, 0, 12).unwrap()));

    let meters: Vec<u32> = session.events().iter().map(|mv| mv.meter).collect();
    assert_eq!(meters, vec![1_000, 1_500, 2_000]);
    assert_eq!(session.events()[2].time_ms, T0 + 120_000);

    // Same content as the live view
    assert_eq!(session.events(), log.active_session().events());
}

#[test]
fn test_read_historical_session() {
    let temp = TempDir::new().unwrap();
    let clock = ManualClock::new(T0);
    let mut log = open_log(temp.path(), &clock);

    let first = log.add_open(MeterFlags::NONE, 10).unwrap();
    log.add_close(MeterFlags::NONE, 20).unwrap();
    log.add_open(MeterFlags::NONE, 30).unwrap();
    log.add_id([5u8; 16]).unwrap();
    log.add_close(MeterFlags::NONE, 40).unwrap();

    let session = log.read_session(first.position).unwrap();
    let meters: Vec<u32> = session.events().iter().map(|mv| mv.meter).collect();
    assert_eq!(meters, vec![10, 20]);
    assert!(session.id().is_none());
}

#[test]
fn test_read_open_session_is_eof() {
    let temp = TempDir::new().unwrap();
    let clock = ManualClock::new(T0);
    let mut log = open_log(temp.path(), &clock);

    let open = log.add_open(MeterFlags::NONE, 0).unwrap();
    log.add_tariff(MeterFlags::NONE, 5).unwrap();

    let err = log.read_session(open.position).unwrap_err();
    assert!(matches!(err, MidError::Eof { page: 0, offset: 64 }));
}

#[test]
fn test_read_session_must_start_at_start_reading() {
    let temp = TempDir::new().unwrap();
    let clock = ManualClock::new(T0);
    let mut log = open_log(temp.path(), &clock);

    let tariff = log.add_tariff(MeterFlags::NONE, 5).unwrap();
    let open = log.add_open(MeterFlags::NONE, 10).unwrap();
    let id = log.add_id([4u8; 16]).unwrap();
    let close = log.add_close(MeterFlags::NONE, 20).unwrap();

    for position in [tariff.position, id.position, close.position] {
        let err = log.read_session(position).unwrap_err();
        assert!(
            matches!(err, MidError::NotSessionStart { page, offset }
                if page == position.page && offset == position.offset),
            "position {} gave {:?}",
            position,
            err
        );
    }

    let session = log.read_session(open.position).unwrap();
    let meters: Vec<u32> = session.events().iter().map(|mv| mv.meter).collect();
    assert_eq!(meters, vec![10, 20]);
}

#[test]
fn test_read_session_at_dangling_position() {
    let temp = TempDir::new().unwrap();
    let clock = ManualClock::new(T0);
    let mut log = open_log(temp.path(), &clock);
    log.add_open(MeterFlags::NONE, 0).unwrap();

    let err = log.read_session(Position::new(3, 0)).unwrap_err();
    assert!(matches!(err, MidError::Stat { page: 3, .. }));
}

#[test]
fn test_read_session_survives_restart() {
    let temp = TempDir::new().unwrap();
    let clock = ManualClock::new(T0);
    let anchor;

    {
        let mut log = open_log(temp.path(), &clock);
        anchor = log.add_open(MeterFlags::NONE, 100).unwrap().position;
        log.add_auth(AuthSource::Rfid, AuthType::Rfid, b"cafe").unwrap();
        log.add_close(MeterFlags::NONE, 300).unwrap();
    }

    let log = open_log(temp.path(), &clock);
    let session = log.read_session(anchor).unwrap();
    assert_eq!(session.auth().unwrap().tag(), b"cafe");
    assert_eq!(session.events().len(), 2);
}
