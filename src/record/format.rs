//! Human-readable record formatting for logs

use std::fmt;

use super::{Auth, AuthSource, AuthType, MeterFlags, MeterValue, Payload, Record, SessionId};

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.payload {
            Payload::Identity(_) => "SessionId ",
            Payload::Auth(_) => "Auth      ",
            Payload::MeterValue(_) => "MeterValue",
        };
        write!(f, "{} - #{:08} - CRC {:08x} - ", kind, self.sequence_id, self.crc)?;
        match &self.payload {
            Payload::Identity(id) => write!(f, "{}", id),
            Payload::Auth(auth) => write!(f, "{}", auth),
            Payload::MeterValue(mv) => write!(f, "{}", mv),
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            write!(f, "{:02x}", byte)?;
            if matches!(i, 3 | 5 | 7 | 9) {
                f.write_str("-")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for AuthSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthSource::Unknown => "Unknown",
            AuthSource::Rfid => "RFID",
            AuthSource::Ble => "BLE",
            AuthSource::Cloud => "Cloud",
            AuthSource::Iso15118 => "ISO15118",
        })
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthType::Unknown => "Unknown",
            AuthType::Rfid => "RFID",
            AuthType::Uuid => "UUID",
            AuthType::Emaid => "EMAID",
            AuthType::Evccid => "EVCCID",
            AuthType::String => "String",
        })
    }
}

impl fmt::Display for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ", self.source, self.kind)?;
        for byte in self.tag() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Display for MeterFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LETTERS: [(MeterFlags, char); 8] = [
            (MeterFlags::START, 'S'),
            (MeterFlags::TARIFF, 'T'),
            (MeterFlags::END, 'E'),
            (MeterFlags::TIME_UNKNOWN, 'U'),
            (MeterFlags::TIME_INFORMATIVE, 'I'),
            (MeterFlags::TIME_SYNCHRONIZED, 'Y'),
            (MeterFlags::TIME_RELATIVE, 'R'),
            (MeterFlags::METER_ERROR, 'M'),
        ];
        for (flag, letter) in LETTERS {
            if self.contains(flag) {
                write!(f, "{}", letter)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for MeterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FW {} / LR {} - {:013} / {:08} - {}",
            self.fw_version, self.lr_version, self.time_ms, self.meter, self.flags
        )
    }
}
