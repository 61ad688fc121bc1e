use std::fmt;

use airlink_model::ApScanInfo;

use crate::error::ProtocolError;

/// Tag carried by every record on the inbound channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EventTag {
    StationConnected = 1,
    StationConnectFailed = 2,
    StationDisconnected = 3,
    SoftApStationJoined = 4,
    SoftApStationLeft = 5,
    ScanFailed = 6,
    ScanFragment = 7,
    Terminate = 8,
}

impl TryFrom<u32> for EventTag {
    type Error = ProtocolError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Ok(match raw {
            1 => EventTag::StationConnected,
            2 => EventTag::StationConnectFailed,
            3 => EventTag::StationDisconnected,
            4 => EventTag::SoftApStationJoined,
            5 => EventTag::SoftApStationLeft,
            6 => EventTag::ScanFailed,
            7 => EventTag::ScanFragment,
            8 => EventTag::Terminate,
            other => return Err(ProtocolError::UnknownTag(other)),
        })
    }
}

impl fmt::Display for EventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventTag::StationConnected => "station-connected",
            EventTag::StationConnectFailed => "station-connect-failed",
            EventTag::StationDisconnected => "station-disconnected",
            EventTag::SoftApStationJoined => "soft-ap-station-joined",
            EventTag::SoftApStationLeft => "soft-ap-station-left",
            EventTag::ScanFailed => "scan-failed",
            EventTag::ScanFragment => "scan-fragment",
            EventTag::Terminate => "terminate",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RecordPayload {
    #[default]
    Empty,
    AccessPoint(ApScanInfo),
}

/// Fixed-shape record exchanged over an event channel.
///
/// Producers fill `len` with [`EventRecord::WIRE_LEN`]; anything else is a
/// truncated or foreign record and fails to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub tag: u32,
    pub payload: RecordPayload,
    pub more: bool,
    pub len: usize,
}

impl EventRecord {
    pub const WIRE_LEN: usize = std::mem::size_of::<EventRecord>();

    pub fn new(tag: EventTag) -> Self {
        Self {
            tag: tag as u32,
            payload: RecordPayload::Empty,
            more: false,
            len: Self::WIRE_LEN,
        }
    }

    pub fn scan_fragment(access_point: ApScanInfo, more: bool) -> Self {
        Self {
            tag: EventTag::ScanFragment as u32,
            payload: RecordPayload::AccessPoint(access_point),
            more,
            len: Self::WIRE_LEN,
        }
    }

    pub fn terminate() -> Self {
        Self::new(EventTag::Terminate)
    }

    pub fn decode(self) -> Result<Event, ProtocolError> {
        if self.len != Self::WIRE_LEN {
            return Err(ProtocolError::BadLength {
                expected: Self::WIRE_LEN,
                actual: self.len,
            });
        }

        let event = match EventTag::try_from(self.tag)? {
            EventTag::StationConnected => Event::StationConnected,
            EventTag::StationConnectFailed => Event::StationConnectFailed,
            EventTag::StationDisconnected => Event::StationDisconnected,
            EventTag::SoftApStationJoined => Event::SoftApStationJoined,
            EventTag::SoftApStationLeft => Event::SoftApStationLeft,
            EventTag::ScanFailed => Event::ScanFailed,
            EventTag::Terminate => Event::Terminate,
            EventTag::ScanFragment => match self.payload {
                RecordPayload::AccessPoint(access_point) => Event::ScanFragment {
                    access_point,
                    more: self.more,
                },
                RecordPayload::Empty => {
                    return Err(ProtocolError::MissingPayload(self.tag));
                }
            },
        };
        Ok(event)
    }
}

/// Decoded inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StationConnected,
    StationConnectFailed,
    StationDisconnected,
    SoftApStationJoined,
    SoftApStationLeft,
    ScanFailed,
    ScanFragment { access_point: ApScanInfo, more: bool },
    Terminate,
}

#[cfg(test)]
mod tests {
    use airlink_model::MacAddress;

    use super::*;

    #[test]
    fn fragment_decodes_with_flag() {
        let ap = ApScanInfo::new("lab", MacAddress::new([2; 6]), 1);
        let event = EventRecord::scan_fragment(ap.clone(), true).decode().unwrap();
        assert_eq!(
            event,
            Event::ScanFragment {
                access_point: ap,
                more: true
            }
        );
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut record = EventRecord::new(EventTag::ScanFailed);
        record.tag = 99;
        assert_eq!(record.decode(), Err(ProtocolError::UnknownTag(99)));
    }

    #[test]
    fn undersized_record_is_rejected() {
        let mut record = EventRecord::new(EventTag::StationConnected);
        record.len = 4;
        assert_eq!(
            record.decode(),
            Err(ProtocolError::BadLength {
                expected: EventRecord::WIRE_LEN,
                actual: 4,
            })
        );
    }

    #[test]
    fn fragment_without_payload_is_rejected() {
        let record = EventRecord::new(EventTag::ScanFragment);
        assert_eq!(
            record.decode(),
            Err(ProtocolError::MissingPayload(EventTag::ScanFragment as u32))
        );
    }
}
