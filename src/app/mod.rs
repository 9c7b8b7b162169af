//! APDU header codec.
//!
//! The application layer forms and parses Application Protocol Data Units (APDUs):
//! the outermost envelope that carries a BACnet service request or response. This
//! module implements the eight PDU type headers of clause 20.1 and invoke-id
//! bookkeeping for confirmed-service transactions.
//!
//! Segmentation and segment reassembly are not implemented. A confirmed-request or
//! complex-ack header with its segmented flag set decodes successfully (the header
//! fields are still meaningful) but [`Apdu::decode`] returns
//! [`ApplicationError::SegmentationNotSupported`] rather than producing a PDU an
//! embedder could act on, since this crate has no buffer across which to reassemble
//! segments.

#[cfg(feature = "std")]
use std::error::Error;

#[cfg(feature = "std")]
use std::fmt;

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

/// Result type for application layer operations
#[cfg(feature = "std")]
pub type Result<T> = std::result::Result<T, ApplicationError>;

#[cfg(not(feature = "std"))]
pub type Result<T> = core::result::Result<T, ApplicationError>;

/// Errors that can occur in application layer operations
#[derive(Debug, Clone, PartialEq)]
pub enum ApplicationError {
    /// Invalid APDU format
    InvalidApdu(String),
    /// Unsupported APDU type
    UnsupportedApduType,
    /// A segmented confirmed request or complex ack was received
    SegmentationNotSupported,
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::InvalidApdu(msg) => write!(f, "invalid APDU: {}", msg),
            ApplicationError::UnsupportedApduType => write!(f, "unsupported APDU type"),
            ApplicationError::SegmentationNotSupported => write!(f, "segmentation not supported"),
        }
    }
}

#[cfg(feature = "std")]
impl Error for ApplicationError {}

/// APDU types, clause 20.1.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ApduType {
    ConfirmedRequest = 0,
    UnconfirmedRequest = 1,
    SimpleAck = 2,
    ComplexAck = 3,
    SegmentAck = 4,
    Error = 5,
    Reject = 6,
    Abort = 7,
}

/// Application Protocol Data Unit
#[derive(Debug, Clone, PartialEq)]
pub enum Apdu {
    /// Confirmed service request
    ConfirmedRequest {
        segmented_response_accepted: bool,
        max_segments: MaxSegments,
        max_response_size: MaxApduSize,
        invoke_id: u8,
        service_choice: u8,
        service_data: Vec<u8>,
    },

    /// Unconfirmed service request
    UnconfirmedRequest { service_choice: u8, service_data: Vec<u8> },

    /// Simple acknowledgment
    SimpleAck { invoke_id: u8, service_choice: u8 },

    /// Complex acknowledgment
    ComplexAck {
        invoke_id: u8,
        service_choice: u8,
        service_data: Vec<u8>,
    },

    /// Error PDU
    Error {
        invoke_id: u8,
        service_choice: u8,
        error_class: u8,
        error_code: u8,
    },

    /// Reject PDU
    Reject { invoke_id: u8, reject_reason: u8 },

    /// Abort PDU
    Abort {
        server: bool,
        invoke_id: u8,
        abort_reason: u8,
    },
}

/// Maximum segments that can be accepted, clause 20.1.2.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxSegments {
    Unspecified = 0,
    Two = 1,
    Four = 2,
    Eight = 3,
    Sixteen = 4,
    ThirtyTwo = 5,
    SixtyFour = 6,
    GreaterThan64 = 7,
}

/// Maximum APDU size that can be accepted, clause 20.1.2.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxApduSize {
    Up50 = 0,
    Up128 = 1,
    Up206 = 2,
    Up480 = 3,
    Up1024 = 4,
    Up1476 = 5,
}

impl MaxApduSize {
    /// The actual size in bytes this enumerated value represents.
    pub fn size(&self) -> usize {
        match self {
            MaxApduSize::Up50 => 50,
            MaxApduSize::Up128 => 128,
            MaxApduSize::Up206 => 206,
            MaxApduSize::Up480 => 480,
            MaxApduSize::Up1024 => 1024,
            MaxApduSize::Up1476 => 1476,
        }
    }
}

impl Apdu {
    /// Encodes this APDU's header and service data.
    ///
    /// Encoding a segmented confirmed request or complex ack (an embedder choosing to
    /// construct one directly) is not rejected here — only decoding reports
    /// `SegmentationNotSupported`, since this crate never originates segmented PDUs itself.
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::new();

        match self {
            Apdu::ConfirmedRequest {
                segmented_response_accepted,
                max_segments,
                max_response_size,
                invoke_id,
                service_choice,
                service_data,
            } => {
                let mut pdu_type = (ApduType::ConfirmedRequest as u8) << 4;
                if *segmented_response_accepted {
                    pdu_type |= 0x02;
                }
                buffer.push(pdu_type);
                buffer.push(((*max_segments as u8) << 4) | (*max_response_size as u8));
                buffer.push(*invoke_id);
                buffer.push(*service_choice);
                buffer.extend_from_slice(service_data);
            }

            Apdu::UnconfirmedRequest { service_choice, service_data } => {
                buffer.push((ApduType::UnconfirmedRequest as u8) << 4);
                buffer.push(*service_choice);
                buffer.extend_from_slice(service_data);
            }

            Apdu::SimpleAck { invoke_id, service_choice } => {
                buffer.push((ApduType::SimpleAck as u8) << 4);
                buffer.push(*invoke_id);
                buffer.push(*service_choice);
            }

            Apdu::ComplexAck { invoke_id, service_choice, service_data } => {
                buffer.push((ApduType::ComplexAck as u8) << 4);
                buffer.push(*invoke_id);
                buffer.push(*service_choice);
                buffer.extend_from_slice(service_data);
            }

            Apdu::Error { invoke_id, service_choice, error_class, error_code } => {
                buffer.push((ApduType::Error as u8) << 4);
                buffer.push(*invoke_id);
                buffer.push(*service_choice);
                buffer.push(*error_class);
                buffer.push(*error_code);
            }

            Apdu::Reject { invoke_id, reject_reason } => {
                buffer.push((ApduType::Reject as u8) << 4);
                buffer.push(*invoke_id);
                buffer.push(*reject_reason);
            }

            Apdu::Abort { server, invoke_id, abort_reason } => {
                let mut pdu_type = (ApduType::Abort as u8) << 4;
                if *server {
                    pdu_type |= 0x01;
                }
                buffer.push(pdu_type);
                buffer.push(*invoke_id);
                buffer.push(*abort_reason);
            }
        }

        buffer
    }

    /// Decodes an APDU header and its trailing service data.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(ApplicationError::InvalidApdu("empty APDU".into()));
        }

        let pdu_type_byte = data[0];
        let pdu_type_raw = (pdu_type_byte >> 4) & 0x0F;
        let pdu_type = match pdu_type_raw {
            0 => ApduType::ConfirmedRequest,
            1 => ApduType::UnconfirmedRequest,
            2 => ApduType::SimpleAck,
            3 => ApduType::ComplexAck,
            4 => ApduType::SegmentAck,
            5 => ApduType::Error,
            6 => ApduType::Reject,
            7 => ApduType::Abort,
            _ => return Err(ApplicationError::UnsupportedApduType),
        };

        match pdu_type {
            ApduType::ConfirmedRequest => {
                if (pdu_type_byte & 0x08) != 0 {
                    return Err(ApplicationError::SegmentationNotSupported);
                }
                if data.len() < 4 {
                    return Err(ApplicationError::InvalidApdu("confirmed request too short".into()));
                }

                let segmented_response_accepted = (pdu_type_byte & 0x02) != 0;

                let max_info = data[1];
                let max_segments = match (max_info >> 4) & 0x07 {
                    0 => MaxSegments::Unspecified,
                    1 => MaxSegments::Two,
                    2 => MaxSegments::Four,
                    3 => MaxSegments::Eight,
                    4 => MaxSegments::Sixteen,
                    5 => MaxSegments::ThirtyTwo,
                    6 => MaxSegments::SixtyFour,
                    _ => MaxSegments::GreaterThan64,
                };

                let max_response_size = match max_info & 0x0F {
                    0 => MaxApduSize::Up50,
                    1 => MaxApduSize::Up128,
                    2 => MaxApduSize::Up206,
                    3 => MaxApduSize::Up480,
                    4 => MaxApduSize::Up1024,
                    _ => MaxApduSize::Up1476,
                };

                let invoke_id = data[2];
                let service_choice = data[3];
                let service_data = data.get(4..).unwrap_or(&[]).to_vec();

                Ok(Apdu::ConfirmedRequest {
                    segmented_response_accepted,
                    max_segments,
                    max_response_size,
                    invoke_id,
                    service_choice,
                    service_data,
                })
            }

            ApduType::UnconfirmedRequest => {
                if data.len() < 2 {
                    return Err(ApplicationError::InvalidApdu("unconfirmed request too short".into()));
                }
                let service_choice = data[1];
                let service_data = data.get(2..).unwrap_or(&[]).to_vec();
                Ok(Apdu::UnconfirmedRequest { service_choice, service_data })
            }

            ApduType::SimpleAck => {
                if data.len() < 3 {
                    return Err(ApplicationError::InvalidApdu("simple ack too short".into()));
                }
                Ok(Apdu::SimpleAck { invoke_id: data[1], service_choice: data[2] })
            }

            ApduType::ComplexAck => {
                if (pdu_type_byte & 0x08) != 0 {
                    return Err(ApplicationError::SegmentationNotSupported);
                }
                if data.len() < 3 {
                    return Err(ApplicationError::InvalidApdu("complex ack too short".into()));
                }
                let invoke_id = data[1];
                let service_choice = data[2];
                let service_data = data.get(3..).unwrap_or(&[]).to_vec();
                Ok(Apdu::ComplexAck { invoke_id, service_choice, service_data })
            }

            ApduType::SegmentAck => Err(ApplicationError::SegmentationNotSupported),

            ApduType::Error => {
                if data.len() < 5 {
                    return Err(ApplicationError::InvalidApdu("error PDU too short".into()));
                }
                Ok(Apdu::Error {
                    invoke_id: data[1],
                    service_choice: data[2],
                    error_class: data[3],
                    error_code: data[4],
                })
            }

            ApduType::Reject => {
                if data.len() < 3 {
                    return Err(ApplicationError::InvalidApdu("reject PDU too short".into()));
                }
                Ok(Apdu::Reject { invoke_id: data[1], reject_reason: data[2] })
            }

            ApduType::Abort => {
                if data.len() < 3 {
                    return Err(ApplicationError::InvalidApdu("abort PDU too short".into()));
                }
                let server = (pdu_type_byte & 0x01) != 0;
                Ok(Apdu::Abort { server, invoke_id: data[1], abort_reason: data[2] })
            }
        }
    }
}

/// Tracks in-flight invoke IDs for confirmed-service transactions.
#[derive(Debug)]
pub struct InvokeIdManager {
    next_id: u8,
    active_ids: Vec<u8>,
}

impl InvokeIdManager {
    pub fn new() -> Self {
        Self { next_id: 0, active_ids: Vec::new() }
    }

    /// Allocates the next free invoke ID, wrapping at 256. Returns `None` once every
    /// value 0..=255 is already active.
    pub fn next_id(&mut self) -> Option<u8> {
        let start_id = self.next_id;

        loop {
            if !self.active_ids.contains(&self.next_id) {
                let id = self.next_id;
                self.active_ids.push(id);
                self.next_id = self.next_id.wrapping_add(1);
                return Some(id);
            }

            self.next_id = self.next_id.wrapping_add(1);

            if self.next_id == start_id {
                return None;
            }
        }
    }

    /// Releases an invoke ID once its transaction is complete.
    pub fn release_id(&mut self, id: u8) {
        self.active_ids.retain(|&x| x != id);
    }

    /// Whether a given invoke ID currently has an in-flight transaction.
    pub fn is_active(&self, id: u8) -> bool {
        self.active_ids.contains(&id)
    }
}

impl Default for InvokeIdManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfirmed_request_round_trips() {
        let apdu = Apdu::UnconfirmedRequest {
            service_choice: 8,
            service_data: vec![0x08, 0x7B, 0x18, 0x7B],
        };

        let encoded = apdu.encode();
        let decoded = Apdu::decode(&encoded).unwrap();
        assert_eq!(decoded, apdu);
    }

    #[test]
    fn simple_ack_round_trips() {
        let apdu = Apdu::SimpleAck { invoke_id: 42, service_choice: 12 };
        let encoded = apdu.encode();
        let decoded = Apdu::decode(&encoded).unwrap();
        assert_eq!(decoded, apdu);
    }

    #[test]
    fn confirmed_request_round_trips() {
        let apdu = Apdu::ConfirmedRequest {
            segmented_response_accepted: true,
            max_segments: MaxSegments::Unspecified,
            max_response_size: MaxApduSize::Up1476,
            invoke_id: 123,
            service_choice: 12,
            service_data: vec![0x0C, 0x02, 0x00, 0x00, 0x08, 0x19, 0x55],
        };

        let encoded = apdu.encode();
        let decoded = Apdu::decode(&encoded).unwrap();
        assert_eq!(decoded, apdu);
    }

    #[test]
    fn segmented_confirmed_request_reports_not_supported() {
        let mut data = Apdu::ConfirmedRequest {
            segmented_response_accepted: false,
            max_segments: MaxSegments::Unspecified,
            max_response_size: MaxApduSize::Up1476,
            invoke_id: 1,
            service_choice: 12,
            service_data: vec![],
        }
        .encode();
        data[0] |= 0x08;
        assert_eq!(Apdu::decode(&data), Err(ApplicationError::SegmentationNotSupported));
    }

    #[test]
    fn error_and_reject_and_abort_round_trip() {
        let error = Apdu::Error { invoke_id: 1, service_choice: 12, error_class: 2, error_code: 31 };
        assert_eq!(Apdu::decode(&error.encode()).unwrap(), error);

        let reject = Apdu::Reject { invoke_id: 2, reject_reason: 9 };
        assert_eq!(Apdu::decode(&reject.encode()).unwrap(), reject);

        let abort = Apdu::Abort { server: true, invoke_id: 3, abort_reason: 5 };
        assert_eq!(Apdu::decode(&abort.encode()).unwrap(), abort);
    }

    #[test]
    fn max_apdu_size_values() {
        assert_eq!(MaxApduSize::Up50.size(), 50);
        assert_eq!(MaxApduSize::Up1476.size(), 1476);
    }

    #[test]
    fn invoke_id_manager_allocates_distinct_ids_and_releases() {
        let mut manager = InvokeIdManager::new();
        let id1 = manager.next_id().unwrap();
        let id2 = manager.next_id().unwrap();
        assert_ne!(id1, id2);
        assert!(manager.is_active(id1));

        manager.release_id(id1);
        assert!(!manager.is_active(id1));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn proptest_simple_ack_round_trips(invoke_id in any::<u8>(), service_choice in any::<u8>()) {
            let apdu = Apdu::SimpleAck { invoke_id, service_choice };
            prop_assert_eq!(Apdu::decode(&apdu.encode()).unwrap(), apdu);
        }

        #[test]
        fn proptest_complex_ack_round_trips(
            invoke_id in any::<u8>(),
            service_choice in any::<u8>(),
            service_data in prop::collection::vec(any::<u8>(), 0..32),
        ) {
            let apdu = Apdu::ComplexAck { invoke_id, service_choice, service_data };
            prop_assert_eq!(Apdu::decode(&apdu.encode()).unwrap(), apdu);
        }

        #[test]
        fn proptest_unconfirmed_request_round_trips(
            service_choice in any::<u8>(),
            service_data in prop::collection::vec(any::<u8>(), 0..32),
        ) {
            let apdu = Apdu::UnconfirmedRequest { service_choice, service_data };
            prop_assert_eq!(Apdu::decode(&apdu.encode()).unwrap(), apdu);
        }

        #[test]
        fn proptest_error_round_trips(
            invoke_id in any::<u8>(),
            service_choice in any::<u8>(),
            error_class in any::<u8>(),
            error_code in any::<u8>(),
        ) {
            let apdu = Apdu::Error { invoke_id, service_choice, error_class, error_code };
            prop_assert_eq!(Apdu::decode(&apdu.encode()).unwrap(), apdu);
        }

        #[test]
        fn proptest_truncated_simple_ack_fails_cleanly(invoke_id in any::<u8>(), service_choice in any::<u8>()) {
            let apdu = Apdu::SimpleAck { invoke_id, service_choice };
            let buffer = apdu.encode();
            for k in 0..buffer.len() {
                prop_assert!(Apdu::decode(&buffer[..k]).is_err());
            }
        }
    }
}
