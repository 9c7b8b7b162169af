//! Confirmed-request handler skeleton.
//!
//! The service codecs in [`crate::service`] only encode and decode parameter lists; they
//! never touch an object. This module is the thin glue the reference implementation
//! repeats, by hand, once per service: decode the request body, classify the target
//! object, dispatch to an [`ObjectDatabase`], and turn the outcome into the [`Apdu`] a
//! caller sends back — a complex/simple ack on success, a BACnet error on a rejected
//! object/property, or an abort when the request can't be serviced at all.
//!
//! Only Read-Property, Write-Property, and Read-Property-Multiple have a handler here;
//! every other confirmed service (`SubscribeCOV`, atomic file access, reinitialize-device,
//! …) is a fully-implemented codec but has no opinion about what an embedding should *do*
//! with the decoded request, since nothing in [`ObjectDatabase`] names a matching
//! operation for them.

#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::app::Apdu;
use crate::object::{ErrorClass, ErrorCode, ObjectDatabase};
use crate::service::{
    AbortReason, ConfirmedServiceRequest, ReadAccessResult, ReadPropertyMultipleResponse,
    ReadPropertyRequest, ReadPropertyResponse, WritePropertyRequest, decode_confirmed_request,
};

/// Reads one property, the Read-Property half of the handler skeleton. A thin wrapper
/// over [`ReadPropertyResponse::build`] kept here so every handler entry point lives in
/// one place.
pub fn handle_read_property<D: ObjectDatabase>(
    database: &D,
    request: &ReadPropertyRequest,
) -> Result<ReadPropertyResponse, (ErrorClass, ErrorCode)> {
    ReadPropertyResponse::build(database, request)
}

/// Writes one property, the Write-Property half of the handler skeleton. A thin wrapper
/// over [`WritePropertyRequest::apply`].
pub fn handle_write_property<D: ObjectDatabase>(
    database: &mut D,
    request: &WritePropertyRequest,
) -> Result<(), (ErrorClass, ErrorCode)> {
    request.apply(database)
}

/// Builds a Read-Property-Multiple ack, expanding `All`/`Required`/`Optional` against
/// each named object's property-list descriptor and encoding the result bounded to
/// `max_apdu` (spec's "per-property buffer discipline": a reply that would not fit is an
/// abort, not a truncated ack).
pub fn handle_read_property_multiple<D: ObjectDatabase>(
    database: &D,
    request: &crate::service::ReadPropertyMultipleRequest,
    max_apdu: usize,
) -> Result<Vec<u8>, AbortReason> {
    let results: Vec<ReadAccessResult> = request
        .read_access_specifications
        .iter()
        .map(|spec| ReadAccessResult::build(database, spec))
        .collect();
    ReadPropertyMultipleResponse::new(results).encode_bounded(max_apdu)
}

/// Dispatches one confirmed request's service body against `database` and returns the
/// reply [`Apdu`] to send back, implementing §7's handler policy end to end:
///
/// - a service-body decode failure (malformed tags, an unrecognized service choice) maps
///   to `Apdu::Reject`, echoing `invoke_id`;
/// - Read-Property/Write-Property/Read-Property-Multiple dispatch through
///   [`handle_read_property`]/[`handle_write_property`]/[`handle_read_property_multiple`]
///   and become a complex ack, a simple ack, or `Apdu::Error` on an object/property
///   rejection;
/// - an RPM ack that would exceed `max_apdu` becomes `Apdu::Abort` instead of a truncated
///   reply;
/// - every other confirmed service this crate can decode but has no object-database
///   operation for (`SubscribeCOV`, atomic file access, reinitialize-device, …) is
///   acknowledged as understood-but-unactionable with `Apdu::Abort { abort_reason: Other }`
///   rather than silently dropped — an embedding that wants to actually service one of
///   these matches `ConfirmedServiceRequest` itself instead of calling this dispatcher.
pub fn dispatch_confirmed_request<D: ObjectDatabase>(
    database: &mut D,
    invoke_id: u8,
    service_choice: u8,
    service_data: &[u8],
    max_apdu: usize,
) -> Apdu {
    let request = match decode_confirmed_request(service_choice, service_data) {
        Ok(request) => request,
        Err(reject_reason) => {
            return Apdu::Reject {
                invoke_id,
                reject_reason: reject_reason as u8,
            };
        }
    };

    match request {
        ConfirmedServiceRequest::ReadProperty(request) => {
            match handle_read_property(database, &request) {
                Ok(response) => {
                    let mut service_data = Vec::new();
                    match response.encode(&mut service_data) {
                        Ok(()) => Apdu::ComplexAck {
                            invoke_id,
                            service_choice,
                            service_data,
                        },
                        Err(_) => abort(invoke_id, AbortReason::Other),
                    }
                }
                Err((error_class, error_code)) => {
                    error_reply(invoke_id, service_choice, error_class, error_code)
                }
            }
        }

        ConfirmedServiceRequest::WriteProperty(request) => {
            match handle_write_property(database, &request) {
                Ok(()) => Apdu::SimpleAck {
                    invoke_id,
                    service_choice,
                },
                Err((error_class, error_code)) => {
                    error_reply(invoke_id, service_choice, error_class, error_code)
                }
            }
        }

        ConfirmedServiceRequest::ReadPropertyMultiple(request) => {
            match handle_read_property_multiple(database, &request, max_apdu) {
                Ok(service_data) => Apdu::ComplexAck {
                    invoke_id,
                    service_choice,
                    service_data,
                },
                Err(abort_reason) => abort(invoke_id, abort_reason),
            }
        }

        _ => abort(invoke_id, AbortReason::Other),
    }
}

fn abort(invoke_id: u8, abort_reason: AbortReason) -> Apdu {
    Apdu::Abort {
        server: true,
        invoke_id,
        abort_reason: abort_reason as u8,
    }
}

fn error_reply(
    invoke_id: u8,
    service_choice: u8,
    error_class: ErrorClass,
    error_code: ErrorCode,
) -> Apdu {
    Apdu::Error {
        invoke_id,
        service_choice,
        error_class: u32::from(error_class) as u8,
        error_code: u32::from(error_code) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::ApplicationData;
    use crate::object::{ObjectIdentifier, ObjectType, PropertyIdentifier, PropertyList};
    use crate::service::{PropertyReference, ReadAccessSpecification, ReadPropertyMultipleRequest};

    #[cfg(not(feature = "std"))]
    use alloc::{vec, string::String};

    /// A minimal in-memory object database: one Device and one Analog-Input, enough to
    /// exercise the handler skeleton end to end without pretending to be a full object
    /// store.
    struct TestDatabase {
        present_value: f32,
        write_log: Vec<(PropertyIdentifier, f32)>,
    }

    impl TestDatabase {
        fn new() -> Self {
            Self {
                present_value: 21.0,
                write_log: Vec::new(),
            }
        }
    }

    impl ObjectDatabase for TestDatabase {
        type Address = ();

        fn object_property_lists(&self, object_type: ObjectType) -> PropertyList {
            match object_type {
                ObjectType::AnalogInput => PropertyList::new(
                    vec![PropertyIdentifier::ObjectIdentifier, PropertyIdentifier::PresentValue],
                    vec![PropertyIdentifier::Description],
                    vec![],
                ),
                _ => PropertyList::default(),
            }
        }

        fn object_encode_property(
            &self,
            object_type: ObjectType,
            instance: u32,
            property: PropertyIdentifier,
            _array_index: Option<u32>,
            out_buf: &mut Vec<u8>,
        ) -> Result<usize, (ErrorClass, ErrorCode)> {
            if object_type != ObjectType::AnalogInput || instance != 1 {
                return Err((ErrorClass::Object, ErrorCode::UnknownObject));
            }
            match property {
                PropertyIdentifier::PresentValue => {
                    ApplicationData::Real(self.present_value)
                        .encode(out_buf)
                        .map_err(|_| (ErrorClass::Property, ErrorCode::Other))?;
                    Ok(out_buf.len())
                }
                PropertyIdentifier::Description => {
                    ApplicationData::CharacterString(String::from("test point"))
                        .encode(out_buf)
                        .map_err(|_| (ErrorClass::Property, ErrorCode::Other))?;
                    Ok(out_buf.len())
                }
                _ => Err((ErrorClass::Property, ErrorCode::UnknownProperty)),
            }
        }

        fn object_write_property(
            &mut self,
            object_type: ObjectType,
            instance: u32,
            property: PropertyIdentifier,
            _array_index: Option<u32>,
            value: &ApplicationData,
            _priority: Option<u8>,
        ) -> Result<(), (ErrorClass, ErrorCode)> {
            if object_type != ObjectType::AnalogInput || instance != 1 {
                return Err((ErrorClass::Object, ErrorCode::UnknownObject));
            }
            if property != PropertyIdentifier::PresentValue {
                return Err((ErrorClass::Property, ErrorCode::WriteAccessDenied));
            }
            match value {
                ApplicationData::Real(v) => {
                    self.present_value = *v;
                    self.write_log.push((property, *v));
                    Ok(())
                }
                _ => Err((ErrorClass::Property, ErrorCode::InvalidDataType)),
            }
        }

        fn object_valid_instance(&self, object_type: ObjectType, instance: u32) -> bool {
            object_type == ObjectType::AnalogInput && instance == 1
        }

        fn device_instance_number(&self) -> u32 {
            123
        }

        fn datalink_send_pdu(&mut self, _destination: &(), _buffer: &[u8]) -> Option<usize> {
            None
        }

        fn datalink_get_my_address(&self) {}

        fn datalink_get_broadcast_address(&self) {}
    }

    #[test]
    fn read_property_dispatches_to_complex_ack() {
        let database = TestDatabase::new();
        let request = ReadPropertyRequest::new(
            ObjectIdentifier::new(ObjectType::AnalogInput, 1),
            PropertyIdentifier::PresentValue,
        );
        let mut service_data = Vec::new();
        request.encode(&mut service_data).unwrap();

        let mut database = database;
        let reply = dispatch_confirmed_request(&mut database, 7, 12, &service_data, 1476);
        match reply {
            Apdu::ComplexAck { invoke_id, service_choice, service_data } => {
                assert_eq!(invoke_id, 7);
                assert_eq!(service_choice, 12);
                let response = ReadPropertyResponse::decode(&service_data).unwrap();
                assert_eq!(response.property_value, ApplicationData::Real(21.0));
            }
            other => panic!("expected ComplexAck, got {:?}", other),
        }
    }

    #[test]
    fn read_property_unknown_instance_is_an_error_reply() {
        let mut database = TestDatabase::new();
        let request = ReadPropertyRequest::new(
            ObjectIdentifier::new(ObjectType::AnalogInput, 99),
            PropertyIdentifier::PresentValue,
        );
        let mut service_data = Vec::new();
        request.encode(&mut service_data).unwrap();

        let reply = dispatch_confirmed_request(&mut database, 1, 12, &service_data, 1476);
        match reply {
            Apdu::Error { error_class, error_code, .. } => {
                assert_eq!(error_class, u32::from(ErrorClass::Object) as u8);
                assert_eq!(error_code, u32::from(ErrorCode::UnknownObject) as u8);
            }
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[test]
    fn read_property_unsupported_object_type_is_an_error_reply_before_database_is_consulted() {
        let mut database = TestDatabase::new();
        let request = ReadPropertyRequest::new(
            ObjectIdentifier::new(ObjectType::from(100u16), 1),
            PropertyIdentifier::PresentValue,
        );
        let mut service_data = Vec::new();
        request.encode(&mut service_data).unwrap();

        let reply = dispatch_confirmed_request(&mut database, 1, 12, &service_data, 1476);
        match reply {
            Apdu::Error { error_class, error_code, .. } => {
                assert_eq!(error_class, u32::from(ErrorClass::Object) as u8);
                assert_eq!(error_code, u32::from(ErrorCode::UnsupportedObjectType) as u8);
            }
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[test]
    fn write_property_applies_and_acks() {
        let mut database = TestDatabase::new();
        let request = WritePropertyRequest::new(
            ObjectIdentifier::new(ObjectType::AnalogInput, 1),
            PropertyIdentifier::PresentValue,
            ApplicationData::Real(42.0),
        );
        let mut service_data = Vec::new();
        request.encode(&mut service_data).unwrap();

        let reply = dispatch_confirmed_request(&mut database, 3, 15, &service_data, 1476);
        assert_eq!(
            reply,
            Apdu::SimpleAck {
                invoke_id: 3,
                service_choice: 15
            }
        );
        assert_eq!(database.present_value, 42.0);
        assert_eq!(database.write_log, vec![(PropertyIdentifier::PresentValue, 42.0)]);
    }

    #[test]
    fn write_property_wrong_type_is_an_error_reply() {
        let mut database = TestDatabase::new();
        let request = WritePropertyRequest::new(
            ObjectIdentifier::new(ObjectType::AnalogInput, 1),
            PropertyIdentifier::Description,
            ApplicationData::Real(1.0),
        );
        let mut service_data = Vec::new();
        request.encode(&mut service_data).unwrap();

        let reply = dispatch_confirmed_request(&mut database, 4, 15, &service_data, 1476);
        match reply {
            Apdu::Error { error_class, error_code, .. } => {
                assert_eq!(error_class, u32::from(ErrorClass::Property) as u8);
                assert_eq!(error_code, u32::from(ErrorCode::WriteAccessDenied) as u8);
            }
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[test]
    fn read_property_multiple_expands_required_and_acks() {
        let mut database = TestDatabase::new();
        let mut spec = ReadAccessSpecification::new(
            ObjectIdentifier::new(ObjectType::AnalogInput, 1),
            Vec::new(),
        );
        spec.add_property(PropertyReference::new(PropertyIdentifier::Required));
        let request = ReadPropertyMultipleRequest::new(vec![spec]);
        let mut service_data = Vec::new();
        request.encode(&mut service_data).unwrap();

        let reply = dispatch_confirmed_request(&mut database, 9, 14, &service_data, 1476);
        match reply {
            Apdu::ComplexAck { service_data, .. } => {
                let response = ReadPropertyMultipleResponse::decode(&service_data).unwrap();
                assert_eq!(response.results.len(), 1);
                assert_eq!(response.results[0].results.len(), 2);
            }
            other => panic!("expected ComplexAck, got {:?}", other),
        }
    }

    #[test]
    fn read_property_multiple_aborts_when_it_would_exceed_max_apdu() {
        let mut database = TestDatabase::new();
        let mut spec = ReadAccessSpecification::new(
            ObjectIdentifier::new(ObjectType::AnalogInput, 1),
            Vec::new(),
        );
        spec.add_property(PropertyReference::new(PropertyIdentifier::Required));
        let request = ReadPropertyMultipleRequest::new(vec![spec]);
        let mut service_data = Vec::new();
        request.encode(&mut service_data).unwrap();

        let reply = dispatch_confirmed_request(&mut database, 2, 14, &service_data, 4);
        assert_eq!(
            reply,
            Apdu::Abort {
                server: true,
                invoke_id: 2,
                abort_reason: AbortReason::SegmentationNotSupported as u8,
            }
        );
    }

    #[test]
    fn malformed_request_is_rejected() {
        let mut database = TestDatabase::new();
        let reply = dispatch_confirmed_request(&mut database, 5, 12, &[], 1476);
        match reply {
            Apdu::Reject { invoke_id, .. } => assert_eq!(invoke_id, 5),
            other => panic!("expected Reject, got {:?}", other),
        }
    }

    #[test]
    fn unimplemented_service_aborts_rather_than_silently_dropping() {
        let mut database = TestDatabase::new();
        // ReinitializeDevice (choice 20) is fully decodable but has no handler here.
        let mut service_data = Vec::new();
        crate::service::ReinitializeDeviceRequest::new(
            crate::service::ReinitializedState::WarmStart,
        )
        .encode(&mut service_data)
        .unwrap();

        let reply = dispatch_confirmed_request(&mut database, 6, 20, &service_data, 1476);
        assert_eq!(
            reply,
            Apdu::Abort {
                server: true,
                invoke_id: 6,
                abort_reason: AbortReason::Other as u8,
            }
        );
    }
}
