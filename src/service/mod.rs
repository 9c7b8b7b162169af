//! BACnet Application Layer Services
//!
//! This module implements the confirmed and unconfirmed service bodies defined by
//! ASHRAE Standard 135 clause 13-16: the parameter lists that ride inside a
//! `ConfirmedRequest`/`UnconfirmedRequest`/`ComplexAck`'s `service_data` (see
//! [`crate::app::Apdu`]). Services are the fundamental communication primitives that
//! enable devices to interact in a BACnet network: reading and writing properties,
//! subscribing to change-of-value notifications, discovering devices, transferring
//! files, and synchronizing time.
//!
//! # Overview
//!
//! This module does not frame a PDU (that is [`crate::app::Apdu`]'s job) and does not
//! store or execute anything against an object (that is [`crate::object::ObjectDatabase`]'s
//! job). It only encodes and decodes the service-specific parameter sequence.
//!
//! # Service Categories
//!
//! - **Object Access**: [`ReadPropertyRequest`]/[`ReadPropertyResponse`],
//!   [`ReadPropertyMultipleRequest`]/[`ReadPropertyMultipleResponse`], [`WritePropertyRequest`]
//! - **Change of Value**: [`SubscribeCovRequest`], [`SubscribeCovPropertyRequest`],
//!   [`CovNotificationRequest`]
//! - **Device Discovery**: [`WhoIsRequest`], [`IAmRequest`], [`WhoHasRequest`], [`IHaveRequest`]
//! - **File Access**: [`AtomicReadFileRequest`]/[`AtomicReadFileResponse`],
//!   [`AtomicWriteFileRequest`]/[`AtomicWriteFileResponse`]
//! - **Device Management**: [`ReinitializeDeviceRequest`], [`TimeSynchronizationRequest`],
//!   [`UtcTimeSynchronizationRequest`]
//!
//! # Examples
//!
//! ## Reading a Property
//!
//! ```rust
//! use bacnet_apdu::service::{ConfirmedServiceChoice, ReadPropertyRequest};
//! use bacnet_apdu::object::{ObjectIdentifier, ObjectType, PropertyIdentifier};
//!
//! let object_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
//! let request = ReadPropertyRequest::new(object_id, PropertyIdentifier::PresentValue);
//!
//! let service_choice = ConfirmedServiceChoice::ReadProperty;
//! let mut buffer = Vec::new();
//! request.encode(&mut buffer).unwrap();
//! ```
//!
//! ## Device Discovery
//!
//! ```rust
//! use bacnet_apdu::service::{UnconfirmedServiceChoice, WhoIsRequest};
//!
//! let who_is = WhoIsRequest::new();
//! let service_choice = UnconfirmedServiceChoice::WhoIs;
//! ```
//!
//! # Error Handling
//!
//! ```rust
//! use bacnet_apdu::service::ServiceError;
//!
//! let error = ServiceError::InvalidParameters("missing required parameter".to_string());
//!
//! match error {
//!     ServiceError::UnsupportedService => println!("Service not supported"),
//!     ServiceError::InvalidParameters(msg) => println!("Invalid parameters: {}", msg),
//!     ServiceError::Timeout => println!("Request timed out"),
//!     ServiceError::EncodingError(msg) => println!("Encoding error: {}", msg),
//!     _ => println!("Other error: {:?}", error),
//! }
//! ```

#[cfg(feature = "std")]
use std::error::Error;

#[cfg(feature = "std")]
use std::fmt;

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(not(feature = "std"))]
use alloc::{format, string::String, string::ToString, vec, vec::Vec};

use crate::encoding::{
    decode_application_enumerated, decode_application_object_id, decode_application_unsigned,
    decode_context_date, decode_context_enumerated, decode_context_object_id,
    decode_context_time, decode_context_unsigned, encode_application_enumerated,
    encode_application_object_id, encode_application_unsigned, encode_context_date,
    encode_context_enumerated, encode_context_object_id, encode_context_time,
    encode_context_unsigned, is_closing, is_opening, skip_constructed, ApplicationData, Date,
    EncodingError, Result as EncodingResult, Time,
};
use crate::encoding::context::{decode_context_boolean, decode_context_tag_header, encode_context_boolean, encode_closing_tag, encode_opening_tag};
use crate::object::{ErrorClass, ErrorCode, ObjectIdentifier, ObjectType, PropertyIdentifier, PropertyList};

/// Result type for service operations
#[cfg(feature = "std")]
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(not(feature = "std"))]
pub type Result<T> = core::result::Result<T, ServiceError>;

/// Errors that can occur during service operations
#[derive(Debug)]
pub enum ServiceError {
    /// Service is not supported
    UnsupportedService,
    /// Invalid service parameters
    InvalidParameters(String),
    /// Service timeout
    Timeout,
    /// Service rejected by remote device
    Rejected(RejectReason),
    /// Service aborted by remote device
    Aborted(AbortReason),
    /// Property-level error reported by the object database
    PropertyError(ErrorClass, ErrorCode),
    /// Encoding/decoding error
    EncodingError(String),
    /// Unsupported service choice
    UnsupportedServiceChoice(u8),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::UnsupportedService => write!(f, "Service not supported"),
            ServiceError::InvalidParameters(msg) => write!(f, "Invalid parameters: {}", msg),
            ServiceError::Timeout => write!(f, "Service timeout"),
            ServiceError::Rejected(reason) => write!(f, "Service rejected: {:?}", reason),
            ServiceError::Aborted(reason) => write!(f, "Service aborted: {:?}", reason),
            ServiceError::PropertyError(class, code) => {
                write!(f, "Property error: {} / {}", class, code)
            }
            ServiceError::EncodingError(msg) => write!(f, "Encoding error: {}", msg),
            ServiceError::UnsupportedServiceChoice(choice) => {
                write!(f, "Unsupported service choice: {}", choice)
            }
        }
    }
}

#[cfg(feature = "std")]
impl Error for ServiceError {}

impl From<EncodingError> for ServiceError {
    fn from(err: EncodingError) -> Self {
        ServiceError::EncodingError(format!("{}", err))
    }
}

/// Confirmed service choices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConfirmedServiceChoice {
    // Alarm and Event Services
    AcknowledgeAlarm = 0,
    ConfirmedEventNotification = 2,
    GetAlarmSummary = 3,
    GetEnrollmentSummary = 4,
    GetEventInformation = 29,

    // File Access Services
    AtomicReadFile = 6,
    AtomicWriteFile = 7,

    // Object Access Services
    AddListElement = 8,
    RemoveListElement = 9,
    CreateObject = 10,
    DeleteObject = 11,
    ReadProperty = 12,
    ReadPropertyMultiple = 14,
    WriteProperty = 15,
    WritePropertyMultiple = 16,

    // Remote Device Management Services
    DeviceCommunicationControl = 17,
    ReinitializeDevice = 20,

    // Virtual Terminal Services
    VtOpen = 21,
    VtClose = 22,
    VtData = 23,

    // Security Services
    Authenticate = 24,
    RequestKey = 25,

    // Other Services
    ReadRange = 26,
    SubscribeCOV = 5,
    SubscribeCOVProperty = 28,

    // Protocol Revision 30 - Security Services
    AuthRequest = 34,
}

impl TryFrom<u8> for ConfirmedServiceChoice {
    type Error = ServiceError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::AcknowledgeAlarm),
            2 => Ok(Self::ConfirmedEventNotification),
            3 => Ok(Self::GetAlarmSummary),
            4 => Ok(Self::GetEnrollmentSummary),
            29 => Ok(Self::GetEventInformation),
            6 => Ok(Self::AtomicReadFile),
            7 => Ok(Self::AtomicWriteFile),
            8 => Ok(Self::AddListElement),
            9 => Ok(Self::RemoveListElement),
            10 => Ok(Self::CreateObject),
            11 => Ok(Self::DeleteObject),
            12 => Ok(Self::ReadProperty),
            14 => Ok(Self::ReadPropertyMultiple),
            15 => Ok(Self::WriteProperty),
            16 => Ok(Self::WritePropertyMultiple),
            17 => Ok(Self::DeviceCommunicationControl),
            20 => Ok(Self::ReinitializeDevice),
            21 => Ok(Self::VtOpen),
            22 => Ok(Self::VtClose),
            23 => Ok(Self::VtData),
            24 => Ok(Self::Authenticate),
            25 => Ok(Self::RequestKey),
            26 => Ok(Self::ReadRange),
            5 => Ok(Self::SubscribeCOV),
            28 => Ok(Self::SubscribeCOVProperty),
            34 => Ok(Self::AuthRequest),
            _ => Err(ServiceError::UnsupportedServiceChoice(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UnconfirmedServiceChoice {
    IAm = 0,
    IHave = 1,
    UnconfirmedCOVNotification = 2,
    UnconfirmedEventNotification = 3,
    UnconfirmedPrivateTransfer = 4,
    UnconfirmedTextMessage = 5,
    TimeSynchronization = 6,
    WhoHas = 7,
    WhoIs = 8,
    UtcTimeSynchronization = 9,
    WriteGroup = 10,
    UnconfirmedCOVNotificationMultiple = 11,
    UnconfirmedAuditNotification = 12,
    WhoAmI = 13,
    YouAre = 14,
}

impl TryFrom<u8> for UnconfirmedServiceChoice {
    type Error = ServiceError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::IAm),
            1 => Ok(Self::IHave),
            2 => Ok(Self::UnconfirmedCOVNotification),
            3 => Ok(Self::UnconfirmedEventNotification),
            4 => Ok(Self::UnconfirmedPrivateTransfer),
            5 => Ok(Self::UnconfirmedTextMessage),
            6 => Ok(Self::TimeSynchronization),
            7 => Ok(Self::WhoHas),
            8 => Ok(Self::WhoIs),
            9 => Ok(Self::UtcTimeSynchronization),
            10 => Ok(Self::WriteGroup),
            11 => Ok(Self::UnconfirmedCOVNotificationMultiple),
            12 => Ok(Self::UnconfirmedAuditNotification),
            13 => Ok(Self::WhoAmI),
            14 => Ok(Self::YouAre),
            _ => Err(ServiceError::UnsupportedServiceChoice(value)),
        }
    }
}

/// Reject reason codes, clause 21.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Other = 0,
    BufferOverflow = 1,
    InconsistentParameters = 2,
    InvalidParameterDataType = 3,
    InvalidTag = 4,
    MissingRequiredParameter = 5,
    ParameterOutOfRange = 6,
    TooManyArguments = 7,
    UndefinedEnumeration = 8,
    UnrecognizedService = 9,
}

/// Abort reason codes, clause 21.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    Other = 0,
    BufferOverflow = 1,
    InvalidApduInThisState = 2,
    PreemptedByHigherPriorityTask = 3,
    SegmentationNotSupported = 4,
}

/// Maps a decode failure to the Reject/Abort reason a caller should send back, per the
/// error-handling policy: malformed input is rejected, a request this crate understands
/// but cannot service within its resource limits is aborted.
pub fn reject_reason_for(err: &EncodingError) -> RejectReason {
    match err {
        EncodingError::InvalidTag | EncodingError::WrongTag => RejectReason::InvalidTag,
        EncodingError::Truncated => RejectReason::MissingRequiredParameter,
        EncodingError::OutOfRange => RejectReason::ParameterOutOfRange,
        EncodingError::TooManyElements => RejectReason::TooManyArguments,
        EncodingError::BufferOverflow => RejectReason::BufferOverflow,
        EncodingError::InvalidFormat(_) => RejectReason::Other,
    }
}

/// Maps an object-database property error to the (class, code) pair an Error-PDU carries.
pub fn error_for_property_error(err: (ErrorClass, ErrorCode)) -> (ErrorClass, ErrorCode) {
    err
}

/// Special array index value indicating all elements / not an array.
pub const BACNET_ARRAY_ALL: u32 = 0xFFFFFFFF;

/// Upper bound on the number of elements this crate accumulates while decoding one
/// caller-bounded sequence (an RPM property-reference list, a COV notification's
/// property-value list). The reference implementation threads these as an in-band
/// linked list with no declared capacity; this crate uses a plain `Vec` instead, so the
/// bound exists only to fail cleanly (`TooManyElements`) on adversarial input that packs
/// an implausible number of tiny elements into one `max_apdu`-sized buffer, rather than
/// to work around a fixed-size backing array.
const MAX_SEQUENCE_ELEMENTS: usize = 512;

/// Who-Is request (unconfirmed service), clause 16.9.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WhoIsRequest {
    /// Low limit of device instance range (optional)
    pub device_instance_range_low_limit: Option<u32>,
    /// High limit of device instance range (optional)
    pub device_instance_range_high_limit: Option<u32>,
}

impl WhoIsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_device(device_instance: u32) -> Self {
        Self {
            device_instance_range_low_limit: Some(device_instance),
            device_instance_range_high_limit: Some(device_instance),
        }
    }

    pub fn for_range(low: u32, high: u32) -> Self {
        Self {
            device_instance_range_low_limit: Some(low),
            device_instance_range_high_limit: Some(high),
        }
    }

    /// Both limits are present together, or both absent (broadcast to all devices).
    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        if let (Some(low), Some(high)) = (
            self.device_instance_range_low_limit,
            self.device_instance_range_high_limit,
        ) {
            encode_context_unsigned(buffer, low, 0)?;
            encode_context_unsigned(buffer, high, 1)?;
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        if data.is_empty() {
            return Ok(Self::new());
        }

        let (low, consumed) = decode_context_unsigned(data, 0)?;
        let (high, _) = decode_context_unsigned(&data[consumed..], 1).map_err(|_| {
            EncodingError::InvalidFormat("Who-Is has low limit without high limit".to_string())
        })?;

        Ok(Self {
            device_instance_range_low_limit: Some(low),
            device_instance_range_high_limit: Some(high),
        })
    }

    /// Check if this request matches a device instance.
    pub fn matches(&self, device_instance: u32) -> bool {
        match (
            self.device_instance_range_low_limit,
            self.device_instance_range_high_limit,
        ) {
            (None, None) => true,
            (Some(low), Some(high)) => device_instance >= low && device_instance <= high,
            (Some(low), None) => device_instance >= low,
            (None, Some(high)) => device_instance <= high,
        }
    }
}

/// I-Am request (unconfirmed service), clause 16.10.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IAmRequest {
    pub device_identifier: ObjectIdentifier,
    pub max_apdu_length_accepted: u32,
    pub segmentation_supported: u32,
    pub vendor_identifier: u32,
}

impl IAmRequest {
    pub fn new(
        device_identifier: ObjectIdentifier,
        max_apdu_length_accepted: u32,
        segmentation_supported: u32,
        vendor_identifier: u32,
    ) -> Self {
        Self {
            device_identifier,
            max_apdu_length_accepted,
            segmentation_supported,
            vendor_identifier,
        }
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_application_object_id(
            buffer,
            u16::from(self.device_identifier.object_type),
            self.device_identifier.instance,
        )?;
        encode_application_unsigned(buffer, self.max_apdu_length_accepted)?;
        encode_application_enumerated(buffer, self.segmentation_supported)?;
        encode_application_unsigned(buffer, self.vendor_identifier)?;
        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;

        let ((object_type, instance), consumed) = decode_application_object_id(&data[pos..])?;
        let device_identifier = ObjectIdentifier::new(ObjectType::from(object_type), instance);
        pos += consumed;

        let (max_apdu_length_accepted, consumed) = decode_application_unsigned(&data[pos..])?;
        pos += consumed;

        let (segmentation_supported, consumed) = decode_application_enumerated(&data[pos..])?;
        pos += consumed;

        let (vendor_identifier, _) = decode_application_unsigned(&data[pos..])?;

        Ok(IAmRequest::new(
            device_identifier,
            max_apdu_length_accepted,
            segmentation_supported,
            vendor_identifier,
        ))
    }
}

/// Who-Has request (unconfirmed service), clause 16.8. Searches for an object either by
/// object identifier or by object name; exactly one of the two is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhoHasRequest {
    pub device_instance_range_low_limit: Option<u32>,
    pub device_instance_range_high_limit: Option<u32>,
    pub object: WhoHasObject,
}

/// The object selector carried by a [`WhoHasRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhoHasObject {
    Identifier(ObjectIdentifier),
    Name(String),
}

impl WhoHasRequest {
    pub fn by_identifier(object_identifier: ObjectIdentifier) -> Self {
        Self {
            device_instance_range_low_limit: None,
            device_instance_range_high_limit: None,
            object: WhoHasObject::Identifier(object_identifier),
        }
    }

    pub fn by_name(object_name: impl Into<String>) -> Self {
        Self {
            device_instance_range_low_limit: None,
            device_instance_range_high_limit: None,
            object: WhoHasObject::Name(object_name.into()),
        }
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        if let (Some(low), Some(high)) = (
            self.device_instance_range_low_limit,
            self.device_instance_range_high_limit,
        ) {
            encode_context_unsigned(buffer, low, 0)?;
            encode_context_unsigned(buffer, high, 1)?;
        }

        match &self.object {
            WhoHasObject::Identifier(object_id) => {
                encode_context_object_id(
                    buffer,
                    u16::from(object_id.object_type),
                    object_id.instance,
                    2,
                )?;
            }
            WhoHasObject::Name(name) => {
                crate::encoding::context::encode_context_character_string(buffer, name, 3)?;
            }
        }

        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;
        let mut low = None;
        let mut high = None;

        if let Ok((l, consumed)) = decode_context_unsigned(&data[pos..], 0) {
            let (h, consumed_h) = decode_context_unsigned(&data[pos + consumed..], 1)?;
            low = Some(l);
            high = Some(h);
            pos += consumed + consumed_h;
        }

        let object = if let Ok(((object_type, instance), _)) =
            decode_context_object_id(&data[pos..], 2)
        {
            WhoHasObject::Identifier(ObjectIdentifier::new(ObjectType::from(object_type), instance))
        } else {
            let (name, _) =
                crate::encoding::context::decode_context_character_string(&data[pos..], 3)?;
            WhoHasObject::Name(name)
        };

        Ok(Self {
            device_instance_range_low_limit: low,
            device_instance_range_high_limit: high,
            object,
        })
    }
}

/// I-Have request (unconfirmed service), clause 16.7. Announces that a device holds an
/// object matching a prior Who-Has search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IHaveRequest {
    pub device_identifier: ObjectIdentifier,
    pub object_identifier: ObjectIdentifier,
    pub object_name: String,
}

impl IHaveRequest {
    pub fn new(
        device_identifier: ObjectIdentifier,
        object_identifier: ObjectIdentifier,
        object_name: impl Into<String>,
    ) -> Self {
        Self {
            device_identifier,
            object_identifier,
            object_name: object_name.into(),
        }
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_application_object_id(
            buffer,
            u16::from(self.device_identifier.object_type),
            self.device_identifier.instance,
        )?;
        encode_application_object_id(
            buffer,
            u16::from(self.object_identifier.object_type),
            self.object_identifier.instance,
        )?;
        crate::encoding::encode_application_character_string(buffer, &self.object_name)?;
        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;

        let ((dev_type, dev_instance), consumed) = decode_application_object_id(&data[pos..])?;
        let device_identifier = ObjectIdentifier::new(ObjectType::from(dev_type), dev_instance);
        pos += consumed;

        let ((obj_type, obj_instance), consumed) = decode_application_object_id(&data[pos..])?;
        let object_identifier = ObjectIdentifier::new(ObjectType::from(obj_type), obj_instance);
        pos += consumed;

        let (object_name, _) = crate::encoding::decode_application_character_string(&data[pos..])?;

        Ok(Self::new(device_identifier, object_identifier, object_name))
    }
}

/// Read Property request (confirmed service), clause 15.5.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPropertyRequest {
    pub object_identifier: ObjectIdentifier,
    pub property_identifier: PropertyIdentifier,
    pub property_array_index: Option<u32>,
}

impl ReadPropertyRequest {
    pub fn new(object_identifier: ObjectIdentifier, property_identifier: PropertyIdentifier) -> Self {
        Self {
            object_identifier,
            property_identifier,
            property_array_index: None,
        }
    }

    pub fn with_array_index(
        object_identifier: ObjectIdentifier,
        property_identifier: PropertyIdentifier,
        array_index: u32,
    ) -> Self {
        Self {
            object_identifier,
            property_identifier,
            property_array_index: Some(array_index),
        }
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_context_object_id(
            buffer,
            u16::from(self.object_identifier.object_type),
            self.object_identifier.instance,
            0,
        )?;
        encode_context_enumerated(buffer, u32::from(self.property_identifier), 1)?;
        if let Some(array_index) = self.property_array_index {
            encode_context_unsigned(buffer, array_index, 2)?;
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;

        let ((object_type, instance), consumed) = decode_context_object_id(&data[pos..], 0)?;
        let object_identifier = ObjectIdentifier::new(ObjectType::from(object_type), instance);
        pos += consumed;

        let (property_identifier, consumed) = decode_context_enumerated(&data[pos..], 1)?;
        let property_identifier = PropertyIdentifier::from(property_identifier);
        pos += consumed;

        let property_array_index = match decode_context_unsigned(&data[pos..], 2) {
            Ok((array_index, _)) => Some(array_index),
            Err(_) => None,
        };

        Ok(Self {
            object_identifier,
            property_identifier,
            property_array_index,
        })
    }
}

/// Read Property response (confirmed service ack), clause 15.5.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPropertyResponse {
    pub object_identifier: ObjectIdentifier,
    pub property_identifier: PropertyIdentifier,
    pub property_array_index: Option<u32>,
    pub property_value: ApplicationData,
}

impl ReadPropertyResponse {
    pub fn new(
        object_identifier: ObjectIdentifier,
        property_identifier: PropertyIdentifier,
        property_value: ApplicationData,
    ) -> Self {
        Self {
            object_identifier,
            property_identifier,
            property_array_index: None,
            property_value,
        }
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_context_object_id(
            buffer,
            u16::from(self.object_identifier.object_type),
            self.object_identifier.instance,
            0,
        )?;
        encode_context_enumerated(buffer, u32::from(self.property_identifier), 1)?;
        if let Some(array_index) = self.property_array_index {
            encode_context_unsigned(buffer, array_index, 2)?;
        }
        encode_opening_tag(buffer, 3);
        self.property_value.encode(buffer)?;
        encode_closing_tag(buffer, 3);
        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;

        let ((object_type, instance), consumed) = decode_context_object_id(&data[pos..], 0)?;
        let object_identifier = ObjectIdentifier::new(ObjectType::from(object_type), instance);
        pos += consumed;

        let (property_identifier, consumed) = decode_context_enumerated(&data[pos..], 1)?;
        let property_identifier = PropertyIdentifier::from(property_identifier);
        pos += consumed;

        let property_array_index = match decode_context_unsigned(&data[pos..], 2) {
            Ok((array_index, consumed)) => {
                pos += consumed;
                if array_index == BACNET_ARRAY_ALL {
                    None
                } else {
                    Some(array_index)
                }
            }
            Err(_) => None,
        };

        if !is_opening(&data[pos..], 3) {
            return Err(EncodingError::InvalidTag);
        }
        let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
        pos += header_len;

        let (property_value, consumed) = ApplicationData::decode(&data[pos..])?;
        pos += consumed;

        if !is_closing(&data[pos..], 3) {
            return Err(EncodingError::InvalidTag);
        }

        Ok(ReadPropertyResponse {
            object_identifier,
            property_identifier,
            property_array_index,
            property_value,
        })
    }

    /// Builds a Read-Property ack by dispatching `request` against `database`, the
    /// confirmed-request handler skeleton: classify by object type, then ask the object
    /// database to encode the property. An unrecognized object type (the packed type
    /// field falling in the reserved gap between the standard and vendor ranges) is
    /// reported as `{Object, UnsupportedObjectType}` before the database is ever
    /// consulted; an unknown instance of a recognized type is `{Object, UnknownObject}`.
    pub fn build<D: crate::object::ObjectDatabase>(
        database: &D,
        request: &ReadPropertyRequest,
    ) -> core::result::Result<Self, (ErrorClass, ErrorCode)> {
        let object_id = request.object_identifier;
        if matches!(object_id.object_type, ObjectType::Reserved(_)) {
            return Err((ErrorClass::Object, ErrorCode::UnsupportedObjectType));
        }
        if !database.object_valid_instance(object_id.object_type, object_id.instance) {
            return Err((ErrorClass::Object, ErrorCode::UnknownObject));
        }

        let mut scratch = Vec::new();
        database.object_encode_property(
            object_id.object_type,
            object_id.instance,
            request.property_identifier,
            request.property_array_index,
            &mut scratch,
        )?;

        let (property_value, _) = ApplicationData::decode(&scratch)
            .map_err(|_| (ErrorClass::Property, ErrorCode::Other))?;

        Ok(ReadPropertyResponse {
            object_identifier: object_id,
            property_identifier: request.property_identifier,
            property_array_index: request.property_array_index,
            property_value,
        })
    }
}

/// Write Property request (confirmed service), clause 15.9.
#[derive(Debug, Clone, PartialEq)]
pub struct WritePropertyRequest {
    pub object_identifier: ObjectIdentifier,
    pub property_identifier: PropertyIdentifier,
    pub property_array_index: Option<u32>,
    pub property_value: ApplicationData,
    /// Write priority, 1 (highest) to 16 (lowest). See [`crate::util::priority`].
    pub priority: Option<u8>,
}

impl WritePropertyRequest {
    pub fn new(
        object_identifier: ObjectIdentifier,
        property_identifier: PropertyIdentifier,
        property_value: ApplicationData,
    ) -> Self {
        Self {
            object_identifier,
            property_identifier,
            property_array_index: None,
            property_value,
            priority: None,
        }
    }

    pub fn with_priority(
        object_identifier: ObjectIdentifier,
        property_identifier: PropertyIdentifier,
        property_value: ApplicationData,
        priority: u8,
    ) -> Self {
        Self {
            object_identifier,
            property_identifier,
            property_array_index: None,
            property_value,
            priority: Some(priority),
        }
    }

    pub fn with_array_index(
        object_identifier: ObjectIdentifier,
        property_identifier: PropertyIdentifier,
        array_index: u32,
        property_value: ApplicationData,
    ) -> Self {
        Self {
            object_identifier,
            property_identifier,
            property_array_index: Some(array_index),
            property_value,
            priority: None,
        }
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_context_object_id(
            buffer,
            u16::from(self.object_identifier.object_type),
            self.object_identifier.instance,
            0,
        )?;
        encode_context_enumerated(buffer, u32::from(self.property_identifier), 1)?;
        if let Some(array_index) = self.property_array_index {
            encode_context_unsigned(buffer, array_index, 2)?;
        }
        encode_opening_tag(buffer, 3);
        self.property_value.encode(buffer)?;
        encode_closing_tag(buffer, 3);
        if let Some(priority) = self.priority {
            encode_context_unsigned(buffer, priority as u32, 4)?;
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;

        let ((object_type, instance), consumed) = decode_context_object_id(&data[pos..], 0)?;
        let object_identifier = ObjectIdentifier::new(ObjectType::from(object_type), instance);
        pos += consumed;

        let (property_identifier, consumed) = decode_context_enumerated(&data[pos..], 1)?;
        let property_identifier = PropertyIdentifier::from(property_identifier);
        pos += consumed;

        let property_array_index = match decode_context_unsigned(&data[pos..], 2) {
            Ok((array_index, consumed)) => {
                pos += consumed;
                Some(array_index)
            }
            Err(_) => None,
        };

        if !is_opening(&data[pos..], 3) {
            return Err(EncodingError::InvalidTag);
        }
        let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
        pos += header_len;

        let (property_value, consumed) = ApplicationData::decode(&data[pos..])?;
        pos += consumed;

        if !is_closing(&data[pos..], 3) {
            return Err(EncodingError::InvalidTag);
        }
        let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
        pos += header_len;

        let priority = match decode_context_unsigned(&data[pos..], 4) {
            Ok((priority, _)) => Some(priority as u8),
            Err(_) => None,
        };

        Ok(WritePropertyRequest {
            object_identifier,
            property_identifier,
            property_array_index,
            property_value,
            priority,
        })
    }

    /// Applies this request against `database`, the Write-Property half of the
    /// confirmed-request handler skeleton. Same object-type/instance classification as
    /// [`ReadPropertyResponse::build`]; the write itself (and any access-denied,
    /// out-of-range, or wrong-type rejection) is the object database's call.
    pub fn apply<D: crate::object::ObjectDatabase>(
        &self,
        database: &mut D,
    ) -> core::result::Result<(), (ErrorClass, ErrorCode)> {
        let object_id = self.object_identifier;
        if matches!(object_id.object_type, ObjectType::Reserved(_)) {
            return Err((ErrorClass::Object, ErrorCode::UnsupportedObjectType));
        }
        if !database.object_valid_instance(object_id.object_type, object_id.instance) {
            return Err((ErrorClass::Object, ErrorCode::UnknownObject));
        }

        database.object_write_property(
            object_id.object_type,
            object_id.instance,
            self.property_identifier,
            self.property_array_index,
            &self.property_value,
            self.priority,
        )
    }
}

/// One property reference within a [`ReadAccessSpecification`], clause 15.7.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyReference {
    pub property_identifier: PropertyIdentifier,
    pub property_array_index: Option<u32>,
}

impl PropertyReference {
    pub fn new(property_identifier: PropertyIdentifier) -> Self {
        Self {
            property_identifier,
            property_array_index: None,
        }
    }

    pub fn with_array_index(property_identifier: PropertyIdentifier, array_index: u32) -> Self {
        Self {
            property_identifier,
            property_array_index: Some(array_index),
        }
    }

    fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_context_enumerated(buffer, u32::from(self.property_identifier), 0)?;
        if let Some(array_index) = self.property_array_index {
            encode_context_unsigned(buffer, array_index, 1)?;
        }
        Ok(())
    }

    fn decode(data: &[u8]) -> EncodingResult<(Self, usize)> {
        let mut pos = 0;
        let (property_identifier, consumed) = decode_context_enumerated(&data[pos..], 0)?;
        pos += consumed;
        let property_array_index = match decode_context_unsigned(&data[pos..], 1) {
            Ok((index, consumed)) => {
                pos += consumed;
                Some(index)
            }
            Err(_) => None,
        };
        Ok((
            Self {
                property_identifier: PropertyIdentifier::from(property_identifier),
                property_array_index,
            },
            pos,
        ))
    }
}

/// One object's worth of property references within a Read-Property-Multiple request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadAccessSpecification {
    pub object_identifier: ObjectIdentifier,
    pub property_references: Vec<PropertyReference>,
}

impl ReadAccessSpecification {
    pub fn new(
        object_identifier: ObjectIdentifier,
        property_references: Vec<PropertyReference>,
    ) -> Self {
        Self {
            object_identifier,
            property_references,
        }
    }

    pub fn add_property(&mut self, property_reference: PropertyReference) {
        self.property_references.push(property_reference);
    }

    fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_context_object_id(
            buffer,
            u16::from(self.object_identifier.object_type),
            self.object_identifier.instance,
            0,
        )?;
        encode_opening_tag(buffer, 1);
        for property_reference in &self.property_references {
            property_reference.encode(buffer)?;
        }
        encode_closing_tag(buffer, 1);
        Ok(())
    }

    fn decode(data: &[u8]) -> EncodingResult<(Self, usize)> {
        let mut pos = 0;

        let ((object_type, instance), consumed) = decode_context_object_id(&data[pos..], 0)?;
        pos += consumed;

        if !is_opening(&data[pos..], 1) {
            return Err(EncodingError::InvalidTag);
        }
        let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
        pos += header_len;

        let mut property_references = Vec::new();
        while !is_closing(&data[pos..], 1) {
            if pos >= data.len() {
                return Err(EncodingError::Truncated);
            }
            if property_references.len() >= MAX_SEQUENCE_ELEMENTS {
                return Err(EncodingError::TooManyElements);
            }
            let (property_reference, consumed) = PropertyReference::decode(&data[pos..])?;
            property_references.push(property_reference);
            pos += consumed;
        }
        let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
        pos += header_len;

        Ok((
            Self {
                object_identifier: ObjectIdentifier::new(ObjectType::from(object_type), instance),
                property_references,
            },
            pos,
        ))
    }
}

/// Read Property Multiple request (confirmed service), clause 15.7.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPropertyMultipleRequest {
    pub read_access_specifications: Vec<ReadAccessSpecification>,
}

impl ReadPropertyMultipleRequest {
    pub fn new(read_access_specifications: Vec<ReadAccessSpecification>) -> Self {
        Self {
            read_access_specifications,
        }
    }

    pub fn add_specification(&mut self, spec: ReadAccessSpecification) {
        self.read_access_specifications.push(spec);
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        for spec in &self.read_access_specifications {
            spec.encode(buffer)?;
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;
        let mut read_access_specifications = Vec::new();
        while pos < data.len() {
            if read_access_specifications.len() >= MAX_SEQUENCE_ELEMENTS {
                return Err(EncodingError::TooManyElements);
            }
            let (spec, consumed) = ReadAccessSpecification::decode(&data[pos..])?;
            read_access_specifications.push(spec);
            pos += consumed;
        }
        Ok(Self::new(read_access_specifications))
    }
}

/// The outcome of reading one property within a Read-Property-Multiple-ACK: either the
/// value, or an error-class/code pair (clause 15.7's `Read-Access-Result`).
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyAccessResult {
    Value(ApplicationData),
    Error(ErrorClass, ErrorCode),
}

/// One property's result within a [`ReadAccessResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyResult {
    pub property_identifier: PropertyIdentifier,
    pub property_array_index: Option<u32>,
    pub result: PropertyAccessResult,
}

/// One object's worth of property results within a Read-Property-Multiple-ACK.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadAccessResult {
    pub object_identifier: ObjectIdentifier,
    pub results: Vec<PropertyResult>,
}

impl ReadAccessResult {
    /// Expands the `All`/`Required`/`Optional` special-property sentinel in a
    /// [`ReadAccessSpecification`] into a concrete property result list, encoding each
    /// property into a scratch buffer first so a single oversized property can be
    /// reported as [`PropertyAccessResult::Error`] without discarding the rest.
    pub fn build<D: crate::object::ObjectDatabase>(
        database: &D,
        spec: &ReadAccessSpecification,
    ) -> Self {
        let object_id = spec.object_identifier;
        let property_list = database.object_property_lists(object_id.object_type);

        let mut results = Vec::new();
        for reference in &spec.property_references {
            let expanded = expand_property_list(&property_list, reference.property_identifier);
            for property_identifier in expanded {
                let result = read_one_property(
                    database,
                    object_id,
                    property_identifier,
                    reference.property_array_index,
                );
                results.push(PropertyResult {
                    property_identifier,
                    property_array_index: reference.property_array_index,
                    result,
                });
            }
        }

        Self {
            object_identifier: object_id,
            results,
        }
    }

    fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_context_object_id(
            buffer,
            u16::from(self.object_identifier.object_type),
            self.object_identifier.instance,
            0,
        )?;
        encode_opening_tag(buffer, 1);
        for result in &self.results {
            encode_context_enumerated(buffer, u32::from(result.property_identifier), 2)?;
            if let Some(array_index) = result.property_array_index {
                encode_context_unsigned(buffer, array_index, 3)?;
            }
            match &result.result {
                PropertyAccessResult::Value(value) => {
                    encode_opening_tag(buffer, 4);
                    value.encode(buffer)?;
                    encode_closing_tag(buffer, 4);
                }
                PropertyAccessResult::Error(class, code) => {
                    encode_opening_tag(buffer, 5);
                    encode_application_enumerated(buffer, u32::from(*class))?;
                    encode_application_enumerated(buffer, u32::from(*code))?;
                    encode_closing_tag(buffer, 5);
                }
            }
        }
        encode_closing_tag(buffer, 1);
        Ok(())
    }

    /// Decodes one object's worth of property results, per the RPM-ack layout in the
    /// service table: `0:object-id, 1:[opening]{ per property: 2,3?,(4|5) }[closing]`.
    /// Returns the result plus the number of octets consumed, so the caller (see
    /// [`ReadPropertyMultipleResponse::decode`]) can walk a sequence of these back to back.
    pub fn decode(data: &[u8]) -> EncodingResult<(Self, usize)> {
        let mut pos = 0;

        let ((object_type, instance), consumed) = decode_context_object_id(&data[pos..], 0)?;
        let object_identifier = ObjectIdentifier::new(ObjectType::from(object_type), instance);
        pos += consumed;

        if !is_opening(&data[pos..], 1) {
            return Err(EncodingError::InvalidTag);
        }
        let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
        pos += header_len;

        let mut results = Vec::new();
        while !is_closing(&data[pos..], 1) {
            if data.get(pos).is_none() {
                return Err(EncodingError::Truncated);
            }
            if results.len() >= MAX_SEQUENCE_ELEMENTS {
                return Err(EncodingError::TooManyElements);
            }

            let (property_raw, consumed) = decode_context_enumerated(&data[pos..], 2)?;
            let property_identifier = PropertyIdentifier::from(property_raw);
            pos += consumed;

            let property_array_index = match decode_context_unsigned(&data[pos..], 3) {
                Ok((array_index, consumed)) => {
                    pos += consumed;
                    if array_index == BACNET_ARRAY_ALL {
                        None
                    } else {
                        Some(array_index)
                    }
                }
                Err(_) => None,
            };

            let result = if is_opening(&data[pos..], 4) {
                let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
                pos += header_len;
                let (value, consumed) = ApplicationData::decode(&data[pos..])?;
                pos += consumed;
                if !is_closing(&data[pos..], 4) {
                    return Err(EncodingError::InvalidTag);
                }
                let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
                pos += header_len;
                PropertyAccessResult::Value(value)
            } else if is_opening(&data[pos..], 5) {
                let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
                pos += header_len;
                let (class_raw, consumed) = decode_application_enumerated(&data[pos..])?;
                pos += consumed;
                let (code_raw, consumed) = decode_application_enumerated(&data[pos..])?;
                pos += consumed;
                if !is_closing(&data[pos..], 5) {
                    return Err(EncodingError::InvalidTag);
                }
                let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
                pos += header_len;
                PropertyAccessResult::Error(ErrorClass::from(class_raw), ErrorCode::from(code_raw))
            } else {
                return Err(EncodingError::InvalidTag);
            };

            results.push(PropertyResult {
                property_identifier,
                property_array_index,
                result,
            });
        }

        let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
        pos += header_len;

        Ok((
            Self {
                object_identifier,
                results,
            },
            pos,
        ))
    }
}

fn expand_property_list(
    property_list: &PropertyList,
    selector: PropertyIdentifier,
) -> Vec<PropertyIdentifier> {
    property_list.expand(selector)
}

fn read_one_property<D: crate::object::ObjectDatabase>(
    database: &D,
    object_id: ObjectIdentifier,
    property_identifier: PropertyIdentifier,
    array_index: Option<u32>,
) -> PropertyAccessResult {
    if matches!(object_id.object_type, ObjectType::Reserved(_)) {
        return PropertyAccessResult::Error(ErrorClass::Object, ErrorCode::UnsupportedObjectType);
    }
    if !database.object_valid_instance(object_id.object_type, object_id.instance) {
        return PropertyAccessResult::Error(ErrorClass::Object, ErrorCode::UnknownObject);
    }

    let mut scratch = Vec::new();
    match database.object_encode_property(
        object_id.object_type,
        object_id.instance,
        property_identifier,
        array_index,
        &mut scratch,
    ) {
        Ok(_) => match ApplicationData::decode(&scratch) {
            Ok((value, _)) => PropertyAccessResult::Value(value),
            Err(_) => PropertyAccessResult::Error(ErrorClass::Property, ErrorCode::Other),
        },
        Err((class, code)) => PropertyAccessResult::Error(class, code),
    }
}

/// Read Property Multiple response (confirmed service ack), clause 15.7.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPropertyMultipleResponse {
    pub results: Vec<ReadAccessResult>,
}

impl ReadPropertyMultipleResponse {
    pub fn new(results: Vec<ReadAccessResult>) -> Self {
        Self { results }
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        for result in &self.results {
            result.encode(buffer)?;
        }
        Ok(())
    }

    /// Decodes a full ack: a back-to-back sequence of per-object [`ReadAccessResult`]s
    /// running to the end of `data`.
    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;
        let mut results = Vec::new();
        while pos < data.len() {
            if results.len() >= MAX_SEQUENCE_ELEMENTS {
                return Err(EncodingError::TooManyElements);
            }
            let (result, consumed) = ReadAccessResult::decode(&data[pos..])?;
            pos += consumed;
            results.push(result);
        }
        Ok(Self { results })
    }

    /// Encodes this ack one object at a time into a scratch buffer first, copying each
    /// object's encoding into `buffer` only if it still fits under `max_apdu`. Mirrors the
    /// reference implementation's `Encode_Property_APDU` discipline: a single oversized
    /// object must not produce a silently truncated ack on the wire. Rather than returning
    /// a partial response, this aborts the whole ack — the caller should send an
    /// [`AbortReason::SegmentationNotSupported`] instead of `buffer`'s contents.
    pub fn encode_bounded(&self, max_apdu: usize) -> core::result::Result<Vec<u8>, AbortReason> {
        let mut buffer = Vec::new();
        for result in &self.results {
            let mut scratch = Vec::new();
            if result.encode(&mut scratch).is_err() {
                return Err(AbortReason::Other);
            }
            if buffer.len() + scratch.len() > max_apdu {
                return Err(AbortReason::SegmentationNotSupported);
            }
            buffer.extend_from_slice(&scratch);
        }
        Ok(buffer)
    }
}

/// Subscribe COV request (confirmed service), clause 13.14.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeCovRequest {
    pub subscriber_process_identifier: u32,
    pub monitored_object_identifier: ObjectIdentifier,
    pub issue_confirmed_notifications: Option<bool>,
    pub lifetime: Option<u32>,
}

impl SubscribeCovRequest {
    pub fn new(
        subscriber_process_identifier: u32,
        monitored_object_identifier: ObjectIdentifier,
    ) -> Self {
        Self {
            subscriber_process_identifier,
            monitored_object_identifier,
            issue_confirmed_notifications: None,
            lifetime: None,
        }
    }

    pub fn with_confirmation(
        subscriber_process_identifier: u32,
        monitored_object_identifier: ObjectIdentifier,
        issue_confirmed_notifications: bool,
    ) -> Self {
        Self {
            subscriber_process_identifier,
            monitored_object_identifier,
            issue_confirmed_notifications: Some(issue_confirmed_notifications),
            lifetime: None,
        }
    }

    pub fn with_lifetime(
        subscriber_process_identifier: u32,
        monitored_object_identifier: ObjectIdentifier,
        lifetime: u32,
    ) -> Self {
        Self {
            subscriber_process_identifier,
            monitored_object_identifier,
            issue_confirmed_notifications: None,
            lifetime: Some(lifetime),
        }
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_context_unsigned(buffer, self.subscriber_process_identifier, 0)?;
        encode_context_object_id(
            buffer,
            u16::from(self.monitored_object_identifier.object_type),
            self.monitored_object_identifier.instance,
            1,
        )?;
        if let Some(confirmed) = self.issue_confirmed_notifications {
            encode_context_boolean(buffer, confirmed, 2)?;
        }
        if let Some(lifetime) = self.lifetime {
            encode_context_unsigned(buffer, lifetime, 3)?;
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;

        let (subscriber_process_identifier, consumed) = decode_context_unsigned(&data[pos..], 0)?;
        pos += consumed;

        let ((object_type, instance), consumed) = decode_context_object_id(&data[pos..], 1)?;
        pos += consumed;

        let issue_confirmed_notifications = match decode_context_boolean(&data[pos..], 2) {
            Ok((confirmed, consumed)) => {
                pos += consumed;
                Some(confirmed)
            }
            Err(_) => None,
        };

        let lifetime = match decode_context_unsigned(&data[pos..], 3) {
            Ok((lifetime, _)) => Some(lifetime),
            Err(_) => None,
        };

        Ok(Self {
            subscriber_process_identifier,
            monitored_object_identifier: ObjectIdentifier::new(ObjectType::from(object_type), instance),
            issue_confirmed_notifications,
            lifetime,
        })
    }

    /// `true` if this request's absent optional fields indicate a cancellation
    /// (clause 13.14.1.2): a subscriber sends a bare subscriber/object pair to cancel.
    pub fn is_cancellation(&self) -> bool {
        self.issue_confirmed_notifications.is_none() && self.lifetime.is_none()
    }
}

/// Subscribe COV Property request (confirmed service), clause 13.15.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeCovPropertyRequest {
    pub subscriber_process_identifier: u32,
    pub monitored_object_identifier: ObjectIdentifier,
    pub issue_confirmed_notifications: Option<bool>,
    pub lifetime: Option<u32>,
    pub monitored_property: PropertyReference,
    /// COV increment, stored as a bit pattern since `f32` does not implement `Eq`.
    cov_increment_bits: Option<u32>,
}

impl SubscribeCovPropertyRequest {
    pub fn new(
        subscriber_process_identifier: u32,
        monitored_object_identifier: ObjectIdentifier,
        monitored_property: PropertyReference,
    ) -> Self {
        Self {
            subscriber_process_identifier,
            monitored_object_identifier,
            issue_confirmed_notifications: None,
            lifetime: None,
            monitored_property,
            cov_increment_bits: None,
        }
    }

    pub fn with_cov_increment(mut self, increment: f32) -> Self {
        self.cov_increment_bits = Some(increment.to_bits());
        self
    }

    pub fn cov_increment(&self) -> Option<f32> {
        self.cov_increment_bits.map(f32::from_bits)
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_context_unsigned(buffer, self.subscriber_process_identifier, 0)?;
        encode_context_object_id(
            buffer,
            u16::from(self.monitored_object_identifier.object_type),
            self.monitored_object_identifier.instance,
            1,
        )?;
        if let Some(confirmed) = self.issue_confirmed_notifications {
            encode_context_boolean(buffer, confirmed, 2)?;
        }
        if let Some(lifetime) = self.lifetime {
            encode_context_unsigned(buffer, lifetime, 3)?;
        }
        encode_opening_tag(buffer, 4);
        self.monitored_property.encode(buffer)?;
        encode_closing_tag(buffer, 4);
        if let Some(increment) = self.cov_increment() {
            crate::encoding::context::encode_context_real(buffer, increment, 5)?;
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;

        let (subscriber_process_identifier, consumed) = decode_context_unsigned(&data[pos..], 0)?;
        pos += consumed;

        let ((object_type, instance), consumed) = decode_context_object_id(&data[pos..], 1)?;
        pos += consumed;

        let issue_confirmed_notifications = match decode_context_boolean(&data[pos..], 2) {
            Ok((confirmed, consumed)) => {
                pos += consumed;
                Some(confirmed)
            }
            Err(_) => None,
        };

        let lifetime = match decode_context_unsigned(&data[pos..], 3) {
            Ok((lifetime, consumed)) => {
                pos += consumed;
                Some(lifetime)
            }
            Err(_) => None,
        };

        if !is_opening(&data[pos..], 4) {
            return Err(EncodingError::InvalidTag);
        }
        let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
        pos += header_len;
        let (monitored_property, consumed) = PropertyReference::decode(&data[pos..])?;
        pos += consumed;
        if !is_closing(&data[pos..], 4) {
            return Err(EncodingError::InvalidTag);
        }
        let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
        pos += header_len;

        let cov_increment_bits =
            match crate::encoding::context::decode_context_real(&data[pos..], 5) {
                Ok((increment, _)) => Some(increment.to_bits()),
                Err(_) => None,
            };

        Ok(Self {
            subscriber_process_identifier,
            monitored_object_identifier: ObjectIdentifier::new(ObjectType::from(object_type), instance),
            issue_confirmed_notifications,
            lifetime,
            monitored_property,
            cov_increment_bits,
        })
    }
}

/// One property-value pair within a [`CovNotificationRequest`]'s list of values.
#[derive(Debug, Clone, PartialEq)]
pub struct CovPropertyValue {
    pub property_identifier: PropertyIdentifier,
    pub property_array_index: Option<u32>,
    pub value: ApplicationData,
    pub priority: Option<u8>,
}

impl CovPropertyValue {
    pub fn new(property_identifier: PropertyIdentifier, value: ApplicationData) -> Self {
        Self {
            property_identifier,
            property_array_index: None,
            value,
            priority: None,
        }
    }

    fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_context_enumerated(buffer, u32::from(self.property_identifier), 0)?;
        if let Some(array_index) = self.property_array_index {
            encode_context_unsigned(buffer, array_index, 1)?;
        }
        encode_opening_tag(buffer, 2);
        self.value.encode(buffer)?;
        encode_closing_tag(buffer, 2);
        if let Some(priority) = self.priority {
            encode_context_unsigned(buffer, priority as u32, 3)?;
        }
        Ok(())
    }

    fn decode(data: &[u8]) -> EncodingResult<(Self, usize)> {
        let mut pos = 0;

        let (property_identifier, consumed) = decode_context_enumerated(&data[pos..], 0)?;
        pos += consumed;

        let property_array_index = match decode_context_unsigned(&data[pos..], 1) {
            Ok((index, consumed)) => {
                pos += consumed;
                Some(index)
            }
            Err(_) => None,
        };

        if !is_opening(&data[pos..], 2) {
            return Err(EncodingError::InvalidTag);
        }
        let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
        pos += header_len;
        let (value, consumed) = ApplicationData::decode(&data[pos..])?;
        pos += consumed;
        while !is_closing(&data[pos..], 2) {
            if pos >= data.len() {
                return Err(EncodingError::Truncated);
            }
            log::debug!(
                "COV notification: dropping trailing application-data octet(s) inside value wrapper for property {:?}; only the first value is kept",
                property_identifier
            );
            let (_, trailing_consumed) = ApplicationData::decode(&data[pos..])?;
            pos += trailing_consumed;
        }
        let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
        pos += header_len;

        let priority = match decode_context_unsigned(&data[pos..], 3) {
            Ok((priority, consumed)) => {
                pos += consumed;
                Some(priority as u8)
            }
            Err(_) => None,
        };

        Ok((
            Self {
                property_identifier: PropertyIdentifier::from(property_identifier),
                property_array_index,
                value,
                priority,
            },
            pos,
        ))
    }
}

/// COV Notification request (unconfirmed or confirmed service), clause 13.1 / 13.2.
#[derive(Debug, Clone, PartialEq)]
pub struct CovNotificationRequest {
    pub subscriber_process_identifier: u32,
    pub initiating_device_identifier: ObjectIdentifier,
    pub monitored_object_identifier: ObjectIdentifier,
    pub time_remaining: u32,
    pub list_of_values: Vec<CovPropertyValue>,
}

impl CovNotificationRequest {
    pub fn new(
        subscriber_process_identifier: u32,
        initiating_device_identifier: ObjectIdentifier,
        monitored_object_identifier: ObjectIdentifier,
        time_remaining: u32,
        list_of_values: Vec<CovPropertyValue>,
    ) -> Self {
        Self {
            subscriber_process_identifier,
            initiating_device_identifier,
            monitored_object_identifier,
            time_remaining,
            list_of_values,
        }
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_context_unsigned(buffer, self.subscriber_process_identifier, 0)?;
        encode_context_object_id(
            buffer,
            u16::from(self.initiating_device_identifier.object_type),
            self.initiating_device_identifier.instance,
            1,
        )?;
        encode_context_object_id(
            buffer,
            u16::from(self.monitored_object_identifier.object_type),
            self.monitored_object_identifier.instance,
            2,
        )?;
        encode_context_unsigned(buffer, self.time_remaining, 3)?;
        encode_opening_tag(buffer, 4);
        for value in &self.list_of_values {
            value.encode(buffer)?;
        }
        encode_closing_tag(buffer, 4);
        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;

        let (subscriber_process_identifier, consumed) = decode_context_unsigned(&data[pos..], 0)?;
        pos += consumed;

        let ((dev_type, dev_instance), consumed) = decode_context_object_id(&data[pos..], 1)?;
        pos += consumed;

        let ((obj_type, obj_instance), consumed) = decode_context_object_id(&data[pos..], 2)?;
        pos += consumed;

        let (time_remaining, consumed) = decode_context_unsigned(&data[pos..], 3)?;
        pos += consumed;

        if !is_opening(&data[pos..], 4) {
            return Err(EncodingError::InvalidTag);
        }
        let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
        pos += header_len;

        let mut list_of_values = Vec::new();
        while !is_closing(&data[pos..], 4) {
            if pos >= data.len() {
                return Err(EncodingError::Truncated);
            }
            if list_of_values.len() >= MAX_SEQUENCE_ELEMENTS {
                return Err(EncodingError::TooManyElements);
            }
            let (value, consumed) = CovPropertyValue::decode(&data[pos..])?;
            list_of_values.push(value);
            pos += consumed;
        }

        Ok(Self {
            subscriber_process_identifier,
            initiating_device_identifier: ObjectIdentifier::new(ObjectType::from(dev_type), dev_instance),
            monitored_object_identifier: ObjectIdentifier::new(ObjectType::from(obj_type), obj_instance),
            time_remaining,
            list_of_values,
        })
    }
}

/// A live change-of-value subscription. This crate only models the bookkeeping
/// (expiry, dedup by subscriber/object); it does not decide when a property value has
/// changed enough to notify — that is the object database's job.
#[derive(Debug, Clone, PartialEq)]
pub struct CovSubscription {
    pub subscriber_process_identifier: u32,
    pub subscriber_device_identifier: ObjectIdentifier,
    pub monitored_object_identifier: ObjectIdentifier,
    pub monitored_property: Option<PropertyReference>,
    pub issue_confirmed_notifications: bool,
    pub lifetime: u32,
    pub time_remaining: u32,
}

impl CovSubscription {
    pub fn new(
        subscriber_process_identifier: u32,
        subscriber_device_identifier: ObjectIdentifier,
        monitored_object_identifier: ObjectIdentifier,
        lifetime: u32,
    ) -> Self {
        Self {
            subscriber_process_identifier,
            subscriber_device_identifier,
            monitored_object_identifier,
            monitored_property: None,
            issue_confirmed_notifications: false,
            lifetime,
            time_remaining: lifetime,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.lifetime > 0 && self.time_remaining == 0
    }

    pub fn update_time(&mut self, elapsed_seconds: u32) {
        if self.lifetime > 0 {
            self.time_remaining = self.time_remaining.saturating_sub(elapsed_seconds);
        }
    }
}

/// Tracks active COV subscriptions for a single device, keyed by subscriber and
/// monitored object.
#[derive(Debug, Default)]
pub struct CovSubscriptionManager {
    subscriptions: Vec<CovSubscription>,
}

impl CovSubscriptionManager {
    pub fn new() -> Self {
        Self { subscriptions: Vec::new() }
    }

    pub fn add_subscription(&mut self, subscription: CovSubscription) {
        self.subscriptions.retain(|s| {
            !(s.subscriber_device_identifier == subscription.subscriber_device_identifier
                && s.subscriber_process_identifier == subscription.subscriber_process_identifier
                && s.monitored_object_identifier == subscription.monitored_object_identifier)
        });
        self.subscriptions.push(subscription);
    }

    pub fn remove_subscription(
        &mut self,
        subscriber_device: ObjectIdentifier,
        subscriber_process: u32,
        monitored_object: ObjectIdentifier,
    ) {
        self.subscriptions.retain(|s| {
            !(s.subscriber_device_identifier == subscriber_device
                && s.subscriber_process_identifier == subscriber_process
                && s.monitored_object_identifier == monitored_object)
        });
    }

    pub fn get_subscriptions_for_object(&self, object_id: ObjectIdentifier) -> Vec<&CovSubscription> {
        self.subscriptions
            .iter()
            .filter(|s| s.monitored_object_identifier == object_id && !s.is_expired())
            .collect()
    }

    pub fn cleanup_expired(&mut self) {
        self.subscriptions.retain(|s| !s.is_expired());
    }

    pub fn update_timers(&mut self, elapsed_seconds: u32) {
        for subscription in &mut self.subscriptions {
            subscription.update_time(elapsed_seconds);
        }
    }

    pub fn active_count(&self) -> usize {
        self.subscriptions.iter().filter(|s| !s.is_expired()).count()
    }
}

/// File access method specification for [`AtomicReadFileRequest`], clause 15.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAccessMethod {
    StreamAccess {
        file_start_position: i32,
        requested_octet_count: u32,
    },
    RecordAccess {
        file_start_record: i32,
        requested_record_count: u32,
    },
}

/// Atomic Read File request (confirmed service), clause 15.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicReadFileRequest {
    pub file_identifier: ObjectIdentifier,
    pub access_method: FileAccessMethod,
}

impl AtomicReadFileRequest {
    pub fn new_stream_access(
        file_identifier: ObjectIdentifier,
        start_position: i32,
        octet_count: u32,
    ) -> Self {
        Self {
            file_identifier,
            access_method: FileAccessMethod::StreamAccess {
                file_start_position: start_position,
                requested_octet_count: octet_count,
            },
        }
    }

    pub fn new_record_access(
        file_identifier: ObjectIdentifier,
        start_record: i32,
        record_count: u32,
    ) -> Self {
        Self {
            file_identifier,
            access_method: FileAccessMethod::RecordAccess {
                file_start_record: start_record,
                requested_record_count: record_count,
            },
        }
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_context_object_id(
            buffer,
            u16::from(self.file_identifier.object_type),
            self.file_identifier.instance,
            0,
        )?;

        match &self.access_method {
            FileAccessMethod::StreamAccess {
                file_start_position,
                requested_octet_count,
            } => {
                encode_opening_tag(buffer, 0);
                crate::encoding::context::encode_context_signed(buffer, *file_start_position, 0)?;
                encode_context_unsigned(buffer, *requested_octet_count, 1)?;
                encode_closing_tag(buffer, 0);
            }
            FileAccessMethod::RecordAccess {
                file_start_record,
                requested_record_count,
            } => {
                encode_opening_tag(buffer, 1);
                crate::encoding::context::encode_context_signed(buffer, *file_start_record, 0)?;
                encode_context_unsigned(buffer, *requested_record_count, 1)?;
                encode_closing_tag(buffer, 1);
            }
        }

        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;

        let ((object_type, instance), consumed) = decode_context_object_id(&data[pos..], 0)?;
        let file_identifier = ObjectIdentifier::new(ObjectType::from(object_type), instance);
        pos += consumed;

        let access_method = if is_opening(&data[pos..], 0) {
            let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
            pos += header_len;
            let (file_start_position, consumed) =
                crate::encoding::context::decode_context_signed(&data[pos..], 0)?;
            pos += consumed;
            let (requested_octet_count, consumed) = decode_context_unsigned(&data[pos..], 1)?;
            pos += consumed;
            if !is_closing(&data[pos..], 0) {
                return Err(EncodingError::InvalidTag);
            }
            FileAccessMethod::StreamAccess {
                file_start_position,
                requested_octet_count,
            }
        } else if is_opening(&data[pos..], 1) {
            let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
            pos += header_len;
            let (file_start_record, consumed) =
                crate::encoding::context::decode_context_signed(&data[pos..], 0)?;
            pos += consumed;
            let (requested_record_count, consumed) = decode_context_unsigned(&data[pos..], 1)?;
            pos += consumed;
            if !is_closing(&data[pos..], 1) {
                return Err(EncodingError::InvalidTag);
            }
            FileAccessMethod::RecordAccess {
                file_start_record,
                requested_record_count,
            }
        } else {
            return Err(EncodingError::InvalidTag);
        };

        Ok(Self {
            file_identifier,
            access_method,
        })
    }
}

/// Atomic Read File response's access-method result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAccessMethodResult {
    StreamAccess {
        file_start_position: i32,
        file_data: Vec<u8>,
    },
    RecordAccess {
        file_start_record: i32,
        record_count: u32,
        file_record_data: Vec<Vec<u8>>,
    },
}

/// Atomic Read File response (confirmed service ack), clause 15.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicReadFileResponse {
    pub end_of_file: bool,
    pub access_method_result: FileAccessMethodResult,
}

impl AtomicReadFileResponse {
    pub fn new_stream_access(end_of_file: bool, start_position: i32, data: Vec<u8>) -> Self {
        Self {
            end_of_file,
            access_method_result: FileAccessMethodResult::StreamAccess {
                file_start_position: start_position,
                file_data: data,
            },
        }
    }

    pub fn new_record_access(end_of_file: bool, start_record: i32, records: Vec<Vec<u8>>) -> Self {
        let record_count = records.len() as u32;
        Self {
            end_of_file,
            access_method_result: FileAccessMethodResult::RecordAccess {
                file_start_record: start_record,
                record_count,
                file_record_data: records,
            },
        }
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        crate::encoding::encode_application_boolean(buffer, self.end_of_file)?;
        match &self.access_method_result {
            FileAccessMethodResult::StreamAccess {
                file_start_position,
                file_data,
            } => {
                encode_opening_tag(buffer, 0);
                crate::encoding::context::encode_context_signed(buffer, *file_start_position, 0)?;
                encode_context_octet_string(buffer, file_data, 1)?;
                encode_closing_tag(buffer, 0);
            }
            FileAccessMethodResult::RecordAccess {
                file_start_record,
                record_count,
                file_record_data,
            } => {
                encode_opening_tag(buffer, 1);
                crate::encoding::context::encode_context_signed(buffer, *file_start_record, 0)?;
                encode_context_unsigned(buffer, *record_count, 1)?;
                encode_opening_tag(buffer, 2);
                for record in file_record_data {
                    crate::encoding::encode_application_octet_string(buffer, record)?;
                }
                encode_closing_tag(buffer, 2);
                encode_closing_tag(buffer, 1);
            }
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;

        let (end_of_file, consumed) = crate::encoding::decode_application_boolean(&data[pos..])?;
        pos += consumed;

        let access_method_result = if is_opening(&data[pos..], 0) {
            let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
            pos += header_len;
            let (file_start_position, consumed) =
                crate::encoding::context::decode_context_signed(&data[pos..], 0)?;
            pos += consumed;
            let (file_data, consumed) =
                crate::encoding::context::decode_context_octet_string(&data[pos..], 1)?;
            pos += consumed;
            if !is_closing(&data[pos..], 0) {
                return Err(EncodingError::InvalidTag);
            }
            FileAccessMethodResult::StreamAccess {
                file_start_position,
                file_data,
            }
        } else if is_opening(&data[pos..], 1) {
            let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
            pos += header_len;
            let (file_start_record, consumed) =
                crate::encoding::context::decode_context_signed(&data[pos..], 0)?;
            pos += consumed;
            let (record_count, consumed) = decode_context_unsigned(&data[pos..], 1)?;
            pos += consumed;
            if !is_opening(&data[pos..], 2) {
                return Err(EncodingError::InvalidTag);
            }
            let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
            pos += header_len;
            let mut file_record_data = Vec::new();
            for _ in 0..record_count {
                let (record, consumed) =
                    crate::encoding::decode_application_octet_string(&data[pos..])?;
                pos += consumed;
                file_record_data.push(record);
            }
            if !is_closing(&data[pos..], 2) {
                return Err(EncodingError::InvalidTag);
            }
            let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
            pos += header_len;
            if !is_closing(&data[pos..], 1) {
                return Err(EncodingError::InvalidTag);
            }
            FileAccessMethodResult::RecordAccess {
                file_start_record,
                record_count,
                file_record_data,
            }
        } else {
            return Err(EncodingError::InvalidTag);
        };

        Ok(Self {
            end_of_file,
            access_method_result,
        })
    }
}

/// Atomic Write File request's access method and data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileWriteAccessMethod {
    StreamAccess {
        file_start_position: i32,
        file_data: Vec<u8>,
    },
    RecordAccess {
        file_start_record: i32,
        record_count: u32,
        file_record_data: Vec<Vec<u8>>,
    },
}

/// Atomic Write File request (confirmed service), clause 15.2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicWriteFileRequest {
    pub file_identifier: ObjectIdentifier,
    pub access_method: FileWriteAccessMethod,
}

impl AtomicWriteFileRequest {
    pub fn new_stream_access(
        file_identifier: ObjectIdentifier,
        start_position: i32,
        data: Vec<u8>,
    ) -> Self {
        Self {
            file_identifier,
            access_method: FileWriteAccessMethod::StreamAccess {
                file_start_position: start_position,
                file_data: data,
            },
        }
    }

    pub fn new_record_access(
        file_identifier: ObjectIdentifier,
        start_record: i32,
        records: Vec<Vec<u8>>,
    ) -> Self {
        let record_count = records.len() as u32;
        Self {
            file_identifier,
            access_method: FileWriteAccessMethod::RecordAccess {
                file_start_record: start_record,
                record_count,
                file_record_data: records,
            },
        }
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_context_object_id(
            buffer,
            u16::from(self.file_identifier.object_type),
            self.file_identifier.instance,
            0,
        )?;

        match &self.access_method {
            FileWriteAccessMethod::StreamAccess {
                file_start_position,
                file_data,
            } => {
                encode_opening_tag(buffer, 0);
                crate::encoding::context::encode_context_signed(buffer, *file_start_position, 0)?;
                encode_context_octet_string(buffer, file_data, 1)?;
                encode_closing_tag(buffer, 0);
            }
            FileWriteAccessMethod::RecordAccess {
                file_start_record,
                record_count,
                file_record_data,
            } => {
                encode_opening_tag(buffer, 1);
                crate::encoding::context::encode_context_signed(buffer, *file_start_record, 0)?;
                encode_context_unsigned(buffer, *record_count, 1)?;
                encode_opening_tag(buffer, 2);
                for record in file_record_data {
                    crate::encoding::encode_application_octet_string(buffer, record)?;
                }
                encode_closing_tag(buffer, 2);
                encode_closing_tag(buffer, 1);
            }
        }

        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;

        let ((object_type, instance), consumed) = decode_context_object_id(&data[pos..], 0)?;
        let file_identifier = ObjectIdentifier::new(ObjectType::from(object_type), instance);
        pos += consumed;

        let access_method = if is_opening(&data[pos..], 0) {
            let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
            pos += header_len;
            let (file_start_position, consumed) =
                crate::encoding::context::decode_context_signed(&data[pos..], 0)?;
            pos += consumed;
            let (file_data, consumed) =
                crate::encoding::context::decode_context_octet_string(&data[pos..], 1)?;
            pos += consumed;
            if !is_closing(&data[pos..], 0) {
                return Err(EncodingError::InvalidTag);
            }
            FileWriteAccessMethod::StreamAccess {
                file_start_position,
                file_data,
            }
        } else if is_opening(&data[pos..], 1) {
            let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
            pos += header_len;
            let (file_start_record, consumed) =
                crate::encoding::context::decode_context_signed(&data[pos..], 0)?;
            pos += consumed;
            let (record_count, consumed) = decode_context_unsigned(&data[pos..], 1)?;
            pos += consumed;
            if !is_opening(&data[pos..], 2) {
                return Err(EncodingError::InvalidTag);
            }
            let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
            pos += header_len;
            let mut file_record_data = Vec::new();
            for _ in 0..record_count {
                let (record, consumed) =
                    crate::encoding::decode_application_octet_string(&data[pos..])?;
                pos += consumed;
                file_record_data.push(record);
            }
            if !is_closing(&data[pos..], 2) {
                return Err(EncodingError::InvalidTag);
            }
            let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
            pos += header_len;
            if !is_closing(&data[pos..], 1) {
                return Err(EncodingError::InvalidTag);
            }
            FileWriteAccessMethod::RecordAccess {
                file_start_record,
                record_count,
                file_record_data,
            }
        } else {
            return Err(EncodingError::InvalidTag);
        };

        Ok(Self {
            file_identifier,
            access_method,
        })
    }
}

/// Atomic Write File response (confirmed service ack), clause 15.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomicWriteFileResponse {
    pub file_start_position: i32,
}

impl AtomicWriteFileResponse {
    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        crate::encoding::context::encode_context_signed(buffer, self.file_start_position, 0)?;
        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let (file_start_position, _) =
            crate::encoding::context::decode_context_signed(data, 0)?;
        Ok(Self { file_start_position })
    }
}

/// Reinitialize-Device state selector, clause 16.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReinitializedState {
    ColdStart,
    WarmStart,
    StartBackup,
    EndBackup,
    StartRestore,
    EndRestore,
    AbortRestore,
}

impl From<ReinitializedState> for u32 {
    fn from(state: ReinitializedState) -> Self {
        match state {
            ReinitializedState::ColdStart => 0,
            ReinitializedState::WarmStart => 1,
            ReinitializedState::StartBackup => 2,
            ReinitializedState::EndBackup => 3,
            ReinitializedState::StartRestore => 4,
            ReinitializedState::EndRestore => 5,
            ReinitializedState::AbortRestore => 6,
        }
    }
}

impl TryFrom<u32> for ReinitializedState {
    type Error = ServiceError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::ColdStart),
            1 => Ok(Self::WarmStart),
            2 => Ok(Self::StartBackup),
            3 => Ok(Self::EndBackup),
            4 => Ok(Self::StartRestore),
            5 => Ok(Self::EndRestore),
            6 => Ok(Self::AbortRestore),
            other => Err(ServiceError::InvalidParameters(format!(
                "unrecognized reinitialized-state-of-device value {}",
                other
            ))),
        }
    }
}

/// Reinitialize Device request (confirmed service), clause 16.4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReinitializeDeviceRequest {
    pub reinitialized_state_of_device: ReinitializedState,
    pub password: Option<String>,
}

impl ReinitializeDeviceRequest {
    pub fn new(reinitialized_state_of_device: ReinitializedState) -> Self {
        Self {
            reinitialized_state_of_device,
            password: None,
        }
    }

    pub fn with_password(
        reinitialized_state_of_device: ReinitializedState,
        password: impl Into<String>,
    ) -> Self {
        Self {
            reinitialized_state_of_device,
            password: Some(password.into()),
        }
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        encode_context_enumerated(buffer, u32::from(self.reinitialized_state_of_device), 0)?;
        if let Some(password) = &self.password {
            crate::encoding::context::encode_context_character_string(buffer, password, 1)?;
        }
        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let mut pos = 0;
        let (state, consumed) = decode_context_enumerated(&data[pos..], 0)?;
        pos += consumed;
        let reinitialized_state_of_device = ReinitializedState::try_from(state)
            .map_err(|_| EncodingError::InvalidFormat("unrecognized reinitialized state".to_string()))?;

        let password = match crate::encoding::context::decode_context_character_string(&data[pos..], 1) {
            Ok((password, _)) => Some(password),
            Err(_) => None,
        };

        Ok(Self {
            reinitialized_state_of_device,
            password,
        })
    }
}

/// A BACnet date and time pair, clause 20.2.13 combined with 20.2.12 — used by the
/// Time-Synchronization services and anywhere else the protocol carries a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacnetDateTime {
    pub date: Date,
    pub time: Time,
}

impl BacnetDateTime {
    pub fn new(date: Date, time: Time) -> Self {
        Self { date, time }
    }

    /// Build from the local system clock.
    #[cfg(feature = "std")]
    pub fn now() -> Self {
        use chrono::{Datelike, Local, Timelike};

        let now = Local::now();
        Self::new(
            Date::new(
                now.year() as u16,
                now.month() as u8,
                now.day() as u8,
                now.weekday().number_from_monday() as u8,
            ),
            Time::new(
                now.hour() as u8,
                now.minute() as u8,
                now.second() as u8,
                (now.nanosecond() / 10_000_000) as u8,
            ),
        )
    }

    /// Build from the UTC system clock.
    #[cfg(feature = "std")]
    pub fn now_utc() -> Self {
        use chrono::{Datelike, Timelike, Utc};

        let now = Utc::now();
        Self::new(
            Date::new(
                now.year() as u16,
                now.month() as u8,
                now.day() as u8,
                now.weekday().number_from_monday() as u8,
            ),
            Time::new(
                now.hour() as u8,
                now.minute() as u8,
                now.second() as u8,
                (now.nanosecond() / 10_000_000) as u8,
            ),
        )
    }

    pub fn unspecified() -> Self {
        Self {
            date: Date::new(0xFF, 0xFF, 0xFF, 0xFF),
            time: Time::new(0xFF, 0xFF, 0xFF, 0xFF),
        }
    }

    pub fn is_unspecified(&self) -> bool {
        self.date.year == 0xFF
            && self.date.month == 0xFF
            && self.date.day == 0xFF
            && self.date.weekday == 0xFF
            && self.time.hour == 0xFF
            && self.time.minute == 0xFF
            && self.time.second == 0xFF
            && self.time.hundredths == 0xFF
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        crate::encoding::encode_application_date(buffer, self.date)?;
        crate::encoding::encode_application_time(buffer, self.time)?;
        Ok(())
    }

    pub fn decode(data: &[u8]) -> EncodingResult<(Self, usize)> {
        let (date, consumed_date) = crate::encoding::decode_application_date(data)?;
        let (time, consumed_time) = crate::encoding::decode_application_time(&data[consumed_date..])?;
        Ok((Self::new(date, time), consumed_date + consumed_time))
    }

    fn encode_context(&self, buffer: &mut Vec<u8>, tag_number: u8) -> EncodingResult<()> {
        encode_opening_tag(buffer, tag_number);
        encode_context_date(buffer, self.date, 0)?;
        encode_context_time(buffer, self.time, 1)?;
        encode_closing_tag(buffer, tag_number);
        Ok(())
    }

    fn decode_context(data: &[u8], tag_number: u8) -> EncodingResult<(Self, usize)> {
        let mut pos = 0;
        if !is_opening(&data[pos..], tag_number) {
            return Err(EncodingError::InvalidTag);
        }
        let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
        pos += header_len;
        let (date, consumed) = decode_context_date(&data[pos..], 0)?;
        pos += consumed;
        let (time, consumed) = decode_context_time(&data[pos..], 1)?;
        pos += consumed;
        if !is_closing(&data[pos..], tag_number) {
            return Err(EncodingError::InvalidTag);
        }
        let (_, _, _, _, header_len) = decode_context_tag_header(&data[pos..])?;
        pos += header_len;
        Ok((Self::new(date, time), pos))
    }
}

/// Time Synchronization request (unconfirmed service), clause 16.2. Carries local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSynchronizationRequest {
    pub date_time: BacnetDateTime,
}

impl TimeSynchronizationRequest {
    pub fn new(date_time: BacnetDateTime) -> Self {
        Self { date_time }
    }

    #[cfg(feature = "std")]
    pub fn now() -> Self {
        Self::new(BacnetDateTime::now())
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        self.date_time.encode(buffer)
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let (date_time, _) = BacnetDateTime::decode(data)?;
        Ok(Self::new(date_time))
    }
}

/// UTC Time Synchronization request (unconfirmed service), clause 16.2.1.1. Carries UTC time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcTimeSynchronizationRequest {
    pub utc_date_time: BacnetDateTime,
}

impl UtcTimeSynchronizationRequest {
    pub fn new(utc_date_time: BacnetDateTime) -> Self {
        Self { utc_date_time }
    }

    #[cfg(feature = "std")]
    pub fn now() -> Self {
        Self::new(BacnetDateTime::now_utc())
    }

    pub fn encode(&self, buffer: &mut Vec<u8>) -> EncodingResult<()> {
        self.utc_date_time.encode(buffer)
    }

    pub fn decode(data: &[u8]) -> EncodingResult<Self> {
        let (utc_date_time, _) = BacnetDateTime::decode(data)?;
        Ok(Self::new(utc_date_time))
    }
}

fn encode_context_octet_string(buffer: &mut Vec<u8>, value: &[u8], tag_number: u8) -> EncodingResult<()> {
    crate::encoding::context::encode_context_octet_string(buffer, value, tag_number)
}

/// A decoded confirmed-service request, the union [`decode_confirmed_request`] dispatches
/// into from a [`crate::app::Apdu::ConfirmedRequest`]'s `service_choice` octet and body.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmedServiceRequest {
    ReadProperty(ReadPropertyRequest),
    ReadPropertyMultiple(ReadPropertyMultipleRequest),
    WriteProperty(WritePropertyRequest),
    SubscribeCov(SubscribeCovRequest),
    SubscribeCovProperty(SubscribeCovPropertyRequest),
    AtomicReadFile(AtomicReadFileRequest),
    AtomicWriteFile(AtomicWriteFileRequest),
    ReinitializeDevice(ReinitializeDeviceRequest),
}

/// Decodes a confirmed request's service body, given the `service_choice` octet published
/// by [`crate::app::Apdu::decode`]. A `service_choice` this crate does not implement — as
/// well as one ASHRAE 135 defines but this crate has no service-body codec for (alarm and
/// event services, object/list management, VT, security) — maps to
/// `RejectReason::UnrecognizedService` rather than a decode error, so the caller's
/// reject/abort policy stays uniform: "I don't have this service" is a protocol-level
/// reject, not an internal fault.
pub fn decode_confirmed_request(
    service_choice: u8,
    data: &[u8],
) -> core::result::Result<ConfirmedServiceRequest, RejectReason> {
    let choice = ConfirmedServiceChoice::try_from(service_choice).map_err(|_| {
        log::warn!("confirmed request: unrecognized service choice {}", service_choice);
        RejectReason::UnrecognizedService
    })?;

    let map_err = |e: EncodingError| reject_reason_for(&e);

    match choice {
        ConfirmedServiceChoice::ReadProperty => ReadPropertyRequest::decode(data)
            .map(ConfirmedServiceRequest::ReadProperty)
            .map_err(map_err),
        ConfirmedServiceChoice::ReadPropertyMultiple => ReadPropertyMultipleRequest::decode(data)
            .map(ConfirmedServiceRequest::ReadPropertyMultiple)
            .map_err(map_err),
        ConfirmedServiceChoice::WriteProperty => WritePropertyRequest::decode(data)
            .map(ConfirmedServiceRequest::WriteProperty)
            .map_err(map_err),
        ConfirmedServiceChoice::SubscribeCOV => SubscribeCovRequest::decode(data)
            .map(ConfirmedServiceRequest::SubscribeCov)
            .map_err(map_err),
        ConfirmedServiceChoice::SubscribeCOVProperty => SubscribeCovPropertyRequest::decode(data)
            .map(ConfirmedServiceRequest::SubscribeCovProperty)
            .map_err(map_err),
        ConfirmedServiceChoice::AtomicReadFile => AtomicReadFileRequest::decode(data)
            .map(ConfirmedServiceRequest::AtomicReadFile)
            .map_err(map_err),
        ConfirmedServiceChoice::AtomicWriteFile => AtomicWriteFileRequest::decode(data)
            .map(ConfirmedServiceRequest::AtomicWriteFile)
            .map_err(map_err),
        ConfirmedServiceChoice::ReinitializeDevice => ReinitializeDeviceRequest::decode(data)
            .map(ConfirmedServiceRequest::ReinitializeDevice)
            .map_err(map_err),
        other => {
            log::warn!("confirmed request: known but unimplemented service choice {:?}", other);
            Err(RejectReason::UnrecognizedService)
        }
    }
}

/// A decoded unconfirmed-service request, the union [`decode_unconfirmed_request`]
/// dispatches into.
#[derive(Debug, Clone, PartialEq)]
pub enum UnconfirmedServiceRequest {
    WhoIs(WhoIsRequest),
    IAm(IAmRequest),
    WhoHas(WhoHasRequest),
    IHave(IHaveRequest),
    UnconfirmedCovNotification(CovNotificationRequest),
    TimeSynchronization(TimeSynchronizationRequest),
    UtcTimeSynchronization(UtcTimeSynchronizationRequest),
}

/// Decodes an unconfirmed request's service body, given the `service_choice` octet
/// published by [`crate::app::Apdu::decode`]. Same unrecognized-service policy as
/// [`decode_confirmed_request`].
pub fn decode_unconfirmed_request(
    service_choice: u8,
    data: &[u8],
) -> core::result::Result<UnconfirmedServiceRequest, RejectReason> {
    let choice = UnconfirmedServiceChoice::try_from(service_choice).map_err(|_| {
        log::warn!("unconfirmed request: unrecognized service choice {}", service_choice);
        RejectReason::UnrecognizedService
    })?;

    let map_err = |e: EncodingError| reject_reason_for(&e);

    match choice {
        UnconfirmedServiceChoice::WhoIs => WhoIsRequest::decode(data)
            .map(UnconfirmedServiceRequest::WhoIs)
            .map_err(map_err),
        UnconfirmedServiceChoice::IAm => IAmRequest::decode(data)
            .map(UnconfirmedServiceRequest::IAm)
            .map_err(map_err),
        UnconfirmedServiceChoice::WhoHas => WhoHasRequest::decode(data)
            .map(UnconfirmedServiceRequest::WhoHas)
            .map_err(map_err),
        UnconfirmedServiceChoice::IHave => IHaveRequest::decode(data)
            .map(UnconfirmedServiceRequest::IHave)
            .map_err(map_err),
        UnconfirmedServiceChoice::UnconfirmedCOVNotification => CovNotificationRequest::decode(data)
            .map(UnconfirmedServiceRequest::UnconfirmedCovNotification)
            .map_err(map_err),
        UnconfirmedServiceChoice::TimeSynchronization => TimeSynchronizationRequest::decode(data)
            .map(UnconfirmedServiceRequest::TimeSynchronization)
            .map_err(map_err),
        UnconfirmedServiceChoice::UtcTimeSynchronization => {
            UtcTimeSynchronizationRequest::decode(data)
                .map(UnconfirmedServiceRequest::UtcTimeSynchronization)
                .map_err(map_err)
        }
        other => {
            log::warn!("unconfirmed request: known but unimplemented service choice {:?}", other);
            Err(RejectReason::UnrecognizedService)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ObjectIdentifier, ObjectType};

    #[test]
    fn test_whois_request() {
        let whois_all = WhoIsRequest::new();
        assert!(whois_all.matches(123));
        assert!(whois_all.matches(456));

        let whois_specific = WhoIsRequest::for_device(123);
        assert!(whois_specific.matches(123));
        assert!(!whois_specific.matches(124));

        let whois_range = WhoIsRequest::for_range(100, 200);
        assert!(whois_range.matches(150));
        assert!(!whois_range.matches(50));
        assert!(!whois_range.matches(250));
    }

    #[test]
    fn test_whois_encoding() {
        let mut buffer = Vec::new();

        let whois_all = WhoIsRequest::new();
        whois_all.encode(&mut buffer).unwrap();
        assert_eq!(buffer.len(), 0);

        buffer.clear();
        let whois_specific = WhoIsRequest::for_device(123);
        whois_specific.encode(&mut buffer).unwrap();
        assert!(!buffer.is_empty());

        let decoded = WhoIsRequest::decode(&buffer).unwrap();
        assert_eq!(decoded, whois_specific);
    }

    #[test]
    fn test_iam_request_round_trip() {
        let device_id = ObjectIdentifier::new(ObjectType::Device, 123);
        let iam = IAmRequest::new(device_id, 1476, 0, 999);

        let mut buffer = Vec::new();
        iam.encode(&mut buffer).unwrap();
        let decoded = IAmRequest::decode(&buffer).unwrap();
        assert_eq!(decoded, iam);
    }

    #[test]
    fn test_who_has_by_name_round_trip() {
        let request = WhoHasRequest::by_name("AI-101");
        let mut buffer = Vec::new();
        request.encode(&mut buffer).unwrap();
        let decoded = WhoHasRequest::decode(&buffer).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_who_has_by_identifier_round_trip() {
        let object_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let request = WhoHasRequest::by_identifier(object_id);
        let mut buffer = Vec::new();
        request.encode(&mut buffer).unwrap();
        let decoded = WhoHasRequest::decode(&buffer).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_i_have_round_trip() {
        let device_id = ObjectIdentifier::new(ObjectType::Device, 1);
        let object_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let request = IHaveRequest::new(device_id, object_id, "AI-101");

        let mut buffer = Vec::new();
        request.encode(&mut buffer).unwrap();
        let decoded = IHaveRequest::decode(&buffer).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_read_property_request_round_trip() {
        let object_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let read_prop = ReadPropertyRequest::new(object_id, PropertyIdentifier::PresentValue);

        let mut buffer = Vec::new();
        read_prop.encode(&mut buffer).unwrap();
        let decoded = ReadPropertyRequest::decode(&buffer).unwrap();
        assert_eq!(decoded, read_prop);

        let read_prop_array =
            ReadPropertyRequest::with_array_index(object_id, PropertyIdentifier::PriorityArray, 0);
        let mut buffer = Vec::new();
        read_prop_array.encode(&mut buffer).unwrap();
        let decoded = ReadPropertyRequest::decode(&buffer).unwrap();
        assert_eq!(decoded.property_array_index, Some(0));
    }

    #[test]
    fn test_read_property_response_round_trip() {
        let object_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let response = ReadPropertyResponse::new(
            object_id,
            PropertyIdentifier::PresentValue,
            ApplicationData::Real(72.5),
        );

        let mut buffer = Vec::new();
        response.encode(&mut buffer).unwrap();
        let decoded = ReadPropertyResponse::decode(&buffer).unwrap();
        assert_eq!(decoded.object_identifier, object_id);
        assert_eq!(decoded.property_identifier, PropertyIdentifier::PresentValue);
        assert_eq!(decoded.property_value, ApplicationData::Real(72.5));
    }

    #[test]
    fn test_write_property_request_round_trip() {
        let object_id = ObjectIdentifier::new(ObjectType::AnalogOutput, 1);
        let write_prop = WritePropertyRequest::new(
            object_id,
            PropertyIdentifier::PresentValue,
            ApplicationData::Real(40.0),
        );

        let mut buffer = Vec::new();
        write_prop.encode(&mut buffer).unwrap();
        assert!(!buffer.is_empty());

        let decoded = WritePropertyRequest::decode(&buffer).unwrap();
        assert_eq!(decoded.object_identifier, object_id);
        assert_eq!(decoded.property_identifier, PropertyIdentifier::PresentValue);
        assert_eq!(decoded.property_value, ApplicationData::Real(40.0));
        assert_eq!(decoded.priority, None);

        let write_prop_priority = WritePropertyRequest::with_priority(
            object_id,
            PropertyIdentifier::PresentValue,
            ApplicationData::Real(40.0),
            8,
        );
        let mut buffer = Vec::new();
        write_prop_priority.encode(&mut buffer).unwrap();
        let decoded = WritePropertyRequest::decode(&buffer).unwrap();
        assert_eq!(decoded.priority, Some(8));
    }

    #[test]
    fn test_read_property_multiple_request_round_trip() {
        let object_id1 = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let object_id2 = ObjectIdentifier::new(ObjectType::BinaryInput, 2);

        let prop_ref1 = PropertyReference::new(PropertyIdentifier::PresentValue);
        let prop_ref2 = PropertyReference::new(PropertyIdentifier::ObjectName);
        let prop_ref3 = PropertyReference::with_array_index(PropertyIdentifier::PriorityArray, 8);

        let spec1 = ReadAccessSpecification::new(object_id1, vec![prop_ref1, prop_ref2]);
        let spec2 = ReadAccessSpecification::new(object_id2, vec![prop_ref3]);

        let rpm_request = ReadPropertyMultipleRequest::new(vec![spec1, spec2]);

        let mut buffer = Vec::new();
        rpm_request.encode(&mut buffer).unwrap();
        let decoded = ReadPropertyMultipleRequest::decode(&buffer).unwrap();

        assert_eq!(decoded.read_access_specifications.len(), 2);
        assert_eq!(decoded.read_access_specifications[0].property_references.len(), 2);
        assert_eq!(decoded.read_access_specifications[1].property_references.len(), 1);
        assert_eq!(
            decoded.read_access_specifications[1].property_references[0].property_array_index,
            Some(8)
        );
    }

    #[test]
    fn test_read_access_result_round_trip_value_and_error() {
        let object_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let result = ReadAccessResult {
            object_identifier: object_id,
            results: vec![
                PropertyResult {
                    property_identifier: PropertyIdentifier::PresentValue,
                    property_array_index: None,
                    result: PropertyAccessResult::Value(ApplicationData::Real(21.0)),
                },
                PropertyResult {
                    property_identifier: PropertyIdentifier::Description,
                    property_array_index: None,
                    result: PropertyAccessResult::Error(ErrorClass::Property, ErrorCode::UnknownProperty),
                },
            ],
        };

        let mut buffer = Vec::new();
        result.encode(&mut buffer).unwrap();
        let (decoded, consumed) = ReadAccessResult::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded, result);
    }

    #[test]
    fn test_rpm_expansion_orders_required_list() {
        let list = PropertyList::new(
            vec![
                PropertyIdentifier::ObjectIdentifier,
                PropertyIdentifier::ObjectName,
                PropertyIdentifier::ObjectType,
            ],
            vec![PropertyIdentifier::Description],
            vec![],
        );
        assert_eq!(
            list.expand(PropertyIdentifier::Required),
            vec![
                PropertyIdentifier::ObjectIdentifier,
                PropertyIdentifier::ObjectName,
                PropertyIdentifier::ObjectType,
            ]
        );
    }

    #[test]
    fn test_read_property_multiple_response_round_trip_multiple_objects() {
        let object_id1 = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let object_id2 = ObjectIdentifier::new(ObjectType::BinaryInput, 2);

        let response = ReadPropertyMultipleResponse::new(vec![
            ReadAccessResult {
                object_identifier: object_id1,
                results: vec![PropertyResult {
                    property_identifier: PropertyIdentifier::PresentValue,
                    property_array_index: None,
                    result: PropertyAccessResult::Value(ApplicationData::Real(21.0)),
                }],
            },
            ReadAccessResult {
                object_identifier: object_id2,
                results: vec![PropertyResult {
                    property_identifier: PropertyIdentifier::ObjectName,
                    property_array_index: None,
                    result: PropertyAccessResult::Value(ApplicationData::CharacterString(
                        "BI-2".to_string(),
                    )),
                }],
            },
        ]);

        let mut buffer = Vec::new();
        response.encode(&mut buffer).unwrap();
        let decoded = ReadPropertyMultipleResponse::decode(&buffer).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_rpm_ack_encode_bounded_aborts_on_overflow() {
        let object_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let response = ReadPropertyMultipleResponse::new(vec![ReadAccessResult {
            object_identifier: object_id,
            results: vec![PropertyResult {
                property_identifier: PropertyIdentifier::PresentValue,
                property_array_index: None,
                result: PropertyAccessResult::Value(ApplicationData::Real(21.0)),
            }],
        }]);

        assert!(response.encode_bounded(1476).is_ok());
        assert_eq!(
            response.encode_bounded(1),
            Err(AbortReason::SegmentationNotSupported)
        );
    }

    #[test]
    fn test_rpm_request_rejects_implausibly_long_property_list() {
        let object_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let mut spec = ReadAccessSpecification::new(object_id, Vec::new());
        for _ in 0..=MAX_SEQUENCE_ELEMENTS {
            spec.add_property(PropertyReference::new(PropertyIdentifier::PresentValue));
        }

        let mut buffer = Vec::new();
        spec.encode(&mut buffer).unwrap();

        assert_eq!(
            ReadAccessSpecification::decode(&buffer),
            Err(EncodingError::TooManyElements)
        );
    }

    #[test]
    fn test_cov_notification_rejects_implausibly_long_value_list() {
        let subscriber_id = 1;
        let device_id = ObjectIdentifier::new(ObjectType::Device, 123);
        let object_id = ObjectIdentifier::new(ObjectType::AnalogInput, 321);
        let values = (0..=MAX_SEQUENCE_ELEMENTS)
            .map(|_| {
                CovPropertyValue::new(
                    PropertyIdentifier::PresentValue,
                    ApplicationData::Real(21.0),
                )
            })
            .collect();
        let request = CovNotificationRequest::new(subscriber_id, device_id, object_id, 456, values);

        let mut buffer = Vec::new();
        request.encode(&mut buffer).unwrap();

        assert_eq!(
            CovNotificationRequest::decode(&buffer),
            Err(EncodingError::TooManyElements)
        );
    }

    #[test]
    fn test_subscribe_cov_request_round_trip() {
        let object_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let cov_req = SubscribeCovRequest::with_lifetime(123, object_id, 3600);

        let mut buffer = Vec::new();
        cov_req.encode(&mut buffer).unwrap();
        let decoded = SubscribeCovRequest::decode(&buffer).unwrap();
        assert_eq!(decoded.subscriber_process_identifier, 123);
        assert_eq!(decoded.lifetime, Some(3600));
        assert!(!decoded.is_cancellation());

        let cancellation = SubscribeCovRequest::new(123, object_id);
        assert!(cancellation.is_cancellation());
    }

    #[test]
    fn test_cov_subscription_manager() {
        let mut manager = CovSubscriptionManager::new();

        let device_id = ObjectIdentifier::new(ObjectType::Device, 1);
        let object_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);

        let subscription = CovSubscription::new(123, device_id, object_id, 3600);
        manager.add_subscription(subscription);

        assert_eq!(manager.active_count(), 1);

        let subscriptions = manager.get_subscriptions_for_object(object_id);
        assert_eq!(subscriptions.len(), 1);
        assert_eq!(subscriptions[0].subscriber_process_identifier, 123);

        manager.update_timers(1800);
        let subscriptions = manager.get_subscriptions_for_object(object_id);
        assert_eq!(subscriptions[0].time_remaining, 1800);

        manager.update_timers(1800);
        assert_eq!(manager.active_count(), 0);

        manager.cleanup_expired();
        assert_eq!(manager.subscriptions.len(), 0);
    }

    #[test]
    fn test_cov_notification_request_round_trip() {
        let device_id = ObjectIdentifier::new(ObjectType::Device, 1);
        let object_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let values = vec![
            CovPropertyValue::new(PropertyIdentifier::PresentValue, ApplicationData::Real(25.5)),
            CovPropertyValue::new(PropertyIdentifier::StatusFlags, ApplicationData::Boolean(false)),
        ];

        let notification = CovNotificationRequest::new(123, device_id, object_id, 3600, values);

        let mut buffer = Vec::new();
        notification.encode(&mut buffer).unwrap();
        let decoded = CovNotificationRequest::decode(&buffer).unwrap();

        assert_eq!(decoded.subscriber_process_identifier, 123);
        assert_eq!(decoded.initiating_device_identifier, device_id);
        assert_eq!(decoded.monitored_object_identifier, object_id);
        assert_eq!(decoded.time_remaining, 3600);
        assert_eq!(decoded.list_of_values.len(), 2);
        assert_eq!(decoded.list_of_values[0].value, ApplicationData::Real(25.5));
    }

    #[test]
    fn test_cov_property_value_keeps_first_element_of_multi_valued_wrapper() {
        // Hand-build a value wrapper (tag 2) holding two concatenated application-data
        // elements, a shape this crate doesn't produce itself but must tolerate on
        // decode rather than rejecting the whole notification.
        let mut buffer = Vec::new();
        encode_context_enumerated(&mut buffer, u32::from(PropertyIdentifier::PresentValue), 0).unwrap();
        encode_opening_tag(&mut buffer, 2);
        crate::encoding::encode_application_real(&mut buffer, 42.0).unwrap();
        crate::encoding::encode_application_boolean(&mut buffer, true).unwrap();
        encode_closing_tag(&mut buffer, 2);

        let (decoded, consumed) = CovPropertyValue::decode(&buffer).unwrap();
        assert_eq!(consumed, buffer.len());
        assert_eq!(decoded.property_identifier, PropertyIdentifier::PresentValue);
        assert_eq!(decoded.value, ApplicationData::Real(42.0));
    }

    #[test]
    fn test_atomic_read_file_request_encoding() {
        let file_id = ObjectIdentifier::new(ObjectType::File, 1);
        let read_stream = AtomicReadFileRequest::new_stream_access(file_id, 0, 1024);
        match &read_stream.access_method {
            FileAccessMethod::StreamAccess {
                file_start_position,
                requested_octet_count,
            } => {
                assert_eq!(*file_start_position, 0);
                assert_eq!(*requested_octet_count, 1024);
            }
            _ => panic!("expected StreamAccess"),
        }

        let mut buffer = Vec::new();
        read_stream.encode(&mut buffer).unwrap();
        assert!(!buffer.is_empty());

        let decoded = AtomicReadFileRequest::decode(&buffer).unwrap();
        assert_eq!(decoded, read_stream);

        let read_record = AtomicReadFileRequest::new_record_access(file_id, 2, 10);
        let mut buffer = Vec::new();
        read_record.encode(&mut buffer).unwrap();
        assert_eq!(AtomicReadFileRequest::decode(&buffer).unwrap(), read_record);
    }

    #[test]
    fn test_atomic_read_file_response_round_trip() {
        let stream = AtomicReadFileResponse::new_stream_access(true, 0, vec![1, 2, 3, 4]);
        let mut buffer = Vec::new();
        stream.encode(&mut buffer).unwrap();
        assert_eq!(AtomicReadFileResponse::decode(&buffer).unwrap(), stream);

        let records = AtomicReadFileResponse::new_record_access(
            false,
            0,
            vec![vec![1, 2], vec![3, 4, 5]],
        );
        let mut buffer = Vec::new();
        records.encode(&mut buffer).unwrap();
        assert_eq!(AtomicReadFileResponse::decode(&buffer).unwrap(), records);
    }

    #[test]
    fn test_atomic_write_file_request_round_trip() {
        let file_id = ObjectIdentifier::new(ObjectType::File, 1);
        let stream = AtomicWriteFileRequest::new_stream_access(file_id, 0, vec![9, 8, 7]);
        let mut buffer = Vec::new();
        stream.encode(&mut buffer).unwrap();
        assert_eq!(AtomicWriteFileRequest::decode(&buffer).unwrap(), stream);

        let records =
            AtomicWriteFileRequest::new_record_access(file_id, 0, vec![vec![1], vec![2, 3]]);
        let mut buffer = Vec::new();
        records.encode(&mut buffer).unwrap();
        assert_eq!(AtomicWriteFileRequest::decode(&buffer).unwrap(), records);
    }

    #[test]
    fn test_atomic_write_file_response_encoding() {
        let response = AtomicWriteFileResponse { file_start_position: 150 };
        let mut buffer = Vec::new();
        response.encode(&mut buffer).unwrap();
        assert!(!buffer.is_empty());

        let decoded = AtomicWriteFileResponse::decode(&buffer).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_reinitialize_device_request_round_trip() {
        let request =
            ReinitializeDeviceRequest::with_password(ReinitializedState::WarmStart, "secret");
        let mut buffer = Vec::new();
        request.encode(&mut buffer).unwrap();
        let decoded = ReinitializeDeviceRequest::decode(&buffer).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_bacnet_datetime_round_trip() {
        let date = Date::new(2024, 3, 15, 5);
        let time = Time::new(14, 30, 45, 50);
        let datetime = BacnetDateTime::new(date, time);

        let unspecified = BacnetDateTime::unspecified();
        assert!(unspecified.is_unspecified());
        assert!(!datetime.is_unspecified());

        let mut buffer = Vec::new();
        datetime.encode(&mut buffer).unwrap();
        assert_eq!(buffer.len(), 10);

        let (decoded, consumed) = BacnetDateTime::decode(&buffer).unwrap();
        assert_eq!(consumed, 10);
        assert_eq!(decoded, datetime);
    }

    #[test]
    fn test_time_synchronization_request_round_trip() {
        let date = Date::new(2024, 6, 20, 4);
        let time = Time::new(10, 15, 30, 25);
        let datetime = BacnetDateTime::new(date, time);
        let time_sync = TimeSynchronizationRequest::new(datetime);

        let mut buffer = Vec::new();
        time_sync.encode(&mut buffer).unwrap();
        let decoded = TimeSynchronizationRequest::decode(&buffer).unwrap();
        assert_eq!(decoded.date_time, datetime);
    }

    #[test]
    fn test_utc_time_synchronization_request_round_trip() {
        let date = Date::new(2024, 6, 20, 4);
        let time = Time::new(18, 45, 15, 75);
        let utc_datetime = BacnetDateTime::new(date, time);
        let utc_sync = UtcTimeSynchronizationRequest::new(utc_datetime);

        let mut buffer = Vec::new();
        utc_sync.encode(&mut buffer).unwrap();
        let decoded = UtcTimeSynchronizationRequest::decode(&buffer).unwrap();
        assert_eq!(decoded.utc_date_time, utc_datetime);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_time_synchronization_now() {
        let now_sync = TimeSynchronizationRequest::now();
        assert!(!now_sync.date_time.is_unspecified());
        assert!(now_sync.date_time.date.year >= 2024);
        assert!(now_sync.date_time.time.hour <= 23);
    }

    #[test]
    fn test_reject_reason_for_maps_decode_failures() {
        assert_eq!(reject_reason_for(&EncodingError::InvalidTag), RejectReason::InvalidTag);
        assert_eq!(reject_reason_for(&EncodingError::Truncated), RejectReason::MissingRequiredParameter);
    }

    #[test]
    fn test_decode_confirmed_request_dispatches_read_property() {
        let object_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let request = ReadPropertyRequest::new(object_id, PropertyIdentifier::PresentValue);
        let mut buffer = Vec::new();
        request.encode(&mut buffer).unwrap();

        let decoded =
            decode_confirmed_request(ConfirmedServiceChoice::ReadProperty as u8, &buffer).unwrap();
        assert_eq!(decoded, ConfirmedServiceRequest::ReadProperty(request));
    }

    #[test]
    fn test_decode_confirmed_request_rejects_unrecognized_service_choice() {
        assert_eq!(
            decode_confirmed_request(0xFE, &[]),
            Err(RejectReason::UnrecognizedService)
        );
    }

    #[test]
    fn test_decode_confirmed_request_rejects_unimplemented_known_service() {
        assert_eq!(
            decode_confirmed_request(ConfirmedServiceChoice::CreateObject as u8, &[]),
            Err(RejectReason::UnrecognizedService)
        );
    }

    #[test]
    fn test_decode_unconfirmed_request_dispatches_who_is() {
        let whois = WhoIsRequest::for_range(100, 200);
        let mut buffer = Vec::new();
        whois.encode(&mut buffer).unwrap();

        let decoded =
            decode_unconfirmed_request(UnconfirmedServiceChoice::WhoIs as u8, &buffer).unwrap();
        assert_eq!(decoded, UnconfirmedServiceRequest::WhoIs(whois));
    }

    #[test]
    fn test_decode_unconfirmed_request_rejects_unrecognized_service_choice() {
        assert_eq!(
            decode_unconfirmed_request(0xFE, &[]),
            Err(RejectReason::UnrecognizedService)
        );
    }

    #[test]
    fn test_rpm_request_truncation_fails_cleanly_at_every_prefix() {
        let object_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
        let spec = ReadAccessSpecification::new(
            object_id,
            vec![PropertyReference::new(PropertyIdentifier::PresentValue)],
        );
        let request = ReadPropertyMultipleRequest::new(vec![spec]);

        let mut buffer = Vec::new();
        request.encode(&mut buffer).unwrap();

        // k=0 is excluded: an empty buffer trivially decodes as "zero read-access
        // specifications", a distinct (if practically unused) case from a truncated one.
        for k in 1..buffer.len() {
            assert!(ReadPropertyMultipleRequest::decode(&buffer[..k]).is_err());
        }
        assert!(ReadPropertyMultipleRequest::decode(&buffer).is_ok());
    }

    #[test]
    fn test_read_property_request_tag_order_permutation_is_rejected() {
        // The context tags are emitted object-id(0), property-id(1), array-index(2).
        // Swapping the first two tag cells (so the buffer opens with tag 1 where tag 0 is
        // expected) must not decode as if nothing were wrong: the reordered bytes either
        // fail to parse as the expected tag number or land on the wrong field.
        let request = ReadPropertyRequest::with_array_index(
            ObjectIdentifier::new(ObjectType::AnalogInput, 1),
            PropertyIdentifier::PresentValue,
            3,
        );
        let mut buffer = Vec::new();
        request.encode(&mut buffer).unwrap();

        let ((_, _), object_id_len) = decode_context_object_id(&buffer, 0).unwrap();
        let (_, property_id_len) = decode_context_enumerated(&buffer[object_id_len..], 1).unwrap();

        let mut swapped = Vec::new();
        swapped.extend_from_slice(&buffer[object_id_len..object_id_len + property_id_len]);
        swapped.extend_from_slice(&buffer[0..object_id_len]);
        swapped.extend_from_slice(&buffer[object_id_len + property_id_len..]);

        assert!(ReadPropertyRequest::decode(&swapped).is_err());
    }
}
