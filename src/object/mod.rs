//! BACnet object, property, and error taxonomy, plus the `ObjectDatabase` trait this
//! crate's service codecs and confirmed-request handler dispatch against.
//!
//! # Overview
//!
//! An object database is the caller's business: this crate never stores an Analog-Input
//! or a Device object. What it needs from one is narrow and is expressed here as a single
//! trait an embedding implements once, instead of the long per-object-type switch the
//! reference implementation repeats in every service handler (see the dispatch design
//! note on [`ObjectDatabase`]).
//!
//! `ObjectType` and `PropertyIdentifier` are named-range-plus-vendor-range-plus-reserved
//! enums generated by [`crate::generate_custom_enum`]: every wire value round-trips
//! through `From`/`Into`, whether or not this crate bothered to name it.
//!
//! # Example
//!
//! ```no_run
//! use bacnet_apdu::object::*;
//!
//! let obj_id = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
//! assert!(obj_id.is_valid());
//! ```

#[cfg(feature = "std")]
use std::error::Error;

#[cfg(feature = "std")]
use std::fmt;

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::encoding::ApplicationData;
use crate::generate_custom_enum;

/// Result type for object-database operations.
#[cfg(feature = "std")]
pub type Result<T> = std::result::Result<T, ObjectError>;

#[cfg(not(feature = "std"))]
pub type Result<T> = core::result::Result<T, ObjectError>;

/// Errors an `ObjectDatabase` implementation can report back through this crate's
/// dispatch helpers.
#[derive(Debug)]
pub enum ObjectError {
    NotFound,
    UnknownProperty,
    PropertyNotWritable,
    InvalidPropertyType,
    InvalidValue(String),
    WriteAccessDenied,
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectError::NotFound => write!(f, "object not found"),
            ObjectError::UnknownProperty => write!(f, "unknown property"),
            ObjectError::PropertyNotWritable => write!(f, "property not writable"),
            ObjectError::InvalidPropertyType => write!(f, "invalid property type"),
            ObjectError::InvalidValue(msg) => write!(f, "invalid value: {}", msg),
            ObjectError::WriteAccessDenied => write!(f, "write access denied"),
        }
    }
}

#[cfg(feature = "std")]
impl Error for ObjectError {}

generate_custom_enum! {
    /// BACnet object type (clause 21, object type table). The 10-bit field that
    /// packs into the high bits of an object identifier reserves 128..=1023 for
    /// vendor-proprietary object types; everything between the last standard value
    /// and 128 is `Reserved` rather than `Custom`.
    ObjectType {
        AnalogInput = 0,
        AnalogOutput = 1,
        AnalogValue = 2,
        BinaryInput = 3,
        BinaryOutput = 4,
        BinaryValue = 5,
        Calendar = 6,
        Command = 7,
        Device = 8,
        EventEnrollment = 9,
        File = 10,
        Group = 11,
        Loop = 12,
        MultiStateInput = 13,
        MultiStateOutput = 14,
        NotificationClass = 15,
        Program = 16,
        Schedule = 17,
        Averaging = 18,
        MultiStateValue = 19,
        TrendLog = 20,
        LifeSafetyPoint = 21,
        LifeSafetyZone = 22,
        Accumulator = 23,
        PulseConverter = 24,
        EventLog = 25,
        GlobalGroup = 26,
        TrendLogMultiple = 27,
        LoadControl = 28,
        StructuredView = 29,
        AccessDoor = 30,
        Timer = 31,
        AccessCredential = 32,
        AccessPoint = 33,
        AccessRights = 34,
        AccessUser = 35,
        AccessZone = 36,
        CredentialDataInput = 37,
        NetworkSecurity = 38,
        BitstringValue = 39,
        CharacterStringValue = 40,
        DatePatternValue = 41,
        DateValue = 42,
        DatetimePatternValue = 43,
        DatetimeValue = 44,
        IntegerValue = 45,
        LargeAnalogValue = 46,
        OctetStringValue = 47,
        PositiveIntegerValue = 48,
        TimePatternValue = 49,
        TimeValue = 50,
        NotificationForwarder = 51,
        AlertEnrollment = 52,
        Channel = 53,
        LightingOutput = 54,
        BinaryLightingOutput = 55,
        NetworkPort = 56,
    },
    u16,
    128..=1023
}

generate_custom_enum! {
    /// BACnet property identifier (clause 21, property identifier table), including
    /// the RPM special-property sentinels `All`/`Required`/`Optional`. Values
    /// 512..=4_194_302 are the vendor-proprietary range per `bacnet-stack`'s
    /// `property_list_count`/`RPM_Property_List` usage.
    PropertyIdentifier {
        AckedTransitions = 0,
        AckRequired = 1,
        Action = 2,
        ActionText = 3,
        ActiveText = 4,
        ActiveVtSessions = 5,
        AlarmValue = 6,
        AlarmValues = 7,
        All = 8,
        AllWritesSuccessful = 9,
        ApduSegmentTimeout = 10,
        ApduTimeout = 11,
        ApplicationSoftwareVersion = 12,
        Archive = 13,
        Bias = 14,
        ChangeOfStateCount = 15,
        ChangeOfStateTime = 16,
        NotificationClass = 17,
        Optional = 80,
        DatabaseRevision = 155,
        Description = 28,
        DeviceAddressBinding = 30,
        DeviceType = 31,
        EventEnable = 35,
        EventState = 36,
        FileAccessMethod = 41,
        FileSize = 42,
        FileType = 43,
        FirmwareRevision = 44,
        HighLimit = 45,
        InactiveText = 46,
        LimitEnable = 52,
        LocalDate = 56,
        LocalTime = 57,
        Location = 58,
        LowLimit = 59,
        MaxApduLengthAccepted = 62,
        MaxInfoFrames = 63,
        MaxMaster = 64,
        MaxPresValue = 65,
        MinPresValue = 69,
        ModelName = 70,
        ModificationDate = 71,
        NotifyType = 72,
        NumberOfApduRetries = 73,
        NumberOfStates = 74,
        ObjectIdentifier = 75,
        ObjectList = 76,
        ObjectName = 77,
        ObjectPropertyReference = 78,
        ObjectType = 79,
        OutOfService = 81,
        OutputUnits = 82,
        EventParameters = 83,
        Polarity = 84,
        PresentValue = 85,
        Priority = 86,
        PriorityArray = 87,
        PriorityForWriting = 88,
        ProcessIdentifier = 89,
        ProgramChange = 90,
        ProgramLocation = 91,
        ProgramState = 92,
        ProportionalConstant = 93,
        ProportionalConstantUnits = 94,
        ProtocolConformanceClass = 95,
        ProtocolObjectTypesSupported = 96,
        ProtocolServicesSupported = 97,
        ProtocolVersion = 98,
        ReadOnly = 99,
        ReasonForHalt = 100,
        Recipient = 101,
        RecipientList = 102,
        Reliability = 103,
        RelinquishDefault = 104,
        Required = 105,
        Resolution = 106,
        SegmentationSupported = 107,
        Setpoint = 108,
        StatusFlags = 111,
        SystemStatus = 112,
        TimeDelay = 113,
        TimeOfActiveTimeReset = 114,
        TimeOfStateCountReset = 115,
        UpdateInterval = 118,
        UtcOffset = 119,
        VendorIdentifier = 120,
        VendorName = 121,
        VtClassesSupported = 122,
        WeeklySchedule = 123,
        AttemptedSamples = 124,
        AverageValue = 125,
        BufferSize = 126,
        ClientCoveIncrement = 127,
        CovResubscriptionInterval = 128,
        EventTimeStamps = 130,
        LogBuffer = 131,
        LogDeviceObjectProperty = 132,
        Enable = 133,
        LogInterval = 134,
        MaximumValue = 135,
        MinimumValue = 136,
        NotificationThreshold = 137,
        PreviousNotifyTime = 138,
        ProtocolRevision = 139,
        RecordsSinceNotification = 140,
        RecordCount = 141,
        StartTime = 142,
        StopTime = 143,
        StopWhenFull = 144,
        TotalRecordCount = 145,
        ValidFrom = 146,
        ValidTo = 147,
        WindowInterval = 148,
        WindowSamples = 149,
        MaximumValueTimestamp = 150,
        MinimumValueTimestamp = 151,
        VarianceValue = 152,
        ActiveCovSubscriptions = 153,
        BacnetIpGlobalAddress = 407,
    },
    u32,
    512..=4_194_302
}

generate_custom_enum! {
    /// Error-class enumeration (clause 18, `BACnetErrorClass`), used by Error PDUs and
    /// by RPM-ack per-property error entries.
    ErrorClass {
        Device = 0,
        Object = 1,
        Property = 2,
        Resources = 3,
        Security = 4,
        Services = 5,
        Vt = 6,
        Communication = 7,
    },
    u32,
    64..=65535
}

generate_custom_enum! {
    /// Error-code enumeration (clause 18, `BACnetErrorCode`). Pairing validity between
    /// a given class and its codes is a semantic convention this crate documents but
    /// does not enforce structurally — ASHRAE 135 does not partition codes strictly by
    /// class either.
    ErrorCode {
        Other = 0,
        AuthenticationFailed = 1,
        ConfigurationInProgress = 2,
        DeviceBusy = 3,
        DynamicCreationNotSupported = 4,
        FileAccessDenied = 5,
        IncompatibleSecurityLevels = 6,
        InconsistentParameters = 7,
        InconsistentSelectionCriterion = 8,
        InvalidDataType = 9,
        InvalidFileAccessMethod = 10,
        InvalidFileStartPosition = 11,
        InvalidOperatorName = 12,
        InvalidParameterDataType = 13,
        InvalidTimeStamp = 14,
        KeyGenerationError = 15,
        MissingRequiredParameter = 16,
        NoObjectsOfSpecifiedType = 17,
        NoSpaceForObject = 18,
        NoSpaceToAddListElement = 19,
        NoSpaceToWriteProperty = 20,
        NoVtSessionsAvailable = 21,
        PropertyIsNotAList = 22,
        ObjectDeletionNotPermitted = 23,
        ObjectIdentifierAlreadyExists = 24,
        OperationalProblem = 25,
        PasswordFailure = 26,
        ReadAccessDenied = 27,
        SecurityNotSupported = 28,
        ServiceRequestDenied = 29,
        Timeout = 30,
        UnknownObject = 31,
        UnknownProperty = 32,
        UnknownVtClass = 34,
        UnknownVtSession = 35,
        UnsupportedObjectType = 36,
        ValueOutOfRange = 37,
        VtSessionAlreadyClosed = 38,
        VtSessionTerminationFailure = 39,
        WriteAccessDenied = 40,
        CharacterSetNotSupported = 41,
        InvalidArrayIndex = 42,
        CovSubscriptionFailed = 43,
        NotCovProperty = 44,
        OptionalFunctionalityNotSupported = 45,
        InvalidConfigurationData = 46,
        DatatypeNotSupported = 47,
        DuplicateName = 48,
        DuplicateObjectId = 49,
        PropertyIsNotAnArray = 50,
    },
    u32,
    256..=65535
}

/// Object identifier (type + instance number), clause 20.2.14. Packs into 32 bits as
/// 10 bits of type and 22 bits of instance; `0x3FFFFF` is the `ObjectIdentifier`
/// wildcard ("MAX_INSTANCE" / `ARRAY_ALL`'s object-id analogue) and is considered valid
/// by [`ObjectIdentifier::is_valid`] since it is a legal value on the wire, just not a
/// concrete object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectIdentifier {
    pub object_type: ObjectType,
    pub instance: u32,
}

impl ObjectIdentifier {
    pub fn new(object_type: ObjectType, instance: u32) -> Self {
        Self { object_type, instance }
    }

    /// Check if the instance number fits the 22-bit field (0..=4_194_303).
    pub fn is_valid(&self) -> bool {
        self.instance <= 0x3FFFFF
    }
}

/// Describes an object type's three property sub-lists (required, optional,
/// proprietary), used to expand the RPM special-property sentinels `All`, `Required`,
/// and `Optional` into a concrete property sequence at ack-encode time.
///
/// The reference implementation threads these as a `-1`-terminated C array walked by a
/// cursor that `property_list_count` (see the design notes) forgets to advance, looping
/// forever on any non-empty list. A Rust slice has a real length, so there is no cursor
/// to forget to advance — the bug class does not exist in this representation.
#[derive(Debug, Clone, Default)]
pub struct PropertyList {
    pub required: Vec<PropertyIdentifier>,
    pub optional: Vec<PropertyIdentifier>,
    pub proprietary: Vec<PropertyIdentifier>,
}

impl PropertyList {
    pub fn new(
        required: Vec<PropertyIdentifier>,
        optional: Vec<PropertyIdentifier>,
        proprietary: Vec<PropertyIdentifier>,
    ) -> Self {
        Self { required, optional, proprietary }
    }

    /// Expands an RPM property selector into a concrete property sequence. `All` is
    /// required ∥ optional ∥ proprietary in that order; `Required`/`Optional` restrict
    /// to their matching sub-list; any other property identifier expands to itself.
    pub fn expand(&self, selector: PropertyIdentifier) -> Vec<PropertyIdentifier> {
        match selector {
            PropertyIdentifier::All => {
                let mut all = self.required.clone();
                all.extend(self.optional.clone());
                all.extend(self.proprietary.clone());
                all
            }
            PropertyIdentifier::Required => self.required.clone(),
            PropertyIdentifier::Optional => self.optional.clone(),
            other => alloc_vec_of(other),
        }
    }
}

#[cfg(feature = "std")]
fn alloc_vec_of(property: PropertyIdentifier) -> Vec<PropertyIdentifier> {
    std::vec![property]
}

#[cfg(not(feature = "std"))]
fn alloc_vec_of(property: PropertyIdentifier) -> Vec<PropertyIdentifier> {
    alloc::vec![property]
}

/// The downstream interface this crate's service codecs and confirmed-request handler
/// dispatch against. An embedding implements this trait once to plug in its own object
/// store and data-link; this crate never stores an object or owns a socket.
///
/// **Dispatch design note**: the reference implementation repeats a long `switch` over
/// object type in every service handler, dispatching to one of several dozen
/// `<Type>_Read_Property`/`<Type>_Write_Property` functions. This trait collapses that
/// into one virtual call per property, regardless of how many object types an embedding
/// supports — "dispatch" becomes a trait-object call, not a match arm repeated per
/// service.
pub trait ObjectDatabase {
    /// Caller-defined network address type (e.g. a BACnet/IP socket address or an
    /// MS/TP station number). Opaque to this crate.
    type Address;

    /// Returns the required/optional/proprietary property lists for an object type, used
    /// to expand the RPM special-property sentinels.
    fn object_property_lists(&self, object_type: ObjectType) -> PropertyList;

    /// Encodes one property's value as application data into `out_buf`, returning the
    /// number of octets written, or an error-class/code pair on failure (unknown object,
    /// unknown property, invalid array index, …).
    fn object_encode_property(
        &self,
        object_type: ObjectType,
        instance: u32,
        property: PropertyIdentifier,
        array_index: Option<u32>,
        out_buf: &mut Vec<u8>,
    ) -> core::result::Result<usize, (ErrorClass, ErrorCode)>;

    /// Writes one property's value, or returns an error-class/code pair (write-access-
    /// denied, invalid data type, value-out-of-range, …).
    fn object_write_property(
        &mut self,
        object_type: ObjectType,
        instance: u32,
        property: PropertyIdentifier,
        array_index: Option<u32>,
        value: &ApplicationData,
        priority: Option<u8>,
    ) -> core::result::Result<(), (ErrorClass, ErrorCode)>;

    /// Whether `instance` names a live object of `object_type`.
    fn object_valid_instance(&self, object_type: ObjectType, instance: u32) -> bool;

    /// This device's own instance number, for populating I-Am and error PDUs.
    fn device_instance_number(&self) -> u32;

    /// Sends `buffer` to `destination`, returning the number of octets actually sent, or
    /// `None` on failure (in place of the reference implementation's negative-length
    /// sentinel).
    fn datalink_send_pdu(&mut self, destination: &Self::Address, buffer: &[u8]) -> Option<usize>;

    /// This device's own data-link address.
    fn datalink_get_my_address(&self) -> Self::Address;

    /// The data-link's broadcast address.
    fn datalink_get_broadcast_address(&self) -> Self::Address;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_type_round_trips_named_custom_and_reserved() {
        assert_eq!(ObjectType::from(8u16), ObjectType::Device);
        assert_eq!(u16::from(ObjectType::Device), 8);

        match ObjectType::from(200u16) {
            ObjectType::Custom(v) => assert_eq!(v.value(), 200),
            other => panic!("expected Custom, got {:?}", other),
        }

        match ObjectType::from(100u16) {
            ObjectType::Reserved(v) => assert_eq!(v.value(), 100),
            other => panic!("expected Reserved, got {:?}", other),
        }
    }

    #[test]
    fn property_identifier_recognizes_rpm_sentinels() {
        assert_eq!(PropertyIdentifier::from(8u32), PropertyIdentifier::All);
        assert_eq!(PropertyIdentifier::from(105u32), PropertyIdentifier::Required);
        assert_eq!(PropertyIdentifier::from(80u32), PropertyIdentifier::Optional);
    }

    #[test]
    fn property_list_expands_all_as_required_then_optional_then_proprietary() {
        let list = PropertyList::new(
            Vec::from([PropertyIdentifier::ObjectIdentifier, PropertyIdentifier::ObjectName]),
            Vec::from([PropertyIdentifier::Description]),
            Vec::from([PropertyIdentifier::from(600u32)]),
        );

        let expanded = list.expand(PropertyIdentifier::All);
        assert_eq!(
            expanded,
            Vec::from([
                PropertyIdentifier::ObjectIdentifier,
                PropertyIdentifier::ObjectName,
                PropertyIdentifier::Description,
                PropertyIdentifier::from(600u32),
            ])
        );
        assert_eq!(list.expand(PropertyIdentifier::Required).len(), 2);
        assert_eq!(list.expand(PropertyIdentifier::Optional).len(), 1);
    }

    #[test]
    fn property_list_expands_plain_property_to_itself() {
        let list = PropertyList::default();
        assert_eq!(
            list.expand(PropertyIdentifier::PresentValue),
            Vec::from([PropertyIdentifier::PresentValue])
        );
    }

    #[test]
    fn object_identifier_validity_matches_22_bit_field() {
        let valid = ObjectIdentifier::new(ObjectType::AnalogInput, 0x3FFFFF);
        assert!(valid.is_valid());
        let invalid = ObjectIdentifier::new(ObjectType::AnalogInput, 0x400000);
        assert!(!invalid.is_valid());
    }
}
