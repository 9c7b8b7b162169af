//! The application-data tagged union: picks a primitive decoder from the tag cell alone,
//! the shape property values and service parameters take whenever their type is "whatever
//! the sender chose to put here" rather than fixed by the surrounding service.
//!
//! This consolidates what the teacher previously expressed as two separate, divergent
//! `PropertyValue` enums (one under `property.rs`, one under `object::mod`) into a single
//! type used throughout the service codecs.

use super::bitstring::{decode_application_bitstring, encode_application_bitstring, BitString};
use super::{
    decode_application_boolean, decode_application_character_string, decode_application_date,
    decode_application_double, decode_application_enumerated, decode_application_object_id,
    decode_application_octet_string, decode_application_real, decode_application_signed,
    decode_application_time, decode_application_unsigned, encode_application_boolean,
    encode_application_character_string, encode_application_date, encode_application_double,
    encode_application_enumerated, encode_application_object_id, encode_application_octet_string,
    encode_application_real, encode_application_signed, encode_application_time,
    encode_application_unsigned, get_application_tag, ApplicationTag, Date, EncodingError, Result, Time,
};

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

/// A decoded application-tagged value, holding whichever primitive the tag cell names.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ApplicationData {
    Null,
    Boolean(bool),
    Unsigned(u32),
    Signed(i32),
    Real(f32),
    Double(f64),
    OctetString(Vec<u8>),
    CharacterString(String),
    BitString(BitString),
    Enumerated(u32),
    Date(Date),
    Time(Time),
    ObjectIdentifier(u16, u32),
}

impl ApplicationData {
    /// Encodes this value using the matching application-tagged primitive encoder.
    pub fn encode(&self, buffer: &mut Vec<u8>) -> Result<()> {
        match self {
            ApplicationData::Null => {
                buffer.push((ApplicationTag::Null as u8) << 4);
                Ok(())
            }
            ApplicationData::Boolean(v) => encode_application_boolean(buffer, *v),
            ApplicationData::Unsigned(v) => encode_application_unsigned(buffer, *v),
            ApplicationData::Signed(v) => encode_application_signed(buffer, *v),
            ApplicationData::Real(v) => encode_application_real(buffer, *v),
            ApplicationData::Double(v) => encode_application_double(buffer, *v),
            ApplicationData::OctetString(v) => encode_application_octet_string(buffer, v),
            ApplicationData::CharacterString(v) => encode_application_character_string(buffer, v),
            ApplicationData::BitString(v) => encode_application_bitstring(buffer, v),
            ApplicationData::Enumerated(v) => encode_application_enumerated(buffer, *v),
            ApplicationData::Date(v) => encode_application_date(buffer, *v),
            ApplicationData::Time(v) => encode_application_time(buffer, *v),
            ApplicationData::ObjectIdentifier(t, i) => encode_application_object_id(buffer, *t, *i),
        }
    }

    /// Decodes one application-tagged value, dispatching purely on the tag it peeks.
    /// Returns `(value, consumed)`.
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let tag = get_application_tag(data)?;
        match tag {
            ApplicationTag::Null => {
                let (_, length, consumed) = super::decode_application_tag(data)?;
                if length != 0 {
                    return Err(EncodingError::OutOfRange);
                }
                Ok((ApplicationData::Null, consumed))
            }
            ApplicationTag::Boolean => {
                let (v, consumed) = decode_application_boolean(data)?;
                Ok((ApplicationData::Boolean(v), consumed))
            }
            ApplicationTag::UnsignedInt => {
                let (v, consumed) = decode_application_unsigned(data)?;
                Ok((ApplicationData::Unsigned(v), consumed))
            }
            ApplicationTag::SignedInt => {
                let (v, consumed) = decode_application_signed(data)?;
                Ok((ApplicationData::Signed(v), consumed))
            }
            ApplicationTag::Real => {
                let (v, consumed) = decode_application_real(data)?;
                Ok((ApplicationData::Real(v), consumed))
            }
            ApplicationTag::Double => {
                let (v, consumed) = decode_application_double(data)?;
                Ok((ApplicationData::Double(v), consumed))
            }
            ApplicationTag::OctetString => {
                let (v, consumed) = decode_application_octet_string(data)?;
                Ok((ApplicationData::OctetString(v), consumed))
            }
            ApplicationTag::CharacterString => {
                let (v, consumed) = decode_application_character_string(data)?;
                Ok((ApplicationData::CharacterString(v), consumed))
            }
            ApplicationTag::BitString => {
                let (v, consumed) = decode_application_bitstring(data)?;
                Ok((ApplicationData::BitString(v), consumed))
            }
            ApplicationTag::Enumerated => {
                let (v, consumed) = decode_application_enumerated(data)?;
                Ok((ApplicationData::Enumerated(v), consumed))
            }
            ApplicationTag::Date => {
                let (v, consumed) = decode_application_date(data)?;
                Ok((ApplicationData::Date(v), consumed))
            }
            ApplicationTag::Time => {
                let (v, consumed) = decode_application_time(data)?;
                Ok((ApplicationData::Time(v), consumed))
            }
            ApplicationTag::ObjectIdentifier => {
                let ((t, i), consumed) = decode_application_object_id(data)?;
                Ok((ApplicationData::ObjectIdentifier(t, i), consumed))
            }
            ApplicationTag::Reserved13 | ApplicationTag::Reserved14 | ApplicationTag::Reserved15 => {
                Err(EncodingError::InvalidTag)
            }
        }
    }
}
