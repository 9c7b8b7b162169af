//! Tag, primitive, and application-data codec for BACnet application-layer PDUs.
//!
//! This module provides encoding and decoding for BACnet's tag-length-value (TLV) wire
//! format as defined by ASHRAE 135 clause 20: the tag cell itself (§20.2), the primitive
//! value types built on top of it (§20.2.1 onward), and the tagged-union
//! [`ApplicationData`] container that picks the right primitive decoder from a tag alone.
//!
//! # Application tags
//!
//! | Tag | Type | Description |
//! |-----|------|-------------|
//! | 0 | Null | No value |
//! | 1 | Boolean | True/False |
//! | 2 | Unsigned Integer | 8, 16, 24, or 32-bit unsigned |
//! | 3 | Signed Integer | 8, 16, 24, or 32-bit signed |
//! | 4 | Real | 32-bit IEEE 754 float |
//! | 5 | Double | 64-bit IEEE 754 double |
//! | 6 | Octet String | Arbitrary byte sequence |
//! | 7 | Character String | Text with encoding indicator |
//! | 8 | Bit String | Bit field with unused bits count |
//! | 9 | Enumerated | Unsigned integer representing enumeration |
//! | 10 | Date | Year, month, day, day-of-week |
//! | 11 | Time | Hour, minute, second, hundredths |
//! | 12 | Object Identifier | Object type and instance |
//!
//! # Examples
//!
//! ```rust
//! use bacnet_apdu::encoding::{encode_application_unsigned, decode_application_unsigned};
//!
//! let mut buffer = Vec::new();
//! encode_application_unsigned(&mut buffer, 42).unwrap();
//! let (value, consumed) = decode_application_unsigned(&buffer).unwrap();
//! assert_eq!(value, 42);
//! assert_eq!(consumed, buffer.len());
//! ```

#[cfg(feature = "std")]
use std::error::Error;

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(feature = "std")]
use std::fmt;

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec, vec::Vec};

pub mod application_data;
pub mod bitstring;
pub mod context;

pub use application_data::ApplicationData;
pub use bitstring::BitString;
pub use context::{
    decode_context_bitstring, decode_context_boolean, decode_context_character_string,
    decode_context_date, decode_context_enumerated, decode_context_object_id,
    decode_context_octet_string, decode_context_real, decode_context_signed, decode_context_tag,
    decode_context_tag_header, decode_context_time, decode_context_unsigned,
    encode_context_bitstring, encode_context_boolean, encode_context_character_string,
    encode_context_date, encode_context_enumerated, encode_context_object_id,
    encode_context_octet_string, encode_context_real, encode_context_signed, encode_context_tag,
    encode_context_time, encode_context_unsigned, encode_closing_tag, encode_opening_tag,
    is_closing, is_context, is_opening, skip_constructed,
};

/// Result type for encoding operations
#[cfg(feature = "std")]
pub type Result<T> = std::result::Result<T, EncodingError>;

#[cfg(not(feature = "std"))]
pub type Result<T> = core::result::Result<T, EncodingError>;

/// Errors that can occur during encoding/decoding operations.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodingError {
    /// Output would exceed the caller-supplied maximum APDU bound.
    BufferOverflow,
    /// The buffer ended before the declared length was satisfied.
    Truncated,
    /// The tag header itself is malformed (bad length-class/flag combination).
    InvalidTag,
    /// A context tag was present but its number did not match what the caller expected.
    WrongTag,
    /// A value violated a domain constraint (width, range, or character-set legality).
    OutOfRange,
    /// A bounded sequence (RPM property list, COV value list) exceeded its declared capacity.
    TooManyElements,
    /// A descriptive failure that does not fit the other variants (e.g. invalid UTF-8).
    InvalidFormat(String),
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingError::BufferOverflow => write!(f, "buffer overflow during encoding"),
            EncodingError::Truncated => write!(f, "buffer ended before declared length"),
            EncodingError::InvalidTag => write!(f, "malformed tag header"),
            EncodingError::WrongTag => write!(f, "context tag number did not match"),
            EncodingError::OutOfRange => write!(f, "value out of valid range"),
            EncodingError::TooManyElements => write!(f, "sequence exceeded its declared capacity"),
            EncodingError::InvalidFormat(msg) => write!(f, "invalid format: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl Error for EncodingError {}

/// BACnet application tag numbers (ASHRAE 135 table 20-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ApplicationTag {
    Null = 0,
    Boolean = 1,
    UnsignedInt = 2,
    SignedInt = 3,
    Real = 4,
    Double = 5,
    OctetString = 6,
    CharacterString = 7,
    BitString = 8,
    Enumerated = 9,
    Date = 10,
    Time = 11,
    ObjectIdentifier = 12,
    Reserved13 = 13,
    Reserved14 = 14,
    Reserved15 = 15,
}

impl TryFrom<u8> for ApplicationTag {
    type Error = EncodingError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ApplicationTag::Null),
            1 => Ok(ApplicationTag::Boolean),
            2 => Ok(ApplicationTag::UnsignedInt),
            3 => Ok(ApplicationTag::SignedInt),
            4 => Ok(ApplicationTag::Real),
            5 => Ok(ApplicationTag::Double),
            6 => Ok(ApplicationTag::OctetString),
            7 => Ok(ApplicationTag::CharacterString),
            8 => Ok(ApplicationTag::BitString),
            9 => Ok(ApplicationTag::Enumerated),
            10 => Ok(ApplicationTag::Date),
            11 => Ok(ApplicationTag::Time),
            12 => Ok(ApplicationTag::ObjectIdentifier),
            other => {
                log::debug!("application tag: unrecognized tag number {}", other);
                Err(EncodingError::InvalidTag)
            }
        }
    }
}

/// Encodes an application tag header (tag number < 15, i.e. not context-tagged).
///
/// For `length < 5` this writes a single octet. Longer lengths spill into the
/// extended length-class octets (1, 2, or 4 bytes) per clause 20.2.1.3.
pub fn encode_application_tag(buffer: &mut Vec<u8>, tag: ApplicationTag, length: usize) -> Result<()> {
    let tag_byte = if length < 5 {
        (tag as u8) << 4 | (length as u8)
    } else {
        (tag as u8) << 4 | 5
    };

    buffer.push(tag_byte);
    encode_extended_length(buffer, length);
    Ok(())
}

pub(crate) fn encode_extended_length(buffer: &mut Vec<u8>, length: usize) {
    if length >= 5 {
        if length < 254 {
            buffer.push(length as u8);
        } else if length < 65536 {
            buffer.push(254);
            buffer.extend_from_slice(&(length as u16).to_be_bytes());
        } else {
            buffer.push(255);
            buffer.extend_from_slice(&(length as u32).to_be_bytes());
        }
    }
}

pub(crate) fn decode_extended_length(data: &[u8], raw_length: usize) -> Result<(usize, usize)> {
    if raw_length != 5 {
        return Ok((raw_length, 0));
    }
    if data.is_empty() {
        return Err(EncodingError::Truncated);
    }
    let len_byte = data[0];
    if len_byte < 254 {
        Ok((len_byte as usize, 1))
    } else if len_byte == 254 {
        if data.len() < 3 {
            return Err(EncodingError::Truncated);
        }
        Ok((u16::from_be_bytes([data[1], data[2]]) as usize, 3))
    } else {
        if data.len() < 5 {
            return Err(EncodingError::Truncated);
        }
        Ok((u32::from_be_bytes([data[1], data[2], data[3], data[4]]) as usize, 5))
    }
}

/// Decodes an application tag header. Returns `(tag, length, consumed)`.
pub fn decode_application_tag(data: &[u8]) -> Result<(ApplicationTag, usize, usize)> {
    if data.is_empty() {
        log::debug!("application tag header: truncated, buffer empty");
        return Err(EncodingError::InvalidTag);
    }

    let tag_byte = data[0];
    let tag = ApplicationTag::try_from(tag_byte >> 4)?;
    let raw_length = (tag_byte & 0x0F) as usize;
    let (length, extra) = decode_extended_length(&data[1..], raw_length)?;

    Ok((tag, length, 1 + extra))
}

/// Peeks the application tag of the next cell without consuming any bytes.
pub fn get_application_tag(data: &[u8]) -> Result<ApplicationTag> {
    if data.is_empty() {
        return Err(EncodingError::Truncated);
    }
    ApplicationTag::try_from(data[0] >> 4)
}

/// Encodes a BACnet application-tagged boolean value.
pub fn encode_application_boolean(buffer: &mut Vec<u8>, value: bool) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Boolean, if value { 1 } else { 0 })
}

/// Decodes a BACnet application-tagged boolean value.
pub fn decode_application_boolean(data: &[u8]) -> Result<(bool, usize)> {
    let (tag, length, consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::Boolean {
        return Err(EncodingError::WrongTag);
    }
    let value = match length {
        0 => false,
        1 => true,
        _ => return Err(EncodingError::OutOfRange),
    };
    Ok((value, consumed))
}

pub(crate) fn minimal_unsigned_bytes(value: u32) -> Vec<u8> {
    if value == 0 {
        vec![0]
    } else if value <= 0xFF {
        vec![value as u8]
    } else if value <= 0xFFFF {
        (value as u16).to_be_bytes().to_vec()
    } else if value <= 0xFF_FFFF {
        (value as u32).to_be_bytes()[1..].to_vec()
    } else {
        (value as u32).to_be_bytes().to_vec()
    }
}

pub(crate) fn decode_unsigned_bytes(data: &[u8], length: usize) -> Result<u32> {
    match length {
        1 => Ok(data[0] as u32),
        2 => Ok(u16::from_be_bytes([data[0], data[1]]) as u32),
        3 => Ok(u32::from_be_bytes([0, data[0], data[1], data[2]])),
        4 => Ok(u32::from_be_bytes([data[0], data[1], data[2], data[3]])),
        0 => Ok(0),
        _ => Err(EncodingError::OutOfRange),
    }
}

/// Encodes a BACnet application-tagged unsigned integer (minimum-octet encoding).
pub fn encode_application_unsigned(buffer: &mut Vec<u8>, value: u32) -> Result<()> {
    let bytes = minimal_unsigned_bytes(value);
    encode_application_tag(buffer, ApplicationTag::UnsignedInt, bytes.len())?;
    buffer.extend_from_slice(&bytes);
    Ok(())
}

/// Decodes a BACnet application-tagged unsigned integer.
pub fn decode_application_unsigned(data: &[u8]) -> Result<(u32, usize)> {
    let (tag, length, consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::UnsignedInt {
        return Err(EncodingError::WrongTag);
    }
    if data.len() < consumed + length {
        return Err(EncodingError::Truncated);
    }
    let value = decode_unsigned_bytes(&data[consumed..consumed + length], length)?;
    Ok((value, consumed + length))
}

pub(crate) fn minimal_signed_bytes(value: i32) -> Vec<u8> {
    if (-128..=127).contains(&value) {
        vec![value as i8 as u8]
    } else if (-32768..=32767).contains(&value) {
        (value as i16).to_be_bytes().to_vec()
    } else if (-8_388_608..=8_388_607).contains(&value) {
        (value as i32).to_be_bytes()[1..].to_vec()
    } else {
        (value as i32).to_be_bytes().to_vec()
    }
}

pub(crate) fn decode_signed_bytes(data: &[u8], length: usize) -> Result<i32> {
    match length {
        1 => Ok(data[0] as i8 as i32),
        2 => Ok(i16::from_be_bytes([data[0], data[1]]) as i32),
        3 => {
            let sign_extend = if data[0] & 0x80 != 0 { 0xFF } else { 0x00 };
            Ok(i32::from_be_bytes([sign_extend, data[0], data[1], data[2]]))
        }
        4 => Ok(i32::from_be_bytes([data[0], data[1], data[2], data[3]])),
        _ => Err(EncodingError::OutOfRange),
    }
}

/// Encodes a BACnet application-tagged signed integer (two's complement, minimum octets).
pub fn encode_application_signed(buffer: &mut Vec<u8>, value: i32) -> Result<()> {
    let bytes = minimal_signed_bytes(value);
    encode_application_tag(buffer, ApplicationTag::SignedInt, bytes.len())?;
    buffer.extend_from_slice(&bytes);
    Ok(())
}

/// Decodes a BACnet application-tagged signed integer.
pub fn decode_application_signed(data: &[u8]) -> Result<(i32, usize)> {
    let (tag, length, consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::SignedInt {
        return Err(EncodingError::WrongTag);
    }
    if data.len() < consumed + length {
        return Err(EncodingError::Truncated);
    }
    let value = decode_signed_bytes(&data[consumed..consumed + length], length)?;
    Ok((value, consumed + length))
}

/// Encodes a BACnet application-tagged real (32-bit IEEE-754) value.
pub fn encode_application_real(buffer: &mut Vec<u8>, value: f32) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Real, 4)?;
    buffer.extend_from_slice(&value.to_be_bytes());
    Ok(())
}

/// Decodes a BACnet application-tagged real (32-bit IEEE-754) value.
pub fn decode_application_real(data: &[u8]) -> Result<(f32, usize)> {
    let (tag, length, consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::Real {
        return Err(EncodingError::WrongTag);
    }
    if length != 4 {
        return Err(EncodingError::OutOfRange);
    }
    if data.len() < consumed + 4 {
        return Err(EncodingError::Truncated);
    }
    let value = f32::from_be_bytes(data[consumed..consumed + 4].try_into().unwrap());
    Ok((value, consumed + 4))
}

/// Encodes a BACnet application-tagged double (64-bit IEEE-754) value.
pub fn encode_application_double(buffer: &mut Vec<u8>, value: f64) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Double, 8)?;
    buffer.extend_from_slice(&value.to_be_bytes());
    Ok(())
}

/// Decodes a BACnet application-tagged double (64-bit IEEE-754) value.
pub fn decode_application_double(data: &[u8]) -> Result<(f64, usize)> {
    let (tag, length, consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::Double {
        return Err(EncodingError::WrongTag);
    }
    if length != 8 {
        return Err(EncodingError::OutOfRange);
    }
    if data.len() < consumed + 8 {
        return Err(EncodingError::Truncated);
    }
    let value = f64::from_be_bytes(data[consumed..consumed + 8].try_into().unwrap());
    Ok((value, consumed + 8))
}

/// Encodes a BACnet application-tagged octet string (no interpretation of content).
pub fn encode_application_octet_string(buffer: &mut Vec<u8>, value: &[u8]) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::OctetString, value.len())?;
    buffer.extend_from_slice(value);
    Ok(())
}

/// Decodes a BACnet application-tagged octet string.
pub fn decode_application_octet_string(data: &[u8]) -> Result<(Vec<u8>, usize)> {
    let (tag, length, consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::OctetString {
        return Err(EncodingError::WrongTag);
    }
    if data.len() < consumed + length {
        return Err(EncodingError::Truncated);
    }
    Ok((data[consumed..consumed + length].to_vec(), consumed + length))
}

/// Character-set code carried by the first octet of a character string (clause 20.2.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CharacterSet {
    /// ANSI X3.4 (US-ASCII / UTF-8 compatible), the default.
    Utf8 = 0,
    /// IBM/Microsoft DBCS, not representable as UTF-8 by this crate.
    Dbcs = 1,
    /// JIS X 0208, not representable as UTF-8 by this crate.
    JisX0208 = 2,
    /// ISO 10646 (UCS-4).
    Ucs4 = 3,
    /// ISO 10646 (UCS-2), decoded as UTF-16BE by this crate.
    Ucs2 = 4,
    /// ISO 8859-1 (Latin-1), decoded by this crate via its well-known byte-to-codepoint mapping.
    Iso8859_1 = 5,
}

impl TryFrom<u8> for CharacterSet {
    type Error = EncodingError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(CharacterSet::Utf8),
            1 => Ok(CharacterSet::Dbcs),
            2 => Ok(CharacterSet::JisX0208),
            3 => Ok(CharacterSet::Ucs4),
            4 => Ok(CharacterSet::Ucs2),
            5 => Ok(CharacterSet::Iso8859_1),
            _ => Err(EncodingError::OutOfRange),
        }
    }
}

/// Encodes a BACnet application-tagged character string using the default (ANSI X3.4) character set.
pub fn encode_application_character_string(buffer: &mut Vec<u8>, value: &str) -> Result<()> {
    let string_bytes = value.as_bytes();
    encode_application_tag(buffer, ApplicationTag::CharacterString, string_bytes.len() + 1)?;
    buffer.push(CharacterSet::Utf8 as u8);
    buffer.extend_from_slice(string_bytes);
    Ok(())
}

/// Decodes a BACnet application-tagged character string.
///
/// UCS-2 (character set 4) is decoded as big-endian UTF-16; ISO 8859-1 (character set 5) is
/// decoded via its one-to-one byte-to-codepoint mapping. Character sets this crate cannot
/// losslessly represent as UTF-8 (DBCS, JIS X 0208, UCS-4) are reported as
/// `EncodingError::InvalidFormat` rather than silently mangled.
pub fn decode_application_character_string(data: &[u8]) -> Result<(String, usize)> {
    let (tag, length, consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::CharacterString {
        return Err(EncodingError::WrongTag);
    }
    if length == 0 || data.len() < consumed + length {
        return Err(EncodingError::Truncated);
    }

    let charset = CharacterSet::try_from(data[consumed])?;
    let string_data = &data[consumed + 1..consumed + length];

    let value = match charset {
        CharacterSet::Utf8 => String::from_utf8(string_data.to_vec())
            .map_err(|_| EncodingError::InvalidFormat("invalid UTF-8 character string".into()))?,
        CharacterSet::Ucs2 => {
            if string_data.len() % 2 != 0 {
                return Err(EncodingError::InvalidFormat("odd-length UCS-2 string".into()));
            }
            let units: Vec<u16> = string_data
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units)
                .map_err(|_| EncodingError::InvalidFormat("invalid UCS-2 character string".into()))?
        }
        CharacterSet::Iso8859_1 => string_data.iter().map(|&b| b as char).collect(),
        _ => {
            return Err(EncodingError::InvalidFormat(
                "unsupported character set for UTF-8 conversion".into(),
            ))
        }
    };

    Ok((value, consumed + length))
}

/// Encodes a BACnet application-tagged enumerated value (wire-identical to unsigned).
pub fn encode_application_enumerated(buffer: &mut Vec<u8>, value: u32) -> Result<()> {
    let bytes = minimal_unsigned_bytes(value);
    encode_application_tag(buffer, ApplicationTag::Enumerated, bytes.len())?;
    buffer.extend_from_slice(&bytes);
    Ok(())
}

/// Decodes a BACnet application-tagged enumerated value.
pub fn decode_application_enumerated(data: &[u8]) -> Result<(u32, usize)> {
    let (tag, length, consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::Enumerated {
        return Err(EncodingError::WrongTag);
    }
    if data.len() < consumed + length {
        return Err(EncodingError::Truncated);
    }
    let value = decode_unsigned_bytes(&data[consumed..consumed + length], length)?;
    Ok((value, consumed + length))
}

/// A BACnet date, clause 20.2.12. `0xFF` in any field denotes "unspecified" and is passed
/// through by the decoder without substitution. Month 13/14 ("odd"/"even" months) and day
/// 32 ("last day of month") are ASHRAE-135 recurrence sentinels, distinct from "unspecified".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub weekday: u8,
}

impl Date {
    pub const UNSPECIFIED: u8 = 0xFF;
    pub const ODD_MONTHS: u8 = 13;
    pub const EVEN_MONTHS: u8 = 14;
    pub const LAST_DAY_OF_MONTH: u8 = 32;

    pub fn new(year: u16, month: u8, day: u8, weekday: u8) -> Self {
        Self { year, month, day, weekday }
    }
}

/// Encodes a BACnet application-tagged date.
pub fn encode_application_date(buffer: &mut Vec<u8>, date: Date) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Date, 4)?;
    let year_octet = if date.year == Date::UNSPECIFIED as u16 {
        Date::UNSPECIFIED
    } else {
        (date.year.saturating_sub(1900) % 256) as u8
    };
    buffer.push(year_octet);
    buffer.push(date.month);
    buffer.push(date.day);
    buffer.push(date.weekday);
    Ok(())
}

/// Decodes a BACnet application-tagged date.
pub fn decode_application_date(data: &[u8]) -> Result<(Date, usize)> {
    let (tag, length, consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::Date {
        return Err(EncodingError::WrongTag);
    }
    if length != 4 || data.len() < consumed + 4 {
        return Err(EncodingError::Truncated);
    }
    let year = if data[consumed] == Date::UNSPECIFIED {
        Date::UNSPECIFIED as u16
    } else {
        1900 + data[consumed] as u16
    };
    let date = Date::new(year, data[consumed + 1], data[consumed + 2], data[consumed + 3]);
    Ok((date, consumed + 4))
}

/// A BACnet time, clause 20.2.13. `0xFF` in any field denotes "unspecified".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub hundredths: u8,
}

impl Time {
    pub const UNSPECIFIED: u8 = 0xFF;

    pub fn new(hour: u8, minute: u8, second: u8, hundredths: u8) -> Self {
        Self { hour, minute, second, hundredths }
    }
}

/// Encodes a BACnet application-tagged time.
pub fn encode_application_time(buffer: &mut Vec<u8>, time: Time) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Time, 4)?;
    buffer.push(time.hour);
    buffer.push(time.minute);
    buffer.push(time.second);
    buffer.push(time.hundredths);
    Ok(())
}

/// Decodes a BACnet application-tagged time.
pub fn decode_application_time(data: &[u8]) -> Result<(Time, usize)> {
    let (tag, length, consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::Time {
        return Err(EncodingError::WrongTag);
    }
    if length != 4 || data.len() < consumed + 4 {
        return Err(EncodingError::Truncated);
    }
    let time = Time::new(data[consumed], data[consumed + 1], data[consumed + 2], data[consumed + 3]);
    Ok((time, consumed + 4))
}

/// Largest legal object type value (10-bit field).
pub const MAX_OBJECT_TYPE: u16 = 0x3FF;
/// Wildcard/"no instance" sentinel for the 22-bit instance field.
pub const MAX_INSTANCE: u32 = 0x3F_FFFF;

/// Packs an object type (0..=1023) and instance (0..=4_194_303) into the 32-bit wire form.
pub fn pack_object_identifier(object_type: u16, instance: u32) -> Result<u32> {
    if object_type > MAX_OBJECT_TYPE || instance > MAX_INSTANCE {
        return Err(EncodingError::OutOfRange);
    }
    Ok(((object_type as u32) << 22) | instance)
}

/// Unpacks the 32-bit wire form of an object identifier into (object type, instance).
pub fn unpack_object_identifier(packed: u32) -> (u16, u32) {
    ((packed >> 22) as u16, packed & MAX_INSTANCE)
}

/// Encodes a BACnet application-tagged object identifier.
pub fn encode_application_object_id(buffer: &mut Vec<u8>, object_type: u16, instance: u32) -> Result<()> {
    let packed = pack_object_identifier(object_type, instance)?;
    encode_application_tag(buffer, ApplicationTag::ObjectIdentifier, 4)?;
    buffer.extend_from_slice(&packed.to_be_bytes());
    Ok(())
}

/// Decodes a BACnet application-tagged object identifier into (object type, instance).
pub fn decode_application_object_id(data: &[u8]) -> Result<((u16, u32), usize)> {
    let (tag, length, consumed) = decode_application_tag(data)?;
    if tag != ApplicationTag::ObjectIdentifier {
        return Err(EncodingError::WrongTag);
    }
    if length != 4 || data.len() < consumed + 4 {
        return Err(EncodingError::Truncated);
    }
    let packed = u32::from_be_bytes(data[consumed..consumed + 4].try_into().unwrap());
    Ok((unpack_object_identifier(packed), consumed + 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_round_trip_minimal_width() {
        for value in [0u32, 1, 255, 256, 65535, 65536, 16_777_215, 16_777_216, u32::MAX] {
            let mut buf = Vec::new();
            encode_application_unsigned(&mut buf, value).unwrap();
            let (decoded, consumed) = decode_application_unsigned(&buf).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, buf.len());
        }
    }

    #[test]
    fn signed_round_trip_sign_preserved() {
        for value in [0i32, 127, 128, -128, -129, 32767, -32768, i32::MIN, i32::MAX] {
            let mut buf = Vec::new();
            encode_application_signed(&mut buf, value).unwrap();
            let (decoded, consumed) = decode_application_signed(&buf).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, buf.len());
        }
    }

    #[test]
    fn real_round_trip() {
        let mut buf = Vec::new();
        encode_application_real(&mut buf, 21.0).unwrap();
        let (value, consumed) = decode_application_real(&buf).unwrap();
        assert_eq!(value, 21.0);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn double_round_trip() {
        let mut buf = Vec::new();
        encode_application_double(&mut buf, -123.456).unwrap();
        let (value, consumed) = decode_application_double(&buf).unwrap();
        assert_eq!(value, -123.456);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn object_id_packing_round_trips_across_full_domain() {
        for object_type in [0u16, 1, 512, MAX_OBJECT_TYPE] {
            for instance in [0u32, 1, 1000, MAX_INSTANCE - 1] {
                let mut buf = Vec::new();
                encode_application_object_id(&mut buf, object_type, instance).unwrap();
                let ((t, i), consumed) = decode_application_object_id(&buf).unwrap();
                assert_eq!((t, i), (object_type, instance));
                assert_eq!(consumed, buf.len());
            }
        }
    }

    #[test]
    fn object_id_rejects_out_of_range_type() {
        assert_eq!(
            pack_object_identifier(MAX_OBJECT_TYPE + 1, 0),
            Err(EncodingError::OutOfRange)
        );
    }

    #[test]
    fn character_string_round_trip_ascii() {
        let mut buf = Vec::new();
        encode_application_character_string(&mut buf, "device 505030").unwrap();
        let (value, consumed) = decode_application_character_string(&buf).unwrap();
        assert_eq!(value, "device 505030");
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn character_string_decodes_ucs2() {
        let mut buf = Vec::new();
        encode_application_tag(&mut buf, ApplicationTag::CharacterString, 5).unwrap();
        buf.push(CharacterSet::Ucs2 as u8);
        for unit in "hi".encode_utf16() {
            buf.extend_from_slice(&unit.to_be_bytes());
        }
        let (value, consumed) = decode_application_character_string(&buf).unwrap();
        assert_eq!(value, "hi");
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn date_passes_through_unspecified_fields() {
        let mut buf = Vec::new();
        let date = Date::new(Date::UNSPECIFIED as u16, Date::UNSPECIFIED, Date::UNSPECIFIED, Date::UNSPECIFIED);
        encode_application_date(&mut buf, date).unwrap();
        let (decoded, _) = decode_application_date(&buf).unwrap();
        assert_eq!(decoded, date);
    }

    #[test]
    fn time_round_trip() {
        let mut buf = Vec::new();
        let time = Time::new(23, 59, 59, 99);
        encode_application_time(&mut buf, time).unwrap();
        let (decoded, consumed) = decode_application_time(&buf).unwrap();
        assert_eq!(decoded, time);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn truncated_buffer_fails_cleanly() {
        let mut buf = Vec::new();
        encode_application_unsigned(&mut buf, 70000).unwrap();
        for k in 0..buf.len() {
            assert!(decode_application_unsigned(&buf[..k]).is_err());
        }
    }

    #[test]
    fn wrong_tag_is_rejected() {
        let mut buf = Vec::new();
        encode_application_real(&mut buf, 1.0).unwrap();
        assert_eq!(decode_application_unsigned(&buf), Err(EncodingError::WrongTag));
    }
}
