//! Context tag codec.
//!
//! Context tags wrap application data with a small caller-chosen tag number (0..=254)
//! used to disambiguate optional/choice fields within a service PDU, per ASHRAE 135
//! clause 20.2.1.1. Unlike application tags, the context-tag number carries no type
//! information of its own — the caller always knows what type to expect from the
//! surrounding service's field position.
//!
//! Opening and closing tags (clause 20.2.1.3.2) bracket constructed (nested) context
//! data, such as a BACnetPropertyValue sequence inside ReadPropertyMultiple-ACK. Every
//! opening tag at a given nesting depth must be matched by a closing tag carrying the
//! same tag number before that level is considered complete.

use super::{
    decode_extended_length, decode_signed_bytes, decode_unsigned_bytes, encode_extended_length,
    minimal_signed_bytes, minimal_unsigned_bytes, pack_object_identifier, unpack_object_identifier,
    CharacterSet, Date, EncodingError, Result, Time,
};
use super::bitstring::BitString;

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

const OPENING_LENGTH_CLASS: u8 = 6;
const CLOSING_LENGTH_CLASS: u8 = 7;

/// Encodes a context tag header for primitive (non-constructed) data.
pub fn encode_context_tag(buffer: &mut Vec<u8>, tag_number: u8, length: usize) -> Result<()> {
    let class = if length < 5 { length as u8 } else { 5 };
    write_tag_header(buffer, tag_number, class);
    encode_extended_length(buffer, length);
    Ok(())
}

/// Encodes a context-tagged opening bracket, e.g. the start of a constructed field.
pub fn encode_opening_tag(buffer: &mut Vec<u8>, tag_number: u8) {
    write_tag_header(buffer, tag_number, OPENING_LENGTH_CLASS);
}

/// Encodes a context-tagged closing bracket matching a prior opening tag.
pub fn encode_closing_tag(buffer: &mut Vec<u8>, tag_number: u8) {
    write_tag_header(buffer, tag_number, CLOSING_LENGTH_CLASS);
}

fn write_tag_header(buffer: &mut Vec<u8>, tag_number: u8, length_class: u8) {
    const CONTEXT_FLAG: u8 = 0x08;
    if tag_number < 15 {
        buffer.push((tag_number << 4) | CONTEXT_FLAG | length_class);
    } else {
        buffer.push(0xF0 | CONTEXT_FLAG | length_class);
        buffer.push(tag_number);
    }
}

/// Decodes a context tag header (primitive or opening/closing). Returns
/// `(tag_number, length_or_zero, is_opening, is_closing, consumed)`.
pub fn decode_context_tag_header(data: &[u8]) -> Result<(u8, usize, bool, bool, usize)> {
    if data.is_empty() {
        log::debug!("context tag header: truncated, buffer empty");
        return Err(EncodingError::Truncated);
    }

    let first = data[0];
    if first & 0x08 == 0 {
        log::warn!("context tag header: class bit unset in {:#04x}, expected a context tag", first);
        return Err(EncodingError::InvalidTag);
    }

    let raw_tag_number = first >> 4;
    let length_class = first & 0x07;

    let (tag_number, mut consumed) = if raw_tag_number == 0x0F {
        if data.len() < 2 {
            log::debug!("context tag header: truncated, extended tag number byte missing");
            return Err(EncodingError::Truncated);
        }
        (data[1], 2)
    } else {
        (raw_tag_number, 1)
    };

    let is_opening = length_class == OPENING_LENGTH_CLASS;
    let is_closing = length_class == CLOSING_LENGTH_CLASS;

    if is_opening || is_closing {
        return Ok((tag_number, 0, is_opening, is_closing, consumed));
    }

    let raw_length = length_class as usize;
    let (length, extra) = decode_extended_length(&data[consumed..], raw_length)?;
    consumed += extra;
    Ok((tag_number, length, false, false, consumed))
}

/// Decodes a context tag, asserting it is the expected primitive tag number.
/// Returns `(length, consumed)`.
pub fn decode_context_tag(data: &[u8], expected_tag: u8) -> Result<(usize, usize)> {
    let (tag_number, length, is_opening, is_closing, consumed) = decode_context_tag_header(data)?;
    if is_opening || is_closing {
        return Err(EncodingError::InvalidTag);
    }
    if tag_number != expected_tag {
        return Err(EncodingError::WrongTag);
    }
    Ok((length, consumed))
}

/// Peeks whether the next tag cell is a context opening tag with the given number,
/// without consuming any bytes.
pub fn is_opening(data: &[u8], tag_number: u8) -> bool {
    decode_context_tag_header(data)
        .map(|(tag, _, opening, _, _)| opening && tag == tag_number)
        .unwrap_or(false)
}

/// Peeks whether the next tag cell is a context closing tag with the given number,
/// without consuming any bytes.
pub fn is_closing(data: &[u8], tag_number: u8) -> bool {
    decode_context_tag_header(data)
        .map(|(tag, _, _, closing, _)| closing && tag == tag_number)
        .unwrap_or(false)
}

/// Peeks whether the next tag cell is context-tagged at all (opening, closing, or
/// primitive), without consuming any bytes or checking its tag number.
pub fn is_context(data: &[u8]) -> bool {
    !data.is_empty() && data[0] & 0x08 != 0
}

/// Consumes a matched opening/closing tag pair's contents, returning the byte range
/// between them. Used to skip over a constructed field whose content this crate does
/// not otherwise decode. Enforces the ascending-context-tag-within-a-level invariant
/// is the caller's responsibility — this only matches brackets, it does not validate order.
pub fn skip_constructed(data: &[u8], tag_number: u8) -> Result<usize> {
    let (_, _, is_opening_tag, _, mut consumed) = decode_context_tag_header(data)?;
    if !is_opening_tag {
        return Err(EncodingError::InvalidTag);
    }

    let mut depth = 1usize;
    while depth > 0 {
        if consumed >= data.len() {
            return Err(EncodingError::Truncated);
        }
        let (tag, length, opening, closing, header_len) = decode_context_tag_header(&data[consumed..])?;
        if opening {
            if tag == tag_number {
                depth += 1;
            }
            consumed += header_len;
        } else if closing {
            if tag == tag_number {
                depth -= 1;
            }
            consumed += header_len;
        } else {
            consumed += header_len + length;
        }
    }

    Ok(consumed)
}

/// Encodes a context-tagged boolean, clause 20.2.3 — context tags carry booleans as a
/// one-octet unsigned value (0 or 1) rather than inside the length field, unlike the
/// application-tagged form.
pub fn encode_context_boolean(buffer: &mut Vec<u8>, value: bool, tag_number: u8) -> Result<()> {
    encode_context_tag(buffer, tag_number, 1)?;
    buffer.push(if value { 1 } else { 0 });
    Ok(())
}

/// Decodes a context-tagged boolean.
pub fn decode_context_boolean(data: &[u8], expected_tag: u8) -> Result<(bool, usize)> {
    let (length, consumed) = decode_context_tag(data, expected_tag)?;
    if length != 1 || data.len() < consumed + 1 {
        return Err(EncodingError::Truncated);
    }
    Ok((data[consumed] != 0, consumed + 1))
}

/// Encodes a context-tagged unsigned integer (minimum-octet encoding).
pub fn encode_context_unsigned(buffer: &mut Vec<u8>, value: u32, tag_number: u8) -> Result<()> {
    let bytes = minimal_unsigned_bytes(value);
    encode_context_tag(buffer, tag_number, bytes.len())?;
    buffer.extend_from_slice(&bytes);
    Ok(())
}

/// Decodes a context-tagged unsigned integer.
pub fn decode_context_unsigned(data: &[u8], expected_tag: u8) -> Result<(u32, usize)> {
    let (length, consumed) = decode_context_tag(data, expected_tag)?;
    if data.len() < consumed + length {
        return Err(EncodingError::Truncated);
    }
    let value = decode_unsigned_bytes(&data[consumed..consumed + length], length)?;
    Ok((value, consumed + length))
}

/// Encodes a context-tagged signed integer (two's complement, minimum-octet encoding).
pub fn encode_context_signed(buffer: &mut Vec<u8>, value: i32, tag_number: u8) -> Result<()> {
    let bytes = minimal_signed_bytes(value);
    encode_context_tag(buffer, tag_number, bytes.len())?;
    buffer.extend_from_slice(&bytes);
    Ok(())
}

/// Decodes a context-tagged signed integer.
pub fn decode_context_signed(data: &[u8], expected_tag: u8) -> Result<(i32, usize)> {
    let (length, consumed) = decode_context_tag(data, expected_tag)?;
    if data.len() < consumed + length {
        return Err(EncodingError::Truncated);
    }
    let value = decode_signed_bytes(&data[consumed..consumed + length], length)?;
    Ok((value, consumed + length))
}

/// Encodes a context-tagged enumerated value (wire-identical to unsigned at this level).
pub fn encode_context_enumerated(buffer: &mut Vec<u8>, value: u32, tag_number: u8) -> Result<()> {
    encode_context_unsigned(buffer, value, tag_number)
}

/// Decodes a context-tagged enumerated value.
pub fn decode_context_enumerated(data: &[u8], expected_tag: u8) -> Result<(u32, usize)> {
    decode_context_unsigned(data, expected_tag)
}

/// Encodes a context-tagged IEEE-754 single-precision real.
pub fn encode_context_real(buffer: &mut Vec<u8>, value: f32, tag_number: u8) -> Result<()> {
    encode_context_tag(buffer, tag_number, 4)?;
    buffer.extend_from_slice(&value.to_be_bytes());
    Ok(())
}

/// Decodes a context-tagged IEEE-754 single-precision real.
pub fn decode_context_real(data: &[u8], expected_tag: u8) -> Result<(f32, usize)> {
    let (length, consumed) = decode_context_tag(data, expected_tag)?;
    if length != 4 || data.len() < consumed + 4 {
        return Err(EncodingError::Truncated);
    }
    let value = f32::from_be_bytes(data[consumed..consumed + 4].try_into().unwrap());
    Ok((value, consumed + 4))
}

/// Encodes a context-tagged object identifier.
pub fn encode_context_object_id(
    buffer: &mut Vec<u8>,
    object_type: u16,
    instance: u32,
    tag_number: u8,
) -> Result<()> {
    let packed = pack_object_identifier(object_type, instance)?;
    encode_context_tag(buffer, tag_number, 4)?;
    buffer.extend_from_slice(&packed.to_be_bytes());
    Ok(())
}

/// Decodes a context-tagged object identifier into `(object type, instance)`.
pub fn decode_context_object_id(data: &[u8], expected_tag: u8) -> Result<((u16, u32), usize)> {
    let (length, consumed) = decode_context_tag(data, expected_tag)?;
    if length != 4 || data.len() < consumed + 4 {
        return Err(EncodingError::Truncated);
    }
    let packed = u32::from_be_bytes(data[consumed..consumed + 4].try_into().unwrap());
    Ok((unpack_object_identifier(packed), consumed + 4))
}

/// Encodes a context-tagged octet string.
pub fn encode_context_octet_string(buffer: &mut Vec<u8>, value: &[u8], tag_number: u8) -> Result<()> {
    encode_context_tag(buffer, tag_number, value.len())?;
    buffer.extend_from_slice(value);
    Ok(())
}

/// Decodes a context-tagged octet string.
pub fn decode_context_octet_string(data: &[u8], expected_tag: u8) -> Result<(Vec<u8>, usize)> {
    let (length, consumed) = decode_context_tag(data, expected_tag)?;
    if data.len() < consumed + length {
        return Err(EncodingError::Truncated);
    }
    Ok((data[consumed..consumed + length].to_vec(), consumed + length))
}

/// Encodes a context-tagged character string using the default (ANSI X3.4) character set.
pub fn encode_context_character_string(buffer: &mut Vec<u8>, value: &str, tag_number: u8) -> Result<()> {
    let string_bytes = value.as_bytes();
    encode_context_tag(buffer, tag_number, string_bytes.len() + 1)?;
    buffer.push(CharacterSet::Utf8 as u8);
    buffer.extend_from_slice(string_bytes);
    Ok(())
}

/// Decodes a context-tagged character string. See
/// [`decode_application_character_string`](super::decode_application_character_string) for the
/// supported character-set conversions.
pub fn decode_context_character_string(data: &[u8], expected_tag: u8) -> Result<(String, usize)> {
    let (length, consumed) = decode_context_tag(data, expected_tag)?;
    if length == 0 || data.len() < consumed + length {
        return Err(EncodingError::Truncated);
    }
    let charset = CharacterSet::try_from(data[consumed])?;
    let string_data = &data[consumed + 1..consumed + length];
    let value = match charset {
        CharacterSet::Utf8 => String::from_utf8(string_data.to_vec())
            .map_err(|_| EncodingError::InvalidFormat("invalid UTF-8 character string".into()))?,
        CharacterSet::Iso8859_1 => string_data.iter().map(|&b| b as char).collect(),
        _ => {
            return Err(EncodingError::InvalidFormat(
                "unsupported character set for UTF-8 conversion".into(),
            ))
        }
    };
    Ok((value, consumed + length))
}

/// Encodes a context-tagged bit string.
pub fn encode_context_bitstring(buffer: &mut Vec<u8>, value: &BitString, tag_number: u8) -> Result<()> {
    let (octets, unused_bits) = value.packed_octets();
    encode_context_tag(buffer, tag_number, octets.len() + 1)?;
    buffer.push(unused_bits);
    buffer.extend_from_slice(&octets);
    Ok(())
}

/// Decodes a context-tagged bit string.
pub fn decode_context_bitstring(data: &[u8], expected_tag: u8) -> Result<(BitString, usize)> {
    let (length, consumed) = decode_context_tag(data, expected_tag)?;
    if length == 0 || data.len() < consumed + length {
        return Err(EncodingError::Truncated);
    }
    let unused_bits = data[consumed];
    if unused_bits > 7 {
        return Err(EncodingError::OutOfRange);
    }
    let octets = &data[consumed + 1..consumed + length];
    let total_bits = octets.len() * 8;
    let used_bits = total_bits.saturating_sub(unused_bits as usize);

    let mut bits = Vec::with_capacity(used_bits);
    for i in 0..used_bits {
        let byte = octets[i / 8];
        bits.push(byte & (0x80 >> (i % 8)) != 0);
    }

    Ok((BitString::from_bits(bits), consumed + length))
}

/// Encodes a context-tagged date.
pub fn encode_context_date(buffer: &mut Vec<u8>, date: Date, tag_number: u8) -> Result<()> {
    encode_context_tag(buffer, tag_number, 4)?;
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

/// Decodes a context-tagged date.
pub fn decode_context_date(data: &[u8], expected_tag: u8) -> Result<(Date, usize)> {
    let (length, consumed) = decode_context_tag(data, expected_tag)?;
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

/// Encodes a context-tagged time.
pub fn encode_context_time(buffer: &mut Vec<u8>, time: Time, tag_number: u8) -> Result<()> {
    encode_context_tag(buffer, tag_number, 4)?;
    buffer.push(time.hour);
    buffer.push(time.minute);
    buffer.push(time.second);
    buffer.push(time.hundredths);
    Ok(())
}

/// Decodes a context-tagged time.
pub fn decode_context_time(data: &[u8], expected_tag: u8) -> Result<(Time, usize)> {
    let (length, consumed) = decode_context_tag(data, expected_tag)?;
    if length != 4 || data.len() < consumed + 4 {
        return Err(EncodingError::Truncated);
    }
    let time = Time::new(data[consumed], data[consumed + 1], data[consumed + 2], data[consumed + 3]);
    Ok((time, consumed + 4))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_context_tag_round_trips() {
        let mut buf = Vec::new();
        encode_context_tag(&mut buf, 3, 2).unwrap();
        buf.extend_from_slice(&[0xAA, 0xBB]);
        let (length, consumed) = decode_context_tag(&buf, 3).unwrap();
        assert_eq!(length, 2);
        assert_eq!(consumed, buf.len() - 2);
    }

    #[test]
    fn opening_closing_round_trip_and_peek() {
        let mut buf = Vec::new();
        encode_opening_tag(&mut buf, 1);
        encode_context_tag(&mut buf, 0, 1).unwrap();
        buf.push(0x01);
        encode_closing_tag(&mut buf, 1);

        assert!(is_opening(&buf, 1));
        assert!(!is_closing(&buf, 1));

        let consumed = skip_constructed(&buf, 1).unwrap();
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn wrong_tag_number_rejected() {
        let mut buf = Vec::new();
        encode_context_tag(&mut buf, 2, 1).unwrap();
        buf.push(0x00);
        assert_eq!(decode_context_tag(&buf, 5), Err(EncodingError::WrongTag));
    }

    #[test]
    fn extended_tag_numbers_above_14_round_trip() {
        let mut buf = Vec::new();
        encode_context_tag(&mut buf, 200, 1).unwrap();
        buf.push(0xFF);
        let (tag_number, length, _, _, consumed) = decode_context_tag_header(&buf).unwrap();
        assert_eq!(tag_number, 200);
        assert_eq!(length, 1);
        assert_eq!(consumed, buf.len() - 1);
    }

    #[test]
    fn nested_constructed_data_skips_correctly() {
        let mut buf = Vec::new();
        encode_opening_tag(&mut buf, 0);
        encode_opening_tag(&mut buf, 0);
        encode_closing_tag(&mut buf, 0);
        encode_closing_tag(&mut buf, 0);
        let consumed = skip_constructed(&buf, 0).unwrap();
        assert_eq!(consumed, buf.len());
    }
}
