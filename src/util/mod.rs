//! Small helpers shared across the codec: BACnet date/time formatting, instance-number
//! and priority validation, and hex-dump-style debug formatting for protocol traces.
//!
//! Network-layer (NPDU/BVLL) and data-link (MS/TP, BACnet/SC) concerns are out of scope
//! for this crate (see the crate-level Non-goals) and have no helpers here.
//!
//! # Example
//!
//! ```no_run
//! use bacnet_apdu::util::*;
//!
//! let data = b"Hello BACnet";
//! println!("{}", hex_dump(data, ""));
//! ```

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(not(feature = "std"))]
use alloc::{format, string::String, vec::Vec};

/// The `generate_custom_enum!` macro used by [`crate::object`] for named-range-plus-
/// vendor-range-plus-reserved enums (`ObjectType`, `PropertyIdentifier`, `ErrorClass`,
/// `ErrorCode`).
pub mod enum_macros;

/// Convert a BACnet date (clause 20.2.12 octets) to a human-readable string, honoring
/// the `0xFF` unspecified sentinel and the month/day recurrence sentinels (odd/even
/// months, last day of month).
pub fn bacnet_date_to_string(year: u16, month: u8, day: u8, weekday: u8) -> String {
    let year_str = if year == 255 {
        String::from("*")
    } else {
        format!("{}", year)
    };
    let month_str = match month {
        13 => String::from("odd"),
        14 => String::from("even"),
        255 => String::from("*"),
        _ => format!("{}", month),
    };
    let day_str = if day == 32 {
        String::from("last")
    } else if day == 255 {
        String::from("*")
    } else {
        format!("{}", day)
    };
    let weekday_str = if weekday == 255 {
        String::from("*")
    } else {
        String::from(match weekday {
            1 => "Mon",
            2 => "Tue",
            3 => "Wed",
            4 => "Thu",
            5 => "Fri",
            6 => "Sat",
            7 => "Sun",
            _ => "?",
        })
    };

    format!("{}/{}/{} ({})", year_str, month_str, day_str, weekday_str)
}

/// Convert a BACnet time (clause 20.2.13 octets) to a human-readable string, honoring
/// the `0xFF` unspecified sentinel on each field independently.
pub fn bacnet_time_to_string(hour: u8, minute: u8, second: u8, hundredths: u8) -> String {
    let field = |v: u8| if v == 255 { String::from("*") } else { format!("{:02}", v) };

    format!(
        "{}:{}:{}.{}",
        field(hour),
        field(minute),
        field(second),
        field(hundredths)
    )
}

/// Validate an object instance number (must be 0..=4_194_302; 4_194_303 is the
/// `ObjectIdentifier` wildcard and is not a valid concrete instance).
pub fn is_valid_instance_number(instance: u32) -> bool {
    instance <= 0x3FFFFF
}

/// Priority array constants and validation (clause 16.2), used by Write-Property's
/// optional priority field.
pub mod priority {
    pub const MANUAL_LIFE_SAFETY: u8 = 1;
    pub const AUTOMATIC_LIFE_SAFETY: u8 = 2;
    pub const CRITICAL_EQUIPMENT_CONTROL: u8 = 5;
    pub const MINIMUM_ON_OFF: u8 = 6;
    pub const MANUAL_OPERATOR: u8 = 8;
    pub const LOWEST: u8 = 16;

    /// Check if priority is in the valid range (1-16).
    pub fn is_valid(priority: u8) -> bool {
        (1..=16).contains(&priority)
    }
}

/// Hex dump utility for protocol traces, 16 octets per line with an ASCII gutter.
pub fn hex_dump(data: &[u8], prefix: &str) -> String {
    let mut result = String::new();

    for (i, chunk) in data.chunks(16).enumerate() {
        result.push_str(prefix);
        result.push_str(&format!("{:04X}: ", i * 16));

        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                result.push(' ');
            }
            result.push_str(&format!("{:02X} ", byte));
        }

        for j in chunk.len()..16 {
            if j == 8 {
                result.push(' ');
            }
            result.push_str("   ");
        }

        result.push_str(" |");

        for byte in chunk {
            if byte.is_ascii_graphic() || *byte == b' ' {
                result.push(*byte as char);
            } else {
                result.push('.');
            }
        }

        result.push_str("|\n");
    }

    result
}

/// Debug formatters for the application-layer wire format. Intended for trace logging,
/// not for parsing — these never fail, they degrade to `"invalid"` markers on short input.
pub mod debug {
    use super::*;

    /// Format one application-tagged value cell for debugging, given its tag byte.
    pub fn format_property_value(data: &[u8]) -> String {
        if data.is_empty() {
            return "[empty]".to_string();
        }

        let tag = data[0];
        match tag {
            0x11 => {
                if data.len() >= 2 {
                    format!("Boolean({})", data[1] != 0)
                } else {
                    "Boolean(invalid)".to_string()
                }
            }
            0x21 => format_unsigned_integer(data),
            0x31 => format_signed_integer(data),
            0x44 => {
                if data.len() >= 5 {
                    let bytes = [data[1], data[2], data[3], data[4]];
                    format!("Real({})", f32::from_be_bytes(bytes))
                } else {
                    "Real(invalid)".to_string()
                }
            }
            0x55 => {
                if data.len() >= 9 {
                    let mut bytes = [0u8; 8];
                    bytes.copy_from_slice(&data[1..9]);
                    format!("Double({})", f64::from_be_bytes(bytes))
                } else {
                    "Double(invalid)".to_string()
                }
            }
            0x75 => format_character_string(data),
            0x81..=0x8F => format_octet_string(data),
            0x91 => format_enumerated(data),
            0xA1 => format_date(data),
            0xB1 => format_time(data),
            0xC4 => format_object_identifier(data),
            _ => format!("Unknown(tag=0x{:02X}, data={})", tag, hex_dump(data, "")),
        }
    }

    fn format_unsigned_integer(data: &[u8]) -> String {
        if data.len() < 2 {
            return "UnsignedInt(invalid)".to_string();
        }
        let length = (data[0] & 0x07) as usize;
        if data.len() < 1 + length {
            return "UnsignedInt(invalid length)".to_string();
        }
        let mut value = 0u64;
        for i in 0..length {
            value = (value << 8) | (data[1 + i] as u64);
        }
        format!("UnsignedInt({})", value)
    }

    fn format_signed_integer(data: &[u8]) -> String {
        if data.len() < 2 {
            return "SignedInt(invalid)".to_string();
        }
        let length = (data[0] & 0x07) as usize;
        if data.len() < 1 + length {
            return "SignedInt(invalid length)".to_string();
        }
        let sign_bit = data[1] & 0x80 != 0;
        let mut value = 0i64;
        for i in 0..length {
            value = (value << 8) | (data[1 + i] as i64);
        }
        if sign_bit {
            let shift = 64 - (length * 8);
            value = (value << shift) >> shift;
        }
        format!("SignedInt({})", value)
    }

    fn format_character_string(data: &[u8]) -> String {
        if data.len() < 3 {
            return "CharString(invalid)".to_string();
        }
        let length = data[1] as usize;
        if data.len() < 2 + length {
            return "CharString(invalid length)".to_string();
        }
        let encoding = data[2];
        let string_data = &data[3..2 + length];
        let decoded = match encoding {
            0 => String::from_utf8_lossy(string_data).to_string(),
            4 => {
                let mut utf16_chars = Vec::new();
                for chunk in string_data.chunks_exact(2) {
                    utf16_chars.push(u16::from_be_bytes([chunk[0], chunk[1]]));
                }
                String::from_utf16_lossy(&utf16_chars)
            }
            _ => format!("<encoding={}>", encoding),
        };
        format!("CharString(\"{}\")", decoded)
    }

    fn format_octet_string(data: &[u8]) -> String {
        if data.is_empty() {
            return "OctetString(invalid)".to_string();
        }
        let length = (data[0] & 0x07) as usize;
        if data.len() < 1 + length {
            return "OctetString(invalid length)".to_string();
        }
        let octets = &data[1..1 + length];
        let hex_string = octets.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(" ");
        format!("OctetString([{}])", hex_string)
    }

    fn format_enumerated(data: &[u8]) -> String {
        if data.len() < 2 {
            return "Enumerated(invalid)".to_string();
        }
        format!("Enumerated({})", data[1] as u32)
    }

    fn format_date(data: &[u8]) -> String {
        if data.len() < 5 {
            return "Date(invalid)".to_string();
        }
        let year = data[1] as u16 + 1900;
        format!("Date({})", bacnet_date_to_string(year, data[2], data[3], data[4]))
    }

    fn format_time(data: &[u8]) -> String {
        if data.len() < 5 {
            return "Time(invalid)".to_string();
        }
        format!("Time({})", bacnet_time_to_string(data[1], data[2], data[3], data[4]))
    }

    fn format_object_identifier(data: &[u8]) -> String {
        if data.len() < 5 {
            return "ObjectID(invalid)".to_string();
        }
        let packed = u32::from_be_bytes([data[1], data[2], data[3], data[4]]);
        let object_type = (packed >> 22) as u16;
        let instance = packed & 0x3FFFFF;
        format!("ObjectID(type={} instance={})", object_type, instance)
    }

    /// Format a BACnet service-choice octet for debugging.
    pub fn format_service_choice(service_choice: u8) -> String {
        let service_name = match service_choice {
            0 => "acknowledgeAlarm",
            1 => "confirmedCOVNotification",
            2 => "confirmedEventNotification",
            3 => "getAlarmSummary",
            4 => "getEnrollmentSummary",
            5 => "subscribeCOV",
            6 => "atomicReadFile",
            7 => "atomicWriteFile",
            8 => "addListElement",
            9 => "removeListElement",
            10 => "createObject",
            11 => "deleteObject",
            12 => "readProperty",
            13 => "readPropertyConditional",
            14 => "readPropertyMultiple",
            15 => "writeProperty",
            16 => "writePropertyMultiple",
            17 => "deviceCommunicationControl",
            18 => "confirmedPrivateTransfer",
            19 => "confirmedTextMessage",
            20 => "reinitializeDevice",
            21 => "vtOpen",
            22 => "vtClose",
            23 => "vtData",
            24 => "authenticate",
            25 => "requestKey",
            26 => "readRange",
            28 => "subscribeCOVProperty",
            29 => "getEventInformation",
            _ => "unknown",
        };
        format!("{}({})", service_name, service_choice)
    }

    /// Format a BACnet error class/code pair for debugging.
    pub fn format_bacnet_error(error_class: u8, error_code: u8) -> String {
        let class_name = match error_class {
            0 => "device",
            1 => "object",
            2 => "property",
            3 => "resources",
            4 => "security",
            5 => "services",
            6 => "vt",
            7 => "communication",
            _ => "unknown",
        };
        format!("Error({} class, code {})", class_name, error_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bacnet_date_to_string_handles_sentinels() {
        assert_eq!(bacnet_date_to_string(255, 255, 255, 255), "*/*/* (*)");
        assert_eq!(bacnet_date_to_string(2026, 13, 32, 1), "2026/odd/last (Mon)");
    }

    #[test]
    fn bacnet_time_to_string_pads_fields() {
        assert_eq!(bacnet_time_to_string(9, 5, 0, 0), "09:05:00.00");
    }

    #[test]
    fn instance_number_validity_matches_22_bit_field() {
        assert!(is_valid_instance_number(0x3FFFFF));
        assert!(!is_valid_instance_number(0x400000));
    }

    #[test]
    fn priority_range_is_1_to_16() {
        assert!(priority::is_valid(1));
        assert!(priority::is_valid(16));
        assert!(!priority::is_valid(0));
        assert!(!priority::is_valid(17));
    }

    #[test]
    fn debug_formatting_round_trips_readable_text() {
        let boolean_data = &[0x11, 0x01];
        assert!(debug::format_property_value(boolean_data).contains("Boolean(true)"));

        let real_data = &[0x44, 0x42, 0x28, 0x00, 0x00];
        assert!(debug::format_property_value(real_data).contains("Real(42)"));

        assert!(debug::format_service_choice(12).contains("readProperty"));
        assert!(debug::format_bacnet_error(1, 2).contains("object"));
    }
}
