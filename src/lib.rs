//! BACnet application-layer codec.
//!
//! Encodes and decodes Application Protocol Data Units (APDUs) as defined by
//! ASHRAE 135 clause 20: tags, primitive application data, the confirmed and
//! unconfirmed services used by the most common building-automation
//! workflows, and the APDU header that carries them. The crate is a pure
//! codec: it has no opinion about sockets, routing, or object storage, and
//! every operation here is a stateless function of its input buffer.
#![cfg_attr(not(feature = "std"), no_std)]

pub mod app;
pub mod encoding;
pub mod handler;
pub mod object;
pub mod service;
pub mod util;

// Re-export main types without glob imports to avoid conflicts
pub use app::{Apdu, ApduType, InvokeIdManager};
pub use encoding::{ApplicationData, ApplicationTag, BitString, EncodingError};
pub use handler::dispatch_confirmed_request;
pub use object::{ObjectIdentifier, ObjectType, PropertyIdentifier};
pub use service::{
    decode_confirmed_request, decode_unconfirmed_request, ConfirmedServiceChoice,
    ConfirmedServiceRequest, UnconfirmedServiceChoice, UnconfirmedServiceRequest,
};

#[cfg(feature = "std")]
extern crate std;

#[cfg(not(feature = "std"))]
extern crate alloc;

pub const BACNET_PROTOCOL_VERSION: u8 = 1;
pub const BACNET_MAX_APDU: usize = 1476;
pub const BACNET_MAX_MPDU: usize = 1497;
