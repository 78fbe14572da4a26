//! Error-Cause Attribute Values (RFC 5176 Section 3.6)
//!
//! A Disconnect-NAK or CoA-NAK may carry an Error-Cause attribute telling
//! the Dynamic Authorization Client why the request was not honoured.
//! Values in the 2xx range are only valid in ACKs, 4xx means the client
//! should not simply retry, and 5xx means the failure is on the server side.
//!
//! # Example
//!
//! ```rust
//! use radius_proto::error_cause::ErrorCause;
//!
//! let cause = ErrorCause::MissingAttribute;
//! assert_eq!(cause.as_u32(), 402);
//! assert!(cause.is_client_error());
//! ```

use crate::attributes::{Attribute, AttributeType};
use crate::packet::PacketError;

/// Error-Cause values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCause {
    /// Residual Session Context Removed (201)
    ResidualSessionContextRemoved = 201,
    /// Invalid EAP Packet (Ignored) (202)
    InvalidEapPacket = 202,
    /// Unsupported Attribute (401)
    UnsupportedAttribute = 401,
    /// Missing Attribute (402)
    MissingAttribute = 402,
    /// NAS Identification Mismatch (403)
    NasIdentificationMismatch = 403,
    /// Invalid Request (404)
    InvalidRequest = 404,
    /// Unsupported Service (405)
    UnsupportedService = 405,
    /// Unsupported Extension (406)
    UnsupportedExtension = 406,
    /// Invalid Attribute Value (407)
    InvalidAttributeValue = 407,
    /// Administratively Prohibited (501)
    AdministrativelyProhibited = 501,
    /// Request Not Routable (Proxy) (502)
    RequestNotRoutable = 502,
    /// Session Context Not Found (503)
    SessionContextNotFound = 503,
    /// Session Context Not Removable (504)
    SessionContextNotRemovable = 504,
    /// Other Proxy Processing Error (505)
    OtherProxyProcessingError = 505,
    /// Resources Unavailable (506)
    ResourcesUnavailable = 506,
    /// Request Initiated (507)
    RequestInitiated = 507,
    /// Multiple Session Selection Unsupported (508)
    MultipleSessionSelectionUnsupported = 508,
}

impl ErrorCause {
    /// Convert from u32 value
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            201 => Some(ErrorCause::ResidualSessionContextRemoved),
            202 => Some(ErrorCause::InvalidEapPacket),
            401 => Some(ErrorCause::UnsupportedAttribute),
            402 => Some(ErrorCause::MissingAttribute),
            403 => Some(ErrorCause::NasIdentificationMismatch),
            404 => Some(ErrorCause::InvalidRequest),
            405 => Some(ErrorCause::UnsupportedService),
            406 => Some(ErrorCause::UnsupportedExtension),
            407 => Some(ErrorCause::InvalidAttributeValue),
            501 => Some(ErrorCause::AdministrativelyProhibited),
            502 => Some(ErrorCause::RequestNotRoutable),
            503 => Some(ErrorCause::SessionContextNotFound),
            504 => Some(ErrorCause::SessionContextNotRemovable),
            505 => Some(ErrorCause::OtherProxyProcessingError),
            506 => Some(ErrorCause::ResourcesUnavailable),
            507 => Some(ErrorCause::RequestInitiated),
            508 => Some(ErrorCause::MultipleSessionSelectionUnsupported),
            _ => None,
        }
    }

    /// Convert to u32 value
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// 4xx: the request itself was at fault
    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.as_u32())
    }

    /// 5xx: the request was valid but could not be carried out
    pub fn is_server_error(self) -> bool {
        (500..600).contains(&self.as_u32())
    }

    /// Build the Error-Cause attribute carrying this value
    pub fn to_attribute(self) -> Result<Attribute, PacketError> {
        Attribute::integer(AttributeType::ErrorCause as u8, self.as_u32())
    }

    /// Read an Error-Cause attribute back
    pub fn from_attribute(attr: &Attribute) -> Result<Self, PacketError> {
        let value = attr.as_integer()?;
        Self::from_u32(value)
            .ok_or_else(|| PacketError::AttributeError(format!("Unknown Error-Cause: {}", value)))
    }
}
