//! RADIUS Protocol Implementation
//!
//! Wire support for the RADIUS Dynamic Authorization Extensions (RFC 5176):
//! the packet and attribute codec from RFC 2865, the digest-style Request
//! Authenticator shared by Accounting, CoA and Disconnect requests, Response
//! Authenticators, Message-Authenticator (RFC 2869) and Error-Cause values.
//!
//! # Example
//!
//! ```rust
//! use radius_proto::{Attribute, AttributeType, Code, Packet};
//! use radius_proto::auth::{sign_request, verify_request_authenticator};
//!
//! // Build a Disconnect-Request for one session
//! let mut packet = Packet::new(Code::DisconnectRequest, 1, [0u8; 16]);
//! packet.add_attribute(
//!     Attribute::string(AttributeType::AcctSessionId as u8, "sess-42").unwrap()
//! );
//!
//! // Fill in the Request Authenticator
//! sign_request(&mut packet, b"testing123").unwrap();
//! assert!(verify_request_authenticator(&packet, b"testing123"));
//!
//! // Encode to bytes
//! let bytes = packet.encode().unwrap();
//! ```

pub mod attributes;
pub mod auth;
pub mod error_cause;
pub mod message_auth;
pub mod packet;

pub use attributes::{Attribute, AttributeType};
pub use auth::{
    calculate_request_authenticator, calculate_response_authenticator, is_authentic_request,
    sign_request, verify_request_authenticator, verify_response_authenticator,
};
pub use error_cause::ErrorCause;
pub use message_auth::{calculate_message_authenticator, verify_request_message_authenticator};
pub use packet::{Code, Packet, PacketError};
