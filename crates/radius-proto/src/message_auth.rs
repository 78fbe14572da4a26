//! Message-Authenticator Support (RFC 2869, RFC 5176 Section 3.5)
//!
//! Message-Authenticator is an HMAC-MD5 over the whole packet keyed with the
//! shared secret, computed with its own 16-octet value set to zeros.
//!
//! For CoA-Request and Disconnect-Request packets the Request Authenticator
//! field is also zeroed while computing it, because the Request Authenticator
//! is itself a digest that covers the Message-Authenticator.

use crate::packet::Packet;
use hmac::{Hmac, Mac};
use md5_digest::Md5;

type HmacMd5 = Hmac<Md5>;

const AUTHENTICATOR_RANGE: std::ops::Range<usize> = 4..20;
const MESSAGE_AUTHENTICATOR_LEN: usize = 16;

/// Calculate Message-Authenticator for a RADIUS packet
///
/// `packet_bytes` must already have the Message-Authenticator value (and, for
/// dynamic authorization requests, the Request Authenticator) zeroed.
pub fn calculate_message_authenticator(packet_bytes: &[u8], secret: &[u8]) -> [u8; 16] {
    let mut mac = HmacMd5::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(packet_bytes);
    let bytes = mac.finalize().into_bytes();

    let mut output = [0u8; 16];
    output.copy_from_slice(&bytes);
    output
}

/// Verify the Message-Authenticator of a received CoA/Disconnect request
///
/// # Arguments
/// * `packet_bytes` - The request exactly as received
/// * `secret` - The shared secret
/// * `message_auth_offset` - Byte offset of the Message-Authenticator value
///
/// # Returns
/// true if the Message-Authenticator is valid, false otherwise
pub fn verify_request_message_authenticator(
    packet_bytes: &[u8],
    secret: &[u8],
    message_auth_offset: usize,
) -> bool {
    if packet_bytes.len() < Packet::MIN_PACKET_SIZE
        || message_auth_offset < Packet::MIN_PACKET_SIZE
        || message_auth_offset + MESSAGE_AUTHENTICATOR_LEN > packet_bytes.len()
    {
        return false;
    }

    let value_range = message_auth_offset..message_auth_offset + MESSAGE_AUTHENTICATOR_LEN;
    let received = &packet_bytes[value_range.clone()];

    let mut zeroed = packet_bytes.to_vec();
    zeroed[AUTHENTICATOR_RANGE].fill(0);
    zeroed[value_range].fill(0);

    calculate_message_authenticator(&zeroed, secret) == received
}
