//! Session identity carried by CoA/Disconnect requests

use radius_proto::{AttributeType, Packet};

/// Attributes the gateway reads from a Dynamic Authorization request
///
/// Missing attributes are empty strings, so "absent" and "present but empty"
/// are treated the same way everywhere downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionAttributes {
    /// Acct-Session-Id (44), required
    pub session_id: String,
    /// Filter-Id (11), only meaningful for CoA
    pub filter_id: String,
    /// User-Name (1), informational
    pub username: String,
}

impl SessionAttributes {
    pub fn from_packet(packet: &Packet) -> Self {
        SessionAttributes {
            session_id: packet.string_attribute(AttributeType::AcctSessionId as u8),
            filter_id: packet.string_attribute(AttributeType::FilterId as u8),
            username: packet.string_attribute(AttributeType::UserName as u8),
        }
    }

    /// The only attribute whose absence is rejected locally
    pub fn has_session_id(&self) -> bool {
        !self.session_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radius_proto::{Attribute, Code};

    #[test]
    fn test_extract_all_attributes() {
        let mut packet = Packet::new(Code::CoaRequest, 1, [0u8; 16]);
        packet.add_attribute(Attribute::string(AttributeType::UserName as u8, "alice").unwrap());
        packet.add_attribute(
            Attribute::string(AttributeType::AcctSessionId as u8, "sess-7").unwrap(),
        );
        packet.add_attribute(
            Attribute::string(AttributeType::FilterId as u8, "throttle-1m").unwrap(),
        );

        let attrs = SessionAttributes::from_packet(&packet);
        assert_eq!(attrs.session_id, "sess-7");
        assert_eq!(attrs.filter_id, "throttle-1m");
        assert_eq!(attrs.username, "alice");
        assert!(attrs.has_session_id());
    }

    #[test]
    fn test_missing_attributes_are_empty() {
        let packet = Packet::new(Code::DisconnectRequest, 1, [0u8; 16]);
        let attrs = SessionAttributes::from_packet(&packet);

        assert_eq!(attrs, SessionAttributes::default());
        assert!(!attrs.has_session_id());
    }

    #[test]
    fn test_empty_session_id_attribute() {
        let mut packet = Packet::new(Code::DisconnectRequest, 1, [0u8; 16]);
        packet.add_attribute(Attribute::new(AttributeType::AcctSessionId as u8, vec![]).unwrap());

        assert!(!SessionAttributes::from_packet(&packet).has_session_id());
    }

    #[test]
    fn test_first_session_id_wins() {
        let mut packet = Packet::new(Code::DisconnectRequest, 1, [0u8; 16]);
        packet.add_attribute(
            Attribute::string(AttributeType::AcctSessionId as u8, "first").unwrap(),
        );
        packet.add_attribute(
            Attribute::string(AttributeType::AcctSessionId as u8, "second").unwrap(),
        );

        assert_eq!(SessionAttributes::from_packet(&packet).session_id, "first");
    }
}
