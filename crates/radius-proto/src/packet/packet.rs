use super::Code;
use crate::attributes::Attribute;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PacketError {
    #[error("Invalid packet length: {0}")]
    InvalidLength(usize),
    #[error("Invalid packet code: {0}")]
    InvalidCode(u8),
    #[error("Attribute error: {0}")]
    AttributeError(String),
    #[error("Packet too large: {0} bytes")]
    PacketTooLarge(usize),
}

/// A RADIUS packet (RFC 2865 Section 3)
///
/// On the wire: Code (1), Identifier (1), Length (2, big-endian),
/// Authenticator (16), then the attributes.
#[derive(Debug, Clone)]
pub struct Packet {
    pub code: Code,
    /// Matches replies to requests
    pub identifier: u8,
    /// Request or Response Authenticator, depending on `code`
    pub authenticator: [u8; 16],
    pub attributes: Vec<Attribute>,
}

impl Packet {
    /// Header size, and so the smallest valid packet
    pub const MIN_PACKET_SIZE: usize = 20;
    /// RFC 2865 upper bound for any RADIUS packet
    pub const MAX_PACKET_SIZE: usize = 4096;

    pub fn new(code: Code, identifier: u8, authenticator: [u8; 16]) -> Self {
        Packet {
            code,
            identifier,
            authenticator,
            attributes: Vec::new(),
        }
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let length = self.length();
        if length > Self::MAX_PACKET_SIZE {
            return Err(PacketError::PacketTooLarge(length));
        }

        let mut buffer = Vec::with_capacity(length);
        buffer.push(self.code.as_u8());
        buffer.push(self.identifier);
        buffer.extend_from_slice(&(length as u16).to_be_bytes());
        buffer.extend_from_slice(&self.authenticator);
        for attr in &self.attributes {
            attr.encode_into(&mut buffer)?;
        }

        Ok(buffer)
    }

    /// Decode one packet from a datagram
    ///
    /// Bytes past the Length field are padding and are ignored (RFC 2865
    /// Section 3). A datagram shorter than Length is rejected.
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::MIN_PACKET_SIZE {
            return Err(PacketError::InvalidLength(data.len()));
        }

        let code = Code::from_u8(data[0]).ok_or(PacketError::InvalidCode(data[0]))?;
        let length = u16::from_be_bytes([data[2], data[3]]) as usize;
        if !(Self::MIN_PACKET_SIZE..=Self::MAX_PACKET_SIZE).contains(&length)
            || length > data.len()
        {
            return Err(PacketError::InvalidLength(length));
        }

        let mut authenticator = [0u8; 16];
        authenticator.copy_from_slice(&data[4..Self::MIN_PACKET_SIZE]);

        let mut attributes = Vec::new();
        let mut rest = &data[Self::MIN_PACKET_SIZE..length];
        while !rest.is_empty() {
            let (attr, tail) = Attribute::parse(rest)?;
            attributes.push(attr);
            rest = tail;
        }

        Ok(Packet {
            code,
            identifier: data[1],
            authenticator,
            attributes,
        })
    }

    /// Encoded size in bytes
    pub fn length(&self) -> usize {
        Self::MIN_PACKET_SIZE
            + self
                .attributes
                .iter()
                .map(Attribute::encoded_length)
                .sum::<usize>()
    }

    pub fn find_attribute(&self, attr_type: u8) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.attr_type == attr_type)
    }

    /// Every attribute of `attr_type`, in packet order
    pub fn find_all_attributes(&self, attr_type: u8) -> Vec<&Attribute> {
        self.attributes
            .iter()
            .filter(|a| a.attr_type == attr_type)
            .collect()
    }

    /// Value of the first attribute of `attr_type` as text
    ///
    /// Missing attributes read as an empty string. Invalid UTF-8 is replaced
    /// rather than rejected, since identifiers are treated as opaque.
    pub fn string_attribute(&self, attr_type: u8) -> String {
        self.find_attribute(attr_type)
            .map(|a| String::from_utf8_lossy(&a.value).into_owned())
            .unwrap_or_default()
    }

    /// Byte offset of the first `attr_type` value within the encoded packet
    pub fn attribute_value_offset(&self, attr_type: u8) -> Option<usize> {
        let mut offset = Self::MIN_PACKET_SIZE;
        for attr in &self.attributes {
            if attr.attr_type == attr_type {
                return Some(offset + Attribute::HEADER_LEN);
            }
            offset += attr.encoded_length();
        }
        None
    }

    /// Start a reply to this request: same identifier, no attributes
    ///
    /// The authenticator is left as the request's until the caller signs the
    /// finished reply.
    pub fn response(&self, code: Code) -> Packet {
        Packet::new(code, self.identifier, self.authenticator)
    }
}
