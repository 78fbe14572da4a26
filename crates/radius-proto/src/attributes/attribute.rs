use crate::packet::PacketError;

/// One type-length-value attribute (RFC 2865 Section 5)
///
/// The length octet on the wire covers the two header octets plus the value,
/// so a value holds at most 253 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub attr_type: u8,
    pub value: Vec<u8>,
}

impl Attribute {
    /// Type and length octets preceding the value
    pub const HEADER_LEN: usize = 2;
    pub const MAX_VALUE_LEN: usize = 253;

    pub fn new(attr_type: u8, value: Vec<u8>) -> Result<Self, PacketError> {
        if value.len() > Self::MAX_VALUE_LEN {
            return Err(PacketError::AttributeError(format!(
                "type {} value is {} bytes, limit is {}",
                attr_type,
                value.len(),
                Self::MAX_VALUE_LEN
            )));
        }
        Ok(Attribute { attr_type, value })
    }

    /// Text attribute, stored as its UTF-8 bytes
    pub fn string(attr_type: u8, value: impl Into<String>) -> Result<Self, PacketError> {
        Self::new(attr_type, value.into().into_bytes())
    }

    /// 32-bit big-endian integer attribute
    pub fn integer(attr_type: u8, value: u32) -> Result<Self, PacketError> {
        Self::new(attr_type, value.to_be_bytes().to_vec())
    }

    /// Append the wire form to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), PacketError> {
        let length = u8::try_from(self.encoded_length()).map_err(|_| {
            PacketError::AttributeError(format!(
                "type {} value is {} bytes, limit is {}",
                self.attr_type,
                self.value.len(),
                Self::MAX_VALUE_LEN
            ))
        })?;

        out.push(self.attr_type);
        out.push(length);
        out.extend_from_slice(&self.value);
        Ok(())
    }

    /// Split the leading attribute off `data`
    ///
    /// Returns the attribute and whatever follows it.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8]), PacketError> {
        let (attr_type, length) = match data {
            [attr_type, length, ..] => (*attr_type, *length as usize),
            _ => {
                return Err(PacketError::AttributeError(format!(
                    "{} trailing byte(s) cannot hold an attribute header",
                    data.len()
                )))
            }
        };

        if length < Self::HEADER_LEN {
            return Err(PacketError::AttributeError(format!(
                "type {} declares length {}",
                attr_type, length
            )));
        }

        let value = data.get(Self::HEADER_LEN..length).ok_or_else(|| {
            PacketError::AttributeError(format!(
                "type {} declares length {} but only {} byte(s) remain",
                attr_type,
                length,
                data.len()
            ))
        })?;

        let attr = Attribute {
            attr_type,
            value: value.to_vec(),
        };
        Ok((attr, &data[length..]))
    }

    pub fn encoded_length(&self) -> usize {
        Self::HEADER_LEN + self.value.len()
    }

    /// Read the value as a 32-bit big-endian integer
    pub fn as_integer(&self) -> Result<u32, PacketError> {
        let bytes: [u8; 4] = self.value.as_slice().try_into().map_err(|_| {
            PacketError::AttributeError(format!(
                "type {} integer value is {} bytes",
                self.attr_type,
                self.value.len()
            ))
        })?;
        Ok(u32::from_be_bytes(bytes))
    }
}
