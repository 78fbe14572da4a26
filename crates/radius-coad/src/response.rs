//! Mapping of handler verdicts to RADIUS replies

use radius_proto::{calculate_response_authenticator, AttributeType, Code, ErrorCause, Packet, PacketError};

/// The two request types the gateway answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Disconnect,
    Coa,
}

impl RequestKind {
    pub fn from_code(code: Code) -> Option<Self> {
        match code {
            Code::DisconnectRequest => Some(RequestKind::Disconnect),
            Code::CoaRequest => Some(RequestKind::Coa),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RequestKind::Disconnect => "disconnect",
            RequestKind::Coa => "coa",
        }
    }
}

/// Why a request was NAKed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NakReason {
    /// Acct-Session-Id missing or empty; decided locally
    MissingSessionId,
    /// The session authority could not be reached or did not answer sensibly
    BackendUnavailable,
    /// The session authority answered `success: false`
    Rejected,
}

impl NakReason {
    /// Error-Cause attribute value sent with the NAK, if any
    pub fn error_cause(self) -> Option<ErrorCause> {
        match self {
            NakReason::MissingSessionId => Some(ErrorCause::MissingAttribute),
            NakReason::BackendUnavailable => Some(ErrorCause::ResourcesUnavailable),
            NakReason::Rejected => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ack,
    Nak(NakReason),
}

/// Outcome of handling one request, before it is put on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    pub kind: RequestKind,
    pub verdict: Verdict,
}

impl Reply {
    pub fn ack(kind: RequestKind) -> Self {
        Reply {
            kind,
            verdict: Verdict::Ack,
        }
    }

    pub fn nak(kind: RequestKind, reason: NakReason) -> Self {
        Reply {
            kind,
            verdict: Verdict::Nak(reason),
        }
    }

    pub fn is_ack(&self) -> bool {
        self.verdict == Verdict::Ack
    }

    pub fn code(&self) -> Code {
        reply_code(self.kind, self.is_ack())
    }
}

/// Reply code for a request kind and ACK/NAK intent
pub fn reply_code(kind: RequestKind, ack: bool) -> Code {
    match (kind, ack) {
        (RequestKind::Disconnect, true) => Code::DisconnectAck,
        (RequestKind::Disconnect, false) => Code::DisconnectNak,
        (RequestKind::Coa, true) => Code::CoaAck,
        (RequestKind::Coa, false) => Code::CoaNak,
    }
}

/// Build the signed reply packet for `request`
///
/// Proxy-State attributes are echoed in order (RFC 5176 Section 3.5) and the
/// Response Authenticator is computed over the finished packet. The echoed
/// attributes always fit, since they fit in the request. Error-Cause is
/// dropped when it would push the reply past the packet size limit.
pub fn build_reply(request: &Packet, reply: &Reply, secret: &[u8]) -> Result<Packet, PacketError> {
    let mut response = request.response(reply.code());

    for attr in request.find_all_attributes(AttributeType::ProxyState as u8) {
        response.add_attribute(attr.clone());
    }

    if let Verdict::Nak(reason) = reply.verdict {
        if let Some(cause) = reason.error_cause() {
            let attr = cause.to_attribute()?;
            if response.length() + attr.encoded_length() <= Packet::MAX_PACKET_SIZE {
                response.add_attribute(attr);
            }
        }
    }

    response.authenticator =
        calculate_response_authenticator(&response, &request.authenticator, secret);

    Ok(response)
}
