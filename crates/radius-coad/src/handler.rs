//! Per-packet request handling
//!
//! Each recognized request walks the same linear path:
//!
//! ```text
//! received -> validated -> forwarded -> replied
//! ```
//!
//! A missing Acct-Session-Id is the only rejection decided locally; every
//! other verdict comes from the session authority. Any failure to get a
//! verdict is a NAK, never an ACK.

use crate::extract::SessionAttributes;
use crate::ipc::{ActionRequest, SessionAuthority};
use crate::response::{NakReason, Reply, RequestKind};
use radius_proto::Packet;
use std::sync::Arc;
use tracing::{info, warn};

/// Routes authenticated requests to the disconnect or CoA handler
#[derive(Clone)]
pub struct Dispatcher {
    authority: Arc<dyn SessionAuthority>,
}

impl Dispatcher {
    pub fn new(authority: Arc<dyn SessionAuthority>) -> Self {
        Dispatcher { authority }
    }

    /// Handle one decoded, authenticated request
    ///
    /// Returns `None` for codes the gateway does not serve; those get no
    /// reply at all.
    pub async fn dispatch(&self, request: &Packet) -> Option<Reply> {
        let Some(kind) = RequestKind::from_code(request.code) else {
            warn!(
                code = request.code.as_u8(),
                packet_type = ?request.code,
                request_id = request.identifier,
                "Ignoring unsupported RADIUS code"
            );
            return None;
        };

        Some(match kind {
            RequestKind::Disconnect => self.handle_disconnect(request).await,
            RequestKind::Coa => self.handle_coa(request).await,
        })
    }

    /// Disconnect-Request (RFC 5176 Section 3.1)
    async fn handle_disconnect(&self, request: &Packet) -> Reply {
        let kind = RequestKind::Disconnect;
        let attrs = SessionAttributes::from_packet(request);

        info!(
            session_id = %attrs.session_id,
            username = %attrs.username,
            request_id = request.identifier,
            "Disconnect-Request received"
        );

        if !attrs.has_session_id() {
            warn!(
                request_id = request.identifier,
                "Disconnect-Request rejected: missing Acct-Session-Id"
            );
            return Reply::nak(kind, NakReason::MissingSessionId);
        }

        let action = ActionRequest::Disconnect {
            session_id: attrs.session_id,
        };
        let reply = self.forward(kind, &action).await;
        if reply.is_ack() {
            info!(session_id = %action.session_id(), "Disconnect-ACK");
        }
        reply
    }

    /// CoA-Request (RFC 5176 Section 3.2)
    async fn handle_coa(&self, request: &Packet) -> Reply {
        let kind = RequestKind::Coa;
        let attrs = SessionAttributes::from_packet(request);

        info!(
            session_id = %attrs.session_id,
            filter_id = %attrs.filter_id,
            username = %attrs.username,
            request_id = request.identifier,
            "CoA-Request received"
        );

        if !attrs.has_session_id() {
            warn!(
                request_id = request.identifier,
                "CoA-Request rejected: missing Acct-Session-Id"
            );
            return Reply::nak(kind, NakReason::MissingSessionId);
        }

        // An empty Filter-Id is forwarded as-is; the session authority judges it
        let action = ActionRequest::PolicyChange {
            session_id: attrs.session_id,
            filter_id: attrs.filter_id,
        };
        let reply = self.forward(kind, &action).await;
        if reply.is_ack() {
            if let ActionRequest::PolicyChange {
                session_id,
                filter_id,
            } = &action
            {
                info!(session_id = %session_id, filter_id = %filter_id, "CoA-ACK");
            }
        }
        reply
    }

    /// Deliver the action and turn whatever happens into ACK or NAK
    async fn forward(&self, kind: RequestKind, action: &ActionRequest) -> Reply {
        match self.authority.send(action).await {
            Err(e) => {
                warn!(
                    request_type = kind.name(),
                    session_id = %action.session_id(),
                    error = %e,
                    "IPC error"
                );
                Reply::nak(kind, NakReason::BackendUnavailable)
            }
            Ok(outcome) if !outcome.success => {
                warn!(
                    request_type = kind.name(),
                    session_id = %action.session_id(),
                    error = outcome.error.as_deref().unwrap_or(""),
                    "Rejected by session authority"
                );
                Reply::nak(kind, NakReason::Rejected)
            }
            Ok(_) => Reply::ack(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::{BackendOutcome, IpcError};
    use async_trait::async_trait;
    use radius_proto::{Attribute, AttributeType, Code};
    use std::sync::Mutex;
    use std::time::Duration;

    type Respond = Box<dyn Fn(&ActionRequest) -> Result<BackendOutcome, IpcError> + Send + Sync>;

    /// Records every action and answers through `respond`
    struct FakeAuthority {
        calls: Mutex<Vec<ActionRequest>>,
        respond: Respond,
    }

    impl FakeAuthority {
        fn new(
            respond: impl Fn(&ActionRequest) -> Result<BackendOutcome, IpcError>
                + Send
                + Sync
                + 'static,
        ) -> Arc<Self> {
            Arc::new(FakeAuthority {
                calls: Mutex::new(Vec::new()),
                respond: Box::new(respond),
            })
        }

        fn calls(&self) -> Vec<ActionRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SessionAuthority for FakeAuthority {
        async fn send(&self, request: &ActionRequest) -> Result<BackendOutcome, IpcError> {
            self.calls.lock().unwrap().push(request.clone());
            (self.respond)(request)
        }
    }

    fn packet(code: Code, attrs: &[(AttributeType, &str)]) -> Packet {
        let mut packet = Packet::new(code, 1, [0u8; 16]);
        for (attr_type, value) in attrs {
            packet.add_attribute(Attribute::string(*attr_type as u8, *value).unwrap());
        }
        packet
    }

    #[tokio::test]
    async fn test_disconnect_ack() {
        let authority = FakeAuthority::new(|_| Ok(BackendOutcome::success()));
        let dispatcher = Dispatcher::new(authority.clone());

        let request = packet(
            Code::DisconnectRequest,
            &[
                (AttributeType::AcctSessionId, "sess-42"),
                (AttributeType::UserName, "alice"),
            ],
        );
        let reply = dispatcher.dispatch(&request).await.unwrap();

        assert_eq!(reply.code(), Code::DisconnectAck);
        assert_eq!(
            authority.calls(),
            vec![ActionRequest::Disconnect {
                session_id: "sess-42".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_coa_backend_rejects() {
        let authority = FakeAuthority::new(|_| Ok(BackendOutcome::failure("unknown session")));
        let dispatcher = Dispatcher::new(authority.clone());

        let request = packet(
            Code::CoaRequest,
            &[
                (AttributeType::AcctSessionId, "sess-7"),
                (AttributeType::FilterId, "throttle-1m"),
            ],
        );
        let reply = dispatcher.dispatch(&request).await.unwrap();

        assert_eq!(reply, Reply::nak(RequestKind::Coa, NakReason::Rejected));
        assert_eq!(reply.code(), Code::CoaNak);
        assert_eq!(
            authority.calls(),
            vec![ActionRequest::PolicyChange {
                session_id: "sess-7".to_string(),
                filter_id: "throttle-1m".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_session_id_never_reaches_backend() {
        let authority = FakeAuthority::new(|_| Ok(BackendOutcome::success()));
        let dispatcher = Dispatcher::new(authority.clone());

        let disconnect = packet(Code::DisconnectRequest, &[(AttributeType::UserName, "bob")]);
        let reply = dispatcher.dispatch(&disconnect).await.unwrap();
        assert_eq!(
            reply,
            Reply::nak(RequestKind::Disconnect, NakReason::MissingSessionId)
        );
        assert_eq!(reply.code(), Code::DisconnectNak);

        let coa = packet(Code::CoaRequest, &[(AttributeType::FilterId, "gold")]);
        let reply = dispatcher.dispatch(&coa).await.unwrap();
        assert_eq!(reply.code(), Code::CoaNak);

        let empty = packet(Code::CoaRequest, &[(AttributeType::AcctSessionId, "")]);
        let reply = dispatcher.dispatch(&empty).await.unwrap();
        assert_eq!(reply.code(), Code::CoaNak);

        assert!(authority.calls().is_empty());
    }

    #[tokio::test]
    async fn test_coa_without_filter_id_forwards_empty() {
        let authority = FakeAuthority::new(|_| Ok(BackendOutcome::success()));
        let dispatcher = Dispatcher::new(authority.clone());

        let request = packet(Code::CoaRequest, &[(AttributeType::AcctSessionId, "sess-9")]);
        let reply = dispatcher.dispatch(&request).await.unwrap();

        assert_eq!(reply.code(), Code::CoaAck);
        assert_eq!(
            authority.calls(),
            vec![ActionRequest::PolicyChange {
                session_id: "sess-9".to_string(),
                filter_id: String::new()
            }]
        );
    }

    fn transport_error(kind: usize) -> IpcError {
        match kind {
            0 => IpcError::Timeout(Duration::from_secs(3)),
            1 => IpcError::Decode("expected value".to_string()),
            2 => IpcError::Encode("broken pipe".to_string()),
            _ => IpcError::Connect {
                path: "/tmp/coad.sock".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
        }
    }

    #[tokio::test]
    async fn test_transport_failures_nak() {
        for kind in 0..4 {
            let authority = FakeAuthority::new(move |_| Err(transport_error(kind)));
            let dispatcher = Dispatcher::new(authority.clone());

            let coa = packet(Code::CoaRequest, &[(AttributeType::AcctSessionId, "sess-9")]);
            let reply = dispatcher.dispatch(&coa).await.unwrap();
            assert_eq!(
                reply,
                Reply::nak(RequestKind::Coa, NakReason::BackendUnavailable)
            );

            let dm = packet(
                Code::DisconnectRequest,
                &[(AttributeType::AcctSessionId, "sess-9")],
            );
            let reply = dispatcher.dispatch(&dm).await.unwrap();
            assert_eq!(reply.code(), Code::DisconnectNak);

            // One attempt per request, no retries
            assert_eq!(authority.calls().len(), 2);
        }
    }

    #[tokio::test]
    async fn test_unsupported_codes_are_dropped() {
        let authority = FakeAuthority::new(|_| Ok(BackendOutcome::success()));
        let dispatcher = Dispatcher::new(authority.clone());

        for code in [
            Code::AccessRequest,
            Code::AccountingRequest,
            Code::StatusServer,
            Code::CoaAck,
            Code::DisconnectNak,
        ] {
            let request = packet(code, &[(AttributeType::AcctSessionId, "sess-1")]);
            assert_eq!(dispatcher.dispatch(&request).await, None);
        }

        assert!(authority.calls().is_empty());
    }

    /// Answers after a per-session delay so the replies complete out of order
    struct SlowAuthority;

    #[async_trait]
    impl SessionAuthority for SlowAuthority {
        async fn send(&self, request: &ActionRequest) -> Result<BackendOutcome, IpcError> {
            match request.session_id() {
                "sess-slow" => {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(BackendOutcome::success())
                }
                _ => Ok(BackendOutcome::failure("session not found")),
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_independent() {
        let dispatcher = Dispatcher::new(Arc::new(SlowAuthority));

        let slow = packet(
            Code::DisconnectRequest,
            &[(AttributeType::AcctSessionId, "sess-slow")],
        );
        let fast = packet(Code::CoaRequest, &[(AttributeType::AcctSessionId, "sess-fast")]);

        let (slow_reply, fast_reply) =
            tokio::join!(dispatcher.dispatch(&slow), dispatcher.dispatch(&fast));

        assert_eq!(slow_reply.unwrap().code(), Code::DisconnectAck);
        assert_eq!(fast_reply.unwrap().code(), Code::CoaNak);
    }
}
