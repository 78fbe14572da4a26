//! Session authority IPC client
//!
//! Each action is delivered over its own Unix socket connection: connect,
//! write one JSON request, read one JSON response, close. Nothing else
//! delimits the messages, so the response is read until the bytes received
//! so far form one complete JSON value.
//!
//! ```text
//! -> {"action":"policy_change","session_id":"sess-7","filter_id":"throttle-1m"}
//! <- {"success":false,"error":"unknown session"}
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::debug;

/// Largest response accepted from the session authority
pub const MAX_RESPONSE_SIZE: usize = 64 * 1024;

const READ_CHUNK_SIZE: usize = 4096;

/// IPC failures. Every variant means the backend state is unknown.
#[derive(Error, Debug)]
pub enum IpcError {
    #[error("connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("send request: {0}")]
    Encode(String),
    #[error("read response: {0}")]
    Decode(String),
    #[error("IPC exchange timed out after {0:?}")]
    Timeout(Duration),
}

/// Action forwarded to the session authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRequest {
    /// Tear the session down
    Disconnect { session_id: String },
    /// Apply the named filter/policy to the session. The filter id may be empty.
    PolicyChange {
        session_id: String,
        filter_id: String,
    },
}

impl ActionRequest {
    pub fn session_id(&self) -> &str {
        match self {
            ActionRequest::Disconnect { session_id }
            | ActionRequest::PolicyChange { session_id, .. } => session_id,
        }
    }

    /// Wire name of the action
    pub fn action(&self) -> &'static str {
        match self {
            ActionRequest::Disconnect { .. } => "disconnect",
            ActionRequest::PolicyChange { .. } => "policy_change",
        }
    }
}

/// Verdict returned by the session authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackendOutcome {
    pub fn success() -> Self {
        BackendOutcome {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        BackendOutcome {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Whoever decides the fate of subscriber sessions
///
/// Implemented by [`IpcClient`] in production; tests substitute in-process fakes.
#[async_trait]
pub trait SessionAuthority: Send + Sync {
    /// Deliver one action and wait for the verdict
    async fn send(&self, request: &ActionRequest) -> Result<BackendOutcome, IpcError>;
}

/// Unix socket client for the session authority
#[derive(Debug, Clone)]
pub struct IpcClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl IpcClient {
    pub fn new(socket_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        IpcClient {
            socket_path: socket_path.into(),
            timeout,
        }
    }

    async fn exchange(&self, request: &ActionRequest) -> Result<BackendOutcome, IpcError> {
        let mut stream =
            UnixStream::connect(&self.socket_path)
                .await
                .map_err(|source| IpcError::Connect {
                    path: self.socket_path.clone(),
                    source,
                })?;

        let mut payload =
            serde_json::to_vec(request).map_err(|e| IpcError::Encode(e.to_string()))?;
        payload.push(b'\n');
        stream
            .write_all(&payload)
            .await
            .map_err(|e| IpcError::Encode(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| IpcError::Encode(e.to_string()))?;

        let outcome = read_json_value(&mut stream, MAX_RESPONSE_SIZE).await;
        drop(stream);
        outcome
    }
}

#[async_trait]
impl SessionAuthority for IpcClient {
    async fn send(&self, request: &ActionRequest) -> Result<BackendOutcome, IpcError> {
        debug!(
            socket = %self.socket_path.display(),
            action = request.action(),
            session_id = %request.session_id(),
            "Sending IPC request"
        );

        // The stream lives inside the timed future, so expiry also closes it
        tokio::time::timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| IpcError::Timeout(self.timeout))?
    }
}

/// Read from `reader` until the bytes received form one complete JSON value
///
/// Anything after the value is ignored. The connection closing first, or the
/// value outgrowing `limit`, is a decode error.
pub async fn read_json_value<R, T>(reader: &mut R, limit: usize) -> Result<T, IpcError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut buf = Vec::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let n = reader
            .read(&mut chunk)
            .await
            .map_err(|e| IpcError::Decode(e.to_string()))?;
        if n == 0 {
            return Err(IpcError::Decode(if buf.is_empty() {
                "connection closed without a response".to_string()
            } else {
                "connection closed before the response was complete".to_string()
            }));
        }
        buf.extend_from_slice(&chunk[..n]);

        match serde_json::Deserializer::from_slice(&buf)
            .into_iter::<T>()
            .next()
        {
            Some(Ok(value)) => return Ok(value),
            Some(Err(e)) if !e.is_eof() => return Err(IpcError::Decode(e.to_string())),
            // Incomplete value, or only whitespace so far
            _ => {}
        }

        if buf.len() > limit {
            return Err(IpcError::Decode(format!(
                "response exceeds {} bytes",
                limit
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::net::UnixListener;

    /// Accept one connection, capture the request line, answer with `reply` in pieces
    async fn serve_once(
        listener: UnixListener,
        reply: Vec<&'static [u8]>,
    ) -> tokio::task::JoinHandle<String> {
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request: serde_json::Value = read_json_value(&mut stream, MAX_RESPONSE_SIZE)
                .await
                .unwrap();
            for piece in reply {
                stream.write_all(piece).await.unwrap();
                stream.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            request.to_string()
        })
    }

    fn bind(dir: &TempDir) -> (UnixListener, PathBuf) {
        let path = dir.path().join("coad.sock");
        (UnixListener::bind(&path).unwrap(), path)
    }

    #[test]
    fn test_disconnect_request_shape() {
        let request = ActionRequest::Disconnect {
            session_id: "sess-42".to_string(),
        };
        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action": "disconnect", "session_id": "sess-42"})
        );
    }

    #[test]
    fn test_policy_change_keeps_empty_filter_id() {
        let request = ActionRequest::PolicyChange {
            session_id: "sess-9".to_string(),
            filter_id: String::new(),
        };
        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action": "policy_change", "session_id": "sess-9", "filter_id": ""})
        );
        assert_eq!(request.action(), "policy_change");
        assert_eq!(request.session_id(), "sess-9");
    }

    #[test]
    fn test_outcome_ignores_unknown_fields() {
        let outcome: BackendOutcome =
            serde_json::from_str(r#"{"success": true, "session": {"ip": "10.0.0.2"}}"#).unwrap();
        assert_eq!(outcome, BackendOutcome::success());

        let outcome: BackendOutcome =
            serde_json::from_str(r#"{"success": false, "error": "unknown session"}"#).unwrap();
        assert_eq!(outcome, BackendOutcome::failure("unknown session"));
    }

    #[tokio::test]
    async fn test_send_success() {
        let dir = TempDir::new().unwrap();
        let (listener, path) = bind(&dir);
        let server = serve_once(listener, vec![br#"{"success": true}"#]).await;

        let client = IpcClient::new(&path, Duration::from_secs(1));
        let outcome = client
            .send(&ActionRequest::Disconnect {
                session_id: "sess-42".to_string(),
            })
            .await
            .unwrap();

        assert!(outcome.success);
        let seen = server.await.unwrap();
        assert_eq!(seen, r#"{"action":"disconnect","session_id":"sess-42"}"#);
    }

    #[tokio::test]
    async fn test_send_backend_failure() {
        let dir = TempDir::new().unwrap();
        let (listener, path) = bind(&dir);
        let server = serve_once(
            listener,
            vec![br#"{"success": false, "error": "unknown session"}"#],
        )
        .await;

        let client = IpcClient::new(&path, Duration::from_secs(1));
        let outcome = client
            .send(&ActionRequest::PolicyChange {
                session_id: "sess-7".to_string(),
                filter_id: "throttle-1m".to_string(),
            })
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("unknown session"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_response_split_across_writes() {
        let dir = TempDir::new().unwrap();
        let (listener, path) = bind(&dir);
        let server = serve_once(listener, vec![b"  {\"succ", b"ess\": tr", b"ue}"]).await;

        let client = IpcClient::new(&path, Duration::from_secs(1));
        let outcome = client
            .send(&ActionRequest::Disconnect {
                session_id: "sess-1".to_string(),
            })
            .await
            .unwrap();

        assert!(outcome.success);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_error() {
        let dir = TempDir::new().unwrap();
        let client = IpcClient::new(dir.path().join("missing.sock"), Duration::from_secs(1));

        let result = client
            .send(&ActionRequest::Disconnect {
                session_id: "sess-1".to_string(),
            })
            .await;

        assert!(matches!(result, Err(IpcError::Connect { .. })));
    }

    #[tokio::test]
    async fn test_garbage_response() {
        let dir = TempDir::new().unwrap();
        let (listener, path) = bind(&dir);
        let server = serve_once(listener, vec![b"not json at all"]).await;

        let client = IpcClient::new(&path, Duration::from_secs(1));
        let result = client
            .send(&ActionRequest::Disconnect {
                session_id: "sess-1".to_string(),
            })
            .await;

        assert!(matches!(result, Err(IpcError::Decode(_))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_wrong_shape_response() {
        let dir = TempDir::new().unwrap();
        let (listener, path) = bind(&dir);
        let server = serve_once(listener, vec![br#"{"ok": true}"#]).await;

        let client = IpcClient::new(&path, Duration::from_secs(1));
        let result = client
            .send(&ActionRequest::Disconnect {
                session_id: "sess-1".to_string(),
            })
            .await;

        assert!(matches!(result, Err(IpcError::Decode(_))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_truncated_response() {
        let dir = TempDir::new().unwrap();
        let (listener, path) = bind(&dir);
        // Connection closes after half a value
        let server = serve_once(listener, vec![br#"{"success": tr"#]).await;

        let client = IpcClient::new(&path, Duration::from_secs(1));
        let result = client
            .send(&ActionRequest::Disconnect {
                session_id: "sess-1".to_string(),
            })
            .await;

        assert!(matches!(result, Err(IpcError::Decode(_))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout_when_backend_is_silent() {
        let dir = TempDir::new().unwrap();
        let (listener, path) = bind(&dir);
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            drop(stream);
        });

        let client = IpcClient::new(&path, Duration::from_millis(50));
        let result = client
            .send(&ActionRequest::Disconnect {
                session_id: "sess-1".to_string(),
            })
            .await;

        assert!(matches!(result, Err(IpcError::Timeout(d)) if d == Duration::from_millis(50)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_response() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        tokio::spawn(async move {
            server.write_all(b"[").await.unwrap();
            server.write_all(&[b'1'; 256]).await.unwrap();
        });

        let result: Result<serde_json::Value, _> = read_json_value(&mut client, 128).await;
        assert!(matches!(result, Err(IpcError::Decode(_))));
    }
}
