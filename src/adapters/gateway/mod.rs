pub mod wire;

use crate::core::{ConnectRequest, SessionClient};
use crate::utils::error::{CheckError, Result};
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use wire::IncomingMessage;

const MAX_DEADLINE_SECS: u64 = 3600;

/// `SessionClient` speaking the gateway's socket API.
///
/// Only session negotiation is implemented: greeting, version exchange, start-API, and
/// waiting for the managed accounts and next valid id. Nothing else is ever sent.
#[derive(Debug, Default)]
pub struct GatewayClient {
    stream: Option<TcpStream>,
    connected: bool,
    accounts: Vec<String>,
    server_version: Option<i32>,
    connection_time: Option<String>,
}

impl GatewayClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.stream = None;
        self.connected = false;
        self.accounts.clear();
        self.server_version = None;
        self.connection_time = None;
    }

    async fn negotiate(&mut self, client_id: i32) -> Result<()> {
        let stream = self.stream.as_mut().ok_or_else(|| CheckError::UnexpectedError {
            message: "negotiation started without a socket".to_string(),
        })?;

        wire::write_all(stream, &wire::greeting())
            .await
            .map_err(handshake_io_error)?;

        let reply = read_fields(stream).await?;
        let server_version = reply
            .first()
            .and_then(|v| v.trim().parse::<i32>().ok())
            .ok_or_else(|| CheckError::HandshakeRejected {
                code: None,
                message: format!("unexpected greeting reply {:?}", reply),
            })?;
        tracing::debug!("Gateway server version {}", server_version);
        self.server_version = Some(server_version);
        self.connection_time = reply.get(1).filter(|t| !t.is_empty()).cloned();

        wire::write_all(stream, &wire::start_api(client_id))
            .await
            .map_err(handshake_io_error)?;

        let mut accounts = None;
        let mut next_valid_id = None;
        while accounts.is_none() || next_valid_id.is_none() {
            let fields = read_fields(stream).await?;
            match wire::parse_message(&fields)? {
                IncomingMessage::ManagedAccounts(list) => accounts = Some(list),
                IncomingMessage::NextValidId(id) => next_valid_id = Some(id),
                IncomingMessage::Error { code, message, .. } if wire::is_informational(code) => {
                    tracing::debug!("Gateway notice {}: {}", code, message);
                }
                IncomingMessage::Error { code, message, .. } => {
                    return Err(CheckError::HandshakeRejected {
                        code: Some(code),
                        message,
                    });
                }
                IncomingMessage::Other(msg_id) => {
                    tracing::trace!("Ignoring message {} during handshake", msg_id);
                }
            }
        }

        self.accounts = accounts.unwrap_or_default();
        self.connected = true;
        Ok(())
    }
}

/// `now + timeout`, clamped to one hour out when the sum does not fit in an `Instant`.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(MAX_DEADLINE_SECS))
}

async fn read_fields(stream: &mut TcpStream) -> Result<Vec<String>> {
    match wire::read_frame(stream).await {
        Ok(Some(payload)) => Ok(wire::decode_fields(&payload)),
        Ok(None) => Err(CheckError::HandshakeRejected {
            code: None,
            message: "connection closed by gateway during handshake".to_string(),
        }),
        Err(e) => Err(handshake_io_error(e)),
    }
}

fn handshake_io_error(e: io::Error) -> CheckError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::InvalidData => CheckError::HandshakeRejected {
            code: None,
            message: e.to_string(),
        },
        _ => CheckError::UnexpectedError {
            message: e.to_string(),
        },
    }
}

#[async_trait]
impl SessionClient for GatewayClient {
    async fn connect(&mut self, request: &ConnectRequest) -> Result<()> {
        if !request.readonly {
            return Err(CheckError::UnexpectedError {
                message: "only read-only sessions are supported".to_string(),
            });
        }
        if self.stream.is_some() {
            self.disconnect().await;
        }
        // 清掉上一次連線留下的帳戶與版本
        self.reset();

        let deadline = deadline_after(request.timeout);
        let address = format!("{}:{}", request.host, request.port);

        let connect = TcpStream::connect((request.host.as_str(), request.port));
        let stream = match timeout_at(deadline, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(CheckError::SocketUnreachable {
                    address,
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(CheckError::SocketUnreachable {
                    address,
                    reason: format!("no TCP connection within {:?}", request.timeout),
                })
            }
        };
        self.stream = Some(stream);

        match timeout_at(deadline, self.negotiate(request.client_id)).await {
            Ok(Ok(())) => {
                tracing::debug!(
                    "API session open on {} (server version {:?})",
                    address,
                    self.server_version
                );
                Ok(())
            }
            Ok(Err(e)) => {
                self.disconnect().await;
                Err(e)
            }
            Err(_) => {
                self.disconnect().await;
                Err(CheckError::HandshakeTimeout {
                    address,
                    timeout: request.timeout,
                })
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected && self.stream.is_some()
    }

    fn managed_accounts(&self) -> Vec<String> {
        self.accounts.clone()
    }

    fn server_version(&self) -> Option<i32> {
        self.server_version
    }

    fn connection_time(&self) -> Option<String> {
        self.connection_time.clone()
    }

    async fn disconnect(&mut self) {
        let was_connected = self.connected;
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                tracing::debug!("Socket shutdown failed: {}", e);
            }
            if was_connected {
                tracing::info!("Disconnected.");
            }
        }
        self.connected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn request(port: u16, timeout: Duration) -> ConnectRequest {
        ConnectRequest {
            host: "127.0.0.1".to_string(),
            port,
            client_id: 1,
            timeout,
            readonly: true,
        }
    }

    #[tokio::test]
    async fn test_disconnect_without_session_is_noop() {
        let mut client = GatewayClient::new();
        client.disconnect().await;
        client.disconnect().await;
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_trading_session_is_refused() {
        let mut client = GatewayClient::new();
        let mut req = request(4002, Duration::from_secs(1));
        req.readonly = false;

        let err = client.connect(&req).await.unwrap_err();
        assert!(matches!(err, CheckError::UnexpectedError { .. }));
    }

    #[tokio::test]
    async fn test_refused_port_is_socket_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut client = GatewayClient::new();
        let err = client
            .connect(&request(port, Duration::from_secs(1)))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckError::SocketUnreachable { .. }));
        assert!(!client.is_connected());
    }

    #[test]
    fn test_unbounded_timeout_gives_clamped_deadline() {
        let now = Instant::now();
        let deadline = deadline_after(Duration::MAX);
        assert!(deadline > now);
        assert!(deadline <= Instant::now() + Duration::from_secs(MAX_DEADLINE_SECS));

        let deadline = deadline_after(Duration::from_secs(5));
        assert!(deadline <= Instant::now() + Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_huge_timeout_on_refused_port_does_not_panic() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut client = GatewayClient::new();
        let err = client
            .connect(&request(port, Duration::MAX))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckError::SocketUnreachable { .. }));
    }

    #[tokio::test]
    async fn test_peer_closing_during_greeting_is_rejection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });

        let mut client = GatewayClient::new();
        let err = client
            .connect(&request(port, Duration::from_secs(2)))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckError::HandshakeRejected { .. }));
        assert!(!client.is_connected());
    }
}
