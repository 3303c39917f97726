#![allow(dead_code)]

use gateway_check::adapters::gateway::wire;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// How the mock gateway answers a new connection.
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Full login: version reply, a farm notice, managed accounts, next valid id.
    Accept { accounts: Vec<String> },
    /// Accepts the socket and never says anything.
    Silent,
    /// Closes the socket as soon as it is accepted.
    CloseImmediately,
    /// Answers the start-API message with an error.
    Reject { code: i32, message: String },
}

/// In-process stand-in for a gateway, listening on an ephemeral port.
pub struct MockGateway {
    port: u16,
    active_clients: Arc<Mutex<HashSet<i32>>>,
    handle: JoinHandle<()>,
}

impl MockGateway {
    pub async fn start(behaviour: Behaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let active_clients = Arc::new(Mutex::new(HashSet::new()));

        let active = active_clients.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let behaviour = behaviour.clone();
                let active = active.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, behaviour, active).await;
                });
            }
        });

        Self {
            port,
            active_clients,
            handle,
        }
    }

    pub fn accepting(accounts: &[&str]) -> Behaviour {
        Behaviour::Accept {
            accounts: accounts.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn active_sessions(&self) -> usize {
        self.active_clients.lock().unwrap().len()
    }

    /// Polls until the gateway has seen every session close.
    pub async fn wait_until_idle(&self, within: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        while tokio::time::Instant::now() < deadline {
            if self.active_sessions() == 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.active_sessions() == 0
    }
}

impl Drop for MockGateway {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn read_fields(stream: &mut TcpStream) -> std::io::Result<Option<Vec<String>>> {
    Ok(wire::read_frame(stream)
        .await?
        .map(|payload| wire::decode_fields(&payload)))
}

async fn send(stream: &mut TcpStream, fields: &[&str]) -> std::io::Result<()> {
    stream.write_all(&wire::encode_fields(fields)).await
}

async fn drain(stream: &mut TcpStream) {
    let mut buf = [0u8; 256];
    while let Ok(n) = stream.read(&mut buf).await {
        if n == 0 {
            break;
        }
    }
}

async fn serve(
    mut stream: TcpStream,
    behaviour: Behaviour,
    active: Arc<Mutex<HashSet<i32>>>,
) -> std::io::Result<()> {
    match behaviour {
        Behaviour::CloseImmediately => return Ok(()),
        Behaviour::Silent => {
            drain(&mut stream).await;
            return Ok(());
        }
        _ => {}
    }

    let mut prefix = [0u8; 4];
    stream.read_exact(&mut prefix).await?;
    assert_eq!(&prefix, wire::API_PREFIX);
    let _versions = wire::read_frame(&mut stream).await?;
    send(&mut stream, &["176", "20261016 09:30:00 EST"]).await?;

    let start = match read_fields(&mut stream).await? {
        Some(fields) => fields,
        None => return Ok(()),
    };
    assert_eq!(start[0], wire::MSG_START_API.to_string());
    let client_id: i32 = start[2].parse().unwrap();

    match behaviour {
        Behaviour::Reject { code, message } => {
            send(&mut stream, &["4", "2", "-1", &code.to_string(), &message, ""]).await?;
            return Ok(());
        }
        Behaviour::Accept { accounts } => {
            let registered = active.lock().unwrap().insert(client_id);
            if !registered {
                let code = wire::CODE_CLIENT_ID_IN_USE.to_string();
                let message = concat!(
                    "Unable to connect as the client id is already in use. ",
                    "Retry with a unique client id."
                );
                send(&mut stream, &["4", "2", "-1", &code, message, ""]).await?;
                return Ok(());
            }

            let outcome = async {
                let notice = "Market data farm connection is OK:usfarm";
                send(&mut stream, &["4", "2", "-1", "2104", notice, ""]).await?;
                send(&mut stream, &["15", "1", &accounts.join(",")]).await?;
                send(&mut stream, &["9", "1", "1"]).await?;
                drain(&mut stream).await;
                Ok::<(), std::io::Error>(())
            }
            .await;

            active.lock().unwrap().remove(&client_id);
            outcome
        }
        Behaviour::Silent | Behaviour::CloseImmediately => Ok(()),
    }
}
