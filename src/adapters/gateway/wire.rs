//! Framing for the gateway API socket.
//!
//! Every message is a 4-byte big-endian length followed by the payload. Payload fields
//! are NUL-terminated ASCII strings. Only the messages needed to open and verify a
//! session are understood here.

use crate::utils::error::{CheckError, Result};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const API_PREFIX: &[u8] = b"API\0";
pub const MIN_CLIENT_VERSION: i32 = 100;
pub const MAX_CLIENT_VERSION: i32 = 187;
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub const MSG_ERROR: i32 = 4;
pub const MSG_NEXT_VALID_ID: i32 = 9;
pub const MSG_MANAGED_ACCOUNTS: i32 = 15;
pub const MSG_START_API: i32 = 71;

/// Error code the gateway sends when the client id is already taken.
pub const CODE_CLIENT_ID_IN_USE: i32 = 326;

pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

pub fn encode_fields<S: AsRef<str>>(fields: &[S]) -> Vec<u8> {
    let mut payload = Vec::new();
    for field in fields {
        payload.extend_from_slice(field.as_ref().as_bytes());
        payload.push(0);
    }
    encode_frame(&payload)
}

/// `API\0` followed by the supported version range.
pub fn greeting() -> Vec<u8> {
    let versions = format!("v{}..{}", MIN_CLIENT_VERSION, MAX_CLIENT_VERSION);
    let mut bytes = API_PREFIX.to_vec();
    bytes.extend_from_slice(&encode_frame(versions.as_bytes()));
    bytes
}

pub fn start_api(client_id: i32) -> Vec<u8> {
    encode_fields(&[
        MSG_START_API.to_string(),
        "2".to_string(),
        client_id.to_string(),
        String::new(),
    ])
}

pub fn decode_fields(payload: &[u8]) -> Vec<String> {
    let body = payload.strip_suffix(&[0]).unwrap_or(payload);
    if body.is_empty() {
        return Vec::new();
    }
    body.split(|b| *b == 0)
        .map(|f| String::from_utf8_lossy(f).into_owned())
        .collect()
}

/// Reads one frame. `Ok(None)` means the peer closed the socket.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    };

    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {} bytes exceeds limit of {}", len, MAX_FRAME_LEN),
        ));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

pub async fn write_all<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    writer.write_all(bytes).await?;
    writer.flush().await
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingMessage {
    ManagedAccounts(Vec<String>),
    NextValidId(i64),
    Error {
        req_id: i64,
        code: i32,
        message: String,
    },
    Other(i32),
}

fn field<'a>(fields: &'a [String], index: usize, what: &str) -> Result<&'a str> {
    fields
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| malformed(format!("missing {} field", what)))
}

fn parse_num<T: std::str::FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| malformed(format!("invalid {} '{}'", what, value)))
}

fn malformed(message: String) -> CheckError {
    CheckError::HandshakeRejected {
        code: None,
        message: format!("malformed gateway message: {}", message),
    }
}

pub fn parse_message(fields: &[String]) -> Result<IncomingMessage> {
    let msg_id: i32 = parse_num(field(fields, 0, "message id")?, "message id")?;

    match msg_id {
        MSG_MANAGED_ACCOUNTS => {
            let accounts = field(fields, 2, "account list")?
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
            Ok(IncomingMessage::ManagedAccounts(accounts))
        }
        MSG_NEXT_VALID_ID => Ok(IncomingMessage::NextValidId(parse_num(
            field(fields, 2, "order id")?,
            "order id",
        )?)),
        MSG_ERROR => Ok(IncomingMessage::Error {
            req_id: parse_num(field(fields, 2, "request id")?, "request id")?,
            code: parse_num(field(fields, 3, "error code")?, "error code")?,
            message: field(fields, 4, "error message")?.to_string(),
        }),
        other => Ok(IncomingMessage::Other(other)),
    }
}

/// Farm-status notices (21xx) that arrive during a healthy login.
pub fn is_informational(code: i32) -> bool {
    (2100..=2169).contains(&code)
}
