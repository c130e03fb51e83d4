//! Connection handshake: a length-prefixed JSON record naming the rank and
//! channel of a freshly opened connection.
use std::io::{Read, Write};

use portal_base::{Error, Rank, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on the size of a handshake record.
const MAX_HELLO_SIZE: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ChannelKind {
    Sync,
    Portal,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Hello {
    pub rank: Rank,
    pub channel: ChannelKind,
}

pub(crate) fn send_hello<W: Write>(stream: &mut W, hello: &Hello) -> Result<()> {
    let buf = serde_json::to_vec(hello).map_err(|err| Error::Handshake(err.to_string()))?;
    stream
        .write_all(&(buf.len() as u32).to_le_bytes())
        .map_err(Error::Setup)?;
    stream.write_all(&buf).map_err(Error::Setup)?;
    stream.flush().map_err(Error::Setup)
}

pub(crate) fn recv_hello<R: Read>(stream: &mut R) -> Result<Hello> {
    let mut len = [0u8; 4];
    stream
        .read_exact(&mut len)
        .map_err(|err| Error::Handshake(format!("failed to read handshake length: {}", err)))?;
    let len = u32::from_le_bytes(len) as usize;
    if len > MAX_HELLO_SIZE {
        return Err(Error::Handshake(format!("handshake of {} bytes", len)));
    }
    let mut buf = vec![0; len];
    stream
        .read_exact(&mut buf)
        .map_err(|err| Error::Handshake(format!("failed to read handshake: {}", err)))?;
    serde_json::from_slice(&buf).map_err(|err| Error::Handshake(err.to_string()))
}
