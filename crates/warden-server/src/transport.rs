//! TCP transport.
//!
//! Frames are a 4-byte big-endian length prefix followed by one CBOR
//! message body; `LengthDelimitedCodec` handles the prefix on both
//! directions and enforces the shared size cap.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use warden_proto::codec::MAX_FRAME_BYTES;

use crate::error::ServerError;

/// Listening TCP endpoint.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Bind to the given address.
    ///
    /// # Errors
    ///
    /// Returns a transport error if binding fails.
    pub async fn bind(address: &str) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self { listener })
    }

    /// Accept the next inbound connection.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the accept fails.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ServerError> {
        Ok(self.listener.accept().await?)
    }

    /// The local address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport").field("local_addr", &self.listener.local_addr()).finish()
    }
}

/// Wrap a stream in the warden frame codec.
pub fn framed(stream: TcpStream) -> Framed<TcpStream, LengthDelimitedCodec> {
    Framed::new(stream, frame_codec())
}

/// The frame codec shared by server and test clients.
pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .max_frame_length(MAX_FRAME_BYTES)
        .new_codec()
}
