//! TCP front transport with length-prefixed frame units.
//!
//! Wire form of one unit: a `u32` big-endian frame count, then per frame a
//! `u32` big-endian length and the frame bytes. Each accepted connection is
//! assigned a fresh identity for its lifetime; the read loop prepends it to
//! every inbound unit and a writer task drains that connection's outbound
//! queue. When the peer hangs up, the identity is removed from the delivery
//! registry only - a joined entity stays in the world store until an
//! explicit leave event.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, trace};

use muster_protocol::{codec, DomainEvent, DomainNotification, Frames, Identity};

use super::channel::strip_delimiter;
use super::{FrontSender, FrontTransport, InboundQueue, TransportError};

/// Upper bound on a single frame; larger frames poison the connection.
const MAX_FRAME_LEN: usize = 10_000_000;
/// Upper bound on frames per unit.
const MAX_FRAMES: usize = 64;

type Registry = Arc<RwLock<HashMap<Identity, mpsc::Sender<Frames>>>>;

/// Binds the externally reachable listener and starts its accept loop.
///
/// Returns the transport plus the bound address, so callers binding port 0
/// learn the real port.
pub async fn tcp_front(
    addr: SocketAddr,
    capacity: usize,
) -> Result<(FrontTransport, SocketAddr), TransportError> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    info!("front listener bound on {local_addr}");

    let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
    let registry: Registry = Arc::new(RwLock::new(HashMap::new()));

    let accept_registry = registry.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    handle_connection(
                        stream,
                        peer,
                        inbound_tx.clone(),
                        accept_registry.clone(),
                        capacity,
                    )
                    .await;
                }
                Err(err) => {
                    error!("accept failed: {err}");
                    break;
                }
            }
        }
    });

    let transport = FrontTransport {
        receiver: Box::new(InboundQueue::new(inbound_rx)),
        sender: Arc::new(TcpSender { registry }),
    };
    Ok((transport, local_addr))
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    inbound_tx: mpsc::Sender<Frames>,
    registry: Registry,
    capacity: usize,
) {
    let identity = Identity::new();
    debug!(%identity, %peer, "connection accepted");

    let (mut reader, mut writer) = stream.into_split();
    let (out_tx, mut out_rx) = mpsc::channel::<Frames>(capacity);
    registry.write().await.insert(identity, out_tx);

    tokio::spawn(async move {
        while let Some(frames) = out_rx.recv().await {
            if let Err(err) = write_unit(&mut writer, &frames).await {
                debug!(%identity, "write failed, closing connection: {err}");
                break;
            }
        }
    });

    tokio::spawn(async move {
        loop {
            match read_unit(&mut reader).await {
                Ok(Some(frames)) => {
                    let mut unit = Vec::with_capacity(frames.len() + 1);
                    unit.push(identity.to_frame());
                    unit.extend(frames);
                    if inbound_tx.send(unit).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    debug!(%identity, "read failed, closing connection: {err}");
                    break;
                }
            }
        }
        // Disconnect deregisters delivery only; the world entity stays.
        registry.write().await.remove(&identity);
        debug!(%identity, "connection closed");
    });
}

struct TcpSender {
    registry: Registry,
}

#[async_trait]
impl FrontSender for TcpSender {
    async fn deliver(&self, mut frames: Frames) {
        if frames.is_empty() {
            trace!("dropping outbound unit with no frames");
            return;
        }
        let identity = match Identity::from_wire(&frames[0]) {
            Ok(identity) => identity,
            Err(err) => {
                trace!("dropping outbound unit with unroutable identity: {err}");
                return;
            }
        };
        frames.remove(0);
        let sender = self.registry.read().await.get(&identity).cloned();
        match sender {
            Some(sender) => {
                if sender.send(frames).await.is_err() {
                    trace!(%identity, "writer gone, dropping unit");
                }
            }
            None => trace!(%identity, "identity not connected, dropping unit"),
        }
    }
}

/// Writes one unit: frame count, then each frame length-prefixed.
pub(crate) async fn write_unit<W: AsyncWrite + Unpin>(
    writer: &mut W,
    frames: &[Bytes],
) -> io::Result<()> {
    writer.write_all(&(frames.len() as u32).to_be_bytes()).await?;
    for frame in frames {
        writer.write_all(&(frame.len() as u32).to_be_bytes()).await?;
        writer.write_all(frame).await?;
    }
    writer.flush().await
}

/// Reads one unit; `Ok(None)` on a clean close at a unit boundary.
pub(crate) async fn read_unit<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> io::Result<Option<Frames>> {
    let mut count_bytes = [0u8; 4];
    match reader.read_exact(&mut count_bytes).await {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err),
    }
    let count = u32::from_be_bytes(count_bytes) as usize;
    if count > MAX_FRAMES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "too many frames in unit",
        ));
    }

    let mut frames = Vec::with_capacity(count);
    for _ in 0..count {
        let mut len_bytes = [0u8; 4];
        reader.read_exact(&mut len_bytes).await?;
        let len = u32::from_be_bytes(len_bytes) as usize;
        if len > MAX_FRAME_LEN {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "frame too large"));
        }
        let mut frame = vec![0u8; len];
        reader.read_exact(&mut frame).await?;
        frames.push(Bytes::from(frame));
    }
    Ok(Some(frames))
}

/// External client handle over a real socket ("connect+external" role).
pub struct TcpClient {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
}

impl TcpClient {
    /// Connects to a running front listener.
    pub async fn connect(addr: SocketAddr) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self { reader, writer })
    }

    /// Sends raw body frames; the server prepends this connection's
    /// identity on arrival. Exists so tests can send malformed units.
    pub async fn send_raw(&mut self, body: &[Bytes]) -> Result<(), TransportError> {
        write_unit(&mut self.writer, body).await?;
        Ok(())
    }

    /// Sends a well-formed domain event: `[delimiter, hint, payload]`.
    pub async fn send_event(&mut self, event: &DomainEvent) -> Result<(), TransportError> {
        let mut body = vec![Bytes::new()];
        body.extend(codec::encode(&event.to_wire()));
        self.send_raw(&body).await
    }

    /// Next delivered unit, identity already stripped. `None` once the
    /// server closed the connection.
    pub async fn recv_unit(&mut self) -> Result<Option<Frames>, TransportError> {
        Ok(read_unit(&mut self.reader).await?)
    }

    /// Next delivered unit decoded as a domain notification.
    pub async fn recv_notification(
        &mut self,
    ) -> Result<Option<DomainNotification>, TransportError> {
        let Some(unit) = self.recv_unit().await? else {
            return Ok(None);
        };
        let body = strip_delimiter(&unit)?;
        let message = codec::decode(body)
            .map_err(|err| TransportError::Malformed(err.to_string()))?;
        let notification = DomainNotification::from_wire(&message)
            .map_err(|err| TransportError::Malformed(err.to_string()))?;
        Ok(Some(notification))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muster_protocol::Envelope;

    #[tokio::test]
    async fn unit_round_trip_over_a_socket_pair() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });
        let (mut server_side, _) = listener.accept().await.unwrap();
        let mut client_side = client.await.unwrap();

        let frames = vec![
            Bytes::new(),
            Bytes::from_static(&[0x01]),
            Bytes::from_static(b"ada"),
        ];
        write_unit(&mut client_side, &frames).await.unwrap();
        let read = read_unit(&mut server_side).await.unwrap().unwrap();
        assert_eq!(read, frames);

        drop(client_side);
        assert!(read_unit(&mut server_side).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn front_prepends_identity_and_routes_replies() {
        let (mut transport, addr) = tcp_front("127.0.0.1:0".parse().unwrap(), 16)
            .await
            .unwrap();
        let mut client = TcpClient::connect(addr).await.unwrap();

        client
            .send_event(&DomainEvent::Join {
                name: "ada".to_string(),
            })
            .await
            .unwrap();

        let unit = transport.receiver.recv().await.unwrap();
        let envelope = Envelope::from_frames(unit).unwrap();
        let identity = envelope.identity();

        let mut reply = vec![identity.to_frame(), Bytes::new()];
        reply.extend(codec::encode(&DomainNotification::Authenticated.to_wire()));
        transport.sender.deliver(reply).await;

        let notification = client.recv_notification().await.unwrap().unwrap();
        assert_eq!(notification, DomainNotification::Authenticated);
    }
}
