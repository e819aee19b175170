//! Server network layer handling UDP request/reply traffic

use crate::error::ServiceError;
use crate::identity::Caller;
use crate::scoreboard::ScoreboardService;
use crate::store::KeyValueStore;
use log::{error, info, warn};
use shared::{decode, encode, Reply, RequestEnvelope, ResponseEnvelope};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;

/// Largest payload a single UDP datagram can carry.
pub const MAX_DATAGRAM: usize = 65_507;

/// Decodes one request datagram, runs it and builds the reply.
///
/// The sequence number is recovered even from requests that fail validation
/// so the client can match the error to the call that caused it.
pub fn handle_datagram<S: KeyValueStore>(
    service: &ScoreboardService<S>,
    bytes: &[u8],
    addr: SocketAddr,
) -> ResponseEnvelope {
    let value: serde_json::Value = match decode(bytes) {
        Ok(value) => value,
        Err(e) => return malformed(0, addr, e),
    };

    let seq = value
        .get("seq")
        .and_then(serde_json::Value::as_u64)
        .and_then(|seq| u32::try_from(seq).ok())
        .unwrap_or(0);

    let envelope: RequestEnvelope = match serde_json::from_value(value) {
        Ok(envelope) => envelope,
        Err(e) => return malformed(seq, addr, e),
    };

    let caller = Caller {
        addr,
        claimed_name: envelope.user.clone(),
    };

    ResponseEnvelope {
        seq,
        reply: service.respond(&envelope, &caller),
    }
}

fn malformed(seq: u32, addr: SocketAddr, e: serde_json::Error) -> ResponseEnvelope {
    let error = ServiceError::MalformedRequest(e.to_string());
    warn!("Dropping request {} from {}: {}", seq, addr, error);
    ResponseEnvelope {
        seq,
        reply: Reply::error(error.public_message()),
    }
}

/// Scoreboard server answering each datagram on its own task
pub struct Server<S> {
    socket: Arc<UdpSocket>,
    service: Arc<ScoreboardService<S>>,
}

impl<S: KeyValueStore + 'static> Server<S> {
    pub async fn bind(
        addr: &str,
        service: ScoreboardService<S>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Scoreboard listening on {}", socket.local_addr()?);

        Ok(Server {
            socket,
            service: Arc::new(service),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receives requests until the socket fails for good.
    ///
    /// Store access is synchronous and may hit the disk, so each request is
    /// evaluated on the blocking pool; requests for the same context are not
    /// serialised here, the store's compare-and-set keeps them consistent.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let mut buffer = vec![0u8; MAX_DATAGRAM];

        loop {
            match self.socket.recv_from(&mut buffer).await {
                Ok((len, addr)) => {
                    let bytes = buffer[..len].to_vec();
                    let socket = Arc::clone(&self.socket);
                    let service = Arc::clone(&self.service);

                    tokio::spawn(async move {
                        let envelope = match tokio::task::spawn_blocking(move || {
                            handle_datagram(&service, &bytes, addr)
                        })
                        .await
                        {
                            Ok(envelope) => envelope,
                            Err(e) => {
                                error!("Request handler for {} panicked: {}", addr, e);
                                return;
                            }
                        };

                        if let Err(e) = Self::send_reply(&socket, &envelope, addr).await {
                            error!("Failed to send reply to {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error receiving packet: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    async fn send_reply(
        socket: &UdpSocket,
        envelope: &ResponseEnvelope,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let data = encode(envelope)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }
}
