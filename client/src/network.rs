//! Client side of the scoreboard protocol
//!
//! [`ScoreboardClient`] does one request/reply exchange at a time over UDP.
//! [`spawn_worker`] runs it on a background runtime so the frame loop can
//! hand off requests and pick up results without ever waiting on the network.

use log::{debug, error, info, warn};
use shared::{
    decode, encode, Comment, Reply, Request, RequestEnvelope, Response, ResponseEnvelope,
};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};

const RECV_BUFFER: usize = 65_507;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("network I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode or decode message: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("could not resolve server address {0}")]
    Resolve(String),
    #[error("server did not answer within {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Server(String),
    #[error("unexpected reply from server")]
    UnexpectedReply,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitData {
    pub display_name: String,
    pub high_score: u64,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitData {
    pub high_score: u64,
    pub new_best: bool,
    pub comment: Option<Comment>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: String,
    pub context: Option<String>,
    pub user: Option<String>,
    pub timeout: Duration,
}

pub struct ScoreboardClient {
    socket: UdpSocket,
    server_addr: SocketAddr,
    context: Option<String>,
    user: Option<String>,
    timeout: Duration,
    next_seq: u32,
}

impl ScoreboardClient {
    pub async fn connect(config: &ClientConfig) -> Result<Self, NetworkError> {
        let server_addr = lookup_host(config.server.as_str())
            .await?
            .next()
            .ok_or_else(|| NetworkError::Resolve(config.server.clone()))?;

        let local = if server_addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(server_addr).await?;
        info!("Scoreboard client bound to {}", socket.local_addr()?);

        Ok(Self {
            socket,
            server_addr,
            context: config.context.clone(),
            user: config.user.clone(),
            timeout: config.timeout,
            next_seq: 1,
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub async fn init(&mut self) -> Result<InitData, NetworkError> {
        match self.request(Request::Init).await? {
            Response::InitOk {
                display_name,
                high_score,
                comments,
            } => Ok(InitData {
                display_name,
                high_score,
                comments,
            }),
            _ => Err(NetworkError::UnexpectedReply),
        }
    }

    pub async fn submit(
        &mut self,
        score: u32,
        message: Option<String>,
    ) -> Result<SubmitData, NetworkError> {
        let request = Request::Submit {
            score: f64::from(score),
            message,
        };
        match self.request(request).await? {
            Response::SubmitOk {
                high_score,
                new_best,
                comment,
            } => Ok(SubmitData {
                high_score,
                new_best,
                comment,
            }),
            _ => Err(NetworkError::UnexpectedReply),
        }
    }

    /// Sends one request and waits for the reply carrying the same sequence
    /// number. Late replies to earlier, timed-out requests are skipped.
    async fn request(&mut self, request: Request) -> Result<Response, NetworkError> {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);

        let envelope = RequestEnvelope {
            seq,
            context: self.context.clone(),
            user: self.user.clone(),
            request,
        };
        self.socket.send(&encode(&envelope)?).await?;

        let deadline = Instant::now() + self.timeout;
        let mut buffer = vec![0u8; RECV_BUFFER];

        loop {
            let len = match timeout_at(deadline, self.socket.recv(&mut buffer)).await {
                Ok(result) => result?,
                Err(_) => return Err(NetworkError::Timeout(self.timeout)),
            };

            let reply: ResponseEnvelope = match decode(&buffer[..len]) {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Ignoring undecodable reply: {}", e);
                    continue;
                }
            };

            if reply.seq != seq {
                debug!("Ignoring stale reply {} while waiting for {}", reply.seq, seq);
                continue;
            }

            return match reply.reply {
                Reply::Ok(response) => Ok(response),
                Reply::Error(e) => Err(NetworkError::Server(e.message)),
            };
        }
    }
}

/// Work handed from the frame loop to the network worker
#[derive(Debug, Clone, PartialEq)]
pub enum NetCommand {
    Init,
    Submit { score: u32, message: Option<String> },
    Shutdown,
}

/// Results handed back to the frame loop
#[derive(Debug, Clone, PartialEq)]
pub enum NetEvent {
    InitLoaded(InitData),
    InitFailed(String),
    Submitted(SubmitData),
    SubmitFailed(String),
}

/// Frame-loop end of the worker channels. Never blocks.
pub struct NetworkHandle {
    commands: mpsc::UnboundedSender<NetCommand>,
    events: mpsc::UnboundedReceiver<NetEvent>,
}

impl NetworkHandle {
    pub fn new(
        commands: mpsc::UnboundedSender<NetCommand>,
        events: mpsc::UnboundedReceiver<NetEvent>,
    ) -> Self {
        Self { commands, events }
    }

    /// Queues a command. Returns false once the worker is gone.
    pub fn send(&self, command: NetCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn try_next(&mut self) -> Option<NetEvent> {
        self.events.try_recv().ok()
    }
}

impl Drop for NetworkHandle {
    fn drop(&mut self) {
        let _ = self.commands.send(NetCommand::Shutdown);
    }
}

/// Starts the network worker on its own thread with a single-threaded runtime.
pub fn spawn_worker(config: ClientConfig) -> std::io::Result<NetworkHandle> {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    std::thread::Builder::new()
        .name("scoreboard-net".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!("Failed to start network runtime: {}", e);
                    return;
                }
            };
            runtime.block_on(run_worker(config, command_rx, event_tx));
        })?;

    Ok(NetworkHandle::new(command_tx, event_rx))
}

/// Processes commands in order until told to stop or the handle is dropped.
pub async fn run_worker(
    config: ClientConfig,
    mut commands: mpsc::UnboundedReceiver<NetCommand>,
    events: mpsc::UnboundedSender<NetEvent>,
) {
    let mut client = match ScoreboardClient::connect(&config).await {
        Ok(client) => {
            info!("Scoreboard server at {}", client.server_addr());
            Ok(client)
        }
        Err(e) => {
            error!("Scoreboard unavailable: {}", e);
            Err(e.to_string())
        }
    };

    while let Some(command) = commands.recv().await {
        let event = match (command, client.as_mut()) {
            (NetCommand::Shutdown, _) => break,
            (NetCommand::Init, Ok(client)) => match client.init().await {
                Ok(data) => NetEvent::InitLoaded(data),
                Err(e) => NetEvent::InitFailed(e.to_string()),
            },
            (NetCommand::Submit { score, message }, Ok(client)) => {
                match client.submit(score, message).await {
                    Ok(data) => NetEvent::Submitted(data),
                    Err(e) => NetEvent::SubmitFailed(e.to_string()),
                }
            }
            (NetCommand::Init, Err(reason)) => NetEvent::InitFailed(reason.clone()),
            (NetCommand::Submit { .. }, Err(reason)) => NetEvent::SubmitFailed(reason.clone()),
        };

        if events.send(event).is_err() {
            break;
        }
    }

    debug!("Network worker stopped");
}
