//! Integration tests for the game client and the scoreboard server
//!
//! These tests run a real server on a loopback UDP socket and talk to it
//! through the client library.

use client::network::{
    spawn_worker, ClientConfig, NetCommand, NetEvent, NetworkError, ScoreboardClient,
};
use server::identity::HostIdentity;
use server::network::{Server, MAX_DATAGRAM};
use server::scoreboard::ScoreboardService;
use server::store::MemoryStore;
use shared::{Reply, ResponseEnvelope, MAX_COMMENTS};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::sleep;

async fn start_server() -> SocketAddr {
    let service = ScoreboardService::new(MemoryStore::new(), HostIdentity);
    let server = Server::bind("127.0.0.1:0", service).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

fn config(server: SocketAddr, context: Option<&str>, user: Option<&str>) -> ClientConfig {
    ClientConfig {
        server: server.to_string(),
        context: context.map(str::to_string),
        user: user.map(str::to_string),
        timeout: Duration::from_secs(2),
    }
}

async fn connect(server: SocketAddr, context: &str, user: &str) -> ScoreboardClient {
    ScoreboardClient::connect(&config(server, Some(context), Some(user)))
        .await
        .unwrap()
}

/// SCOREBOARD PROTOCOL TESTS
mod scoreboard_tests {
    use super::*;

    /// A fresh context starts empty and shows the caller's name
    #[tokio::test]
    async fn init_on_empty_context() {
        let server = start_server().await;
        let mut client = connect(server, "post-1", "ada").await;

        let data = client.init().await.unwrap();
        assert_eq!(data.display_name, "ada");
        assert_eq!(data.high_score, 0);
        assert!(data.comments.is_empty());
    }

    /// Submissions are visible to the next init
    #[tokio::test]
    async fn submit_then_init() {
        let server = start_server().await;
        let mut client = connect(server, "post-1", "ada").await;

        let submitted = client.submit(12, Some("  first!  ".to_string())).await.unwrap();
        assert!(submitted.new_best);
        assert_eq!(submitted.high_score, 12);
        let comment = submitted.comment.unwrap();
        assert_eq!(comment.message, "first!");
        assert_eq!(comment.username, "ada");
        assert_eq!(comment.score, 12);

        let mut other = connect(server, "post-1", "grace").await;
        let data = other.init().await.unwrap();
        assert_eq!(data.display_name, "grace");
        assert_eq!(data.high_score, 12);
        assert_eq!(data.comments, vec![comment]);
    }

    /// The stored high score is the maximum ever submitted
    #[tokio::test]
    async fn high_score_only_rises() {
        let server = start_server().await;
        let mut client = connect(server, "post-1", "ada").await;

        client.submit(10, None).await.unwrap();

        let lower = client.submit(5, None).await.unwrap();
        assert!(!lower.new_best);
        assert_eq!(lower.high_score, 10);
        assert_eq!(lower.comment, None);

        let equal = client.submit(10, None).await.unwrap();
        assert!(!equal.new_best);

        let higher = client.submit(15, None).await.unwrap();
        assert!(higher.new_best);
        assert_eq!(higher.high_score, 15);
    }

    /// Only the newest comments are kept, oldest first
    #[tokio::test]
    async fn comment_log_is_capped() {
        let server = start_server().await;
        let mut client = connect(server, "post-1", "ada").await;

        for i in 0..=MAX_COMMENTS {
            client.submit(1, Some(format!("m{}", i))).await.unwrap();
        }

        let data = client.init().await.unwrap();
        assert_eq!(data.comments.len(), MAX_COMMENTS);
        assert_eq!(data.comments[0].message, "m1");
        assert_eq!(
            data.comments.last().unwrap().message,
            format!("m{}", MAX_COMMENTS)
        );
    }

    /// Scoreboards for different contexts never mix
    #[tokio::test]
    async fn contexts_are_isolated() {
        let server = start_server().await;
        let mut first = connect(server, "post-1", "ada").await;
        let mut second = connect(server, "post-2", "ada").await;

        first.submit(30, Some("here".to_string())).await.unwrap();

        let data = second.init().await.unwrap();
        assert_eq!(data.high_score, 0);
        assert!(data.comments.is_empty());
    }

    /// Requests without a context are rejected with a readable reason
    #[tokio::test]
    async fn missing_context_is_rejected() {
        let server = start_server().await;
        let mut client = ScoreboardClient::connect(&config(server, None, Some("ada")))
            .await
            .unwrap();

        match client.init().await {
            Err(NetworkError::Server(message)) => assert_eq!(message, "missing context identifier"),
            other => panic!("Expected server error, got {:?}", other.map(|_| ())),
        }
    }

    /// Anonymous callers still get a display name
    #[tokio::test]
    async fn anonymous_caller() {
        let server = start_server().await;
        let mut client = ScoreboardClient::connect(&config(server, Some("post-1"), None))
            .await
            .unwrap();

        let data = tokio_test::assert_ok!(client.init().await);
        assert_eq!(data.display_name, "anonymous");
    }
}

/// GAME AND SCOREBOARD TESTS
mod game_tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use client::game::{Collision, GameSession, TickOutcome};
    use shared::{Cell, Direction};

    /// Plays a short game to its end and records the result
    #[tokio::test]
    async fn finished_game_is_recorded() {
        let mut session = GameSession::with_layout(
            vec![Cell::new(16, 3), Cell::new(15, 3)],
            Direction::Right,
            Cell::new(17, 3),
            11,
        )
        .unwrap();
        assert!(session.start());

        assert_eq!(session.tick(), TickOutcome::Ate);
        assert_approx_eq!(session.tick_interval_ms(), 720.0);

        let mut outcome = TickOutcome::Moved;
        for _ in 0..5 {
            outcome = session.tick();
            if session.is_over() {
                break;
            }
        }
        assert_eq!(outcome, TickOutcome::Collided(Collision::Wall));

        let score = session.score();
        assert!(score >= 1);

        let server = start_server().await;
        let mut client = connect(server, "post-1", "ada").await;
        let submitted = client.submit(score, Some("gg".to_string())).await.unwrap();
        assert_eq!(submitted.high_score, u64::from(score));
    }

    /// The background worker delivers results the frame loop can poll
    #[tokio::test]
    async fn worker_round_trip() {
        let server = start_server().await;
        let mut handle = spawn_worker(config(server, Some("post-1"), Some("ada"))).unwrap();

        assert!(handle.send(NetCommand::Init));
        assert!(handle.send(NetCommand::Submit {
            score: 4,
            message: Some("from the worker".to_string()),
        }));

        let mut events = Vec::new();
        for _ in 0..200 {
            while let Some(event) = handle.try_next() {
                events.push(event);
            }
            if events.len() == 2 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }

        assert!(matches!(events[0], NetEvent::InitLoaded(_)));
        match &events[1] {
            NetEvent::Submitted(data) => {
                assert_eq!(data.high_score, 4);
                assert_eq!(data.comment.as_ref().unwrap().message, "from the worker");
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }
}

/// STRESS AND ROBUSTNESS TESTS
mod stress_tests {
    use super::*;

    /// Concurrent submissions lose neither the best score nor any comment
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_submissions() {
        let server = start_server().await;

        let mut tasks = Vec::new();
        for i in 1..=8u32 {
            tasks.push(tokio::spawn(async move {
                let mut client = connect(server, "post-1", &format!("player{}", i)).await;
                client.submit(i * 10, Some(format!("run {}", i))).await.unwrap()
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let mut client = connect(server, "post-1", "observer").await;
        let data = client.init().await.unwrap();
        assert_eq!(data.high_score, 80);
        assert_eq!(data.comments.len(), 8);
    }

    /// Garbage datagrams get an error reply and do not stop the server
    #[tokio::test]
    async fn malformed_packet_handling() {
        let server = start_server().await;
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let malformed_packets = vec![
            vec![0xFF; 10],
            b"{\"seq\": 3}".to_vec(),
            b"{\"seq\": 4, \"context\": \"c\", \"request\": {\"type\": \"delete\"}}".to_vec(),
        ];

        let mut buffer = vec![0u8; MAX_DATAGRAM];
        for packet in malformed_packets {
            socket.send_to(&packet, server).await.unwrap();
            let (len, _) = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buffer))
                .await
                .expect("server did not answer")
                .unwrap();
            let envelope: ResponseEnvelope = serde_json::from_slice(&buffer[..len]).unwrap();
            assert!(matches!(envelope.reply, Reply::Error(_)));
        }

        let mut client = connect(server, "post-1", "ada").await;
        assert!(client.init().await.is_ok());
    }
}
