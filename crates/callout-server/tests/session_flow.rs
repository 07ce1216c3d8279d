//! Integration tests for the full session: admission, deal, chat, and
//! resolution over real TCP connections.

use std::time::Duration;

use callout_protocol::{Codec, Envelope, JsonCodec, Role, SERVER_SENDER};
use callout_server::{GamePhase, GameServer, SessionHandle};
use callout_transport::{FrameReader, FrameWriter, TcpConnection};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

// =========================================================================
// Helpers
// =========================================================================

struct TestClient {
    reader: FrameReader,
    writer: FrameWriter,
    codec: JsonCodec,
}

impl TestClient {
    async fn connect(addr: &str) -> Self {
        let conn = TcpConnection::connect(addr).await.expect("connect");
        let (reader, writer) = conn.into_split();
        Self {
            reader,
            writer,
            codec: JsonCodec,
        }
    }

    /// Connects and sends the admission envelope.
    async fn join(addr: &str, name: &str) -> Self {
        let mut client = Self::connect(addr).await;
        client
            .send(&Envelope::PlayerName { name: name.into() })
            .await;
        client
    }

    async fn send(&mut self, envelope: &Envelope) {
        let payload = self.codec.encode(envelope).expect("encode");
        self.writer.send(&payload).await.expect("send");
    }

    async fn send_raw(&mut self, payload: &[u8]) {
        self.writer.send(payload).await.expect("send raw");
    }

    async fn recv(&mut self) -> Envelope {
        let payload = tokio::time::timeout(RECV_TIMEOUT, self.reader.recv())
            .await
            .expect("timed out waiting for a message")
            .expect("recv failed")
            .expect("connection closed unexpectedly");
        self.codec.decode(&payload).expect("decode")
    }

    /// Expects a server-originated chat line and returns its message.
    async fn recv_server_line(&mut self) -> String {
        match self.recv().await {
            Envelope::ServerChat { message, sender } => {
                assert_eq!(sender, SERVER_SENDER);
                message
            }
            other => panic!("expected a server chat line, got {other:?}"),
        }
    }

    /// `true` if the server has closed this connection.
    async fn closed(&mut self) -> bool {
        match tokio::time::timeout(RECV_TIMEOUT, self.reader.recv())
            .await
            .expect("timed out waiting for close")
        {
            Ok(None) | Err(_) => true,
            Ok(Some(_)) => false,
        }
    }
}

struct Player {
    name: &'static str,
    role: Role,
    client: TestClient,
}

/// Starts a server on a random port; returns its address and session handle.
async fn start_server() -> (String, SessionHandle) {
    let server = GameServer::builder()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("local addr").to_string();
    let session = server.session();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    (addr, session)
}

/// Admits Alice, Bob, and Carol and collects their role reveals.
async fn start_session() -> (String, SessionHandle, Vec<Player>) {
    let (addr, session) = start_server().await;

    let mut joined = Vec::new();
    for name in ["Alice", "Bob", "Carol"] {
        joined.push((name, TestClient::join(&addr, name).await));
    }

    let mut players = Vec::new();
    for (name, mut client) in joined {
        let role = match client.recv().await {
            Envelope::RoleReveal { role } => role,
            other => panic!("{name} expected RoleReveal first, got {other:?}"),
        };
        players.push(Player { name, role, client });
    }
    (addr, session, players)
}

fn idx(players: &[Player], role: Role) -> usize {
    players
        .iter()
        .position(|p| p.role == role)
        .expect("every role is dealt")
}

// =========================================================================
// Admission and the deal
// =========================================================================

#[tokio::test]
async fn test_three_players_get_one_role_each_before_any_traffic() {
    let (_addr, session, players) = start_session().await;

    let mut roles: Vec<Role> = players.iter().map(|p| p.role).collect();
    roles.sort_by_key(|r| r.to_string());
    let mut expected = Role::ALL.to_vec();
    expected.sort_by_key(|r| r.to_string());
    assert_eq!(roles, expected, "one of each role, no repeats");

    assert_eq!(session.phase(), GamePhase::Active);
}

#[tokio::test]
async fn test_server_can_identify_the_target_holder() {
    let (_addr, session, players) = start_session().await;

    let holder = session.holder_of(Role::Target).await.expect("dealt");
    let expected = players[idx(&players, Role::Target)].name;
    assert_eq!(holder, expected);
}

#[tokio::test]
async fn test_fourth_connection_is_rejected_without_disturbing_the_three() {
    let (addr, _session, mut players) = start_session().await;

    let mut dave = TestClient::join(&addr, "Dave").await;
    let notice = dave.recv_server_line().await;
    assert!(notice.contains("full"), "notice was: {notice}");
    assert!(dave.closed().await, "rejected connection must be closed");

    // The admitted three are untouched: chat still flows.
    players[0]
        .client
        .send(&Envelope::PlayerChat {
            message: "still here".into(),
        })
        .await;
    match players[1].client.recv().await {
        Envelope::ServerChat { message, sender } => {
            assert_eq!(message, "still here");
            assert_eq!(sender, players[0].name);
        }
        other => panic!("expected relayed chat, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wrong_first_envelope_drops_the_connection() {
    let (addr, _session) = start_server().await;

    let mut client = TestClient::connect(&addr).await;
    client
        .send(&Envelope::PlayerChat {
            message: "hi before naming myself".into(),
        })
        .await;

    let notice = client.recv_server_line().await;
    assert!(notice.contains("name"), "notice was: {notice}");
    assert!(client.closed().await);
}

#[tokio::test]
async fn test_empty_name_drops_the_connection() {
    let (addr, _session) = start_server().await;

    let mut client = TestClient::join(&addr, "   ").await;
    let _notice = client.recv_server_line().await;
    assert!(client.closed().await);
}

// =========================================================================
// Chat routing
// =========================================================================

#[tokio::test]
async fn test_chat_reaches_the_other_two_but_never_echoes() {
    let (_addr, _session, mut players) = start_session().await;

    players[0]
        .client
        .send(&Envelope::PlayerChat {
            message: "I swear I'm the Target".into(),
        })
        .await;

    for i in [1, 2] {
        match players[i].client.recv().await {
            Envelope::ServerChat { message, sender } => {
                assert_eq!(message, "I swear I'm the Target");
                assert_eq!(sender, "Alice");
            }
            other => panic!("expected relayed chat, got {other:?}"),
        }
    }

    // Alice must not hear her own line: the next thing she receives is
    // Bob's reply, not an echo.
    players[1]
        .client
        .send(&Envelope::PlayerChat {
            message: "sure you are".into(),
        })
        .await;
    match players[0].client.recv().await {
        Envelope::ServerChat { message, sender } => {
            assert_eq!(sender, "Bob");
            assert_eq!(message, "sure you are");
        }
        other => panic!("expected Bob's reply, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_envelope_drops_only_that_connection() {
    let (_addr, _session, mut players) = start_session().await;

    players[0].client.send_raw(b"not json at all").await;
    let _notice = players[0].client.recv_server_line().await;
    assert!(players[0].client.closed().await);

    // The other two keep playing.
    players[1]
        .client
        .send(&Envelope::PlayerChat {
            message: "did Alice just leave?".into(),
        })
        .await;
    match players[2].client.recv().await {
        Envelope::ServerChat { sender, .. } => assert_eq!(sender, "Bob"),
        other => panic!("expected relayed chat, got {other:?}"),
    }
}

// =========================================================================
// Decision resolution
// =========================================================================

#[tokio::test]
async fn test_correct_accusation_is_a_shared_win_for_everyone_to_hear() {
    let (_addr, session, mut players) = start_session().await;
    let accuser = idx(&players, Role::Privileged);
    let target_name = players[idx(&players, Role::Target)].name;

    players[accuser]
        .client
        .send(&Envelope::PlayerDecision {
            target_name: target_name.into(),
        })
        .await;

    for player in players.iter_mut() {
        let announcement = player.client.recv_server_line().await;
        assert!(
            announcement.contains(target_name),
            "announcement must name the accused, was: {announcement}"
        );
        let outcome = player.client.recv_server_line().await;
        assert!(
            outcome.contains("Privileged and the Target win"),
            "outcome was: {outcome}"
        );
        assert!(player.client.closed().await, "session over, sockets close");
    }

    assert_eq!(session.phase(), GamePhase::Closed);
}

#[tokio::test]
async fn test_wrong_accusation_hands_the_win_to_neutral() {
    let (_addr, session, mut players) = start_session().await;
    let accuser = idx(&players, Role::Privileged);
    let neutral_name = players[idx(&players, Role::Neutral)].name;

    players[accuser]
        .client
        .send(&Envelope::PlayerDecision {
            target_name: neutral_name.into(),
        })
        .await;

    for player in players.iter_mut() {
        let _announcement = player.client.recv_server_line().await;
        let outcome = player.client.recv_server_line().await;
        assert!(outcome.contains("Neutral wins"), "outcome was: {outcome}");
    }

    assert_eq!(session.phase(), GamePhase::Closed);
}

#[tokio::test]
async fn test_non_privileged_accusation_is_rejected_and_play_continues() {
    let (_addr, session, mut players) = start_session().await;
    let bystander = idx(&players, Role::Neutral);
    let privileged_name = players[idx(&players, Role::Privileged)].name;

    players[bystander]
        .client
        .send(&Envelope::PlayerDecision {
            target_name: privileged_name.into(),
        })
        .await;

    // Only the offender hears about it.
    let notice = players[bystander].client.recv_server_line().await;
    assert!(notice.contains("Privileged"), "notice was: {notice}");
    assert_eq!(session.phase(), GamePhase::Active, "session continues");

    // And their connection is still usable for chat.
    players[bystander]
        .client
        .send(&Envelope::PlayerChat {
            message: "worth a try".into(),
        })
        .await;
    let other = if bystander == 0 { 1 } else { 0 };
    match players[other].client.recv().await {
        Envelope::ServerChat { message, .. } => assert_eq!(message, "worth a try"),
        other => panic!("expected relayed chat, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_target_is_rejected_and_play_continues() {
    let (_addr, session, mut players) = start_session().await;
    let accuser = idx(&players, Role::Privileged);

    players[accuser]
        .client
        .send(&Envelope::PlayerDecision {
            target_name: "Mallory".into(),
        })
        .await;

    let notice = players[accuser].client.recv_server_line().await;
    assert!(notice.contains("Mallory"), "notice was: {notice}");
    assert_eq!(session.phase(), GamePhase::Active);
}

#[tokio::test]
async fn test_self_accusation_is_rejected() {
    let (_addr, session, mut players) = start_session().await;
    let accuser = idx(&players, Role::Privileged);
    let own_name = players[accuser].name;

    players[accuser]
        .client
        .send(&Envelope::PlayerDecision {
            target_name: own_name.into(),
        })
        .await;

    let notice = players[accuser].client.recv_server_line().await;
    assert!(notice.contains(own_name), "notice was: {notice}");
    assert_eq!(session.phase(), GamePhase::Active);
}

#[tokio::test]
async fn test_connection_after_resolution_is_rejected() {
    let (addr, _session, mut players) = start_session().await;
    let accuser = idx(&players, Role::Privileged);
    let target_name = players[idx(&players, Role::Target)].name;

    players[accuser]
        .client
        .send(&Envelope::PlayerDecision {
            target_name: target_name.into(),
        })
        .await;
    // Drain the resolution for one player so we know the game is over.
    let _ = players[accuser].client.recv_server_line().await;
    let _ = players[accuser].client.recv_server_line().await;

    let mut eve = TestClient::join(&addr, "Eve").await;
    let notice = eve.recv_server_line().await;
    assert!(notice.contains("full"), "notice was: {notice}");
    assert!(eve.closed().await);
}
