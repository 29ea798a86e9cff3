use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_test::assert_ok;

use chaos_tetris::core::GameState;
use chaos_tetris::room::protocol::PlayerStatePayload;
use chaos_tetris::room::{run_server, ServerConfig, TargetingKind};

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    id: String,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect failed");
        let (read_half, writer) = stream.into_split();
        let mut client = Self {
            lines: BufReader::new(read_half).lines(),
            writer,
            id: String::new(),
        };
        let welcome = client.expect("session:welcome").await;
        client.id = welcome["playerId"].as_str().unwrap().to_string();
        client
    }

    async fn send(&mut self, line: &str) {
        assert_ok!(self.writer.write_all(line.as_bytes()).await);
        assert_ok!(self.writer.write_all(b"\n").await);
        assert_ok!(self.writer.flush().await);
    }

    async fn next(&mut self) -> serde_json::Value {
        let line = tokio::time::timeout(Duration::from_secs(2), self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap()
            .expect("connection closed");
        serde_json::from_str(&line).unwrap()
    }

    /// Skip lines until one of type `ty` arrives
    async fn expect(&mut self, ty: &str) -> serde_json::Value {
        loop {
            let v = self.next().await;
            if v["type"] == ty {
                return v;
            }
        }
    }
}

async fn start_server() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_members: 4,
        targeting: TargetingKind::Random,
    };
    let (ready_tx, ready_rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let _ = run_server(config, Some(ready_tx)).await;
    });
    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("server did not signal ready")
        .expect("ready channel dropped");
    (addr, handle)
}

async fn join(client: &mut Client, room: &str, name: &str) {
    client
        .send(&format!(r#"{{"type":"room:join","roomId":"{}","playerName":"{}"}}"#, room, name))
        .await;
}

#[tokio::test]
async fn two_players_full_match() {
    let (addr, server) = start_server().await;
    let mut host = Client::connect(addr).await;
    let mut guest = Client::connect(addr).await;

    join(&mut host, "arena", "host").await;
    let state = host.expect("room:state").await;
    assert_eq!(state["hostId"], host.id.as_str());

    join(&mut guest, "arena", "guest").await;
    let joined = host.expect("player:joined").await;
    assert_eq!(joined["name"], "guest");
    let state = guest.expect("room:state").await;
    assert_eq!(state["players"].as_array().unwrap().len(), 2);

    // Only the host may start
    guest.send(r#"{"type":"game:start-request"}"#).await;
    let err = guest.expect("error").await;
    assert_eq!(err["code"], "not_host");

    host.send(r#"{"type":"game:start-request"}"#).await;
    let seed_a = host.expect("game:start").await["seed"].as_i64().unwrap();
    let seed_b = guest.expect("game:start").await["seed"].as_i64().unwrap();
    assert_eq!(seed_a, seed_b);

    // Attacks go to the opponent only
    host.send(r#"{"type":"game:attack","lines":2}"#).await;
    let attacked = guest.expect("game:attacked").await;
    assert_eq!(attacked["lines"], 2);
    assert_eq!(attacked["from"], host.id.as_str());

    // State sync is relayed with the sender's id
    let mut board = GameState::new(seed_b);
    board.start();
    let payload = PlayerStatePayload::from(&board.snapshot());
    let line = serde_json::json!({ "type": "game:state", "state": payload }).to_string();
    guest.send(&line).await;
    let relayed = host.expect("player:state").await;
    assert_eq!(relayed["playerId"], guest.id.as_str());
    assert_eq!(relayed["state"]["board"].as_array().unwrap().len(), 20);

    guest.send(r#"{"type":"game:over"}"#).await;
    let dead = host.expect("player:dead").await;
    assert_eq!(dead["playerId"], guest.id.as_str());
    let end = host.expect("game:end").await;
    assert_eq!(end["winnerId"], host.id.as_str());
    let state = host.expect("room:state").await;
    assert_eq!(state["isRunning"], false);

    server.abort();
}

#[tokio::test]
async fn malformed_and_unknown_lines_keep_connection() {
    let (addr, server) = start_server().await;
    let mut client = Client::connect(addr).await;

    client.send("{not json").await;
    let err = client.expect("error").await;
    assert_eq!(err["code"], "invalid_message");

    client.send(r#"{"type":"chat:say","text":"hi"}"#).await;
    let err = client.expect("error").await;
    assert_eq!(err["code"], "unknown_type");

    client.send(r#"{"type":"game:drop"}"#).await;
    let err = client.expect("error").await;
    assert_eq!(err["code"], "not_in_room");

    // Still usable
    join(&mut client, "solo", "me").await;
    let state = client.expect("room:state").await;
    assert_eq!(state["id"], "solo");

    server.abort();
}

#[tokio::test]
async fn disconnect_counts_as_elimination_and_migrates_host() {
    let (addr, server) = start_server().await;
    let mut host = Client::connect(addr).await;
    let mut guest = Client::connect(addr).await;

    join(&mut host, "r", "host").await;
    host.expect("room:state").await;
    join(&mut guest, "r", "guest").await;
    guest.expect("room:state").await;

    host.send(r#"{"type":"game:start-request"}"#).await;
    guest.expect("game:start").await;

    let host_id = host.id.clone();
    drop(host);

    let dead = guest.expect("player:dead").await;
    assert_eq!(dead["playerId"], host_id.as_str());
    let end = guest.expect("game:end").await;
    assert_eq!(end["winnerId"], guest.id.as_str());
    let left = guest.expect("player:left").await;
    assert_eq!(left["id"], host_id.as_str());
    let state = guest.expect("room:state").await;
    assert_eq!(state["hostId"], guest.id.as_str());

    server.abort();
}

#[tokio::test]
async fn skill_cast_is_broadcast_to_the_room() {
    let (addr, server) = start_server().await;
    let mut a = Client::connect(addr).await;
    let mut b = Client::connect(addr).await;

    join(&mut a, "s", "a").await;
    a.expect("room:state").await;
    join(&mut b, "s", "b").await;
    b.expect("room:state").await;

    let cast = format!(
        r#"{{"type":"skill:cast","skillId":"reverse_h","targetPlayerId":"{}"}}"#,
        b.id
    );
    a.send(&cast).await;
    for client in [&mut a, &mut b] {
        let applied = client.expect("skill:applied").await;
        assert_eq!(applied["skillId"], "reverse_h");
    }

    a.send(r#"{"type":"skill:cast","skillId":"meteor","targetPlayerId":"x"}"#).await;
    let err = a.expect("error").await;
    assert_eq!(err["code"], "invalid_message");

    server.abort();
}

#[test]
fn config_reads_environment() {
    std::env::set_var("CHAOS_TETRIS_PORT", "9911");
    std::env::set_var("CHAOS_TETRIS_TARGETING", "retaliate");
    std::env::set_var("CHAOS_TETRIS_MAX_MEMBERS", "not-a-number");
    let config = ServerConfig::from_env();
    std::env::remove_var("CHAOS_TETRIS_PORT");
    std::env::remove_var("CHAOS_TETRIS_TARGETING");
    std::env::remove_var("CHAOS_TETRIS_MAX_MEMBERS");

    assert_eq!(config.port, 9911);
    assert_eq!(config.targeting, TargetingKind::Retaliate);
    assert_eq!(config.max_members, ServerConfig::default().max_members);
}
