// Test support for end-to-end client tests.
//
// Provides the three stand-ins a `GameClient` needs to run for real
// without the rest of the game:
// - `ScriptedServer` / `ServerPeer`: a real `TcpListener` speaking the
//   wire protocol via `warfront_protocol`, driven step by step from the
//   test body. No server logic — the test script IS the server.
// - `RecordingUi`: a `GameUi` that appends every notification to a list
//   the test can inspect and wait on.
// - `ScriptBoard`: a `BoardModel` with scripted ownership/adjacency and
//   recorded mutations.
//
// Everything the client does in these tests uses the same code paths as
// production; the only test-specific code is the polling helpers
// (`wait_until`, `RecordingUi::wait_for`).

use std::collections::HashSet;
use std::io::{self, BufReader, BufWriter, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use warfront_client::state::Player;
use warfront_client::ui::{BoardModel, GameUi};
use warfront_protocol::message::{ClientMessage, ServerMessage};
use warfront_protocol::{PlayerColor, PlayerId, TerritoryId};

/// Default timeout for blocking wait operations.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Sleep duration between poll attempts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Install the test logger. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Poll `condition` until it returns true or `POLL_TIMEOUT` elapses.
/// Returns whether the condition was met.
pub fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + POLL_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(POLL_INTERVAL);
    }
    condition()
}

// ---------------------------------------------------------------------------
// Scripted server
// ---------------------------------------------------------------------------

/// A listener on an OS-picked port that hands out one scripted peer per
/// accepted connection.
pub struct ScriptedServer {
    listener: TcpListener,
}

impl ScriptedServer {
    pub fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind scripted server");
        Self { listener }
    }

    /// Address for `GameClient::connect`.
    pub fn addr(&self) -> String {
        self.listener
            .local_addr()
            .expect("scripted server local addr")
            .to_string()
    }

    /// Accept the next client connection. The client may connect before
    /// this is called; the OS backlog holds it.
    pub fn accept(&self) -> ServerPeer {
        let (stream, _addr) = self.listener.accept().expect("accept client");
        // A read timeout keeps a buggy test from hanging forever.
        stream
            .set_read_timeout(Some(POLL_TIMEOUT))
            .expect("set peer read timeout");
        let reader = BufReader::new(stream.try_clone().expect("clone peer stream"));
        let writer = BufWriter::new(stream.try_clone().expect("clone peer stream"));
        ServerPeer {
            reader,
            writer,
            stream,
        }
    }
}

/// The server side of one accepted connection, driven by the test body.
pub struct ServerPeer {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    stream: TcpStream,
}

impl ServerPeer {
    /// Encode and flush one server message.
    pub fn send(&mut self, msg: &ServerMessage) {
        msg.encode(&mut self.writer).expect("encode server message");
        self.writer.flush().expect("flush server message");
    }

    /// Write raw bytes — for malformed or unknown-kind streams.
    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).expect("write raw bytes");
        self.writer.flush().expect("flush raw bytes");
    }

    /// Read the next client message.
    pub fn recv(&mut self) -> io::Result<ClientMessage> {
        ClientMessage::decode(&mut self.reader)
    }

    /// Close the connection from the server side.
    pub fn close(self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

// ---------------------------------------------------------------------------
// Recording UI
// ---------------------------------------------------------------------------

/// One `GameUi` notification, as recorded.
#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    Turn {
        player: PlayerId,
        my_turn: bool,
    },
    Attack {
        src: TerritoryId,
        dest: TerritoryId,
        attack_roll: i32,
        defense_roll: i32,
    },
    Territory {
        territory: TerritoryId,
        color: PlayerColor,
        armies: i32,
    },
    Roster(Vec<String>),
    Win,
    Lose,
    ServerError,
    Playable(bool),
    Highlight(TerritoryId),
    ClearHighlights,
}

/// A `GameUi` that records every notification in arrival order.
#[derive(Default)]
pub struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: UiEvent) {
        self.events.lock().expect("ui event lock").push(event);
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().expect("ui event lock").clone()
    }

    /// Wait until the recorded events satisfy `pred`.
    pub fn wait_for(&self, pred: impl Fn(&[UiEvent]) -> bool) -> bool {
        wait_until(|| pred(&self.events()))
    }

    /// How many server-error notifications were delivered.
    pub fn server_errors(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| **e == UiEvent::ServerError)
            .count()
    }
}

impl GameUi for RecordingUi {
    fn show_turn(&self, player: PlayerId, my_turn: bool) {
        self.push(UiEvent::Turn { player, my_turn });
    }

    fn show_attack(
        &self,
        src: TerritoryId,
        dest: TerritoryId,
        attack_roll: i32,
        defense_roll: i32,
    ) {
        self.push(UiEvent::Attack {
            src,
            dest,
            attack_roll,
            defense_roll,
        });
    }

    fn update_territory(&self, territory: TerritoryId, color: PlayerColor, armies: i32) {
        self.push(UiEvent::Territory {
            territory,
            color,
            armies,
        });
    }

    fn set_roster(&self, names: &[String]) {
        self.push(UiEvent::Roster(names.to_vec()));
    }

    fn you_win(&self) {
        self.push(UiEvent::Win);
    }

    fn you_lose(&self) {
        self.push(UiEvent::Lose);
    }

    fn server_error(&self) {
        self.push(UiEvent::ServerError);
    }

    fn set_playable(&self, playable: bool) {
        self.push(UiEvent::Playable(playable));
    }

    fn highlight(&self, territory: TerritoryId) {
        self.push(UiEvent::Highlight(territory));
    }

    fn clear_highlights(&self) {
        self.push(UiEvent::ClearHighlights);
    }
}

// ---------------------------------------------------------------------------
// Scripted board model
// ---------------------------------------------------------------------------

/// A `BoardModel` with scripted ownership and adjacency, recording every
/// mutation the network layer pushes down.
#[derive(Default)]
pub struct ScriptBoard {
    mine: Mutex<HashSet<TerritoryId>>,
    adjacent: Mutex<HashSet<(TerritoryId, TerritoryId)>>,
    players: Mutex<Vec<Player>>,
    local_player: Mutex<Option<PlayerId>>,
    territory_updates: Mutex<Vec<(TerritoryId, PlayerId, i32)>>,
}

impl ScriptBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script: the local player owns this territory.
    pub fn make_mine(&self, territory: TerritoryId) {
        self.mine.lock().expect("mine lock").insert(territory);
    }

    /// Script: these two territories are adjacent (symmetric).
    pub fn make_adjacent(&self, a: TerritoryId, b: TerritoryId) {
        let mut adjacent = self.adjacent.lock().expect("adjacency lock");
        adjacent.insert((a, b));
        adjacent.insert((b, a));
    }

    /// Roster as delivered via `set_players`.
    pub fn players(&self) -> Vec<Player> {
        self.players.lock().expect("players lock").clone()
    }

    /// Local player index as delivered via `set_local_player`.
    pub fn local(&self) -> Option<PlayerId> {
        *self.local_player.lock().expect("local player lock")
    }

    /// Territory mutations in arrival order.
    pub fn updates(&self) -> Vec<(TerritoryId, PlayerId, i32)> {
        self.territory_updates.lock().expect("updates lock").clone()
    }
}

impl BoardModel for ScriptBoard {
    fn is_mine(&self, territory: TerritoryId) -> bool {
        self.mine.lock().expect("mine lock").contains(&territory)
    }

    fn is_adjacent(&self, from: TerritoryId, to: TerritoryId) -> bool {
        self.adjacent
            .lock()
            .expect("adjacency lock")
            .contains(&(from, to))
    }

    fn set_players(&self, players: &[Player]) {
        *self.players.lock().expect("players lock") = players.to_vec();
    }

    fn set_local_player(&self, player: PlayerId) {
        *self.local_player.lock().expect("local player lock") = Some(player);
    }

    fn update_territory(&self, territory: TerritoryId, owner: PlayerId, armies: i32) {
        self.territory_updates
            .lock()
            .expect("updates lock")
            .push((territory, owner, armies));
    }
}
