// Facade and connection lifecycle.
//
// `GameClient` is what the rest of the application holds: it opens the
// TCP connection, spawns the background reader thread (`dispatch.rs`),
// and exposes the action and query surface. Actions validate against the
// locally cached state (territory ownership, adjacency) before anything
// is written; everything authoritative stays on the server.
//
// Threading: the caller thread runs actions/queries, the reader thread
// runs the dispatcher — exactly two threads per connection. Shared state
// is `Arc<Mutex<SessionState>>`; the only facade-side mutations are the
// selection, the join-status reset, and the Connecting→Lobby note.
//
// Lifecycle: `shutdown` (or dropping the client) closes the socket,
// which unblocks the reader's pending read, then joins the thread — the
// owner can rely on teardown being complete when it returns.

use std::io::{self, BufReader};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::info;

use warfront_protocol::{PlayerColor, PlayerId, TerritoryId};

use crate::dispatch;
use crate::outbound::Outbound;
use crate::state::{JoinStatus, Phase, SessionState};
use crate::ui::{BoardModel, GameUi};

/// Connection options for `GameClient::connect_with`.
pub struct ClientConfig {
    /// Server address, `host:port`.
    pub addr: String,
    /// Disable Nagle's algorithm. Messages here are a handful of bytes
    /// and turn latency is what the player feels.
    pub nodelay: bool,
    /// Timeout for establishing the TCP connection; `None` blocks until
    /// the OS gives up.
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:7878".into(),
            nodelay: true,
            connect_timeout: Some(Duration::from_secs(5)),
        }
    }
}

/// Handle to one server connection: actions in, queries out. Owns both
/// socket halves and the reader thread.
pub struct GameClient {
    state: Arc<Mutex<SessionState>>,
    outbound: Outbound,
    /// The currently clicked own territory, if any.
    selection: Mutex<Option<TerritoryId>>,
    ui: Arc<dyn GameUi>,
    board: Arc<dyn BoardModel>,
    reader_thread: Option<JoinHandle<()>>,
}

impl GameClient {
    /// Connect with default options.
    pub fn connect(
        addr: &str,
        ui: Arc<dyn GameUi>,
        board: Arc<dyn BoardModel>,
    ) -> io::Result<Self> {
        Self::connect_with(
            &ClientConfig {
                addr: addr.into(),
                ..ClientConfig::default()
            },
            ui,
            board,
        )
    }

    /// Open the TCP connection and start the background reader thread.
    pub fn connect_with(
        config: &ClientConfig,
        ui: Arc<dyn GameUi>,
        board: Arc<dyn BoardModel>,
    ) -> io::Result<Self> {
        let stream = match config.connect_timeout {
            Some(timeout) => {
                let addr = config.addr.to_socket_addrs()?.next().ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("address resolved to nothing: {}", config.addr),
                    )
                })?;
                TcpStream::connect_timeout(&addr, timeout)?
            }
            None => TcpStream::connect(&config.addr)?,
        };
        if config.nodelay {
            stream.set_nodelay(true)?;
        }
        info!("connected to {}", config.addr);

        let reader = BufReader::new(stream.try_clone()?);
        let reader_stream = stream.try_clone()?;
        let outbound = Outbound::new(stream)?;
        let state = Arc::new(Mutex::new(SessionState::new()));

        let reader_thread = thread::spawn({
            let state = state.clone();
            let ui = ui.clone();
            let board = board.clone();
            move || dispatch::run(reader, reader_stream, state, ui, board)
        });

        Ok(Self {
            state,
            outbound,
            selection: Mutex::new(None),
            ui,
            board,
            reader_thread: Some(reader_thread),
        })
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// The user clicked a territory. Clicking an own territory selects
    /// it (replacing any previous selection). Clicking elsewhere with a
    /// selection active launches an attack if the two are adjacent;
    /// otherwise the click is a no-op and the selection stays. This is
    /// the only rule enforced client-side — combat itself is resolved by
    /// the server.
    pub fn click_territory(&self, territory: TerritoryId) -> io::Result<()> {
        if self.board.is_mine(territory) {
            self.ui.clear_highlights();
            *self.lock_selection() = Some(territory);
            self.ui.highlight(territory);
            return Ok(());
        }

        let selected = *self.lock_selection();
        if let Some(src) = selected {
            if self.board.is_adjacent(src, territory) {
                self.outbound.launch_attack(src, territory)?;
                *self.lock_selection() = None;
                self.ui.clear_highlights();
            }
        }
        Ok(())
    }

    /// End the local player's turn and drop any pending selection.
    pub fn end_turn(&self) -> io::Result<()> {
        self.outbound.end_turn()?;
        *self.lock_selection() = None;
        self.ui.clear_highlights();
        Ok(())
    }

    /// Give up. Sends SURRENDER and closes the connection whether or not
    /// the send succeeded; the reader thread winds down on its own.
    pub fn surrender(&self) -> io::Result<()> {
        self.outbound.surrender()
    }

    /// Ask the server to join (or create) the named game.
    pub fn request_join(&self, game: &str) -> io::Result<()> {
        self.outbound.request_join(game)?;
        self.lock_state().note_join_requested();
        Ok(())
    }

    /// Report the local player's display name.
    pub fn submit_player_name(&self, name: &str) -> io::Result<()> {
        self.outbound.send_player_name(name)
    }

    /// Signal readiness to start.
    pub fn mark_ready(&self) -> io::Result<()> {
        self.outbound.send_ready()
    }

    // ------------------------------------------------------------------
    // Queries (pure reads of the cached session state)
    // ------------------------------------------------------------------

    /// True once GAME_STARTING has been received. Never reverts.
    pub fn game_started(&self) -> bool {
        self.lock_state().started
    }

    /// The winner, once GAME_FINISHED has been received.
    pub fn winner(&self) -> Option<PlayerId> {
        self.lock_state().winner
    }

    /// Latest join-status report from the server.
    pub fn join_status(&self) -> JoinStatus {
        self.lock_state().join_status
    }

    /// Clear a consumed join-status report back to `Unknown`.
    pub fn reset_join_status(&self) {
        self.lock_state().join_status = JoinStatus::Unknown;
    }

    /// A roster player's color.
    pub fn player_color(&self, player: PlayerId) -> Option<PlayerColor> {
        self.lock_state().player_color(player)
    }

    /// Display names in roster order.
    pub fn player_names(&self) -> Vec<String> {
        self.lock_state().player_names()
    }

    /// How many territories a player currently owns.
    pub fn territory_count(&self, player: PlayerId) -> usize {
        self.lock_state().territory_count(player)
    }

    /// Whose turn the server last announced.
    pub fn current_turn(&self) -> Option<PlayerId> {
        self.lock_state().current_turn
    }

    /// The local player's index, once WHO_AM_I has been received.
    pub fn local_player(&self) -> Option<PlayerId> {
        self.lock_state().local_player
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.lock_state().phase
    }

    /// How many unrecognized message kinds the dispatcher has dropped.
    pub fn unknown_message_count(&self) -> u64 {
        self.lock_state().unknown_messages
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Close the connection and wait for the reader thread to exit.
    /// Dropping the client does the same.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.outbound.close();
        if let Some(handle) = self.reader_thread.take() {
            let _ = handle.join();
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state lock poisoned")
    }

    fn lock_selection(&self) -> std::sync::MutexGuard<'_, Option<TerritoryId>> {
        self.selection.lock().expect("selection lock poisoned")
    }
}

impl Drop for GameClient {
    fn drop(&mut self) {
        self.teardown();
    }
}
