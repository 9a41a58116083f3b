// Inbound dispatcher: the background read loop.
//
// Runs on its own thread for the lifetime of the connection. Each
// iteration blocks on decoding exactly one server message, applies it to
// the shared `SessionState` under the lock, then delivers the resulting
// `Effect`s to the UI and board collaborators with the lock released —
// a collaborator callback may freely call back into `GameClient`
// queries.
//
// Termination:
// - Clean end of stream (`UnexpectedEof` at a message boundary): normal
//   end of session, no user-visible error.
// - Any other read/decode error: the UI gets one `server_error`
//   notification — unless a winner is already recorded, in which case
//   the socket closure is the expected post-game teardown.
// Either way the socket is closed best-effort and the loop exits. There
// is no cooperative cancellation: the owner stops this loop by closing
// the connection (see `GameClient::shutdown`).

use std::io::{self, Read};
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use warfront_protocol::message::ServerMessage;

use crate::state::{Effect, SessionState};
use crate::ui::{BoardModel, GameUi};

/// Read messages until the stream ends or fails. `reader` is the
/// buffered read half; `stream` is an unbuffered handle to the same
/// socket, used only for closing.
pub(crate) fn run(
    mut reader: impl Read,
    stream: TcpStream,
    state: Arc<Mutex<SessionState>>,
    ui: Arc<dyn GameUi>,
    board: Arc<dyn BoardModel>,
) {
    loop {
        match ServerMessage::decode(&mut reader) {
            Ok(msg) => {
                debug!("received {msg:?}");
                let effects = state
                    .lock()
                    .expect("session state lock poisoned")
                    .apply_message(&msg);
                for effect in effects {
                    deliver(effect, &stream, &ui, &board);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                info!("server closed the connection");
                break;
            }
            Err(e) => {
                let winner_recorded = state
                    .lock()
                    .expect("session state lock poisoned")
                    .winner
                    .is_some();
                if winner_recorded {
                    // Post-game closure is expected, not an error.
                    debug!("read after game finished failed: {e}");
                } else {
                    warn!("connection failed: {e}");
                    ui.server_error();
                }
                let _ = stream.shutdown(Shutdown::Both);
                break;
            }
        }
    }

    state
        .lock()
        .expect("session state lock poisoned")
        .note_connection_closed();
    debug!("reader loop exiting");
}

/// Execute one collaborator call. Called with no locks held.
fn deliver(effect: Effect, stream: &TcpStream, ui: &Arc<dyn GameUi>, board: &Arc<dyn BoardModel>) {
    match effect {
        Effect::ShowTurn { player, my_turn } => ui.show_turn(player, my_turn),
        Effect::ShowAttack {
            src,
            dest,
            attack_roll,
            defense_roll,
        } => ui.show_attack(src, dest, attack_roll, defense_roll),
        Effect::UpdateTerritory {
            territory,
            owner,
            color,
            armies,
        } => {
            board.update_territory(territory, owner, armies);
            ui.update_territory(territory, color, armies);
        }
        Effect::DeliverRoster(players) => board.set_players(&players),
        Effect::SetLocalPlayer(player) => board.set_local_player(player),
        Effect::SetRoster(names) => ui.set_roster(&names),
        Effect::YouWin => ui.you_win(),
        Effect::YouLose => ui.you_lose(),
        Effect::SetPlayable(playable) => ui.set_playable(playable),
        Effect::CloseConnection => {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}
