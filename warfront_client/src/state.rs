// Session state for one server connection.
//
// `SessionState` is the single shared record of everything the client
// knows about the session: lifecycle phase, join status, roster, whose
// turn it is, winner. It is owned behind a mutex (see `client.rs`); all
// inbound mutation funnels through `apply_message`, a reducer that takes
// one decoded server message and returns the list of collaborator
// `Effect`s it implies. The dispatcher applies the reducer under the
// lock and delivers the effects after releasing it, which keeps this
// module free of I/O and directly unit-testable.
//
// The lifecycle is an explicit phase machine:
//
//   Connecting → Lobby → InProgress → Finished
//        └──────────┴─────────┴→ Disconnected (absorbing)
//
// Each server kind is legal only in specific phases (`Phase::admits`).
// A message outside the table is fully decoded — framing stays aligned —
// but none of its effects are applied; it is dropped with a warning.
// Unknown kinds are tolerated in every phase and counted.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use warfront_protocol::message::ServerMessage;
use warfront_protocol::{PlayerColor, PlayerId, TerritoryId};

/// Connection lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Socket established, no join requested yet.
    Connecting,
    /// Join requested; roster and join status are being assembled.
    Lobby,
    /// The game is running.
    InProgress,
    /// A winner was recorded and the socket is closed.
    Finished,
    /// The reader loop has exited without a finished game.
    Disconnected,
}

impl Phase {
    /// Which inbound kinds may take effect in this phase. `Unknown` is
    /// tolerated everywhere (it only bumps a counter).
    fn admits(self, msg: &ServerMessage) -> bool {
        match msg {
            ServerMessage::Unknown { .. } => true,
            ServerMessage::JoinStatus { .. }
            | ServerMessage::PlayerInfo { .. }
            | ServerMessage::WhoAmI { .. } => {
                matches!(self, Phase::Connecting | Phase::Lobby)
            }
            ServerMessage::GameStarting => self == Phase::Lobby,
            ServerMessage::TurnIndicator { .. }
            | ServerMessage::AttackMade { .. }
            | ServerMessage::TerritoryStatus { .. }
            | ServerMessage::GameFinished { .. } => self == Phase::InProgress,
        }
    }
}

/// Whether the requested game name was reported as taken. Starts
/// `Unknown`; the facade resets it back to `Unknown` after consuming a
/// report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinStatus {
    Unknown,
    NameInUse,
    NameAvailable,
}

/// One roster entry. Identity is the server-assigned index; entries are
/// never removed during a session.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
}

/// A collaborator call implied by one inbound message. Produced by
/// `SessionState::apply_message`, executed by the dispatcher after the
/// state lock is released. Effects carry owned data so delivery needs no
/// second look at the state.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    ShowTurn {
        player: PlayerId,
        my_turn: bool,
    },
    ShowAttack {
        src: TerritoryId,
        dest: TerritoryId,
        attack_roll: i32,
        defense_roll: i32,
    },
    /// Board model gets (territory, owner, armies); the UI gets the same
    /// territory with the owner's resolved color.
    UpdateTerritory {
        territory: TerritoryId,
        owner: PlayerId,
        color: PlayerColor,
        armies: i32,
    },
    DeliverRoster(Vec<Player>),
    SetLocalPlayer(PlayerId),
    SetRoster(Vec<String>),
    YouWin,
    YouLose,
    SetPlayable(bool),
    CloseConnection,
}

/// Everything the client knows about the current session. One instance
/// per connection, shared behind a mutex between the reader thread and
/// the facade.
#[derive(Debug)]
pub struct SessionState {
    pub phase: Phase,
    pub join_status: JoinStatus,
    pub local_player: Option<PlayerId>,
    pub current_turn: Option<PlayerId>,
    pub winner: Option<PlayerId>,
    /// Monotonic: once true, never reverts.
    pub started: bool,
    /// Unrecognized kind tags seen so far. The drop itself is silent on
    /// the wire; this counter is what makes it observable.
    pub unknown_messages: u64,
    players: BTreeMap<PlayerId, Player>,
    territory_owners: BTreeMap<TerritoryId, PlayerId>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Connecting,
            join_status: JoinStatus::Unknown,
            local_player: None,
            current_turn: None,
            winner: None,
            started: false,
            unknown_messages: 0,
            players: BTreeMap::new(),
            territory_owners: BTreeMap::new(),
        }
    }

    /// The facade sent GAME_TO_JOIN; leave `Connecting`.
    pub fn note_join_requested(&mut self) {
        if self.phase == Phase::Connecting {
            info!("join requested, entering lobby");
            self.phase = Phase::Lobby;
        }
    }

    /// The reader loop exited. `Finished` stays `Finished`; anything
    /// else becomes `Disconnected`.
    pub fn note_connection_closed(&mut self) {
        if self.phase != Phase::Finished {
            self.phase = Phase::Disconnected;
        }
    }

    /// Roster entries in index order.
    pub fn roster(&self) -> Vec<Player> {
        self.players.values().cloned().collect()
    }

    /// Display names in roster order.
    pub fn player_names(&self) -> Vec<String> {
        self.players.values().map(|p| p.name.clone()).collect()
    }

    /// A player's color, if that index is in the roster.
    pub fn player_color(&self, player: PlayerId) -> Option<PlayerColor> {
        self.players.get(&player).map(|p| p.color)
    }

    /// Number of territories a player currently owns, derived from the
    /// TERRITORY_STATUS stream.
    pub fn territory_count(&self, player: PlayerId) -> usize {
        self.territory_owners
            .values()
            .filter(|owner| **owner == player)
            .count()
    }

    /// Apply one inbound message: mutate the session record and return
    /// the collaborator effects it implies, in delivery order. Messages
    /// not legal in the current phase produce no mutation and no effects.
    pub fn apply_message(&mut self, msg: &ServerMessage) -> Vec<Effect> {
        if !self.phase.admits(msg) {
            warn!("dropping out-of-phase message in {:?}: {msg:?}", self.phase);
            return Vec::new();
        }

        // Lobby traffic can arrive before the join bookkeeping catches
        // up; treat it as the lobby entry signal.
        if self.phase == Phase::Connecting && !matches!(msg, ServerMessage::Unknown { .. }) {
            debug!("lobby message while still connecting, entering lobby");
            self.phase = Phase::Lobby;
        }

        match msg {
            ServerMessage::JoinStatus { name_in_use } => {
                self.join_status = if *name_in_use {
                    JoinStatus::NameInUse
                } else {
                    JoinStatus::NameAvailable
                };
                debug!("join status: {:?}", self.join_status);
                Vec::new()
            }

            ServerMessage::PlayerInfo {
                player,
                color,
                name,
            } => {
                self.players.insert(
                    *player,
                    Player {
                        id: *player,
                        name: name.clone(),
                        color: *color,
                    },
                );
                Vec::new()
            }

            ServerMessage::WhoAmI { player } => {
                self.local_player = Some(*player);
                info!("local player is {player:?}, roster complete");
                vec![
                    Effect::DeliverRoster(self.roster()),
                    Effect::SetLocalPlayer(*player),
                    Effect::SetRoster(self.player_names()),
                ]
            }

            ServerMessage::GameStarting => {
                self.started = true;
                self.phase = Phase::InProgress;
                info!("game starting with {} players", self.players.len());
                vec![Effect::DeliverRoster(self.roster())]
            }

            ServerMessage::TurnIndicator { player } => {
                self.current_turn = Some(*player);
                let my_turn = self.local_player == Some(*player);
                vec![
                    Effect::ShowTurn {
                        player: *player,
                        my_turn,
                    },
                    Effect::SetPlayable(my_turn),
                ]
            }

            ServerMessage::AttackMade {
                src,
                dest,
                attack_roll,
                defense_roll,
            } => vec![Effect::ShowAttack {
                src: *src,
                dest: *dest,
                attack_roll: *attack_roll,
                defense_roll: *defense_roll,
            }],

            ServerMessage::TerritoryStatus {
                territory,
                owner,
                armies,
            } => {
                self.territory_owners.insert(*territory, *owner);
                let color = self
                    .player_color(*owner)
                    .unwrap_or(PlayerColor::NEUTRAL);
                let mut effects = vec![Effect::UpdateTerritory {
                    territory: *territory,
                    owner: *owner,
                    color,
                    armies: *armies,
                }];
                // Refresh the turn display, once a turn is established.
                if let Some(turn) = self.current_turn {
                    effects.push(Effect::ShowTurn {
                        player: turn,
                        my_turn: self.local_player == Some(turn),
                    });
                }
                effects
            }

            ServerMessage::GameFinished { winner } => {
                self.winner = Some(*winner);
                self.phase = Phase::Finished;
                let i_won = self.local_player == Some(*winner);
                info!("game finished, winner {winner:?} (local win: {i_won})");
                vec![
                    if i_won { Effect::YouWin } else { Effect::YouLose },
                    Effect::SetPlayable(false),
                    Effect::ShowTurn {
                        player: *winner,
                        my_turn: i_won,
                    },
                    Effect::CloseConnection,
                ]
            }

            ServerMessage::Unknown { tag } => {
                self.unknown_messages += 1;
                warn!(
                    "ignoring unknown message tag 0x{tag:02X} ({} so far)",
                    self.unknown_messages
                );
                Vec::new()
            }
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_info(index: i32, color: u32, name: &str) -> ServerMessage {
        ServerMessage::PlayerInfo {
            player: PlayerId(index),
            color: PlayerColor(color),
            name: name.into(),
        }
    }

    /// Lobby assembly: two roster entries, then WHO_AM_I finalizes.
    #[test]
    fn roster_assembly_and_identity() {
        let mut state = SessionState::new();
        state.note_join_requested();

        assert!(state.apply_message(&player_info(0, 0xFF_00_00, "Alice")).is_empty());
        assert!(state.apply_message(&player_info(1, 0x00_00_FF, "Bob")).is_empty());

        let effects = state.apply_message(&ServerMessage::WhoAmI {
            player: PlayerId(0),
        });

        assert_eq!(state.local_player, Some(PlayerId(0)));
        assert_eq!(state.player_names(), ["Alice", "Bob"]);
        assert_eq!(state.player_color(PlayerId(0)), Some(PlayerColor(0xFF_00_00)));
        assert_eq!(
            effects,
            vec![
                Effect::DeliverRoster(state.roster()),
                Effect::SetLocalPlayer(PlayerId(0)),
                Effect::SetRoster(vec!["Alice".into(), "Bob".into()]),
            ]
        );
    }

    /// A later PLAYER_INFO for the same index replaces the entry.
    #[test]
    fn roster_upsert_by_index() {
        let mut state = SessionState::new();
        state.note_join_requested();
        state.apply_message(&player_info(0, 0xFF_00_00, "Alice"));
        state.apply_message(&player_info(0, 0x00_FF_00, "Alicia"));

        assert_eq!(state.player_names(), ["Alicia"]);
        assert_eq!(state.player_color(PlayerId(0)), Some(PlayerColor(0x00_FF_00)));
    }

    /// GAME_STARTING then TURN_IND for the local player.
    #[test]
    fn game_start_then_local_turn() {
        let mut state = SessionState::new();
        state.note_join_requested();
        state.apply_message(&player_info(0, 0xFF_00_00, "Alice"));
        state.apply_message(&player_info(1, 0x00_00_FF, "Bob"));
        state.apply_message(&ServerMessage::WhoAmI {
            player: PlayerId(0),
        });

        let effects = state.apply_message(&ServerMessage::GameStarting);
        assert!(state.started);
        assert_eq!(state.phase, Phase::InProgress);
        assert_eq!(effects, vec![Effect::DeliverRoster(state.roster())]);

        let effects = state.apply_message(&ServerMessage::TurnIndicator {
            player: PlayerId(0),
        });
        assert_eq!(
            effects,
            vec![
                Effect::ShowTurn {
                    player: PlayerId(0),
                    my_turn: true,
                },
                Effect::SetPlayable(true),
            ]
        );
    }

    /// Play is enabled iff the announced player is the local one.
    #[test]
    fn turn_gating_against_local_index() {
        let mut state = SessionState::new();
        state.note_join_requested();
        state.apply_message(&player_info(0, 1, "Alice"));
        state.apply_message(&player_info(1, 2, "Bob"));
        state.apply_message(&ServerMessage::WhoAmI {
            player: PlayerId(1),
        });
        state.apply_message(&ServerMessage::GameStarting);

        let effects = state.apply_message(&ServerMessage::TurnIndicator {
            player: PlayerId(0),
        });
        assert!(effects.contains(&Effect::SetPlayable(false)));

        let effects = state.apply_message(&ServerMessage::TurnIndicator {
            player: PlayerId(1),
        });
        assert!(effects.contains(&Effect::SetPlayable(true)));
    }

    #[test]
    fn finish_as_winner() {
        let mut state = SessionState::new();
        state.note_join_requested();
        state.apply_message(&player_info(0, 1, "Alice"));
        state.apply_message(&ServerMessage::WhoAmI {
            player: PlayerId(0),
        });
        state.apply_message(&ServerMessage::GameStarting);

        let effects = state.apply_message(&ServerMessage::GameFinished {
            winner: PlayerId(0),
        });
        assert_eq!(state.winner, Some(PlayerId(0)));
        assert_eq!(state.phase, Phase::Finished);
        assert_eq!(
            effects,
            vec![
                Effect::YouWin,
                Effect::SetPlayable(false),
                Effect::ShowTurn {
                    player: PlayerId(0),
                    my_turn: true,
                },
                Effect::CloseConnection,
            ]
        );
    }

    #[test]
    fn finish_as_loser() {
        let mut state = SessionState::new();
        state.note_join_requested();
        state.apply_message(&player_info(0, 1, "Alice"));
        state.apply_message(&player_info(1, 2, "Bob"));
        state.apply_message(&ServerMessage::WhoAmI {
            player: PlayerId(0),
        });
        state.apply_message(&ServerMessage::GameStarting);

        let effects = state.apply_message(&ServerMessage::GameFinished {
            winner: PlayerId(1),
        });
        assert_eq!(effects[0], Effect::YouLose);
        assert!(effects.contains(&Effect::CloseConnection));
    }

    /// `started` never reverts: a stray second GAME_STARTING after the
    /// game is running is out of phase and changes nothing.
    #[test]
    fn started_is_monotonic() {
        let mut state = SessionState::new();
        state.note_join_requested();
        state.apply_message(&ServerMessage::GameStarting);
        assert!(state.started);

        let effects = state.apply_message(&ServerMessage::GameStarting);
        assert!(effects.is_empty());
        assert!(state.started);
        assert_eq!(state.phase, Phase::InProgress);
    }

    /// In-progress kinds arriving in the lobby are dropped whole.
    #[test]
    fn out_of_phase_messages_are_dropped() {
        let mut state = SessionState::new();
        state.note_join_requested();

        let effects = state.apply_message(&ServerMessage::TurnIndicator {
            player: PlayerId(0),
        });
        assert!(effects.is_empty());
        assert_eq!(state.current_turn, None);

        let effects = state.apply_message(&ServerMessage::GameFinished {
            winner: PlayerId(0),
        });
        assert!(effects.is_empty());
        assert_eq!(state.winner, None);
        assert_eq!(state.phase, Phase::Lobby);
    }

    /// Nothing is admitted after the game finished.
    #[test]
    fn finished_is_terminal() {
        let mut state = SessionState::new();
        state.note_join_requested();
        state.apply_message(&ServerMessage::GameStarting);
        state.apply_message(&ServerMessage::GameFinished {
            winner: PlayerId(0),
        });

        let effects = state.apply_message(&ServerMessage::TurnIndicator {
            player: PlayerId(0),
        });
        assert!(effects.is_empty());
        assert_eq!(state.current_turn, None);
    }

    /// Lobby traffic before the join request implies lobby entry.
    #[test]
    fn connecting_advances_on_lobby_traffic() {
        let mut state = SessionState::new();
        assert_eq!(state.phase, Phase::Connecting);

        state.apply_message(&player_info(0, 1, "Alice"));
        assert_eq!(state.phase, Phase::Lobby);
        assert_eq!(state.player_names(), ["Alice"]);
    }

    #[test]
    fn join_status_tristate() {
        let mut state = SessionState::new();
        assert_eq!(state.join_status, JoinStatus::Unknown);

        state.apply_message(&ServerMessage::JoinStatus { name_in_use: true });
        assert_eq!(state.join_status, JoinStatus::NameInUse);

        state.apply_message(&ServerMessage::JoinStatus { name_in_use: false });
        assert_eq!(state.join_status, JoinStatus::NameAvailable);
    }

    /// Unknown kinds are counted, tolerated in any phase, and have no
    /// other effect.
    #[test]
    fn unknown_kinds_are_counted() {
        let mut state = SessionState::new();
        assert!(state.apply_message(&ServerMessage::Unknown { tag: 0x7F }).is_empty());
        state.note_join_requested();
        state.apply_message(&ServerMessage::GameStarting);
        assert!(state.apply_message(&ServerMessage::Unknown { tag: 0xEE }).is_empty());

        assert_eq!(state.unknown_messages, 2);
        assert_eq!(state.phase, Phase::InProgress);
    }

    /// Territory counts follow ownership changes, including takeovers.
    #[test]
    fn territory_counts_derive_from_updates() {
        let mut state = SessionState::new();
        state.note_join_requested();
        state.apply_message(&player_info(0, 1, "Alice"));
        state.apply_message(&player_info(1, 2, "Bob"));
        state.apply_message(&ServerMessage::GameStarting);

        for (territory, owner) in [(1, 0), (2, 0), (3, 1)] {
            state.apply_message(&ServerMessage::TerritoryStatus {
                territory: TerritoryId(territory),
                owner: PlayerId(owner),
                armies: 1,
            });
        }
        assert_eq!(state.territory_count(PlayerId(0)), 2);
        assert_eq!(state.territory_count(PlayerId(1)), 1);

        // Bob takes territory 1 from Alice.
        state.apply_message(&ServerMessage::TerritoryStatus {
            territory: TerritoryId(1),
            owner: PlayerId(1),
            armies: 4,
        });
        assert_eq!(state.territory_count(PlayerId(0)), 1);
        assert_eq!(state.territory_count(PlayerId(1)), 2);
    }

    /// The territory repaint resolves the owner's roster color; an owner
    /// missing from the roster falls back to neutral.
    #[test]
    fn territory_update_resolves_color() {
        let mut state = SessionState::new();
        state.note_join_requested();
        state.apply_message(&player_info(0, 0xFF_00_00, "Alice"));
        state.apply_message(&ServerMessage::GameStarting);

        let effects = state.apply_message(&ServerMessage::TerritoryStatus {
            territory: TerritoryId(7),
            owner: PlayerId(0),
            armies: 5,
        });
        assert_eq!(
            effects,
            vec![Effect::UpdateTerritory {
                territory: TerritoryId(7),
                owner: PlayerId(0),
                color: PlayerColor(0xFF_00_00),
                armies: 5,
            }]
        );

        let effects = state.apply_message(&ServerMessage::TerritoryStatus {
            territory: TerritoryId(8),
            owner: PlayerId(9),
            armies: 2,
        });
        assert_eq!(
            effects[0],
            Effect::UpdateTerritory {
                territory: TerritoryId(8),
                owner: PlayerId(9),
                color: PlayerColor::NEUTRAL,
                armies: 2,
            }
        );
    }

    /// A territory update refreshes the turn display only once a turn
    /// indicator has established whose turn it is.
    #[test]
    fn territory_update_refreshes_turn_display() {
        let mut state = SessionState::new();
        state.note_join_requested();
        state.apply_message(&ServerMessage::WhoAmI {
            player: PlayerId(0),
        });
        state.apply_message(&ServerMessage::GameStarting);

        let effects = state.apply_message(&ServerMessage::TerritoryStatus {
            territory: TerritoryId(1),
            owner: PlayerId(0),
            armies: 1,
        });
        assert_eq!(effects.len(), 1, "no turn known yet, no refresh");

        state.apply_message(&ServerMessage::TurnIndicator {
            player: PlayerId(0),
        });
        let effects = state.apply_message(&ServerMessage::TerritoryStatus {
            territory: TerritoryId(2),
            owner: PlayerId(0),
            armies: 3,
        });
        assert_eq!(
            effects[1],
            Effect::ShowTurn {
                player: PlayerId(0),
                my_turn: true,
            }
        );
    }
}
