// Collaborator traits: the surfaces the network layer talks to.
//
// The connection core renders nothing and owns no board. It pushes facts
// outward through two traits the embedding application implements:
//
// - `GameUi`: display notifications — whose turn, attack results,
//   territory repaints, roster, win/lose, connection errors.
// - `BoardModel`: the local cache of the authoritative board — territory
//   ownership/adjacency queries the click rule needs, plus the mutations
//   the server pushes down.
//
// Both traits are called from the background reader thread (and `GameUi`
// highlight methods from the caller thread), so implementations must be
// `Send + Sync`. Callbacks are invoked with no internal locks held; it is
// safe for an implementation to call back into `GameClient` queries.

use warfront_protocol::{PlayerColor, PlayerId, TerritoryId};

use crate::state::Player;

/// Display surface for game events. All methods are notifications; none
/// return data to the network layer.
pub trait GameUi: Send + Sync {
    /// A player's turn began. `my_turn` is true when it is the local
    /// player's turn.
    fn show_turn(&self, player: PlayerId, my_turn: bool);

    /// An attack was resolved by the server; display only.
    fn show_attack(
        &self,
        src: TerritoryId,
        dest: TerritoryId,
        attack_roll: i32,
        defense_roll: i32,
    );

    /// Repaint one territory with its owner's color and army count.
    fn update_territory(&self, territory: TerritoryId, color: PlayerColor, armies: i32);

    /// The final player name list for this session, in roster order.
    fn set_roster(&self, names: &[String]);

    /// The local player won.
    fn you_win(&self);

    /// Another player won.
    fn you_lose(&self);

    /// The connection to the server failed mid-game.
    fn server_error(&self);

    /// Enable or disable local play input.
    fn set_playable(&self, playable: bool);

    /// Mark a territory as the current selection.
    fn highlight(&self, territory: TerritoryId);

    /// Remove any selection highlight.
    fn clear_highlights(&self);
}

/// The local board cache. Ownership and adjacency are authoritative on
/// the server; this is the client's mirror of them.
pub trait BoardModel: Send + Sync {
    /// Does the local player own this territory?
    fn is_mine(&self, territory: TerritoryId) -> bool;

    /// Are two territories adjacent on the board?
    fn is_adjacent(&self, from: TerritoryId, to: TerritoryId) -> bool;

    /// Install the finalized roster for this session.
    fn set_players(&self, players: &[Player]);

    /// Record which roster entry is the local player.
    fn set_local_player(&self, player: PlayerId);

    /// Apply a server-pushed ownership/army change to one territory.
    fn update_territory(&self, territory: TerritoryId, owner: PlayerId, armies: i32);
}
