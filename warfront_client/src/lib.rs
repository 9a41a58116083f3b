// warfront_client — client-side network layer for the Warfront strategy
// game.
//
// Connects the local UI and board cache to the authoritative game server
// over one persistent TCP stream: UI actions become outbound protocol
// messages, inbound messages become state updates and UI notifications.
// Wire format lives in `warfront_protocol`; this crate owns the
// connection, the session state machine, and the two threads that drive
// them.
//
// Module overview:
// - `state.rs`:    `SessionState` + `Phase` machine and the pure
//                  `apply_message` reducer producing collaborator
//                  `Effect`s.
// - `dispatch.rs`: background reader loop — blocking decode, reducer
//                  application under the state lock, effect delivery,
//                  error taxonomy, socket close.
// - `outbound.rs`: write half — one send per outbound kind, serialized
//                  by a writer mutex, flush per message.
// - `client.rs`:   `GameClient` facade — connect/teardown lifecycle,
//                  click-selection rule, validated actions, queries.
// - `ui.rs`:       `GameUi` / `BoardModel` collaborator traits the
//                  embedding application implements.
//
// Concurrency model: exactly two threads per connection. The reader
// thread is the only writer of session state (apart from the facade's
// join-status reset); collaborator callbacks are always invoked with no
// internal locks held. There is no reconnect and no retry — any
// connection failure is terminal for the session.

pub mod client;
pub mod outbound;
pub mod state;
pub mod ui;

mod dispatch;

pub use client::{ClientConfig, GameClient};
pub use state::{JoinStatus, Phase, Player, SessionState};
pub use ui::{BoardModel, GameUi};
