// Protocol messages for the client-server game connection.
//
// Two enums define the full protocol vocabulary:
// - `ClientMessage`: sent by the game client to the server.
// - `ServerMessage`: sent by the server to the game client.
//
// Each message is one kind tag byte followed by a positional,
// kind-specific payload (see `wire.rs` for field layouts). There is no
// message length prefix: `decode` consumes exactly the bytes belonging to
// one message and leaves the stream at the next message boundary.
//
// The two directions use disjoint tag spaces (0x01.. outbound, 0x10..
// inbound), so a stream can never be mis-decoded by the wrong side. In
// particular the outbound name report (`PlayerName`) and the inbound
// roster entry (`PlayerInfo`) are distinct kinds with distinct tags.
//
// A server tag with no matching kind decodes to `ServerMessage::Unknown`:
// the tag byte is consumed, no payload is read, and the caller decides
// what to do. With no length prefix the payload of a truly unknown kind
// cannot be skipped, so an unknown tag from a newer server may still
// desynchronize the stream — the client counts and logs these rather
// than failing outright.

use std::io::{self, Read, Write};

use crate::types::{PlayerColor, PlayerId, TerritoryId};
use crate::wire;

// Client→server kind tags.
pub const TAG_GAME_TO_JOIN: u8 = 0x01;
pub const TAG_PLAYER_NAME: u8 = 0x02;
pub const TAG_READY: u8 = 0x03;
pub const TAG_END_TURN: u8 = 0x04;
pub const TAG_ATTACK: u8 = 0x05;
pub const TAG_SURRENDER: u8 = 0x06;

// Server→client kind tags.
pub const TAG_GAME_STARTING: u8 = 0x10;
pub const TAG_TURN_INDICATOR: u8 = 0x11;
pub const TAG_ATTACK_MADE: u8 = 0x12;
pub const TAG_TERRITORY_STATUS: u8 = 0x13;
pub const TAG_PLAYER_INFO: u8 = 0x14;
pub const TAG_WHO_AM_I: u8 = 0x15;
pub const TAG_GAME_FINISHED: u8 = 0x16;
pub const TAG_JOIN_STATUS: u8 = 0x17;

/// Messages sent by the client to the game server.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientMessage {
    /// Name of the game session to join.
    JoinGame { game: String },
    /// The local player's display name.
    PlayerName { name: String },
    /// This player is ready to start.
    Ready,
    /// End the local player's turn.
    EndTurn,
    /// Attack from one territory to an adjacent one.
    Attack { src: TerritoryId, dest: TerritoryId },
    /// Give up; the client closes the connection right after sending this.
    Surrender,
}

/// Messages sent by the game server to the client.
#[derive(Clone, Debug, PartialEq)]
pub enum ServerMessage {
    /// Roster is final, the game begins.
    GameStarting,
    /// Whose turn it is now.
    TurnIndicator { player: PlayerId },
    /// An attack happened; for display only, ownership changes arrive
    /// separately as `TerritoryStatus`.
    AttackMade {
        src: TerritoryId,
        dest: TerritoryId,
        attack_roll: i32,
        defense_roll: i32,
    },
    /// New owner and army size for one territory.
    TerritoryStatus {
        territory: TerritoryId,
        owner: PlayerId,
        armies: i32,
    },
    /// One roster entry.
    PlayerInfo {
        player: PlayerId,
        color: PlayerColor,
        name: String,
    },
    /// The local player's own index. Doubles as the end-of-roster marker:
    /// the server sends it after the last `PlayerInfo`.
    WhoAmI { player: PlayerId },
    /// The game is over; the server closes the connection right after.
    GameFinished { winner: PlayerId },
    /// Whether the requested game name is already in use.
    JoinStatus { name_in_use: bool },
    /// A kind tag this client does not recognize. Only the tag byte was
    /// consumed from the stream.
    Unknown { tag: u8 },
}

impl ClientMessage {
    /// Write this message: kind tag, then payload fields in order.
    pub fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            ClientMessage::JoinGame { game } => {
                wire::write_tag(writer, TAG_GAME_TO_JOIN)?;
                wire::write_string(writer, game)
            }
            ClientMessage::PlayerName { name } => {
                wire::write_tag(writer, TAG_PLAYER_NAME)?;
                wire::write_string(writer, name)
            }
            ClientMessage::Ready => wire::write_tag(writer, TAG_READY),
            ClientMessage::EndTurn => wire::write_tag(writer, TAG_END_TURN),
            ClientMessage::Attack { src, dest } => {
                wire::write_tag(writer, TAG_ATTACK)?;
                wire::write_i32(writer, src.0)?;
                wire::write_i32(writer, dest.0)
            }
            ClientMessage::Surrender => wire::write_tag(writer, TAG_SURRENDER),
        }
    }

    /// Read exactly one client message. Unlike the server direction, an
    /// unknown tag is an `InvalidData` error — the server has no
    /// forward-compatibility obligation toward newer clients.
    pub fn decode<R: Read>(reader: &mut R) -> io::Result<ClientMessage> {
        let tag = wire::read_tag(reader)?;
        match tag {
            TAG_GAME_TO_JOIN => Ok(ClientMessage::JoinGame {
                game: wire::read_string(reader)?,
            }),
            TAG_PLAYER_NAME => Ok(ClientMessage::PlayerName {
                name: wire::read_string(reader)?,
            }),
            TAG_READY => Ok(ClientMessage::Ready),
            TAG_END_TURN => Ok(ClientMessage::EndTurn),
            TAG_ATTACK => Ok(ClientMessage::Attack {
                src: TerritoryId(wire::read_i32(reader)?),
                dest: TerritoryId(wire::read_i32(reader)?),
            }),
            TAG_SURRENDER => Ok(ClientMessage::Surrender),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown client message tag 0x{other:02X}"),
            )),
        }
    }
}

impl ServerMessage {
    /// Write this message: kind tag, then payload fields in order.
    /// `Unknown` writes its bare tag, matching what `decode` consumed.
    pub fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            ServerMessage::GameStarting => wire::write_tag(writer, TAG_GAME_STARTING),
            ServerMessage::TurnIndicator { player } => {
                wire::write_tag(writer, TAG_TURN_INDICATOR)?;
                wire::write_i32(writer, player.0)
            }
            ServerMessage::AttackMade {
                src,
                dest,
                attack_roll,
                defense_roll,
            } => {
                wire::write_tag(writer, TAG_ATTACK_MADE)?;
                wire::write_i32(writer, src.0)?;
                wire::write_i32(writer, dest.0)?;
                wire::write_i32(writer, *attack_roll)?;
                wire::write_i32(writer, *defense_roll)
            }
            ServerMessage::TerritoryStatus {
                territory,
                owner,
                armies,
            } => {
                wire::write_tag(writer, TAG_TERRITORY_STATUS)?;
                wire::write_i32(writer, territory.0)?;
                wire::write_i32(writer, owner.0)?;
                wire::write_i32(writer, *armies)
            }
            ServerMessage::PlayerInfo {
                player,
                color,
                name,
            } => {
                wire::write_tag(writer, TAG_PLAYER_INFO)?;
                wire::write_i32(writer, player.0)?;
                wire::write_i32(writer, color.0 as i32)?;
                wire::write_string(writer, name)
            }
            ServerMessage::WhoAmI { player } => {
                wire::write_tag(writer, TAG_WHO_AM_I)?;
                wire::write_i32(writer, player.0)
            }
            ServerMessage::GameFinished { winner } => {
                wire::write_tag(writer, TAG_GAME_FINISHED)?;
                wire::write_i32(writer, winner.0)
            }
            ServerMessage::JoinStatus { name_in_use } => {
                wire::write_tag(writer, TAG_JOIN_STATUS)?;
                wire::write_bool(writer, *name_in_use)
            }
            ServerMessage::Unknown { tag } => wire::write_tag(writer, *tag),
        }
    }

    /// Read exactly one server message. An unrecognized tag yields
    /// `Unknown { tag }` with no payload bytes consumed.
    pub fn decode<R: Read>(reader: &mut R) -> io::Result<ServerMessage> {
        let tag = wire::read_tag(reader)?;
        match tag {
            TAG_GAME_STARTING => Ok(ServerMessage::GameStarting),
            TAG_TURN_INDICATOR => Ok(ServerMessage::TurnIndicator {
                player: PlayerId(wire::read_i32(reader)?),
            }),
            TAG_ATTACK_MADE => Ok(ServerMessage::AttackMade {
                src: TerritoryId(wire::read_i32(reader)?),
                dest: TerritoryId(wire::read_i32(reader)?),
                attack_roll: wire::read_i32(reader)?,
                defense_roll: wire::read_i32(reader)?,
            }),
            TAG_TERRITORY_STATUS => Ok(ServerMessage::TerritoryStatus {
                territory: TerritoryId(wire::read_i32(reader)?),
                owner: PlayerId(wire::read_i32(reader)?),
                armies: wire::read_i32(reader)?,
            }),
            TAG_PLAYER_INFO => Ok(ServerMessage::PlayerInfo {
                player: PlayerId(wire::read_i32(reader)?),
                color: PlayerColor(wire::read_i32(reader)? as u32),
                name: wire::read_string(reader)?,
            }),
            TAG_WHO_AM_I => Ok(ServerMessage::WhoAmI {
                player: PlayerId(wire::read_i32(reader)?),
            }),
            TAG_GAME_FINISHED => Ok(ServerMessage::GameFinished {
                winner: PlayerId(wire::read_i32(reader)?),
            }),
            TAG_JOIN_STATUS => Ok(ServerMessage::JoinStatus {
                name_in_use: wire::read_bool(reader)?,
            }),
            other => Ok(ServerMessage::Unknown { tag: other }),
        }
    }
}
