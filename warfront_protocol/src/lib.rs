// warfront_protocol — wire protocol for the Warfront game server connection.
//
// This crate defines the binary message format spoken between a game
// client and the authoritative game server over a single TCP stream. It
// is pure encode/decode: no sockets, no threads, no session state — the
// client crate (`warfront_client`) owns the connection and drives these
// types.
//
// Module overview:
// - `types.rs`:   ID newtypes — `PlayerId`, `TerritoryId`, `PlayerColor`.
// - `message.rs`: `ClientMessage` / `ServerMessage` enums, one variant
//                 per wire kind, with `encode`/`decode`.
// - `wire.rs`:    Primitive field codec — tag bytes, big-endian `i32`,
//                 one-byte booleans, `u16`-length-prefixed UTF-8 strings.
//
// Design decisions:
// - **Fixed binary layouts, no length prefix.** Each message is a kind
//   tag byte plus a payload whose size is implied by the kind. Framing is
//   therefore only as strong as both sides' kind tables; see the
//   `Unknown` notes in `message.rs`.
// - **Direction-split tag spaces.** Client and server kinds never share a
//   tag value, so neither side's decoder depends on knowing which
//   direction a stream flows.
// - **No async runtime.** Everything works on plain `std::io::Read` /
//   `Write`, compatible with blocking TCP streams, buffered wrappers, and
//   in-memory cursors.

pub mod message;
pub mod types;
pub mod wire;

pub use message::{ClientMessage, ServerMessage};
pub use types::{PlayerColor, PlayerId, TerritoryId};

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// Encode a ClientMessage, decode it back, compare.
    fn client_roundtrip(msg: &ClientMessage) {
        let mut wire = Vec::new();
        msg.encode(&mut wire).unwrap();

        let mut cursor = Cursor::new(&wire);
        let recovered = ClientMessage::decode(&mut cursor).unwrap();
        assert_eq!(&recovered, msg);
        assert_eq!(cursor.position() as usize, wire.len(), "residual bytes");
    }

    /// Encode a ServerMessage, decode it back, compare.
    fn server_roundtrip(msg: &ServerMessage) {
        let mut wire = Vec::new();
        msg.encode(&mut wire).unwrap();

        let mut cursor = Cursor::new(&wire);
        let recovered = ServerMessage::decode(&mut cursor).unwrap();
        assert_eq!(&recovered, msg);
        assert_eq!(cursor.position() as usize, wire.len(), "residual bytes");
    }

    #[test]
    fn roundtrip_join_game() {
        client_roundtrip(&ClientMessage::JoinGame {
            game: "highlands".into(),
        });
    }

    #[test]
    fn roundtrip_join_game_empty_name() {
        client_roundtrip(&ClientMessage::JoinGame { game: "".into() });
    }

    #[test]
    fn roundtrip_player_name() {
        client_roundtrip(&ClientMessage::PlayerName {
            name: "Alice".into(),
        });
    }

    #[test]
    fn roundtrip_ready() {
        client_roundtrip(&ClientMessage::Ready);
    }

    #[test]
    fn roundtrip_end_turn() {
        client_roundtrip(&ClientMessage::EndTurn);
    }

    #[test]
    fn roundtrip_attack() {
        client_roundtrip(&ClientMessage::Attack {
            src: TerritoryId(3),
            dest: TerritoryId(17),
        });
    }

    #[test]
    fn roundtrip_surrender() {
        client_roundtrip(&ClientMessage::Surrender);
    }

    #[test]
    fn roundtrip_game_starting() {
        server_roundtrip(&ServerMessage::GameStarting);
    }

    #[test]
    fn roundtrip_turn_indicator() {
        server_roundtrip(&ServerMessage::TurnIndicator {
            player: PlayerId(0),
        });
    }

    #[test]
    fn roundtrip_attack_made() {
        server_roundtrip(&ServerMessage::AttackMade {
            src: TerritoryId(3),
            dest: TerritoryId(4),
            attack_roll: 18,
            defense_roll: 11,
        });
    }

    #[test]
    fn roundtrip_attack_made_extreme_rolls() {
        server_roundtrip(&ServerMessage::AttackMade {
            src: TerritoryId(0),
            dest: TerritoryId(i32::MAX),
            attack_roll: i32::MIN,
            defense_roll: -1,
        });
    }

    #[test]
    fn roundtrip_territory_status() {
        server_roundtrip(&ServerMessage::TerritoryStatus {
            territory: TerritoryId(9),
            owner: PlayerId(1),
            armies: 12,
        });
    }

    #[test]
    fn roundtrip_player_info() {
        server_roundtrip(&ServerMessage::PlayerInfo {
            player: PlayerId(0),
            color: PlayerColor(0xFF_00_00),
            name: "Alice".into(),
        });
    }

    #[test]
    fn roundtrip_player_info_unicode_name() {
        server_roundtrip(&ServerMessage::PlayerInfo {
            player: PlayerId(2),
            color: PlayerColor(0x00_FF_00),
            name: "Страте́г".into(),
        });
    }

    #[test]
    fn roundtrip_who_am_i() {
        server_roundtrip(&ServerMessage::WhoAmI {
            player: PlayerId(1),
        });
    }

    #[test]
    fn roundtrip_game_finished() {
        server_roundtrip(&ServerMessage::GameFinished {
            winner: PlayerId(2),
        });
    }

    #[test]
    fn roundtrip_join_status() {
        server_roundtrip(&ServerMessage::JoinStatus { name_in_use: true });
        server_roundtrip(&ServerMessage::JoinStatus { name_in_use: false });
    }

    #[test]
    fn unknown_tag_consumes_only_the_tag_byte() {
        let wire = [0xEEu8, 0xAA, 0xBB];
        let mut cursor = Cursor::new(&wire[..]);
        let msg = ServerMessage::decode(&mut cursor).unwrap();
        assert_eq!(msg, ServerMessage::Unknown { tag: 0xEE });
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn unknown_client_tag_is_an_error() {
        let wire = [0xEEu8];
        let err = ClientMessage::decode(&mut Cursor::new(&wire[..])).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    /// A stream of N back-to-back messages decodes as exactly N messages
    /// with no residual bytes and no field leakage between them.
    #[test]
    fn consecutive_messages_frame_cleanly() {
        let messages = vec![
            ServerMessage::PlayerInfo {
                player: PlayerId(0),
                color: PlayerColor(0xFF_00_00),
                name: "Alice".into(),
            },
            ServerMessage::PlayerInfo {
                player: PlayerId(1),
                color: PlayerColor(0x00_00_FF),
                name: "Bob".into(),
            },
            ServerMessage::WhoAmI {
                player: PlayerId(0),
            },
            ServerMessage::GameStarting,
            ServerMessage::TurnIndicator {
                player: PlayerId(0),
            },
            ServerMessage::TerritoryStatus {
                territory: TerritoryId(4),
                owner: PlayerId(1),
                armies: 3,
            },
            ServerMessage::GameFinished {
                winner: PlayerId(1),
            },
        ];

        let mut wire = Vec::new();
        for msg in &messages {
            msg.encode(&mut wire).unwrap();
        }

        let mut cursor = Cursor::new(&wire);
        for expected in &messages {
            let got = ServerMessage::decode(&mut cursor).unwrap();
            assert_eq!(&got, expected);
        }
        assert_eq!(cursor.position() as usize, wire.len());
    }

    /// An unknown kind between two known ones keeps the frame aligned as
    /// long as it carries no payload bytes.
    #[test]
    fn unknown_kind_between_known_messages() {
        let mut wire = Vec::new();
        ServerMessage::TurnIndicator {
            player: PlayerId(1),
        }
        .encode(&mut wire)
        .unwrap();
        wire.push(0x7F); // bare unknown tag
        ServerMessage::GameStarting.encode(&mut wire).unwrap();

        let mut cursor = Cursor::new(&wire);
        assert_eq!(
            ServerMessage::decode(&mut cursor).unwrap(),
            ServerMessage::TurnIndicator {
                player: PlayerId(1)
            }
        );
        assert_eq!(
            ServerMessage::decode(&mut cursor).unwrap(),
            ServerMessage::Unknown { tag: 0x7F }
        );
        assert_eq!(
            ServerMessage::decode(&mut cursor).unwrap(),
            ServerMessage::GameStarting
        );
    }

    #[test]
    fn clean_eof_between_messages_is_unexpected_eof() {
        let err = ServerMessage::decode(&mut Cursor::new([0u8; 0])).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
