// Outbound half of the server connection.
//
// One method per client-originated wire kind. Every send encodes via
// `warfront_protocol`, writes, and flushes, so the message is observable
// by the server as soon as the call returns. The buffered writer sits
// behind a mutex: facade calls may arrive from any thread, and one
// message's bytes must never interleave with another's.
//
// Send failures propagate to the caller as `io::Error` — the action
// thread decides what to tell the user. `surrender` is special: it
// closes the connection even when its own write fails.

use std::io::{self, BufWriter, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Mutex;

use log::debug;

use warfront_protocol::TerritoryId;
use warfront_protocol::message::ClientMessage;

/// Write side of the connection. The read side lives in `dispatch.rs`.
pub struct Outbound {
    writer: Mutex<BufWriter<TcpStream>>,
    /// Unbuffered handle kept for shutdown; closing unblocks the reader.
    stream: TcpStream,
}

impl Outbound {
    pub(crate) fn new(stream: TcpStream) -> io::Result<Self> {
        let writer = BufWriter::new(stream.try_clone()?);
        Ok(Self {
            writer: Mutex::new(writer),
            stream,
        })
    }

    /// Encode, write, flush. Serialized by the writer mutex.
    fn send(&self, msg: &ClientMessage) -> io::Result<()> {
        debug!("sending {msg:?}");
        let mut writer = self.writer.lock().expect("outbound writer lock poisoned");
        msg.encode(&mut *writer)?;
        writer.flush()
    }

    /// Ask the server to join (or create) the named game.
    pub fn request_join(&self, game: &str) -> io::Result<()> {
        self.send(&ClientMessage::JoinGame { game: game.into() })
    }

    /// Report the local player's display name.
    pub fn send_player_name(&self, name: &str) -> io::Result<()> {
        self.send(&ClientMessage::PlayerName { name: name.into() })
    }

    /// Signal readiness to start.
    pub fn send_ready(&self) -> io::Result<()> {
        self.send(&ClientMessage::Ready)
    }

    /// End the local player's turn.
    pub fn end_turn(&self) -> io::Result<()> {
        self.send(&ClientMessage::EndTurn)
    }

    /// Attack from `src` to `dest`. Validation (ownership, adjacency)
    /// happens in the facade before this is called.
    pub fn launch_attack(&self, src: TerritoryId, dest: TerritoryId) -> io::Result<()> {
        self.send(&ClientMessage::Attack { src, dest })
    }

    /// Give up and close the connection. The close happens whether or
    /// not the write succeeded; the write error, if any, is returned.
    pub fn surrender(&self) -> io::Result<()> {
        let result = self.send(&ClientMessage::Surrender);
        self.close();
        result
    }

    /// Best-effort close of both connection halves. Failures are
    /// discarded; a close races the peer doing the same.
    pub fn close(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
