// Primitive field codec for the Warfront wire protocol.
//
// Every message on the wire is a sequence of fixed-layout fields: a
// one-byte kind tag, big-endian `i32` integers, one-byte booleans, and
// length-prefixed UTF-8 strings (`u16` big-endian byte count, then the
// bytes). There is no per-message length prefix — payload size is implied
// by the kind tag — so these helpers are the only place field layout is
// defined. `message.rs` composes them into whole messages.
//
// All helpers operate on plain `std::io::Read` / `Write`, so they work
// against a `TcpStream`, a `BufReader`, or an in-memory `Cursor` in tests.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

/// Maximum encodable string payload: the length prefix is a `u16`.
pub const MAX_STRING_BYTES: usize = u16::MAX as usize;

/// Write a one-byte kind tag.
pub fn write_tag<W: Write>(writer: &mut W, tag: u8) -> io::Result<()> {
    writer.write_u8(tag)
}

/// Read a one-byte kind tag. `UnexpectedEof` here means the peer closed
/// the stream cleanly between messages.
pub fn read_tag<R: Read>(reader: &mut R) -> io::Result<u8> {
    reader.read_u8()
}

/// Write a big-endian `i32` field.
pub fn write_i32<W: Write>(writer: &mut W, value: i32) -> io::Result<()> {
    writer.write_i32::<BigEndian>(value)
}

/// Read a big-endian `i32` field.
pub fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    reader.read_i32::<BigEndian>()
}

/// Write a boolean as a single byte (0 = false, 1 = true).
pub fn write_bool<W: Write>(writer: &mut W, value: bool) -> io::Result<()> {
    writer.write_u8(u8::from(value))
}

/// Read a single-byte boolean. Any nonzero byte reads as `true`.
pub fn read_bool<R: Read>(reader: &mut R) -> io::Result<bool> {
    Ok(reader.read_u8()? != 0)
}

/// Write a length-prefixed UTF-8 string: `u16` big-endian byte count,
/// then the bytes. Returns `InvalidInput` if the string does not fit the
/// prefix.
pub fn write_string<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    let bytes = value.as_bytes();
    if bytes.len() > MAX_STRING_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("string too long: {} bytes (max {MAX_STRING_BYTES})", bytes.len()),
        ));
    }
    #[expect(clippy::cast_possible_truncation)]
    let len = bytes.len() as u16;
    writer.write_u16::<BigEndian>(len)?;
    writer.write_all(bytes)
}

/// Read a length-prefixed UTF-8 string. Returns `InvalidData` if the
/// bytes are not valid UTF-8.
pub fn read_string<R: Read>(reader: &mut R) -> io::Result<String> {
    let len = reader.read_u16::<BigEndian>()? as usize;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
