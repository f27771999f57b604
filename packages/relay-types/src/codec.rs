//! Text wire format for a single [`Message`].
//!
//! One ASCII line per datagram: `"<total_count>;<sequence_number>;<value>\n"`,
//! e.g. `"7;3;42.5\n"`. No checksum, length prefix or version byte.
//!
//! The value is written with Rust's shortest round-trip float formatting, so
//! `decode(&encode(&m)) == m` for every finite value.

use thiserror::Error;

use crate::message::Message;

/// Receive buffer size shared by sender and receiver.
/// An encoded message is under 40 bytes; 2048 leaves ample headroom.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

const FIELD_SEPARATOR: char = ';';

/// A datagram that could not be read as a [`Message`].
///
/// Always recoverable: the packet is dropped and reception continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("malformed message: payload is not valid UTF-8")]
    NotUtf8,

    #[error("malformed message: expected 3 fields, found {found}")]
    MissingFields { found: usize },

    #[error("malformed message: {field} is not an integer: {raw:?}")]
    InvalidInteger { field: &'static str, raw: String },

    #[error("malformed message: value is not a finite number: {raw:?}")]
    InvalidValue { raw: String },
}

pub fn encode(msg: &Message) -> Vec<u8> {
    format!("{msg}\n").into_bytes()
}

pub fn decode(data: &[u8]) -> Result<Message, CodecError> {
    let text = std::str::from_utf8(data).map_err(|_| CodecError::NotUtf8)?;
    let line = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');

    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    if fields.len() < 3 {
        // "" splits into one empty field; report it as zero fields
        let found = if line.is_empty() { 0 } else { fields.len() };
        return Err(CodecError::MissingFields { found });
    }

    let total_count = parse_integer("total_count", fields[0])?;
    let sequence_number = parse_integer("sequence_number", fields[1])?;
    // inf and NaN parse as f32 but would poison every later smoothing window
    let value = fields[2]
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CodecError::InvalidValue {
            raw: fields[2].to_string(),
        })?;

    Ok(Message {
        total_count,
        sequence_number,
        value,
    })
}

fn parse_integer(field: &'static str, raw: &str) -> Result<u32, CodecError> {
    raw.parse::<u32>().map_err(|_| CodecError::InvalidInteger {
        field,
        raw: raw.to_string(),
    })
}
