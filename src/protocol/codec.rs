//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Payload by Command Type
//! - CREATE_* / UPDATE_*: JSON record
//! - GET_*:               record id (UTF-8)
//! - FIND_* / SEARCH:     query (UTF-8, may be empty)
//! - LIST_* / PING:       empty
//!
//! Framing problems (short header, unknown command, oversize payload) are
//! [`BarkeepError::Protocol`]; a well-framed payload that cannot be parsed
//! is [`BarkeepError::Decode`].

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};
use serde::de::DeserializeOwned;

use super::{Command, CommandType, Response, Status};
use crate::error::{BarkeepError, Result};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

fn frame(kind: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    buf.put_u8(kind);
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.to_vec()
}

fn parse_header(bytes: &[u8], what: &str, max: usize) -> Result<(u8, usize)> {
    if bytes.len() < HEADER_SIZE {
        return Err(BarkeepError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    if payload_len > max {
        return Err(BarkeepError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, payload_len, max
        )));
    }

    Ok((bytes[0], payload_len))
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    let payload = match command {
        Command::CreateIngredient(ingredient) | Command::UpdateIngredient(ingredient) => {
            to_json(ingredient)?
        }
        Command::CreateCocktail(cocktail) | Command::UpdateCocktail(cocktail) => {
            to_json(cocktail)?
        }
        Command::GetIngredient { id } | Command::GetCocktail { id } => id.as_bytes().to_vec(),
        Command::FindIngredients { query }
        | Command::FindCocktails { query }
        | Command::Search { query } => query.as_bytes().to_vec(),
        Command::Ping | Command::ListIngredients | Command::ListCocktails => Vec::new(),
    };

    Ok(frame(command.command_type() as u8, &payload))
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_byte, payload_len) = parse_header(bytes, "Command", MAX_PAYLOAD_SIZE as usize)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(BarkeepError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    let cmd_type = CommandType::from_u8(cmd_byte).ok_or_else(|| {
        BarkeepError::Protocol(format!("Unknown command type: 0x{:02x}", cmd_byte))
    })?;

    decode_payload(cmd_type, &bytes[HEADER_SIZE..total_len])
}

fn decode_payload(cmd_type: CommandType, payload: &[u8]) -> Result<Command> {
    let command = match cmd_type {
        CommandType::Ping => {
            expect_empty("PING", payload)?;
            Command::Ping
        }
        CommandType::CreateIngredient => Command::CreateIngredient(from_json(payload)?),
        CommandType::UpdateIngredient => Command::UpdateIngredient(from_json(payload)?),
        CommandType::GetIngredient => Command::GetIngredient {
            id: utf8("GET_INGREDIENT", payload)?,
        },
        CommandType::ListIngredients => {
            expect_empty("LIST_INGREDIENTS", payload)?;
            Command::ListIngredients
        }
        CommandType::FindIngredients => Command::FindIngredients {
            query: utf8("FIND_INGREDIENTS", payload)?,
        },
        CommandType::CreateCocktail => Command::CreateCocktail(from_json(payload)?),
        CommandType::UpdateCocktail => Command::UpdateCocktail(from_json(payload)?),
        CommandType::GetCocktail => Command::GetCocktail {
            id: utf8("GET_COCKTAIL", payload)?,
        },
        CommandType::ListCocktails => {
            expect_empty("LIST_COCKTAILS", payload)?;
            Command::ListCocktails
        }
        CommandType::FindCocktails => Command::FindCocktails {
            query: utf8("FIND_COCKTAILS", payload)?,
        },
        CommandType::Search => Command::Search {
            query: utf8("SEARCH", payload)?,
        },
    };
    Ok(command)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| BarkeepError::Encode(e.to_string()))
}

fn from_json<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    serde_json::from_slice(payload)
        .map_err(|e| BarkeepError::Decode(format!("invalid request body: {}", e)))
}

fn utf8(name: &str, payload: &[u8]) -> Result<String> {
    String::from_utf8(payload.to_vec())
        .map_err(|e| BarkeepError::Decode(format!("{} command: {}", name, e)))
}

fn expect_empty(name: &str, payload: &[u8]) -> Result<()> {
    if !payload.is_empty() {
        return Err(BarkeepError::Decode(format!(
            "{} command: unexpected payload of {} bytes",
            name,
            payload.len()
        )));
    }
    Ok(())
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    frame(
        response.status as u8,
        response.payload.as_deref().unwrap_or(&[]),
    )
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload_len) =
        parse_header(bytes, "Response", MAX_PAYLOAD_SIZE as usize)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(BarkeepError::Protocol(format!(
            "Incomplete response payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    let status = Status::from_u8(status_byte).ok_or_else(|| {
        BarkeepError::Protocol(format!("Unknown response status: 0x{:02x}", status_byte))
    })?;

    let payload = if payload_len > 0 {
        Some(bytes[HEADER_SIZE..total_len].to_vec())
    } else {
        None
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

fn read_frame<R: Read>(reader: &mut R, what: &str, max: usize) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let (_, payload_len) = parse_header(&header, what, max)?;

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    reader.read_exact(&mut message[HEADER_SIZE..])?;

    Ok(message)
}

/// Read a complete command from a stream
///
/// Payloads larger than `max_payload` are rejected before being read; the
/// stream cannot be resynchronized afterwards.
pub fn read_command<R: Read>(reader: &mut R, max_payload: usize) -> Result<Command> {
    let message = read_frame(reader, "Command", max_payload)?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader, "Response", MAX_PAYLOAD_SIZE as usize)?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
