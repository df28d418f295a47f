//! Protocol Module
//!
//! Defines the wire protocol between catalog clients and the server.
//!
//! ## Protocol Format
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: PING
//! - 0x10..0x14: CREATE / UPDATE / GET / LIST / FIND ingredient
//! - 0x20..0x24: CREATE / UPDATE / GET / LIST / FIND cocktail
//! - 0x30: SEARCH
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: CREATED
//! - 0x02: BAD_REQUEST
//! - 0x03: NOT_FOUND
//! - 0x04: CONFLICT
//! - 0x05: ERROR
//!
//! Success payloads are JSON documents; every other status carries an
//! [`ErrorBody`] `{error, details, code}`.

mod codec;
mod command;
mod response;

pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use command::{Command, CommandType};
pub use response::{
    ErrorBody, Response, Status, ERR_CONFLICT, ERR_DECODE, ERR_INTERNAL, ERR_NOT_FOUND,
    ERR_NO_ACCESS, ERR_VALIDATION,
};
