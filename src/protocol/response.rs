//! Response definitions
//!
//! Represents responses to clients.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{BarkeepError, Result};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Created = 0x01,
    BadRequest = 0x02,
    NotFound = 0x03,
    Conflict = 0x04,
    Error = 0x05,
}

impl Status {
    /// Parse a wire byte
    pub fn from_u8(byte: u8) -> Option<Self> {
        let status = match byte {
            0x00 => Status::Ok,
            0x01 => Status::Created,
            0x02 => Status::BadRequest,
            0x03 => Status::NotFound,
            0x04 => Status::Conflict,
            0x05 => Status::Error,
            _ => return None,
        };
        Some(status)
    }

    pub fn is_success(self) -> bool {
        matches!(self, Status::Ok | Status::Created)
    }
}

// Error codes for client-side classification
pub const ERR_INTERNAL: u8 = 0; // any internal error
pub const ERR_DECODE: u8 = 1; // failed to unmarshal incoming request
pub const ERR_NO_ACCESS: u8 = 2; // rejected by auth
pub const ERR_VALIDATION: u8 = 3; // failed to validate request
pub const ERR_NOT_FOUND: u8 = 4; // no record with that id
pub const ERR_CONFLICT: u8 = 5; // id already taken

/// JSON body of every non-success response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
    pub code: u8,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (JSON document)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create a response carrying `value` as JSON
    pub fn json<T: Serialize>(status: Status, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => Self {
                status,
                payload: Some(bytes),
            },
            Err(e) => Self::error(Status::Error, ERR_INTERNAL, &e.to_string(), "can't encode response"),
        }
    }

    /// Create an error response with a JSON [`ErrorBody`]
    pub fn error(status: Status, code: u8, error: &str, details: &str) -> Self {
        let body = ErrorBody {
            error: error.to_string(),
            details: details.to_string(),
            code,
        };
        Self {
            status,
            // ErrorBody is plain strings and a number
            payload: serde_json::to_vec(&body).ok(),
        }
    }

    /// Create a BAD_REQUEST response for a request that could not be decoded
    pub fn bad_request(error: &BarkeepError) -> Self {
        Self::error(Status::BadRequest, ERR_DECODE, &error.to_string(), "can't decode request")
    }

    /// Map a service error to the response a client sees
    ///
    /// Client-caused failures keep their message; server-side failures are
    /// reported as a generic internal error.
    pub fn from_error(error: &BarkeepError, details: &str) -> Self {
        let (status, code) = match error {
            BarkeepError::Validation(_) => (Status::BadRequest, ERR_VALIDATION),
            BarkeepError::Protocol(_) => (Status::BadRequest, ERR_DECODE),
            BarkeepError::NotFound { .. } => (Status::NotFound, ERR_NOT_FOUND),
            BarkeepError::DuplicateKey { .. } => (Status::Conflict, ERR_CONFLICT),
            _ => (Status::Error, ERR_INTERNAL),
        };

        if error.is_client_error() {
            Self::error(status, code, &error.to_string(), details)
        } else {
            Self::error(status, code, "internal error", details)
        }
    }

    /// Decode the payload as JSON
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T> {
        let payload = self.payload.as_deref().unwrap_or(b"null");
        serde_json::from_slice(payload)
            .map_err(|e| BarkeepError::Decode(format!("invalid response payload: {}", e)))
    }

    /// The error body, if this is an error response
    pub fn error_body(&self) -> Option<ErrorBody> {
        if self.status.is_success() {
            return None;
        }
        self.decode_json().ok()
    }
}
