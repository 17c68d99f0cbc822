//! # Wire Protocol
//!
//! JSON records exchanged with external drivers.
//!
//! ```text
//! → {"seq": 3, "cmd": "swap", "args": {"a": 0, "b": 2}}
//! ← {"seq": 3, "ok": true, "status": "OK", "data": {...}, "events": [...]}
//! ← {"seq": 4, "ok": false, "status": "InvalidSlot",
//!    "error": {"kind": "InvalidSlot", "message": "..."}, "events": [...]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use symmetria_core::{CrystalId, LevelId, SymmetriaError};

// =============================================================================
// REQUEST
// =============================================================================

/// A request as it arrives on the wire, before argument parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRequest {
    #[serde(default)]
    pub seq: Option<u64>,
    pub cmd: String,
    #[serde(default)]
    pub args: Value,
}

impl RawRequest {
    #[must_use]
    pub fn new(cmd: impl Into<String>, args: Value) -> Self {
        Self {
            seq: None,
            cmd: cmd.into(),
            args,
        }
    }

    #[must_use]
    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = Some(seq);
        self
    }
}

/// A fully parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetState,
    ListActions,
    PressButton { path: String },
    LoadLevel { level_id: LevelId },
    SubmitPermutation { mapping: BTreeMap<CrystalId, CrystalId> },
    Swap { a: i64, b: i64 },
    GetEvents,
    GetMapState,
    Navigate { destination: String },
    Quit,
}

#[derive(Deserialize)]
struct PathArgs {
    path: String,
}

#[derive(Deserialize)]
struct LoadLevelArgs {
    level_id: String,
}

#[derive(Deserialize)]
struct SubmitArgs {
    mapping: BTreeMap<String, u32>,
}

/// A mapping key must be a crystal id in canonical decimal form, so that
/// `"0"`, `"00"` and `" 0"` can never name the same crystal twice.
fn crystal_key(key: &str) -> Result<CrystalId, ProtocolError> {
    match key.parse::<u32>() {
        Ok(id) if id.to_string() == key => Ok(CrystalId(id)),
        _ => Err(ProtocolError::new(
            ErrorKind::InvalidArgs,
            format!("mapping key '{}' is not a crystal id", key),
        )),
    }
}

#[derive(Deserialize)]
struct SwapArgs {
    a: i64,
    b: i64,
}

#[derive(Deserialize)]
struct NavigateArgs {
    destination: String,
}

fn args_of<T: serde::de::DeserializeOwned>(cmd: &str, args: &Value) -> Result<T, ProtocolError> {
    T::deserialize(args).map_err(|e| {
        ProtocolError::new(
            ErrorKind::InvalidArgs,
            format!("bad arguments for {}: {}", cmd, e),
        )
    })
}

impl Command {
    /// Parse `cmd` and its argument record.
    pub fn parse(cmd: &str, args: &Value) -> Result<Self, ProtocolError> {
        match cmd {
            "get_state" => Ok(Self::GetState),
            "list_actions" => Ok(Self::ListActions),
            "press_button" => {
                let PathArgs { path } = args_of(cmd, args)?;
                Ok(Self::PressButton { path })
            }
            "load_level" => {
                let LoadLevelArgs { level_id } = args_of(cmd, args)?;
                Ok(Self::LoadLevel {
                    level_id: LevelId::new(level_id),
                })
            }
            "submit_permutation" => {
                let SubmitArgs { mapping } = args_of(cmd, args)?;
                let mut parsed = BTreeMap::new();
                for (key, image) in mapping {
                    parsed.insert(crystal_key(&key)?, CrystalId(image));
                }
                Ok(Self::SubmitPermutation { mapping: parsed })
            }
            "swap" => {
                let SwapArgs { a, b } = args_of(cmd, args)?;
                Ok(Self::Swap { a, b })
            }
            "get_events" => Ok(Self::GetEvents),
            "get_map_state" => Ok(Self::GetMapState),
            "navigate" => {
                let NavigateArgs { destination } = args_of(cmd, args)?;
                Ok(Self::Navigate { destination })
            }
            "quit" => Ok(Self::Quit),
            other => Err(ProtocolError::new(
                ErrorKind::UnknownCommand,
                format!("unknown command '{}'", other),
            )),
        }
    }

    /// Wire name of the command.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetState => "get_state",
            Self::ListActions => "list_actions",
            Self::PressButton { .. } => "press_button",
            Self::LoadLevel { .. } => "load_level",
            Self::SubmitPermutation { .. } => "submit_permutation",
            Self::Swap { .. } => "swap",
            Self::GetEvents => "get_events",
            Self::GetMapState => "get_map_state",
            Self::Navigate { .. } => "navigate",
            Self::Quit => "quit",
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Protocol error kinds, as they appear in `status` and `error.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    InvalidArgs,
    InvalidSlot,
    NoLevelLoaded,
    UnknownCommand,
    OutOfOrder,
    Terminated,
    InvariantViolation,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidArgs => "InvalidArgs",
            Self::InvalidSlot => "InvalidSlot",
            Self::NoLevelLoaded => "NoLevelLoaded",
            Self::UnknownCommand => "UnknownCommand",
            Self::OutOfOrder => "OutOfOrder",
            Self::Terminated => "Terminated",
            Self::InvariantViolation => "InvariantViolation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed protocol error. Returned in the response and mirrored into the
/// event log as an `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProtocolError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<SymmetriaError> for ProtocolError {
    fn from(err: SymmetriaError) -> Self {
        let kind = match &err {
            SymmetriaError::LevelNotFound(_) => ErrorKind::NotFound,
            SymmetriaError::InvalidSlot { .. } => ErrorKind::InvalidSlot,
            SymmetriaError::NoLevelLoaded => ErrorKind::NoLevelLoaded,
            SymmetriaError::InvalidLevel { .. } | SymmetriaError::EnumerationLimit { .. } => {
                ErrorKind::InvalidArgs
            }
            SymmetriaError::InvariantViolation(_)
            | SymmetriaError::SerializationError(_)
            | SymmetriaError::IoError(_) => ErrorKind::InvariantViolation,
        };
        Self::new(kind, err.to_string())
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// Status string of a successful response.
pub const STATUS_OK: &str = "OK";

/// A response record. `events` holds every event emitted while the request
/// was handled, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub seq: Option<u64>,
    pub ok: bool,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProtocolError>,
    #[serde(default)]
    pub events: Vec<Value>,
}

impl Response {
    #[must_use]
    pub fn success(seq: Option<u64>, data: Value, events: Vec<Value>) -> Self {
        Self {
            seq,
            ok: true,
            status: STATUS_OK.to_string(),
            data: Some(data),
            error: None,
            events,
        }
    }

    #[must_use]
    pub fn failure(seq: Option<u64>, error: ProtocolError, events: Vec<Value>) -> Self {
        Self {
            seq,
            ok: false,
            status: error.kind.as_str().to_string(),
            data: None,
            error: Some(error),
            events,
        }
    }

    /// Error kind of a failed response.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

// =============================================================================
// TESTS
// =============================================================================
