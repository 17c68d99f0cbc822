//! # Command Bridge
//!
//! Turns protocol requests into calls on the one [`LevelSession`] and turns
//! the results back into response records.
//!
//! The bridge is transport-agnostic: the line channel and the HTTP server
//! both hand it one request at a time and write out what it returns.
//!
//! ## Ordering
//!
//! - Requests are handled strictly one at a time, in arrival order.
//! - A request carrying `seq` must have a `seq` greater than the last one
//!   seen, otherwise it is refused with `OutOfOrder` and not executed.
//! - After `quit` every request is refused with `Terminated`.
//!
//! Every protocol error is also appended to the event log as an `error`
//! event, so a driver that only polls `get_events` still sees it.

pub mod controls;
pub mod protocol;
pub mod transport;

use controls::{Control, Screen};
use protocol::{Command, ErrorKind, ProtocolError, RawRequest, Response};
use serde_json::{Value, json};
use symmetria_core::{Event, LevelId, LevelSession, SwapOutcome, Submission};

/// Dispatcher owning the session.
#[derive(Debug)]
pub struct CommandBridge {
    session: LevelSession,
    screen: Screen,
    last_seq: Option<u64>,
    terminated: bool,
}

impl CommandBridge {
    #[must_use]
    pub fn new(session: LevelSession) -> Self {
        Self {
            session,
            screen: Screen::Map,
            last_seq: None,
            terminated: false,
        }
    }

    #[must_use]
    pub fn session(&self) -> &LevelSession {
        &self.session
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// True once `quit` has been processed.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Handle one JSON-encoded request line.
    pub fn handle_line(&mut self, line: &str) -> Response {
        match serde_json::from_str::<RawRequest>(line) {
            Ok(request) => self.handle(request),
            Err(e) => {
                let cursor = self.session.event_cursor();
                let error =
                    ProtocolError::new(ErrorKind::InvalidArgs, format!("malformed request: {}", e));
                self.fail(None, error, cursor)
            }
        }
    }

    /// Handle one request.
    pub fn handle(&mut self, request: RawRequest) -> Response {
        let cursor = self.session.event_cursor();
        let seq = request.seq;

        if self.terminated {
            let error = ProtocolError::new(ErrorKind::Terminated, "session has quit");
            return self.fail(seq, error, cursor);
        }
        if let (Some(seq), Some(last)) = (seq, self.last_seq)
            && seq <= last
        {
            let error = ProtocolError::new(
                ErrorKind::OutOfOrder,
                format!("seq {} is not greater than last seq {}", seq, last),
            );
            return self.fail(Some(seq), error, cursor);
        }
        if seq.is_some() {
            self.last_seq = seq;
        }

        let result = Command::parse(&request.cmd, &request.args).and_then(|command| {
            tracing::debug!(cmd = command.name(), seq = ?seq, "dispatching command");
            self.dispatch(command)
        });
        match result {
            Ok(data) => {
                let events = self.events_since(cursor);
                Response::success(seq, data, events)
            }
            Err(error) => self.fail(seq, error, cursor),
        }
    }

    fn fail(&mut self, seq: Option<u64>, error: ProtocolError, cursor: u64) -> Response {
        if error.kind == ErrorKind::InvariantViolation {
            tracing::error!(seq = ?seq, "invariant violation: {}", error.message);
        } else {
            tracing::debug!(seq = ?seq, kind = %error.kind, "command failed: {}", error.message);
        }
        self.session
            .push_error(error.kind.as_str(), error.message.clone());
        let events = self.events_since(cursor);
        Response::failure(seq, error, events)
    }

    fn events_since(&self, cursor: u64) -> Vec<Value> {
        self.session
            .events_since(cursor)
            .iter()
            .map(event_json)
            .collect()
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    fn dispatch(&mut self, command: Command) -> Result<Value, ProtocolError> {
        match command {
            Command::GetState => Ok(self.state_json()),
            Command::ListActions => Ok(json!({
                "screen": self.screen,
                "actions": controls::list_actions(self.screen, &self.session),
            })),
            Command::PressButton { path } => self.press_button(&path),
            Command::LoadLevel { level_id } => self.load_level(&level_id),
            Command::SubmitPermutation { mapping } => {
                let submission = self.session.submit_permutation(&mapping)?;
                Ok(self.submission_json(&submission))
            }
            Command::Swap { a, b } => self.swap(a, b),
            Command::GetEvents => {
                let batch = self.session.drain_events();
                Ok(json!({
                    "events": batch.events.iter().map(event_json).collect::<Vec<_>>(),
                    "dropped": batch.dropped,
                }))
            }
            Command::GetMapState => Ok(self.map_json()),
            Command::Navigate { destination } => self.navigate(&destination),
            Command::Quit => {
                self.terminated = true;
                tracing::info!("quit received, bridge terminated");
                Ok(json!({ "terminated": true }))
            }
        }
    }

    fn load_level(&mut self, level_id: &LevelId) -> Result<Value, ProtocolError> {
        self.session.load_level(level_id)?;
        self.screen = Screen::Level;
        tracing::info!(level = %level_id, "level loaded");
        Ok(self.state_json())
    }

    fn swap(&mut self, a: i64, b: i64) -> Result<Value, ProtocolError> {
        let slot_count = self
            .session
            .arrangement()
            .map(|arrangement| arrangement.slot_count())
            .ok_or_else(|| ProtocolError::from(symmetria_core::SymmetriaError::NoLevelLoaded))?;
        let to_slot = |raw: i64| {
            usize::try_from(raw).map_err(|_| {
                ProtocolError::new(
                    ErrorKind::InvalidSlot,
                    format!("Invalid slot {} (level has {} slots)", raw, slot_count),
                )
            })
        };
        let outcome = self.session.swap(to_slot(a)?, to_slot(b)?)?;
        let arrangement = self
            .session
            .arrangement()
            .map(|arrangement| arrangement.slots().to_vec())
            .unwrap_or_default();
        Ok(json!({
            "swapped": outcome == SwapOutcome::Swapped,
            "arrangement": arrangement,
        }))
    }

    fn press_button(&mut self, path: &str) -> Result<Value, ProtocolError> {
        let control = controls::resolve(self.screen, path, &self.session).ok_or_else(|| {
            ProtocolError::new(
                ErrorKind::InvalidArgs,
                format!("no button '{}' on the {:?} screen", path, self.screen),
            )
        })?;
        match control {
            Control::ResetArrangement => {
                self.session.reset_arrangement()?;
                Ok(self.state_json())
            }
            Control::SubmitArrangement => {
                let submission = self.session.submit_arrangement()?;
                Ok(self.submission_json(&submission))
            }
            Control::BackToMap => {
                self.screen = Screen::Map;
                Ok(self.map_json())
            }
            Control::SelectLevel(level_id) => self.load_level(&level_id),
        }
    }

    fn navigate(&mut self, destination: &str) -> Result<Value, ProtocolError> {
        match destination {
            "map" => {
                self.screen = Screen::Map;
                Ok(self.map_json())
            }
            "level" => {
                let level_id = self
                    .session
                    .level_id()
                    .cloned()
                    .ok_or_else(|| ProtocolError::from(symmetria_core::SymmetriaError::NoLevelLoaded))?;
                self.screen = Screen::Level;
                Ok(self.completion_json(&level_id))
            }
            other => match other.strip_prefix("level:") {
                Some(id) => {
                    let level_id = LevelId::new(id);
                    self.session.load_level(&level_id)?;
                    self.screen = Screen::Level;
                    Ok(self.completion_json(&level_id))
                }
                None => Err(ProtocolError::new(
                    ErrorKind::InvalidArgs,
                    format!(
                        "unknown destination '{}' (expected map, level or level:<id>)",
                        other
                    ),
                )),
            },
        }
    }

    // =========================================================================
    // RESPONSE DATA
    // =========================================================================

    fn state_json(&self) -> Value {
        json!({
            "screen": self.screen,
            "session": self.session.snapshot(),
        })
    }

    fn map_json(&self) -> Value {
        let progress = self.session.progress();
        json!({
            "screen": self.screen,
            "current_level": self.session.level_id(),
            "completed": progress.completed_count(),
            "levels": progress.entries(),
        })
    }

    fn completion_json(&self, level_id: &LevelId) -> Value {
        let progress = self.session.progress().get(level_id);
        json!({
            "screen": self.screen,
            "level_id": level_id,
            "complete": progress.is_some_and(|p| p.complete),
            "subgroup_found": progress.is_some_and(|p| p.subgroup_found),
            "state": self.session.state(),
        })
    }

    fn submission_json(&self, submission: &Submission) -> Value {
        json!({
            "accepted": submission.is_accepted(),
            "submission": submission,
            "state": self.session.state(),
        })
    }
}

fn event_json(event: &Event) -> Value {
    serde_json::to_value(event).unwrap_or_else(|e| {
        json!({ "type": "error", "kind": "InvariantViolation", "message": e.to_string() })
    })
}

// =============================================================================
// TESTS
// =============================================================================
