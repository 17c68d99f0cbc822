//! # Controls
//!
//! The abstract HUD the bridge exposes in place of a rendered scene.
//!
//! A driver sees two screens. The map lists one button per level; the level
//! screen has the HUD buttons (reset, check, back) plus the free-form `swap`
//! and `submit_permutation` actions. Buttons are addressed by path, e.g.
//! `hud/check` or `map/level/act1_level03`.

use serde::Serialize;
use symmetria_core::{LevelId, LevelSession};

/// Which screen the driver is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Map,
    Level,
}

/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    ResetArrangement,
    SubmitArrangement,
    BackToMap,
    SelectLevel(LevelId),
}

const HUD_RESET: &str = "hud/reset";
const HUD_CHECK: &str = "hud/check";
const HUD_BACK: &str = "hud/back";
const MAP_LEVEL_PREFIX: &str = "map/level/";

/// One interactable element as reported by `list_actions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionEntry {
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub label: String,
}

impl ActionEntry {
    fn button(path: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action: "press_button",
            path: Some(path.into()),
            label: label.into(),
        }
    }

    fn command(action: &'static str, label: impl Into<String>) -> Self {
        Self {
            action,
            path: None,
            label: label.into(),
        }
    }
}

/// Resolve a button path on the given screen. `None` when the button does
/// not exist there.
#[must_use]
pub fn resolve(screen: Screen, path: &str, session: &LevelSession) -> Option<Control> {
    match screen {
        Screen::Level => match path {
            HUD_RESET => Some(Control::ResetArrangement),
            HUD_CHECK => Some(Control::SubmitArrangement),
            HUD_BACK => Some(Control::BackToMap),
            _ => None,
        },
        Screen::Map => {
            let id = LevelId::new(path.strip_prefix(MAP_LEVEL_PREFIX)?);
            session
                .catalog()
                .contains(&id)
                .then_some(Control::SelectLevel(id))
        }
    }
}

/// Every action available on `screen`.
#[must_use]
pub fn list_actions(screen: Screen, session: &LevelSession) -> Vec<ActionEntry> {
    let mut actions = Vec::new();
    match screen {
        Screen::Level => {
            actions.push(ActionEntry::button(HUD_RESET, "Reset arrangement"));
            actions.push(ActionEntry::button(HUD_CHECK, "Check arrangement"));
            actions.push(ActionEntry::button(HUD_BACK, "Back to map"));
            if let Some(arrangement) = session.arrangement() {
                actions.push(ActionEntry::command(
                    "swap",
                    format!("Swap two of {} slots", arrangement.slot_count()),
                ));
            }
            actions.push(ActionEntry::command(
                "submit_permutation",
                "Submit a full crystal mapping",
            ));
        }
        Screen::Map => {
            for level in session.catalog().iter() {
                actions.push(ActionEntry::button(
                    format!("{}{}", MAP_LEVEL_PREFIX, level.level_id()),
                    level.title(),
                ));
            }
        }
    }
    actions.push(ActionEntry::command("navigate", "Go to map or level"));
    actions
}

// =============================================================================
// TESTS
// =============================================================================
