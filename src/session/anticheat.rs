// src/session/anticheat.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    config::{DEFAULT_FORCED_SUBMIT_GRACE_SECS, DEFAULT_TAB_SWITCH_LIMIT},
    models::submission::SubmitTrigger,
    session::controller::QuizSession,
};

/// Environment signal reported by the participant's browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    /// Page went from visible to hidden (tab switch, minimise, ...).
    VisibilityLost,
    Copy,
    Paste,
    Shortcut(KeyChord),
}

/// A key press together with its modifiers, as seen by a keydown handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyChord {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
}

impl KeyChord {
    pub fn new(key: &str, ctrl: bool, shift: bool) -> Self {
        Self {
            key: key.to_string(),
            ctrl,
            shift,
            alt: false,
        }
    }

    /// F12, Ctrl+Shift+I, Ctrl+Shift+J and Ctrl+U open developer tools or page source.
    pub fn is_restricted(&self) -> bool {
        let key = self.key.to_ascii_uppercase();
        match key.as_str() {
            "F12" => true,
            "I" | "J" => self.ctrl && self.shift,
            "U" => self.ctrl,
            _ => false,
        }
    }
}

/// What the environment should do with the signal that was just observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MonitorAction {
    /// Not relevant, or the session is not active. Let it through.
    Ignored,
    /// Warning raised. `suppress` asks the environment to cancel the action.
    Warned { suppress: bool },
    /// Tab-switch limit reached. Submit after `grace`.
    ForcedSubmitScheduled {
        #[serde(with = "duration_secs")]
        grace: Duration,
    },
}

impl MonitorAction {
    pub fn suppress(&self) -> bool {
        matches!(self, MonitorAction::Warned { suppress: true })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    pub tab_switch_limit: u32,
    pub grace: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tab_switch_limit: DEFAULT_TAB_SWITCH_LIMIT,
            grace: Duration::from_secs(DEFAULT_FORCED_SUBMIT_GRACE_SECS),
        }
    }
}

/// Turns environment signals into warnings and forced-submit requests.
///
/// Holds no per-attempt state: the tab-switch counter lives in the attempt
/// and every change goes through the controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct AntiCheatMonitor {
    config: MonitorConfig,
}

impl AntiCheatMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> MonitorConfig {
        self.config
    }

    pub fn observe(&self, session: &mut QuizSession, signal: &Signal) -> MonitorAction {
        if !session.is_active() {
            return MonitorAction::Ignored;
        }

        match signal {
            Signal::VisibilityLost => self.on_visibility_lost(session),
            Signal::Copy => {
                session.raise_warning("Copying is disabled during the quiz.");
                MonitorAction::Warned { suppress: true }
            }
            Signal::Paste => {
                session.raise_warning("Pasting is disabled during the quiz.");
                MonitorAction::Warned { suppress: true }
            }
            Signal::Shortcut(chord) if chord.is_restricted() => {
                session.raise_warning("Developer tools are disabled during the quiz.");
                MonitorAction::Warned { suppress: true }
            }
            Signal::Shortcut(_) => MonitorAction::Ignored,
        }
    }

    fn on_visibility_lost(&self, session: &mut QuizSession) -> MonitorAction {
        let Some(count) = session.record_tab_switch() else {
            return MonitorAction::Ignored;
        };
        let limit = self.config.tab_switch_limit;

        if count < limit {
            session.raise_warning(&format!(
                "Tab switch detected ({}/{}). Your quiz will be submitted automatically after {} switches.",
                count, limit, limit
            ));
            return MonitorAction::Warned { suppress: false };
        }

        session.raise_warning("Tab switch limit reached. Your quiz is being submitted.");

        if session.request_forced_submit(SubmitTrigger::AntiCheat) {
            tracing::warn!(
                "Tab switch limit ({}) reached; forced submit in {:?}",
                limit,
                self.config.grace
            );
            MonitorAction::ForcedSubmitScheduled {
                grace: self.config.grace,
            }
        } else {
            MonitorAction::Warned { suppress: false }
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}
