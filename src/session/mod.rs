// src/session/mod.rs

//! Core of a quiz attempt: the session state machine, scoring and the
//! anti-cheat monitor. Nothing in here knows about HTTP or rendering.

pub mod anticheat;
pub mod controller;
pub mod countdown;
pub mod error;
pub mod events;
pub mod scoring;

pub use anticheat::{AntiCheatMonitor, KeyChord, MonitorAction, MonitorConfig, Signal};
pub use controller::{QuizSession, SessionSnapshot, SessionState, SubmitOutcome, TickOutcome};
pub use countdown::Countdown;
pub use error::SessionError;
pub use events::{EventLog, NoopObserver, SessionEvent, SessionEventKind, SessionObserver};
