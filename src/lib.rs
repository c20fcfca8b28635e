//! Idle Fortune: an incremental coin game in a browser terminal.
//!
//! `game` holds the progression engine and its persistence; `input`, `time`
//! and `logging` are the host-side plumbing used by the wasm binary.

pub mod game;
pub mod input;
pub mod logging;
pub mod time;
