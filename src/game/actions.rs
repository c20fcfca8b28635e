//! Action IDs for Idle Fortune click targets.
//!
//! Registered during render, dispatched back through `InputEvent::Click`.

// ── Core ────────────────────────────────────────────────────────
pub const TAP: u16 = 0;

// ── Tabs ────────────────────────────────────────────────────────
pub const TAB_UPGRADES: u16 = 10;
pub const TAB_PRESTIGE: u16 = 11;

// ── Upgrade purchase (base + catalog index) ─────────────────────
pub const BUY_UPGRADE_BASE: u16 = 100;

// ── Prestige ────────────────────────────────────────────────────
pub const PRESTIGE: u16 = 500;

// ── Offline earnings notice ─────────────────────────────────────
pub const DISMISS_OFFLINE: u16 = 900;
