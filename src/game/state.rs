/// Idle Fortune game state definitions.

use serde::{Deserialize, Serialize};

/// Lifetime coins required before a prestige is allowed.
pub const PRESTIGE_THRESHOLD: f64 = 10_000.0;

/// Permanent multiplier gained per prestige point.
pub const PRESTIGE_BONUS_PER_POINT: f64 = 0.1;

/// Reference tick cadence of the host timer (100ms per tick).
pub const TICKS_PER_SECOND: u32 = 10;

/// Seconds of game time covered by one reference tick.
pub const TICK_SECONDS: f64 = 1.0 / TICKS_PER_SECOND as f64;

/// How an upgrade's levels feed into the economy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    /// Adds a flat amount of coins per second per level.
    Production,
    /// Adds to the production rate multiplier per level.
    Multiplier,
    /// Adds to the coins yielded by each tap per level.
    Click,
}

/// An upgrade template together with the current run's progress (`level`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upgrade {
    pub id: String,
    pub name: String,
    pub description: String,
    pub base_cost: f64,
    /// Per-level cost growth factor (always > 1).
    pub cost_multiplier: f64,
    pub base_effect: f64,
    pub level: u32,
    pub max_level: u32,
    /// Lifetime coins needed before the upgrade is shown as purchasable.
    pub unlock_at: f64,
    #[serde(rename = "type")]
    pub kind: UpgradeKind,
    pub icon: String,
}

impl Upgrade {
    #[allow(clippy::too_many_arguments)]
    fn template(
        id: &str,
        name: &str,
        description: &str,
        base_cost: f64,
        cost_multiplier: f64,
        base_effect: f64,
        max_level: u32,
        unlock_at: f64,
        kind: UpgradeKind,
        icon: &str,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            base_cost,
            cost_multiplier,
            base_effect,
            level: 0,
            max_level,
            unlock_at,
            kind,
            icon: icon.into(),
        }
    }

    /// Whether no further levels can be bought.
    pub fn is_maxed(&self) -> bool {
        self.level >= self.max_level
    }

    /// Effect contributed by the levels bought so far.
    pub fn total_effect(&self) -> f64 {
        self.base_effect * self.level as f64
    }
}

/// The fixed upgrade catalog, every entry at level 0.
///
/// Order and ids are part of the save format; never reorder or reuse an id.
pub fn catalog() -> Vec<Upgrade> {
    vec![
        Upgrade::template(
            "auto-clicker",
            "Auto Clicker",
            "+1 coin/s",
            10.0,
            1.15,
            1.0,
            100,
            0.0,
            UpgradeKind::Production,
            "⚡",
        ),
        Upgrade::template(
            "gold-mine",
            "Gold Mine",
            "+5 coins/s",
            100.0,
            1.2,
            5.0,
            50,
            50.0,
            UpgradeKind::Production,
            "⛏",
        ),
        Upgrade::template(
            "factory",
            "Factory",
            "+25 coins/s",
            500.0,
            1.25,
            25.0,
            30,
            300.0,
            UpgradeKind::Production,
            "🏭",
        ),
        Upgrade::template(
            "bank",
            "Bank",
            "+100 coins/s",
            2_000.0,
            1.3,
            100.0,
            20,
            1_000.0,
            UpgradeKind::Production,
            "🏦",
        ),
        Upgrade::template(
            "click-power",
            "Click Power",
            "+1 per tap",
            50.0,
            1.5,
            1.0,
            50,
            25.0,
            UpgradeKind::Click,
            "👆",
        ),
        Upgrade::template(
            "multiplier",
            "Multiplier",
            "x1.5 production",
            1_000.0,
            2.0,
            0.5,
            10,
            500.0,
            UpgradeKind::Multiplier,
            "✨",
        ),
    ]
}

/// Full state of an Idle Fortune session.
///
/// `coins_per_second` and `click_power` are caches of
/// [`production_rate`](super::logic::production_rate) and
/// [`click_yield`](super::logic::click_yield). Every engine command keeps them
/// fresh; code that edits `upgrades` or `prestige_multiplier` directly must call
/// [`recompute_derived`](super::logic::recompute_derived) afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Spendable coins.
    pub coins: f64,
    /// Coins earned during the current run (taps + passive). Never reduced by spending.
    pub total_coins: f64,
    pub coins_per_second: f64,
    pub click_power: f64,
    /// Permanent, survives prestige.
    pub prestige_points: u64,
    /// Permanent, derived from `prestige_points`.
    pub prestige_multiplier: f64,
    /// Permanent count of completed prestiges.
    pub total_prestiges: u64,
    pub upgrades: Vec<Upgrade>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            coins: 0.0,
            total_coins: 0.0,
            coins_per_second: 0.0,
            click_power: 1.0,
            prestige_points: 0,
            prestige_multiplier: 1.0,
            total_prestiges: 0,
            upgrades: catalog(),
        }
    }

    pub fn upgrade(&self, id: &str) -> Option<&Upgrade> {
        self.upgrades.iter().find(|u| u.id == id)
    }

    pub fn upgrade_index(&self, id: &str) -> Option<usize> {
        self.upgrades.iter().position(|u| u.id == id)
    }

    /// Sum of `base_effect × level` over upgrades of the given kind.
    pub fn effect_sum(&self, kind: UpgradeKind) -> f64 {
        self.upgrades
            .iter()
            .filter(|u| u.kind == kind)
            .map(Upgrade::total_effect)
            .sum()
    }
}
