//! Idle Fortune progression rules as pure functions over `GameState`.

use log::{debug, info};

use super::state::{
    catalog, GameState, Upgrade, UpgradeKind, PRESTIGE_BONUS_PER_POINT, PRESTIGE_THRESHOLD,
};

/// Minimum time away (seconds) before offline earnings are worth reporting.
pub const OFFLINE_REPORT_MIN_SECONDS: f64 = 10.0;

/// What the player earned while the game was closed.
#[derive(Clone, Debug, PartialEq)]
pub struct OfflineReport {
    pub seconds_away: f64,
    pub earnings: f64,
}

// ── Derived values ──────────────────────────────────────────────

/// Passive coins per second: flat production × (1 + multiplier levels) × prestige.
pub fn production_rate(state: &GameState) -> f64 {
    let base = state.effect_sum(UpgradeKind::Production);
    let mult = 1.0 + state.effect_sum(UpgradeKind::Multiplier);
    base * mult * state.prestige_multiplier
}

/// Coins yielded by one tap.
pub fn click_yield(state: &GameState) -> f64 {
    (1.0 + state.effect_sum(UpgradeKind::Click)) * state.prestige_multiplier
}

/// Price of the next level, using the upgrade's current level.
pub fn purchase_cost(upgrade: &Upgrade) -> f64 {
    (upgrade.base_cost * upgrade.cost_multiplier.powi(upgrade.level as i32)).floor()
}

/// Prestige points a prestige right now would award. No side effects.
pub fn prestige_yield(state: &GameState) -> u64 {
    (state.total_coins / PRESTIGE_THRESHOLD).sqrt().floor() as u64
}

pub fn prestige_multiplier_for(points: u64) -> f64 {
    1.0 + points as f64 * PRESTIGE_BONUS_PER_POINT
}

/// Multiplier the player would have after prestiging now.
pub fn preview_multiplier(state: &GameState) -> f64 {
    prestige_multiplier_for(state.prestige_points.saturating_add(prestige_yield(state)))
}

pub fn can_prestige(state: &GameState) -> bool {
    state.total_coins >= PRESTIGE_THRESHOLD
}

pub fn is_unlocked(state: &GameState, upgrade: &Upgrade) -> bool {
    state.total_coins >= upgrade.unlock_at
}

pub fn can_afford(state: &GameState, upgrade: &Upgrade) -> bool {
    state.coins >= purchase_cost(upgrade)
}

/// Refresh the cached rate and click power from the upgrade levels.
pub fn recompute_derived(state: &mut GameState) {
    state.coins_per_second = production_rate(state);
    state.click_power = click_yield(state);
}

// ── Commands ────────────────────────────────────────────────────

/// Add earned coins to both the wallet and the run total.
///
/// Positive overflow saturates at `f64::MAX`; NaN means the state is corrupt.
fn credit(state: &mut GameState, amount: f64) {
    assert!(!amount.is_nan(), "NaN coin credit (cps={})", state.coins_per_second);
    if amount <= 0.0 {
        return;
    }
    state.coins = (state.coins + amount).min(f64::MAX);
    state.total_coins = (state.total_coins + amount).min(f64::MAX);
}

/// Manual tap: add the current click power. Never throttled.
pub fn tap(state: &mut GameState) {
    let power = state.click_power;
    credit(state, power);
}

/// Advance passive production by `delta_seconds`.
///
/// Accrual is linear in elapsed time, so one large step equals many small ones.
pub fn tick(state: &mut GameState, delta_seconds: f64) {
    if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
        return;
    }
    let production = state.coins_per_second * delta_seconds;
    credit(state, production);
}

/// Try to buy one level of the upgrade `id`. Returns true if successful.
pub fn purchase_upgrade(state: &mut GameState, id: &str) -> bool {
    let idx = match state.upgrade_index(id) {
        Some(i) => i,
        None => return false,
    };
    if state.upgrades[idx].is_maxed() {
        return false;
    }
    // Cost is taken at the pre-purchase level.
    let cost = purchase_cost(&state.upgrades[idx]);
    if state.coins < cost {
        return false;
    }

    state.coins = (state.coins - cost).max(0.0);
    state.upgrades[idx].level += 1;
    recompute_derived(state);

    debug!(
        "bought {} (level {}) for {}",
        id, state.upgrades[idx].level, cost
    );
    true
}

/// Perform a prestige reset. Returns the number of prestige points earned
/// (0 when the run total is below the threshold and nothing changed).
pub fn prestige(state: &mut GameState) -> u64 {
    if !can_prestige(state) {
        return 0;
    }
    // Award from the run total before it is reset.
    let earned = prestige_yield(state);

    // The yield cast saturates at u64::MAX for astronomically large run totals.
    state.prestige_points = state.prestige_points.saturating_add(earned);
    state.prestige_multiplier = prestige_multiplier_for(state.prestige_points);
    state.total_prestiges += 1;

    state.coins = 0.0;
    state.total_coins = 0.0;
    state.upgrades = catalog();
    recompute_derived(state);

    info!(
        "prestige #{}: +{} points (total {}), multiplier x{:.1}",
        state.total_prestiges, earned, state.prestige_points, state.prestige_multiplier
    );
    earned
}

/// Credit production for time spent away as one lump tick.
///
/// Returns a report when the gap is long enough and something was earned.
pub fn apply_offline(state: &mut GameState, seconds_away: f64) -> Option<OfflineReport> {
    if !seconds_away.is_finite() || seconds_away <= 0.0 {
        return None;
    }
    let before = state.total_coins;
    tick(state, seconds_away);
    let earnings = state.total_coins - before;

    info!(
        "offline for {:.0}s at {:.2}/s: +{:.0}",
        seconds_away, state.coins_per_second, earnings
    );

    if seconds_away >= OFFLINE_REPORT_MIN_SECONDS && earnings > 0.0 {
        Some(OfflineReport {
            seconds_away,
            earnings,
        })
    } else {
        None
    }
}
