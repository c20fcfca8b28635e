/// Idle Fortune: an incremental coin game with upgrades and prestige resets.

pub mod actions;
pub mod format;
pub mod logic;
pub mod render;
pub mod save;
pub mod state;

use log::{debug, info, warn};

use crate::input::InputEvent;

use logic::OfflineReport;
use save::SaveSlot;
use state::GameState;

/// Which panel the player is looking at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Upgrades,
    Prestige,
}

/// A running session: owns the state and the slot it persists to.
///
/// Every command that changes the state writes a snapshot stamped with the
/// last wall-clock time seen by [`observe_clock`](Self::observe_clock).
pub struct IdleGame<S: SaveSlot> {
    pub state: GameState,
    pub tab: Tab,
    offline: Option<OfflineReport>,
    slot: S,
    /// Wall-clock time (epoch ms) used to stamp snapshots.
    now_ms: f64,
}

impl<S: SaveSlot> IdleGame<S> {
    /// Resume from the slot's snapshot (or start fresh) at wall-clock `now_ms`.
    ///
    /// Time elapsed since the snapshot was written is credited as one tick.
    pub fn open(mut slot: S, now_ms: f64) -> Self {
        let (mut state, saved_at_ms) = match save::load(&mut slot) {
            Some(snapshot) => {
                info!(
                    "loaded save v{} ({} prestiges, {:.0} coins)",
                    snapshot.version, snapshot.state.total_prestiges, snapshot.state.coins
                );
                (snapshot.state, snapshot.saved_at_ms)
            }
            None => (GameState::new(), None),
        };

        let offline = saved_at_ms
            .filter(|_| now_ms.is_finite())
            .and_then(|saved| logic::apply_offline(&mut state, (now_ms - saved).max(0.0) / 1000.0));

        let mut game = Self {
            state,
            tab: Tab::default(),
            offline,
            slot,
            now_ms: if now_ms.is_finite() { now_ms } else { 0.0 },
        };
        game.persist();
        game
    }

    /// Record the current wall-clock time for the next snapshot.
    pub fn observe_clock(&mut self, now_ms: f64) {
        if now_ms.is_finite() {
            self.now_ms = now_ms;
        }
    }

    pub fn tap(&mut self) {
        logic::tap(&mut self.state);
        self.persist();
    }

    /// Buy one level of `id`. Returns false (and changes nothing) if the
    /// upgrade is unknown, maxed, or unaffordable.
    pub fn purchase_upgrade(&mut self, id: &str) -> bool {
        let bought = logic::purchase_upgrade(&mut self.state, id);
        if bought {
            self.persist();
        }
        bought
    }

    /// Prestige if eligible. Returns the points earned (0 = nothing happened).
    pub fn prestige(&mut self) -> u64 {
        let earned = logic::prestige(&mut self.state);
        if earned > 0 {
            self.persist();
        }
        earned
    }

    pub fn tick(&mut self, delta_seconds: f64) {
        if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return;
        }
        logic::tick(&mut self.state, delta_seconds);
        self.persist();
    }

    /// Pending offline earnings notice, if any.
    pub fn offline_report(&self) -> Option<&OfflineReport> {
        self.offline.as_ref()
    }

    /// Consume the offline earnings notice. Returns it at most once.
    pub fn take_offline_report(&mut self) -> Option<OfflineReport> {
        self.offline.take()
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    /// Flush a final snapshot and hand back the slot.
    pub fn close(mut self) -> S {
        self.persist();
        self.slot
    }

    fn persist(&mut self) {
        if let Err(e) = save::save(&mut self.slot, &self.state, self.now_ms) {
            warn!("failed to save progress: {e}");
        }
    }

    /// Dispatch a key press or click. Returns true if the event was consumed.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        // The offline notice is modal: the first input only dismisses it.
        if self.offline.is_some() {
            let dismiss = matches!(
                event,
                InputEvent::Key('\n' | '\u{1b}' | ' ') | InputEvent::Click(_)
            );
            if dismiss {
                self.offline = None;
            }
            return dismiss;
        }

        match event {
            InputEvent::Key('c' | ' ') | InputEvent::Click(actions::TAP) => {
                self.tap();
                true
            }
            InputEvent::Key('u') | InputEvent::Click(actions::TAB_UPGRADES) => {
                self.tab = Tab::Upgrades;
                true
            }
            InputEvent::Key('r') | InputEvent::Click(actions::TAB_PRESTIGE) => {
                self.tab = Tab::Prestige;
                true
            }
            InputEvent::Key(c @ '1'..='9') if self.tab == Tab::Upgrades => {
                let idx = (*c as u8 - b'1') as usize;
                self.buy_by_index(idx)
            }
            InputEvent::Key('p') if self.tab == Tab::Prestige => {
                self.prestige();
                true
            }
            InputEvent::Click(actions::PRESTIGE) => {
                self.prestige();
                true
            }
            InputEvent::Click(id) if *id >= actions::BUY_UPGRADE_BASE && *id < actions::PRESTIGE => {
                self.buy_by_index((*id - actions::BUY_UPGRADE_BASE) as usize)
            }
            _ => false,
        }
    }

    /// Try to buy the upgrade shown at `idx`. Returns false when no upgrade
    /// sits at that index; a rejected purchase of a real entry still counts.
    fn buy_by_index(&mut self, idx: usize) -> bool {
        let Some(id) = self.state.upgrades.get(idx).map(|u| u.id.clone()) else {
            return false;
        };
        if !self.purchase_upgrade(&id) {
            debug!("purchase of {} rejected", id);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use save::MemorySlot;

    fn fresh() -> IdleGame<MemorySlot> {
        IdleGame::open(MemorySlot::default(), 1_000.0)
    }

    #[test]
    fn open_empty_slot_starts_fresh_and_saves() {
        let game = fresh();
        assert_eq!(game.state, GameState::new());
        assert!(game.offline_report().is_none());
        assert_eq!(game.slot().writes, 1);
    }

    #[test]
    fn open_corrupt_slot_starts_fresh() {
        let game = IdleGame::open(MemorySlot::with_blob("{{{"), 0.0);
        assert_eq!(game.state, GameState::new());
        // The rejected blob was replaced by a fresh snapshot.
        assert!(save::decode(game.slot().blob.as_deref().unwrap()).is_ok());
    }

    #[test]
    fn every_mutation_is_persisted() {
        let mut game = fresh();
        game.tap();
        game.tick(0.1);
        let slot = game.close();
        assert_eq!(slot.writes, 4); // open, tap, tick, close
        let snapshot = save::decode(slot.blob.as_deref().unwrap()).unwrap();
        assert!((snapshot.state.coins - 1.0).abs() < 0.001);
    }

    #[test]
    fn long_frame_is_one_tick_and_one_write() {
        use crate::time::FrameClock;

        let mut game = fresh();
        game.state.coins = 100.0;
        assert!(game.purchase_upgrade("gold-mine")); // 5/s
        let writes = game.slot().writes;

        let mut clock = FrameClock::new(state::TICKS_PER_SECOND);
        clock.update(0.0);
        let steps = clock.update(2_000.0);
        assert!(steps.ticks > 1 && steps.catch_up_seconds > 0.0);
        game.tick(steps.elapsed_seconds(state::TICK_SECONDS));

        assert_eq!(game.slot().writes, writes + 1);
        assert!((game.state.coins - 10.0).abs() < 1e-9);
    }

    #[test]
    fn failed_purchase_does_not_write() {
        let mut game = fresh();
        let writes = game.slot().writes;
        assert!(!game.purchase_upgrade("auto-clicker"));
        assert!(!game.purchase_upgrade("nope"));
        assert_eq!(game.prestige(), 0);
        assert_eq!(game.slot().writes, writes);
    }

    #[test]
    fn snapshot_is_stamped_with_observed_clock() {
        let mut game = fresh();
        game.observe_clock(5_000.0);
        game.tap();
        let snapshot = save::decode(game.slot().blob.as_deref().unwrap()).unwrap();
        assert_eq!(snapshot.saved_at_ms, Some(5_000.0));
    }

    #[test]
    fn write_failures_do_not_interrupt_play() {
        let slot = MemorySlot {
            fail_writes: true,
            ..MemorySlot::default()
        };
        let mut game = IdleGame::open(slot, 0.0);
        game.tap();
        assert!((game.state.coins - 1.0).abs() < 0.001);
        assert!(game.slot().blob.is_none());
    }

    #[test]
    fn reopen_credits_offline_time() {
        let mut game = fresh();
        game.state.coins = 100.0;
        assert!(game.purchase_upgrade("gold-mine")); // 5/s
        let slot = game.close();

        // One hour later.
        let mut game = IdleGame::open(slot, 1_000.0 + 3_600_000.0);
        let report = game.take_offline_report().unwrap();
        assert!((report.seconds_away - 3_600.0).abs() < 1e-9);
        assert!((report.earnings - 18_000.0).abs() < 1e-6);
        assert!((game.state.coins - 18_000.0).abs() < 1e-6);
        assert!(game.take_offline_report().is_none());
    }

    #[test]
    fn clock_going_backwards_credits_nothing() {
        let mut game = fresh();
        game.state.coins = 100.0;
        game.purchase_upgrade("gold-mine");
        let slot = game.close();

        let game = IdleGame::open(slot, 0.0);
        assert!(game.offline_report().is_none());
        assert_eq!(game.state.coins, 0.0);
    }

    // ── Input dispatch ─────────────────────────────────────────────

    #[test]
    fn tap_via_key_and_click() {
        let mut game = fresh();
        assert!(game.handle_input(&InputEvent::Key('c')));
        assert!(game.handle_input(&InputEvent::Key(' ')));
        assert!(game.handle_input(&InputEvent::Click(actions::TAP)));
        assert!((game.state.coins - 3.0).abs() < 0.001);
    }

    #[test]
    fn buy_via_number_key() {
        let mut game = fresh();
        game.state.coins = 10.0;
        game.handle_input(&InputEvent::Key('1'));
        assert_eq!(game.state.upgrades[0].level, 1);
    }

    #[test]
    fn buy_via_click() {
        let mut game = fresh();
        game.state.coins = 50.0;
        game.handle_input(&InputEvent::Click(actions::BUY_UPGRADE_BASE + 4));
        assert_eq!(game.state.upgrade("click-power").unwrap().level, 1);
    }

    #[test]
    fn number_keys_ignored_on_prestige_tab() {
        let mut game = fresh();
        game.state.coins = 10.0;
        game.handle_input(&InputEvent::Key('r'));
        assert_eq!(game.tab, Tab::Prestige);
        assert!(!game.handle_input(&InputEvent::Key('1')));
        assert_eq!(game.state.upgrades[0].level, 0);
    }

    #[test]
    fn prestige_key_only_on_prestige_tab() {
        let mut game = fresh();
        game.state.total_coins = 10_000.0;
        game.handle_input(&InputEvent::Key('p'));
        assert_eq!(game.state.total_prestiges, 0);

        game.handle_input(&InputEvent::Key('r'));
        game.handle_input(&InputEvent::Key('p'));
        assert_eq!(game.state.total_prestiges, 1);
        assert_eq!(game.state.prestige_points, 1);
    }

    #[test]
    fn tab_switching() {
        let mut game = fresh();
        game.handle_input(&InputEvent::Click(actions::TAB_PRESTIGE));
        assert_eq!(game.tab, Tab::Prestige);
        game.handle_input(&InputEvent::Key('u'));
        assert_eq!(game.tab, Tab::Upgrades);
    }

    #[test]
    fn offline_notice_swallows_first_input() {
        let mut game = fresh();
        game.offline = Some(OfflineReport {
            seconds_away: 60.0,
            earnings: 10.0,
        });
        assert!(game.handle_input(&InputEvent::Click(actions::TAP)));
        assert!(game.offline_report().is_none());
        assert_eq!(game.state.coins, 0.0);

        game.handle_input(&InputEvent::Click(actions::TAP));
        assert!((game.state.coins - 1.0).abs() < 0.001);
    }

    #[test]
    fn keys_past_the_catalog_are_not_consumed() {
        let mut game = fresh();
        game.state.coins = 1e9;
        for key in ['7', '8', '9'] {
            assert!(!game.handle_input(&InputEvent::Key(key)));
        }
        assert!(!game.handle_input(&InputEvent::Click(actions::BUY_UPGRADE_BASE + 6)));
        assert!(game.state.upgrades.iter().all(|u| u.level == 0));
        // An existing entry that cannot be afforded still consumes the key.
        game.state.coins = 0.0;
        assert!(game.handle_input(&InputEvent::Key('6')));
    }

    #[test]
    fn unknown_key_not_consumed() {
        let mut game = fresh();
        assert!(!game.handle_input(&InputEvent::Key('z')));
        assert!(!game.handle_input(&InputEvent::Click(9_999)));
    }
}
