//! Idle Fortune セーブ/ロード機能。
//!
//! ## バージョニング方針
//!
//! - `SAVE_VERSION`: 現在のエンベロープ形式 `{ version, savedAtMs, game }` のバージョン。
//!   フィールド追加時にインクリメントする。
//! - `LEGACY_VERSION` (0): エンベロープを持たず、GameState の JSON をそのまま
//!   保存していた旧形式。読み込み時にマイグレーションする。
//! - 現在より新しいバージョンのデータも、不足フィールドはデフォルト値で補完し、
//!   未知のフィールドは無視して読み込む。
//!
//! アップグレードは `id` でカタログと照合してレベルだけを復元する。
//! コストや効果量などのテンプレート値は常にカタログ側を正とする。
//! `coinsPerSecond` / `clickPower` / `prestigeMultiplier` は派生値なので
//! 保存値を信用せず再計算する。

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::logic::{prestige_multiplier_for, recompute_derived};
use super::state::GameState;

/// セーブデータのフォーマットバージョン。
pub const SAVE_VERSION: u32 = 1;

/// エンベロープを持たない旧形式のバージョン番号。
pub const LEGACY_VERSION: u32 = 0;

/// localStorage のキー。旧形式と同じスロットを使う。
pub const STORAGE_KEY: &str = "idleGameState";

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to serialize save data: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to parse save data: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("storage is unavailable")]
    Unavailable,
    #[error("storage rejected the write: {0}")]
    Write(String),
}

/// 書き込み用のエンベロープ。
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveData<'a> {
    version: u32,
    saved_at_ms: Option<f64>,
    game: &'a GameState,
}

/// 読み込み用のエンベロープ。
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveEnvelope {
    version: u32,
    #[serde(default)]
    saved_at_ms: Option<f64>,
    #[serde(default)]
    game: GameSave,
}

/// 読み込み時に参照するフィールドだけを持つ寛容な形。
/// 派生値とアップグレードのテンプレート値は読まない。
#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct GameSave {
    coins: f64,
    total_coins: f64,
    prestige_points: u64,
    total_prestiges: u64,
    upgrades: Vec<UpgradeSave>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct UpgradeSave {
    id: String,
    level: u32,
}

/// A decoded snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub state: GameState,
    /// Format the blob was written in (`LEGACY_VERSION` for bare states).
    pub version: u32,
    /// Wall-clock time of the write, in epoch milliseconds.
    pub saved_at_ms: Option<f64>,
}

/// GameState をセーブ用 JSON に変換する。
pub fn encode(state: &GameState, saved_at_ms: Option<f64>) -> Result<String, SaveError> {
    let data = SaveData {
        version: SAVE_VERSION,
        saved_at_ms,
        game: state,
    };
    serde_json::to_string(&data).map_err(SaveError::Serialize)
}

/// セーブ JSON を復元する。`version` を持たない JSON は旧形式として扱う。
pub fn decode(json: &str) -> Result<Snapshot, SaveError> {
    let value: Value = serde_json::from_str(json).map_err(SaveError::Parse)?;

    if value.get("version").is_none() {
        let game: GameSave = serde_json::from_value(value).map_err(SaveError::Parse)?;
        info!("migrating unversioned save to v{}", SAVE_VERSION);
        return Ok(Snapshot {
            state: restore(&game),
            version: LEGACY_VERSION,
            saved_at_ms: None,
        });
    }

    let envelope: SaveEnvelope = serde_json::from_value(value).map_err(SaveError::Parse)?;
    if envelope.version > SAVE_VERSION {
        warn!(
            "save written by a newer build (saved={}, current={}); loading known fields",
            envelope.version, SAVE_VERSION
        );
    } else if envelope.version < SAVE_VERSION {
        info!(
            "migrating save (saved={}, current={})",
            envelope.version, SAVE_VERSION
        );
    }

    Ok(Snapshot {
        state: restore(&envelope.game),
        version: envelope.version,
        saved_at_ms: envelope.saved_at_ms,
    })
}

/// セーブデータをカタログに当てはめて GameState を組み立てる。
fn restore(save: &GameSave) -> GameState {
    let mut state = GameState::new();
    state.coins = non_negative(save.coins);
    state.total_coins = non_negative(save.total_coins);
    state.prestige_points = save.prestige_points;
    state.prestige_multiplier = prestige_multiplier_for(save.prestige_points);
    state.total_prestiges = save.total_prestiges;

    for saved in &save.upgrades {
        match state.upgrades.iter_mut().find(|u| u.id == saved.id) {
            Some(u) => u.level = saved.level.min(u.max_level),
            None => warn!("dropping unknown upgrade {:?} from save", saved.id),
        }
    }

    recompute_derived(&mut state);
    state
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

// ── Storage slots ───────────────────────────────────────────────

/// A single named place where the serialized state lives.
pub trait SaveSlot {
    /// The stored blob, if any.
    fn read(&self) -> Option<String>;
    fn write(&mut self, blob: &str) -> Result<(), SaveError>;
    fn clear(&mut self);
}

/// スロットからスナップショットを読み込む。
/// 壊れたデータは警告を出して削除し、None を返す（新規ゲームになる）。
pub fn load<S: SaveSlot>(slot: &mut S) -> Option<Snapshot> {
    let json = slot.read()?;
    match decode(&json) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("discarding unreadable save: {e}");
            slot.clear();
            None
        }
    }
}

pub fn save<S: SaveSlot>(slot: &mut S, state: &GameState, saved_at_ms: f64) -> Result<(), SaveError> {
    let json = encode(state, Some(saved_at_ms))?;
    slot.write(&json)
}

/// In-memory slot for tests and headless hosts.
#[derive(Clone, Debug, Default)]
pub struct MemorySlot {
    pub blob: Option<String>,
    /// Reject every write (simulates a full or blocked storage).
    pub fail_writes: bool,
    /// Successful writes so far.
    pub writes: usize,
}

impl MemorySlot {
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
            ..Self::default()
        }
    }
}

impl SaveSlot for MemorySlot {
    fn read(&self) -> Option<String> {
        self.blob.clone()
    }

    fn write(&mut self, blob: &str) -> Result<(), SaveError> {
        if self.fail_writes {
            return Err(SaveError::Write("memory slot is read-only".into()));
        }
        self.blob = Some(blob.to_string());
        self.writes += 1;
        Ok(())
    }

    fn clear(&mut self) {
        self.blob = None;
    }
}

/// Browser `localStorage` slot. Only usable on the wasm32 target.
pub struct LocalStorageSlot {
    key: &'static str,
}

impl LocalStorageSlot {
    pub fn new() -> Self {
        Self { key: STORAGE_KEY }
    }
}

impl Default for LocalStorageSlot {
    fn default() -> Self {
        Self::new()
    }
}

fn get_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

impl SaveSlot for LocalStorageSlot {
    fn read(&self) -> Option<String> {
        get_storage()?.get_item(self.key).ok()?
    }

    fn write(&mut self, blob: &str) -> Result<(), SaveError> {
        let storage = get_storage().ok_or(SaveError::Unavailable)?;
        storage
            .set_item(self.key, blob)
            .map_err(|e| SaveError::Write(format!("{e:?}")))
    }

    fn clear(&mut self) {
        if let Some(storage) = get_storage() {
            let _ = storage.remove_item(self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::logic;

    #[test]
    fn encode_and_decode_roundtrip() {
        let mut original = GameState::new();
        original.coins = 12_345.6;
        original.total_coins = 99_999.0;
        original.upgrades[0].level = 10;
        original.upgrades[4].level = 3;
        original.prestige_points = 4;
        original.prestige_multiplier = logic::prestige_multiplier_for(4);
        original.total_prestiges = 2;
        logic::recompute_derived(&mut original);

        let json = encode(&original, Some(1_700_000_000_000.0)).unwrap();
        let snapshot = decode(&json).unwrap();

        assert_eq!(snapshot.version, SAVE_VERSION);
        assert_eq!(snapshot.saved_at_ms, Some(1_700_000_000_000.0));
        assert_eq!(snapshot.state, original);
    }

    #[test]
    fn envelope_uses_camel_case_keys() {
        let json = encode(&GameState::new(), Some(5.0)).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], SAVE_VERSION);
        assert_eq!(value["savedAtMs"], 5.0);
        assert!(value["game"].get("coinsPerSecond").is_some());
    }

    /// エンベロープを持たない旧形式の JSON が移行されることを検証。
    #[test]
    fn migrate_legacy_bare_state() {
        let legacy = r#"{
            "coins": 1500.5,
            "totalCoins": 20000,
            "coinsPerSecond": 999,
            "clickPower": 999,
            "prestigePoints": 1,
            "prestigeMultiplier": 1.1,
            "totalPrestiges": 1,
            "upgrades": [
                {"id": "auto-clicker", "name": "Auto Clicker", "description": "+1 coin per second",
                 "baseCost": 10, "costMultiplier": 1.15, "baseEffect": 1, "level": 7,
                 "maxLevel": 100, "unlockAt": 0, "type": "production", "icon": "⚡"},
                {"id": "click-power", "name": "Click Power", "description": "+1 per click",
                 "baseCost": 50, "costMultiplier": 1.5, "baseEffect": 1, "level": 2,
                 "maxLevel": 50, "unlockAt": 25, "type": "click", "icon": "👆"}
            ]
        }"#;

        let snapshot = decode(legacy).unwrap();
        assert_eq!(snapshot.version, LEGACY_VERSION);
        assert_eq!(snapshot.saved_at_ms, None);

        let s = snapshot.state;
        assert!((s.coins - 1500.5).abs() < 1e-9);
        assert!((s.total_coins - 20_000.0).abs() < 1e-9);
        assert_eq!(s.prestige_points, 1);
        assert_eq!(s.total_prestiges, 1);
        assert_eq!(s.upgrade("auto-clicker").unwrap().level, 7);
        assert_eq!(s.upgrade("click-power").unwrap().level, 2);
        // 旧セーブに無いアップグレードはレベル0で補完
        assert_eq!(s.upgrade("bank").unwrap().level, 0);
        // 派生値は保存値ではなく再計算される
        assert!((s.coins_per_second - 7.0 * 1.1).abs() < 1e-9);
        assert!((s.click_power - 3.0 * 1.1).abs() < 1e-9);
        // カタログ側のテンプレートを使う
        assert_eq!(s.upgrade("auto-clicker").unwrap().description, "+1 coin/s");
    }

    #[test]
    fn unknown_upgrades_are_dropped_and_levels_clamped() {
        let json = r#"{
            "version": 1,
            "game": {
                "upgrades": [
                    {"id": "time-machine", "level": 3},
                    {"id": "multiplier", "level": 99}
                ]
            }
        }"#;
        let s = decode(json).unwrap().state;
        assert_eq!(s.upgrades.len(), 6);
        assert!(s.upgrade("time-machine").is_none());
        assert_eq!(s.upgrade("multiplier").unwrap().level, 10);
    }

    #[test]
    fn multiplier_is_recomputed_from_points() {
        let json = r#"{"version": 1, "game": {"prestigePoints": 3, "prestigeMultiplier": 50.0}}"#;
        let s = decode(json).unwrap().state;
        assert!((s.prestige_multiplier - 1.3).abs() < 1e-9);
    }

    #[test]
    fn huge_run_total_loads_and_prestiges_without_overflow() {
        let json = r#"{"version": 1, "game": {"totalCoins": 1e300, "prestigePoints": 5}}"#;
        let mut s = decode(json).unwrap().state;
        assert!((s.prestige_multiplier - 1.5).abs() < 1e-9);

        let earned = logic::prestige(&mut s);
        assert!(earned > 0);
        assert_eq!(s.prestige_points, u64::MAX);
        assert!(s.prestige_multiplier > 1.5);
    }

    #[test]
    fn negative_currency_is_reset() {
        let json = r#"{"version": 1, "game": {"coins": -50.0, "totalCoins": -1.0}}"#;
        let s = decode(json).unwrap().state;
        assert_eq!(s.coins, 0.0);
        assert_eq!(s.total_coins, 0.0);
    }

    /// 未知の追加フィールドや新しいバージョンは無視して読み込む。
    #[test]
    fn newer_version_and_unknown_fields_are_tolerated() {
        let json = r#"{
            "version": 7,
            "savedAtMs": 42.0,
            "futureEnvelopeField": true,
            "game": {"coins": 100.0, "futureUnknownField": "ignored"}
        }"#;
        let snapshot = decode(json).unwrap();
        assert_eq!(snapshot.version, 7);
        assert!((snapshot.state.coins - 100.0).abs() < 1e-9);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(decode("not json"), Err(SaveError::Parse(_))));
        assert!(matches!(decode("42"), Err(SaveError::Parse(_))));
        assert!(matches!(
            decode(r#"{"version": "one"}"#),
            Err(SaveError::Parse(_))
        ));
    }

    #[test]
    fn load_empty_slot_is_none() {
        let mut slot = MemorySlot::default();
        assert!(load(&mut slot).is_none());
    }

    #[test]
    fn load_corrupt_slot_clears_it() {
        let mut slot = MemorySlot::with_blob("{broken");
        assert!(load(&mut slot).is_none());
        assert!(slot.blob.is_none());
    }

    #[test]
    fn save_writes_to_slot() {
        let mut slot = MemorySlot::default();
        save(&mut slot, &GameState::new(), 10.0).unwrap();
        assert_eq!(slot.writes, 1);
        let snapshot = load(&mut slot).unwrap();
        assert_eq!(snapshot.saved_at_ms, Some(10.0));
    }

    #[test]
    fn failed_write_reports_error() {
        let mut slot = MemorySlot {
            fail_writes: true,
            ..MemorySlot::default()
        };
        assert!(matches!(
            save(&mut slot, &GameState::new(), 0.0),
            Err(SaveError::Write(_))
        ));
        assert!(slot.blob.is_none());
    }
}
