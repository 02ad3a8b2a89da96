//! Game settings and preferences
//!
//! Persisted in LocalStorage; the page query string can override them for a
//! single visit (`?barrels=25&rule=pointer`).

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// How the secret barrel is revealed on the wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TargetRule {
    /// The secret barrel itself is the only one pointing at an hour
    #[default]
    Marked,
    /// Barrel 0 points at an hour; the barrel with that number is the secret one
    Pointer,
}

impl TargetRule {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "marked" | "mark" => Some(TargetRule::Marked),
            "pointer" | "head" => Some(TargetRule::Pointer),
            _ => None,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Barrels on the wall
    pub num_barrels: usize,
    /// Which barrel carries the secret
    pub rule: TargetRule,

    // === Timing ===
    /// Plate fly-in / slide-out duration (ms)
    pub transition_ms: u32,
    /// Idle time before the plate dismisses itself (ms)
    pub plate_timeout_ms: u32,

    // === Visuals ===
    /// Highlight opacity of the barrel under the pointer
    pub highlight: f32,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            num_barrels: NUM_BARRELS,
            rule: TargetRule::Marked,

            transition_ms: TRANSITION_MS,
            plate_timeout_ms: PLATE_TIMEOUT_MS,

            highlight: HIGHLIGHT,

            master_volume: 1.0,
            muted: false,
        }
    }
}

impl Settings {
    /// Most barrels that still fit on a phone screen
    pub const MAX_BARRELS: usize = 200;

    /// Clamp every field into a playable range
    pub fn validated(mut self) -> Self {
        self.num_barrels = self.num_barrels.clamp(1, Self::MAX_BARRELS);
        self.transition_ms = self.transition_ms.max(1);
        // The plate must land before it can time out
        self.plate_timeout_ms = self.plate_timeout_ms.max(self.transition_ms.saturating_add(1));
        self.highlight = self.highlight.clamp(0.0, 1.0);
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self
    }

    /// Effective volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    /// Apply `key=value` pairs from a URL query string; unknown keys are ignored
    pub fn apply_query(&mut self, query: &str) {
        let query = query.trim_start_matches('?');
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "barrels" => {
                    if let Ok(n) = value.parse() {
                        self.num_barrels = n;
                    }
                }
                "rule" => {
                    if let Some(rule) = TargetRule::from_str(value) {
                        self.rule = rule;
                    }
                }
                "timeout" => {
                    if let Ok(secs) = value.parse::<u32>() {
                        self.plate_timeout_ms = secs.saturating_mul(1000);
                    }
                }
                "mute" => self.muted = value != "0" && value != "false",
                _ => log::debug!("Ignoring query parameter {}", key),
            }
        }
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "barrels_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str::<Settings>(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings.validated();
                    }
                    Err(e) => log::warn!("Stored settings unreadable ({}), using defaults", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
