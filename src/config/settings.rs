//! Settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they round-trip through the TOML config file and can be snapshotted
//! across threads.  [`FileSettings`] is the [`SettingsProvider`] the
//! coordinator reads from at the start of each recording cycle.

use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::hotkey::{parse_hotkey, HotKey};

// ---------------------------------------------------------------------------
// HotkeySettings
// ---------------------------------------------------------------------------

/// Push-to-talk binding, as written in the config file.
///
/// Accepts a bare key name (`"F9"`, `"RightOption"`) or a chord
/// (`"Cmd+Shift+Space"`).  See [`crate::hotkey::parse_hotkey`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeySettings {
    pub push_to_talk: String,
}

impl Default for HotkeySettings {
    fn default() -> Self {
        Self {
            push_to_talk: "RightOption".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AudioSettings
// ---------------------------------------------------------------------------

/// Capture configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Input device name — `None` means the system default.
    pub input_device: Option<String>,
}

// ---------------------------------------------------------------------------
// RecognitionSettings
// ---------------------------------------------------------------------------

/// Recognizer configuration the coordinator snapshots per cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionSettings {
    /// ISO-639-1 speech language code passed to the recognizer.
    pub language: String,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            language: "en".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// InjectSettings
// ---------------------------------------------------------------------------

/// Injection timing, in milliseconds.  Raise these on systems where the
/// clipboard manager or the receiving app lags behind the paste chord.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectSettings {
    /// Wait after writing the clipboard before synthesizing paste.
    pub settle_delay_ms: u64,
    /// Wait after paste before restoring the clipboard.
    pub completion_delay_ms: u64,
    /// Pause between keys on the direct-typing fallback.
    pub inter_key_delay_ms: u64,
}

impl Default for InjectSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 50,
            completion_delay_ms: 100,
            inter_key_delay_ms: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// The complete on-disk configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub hotkey: HotkeySettings,
    #[serde(default)]
    pub audio: AudioSettings,
    #[serde(default)]
    pub recognition: RecognitionSettings,
    #[serde(default)]
    pub inject: InjectSettings,
}

impl Settings {
    /// Platform config file location
    /// (`~/.config/holdtype/config.toml` or the OS equivalent).
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("holdtype").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults on a
    /// missing or unreadable file (first run is not an error).
    pub fn load() -> Settings {
        let Some(path) = Self::config_path() else {
            log::warn!("no config directory on this platform — using default settings");
            return Settings::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::info!("using default settings ({e})");
                Settings::default()
            }
        }
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Settings> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Write to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self).context("serializing settings")?;
        std::fs::write(path, raw).with_context(|| format!("writing {}", path.display()))
    }

    /// The configured binding, falling back to the default when the config
    /// string does not parse.
    pub fn hotkey(&self) -> HotKey {
        parse_hotkey(&self.hotkey.push_to_talk).unwrap_or_else(|| {
            log::warn!(
                "unrecognised hotkey {:?} — using the default binding",
                self.hotkey.push_to_talk
            );
            HotKey::default()
        })
    }

    /// Injection delays as `(settle, completion, inter_key)`.
    pub fn injection_delays(&self) -> (Duration, Duration, Duration) {
        (
            Duration::from_millis(self.inject.settle_delay_ms),
            Duration::from_millis(self.inject.completion_delay_ms),
            Duration::from_millis(self.inject.inter_key_delay_ms),
        )
    }
}

// ---------------------------------------------------------------------------
// SettingsProvider / FileSettings
// ---------------------------------------------------------------------------

/// Read-only settings access, snapshotted by the coordinator as each
/// recording cycle begins.  Changes mid-cycle affect only later cycles.
pub trait SettingsProvider: Send + Sync {
    fn hotkey(&self) -> HotKey;
    fn language(&self) -> String;
}

/// [`SettingsProvider`] backed by an in-memory [`Settings`] value that the
/// host may replace at runtime (e.g. after re-reading the config file).
pub struct FileSettings {
    inner: RwLock<Settings>,
}

impl FileSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    /// Swap in a new settings value.  Takes effect at the next cycle start.
    pub fn replace(&self, settings: Settings) {
        *self.inner.write().unwrap() = settings;
    }

    /// Clone the current settings.
    pub fn snapshot(&self) -> Settings {
        self.inner.read().unwrap().clone()
    }
}

impl SettingsProvider for FileSettings {
    fn hotkey(&self) -> HotKey {
        self.inner.read().unwrap().hotkey()
    }

    fn language(&self) -> String {
        self.inner.read().unwrap().recognition.language.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
