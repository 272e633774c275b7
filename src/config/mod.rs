//! Configuration — TOML settings file and the read-only provider the
//! coordinator snapshots each cycle.

pub mod settings;

pub use settings::{
    AudioSettings, FileSettings, HotkeySettings, InjectSettings, RecognitionSettings, Settings,
    SettingsProvider,
};
