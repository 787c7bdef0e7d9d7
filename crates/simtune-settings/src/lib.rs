//! # simtune-settings
//!
//! Configuration management with layered sources for simtune jobs.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`SimtuneSettings::default()`]
//! 2. **User file**: `~/.simtune/settings.json` or an explicit path
//!    (deep-merged over defaults)
//! 3. **Environment variables**: `SIMTUNE_*` overrides (highest priority)
//!
//! ## Crate Position
//!
//! Standalone (no simtune crate dependencies).
//! Depended on by: simtune-core, simtune-train, simtune-cli.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    deep_merge, load_settings, load_settings_from_explicit_path, load_settings_from_path,
    settings_path,
};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = SimtuneSettings::default();
        let path = settings_path();
        assert!(path.ends_with(".simtune/settings.json"));
    }

    #[test]
    fn serde_roundtrip_preserves_sections() {
        let settings = SimtuneSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: SimtuneSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.seed, settings.seed);
        assert_eq!(parsed.callbacks.checkpoint.save_top_k, 3);
        assert_eq!(parsed.loss.variant, LossVariantKind::Margin);
    }
}
