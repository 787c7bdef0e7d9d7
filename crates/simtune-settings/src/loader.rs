//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`SimtuneSettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply `SIMTUNE_*` environment overrides (highest priority)
//! 4. [`SimtuneSettings::validate`]

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::SimtuneSettings;

/// Resolve the path to the settings file (`~/.simtune/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".simtune").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<SimtuneSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a path the user named explicitly.
///
/// Unlike [`load_settings_from_path`], a missing file is an error.
pub fn load_settings_from_explicit_path(path: &Path) -> Result<SimtuneSettings> {
    if !path.exists() {
        return Err(SettingsError::NotFound(path.display().to_string()));
    }
    load_settings_from_path(path)
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<SimtuneSettings> {
    let defaults = serde_json::to_value(SimtuneSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: SimtuneSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate();
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_env_overrides(settings: &mut SimtuneSettings) {
    apply_overrides_with(settings, |name| std::env::var(name).ok());
}

/// Apply `SIMTUNE_*` overrides read through `lookup`.
pub fn apply_overrides_with<F>(settings: &mut SimtuneSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    if let Some(v) = env.u64("SIMTUNE_SEED", 0, u64::MAX) {
        settings.seed = v;
    }

    // ── Data ────────────────────────────────────────────────────────
    if let Some(v) = env.string("SIMTUNE_TRAIN_DATA") {
        settings.data.train_path = v;
    }
    if let Some(v) = env.string("SIMTUNE_VAL_DATA") {
        settings.data.val_path = v;
    }
    if let Some(v) = env.usize("SIMTUNE_TRAIN_BATCH_SIZE", 1, 65_536) {
        settings.data.train_batch_size = v;
    }
    if let Some(v) = env.usize("SIMTUNE_VAL_BATCH_SIZE", 1, 65_536) {
        settings.data.val_batch_size = v;
    }

    // ── Trainer / optimizer / loss ──────────────────────────────────
    if let Some(v) = env.usize("SIMTUNE_MAX_EPOCHS", 1, 100_000) {
        settings.trainer.max_epochs = v;
    }
    if let Some(v) = env.f64("SIMTUNE_LR", f64::MIN_POSITIVE, 1.0) {
        settings.optimizer.lr = v;
    }
    if let Some(v) = env.f64("SIMTUNE_MARGIN", -1.0, 1.0) {
        settings.loss.margin = v as f32;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("SIMTUNE_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.string("SIMTUNE_METRICS_DIR") {
        settings.logging.metrics_dir = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a finite `f64` within a range.
pub fn parse_f64_range(val: &str, min: f64, max: f64) -> Option<f64> {
    let n: f64 = val.parse().ok()?;
    (n.is_finite() && n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn parsed<T, P>(&self, name: &str, kind: &str, parse: P) -> Option<T>
    where
        P: Fn(&str) -> Option<T>,
    {
        let val = (self.lookup)(name)?;
        let result = parse(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid {kind} env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        self.parsed(name, "u64", |v| parse_u64_range(v, min, max))
    }

    fn usize(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        self.parsed(name, "usize", |v| parse_usize_range(v, min, max))
    }

    fn f64(&self, name: &str, min: f64, max: f64) -> Option<f64> {
        self.parsed(name, "float", |v| parse_f64_range(v, min, max))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LossVariantKind;

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"data": {"trainBatchSize": 16, "valBatchSize": 32}});
        let source = serde_json::json!({"data": {"trainBatchSize": 8}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["data"]["trainBatchSize"], 8);
        assert_eq!(merged["data"]["valBatchSize"], 32);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"betas": [0.9, 0.999]});
        let source = serde_json::json!({"betas": [0.8, 0.99]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["betas"], serde_json::json!([0.8, 0.99]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_new_keys_added() {
        let merged = deep_merge(serde_json::json!({"a": 1}), serde_json::json!({"b": 2}));
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        assert_eq!(deep_merge(target, source)["a"], 42);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = load_settings_from_path(Path::new("/nonexistent/settings.json")).unwrap();
        let defaults = SimtuneSettings::default();
        assert_eq!(settings.version, defaults.version);
        assert_eq!(settings.backbone.model, defaults.backbone.model);
    }

    #[test]
    fn load_explicit_missing_file_errors() {
        let err = load_settings_from_explicit_path(Path::new("/nonexistent/settings.json"))
            .unwrap_err();
        assert!(matches!(err, SettingsError::NotFound(_)));
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{
                "trainer": {"maxEpochs": 2},
                "loss": {"variant": "targetCosine", "labelDomain": "unit"}
            }"#,
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.trainer.max_epochs, 2);
        assert_eq!(settings.trainer.limit_train_batches, 100);
        assert_eq!(settings.loss.variant, LossVariantKind::TargetCosine);
        assert_eq!(settings.loss.eps, 1e-12);
    }

    #[test]
    fn load_validates_after_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"loss": {"margin": 4.0}}"#).unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.loss.margin, 1.0);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result.unwrap_err(), SettingsError::Json(_)));
    }

    #[test]
    fn load_wrong_type_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"seed": "seven"}"#).unwrap();

        assert!(load_settings_from_path(&path).is_err());
    }

    // ── env overrides ───────────────────────────────────────────────

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| {
            vars.iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn env_overrides_beat_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"seed": 1, "loss": {"margin": 0.2}}"#).unwrap();

        let mut settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.seed, 1);
        apply_overrides_with(
            &mut settings,
            lookup(&[("SIMTUNE_SEED", "42"), ("SIMTUNE_MARGIN", "0.5")]),
        );
        assert_eq!(settings.seed, 42);
        assert_eq!(settings.loss.margin, 0.5);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut settings = SimtuneSettings::default();
        settings.loss.margin = 0.2;
        apply_overrides_with(
            &mut settings,
            lookup(&[
                ("SIMTUNE_SEED", "-3"),
                ("SIMTUNE_MARGIN", "1.5"),
                ("SIMTUNE_TRAIN_BATCH_SIZE", "0"),
                ("SIMTUNE_LR", "NaN"),
            ]),
        );
        assert_eq!(settings.seed, 777);
        assert_eq!(settings.loss.margin, 0.2);
        assert_eq!(settings.data.train_batch_size, 16);
        assert_eq!(settings.optimizer.lr, 5e-5);
    }

    #[test]
    fn empty_string_env_is_unset() {
        let mut settings = SimtuneSettings::default();
        apply_overrides_with(
            &mut settings,
            lookup(&[("SIMTUNE_TRAIN_DATA", ""), ("SIMTUNE_METRICS_DIR", "/tmp/runs")]),
        );
        assert_eq!(settings.data.train_path, "~/data/yelp/train.csv");
        assert_eq!(settings.logging.metrics_dir, "/tmp/runs");
    }

    // ── parsers ─────────────────────────────────────────────────────

    #[test]
    fn parse_u64_bounds() {
        assert_eq!(parse_u64_range("777", 0, u64::MAX), Some(777));
        assert_eq!(parse_u64_range("-1", 0, u64::MAX), None);
        assert_eq!(parse_u64_range("abc", 0, u64::MAX), None);
    }

    #[test]
    fn parse_usize_bounds() {
        assert_eq!(parse_usize_range("16", 1, 65_536), Some(16));
        assert_eq!(parse_usize_range("0", 1, 65_536), None);
        assert_eq!(parse_usize_range("100000", 1, 65_536), None);
    }

    #[test]
    fn parse_f64_bounds() {
        assert_eq!(parse_f64_range("5e-5", f64::MIN_POSITIVE, 1.0), Some(5e-5));
        assert_eq!(parse_f64_range("0.5", -1.0, 1.0), Some(0.5));
        assert_eq!(parse_f64_range("1.5", -1.0, 1.0), None);
        assert_eq!(parse_f64_range("NaN", -1.0, 1.0), None);
        assert_eq!(parse_f64_range("inf", -1.0, f64::MAX), None);
    }
}
