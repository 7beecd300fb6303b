#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::board::color::{FALLBACK_COLOR, Palette};
use crate::error::PmtuiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub departments: DepartmentsConfig,
    pub ui: UiConfig,
}

/// The department registry: an ordered list of names plus a name -> color
/// table. Kept as configuration so the same data could come from a server
/// later; the engine only ever sees the resulting [`Palette`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DepartmentsConfig {
    pub fallback_color: String,
    pub order: Vec<String>,
    pub colors: BTreeMap<String, String>,
}

impl Default for DepartmentsConfig {
    fn default() -> Self {
        let defaults: [(&str, &str); 11] = [
            ("Design Mecanic", "#ff16d4ff"),
            ("Design Electric", "#33C1FF"),
            ("Purchasing", "#004f2fff"),
            ("Tooling Shop", "#17e100ff"),
            ("Assamblare Mecanica", "#ff3333ff"),
            ("Assamblare Electrica", "#FF8F33"),
            ("Assamblare Finala", "#8F33FF"),
            ("Software Offline", "#008c85ff"),
            ("Software Debug", "#00a643ff"),
            ("Teste", "#3a33ffff"),
            ("Livrare", "#d454ffff"),
        ];
        Self {
            fallback_color: FALLBACK_COLOR.to_owned(),
            order: defaults.iter().map(|(n, _)| (*n).to_owned()).collect(),
            colors: defaults
                .iter()
                .map(|(n, c)| ((*n).to_owned(), (*c).to_owned()))
                .collect(),
        }
    }
}

impl DepartmentsConfig {
    /// Ordered palette for color resolution. Names listed in `order` without
    /// a color entry resolve to the fallback.
    #[must_use]
    pub fn palette(&self) -> Palette {
        let entries = self
            .order
            .iter()
            .map(|name| {
                let color = self
                    .colors
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| self.fallback_color.clone());
                (name.clone(), color)
            })
            .collect();
        Palette::new(entries, self.fallback_color.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Notes shown on the board before "see more".
    pub notes_preview: usize,
    /// Task chips per calendar day before "+N".
    pub day_task_cap: usize,
    /// Seconds before a validation warning auto-dismisses.
    pub warning_ttl_seconds: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notes_preview: 5,
            day_task_cap: 2,
            warning_ttl_seconds: 20,
        }
    }
}

impl UiConfig {
    #[must_use]
    pub fn warning_ttl(&self) -> Duration {
        Duration::from_secs(self.warning_ttl_seconds)
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), PmtuiError> {
        if self.departments.fallback_color.trim().is_empty() {
            return Err(PmtuiError::Config(
                "departments.fallback_color must not be empty".to_owned(),
            ));
        }
        if self.ui.day_task_cap == 0 {
            return Err(PmtuiError::Config(
                "ui.day_task_cap must be >= 1".to_owned(),
            ));
        }
        if self.ui.warning_ttl_seconds == 0 {
            return Err(PmtuiError::Config(
                "ui.warning_ttl_seconds must be >= 1".to_owned(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_file: PathBuf,
}

pub fn default_paths() -> anyhow::Result<ConfigPaths> {
    let unix = home_config_path_unix();
    if !cfg!(windows) {
        return Ok(ConfigPaths { config_file: unix });
    }

    // Windows: prefer the Unix-style path if present for portability.
    if unix.exists() {
        return Ok(ConfigPaths { config_file: unix });
    }

    let proj = ProjectDirs::from("com", "pmtui", "pmtui")
        .context("failed to determine platform config directory")?;
    Ok(ConfigPaths {
        config_file: proj.config_dir().join("config.toml"),
    })
}

fn home_config_path_unix() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("~"));
    home.join(".config").join("pmtui").join("config.toml")
}

fn home_dir() -> Option<PathBuf> {
    if let Some(v) = std::env::var_os("HOME") {
        return Some(PathBuf::from(v));
    }
    if let Some(v) = std::env::var_os("USERPROFILE") {
        return Some(PathBuf::from(v));
    }
    None
}

pub fn load() -> anyhow::Result<Config> {
    let paths = default_paths()?;
    let (_doc, cfg) = load_from_file(&paths.config_file)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn list_resolved_toml() -> anyhow::Result<String> {
    let cfg = load()?;
    Ok(toml::to_string_pretty(&cfg)?)
}

pub fn get_value_string(key: &str) -> anyhow::Result<Option<String>> {
    let paths = default_paths()?;
    get_value_string_at_path(&paths.config_file, key)
}

pub fn set_value_string(key: &str, value: &str) -> anyhow::Result<()> {
    let paths = default_paths()?;
    set_value_string_at_path(&paths.config_file, key, value)
}

fn load_from_file(path: &Path) -> anyhow::Result<(toml_edit::DocumentMut, Config)> {
    if !path.exists() {
        // Seed a fresh document with the full defaults so a later `set` of a
        // single department color does not shadow the rest of the table.
        let raw = toml::to_string_pretty(&Config::default())
            .context("failed to render default config")?;
        let doc = raw
            .parse::<toml_edit::DocumentMut>()
            .context("failed to parse default config")?;
        return Ok((doc, Config::default()));
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let doc = raw
        .parse::<toml_edit::DocumentMut>()
        .with_context(|| format!("failed to parse TOML in {}", path.display()))?;

    let cfg: Config = toml::from_str(&raw)
        .with_context(|| format!("failed to deserialize TOML in {}", path.display()))?;
    Ok((doc, cfg))
}

pub fn get_value_string_at_path(path: &Path, key: &str) -> anyhow::Result<Option<String>> {
    let (_doc, cfg) = load_from_file(path)?;
    cfg.validate()?;

    let value = lookup_value(&cfg, key);
    Ok(value.map(format_value_for_stdout))
}

pub fn set_value_string_at_path(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let (mut doc, cfg) = load_from_file(path)?;
    cfg.validate()?;

    let item = parse_value(key, value)?;
    apply_set(&mut doc, key, item)?;

    // Validate by re-parsing the updated doc into a Config.
    let new_raw = doc.to_string();
    let new_cfg: Config = toml::from_str(&new_raw)
        .with_context(|| format!("config update produced invalid TOML for {}", path.display()))?;
    new_cfg.validate()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, new_raw.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyType {
    Int,
    String,
}

fn key_type(key: &str) -> Option<KeyType> {
    // Dynamic keys: one color entry per department name.
    if key.starts_with("departments.colors.") {
        return Some(KeyType::String);
    }

    Some(match key {
        "departments.fallback_color" => KeyType::String,

        "ui.notes_preview" | "ui.day_task_cap" | "ui.warning_ttl_seconds" => KeyType::Int,

        _ => return None,
    })
}

fn parse_value(key: &str, value: &str) -> anyhow::Result<toml_edit::Item> {
    if key == "departments.order" {
        return Err(PmtuiError::InvalidConfigValue {
            key: key.to_owned(),
            msg: "edit the order array in the config file directly".to_owned(),
        }
        .into());
    }
    let key_type = key_type(key).ok_or_else(|| PmtuiError::InvalidConfigKey(key.to_owned()))?;
    let item = match key_type {
        KeyType::Int => toml_edit::value(parse_int(value).map_err(|msg| {
            PmtuiError::InvalidConfigValue {
                key: key.to_owned(),
                msg,
            }
        })?),
        KeyType::String => toml_edit::value(value),
    };
    Ok(item)
}

fn parse_int(s: &str) -> Result<i64, String> {
    s.trim()
        .parse::<i64>()
        .map_err(|e| format!("expected integer, got '{s}': {e}"))
}

fn apply_set(
    doc: &mut toml_edit::DocumentMut,
    key: &str,
    value: toml_edit::Item,
) -> anyhow::Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        return Err(PmtuiError::InvalidConfigKey(key.to_owned()).into());
    }

    let mut cur = doc.as_table_mut();
    for seg in &parts[..parts.len().saturating_sub(1)] {
        if !cur.contains_key(seg) {
            let mut t = toml_edit::Table::new();
            t.set_implicit(true);
            cur.insert(seg, toml_edit::Item::Table(t));
        }
        cur = cur[seg].as_table_mut().ok_or_else(|| {
            PmtuiError::Config(format!("cannot set {key}: '{seg}' is not a table"))
        })?;
    }

    let leaf = parts[parts.len() - 1];
    cur.insert(leaf, value);
    Ok(())
}

fn lookup_value(cfg: &Config, key: &str) -> Option<serde_json::Value> {
    let mut v = serde_json::to_value(cfg).ok()?;
    for seg in key.split('.').filter(|s| !s.is_empty()) {
        match v {
            serde_json::Value::Object(mut map) => {
                v = map.remove(seg)?;
            }
            _ => return None,
        }
    }
    Some(v)
}

fn format_value_for_stdout(v: serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_owned(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_carries_department_registry() {
        let cfg = Config::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.departments.order.len(), 11);
        assert_eq!(
            cfg.departments.colors.get("Design Electric").map(String::as_str),
            Some("#33C1FF")
        );
        assert_eq!(cfg.ui.warning_ttl_seconds, 20);
        assert_eq!(cfg.ui.day_task_cap, 2);
    }

    #[test]
    fn palette_preserves_order_and_fills_missing_colors() {
        let mut deps = DepartmentsConfig::default();
        deps.order.push("Forging".to_owned());
        let palette = deps.palette();
        let names: Vec<&str> = palette.departments().collect();
        assert_eq!(names.first().copied(), Some("Design Mecanic"));
        assert_eq!(names.last().copied(), Some("Forging"));
        assert_eq!(palette.color_of("Forging"), Some(FALLBACK_COLOR));
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut cfg = Config::default();
        cfg.ui.day_task_cap = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.departments.fallback_color = "  ".to_owned();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_set_and_get_dot_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        set_value_string_at_path(&path, "ui.notes_preview", "8").unwrap();
        assert_eq!(
            get_value_string_at_path(&path, "ui.notes_preview")
                .unwrap()
                .as_deref(),
            Some("8")
        );

        set_value_string_at_path(&path, "departments.colors.Forging", "#123456").unwrap();
        assert_eq!(
            get_value_string_at_path(&path, "departments.colors.Forging")
                .unwrap()
                .as_deref(),
            Some("#123456")
        );

        let (_doc, cfg) = load_from_file(&path).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.ui.notes_preview, 8);
        assert_eq!(
            cfg.departments.colors.get("Forging").map(String::as_str),
            Some("#123456")
        );
        // Untouched sections keep their defaults.
        assert_eq!(cfg.ui.day_task_cap, 2);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        assert!(set_value_string_at_path(&path, "ui.font_size", "12").is_err());
        assert!(set_value_string_at_path(&path, "ui.notes_preview", "lots").is_err());
    }
}
