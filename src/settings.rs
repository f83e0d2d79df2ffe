//! Settings persistence: named groups of typed values saved as JSON.
//!
//! In memory a setting is a [`SettingValue`]. On disk each setting is stored
//! with its value and a type tag so it can be reconstructed:
//!
//! ```json
//! {
//! 	"camera": {
//! 		"exposure_ms": { "value": 12.5, "type": "float" },
//! 		"color": { "value": true, "type": "bool" }
//! 	}
//! }
//! ```
//!
//! Files written by older versions stored every value as a string. Those are
//! still read: the tags `bool`, `str`/`string`, `int` and `float` are parsed
//! strictly, and any other tag gets a best-effort literal parse that falls back
//! to keeping the raw string.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PersistenceError, PersistenceResult};

/// A single setting value.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Str(String),
    Int(i64),
    Float(f64),
}

impl SettingValue {
    /// Type tag written next to the value on disk.
    pub fn type_tag(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "bool",
            SettingValue::Str(_) => "str",
            SettingValue::Int(_) => "int",
            SettingValue::Float(_) => "float",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, and ints widened to `f64`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            SettingValue::Float(f) => Some(*f),
            SettingValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Str(s) => Some(s),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            SettingValue::Bool(b) => Value::Bool(*b),
            SettingValue::Str(s) => Value::String(s.clone()),
            SettingValue::Int(i) => Value::from(*i),
            // JSON has no NaN/inf; keep them as strings under the float tag.
            SettingValue::Float(f) if !f.is_finite() => Value::String(f.to_string()),
            SettingValue::Float(f) => Value::from(*f),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Int(v)
    }
}

impl From<i32> for SettingValue {
    fn from(v: i32) -> Self {
        SettingValue::Int(v as i64)
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::Float(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        SettingValue::Str(v.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(v: String) -> Self {
        SettingValue::Str(v)
    }
}

/// Settings of one group, by name.
pub type SettingsGroup = BTreeMap<String, SettingValue>;

/// All groups of one settings file, by group name.
pub type SettingsGroups = BTreeMap<String, SettingsGroup>;

// ---------- On-disk mirror types ----------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSetting {
    value: Value,
    #[serde(rename = "type")]
    type_tag: String,
}

type StoredGroups = BTreeMap<String, BTreeMap<String, StoredSetting>>;

fn malformed(group: &str, name: &str, reason: impl Into<String>) -> PersistenceError {
    PersistenceError::Malformed {
        group: group.to_string(),
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn parse_bool_literal(s: &str) -> Option<bool> {
    match s.trim() {
        "True" | "true" => Some(true),
        "False" | "false" => Some(false),
        _ => None,
    }
}

/// Best-effort parse of a literal of unknown type. Never fails: text that is
/// not a recognizable literal stays a string.
fn parse_literal(s: &str) -> SettingValue {
    let t = s.trim();
    if let Some(b) = parse_bool_literal(t) {
        return SettingValue::Bool(b);
    }
    if let Ok(i) = t.parse::<i64>() {
        return SettingValue::Int(i);
    }
    if let Ok(f) = t.parse::<f64>() {
        if f.is_finite() {
            return SettingValue::Float(f);
        }
    }
    for q in ['"', '\''] {
        if t.len() >= 2 && t.starts_with(q) && t.ends_with(q) {
            return SettingValue::Str(t[1..t.len() - 1].to_string());
        }
    }
    SettingValue::Str(s.to_string())
}

fn decode(group: &str, name: &str, stored: &StoredSetting) -> PersistenceResult<SettingValue> {
    let tag = stored.type_tag.as_str();
    match &stored.value {
        Value::Bool(b) => Ok(SettingValue::Bool(*b)),
        Value::Number(n) => {
            if tag != "float" {
                if let Some(i) = n.as_i64() {
                    return Ok(SettingValue::Int(i));
                }
            }
            n.as_f64()
                .map(SettingValue::Float)
                .ok_or_else(|| malformed(group, name, format!("number {n} out of range")))
        }
        Value::String(s) => match tag {
            "bool" => parse_bool_literal(s)
                .map(SettingValue::Bool)
                .ok_or_else(|| malformed(group, name, format!("'{s}' is not a bool"))),
            "str" | "string" => Ok(SettingValue::Str(s.clone())),
            "int" => s
                .trim()
                .parse::<i64>()
                .map(SettingValue::Int)
                .map_err(|e| malformed(group, name, format!("'{s}': {e}"))),
            "float" => s
                .trim()
                .parse::<f64>()
                .map(SettingValue::Float)
                .map_err(|e| malformed(group, name, format!("'{s}': {e}"))),
            _ => Ok(parse_literal(s)),
        },
        other => Err(malformed(group, name, format!("unsupported value {other}"))),
    }
}

// ---------- Public API ----------

/// Serialize settings as tab-indented JSON.
pub fn settings_to_json(groups: &SettingsGroups) -> PersistenceResult<String> {
    let stored: StoredGroups = groups
        .iter()
        .map(|(group, settings)| {
            let entries = settings
                .iter()
                .map(|(name, value)| {
                    let s = StoredSetting {
                        value: value.to_json(),
                        type_tag: value.type_tag().to_string(),
                    };
                    (name.clone(), s)
                })
                .collect();
            (group.clone(), entries)
        })
        .collect();

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    stored.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Deserialize settings written by [`settings_to_json`] or by older versions.
pub fn settings_from_json(json: &str) -> PersistenceResult<SettingsGroups> {
    let stored: StoredGroups = serde_json::from_str(json)?;
    let mut groups = SettingsGroups::new();
    for (group, settings) in &stored {
        let mut decoded = SettingsGroup::new();
        for (name, s) in settings {
            decoded.insert(name.clone(), decode(group, name, s)?);
        }
        groups.insert(group.clone(), decoded);
    }
    Ok(groups)
}

/// Path of the settings file called `name` inside `dir`.
pub fn settings_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}_settings.json"))
}

/// Save settings to `<dir>/<name>_settings.json`, creating `dir` if needed.
pub fn save_settings(groups: &SettingsGroups, dir: &Path, name: &str) -> PersistenceResult<PathBuf> {
    let path = settings_path(dir, name);
    let io_err = |source| PersistenceError::Io {
        path: path.clone(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;
    let txt = settings_to_json(groups)?;
    std::fs::write(&path, txt).map_err(io_err)?;
    tracing::debug!(path = %path.display(), groups = groups.len(), "saved settings");
    Ok(path)
}

/// Load settings from `<dir>/<name>_settings.json`.
pub fn load_settings(dir: &Path, name: &str) -> PersistenceResult<SettingsGroups> {
    let path = settings_path(dir, name);
    let txt = std::fs::read_to_string(&path).map_err(|source| PersistenceError::Io {
        path: path.clone(),
        source,
    })?;
    settings_from_json(&txt)
}

/// Load settings, falling back to `defaults` when the file is missing or bad.
///
/// The error, if any, is logged and handed back so the UI can show it.
pub fn load_or_default(
    dir: &Path,
    name: &str,
    defaults: SettingsGroups,
) -> (SettingsGroups, Option<PersistenceError>) {
    match load_settings(dir, name) {
        Ok(groups) => (groups, None),
        Err(e) => {
            tracing::warn!(error = %e, "could not load settings, using defaults");
            (defaults, Some(e))
        }
    }
}
