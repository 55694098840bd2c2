//! The persisted editor state and the smaller export envelope.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::errors::{HyperError, Result};

use super::history::DEFAULT_HISTORY_LIMIT;
use super::selectors::KeyClass;
use super::snapshot::NamedSnapshot;
use super::{migrate, validate};

/// Latest bundle layout; see `migrate` for what each version added.
pub const SCHEMA_VERSION: u32 = 4;
pub const DEFAULT_MAX_SNAPSHOTS: usize = 20;
pub const DEFAULT_KEYBOARD_LAYOUT: &str = "ansi";

/// Which keys the grid shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyFilter {
    #[default]
    All,
    Sublayer,
    Custom,
    Available,
    ThirdParty,
    Locked,
}

impl KeyFilter {
    pub const NAMES: [&'static str; 6] = [
        "all",
        "sublayer",
        "custom",
        "available",
        "thirdParty",
        "locked",
    ];

    pub fn matches(self, class: KeyClass) -> bool {
        match self {
            Self::All => true,
            Self::Sublayer => class == KeyClass::Sublayer,
            Self::Custom => class == KeyClass::Custom,
            Self::Available => class == KeyClass::Available,
            Self::ThirdParty => class == KeyClass::ThirdParty,
            Self::Locked => class == KeyClass::Locked,
        }
    }
}

impl std::str::FromStr for KeyFilter {
    type Err = HyperError;

    fn from_str(s: &str) -> Result<Self> {
        serde_json::from_value(Value::String(s.to_owned()))
            .map_err(|_| HyperError::validation("filter", format!("unknown filter `{s}`")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Zero keeps every snapshot.
    pub max_snapshots: usize,
    /// Zero keeps the whole history.
    pub history_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_snapshots: DEFAULT_MAX_SNAPSHOTS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

fn default_keyboard_layout() -> String {
    DEFAULT_KEYBOARD_LAYOUT.to_owned()
}

/// Everything the editor keeps between runs, except undo history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub schema_version: u32,
    pub config: Config,
    #[serde(default)]
    pub locks: IndexMap<String, bool>,
    #[serde(default)]
    pub blocked_keys: IndexMap<String, bool>,
    #[serde(default)]
    pub filter: KeyFilter,
    #[serde(default = "default_keyboard_layout")]
    pub keyboard_layout: String,
    #[serde(default)]
    pub ai_key: Option<String>,
    #[serde(default)]
    pub last_saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub snapshots: Vec<NamedSnapshot>,
    #[serde(default)]
    pub settings: Settings,
}

impl Default for Bundle {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            config: Config::default(),
            locks: IndexMap::new(),
            blocked_keys: IndexMap::new(),
            filter: KeyFilter::default(),
            keyboard_layout: default_keyboard_layout(),
            ai_key: None,
            last_saved_at: None,
            snapshots: Vec::new(),
            settings: Settings::default(),
        }
    }
}

impl Bundle {
    /// Migrates, validates and only then deserializes a stored bundle.
    pub fn from_value(value: Value) -> Result<Self> {
        let value = migrate::migrate_to_latest(value)?;
        validate::validate_bundle(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A layout shared without preferences or history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub schema_version: u32,
    pub exported_at: DateTime<Utc>,
    pub config: Config,
}

impl ExportEnvelope {
    pub fn new(config: Config) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            exported_at: Utc::now(),
            config,
        }
    }
}

/// A parsed import file: either a full bundle or an export envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportPayload {
    Bundle(Box<Bundle>),
    Envelope(ExportEnvelope),
}

impl ImportPayload {
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        if value.get("exportedAt").is_none() {
            return Ok(Self::Bundle(Box::new(Bundle::from_value(value)?)));
        }
        let version = migrate::schema_version(&value)?;
        if version > SCHEMA_VERSION {
            return Err(HyperError::UnsupportedVersion(version));
        }
        validate::validate_envelope(&value)?;
        Ok(Self::Envelope(serde_json::from_value(value)?))
    }

    pub fn config(&self) -> &Config {
        match self {
            Self::Bundle(bundle) => &bundle.config,
            Self::Envelope(envelope) => &envelope.config,
        }
    }

    pub fn snapshot_count(&self) -> usize {
        match self {
            Self::Bundle(bundle) => bundle.snapshots.len(),
            Self::Envelope(_) => 0,
        }
    }
}
