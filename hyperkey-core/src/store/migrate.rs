//! Forward migrations of the persisted bundle.
//!
//! Bundles without a `schemaVersion` are treated as version 1. Every step only adds the fields
//! introduced by its version, so running a step twice changes nothing.

use serde_json::{Map, Value, json};

use crate::errors::{HyperError, Result};

use super::bundle::SCHEMA_VERSION;
use super::bundle::Settings;

/// Upgrades a bundle object from the version in its key to the next one.
pub type Migration = fn(&mut Map<String, Value>);

/// Keyed by the version they upgrade from.
pub const MIGRATIONS: &[(u32, Migration)] = &[(1, add_blocked_keys), (2, add_saved_state), (3, add_settings)];

fn add_blocked_keys(bundle: &mut Map<String, Value>) {
    bundle.entry("blockedKeys").or_insert_with(|| json!({}));
}

fn add_saved_state(bundle: &mut Map<String, Value>) {
    bundle.entry("lastSavedAt").or_insert(Value::Null);
    bundle.entry("snapshots").or_insert_with(|| json!([]));
}

fn add_settings(bundle: &mut Map<String, Value>) {
    let defaults = Settings::default();
    bundle.entry("settings").or_insert_with(|| {
        json!({
            "maxSnapshots": defaults.max_snapshots,
            "historyLimit": defaults.history_limit,
        })
    });
}

/// Reads `schemaVersion`, defaulting to 1 when absent.
pub fn schema_version(value: &Value) -> Result<u32> {
    match value.get("schemaVersion") {
        None | Some(Value::Null) => Ok(1),
        Some(version) => version
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| HyperError::validation("schemaVersion", "expected a non-negative integer")),
    }
}

pub fn migrate_to_latest(value: Value) -> Result<Value> {
    migrate_with(value, MIGRATIONS, SCHEMA_VERSION)
}

/// Runs the chain in order. A gap in `migrations` is an error, never skipped.
pub fn migrate_with(value: Value, migrations: &[(u32, Migration)], latest: u32) -> Result<Value> {
    let mut version = schema_version(&value)?;
    if version > latest {
        return Err(HyperError::UnsupportedVersion(version));
    }
    let Value::Object(mut bundle) = value else {
        return Err(HyperError::validation("bundle", "expected an object"));
    };

    while version < latest {
        let step = migrations
            .iter()
            .find(|(from, _)| *from == version)
            .map(|(_, step)| step)
            .ok_or(HyperError::MissingMigration(version))?;
        tracing::debug!("migrating bundle from schema version {}", version);
        step(&mut bundle);
        version += 1;
    }
    bundle.insert("schemaVersion".to_owned(), Value::from(latest));
    Ok(Value::Object(bundle))
}
