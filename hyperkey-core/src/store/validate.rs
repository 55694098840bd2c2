//! Schema checks on migrated JSON, run before anything is deserialized or stored.
//!
//! Errors name the first offending field with a dotted path, e.g.
//! `config.layers.o.commands.g.appName`.

use serde_json::{Map, Value};

use crate::errors::{Error, HyperError, Result};

use super::bundle::{KeyFilter, SCHEMA_VERSION};

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn mismatch(path: &str, expected: &str, value: &Value) -> HyperError {
    HyperError::validation(path, format!("expected {expected}, found {}", describe(value)))
}

fn object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| mismatch(path, "an object", value))
}

fn string<'a>(value: &'a Value, path: &str) -> Result<&'a str> {
    value.as_str().ok_or_else(|| mismatch(path, "a string", value))
}

fn count(value: &Value, path: &str) -> Error {
    value
        .as_u64()
        .map(drop)
        .ok_or_else(|| mismatch(path, "a non-negative integer", value))
}

fn timestamp(value: &Value, path: &str) -> Error {
    let text = string(value, path)?;
    chrono::DateTime::parse_from_rfc3339(text)
        .map(drop)
        .map_err(|err| HyperError::validation(path, format!("invalid timestamp `{text}`: {err}")))
}

fn required<'a>(map: &'a Map<String, Value>, path: &str, key: &str) -> Result<&'a Value> {
    map.get(key)
        .ok_or_else(|| HyperError::validation(join(path, key), "missing field"))
}

fn flags(value: &Value, path: &str) -> Error {
    for (key, flag) in object(value, path)? {
        if !flag.is_boolean() {
            return Err(mismatch(&join(path, key), "a boolean", flag));
        }
    }
    Ok(())
}

pub fn validate_bundle(value: &Value) -> Error {
    let bundle = object(value, "bundle")?;
    let version = required(bundle, "", "schemaVersion")?;
    if version.as_u64() != Some(u64::from(SCHEMA_VERSION)) {
        return Err(HyperError::validation(
            "schemaVersion",
            format!("expected {SCHEMA_VERSION} after migration"),
        ));
    }
    validate_config(required(bundle, "", "config")?, "config")?;

    for key in ["locks", "blockedKeys"] {
        if let Some(value) = bundle.get(key) {
            flags(value, key)?;
        }
    }
    if let Some(filter) = bundle.get("filter") {
        let name = string(filter, "filter")?;
        if !KeyFilter::NAMES.contains(&name) {
            return Err(HyperError::validation("filter", format!("unknown filter `{name}`")));
        }
    }
    if let Some(layout) = bundle.get("keyboardLayout") {
        string(layout, "keyboardLayout")?;
    }
    if let Some(ai_key) = bundle.get("aiKey").filter(|v| !v.is_null()) {
        string(ai_key, "aiKey")?;
    }
    if let Some(saved_at) = bundle.get("lastSavedAt").filter(|v| !v.is_null()) {
        timestamp(saved_at, "lastSavedAt")?;
    }
    if let Some(snapshots) = bundle.get("snapshots") {
        let items = snapshots
            .as_array()
            .ok_or_else(|| mismatch("snapshots", "an array", snapshots))?;
        for (index, snapshot) in items.iter().enumerate() {
            validate_snapshot(snapshot, &format!("snapshots.{index}"))?;
        }
    }
    if let Some(settings) = bundle.get("settings") {
        let settings = object(settings, "settings")?;
        for key in ["maxSnapshots", "historyLimit"] {
            if let Some(value) = settings.get(key) {
                count(value, &join("settings", key))?;
            }
        }
    }
    Ok(())
}

/// Checks the minimal `{schemaVersion, exportedAt, config}` export envelope.
pub fn validate_envelope(value: &Value) -> Error {
    let envelope = object(value, "envelope")?;
    count(required(envelope, "", "schemaVersion")?, "schemaVersion")?;
    timestamp(required(envelope, "", "exportedAt")?, "exportedAt")?;
    validate_config(required(envelope, "", "config")?, "config")
}

fn validate_snapshot(value: &Value, path: &str) -> Error {
    let snapshot = object(value, path)?;
    string(required(snapshot, path, "id")?, &join(path, "id"))?;
    string(required(snapshot, path, "name")?, &join(path, "name"))?;
    timestamp(required(snapshot, path, "createdAt")?, &join(path, "createdAt"))?;
    validate_config(required(snapshot, path, "config")?, &join(path, "config"))
}

pub fn validate_config(value: &Value, path: &str) -> Error {
    let config = object(value, path)?;
    let Some(layers) = config.get("layers") else {
        return Ok(());
    };
    let layers_path = join(path, "layers");
    for (key, layer) in object(layers, &layers_path)? {
        validate_layer(layer, &join(&layers_path, key))?;
    }
    Ok(())
}

fn validate_layer(value: &Value, path: &str) -> Error {
    let layer = object(value, path)?;
    let type_path = join(path, "type");
    match string(required(layer, path, "type")?, &type_path)? {
        "sublayer" => {
            let commands_path = join(path, "commands");
            let commands = object(required(layer, path, "commands")?, &commands_path)?;
            for (inner, command) in commands {
                validate_command(command, &join(&commands_path, inner))?;
            }
            Ok(())
        }
        "command" => validate_command(required(layer, path, "command")?, &join(path, "command")),
        other => Err(HyperError::validation(type_path, format!("unknown layer type `{other}`"))),
    }
}

fn validate_command(value: &Value, path: &str) -> Error {
    let command = object(value, path)?;
    let type_path = join(path, "type");
    let field = match string(required(command, path, "type")?, &type_path)? {
        "app" => "appName",
        "window" => "action",
        "raycast" => "deeplink",
        "shell" => "command",
        "keypress" => "keyCode",
        other => {
            return Err(HyperError::validation(type_path, format!("unknown command type `{other}`")));
        }
    };
    string(required(command, path, field)?, &join(path, field))?;

    if let Some(flag) = command.get("ignoreFocus") {
        if !flag.is_boolean() {
            return Err(mismatch(&join(path, "ignoreFocus"), "a boolean", flag));
        }
    }
    if let Some(modifiers) = command.get("modifiers") {
        let modifiers_path = join(path, "modifiers");
        let items = modifiers
            .as_array()
            .ok_or_else(|| mismatch(&modifiers_path, "an array", modifiers))?;
        for (index, modifier) in items.iter().enumerate() {
            string(modifier, &format!("{modifiers_path}.{index}"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundle(config: Value) -> Value {
        json!({
            "schemaVersion": SCHEMA_VERSION,
            "config": config,
            "locks": {},
            "blockedKeys": {},
            "filter": "all",
            "keyboardLayout": "ansi",
            "aiKey": null,
            "lastSavedAt": null,
            "snapshots": [],
            "settings": { "maxSnapshots": 20, "historyLimit": 100 },
        })
    }

    fn path_of(result: Error) -> String {
        match result {
            Err(HyperError::Validation { path, .. }) => path,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_a_valid_bundle() {
        let config = json!({ "layers": {
            "o": { "type": "sublayer", "commands": {
                "g": { "type": "app", "appName": "Arc" },
                "h": { "type": "keypress", "keyCode": "h", "modifiers": ["right_command"] },
            }},
            "spacebar": { "type": "command", "command": {
                "type": "raycast", "deeplink": "raycast://x", "ignoreFocus": true
            }},
        }});
        validate_bundle(&bundle(config)).unwrap();
    }

    #[test]
    fn reports_nested_field_paths() {
        let config = json!({ "layers": {
            "o": { "type": "sublayer", "commands": { "g": { "type": "app", "appName": 3 } } }
        }});
        assert_eq!(
            path_of(validate_bundle(&bundle(config))),
            "config.layers.o.commands.g.appName"
        );

        let config = json!({ "layers": {
            "o": { "type": "command", "command": { "type": "keypress" } }
        }});
        assert_eq!(
            path_of(validate_bundle(&bundle(config))),
            "config.layers.o.command.keyCode"
        );

        let config = json!({ "layers": { "o": { "type": "folder" } } });
        assert_eq!(path_of(validate_bundle(&bundle(config))), "config.layers.o.type");
    }

    #[test]
    fn checks_preferences_and_snapshots() {
        let mut value = bundle(json!({ "layers": {} }));
        value["filter"] = json!("everything");
        assert_eq!(path_of(validate_bundle(&value)), "filter");

        let mut value = bundle(json!({ "layers": {} }));
        value["snapshots"] = json!([{ "id": "1", "name": "a", "createdAt": "yesterday", "config": {} }]);
        assert_eq!(path_of(validate_bundle(&value)), "snapshots.0.createdAt");

        let mut value = bundle(json!({ "layers": {} }));
        value["settings"]["historyLimit"] = json!(-1);
        assert_eq!(path_of(validate_bundle(&value)), "settings.historyLimit");

        let mut value = bundle(json!({ "layers": {} }));
        value["locks"] = json!({ "o": "yes" });
        assert_eq!(path_of(validate_bundle(&value)), "locks.o");
    }

    #[test]
    fn checks_envelopes() {
        let envelope = json!({
            "schemaVersion": SCHEMA_VERSION,
            "exportedAt": "2024-05-01T12:00:00Z",
            "config": { "layers": {} },
        });
        validate_envelope(&envelope).unwrap();

        let mut missing = envelope.clone();
        missing.as_object_mut().unwrap().remove("config");
        assert_eq!(path_of(validate_envelope(&missing)), "config");
    }
}
