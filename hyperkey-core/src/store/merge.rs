use indexmap::IndexMap;

use super::bundle::Bundle;
use super::snapshot::{self, NamedSnapshot};

/// Folds an imported bundle into the current one.
///
/// The incoming layout replaces the current one outright. Snapshots are unioned by id,
/// flag maps by key, with incoming entries winning either way. `lastSavedAt` stays local since
/// it describes the source file on this machine.
pub fn merge_bundles(current: &Bundle, incoming: Bundle) -> Bundle {
    let settings = incoming.settings;

    let mut by_id: IndexMap<String, NamedSnapshot> = current
        .snapshots
        .iter()
        .map(|s| (s.id.clone(), s.clone()))
        .collect();
    for snapshot in incoming.snapshots {
        by_id.insert(snapshot.id.clone(), snapshot);
    }
    let mut snapshots: Vec<NamedSnapshot> = by_id.into_values().collect();
    snapshot::bound(&mut snapshots, settings.max_snapshots);

    Bundle {
        schema_version: incoming.schema_version,
        config: incoming.config,
        locks: union(&current.locks, incoming.locks),
        blocked_keys: union(&current.blocked_keys, incoming.blocked_keys),
        filter: incoming.filter,
        keyboard_layout: incoming.keyboard_layout,
        ai_key: incoming.ai_key.or_else(|| current.ai_key.clone()),
        last_saved_at: current.last_saved_at,
        snapshots,
        settings,
    }
}

fn union(current: &IndexMap<String, bool>, incoming: IndexMap<String, bool>) -> IndexMap<String, bool> {
    let mut merged = current.clone();
    merged.extend(incoming);
    merged
}
