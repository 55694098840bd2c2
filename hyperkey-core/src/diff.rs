//! Structural differences between two layouts.
//!
//! One [`DetailedDiff`] feeds both the coarse import preview ([`DetailedDiff::summary`]) and the
//! per-key badges of the editor grid ([`DetailedDiff::key_tags`]).

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::{Bindings, Command, Config, Layer};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedDiff {
    pub layers_added: Vec<String>,
    pub layers_removed: Vec<String>,
    pub changed_layers: Vec<LayerChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayerChange {
    /// Switched between a single command and a sublayer; no finer diff is attempted.
    TypeChanged {
        key: String,
        before: Layer,
        after: Layer,
    },
    CommandChanged {
        key: String,
        before: Command,
        after: Command,
    },
    Sublayer {
        key: String,
        #[serde(flatten)]
        changes: SublayerDiff,
    },
}

impl LayerChange {
    pub fn key(&self) -> &str {
        match self {
            Self::TypeChanged { key, .. }
            | Self::CommandChanged { key, .. }
            | Self::Sublayer { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SublayerDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
    pub moved: Vec<Move>,
}

impl SublayerDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.is_empty()
            && self.moved.is_empty()
    }
}

/// The same command now lives on another inner key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Move {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub layers_added: usize,
    pub layers_removed: usize,
    pub layers_changed: usize,
    pub bindings_added: usize,
    pub bindings_removed: usize,
    pub bindings_changed: usize,
    pub bindings_moved: usize,
}

impl DiffSummary {
    pub fn total(&self) -> usize {
        self.layers_added + self.layers_removed + self.layers_changed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerTag {
    Added,
    Removed,
    Changed,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "camelCase")]
pub enum KeyChange {
    Added,
    Removed,
    Changed,
    /// This key received the command that used to live on the given key.
    MovedFrom(String),
    /// This key's command now lives on the given key.
    MovedTo(String),
}

impl DetailedDiff {
    pub fn is_empty(&self) -> bool {
        self.layers_added.is_empty()
            && self.layers_removed.is_empty()
            && self.changed_layers.is_empty()
    }

    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary {
            layers_added: self.layers_added.len(),
            layers_removed: self.layers_removed.len(),
            layers_changed: self.changed_layers.len(),
            ..DiffSummary::default()
        };
        for change in &self.changed_layers {
            if let LayerChange::Sublayer { changes, .. } = change {
                summary.bindings_added += changes.added.len();
                summary.bindings_removed += changes.removed.len();
                summary.bindings_changed += changes.changed.len();
                summary.bindings_moved += changes.moved.len();
            }
        }
        summary
    }

    pub fn layer_tag(&self, key: &str) -> Option<LayerTag> {
        if self.layers_added.iter().any(|k| k == key) {
            Some(LayerTag::Added)
        } else if self.layers_removed.iter().any(|k| k == key) {
            Some(LayerTag::Removed)
        } else if self.changed_layers.iter().any(|c| c.key() == key) {
            Some(LayerTag::Changed)
        } else {
            None
        }
    }

    pub fn layer_change(&self, key: &str) -> Option<&LayerChange> {
        self.changed_layers.iter().find(|c| c.key() == key)
    }

    /// Per inner key badges of one sublayer.
    pub fn key_tags(&self, layer: &str) -> IndexMap<String, KeyChange> {
        let mut tags = IndexMap::new();
        let Some(LayerChange::Sublayer { changes, .. }) = self.layer_change(layer) else {
            return tags;
        };
        for key in &changes.added {
            tags.insert(key.clone(), KeyChange::Added);
        }
        for key in &changes.removed {
            tags.insert(key.clone(), KeyChange::Removed);
        }
        for key in &changes.changed {
            tags.insert(key.clone(), KeyChange::Changed);
        }
        for Move { from, to } in &changes.moved {
            tags.insert(to.clone(), KeyChange::MovedFrom(from.clone()));
            tags.insert(from.clone(), KeyChange::MovedTo(to.clone()));
        }
        tags
    }
}

/// Compares `target` against `base`; a missing base makes every layer an addition.
pub fn diff(base: Option<&Config>, target: &Config) -> DetailedDiff {
    let empty = Config::default();
    let base = base.unwrap_or(&empty);

    let layers_added = target
        .layers
        .keys()
        .filter(|key| !base.layers.contains_key(*key))
        .cloned()
        .collect();
    let layers_removed = base
        .layers
        .keys()
        .filter(|key| !target.layers.contains_key(*key))
        .cloned()
        .collect();

    let mut changed_layers = Vec::new();
    for (key, before) in &base.layers {
        let Some(after) = target.layers.get(key) else {
            continue;
        };
        match (before, after) {
            (Layer::Single { command: old }, Layer::Single { command: new }) => {
                if old != new {
                    changed_layers.push(LayerChange::CommandChanged {
                        key: key.clone(),
                        before: old.clone(),
                        after: new.clone(),
                    });
                }
            }
            (Layer::Sublayer { commands: old }, Layer::Sublayer { commands: new }) => {
                let changes = diff_sublayer(old, new);
                if !changes.is_empty() {
                    changed_layers.push(LayerChange::Sublayer {
                        key: key.clone(),
                        changes,
                    });
                }
            }
            _ => changed_layers.push(LayerChange::TypeChanged {
                key: key.clone(),
                before: before.clone(),
                after: after.clone(),
            }),
        }
    }

    DetailedDiff {
        layers_added,
        layers_removed,
        changed_layers,
    }
}

/// Inner key differences, with removed/added pairs bound to an identical command reported as
/// moves. Pairing is positional per command, in map order.
pub fn diff_sublayer(base: &Bindings, target: &Bindings) -> SublayerDiff {
    let mut removed: Vec<&String> = base.keys().filter(|k| !target.contains_key(*k)).collect();
    let mut added: Vec<&String> = target.keys().filter(|k| !base.contains_key(*k)).collect();
    let changed = base
        .iter()
        .filter(|(key, command)| target.get(*key).is_some_and(|new| new != *command))
        .map(|(key, _)| key.clone())
        .collect();

    let mut removed_by_command: IndexMap<&Command, Vec<&String>> = IndexMap::new();
    for key in &removed {
        removed_by_command.entry(&base[*key]).or_default().push(key);
    }

    let mut moved = Vec::new();
    for key in &added {
        let candidates = removed_by_command.get_mut(&target[*key]);
        if let Some(from) = candidates.filter(|c| !c.is_empty()).map(|c| c.remove(0)) {
            moved.push(Move {
                from: from.clone(),
                to: (*key).clone(),
            });
        }
    }
    removed.retain(|key| !moved.iter().any(|m| &m.from == *key));
    added.retain(|key| !moved.iter().any(|m| &m.to == *key));

    SublayerDiff {
        added: added.into_iter().cloned().collect(),
        removed: removed.into_iter().cloned().collect(),
        changed,
        moved,
    }
}
