//! Read-only views over the live layout, plus the memo cells the store keeps for them.

use std::cell::{OnceCell, RefCell};
use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::Config;
use crate::diff::DetailedDiff;

/// How a trigger key shows up in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyClass {
    /// Reserved by the base rules, or locked or blocked by the user.
    Locked,
    Sublayer,
    /// Bound to a single command.
    Custom,
    /// Used by rules outside the Hyper layout.
    ThirdParty,
    Available,
}

/// What the rules outside the Hyper layout already claim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseData {
    pub reserved: BTreeSet<String>,
    pub third_party: BTreeSet<String>,
}

impl BaseData {
    pub fn new<R, T>(reserved: R, third_party: T) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            reserved: reserved.into_iter().map(Into::into).collect(),
            third_party: third_party.into_iter().map(Into::into).collect(),
        }
    }
}

/// An inner key bound in more than one sublayer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub key: String,
    pub outer: Vec<String>,
    pub count: usize,
}

pub fn inner_keys(config: &Config, layer: &str) -> Vec<String> {
    config
        .layer(layer)
        .and_then(|layer| layer.commands())
        .map(|commands| commands.keys().cloned().collect())
        .unwrap_or_default()
}

/// The user's per-key flags: `locks` protect bound layers, `blocked_keys` keep keys free.
#[derive(Debug, Clone, Copy)]
pub struct KeyFlags<'a> {
    pub locks: &'a IndexMap<String, bool>,
    pub blocked_keys: &'a IndexMap<String, bool>,
}

impl KeyFlags<'_> {
    fn locked(&self, key: &str) -> bool {
        let set = |flags: &IndexMap<String, bool>| flags.get(key).copied().unwrap_or(false);
        set(self.locks) || set(self.blocked_keys)
    }
}

pub fn classify_key(key: &str, base: &BaseData, config: &Config, flags: KeyFlags<'_>) -> KeyClass {
    if base.reserved.contains(key) || flags.locked(key) {
        return KeyClass::Locked;
    }
    match config.layer(key) {
        Some(layer) if layer.is_sublayer() => KeyClass::Sublayer,
        Some(_) => KeyClass::Custom,
        None if base.third_party.contains(key) => KeyClass::ThirdParty,
        None => KeyClass::Available,
    }
}

/// Ordered by descending count, then by key.
pub fn conflicts(config: &Config) -> Vec<Conflict> {
    let mut seen: IndexMap<&str, Vec<String>> = IndexMap::new();
    for (outer, inner, _) in config.inner_bindings() {
        seen.entry(inner).or_default().push(outer.to_owned());
    }
    let mut conflicts: Vec<Conflict> = seen
        .into_iter()
        .filter(|(_, outer)| outer.len() > 1)
        .map(|(key, outer)| Conflict {
            key: key.to_owned(),
            count: outer.len(),
            outer,
        })
        .collect();
    conflicts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    conflicts
}

/// Cached selector results. Cleared whenever the live or saved layout changes.
#[derive(Debug, Default)]
pub(crate) struct Memo {
    pub conflicts: OnceCell<Vec<Conflict>>,
    pub saved_diff: OnceCell<DetailedDiff>,
    pub inner_keys: RefCell<HashMap<String, Vec<String>>>,
}

impl Memo {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Layer;
    use crate::config::command::{App, Command, Shell};

    fn app(name: &str) -> Command {
        App::new(name).into()
    }

    #[test]
    fn orders_conflicts_by_count_then_key() {
        let config = Config::new()
            .with_layer("a", Layer::sublayer([("x", app("1")), ("y", app("2"))]))
            .with_layer("s", Layer::sublayer([("x", app("3")), ("y", app("4"))]))
            .with_layer("d", Layer::sublayer([("y", app("5")), ("z", app("6"))]));

        assert_eq!(
            conflicts(&config),
            [
                Conflict {
                    key: "y".to_owned(),
                    outer: vec!["a".to_owned(), "s".to_owned(), "d".to_owned()],
                    count: 3,
                },
                Conflict {
                    key: "x".to_owned(),
                    outer: vec!["a".to_owned(), "s".to_owned()],
                    count: 2,
                },
            ]
        );
    }

    #[test]
    fn ties_sort_by_key() {
        let config = Config::new()
            .with_layer("a", Layer::sublayer([("q", app("1")), ("b", app("2"))]))
            .with_layer("s", Layer::sublayer([("q", app("3")), ("b", app("4"))]));
        let keys: Vec<_> = conflicts(&config).into_iter().map(|c| c.key).collect();
        assert_eq!(keys, ["b", "q"]);
    }

    #[test]
    fn classifies_keys() {
        let config = Config::new()
            .with_layer("o", Layer::sublayer([("s", app("Safari"))]))
            .with_layer("b", Layer::single(Shell::new("say hi")))
            .with_layer("q", Layer::single(app("Mail")));
        let base = BaseData::new(["caps_lock"], ["f", "q"]);
        let locks = IndexMap::from([("b".to_owned(), true), ("o".to_owned(), false)]);
        let blocked = IndexMap::from([("tab".to_owned(), true), ("j".to_owned(), false)]);
        let flags = KeyFlags {
            locks: &locks,
            blocked_keys: &blocked,
        };

        assert_eq!(classify_key("caps_lock", &base, &config, flags), KeyClass::Locked);
        assert_eq!(classify_key("tab", &base, &config, flags), KeyClass::Locked);
        assert_eq!(classify_key("o", &base, &config, flags), KeyClass::Sublayer);
        assert_eq!(classify_key("b", &base, &config, flags), KeyClass::Locked);
        assert_eq!(classify_key("q", &base, &config, flags), KeyClass::Custom);
        assert_eq!(classify_key("f", &base, &config, flags), KeyClass::ThirdParty);
        assert_eq!(classify_key("j", &base, &config, flags), KeyClass::Available);
    }

    #[test]
    fn inner_keys_of_missing_or_single_layers_are_empty() {
        let config = Config::new()
            .with_layer("o", Layer::sublayer([("s", app("Safari")), ("n", app("Notes"))]))
            .with_layer("b", Layer::single(app("Arc")));
        assert_eq!(inner_keys(&config, "o"), ["s", "n"]);
        assert!(inner_keys(&config, "b").is_empty());
        assert!(inner_keys(&config, "z").is_empty());
    }
}
