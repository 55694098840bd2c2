//! The editor state container.
//!
//! [`EditorStore`] is the only writer of the live [`Config`]: every layout edit computes a new
//! layout and goes through [`EditorStore::set_config`], which records history, marks the store
//! dirty and drops cached selector results.

pub mod bundle;
pub mod history;
pub mod merge;
pub mod migrate;
pub mod selectors;
pub mod snapshot;
pub mod validate;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::config::{Command, Config, Layer};
use crate::diff::{self, DetailedDiff, DiffSummary};
use crate::errors::{Error, HyperError, Result};

pub use bundle::{Bundle, ExportEnvelope, ImportPayload, KeyFilter, SCHEMA_VERSION, Settings};
pub use history::History;
pub use selectors::{BaseData, Conflict, KeyClass, KeyFlags};
pub use snapshot::NamedSnapshot;

use selectors::Memo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Replace,
    Merge,
}

/// What an import would change, shown before it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportPreview {
    pub changes: DiffSummary,
    pub incoming_snapshots: usize,
}

#[derive(Debug)]
pub struct EditorStore {
    config: Config,
    last_saved_config: Config,
    last_saved_at: Option<DateTime<Utc>>,
    dirty: bool,
    history: History,
    snapshots: Vec<NamedSnapshot>,
    locks: IndexMap<String, bool>,
    blocked_keys: IndexMap<String, bool>,
    filter: KeyFilter,
    keyboard_layout: String,
    ai_key: Option<String>,
    settings: Settings,
    selected_layer: Option<String>,
    memo: Memo,
}

impl Default for EditorStore {
    fn default() -> Self {
        Self::hydrate(Bundle::default(), None)
    }
}

impl EditorStore {
    /// A clean store whose layout is also the saved one.
    pub fn new(config: Config) -> Self {
        let bundle = Bundle {
            config,
            ..Bundle::default()
        };
        Self::hydrate(bundle, None)
    }

    /// Restores a persisted bundle. `saved` is the layout currently on disk, when it could be
    /// read; without it the bundle's layout counts as saved.
    pub fn hydrate(bundle: Bundle, saved: Option<Config>) -> Self {
        let last_saved_config = saved.unwrap_or_else(|| bundle.config.clone());
        let dirty = bundle.config != last_saved_config;
        let mut snapshots = bundle.snapshots;
        snapshot::bound(&mut snapshots, bundle.settings.max_snapshots);
        Self {
            config: bundle.config,
            last_saved_config,
            last_saved_at: bundle.last_saved_at,
            dirty,
            history: History::with_limit(bundle.settings.history_limit),
            snapshots,
            locks: bundle.locks,
            blocked_keys: bundle.blocked_keys,
            filter: bundle.filter,
            keyboard_layout: bundle.keyboard_layout,
            ai_key: bundle.ai_key,
            settings: bundle.settings,
            selected_layer: None,
            memo: Memo::default(),
        }
    }

    pub fn to_bundle(&self) -> Bundle {
        Bundle {
            schema_version: SCHEMA_VERSION,
            config: self.config.clone(),
            locks: self.locks.clone(),
            blocked_keys: self.blocked_keys.clone(),
            filter: self.filter,
            keyboard_layout: self.keyboard_layout.clone(),
            ai_key: self.ai_key.clone(),
            last_saved_at: self.last_saved_at,
            snapshots: self.snapshots.clone(),
            settings: self.settings,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn last_saved_config(&self) -> &Config {
        &self.last_saved_config
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn snapshots(&self) -> &[NamedSnapshot] {
        &self.snapshots
    }

    pub fn locks(&self) -> &IndexMap<String, bool> {
        &self.locks
    }

    pub fn blocked_keys(&self) -> &IndexMap<String, bool> {
        &self.blocked_keys
    }

    pub fn filter(&self) -> KeyFilter {
        self.filter
    }

    pub fn keyboard_layout(&self) -> &str {
        &self.keyboard_layout
    }

    pub fn ai_key(&self) -> Option<&str> {
        self.ai_key.as_deref()
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn selected_layer(&self) -> Option<&str> {
        self.selected_layer.as_deref()
    }

    /// Swaps the live layout without touching history.
    fn replace_config(&mut self, config: Config) -> Config {
        self.memo.clear();
        std::mem::replace(&mut self.config, config)
    }

    pub fn set_config(&mut self, config: Config) {
        let previous = self.replace_config(config);
        self.history.push(previous);
        self.dirty = true;
    }

    pub fn add_layer(&mut self, key: &str, layer: Layer) -> Error {
        if self.config.layers.contains_key(key) {
            return Err(HyperError::LayerExists(key.to_owned()));
        }
        let mut config = self.config.clone();
        config.layers.insert(key.to_owned(), layer);
        self.set_config(config);
        Ok(())
    }

    /// Inserts or replaces a layer, keeping its position when it already exists.
    pub fn set_layer(&mut self, key: &str, layer: Layer) {
        let mut config = self.config.clone();
        config.layers.insert(key.to_owned(), layer);
        self.set_config(config);
    }

    pub fn delete_layer(&mut self, key: &str) -> Error {
        let mut config = self.config.clone();
        if config.layers.shift_remove(key).is_none() {
            return Err(HyperError::LayerNotFound(key.to_owned()));
        }
        if self.selected_layer.as_deref() == Some(key) {
            self.selected_layer = None;
        }
        self.set_config(config);
        Ok(())
    }

    fn edit_sublayer<F>(&mut self, layer: &str, edit: F) -> Error
    where
        F: FnOnce(&mut IndexMap<String, Command>) -> Error,
    {
        let mut config = self.config.clone();
        match config.layers.get_mut(layer) {
            None => return Err(HyperError::LayerNotFound(layer.to_owned())),
            Some(Layer::Single { .. }) => return Err(HyperError::NotASublayer(layer.to_owned())),
            Some(Layer::Sublayer { commands }) => edit(commands)?,
        }
        self.set_config(config);
        Ok(())
    }

    /// Binds `inner` in a sublayer, replacing any existing binding.
    pub fn add_command(&mut self, layer: &str, inner: &str, command: Command) -> Error {
        self.edit_sublayer(layer, |commands| {
            commands.insert(inner.to_owned(), command);
            Ok(())
        })
    }

    pub fn edit_command(&mut self, layer: &str, inner: &str, command: Command) -> Error {
        self.edit_sublayer(layer, |commands| match commands.get_mut(inner) {
            Some(existing) => {
                *existing = command;
                Ok(())
            }
            None => Err(HyperError::CommandNotFound {
                layer: layer.to_owned(),
                inner: inner.to_owned(),
            }),
        })
    }

    pub fn delete_command(&mut self, layer: &str, inner: &str) -> Error {
        self.edit_sublayer(layer, |commands| match commands.shift_remove(inner) {
            Some(_) => Ok(()),
            None => Err(HyperError::CommandNotFound {
                layer: layer.to_owned(),
                inner: inner.to_owned(),
            }),
        })
    }

    /// Returns `false` when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo(&self.config) else {
            return false;
        };
        self.replace_config(previous);
        self.dirty = true;
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo(&self.config) else {
            return false;
        };
        self.replace_config(next);
        self.dirty = true;
        true
    }

    /// Only to be called once the source is written, built and installed.
    pub fn mark_saved(&mut self) {
        self.mark_saved_at(Utc::now());
    }

    pub fn mark_saved_at(&mut self, at: DateTime<Utc>) {
        self.last_saved_config = self.config.clone();
        self.last_saved_at = Some(at);
        self.dirty = false;
        self.memo.clear();
    }

    /// Hard reset to the saved layout. History is discarded.
    pub fn revert_to_saved(&mut self) {
        let saved = self.last_saved_config.clone();
        self.replace_config(saved);
        self.history.clear();
        self.dirty = false;
    }

    pub fn create_snapshot(&mut self, name: &str) -> &NamedSnapshot {
        let snapshot = NamedSnapshot::new(name, self.config.clone());
        tracing::debug!("created snapshot {} ({})", snapshot.id, snapshot.name);
        self.snapshots.push(snapshot);
        snapshot::bound(&mut self.snapshots, self.settings.max_snapshots);
        let index = self.snapshots.len() - 1;
        &self.snapshots[index]
    }

    /// Undoable. Returns `false` for an unknown id.
    pub fn revert_to_snapshot(&mut self, id: &str) -> bool {
        let Some(snapshot) = self.snapshots.iter().find(|s| s.id == id) else {
            return false;
        };
        let config = snapshot.config.clone();
        self.set_config(config);
        true
    }

    pub fn delete_snapshot(&mut self, id: &str) -> bool {
        let before = self.snapshots.len();
        self.snapshots.retain(|s| s.id != id);
        self.snapshots.len() != before
    }

    pub fn set_filter(&mut self, filter: KeyFilter) {
        self.filter = filter;
    }

    pub fn set_keyboard_layout(&mut self, layout: impl Into<String>) {
        self.keyboard_layout = layout.into();
    }

    pub fn set_ai_key(&mut self, key: Option<String>) {
        self.ai_key = key.filter(|k| !k.is_empty());
    }

    pub fn select_layer(&mut self, layer: Option<&str>) {
        self.selected_layer = layer.map(str::to_owned);
    }

    /// Flips the lock on a key and returns its new state.
    pub fn toggle_lock(&mut self, key: &str) -> bool {
        toggle(&mut self.locks, key)
    }

    pub fn toggle_blocked_key(&mut self, key: &str) -> bool {
        toggle(&mut self.blocked_keys, key)
    }

    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.history.set_limit(settings.history_limit);
        snapshot::bound(&mut self.snapshots, settings.max_snapshots);
    }

    pub fn export_json(&self) -> Result<String> {
        let envelope = ExportEnvelope::new(self.config.clone());
        Ok(serde_json::to_string_pretty(&envelope)?)
    }

    pub fn import_preview(&self, payload: &ImportPayload) -> ImportPreview {
        ImportPreview {
            changes: diff::diff(Some(&self.config), payload.config()).summary(),
            incoming_snapshots: payload.snapshot_count(),
        }
    }

    /// Applies an import. The layout change is undoable; an envelope only carries a layout, so
    /// both modes just replace it.
    pub fn import(&mut self, payload: ImportPayload, mode: ImportMode) {
        let bundle = match payload {
            ImportPayload::Envelope(envelope) => {
                self.set_config(envelope.config);
                return;
            }
            ImportPayload::Bundle(bundle) => match mode {
                ImportMode::Replace => *bundle,
                ImportMode::Merge => merge::merge_bundles(&self.to_bundle(), *bundle),
            },
        };

        self.locks = bundle.locks;
        self.blocked_keys = bundle.blocked_keys;
        self.filter = bundle.filter;
        self.keyboard_layout = bundle.keyboard_layout;
        self.ai_key = bundle.ai_key;
        self.snapshots = bundle.snapshots;
        self.update_settings(bundle.settings);
        self.set_config(bundle.config);
    }

    pub fn inner_keys(&self, layer: &str) -> Vec<String> {
        self.memo
            .inner_keys
            .borrow_mut()
            .entry(layer.to_owned())
            .or_insert_with(|| selectors::inner_keys(&self.config, layer))
            .clone()
    }

    /// Inner keys of the selected layer.
    pub fn current_inner_keys(&self) -> Vec<String> {
        self.selected_layer
            .as_deref()
            .map(|layer| self.inner_keys(layer))
            .unwrap_or_default()
    }

    pub fn classify_key(&self, key: &str, base: &BaseData) -> KeyClass {
        let flags = KeyFlags {
            locks: &self.locks,
            blocked_keys: &self.blocked_keys,
        };
        selectors::classify_key(key, base, &self.config, flags)
    }

    pub fn conflicts(&self) -> &[Conflict] {
        self.memo
            .conflicts
            .get_or_init(|| selectors::conflicts(&self.config))
    }

    /// Live changes relative to the saved layout.
    pub fn saved_diff(&self) -> &DetailedDiff {
        self.memo
            .saved_diff
            .get_or_init(|| diff::diff(Some(&self.last_saved_config), &self.config))
    }
}

fn toggle(flags: &mut IndexMap<String, bool>, key: &str) -> bool {
    let enabled = !flags.get(key).copied().unwrap_or(false);
    if enabled {
        flags.insert(key.to_owned(), true);
    } else {
        flags.shift_remove(key);
    }
    enabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::command::{App, Shell, Window};
    use crate::diff::KeyChange;

    fn base_config() -> Config {
        Config::new()
            .with_layer("o", Layer::sublayer([("s", App::new("Safari").into())]))
            .with_layer("b", Layer::single(App::new("Arc")))
    }

    #[test]
    fn edits_go_through_history() {
        let mut store = EditorStore::new(base_config());
        assert!(!store.is_dirty());

        store.add_command("o", "n", App::new("Notes").into()).unwrap();
        store.delete_layer("b").unwrap();
        assert!(store.is_dirty());
        assert_eq!(store.history().len(), 2);
        assert_eq!(store.inner_keys("o"), ["s", "n"]);

        assert!(store.undo());
        assert!(store.undo());
        assert!(!store.undo());
        assert_eq!(store.config(), &base_config());
        assert!(store.redo());
        assert_eq!(store.inner_keys("o"), ["s", "n"]);
    }

    #[test]
    fn rejects_bad_targets() {
        let mut store = EditorStore::new(base_config());
        assert!(matches!(
            store.add_layer("o", Layer::single(App::new("X"))),
            Err(HyperError::LayerExists(_))
        ));
        assert!(matches!(store.delete_layer("z"), Err(HyperError::LayerNotFound(_))));
        assert!(matches!(
            store.add_command("b", "x", App::new("X").into()),
            Err(HyperError::NotASublayer(_))
        ));
        assert!(matches!(
            store.edit_command("o", "x", App::new("X").into()),
            Err(HyperError::CommandNotFound { .. })
        ));
        assert!(matches!(
            store.delete_command("o", "x"),
            Err(HyperError::CommandNotFound { .. })
        ));
        assert!(store.history().is_empty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn undo_after_undo_empty_stays_clean() {
        let mut store = EditorStore::new(base_config());
        assert!(!store.undo());
        assert!(!store.redo());
        assert!(!store.is_dirty());
    }

    #[test]
    fn ui_state_stays_out_of_history() {
        let mut store = EditorStore::new(base_config());
        store.set_filter(KeyFilter::Available);
        store.select_layer(Some("o"));
        store.set_keyboard_layout("iso");
        store.set_ai_key(Some("sk".to_owned()));
        assert!(store.toggle_lock("o"));
        assert!(store.toggle_blocked_key("tab"));
        assert!(!store.toggle_blocked_key("tab"));
        assert!(store.history().is_empty());
        assert!(!store.is_dirty());
        assert_eq!(store.current_inner_keys(), ["s"]);
        assert_eq!(store.locks().get("o"), Some(&true));
        assert!(store.blocked_keys().is_empty());
    }

    #[test]
    fn mark_saved_and_revert() {
        let mut store = EditorStore::new(base_config());
        store.edit_command("o", "s", Window::new("maximize").into()).unwrap();
        assert_eq!(store.saved_diff().key_tags("o")["s"], KeyChange::Changed);

        store.mark_saved();
        assert!(!store.is_dirty());
        assert!(store.last_saved_at().is_some());
        assert!(store.saved_diff().is_empty());

        store.delete_command("o", "s").unwrap();
        store.revert_to_saved();
        assert!(!store.is_dirty());
        assert!(store.history().is_empty());
        assert_eq!(store.config(), store.last_saved_config());
    }

    #[test]
    fn snapshots_are_bounded_and_undoable() {
        let mut store = EditorStore::new(base_config());
        store.update_settings(Settings {
            max_snapshots: 2,
            history_limit: 100,
        });
        let first = store.create_snapshot("first").id.clone();
        store.set_layer("b", Layer::single(Shell::new("say hi")));
        store.create_snapshot("second");
        store.create_snapshot("third");
        assert_eq!(store.snapshots().len(), 2);
        assert!(!store.revert_to_snapshot(&first));

        let second = store.snapshots()[0].id.clone();
        store.set_config(Config::new());
        let before = store.history().len();
        assert!(store.revert_to_snapshot(&second));
        assert_eq!(store.history().len(), before + 1);
        assert_eq!(store.config().layer("b"), Some(&Layer::single(Shell::new("say hi"))));
        assert!(store.undo());
        assert!(store.config().is_empty());

        assert!(store.delete_snapshot(&second));
        assert!(!store.delete_snapshot(&second));
    }

    #[test]
    fn history_respects_the_configured_limit() {
        let mut store = EditorStore::new(Config::new());
        store.update_settings(Settings {
            max_snapshots: 20,
            history_limit: 5,
        });
        for n in 0..12 {
            store.set_layer("a", Layer::single(App::new(format!("App {n}"))));
        }
        assert_eq!(store.history().len(), 5);
    }

    #[test]
    fn memoised_conflicts_follow_edits() {
        let mut store = EditorStore::new(
            Config::new()
                .with_layer("a", Layer::sublayer([("x", App::new("1").into())]))
                .with_layer("s", Layer::sublayer([("y", App::new("2").into())])),
        );
        assert!(store.conflicts().is_empty());
        store.add_command("s", "x", App::new("3").into()).unwrap();
        assert_eq!(store.conflicts().len(), 1);
        assert_eq!(store.conflicts()[0].outer, ["a", "s"]);
    }

    #[test]
    fn hydrate_compares_against_the_file() {
        let bundle = Bundle {
            config: base_config(),
            ..Bundle::default()
        };
        assert!(!EditorStore::hydrate(bundle.clone(), None).is_dirty());
        assert!(EditorStore::hydrate(bundle.clone(), Some(Config::new())).is_dirty());

        let store = EditorStore::hydrate(bundle, None);
        assert_eq!(store.to_bundle().config, base_config());
    }

    #[test]
    fn locked_layers_classify_as_locked() {
        let mut store = EditorStore::new(base_config());
        let base = BaseData::default();
        assert_eq!(store.classify_key("o", &base), KeyClass::Sublayer);
        store.toggle_lock("o");
        assert_eq!(store.classify_key("o", &base), KeyClass::Locked);
        store.toggle_lock("o");
        assert_eq!(store.classify_key("o", &base), KeyClass::Sublayer);
    }

    #[test]
    fn hydrate_evicts_the_oldest_snapshot_whatever_the_order() {
        use chrono::TimeZone;

        let at = |minute| Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap();
        let bundle = Bundle {
            snapshots: vec![
                NamedSnapshot::at("newest", Config::new(), at(30)),
                NamedSnapshot::at("oldest", Config::new(), at(1)),
                NamedSnapshot::at("middle", Config::new(), at(10)),
            ],
            settings: Settings {
                max_snapshots: 2,
                history_limit: 100,
            },
            ..Bundle::default()
        };

        let store = EditorStore::hydrate(bundle.clone(), None);
        let names: Vec<_> = store.snapshots().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["middle", "newest"]);

        let mut store = EditorStore::default();
        store.import(ImportPayload::Bundle(Box::new(bundle)), ImportMode::Replace);
        let names: Vec<_> = store.snapshots().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["middle", "newest"]);
    }

    #[test]
    fn imports_replace_or_merge() {
        let mut store = EditorStore::new(base_config());
        store.toggle_lock("o");
        store.create_snapshot("mine");

        let incoming = Bundle {
            config: Config::new().with_layer("w", Layer::single(Window::new("maximize"))),
            locks: IndexMap::from([("w".to_owned(), true)]),
            snapshots: vec![NamedSnapshot::new("theirs", Config::new())],
            ..Bundle::default()
        };
        let payload = ImportPayload::Bundle(Box::new(incoming.clone()));
        let preview = store.import_preview(&payload);
        assert_eq!(preview.changes.layers_added, 1);
        assert_eq!(preview.changes.layers_removed, 2);
        assert_eq!(preview.incoming_snapshots, 1);

        store.import(payload, ImportMode::Merge);
        assert_eq!(store.config(), &incoming.config);
        assert_eq!(store.locks().len(), 2);
        assert_eq!(store.snapshots().len(), 2);
        assert!(store.is_dirty());

        store.import(ImportPayload::Bundle(Box::new(incoming)), ImportMode::Replace);
        assert_eq!(store.locks().len(), 1);
        assert_eq!(store.snapshots().len(), 1);

        assert!(store.undo());
        let exported = store.export_json().unwrap();
        let ImportPayload::Envelope(envelope) = ImportPayload::parse(&exported).unwrap() else {
            panic!("export should produce an envelope");
        };
        assert_eq!(&envelope.config, store.config());
    }
}
