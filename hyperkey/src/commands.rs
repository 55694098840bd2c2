use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::ArgMatches;
use hyperkey_core::config::command::{CommandDraft, CommandType, EncodeOptions};
use hyperkey_core::config::key::KEY_CODES;
use hyperkey_core::config::{Config as Layout, Layer};
use hyperkey_core::deploy;
use hyperkey_core::diff::{self, DetailedDiff, LayerChange};
use hyperkey_core::errors::{HyperError, SourceError};
use hyperkey_core::persistence::{RecordStore, SaveQueue};
use hyperkey_core::source::{generate_source, try_parse_source};
use hyperkey_core::store::{BaseData, Conflict, EditorStore, ImportMode, ImportPayload, KeyFilter};

use crate::config::Config;
use crate::errors::{CliError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Show { filter: Option<KeyFilter> },
    Diff { old: PathBuf, new: PathBuf },
    Conflicts,
    Generate,
    Bind {
        layer: String,
        inner: Option<String>,
        draft: CommandDraft,
    },
    Unbind { layer: String, inner: Option<String> },
    SnapshotCreate(String),
    SnapshotList,
    SnapshotRestore(String),
    SnapshotDelete(String),
    Export(PathBuf),
    Import {
        path: PathBuf,
        mode: ImportMode,
        preview: bool,
    },
    Apply,
}

fn required<'a>(matches: &'a ArgMatches, name: &'static str) -> Result<&'a String> {
    matches
        .get_one::<String>(name)
        .ok_or(CliError::MissingArgument(name))
}

fn path(matches: &ArgMatches, name: &'static str) -> Result<PathBuf> {
    required(matches, name).map(PathBuf::from)
}

impl Action {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let Some((name, sub)) = matches.subcommand() else {
            return Ok(Self::Show { filter: None });
        };
        Ok(match name {
            "show" => Self::Show {
                filter: sub
                    .get_one::<String>("filter")
                    .map(|f| f.parse::<KeyFilter>())
                    .transpose()?,
            },
            "diff" => Self::Diff {
                old: path(sub, "old")?,
                new: path(sub, "new")?,
            },
            "conflicts" => Self::Conflicts,
            "generate" => Self::Generate,
            "bind" => {
                let kind: CommandType = required(sub, "type")?.parse()?;
                let options = EncodeOptions {
                    ignore_focus: sub.get_flag("ignore-focus"),
                };
                Self::Bind {
                    layer: required(sub, "layer")?.clone(),
                    inner: sub.get_one::<String>("inner").cloned(),
                    draft: CommandDraft::new(kind, required(sub, "text")?.as_str(), options),
                }
            }
            "unbind" => Self::Unbind {
                layer: required(sub, "layer")?.clone(),
                inner: sub.get_one::<String>("inner").cloned(),
            },
            "snapshot" => match sub.subcommand() {
                Some(("create", args)) => Self::SnapshotCreate(required(args, "name")?.clone()),
                Some(("restore", args)) => Self::SnapshotRestore(required(args, "id")?.clone()),
                Some(("delete", args)) => Self::SnapshotDelete(required(args, "id")?.clone()),
                _ => Self::SnapshotList,
            },
            "export" => Self::Export(path(sub, "file")?),
            "import" => Self::Import {
                path: path(sub, "file")?,
                mode: if sub.get_flag("merge") {
                    ImportMode::Merge
                } else {
                    ImportMode::Replace
                },
                preview: sub.get_flag("preview"),
            },
            "apply" => Self::Apply,
            _ => Self::Show { filter: None },
        })
    }

    /// Whether the action never changes the stored bundle.
    fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::Show { filter: None }
                | Self::Diff { .. }
                | Self::Conflicts
                | Self::Generate
                | Self::SnapshotList
                | Self::Export(_)
                | Self::Import { preview: true, .. }
        )
    }
}

/// The editor store loaded from disk, with the queue that writes it back.
pub struct Session {
    records: RecordStore,
    store: EditorStore,
    queue: SaveQueue,
    /// Set when the rules file exists but could not be parsed.
    source_error: Option<SourceError>,
}

impl Session {
    pub async fn open(config: &Config, records: RecordStore) -> Result<Self> {
        let (saved, source_error) = match deploy::load_source(&config.source_path()).await {
            // Without a rules file nothing counts as saved yet.
            Ok(saved) => (Some(saved.unwrap_or_default()), None),
            Err(HyperError::Source(err)) => {
                tracing::error!("Unable to parse {}: {}", config.source_path().display(), err);
                (None, Some(err))
            }
            Err(err) => return Err(err.into()),
        };
        let store = match records.load_bundle().await? {
            Some(bundle) => EditorStore::hydrate(bundle, saved),
            None => EditorStore::new(saved.unwrap_or_default()),
        };
        let queue = SaveQueue::new(records.clone());
        Ok(Self {
            records,
            store,
            queue,
            source_error,
        })
    }

    pub fn store(&self) -> &EditorStore {
        &self.store
    }

    pub fn source_error(&self) -> Option<&SourceError> {
        self.source_error.as_ref()
    }

    pub async fn close(self, persist: bool) -> Result<()> {
        if persist {
            self.queue.save(&self.store.to_bundle())?.wait().await?;
        }
        self.queue.close().await?;
        Ok(())
    }
}

pub async fn run(action: Action, config: &Config) -> Result<String> {
    if let Action::Diff { old, new } = &action {
        return diff_files(old, new).await;
    }
    let mut session = Session::open(config, config.records()?).await?;
    let persist = !action.is_read_only();
    if let Some(err) = session.source_error().filter(|_| persist).cloned() {
        session.close(false).await?;
        return Err(CliError::UnparsedSource {
            path: config.source_path().display().to_string(),
            source: err,
        });
    }
    let output = execute(action, config, &mut session).await;
    session.close(persist && output.is_ok()).await?;
    output
}

async fn execute(action: Action, config: &Config, session: &mut Session) -> Result<String> {
    let store = &mut session.store;
    Ok(match action {
        Action::Show { filter } => {
            if let Some(filter) = filter {
                store.set_filter(filter);
            }
            let mut out = String::new();
            if let Some(err) = &session.source_error {
                let path = config.source_path();
                let _ = writeln!(out, "! {} could not be parsed: {err}", path.display());
            }
            out.push_str(&render_store(store, config));
            out
        }
        Action::Diff { .. } => String::new(),
        Action::Conflicts => render_conflicts(store.conflicts()),
        Action::Generate => generate_source(store.config()),
        Action::Bind {
            layer,
            inner,
            draft,
        } => {
            let command = draft.into_command();
            let exists = store.config().layer(&layer).is_some();
            match inner {
                None => store.set_layer(&layer, Layer::single(command)),
                Some(inner) if exists => store.add_command(&layer, &inner, command)?,
                Some(inner) => store.add_layer(&layer, Layer::sublayer([(inner, command)]))?,
            }
            render_saved_diff(store.saved_diff())
        }
        Action::Unbind { layer, inner } => {
            match inner {
                Some(inner) => store.delete_command(&layer, &inner)?,
                None => store.delete_layer(&layer)?,
            }
            render_saved_diff(store.saved_diff())
        }
        Action::SnapshotCreate(name) => {
            let snapshot = store.create_snapshot(&name);
            format!("{}\n", snapshot.id)
        }
        Action::SnapshotList => store
            .snapshots()
            .iter()
            .map(|s| format!("{}  {}  {}\n", s.id, s.created_at.to_rfc3339(), s.name))
            .collect(),
        Action::SnapshotRestore(id) => {
            if !store.revert_to_snapshot(&id) {
                tracing::warn!("no snapshot with id {}", id);
            }
            render_saved_diff(store.saved_diff())
        }
        Action::SnapshotDelete(id) => {
            if !store.delete_snapshot(&id) {
                tracing::warn!("no snapshot with id {}", id);
            }
            String::new()
        }
        Action::Export(path) => {
            tokio::fs::write(&path, store.export_json()?).await?;
            format!("exported to {}\n", path.display())
        }
        Action::Import {
            path,
            mode,
            preview,
        } => {
            let payload = ImportPayload::parse(&tokio::fs::read_to_string(&path).await?)?;
            let summary = store.import_preview(&payload);
            let mut out = format!(
                "layers: +{} -{} ~{}\nbindings: +{} -{} ~{} moved {}\nsnapshots: {}\n",
                summary.changes.layers_added,
                summary.changes.layers_removed,
                summary.changes.layers_changed,
                summary.changes.bindings_added,
                summary.changes.bindings_removed,
                summary.changes.bindings_changed,
                summary.changes.bindings_moved,
                summary.incoming_snapshots,
            );
            if !preview {
                session.records.backup(&store.to_bundle()).await?;
                store.import(payload, mode);
                out.push_str("imported\n");
            }
            out
        }
        Action::Apply => {
            deploy::apply(store, &config.source_path(), &config.toolchain()).await?;
            format!("applied {}\n", config.source_path().display())
        }
    })
}

async fn diff_files(old: &Path, new: &Path) -> Result<String> {
    let old = read_layout(old).await?;
    let new = read_layout(new).await?;
    Ok(render_diff(&diff::diff(Some(&old), &new)))
}

async fn read_layout(path: &Path) -> Result<Layout> {
    let text = tokio::fs::read_to_string(path).await?;
    try_parse_source(&text)?.ok_or_else(|| CliError::NoLayers(path.display().to_string()))
}

fn draft_text(draft: &CommandDraft) -> String {
    if draft.ignore_focus {
        format!("{} {} (background)", draft.kind, draft.text)
    } else {
        format!("{} {}", draft.kind, draft.text)
    }
}

pub fn render_store(store: &EditorStore, config: &Config) -> String {
    let base = config.base_data();
    let tags = store.saved_diff();
    let mut out = String::new();
    if store.is_dirty() {
        out.push_str("* unsaved changes\n");
    }
    for (key, layer) in &store.config().layers {
        let class = store.classify_key(key, &base);
        if !store.filter().matches(class) {
            continue;
        }
        let badge = tags
            .layer_tag(key)
            .map(|tag| format!(" [{tag:?}]").to_lowercase())
            .unwrap_or_default();
        match layer {
            Layer::Single { command } => {
                let _ = writeln!(out, "{key}{badge}: {}", draft_text(&CommandDraft::from(command)));
            }
            Layer::Sublayer { commands } => {
                let _ = writeln!(out, "{key}{badge}:");
                let key_tags = tags.key_tags(key);
                for (inner, command) in commands {
                    let inner_badge = key_tags
                        .get(inner)
                        .map(|tag| format!(" [{tag:?}]"))
                        .unwrap_or_default();
                    let _ = writeln!(
                        out,
                        "  {inner}{inner_badge}: {}",
                        draft_text(&CommandDraft::from(command))
                    );
                }
            }
        }
    }
    // The default view lists bound layers only.
    if store.filter() != KeyFilter::All {
        for key in unbound_keys(store.config(), &base) {
            let class = store.classify_key(key, &base);
            if store.filter().matches(class) {
                let _ = writeln!(out, "{key} ({})", format!("{class:?}").to_lowercase());
            }
        }
    }
    let conflicts = store.conflicts();
    if !conflicts.is_empty() {
        let _ = writeln!(out, "{} conflicting inner key(s)", conflicts.len());
    }
    out
}

/// Known key codes plus the keys named by the base data, minus the bound ones.
fn unbound_keys<'a>(layout: &'a Layout, base: &'a BaseData) -> impl Iterator<Item = &'a str> {
    let named = base.reserved.iter().chain(&base.third_party).map(String::as_str);
    let mut seen = HashSet::new();
    KEY_CODES
        .iter()
        .copied()
        .chain(named)
        .filter(move |key| layout.layer(key).is_none() && seen.insert(*key))
}

pub fn render_conflicts(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| format!("{}  {}  {}\n", c.key, c.count, c.outer.join(", ")))
        .collect()
}

pub fn render_saved_diff(diff: &DetailedDiff) -> String {
    if diff.is_empty() {
        "no unsaved changes\n".to_owned()
    } else {
        render_diff(diff)
    }
}

pub fn render_diff(diff: &DetailedDiff) -> String {
    let mut out = String::new();
    for key in &diff.layers_added {
        let _ = writeln!(out, "+ {key}");
    }
    for key in &diff.layers_removed {
        let _ = writeln!(out, "- {key}");
    }
    for change in &diff.changed_layers {
        match change {
            LayerChange::TypeChanged { key, before, after } => {
                let _ = writeln!(out, "~ {key}: {} -> {}", before.kind_name(), after.kind_name());
            }
            LayerChange::CommandChanged { key, before, after } => {
                let _ = writeln!(
                    out,
                    "~ {key}: {} -> {}",
                    draft_text(&CommandDraft::from(before)),
                    draft_text(&CommandDraft::from(after))
                );
            }
            LayerChange::Sublayer { key, changes } => {
                let _ = writeln!(out, "~ {key}:");
                for inner in &changes.added {
                    let _ = writeln!(out, "  + {inner}");
                }
                for inner in &changes.removed {
                    let _ = writeln!(out, "  - {inner}");
                }
                for inner in &changes.changed {
                    let _ = writeln!(out, "  ~ {inner}");
                }
                for moved in &changes.moved {
                    let _ = writeln!(out, "  > {} -> {}", moved.from, moved.to);
                }
            }
        }
    }
    out
}
