/// Test Helpers
#[cfg(test)]
pub(crate) mod test {
    use crate::config::command::{App, KeyPress, Raycast, Shell, Window};
    use crate::config::{Config, Layer};

    pub async fn temp_dir() -> std::io::Result<tempfile::TempDir> {
        tokio::task::spawn_blocking(tempfile::tempdir)
            .await
            .map_err(std::io::Error::other)?
    }

    /// A layout using every command kind, including the awkward literals.
    pub fn every_command() -> Config {
        Config::new()
            .with_layer(
                "spacebar",
                Layer::single(Raycast::new(
                    "raycast://extensions/stellate/mxstbr-commands/create-notion-todo",
                    false,
                )),
            )
            .with_layer(
                "o",
                Layer::sublayer([
                    ("v", App::new("Visual Studio Code").into()),
                    ("q", App::new("Bob's App").into()),
                    ("w", Window::new("left-half").into()),
                    ("a", Window::new("my action").into()),
                    ("c", Raycast::new("raycast://extensions/raycast/clipboard-history", true).into()),
                    ("s", Shell::new("osascript -e 'tell app \"Music\" to play'").into()),
                    ("t", Shell::new("echo `date` ${HOME} \\ done").into()),
                    ("e", KeyPress::new("escape", Vec::<String>::new()).into()),
                    ("h", KeyPress::new("h", ["right_command", "right_option"]).into()),
                ]),
            )
            .with_layer("m", Layer::single(KeyPress::new("vk_none", Vec::<String>::new())))
            .with_layer("my-key", Layer::single(App::new("Notes")))
    }
}

/// Source Testing
#[cfg(test)]
mod source {
    use super::test::every_command;
    use crate::config::Config;
    use crate::source::{generate_source, parse_source, try_parse_source};

    #[test]
    fn generated_source_parses_back() {
        let config = every_command();
        let source = generate_source(&config);
        assert_eq!(try_parse_source(&source).unwrap(), Some(config));
    }

    #[test]
    fn empty_layout_round_trips() {
        let source = generate_source(&Config::new());
        assert_eq!(parse_source(&source), Some(Config::new()));
    }

    #[test]
    fn regenerating_is_stable() {
        let source = generate_source(&every_command());
        let parsed = parse_source(&source).unwrap();
        assert_eq!(generate_source(&parsed), source);
    }
}

/// Codec Testing
#[cfg(test)]
mod codec {
    use super::test::every_command;
    use crate::config::command::{self, CommandDraft};

    #[test]
    fn every_command_decodes_to_itself() {
        for (_, _, original) in every_command().inner_bindings() {
            let literal = original.normalize();
            assert_eq!(&command::denormalize(&literal), original, "{literal}");

            let draft = CommandDraft::from(original);
            assert_eq!(&draft.clone().into_command(), original, "{draft:?}");
            assert_eq!(command::decode(&literal), draft);
        }
    }
}

/// Store Testing
#[cfg(test)]
mod store {
    use crate::config::command::App;
    use crate::config::{Config, Layer};
    use crate::store::EditorStore;

    #[test]
    fn undo_replays_back_to_the_start() {
        let start = Config::new().with_layer("o", Layer::sublayer([("s", App::new("Safari").into())]));
        let mut store = EditorStore::new(start.clone());

        let mut steps = 0;
        for n in 0..6 {
            store.set_layer("a", Layer::single(App::new(format!("App {n}"))));
            steps += 1;
            if n % 2 == 1 {
                assert!(store.undo());
                steps -= 1;
                assert!(store.redo());
                steps += 1;
                assert!(store.undo());
                steps -= 1;
            }
        }
        for _ in 0..steps {
            assert!(store.undo());
        }
        assert_eq!(store.config(), &start);
        assert!(!store.undo());
    }
}

/// Persistence Testing
#[cfg(test)]
mod persistence {
    use super::test::{every_command, temp_dir};
    use crate::persistence::{RecordStore, SaveQueue};
    use crate::store::{EditorStore, KeyFilter};

    #[tokio::test]
    async fn saved_state_hydrates_back() {
        let dir = temp_dir().await.unwrap();
        let records = RecordStore::new(dir.path());
        let queue = SaveQueue::new(records.clone());

        let mut store = EditorStore::new(every_command());
        store.set_filter(KeyFilter::Custom);
        store.toggle_lock("o");
        store.create_snapshot("before cleanup");
        store.delete_layer("m").unwrap();
        queue.save(&store.to_bundle()).unwrap().wait().await.unwrap();
        queue.close().await.unwrap();

        let bundle = records.load_bundle().await.unwrap().unwrap();
        let restored = EditorStore::hydrate(bundle, Some(every_command()));
        assert_eq!(restored.config(), store.config());
        assert_eq!(restored.filter(), KeyFilter::Custom);
        assert_eq!(restored.snapshots(), store.snapshots());
        assert!(restored.is_dirty());
        assert!(restored.history().is_empty());
    }
}
