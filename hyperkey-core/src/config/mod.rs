pub mod command;
pub mod key;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use command::Command;

/// Inner key code to command bindings of a sublayer.
pub type Bindings = IndexMap<String, Command>;

/// What a trigger key does while Hyper is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Layer {
    /// Holding the trigger key opens a layer of inner keys.
    Sublayer { commands: Bindings },
    /// The trigger key runs a single command directly.
    #[serde(rename = "command")]
    Single { command: Command },
}

impl Layer {
    pub fn sublayer<I, K>(commands: I) -> Self
    where
        I: IntoIterator<Item = (K, Command)>,
        K: Into<String>,
    {
        Self::Sublayer {
            commands: commands.into_iter().map(|(k, c)| (k.into(), c)).collect(),
        }
    }

    pub fn single(command: impl Into<Command>) -> Self {
        Self::Single {
            command: command.into(),
        }
    }

    pub fn is_sublayer(&self) -> bool {
        matches!(self, Self::Sublayer { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Sublayer { .. } => "sublayer",
            Self::Single { .. } => "command",
        }
    }

    pub fn commands(&self) -> Option<&Bindings> {
        match self {
            Self::Sublayer { commands } => Some(commands),
            Self::Single { .. } => None,
        }
    }
}

/// The whole Hyper key layout, keyed by trigger key code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub layers: IndexMap<String, Layer>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, key: impl Into<String>, layer: Layer) -> Self {
        self.layers.insert(key.into(), layer);
        self
    }

    pub fn layer(&self, key: &str) -> Option<&Layer> {
        self.layers.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Every `(trigger, inner, command)` triple of the sublayers, in map order.
    pub fn inner_bindings(&self) -> impl Iterator<Item = (&str, &str, &Command)> {
        self.layers.iter().flat_map(|(outer, layer)| {
            layer
                .commands()
                .into_iter()
                .flat_map(move |commands| {
                    commands
                        .iter()
                        .map(move |(inner, command)| (outer.as_str(), inner.as_str(), command))
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::command::{App, KeyPress};
    use super::*;

    #[test]
    fn serializes_with_type_tags() {
        let config = Config::new()
            .with_layer("o", Layer::sublayer([("s", App::new("Safari").into())]))
            .with_layer("spacebar", Layer::single(KeyPress::new("escape", Vec::<String>::new())));

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "layers": {
                    "o": {
                        "type": "sublayer",
                        "commands": { "s": { "type": "app", "appName": "Safari" } }
                    },
                    "spacebar": {
                        "type": "command",
                        "command": { "type": "keypress", "keyCode": "escape" }
                    }
                }
            })
        );
        let back: Config = serde_json::from_value(value).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn keeps_insertion_order() {
        let config = Config::new()
            .with_layer("z", Layer::single(App::new("Zed")))
            .with_layer("a", Layer::single(App::new("Arc")));
        let keys: Vec<_> = config.layers.keys().cloned().collect();
        assert_eq!(keys, ["z", "a"]);
    }

    #[test]
    fn walks_inner_bindings() {
        let config = Config::new()
            .with_layer("o", Layer::sublayer([("s", App::new("Safari").into())]))
            .with_layer("b", Layer::single(App::new("Arc")));
        let triples: Vec<_> = config
            .inner_bindings()
            .map(|(outer, inner, _)| (outer, inner))
            .collect();
        assert_eq!(triples, [("o", "s")]);
    }
}
