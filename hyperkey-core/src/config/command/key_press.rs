use serde::{Deserialize, Serialize};

use crate::config::command::utils::denormalize_function::DenormalizeCommandFunction;

use super::{CommandKind, NormalizedCommand};

inventory::submit! {DenormalizeCommandFunction::new::<KeyPress>(4, "keypress")}

/// Emits a synthetic key press.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPress {
    pub key_code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<String>,
}

impl KeyPress {
    pub fn new<K, I, M>(key_code: K, modifiers: I) -> Self
    where
        K: ToString,
        I: IntoIterator<Item = M>,
        M: ToString,
    {
        Self {
            key_code: key_code.to_string(),
            modifiers: modifiers.into_iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl CommandKind for KeyPress {
    fn normalize(&self) -> NormalizedCommand {
        NormalizedCommand::key(self.key_code.clone(), self.modifiers.clone())
    }

    fn denormalize(normalized: &NormalizedCommand) -> Option<Self> {
        let (key_code, modifiers) = normalized.key_press()?;
        Some(Self::new(key_code, modifiers))
    }

    fn get_name(&self) -> &'static str {
        "KeyPress"
    }
}

#[cfg(test)]
mod tests {
    use crate::config::command::CommandKind;

    use super::KeyPress;

    #[test]
    fn normalize_process() {
        for command in [
            KeyPress::new("escape", Vec::<String>::new()),
            KeyPress::new("h", ["right_command"]),
            KeyPress::new("4", ["left_command", "left_shift", "left_control"]),
        ] {
            let normalized = command.normalize();
            let denormalized = KeyPress::denormalize(&normalized).unwrap();

            assert_eq!(command, denormalized, "{:?}, {:?}", normalized, denormalized);
        }
    }
}
