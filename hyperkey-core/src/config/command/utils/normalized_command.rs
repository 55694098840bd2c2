use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A command in the literal shape the consumer format stores it in:
/// `{ to: [ { shell_command } | { key_code, modifiers } ], description? }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedCommand {
    #[serde(default)]
    pub to: Vec<ToEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToEvent {
    Shell {
        shell_command: String,
    },
    Key {
        key_code: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        modifiers: Vec<String>,
    },
    /// Anything else the consumer understands; kept verbatim, never decoded.
    Other(serde_json::Value),
}

impl NormalizedCommand {
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            to: vec![ToEvent::Shell {
                shell_command: command.into(),
            }],
            description: None,
        }
    }

    pub fn key(key_code: impl Into<String>, modifiers: Vec<String>) -> Self {
        Self {
            to: vec![ToEvent::Key {
                key_code: key_code.into(),
                modifiers,
            }],
            description: None,
        }
    }

    /// The only event of the literal. Literals with several events have none.
    pub fn single_event(&self) -> Option<&ToEvent> {
        match self.to.as_slice() {
            [event] => Some(event),
            _ => None,
        }
    }

    /// Whether one of the command kinds can hold this literal without losing events.
    pub fn is_decodable(&self) -> bool {
        matches!(self.single_event(), Some(ToEvent::Shell { .. } | ToEvent::Key { .. }))
    }

    /// The shell invocation of a single-event literal.
    pub fn shell_command(&self) -> Option<&str> {
        match self.single_event()? {
            ToEvent::Shell { shell_command } => Some(shell_command),
            _ => None,
        }
    }

    /// The key press of a single-event literal.
    pub fn key_press(&self) -> Option<(&str, &[String])> {
        match self.single_event()? {
            ToEvent::Key {
                key_code,
                modifiers,
            } => Some((key_code, modifiers)),
            _ => None,
        }
    }
}

impl TryFrom<String> for NormalizedCommand {
    type Error = serde_json::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        serde_json::from_str(&value)
    }
}

impl Display for NormalizedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(_) => Err(std::fmt::Error),
        }
    }
}
