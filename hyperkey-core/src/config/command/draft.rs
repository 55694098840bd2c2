use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{
    App, Command, KeyPress, NO_OP_KEY_CODE, NormalizedCommand, Raycast, Shell, Window,
    denormalize, utils::error::CommandError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    App,
    Window,
    Raycast,
    Shell,
    KeyPress,
}

impl CommandType {
    pub const ALL: [Self; 5] = [
        Self::App,
        Self::Window,
        Self::Raycast,
        Self::Shell,
        Self::KeyPress,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Window => "window",
            Self::Raycast => "raycast",
            Self::Shell => "shell",
            Self::KeyPress => "keypress",
        }
    }
}

impl Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandType {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "app" => Ok(Self::App),
            "window" => Ok(Self::Window),
            "raycast" => Ok(Self::Raycast),
            "shell" => Ok(Self::Shell),
            "keypress" | "key" => Ok(Self::KeyPress),
            other => Err(CommandError::UnknownType(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub ignore_focus: bool,
}

/// The editable, text-based form of a command.
///
/// Key presses are written as `modifier+modifier+key`, e.g. `right_command+h`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDraft {
    #[serde(rename = "type")]
    pub kind: CommandType,
    pub text: String,
    #[serde(default)]
    pub ignore_focus: bool,
}

impl CommandDraft {
    pub fn new(kind: CommandType, text: impl Into<String>, options: EncodeOptions) -> Self {
        Self {
            kind,
            text: text.into(),
            ignore_focus: options.ignore_focus,
        }
    }

    pub fn into_command(self) -> Command {
        let text = self.text.trim();
        match self.kind {
            CommandType::App => App::new(text).into(),
            CommandType::Window => Window::new(text).into(),
            CommandType::Raycast => Raycast::new(text, self.ignore_focus).into(),
            // Shell text is passed through untouched, surrounding whitespace included.
            CommandType::Shell => Shell::new(&self.text).into(),
            CommandType::KeyPress => parse_key_press(text).into(),
        }
    }
}

fn parse_key_press(text: &str) -> KeyPress {
    let mut parts: Vec<&str> = text
        .split('+')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    match parts.pop() {
        Some(key_code) => KeyPress::new(key_code, parts),
        None => KeyPress::new(NO_OP_KEY_CODE, Vec::<String>::new()),
    }
}

impl From<&Command> for CommandDraft {
    fn from(command: &Command) -> Self {
        let (kind, text, ignore_focus) = match command {
            Command::App(app) => (CommandType::App, app.app_name.clone(), false),
            Command::Window(window) => (CommandType::Window, window.action.clone(), false),
            Command::Raycast(raycast) => (
                CommandType::Raycast,
                raycast.deeplink.clone(),
                raycast.ignore_focus,
            ),
            Command::Shell(shell) => (CommandType::Shell, shell.command.clone(), false),
            Command::KeyPress(key_press) => {
                let mut parts = key_press.modifiers.clone();
                parts.push(key_press.key_code.clone());
                (CommandType::KeyPress, parts.join("+"), false)
            }
        };
        Self {
            kind,
            text,
            ignore_focus,
        }
    }
}

/// Builds the consumer literal for a command typed into the editor.
pub fn encode(kind: CommandType, text: &str, options: EncodeOptions) -> NormalizedCommand {
    CommandDraft::new(kind, text, options).into_command().normalize()
}

/// Reads a consumer literal back into its editable form.
pub fn decode(normalized: &NormalizedCommand) -> CommandDraft {
    CommandDraft::from(&denormalize(normalized))
}
