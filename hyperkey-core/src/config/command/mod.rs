mod app;
mod draft;
mod key_press;
mod raycast;
mod shell;
mod window;

pub mod utils;

use serde::{Deserialize, Serialize};

use self::utils::denormalize_function::DenormalizeCommandFunction;

pub use self::{
    app::App,
    draft::{CommandDraft, CommandType, EncodeOptions, decode, encode},
    key_press::KeyPress,
    raycast::Raycast,
    shell::Shell,
    window::{WINDOW_ACTIONS, Window},
};
pub use self::utils::error::CommandError;
pub use self::utils::normalized_command::{NormalizedCommand, ToEvent};

inventory::collect!(DenormalizeCommandFunction);

/// Key code of the placeholder produced for literals nothing else claims.
pub const NO_OP_KEY_CODE: &str = "vk_none";

/// One kind of command: how it is written as a consumer literal and read back.
pub trait CommandKind: Into<Command> + Sized {
    fn normalize(&self) -> NormalizedCommand;

    fn denormalize(normalized: &NormalizedCommand) -> Option<Self>;

    fn get_name(&self) -> &'static str;
}

/// What a key binding does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Command {
    App(App),
    Window(Window),
    Raycast(Raycast),
    Shell(Shell),
    KeyPress(KeyPress),
}

impl Command {
    pub fn normalize(&self) -> NormalizedCommand {
        match self {
            Self::App(command) => command.normalize(),
            Self::Window(command) => command.normalize(),
            Self::Raycast(command) => command.normalize(),
            Self::Shell(command) => command.normalize(),
            Self::KeyPress(command) => command.normalize(),
        }
    }

    pub fn get_name(&self) -> &'static str {
        match self {
            Self::App(command) => command.get_name(),
            Self::Window(command) => command.get_name(),
            Self::Raycast(command) => command.get_name(),
            Self::Shell(command) => command.get_name(),
            Self::KeyPress(command) => command.get_name(),
        }
    }

    /// The stand-in used when a literal cannot be decoded.
    pub fn no_op() -> Self {
        Self::KeyPress(KeyPress::new(NO_OP_KEY_CODE, Vec::<String>::new()))
    }
}

impl From<App> for Command {
    fn from(command: App) -> Self {
        Self::App(command)
    }
}

impl From<Window> for Command {
    fn from(command: Window) -> Self {
        Self::Window(command)
    }
}

impl From<Raycast> for Command {
    fn from(command: Raycast) -> Self {
        Self::Raycast(command)
    }
}

impl From<Shell> for Command {
    fn from(command: Shell) -> Self {
        Self::Shell(command)
    }
}

impl From<KeyPress> for Command {
    fn from(command: KeyPress) -> Self {
        Self::KeyPress(command)
    }
}

/// Registered decoders in the order they must be tried.
pub fn denormalizers() -> Vec<&'static DenormalizeCommandFunction> {
    let mut all: Vec<_> = inventory::iter::<DenormalizeCommandFunction>
        .into_iter()
        .collect();
    all.sort_by_key(|denormalizer| denormalizer.priority);
    all
}

pub fn try_denormalize(normalized: &NormalizedCommand) -> Result<Command, CommandError> {
    for denormalizer in denormalizers() {
        if let Some(command) = (denormalizer.denormalize)(normalized) {
            return Ok(command);
        }
    }
    Err(CommandError::UnmatchingCommand)
}

/// Decodes a literal, falling back to the no-op key press so callers always get something
/// renderable.
pub fn denormalize(normalized: &NormalizedCommand) -> Command {
    try_denormalize(normalized).unwrap_or_else(|err| {
        tracing::debug!("{}: {}", err, normalized);
        Command::no_op()
    })
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
