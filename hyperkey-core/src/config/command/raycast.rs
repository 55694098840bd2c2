use serde::{Deserialize, Serialize};

use crate::config::command::utils::denormalize_function::DenormalizeCommandFunction;

use super::{CommandKind, NormalizedCommand, is_false};

inventory::submit! {DenormalizeCommandFunction::new::<Raycast>(2, "raycast")}

const SCHEME: &str = "raycast://";
const BACKGROUND_FLAG: &str = "-g ";

/// Invokes a deep-link action, optionally without bringing the handler to the front.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Raycast {
    pub deeplink: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ignore_focus: bool,
}

impl Raycast {
    pub fn new<T: ToString>(deeplink: T, ignore_focus: bool) -> Self {
        Self {
            deeplink: deeplink.to_string(),
            ignore_focus,
        }
    }
}

impl CommandKind for Raycast {
    fn normalize(&self) -> NormalizedCommand {
        let flag = if self.ignore_focus { BACKGROUND_FLAG } else { "" };
        NormalizedCommand::shell(format!("open {flag}{}", self.deeplink))
    }

    fn denormalize(normalized: &NormalizedCommand) -> Option<Self> {
        let arguments = normalized.shell_command()?.strip_prefix("open ")?;
        let (deeplink, ignore_focus) = match arguments.strip_prefix(BACKGROUND_FLAG) {
            Some(deeplink) => (deeplink, true),
            None => (arguments, false),
        };
        if !deeplink.starts_with(SCHEME) {
            return None;
        }
        Some(Self::new(deeplink, ignore_focus))
    }

    fn get_name(&self) -> &'static str {
        "Raycast"
    }
}
