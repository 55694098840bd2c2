use serde::{Deserialize, Serialize};

use crate::config::command::utils::denormalize_function::DenormalizeCommandFunction;

use super::{CommandKind, NormalizedCommand};

inventory::submit! {DenormalizeCommandFunction::new::<Shell>(3, "shell")}

/// Runs an arbitrary shell command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shell {
    pub command: String,
}

impl Shell {
    pub fn new<T: ToString>(shell_command: T) -> Self {
        Self {
            command: shell_command.to_string(),
        }
    }
}

impl CommandKind for Shell {
    fn normalize(&self) -> NormalizedCommand {
        NormalizedCommand::shell(self.command.clone())
    }

    fn denormalize(normalized: &NormalizedCommand) -> Option<Self> {
        normalized.shell_command().map(Self::new)
    }

    fn get_name(&self) -> &'static str {
        "Shell"
    }
}
