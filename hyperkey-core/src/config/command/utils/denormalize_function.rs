use crate::config::command::{Command, CommandKind};

use super::normalized_command::NormalizedCommand;

/// A registered decoder. Lower `priority` values are tried first.
pub struct DenormalizeCommandFunction {
    pub priority: u8,
    pub name: &'static str,
    pub denormalize: fn(&NormalizedCommand) -> Option<Command>,
}

impl DenormalizeCommandFunction {
    pub const fn new<T: CommandKind + 'static>(priority: u8, name: &'static str) -> Self {
        Self {
            priority,
            name,
            denormalize: denormalize_into::<T>,
        }
    }
}

fn denormalize_into<T: CommandKind>(normalized: &NormalizedCommand) -> Option<Command> {
    T::denormalize(normalized).map(Into::into)
}
