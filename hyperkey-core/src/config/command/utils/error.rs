#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandError {
    #[error("Given literal doesn't match any command.")]
    UnmatchingCommand,
    #[error("Unknown command type `{0}`.")]
    UnknownType(String),
}
