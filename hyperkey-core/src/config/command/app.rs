use serde::{Deserialize, Serialize};

use crate::config::command::utils::denormalize_function::DenormalizeCommandFunction;

use super::{CommandKind, NormalizedCommand};

inventory::submit! {DenormalizeCommandFunction::new::<App>(0, "app")}

const PREFIX: &str = "open -a '";
const SUFFIX: &str = ".app'";
const ESCAPED_QUOTE: &str = r"'\''";

/// Launches an application bundle by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub app_name: String,
}

impl App {
    pub fn new<T: ToString>(app_name: T) -> Self {
        Self {
            app_name: app_name.to_string(),
        }
    }
}

impl CommandKind for App {
    fn normalize(&self) -> NormalizedCommand {
        let quoted = self.app_name.replace('\'', ESCAPED_QUOTE);
        NormalizedCommand::shell(format!("{PREFIX}{quoted}{SUFFIX}"))
    }

    fn denormalize(normalized: &NormalizedCommand) -> Option<Self> {
        let quoted = normalized
            .shell_command()?
            .strip_prefix(PREFIX)?
            .strip_suffix(SUFFIX)?;
        // Any quote left after removing escapes would close the argument early.
        if quoted.is_empty() || quoted.replace(ESCAPED_QUOTE, "").contains('\'') {
            return None;
        }
        Some(Self::new(quoted.replace(ESCAPED_QUOTE, "'")))
    }

    fn get_name(&self) -> &'static str {
        "App"
    }
}

#[cfg(test)]
mod tests {
    use crate::config::command::{CommandKind, NormalizedCommand};

    use super::App;

    #[test]
    fn normalize_process() {
        let command = App::new("Google Chrome");

        let normalized = command.normalize();
        assert_eq!(normalized.shell_command(), Some("open -a 'Google Chrome.app'"));
        let denormalized = App::denormalize(&normalized).unwrap();

        assert_eq!(command, denormalized, "{:?}, {:?}", normalized, denormalized);
    }

    #[test]
    fn escapes_single_quotes() {
        let command = App::new("Bob's App");
        let normalized = command.normalize();
        assert_eq!(normalized.shell_command(), Some(r"open -a 'Bob'\''s App.app'"));
        assert_eq!(App::denormalize(&normalized), Some(command));
    }

    #[test]
    fn rejects_other_shapes() {
        let chained = NormalizedCommand::shell("open -a 'Arc.app' && open -a 'Zed.app'");
        assert_eq!(App::denormalize(&chained), None);
        let empty = NormalizedCommand::shell("open -a '.app'");
        assert_eq!(App::denormalize(&empty), None);
        let bare = NormalizedCommand::shell("open -a Safari");
        assert_eq!(App::denormalize(&bare), None);
    }
}
