use serde::{Deserialize, Serialize};

use crate::config::command::utils::denormalize_function::DenormalizeCommandFunction;

use super::{CommandKind, NormalizedCommand};

inventory::submit! {DenormalizeCommandFunction::new::<Window>(1, "window")}

/// Deep-link namespace of the window management actions.
pub const WINDOW_NAMESPACE: &str = "raycast://extensions/raycast/window-management/";

/// Well known window management actions, offered as suggestions.
pub const WINDOW_ACTIONS: &[&str] = &[
    "left-half",
    "right-half",
    "top-half",
    "bottom-half",
    "center",
    "maximize",
    "almost-maximize",
    "reasonable-size",
    "previous-display",
    "next-display",
    "first-third",
    "center-third",
    "last-third",
    "first-two-thirds",
    "last-two-thirds",
    "restore",
    "toggle-fullscreen",
];

/// Runs a named window management action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub action: String,
}

impl Window {
    pub fn new<T: ToString>(action: T) -> Self {
        Self {
            action: action.to_string(),
        }
    }
}

impl CommandKind for Window {
    fn normalize(&self) -> NormalizedCommand {
        NormalizedCommand::shell(format!("open -g {WINDOW_NAMESPACE}{}", self.action))
    }

    fn denormalize(normalized: &NormalizedCommand) -> Option<Self> {
        let path = normalized
            .shell_command()?
            .strip_prefix("open -g ")?
            .strip_prefix(WINDOW_NAMESPACE)?;
        path.rsplit('/')
            .next()
            .filter(|slug| !slug.is_empty())
            .map(Self::new)
    }

    fn get_name(&self) -> &'static str {
        "Window"
    }
}

#[cfg(test)]
mod tests {
    use crate::config::command::{CommandKind, NormalizedCommand};

    use super::Window;

    #[test]
    fn normalize_process() {
        let command = Window::new("previous-display");

        let normalized = command.normalize();
        let denormalized = Window::denormalize(&normalized).unwrap();

        assert_eq!(command, denormalized, "{:?}, {:?}", normalized, denormalized);
    }

    #[test]
    fn takes_trailing_segment() {
        let nested = NormalizedCommand::shell(
            "open -g raycast://extensions/raycast/window-management/legacy/left-half",
        );
        assert_eq!(Window::denormalize(&nested), Some(Window::new("left-half")));
        let foreground =
            NormalizedCommand::shell("open raycast://extensions/raycast/window-management/center");
        assert_eq!(Window::denormalize(&foreground), None);
        let bare = NormalizedCommand::shell("open -g raycast://extensions/raycast/window-management/");
        assert_eq!(Window::denormalize(&bare), None);
    }

    #[test]
    fn custom_actions_keep_their_spaces() {
        let command = Window::new("my action");
        assert_eq!(Window::denormalize(&command.normalize()), Some(command));
    }
}
