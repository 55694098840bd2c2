use crate::config::command::{Command, KeyPress};
use crate::config::{Config, Layer};

use super::extract::ENTRY_POINT;

const PREAMBLE: &str = r#"import fs from "fs";
import { KarabinerRules } from "./types";
import { createHyperSubLayers, app, open, window, shell } from "./utils";

const rules: KarabinerRules[] = [
  // Define the Hyper key itself
  {
    description: "Hyper Key (⌃⌥⇧⌘)",
    manipulators: [
      {
        description: "Caps Lock -> Hyper Key",
        from: {
          key_code: "caps_lock",
          modifiers: {
            optional: ["any"],
          },
        },
        to: [
          {
            set_variable: {
              name: "hyper",
              value: 1,
            },
          },
        ],
        to_after_key_up: [
          {
            set_variable: {
              name: "hyper",
              value: 0,
            },
          },
        ],
        to_if_alone: [
          {
            key_code: "escape",
          },
        ],
        type: "basic",
      },
    ],
  },
"#;

const POSTSCRIPT: &str = r#"];

fs.writeFileSync(
  "karabiner.json",
  JSON.stringify(
    {
      global: {
        show_in_menu_bar: false,
      },
      profiles: [
        {
          name: "Default",
          complex_modifications: {
            rules,
          },
        },
      ],
    },
    null,
    2
  )
);
"#;

/// Writes the complete rules file for a layout.
///
/// Layers and sublayer entries come out in map order; nothing is sorted.
pub fn generate_source(config: &Config) -> String {
    let mut out = String::from(PREAMBLE);
    out.push_str(&format!("  ...{ENTRY_POINT}({{\n"));
    for (trigger, layer) in &config.layers {
        match layer {
            Layer::Single { command } => {
                out.push_str(&format!("    {}: {},\n", property(trigger), expression(command)));
            }
            Layer::Sublayer { commands } => {
                out.push_str(&format!("    {}: {{\n", property(trigger)));
                for (inner, command) in commands {
                    out.push_str(&format!("      {}: {},\n", property(inner), expression(command)));
                }
                out.push_str("    },\n");
            }
        }
    }
    out.push_str("  }),\n");
    out.push_str(POSTSCRIPT);
    out
}

fn expression(command: &Command) -> String {
    match command {
        Command::App(app) => format!("app({})", quote(&app.app_name)),
        Command::Window(window) => format!("window({})", quote(&window.action)),
        Command::Raycast(raycast) if raycast.ignore_focus => {
            format!("open({})", quote(&format!("-g {}", raycast.deeplink)))
        }
        Command::Raycast(raycast) => format!("open({})", quote(&raycast.deeplink)),
        Command::Shell(shell) => format!("shell{}", template(&shell.command)),
        Command::KeyPress(key_press) => key_press_literal(key_press),
    }
}

fn key_press_literal(key_press: &KeyPress) -> String {
    let modifiers = if key_press.modifiers.is_empty() {
        String::new()
    } else {
        let list: Vec<String> = key_press.modifiers.iter().map(|m| quote(m)).collect();
        format!(", modifiers: [{}]", list.join(", "))
    };
    format!(
        "{{ to: [{{ key_code: {}{} }}] }}",
        quote(&key_press.key_code),
        modifiers
    )
}

fn property(key: &str) -> String {
    let mut chars = key.chars();
    let is_ident = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    let is_index = !key.is_empty() && key.chars().all(|c| c.is_ascii_digit());
    if is_ident || is_index {
        key.to_owned()
    } else {
        quote(key)
    }
}

/// A single-quoted string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '\'' => out.push_str(r"\'"),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '\t' => out.push_str(r"\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// A backtick template literal with no interpolation.
pub fn template(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('`');
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str(r"\\"),
            '`' => out.push_str(r"\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str(r"\$"),
            c => out.push(c),
        }
    }
    out.push('`');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::command::{App, Raycast, Shell, Window};

    #[test]
    fn emits_helpers_in_map_order() {
        let config = Config::new()
            .with_layer("spacebar", Layer::single(Raycast::new("raycast://confetti", true)))
            .with_layer(
                "o",
                Layer::sublayer([
                    ("1", App::new("1Password").into()),
                    ("semicolon", KeyPress::new("h", ["right_command"]).into()),
                    ("w", Window::new("left-half").into()),
                ]),
            );
        let source = generate_source(&config);
        let body = source
            .split("...createHyperSubLayers({\n")
            .nth(1)
            .and_then(|rest| rest.split("  }),\n").next())
            .unwrap();
        assert_eq!(
            body,
            "    spacebar: open('-g raycast://confetti'),\n\
             \x20   o: {\n\
             \x20     1: app('1Password'),\n\
             \x20     semicolon: { to: [{ key_code: 'h', modifiers: ['right_command'] }] },\n\
             \x20     w: window('left-half'),\n\
             \x20   },\n"
        );
        assert!(source.starts_with("import fs from \"fs\";"));
        assert!(source.ends_with(");\n"));
    }

    #[test]
    fn escapes_literals() {
        assert_eq!(quote(r"it's a \ test"), r"'it\'s a \\ test'");
        assert_eq!(template("echo `date` ${HOME} $PATH"), r"`echo \`date\` \${HOME} $PATH`");
        assert_eq!(property("hyphen"), "hyphen");
        assert_eq!(property("4"), "4");
        assert_eq!(property("my-key"), "'my-key'");
        assert_eq!(
            expression(&Shell::new("say 'hi'").into()),
            "shell`say 'hi'`"
        );
    }

    #[test]
    fn empty_config_still_generates_a_program() {
        let source = generate_source(&Config::new());
        assert!(source.contains("...createHyperSubLayers({\n  }),\n];"));
    }
}
