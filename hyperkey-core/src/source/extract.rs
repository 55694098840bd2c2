use indexmap::IndexMap;
use regex::Regex;

use crate::config::command::{self, App, Command, CommandKind, NormalizedCommand, WINDOW_ACTIONS, Window};
use crate::config::{Config, Layer, key};
use crate::errors::{Result, SourceError};

use super::lexer::{Lexer, TokenKind};
use super::parser::{Expr, Parser, Spanned};

/// The call whose object argument enumerates the trigger keys.
pub const ENTRY_POINT: &str = "createHyperSubLayers";

/// Reads the layer model out of a rules source file.
///
/// Returns `Ok(None)` when the file has no `createHyperSubLayers(...)` call at all.
pub fn try_parse_source(text: &str) -> Result<Option<Config>> {
    let pattern = Regex::new(&format!(r"\b{ENTRY_POINT}\s*\("))?;
    let mut calls = pattern.find_iter(text);
    let Some(call) = calls.next() else {
        return Ok(None);
    };
    if calls.next().is_some() {
        tracing::warn!("found more than one {ENTRY_POINT} call, using the first");
    }

    let (line, column) = position(text, call.end());
    let mut parser = Parser::new(Lexer::new(&text[call.end()..], line, column));
    let argument = parser.parse_expr()?;
    parser.expect(&TokenKind::RParen)?;

    let Expr::Object(entries) = &argument.expr else {
        return Err(argument
            .error(format!("{ENTRY_POINT} expects an object literal"))
            .into());
    };

    let mut layers = IndexMap::with_capacity(entries.len());
    for (trigger, value) in entries {
        if !key::is_key_code(trigger) {
            tracing::warn!("unknown trigger key `{}` at line {}", trigger, value.line);
        }
        layers.insert(trigger.clone(), layer(value)?);
    }
    Ok(Some(Config { layers }))
}

/// Like [`try_parse_source`], but logs failures and treats them as "no configuration".
pub fn parse_source(text: &str) -> Option<Config> {
    match try_parse_source(text) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Unable to parse rules source: {}", err);
            None
        }
    }
}

fn position(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map_or(0, |last| last.chars().count())
        + 1;
    (line, column)
}

fn layer(value: &Spanned) -> std::result::Result<Layer, SourceError> {
    match &value.expr {
        Expr::Call { .. } => Ok(Layer::Single {
            command: command_of(value)?,
        }),
        Expr::Object(entries) if is_raw_literal(entries) => Ok(Layer::Single {
            command: command_of(value)?,
        }),
        Expr::Object(entries) => {
            let mut commands = IndexMap::with_capacity(entries.len());
            for (inner, binding) in entries {
                if !key::is_key_code(inner) {
                    tracing::warn!("unknown inner key `{}` at line {}", inner, binding.line);
                }
                commands.insert(inner.clone(), command_of(binding)?);
            }
            Ok(Layer::Sublayer { commands })
        }
        _ => Err(value.error("expected a command or a sublayer object")),
    }
}

fn is_raw_literal(entries: &[(String, Spanned)]) -> bool {
    entries.iter().any(|(key, _)| key == "to")
}

fn command_of(value: &Spanned) -> std::result::Result<Command, SourceError> {
    let normalized = match &value.expr {
        Expr::Call { callee, args } => helper(value, callee, args)?,
        Expr::Object(entries) if is_raw_literal(entries) => raw_literal(value)?,
        _ => return Err(value.error("expected a helper call or a `{ to: [...] }` literal")),
    };
    let command = command::denormalize(&normalized);
    lint(value, &command);
    Ok(command)
}

/// Reads a `{ to: [...] }` literal. Only a single shell or key event maps onto a command;
/// anything else is refused so that regenerating the file cannot drop it.
fn raw_literal(value: &Spanned) -> std::result::Result<NormalizedCommand, SourceError> {
    let normalized = serde_json::from_value::<NormalizedCommand>(to_json(value)?)
        .map_err(|err| value.error(format!("invalid command literal: {err}")))?;
    if !normalized.is_decodable() {
        return Err(value.error(format!(
            "command literal {normalized} needs exactly one `shell_command` or `key_code` event"
        )));
    }
    if let Some(description) = &normalized.description {
        tracing::warn!("dropping description `{}` at line {}", description, value.line);
    }
    Ok(normalized)
}

/// Warns about names the consumer will not recognise. They are still kept.
fn lint(value: &Spanned, command: &Command) {
    match command {
        Command::KeyPress(key_press) => {
            if !key::is_key_code(&key_press.key_code) {
                tracing::warn!("unknown key code `{}` at line {}", key_press.key_code, value.line);
            }
            for modifier in key_press.modifiers.iter().filter(|m| !key::is_modifier(m)) {
                tracing::warn!("unknown modifier `{}` at line {}", modifier, value.line);
            }
        }
        Command::Window(window) if !WINDOW_ACTIONS.contains(&window.action.as_str()) => {
            tracing::warn!("unknown window action `{}` at line {}", window.action, value.line);
        }
        _ => tracing::trace!("{} command at line {}", command.get_name(), value.line),
    }
}

/// Stand-ins for the helpers of the rules file. They only build the literal the real helper
/// would produce.
fn helper(
    call: &Spanned,
    callee: &str,
    args: &[Spanned],
) -> std::result::Result<NormalizedCommand, SourceError> {
    let args = args
        .iter()
        .map(|arg| match &arg.expr {
            Expr::Str(text) => Ok(text.as_str()),
            _ => Err(arg.error(format!("`{callee}` only takes string arguments"))),
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let single = || match args.as_slice() {
        [arg] => Ok(*arg),
        _ => Err(call.error(format!("`{callee}` takes exactly one argument"))),
    };

    match callee {
        "app" => Ok(App::new(single()?).normalize()),
        "window" => Ok(Window::new(single()?).normalize()),
        "open" if args.is_empty() => Err(call.error("`open` needs at least one argument")),
        "open" => Ok(NormalizedCommand::shell(format!("open {}", args.join(" ")))),
        "rectangle" => Ok(NormalizedCommand::shell(format!(
            "open -g rectangle://execute-action?name={}",
            single()?
        ))),
        "shell" => Ok(NormalizedCommand::shell(single()?)),
        other => Err(call.error(format!("unknown helper `{other}`"))),
    }
}

fn to_json(value: &Spanned) -> std::result::Result<serde_json::Value, SourceError> {
    use serde_json::Value;

    Ok(match &value.expr {
        Expr::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|(key, value)| Ok((key.clone(), to_json(value)?)))
                .collect::<std::result::Result<_, SourceError>>()?,
        ),
        Expr::Array(items) => Value::Array(
            items
                .iter()
                .map(to_json)
                .collect::<std::result::Result<_, _>>()?,
        ),
        Expr::Str(text) => Value::String(text.clone()),
        Expr::Number(number) => number
            .replace('_', "")
            .parse::<serde_json::Number>()
            .map(Value::Number)
            .map_err(|_| value.error(format!("invalid number `{number}`")))?,
        Expr::Bool(flag) => Value::Bool(*flag),
        Expr::Null => Value::Null,
        Expr::Ident(name) => return Err(value.error(format!("unexpected identifier `{name}`"))),
        Expr::Call { callee, .. } => {
            return Err(value.error(format!("helper `{callee}` is not allowed inside a literal")));
        }
    })
}
