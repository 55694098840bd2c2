use clap::{Arg, ArgAction, Command};
use hyperkey_core::config::command::CommandType;
use hyperkey_core::store::KeyFilter;

use tracing_subscriber::{filter::EnvFilter, filter::LevelFilter, fmt, layer::SubscriberExt};

pub mod commands;
pub mod config;
pub mod errors;

fn main() {
    setup_logging();
    let matches = get_app().get_matches();
    let action = errors::exit_on_error!(commands::Action::from_matches(&matches));
    let config = errors::exit_on_error!(config::load());
    tracing::debug!("loaded config: {:?}", config);

    let rt = errors::exit_on_error!(tokio::runtime::Runtime::new());
    let output = errors::exit_on_error!(rt.block_on(commands::run(action, &config)));
    print!("{output}");
}

fn inner_arg() -> Arg {
    Arg::new("inner")
        .short('i')
        .long("inner")
        .value_name("KEY")
        .help("Inner key of a sublayer")
}

fn get_app() -> Command {
    let types: Vec<&'static str> = CommandType::ALL.iter().map(|t| t.as_str()).collect();
    clap::command!()
        .subcommand(
            Command::new("show").about("Print the current layout").arg(
                Arg::new("filter")
                    .short('f')
                    .long("filter")
                    .value_parser(KeyFilter::NAMES)
                    .help("Only show keys of this kind"),
            ),
        )
        .subcommand(
            Command::new("diff")
                .about("Compare the layouts of two rules files")
                .arg(Arg::new("old").required(true))
                .arg(Arg::new("new").required(true)),
        )
        .subcommand(Command::new("conflicts").about("List inner keys bound in several sublayers"))
        .subcommand(Command::new("generate").about("Print the rules source for the current layout"))
        .subcommand(
            Command::new("bind")
                .about("Bind a command to a trigger key or an inner key")
                .arg(Arg::new("layer").required(true))
                .arg(Arg::new("type").required(true).value_parser(types))
                .arg(Arg::new("text").required(true))
                .arg(inner_arg())
                .arg(
                    Arg::new("ignore-focus")
                        .long("ignore-focus")
                        .action(ArgAction::SetTrue)
                        .help("Open deep links in the background"),
                ),
        )
        .subcommand(
            Command::new("unbind")
                .about("Remove a layer or an inner binding")
                .arg(Arg::new("layer").required(true))
                .arg(inner_arg()),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Manage named snapshots")
                .subcommand(Command::new("create").arg(Arg::new("name").required(true)))
                .subcommand(Command::new("list"))
                .subcommand(Command::new("restore").arg(Arg::new("id").required(true)))
                .subcommand(Command::new("delete").arg(Arg::new("id").required(true))),
        )
        .subcommand(
            Command::new("export")
                .about("Write the layout to a shareable file")
                .arg(Arg::new("file").required(true)),
        )
        .subcommand(
            Command::new("import")
                .about("Load a bundle or an exported layout")
                .arg(Arg::new("file").required(true))
                .arg(
                    Arg::new("merge")
                        .long("merge")
                        .action(ArgAction::SetTrue)
                        .help("Merge snapshots and preferences instead of replacing them"),
                )
                .arg(
                    Arg::new("preview")
                        .long("preview")
                        .action(ArgAction::SetTrue)
                        .help("Only show what would change"),
                ),
        )
        .subcommand(Command::new("apply").about("Write, build and install the rules"))
}

fn setup_logging() {
    let subscriber = fmt::Layer::new().with_writer(std::io::stderr);
    let log_level = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let collector = tracing_subscriber::registry()
        .with(log_level)
        .with(subscriber);

    if let Err(err) = tracing::subscriber::set_global_default(collector) {
        eprintln!("Couldn't setup logging: {err}");
    }
}
