pub mod client;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const CMD_REQUEST: &str = "request";
pub const CMD_PROFILE: &str = "profile";

pub const ARG_METHOD: &str = "method";
pub const ARG_PATH: &str = "path";
pub const ARG_DATA: &str = "data";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("escrow-client")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(CMD_REQUEST)
                .about("Send a request to the escrow API and print the response")
                .arg(
                    Arg::new(ARG_METHOD)
                        .help("HTTP method: GET, POST, PUT, PATCH or DELETE")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_PATH)
                        .help("Path relative to the API base URL, example: /transactions")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_DATA)
                        .short('d')
                        .long("data")
                        .help("JSON request body"),
                ),
        )
        .subcommand(Command::new(CMD_PROFILE).about("Print the user profile"));

    let command = client::with_args(command);
    logging::with_args(command)
}
