use crate::client::config::DEFAULT_LOGIN_PATH;
use clap::{Arg, Command};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_TIMEOUT: &str = "timeout";
pub const ARG_REFRESH_TIMEOUT: &str = "refresh-timeout";
pub const ARG_LOGIN_PATH: &str = "login-path";
pub const ARG_SURFACE: &str = "surface";
pub const ARG_USERNAME: &str = "username";
pub const ARG_PASSWORD: &str = "password";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .short('u')
                .long("api-url")
                .help("Escrow API base URL, example: https://api.escrow.tld/v1")
                .env("ESCROW_API_BASE_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long("timeout")
                .help("Per-request timeout in seconds")
                .default_value("10")
                .env("ESCROW_TIMEOUT_SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TIMEOUT)
                .long("refresh-timeout")
                .help("Seconds to wait for a session refresh, defaults to --timeout")
                .env("ESCROW_REFRESH_TIMEOUT_SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_LOGIN_PATH)
                .long("login-path")
                .help("Location to navigate to when the session cannot be renewed")
                .default_value(DEFAULT_LOGIN_PATH)
                .env("ESCROW_LOGIN_PATH"),
        )
        .arg(
            Arg::new(ARG_SURFACE)
                .long("surface")
                .help("Surface the client runs on: app or public")
                .default_value("app")
                .env("ESCROW_SURFACE"),
        )
        .arg(
            Arg::new(ARG_USERNAME)
                .long("username")
                .help("Log in with this username before running the command")
                .env("ESCROW_USERNAME")
                .requires(ARG_PASSWORD),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .long("password")
                .help("Password for --username")
                .env("ESCROW_PASSWORD")
                .hide_env_values(true)
                .requires(ARG_USERNAME),
        )
}
