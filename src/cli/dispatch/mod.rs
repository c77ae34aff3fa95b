use crate::cli::{
    actions::{profile, request, Action},
    commands::{self, client},
    globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::time::Duration;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let globals = global_args(matches)?;

    match matches.subcommand() {
        Some((commands::CMD_REQUEST, sub_m)) => {
            let method = sub_m
                .get_one::<String>(commands::ARG_METHOD)
                .context("missing required argument: METHOD")?;
            let path = sub_m
                .get_one::<String>(commands::ARG_PATH)
                .cloned()
                .context("missing required argument: PATH")?;

            Ok(Action::Request(request::Args {
                globals,
                method: request::parse_method(method)?,
                path,
                data: request::parse_data(sub_m.get_one::<String>(commands::ARG_DATA))?,
            }))
        }
        Some((commands::CMD_PROFILE, _)) => Ok(Action::Profile(profile::Args { globals })),
        Some((other, _)) => Err(anyhow!("unknown command: {other}")),
        None => Err(anyhow!("missing command")),
    }
}

fn global_args(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    let api_base_url = matches
        .get_one::<String>(client::ARG_API_URL)
        .cloned()
        .context("missing required argument: --api-url")?;

    let mut globals = GlobalArgs::new(api_base_url);

    if let Some(timeout) = matches.get_one::<u64>(client::ARG_TIMEOUT) {
        globals.timeout = Duration::from_secs(*timeout);
    }
    globals.refresh_timeout = matches
        .get_one::<u64>(client::ARG_REFRESH_TIMEOUT)
        .map(|seconds| Duration::from_secs(*seconds));
    if let Some(login_path) = matches.get_one::<String>(client::ARG_LOGIN_PATH) {
        globals.login_path.clone_from(login_path);
    }
    if let Some(surface) = matches.get_one::<String>(client::ARG_SURFACE) {
        globals.surface = surface.parse().map_err(|err: String| anyhow!(err))?;
    }

    if let (Some(username), Some(password)) = (
        matches.get_one::<String>(client::ARG_USERNAME),
        matches.get_one::<String>(client::ARG_PASSWORD),
    ) {
        globals.set_credentials(username.clone(), SecretString::from(password.clone()));
    }

    Ok(globals)
}
