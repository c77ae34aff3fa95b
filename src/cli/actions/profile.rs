use crate::cli::{actions::connect, globals::GlobalArgs};
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
}

/// # Errors
/// Returns an error if login or the profile lookup fails.
pub async fn execute(args: Args) -> Result<()> {
    let connection = connect(&args.globals).await?;

    let result = connection.client.profile().await;
    connection.report_navigation();
    let user = result?;

    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}
