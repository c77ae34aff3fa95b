use crate::cli::actions::{profile, request, Action};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Request(args) => request::execute(args).await,
        Action::Profile(args) => profile::execute(args).await,
    }
}
