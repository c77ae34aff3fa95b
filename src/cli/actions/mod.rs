pub mod profile;
pub mod request;

mod connect;
// Internal "interpreter" for `Action`.
mod run;

pub use self::connect::{connect, print_body, Connection};

#[derive(Debug)]
pub enum Action {
    Request(request::Args),
    Profile(profile::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
