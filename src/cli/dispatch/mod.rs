//! Map parsed command-line arguments to the action the binary runs.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::database;
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or empty.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let database = database::Options::parse(matches)?;

    Ok(Action::Server(Args { port, database }))
}
