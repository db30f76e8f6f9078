use argh::FromArgs;
use tracing::info;

use crate::auth::SchemeRegistry;
use crate::command::Error;
use crate::configuration::Configuration;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "check",
    description = "Validate the configuration and build the access controller"
)]
pub struct Options {}

pub struct Command;

impl Command {
    pub fn run(config: &Configuration, registry: &SchemeRegistry) -> Result<(), Error> {
        match config.access_controller(registry)? {
            Some(_) => info!("Access controller configuration is valid"),
            None => info!("Configuration is valid, no access controller configured"),
        }

        println!("Configuration OK");
        Ok(())
    }
}
