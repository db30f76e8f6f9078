mod error;
mod http_server;
mod listeners;
mod response_body;
mod route;
mod server_context;

use argh::FromArgs;

pub use error::Error;
pub use http_server::serve_request;
use listeners::insecure::InsecureListener;
use listeners::tls::TlsListener;
pub use server_context::ServerContext;

use crate::auth::SchemeRegistry;
use crate::configuration::Configuration;
use crate::{command, configuration};

pub enum ServiceListener {
    Insecure(InsecureListener),
    Secure(TlsListener),
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "serve",
    description = "Run the registry listener behind the configured access controller"
)]
pub struct Options {}

pub struct Command {
    listener: ServiceListener,
}

impl Command {
    pub fn new(
        config: &Configuration,
        registry: &SchemeRegistry,
    ) -> Result<Command, configuration::Error> {
        let access_controller = config.access_controller(registry)?;
        let context = ServerContext::new(access_controller);

        let listener = if config.server.tls.is_some() {
            ServiceListener::Secure(TlsListener::new(&config.server, context)?)
        } else {
            ServiceListener::Insecure(InsecureListener::new(&config.server, context))
        };

        Ok(Command { listener })
    }

    pub async fn run(&self) -> Result<(), command::Error> {
        match &self.listener {
            ServiceListener::Insecure(listener) => listener.serve().await?,
            ServiceListener::Secure(listener) => listener.serve().await?,
        }

        Ok(())
    }
}
