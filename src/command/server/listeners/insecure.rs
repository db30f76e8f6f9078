use crate::command::server::error::Error;
use crate::command::server::listeners::{accept, build_listener};
use crate::command::server::serve_request;
use crate::command::server::ServerContext;
use crate::configuration::ServerConfig;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

pub struct InsecureListener {
    binding_address: SocketAddr,
    context: Arc<ServerContext>,
    timeouts: Arc<[Duration; 2]>,
}

impl InsecureListener {
    pub fn new(server_config: &ServerConfig, context: ServerContext) -> Self {
        let binding_address = SocketAddr::new(server_config.bind_address, server_config.port);

        let timeouts = [
            Duration::from_secs(server_config.query_timeout),
            Duration::from_secs(server_config.query_timeout_grace_period),
        ];

        Self {
            binding_address,
            context: Arc::new(context),
            timeouts: Arc::new(timeouts),
        }
    }

    pub async fn serve(&self) -> Result<(), Error> {
        warn!("Basic credentials are sent in clear text without TLS");
        info!("Listening on {} (non-TLS)", self.binding_address);
        let listener = build_listener(self.binding_address).await?;
        self.accept_loop(&listener).await
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<(), Error> {
        loop {
            debug!("Waiting for incoming connection");
            let (tcp, remote_address) = accept(listener).await?;

            let stream = TokioIo::new(tcp);
            let context = Arc::clone(&self.context);
            let timeouts = Arc::clone(&self.timeouts);

            tokio::spawn(Box::pin(serve_request(
                stream,
                context,
                timeouts,
                remote_address,
            )));
        }
    }
}
