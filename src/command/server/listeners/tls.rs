use crate::command::server::listeners::{accept, build_listener};
use crate::command::server::serve_request;
use crate::command::server::{Error, ServerContext};
use crate::configuration::{self, ServerConfig, ServerTlsConfig};
use hyper_util::rt::TokioIo;
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info};

const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TlsListener {
    binding_address: SocketAddr,
    tls_acceptor: TlsAcceptor,
    context: Arc<ServerContext>,
    timeouts: Arc<[Duration; 2]>,
}

impl TlsListener {
    pub fn new(
        server_config: &ServerConfig,
        context: ServerContext,
    ) -> Result<Self, configuration::Error> {
        let tls_config = server_config.tls.as_ref().ok_or_else(|| {
            configuration::Error::MissingExpectedTLSSection(
                "TLS configuration is missing".to_string(),
            )
        })?;

        let binding_address = SocketAddr::new(server_config.bind_address, server_config.port);
        let tls_acceptor = Self::build_tls_acceptor(tls_config)?;
        let timeouts = [
            Duration::from_secs(server_config.query_timeout),
            Duration::from_secs(server_config.query_timeout_grace_period),
        ];

        Ok(Self {
            binding_address,
            tls_acceptor,
            context: Arc::new(context),
            timeouts: Arc::new(timeouts),
        })
    }

    fn build_tls_acceptor(
        tls_config: &ServerTlsConfig,
    ) -> Result<TlsAcceptor, configuration::Error> {
        debug!("Detected TLS configuration");
        let server_certs = CertificateDer::pem_file_iter(&tls_config.server_certificate_bundle)?
            .collect::<Result<_, _>>()?;
        let server_key = PrivateKeyDer::from_pem_file(&tls_config.server_private_key)?;

        let server_config = rustls::ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(server_certs, server_key)?;

        Ok(TlsAcceptor::from(Arc::new(server_config)))
    }

    pub async fn serve(&self) -> Result<(), Error> {
        info!("Listening on {} (TLS)", self.binding_address);
        let listener = build_listener(self.binding_address).await?;
        self.accept_loop(&listener).await
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<(), Error> {
        loop {
            let (tcp, remote_address) = accept(listener).await?;

            let tls_acceptor = self.tls_acceptor.clone();
            let context = Arc::clone(&self.context);
            let timeouts = Arc::clone(&self.timeouts);

            // the handshake runs in the connection task so a silent client cannot hold the listener
            tokio::spawn(async move {
                let tls = match tokio::time::timeout(
                    TLS_HANDSHAKE_TIMEOUT,
                    tls_acceptor.accept(tcp),
                )
                .await
                {
                    Ok(Ok(tls)) => tls,
                    Ok(Err(error)) => {
                        debug!("TLS handshake with {remote_address} failed: {error}");
                        return;
                    }
                    Err(_) => {
                        debug!("TLS handshake with {remote_address} timed out");
                        return;
                    }
                };

                let stream = TokioIo::new(tls);
                serve_request(stream, context, timeouts, remote_address).await;
            });
        }
    }
}
