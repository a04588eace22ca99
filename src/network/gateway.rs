//! Gateway - TCP/TLS listeners that accept incoming connections.
//!
//! The gateway binds one listener per configured port and spawns a
//! Connection task for each accepted client. When TLS is configured it
//! applies to every listening port.

use crate::config::{Config, TlsConfig};
use crate::handlers::Registry;
use crate::network::Connection;
use crate::state::Hub;
use rustls_pemfile::{certs, pkcs8_private_keys};
use std::io::{BufReader, Cursor};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;
use tracing::{error, info, warn};

/// The Gateway accepts incoming connections and spawns connection tasks.
pub struct Gateway {
    listeners: Vec<TcpListener>,
    tls_acceptor: Option<TlsAcceptor>,
    hub: Arc<Hub>,
    registry: Arc<Registry>,
}

impl Gateway {
    /// Bind a listener for every configured port.
    ///
    /// Any port that cannot be bound is fatal for startup.
    pub async fn bind(
        config: &Config,
        hub: Arc<Hub>,
        registry: Arc<Registry>,
    ) -> anyhow::Result<Self> {
        let tls_acceptor = config.tls.as_ref().map(load_tls).transpose()?;

        let mut listeners = Vec::with_capacity(config.listen.ports.len());
        for &port in &config.listen.ports {
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let listener = TcpListener::bind(addr).await?;
            info!(%addr, tls = tls_acceptor.is_some(), "Listener bound");
            listeners.push(listener);
        }

        Ok(Self {
            listeners,
            tls_acceptor,
            hub,
            registry,
        })
    }

    /// Run the gateway, accepting connections forever.
    pub async fn run(self) -> anyhow::Result<()> {
        let mut listeners = self.listeners.into_iter();
        let Some(first) = listeners.next() else {
            anyhow::bail!("no listeners bound");
        };

        for listener in listeners {
            let hub = Arc::clone(&self.hub);
            let registry = Arc::clone(&self.registry);
            let acceptor = self.tls_acceptor.clone();
            tokio::spawn(accept_loop(listener, acceptor, hub, registry));
        }
        accept_loop(first, self.tls_acceptor, self.hub, self.registry).await
    }
}

async fn accept_loop(
    listener: TcpListener,
    acceptor: Option<TlsAcceptor>,
    hub: Arc<Hub>,
    registry: Arc<Registry>,
) -> anyhow::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!(%addr, "Connection accepted");
                let hub = Arc::clone(&hub);
                let registry = Arc::clone(&registry);
                let acceptor = acceptor.clone();

                tokio::spawn(async move {
                    match acceptor {
                        Some(acceptor) => match acceptor.accept(stream).await {
                            Ok(tls_stream) => {
                                let connection =
                                    Connection::new(tls_stream, addr, hub, registry);
                                if let Err(e) = connection.run().await {
                                    error!(%addr, error = %e, "Connection error");
                                }
                            }
                            Err(e) => {
                                warn!(%addr, error = %e, "TLS handshake failed");
                            }
                        },
                        None => {
                            let connection = Connection::new(stream, addr, hub, registry);
                            if let Err(e) = connection.run().await {
                                error!(%addr, error = %e, "Connection error");
                            }
                        }
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
            }
        }
    }
}

/// Load TLS certificates and build a TlsAcceptor.
fn load_tls(config: &TlsConfig) -> anyhow::Result<TlsAcceptor> {
    let cert_file = std::fs::read(&config.cert_path)?;
    let cert_reader = &mut BufReader::new(Cursor::new(cert_file));
    let certs: Vec<CertificateDer> = certs(cert_reader).collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        anyhow::bail!("No certificates found in {}", config.cert_path);
    }

    let key_file = std::fs::read(&config.key_path)?;
    let key_reader = &mut BufReader::new(Cursor::new(key_file));
    let mut keys: Vec<PrivateKeyDer> = pkcs8_private_keys(key_reader)
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(PrivateKeyDer::from)
        .collect();
    if keys.is_empty() {
        anyhow::bail!("No private keys found in {}", config.key_path);
    }
    let key = keys.remove(0);

    let tls_config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    Ok(TlsAcceptor::from(Arc::new(tls_config)))
}
