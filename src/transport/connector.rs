//! Establishing transports.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rustls::pki_types::ServerName;
use rustls::RootCertStore;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use super::{Endpoint, Transport, TransportKind};

/// Opens a [`Transport`] to an [`Endpoint`].
///
/// The client uses [`NetworkConnector`] unless given another one, which is
/// how tests run the client over in-memory pipes.
#[async_trait]
pub trait Connector: Send + Sync + fmt::Debug {
    /// Connect and return a transport ready for the handshake.
    async fn connect(&self, endpoint: &Endpoint, max_line_len: usize) -> Result<Transport>;
}

/// Connects over the network: TCP, TLS via rustls, or WebSocket.
#[derive(Debug, Clone, Default)]
pub struct NetworkConnector;

impl NetworkConnector {
    fn enable_keepalive(stream: &TcpStream) -> Result<()> {
        use socket2::{SockRef, TcpKeepalive};

        let sock = SockRef::from(stream);
        let keepalive = TcpKeepalive::new()
            .with_time(Duration::from_secs(120))
            .with_interval(Duration::from_secs(30));

        sock.set_tcp_keepalive(&keepalive)?;
        Ok(())
    }

    async fn tcp(endpoint: &Endpoint) -> Result<TcpStream> {
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .await
            .with_context(|| format!("TCP connection to {} failed", endpoint))?;

        if let Err(e) = Self::enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }
        Ok(stream)
    }
}

/// Create a TLS connector trusting the webpki root certificates.
pub(crate) fn create_tls_connector() -> TlsConnector {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

#[async_trait]
impl Connector for NetworkConnector {
    async fn connect(&self, endpoint: &Endpoint, max_line_len: usize) -> Result<Transport> {
        debug!("connecting to {}", endpoint);
        let stream = Self::tcp(endpoint).await?;

        match endpoint.kind {
            TransportKind::Tcp if endpoint.tls => {
                let server_name = ServerName::try_from(endpoint.host.clone())
                    .with_context(|| format!("invalid server name for TLS: {}", endpoint.host))?;
                let tls = create_tls_connector()
                    .connect(server_name, stream)
                    .await
                    .context("TLS handshake failed")?;
                Ok(Transport::lines(tls, max_line_len))
            }
            TransportKind::Tcp => Ok(Transport::lines(stream, max_line_len)),
            TransportKind::WebSocket => {
                let (ws, _response) = tokio_tungstenite::client_async_tls(endpoint.url(), stream)
                    .await
                    .context("WebSocket handshake failed")?;
                Ok(Transport::websocket(ws, max_line_len))
            }
        }
    }
}
