use crate::conn::Connection;
use crate::error::{Error, Result};
use crate::Client;
use log::debug;
use std::io;
use std::net::TcpStream;

/// The TLS library to negotiate encryption with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TlsKind {
    /// The platform's TLS library, through `native-tls` (feature `native-tls`).
    Native,
    /// `rustls` with the platform's root certificates (feature `rustls-tls`).
    Rust,
}

impl Default for TlsKind {
    fn default() -> Self {
        if cfg!(feature = "native-tls") {
            TlsKind::Native
        } else {
            TlsKind::Rust
        }
    }
}

/// A convenience builder for [`Client`] structs over plain or encrypted TCP.
///
/// ```no_run
/// # use imap_reader::ClientBuilder;
/// # fn main() -> Result<(), imap_reader::Error> {
/// let client = ClientBuilder::new("imap.example.com", 993).connect()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ClientBuilder<D>
where
    D: AsRef<str>,
{
    domain: D,
    port: u16,
    tls: bool,
    tls_kind: TlsKind,
    skip_tls_verify: bool,
}

impl ClientBuilder<String> {
    /// Make a builder from a `host:port` address, as found in
    /// [`Options::addr`](crate::Options::addr).
    ///
    /// IPv6 hosts are written in brackets: `[::1]:993`.
    pub fn from_addr(addr: &str) -> Result<Self> {
        let invalid = |why: &str| Error::Connect {
            addr: addr.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidInput, why.to_string()),
        };
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| invalid("address has no port"))?;
        let port = port.parse().map_err(|_| invalid("invalid port"))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(invalid("address has no host"));
        }
        Ok(ClientBuilder::new(host.to_string(), port))
    }
}

impl<D> ClientBuilder<D>
where
    D: AsRef<str>,
{
    /// Make a new `ClientBuilder` using the given domain and port. TLS is on by default.
    pub fn new(domain: D, port: u16) -> Self {
        ClientBuilder {
            domain,
            port,
            tls: true,
            tls_kind: TlsKind::default(),
            skip_tls_verify: false,
        }
    }

    /// Whether to negotiate TLS as soon as the TCP connection is up.
    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Choose the TLS library.
    pub fn tls_kind(mut self, kind: TlsKind) -> Self {
        self.tls_kind = kind;
        self
    }

    /// Accept any certificate and host name. Only meant for test servers with self-signed
    /// certificates; supported with [`TlsKind::Native`] only.
    pub fn danger_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    /// Dial the server, set up TLS if requested, and read the greeting.
    pub fn connect(&self) -> Result<Client<Connection>> {
        let domain = self.domain.as_ref();
        debug!("connecting to {}:{} (tls: {})", domain, self.port, self.tls);
        let tcp = TcpStream::connect((domain, self.port)).map_err(|source| Error::Connect {
            addr: format!("{}:{}", domain, self.port),
            source,
        })?;

        let stream: Connection = if self.tls {
            self.handshake(tcp)?
        } else {
            Box::new(tcp)
        };

        let mut client = Client::new(stream);
        client.read_greeting()?;
        Ok(client)
    }

    fn tls_error(&self, message: impl ToString) -> Error {
        Error::Tls {
            domain: self.domain.as_ref().to_string(),
            message: message.to_string(),
        }
    }

    #[allow(unused_variables)]
    fn handshake(&self, tcp: TcpStream) -> Result<Connection> {
        let domain = self.domain.as_ref();
        match self.tls_kind {
            #[cfg(feature = "native-tls")]
            TlsKind::Native => {
                let ssl_conn = native_tls::TlsConnector::builder()
                    .danger_accept_invalid_certs(self.skip_tls_verify)
                    .danger_accept_invalid_hostnames(self.skip_tls_verify)
                    .build()
                    .map_err(|e| self.tls_error(e))?;
                let tls = ssl_conn
                    .connect(domain, tcp)
                    .map_err(|e| self.tls_error(e))?;
                Ok(Box::new(tls))
            }
            #[cfg(feature = "rustls-tls")]
            TlsKind::Rust => {
                if self.skip_tls_verify {
                    return Err(self.tls_error("skipping verification needs native-tls"));
                }
                let ssl_conn = rustls_connector::RustlsConnector::new_with_native_certs()
                    .map_err(|e| self.tls_error(e))?;
                let tls = ssl_conn
                    .connect(domain, tcp)
                    .map_err(|e| self.tls_error(e))?;
                Ok(Box::new(tls))
            }
            #[allow(unreachable_patterns)]
            kind => Err(self.tls_error(format!("{:?} TLS support is not compiled in", kind))),
        }
    }
}
