use crate::error::{Error, Result};

use std::fmt::{Debug, Formatter};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// Must be implemented for a stream in order for a [`Client`](crate::Client) over that stream to
/// bound how long it waits for the server, as `LOGOUT` does.
pub trait SetReadTimeout {
    /// Set the timeout for subsequent reads to the given one.
    ///
    /// If `timeout` is `None`, the read timeout should be removed.
    ///
    /// See also `std::net::TcpStream::set_read_timeout`.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()>;
}

impl SetReadTimeout for TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        TcpStream::set_read_timeout(self, timeout).map_err(Error::Io)
    }
}

#[cfg(feature = "native-tls")]
impl<T: SetReadTimeout + Read + Write> SetReadTimeout for native_tls::TlsStream<T> {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.get_mut().set_read_timeout(timeout)
    }
}

#[cfg(feature = "rustls-tls")]
impl<T: SetReadTimeout + Read + Write> SetReadTimeout for rustls_connector::TlsStream<T> {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.sock.set_read_timeout(timeout)
    }
}

impl<T: SetReadTimeout + ?Sized> SetReadTimeout for Box<T> {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        (**self).set_read_timeout(timeout)
    }
}

/// Imap connection trait of a read/write stream
pub trait ImapConnection: Read + Write + Send + SetReadTimeout + private::Sealed {}

impl<T> ImapConnection for T where T: Read + Write + Send + SetReadTimeout {}

impl Debug for dyn ImapConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Imap connection")
    }
}

/// A boxed connection type
pub type Connection = Box<dyn ImapConnection>;

mod private {
    use super::{Read, SetReadTimeout, Write};

    pub trait Sealed {}

    impl<T> Sealed for T where T: Read + Write + SetReadTimeout {}
}
