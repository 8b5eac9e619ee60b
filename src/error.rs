//! IMAP reader error types.

use std::io::Error as IoError;
use std::result;

use imap_proto::Response;
use thiserror::Error;

/// A convenience wrapper around `Result` for `imap_reader::Error`.
pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur while reading a mailbox.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An `io::Error` that occurred while trying to read or write to an established stream.
    #[error(transparent)]
    Io(#[from] IoError),
    /// The server could not be reached.
    #[error("could not connect to {addr}: {source}")]
    Connect {
        /// The address that was dialed.
        addr: String,
        /// The underlying socket error.
        #[source]
        source: IoError,
    },
    /// TLS could not be set up on top of the TCP connection.
    #[error("TLS negotiation with {domain} failed: {message}")]
    Tls {
        /// The domain used for SNI and certificate verification.
        domain: String,
        /// What the TLS library reported.
        message: String,
    },
    /// The connection was terminated unexpectedly.
    #[error("connection lost")]
    ConnectionLost,
    /// The server rejected the credentials given to `LOGIN`.
    #[error("authentication rejected: {0}")]
    Auth(String),
    /// A `BAD` response from the IMAP server.
    #[error("bad response: {0}")]
    Bad(String),
    /// A `NO` response from the IMAP server.
    #[error("no response: {0}")]
    No(String),
    /// The server did not answer within the configured time.
    #[error("timed out waiting for {0} to complete")]
    Timeout(&'static str),
    /// Error parsing a server response or a fetched message.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Error validating input data before it was sent.
    #[error(transparent)]
    Validate(#[from] ValidateError),
    /// The mailbox's `UIDVALIDITY` changed since the UIDs were obtained.
    #[error("UIDVALIDITY of {mailbox} changed from {was} to {now}")]
    StaleUids {
        /// The mailbox the UIDs belong to.
        mailbox: String,
        /// The `UIDVALIDITY` the UIDs were produced under.
        was: u32,
        /// The `UIDVALIDITY` of the current selection.
        now: u32,
    },
    /// The server refused to accept an appended message.
    #[error("could not append mail to mailbox")]
    Append,
}

/// The broad class an [`Error`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Dialing, TLS negotiation or the stream itself failed.
    Connection,
    /// The server rejected the login.
    Auth,
    /// The server answered a command negatively, or did not answer in time.
    Protocol,
    /// A response or a fetched message could not be understood.
    Parse,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::Connect { .. } | Error::Tls { .. } | Error::ConnectionLost => {
                ErrorKind::Connection
            }
            Error::Auth(_) => ErrorKind::Auth,
            Error::Bad(_)
            | Error::No(_)
            | Error::Timeout(_)
            | Error::Validate(_)
            | Error::StaleUids { .. }
            | Error::Append => ErrorKind::Protocol,
            Error::Parse(_) => ErrorKind::Parse,
        }
    }
}

impl<'a> From<Response<'a>> for Error {
    fn from(err: Response<'a>) -> Error {
        Error::Parse(ParseError::Unexpected(format!("{:?}", err)))
    }
}

impl<T> From<bufstream::IntoInnerError<T>> for Error {
    fn from(err: bufstream::IntoInnerError<T>) -> Error {
        Error::Io(err.into())
    }
}

/// An error occured while trying to parse a server response.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Indicates an error parsing the status response. Such as OK, NO, and BAD.
    #[error("unable to parse status response: {}", String::from_utf8_lossy(.0))]
    Invalid(Vec<u8>),
    /// The client could not find or decode the server's response.
    #[error("unexpected response: {0}")]
    Unexpected(String),
    /// The tagged completion did not carry the tag of the command in flight.
    #[error("expected completion of {expected}, got {got}")]
    TagMismatch {
        /// The tag of the command that was sent.
        expected: String,
        /// The tag the server answered with.
        got: String,
    },
    /// A fetch record did not include the message body.
    #[error("fetch response for UID {0:?} carried no message body")]
    MissingBody(Option<u32>),
    /// The header block of a fetched message is malformed.
    #[error("malformed message: {0}")]
    Message(#[from] mailparse::MailParseError),
}

/// A setting could not be read from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} is not set")]
    Missing(&'static str),
    /// A variable is set to something that does not parse.
    #[error("{key} has an invalid value {value:?}")]
    Invalid {
        /// The variable.
        key: &'static str,
        /// What it was set to.
        value: String,
    },
}

/// An invalid character was found in a string argument.
#[derive(Debug, Error)]
#[error("invalid character in input: {0:?}")]
pub struct ValidateError(pub char);
