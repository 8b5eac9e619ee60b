//! Read the messages of an IMAP mailbox.
//!
//! A [`Reader`] logs in to an account, searches a mailbox with [`criteria`], downloads the
//! matching messages in one `UID FETCH` and hands them back as [`Message`]s: flags, header fields
//! and the raw body. It can also flag what it read as `\Seen`. Messages are never deleted or
//! moved.
//!
//! # Usage
//!
//! ```no_run
//! use imap_reader::{criteria, Options, Reader, GMAIL_INBOX};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // IMAP_ADDR, IMAP_USER, IMAP_PASSWORD, ...
//!     let options = Options::from_env()?;
//!     let mut reader = Reader::connect(options)?;
//!     reader.login()?;
//!
//!     let unseen = criteria::UNSEEN.and(&criteria::by_from("pony@example.com"));
//!     for message in reader.list(GMAIL_INBOX, &unseen)? {
//!         println!(
//!             "{}: {} bytes",
//!             message.header().get("Subject").unwrap_or("(no subject)"),
//!             message.body().len()
//!         );
//!     }
//!
//!     reader.logout()?;
//!     Ok(())
//! }
//! ```
//!
//! Connections use TLS through `native-tls` by default. Build with `default-features = false,
//! features = ["rustls-tls"]` to use `rustls` instead.

mod parse;
mod types;

mod client;
mod client_builder;
mod conn;
pub mod error;
mod options;
mod reader;
pub mod transport;
mod utils;

pub use crate::client::{Client, FETCH_QUERY};
pub use crate::client_builder::{ClientBuilder, TlsKind};
pub use crate::conn::{Connection, ImapConnection, SetReadTimeout};
pub use crate::error::{ConfigError, Error, ErrorKind, Result};
pub use crate::options::{Options, DEFAULT_TIMEOUT};
pub use crate::reader::{Listing, MailboxState, Reader, SessionState};
pub use crate::transport::Transport;
pub use types::*;

/// The inbox of any IMAP account, Gmail included.
pub const GMAIL_INBOX: &str = "INBOX";
/// Gmail's folder holding every message of the account.
pub const GMAIL_ALL_MAIL: &str = "[Gmail]/All Mail";

#[cfg(any(test, feature = "test_helpers"))]
pub mod testing;

#[cfg(test)]
mod mock_stream;
