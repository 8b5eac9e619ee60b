//! List the messages of a mailbox.
//!
//! ```text
//! IMAP_PASSWORD=secret cargo run --example list -- \
//!     --addr imap.gmail.com:993 --user me@gmail.com --unseen --subject invoice
//! ```
//!
//! Set `RUST_LOG=imap_reader=trace` to see the conversation with the server.

extern crate imap_reader;

use clap::Parser;
use imap_reader::criteria::{self, SearchCriteria};
use imap_reader::{Options, Reader, GMAIL_INBOX};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "list", about = "Print the messages of an IMAP mailbox")]
struct Cli {
    /// Server address, `host:port`
    #[arg(long, env = "IMAP_ADDR")]
    addr: String,

    #[arg(long, env = "IMAP_USER")]
    user: String,

    #[arg(long, env = "IMAP_PASSWORD", hide_env_values = true)]
    password: String,

    /// Connect without TLS
    #[arg(long)]
    plaintext: bool,

    /// Seconds to wait for the server to acknowledge LOGOUT
    #[arg(long, env = "IMAP_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Flag listed messages as seen
    #[arg(long, env = "IMAP_MARK_SEEN")]
    mark_seen: bool,

    #[arg(long, default_value = GMAIL_INBOX)]
    mailbox: String,

    /// Only unseen messages
    #[arg(long)]
    unseen: bool,

    /// Only messages whose subject contains this text
    #[arg(long)]
    subject: Option<String>,

    /// Only messages sent by this address
    #[arg(long)]
    from: Option<String>,
}

impl Cli {
    fn criteria(&self) -> SearchCriteria {
        let mut c = if self.unseen {
            criteria::UNSEEN
        } else {
            criteria::ALL
        };
        if let Some(ref subject) = self.subject {
            c = c.and(&criteria::by_subject(subject.as_str()));
        }
        if let Some(ref from) = self.from {
            c = c.and(&criteria::by_from(from.as_str()));
        }
        c
    }

    fn options(&self) -> Options {
        Options::new(&self.addr, &self.user, &self.password)
            .tls(!self.plaintext)
            .timeout(Duration::from_secs(self.timeout))
            .mark_seen(self.mark_seen)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut reader = Reader::connect(cli.options())?;
    reader.login()?;
    let messages = reader.list(&cli.mailbox, &cli.criteria());

    // log out even if listing failed
    let logout = reader.logout();
    let messages = messages?;
    logout?;

    println!("{} message(s) in {}", messages.len(), cli.mailbox);
    for m in &messages {
        println!(
            "{:>6}  {:<30}  {}  ({} bytes)",
            m.uid().map(|u| u.to_string()).unwrap_or_default(),
            m.header().get("From").unwrap_or("-"),
            m.header().get("Subject").unwrap_or("(no subject)"),
            m.body().len()
        );
    }
    Ok(())
}
