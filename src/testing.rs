//! An in-memory [`Transport`] for exercising a [`Reader`](crate::Reader) without a server.
//!
//! [`FakeTransport`] keeps a few mailboxes of raw messages, answers `UID SEARCH` for the
//! keywords in [`criteria`](crate::criteria), and records every command it is given so tests can
//! assert on the exact order of operations.
//!
//! ```
//! use imap_reader::testing::{Call, FakeTransport};
//! use imap_reader::{criteria, Options, Reader};
//!
//! let mut fake = FakeTransport::new();
//! fake.append("INBOX", b"Subject: Fancy ponies\r\n\r\nHello!\r\n");
//!
//! let mut reader = Reader::new(Options::default(), fake);
//! reader.login().unwrap();
//! let messages = reader.list("INBOX", &criteria::UNSEEN).unwrap();
//! assert_eq!(messages[0].header().get("subject"), Some("Fancy ponies"));
//! assert_eq!(reader.transport().calls()[1], Call::Select("INBOX".into(), true));
//! ```

use crate::error::{Error, Result};
use crate::types::criteria::{SearchCriteria, Token};
use crate::types::{Fetch, Flag, Mailbox, Message, Uid, UidSet};
use crate::Transport;
use std::collections::BTreeMap;
use std::time::Duration;

/// A command received by a [`FakeTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    /// `LOGIN` as the given user.
    Login(String),
    /// `EXAMINE` (`true`) or `SELECT` (`false`) of a mailbox.
    Select(String, bool),
    /// `CLOSE`.
    Close,
    /// `UID SEARCH` with the rendered arguments.
    Search(String),
    /// `UID FETCH` of a UID set.
    Fetch(String),
    /// `UID STORE` adding flags to a UID set.
    Store(String, Vec<Flag>),
    /// `LOGOUT` with its timeout.
    Logout(Duration),
}

impl Call {
    fn name(&self) -> &'static str {
        match self {
            Call::Login(_) => "LOGIN",
            Call::Select(_, true) => "EXAMINE",
            Call::Select(_, false) => "SELECT",
            Call::Close => "CLOSE",
            Call::Search(_) => "SEARCH",
            Call::Fetch(_) => "FETCH",
            Call::Store(..) => "STORE",
            Call::Logout(_) => "LOGOUT",
        }
    }
}

#[derive(Clone, Debug)]
struct Stored {
    uid: Uid,
    flags: Vec<Flag>,
    raw: Vec<u8>,
}

#[derive(Clone, Debug)]
struct FakeMailbox {
    uid_validity: u32,
    uid_next: Uid,
    messages: Vec<Stored>,
}

impl FakeMailbox {
    fn new(uid_validity: u32) -> Self {
        FakeMailbox {
            uid_validity,
            uid_next: 1,
            messages: Vec::new(),
        }
    }
}

/// A scripted stand-in for an IMAP connection.
#[derive(Clone, Debug, Default)]
pub struct FakeTransport {
    mailboxes: BTreeMap<String, FakeMailbox>,
    selected: Option<(String, bool)>,
    credentials: Option<(String, String)>,
    failures: BTreeMap<&'static str, String>,
    calls: Vec<Call>,
}

impl FakeTransport {
    /// An empty fake with just an `INBOX` and no credential checks.
    pub fn new() -> Self {
        let mut fake = FakeTransport::default();
        fake.create("INBOX");
        fake
    }

    /// Only accept `LOGIN` with these credentials.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some((username.to_string(), password.to_string()));
        self
    }

    /// Add an empty mailbox with `UIDVALIDITY` 1, if it does not exist yet.
    pub fn create(&mut self, mailbox: &str) {
        self.mailboxes
            .entry(mailbox.to_string())
            .or_insert_with(|| FakeMailbox::new(1));
    }

    /// Store a new message without flags, creating the mailbox if needed. Returns its UID.
    pub fn append(&mut self, mailbox: &str, raw: &[u8]) -> Uid {
        self.append_with_flags(mailbox, raw, &[])
    }

    /// Store a new message with the given flags. Returns its UID.
    pub fn append_with_flags(&mut self, mailbox: &str, raw: &[u8], flags: &[Flag]) -> Uid {
        let mbox = self
            .mailboxes
            .entry(mailbox.to_string())
            .or_insert_with(|| FakeMailbox::new(1));
        let uid = mbox.uid_next;
        mbox.uid_next += 1;
        mbox.messages.push(Stored {
            uid,
            flags: flags.to_vec(),
            raw: raw.to_vec(),
        });
        uid
    }

    /// Give `mailbox` a new `UIDVALIDITY`, as a server does when it renumbers messages.
    pub fn set_uid_validity(&mut self, mailbox: &str, uid_validity: u32) {
        self.mailboxes
            .entry(mailbox.to_string())
            .or_insert_with(|| FakeMailbox::new(uid_validity))
            .uid_validity = uid_validity;
    }

    /// Make the next command named `command` (`"LOGIN"`, `"EXAMINE"`, `"SELECT"`, `"CLOSE"`,
    /// `"SEARCH"`, `"FETCH"`, `"STORE"` or `"LOGOUT"`) fail with `NO message`.
    pub fn fail_next(&mut self, command: &'static str, message: &str) {
        self.failures.insert(command, message.to_string());
    }

    /// Every command received so far, oldest first.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Forget the recorded commands.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Flags currently set on a stored message.
    pub fn flags(&self, mailbox: &str, uid: Uid) -> Option<&[Flag]> {
        self.mailboxes
            .get(mailbox)?
            .messages
            .iter()
            .find(|m| m.uid == uid)
            .map(|m| m.flags.as_slice())
    }

    /// Name of the selected mailbox and whether it is read-only.
    pub fn selected(&self) -> Option<(&str, bool)> {
        self.selected
            .as_ref()
            .map(|(name, read_only)| (name.as_str(), *read_only))
    }

    fn record(&mut self, call: Call) -> Result<()> {
        let name = call.name();
        self.calls.push(call);
        match self.failures.remove(name) {
            Some(message) if name == "LOGIN" => Err(Error::Auth(message)),
            Some(message) => Err(Error::No(message)),
            None => Ok(()),
        }
    }

    fn selected_mailbox(&mut self) -> Result<&mut FakeMailbox> {
        let name = match self.selected {
            Some((ref name, _)) => name,
            None => return Err(Error::Bad("No mailbox selected".to_string())),
        };
        self.mailboxes
            .get_mut(name)
            .ok_or_else(|| Error::No("Mailbox vanished".to_string()))
    }
}

fn header_contains(raw: &[u8], field: &str, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    Message::parse(raw, None::<Flag>)
        .map(|m| {
            m.header()
                .get_all(field)
                .any(|v| v.to_lowercase().contains(&needle))
        })
        .unwrap_or(false)
}

fn body_contains(raw: &[u8], needle: &str) -> bool {
    let needle = needle.to_lowercase();
    Message::parse(raw, None::<Flag>)
        .map(|m| String::from_utf8_lossy(m.body()).to_lowercase().contains(&needle))
        .unwrap_or(false)
}

fn matches(message: &Stored, tokens: &[Token]) -> Result<bool> {
    let has = |flag: Flag| message.flags.contains(&flag);
    let mut tokens = tokens.iter();
    while let Some(token) = tokens.next() {
        let key = match token {
            Token::Atom(key) => key.to_ascii_uppercase(),
            Token::Str(s) => return Err(Error::Bad(format!("Unexpected string {:?}", s))),
        };
        let mut arg = || match tokens.next() {
            Some(Token::Str(s)) => Ok(s.clone()),
            _ => Err(Error::Bad(format!("{} needs an argument", key))),
        };
        let hit = match key.as_str() {
            "ALL" => true,
            "SEEN" => has(Flag::Seen),
            "UNSEEN" => !has(Flag::Seen),
            "ANSWERED" => has(Flag::Answered),
            "UNANSWERED" => !has(Flag::Answered),
            "DELETED" => has(Flag::Deleted),
            "UNDELETED" => !has(Flag::Deleted),
            "FLAGGED" => has(Flag::Flagged),
            "UNFLAGGED" => !has(Flag::Flagged),
            "RECENT" => has(Flag::Recent),
            "OLD" => !has(Flag::Recent),
            "NEW" => has(Flag::Recent) && !has(Flag::Seen),
            "SUBJECT" => header_contains(&message.raw, "Subject", &arg()?),
            "FROM" => header_contains(&message.raw, "From", &arg()?),
            "TO" => header_contains(&message.raw, "To", &arg()?),
            "BODY" => body_contains(&message.raw, &arg()?),
            other => return Err(Error::Bad(format!("Unknown search key {}", other))),
        };
        if !hit {
            return Ok(false);
        }
    }
    Ok(true)
}

impl Transport for FakeTransport {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.record(Call::Login(username.to_string()))?;
        match self.credentials {
            Some((ref u, ref p)) if u != username || p != password => {
                Err(Error::Auth("Invalid credentials".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn select(&mut self, mailbox: &str, read_only: bool) -> Result<Mailbox> {
        self.selected = None;
        self.record(Call::Select(mailbox.to_string(), read_only))?;
        let mbox = self
            .mailboxes
            .get(mailbox)
            .ok_or_else(|| Error::No("Mailbox doesn't exist".to_string()))?;
        let info = Mailbox {
            exists: mbox.messages.len() as u32,
            recent: mbox
                .messages
                .iter()
                .filter(|m| m.flags.contains(&Flag::Recent))
                .count() as u32,
            uid_next: Some(mbox.uid_next),
            uid_validity: Some(mbox.uid_validity),
            ..Mailbox::default()
        };
        self.selected = Some((mailbox.to_string(), read_only));
        Ok(info)
    }

    fn close(&mut self) -> Result<()> {
        if let Err(e) = self.record(Call::Close) {
            // a read-write selection has already been downgraded by the time CLOSE fails
            if let Some((_, ref mut read_only)) = self.selected {
                *read_only = true;
            }
            return Err(e);
        }
        match self.selected.take() {
            Some(_) => Ok(()),
            None => Err(Error::Bad("No mailbox selected".to_string())),
        }
    }

    fn uid_search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>> {
        self.record(Call::Search(criteria.to_command_args()))?;
        let tokens = criteria.tokens();
        let mut uids = Vec::new();
        for message in &self.selected_mailbox()?.messages {
            if matches(message, tokens)? {
                uids.push(message.uid);
            }
        }
        Ok(uids)
    }

    fn uid_fetch(&mut self, uids: &UidSet) -> Result<Vec<Fetch>> {
        self.record(Call::Fetch(uids.to_string()))?;
        Ok(self
            .selected_mailbox()?
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| uids.contains(m.uid))
            .map(|(i, m)| Fetch {
                message: i as u32 + 1,
                uid: Some(m.uid),
                flags: m.flags.clone(),
                body: Some(m.raw.clone()),
            })
            .collect())
    }

    fn uid_store(&mut self, uids: &UidSet, flags: &[Flag]) -> Result<()> {
        self.record(Call::Store(uids.to_string(), flags.to_vec()))?;
        if let Some((_, true)) = self.selected {
            return Err(Error::No("Mailbox is read-only".to_string()));
        }
        for message in &mut self.selected_mailbox()?.messages {
            if uids.contains(message.uid) {
                for flag in flags {
                    if !message.flags.contains(flag) {
                        message.flags.push(flag.clone());
                    }
                }
            }
        }
        Ok(())
    }

    fn logout(&mut self, timeout: Duration) -> Result<()> {
        self.selected = None;
        self.record(Call::Logout(timeout))
    }
}
