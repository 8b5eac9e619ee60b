use crate::client::Client;
use crate::client_builder::ClientBuilder;
use crate::conn::Connection;
use crate::error::{Error, Result};
use crate::options::Options;
use crate::transport::Transport;
use crate::types::criteria::SearchCriteria;
use crate::types::{Flag, Mailbox, Message, Selection, UidSet};
use log::{debug, warn};

/// Where a [`Reader`] is in the IMAP connection lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Connected and greeted, not yet logged in.
    Connected,
    /// Logged in; mailboxes may be selected.
    Authenticated,
    /// `LOGOUT` was sent. Nothing more can be done with this session.
    LoggedOut,
}

/// Which mailbox, if any, a [`Reader`] has selected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MailboxState {
    /// No mailbox is selected.
    Unselected,
    /// A mailbox was opened with `EXAMINE`. Flags cannot be changed.
    SelectedReadOnly(Selection),
    /// A mailbox was opened with `SELECT`.
    SelectedReadWrite(Selection),
}

impl MailboxState {
    /// The current selection, if any.
    pub fn selection(&self) -> Option<&Selection> {
        match self {
            MailboxState::Unselected => None,
            MailboxState::SelectedReadOnly(s) | MailboxState::SelectedReadWrite(s) => Some(s),
        }
    }

    /// True if a mailbox is selected.
    pub fn is_selected(&self) -> bool {
        self.selection().is_some()
    }
}

/// The result of [`Reader::list_detailed`].
#[derive(Debug)]
pub struct Listing {
    /// Every message that matched, in the order the server returned them.
    pub messages: Vec<Message>,
    /// How flagging the messages as `\Seen` went. `None` when nothing was marked, either because
    /// marking is turned off or because no message matched.
    pub mark_seen: Option<Result<()>>,
}

/// A session with one IMAP account, reading the messages of its mailboxes.
///
/// The reader tracks the state of the connection and of the selected mailbox. Calling an
/// operation in a state where it makes no sense (searching before logging in, marking messages
/// seen in a mailbox opened read-only, ...) is a programming error and panics; everything the
/// server or the network can cause is returned as an [`Error`].
///
/// A `Reader` is not meant to be shared between threads. Commands are sent one at a time and
/// each blocks until the server has completed it.
///
/// ```no_run
/// use imap_reader::{criteria, Options, Reader};
/// # fn main() -> imap_reader::Result<()> {
/// let options = Options::new("imap.example.com:993", "user", "secret").mark_seen(true);
/// let mut reader = Reader::connect(options)?;
/// reader.login()?;
/// for message in reader.list("INBOX", &criteria::UNSEEN)? {
///     println!("{:?}", message.header().get("Subject"));
/// }
/// reader.logout()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Reader<T: Transport> {
    options: Options,
    transport: T,
    session: SessionState,
    mailbox: MailboxState,
}

impl Reader<Client<Connection>> {
    /// Dial [`Options::addr`], with TLS if [`Options::tls`] is set, and read the server greeting.
    ///
    /// The returned reader is [`Connected`](SessionState::Connected); call
    /// [`login`](Reader::login) next.
    pub fn connect(options: Options) -> Result<Self> {
        let client = ClientBuilder::from_addr(&options.addr)?
            .tls(options.tls)
            .connect()?;
        Ok(Reader::new(options, client))
    }
}

impl<T: Transport> Reader<T> {
    /// Wrap an already connected and greeted transport.
    pub fn new(options: Options, transport: T) -> Self {
        Reader {
            options,
            transport,
            session: SessionState::Connected,
            mailbox: MailboxState::Unselected,
        }
    }

    /// Log in with the credentials from the options.
    ///
    /// # Panics
    ///
    /// If the session is not [`Connected`](SessionState::Connected).
    pub fn login(&mut self) -> Result<()> {
        assert_eq!(
            self.session,
            SessionState::Connected,
            "login on a session that is not freshly connected"
        );
        debug!("logging in as {}", self.options.username);
        self.transport
            .login(&self.options.username, &self.options.password)?;
        self.session = SessionState::Authenticated;
        Ok(())
    }

    /// End the session, waiting at most [`Options::timeout`] for the server.
    ///
    /// The session counts as logged out afterwards even when an error is returned.
    ///
    /// # Panics
    ///
    /// If the session is already logged out.
    pub fn logout(&mut self) -> Result<()> {
        assert_ne!(
            self.session,
            SessionState::LoggedOut,
            "session is already logged out"
        );
        self.session = SessionState::LoggedOut;
        self.mailbox = MailboxState::Unselected;
        self.transport.logout(self.options.timeout)
    }

    /// Open `mailbox`, read-only (`EXAMINE`) or read-write (`SELECT`).
    ///
    /// Any previous selection is given up first. If the server refuses, no mailbox is selected.
    ///
    /// # Panics
    ///
    /// If the session is not logged in.
    pub fn select(&mut self, mailbox: &str, read_only: bool) -> Result<Mailbox> {
        self.require_login("select");
        self.mailbox = MailboxState::Unselected;
        debug!(
            "opening {} {}",
            mailbox,
            if read_only { "read-only" } else { "read-write" }
        );
        let info = self.transport.select(mailbox, read_only)?;
        let selection = Selection {
            mailbox: mailbox.to_string(),
            uid_validity: info.uid_validity,
        };
        self.mailbox = if read_only {
            MailboxState::SelectedReadOnly(selection)
        } else {
            MailboxState::SelectedReadWrite(selection)
        };
        Ok(info)
    }

    /// Leave the selected mailbox. Messages flagged `\Deleted` stay where they are.
    ///
    /// # Panics
    ///
    /// If no mailbox is selected.
    ///
    /// If closing fails, a read-write selection is reported as read-only from then on: the
    /// transport may already have downgraded it before the failing step.
    pub fn close(&mut self) -> Result<()> {
        self.require_selection("close");
        if let Err(e) = self.transport.close() {
            self.mailbox = match std::mem::replace(&mut self.mailbox, MailboxState::Unselected) {
                MailboxState::SelectedReadWrite(selection) => {
                    MailboxState::SelectedReadOnly(selection)
                }
                other => other,
            };
            return Err(e);
        }
        self.mailbox = MailboxState::Unselected;
        Ok(())
    }

    /// Find the UIDs of the messages in the selected mailbox that match `criteria`.
    ///
    /// # Panics
    ///
    /// If no mailbox is selected.
    pub fn search(&mut self, criteria: &SearchCriteria) -> Result<UidSet> {
        let selection = self.require_selection("search").clone();
        let uids = self.transport.uid_search(criteria)?;
        debug!("{} message(s) in {} match", uids.len(), selection.mailbox);
        Ok(UidSet::new(uids, selection))
    }

    /// Download the flags and full content of every message in `uids`.
    ///
    /// An empty set is answered without asking the server. Either every message is returned or
    /// none is: a record the server sent without a body, or one that does not parse, fails the
    /// whole call.
    ///
    /// # Panics
    ///
    /// If no mailbox is selected, or `uids` were found in another mailbox than the selected one.
    pub fn fetch(&mut self, uids: &UidSet) -> Result<Vec<Message>> {
        self.check_uids(uids, "fetch")?;
        if uids.is_empty() {
            return Ok(Vec::new());
        }
        self.transport
            .uid_fetch(uids)?
            .iter()
            .map(Message::from_fetch)
            .collect()
    }

    /// Flag every message in `uids` as `\Seen`, without asking for the new flags back.
    ///
    /// Flagging a message that is already seen changes nothing.
    ///
    /// # Panics
    ///
    /// If the selected mailbox was not opened read-write, or `uids` belong to another mailbox.
    pub fn mark_seen(&mut self, uids: &UidSet) -> Result<()> {
        if let MailboxState::SelectedReadOnly(_) | MailboxState::Unselected = self.mailbox {
            panic!(
                "mark_seen needs a mailbox opened read-write, not {:?}",
                self.mailbox
            );
        }
        self.check_uids(uids, "mark_seen")?;
        if uids.is_empty() {
            return Ok(());
        }
        debug!("marking {} seen", uids);
        self.transport.uid_store(uids, &[Flag::Seen])
    }

    /// Read every message in `mailbox` matching `criteria`.
    ///
    /// The mailbox is examined read-only, searched, fetched from and closed. With
    /// [`Options::mark_seen`] set and at least one message found, it is then selected read-write,
    /// the messages are flagged `\Seen` and the mailbox is closed again.
    ///
    /// Any failure aborts the listing and nothing is returned, including a failure to mark the
    /// messages seen after they were fetched; see [`list_detailed`](Reader::list_detailed) to keep
    /// the messages in that case. Steps already carried out are not undone.
    ///
    /// # Panics
    ///
    /// If the session is not logged in.
    pub fn list(&mut self, mailbox: &str, criteria: &SearchCriteria) -> Result<Vec<Message>> {
        let listing = self.list_detailed(mailbox, criteria)?;
        match listing.mark_seen {
            Some(Err(e)) => Err(e),
            _ => Ok(listing.messages),
        }
    }

    /// Like [`list`](Reader::list), but a failure while marking messages seen is reported next
    /// to the fetched messages instead of replacing them.
    pub fn list_detailed(&mut self, mailbox: &str, criteria: &SearchCriteria) -> Result<Listing> {
        self.require_login("list");
        self.select(mailbox, true)?;
        let uids = self.search(criteria)?;
        let messages = self.fetch(&uids)?;
        self.close()?;
        debug!("listed {} message(s) from {}", messages.len(), mailbox);

        let mark_seen = if self.options.mark_seen && !messages.is_empty() {
            let res = self.mark_listed_seen(mailbox, &uids);
            if let Err(ref e) = res {
                warn!("could not mark messages in {} seen: {}", mailbox, e);
            }
            Some(res)
        } else {
            None
        };
        Ok(Listing {
            messages,
            mark_seen,
        })
    }

    fn mark_listed_seen(&mut self, mailbox: &str, uids: &UidSet) -> Result<()> {
        self.select(mailbox, false)?;
        self.mark_seen(uids)?;
        self.close()
    }

    /// Lifecycle state of the session.
    pub fn state(&self) -> SessionState {
        self.session
    }

    /// Selection state of the session.
    pub fn mailbox_state(&self) -> &MailboxState {
        &self.mailbox
    }

    /// The options the reader was made with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The underlying transport, to send commands the reader does not cover (creating a
    /// mailbox, for instance). The reader does not see what is done through it.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give up the reader and return the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn require_login(&self, op: &str) {
        assert_eq!(
            self.session,
            SessionState::Authenticated,
            "{} needs a logged-in session",
            op
        );
    }

    fn require_selection(&self, op: &str) -> &Selection {
        self.require_login(op);
        match self.mailbox.selection() {
            Some(selection) => selection,
            None => panic!("{} needs a selected mailbox", op),
        }
    }

    // UIDs from another mailbox are a caller bug; a changed UIDVALIDITY is the server's doing
    fn check_uids(&self, uids: &UidSet, op: &str) -> Result<()> {
        let current = self.require_selection(op);
        let origin = uids.selection();
        assert_eq!(
            origin.mailbox, current.mailbox,
            "{}: UIDs from {:?} used while {:?} is selected",
            op, origin.mailbox, current.mailbox
        );
        match (origin.uid_validity, current.uid_validity) {
            (Some(was), Some(now)) if was != now => Err(Error::StaleUids {
                mailbox: current.mailbox.clone(),
                was,
                now,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria;
    use crate::mock_stream::MockStream;
    use crate::testing::{Call, FakeTransport};
    use crate::ErrorKind;
    use std::time::Duration;

    const PONIES: &[u8] = b"Subject: Fancy ponies\r\nFrom: pony@example.com\r\n\r\nHello!\r\n";
    const FANCY_PONY: &[u8] = b"Subject: Fancy ponies\r\n\
                                From: Fancy pony <fancy@ponies.org>\r\n\
                                \r\n\
                                Hello, ponies\r\n";

    fn reader(fake: FakeTransport, mark_seen: bool) -> Reader<FakeTransport> {
        let options = Options::new("localhost:3143", "pony", "hay").mark_seen(mark_seen);
        let mut reader = Reader::new(options, fake);
        reader.login().unwrap();
        reader.transport_mut().clear_calls();
        reader
    }

    #[test]
    fn login_and_logout() {
        let fake = FakeTransport::new().with_credentials("pony", "hay");
        let options = Options::new("localhost:3143", "pony", "hay").timeout(Duration::from_secs(3));
        let mut reader = Reader::new(options, fake);
        assert_eq!(reader.state(), SessionState::Connected);
        reader.login().unwrap();
        assert_eq!(reader.state(), SessionState::Authenticated);
        reader.logout().unwrap();
        assert_eq!(reader.state(), SessionState::LoggedOut);
        assert_eq!(
            reader.transport().calls(),
            &[
                Call::Login("pony".into()),
                Call::Logout(Duration::from_secs(3))
            ]
        );
    }

    #[test]
    fn login_rejected() {
        let fake = FakeTransport::new().with_credentials("pony", "oats");
        let mut reader = Reader::new(Options::new("localhost:3143", "pony", "hay"), fake);
        let err = reader.login().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(reader.state(), SessionState::Connected);
    }

    #[test]
    fn logout_failure_still_logs_out() {
        let mut reader = reader(FakeTransport::new(), false);
        reader.select("INBOX", true).unwrap();
        reader.transport_mut().fail_next("LOGOUT", "Busy");
        assert!(reader.logout().is_err());
        assert_eq!(reader.state(), SessionState::LoggedOut);
        assert_eq!(reader.mailbox_state(), &MailboxState::Unselected);
    }

    #[test]
    fn list_without_mark_seen() {
        let mut fake = FakeTransport::new();
        fake.append("INBOX", PONIES);
        let mut reader = reader(fake, false);

        let messages = reader.list("INBOX", &criteria::UNSEEN).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].uid(), Some(1));
        assert_eq!(messages[0].header().get("Subject"), Some("Fancy ponies"));
        assert_eq!(messages[0].body(), b"Hello!\r\n");
        assert!(messages[0].flags().is_empty());

        assert_eq!(
            reader.transport().calls(),
            &[
                Call::Select("INBOX".into(), true),
                Call::Search("UNSEEN".into()),
                Call::Fetch("1".into()),
                Call::Close,
            ]
        );
        assert_eq!(reader.transport().flags("INBOX", 1), Some(&[][..]));
        assert_eq!(reader.mailbox_state(), &MailboxState::Unselected);
    }

    #[test]
    fn list_with_mark_seen() {
        let mut fake = FakeTransport::new();
        fake.append("INBOX", PONIES);
        fake.append_with_flags("INBOX", PONIES, &[Flag::Seen]);
        fake.append("INBOX", PONIES);
        let mut reader = reader(fake, true);

        let messages = reader.list("INBOX", &criteria::UNSEEN).unwrap();
        assert_eq!(messages.len(), 2);
        // the returned flags are the ones from before marking
        assert!(messages.iter().all(|m| !m.has_flag(&Flag::Seen)));

        assert_eq!(
            reader.transport().calls(),
            &[
                Call::Select("INBOX".into(), true),
                Call::Search("UNSEEN".into()),
                Call::Fetch("1,3".into()),
                Call::Close,
                Call::Select("INBOX".into(), false),
                Call::Store("1,3".into(), vec![Flag::Seen]),
                Call::Close,
            ]
        );
        for uid in 1..=3 {
            assert_eq!(
                reader.transport().flags("INBOX", uid),
                Some(&[Flag::Seen][..])
            );
        }

        // nothing unseen is left
        reader.transport_mut().clear_calls();
        assert!(reader.list("INBOX", &criteria::UNSEEN).unwrap().is_empty());
    }

    #[test]
    fn list_nothing_found() {
        let mut reader = reader(FakeTransport::new(), true);
        assert!(reader.list("INBOX", &criteria::ALL).unwrap().is_empty());
        assert_eq!(
            reader.transport().calls(),
            &[
                Call::Select("INBOX".into(), true),
                Call::Search("ALL".into()),
                Call::Close,
            ]
        );
    }

    #[test]
    fn list_missing_mailbox() {
        let mut reader = reader(FakeTransport::new(), true);
        let err = reader.list("Nope", &criteria::ALL).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(reader.transport().calls(), &[Call::Select("Nope".into(), true)]);
        assert_eq!(reader.mailbox_state(), &MailboxState::Unselected);
    }

    #[test]
    fn list_mark_seen_failure() {
        let mut fake = FakeTransport::new();
        fake.append("INBOX", PONIES);
        fake.fail_next("STORE", "Quota exceeded");
        let mut reader = reader(fake, true);

        let listing = reader.list_detailed("INBOX", &criteria::ALL).unwrap();
        assert_eq!(listing.messages.len(), 1);
        assert!(matches!(listing.mark_seen, Some(Err(Error::No(_)))));
        // the read-write selection is left for the caller to close
        assert!(matches!(
            reader.mailbox_state(),
            MailboxState::SelectedReadWrite(_)
        ));

        reader.transport_mut().fail_next("STORE", "Quota exceeded");
        assert!(matches!(
            reader.list("INBOX", &criteria::ALL),
            Err(Error::No(_))
        ));
    }

    #[test]
    fn list_detailed_reports_marking() {
        let mut fake = FakeTransport::new();
        fake.append("INBOX", PONIES);
        let mut reader = reader(fake, true);
        let listing = reader.list_detailed("INBOX", &criteria::ALL).unwrap();
        assert!(matches!(listing.mark_seen, Some(Ok(()))));

        let mut reader = Reader::new(Options::default(), FakeTransport::new());
        reader.login().unwrap();
        let listing = reader.list_detailed("INBOX", &criteria::ALL).unwrap();
        assert!(listing.mark_seen.is_none());
    }

    #[test]
    fn list_by_subject_and_from() {
        let mut fake = FakeTransport::new();
        fake.append("INBOX", PONIES);
        fake.append("INBOX", b"Subject: Boring\r\nFrom: cow@example.com\r\n\r\nMoo\r\n");
        let mut reader = reader(fake, false);

        let found = reader
            .list("INBOX", &criteria::by_subject("fancy"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uid(), Some(1));

        let found = reader
            .list("INBOX", &criteria::by_from("cow@example.com"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].body(), b"Moo\r\n");
        assert_eq!(
            reader.transport().calls()[5],
            Call::Search("FROM \"cow@example.com\"".into())
        );
    }

    #[test]
    fn list_sends_line_breaks_as_literal() {
        let mut reader = reader(FakeTransport::new(), false);
        let found = reader
            .list("INBOX", &criteria::by_subject("a\r\nb"))
            .unwrap();
        assert!(found.is_empty());
        assert_eq!(
            reader.transport().calls(),
            &[
                Call::Select("INBOX".into(), true),
                Call::Search("SUBJECT {4}\r\na\r\nb".into()),
                Call::Close,
            ]
        );
    }

    #[test]
    fn list_keeps_header_and_body_intact() {
        let mut fake = FakeTransport::new();
        fake.append("INBOX", FANCY_PONY);
        let mut reader = reader(fake, true);

        let messages = reader.list("INBOX", &criteria::UNSEEN).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].header().get("Subject"), Some("Fancy ponies"));
        assert_eq!(
            messages[0].header().get("From"),
            Some("Fancy pony <fancy@ponies.org>")
        );
        assert_eq!(messages[0].body(), b"Hello, ponies\r\n");
        assert!(messages[0].flags().is_empty());

        // marked seen, so it no longer matches
        assert!(reader.list("INBOX", &criteria::UNSEEN).unwrap().is_empty());
    }

    #[test]
    fn failed_close_downgrades_selection() {
        let mut reader = reader(FakeTransport::new(), false);
        reader.select("INBOX", false).unwrap();
        reader.transport_mut().fail_next("CLOSE", "Nope");
        assert!(reader.close().is_err());
        assert!(matches!(
            reader.mailbox_state(),
            MailboxState::SelectedReadOnly(s) if s.mailbox == "INBOX"
        ));
        assert_eq!(reader.transport().selected(), Some(("INBOX", true)));
        reader.close().unwrap();
        assert_eq!(reader.mailbox_state(), &MailboxState::Unselected);
    }

    #[test]
    fn fetch_empty_set_sends_nothing() {
        let mut reader = reader(FakeTransport::new(), false);
        reader.select("INBOX", true).unwrap();
        let uids = reader.search(&criteria::ALL).unwrap();
        assert!(uids.is_empty());
        assert!(reader.fetch(&uids).unwrap().is_empty());
        reader.select("INBOX", false).unwrap();
        reader.mark_seen(&uids).unwrap();
        assert!(!reader
            .transport()
            .calls()
            .iter()
            .any(|c| matches!(c, Call::Fetch(_) | Call::Store(..))));
    }

    #[test]
    fn stale_uids() {
        let mut fake = FakeTransport::new();
        fake.append("INBOX", PONIES);
        let mut reader = reader(fake, false);
        reader.select("INBOX", true).unwrap();
        let uids = reader.search(&criteria::ALL).unwrap();
        reader.close().unwrap();

        reader.transport_mut().set_uid_validity("INBOX", 2);
        reader.select("INBOX", false).unwrap();
        match reader.mark_seen(&uids) {
            Err(Error::StaleUids { was: 1, now: 2, .. }) => {}
            r => panic!("Wrong result: {:?}", r),
        }
        assert!(matches!(reader.fetch(&uids), Err(Error::StaleUids { .. })));
    }

    #[test]
    #[should_panic(expected = "selected")]
    fn uids_from_other_mailbox() {
        let mut fake = FakeTransport::new();
        fake.create("Archive");
        let mut reader = reader(fake, false);
        reader.select("INBOX", true).unwrap();
        let uids = reader.search(&criteria::ALL).unwrap();
        reader.select("Archive", true).unwrap();
        let _ = reader.fetch(&uids);
    }

    #[test]
    #[should_panic(expected = "search needs a selected mailbox")]
    fn search_unselected() {
        let mut reader = reader(FakeTransport::new(), false);
        let _ = reader.search(&criteria::ALL);
    }

    #[test]
    #[should_panic(expected = "select needs a logged-in session")]
    fn select_before_login() {
        let mut reader = Reader::new(Options::default(), FakeTransport::new());
        let _ = reader.select("INBOX", true);
    }

    #[test]
    #[should_panic(expected = "mark_seen needs a mailbox opened read-write")]
    fn mark_seen_read_only() {
        let mut fake = FakeTransport::new();
        fake.append("INBOX", PONIES);
        let mut reader = reader(fake, false);
        reader.select("INBOX", true).unwrap();
        let uids = reader.search(&criteria::ALL).unwrap();
        let _ = reader.mark_seen(&uids);
    }

    #[test]
    #[should_panic(expected = "already logged out")]
    fn logout_twice() {
        let mut reader = reader(FakeTransport::new(), false);
        reader.logout().unwrap();
        let _ = reader.logout();
    }

    #[test]
    fn list_over_the_wire() {
        let response = b"a1 OK Logged in\r\n\
            * 1 EXISTS\r\n\
            * OK [UIDVALIDITY 7] UIDs valid\r\n\
            a2 OK [READ-ONLY] Examine completed\r\n\
            * SEARCH 4\r\n\
            a3 OK Search completed\r\n\
            * 1 FETCH (UID 4 FLAGS () BODY[] {77}\r\n\
            Subject: Fancy ponies\r\nFrom: Fancy pony <fancy@ponies.org>\r\n\r\n\
            Hello, ponies\r\n)\r\n\
            a4 OK Fetch completed\r\n\
            a5 OK Close completed\r\n"
            .to_vec();
        let client = Client::new(MockStream::new(response));
        let mut reader = Reader::new(Options::new("localhost:143", "pony", "hay"), client);
        reader.login().unwrap();

        let messages = reader.list("INBOX", &criteria::UNSEEN).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].uid(), Some(4));
        assert_eq!(messages[0].header().get("subject"), Some("Fancy ponies"));
        assert_eq!(
            messages[0].header().get("from"),
            Some("Fancy pony <fancy@ponies.org>")
        );
        assert_eq!(messages[0].body(), b"Hello, ponies\r\n");
        assert!(messages[0].flags().is_empty());

        let stream = reader.into_inner().into_inner().unwrap();
        assert_eq!(
            String::from_utf8(stream.written_buf).unwrap(),
            "a1 LOGIN \"pony\" \"hay\"\r\n\
             a2 EXAMINE \"INBOX\"\r\n\
             a3 UID SEARCH UNSEEN\r\n\
             a4 UID FETCH 4 (UID FLAGS BODY.PEEK[])\r\n\
             a5 CLOSE\r\n"
        );
    }
}
