//! The commands a [`Reader`](crate::Reader) needs from an IMAP connection.

use crate::error::Result;
use crate::types::criteria::SearchCriteria;
use crate::types::{Fetch, Flag, Mailbox, Uid, UidSet};
use std::time::Duration;

/// A connection able to carry out the handful of IMAP commands a mailbox read is made of.
///
/// [`Client`](crate::Client) implements this over any `Read + Write` stream. Every method sends
/// one command (two for [`close`](Transport::close) on a read-write selection) and blocks until
/// the server has completed it; a `NO` or `BAD` completion is returned as an error.
pub trait Transport {
    /// `LOGIN` with the given credentials. A rejection is [`Error::Auth`](crate::Error::Auth).
    fn login(&mut self, username: &str, password: &str) -> Result<()>;

    /// `EXAMINE` (`read_only`) or `SELECT` the mailbox.
    fn select(&mut self, mailbox: &str, read_only: bool) -> Result<Mailbox>;

    /// Leave the selected mailbox without expunging anything.
    fn close(&mut self) -> Result<()>;

    /// `UID SEARCH` the selected mailbox.
    fn uid_search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>>;

    /// `UID FETCH` the flags and the full message of every UID in the set.
    fn uid_fetch(&mut self, uids: &UidSet) -> Result<Vec<Fetch>>;

    /// Silently add `flags` to every UID in the set (`+FLAGS.SILENT`).
    fn uid_store(&mut self, uids: &UidSet, flags: &[Flag]) -> Result<()>;

    /// `LOGOUT`, waiting at most `timeout` for the server to acknowledge it.
    fn logout(&mut self, timeout: Duration) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        (**self).login(username, password)
    }

    fn select(&mut self, mailbox: &str, read_only: bool) -> Result<Mailbox> {
        (**self).select(mailbox, read_only)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn uid_search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>> {
        (**self).uid_search(criteria)
    }

    fn uid_fetch(&mut self, uids: &UidSet) -> Result<Vec<Fetch>> {
        (**self).uid_fetch(uids)
    }

    fn uid_store(&mut self, uids: &UidSet, flags: &[Flag]) -> Result<()> {
        (**self).uid_store(uids, flags)
    }

    fn logout(&mut self, timeout: Duration) -> Result<()> {
        (**self).logout(timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        (**self).login(username, password)
    }

    fn select(&mut self, mailbox: &str, read_only: bool) -> Result<Mailbox> {
        (**self).select(mailbox, read_only)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn uid_search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>> {
        (**self).uid_search(criteria)
    }

    fn uid_fetch(&mut self, uids: &UidSet) -> Result<Vec<Fetch>> {
        (**self).uid_fetch(uids)
    }

    fn uid_store(&mut self, uids: &UidSet, flags: &[Flag]) -> Result<()> {
        (**self).uid_store(uids, flags)
    }

    fn logout(&mut self, timeout: Duration) -> Result<()> {
        (**self).logout(timeout)
    }
}
