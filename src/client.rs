use bufstream::BufStream;
use log::trace;
use std::io::{self, Read, Write};
use std::time::Duration;

use crate::conn::SetReadTimeout;
use crate::error::{Error, ParseError, Result};
use crate::parse::{parse_fetches, parse_ids, parse_mailbox, parse_noop, status_text};
use crate::transport::Transport;
use crate::types::criteria::{SearchArg, SearchCriteria};
use crate::types::*;
use crate::utils::{iter_join, validate_str};

static TAG_PREFIX: &str = "a";
const INITIAL_TAG: u32 = 0;
const CR: u8 = 0x0d;
const LF: u8 = 0x0a;

/// The data items requested for every message a search turned up.
///
/// `BODY.PEEK[]` rather than `BODY[]` so that reading never sets `\Seen` as a side effect.
pub const FETCH_QUERY: &str = "(UID FLAGS BODY.PEEK[])";

/// An IMAP connection speaking the subset of IMAP4rev1 a mailbox reader needs.
///
/// Every command is sent with a fresh tag (`a1`, `a2`, ...) and blocks until the server's tagged
/// completion for it has been read. Untagged data received in between is collected and parsed
/// according to the command.
#[derive(Debug)]
pub struct Client<T: Read + Write> {
    stream: BufStream<T>,
    tag: u32,
    selected: Option<(String, bool)>,
}

impl<T: Read + Write> Client<T> {
    /// Creates a new client over the given stream.
    ///
    /// This method primarily exists for writing tests that mock the underlying transport, but can
    /// also be used to support IMAP over custom tunnels. Callers must call
    /// [`Client::read_greeting`] before issuing any commands.
    pub fn new(stream: T) -> Client<T> {
        Client {
            stream: BufStream::new(stream),
            tag: INITIAL_TAG,
            selected: None,
        }
    }

    /// Yield the underlying connection for this client.
    pub fn into_inner(self) -> Result<T> {
        Ok(self.stream.into_inner()?)
    }

    /// Read the server's greeting, which is the first thing it sends after the connection is
    /// established.
    pub fn read_greeting(&mut self) -> Result<Vec<u8>> {
        let mut v = Vec::new();
        self.readline(&mut v)?;
        if let Ok((_, imap_proto::Response::Data { status, information, .. })) =
            imap_proto::parser::parse_response(&v)
        {
            if let imap_proto::Status::Bye = status {
                return Err(Error::Bad(
                    information
                        .map(|i| i.to_string())
                        .unwrap_or_else(|| "server refused the connection".to_string()),
                ));
            }
        }
        Ok(v)
    }

    /// Log in to the IMAP server.
    ///
    /// A negative answer from the server is reported as [`Error::Auth`].
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let command = format!(
            "LOGIN {} {}",
            validate_str(username)?,
            validate_str(password)?
        );
        match self.run_command_and_check_ok(&command) {
            Err(Error::No(info)) | Err(Error::Bad(info)) => Err(Error::Auth(info)),
            r => r,
        }
    }

    /// Selects a mailbox, read-write (`SELECT`) or read-only (`EXAMINE`).
    pub fn select(&mut self, mailbox_name: &str, read_only: bool) -> Result<Mailbox> {
        let verb = if read_only { "EXAMINE" } else { "SELECT" };
        // a failed SELECT leaves the connection with no mailbox selected, see RFC 3501 6.3.1
        self.selected = None;
        let mailbox = self
            .run_command_and_read_response(&format!("{} {}", verb, validate_str(mailbox_name)?))
            .and_then(|lines| parse_mailbox(&lines[..]))?;
        self.selected = Some((mailbox_name.to_string(), read_only));
        Ok(mailbox)
    }

    /// Return to the authenticated state without removing any messages.
    ///
    /// `CLOSE` on a read-write mailbox would expunge messages flagged `\Deleted`, so a read-write
    /// selection is first downgraded with `EXAMINE`.
    pub fn close(&mut self) -> Result<()> {
        if let Some((mailbox, false)) = self.selected.clone() {
            self.select(&mailbox, true)?;
        }
        self.run_command_and_check_ok("CLOSE")?;
        self.selected = None;
        Ok(())
    }

    /// Search the selected mailbox, returning UIDs in the order the server listed them.
    pub fn uid_search(&mut self, query: &str) -> Result<Vec<Uid>> {
        self.run_command_and_read_response(&format!("UID SEARCH {}", query))
            .and_then(|lines| parse_ids(&lines))
    }

    /// Search with arguments that may include literals.
    ///
    /// The command line is cut after each literal's `{n}` and resumed with the literal's bytes once
    /// the server sends its `+` continuation.
    pub fn uid_search_args(&mut self, args: &[SearchArg]) -> Result<Vec<Uid>> {
        let mut line = self.create_command("UID SEARCH");
        for arg in args {
            line.push(' ');
            match arg {
                SearchArg::Text(text) => line.push_str(text),
                SearchArg::Literal(text) => {
                    line.push_str(&format!("{{{}}}", text.len()));
                    self.write_line(line.as_bytes())?;
                    self.wait_for_continuation(Error::Bad(
                        "server refused the search literal".to_string(),
                    ))?;
                    line = text.clone();
                }
            }
        }
        self.write_line(line.as_bytes())?;
        self.read_response().and_then(|lines| parse_ids(&lines))
    }

    /// Fetch data items for the messages in `uid_set`.
    pub fn uid_fetch(&mut self, uid_set: &str, query: &str) -> Result<Vec<Fetch>> {
        self.run_command_and_read_response(&format!("UID FETCH {} {}", uid_set, query))
            .and_then(|lines| parse_fetches(&lines))
    }

    /// Alter the flags of the messages in `uid_set`.
    pub fn uid_store(&mut self, uid_set: &str, query: &str) -> Result<()> {
        self.run_command_and_read_response(&format!("UID STORE {} {}", uid_set, query))
            .and_then(|lines| parse_noop(&lines))
    }

    /// Create a mailbox with the given name.
    pub fn create(&mut self, mailbox_name: &str) -> Result<()> {
        self.run_command_and_check_ok(&format!("CREATE {}", validate_str(mailbox_name)?))
    }

    /// Permanently remove the mailbox with the given name.
    pub fn delete(&mut self, mailbox_name: &str) -> Result<()> {
        self.run_command_and_check_ok(&format!("DELETE {}", validate_str(mailbox_name)?))
    }

    /// The APPEND command adds a mail to a mailbox.
    pub fn append(&mut self, folder: &str, content: &[u8]) -> Result<()> {
        self.run_command(&format!(
            "APPEND {} {{{}}}",
            validate_str(folder)?,
            content.len()
        ))?;
        self.wait_for_continuation(Error::Append)?;
        self.stream.write_all(content)?;
        self.stream.write_all(&[CR, LF])?;
        self.stream.flush()?;
        self.read_response().map(|_| ())
    }

    /// Logout informs the server that the client is done with the connection.
    pub fn logout(&mut self) -> Result<()> {
        self.selected = None;
        self.run_command_and_read_response("LOGOUT")
            .and_then(|lines| parse_noop(&lines))
    }

    /// Runs a command and checks if it returns OK.
    pub fn run_command_and_check_ok(&mut self, command: &str) -> Result<()> {
        self.run_command_and_read_response(command).map(|_| ())
    }

    /// Runs any command passed to it.
    pub fn run_command(&mut self, untagged_command: &str) -> Result<()> {
        let command = self.create_command(untagged_command);
        self.write_line(command.into_bytes().as_slice())
    }

    /// Run a raw IMAP command and read back its response.
    ///
    /// The untagged lines the server sent before completing the command are returned; the tagged
    /// completion itself is checked and stripped.
    pub fn run_command_and_read_response(&mut self, untagged_command: &str) -> Result<Vec<u8>> {
        self.run_command(untagged_command)?;
        self.read_response()
    }

    /// Wait for the `+` that lets a literal through. If the command is completed instead, its
    /// error is returned, or `refused` if it somehow succeeded.
    fn wait_for_continuation(&mut self, refused: Error) -> Result<()> {
        let mut v = Vec::new();
        self.readline(&mut v)?;
        if v.starts_with(b"+") {
            return Ok(());
        }
        self.read_response_onto(&mut v).and(Err(refused))
    }

    fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut v = Vec::new();
        self.read_response_onto(&mut v)?;
        Ok(v)
    }

    fn read_response_onto(&mut self, data: &mut Vec<u8>) -> Result<()> {
        let mut continue_from = None;
        let mut try_first = !data.is_empty();
        let match_tag = format!("{}{}", TAG_PREFIX, self.tag);
        loop {
            let line_start = if try_first {
                try_first = false;
                0
            } else {
                let start_new = data.len();
                self.readline(data)?;
                continue_from.take().unwrap_or(start_new)
            };

            let break_with = {
                use imap_proto::{Response, Status};
                let line = &data[line_start..];

                match imap_proto::parser::parse_response(line) {
                    Ok((
                        _,
                        Response::Done {
                            tag,
                            status,
                            information,
                            ..
                        },
                    )) => {
                        let information = status_text(information.as_deref());
                        Some(if tag.0 != match_tag {
                            Err(Error::Parse(ParseError::TagMismatch {
                                expected: match_tag.clone(),
                                got: tag.0.clone(),
                            }))
                        } else {
                            match status {
                                Status::Ok => Ok(()),
                                Status::Bad => Err(Error::Bad(information)),
                                Status::No => Err(Error::No(information)),
                                _ => Err(Error::Parse(ParseError::Invalid(line.to_vec()))),
                            }
                        })
                    }
                    Ok(..) => None,
                    Err(nom::Err::Incomplete(..)) => {
                        continue_from = Some(line_start);
                        None
                    }
                    _ => Some(Err(Error::Parse(ParseError::Invalid(line.to_vec())))),
                }
            };

            match break_with {
                Some(Ok(())) => {
                    data.truncate(line_start);
                    break Ok(());
                }
                Some(Err(e)) => break Err(e),
                None => {}
            }
        }
    }

    fn readline(&mut self, into: &mut Vec<u8>) -> Result<usize> {
        use std::io::BufRead;
        let read = self.stream.read_until(LF, into)?;
        if read == 0 {
            return Err(Error::ConnectionLost);
        }

        if log::log_enabled!(log::Level::Trace) {
            let len = into.len();
            let line = &into[(len - read)..len];
            trace!("S: {}", String::from_utf8_lossy(line).trim_end());
        }

        Ok(read)
    }

    fn create_command(&mut self, command: &str) -> String {
        self.tag += 1;
        format!("{}{} {}", TAG_PREFIX, self.tag, command)
    }

    fn write_line(&mut self, buf: &[u8]) -> Result<()> {
        self.stream.write_all(buf)?;
        self.stream.write_all(&[CR, LF])?;
        self.stream.flush()?;
        if log::log_enabled!(log::Level::Trace) {
            let line = String::from_utf8_lossy(buf);
            match line.split_once(" LOGIN ") {
                Some((tag, _)) => trace!("C: {} LOGIN <credentials>", tag),
                None => trace!("C: {}", line),
            }
        }
        Ok(())
    }
}

impl<T: Read + Write + SetReadTimeout> Client<T> {
    /// Log out, giving up if the server has not answered within `timeout`.
    ///
    /// `LOGOUT` is always sent. A zero `timeout` leaves no time for an answer, so it returns
    /// [`Error::Timeout`] without reading.
    pub fn logout_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.selected = None;
        self.run_command("LOGOUT")?;
        if timeout.is_zero() {
            return Err(Error::Timeout("LOGOUT"));
        }
        self.stream.get_mut().set_read_timeout(Some(timeout))?;
        let res = match self.read_response().and_then(|lines| parse_noop(&lines)) {
            Err(Error::Io(ref e))
                if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock =>
            {
                Err(Error::Timeout("LOGOUT"))
            }
            r => r,
        };
        // the connection is done with either way
        let _ = self.stream.get_mut().set_read_timeout(None);
        res
    }
}

impl<T: Read + Write + SetReadTimeout> Transport for Client<T> {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        Client::login(self, username, password)
    }

    fn select(&mut self, mailbox: &str, read_only: bool) -> Result<Mailbox> {
        Client::select(self, mailbox, read_only)
    }

    fn close(&mut self) -> Result<()> {
        Client::close(self)
    }

    fn uid_search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>> {
        self.uid_search_args(&criteria.to_args())
    }

    fn uid_fetch(&mut self, uids: &UidSet) -> Result<Vec<Fetch>> {
        let fetches = Client::uid_fetch(self, &uids.to_string(), FETCH_QUERY)?;
        Ok(merge_fetches(fetches, uids))
    }

    fn uid_store(&mut self, uids: &UidSet, flags: &[Flag]) -> Result<()> {
        let query = format!("+FLAGS.SILENT ({})", iter_join(flags, " "));
        Client::uid_store(self, &uids.to_string(), &query)
    }

    fn logout(&mut self, timeout: Duration) -> Result<()> {
        self.logout_timeout(timeout)
    }
}

/// One record per requested UID, in the order the UIDs first showed up.
///
/// The server may interleave FETCH data for messages we did not ask about, or send a flag update
/// for a requested message on its own line; the latter is folded into that message's record.
fn merge_fetches(fetches: Vec<Fetch>, uids: &UidSet) -> Vec<Fetch> {
    let mut merged: Vec<Fetch> = Vec::with_capacity(fetches.len());
    for fetch in fetches {
        let uid = match fetch.uid {
            Some(uid) if uids.contains(uid) => uid,
            _ => {
                log::debug!("dropping unsolicited FETCH for message {}", fetch.message);
                continue;
            }
        };
        match merged.iter_mut().find(|m| m.uid == Some(uid)) {
            Some(existing) => existing.absorb(fetch),
            None => merged.push(fetch),
        }
    }
    merged
}
