use super::{Fetch, Flag, Uid};
use crate::error::{ParseError, Result};
use std::collections::HashSet;

/// The header block of a message: field names with their values, in the order they appeared.
///
/// Lookups are case-insensitive, and a field may occur more than once (`Received`, for
/// example).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    fields: Vec<(String, String)>,
}

impl Header {
    /// The first value of the field `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Every value of the field `name`, in order of appearance.
    ///
    /// The values borrow from the header only, so `name` may be a temporary.
    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let name = name.to_owned();
        self.fields
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(&name))
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over all `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of header fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the message had no header fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A message retrieved from the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    uid: Option<Uid>,
    flags: HashSet<Flag>,
    header: Header,
    body: Vec<u8>,
}

impl Message {
    /// Split a raw RFC 5322 message into its header fields and body.
    ///
    /// The body is everything after the blank line ending the header block, byte for byte.
    pub fn parse(raw: &[u8], flags: impl IntoIterator<Item = Flag>) -> Result<Self> {
        let (headers, body_start) = mailparse::parse_headers(raw).map_err(ParseError::Message)?;
        let fields = headers
            .iter()
            .map(|h| (h.get_key(), h.get_value()))
            .collect();
        Ok(Message {
            uid: None,
            flags: flags.into_iter().collect(),
            header: Header { fields },
            body: raw[body_start.min(raw.len())..].to_vec(),
        })
    }

    pub(crate) fn from_fetch(fetch: &Fetch) -> Result<Self> {
        let raw = fetch
            .body()
            .ok_or(ParseError::MissingBody(fetch.uid))?;
        let mut message = Message::parse(raw, fetch.flags().iter().cloned())?;
        message.uid = fetch.uid;
        Ok(message)
    }

    /// The UID of the message in the mailbox it was read from.
    pub fn uid(&self) -> Option<Uid> {
        self.uid
    }

    /// The flags the message carried when it was fetched.
    pub fn flags(&self) -> &HashSet<Flag> {
        &self.flags
    }

    /// True if `flag` was set when the message was fetched.
    pub fn has_flag(&self, flag: &Flag) -> bool {
        self.flags.contains(flag)
    }

    /// The header fields of the message.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The body of the message, exactly as the server sent it.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Take the body, dropping the rest of the message.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}
