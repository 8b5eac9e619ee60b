//! Search criteria for [`UID SEARCH`](https://tools.ietf.org/html/rfc3501#section-6.4.4).

use crate::utils::quote;
use std::borrow::Cow;

/// One token of a search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// A search key sent verbatim, such as `UNSEEN` or `SUBJECT`.
    Atom(Cow<'static, str>),
    /// A string argument. It is quoted when the command is built, or sent as a literal if a
    /// quoted string cannot carry it.
    Str(String),
}

/// A search token as it goes over the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchArg {
    /// Sent as-is: a key, or an argument already quoted.
    Text(String),
    /// Sent as an IMAP literal (`{n}` followed by the bytes once the server asks for them).
    Literal(String),
}

// quoted strings may only hold 7-bit characters other than CR and LF (RFC 3501 section 9)
fn needs_literal(s: &str) -> bool {
    s.bytes().any(|b| b == b'\r' || b == b'\n' || !b.is_ascii())
}

/// An ordered sequence of search tokens.
///
/// Criteria are values: combining or extending them produces a new `SearchCriteria`, and the
/// predefined constants below are never modified by quoting.
///
/// ```
/// use imap_reader::criteria::{self, SearchCriteria};
///
/// let c = criteria::UNSEEN.and(&criteria::by_subject("Fancy \"ponies\""));
/// assert_eq!(c.to_command_args(), r#"UNSEEN SUBJECT "Fancy \"ponies\"""#);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchCriteria {
    tokens: Cow<'static, [Token]>,
}

macro_rules! keyword {
    ($(#[$doc:meta] $name:ident => $kw:literal),* $(,)?) => {
        $(
            #[$doc]
            pub const $name: SearchCriteria = SearchCriteria {
                tokens: Cow::Borrowed(&[Token::Atom(Cow::Borrowed($kw))]),
            };
        )*
    };
}

keyword! {
    /// Messages that do not have the `\Seen` flag set.
    UNSEEN => "UNSEEN",
    /// All messages in the mailbox.
    ALL => "ALL",
    /// Messages with the `\Answered` flag set.
    ANSWERED => "ANSWERED",
    /// Messages that do not have the `\Answered` flag set.
    UNANSWERED => "UNANSWERED",
    /// Messages with the `\Deleted` flag set.
    DELETED => "DELETED",
    /// Messages that do not have the `\Deleted` flag set.
    UNDELETED => "UNDELETED",
    /// Messages with the `\Flagged` flag set.
    FLAGGED => "FLAGGED",
    /// Messages that do not have the `\Flagged` flag set.
    UNFLAGGED => "UNFLAGGED",
    /// Messages that have the `\Recent` flag set but not the `\Seen` flag.
    NEW => "NEW",
    /// Messages that do not have the `\Recent` flag set.
    OLD => "OLD",
    /// Messages that have the `\Recent` flag set.
    RECENT => "RECENT",
    /// Messages that have the `\Seen` flag set.
    SEEN => "SEEN",
}

/// Messages whose `Subject` contains `subject`.
pub fn by_subject(subject: impl Into<String>) -> SearchCriteria {
    SearchCriteria::new("SUBJECT").arg(subject)
}

/// Messages whose `From` contains `from`.
pub fn by_from(from: impl Into<String>) -> SearchCriteria {
    SearchCriteria::new("FROM").arg(from)
}

/// Messages whose `To` contains `to`.
pub fn by_to(to: impl Into<String>) -> SearchCriteria {
    SearchCriteria::new("TO").arg(to)
}

/// Messages whose text body contains `text`.
pub fn by_body(text: impl Into<String>) -> SearchCriteria {
    SearchCriteria::new("BODY").arg(text)
}

impl SearchCriteria {
    /// Start a search with the given key.
    pub fn new(keyword: impl Into<Cow<'static, str>>) -> Self {
        SearchCriteria {
            tokens: Cow::Owned(vec![Token::Atom(keyword.into())]),
        }
    }

    /// Build criteria from raw tokens: the first one is the search key and every following one
    /// is a string argument.
    ///
    /// An empty token list searches `ALL`.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens = tokens.into_iter();
        match tokens.next() {
            None => ALL,
            Some(key) => tokens.fold(SearchCriteria::new(key.into()), |c, arg| c.arg(arg)),
        }
    }

    /// Append a string argument to the last key.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.tokens.to_mut().push(Token::Str(value.into()));
        self
    }

    /// Both these criteria and `other` must match.
    pub fn and(&self, other: &SearchCriteria) -> Self {
        let mut tokens = self.tokens.to_vec();
        tokens.extend(other.tokens.iter().cloned());
        SearchCriteria {
            tokens: Cow::Owned(tokens),
        }
    }

    /// The tokens making up this search.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The arguments of a `SEARCH` command for these criteria.
    ///
    /// Strings are quoted, except those holding CR, LF or non-ASCII characters, which become
    /// literals. If any string is not ASCII the search is prefixed with `CHARSET UTF-8`.
    pub fn to_args(&self) -> Vec<SearchArg> {
        let mut args = Vec::with_capacity(self.tokens.len() + 1);
        if self
            .tokens
            .iter()
            .any(|t| matches!(t, Token::Str(s) if !s.is_ascii()))
        {
            args.push(SearchArg::Text("CHARSET UTF-8".to_string()));
        }
        for token in self.tokens.iter() {
            args.push(match token {
                Token::Atom(atom) => SearchArg::Text(atom.to_string()),
                Token::Str(s) if needs_literal(s) => SearchArg::Literal(s.clone()),
                Token::Str(s) => SearchArg::Text(quote(s)),
            });
        }
        args
    }

    /// Render the criteria as the arguments of a `SEARCH` command.
    ///
    /// Literals are written the way they travel, `{n}` then CRLF then the text.
    pub fn to_command_args(&self) -> String {
        let mut rendered = String::new();
        for (i, arg) in self.to_args().iter().enumerate() {
            if i > 0 {
                rendered.push(' ');
            }
            match arg {
                SearchArg::Text(text) => rendered.push_str(text),
                SearchArg::Literal(text) => {
                    rendered.push_str(&format!("{{{}}}\r\n{}", text.len(), text))
                }
            }
        }
        rendered
    }
}
