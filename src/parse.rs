use imap_proto::{self, AttributeValue, MailboxDatum, Response};
use log::debug;

use crate::error::{Error, ParseError, Result};
use crate::types::*;

pub(crate) enum MapOrNot<'a, T> {
    Map(T),
    Not(Response<'a>),
}

/// Parse every response in `lines`, keeping the ones `map` recognizes and setting aside
/// unilateral server data. Anything else is an error.
pub(crate) fn parse_many_into<'a, T, F>(
    mut lines: &'a [u8],
    into: &mut Vec<T>,
    mut map: F,
) -> Result<()>
where
    F: FnMut(Response<'a>) -> Result<MapOrNot<'a, T>>,
{
    loop {
        if lines.is_empty() {
            break Ok(());
        }

        match imap_proto::parser::parse_response(lines) {
            Ok((rest, resp)) => {
                lines = rest;

                match map(resp)? {
                    MapOrNot::Map(t) => into.push(t),
                    MapOrNot::Not(resp) => {
                        if let Some(resp) = handle_unilateral(resp) {
                            break Err(resp.into());
                        }
                    }
                }
            }
            _ => {
                break Err(Error::Parse(ParseError::Invalid(lines.to_vec())));
            }
        }
    }
}

pub(crate) fn parse_fetches(lines: &[u8]) -> Result<Vec<Fetch>> {
    let mut fetches = Vec::new();
    parse_many_into(lines, &mut fetches, |resp| match resp {
        Response::Fetch(num, attrs) => {
            let mut fetch = Fetch {
                message: num,
                uid: None,
                flags: vec![],
                body: None,
            };

            for attr in attrs {
                match attr {
                    AttributeValue::Flags(flags) => {
                        fetch
                            .flags
                            .extend(flags.into_iter().map(|f| Flag::from(f.into_owned())));
                    }
                    AttributeValue::Uid(uid) => fetch.uid = Some(uid),
                    AttributeValue::BodySection {
                        section: None,
                        data,
                        ..
                    }
                    | AttributeValue::Rfc822(data) => {
                        fetch.body = data.map(|d| d.into_owned());
                    }
                    _ => {}
                }
            }

            Ok(MapOrNot::Map(fetch))
        }
        resp => Ok(MapOrNot::Not(resp)),
    })?;
    Ok(fetches)
}

/// Collect the UIDs of every `* SEARCH` response, in the order the server sent them.
pub(crate) fn parse_ids(lines: &[u8]) -> Result<Vec<Uid>> {
    let mut ids = Vec::new();
    parse_many_into(lines, &mut ids, |resp| match resp {
        Response::MailboxData(MailboxDatum::Search(c)) => Ok(MapOrNot::Map(c)),
        resp => Ok(MapOrNot::Not(resp)),
    })?;
    Ok(ids.into_iter().flatten().collect())
}

/// Accept any untagged data, as long as it is something a server may send unprompted.
pub(crate) fn parse_noop(lines: &[u8]) -> Result<()> {
    let mut nothing: Vec<()> = Vec::new();
    parse_many_into(lines, &mut nothing, |resp| Ok(MapOrNot::Not(resp)))
}

pub(crate) fn parse_mailbox(mut lines: &[u8]) -> Result<Mailbox> {
    let mut mailbox = Mailbox::default();

    loop {
        if lines.is_empty() {
            break Ok(mailbox);
        }

        match imap_proto::parser::parse_response(lines) {
            Ok((rest, Response::Data { status, code, .. })) => {
                lines = rest;

                if !matches!(status, imap_proto::Status::Ok) {
                    debug!("ignoring untagged {:?} during mailbox selection", status);
                    continue;
                }

                use imap_proto::ResponseCode;
                match code {
                    Some(ResponseCode::UidValidity(uid)) => {
                        mailbox.uid_validity = Some(uid);
                    }
                    Some(ResponseCode::UidNext(unext)) => {
                        mailbox.uid_next = Some(unext);
                    }
                    Some(ResponseCode::Unseen(n)) => {
                        mailbox.unseen = Some(n);
                    }
                    Some(ResponseCode::PermanentFlags(flags)) => {
                        mailbox
                            .permanent_flags
                            .extend(flags.into_iter().map(|f| Flag::from(f.into_owned())));
                    }
                    _ => {}
                }
            }
            Ok((rest, Response::MailboxData(m))) => {
                lines = rest;

                match m {
                    MailboxDatum::Exists(e) => {
                        mailbox.exists = e;
                    }
                    MailboxDatum::Recent(r) => {
                        mailbox.recent = r;
                    }
                    MailboxDatum::Flags(flags) => {
                        mailbox
                            .flags
                            .extend(flags.into_iter().map(|f| Flag::from(f.into_owned())));
                    }
                    m => debug!("ignoring {:?} during mailbox selection", m),
                }
            }
            Ok((rest, Response::Expunge(n))) => {
                lines = rest;
                debug!("message {} expunged during mailbox selection", n);
            }
            Ok((_, resp)) => {
                break Err(resp.into());
            }
            _ => {
                break Err(Error::Parse(ParseError::Invalid(lines.to_vec())));
            }
        }
    }
}

/// The human-readable part of a status response.
///
/// Response codes imap-proto does not know, such as `[AUTHENTICATIONFAILED]` (RFC 5530), are
/// left at the front of the text; they are dropped here.
pub(crate) fn status_text(information: Option<&str>) -> String {
    let text = match information {
        Some(text) => text.trim(),
        None => return "no explanation given".to_string(),
    };
    let text = match text.strip_prefix('[').and_then(|rest| rest.split_once(']')) {
        Some((_, rest)) => rest.trim_start(),
        None => text,
    };
    if text.is_empty() {
        "no explanation given".to_string()
    } else {
        text.to_string()
    }
}

// check if this is simply a unilateral server response
// (see Section 7 of RFC 3501):
fn handle_unilateral(res: Response<'_>) -> Option<Response<'_>> {
    match res {
        Response::MailboxData(MailboxDatum::Status { mailbox, status }) => {
            debug!("unsolicited STATUS for {}: {:?}", mailbox, status);
        }
        Response::MailboxData(MailboxDatum::Recent(n)) => {
            debug!("unsolicited RECENT {}", n);
        }
        Response::MailboxData(MailboxDatum::Exists(n)) => {
            debug!("unsolicited EXISTS {}", n);
        }
        Response::MailboxData(MailboxDatum::Flags(flags)) => {
            debug!("unsolicited FLAGS {:?}", flags);
        }
        Response::Expunge(n) => {
            debug!("unsolicited EXPUNGE {}", n);
        }
        Response::Fetch(n, _) => {
            debug!("unsolicited FETCH for message {}", n);
        }
        Response::Data {
            status,
            information,
            ..
        } => {
            debug!("untagged {:?}: {:?}", status, information);
        }
        res => {
            return Some(res);
        }
    }
    None
}
