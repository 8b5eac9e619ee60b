use super::{Flag, Seq, Uid};

/// An IMAP [`FETCH` response](https://tools.ietf.org/html/rfc3501#section-7.4.2) that contains
/// data about a particular message.
///
/// Unlike the borrowed attribute values `imap-proto` hands out, a `Fetch` owns its data: the body
/// literal is copied out of the response buffer once, so the buffer can be dropped as soon as the
/// command completes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fetch {
    /// The ordinal number of this message in its containing mailbox.
    pub message: Seq,

    /// A number expressing the unique identifier of the message.
    pub uid: Option<Uid>,

    pub(crate) flags: Vec<Flag>,
    pub(crate) body: Option<Vec<u8>>,
}

impl Fetch {
    /// A list of flags that are set for this message.
    pub fn flags(&self) -> &[Flag] {
        &self.flags[..]
    }

    /// The full message (`BODY[]`), header block included, if it was requested.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Fold another record for the same message into this one.
    ///
    /// Flags from both are kept; the body is taken from whichever record carried one.
    pub(crate) fn absorb(&mut self, other: Fetch) {
        for flag in other.flags {
            if !self.flags.contains(&flag) {
                self.flags.push(flag);
            }
        }
        if self.body.is_none() {
            self.body = other.body;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_keeps_body_and_flags() {
        let mut flags_only = Fetch {
            message: 1,
            uid: Some(4),
            flags: vec![Flag::Flagged],
            body: None,
        };
        flags_only.absorb(Fetch {
            message: 1,
            uid: Some(4),
            flags: vec![Flag::Seen, Flag::Flagged],
            body: Some(b"x".to_vec()),
        });
        assert_eq!(flags_only.flags(), &[Flag::Flagged, Flag::Seen]);
        assert_eq!(flags_only.body(), Some(&b"x"[..]));
    }
}
