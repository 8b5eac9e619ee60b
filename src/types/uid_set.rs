use super::Uid;
use crate::utils::iter_join_onto;
use std::fmt;

/// The mailbox selection a set of UIDs was produced under.
///
/// UIDs are only meaningful relative to a mailbox and its `UIDVALIDITY`; see
/// [RFC 3501 section 2.3.1.1](https://tools.ietf.org/html/rfc3501#section-2.3.1.1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub(crate) mailbox: String,
    pub(crate) uid_validity: Option<u32>,
}

impl Selection {
    /// Name of the selected mailbox.
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    /// The `UIDVALIDITY` the server reported when the mailbox was selected, if any.
    pub fn uid_validity(&self) -> Option<u32> {
        self.uid_validity
    }
}

/// An ordered set of message UIDs, as returned by `UID SEARCH`.
///
/// The set remembers the [`Selection`] it came from so that it is not accidentally carried over
/// to another mailbox. UIDs are kept ascending and without duplicates, and the set renders as a
/// compact IMAP sequence set (`1:3,7`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UidSet {
    uids: Vec<Uid>,
    selection: Selection,
}

impl UidSet {
    pub(crate) fn new<I>(uids: I, selection: Selection) -> Self
    where
        I: IntoIterator<Item = Uid>,
    {
        let mut uids: Vec<Uid> = uids.into_iter().collect();
        uids.sort_unstable();
        uids.dedup();
        UidSet { uids, selection }
    }

    /// The selection these UIDs belong to.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Number of UIDs in the set.
    pub fn len(&self) -> usize {
        self.uids.len()
    }

    /// True when the search matched nothing.
    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }

    /// Whether `uid` is in the set.
    pub fn contains(&self, uid: Uid) -> bool {
        self.uids.binary_search(&uid).is_ok()
    }

    /// Iterate over the UIDs in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, Uid> {
        self.uids.iter()
    }

    fn ranges(&self) -> Vec<(Uid, Uid)> {
        let mut ranges: Vec<(Uid, Uid)> = Vec::new();
        for &uid in &self.uids {
            match ranges.last_mut() {
                Some((_, end)) if end.checked_add(1) == Some(uid) => *end = uid,
                _ => ranges.push((uid, uid)),
            }
        }
        ranges
    }
}

impl fmt::Display for UidSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ranges = self.ranges().into_iter().map(|(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{}:{}", start, end)
            }
        });
        iter_join_onto(f, ranges, ",")
    }
}

impl<'a> IntoIterator for &'a UidSet {
    type Item = &'a Uid;
    type IntoIter = std::slice::Iter<'a, Uid>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
