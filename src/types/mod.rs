//! This module contains the types a mailbox read produces and consumes.

/// From section [2.3.1.1 of RFC 3501](https://tools.ietf.org/html/rfc3501#section-2.3.1.1).
///
/// A 32-bit value assigned to each message, which when used with the unique identifier validity
/// value forms a 64-bit value that will not refer to any other message in the mailbox or any
/// subsequent mailbox with the same name forever. Unique identifiers are assigned in a strictly
/// ascending fashion in the mailbox, but are not necessarily contiguous.
///
/// If the `UIDVALIDITY` reported at selection time changes, previously obtained UIDs must be
/// discarded.
pub type Uid = u32;

/// From section [2.3.1.2 of RFC 3501](https://tools.ietf.org/html/rfc3501#section-2.3.1.2).
///
/// A relative position from 1 to the number of messages in the mailbox. Sequence numbers can be
/// reassigned during the session, which is why the reader only ever addresses messages by
/// [`Uid`].
pub type Seq = u32;

pub mod criteria;

mod fetch;
pub use self::fetch::Fetch;

mod flag;
pub use self::flag::Flag;

mod mailbox;
pub use self::mailbox::Mailbox;

mod message;
pub use self::message::{Header, Message};

mod uid_set;
pub use self::uid_set::{Selection, UidSet};
