use crate::error::{Result, ValidateError};

/// Lovingly borrowed from the cargo crate
///
/// Joins an iterator of [std::fmt::Display]'ables into an output writable
pub(crate) fn iter_join_onto<W, I, T>(mut w: W, iter: I, delim: &str) -> std::fmt::Result
where
    W: std::fmt::Write,
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let mut it = iter.into_iter().peekable();
    while let Some(n) = it.next() {
        write!(w, "{}", n)?;
        if it.peek().is_some() {
            write!(w, "{}", delim)?;
        }
    }
    Ok(())
}

/// Joins an iterator of [std::fmt::Display]'ables to a new [std::string::String].
pub(crate) fn iter_join<I, T>(iter: I, delim: &str) -> String
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let mut s = String::new();
    let _ = iter_join_onto(&mut s, iter, delim);
    s
}

/// Render `value` as an IMAP quoted string.
pub(crate) fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', r"\\").replace('"', "\\\""))
}

/// Quote `value`, refusing characters a quoted string cannot carry.
///
/// RFC 3501 quoted strings are 7-bit and may not contain CR or LF.
pub(crate) fn validate_str(value: &str) -> Result<String> {
    if let Some(c) = value.chars().find(|c| *c == '\r' || *c == '\n' || !c.is_ascii()) {
        return Err(ValidateError(c).into());
    }
    Ok(quote(value))
}
