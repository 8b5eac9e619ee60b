//! Tests against a real IMAP server, run with `--features test-full-imap`.
//!
//! The server is found through `TEST_HOST`, `TEST_IMAP_PORT` and `TEST_IMAPS_PORT`. The account
//! is `TEST_USER`, with `TEST_PASSWORD` defaulting to the user name.

extern crate imap_reader;

use imap_reader::{
    criteria, Client, ClientBuilder, Connection, ErrorKind, Flag, MailboxState, Options, Reader,
    GMAIL_INBOX,
};
use std::time::Duration;

fn test_host() -> String {
    std::env::var("TEST_HOST").unwrap_or("127.0.0.1".to_string())
}

fn test_imap_port() -> u16 {
    std::env::var("TEST_IMAP_PORT")
        .unwrap_or("3143".to_string())
        .parse()
        .unwrap_or(3143)
}

fn test_imaps_port() -> u16 {
    std::env::var("TEST_IMAPS_PORT")
        .unwrap_or("3993".to_string())
        .parse()
        .unwrap_or(3993)
}

fn test_user() -> String {
    std::env::var("TEST_USER").unwrap_or("reader@localhost".to_string())
}

fn test_password() -> String {
    std::env::var("TEST_PASSWORD").unwrap_or_else(|_| test_user())
}

fn options(mark_seen: bool) -> Options {
    Options::new(
        format!("{}:{}", test_host(), test_imap_port()),
        test_user(),
        test_password(),
    )
    .tls(false)
    .timeout(Duration::from_secs(10))
    .mark_seen(mark_seen)
}

fn reader(mark_seen: bool) -> Reader<Client<Connection>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut reader = Reader::connect(options(mark_seen)).unwrap();
    reader.login().unwrap();
    reader
}

fn message(subject: &str, body: &str) -> String {
    format!(
        "From: sender@localhost\r\n\
         To: {}\r\n\
         Subject: {}\r\n\
         \r\n\
         {}\r\n",
        test_user(),
        subject,
        body
    )
}

/// Replace `mailbox` with a fresh one holding the given messages.
fn fixture(reader: &mut Reader<Client<Connection>>, mailbox: &str, messages: &[String]) {
    let client = reader.transport_mut();
    // we are silently eating any error (e.g. mailbox does not exist)
    client.delete(mailbox).unwrap_or(());
    client.create(mailbox).unwrap();
    for m in messages {
        client.append(mailbox, m.as_bytes()).unwrap();
    }
}

fn teardown(mut reader: Reader<Client<Connection>>, mailbox: &str) {
    reader.transport_mut().delete(mailbox).unwrap_or(());
    reader.logout().unwrap();
}

#[test]
fn list_no_mark_seen() {
    let mailbox = "TestListNoMarkSeen";
    let mut reader = reader(false);
    fixture(
        &mut reader,
        mailbox,
        &[message("first", "one"), message("second", "two")],
    );

    let messages = reader.list(mailbox, &criteria::UNSEEN).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].header().get("Subject"), Some("first"));
    assert_eq!(messages[0].body(), b"one\r\n");
    assert!(!messages[0].has_flag(&Flag::Seen));

    // still unseen
    assert_eq!(reader.list(mailbox, &criteria::UNSEEN).unwrap().len(), 2);
    assert!(reader.list(mailbox, &criteria::SEEN).unwrap().is_empty());

    teardown(reader, mailbox);
}

#[test]
fn list_mark_seen() {
    let mailbox = "TestListMarkSeen";
    let mut reader = reader(true);
    fixture(
        &mut reader,
        mailbox,
        &[message("ponies", "neigh"), message("cows", "moo")],
    );

    let found = reader.list(mailbox, &criteria::by_subject("ponies")).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].body(), b"neigh\r\n");
    assert_eq!(reader.mailbox_state(), &MailboxState::Unselected);

    let unseen = reader.list(mailbox, &criteria::UNSEEN).unwrap();
    assert_eq!(unseen.len(), 1);
    assert_eq!(unseen[0].header().get("subject"), Some("cows"));

    // marking again is harmless
    assert!(reader.list(mailbox, &criteria::UNSEEN).unwrap().is_empty());
    assert_eq!(reader.list(mailbox, &criteria::SEEN).unwrap().len(), 2);

    teardown(reader, mailbox);
}

#[test]
fn list_by_from() {
    let mailbox = "TestListByFrom";
    let mut reader = reader(false);
    fixture(&mut reader, mailbox, &[message("hello", "hi")]);

    let found = reader
        .list(mailbox, &criteria::by_from("sender@localhost"))
        .unwrap();
    assert_eq!(found.len(), 1);
    assert!(reader
        .list(mailbox, &criteria::by_from("nobody@nowhere.example"))
        .unwrap()
        .is_empty());

    teardown(reader, mailbox);
}

#[test]
fn list_missing_mailbox() {
    let mut reader = reader(false);
    let err = reader
        .list("TestNoSuchMailbox", &criteria::ALL)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(reader.mailbox_state(), &MailboxState::Unselected);
    reader.logout().unwrap();
}

#[test]
fn inbox_can_be_examined() {
    let mut reader = reader(false);
    let mailbox = reader.select(GMAIL_INBOX, true).unwrap();
    assert!(mailbox.uid_validity.is_some());
    reader.close().unwrap();
    reader.logout().unwrap();
}

#[test]
fn wrong_password() {
    let options = Options {
        password: "definitely not it".to_string(),
        ..options(false)
    };
    let mut reader = Reader::connect(options).unwrap();
    assert_eq!(reader.login().unwrap_err().kind(), ErrorKind::Auth);
}

#[test]
#[cfg(feature = "native-tls")]
fn list_over_tls() {
    let client = ClientBuilder::new(test_host(), test_imaps_port())
        .danger_skip_tls_verify(true)
        .connect()
        .unwrap();
    let mut reader = Reader::new(options(false).tls(true), client);
    reader.login().unwrap();
    reader.list(GMAIL_INBOX, &criteria::ALL).unwrap();
    reader.logout().unwrap();
}
