//! End-to-end tests for report mail composition.
//!
//! A recording transport stands in for the SMTP server and the rendered MIME
//! is checked with mail-parser. A loopback SMTP listener covers rejected logins.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::Mutex;

use mail_parser::{MessageParser, MimeHeaders};
use secrecy::SecretString;

use report_mailer::error::{AddressField, ConfigKind, Error};
use report_mailer::mail::describe::AUTH_FAILED_MESSAGE;
use report_mailer::mail::message::PLAIN_TEXT_FALLBACK;
use report_mailer::mail::smtp::render;
use report_mailer::mail::{ComposedMessage, Transport, TransportFailure, TransportSettings};
use report_mailer::{EmailConfig, MessageComposer, ServerProfile, SmtpDelivery};

/// Captures every delivery and the settings it was made with.
#[derive(Default)]
struct RecordingTransport {
    deliveries: Mutex<Vec<(TransportSettings, ComposedMessage)>>,
}

impl Transport for RecordingTransport {
    fn deliver(
        &self,
        settings: &TransportSettings,
        message: &ComposedMessage,
    ) -> Result<(), TransportFailure> {
        self.deliveries
            .lock()
            .unwrap()
            .push((settings.clone(), message.clone()));
        Ok(())
    }
}

/// Fails with a three-level cause chain.
struct BrokenTransport;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Cause(&'static str, #[source] Option<Box<Cause>>);

impl Transport for BrokenTransport {
    fn deliver(
        &self,
        _settings: &TransportSettings,
        _message: &ComposedMessage,
    ) -> Result<(), TransportFailure> {
        let c = Cause("connection reset by peer", None);
        let b = Cause("could not read server greeting", Some(Box::new(c)));
        Err(Box::new(Cause("delivery to smtp.test.com failed", Some(Box::new(b)))))
    }
}

fn profile() -> ServerProfile {
    ServerProfile {
        host: "smtp.test.com".into(),
        port: Some(2525),
        user_id: Some("reporter".into()),
        password: Some(SecretString::from("hunter2")),
        bounce_address: Some("bounces@test.com".into()),
        debug: false,
        tls_on_connect: false,
        subject_prefix: None,
    }
}

fn email_config() -> EmailConfig {
    EmailConfig {
        to: "dev@test.com; qa@test.com".into(),
        cc: "lead@test.com".into(),
        bcc: String::new(),
        subject: "Benchmark results".into(),
        from: Some("Perf Bot <perf@test.com>".into()),
    }
}

fn reports() -> (tempfile::TempDir, Vec<std::path::PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("results.csv");
    let html = dir.path().join("summary.html");
    std::fs::write(&csv, "bench,score\nparse,42\n").unwrap();
    std::fs::write(&html, "<html><body>summary</body></html>").unwrap();
    (dir, vec![csv, html])
}

#[test]
fn send_hands_one_complete_message_to_the_transport() {
    let (_dir, paths) = reports();
    let composer = MessageComposer::new(RecordingTransport::default());

    composer
        .send(&paths, Some(&profile()), Some(&email_config()), Some("<p>ok</p>"))
        .unwrap();

    let deliveries = composer.transport().deliveries.lock().unwrap();
    assert_eq!(deliveries.len(), 1);
    let (settings, message) = &deliveries[0];

    assert_eq!(settings.host, "smtp.test.com");
    assert_eq!(settings.port, Some(2525));
    assert!(settings.is_authenticated());
    assert_eq!(settings.bounce_address.as_deref(), Some("bounces@test.com"));

    let to: Vec<String> = message.to().iter().map(|m| m.email.to_string()).collect();
    assert_eq!(to, vec!["dev@test.com", "qa@test.com"]);
    assert_eq!(message.cc().len(), 1);
    assert!(message.bcc().is_empty());
    assert_eq!(message.from(), Some("Perf Bot <perf@test.com>"));
    assert_eq!(message.subject(), "Benchmark results");
    assert_eq!(message.text(), PLAIN_TEXT_FALLBACK);
    assert_eq!(message.html(), Some("<p>ok</p>"));

    let names: Vec<&str> = message.attachments().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["results.csv", "summary.html"]);
}

#[test]
fn rendered_message_carries_every_attachment() {
    let (_dir, paths) = reports();
    let composer = MessageComposer::new(RecordingTransport::default());
    composer
        .send(&paths, Some(&profile()), Some(&email_config()), Some("<p>ok</p>"))
        .unwrap();

    let deliveries = composer.transport().deliveries.lock().unwrap();
    let raw = render(&deliveries[0].1).unwrap().formatted();
    let parsed = MessageParser::default().parse(&raw).unwrap();

    assert_eq!(parsed.subject(), Some("Benchmark results"));
    assert_eq!(parsed.attachment_count(), 2);
    let names: Vec<_> = parsed.attachments().filter_map(|a| a.attachment_name()).collect();
    assert_eq!(names, vec!["results.csv", "summary.html"]);
    assert!(parsed.body_html(0).unwrap().contains("<p>ok</p>"));
}

#[test]
fn missing_profile_wins_over_everything_else() {
    let composer = MessageComposer::new(RecordingTransport::default());
    let no_paths: [&str; 0] = [];

    let err = composer
        .send(&no_paths, None, Some(&email_config()), Some("<p/>"))
        .unwrap_err();

    assert!(matches!(err, Error::ConfigMissing(ConfigKind::ServerProfile)));
    assert_eq!(
        err.to_string(),
        "Cannot send email, no mail server configuration available"
    );
}

#[test]
fn no_recipients_reports_subject_and_sender() {
    let (_dir, paths) = reports();
    let composer = MessageComposer::new(RecordingTransport::default());
    let mut profile = profile();
    profile.subject_prefix = Some("[perf] ".into());
    let config = EmailConfig {
        to: " ; ".into(),
        cc: String::new(),
        bcc: String::new(),
        ..email_config()
    };

    let err = composer
        .send(&paths, Some(&profile), Some(&config), None)
        .unwrap_err();

    assert!(matches!(err, Error::NoRecipient { .. }));
    let message = err.to_string();
    assert!(message.contains("'Benchmark results'"));
    assert!(message.contains("'Perf Bot <perf@test.com>'"));
    assert!(composer.transport().deliveries.lock().unwrap().is_empty());
}

#[test]
fn malformed_cc_names_the_field() {
    let (_dir, paths) = reports();
    let composer = MessageComposer::new(RecordingTransport::default());
    let config = EmailConfig {
        cc: "lead@test.com; @@broken".into(),
        ..email_config()
    };

    let err = composer
        .send(&paths, Some(&profile()), Some(&config), None)
        .unwrap_err();

    match &err {
        Error::Address { field, source } => {
            assert_eq!(*field, AddressField::Cc);
            assert_eq!(source.token, "@@broken");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(composer.transport().deliveries.lock().unwrap().is_empty());
}

#[test]
fn subject_prefix_handling() {
    let (_dir, paths) = reports();

    for (prefix, expected) in [
        (Some("[perf] "), "[perf] Benchmark results"),
        (Some(""), "Benchmark results"),
        (None, "Benchmark results"),
    ] {
        let composer = MessageComposer::new(RecordingTransport::default());
        let mut profile = profile();
        profile.subject_prefix = prefix.map(str::to_owned);

        composer
            .send(&paths, Some(&profile), Some(&email_config()), None)
            .unwrap();

        let deliveries = composer.transport().deliveries.lock().unwrap();
        assert_eq!(deliveries[0].1.subject(), expected);
    }
}

#[test]
fn empty_html_body_is_not_sent() {
    let (_dir, paths) = reports();
    let composer = MessageComposer::new(RecordingTransport::default());

    composer
        .send(&paths, Some(&profile()), Some(&email_config()), Some(""))
        .unwrap();

    let deliveries = composer.transport().deliveries.lock().unwrap();
    assert!(deliveries[0].1.html().is_none());
    assert_eq!(deliveries[0].1.text(), PLAIN_TEXT_FALLBACK);
}

#[test]
fn transport_failure_carries_the_cause_chain() {
    let (_dir, paths) = reports();
    let composer = MessageComposer::new(BrokenTransport);

    let err = composer
        .send(&paths, Some(&profile()), Some(&email_config()), None)
        .unwrap_err();

    let Error::Transport(detail) = &err else {
        panic!("unexpected error: {err}");
    };
    let lines: Vec<&str> = detail.lines().collect();
    assert_eq!(
        lines,
        vec![
            "delivery to smtp.test.com failed",
            "could not read server greeting",
            "connection reset by peer",
        ]
    );
    assert!(err.to_string().starts_with("Sending the email caused an exception: "));
}

#[test]
fn base_dir_reaches_the_message() {
    let (dir, paths) = reports();
    let composer = MessageComposer::new(RecordingTransport::default()).with_base_dir(dir.path());

    composer
        .send(&paths, Some(&profile()), Some(&email_config()), Some("<img src=\"x.png\">"))
        .unwrap();

    let deliveries = composer.transport().deliveries.lock().unwrap();
    assert_eq!(deliveries[0].1.base_dir(), dir.path());
}

/// Minimal SMTP server on loopback that rejects every AUTH with 535.
fn rejecting_smtp_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    std::thread::spawn(move || {
        let Ok((stream, _)) = listener.accept() else {
            return;
        };
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        if writer.write_all(b"220 localhost ESMTP test\r\n").is_err() {
            return;
        }

        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                break;
            }
            let command = line.to_ascii_uppercase();
            let reply: &[u8] = if command.starts_with("EHLO") || command.starts_with("HELO") {
                b"250-localhost\r\n250 AUTH PLAIN LOGIN\r\n"
            } else if command.starts_with("AUTH") {
                b"535 5.7.8 bad credentials go away\r\n"
            } else if command.starts_with("QUIT") {
                let _ = writer.write_all(b"221 bye\r\n");
                break;
            } else {
                b"250 ok\r\n"
            };
            if writer.write_all(reply).is_err() {
                break;
            }
        }
    });

    port
}

#[test]
fn rejected_login_hides_the_server_reply() {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let (_dir, paths) = reports();
    let profile = ServerProfile {
        host: "127.0.0.1".into(),
        port: Some(rejecting_smtp_server()),
        tls_on_connect: false,
        ..profile()
    };

    let err = MessageComposer::new(SmtpDelivery::new())
        .send(&paths, Some(&profile), Some(&email_config()), None)
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    let message = err.to_string();
    assert_eq!(
        message,
        format!(
            "Sending the email caused an exception: SMTP delivery via 127.0.0.1 failed\n{AUTH_FAILED_MESSAGE}"
        )
    );
    assert!(!message.contains("go away"));
}
