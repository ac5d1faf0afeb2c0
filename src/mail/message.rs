//! The validated, ready-to-send message value.

use std::path::PathBuf;

use lettre::message::Mailbox;

use crate::error::Error;
use crate::mail::attachment::Attachment;

/// Plain-text part sent alongside the HTML body for clients that cannot
/// render HTML. Always present.
pub const PLAIN_TEXT_FALLBACK: &str = "Your email client does not support HTML messages";

/// One outgoing email, immutable once built.
#[derive(Debug, Clone)]
pub struct ComposedMessage {
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    from: Option<String>,
    subject: String,
    text: String,
    html: Option<String>,
    attachments: Vec<Attachment>,
    base_dir: PathBuf,
}

impl ComposedMessage {
    pub fn builder() -> ComposedMessageBuilder {
        ComposedMessageBuilder::default()
    }

    pub fn to(&self) -> &[Mailbox] {
        &self.to
    }

    pub fn cc(&self) -> &[Mailbox] {
        &self.cc
    }

    pub fn bcc(&self) -> &[Mailbox] {
        &self.bcc
    }

    /// Sender exactly as configured; parsed only when rendered.
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Directory that relative image references in the HTML body resolve against.
    pub fn base_dir(&self) -> &std::path::Path {
        &self.base_dir
    }

    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len() + self.bcc.len()
    }
}

/// Accumulates validated fields for a [`ComposedMessage`].
#[derive(Debug, Default)]
pub struct ComposedMessageBuilder {
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    from: Option<String>,
    subject: String,
    text: Option<String>,
    html: Option<String>,
    attachments: Vec<Attachment>,
    base_dir: Option<PathBuf>,
}

impl ComposedMessageBuilder {
    pub fn to(mut self, mailboxes: Vec<Mailbox>) -> Self {
        self.to = mailboxes;
        self
    }

    pub fn cc(mut self, mailboxes: Vec<Mailbox>) -> Self {
        self.cc = mailboxes;
        self
    }

    pub fn bcc(mut self, mailboxes: Vec<Mailbox>) -> Self {
        self.bcc = mailboxes;
        self
    }

    pub fn from(mut self, from: Option<String>) -> Self {
        self.from = from;
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the HTML body. Empty bodies are ignored.
    pub fn html(mut self, html: Option<&str>) -> Self {
        self.html = html.filter(|h| !h.is_empty()).map(str::to_owned);
        self
    }

    pub fn attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Finish the message. Fails when no recipient was resolved across
    /// to, cc and bcc.
    pub fn build(self) -> Result<ComposedMessage, Error> {
        if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
            return Err(Error::NoRecipient {
                subject: self.subject,
                from: self.from,
            });
        }

        Ok(ComposedMessage {
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            from: self.from,
            subject: self.subject,
            text: self.text.unwrap_or_else(|| PLAIN_TEXT_FALLBACK.to_string()),
            html: self.html,
            attachments: self.attachments,
            base_dir: self.base_dir.unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}
