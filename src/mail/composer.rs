//! Report mail composition: validate inputs, assemble one message, hand it
//! to the transport exactly once.

use std::path::{Path, PathBuf};

use crate::config::{EmailConfig, ServerProfile};
use crate::error::{AddressField, ConfigKind, Error, Result};
use crate::mail::describe::describe;
use crate::mail::message::{ComposedMessage, PLAIN_TEXT_FALLBACK};
use crate::mail::transport::{Transport, TransportSettings};
use crate::mail::{address, attachment};

/// Sends report files as email attachments through a [`Transport`].
///
/// Holds no state between calls. Concurrent sends need one composer (and
/// transport) per thread.
pub struct MessageComposer<T> {
    transport: T,
    base_dir: PathBuf,
}

impl<T: Transport> MessageComposer<T> {
    /// Images in HTML bodies resolve against the current directory.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            base_dir: PathBuf::from("."),
        }
    }

    /// Resolve images referenced by HTML bodies against `dir` instead.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one email carrying `attachments`.
    ///
    /// Every input is validated before anything reaches the transport; a
    /// failure at any step aborts the whole send.
    pub fn send<P: AsRef<Path>>(
        &self,
        attachments: &[P],
        profile: Option<&ServerProfile>,
        config: Option<&EmailConfig>,
        html: Option<&str>,
    ) -> Result<()> {
        let profile = profile.ok_or(Error::ConfigMissing(ConfigKind::ServerProfile))?;
        let config = config.ok_or(Error::ConfigMissing(ConfigKind::EmailConfig))?;

        let attachments = attachment::build(attachments)?;
        let settings = TransportSettings::from_profile(profile);

        let to = resolve(AddressField::To, &config.to)?;
        let cc = resolve(AddressField::Cc, &config.cc)?;
        let bcc = resolve(AddressField::Bcc, &config.bcc)?;

        let subject = format!(
            "{}{}",
            profile.subject_prefix.as_deref().unwrap_or(""),
            config.subject
        );

        let message = ComposedMessage::builder()
            .to(to)
            .cc(cc)
            .bcc(bcc)
            .from(config.from.clone())
            .subject(subject)
            .text(PLAIN_TEXT_FALLBACK)
            .html(html)
            .attachments(attachments)
            .base_dir(self.base_dir.clone())
            .build()
            .map_err(|err| match err {
                // Report the subject as configured, without the prefix.
                Error::NoRecipient { from, .. } => Error::NoRecipient {
                    subject: config.subject.clone(),
                    from,
                },
                other => other,
            })?;

        tracing::debug!(
            host = %settings.host,
            recipients = message.recipient_count(),
            attachments = message.attachments().len(),
            html = message.html().is_some(),
            "Sending report email"
        );

        if let Err(err) = self.transport.deliver(&settings, &message) {
            let detail = describe(err.as_ref());
            tracing::warn!(host = %settings.host, error = %detail, "Report email failed");
            return Err(Error::Transport(detail));
        }

        tracing::info!(
            subject = message.subject(),
            recipients = message.recipient_count(),
            "Report email sent"
        );
        Ok(())
    }
}

fn resolve(field: AddressField, raw: &str) -> Result<Vec<lettre::message::Mailbox>> {
    address::normalize(Some(raw)).map_err(|source| Error::Address { field, source })
}
