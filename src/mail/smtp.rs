//! SMTP delivery via lettre.

use std::error::Error as StdError;
use std::path::{Path, PathBuf};

use lettre::address::{AddressError, Envelope};
use lettre::message::header::{
    ContentDisposition, ContentType, Header, HeaderName, HeaderValue,
};
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::{SMTP_PORT, SUBMISSIONS_PORT};
use lettre::{Address, Message, SmtpTransport, Transport as _};

use crate::mail::attachment::Attachment;
use crate::mail::inline::{self, InlineImage};
use crate::mail::message::ComposedMessage;
use crate::mail::transport::{Transport, TransportFailure, TransportSettings};

/// Failures while turning a [`ComposedMessage`] into bytes on the wire.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Invalid from address '{address}'")]
    From {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("Invalid bounce address '{address}'")]
    Bounce {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("Cannot read '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid content type for '{name}'")]
    ContentType {
        name: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Failed to build message")]
    Build(#[from] lettre::error::Error),

    #[error("Failed to set up TLS for {host}")]
    Tls {
        host: String,
        #[source]
        source: lettre::transport::smtp::Error,
    },

    #[error("SMTP delivery via {host} failed")]
    Smtp {
        host: String,
        #[source]
        source: lettre::transport::smtp::Error,
    },
}

/// `Content-Description` header, which lettre does not ship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDescription(pub String);

impl Header for ContentDescription {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("Content-Description")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        Ok(Self(s.to_owned()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// Production [`Transport`]: a fresh blocking SMTP connection per delivery.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpDelivery;

impl SmtpDelivery {
    pub fn new() -> Self {
        Self
    }

    fn send(
        &self,
        settings: &TransportSettings,
        message: &ComposedMessage,
    ) -> Result<(), DeliveryError> {
        let email = render(message)?;
        let envelope = envelope_for(settings, &email)?;
        let raw = email.formatted();

        if settings.debug {
            tracing::info!(
                host = %settings.host,
                port = ?settings.port,
                tls_on_connect = settings.tls_on_connect,
                authenticated = settings.is_authenticated(),
                envelope_from = ?envelope.from(),
                envelope_to = ?envelope.to(),
                bytes = raw.len(),
                "SMTP delivery parameters"
            );
        }

        let transport = build_transport(settings)?;
        transport
            .send_raw(&envelope, &raw)
            .map_err(|source| DeliveryError::Smtp {
                host: settings.host.clone(),
                source,
            })?;

        Ok(())
    }
}

impl Transport for SmtpDelivery {
    fn deliver(
        &self,
        settings: &TransportSettings,
        message: &ComposedMessage,
    ) -> Result<(), TransportFailure> {
        self.send(settings, message).map_err(Into::into)
    }
}

fn build_transport(settings: &TransportSettings) -> Result<SmtpTransport, DeliveryError> {
    let parameters =
        TlsParameters::new(settings.host.clone()).map_err(|source| DeliveryError::Tls {
            host: settings.host.clone(),
            source,
        })?;

    let (tls, port) = connection_mode(settings, parameters);
    let mut builder = SmtpTransport::builder_dangerous(&settings.host)
        .port(port)
        .tls(tls);

    if let Some(credentials) = &settings.credentials {
        builder = builder.credentials(credentials.clone());
    }

    Ok(builder.build())
}

/// Implicit TLS talks SMTPS on 465; otherwise plain SMTP on 25, upgraded via
/// STARTTLS when the server offers it. A configured port wins over both.
fn connection_mode(settings: &TransportSettings, parameters: TlsParameters) -> (Tls, u16) {
    let (tls, default_port) = if settings.tls_on_connect {
        (Tls::Wrapper(parameters), SUBMISSIONS_PORT)
    } else {
        (Tls::Opportunistic(parameters), SMTP_PORT)
    };
    (tls, settings.port.unwrap_or(default_port))
}

/// Bounces go to the bounce address when one is configured.
fn envelope_for(settings: &TransportSettings, email: &Message) -> Result<Envelope, DeliveryError> {
    let Some(bounce) = &settings.bounce_address else {
        return Ok(email.envelope().clone());
    };

    let sender: Address = bounce.parse().map_err(|source| DeliveryError::Bounce {
        address: bounce.clone(),
        source,
    })?;
    Ok(Envelope::new(Some(sender), email.envelope().to().to_vec())?)
}

/// Render the MIME structure: the body (plain text, or text/HTML
/// alternatives with any inline images) followed by one part per attachment.
pub fn render(message: &ComposedMessage) -> Result<Message, DeliveryError> {
    let mut builder = Message::builder().subject(message.subject());

    if let Some(from) = message.from() {
        let mailbox: Mailbox = from.parse().map_err(|source| DeliveryError::From {
            address: from.to_string(),
            source,
        })?;
        builder = builder.from(mailbox);
    }
    for mailbox in message.to() {
        builder = builder.to(mailbox.clone());
    }
    for mailbox in message.cc() {
        builder = builder.cc(mailbox.clone());
    }
    for mailbox in message.bcc() {
        builder = builder.bcc(mailbox.clone());
    }

    let mut mixed = match message.html() {
        Some(html) => MultiPart::mixed().multipart(html_body(message, html)?),
        None => MultiPart::mixed().singlepart(SinglePart::plain(message.text().to_string())),
    };
    for attachment in message.attachments() {
        mixed = mixed.singlepart(attachment_part(attachment)?);
    }

    Ok(builder.multipart(mixed)?)
}

fn html_body(message: &ComposedMessage, html: &str) -> Result<MultiPart, DeliveryError> {
    let (html, images) = inline::embed_images(html, message.base_dir());
    let alternative = MultiPart::alternative_plain_html(message.text().to_string(), html);

    if images.is_empty() {
        return Ok(alternative);
    }

    let mut related = MultiPart::related().multipart(alternative);
    for image in &images {
        related = related.singlepart(inline_part(image)?);
    }
    Ok(related)
}

fn inline_part(image: &InlineImage) -> Result<SinglePart, DeliveryError> {
    let content = read(&image.attachment.path)?;
    let content_type = content_type_for(&image.attachment)?;
    Ok(lettre::message::Attachment::new_inline(image.content_id.clone())
        .body(content, content_type))
}

fn attachment_part(attachment: &Attachment) -> Result<SinglePart, DeliveryError> {
    let content = read(&attachment.path)?;
    Ok(SinglePart::builder()
        .header(content_type_for(attachment)?)
        .header(ContentDisposition::attachment(&attachment.name))
        .header(ContentDescription(attachment.description.to_string()))
        .body(content))
}

fn read(path: &Path) -> Result<Vec<u8>, DeliveryError> {
    std::fs::read(path).map_err(|source| DeliveryError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn content_type_for(attachment: &Attachment) -> Result<ContentType, DeliveryError> {
    let mime = mime_guess::from_path(&attachment.path).first_or_octet_stream();
    ContentType::parse(mime.essence_str()).map_err(|e| DeliveryError::ContentType {
        name: attachment.name.clone(),
        source: Box::new(e),
    })
}
