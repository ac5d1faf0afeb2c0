//! Error types for report-mailer.

use std::fmt;

/// Which piece of configuration was missing from a send request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    ServerProfile,
    EmailConfig,
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKind::ServerProfile => f.write_str("no mail server configuration available"),
            ConfigKind::EmailConfig => f.write_str("no email data provided"),
        }
    }
}

/// Recipient header an address list was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    To,
    Cc,
    Bcc,
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressField::To => f.write_str("to"),
            AddressField::Cc => f.write_str("cc"),
            AddressField::Bcc => f.write_str("bcc"),
        }
    }
}

/// Top-level error type for a send.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot send email, {0}")]
    ConfigMissing(ConfigKind),

    #[error("Cannot send email, no attachments specified")]
    NoAttachments,

    #[error("Invalid {field} address: {source}")]
    Address {
        field: AddressField,
        #[source]
        source: AddressError,
    },

    #[error(
        "At least one receiver address required, could not send email: '{subject}' from '{}'",
        from.as_deref().unwrap_or("")
    )]
    NoRecipient {
        subject: String,
        from: Option<String>,
    },

    #[error("Sending the email caused an exception: {0}")]
    Transport(String),
}

/// A recipient token that is not a valid RFC 822 address.
#[derive(Debug, thiserror::Error)]
#[error("'{token}' is not a valid address: {source}")]
pub struct AddressError {
    pub token: String,
    #[source]
    pub source: lettre::address::AddressError,
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for sends.
pub type Result<T> = std::result::Result<T, Error>;
