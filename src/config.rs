//! Mail server profile and message configuration.
//!
//! Both types are plain values the caller owns; the mailer only borrows them.
//! They can be built directly, deserialized with serde, or read from
//! `REPORT_*` environment variables.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::ConfigError;

/// How to reach and authenticate against the SMTP server.
#[derive(Debug, Default, Deserialize)]
pub struct ServerProfile {
    pub host: String,
    /// `None` uses the transport's default for the selected TLS mode.
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    /// Envelope sender for delivery status notifications.
    #[serde(default)]
    pub bounce_address: Option<String>,
    #[serde(default)]
    pub debug: bool,
    /// Open the connection with implicit TLS (SMTPS) instead of plain SMTP.
    #[serde(default)]
    pub tls_on_connect: bool,
    /// Prepended verbatim to every subject sent through this server.
    #[serde(default)]
    pub subject_prefix: Option<String>,
}

impl ServerProfile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Build a profile from environment variables.
    ///
    /// `REPORT_SMTP_HOST` is required. `REPORT_SMTP_PORT` may be unset or `-1`
    /// to keep the transport default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("REPORT_SMTP_HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("REPORT_SMTP_HOST".into()))?;

        Ok(Self {
            host,
            port: parse_port(env_opt("REPORT_SMTP_PORT").as_deref())?,
            user_id: env_opt("REPORT_SMTP_USER"),
            password: env_opt("REPORT_SMTP_PASSWORD").map(SecretString::from),
            bounce_address: env_opt("REPORT_SMTP_BOUNCE"),
            debug: parse_flag("REPORT_SMTP_DEBUG")?,
            tls_on_connect: parse_flag("REPORT_SMTP_TLS")?,
            subject_prefix: env_opt("REPORT_SUBJECT_PREFIX"),
        })
    }

    /// User id and password, but only when both are non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let user = self.user_id.as_deref().filter(|u| !u.is_empty())?;
        let password = self
            .password
            .as_ref()
            .map(|p| p.expose_secret())
            .filter(|p| !p.is_empty())?;
        Some((user, password))
    }
}

/// Recipients and content of the outgoing message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailConfig {
    /// Raw address lists; `;` and `,` both separate entries.
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub cc: String,
    #[serde(default)]
    pub bcc: String,
    pub subject: String,
    #[serde(default)]
    pub from: Option<String>,
}

impl EmailConfig {
    /// Build the message configuration from environment variables.
    /// `REPORT_MAIL_SUBJECT` is required, recipients may be empty here.
    pub fn from_env() -> Result<Self, ConfigError> {
        let subject = std::env::var("REPORT_MAIL_SUBJECT")
            .map_err(|_| ConfigError::MissingEnvVar("REPORT_MAIL_SUBJECT".into()))?;

        Ok(Self {
            to: std::env::var("REPORT_MAIL_TO").unwrap_or_default(),
            cc: std::env::var("REPORT_MAIL_CC").unwrap_or_default(),
            bcc: std::env::var("REPORT_MAIL_BCC").unwrap_or_default(),
            subject,
            from: env_opt("REPORT_MAIL_FROM"),
        })
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_port(raw: Option<&str>) -> Result<Option<u16>, ConfigError> {
    match raw.map(str::trim) {
        None | Some("") | Some("-1") => Ok(None),
        Some(value) => value
            .parse::<u16>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: "REPORT_SMTP_PORT".into(),
                message: format!("'{value}': {e}"),
            }),
    }
}

fn parse_flag(key: &str) -> Result<bool, ConfigError> {
    let Some(raw) = env_opt(key) else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}
