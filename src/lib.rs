//! Report mailer: sends generated report files as email attachments.

pub mod config;
pub mod error;
pub mod mail;

pub use config::{EmailConfig, ServerProfile};
pub use error::{Error, Result};
pub use mail::{MessageComposer, SmtpDelivery};
